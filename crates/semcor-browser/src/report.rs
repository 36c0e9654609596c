//! Text rendering for the `analyze` subcommand.

use std::fmt::Write;

use semcor_db::Semcor;
use semcor_db::analysis::{AttributeReport, COUNTED_ATTRIBUTES};
use semcor_pairs::DocumentPolysemy;

/// Value lists longer than this are summarized by their size.
const MAX_VALUES: usize = 25;
/// Wordforms with `rdf` but no `pn` listed by sentence.
const MAX_IRREGULAR: usize = 20;

pub fn attribute_report(semcor: &Semcor, report: &AttributeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nAttributes on sense-tagged wordforms\n");
    for (name, count) in &report.attribute_counts {
        let _ = writeln!(out, "   {name:<8} {count:>8}");
    }

    for name in COUNTED_ATTRIBUTES {
        let Some(values) = report.value_counts.get(name) else {
            continue;
        };
        let _ = writeln!(out, "\n{name} ({} distinct values)", values.len());
        if values.len() > MAX_VALUES {
            continue;
        }
        for (value, count) in values {
            let _ = writeln!(out, "   {value:<24} {count:>8}");
        }
    }

    let names = &report.proper_names;
    let _ = writeln!(out, "\nProper names (lemma = pn = rdf): {}", names.count);
    for (label, values) in [
        ("tags", &names.tags),
        ("pn", &names.pn_values),
        ("rdf", &names.rdf_values),
    ] {
        let joined: Vec<String> = values.iter().map(|(v, c)| format!("{v}={c}")).collect();
        let _ = writeln!(out, "   {label:<5} {}", joined.join(" "));
    }

    let _ = writeln!(
        out,
        "\nWordforms with rdf but no pn: {}",
        report.irregular_rdf.len()
    );
    for id in report.irregular_rdf.iter().take(MAX_IRREGULAR) {
        let (Some(label), Some(wf)) = (semcor.sentence_label(id.sentence), semcor.wordform(*id))
        else {
            continue;
        };
        let _ = writeln!(
            out,
            "   {label:<12} {} rdf={} lemma={}",
            wf.text,
            wf.rdf.as_deref().unwrap_or(""),
            wf.lemma.as_deref().unwrap_or("")
        );
    }
    out
}

pub fn polysemy_summary(polysemy: &DocumentPolysemy, min_lemmas: usize, min_instances: usize) -> String {
    let mut out = String::new();
    let mut shown = 0;
    let _ = writeln!(out, "\nBasic type pairs within one document\n");
    for (pair, occurrences) in polysemy.pairs(min_lemmas, min_instances) {
        shown += 1;
        let _ = writeln!(
            out,
            "{pair}  {{ lemmas: {}, instances: {} }}",
            occurrences.lemma_count(),
            occurrences.instances()
        );
    }
    let _ = writeln!(out, "\nTOTAL NUMBER OF PAIRS: {shown} of {}", polysemy.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcor_db::{BasicTypeMap, parse_markup};

    fn semcor() -> Semcor {
        let markup = "<p pnum=1><s snum=1>
<wf cmd=done rdf=person pos=NNP lemma=person wnsn=1 lexsn=1:03:00:: pn=person>Smith</wf>
<wf cmd=done rdf=jury pos=NN lemma=panel wnsn=1 lexsn=1:14:01::>panel</wf>
<wf cmd=done pos=NN lemma=bank wnsn=1 lexsn=1:14:00::>bank</wf>
<wf cmd=done pos=NN lemma=bank wnsn=2 lexsn=1:17:01::>bank</wf>
</s></p>";
        Semcor::new(
            vec![parse_markup("br-a01", markup).file],
            BasicTypeMap::from_pairs([("bank%1:14:00::", "grp"), ("bank%1:17:01::", "lnd")]),
        )
    }

    #[test]
    fn lists_attributes_and_irregular_rdf() {
        let sc = semcor();
        let text = attribute_report(&sc, &AttributeReport::collect(&sc));
        assert!(text.contains("   lexsn           4"));
        assert!(text.contains("Proper names (lemma = pn = rdf): 1"));
        assert!(text.contains("   tags  NNP=1"));
        assert!(text.contains("Wordforms with rdf but no pn: 1"));
        assert!(text.contains("br-a01-1     panel rdf=jury lemma=panel"));
    }

    #[test]
    fn summarizes_document_pairs() {
        let poly = DocumentPolysemy::build(&semcor());
        let text = polysemy_summary(&poly, 1, 1);
        assert!(text.contains("grp-lnd  { lemmas: 1, instances: 2 }"));
        assert!(text.contains("TOTAL NUMBER OF PAIRS: 1 of 1"));
        assert!(polysemy_summary(&poly, 2, 1).contains("TOTAL NUMBER OF PAIRS: 0 of 1"));
    }
}
