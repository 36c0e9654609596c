//! Corpus-wide attribute statistics and the basic type export.
//!
//! Proper names are the odd part of Semcor: their lemma is the entity type,
//! and `pn` and `rdf` usually repeat it. The report counts how often that
//! holds and collects the wordforms that carry `rdf` without `pn`.

use std::collections::BTreeMap;
use std::io::{self, Write};

use semcor_types::WordformId;

use crate::Semcor;

/// Attributes tallied by [`AttributeReport::collect`].
pub const COUNTED_ATTRIBUTES: [&str; 6] = ["pos", "rdf", "pn", "lemma", "wnsn", "lexsn"];

#[derive(Clone, Debug, Default)]
pub struct AttributeReport {
    /// How many sense-tagged wordforms carry each attribute name.
    pub attribute_counts: BTreeMap<String, usize>,
    /// Value frequencies for each of [`COUNTED_ATTRIBUTES`].
    pub value_counts: BTreeMap<&'static str, BTreeMap<String, usize>>,
    pub proper_names: ProperNameSummary,
    /// Wordforms with `rdf` but no `pn`, in document order.
    pub irregular_rdf: Vec<WordformId>,
}

/// Wordforms whose lemma, `pn` and `rdf` all agree.
#[derive(Clone, Debug, Default)]
pub struct ProperNameSummary {
    pub count: usize,
    pub tags: BTreeMap<String, usize>,
    pub pn_values: BTreeMap<String, usize>,
    pub rdf_values: BTreeMap<String, usize>,
}

impl AttributeReport {
    pub fn collect(semcor: &Semcor) -> Self {
        let mut report = Self::default();
        for name in COUNTED_ATTRIBUTES {
            report.value_counts.insert(name, BTreeMap::new());
        }

        for (id, wf) in semcor.sense_tagged() {
            for name in wf.attribute_names() {
                *report.attribute_counts.entry(name.to_string()).or_default() += 1;
            }
            let values = [
                ("pos", &wf.pos),
                ("rdf", &wf.rdf),
                ("pn", &wf.pn),
                ("lemma", &wf.lemma),
                ("wnsn", &wf.wnsn),
                ("lexsn", &wf.lexsn),
            ];
            for (name, value) in values {
                if let (Some(value), Some(counts)) = (value, report.value_counts.get_mut(name)) {
                    *counts.entry(value.clone()).or_default() += 1;
                }
            }

            if let (Some(lemma), Some(pn), Some(rdf)) = (&wf.lemma, &wf.pn, &wf.rdf)
                && lemma == pn
                && pn == rdf
            {
                let names = &mut report.proper_names;
                names.count += 1;
                let tag = wf.pos.clone().unwrap_or_default();
                *names.tags.entry(tag).or_default() += 1;
                *names.pn_values.entry(pn.clone()).or_default() += 1;
                *names.rdf_values.entry(rdf.clone()).or_default() += 1;
            }
            if wf.rdf.is_some() && wf.pn.is_none() {
                report.irregular_rdf.push(id);
            }
        }
        report
    }
}

/// Write every sense-tagged `NN` wordform as `lemma<TAB>sense key<TAB>label`.
///
/// Unresolved labels are written as `None`. Returns the number of lines.
pub fn export_noun_types<W: Write>(semcor: &Semcor, mut out: W) -> io::Result<usize> {
    let mut lines = 0;
    for (_, wf) in semcor.sense_tagged() {
        if wf.pos.as_deref() != Some("NN") {
            continue;
        }
        let (Some(lemma), Some(key)) = (&wf.lemma, wf.sense_key()) else {
            continue;
        };
        let label = semcor.btypes().get(&key).unwrap_or("None");
        writeln!(out, "{lemma}\t{key}\t{label}")?;
        lines += 1;
    }
    out.flush()?;
    Ok(lines)
}
