//! Basic type pairs that co-occur inside Semcor sentences.
//!
//! Every sentence contributes the set of basic type labels carried by its
//! sense-tagged wordforms. Each unordered pair of distinct labels from that
//! set is a co-occurrence and is recorded with its sentences. The pairs a
//! [`PairPredicate`] accepts are the "interesting" ones listed by
//! [`PairAnalyzer::list_interesting_pairs`]; the analyzer knows nothing about
//! what makes a pair interesting, the caller supplies the rule.
//!
//! # Example
//! ```no_run
//! use semcor_db::Semcor;
//! use semcor_pairs::{PairAnalyzer, PairRules};
//!
//! # fn demo(semcor: &Semcor) -> Result<(), semcor_db::LookupError> {
//! let rules = PairRules::default().with_excluded(["ent"]);
//! let pairs = PairAnalyzer::build(semcor, &rules);
//! for count in pairs.list_interesting_pairs().iter().take(10) {
//!     println!("{} {}", count.pair, count.count);
//! }
//! let sentences = pairs.examples_for_pair("act", "hum")?;
//! # let _ = sentences;
//! # Ok(()) }
//! ```
//!
//! A closure works as a predicate too:
//! ```no_run
//! # use semcor_db::Semcor;
//! # use semcor_pairs::PairAnalyzer;
//! # fn demo(semcor: &Semcor) {
//! let only_humans = |a: &str, b: &str| a == "hum" || b == "hum";
//! let pairs = PairAnalyzer::build(semcor, &only_humans);
//! # let _ = pairs;
//! # }
//! ```

pub mod polysemy;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::{Serialize, Serializer};
use tracing::info;

use semcor_db::{LookupError, Semcor};
use semcor_types::{BasicTypePair, SentenceId};

pub use polysemy::{DocumentPolysemy, PairOccurrences, PairSummary};

/// Decides whether two co-occurring basic types are worth reporting.
///
/// Called with distinct labels in sorted order.
pub trait PairPredicate {
    fn is_interesting(&self, first: &str, second: &str) -> bool;
}

impl<F> PairPredicate for F
where
    F: Fn(&str, &str) -> bool,
{
    fn is_interesting(&self, first: &str, second: &str) -> bool {
        self(first, second)
    }
}

/// Default rule table.
///
/// A pair is rejected when either label is empty, either label is compound
/// (`act psy`, a sense carrying two basic types), both labels are equal, or
/// either label is listed in `excluded`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PairRules {
    excluded: BTreeSet<String>,
}

impl PairRules {
    /// Also reject pairs involving any of `labels`.
    pub fn with_excluded<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(
            labels
                .into_iter()
                .map(Into::<String>::into)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
        self
    }

    pub fn excluded(&self) -> impl Iterator<Item = &str> + '_ {
        self.excluded.iter().map(String::as_str)
    }

    fn accepts(&self, label: &str) -> bool {
        !label.is_empty() && !label.contains(char::is_whitespace) && !self.excluded.contains(label)
    }
}

impl PairPredicate for PairRules {
    fn is_interesting(&self, first: &str, second: &str) -> bool {
        first != second && self.accepts(first) && self.accepts(second)
    }
}

/// An interesting pair and the number of sentences realizing it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PairCount {
    #[serde(serialize_with = "pair_label")]
    pub pair: BasicTypePair,
    pub count: usize,
}

/// `T1-T2`, the form typed at the browser prompt.
pub(crate) fn pair_label<S: Serializer>(pair: &BasicTypePair, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(pair)
}

#[derive(Debug, Default)]
struct PairEntry {
    sentences: Vec<SentenceId>,
    interesting: bool,
}

/// Co-occurring pairs, the sentences they occur in and their classification.
#[derive(Debug, Default)]
pub struct PairAnalyzer {
    pairs: BTreeMap<BasicTypePair, PairEntry>,
}

impl PairAnalyzer {
    pub fn build<P>(semcor: &Semcor, predicate: &P) -> Self
    where
        P: PairPredicate + ?Sized,
    {
        let start = Instant::now();
        let mut pairs: BTreeMap<BasicTypePair, PairEntry> = BTreeMap::new();
        for (sid, sentence) in semcor.sentences() {
            let labels: BTreeSet<&str> = sentence
                .wordforms()
                .filter_map(|(_, wf)| semcor.basic_type(wf))
                .collect();
            if labels.len() < 2 {
                continue;
            }
            let labels: Vec<&str> = labels.into_iter().collect();
            for (i, first) in labels.iter().enumerate() {
                for second in &labels[i + 1..] {
                    let entry = pairs
                        .entry(BasicTypePair::new(*first, *second))
                        .or_insert_with(|| PairEntry {
                            sentences: Vec::new(),
                            interesting: predicate.is_interesting(first, second),
                        });
                    // sentences arrive in document order, once each
                    entry.sentences.push(sid);
                }
            }
        }
        let interesting = pairs.values().filter(|e| e.interesting).count();
        info!(
            "found {} co-occurring basic type pairs ({} interesting) in {} ms",
            pairs.len(),
            interesting,
            start.elapsed().as_millis()
        );
        Self { pairs }
    }

    /// Number of co-occurring pairs, interesting or not.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn is_interesting(&self, pair: &BasicTypePair) -> bool {
        self.pairs.get(pair).is_some_and(|e| e.interesting)
    }

    fn interesting(&self) -> impl Iterator<Item = (&BasicTypePair, &PairEntry)> + '_ {
        self.pairs.iter().filter(|(_, e)| e.interesting)
    }

    /// Basic types taking part in at least one interesting pair, sorted.
    pub fn list_basic_types(&self) -> Vec<&str> {
        let labels: BTreeSet<&str> = self
            .interesting()
            .flat_map(|(pair, _)| [pair.first(), pair.second()])
            .collect();
        labels.into_iter().collect()
    }

    /// Sentences realizing the pair, in document order, whether or not the
    /// pair is interesting. Argument order is irrelevant.
    pub fn examples_for_pair(&self, a: &str, b: &str) -> Result<&[SentenceId], LookupError> {
        let pair = BasicTypePair::new(a, b);
        self.pairs
            .get(&pair)
            .map(|e| e.sentences.as_slice())
            .ok_or_else(|| LookupError::UnknownPair(pair.to_string()))
    }

    /// [`examples_for_pair`](Self::examples_for_pair) for a `T1-T2` string.
    pub fn examples_for(&self, raw: &str) -> Result<&[SentenceId], LookupError> {
        let pair = BasicTypePair::parse(raw)
            .ok_or_else(|| LookupError::MalformedPair(raw.trim().to_string()))?;
        self.examples_for_pair(pair.first(), pair.second())
    }

    /// Every interesting pair, most frequent first, ties broken by pair.
    pub fn list_interesting_pairs(&self) -> Vec<PairCount> {
        let mut counts: Vec<PairCount> = self
            .interesting()
            .map(|(pair, entry)| PairCount {
                pair: pair.clone(),
                count: entry.sentences.len(),
            })
            .collect();
        counts.sort_by(|x, y| y.count.cmp(&x.count).then_with(|| x.pair.cmp(&y.pair)));
        counts
    }

    /// Interesting pairs involving `label`, in the same order as
    /// [`list_interesting_pairs`](Self::list_interesting_pairs).
    pub fn pairs_with(&self, label: &str) -> Vec<PairCount> {
        let mut counts = self.list_interesting_pairs();
        counts.retain(|c| c.pair.contains(label));
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcor_db::{BasicTypeMap, parse_markup};

    const MARKUP: &str = "<p pnum=1>
<s snum=1>
<wf pos=NN lemma=jury wnsn=1 lexsn=1:14:00::>jury</wf>
<wf pos=VB lemma=say wnsn=1 lexsn=2:32:00::>said</wf>
<wf pos=NN lemma=term wnsn=2 lexsn=1:28:00::>term</wf>
</s>
<s snum=2>
<wf pos=NN lemma=jury wnsn=1 lexsn=1:14:00::>jury</wf>
<wf pos=VB lemma=say wnsn=1 lexsn=2:32:00::>said</wf>
<wf pos=NN lemma=inquiry wnsn=1 lexsn=1:09:00::>inquiry</wf>
</s>
<s snum=3>
<wf pos=NN lemma=jury wnsn=1 lexsn=1:14:00::>jury</wf>
<wf pos=NN lemma=jury wnsn=1 lexsn=1:14:00::>jury</wf>
</s>
</p>";

    fn semcor() -> Semcor {
        Semcor::new(
            vec![parse_markup("br-a01", MARKUP).file],
            BasicTypeMap::from_pairs([
                ("jury%1:14:00::", "grp"),
                ("say%2:32:00::", "com"),
                ("term%1:28:00::", "tme"),
                ("inquiry%1:09:00::", "act psy"),
            ]),
        )
    }

    #[test]
    fn default_rules_reject_compound_and_excluded_labels() {
        let rules = PairRules::default().with_excluded(["ent", " ", "tme "]);
        assert!(rules.is_interesting("com", "grp"));
        assert!(!rules.is_interesting("com", "com"));
        assert!(!rules.is_interesting("act psy", "grp"));
        assert!(!rules.is_interesting("", "grp"));
        assert!(!rules.is_interesting("ent", "grp"));
        assert!(!rules.is_interesting("grp", "tme"));
        assert_eq!(rules.excluded().collect::<Vec<_>>(), vec!["ent", "tme"]);
    }

    #[test]
    fn counts_pairs_per_sentence() {
        let sc = semcor();
        let pairs = PairAnalyzer::build(&sc, &PairRules::default());
        let listed: Vec<_> = pairs
            .list_interesting_pairs()
            .into_iter()
            .map(|c| (c.pair.to_string(), c.count))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("com-grp".to_string(), 2),
                ("com-tme".to_string(), 1),
                ("grp-tme".to_string(), 1),
            ]
        );
        assert_eq!(pairs.list_basic_types(), vec!["com", "grp", "tme"]);
        assert_eq!(pairs.pairs_with("tme").len(), 2);
        assert!(pairs.pairs_with("hum").is_empty());
    }

    #[test]
    fn examples_are_symmetric_and_ordered() {
        let sc = semcor();
        let pairs = PairAnalyzer::build(&sc, &PairRules::default());
        let forward = pairs.examples_for_pair("com", "grp").unwrap();
        assert_eq!(forward, pairs.examples_for_pair("grp", "com").unwrap());
        assert_eq!(forward, pairs.examples_for("grp-com").unwrap());
        let labels: Vec<_> = forward
            .iter()
            .filter_map(|id| sc.sentence_label(*id))
            .collect();
        assert_eq!(labels, vec!["br-a01-1", "br-a01-2"]);

        assert_eq!(
            pairs.examples_for_pair("grp", "hum"),
            Err(LookupError::UnknownPair("grp-hum".into()))
        );
        assert_eq!(
            pairs.examples_for("grp"),
            Err(LookupError::MalformedPair("grp".into()))
        );
    }

    #[test]
    fn rejected_pairs_still_have_examples() {
        let sc = semcor();
        let pairs = PairAnalyzer::build(&sc, &PairRules::default().with_excluded(["com"]));
        assert!(pairs.list_interesting_pairs().iter().all(|c| !c.pair.contains("com")));
        assert!(!pairs.is_interesting(&BasicTypePair::new("com", "grp")));

        let excluded = pairs.examples_for_pair("grp", "com").unwrap();
        let labels: Vec<_> = excluded
            .iter()
            .filter_map(|id| sc.sentence_label(*id))
            .collect();
        assert_eq!(labels, vec!["br-a01-1", "br-a01-2"]);

        let compound = pairs.examples_for_pair("act psy", "grp").unwrap();
        assert_eq!(compound.len(), 1);
        assert_eq!(sc.sentence_label(compound[0]).as_deref(), Some("br-a01-2"));
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn closures_swap_the_rule() {
        let sc = semcor();
        let everything = |_: &str, _: &str| true;
        let pairs = PairAnalyzer::build(&sc, &everything);
        assert!(pairs.is_interesting(&BasicTypePair::new("act psy", "grp")));
        assert_eq!(pairs.list_interesting_pairs().len(), pairs.len());
        let none = PairAnalyzer::build(&sc, &|_: &str, _: &str| false);
        assert_eq!(none.len(), pairs.len());
        assert!(none.list_interesting_pairs().is_empty());
        assert!(none.list_basic_types().is_empty());
    }
}
