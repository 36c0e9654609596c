//! Lemmas whose senses fall under different basic types within one document.
//!
//! For every lemma and document, the sense-tagged occurrences are grouped by
//! basic type. When a document uses the lemma with two or more simple types,
//! every pair of those types records the lemma and the occurrences that carry
//! one of the two types. Compound labels (`act psy`) never form pairs.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use semcor_db::Semcor;
use semcor_types::{BasicTypePair, WordformId};

#[derive(Debug, Default)]
pub struct DocumentPolysemy {
    pairs: BTreeMap<BasicTypePair, PairOccurrences>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PairOccurrences {
    /// Occurrences per lemma, in document order.
    pub lemmas: BTreeMap<String, Vec<WordformId>>,
}

impl PairOccurrences {
    pub fn lemma_count(&self) -> usize {
        self.lemmas.len()
    }

    pub fn instances(&self) -> usize {
        self.lemmas.values().map(Vec::len).sum()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PairSummary {
    #[serde(serialize_with = "crate::pair_label")]
    pub pair: BasicTypePair,
    pub lemmas: usize,
    pub instances: usize,
}

impl DocumentPolysemy {
    pub fn build(semcor: &Semcor) -> Self {
        let mut groups: BTreeMap<(&str, u32), Vec<(WordformId, &str)>> = BTreeMap::new();
        for (id, wf) in semcor.sense_tagged() {
            let (Some(lemma), Some(label)) = (wf.lemma.as_deref(), semcor.basic_type(wf)) else {
                continue;
            };
            groups
                .entry((lemma, id.sentence.file))
                .or_default()
                .push((id, label));
        }

        let mut pairs: BTreeMap<BasicTypePair, PairOccurrences> = BTreeMap::new();
        for ((lemma, file), occurrences) in groups {
            let labels: BTreeSet<&str> = occurrences
                .iter()
                .map(|(_, label)| *label)
                .filter(|label| !label.contains(char::is_whitespace))
                .collect();
            if labels.len() < 2 {
                continue;
            }
            debug!("{lemma} has {} basic types in file {file}", labels.len());
            let labels: Vec<&str> = labels.into_iter().collect();
            for (i, first) in labels.iter().enumerate() {
                for second in &labels[i + 1..] {
                    let matching = occurrences
                        .iter()
                        .filter(|(_, label)| label == first || label == second)
                        .map(|(id, _)| *id);
                    pairs
                        .entry(BasicTypePair::new(*first, *second))
                        .or_default()
                        .lemmas
                        .entry(lemma.to_string())
                        .or_default()
                        .extend(matching);
                }
            }
        }
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<&PairOccurrences> {
        self.pairs.get(&BasicTypePair::new(a, b))
    }

    /// Pairs seen with at least `min_lemmas` lemmas and `min_instances`
    /// occurrences, ordered by pair.
    pub fn pairs(
        &self,
        min_lemmas: usize,
        min_instances: usize,
    ) -> impl Iterator<Item = (&BasicTypePair, &PairOccurrences)> + '_ {
        self.pairs.iter().filter(move |(_, occ)| {
            occ.lemma_count() >= min_lemmas && occ.instances() >= min_instances
        })
    }

    pub fn summary(&self) -> Vec<PairSummary> {
        self.pairs
            .iter()
            .map(|(pair, occ)| PairSummary {
                pair: pair.clone(),
                lemmas: occ.lemma_count(),
                instances: occ.instances(),
            })
            .collect()
    }
}
