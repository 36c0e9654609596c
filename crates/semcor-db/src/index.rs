use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use semcor_types::{ProperNameCategory, SenseKey, SentenceId, WordformId, PROPER_NAME_TAG};

use crate::model::{CorpusFile, Wordform};

/// Occurrences of every lemma, keyed by `(lemma, pos)` and then by sense.
///
/// Wordforms without a sense key land in the `None` bucket so the counts of
/// an entry always add up to every wordform with that lemma and tag.
#[derive(Debug, Default)]
pub struct LemmaIndex {
    entries: BTreeMap<(String, String), LemmaEntry>,
    sentence_labels: HashMap<String, SentenceId>,
    proper_names: BTreeMap<ProperNameCategory, usize>,
    wordforms: usize,
}

#[derive(Debug, Default)]
pub struct LemmaEntry {
    senses: BTreeMap<Option<SenseKey>, Vec<WordformId>>,
}

impl LemmaEntry {
    pub fn senses(&self) -> impl Iterator<Item = (Option<&SenseKey>, &[WordformId])> + '_ {
        self.senses.iter().map(|(k, v)| (k.as_ref(), v.as_slice()))
    }

    pub fn count(&self) -> usize {
        self.senses.values().map(Vec::len).sum()
    }
}

impl LemmaIndex {
    /// Index every lemmatized wordform of `files` in one pass.
    pub fn build(files: &[CorpusFile]) -> Self {
        let mut index = Self::default();
        for (f, file) in files.iter().enumerate() {
            for (p, paragraph) in file.paragraphs.iter().enumerate() {
                for (s, sentence) in paragraph.sentences.iter().enumerate() {
                    let sid = SentenceId {
                        file: f as u32,
                        paragraph: p as u32,
                        sentence: s as u32,
                    };
                    index
                        .sentence_labels
                        .entry(sentence_label(&file.name, &sentence.snum))
                        .or_insert(sid);
                    for (t, wf) in sentence.wordforms() {
                        if let Some(category) = wf.proper_name() {
                            *index.proper_names.entry(category).or_default() += 1;
                        }
                        let Some(lemma) = &wf.lemma else {
                            continue;
                        };
                        let key = (lemma.clone(), wf.pos.clone().unwrap_or_default());
                        index
                            .entries
                            .entry(key)
                            .or_default()
                            .senses
                            .entry(wf.sense_key())
                            .or_default()
                            .push(WordformId {
                                sentence: sid,
                                token: t as u32,
                            });
                        index.wordforms += 1;
                    }
                }
            }
        }
        index
    }

    pub fn entry(&self, lemma: &str, pos: &str) -> Option<&LemmaEntry> {
        self.entries.get(&(lemma.to_string(), pos.to_string()))
    }

    /// Entries for `lemma`, one per tag, ordered by tag.
    pub fn entries_for<'a>(
        &'a self,
        lemma: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a LemmaEntry)> + 'a {
        self.entries
            .range((lemma.to_string(), String::new())..)
            .take_while(move |((l, _), _)| l == lemma)
            .map(|((_, pos), entry)| (pos.as_str(), entry))
    }

    /// Distinct lemmas in sorted order.
    pub fn lemmas(&self) -> impl Iterator<Item = &str> + '_ {
        let mut last: Option<&str> = None;
        self.entries.keys().filter_map(move |(lemma, _)| {
            if last == Some(lemma.as_str()) {
                return None;
            }
            last = Some(lemma.as_str());
            Some(lemma.as_str())
        })
    }

    pub fn sentence(&self, label: &str) -> Option<SentenceId> {
        self.sentence_labels.get(label).copied()
    }

    /// Wordforms whose `pn` attribute names `category`, lemmatized or not.
    pub fn proper_name_count(&self, category: ProperNameCategory) -> usize {
        self.proper_names.get(&category).copied().unwrap_or(0)
    }

    pub fn wordform_count(&self) -> usize {
        self.wordforms
    }
}

/// `br-a01` + `12` -> `br-a01-12`.
pub fn sentence_label(file: &str, snum: &str) -> String {
    format!("{file}-{snum}")
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LemmaStatistics {
    pub lemma: String,
    pub total: usize,
    pub parts_of_speech: Vec<PosStatistics>,
    /// Present when `lemma` names a proper-name category.
    pub proper_names: Option<ProperNameGroup>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PosStatistics {
    pub pos: String,
    pub count: usize,
    pub senses: Vec<SenseStatistics>,
    /// Distinct labels of the senses above, sorted.
    pub basic_types: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SenseStatistics {
    pub sense_key: Option<String>,
    pub wnsn: Option<String>,
    pub lexsn: Option<String>,
    pub count: usize,
    pub basic_type: Option<String>,
}

/// Synthetic `NNP` bucket: every proper name of one category.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProperNameGroup {
    pub category: String,
    pub tag: &'static str,
    pub count: usize,
}

impl ProperNameGroup {
    pub(crate) fn new(category: ProperNameCategory, count: usize) -> Self {
        Self {
            category: category.to_string(),
            tag: PROPER_NAME_TAG,
            count,
        }
    }
}

/// One concordance hit with its sentence split around the keyword.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ConcordanceLine {
    #[serde(skip)]
    pub occurrence: WordformId,
    /// `file-snum` label of the containing sentence.
    pub sentence: String,
    pub pos: Option<String>,
    pub sense_key: Option<String>,
    pub wnsn: Option<String>,
    pub left: String,
    pub keyword: String,
    pub right: String,
}

impl ConcordanceLine {
    pub(crate) fn new(
        occurrence: WordformId,
        sentence: String,
        wf: &Wordform,
        (left, keyword, right): (String, String, String),
    ) -> Self {
        Self {
            occurrence,
            sentence,
            pos: wf.pos.clone(),
            sense_key: wf.sense_key().map(|k| k.to_string()),
            wnsn: wf.wnsn.clone(),
            left,
            keyword,
            right,
        }
    }

    /// Running text with the keyword wrapped in `open`/`close`.
    pub fn render(&self, open: &str, close: &str) -> String {
        let mut out = String::with_capacity(
            self.left.len() + self.keyword.len() + self.right.len() + open.len() + close.len() + 2,
        );
        if !self.left.is_empty() {
            out.push_str(&self.left);
            out.push(' ');
        }
        out.push_str(open);
        out.push_str(&self.keyword);
        out.push_str(close);
        if !self.right.is_empty() {
            out.push(' ');
            out.push_str(&self.right);
        }
        out
    }

    /// Left and right context cut to `width` characters.
    pub fn kwic(&self, width: usize) -> (String, &str, String) {
        let left_len = self.left.chars().count();
        let left = self.left.chars().skip(left_len.saturating_sub(width)).collect();
        let right = self.right.chars().take(width).collect();
        (left, &self.keyword, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_markup;

    fn files() -> Vec<CorpusFile> {
        let a = "<p pnum=1><s snum=1>
<wf pos=NN lemma=bank wnsn=1 lexsn=1:14:00::>bank</wf>
<wf pos=NN lemma=bank wnsn=2 lexsn=1:17:01::>bank</wf>
<wf pos=VB lemma=bank wnsn=1 lexsn=2:40:00::>banked</wf>
<wf pos=DT>the</wf>
</s><s snum=2>
<wf pos=NNS lemma=bank wnsn=1 lexsn=1:14:00::>banks</wf>
<wf pos=NN lemma=bank>bank</wf>
</s></p>";
        let b = "<p pnum=1><s snum=1>
<wf pos=NN lemma=bank wnsn=1 lexsn=1:14:00::>bank</wf>
</s></p>";
        vec![parse_markup("br-a01", a).file, parse_markup("br-a02", b).file]
    }

    #[test]
    fn groups_occurrences_by_tag_and_sense() {
        let index = LemmaIndex::build(&files());
        assert_eq!(index.wordform_count(), 6);

        let nn = index.entry("bank", "NN").unwrap();
        assert_eq!(nn.count(), 4);
        let senses: Vec<_> = nn
            .senses()
            .map(|(k, ids)| (k.map(|k| k.to_string()), ids.len()))
            .collect();
        assert_eq!(
            senses,
            vec![
                (None, 1),
                (Some("bank%1:14:00::".to_string()), 2),
                (Some("bank%1:17:01::".to_string()), 1),
            ]
        );

        let tags: Vec<_> = index.entries_for("bank").map(|(pos, _)| pos).collect();
        assert_eq!(tags, vec!["NN", "NNS", "VB"]);
        assert!(index.entries_for("ban").next().is_none());
        assert!(index.entries_for("the").next().is_none());
    }

    #[test]
    fn occurrence_lists_follow_document_order() {
        let index = LemmaIndex::build(&files());
        let nn = index.entry("bank", "NN").unwrap();
        let (_, ids) = nn
            .senses()
            .find(|(k, _)| k.is_some_and(|k| k.lexsn == "1:14:00::"))
            .unwrap();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids[1].sentence.file, 1);
    }

    #[test]
    fn maps_sentence_labels() {
        let index = LemmaIndex::build(&files());
        let sid = index.sentence("br-a01-2").unwrap();
        assert_eq!((sid.file, sid.paragraph, sid.sentence), (0, 0, 1));
        assert!(index.sentence("br-a02-2").is_none());
        let lemmas: Vec<_> = index.lemmas().collect();
        assert_eq!(lemmas, vec!["bank"]);
    }

    #[test]
    fn renders_concordance_lines() {
        let line = ConcordanceLine {
            occurrence: WordformId {
                sentence: SentenceId {
                    file: 0,
                    paragraph: 0,
                    sentence: 0,
                },
                token: 1,
            },
            sentence: "br-a01-1".into(),
            pos: Some("NN".into()),
            sense_key: None,
            wnsn: None,
            left: "the old".into(),
            keyword: "bank".into(),
            right: "closed .".into(),
        };
        assert_eq!(line.render("[", "]"), "the old [bank] closed .");
        let (l, k, r) = line.kwic(3);
        assert_eq!((l.as_str(), k, r.as_str()), ("old", "bank", "clo"));
    }
}
