//! Parse, cache and index the Semcor sense-annotated corpus.
//!
//! Semcor tagfiles are read by a forgiving parser into an owned object graph
//! (files, paragraphs, sentences, tokens). Each parsed file is compiled to a
//! versioned cache artifact so later runs skip parsing. Loading builds a
//! [`Semcor`] that indexes every lemma occurrence by tag and sense, resolves
//! basic types through a [`BasicTypeMap`] and answers statistics,
//! concordance and sentence lookups.
//!
//! Indexes refer back into the graph with arena ids ([`SentenceId`],
//! [`WordformId`]) rather than references, so they can never outlive or
//! alter the files they describe.
//!
//! # Example
//! ```no_run
//! use semcor_db::{BasicTypeMap, CacheStore, Corpus};
//! use semcor_types::WordClass;
//!
//! # fn main() -> anyhow::Result<()> {
//! let corpus = Corpus::discover("/path/to/semcor3.0", CacheStore::new("data/compiled"))?;
//! corpus.compile(Some(5));
//! let (semcor, report) = corpus.load(Some(5), BasicTypeMap::default());
//! assert!(!report.needs_recompile());
//!
//! let stats = semcor.statistics("walk")?;
//! println!("walk occurs {} times", stats.total);
//! for line in semcor.concordance("walk", WordClass::Verb) {
//!     println!("{}: {}", line.sentence, line.render("[", "]"));
//! }
//! # Ok(()) }
//! ```

pub mod analysis;
pub mod btypes;
pub mod cache;
pub mod corpus;
pub mod index;
pub mod model;
pub mod parser;
pub mod sentences;

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use semcor_types::{ProperNameCategory, SentenceId, WordClass, WordformId};

pub use btypes::{BasicTypeMap, MappingError};
pub use cache::{CACHE_FORMAT_VERSION, CacheError, CacheStore};
pub use corpus::{CompileReport, Corpus, CorpusError, LoadMode, LoadReport, SourceError, SourceFile};
pub use index::{
    ConcordanceLine, LemmaIndex, LemmaStatistics, PosStatistics, ProperNameGroup,
    SenseStatistics, sentence_label,
};
pub use model::{CorpusFile, Paragraph, Punctuation, Sentence, Token, Wordform};
pub use parser::{ParseIssue, ParsedFile, parse_markup};
pub use sentences::{SentenceIndex, parse_file_list};

/// A query that found nothing.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LookupError {
    #[error("lemma `{0}` does not occur in the loaded files")]
    UnknownLemma(String),
    #[error("no sentence `{0}`")]
    UnknownSentence(String),
    #[error("`{0}` is not a sentence id (expected FILE-NUMBER, e.g. br-a01-12)")]
    MalformedSentenceId(String),
    #[error("no sentence index has been built")]
    NoSentenceIndex,
    #[error("sentence offset {0} is outside the sentence index")]
    UnknownOffset(usize),
    #[error("basic types {0} never co-occur")]
    UnknownPair(String),
    #[error("`{0}` is not a basic type pair (expected T1-T2)")]
    MalformedPair(String),
}

/// Loaded files plus their indexes.
pub struct Semcor {
    files: Vec<CorpusFile>,
    btypes: BasicTypeMap,
    index: LemmaIndex,
    sentence_index: Option<SentenceIndex>,
}

impl Semcor {
    /// Take ownership of `files` and index them.
    pub fn new(files: Vec<CorpusFile>, btypes: BasicTypeMap) -> Self {
        let index = LemmaIndex::build(&files);
        Self {
            files,
            btypes,
            index,
            sentence_index: None,
        }
    }

    pub fn files(&self) -> &[CorpusFile] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&CorpusFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn btypes(&self) -> &BasicTypeMap {
        &self.btypes
    }

    pub fn index(&self) -> &LemmaIndex {
        &self.index
    }

    pub fn sentence_count(&self) -> usize {
        self.files.iter().map(CorpusFile::sentence_count).sum()
    }

    pub fn paragraph_of(&self, id: SentenceId) -> Option<&Paragraph> {
        self.files
            .get(id.file as usize)?
            .paragraphs
            .get(id.paragraph as usize)
    }

    pub fn sentence(&self, id: SentenceId) -> Option<&Sentence> {
        self.paragraph_of(id)?.sentences.get(id.sentence as usize)
    }

    pub fn wordform(&self, id: WordformId) -> Option<&Wordform> {
        self.sentence(id.sentence)?
            .token(id.token as usize)?
            .as_wordform()
    }

    /// `file-snum` label, e.g. `br-a01-12`.
    pub fn sentence_label(&self, id: SentenceId) -> Option<String> {
        let file = self.files.get(id.file as usize)?;
        let sentence = self.sentence(id)?;
        Some(sentence_label(&file.name, &sentence.snum))
    }

    /// Every sentence in document order.
    pub fn sentences(&self) -> impl Iterator<Item = (SentenceId, &Sentence)> + '_ {
        self.files.iter().enumerate().flat_map(|(f, file)| {
            file.paragraphs
                .iter()
                .enumerate()
                .flat_map(move |(p, paragraph)| {
                    paragraph.sentences.iter().enumerate().map(move |(s, sentence)| {
                        let id = SentenceId {
                            file: f as u32,
                            paragraph: p as u32,
                            sentence: s as u32,
                        };
                        (id, sentence)
                    })
                })
        })
    }

    /// Sense-tagged wordforms in document order.
    pub fn sense_tagged(&self) -> impl Iterator<Item = (WordformId, &Wordform)> + '_ {
        self.sentences().flat_map(|(sid, sentence)| {
            sentence
                .wordforms()
                .filter(|(_, wf)| wf.has_sense())
                .map(move |(t, wf)| {
                    let id = WordformId {
                        sentence: sid,
                        token: t as u32,
                    };
                    (id, wf)
                })
        })
    }

    /// Basic type label of a sense-tagged wordform.
    pub fn basic_type(&self, wf: &Wordform) -> Option<&str> {
        self.btypes.get(&wf.sense_key()?)
    }

    /// Occurrence counts of `lemma` per tag and sense.
    ///
    /// For `person`, `group` and `location` the result also carries the
    /// synthetic `NNP` group counting every proper name of that category.
    pub fn statistics(&self, lemma: &str) -> Result<LemmaStatistics, LookupError> {
        let mut parts = Vec::new();
        let mut total = 0;
        for (pos, entry) in self.index.entries_for(lemma) {
            let mut senses = Vec::new();
            let mut basic_types = BTreeSet::new();
            for (key, ids) in entry.senses() {
                let first = ids.first().and_then(|id| self.wordform(*id));
                let basic_type = key
                    .and_then(|k| self.btypes.get(k))
                    .map(str::to_string);
                if let Some(label) = &basic_type {
                    basic_types.insert(label.clone());
                }
                senses.push(SenseStatistics {
                    sense_key: key.map(ToString::to_string),
                    wnsn: first.and_then(|wf| wf.wnsn.clone()),
                    lexsn: key.map(|k| k.lexsn.clone()),
                    count: ids.len(),
                    basic_type,
                });
            }
            let count = entry.count();
            total += count;
            parts.push(PosStatistics {
                pos: pos.to_string(),
                count,
                senses,
                basic_types: basic_types.into_iter().collect(),
            });
        }

        let proper_names = ProperNameCategory::from_name(lemma)
            .map(|category| ProperNameGroup::new(category, self.index.proper_name_count(category)))
            .filter(|group| group.count > 0);

        if parts.is_empty() && proper_names.is_none() {
            return Err(LookupError::UnknownLemma(lemma.to_string()));
        }
        Ok(LemmaStatistics {
            lemma: lemma.to_string(),
            total,
            parts_of_speech: parts,
            proper_names,
        })
    }

    /// Every occurrence of `lemma` tagged as `class`, in document order.
    pub fn concordance(&self, lemma: &str, class: WordClass) -> Vec<ConcordanceLine> {
        let mut ids: Vec<WordformId> = self
            .index
            .entries_for(lemma)
            .filter(|(pos, _)| class.matches_tag(pos))
            .flat_map(|(_, entry)| entry.senses())
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.concordance_line(id))
            .collect()
    }

    pub fn concordance_line(&self, id: WordformId) -> Option<ConcordanceLine> {
        let sentence = self.sentence(id.sentence)?;
        let wf = sentence.token(id.token as usize)?.as_wordform()?;
        let parts = sentence.split_at_token(id.token as usize)?;
        let label = self.sentence_label(id.sentence)?;
        Some(ConcordanceLine::new(id, label, wf, parts))
    }

    /// Resolve a `file-snum` label such as `br-a01-12`.
    pub fn sentence_by_id(&self, sid: &str) -> Result<SentenceId, LookupError> {
        let sid = sid.trim();
        if let Some(id) = self.index.sentence(sid) {
            return Ok(id);
        }
        match sid.rsplit_once('-') {
            Some((file, snum))
                if !file.is_empty()
                    && !snum.is_empty()
                    && snum.chars().all(|c| c.is_ascii_digit()) =>
            {
                Err(LookupError::UnknownSentence(sid.to_string()))
            }
            _ => Err(LookupError::MalformedSentenceId(sid.to_string())),
        }
    }

    /// Number the sentences of `names` from zero, replacing any earlier index.
    pub fn create_sentence_index<S: AsRef<str>>(&mut self, names: &[S]) -> &SentenceIndex {
        self.sentence_index
            .insert(SentenceIndex::build(&self.files, names))
    }

    pub fn sentence_index(&self) -> Option<&SentenceIndex> {
        self.sentence_index.as_ref()
    }

    pub fn sentence_at(&self, offset: usize) -> Result<SentenceId, LookupError> {
        self.sentence_index
            .as_ref()
            .ok_or(LookupError::NoSentenceIndex)?
            .get(offset)
            .ok_or(LookupError::UnknownOffset(offset))
    }
}

impl fmt::Display for Semcor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Semcor with {} files, {} sentences, {} indexed wordforms>",
            self.files.len(),
            self.sentence_count(),
            self.index.wordform_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A01: &str = "<p pnum=1>
<s snum=1>
<wf cmd=done rdf=person pos=NNP lemma=person wnsn=1 lexsn=1:03:00:: pn=person>John_Smith</wf>
<wf cmd=done pos=VB lemma=walk wnsn=1 lexsn=2:38:00::>walked</wf>
<wf cmd=done pos=NN lemma=person wnsn=1 lexsn=1:03:00::>person</wf>
<punc>.</punc>
</s>
</p>
<p pnum=2>
<s snum=2>
<wf cmd=done rdf=person pos=NNP lemma=person wnsn=1 lexsn=1:03:00:: pn=person>Mary</wf>
<wf cmd=done pos=NN lemma=walk wnsn=1 lexsn=1:04:00::>walk</wf>
</s>
</p>";

    const A02: &str = "<p pnum=1>
<s snum=1>
<wf cmd=done pos=VB lemma=walk wnsn=1 lexsn=2:38:00::>walks</wf>
<wf cmd=done rdf=location pos=NNP lemma=location wnsn=1 lexsn=1:15:00:: pn=location>Paris</wf>
</s>
</p>";

    fn semcor() -> Semcor {
        let btypes = BasicTypeMap::from_pairs([
            ("walk%2:38:00::", "act"),
            ("walk%1:04:00::", "act evt"),
            ("person%1:03:00::", "hum"),
        ]);
        Semcor::new(
            vec![
                parse_markup("br-a01", A01).file,
                parse_markup("br-a02", A02).file,
            ],
            btypes,
        )
    }

    #[test]
    fn statistics_counts_per_tag_and_sense() {
        let sc = semcor();
        let stats = sc.statistics("walk").unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.proper_names, None);
        let tags: Vec<_> = stats
            .parts_of_speech
            .iter()
            .map(|p| (p.pos.as_str(), p.count))
            .collect();
        assert_eq!(tags, vec![("NN", 1), ("VB", 2)]);
        let vb = &stats.parts_of_speech[1];
        assert_eq!(vb.senses[0].sense_key.as_deref(), Some("walk%2:38:00::"));
        assert_eq!(vb.senses[0].wnsn.as_deref(), Some("1"));
        assert_eq!(vb.senses[0].basic_type.as_deref(), Some("act"));
        assert_eq!(vb.basic_types, vec!["act".to_string()]);
        assert_eq!(
            stats.parts_of_speech[0].basic_types,
            vec!["act evt".to_string()]
        );
    }

    #[test]
    fn statistics_adds_proper_name_group() {
        let sc = semcor();
        let stats = sc.statistics("person").unwrap();
        let group = stats.proper_names.clone().unwrap();
        assert_eq!(group.tag, "NNP");
        assert_eq!(group.category, "person");
        assert_eq!(group.count, 2);
        // the per-sense entries are still there
        let nnp = stats
            .parts_of_speech
            .iter()
            .find(|p| p.pos == "NNP")
            .unwrap();
        assert_eq!(nnp.count, 2);
        assert_eq!(stats.total, 3);

        assert_eq!(sc.statistics("location").unwrap().proper_names.unwrap().count, 1);
    }

    #[test]
    fn statistics_on_unknown_lemma_is_not_found() {
        assert_eq!(
            semcor().statistics("unicorn"),
            Err(LookupError::UnknownLemma("unicorn".into()))
        );
    }

    #[test]
    fn concordance_is_in_document_order() {
        let sc = semcor();
        let lines = sc.concordance("walk", WordClass::Verb);
        let labels: Vec<_> = lines.iter().map(|l| l.sentence.as_str()).collect();
        assert_eq!(labels, vec!["br-a01-1", "br-a02-1"]);
        assert_eq!(
            lines[0].render("*", "*"),
            "John_Smith *walked* person ."
        );
        assert!(lines.windows(2).all(|w| w[0].occurrence < w[1].occurrence));
        assert!(sc.concordance("walk", WordClass::Adj).is_empty());
        assert!(sc.concordance("unicorn", WordClass::Noun).is_empty());
    }

    #[test]
    fn looks_up_sentences_by_label() {
        let sc = semcor();
        let id = sc.sentence_by_id("br-a01-2").unwrap();
        assert_eq!(sc.paragraph_of(id).unwrap().pnum, "2");
        assert_eq!(sc.sentence(id).unwrap().text(), "Mary walk");
        assert_eq!(
            sc.sentence_by_id("br-a01-9"),
            Err(LookupError::UnknownSentence("br-a01-9".into()))
        );
        assert_eq!(
            sc.sentence_by_id("nonsense"),
            Err(LookupError::MalformedSentenceId("nonsense".into()))
        );
    }

    #[test]
    fn sentence_index_replaces_previous_one() {
        let mut sc = semcor();
        assert_eq!(sc.sentence_at(0), Err(LookupError::NoSentenceIndex));
        sc.create_sentence_index(&["br-a02", "br-a01"]);
        assert_eq!(sc.sentence_label(sc.sentence_at(0).unwrap()).unwrap(), "br-a02-1");
        assert_eq!(sc.sentence_label(sc.sentence_at(2).unwrap()).unwrap(), "br-a01-2");
        assert_eq!(sc.sentence_at(3), Err(LookupError::UnknownOffset(3)));

        sc.create_sentence_index(&["br-a01"]);
        assert_eq!(sc.sentence_index().unwrap().len(), 2);
        assert_eq!(sc.sentence_label(sc.sentence_at(0).unwrap()).unwrap(), "br-a01-1");
    }

    #[test]
    fn sense_tagged_walks_document_order() {
        let sc = semcor();
        let texts: Vec<_> = sc.sense_tagged().map(|(_, wf)| wf.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["John_Smith", "walked", "person", "Mary", "walk", "walks", "Paris"]
        );
        assert_eq!(sc.basic_type(sc.wordform(sc.sense_tagged().nth(1).unwrap().0).unwrap()), Some("act"));
        assert_eq!(sc.to_string(), "<Semcor with 2 files, 3 sentences, 7 indexed wordforms>");
    }
}
