//! Global sentence offsets over an ordered file list.
//!
//! External pipelines (dependency parsers, taggers) number the sentences of
//! a fixed file list from zero. Building a [`SentenceIndex`] from the same
//! list lines Semcor sentences up with those numbers.

use std::collections::HashSet;
use std::ops::Range;

use tracing::{debug, warn};

use semcor_types::SentenceId;

use crate::model::CorpusFile;

#[derive(Clone, Debug, Default)]
pub struct SentenceIndex {
    offsets: Vec<SentenceId>,
    files: Vec<(String, Range<usize>)>,
}

impl SentenceIndex {
    /// Number the sentences of the named files, in list order.
    ///
    /// Names that are not loaded contribute nothing; repeated names are only
    /// numbered the first time.
    pub fn build<S: AsRef<str>>(files: &[CorpusFile], names: &[S]) -> Self {
        let mut index = Self::default();
        let mut seen = HashSet::new();
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                warn!("{name} listed twice; keeping the first position");
                continue;
            }
            let Some((f, file)) = files.iter().enumerate().find(|(_, file)| file.name == name)
            else {
                debug!("{name} is not loaded, skipping");
                continue;
            };
            let start = index.offsets.len();
            for (p, paragraph) in file.paragraphs.iter().enumerate() {
                for s in 0..paragraph.sentences.len() {
                    index.offsets.push(SentenceId {
                        file: f as u32,
                        paragraph: p as u32,
                        sentence: s as u32,
                    });
                }
            }
            index
                .files
                .push((name.to_string(), start..index.offsets.len()));
        }
        index
    }

    pub fn get(&self, offset: usize) -> Option<SentenceId> {
        self.offsets.get(offset).copied()
    }

    /// Offsets assigned to `name`, if it was indexed.
    pub fn file_range(&self, name: &str) -> Option<Range<usize>> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.clone())
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Split a file-list manifest on any whitespace.
pub fn parse_file_list(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Sentence};

    fn file(name: &str, shape: &[usize]) -> CorpusFile {
        let mut file = CorpusFile::new(name);
        for (p, count) in shape.iter().enumerate() {
            let mut paragraph = Paragraph::new((p + 1).to_string());
            for s in 0..*count {
                paragraph.sentences.push(Sentence::new((s + 1).to_string()));
            }
            file.paragraphs.push(paragraph);
        }
        file
    }

    #[test]
    fn numbers_sentences_in_list_order() {
        let files = vec![file("br-a01", &[2, 1]), file("br-a02", &[2])];
        let index = SentenceIndex::build(&files, &["br-a02", "br-zz9", "br-a01"]);
        assert_eq!(index.len(), 5);
        assert_eq!(index.file_range("br-a02"), Some(0..2));
        assert_eq!(index.file_range("br-a01"), Some(2..5));
        assert_eq!(index.file_range("br-zz9"), None);
        assert_eq!(
            index.get(4),
            Some(SentenceId {
                file: 0,
                paragraph: 1,
                sentence: 0
            })
        );
        assert_eq!(index.get(5), None);
    }

    #[test]
    fn repeated_names_are_numbered_once() {
        let files = vec![file("br-a01", &[3])];
        let index = SentenceIndex::build(&files, &["br-a01", "br-a01"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn manifest_accepts_spaces_and_newlines() {
        assert_eq!(
            parse_file_list("br-a01 br-a02\nbr-b13\r\n\n  br-c01\t"),
            vec!["br-a01", "br-a02", "br-b13", "br-c01"]
        );
        assert!(parse_file_list(" \n").is_empty());
    }
}
