//! Shared vocabulary for Semcor tooling.
//!
//! Semcor annotates Brown corpus tokens with Penn Treebank tags, WordNet
//! lemmas and lexical sense ids (`lexsn`). This crate keeps the pieces that
//! every layer needs: coarse [`WordClass`]es derived from tags, the
//! [`SenseKey`] built from a lemma and its `lexsn`, positions inside a loaded
//! corpus ([`SentenceId`], [`WordformId`]) and unordered [`BasicTypePair`]s.
//!
//! ```rust
//! use semcor_types::{SenseKey, WordClass};
//!
//! assert_eq!(WordClass::from_tag("VBD"), Some(WordClass::Verb));
//! let key = SenseKey::parse("say%2:32:00::").unwrap();
//! assert_eq!(key.lemma, "say");
//! assert_eq!(key.lexsn, "2:32:00::");
//! ```

use std::fmt;

/// Tag used by Semcor for proper names.
pub const PROPER_NAME_TAG: &str = "NNP";

/// Coarse part of speech, derived from the prefix of a Penn Treebank tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum WordClass {
    Noun,
    Verb,
    Adj,
    Adv,
}

impl WordClass {
    pub const ALL: [WordClass; 4] = [
        WordClass::Noun,
        WordClass::Verb,
        WordClass::Adj,
        WordClass::Adv,
    ];

    /// Classify a tag such as `NNS` or `VBD`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| tag.starts_with(class.tag_prefix()))
    }

    /// Parse the one-letter code used by the browser (`n`, `v`, `a`, `r`).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(WordClass::Noun),
            'v' => Some(WordClass::Verb),
            'a' | 's' => Some(WordClass::Adj),
            'r' => Some(WordClass::Adv),
            _ => None,
        }
    }

    /// Tag prefix shared by every tag of this class.
    pub fn tag_prefix(self) -> &'static str {
        match self {
            WordClass::Noun => "NN",
            WordClass::Verb => "VB",
            WordClass::Adj => "JJ",
            WordClass::Adv => "RB",
        }
    }

    pub fn matches_tag(self, tag: &str) -> bool {
        tag.starts_with(self.tag_prefix())
    }
}

impl fmt::Display for WordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WordClass::Noun => "noun",
            WordClass::Verb => "verb",
            WordClass::Adj => "adj",
            WordClass::Adv => "adv",
        })
    }
}

/// Entity types Semcor uses as the lemma of proper names.
///
/// A tagged name such as `Fulton_County_Grand_Jury` carries `pos=NNP`,
/// `lemma=group`, `pn=group` and `rdf=group`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ProperNameCategory {
    Person,
    Group,
    Location,
}

impl ProperNameCategory {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "person" => Some(ProperNameCategory::Person),
            "group" => Some(ProperNameCategory::Group),
            "location" => Some(ProperNameCategory::Location),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProperNameCategory::Person => "person",
            ProperNameCategory::Group => "group",
            ProperNameCategory::Location => "location",
        }
    }
}

impl fmt::Display for ProperNameCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WordNet sense key, `lemma%lexsn`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SenseKey {
    pub lemma: String,
    pub lexsn: String,
}

impl SenseKey {
    pub fn new(lemma: impl Into<String>, lexsn: impl Into<String>) -> Self {
        Self {
            lemma: lemma.into(),
            lexsn: lexsn.into(),
        }
    }

    /// Split `lemma%lexsn`; both halves must be non-empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (lemma, lexsn) = raw.trim().split_once('%')?;
        if lemma.is_empty() || lexsn.is_empty() {
            return None;
        }
        Some(Self::new(lemma, lexsn))
    }
}

impl fmt::Display for SenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%{}", self.lemma, self.lexsn)
    }
}

/// Position of a sentence inside a loaded corpus.
///
/// Field order makes the derived ordering equal to document order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SentenceId {
    pub file: u32,
    pub paragraph: u32,
    pub sentence: u32,
}

/// Position of a token inside a loaded corpus.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct WordformId {
    pub sentence: SentenceId,
    pub token: u32,
}

/// Unordered pair of basic types, stored with the smaller label first.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BasicTypePair {
    first: String,
    second: String,
}

impl BasicTypePair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    /// Parse `T1-T2` as typed at the browser prompt.
    pub fn parse(raw: &str) -> Option<Self> {
        let (a, b) = raw.split_once('-')?;
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() {
            return None;
        }
        Some(Self::new(a, b))
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, label: &str) -> bool {
        self.first == label || self.second == label
    }
}

impl fmt::Display for BasicTypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}
