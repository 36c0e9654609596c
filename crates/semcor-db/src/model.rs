//! Owned object graph for one Semcor file.
//!
//! `CorpusFile` owns its paragraphs, paragraphs own sentences and sentences own
//! tokens. Nothing in here points upwards; navigation from a token back to its
//! sentence goes through the arena ids in [`semcor_types`].

use serde::{Deserialize, Serialize};

use semcor_types::{ProperNameCategory, SenseKey, WordClass};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CorpusFile {
    pub name: String,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub pnum: String,
    pub sentences: Vec<Sentence>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub snum: String,
    pub tokens: Vec<Token>,
}

/// A `<wf>` or `<punc>` element.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Token {
    Word(Wordform),
    Punct(Punctuation),
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Punctuation {
    pub text: String,
}

/// A `<wf>` element, possibly spanning several words (`primary_election`).
///
/// Every annotation is optional; untagged function words only carry `cmd`,
/// `pos` and the text.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Wordform {
    pub text: String,
    pub cmd: Option<String>,
    pub pos: Option<String>,
    pub lemma: Option<String>,
    pub wnsn: Option<String>,
    pub lexsn: Option<String>,
    pub rdf: Option<String>,
    pub pn: Option<String>,
    pub ot: Option<String>,
    /// Attributes without a dedicated field, in document order.
    pub extra: Vec<(String, String)>,
}

impl CorpusFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paragraphs: Vec::new(),
        }
    }

    pub fn sentence_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.sentences.len()).sum()
    }

    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> + '_ {
        self.paragraphs.iter().flat_map(|p| p.sentences.iter())
    }

    pub fn wordforms(&self) -> impl Iterator<Item = &Wordform> + '_ {
        self.sentences().flat_map(Sentence::wordforms).map(|(_, wf)| wf)
    }

    /// Paragraph and sentence index of the sentence numbered `snum`.
    pub fn find_sentence(&self, snum: &str) -> Option<(usize, usize)> {
        self.paragraphs.iter().enumerate().find_map(|(p_idx, p)| {
            p.sentences
                .iter()
                .position(|s| s.snum == snum)
                .map(|s_idx| (p_idx, s_idx))
        })
    }
}

impl Paragraph {
    pub fn new(pnum: impl Into<String>) -> Self {
        Self {
            pnum: pnum.into(),
            sentences: Vec::new(),
        }
    }
}

impl Sentence {
    pub fn new(snum: impl Into<String>) -> Self {
        Self {
            snum: snum.into(),
            tokens: Vec::new(),
        }
    }

    pub fn token(&self, position: usize) -> Option<&Token> {
        self.tokens.get(position)
    }

    /// Word tokens with their position in the sentence.
    pub fn wordforms(&self) -> impl Iterator<Item = (usize, &Wordform)> + '_ {
        self.tokens.iter().enumerate().filter_map(|(i, t)| match t {
            Token::Word(wf) => Some((i, wf)),
            Token::Punct(_) => None,
        })
    }

    /// Token texts joined with single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Keyword in context: at most `width` characters on each side.
    pub fn kwic(&self, position: usize, width: usize) -> Option<(String, String, String)> {
        let (left, keyword, right) = self.split_at_token(position)?;
        Some((tail_chars(&left, width), keyword, head_chars(&right, width)))
    }

    /// Full left context, token text and right context around `position`.
    pub fn split_at_token(&self, position: usize) -> Option<(String, String, String)> {
        let keyword = self.tokens.get(position)?.text().to_string();
        let left = self.tokens[..position]
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ");
        let right = self.tokens[position + 1..]
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ");
        Some((left, keyword, right))
    }
}

impl Token {
    pub fn text(&self) -> &str {
        match self {
            Token::Word(wf) => &wf.text,
            Token::Punct(p) => &p.text,
        }
    }

    pub fn as_wordform(&self) -> Option<&Wordform> {
        match self {
            Token::Word(wf) => Some(wf),
            Token::Punct(_) => None,
        }
    }
}

impl Wordform {
    /// A wordform counts as sense-tagged when it has both `wnsn` and `lexsn`.
    pub fn has_sense(&self) -> bool {
        self.wnsn.is_some() && self.lexsn.is_some()
    }

    pub fn sense_key(&self) -> Option<SenseKey> {
        match (&self.lemma, &self.wnsn, &self.lexsn) {
            (Some(lemma), Some(_), Some(lexsn)) => Some(SenseKey::new(lemma, lexsn)),
            _ => None,
        }
    }

    pub fn word_class(&self) -> Option<WordClass> {
        self.pos.as_deref().and_then(WordClass::from_tag)
    }

    pub fn proper_name(&self) -> Option<ProperNameCategory> {
        self.pn.as_deref().and_then(ProperNameCategory::from_name)
    }

    /// Names of the attributes present on the original tag.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> + '_ {
        let known = [
            ("cmd", &self.cmd),
            ("pos", &self.pos),
            ("lemma", &self.lemma),
            ("wnsn", &self.wnsn),
            ("lexsn", &self.lexsn),
            ("rdf", &self.rdf),
            ("pn", &self.pn),
            ("ot", &self.ot),
        ];
        known
            .into_iter()
            .filter(|(_, v)| v.is_some())
            .map(|(name, _)| name)
            .chain(self.extra.iter().map(|(name, _)| name.as_str()))
    }

    /// Store an attribute, routing known names to their fields.
    pub fn set_attribute(&mut self, name: &str, value: String) {
        let slot = match name {
            "cmd" => &mut self.cmd,
            "pos" => &mut self.pos,
            "lemma" => &mut self.lemma,
            "wnsn" => &mut self.wnsn,
            "lexsn" => &mut self.lexsn,
            "rdf" => &mut self.rdf,
            "pn" => &mut self.pn,
            "ot" => &mut self.ot,
            _ => {
                self.extra.push((name.to_string(), value));
                return;
            }
        };
        *slot = Some(value);
    }
}

fn tail_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}

fn head_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Token {
        Token::Word(Wordform {
            text: text.to_string(),
            ..Wordform::default()
        })
    }

    #[test]
    fn sense_key_requires_wnsn_and_lexsn() {
        let mut wf = Wordform {
            text: "said".into(),
            lemma: Some("say".into()),
            lexsn: Some("2:32:00::".into()),
            ..Wordform::default()
        };
        assert!(!wf.has_sense());
        assert_eq!(wf.sense_key(), None);
        wf.wnsn = Some("1".into());
        assert!(wf.has_sense());
        assert_eq!(wf.sense_key().unwrap().to_string(), "say%2:32:00::");
    }

    #[test]
    fn attributes_route_to_fields() {
        let mut wf = Wordform::default();
        wf.set_attribute("pos", "NNP".into());
        wf.set_attribute("pn", "person".into());
        wf.set_attribute("dc", "1".into());
        assert_eq!(wf.pos.as_deref(), Some("NNP"));
        assert_eq!(wf.proper_name(), Some(ProperNameCategory::Person));
        assert_eq!(wf.extra, vec![("dc".to_string(), "1".to_string())]);
        let names: Vec<_> = wf.attribute_names().collect();
        assert_eq!(names, vec!["pos", "pn", "dc"]);
    }

    #[test]
    fn kwic_truncates_on_char_boundaries() {
        let mut s = Sentence::new("1");
        s.tokens = vec![
            word("déjà"),
            word("vu"),
            word("again"),
            Token::Punct(Punctuation { text: ".".into() }),
        ];
        assert_eq!(s.text(), "déjà vu again .");
        let (left, kw, right) = s.kwic(2, 4).unwrap();
        assert_eq!(left, "à vu");
        assert_eq!(kw, "again");
        assert_eq!(right, ".");
        assert!(s.kwic(9, 4).is_none());
    }

    #[test]
    fn finds_sentences_by_number() {
        let mut file = CorpusFile::new("br-a01");
        let mut p1 = Paragraph::new("1");
        p1.sentences.push(Sentence::new("1"));
        let mut p2 = Paragraph::new("2");
        p2.sentences.push(Sentence::new("2"));
        p2.sentences.push(Sentence::new("3"));
        file.paragraphs = vec![p1, p2];
        assert_eq!(file.sentence_count(), 3);
        assert_eq!(file.find_sentence("3"), Some((1, 1)));
        assert_eq!(file.find_sentence("4"), None);
    }
}
