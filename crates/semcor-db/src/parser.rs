//! Best-effort reader for Semcor tagfiles.
//!
//! The files are SGML rather than XML: attribute values are mostly unquoted
//! (`lexsn=2:32:00::`) and nothing guarantees well-formedness. The reader
//! scans tags and text in a single pass, keeps what it can and reports every
//! recovery as a [`ParseIssue`] instead of failing.
//!
//! ```text
//! <p pnum=1>
//! <s snum=1>
//! <wf cmd=ignore pos=DT>The</wf>
//! <wf cmd=done pos=VB lemma=say wnsn=1 lexsn=2:32:00::>said</wf>
//! <punc>.</punc>
//! </s>
//! </p>
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::model::{CorpusFile, Paragraph, Punctuation, Sentence, Token, Wordform};

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<name>[A-Za-z_][\w.-]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'>]+))"#,
    )
    .expect("attribute pattern is valid")
});

/// Something the reader had to work around. Line numbers are 1-based.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseIssue {
    #[error("line {line}: tag is never terminated")]
    UnterminatedTag { line: usize },
    #[error("line {line}: malformed tag `{raw}`")]
    MalformedTag { line: usize, raw: String },
    #[error("line {line}: unexpected <{name}>")]
    UnexpectedElement { line: usize, name: String },
    #[error("line {line}: sentence outside a paragraph")]
    SentenceOutsideParagraph { line: usize },
    #[error("line {line}: <{name}> outside a sentence")]
    TokenOutsideSentence { line: usize, name: String },
    #[error("line {line}: <{name}> is never closed")]
    Unclosed { line: usize, name: String },
}

/// Result of reading one file: the model plus whatever had to be skipped.
#[derive(Clone, Debug)]
pub struct ParsedFile {
    pub file: CorpusFile,
    pub issues: Vec<ParseIssue>,
}

/// Parse the markup of the file called `name`.
pub fn parse_markup(name: &str, text: &str) -> ParsedFile {
    let mut builder = Builder::new(name);
    for (line, event) in Scanner::new(text) {
        match event {
            Event::Open { name, attrs } => builder.open(line, &name, attrs),
            Event::Close { name } => builder.close(line, &name),
            Event::Text(t) => builder.text(t),
            Event::Issue(issue) => builder.issues.push(issue),
        }
    }
    builder.finish()
}

enum Event<'a> {
    Open { name: String, attrs: &'a str },
    Close { name: String },
    Text(&'a str),
    Issue(ParseIssue),
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    counted_to: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            counted_to: 0,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        if offset > self.counted_to {
            self.line += self.src[self.counted_to..offset]
                .bytes()
                .filter(|b| *b == b'\n')
                .count();
            self.counted_to = offset;
        }
        self.line
    }

    fn tag(&mut self, start: usize, inner: &'a str) -> Option<Event<'a>> {
        let line = self.line_at(start);
        if let Some(rest) = inner.strip_prefix('/') {
            let name = rest.trim();
            if name.is_empty() || !name.chars().all(is_name_char) {
                return Some(malformed(line, inner));
            }
            return Some(Event::Close {
                name: name.to_ascii_lowercase(),
            });
        }
        if inner.starts_with('!') || inner.starts_with('?') {
            return None;
        }
        let name_len = inner
            .char_indices()
            .find(|(_, c)| !is_name_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(inner.len());
        let (name, attrs) = inner.split_at(name_len);
        if name.is_empty()
            || !attrs
                .chars()
                .next()
                .is_none_or(|c| c.is_whitespace() || c == '/')
        {
            return Some(malformed(line, inner));
        }
        Some(Event::Open {
            name: name.to_ascii_lowercase(),
            attrs: attrs.trim().trim_end_matches('/'),
        })
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = (usize, Event<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let src = self.src;
            if self.pos >= src.len() {
                return None;
            }
            let rest = &src[self.pos..];
            let Some(lt) = rest.find('<') else {
                let line = self.line_at(self.pos);
                self.pos = src.len();
                return Some((line, Event::Text(rest)));
            };
            if lt > 0 {
                let line = self.line_at(self.pos);
                self.pos += lt;
                return Some((line, Event::Text(&rest[..lt])));
            }

            let start = self.pos;
            let after = &rest[1..];
            let gt = after.find('>');
            let next_lt = after.find('<');
            match (gt, next_lt) {
                (None, _) => {
                    let line = self.line_at(start);
                    self.pos = src.len();
                    return Some((line, Event::Issue(ParseIssue::UnterminatedTag { line })));
                }
                (Some(g), Some(l)) if l < g => {
                    // A stray `<`: report it and resume at the next one.
                    let line = self.line_at(start);
                    self.pos = start + 1 + l;
                    return Some((line, malformed(line, &after[..l])));
                }
                (Some(g), _) => {
                    self.pos = start + 1 + g + 1;
                    let inner = &after[..g];
                    if let Some(event) = self.tag(start, inner) {
                        let line = self.line_at(start);
                        return Some((line, event));
                    }
                }
            }
        }
    }
}

fn malformed(line: usize, raw: &str) -> Event<'_> {
    Event::Issue(ParseIssue::MalformedTag {
        line,
        raw: raw.trim().to_string(),
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

enum Pending {
    Word(Wordform),
    Punct(Punctuation),
    Orphan,
}

struct Builder {
    file: CorpusFile,
    issues: Vec<ParseIssue>,
    in_paragraph: bool,
    in_sentence: bool,
    pending: Option<(usize, &'static str, Pending)>,
}

impl Builder {
    fn new(name: &str) -> Self {
        Self {
            file: CorpusFile::new(name),
            issues: Vec::new(),
            in_paragraph: false,
            in_sentence: false,
            pending: None,
        }
    }

    fn open(&mut self, line: usize, name: &str, attrs: &str) {
        match name {
            "p" => {
                self.close_sentence(line);
                self.file
                    .paragraphs
                    .push(Paragraph::new(attribute(attrs, "pnum").unwrap_or_default()));
                self.in_paragraph = true;
            }
            "s" => {
                self.close_sentence(line);
                if !self.in_paragraph {
                    self.issues
                        .push(ParseIssue::SentenceOutsideParagraph { line });
                    self.file.paragraphs.push(Paragraph::new(""));
                    self.in_paragraph = true;
                }
                if let Some(paragraph) = self.file.paragraphs.last_mut() {
                    paragraph
                        .sentences
                        .push(Sentence::new(attribute(attrs, "snum").unwrap_or_default()));
                }
                self.in_sentence = true;
            }
            "wf" | "punc" => {
                self.flush_token();
                let tag: &'static str = if name == "wf" { "wf" } else { "punc" };
                let pending = if !self.in_sentence {
                    self.issues.push(ParseIssue::TokenOutsideSentence {
                        line,
                        name: tag.to_string(),
                    });
                    Pending::Orphan
                } else if tag == "wf" {
                    let mut wf = Wordform::default();
                    for (key, value) in attributes(attrs) {
                        wf.set_attribute(&key, value);
                    }
                    Pending::Word(wf)
                } else {
                    Pending::Punct(Punctuation::default())
                };
                self.pending = Some((line, tag, pending));
            }
            "contextfile" | "context" => {}
            other => self.issues.push(ParseIssue::UnexpectedElement {
                line,
                name: other.to_string(),
            }),
        }
    }

    fn close(&mut self, line: usize, name: &str) {
        match name {
            "wf" | "punc" => {
                if matches!(&self.pending, Some((_, tag, _)) if *tag == name) {
                    self.complete_token();
                }
            }
            "s" => {
                self.flush_token();
                self.in_sentence = false;
            }
            "p" => {
                self.close_sentence(line);
                self.in_paragraph = false;
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        match &mut self.pending {
            Some((_, _, Pending::Word(wf))) => wf.text.push_str(text),
            Some((_, _, Pending::Punct(p))) => p.text.push_str(text),
            _ => {}
        }
    }

    fn close_sentence(&mut self, line: usize) {
        if self.in_sentence {
            self.flush_token();
            self.issues.push(ParseIssue::Unclosed {
                line,
                name: "s".to_string(),
            });
            self.in_sentence = false;
        }
    }

    /// Close a token that never saw its end tag.
    fn flush_token(&mut self) {
        if let Some((line, tag, _)) = &self.pending {
            self.issues.push(ParseIssue::Unclosed {
                line: *line,
                name: tag.to_string(),
            });
            self.complete_token();
        }
    }

    fn complete_token(&mut self) {
        let Some((_, _, pending)) = self.pending.take() else {
            return;
        };
        let token = match pending {
            Pending::Word(mut wf) => {
                wf.text = decode_entities(wf.text.trim());
                Token::Word(wf)
            }
            Pending::Punct(p) => Token::Punct(Punctuation {
                text: decode_entities(p.text.trim()),
            }),
            Pending::Orphan => return,
        };
        if let Some(sentence) = self
            .file
            .paragraphs
            .last_mut()
            .and_then(|p| p.sentences.last_mut())
        {
            sentence.tokens.push(token);
        }
    }

    fn finish(mut self) -> ParsedFile {
        self.flush_token();
        ParsedFile {
            file: self.file,
            issues: self.issues,
        }
    }
}

fn attributes(raw: &str) -> impl Iterator<Item = (String, String)> + '_ {
    ATTRIBUTE.captures_iter(raw).filter_map(|caps| {
        let name = caps.name("name")?.as_str().to_ascii_lowercase();
        let value = caps
            .name("dq")
            .or_else(|| caps.name("sq"))
            .or_else(|| caps.name("bare"))?
            .as_str();
        Some((name, decode_entities(value)))
    })
}

fn attribute(raw: &str, wanted: &str) -> Option<String> {
    attributes(raw)
        .find(|(name, _)| name == wanted)
        .map(|(_, value)| value)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<contextfile concordance=brown>
<context filename=br-a01 paras=yes>
<p pnum=1>
<s snum=1>
<wf cmd=ignore pos=DT>The</wf>
<wf cmd=done rdf=group pos=NNP lemma=group wnsn=1 lexsn=1:03:00:: pn=group>Fulton_County_Grand_Jury</wf>
<wf cmd=done pos=VB lemma=say wnsn=1 lexsn=2:32:00::>said</wf>
<punc>.</punc>
</s>
</p>
</context>
</contextfile>
";

    #[test]
    fn parses_paragraphs_sentences_and_tokens() {
        let parsed = parse_markup("br-a01", SAMPLE);
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        let file = parsed.file;
        assert_eq!(file.name, "br-a01");
        assert_eq!(file.paragraphs.len(), 1);
        assert_eq!(file.paragraphs[0].pnum, "1");
        let sentence = &file.paragraphs[0].sentences[0];
        assert_eq!(sentence.snum, "1");
        assert_eq!(sentence.tokens.len(), 4);
        assert_eq!(sentence.text(), "The Fulton_County_Grand_Jury said .");

        let Token::Word(name) = &sentence.tokens[1] else {
            panic!("expected a wordform");
        };
        assert_eq!(name.pos.as_deref(), Some("NNP"));
        assert_eq!(name.lemma.as_deref(), Some("group"));
        assert_eq!(name.pn.as_deref(), Some("group"));
        assert_eq!(name.rdf.as_deref(), Some("group"));
        assert_eq!(name.lexsn.as_deref(), Some("1:03:00::"));

        let Token::Word(det) = &sentence.tokens[0] else {
            panic!("expected a wordform");
        };
        assert_eq!(det.lemma, None);
        assert!(!det.has_sense());
        assert!(matches!(sentence.tokens[3], Token::Punct(_)));
    }

    #[test]
    fn accepts_quoted_values_and_entities() {
        let text = r#"<p pnum="2"><s snum='7'><wf pos=CC lemma="and" note='x y'>&amp;</wf></s></p>"#;
        let parsed = parse_markup("f", text);
        assert!(parsed.issues.is_empty());
        let sentence = &parsed.file.paragraphs[0].sentences[0];
        assert_eq!(parsed.file.paragraphs[0].pnum, "2");
        assert_eq!(sentence.snum, "7");
        let wf = sentence.tokens[0].as_wordform().unwrap();
        assert_eq!(wf.text, "&");
        assert_eq!(wf.lemma.as_deref(), Some("and"));
        assert_eq!(wf.extra, vec![("note".to_string(), "x y".to_string())]);
    }

    #[test]
    fn skips_bad_tags_and_keeps_the_rest() {
        let text = "<p pnum=1>
<s snum=1>
<wf pos=NN lemma=dog wnsn=1 lexsn=1:05:00::>dog</wf>
<= broken
<img src=x>
<wf pos=VB lemma=bark wnsn=1 lexsn=2:35:00::>barked</wf>
</s>
<s snum=2>
<wf pos=NN lemma=cat wnsn=1 lexsn=1:05:00::>cat</wf>
</s>
</p>
";
        let parsed = parse_markup("f", text);
        let sentences = &parsed.file.paragraphs[0].sentences;
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text(), "dog barked");
        assert_eq!(sentences[1].text(), "cat");
        assert!(parsed
            .issues
            .iter()
            .any(|i| matches!(i, ParseIssue::MalformedTag { line: 4, .. })));
        assert!(parsed.issues.contains(&ParseIssue::UnexpectedElement {
            line: 5,
            name: "img".into()
        }));
    }

    #[test]
    fn reports_unknown_elements_between_paragraphs() {
        let text = "<contextfile concordance=brown>
<context filename=br-a01 paras=yes>
<p pnum=1>
<s snum=1>
<wf pos=NN lemma=dog wnsn=1 lexsn=1:05:00::>dog</wf>
</s>
</p>
<img src=x>
<p pnum=2>
<s snum=2>
<wf pos=NN lemma=cat wnsn=1 lexsn=1:05:00::>cat</wf>
</s>
</p>
</context>
</contextfile>
";
        let parsed = parse_markup("f", text);
        assert_eq!(parsed.file.paragraphs.len(), 2);
        assert_eq!(
            parsed.issues,
            vec![ParseIssue::UnexpectedElement {
                line: 8,
                name: "img".into()
            }]
        );
    }

    #[test]
    fn recovers_from_unclosed_and_misplaced_elements() {
        let text = "<s snum=1>
<wf pos=NN lemma=dog wnsn=1 lexsn=1:05:00::>dog
<punc>.</punc>
</s>
<wf pos=NN>stray</wf>
<p pnum=2>
<s snum=2>
<wf pos=NN>cat</wf>
";
        let parsed = parse_markup("f", text);
        let file = &parsed.file;
        assert_eq!(file.paragraphs.len(), 2);
        assert_eq!(file.paragraphs[0].pnum, "");
        assert_eq!(file.paragraphs[0].sentences[0].text(), "dog .");
        assert_eq!(file.paragraphs[1].sentences[0].text(), "cat");
        assert_eq!(file.sentence_count(), 2);

        assert!(parsed
            .issues
            .contains(&ParseIssue::SentenceOutsideParagraph { line: 1 }));
        assert!(parsed.issues.contains(&ParseIssue::Unclosed {
            line: 2,
            name: "wf".into()
        }));
        assert!(parsed.issues.contains(&ParseIssue::TokenOutsideSentence {
            line: 5,
            name: "wf".into()
        }));
    }

    #[test]
    fn reports_unterminated_tag_at_end() {
        let parsed = parse_markup("f", "<p pnum=1><s snum=1><wf pos=NN>x</wf></s></p><wf pos=");
        assert_eq!(parsed.file.sentence_count(), 1);
        assert_eq!(
            parsed.issues,
            vec![ParseIssue::UnterminatedTag { line: 1 }]
        );
    }

    #[test]
    fn empty_input_gives_empty_file() {
        let parsed = parse_markup("empty", "");
        assert!(parsed.file.paragraphs.is_empty());
        assert!(parsed.issues.is_empty());
    }
}
