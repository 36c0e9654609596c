pub mod commands;
pub mod report;

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use serde::Serialize;
use serde_json::json;

use semcor_db::{ConcordanceLine, LemmaStatistics, LookupError, Semcor, sentence_label};
use semcor_pairs::{PairAnalyzer, PairCount};
use semcor_types::{BasicTypePair, SentenceId, WordClass};

pub use commands::{Command, CommandError, HELP};

pub const DEFAULT_LINES: usize = 10;
const KWIC_WIDTH: usize = 50;
const PROMPT: &str = "*> ";

/// How replies are rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Output {
    Plain,
    Ansi,
    Json,
}

/// Escape sequences for one output mode; all empty for plain text.
#[derive(Clone, Copy, Debug)]
pub struct Style {
    pub bold: &'static str,
    pub blue: &'static str,
    pub green: &'static str,
    pub grey: &'static str,
    pub end: &'static str,
}

impl Style {
    pub const PLAIN: Style = Style {
        bold: "",
        blue: "",
        green: "",
        grey: "",
        end: "",
    };
    pub const ANSI: Style = Style {
        bold: "\x1b[1m",
        blue: "\x1b[34m",
        green: "\x1b[32m",
        grey: "\x1b[90m",
        end: "\x1b[0m",
    };
}

#[derive(Clone, Copy, Debug)]
pub struct BrowserOptions {
    /// Concordance lines shown per sense.
    pub lines: usize,
    pub output: Output,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            lines: DEFAULT_LINES,
            output: Output::Plain,
        }
    }
}

#[derive(Serialize)]
struct ConcordanceResponse<'a> {
    lemma: &'a str,
    class: String,
    senses: Vec<SenseLines>,
}

#[derive(Serialize)]
struct SenseLines {
    pos: Option<String>,
    sense_key: Option<String>,
    wnsn: Option<String>,
    basic_type: Option<String>,
    total: usize,
    lines: Vec<ConcordanceLine>,
}

#[derive(Serialize)]
struct SentenceText {
    sentence: String,
    text: String,
}

#[derive(Serialize)]
struct ParagraphResponse {
    file: String,
    pnum: String,
    sentence: String,
    sentences: Vec<SentenceText>,
}

#[derive(Serialize)]
struct OffsetResponse {
    offset: usize,
    sentence: String,
    text: String,
}

#[derive(Serialize)]
struct PairExamplesResponse {
    pair: String,
    total: usize,
    sentences: Vec<SentenceText>,
}

/// Answers prompt commands against one loaded corpus.
pub struct Browser {
    semcor: Semcor,
    pairs: PairAnalyzer,
    options: BrowserOptions,
}

impl Browser {
    pub fn new(semcor: Semcor, pairs: PairAnalyzer, options: BrowserOptions) -> Self {
        Self {
            semcor,
            pairs,
            options,
        }
    }

    pub fn semcor(&self) -> &Semcor {
        &self.semcor
    }

    /// Read commands from `input` until `q` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        write!(output, "{PROMPT}")?;
        output.flush()?;
        for line in input.lines() {
            let Some(reply) = self.execute_line(&line?) else {
                break;
            };
            if !reply.is_empty() {
                writeln!(output, "{reply}")?;
            }
            write!(output, "{PROMPT}")?;
            output.flush()?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// Reply to one prompt line, or `None` when the line asks to quit.
    pub fn execute_line(&self, line: &str) -> Option<String> {
        match Command::parse(line) {
            Ok(Some(Command::Quit)) => None,
            Ok(Some(command)) => Some(self.execute(&command)),
            Ok(None) => Some(String::new()),
            Err(err @ CommandError::Unknown(_)) => Some(match self.options.output {
                Output::Json => error_json(&err),
                _ => format!("{err}, available commands:\n\n{HELP}"),
            }),
            Err(err) => Some(self.error(&err)),
        }
    }

    pub fn execute(&self, command: &Command) -> String {
        let result = match command {
            Command::Help | Command::Quit => Ok(self.emit(&json!({ "help": HELP }), |_| {
                HELP.to_string()
            })),
            Command::Statistics(lemma) => self.statistics(lemma),
            Command::Concordance(class, lemma) => Ok(self.concordance(lemma, *class)),
            Command::Paragraph(sid) => self.paragraph(sid),
            Command::Offset(offset) => self.offset(*offset),
            Command::BasicTypes => Ok(self.basic_types()),
            Command::BasicType(name) => Ok(self.pair_counts(self.pairs.pairs_with(name))),
            Command::Pairs => Ok(self.pair_counts(self.pairs.list_interesting_pairs())),
            Command::Pair(raw) => self.pair_examples(raw),
        };
        result.unwrap_or_else(|err| self.error(&err))
    }

    fn style(&self) -> Style {
        match self.options.output {
            Output::Ansi => Style::ANSI,
            Output::Plain | Output::Json => Style::PLAIN,
        }
    }

    fn emit<T, F>(&self, value: &T, text: F) -> String
    where
        T: Serialize + ?Sized,
        F: FnOnce(&Style) -> String,
    {
        match self.options.output {
            Output::Json => serde_json::to_string_pretty(value)
                .unwrap_or_else(|err| json!({ "error": err.to_string() }).to_string()),
            _ => text(&self.style()),
        }
    }

    fn error(&self, err: &dyn std::error::Error) -> String {
        match self.options.output {
            Output::Json => error_json(err),
            _ => err.to_string(),
        }
    }

    fn statistics(&self, lemma: &str) -> Result<String, LookupError> {
        let stats = self.semcor.statistics(lemma)?;
        Ok(self.emit(&stats, |style| statistics_text(&stats, style)))
    }

    fn concordance(&self, lemma: &str, class: WordClass) -> String {
        let mut groups: BTreeMap<(Option<String>, Option<String>), Vec<ConcordanceLine>> =
            BTreeMap::new();
        for line in self.semcor.concordance(lemma, class) {
            groups
                .entry((line.pos.clone(), line.sense_key.clone()))
                .or_default()
                .push(line);
        }
        let senses: Vec<SenseLines> = groups
            .into_iter()
            .map(|((pos, sense_key), mut lines)| {
                let total = lines.len();
                lines.truncate(self.options.lines);
                SenseLines {
                    basic_type: sense_key
                        .as_deref()
                        .and_then(|k| self.semcor.btypes().get_str(k))
                        .map(str::to_string),
                    wnsn: lines.first().and_then(|l| l.wnsn.clone()),
                    pos,
                    sense_key,
                    total,
                    lines,
                }
            })
            .collect();
        let response = ConcordanceResponse {
            lemma,
            class: class.to_string(),
            senses,
        };
        self.emit(&response, |style| concordance_text(&response, style))
    }

    fn sentence_text(&self, id: SentenceId) -> Option<SentenceText> {
        Some(SentenceText {
            sentence: self.semcor.sentence_label(id)?,
            text: self.semcor.sentence(id)?.text(),
        })
    }

    fn paragraph(&self, sid: &str) -> Result<String, LookupError> {
        let id = self.semcor.sentence_by_id(sid)?;
        let unknown = || LookupError::UnknownSentence(sid.to_string());
        let file = self.semcor.files().get(id.file as usize).ok_or_else(unknown)?;
        let paragraph = self.semcor.paragraph_of(id).ok_or_else(unknown)?;
        let response = ParagraphResponse {
            file: file.name.clone(),
            pnum: paragraph.pnum.clone(),
            sentence: sid.trim().to_string(),
            sentences: paragraph
                .sentences
                .iter()
                .map(|s| SentenceText {
                    sentence: sentence_label(&file.name, &s.snum),
                    text: s.text(),
                })
                .collect(),
        };
        Ok(self.emit(&response, |style| {
            let mut out = format!(
                "\n{}{} paragraph {}{}\n",
                style.bold, response.file, response.pnum, style.end
            );
            for s in &response.sentences {
                let (open, close) = if s.sentence == response.sentence {
                    (style.bold, style.end)
                } else {
                    ("", "")
                };
                out.push_str(&format!(
                    "\n{}{:<12}{} {open}{}{close}",
                    style.grey, s.sentence, style.end, s.text
                ));
            }
            out.push('\n');
            out
        }))
    }

    fn offset(&self, offset: usize) -> Result<String, LookupError> {
        let id = self.semcor.sentence_at(offset)?;
        let text = self
            .sentence_text(id)
            .ok_or(LookupError::UnknownOffset(offset))?;
        let response = OffsetResponse {
            offset,
            sentence: text.sentence,
            text: text.text,
        };
        Ok(self.emit(&response, |style| {
            format!(
                "{}{} {}{} {}",
                style.grey, response.offset, response.sentence, style.end, response.text
            )
        }))
    }

    fn basic_types(&self) -> String {
        let labels = self.pairs.list_basic_types();
        self.emit(&json!({ "basic_types": labels }), |_| {
            if labels.is_empty() {
                return "no interesting basic type pairs".to_string();
            }
            labels
                .chunks(10)
                .map(|row| row.join(" "))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    fn pair_counts(&self, counts: Vec<PairCount>) -> String {
        self.emit(&counts, |style| {
            if counts.is_empty() {
                return "no interesting basic type pairs".to_string();
            }
            counts
                .iter()
                .map(|c| format!("{:>6}  {}{}{}", c.count, style.bold, c.pair, style.end))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    fn pair_examples(&self, raw: &str) -> Result<String, LookupError> {
        let ids = self.pairs.examples_for(raw)?;
        let pair = BasicTypePair::parse(raw)
            .map(|p| p.to_string())
            .unwrap_or_else(|| raw.trim().to_string());
        let response = PairExamplesResponse {
            pair,
            total: ids.len(),
            sentences: ids.iter().filter_map(|id| self.sentence_text(*id)).collect(),
        };
        Ok(self.emit(&response, |style| {
            let mut out = format!(
                "\n{}{}{}  ({} sentences)\n",
                style.bold, response.pair, style.end, response.total
            );
            for s in &response.sentences {
                out.push_str(&format!(
                    "\n{}{:<12}{} {}",
                    style.grey, s.sentence, style.end, s.text
                ));
            }
            out.push('\n');
            out
        }))
    }
}

fn error_json(err: &dyn std::error::Error) -> String {
    json!({ "error": err.to_string() }).to_string()
}

fn statistics_text(stats: &LemmaStatistics, style: &Style) -> String {
    let mut out = format!("\nOccurrences: {}\n", stats.total);
    for pos in &stats.parts_of_speech {
        out.push_str(&format!("\n{}{}{}\n", style.bold, pos.pos, style.end));
        for sense in &pos.senses {
            let label = match (&sense.wnsn, &sense.lexsn) {
                (Some(wnsn), Some(lexsn)) => format!("wnsn={wnsn} lexsn={lexsn}"),
                _ => "untagged".to_string(),
            };
            let btype = sense
                .basic_type
                .as_deref()
                .map(|b| format!("  {}[{b}]{}", style.green, style.end))
                .unwrap_or_default();
            out.push_str(&format!(
                "   {label}  -- {} occurrences{btype}\n",
                sense.count
            ));
        }
        if !pos.basic_types.is_empty() {
            out.push_str(&format!("   basic types: {}\n", pos.basic_types.join(", ")));
        }
    }
    if let Some(group) = &stats.proper_names {
        out.push_str(&format!(
            "\n{}{} ({}){}\n   {} proper names\n",
            style.bold, group.tag, group.category, style.end, group.count
        ));
    }
    out
}

fn concordance_text(response: &ConcordanceResponse<'_>, style: &Style) -> String {
    if response.senses.is_empty() {
        return format!("no {} occurrences of `{}`", response.class, response.lemma);
    }
    let mut out = String::new();
    for sense in &response.senses {
        let header = match &sense.sense_key {
            Some(key) => key.clone(),
            None => format!("{} (untagged)", response.lemma),
        };
        let pos = sense.pos.as_deref().unwrap_or("-");
        out.push_str(&format!(
            "\n{}{}{} {} {}{}\n",
            style.bold, style.blue, header, pos, sense.wnsn.as_deref().unwrap_or(""), style.end
        ));
        if let Some(btype) = &sense.basic_type {
            out.push_str(&format!("{}[{btype}]{}\n", style.green, style.end));
        }
        out.push('\n');
        for line in &sense.lines {
            let (left, keyword, right) = line.kwic(KWIC_WIDTH);
            out.push_str(&format!(
                "{}{:<10}{} {left:>width$} {}{keyword}{} {right}\n",
                style.grey,
                line.sentence,
                style.end,
                style.blue,
                style.end,
                width = KWIC_WIDTH
            ));
        }
        if sense.total > sense.lines.len() {
            out.push_str(&format!(
                "... {} more\n",
                sense.total - sense.lines.len()
            ));
        }
    }
    out
}
