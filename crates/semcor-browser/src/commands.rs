//! Prompt commands.
//!
//! Every command is a short keyword, optionally followed by one argument.
//! Lemmas may be typed with spaces (`primary election`); they are joined with
//! underscores the way Semcor writes multi-word lemmas.

use thiserror::Error;

use semcor_types::WordClass;

pub const HELP: &str = "\
h          -  help (also ? and help)
s LEMMA    -  show statistics for LEMMA
n LEMMA    -  search for noun LEMMA
v LEMMA    -  search for verb LEMMA
a LEMMA    -  search for adjective LEMMA
r LEMMA    -  search for adverb LEMMA
p SID      -  print paragraph with sentence SID (e.g. br-a01-12)
o OFFSET   -  print sentence at a sentence index offset
bt         -  list basic types that occur in interesting pairs
bt NAME    -  list interesting pairs with basic type NAME
btp        -  list interesting basic type pairs
btp T1-T2  -  print sentences where T1 and T2 co-occur
q          -  quit";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Statistics(String),
    Concordance(WordClass, String),
    Paragraph(String),
    Offset(usize),
    BasicTypes,
    BasicType(String),
    Pairs,
    Pair(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a sentence offset")]
    BadOffset(String),
}

impl Command {
    /// Parse one prompt line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then_some(rest);

        let command = match (word, arg) {
            ("h" | "?" | "help", _) => Command::Help,
            ("q", _) => Command::Quit,
            ("s", Some(lemma)) => Command::Statistics(lemma_arg(lemma)),
            ("n" | "v" | "a" | "r", Some(lemma)) => {
                let class = word
                    .chars()
                    .next()
                    .and_then(WordClass::from_char)
                    .ok_or_else(|| CommandError::Unknown(word.to_string()))?;
                Command::Concordance(class, lemma_arg(lemma))
            }
            ("p", Some(sid)) => Command::Paragraph(sid.to_string()),
            ("o", Some(raw)) => Command::Offset(
                raw.parse()
                    .map_err(|_| CommandError::BadOffset(raw.to_string()))?,
            ),
            ("bt", None) => Command::BasicTypes,
            ("bt", Some(name)) => Command::BasicType(name.to_string()),
            ("btp", None) => Command::Pairs,
            ("btp", Some(pair)) => Command::Pair(pair.to_string()),
            ("s", None) => return Err(CommandError::MissingArgument("s")),
            ("n", None) => return Err(CommandError::MissingArgument("n")),
            ("v", None) => return Err(CommandError::MissingArgument("v")),
            ("a", None) => return Err(CommandError::MissingArgument("a")),
            ("r", None) => return Err(CommandError::MissingArgument("r")),
            ("p", None) => return Err(CommandError::MissingArgument("p")),
            ("o", None) => return Err(CommandError::MissingArgument("o")),
            _ => return Err(CommandError::Unknown(line.to_string())),
        };
        Ok(Some(command))
    }
}

fn lemma_arg(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}
