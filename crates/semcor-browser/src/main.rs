use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use semcor_browser::{Browser, BrowserOptions, DEFAULT_LINES, Output, report};
use semcor_db::analysis::{AttributeReport, export_noun_types};
use semcor_db::{BasicTypeMap, CacheStore, Corpus, LoadMode, Semcor, parse_file_list};
use semcor_pairs::{DocumentPolysemy, PairAnalyzer, PairRules};

const DEFAULT_CORPUS_DIR: &str = "semcor3.0";
const DEFAULT_CACHE_DIR: &str = "data/compiled";

#[derive(Parser)]
#[command(name = "semcor")]
#[command(about = "Compile, analyze and browse the Semcor sense-tagged corpus")]
struct Cli {
    /// Semcor distribution root or a directory of tagfiles [env: SEMCOR_DIR]
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,
    /// Directory for compiled artifacts [env: SEMCOR_CACHE_DIR]
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// Sense key to basic type table [env: SEMCOR_BTYPES]
    #[arg(long, global = true)]
    btypes: Option<PathBuf>,
    /// `mmap` or `owned` [env: SEMCOR_LOAD_MODE]
    #[arg(long, global = true)]
    load_mode: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse tagfiles and write compiled artifacts
    Compile {
        #[arg(short = 'n', long)]
        max_files: Option<usize>,
    },
    /// Interactive prompt over the compiled corpus
    Browse {
        #[command(flatten)]
        load: LoadArgs,
        /// Whitespace separated file list numbering sentences for `o OFFSET`
        #[arg(long)]
        sentence_index: Option<PathBuf>,
        /// Concordance lines shown per sense
        #[arg(long, default_value_t = DEFAULT_LINES)]
        lines: usize,
        /// Reply with JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Never use colors
        #[arg(long, default_value_t = false)]
        plain: bool,
        /// Comma separated basic types left out of pairs [env: SEMCOR_PAIR_EXCLUDE]
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Attribute statistics and per-document basic type pairs
    Analyze {
        #[command(flatten)]
        load: LoadArgs,
        #[arg(long, default_value_t = 1)]
        min_lemmas: usize,
        #[arg(long, default_value_t = 1)]
        min_instances: usize,
    },
    /// Write `lemma<TAB>sense key<TAB>basic type` for every tagged NN wordform
    ExportTypes {
        #[command(flatten)]
        load: LoadArgs,
        /// Output file, stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct LoadArgs {
    #[arg(short = 'n', long)]
    max_files: Option<usize>,
}

#[derive(Debug, Clone)]
struct Config {
    corpus_dir: PathBuf,
    cache_dir: PathBuf,
    btypes_path: Option<PathBuf>,
    load_mode: LoadMode,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli);
    info!("using corpus at {}", config.corpus_dir.display());
    info!(
        "using cache at {} (mode: {:?})",
        config.cache_dir.display(),
        config.load_mode
    );

    let corpus = Corpus::discover(&config.corpus_dir, CacheStore::new(&config.cache_dir))
        .with_context(|| format!("reading corpus at {}", config.corpus_dir.display()))?
        .with_mode(config.load_mode);

    match cli.command {
        Commands::Compile { max_files } => {
            let report = corpus.compile(max_files);
            println!(
                "compiled {} files into {} ({} parse issues, {} failed)",
                report.compiled.len(),
                corpus.cache().dir().display(),
                report.issues,
                report.failed.len()
            );
            for (name, err) in &report.failed {
                println!("   {name}: {err}");
            }
        }
        Commands::Browse {
            load,
            sentence_index,
            lines,
            json,
            plain,
            exclude,
        } => {
            let mut semcor = load_semcor(&corpus, &config, load.max_files)?;
            if let Some(path) = sentence_index {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("reading file list {}", path.display()))?;
                let index = semcor.create_sentence_index(&parse_file_list(&text));
                info!("sentence index covers {} sentences", index.len());
            }
            let rules = PairRules::default().with_excluded(excluded_types(exclude));
            let pairs = PairAnalyzer::build(&semcor, &rules);
            let output = if json {
                Output::Json
            } else if plain || !io::stdout().is_terminal() {
                Output::Plain
            } else {
                Output::Ansi
            };
            println!("{semcor}");
            let browser = Browser::new(semcor, pairs, BrowserOptions { lines, output });
            browser.run(io::stdin().lock(), io::stdout().lock())?;
        }
        Commands::Analyze {
            load,
            min_lemmas,
            min_instances,
        } => {
            let semcor = load_semcor(&corpus, &config, load.max_files)?;
            let attributes = AttributeReport::collect(&semcor);
            print!("{}", report::attribute_report(&semcor, &attributes));
            let polysemy = DocumentPolysemy::build(&semcor);
            print!(
                "{}",
                report::polysemy_summary(&polysemy, min_lemmas, min_instances)
            );
        }
        Commands::ExportTypes { load, output } => {
            let semcor = load_semcor(&corpus, &config, load.max_files)?;
            let lines = match &output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    export_noun_types(&semcor, BufWriter::new(file))?
                }
                None => export_noun_types(&semcor, io::stdout().lock())?,
            };
            info!("exported {lines} noun wordforms");
        }
    }
    Ok(())
}

fn load_semcor(corpus: &Corpus, config: &Config, max_files: Option<usize>) -> Result<Semcor> {
    let btypes = match &config.btypes_path {
        Some(path) => BasicTypeMap::load(path)?,
        None => {
            warn!("no basic type table given, basic types will be empty");
            BasicTypeMap::default()
        }
    };
    let start = Instant::now();
    let (semcor, report) = corpus.load(max_files, btypes);
    if report.needs_recompile() {
        warn!(
            "{} compiled files are stale or unreadable and were skipped; run `semcor compile`",
            report.stale.len()
        );
    }
    if semcor.files().is_empty() {
        bail!(
            "no compiled files in {}; run `semcor compile` first",
            corpus.cache().dir().display()
        );
    }
    info!(
        "{} files ready in {} ms",
        semcor.files().len(),
        start.elapsed().as_millis()
    );
    Ok(semcor)
}

fn load_config(cli: &Cli) -> Config {
    let corpus_dir = cli
        .corpus
        .clone()
        .or_else(|| env::var("SEMCOR_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_DIR));
    let cache_dir = cli
        .cache_dir
        .clone()
        .or_else(|| env::var("SEMCOR_CACHE_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
    let btypes_path = cli
        .btypes
        .clone()
        .or_else(|| env::var("SEMCOR_BTYPES").ok().map(PathBuf::from));
    let load_mode = cli
        .load_mode
        .as_deref()
        .and_then(parse_load_mode)
        .or_else(|| {
            env::var("SEMCOR_LOAD_MODE")
                .ok()
                .as_deref()
                .and_then(parse_load_mode)
        })
        .unwrap_or(LoadMode::Mmap);

    Config {
        corpus_dir,
        cache_dir,
        btypes_path,
        load_mode,
    }
}

fn excluded_types(cli: Option<String>) -> Vec<String> {
    cli.or_else(|| env::var("SEMCOR_PAIR_EXCLUDE").ok())
        .map(|raw| raw.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

fn parse_load_mode(raw: &str) -> Option<LoadMode> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Some(LoadMode::Mmap),
        "owned" => Some(LoadMode::Owned),
        _ => None,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();
}
