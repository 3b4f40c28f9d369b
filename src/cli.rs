use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::ideas::DEFAULT_IDEA_COUNT;
use crate::metrics::keywords::DEFAULT_KEYWORD_TOP_N;
use crate::metrics::structure::{DEFAULT_MAX_WORDS, DEFAULT_MIN_WORDS};

pub const DEFAULT_BERT_MODEL: &str = "text-embedding-3-small";

#[derive(Parser, Debug)]
#[command(
    name = "tube2blog",
    version,
    about = "Video-to-blog generation tooling and offline evaluation harness"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate or load a candidate post per dataset sample and score it.
    RunEvals(RunEvalsArgs),
    /// Maintain the evaluation dataset.
    PrepareDataset(PrepareDatasetArgs),
    /// Print random card-making ideas.
    CardIdeas(CardIdeasArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EvalMode {
    Mock,
    Live,
}

impl EvalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Live => "live",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunEvalsArgs {
    #[arg(long, value_enum, default_value_t = EvalMode::Mock)]
    pub mode: EvalMode,

    #[arg(long, default_value = "evals/dataset.jsonl")]
    pub dataset: PathBuf,

    /// Base directory for relative transcript and reference paths.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long, default_value = "evals/mock_outputs")]
    pub generated_dir: PathBuf,

    #[arg(long, default_value = "evals/results")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub skip_bert_score: bool,

    /// Embedding model for semantic scoring; `local-hash-v1` runs offline.
    #[arg(long, default_value = DEFAULT_BERT_MODEL)]
    pub bert_model: String,

    #[arg(long, default_value_t = DEFAULT_KEYWORD_TOP_N)]
    pub keyword_top_n: usize,

    #[arg(long, default_value_t = DEFAULT_MIN_WORDS)]
    pub min_words: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
    pub max_words: usize,
}

#[derive(Args, Debug, Clone)]
pub struct PrepareDatasetArgs {
    #[arg(long, default_value = "evals/dataset.jsonl")]
    pub dataset: PathBuf,

    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: DatasetCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DatasetCommand {
    /// Append one sample after checking its files exist.
    Add(AddSampleArgs),
    List,
    /// Report every missing or empty transcript/reference file.
    Validate,
}

#[derive(Args, Debug, Clone)]
pub struct AddSampleArgs {
    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub video_url: String,

    #[arg(long)]
    pub transcript: String,

    #[arg(long)]
    pub reference: String,

    #[arg(long, default_value = "professional")]
    pub tone: String,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CardIdeasArgs {
    #[arg(long, default_value_t = DEFAULT_IDEA_COUNT)]
    pub count: usize,

    #[arg(long)]
    pub seed: Option<u64>,
}
