//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "rifs-datasets",
    about = "download, split and merge Danish speech corpora."
)]
pub struct RifsDatasets {
    #[structopt(short = "v", long = "verbose", help = "log debug messages")]
    pub verbose: bool,
    #[structopt(
        short = "q",
        long = "quiet",
        help = "only log warnings and errors, no progress bars"
    )]
    pub quiet: bool,
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, StructOpt)]
/// Holds every command that is callable by the `rifs-datasets` command.
pub enum Command {
    #[structopt(about = "List known corpora")]
    List(List),
    #[structopt(about = "Download corpora")]
    Download(Download),
    #[structopt(about = "Split an aligned dataset into train, validation and test sets")]
    Split(Split),
    #[structopt(about = "Merge datasets into a single one")]
    Merge(Merge),
}

#[derive(Debug, StructOpt)]
pub struct List {
    #[structopt(
        parse(from_os_str),
        long = "catalog",
        help = "JSON file with additional corpora"
    )]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
/// Download command and parameters.
/// ```sh
/// rifs-datasets-download 0.1.0
/// Download corpora
///
/// USAGE:
///     rifs-datasets download [FLAGS] [OPTIONS] <dst> [names]...
///
/// FLAGS:
///     -a, --all        download every known corpus
///
/// OPTIONS:
///         --catalog <catalog>    JSON file with additional corpora
///
/// ARGS:
///     <dst>         download destination
///     <names>...    corpora to download
/// ```
pub struct Download {
    #[structopt(parse(from_os_str), help = "download destination")]
    pub dst: PathBuf,
    #[structopt(help = "corpora to download")]
    pub names: Vec<String>,
    #[structopt(short = "a", long = "all", help = "download every known corpus")]
    pub all: bool,
    #[structopt(
        parse(from_os_str),
        long = "catalog",
        help = "JSON file with additional corpora"
    )]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
/// Split command and parameters.
pub struct Split {
    #[structopt(
        parse(from_os_str),
        help = "dataset location (contains alignments/)"
    )]
    pub dataset: PathBuf,
    #[structopt(long = "method", default_value = "random", help = "split method")]
    pub method: String,
    #[structopt(
        long = "split-ratio",
        default_value = "0.8",
        help = "share of recordings that go to train"
    )]
    pub split_ratio: f64,
    #[structopt(
        long = "split-test-ratio",
        default_value = "0.5",
        help = "share of the remaining recordings that go to test"
    )]
    pub split_test_ratio: f64,
    #[structopt(
        long = "check-alignments",
        help = "drop segments whose text and model output disagree"
    )]
    pub check_alignments: bool,
    #[structopt(
        long = "max-cer",
        default_value = "0.2",
        help = "maximum character error rate of a kept segment"
    )]
    pub max_cer: f64,
    #[structopt(long = "seed", default_value = "0", help = "shuffling seed")]
    pub seed: u64,
}

#[derive(Debug, StructOpt)]
/// Merge command and parameters.
pub struct Merge {
    #[structopt(parse(from_os_str), help = "merged dataset location")]
    pub target: PathBuf,
    #[structopt(parse(from_os_str), required = true, help = "datasets to merge")]
    pub sources: Vec<PathBuf>,
    #[structopt(
        long = "dirs",
        use_delimiter = true,
        help = "folders to copy (default: audio,text,alignments)"
    )]
    pub dirs: Option<Vec<String>>,
    #[structopt(
        long = "splits",
        use_delimiter = true,
        default_value = "train,valid,test",
        help = "split manifests to merge"
    )]
    pub splits: Vec<String>,
    #[structopt(long = "seed", help = "shuffling seed (random by default)")]
    pub seed: Option<u64>,
}
