//! # rifs-datasets
//!
//! Download, split and merge Danish speech corpora.
//!
//! This project can be used both as a tool to prepare corpora,
//! or as a lib to integrate splitting and merging into other projects.
//!
//! ## Getting started
//!
//! ```sh
//! rifs-datasets 0.1.0
//! download, split and merge Danish speech corpora.
//!
//! USAGE:
//!     rifs-datasets [FLAGS] <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -q, --quiet      only log warnings and errors, no progress bars
//!     -V, --version    Prints version information
//!     -v, --verbose    log debug messages
//!
//! SUBCOMMANDS:
//!     download    Download corpora
//!     help        Prints this message or the help of the given subcommand(s)
//!     list        List known corpora
//!     merge       Merge datasets into a single one
//!     split       Split an aligned dataset into train, validation and test sets
//! ```
//!
//! ```sh
//! rifs-datasets download data/ LibriVoxDansk DanskeTaler
//! rifs-datasets split data/LibriVoxDansk --check-alignments
//! rifs-datasets merge data/merged data/LibriVoxDansk data/DanskeTaler
//! ```
use std::path::Path;

use rifs_datasets::download::Downloader;
use rifs_datasets::error::Error;
use rifs_datasets::filtering::AlignmentFilter;
use rifs_datasets::processing::{self, MergeOptions, SplitOptions};
use rifs_datasets::progress::{BarProgress, NoProgress, Progress};
use rifs_datasets::sources::{Catalog, CorpusSpec, CATALOG};
use structopt::StructOpt;

#[macro_use]
extern crate log;

mod cli;

/// Built-in catalog, extended with the corpora of `path`.
fn load_catalog(path: Option<&Path>) -> Result<Catalog, Error> {
    let mut catalog = CATALOG.clone();
    if let Some(path) = path {
        catalog.extend(Catalog::from_path(path)?);
    }
    Ok(catalog)
}

fn progress(quiet: bool, prefix: &str) -> Box<dyn Progress> {
    if quiet {
        Box::new(NoProgress)
    } else {
        Box::new(BarProgress::new(prefix))
    }
}

fn main() -> Result<(), Error> {
    let opt = cli::RifsDatasets::from_args();

    let level = match (opt.verbose, opt.quiet) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    debug!("cli args\n{:#?}", opt);

    match opt.cmd {
        cli::Command::List(l) => {
            let catalog = load_catalog(l.catalog.as_deref())?;
            for corpus in catalog.iter() {
                let private = if corpus.private { " (private)" } else { "" };
                println!("{}\t{}{}", corpus.name, corpus.url, private);
            }
        }

        cli::Command::Download(d) => {
            let catalog = load_catalog(d.catalog.as_deref())?;
            let corpora: Vec<&CorpusSpec> = if d.all {
                catalog.iter().collect()
            } else {
                if d.names.is_empty() {
                    return Err(Error::InvalidArgument(
                        "provide corpus names or --all".to_string(),
                    ));
                }
                d.names
                    .iter()
                    .map(|name| {
                        catalog
                            .get(name)
                            .ok_or_else(|| Error::InvalidArgument(format!("unknown corpus: {}", name)))
                    })
                    .collect::<Result<_, _>>()?
            };

            let dl = Downloader::default();
            let results = dl.download_all(&corpora, &d.dst, &*progress(opt.quiet, "clone"));

            let nb_failures = results.iter().filter(|result| result.is_err()).count();
            if nb_failures > 0 {
                return Err(Error::Custom(format!(
                    "{}/{} downloads failed",
                    nb_failures,
                    results.len()
                )));
            }
        }

        cli::Command::Split(s) => {
            let options = SplitOptions {
                method: s.method.parse()?,
                train_ratio: s.split_ratio,
                test_ratio: s.split_test_ratio,
                check_alignments: s.check_alignments,
                seed: s.seed,
            };
            let filter = AlignmentFilter::new(s.max_cer);
            if options.check_alignments {
                info!("keeping segments with a character error rate up to {}", filter.max_cer());
            }
            let report = processing::split_with(
                &s.dataset,
                &options,
                &filter,
                &*progress(opt.quiet, "split"),
            )?;
            for summary in &report.summaries {
                info!(
                    "{}: {} recordings, {} segments",
                    summary.split, summary.groups, summary.rows
                );
            }
        }

        cli::Command::Merge(m) => {
            let options = MergeOptions {
                dirs_to_copy: m.dirs,
                split_names: m.splits,
                seed: m.seed,
            };
            let report = processing::merge_with(
                &m.sources,
                &m.target,
                &options,
                &*progress(opt.quiet, "merge"),
            )?;
            for manifest in &report.manifests {
                info!("{}.csv: {} rows", manifest.name, manifest.rows);
            }
            info!("copied {} files", report.copied_files);
        }
    };
    Ok(())
}
