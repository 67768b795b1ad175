/*! Corpus providers

Known corpora, and the external tools used to fetch and prepare them.
!*/
mod catalog;
mod fetch;
mod transcode;

pub use catalog::{Catalog, CorpusSpec, Move, TranscodeSpec, CATALOG};
pub use fetch::{Fetcher, GitCli};
pub use transcode::{Ffmpeg, Transcoder};
