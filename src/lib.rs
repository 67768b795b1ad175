/*! # rifs-datasets

Tools to download, split and merge Danish speech corpora.

Corpora share the same on-disk layout: an `all.csv` manifest, `audio/` and `text/` folders,
and optionally aligned segments under `alignments/<recording>/segments.csv`.
!*/
pub mod download;
pub mod error;
pub mod filtering;
pub mod io;
pub mod processing;
pub mod progress;
pub mod sources;
