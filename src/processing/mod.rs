/*! Dataset processing

Operations on already downloaded datasets:
- [split] partitions a dataset's alignments into train/valid/test manifests,
- [merge] combines several datasets into a new one.
!*/
pub mod merge;
pub mod split;

pub use merge::{merge, merge_with, MergeOptions, MergeReport};
pub use split::{split, split_with, Split, SplitMethod, SplitOptions, SplitReport};
