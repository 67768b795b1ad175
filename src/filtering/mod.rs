/*! Filtering utilities

Filters operate on segment level, deciding whether a segment row should be kept.

Filters implement [Filter], which is pure: the same input always gives the same answer.
The only filter for now is [AlignmentFilter], which compares the reference transcript of a segment
with the output of the model used to align it.
!*/
mod alignment;
mod filter;

pub use alignment::AlignmentFilter;
pub use filter::Filter;
