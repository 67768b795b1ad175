/*!
# IO utilities

Manifest (CSV) loading/saving and dataset folder copying.
!*/
mod copy;
mod table;

pub use copy::copy_dir;
pub use table::{remove_manifest, Table};
