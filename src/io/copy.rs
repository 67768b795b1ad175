//! Recursive folder copy.
use std::fs;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::error::Error;

/// Copy the content of `src` into `dst`, creating `dst` and any missing parent.
///
/// Existing files in `dst` are overwritten, other files are left in place.
/// If `dst` lives inside `src`, it is not walked.
/// Returns the number of copied files.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<u64, Error> {
    fs::create_dir_all(dst)?;
    debug!("copying {:?} to {:?}", src, dst);

    let mut nb_files = 0;
    let walker = WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !entry.path().starts_with(dst));

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Custom(format!("{:?} is not in {:?}: {}", entry.path(), src, e)))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            nb_files += 1;
        }
    }

    Ok(nb_files)
}
