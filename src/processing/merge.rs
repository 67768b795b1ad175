/*! merging

Merge several datasets into a single one.

For each source dataset (named after the last component of its path):

- each `<split>.csv` present gets its `id`s namespaced by the dataset name,
  which is inserted right after the first path segment of the id
  (`alignments/rec/0001.wav` becomes `alignments/<name>/rec/0001.wav`).
  Ids without any folder are considered to live in the split folder
  (`0001.wav` in `train.csv` becomes `train/<name>/0001.wav`).
- `all.csv` ids are prefixed by the dataset name (`audio/0001.wav` becomes `<name>/audio/0001.wav`).
- the `audio`, `text` and `alignments` folders (or the ones provided) are copied to `<target>/<folder>/<name>/`.

Manifests are then concatenated (over the union of their columns), shuffled and written in the target.
A manifest that no source contributed rows to is not written at all,
and the one a previous merge left in the target is removed.

Copied folders are additive: files already in the target are kept, and a failed copy leaves the target as is.
!*/
use std::fs;
use std::path::{Component, Path, PathBuf};

use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Error;
use crate::io::{copy_dir, remove_manifest, Table};
use crate::progress::{NoProgress, Progress};

pub const DEFAULT_DIRS: [&str; 3] = ["audio", "text", "alignments"];
pub const DEFAULT_SPLITS: [&str; 3] = ["train", "valid", "test"];
const ALL: &str = "all";

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Folders to copy. [None] means [DEFAULT_DIRS].
    pub dirs_to_copy: Option<Vec<String>>,
    pub split_names: Vec<String>,
    /// Shuffling seed. [None] seeds from entropy, so that each run gives a different order.
    pub seed: Option<u64>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            dirs_to_copy: None,
            split_names: DEFAULT_SPLITS.iter().map(|s| s.to_string()).collect(),
            seed: None,
        }
    }
}

impl MergeOptions {
    fn dirs(&self) -> Vec<String> {
        match &self.dirs_to_copy {
            Some(dirs) => dirs.clone(),
            None => DEFAULT_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Deduplicated split names. `all` is reserved for `all.csv`.
    fn splits(&self) -> Result<Vec<String>, Error> {
        for name in &self.split_names {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(Error::InvalidArgument(format!("invalid split name: {:?}", name)));
            }
            if name == ALL {
                return Err(Error::InvalidArgument(
                    "'all' is not a split name (all.csv is always merged)".to_string(),
                ));
            }
        }
        Ok(self.split_names.iter().unique().cloned().collect())
    }
}

/// Rows written for a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSummary {
    pub name: String,
    pub rows: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub manifests: Vec<ManifestSummary>,
    pub copied_files: u64,
}

impl MergeReport {
    pub fn get(&self, name: &str) -> Option<&ManifestSummary> {
        self.manifests.iter().find(|m| m.name == name)
    }
}

/// Name of the dataset at `path`: its last component once `.` and `..` are resolved.
pub fn dataset_name(path: &Path) -> Result<String, Error> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if last_is_normal {
                    normalized.pop();
                } else {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }

    if let Some(name) = normalized.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }

    // "." or "..": ask the filesystem
    let canonical = path.canonicalize()?;
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidArgument(format!("can't name dataset at {:?}", path)))
}

/// Insert `dataset` after the first segment of a split manifest `id`.
///
/// An id without folder gets `split` as its first segment.
pub fn namespace_split_id(id: &str, split: &str, dataset: &str) -> String {
    match id.split_once('/') {
        Some((first, rest)) => format!("{first}/{dataset}/{rest}"),
        None => format!("{split}/{dataset}/{id}"),
    }
}

/// Prefix an `all.csv` `id` with `dataset`.
pub fn namespace_all_id(id: &str, dataset: &str) -> String {
    format!("{dataset}/{id}")
}

/// `Ok(None)` if the manifest does not exist.
fn read_manifest(path: &Path) -> Result<Option<Table>, Error> {
    if !path.is_file() {
        return Ok(None);
    }
    Table::from_path(path).map(Some)
}

/// Concatenate, shuffle and write `tables` to `<target>/<name>.csv`.
/// If there are no rows, nothing is written and a manifest from a previous merge is removed.
fn write_shuffled<R: Rng>(
    target: &Path,
    name: &str,
    tables: Vec<Table>,
    rng: &mut R,
) -> Result<Option<ManifestSummary>, Error> {
    let path = target.join(format!("{name}.csv"));
    if tables.is_empty() {
        debug!("[{name}] no source has this manifest");
        remove_manifest(&path)?;
        return Ok(None);
    }

    let mut table = Table::concat(tables);
    if table.is_empty() {
        warn!("[{name}] sources only had empty manifests, not writing {name}.csv");
        remove_manifest(&path)?;
        return Ok(None);
    }

    table.shuffle(rng);
    table.write_atomic(&path)?;
    info!("[{name}] wrote {} rows to {:?}", table.len(), path);

    Ok(Some(ManifestSummary {
        name: name.to_string(),
        rows: table.len(),
        path,
    }))
}

/// Merge `sources` into `target` without progress reporting.
pub fn merge<P: AsRef<Path>>(
    sources: &[P],
    target: &Path,
    options: &MergeOptions,
) -> Result<MergeReport, Error> {
    merge_with(sources, target, options, &NoProgress)
}

/// Merge `sources` into `target`.
///
/// Every source must exist, otherwise [Error::SourceNotFound] is returned before anything is written.
/// `progress` gets an update for each source.
pub fn merge_with<P: AsRef<Path>>(
    sources: &[P],
    target: &Path,
    options: &MergeOptions,
    progress: &dyn Progress,
) -> Result<MergeReport, Error> {
    let dirs = options.dirs();
    let splits = options.splits()?;

    for source in sources {
        if !source.as_ref().is_dir() {
            return Err(Error::SourceNotFound(source.as_ref().to_path_buf()));
        }
    }

    let names: Vec<String> = sources
        .iter()
        .map(|s| dataset_name(s.as_ref()))
        .collect::<Result<_, _>>()?;
    for name in names.iter().duplicates() {
        warn!("several sources are named {name}: their files will be mixed in the target");
    }

    fs::create_dir_all(target)?;

    let mut report = MergeReport::default();
    let mut split_tables: Vec<Vec<Table>> = vec![Vec::new(); splits.len()];
    let mut all_tables = Vec::new();
    let nb_sources = sources.len() as u64;

    for (idx, (source, name)) in sources.iter().zip(&names).enumerate() {
        let source = source.as_ref();
        progress.update(idx as u64, nb_sources, name);
        info!("Merging {:?} into {:?}", source, target);

        for (split, tables) in splits.iter().zip(split_tables.iter_mut()) {
            let path = source.join(format!("{split}.csv"));
            match read_manifest(&path)? {
                None => debug!("[{name}] no {split}.csv, skipping"),
                Some(mut table) => {
                    if table.map_column("id", |id| namespace_split_id(id, split, name)) {
                        tables.push(table);
                    } else {
                        warn!("[{name}] {split}.csv has no 'id' column, its rows are not merged");
                    }
                }
            }
        }

        match read_manifest(&source.join(format!("{ALL}.csv")))? {
            None => info!("[{name}] no all.csv: will only merge files"),
            Some(mut table) => {
                if table.map_column("id", |id| namespace_all_id(id, name)) {
                    all_tables.push(table);
                } else {
                    warn!("[{name}] all.csv has no 'id' column: will only merge files");
                }
            }
        }

        for dir in &dirs {
            let src_dir = source.join(dir);
            if !src_dir.is_dir() {
                debug!("[{name}] no {dir}/ folder");
                continue;
            }
            let dst_dir = target.join(dir).join(name);
            info!("Copying {dir} from {:?} to {:?}", source, dst_dir);
            report.copied_files += copy_dir(&src_dir, &dst_dir)?;
        }

        progress.update(idx as u64 + 1, nb_sources, name);
        info!("Finished merging {:?} into {:?}", source, target);
    }

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for (split, tables) in splits.iter().zip(split_tables) {
        if let Some(summary) = write_shuffled(target, split, tables, &mut rng)? {
            report.manifests.push(summary);
        }
    }
    if let Some(summary) = write_shuffled(target, ALL, all_tables, &mut rng)? {
        report.manifests.push(summary);
    }

    progress.finish();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_ids() {
        assert_eq!(
            namespace_split_id("utt001.wav", "train", "Foo"),
            "train/Foo/utt001.wav"
        );
        assert_eq!(
            namespace_split_id("alignments/rec/0001.wav", "train", "Foo"),
            "alignments/Foo/rec/0001.wav"
        );
        assert_eq!(
            namespace_split_id("test/utt001.wav", "test", "Foo"),
            "test/Foo/utt001.wav"
        );
    }

    #[test]
    fn all_ids() {
        assert_eq!(namespace_all_id("audio/1.wav", "Foo"), "Foo/audio/1.wav");
        assert_eq!(namespace_all_id("1", "Foo"), "Foo/1");
    }

    #[test]
    fn names() {
        assert_eq!(dataset_name(Path::new("/data/LibriVoxDansk")).unwrap(), "LibriVoxDansk");
        assert_eq!(dataset_name(Path::new("/data/LibriVoxDansk/")).unwrap(), "LibriVoxDansk");
        assert_eq!(dataset_name(Path::new("data/./DanPASS/.")).unwrap(), "DanPASS");
        assert_eq!(dataset_name(Path::new("data/DanPASS/audio/..")).unwrap(), "DanPASS");
        assert_eq!(dataset_name(Path::new("NSTDanishSpråkbanken")).unwrap(), "NSTDanishSpråkbanken");
    }

    #[test]
    fn name_of_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        let expected = cwd.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(dataset_name(Path::new(".")).unwrap(), expected);
    }

    #[test]
    fn split_names_validation() {
        let mut options = MergeOptions::default();
        assert_eq!(options.splits().unwrap(), vec!["train", "valid", "test"]);

        options.split_names = vec!["train".into(), "train".into(), "dev".into()];
        assert_eq!(options.splits().unwrap(), vec!["train", "dev"]);

        options.split_names = vec!["all".into()];
        assert!(options.splits().is_err());

        options.split_names = vec!["../x".into()];
        assert!(options.splits().is_err());
    }

    #[test]
    fn default_dirs() {
        let mut options = MergeOptions::default();
        assert_eq!(options.dirs(), vec!["audio", "text", "alignments"]);
        options.dirs_to_copy = Some(vec![]);
        assert!(options.dirs().is_empty());
    }

    #[test]
    fn missing_source() {
        let target = tempfile::tempdir().unwrap();
        let sources = vec![target.path().join("does-not-exist")];
        let out = target.path().join("merged");
        assert!(matches!(
            merge(&sources, &out, &MergeOptions::default()),
            Err(Error::SourceNotFound(_))
        ));
        assert!(!out.exists());
    }
}
