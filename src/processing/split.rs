/*! splitting

Offline dataset splitting into train, validation and test manifests.

Splitting operates on *recording groups* rather than on segments:
each `alignments/**/segments.csv` holds the segments of one long recording,
and every segment of a recording lands in the same split so that overlapping audio
never leaks from train into valid/test.

Groups are shuffled with a seeded rng, then cut by position:

- `train_ratio == 1`: everything goes to train.
- `test_ratio == 0`: train gets `floor(train_ratio * n)` groups, valid gets the rest.
- `test_ratio == 1`: train gets `floor(train_ratio * n)` groups, test gets the rest.
- otherwise, the train cut and the test cut (taken on the remainder) are rounded down when `n` is even and up when it is odd.
  Train is `[0, cut)`, test `[cut, test_cut)` and valid `[test_cut, n)`.

Each non-empty split is written to `<dataset>/<split>.csv`, with a synthesized `id` column
holding the segment path relative to the dataset root.
The manifest of a split left empty is removed if a previous run wrote one.
!*/
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::Error;
use crate::filtering::{AlignmentFilter, Filter};
use crate::io::{remove_manifest, Table};
use crate::progress::{NoProgress, Progress};

/// Splitting strategy. Only random splitting is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMethod {
    #[default]
    Random,
}

impl FromStr for SplitMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SplitMethod::Random),
            other => Err(Error::InvalidArgument(format!(
                "unsupported split method: {other} (only 'random' is implemented)"
            ))),
        }
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMethod::Random => write!(f, "random"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }

    /// `<split>.csv`
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub method: SplitMethod,
    /// Share of the groups that go to train.
    pub train_ratio: f64,
    /// Share of the *remaining* groups that go to test, the rest going to valid.
    pub test_ratio: f64,
    /// Drop segments whose `text` and `model_output` disagree.
    pub check_alignments: bool,
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            method: SplitMethod::Random,
            train_ratio: 0.8,
            test_ratio: 0.5,
            check_alignments: false,
            seed: 0,
        }
    }
}

impl SplitOptions {
    fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.train_ratio) {
            return Err(Error::InvalidArgument(format!(
                "split ratio must be between 0 and 1 (is {})",
                self.train_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.test_ratio) {
            return Err(Error::InvalidArgument(format!(
                "split test ratio must be between 0 and 1 (is {})",
                self.test_ratio
            )));
        }
        Ok(())
    }
}

/// Disjoint train/valid/test sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<T> {
    pub train: Vec<T>,
    pub valid: Vec<T>,
    pub test: Vec<T>,
}

impl<T> Partition<T> {
    /// Splits in writing order.
    fn into_splits(self) -> [(Split, Vec<T>); 3] {
        [
            (Split::Train, self.train),
            (Split::Test, self.test),
            (Split::Valid, self.valid),
        ]
    }
}

/// Compute `(train_end, test_end)` for `n` shuffled groups.
///
/// Train is `[0, train_end)`, test `[train_end, test_end)`, valid `[test_end, n)`.
pub fn cut_points(n: usize, train_ratio: f64, test_ratio: f64) -> (usize, usize) {
    if train_ratio == 1.0 {
        return (n, n);
    }

    let nb = n as f64;
    if test_ratio == 0.0 {
        let split_index = ((train_ratio * nb).floor() as usize).min(n);
        return (split_index, split_index);
    }
    if test_ratio == 1.0 {
        let split_index = ((train_ratio * nb).floor() as usize).min(n);
        return (split_index, n);
    }

    // rounding direction depends on the parity of n
    let round = |x: f64| if n % 2 == 0 { x.floor() } else { x.ceil() };

    let split_index = (round(nb * train_ratio) as usize).min(n);
    let test_split_index =
        (round(split_index as f64 + (n - split_index) as f64 * test_ratio) as usize)
            .clamp(split_index, n);

    (split_index, test_split_index)
}

/// Shuffle `items` with a rng seeded by `seed` and cut them according to [cut_points].
pub fn partition<T>(mut items: Vec<T>, train_ratio: f64, test_ratio: f64, seed: u64) -> Partition<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let (split_index, test_split_index) = cut_points(items.len(), train_ratio, test_ratio);
    let valid = items.split_off(test_split_index);
    let test = items.split_off(split_index);

    Partition {
        train: items,
        valid,
        test,
    }
}

/// Number of groups, rows and written file for a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    pub split: Split,
    pub groups: usize,
    pub rows: usize,
    /// [None] when nothing was written.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub summaries: Vec<SplitSummary>,
}

impl SplitReport {
    pub fn get(&self, split: Split) -> Option<&SplitSummary> {
        self.summaries.iter().find(|s| s.split == split)
    }
}

/// List every `alignments/**/segments.csv` under `dataset`, sorted.
pub fn find_segment_tables(dataset: &Path) -> Result<Vec<PathBuf>, Error> {
    let dataset_str = dataset
        .to_str()
        .ok_or_else(|| Error::InvalidArgument(format!("non UTF-8 dataset path: {:?}", dataset)))?;
    let pattern = format!(
        "{}/alignments/**/segments.csv",
        glob::Pattern::escape(dataset_str.trim_end_matches('/'))
    );
    debug!("glob search string: {}", pattern);

    let paths: Result<Vec<PathBuf>, glob::GlobError> = glob::glob(&pattern)?.collect();
    let mut paths = paths?;
    paths.sort();
    Ok(paths)
}

/// `/`-joined path of the folder holding `segments`, relative to `dataset`.
fn group_dir(dataset: &Path, segments: &Path) -> Result<String, Error> {
    let without_curdir =
        |p: &Path| -> PathBuf { p.components().filter(|c| *c != Component::CurDir).collect() };

    let relative = segments
        .strip_prefix(dataset)
        .map(Path::to_path_buf)
        .or_else(|_| {
            without_curdir(segments)
                .strip_prefix(without_curdir(dataset))
                .map(Path::to_path_buf)
        })
        .map_err(|_| Error::Custom(format!("{:?} is not in {:?}", segments, dataset)))?;

    let dir = relative.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .join("/"))
}

/// Load a group's segments and give them an `id`.
///
/// Unreadable or empty tables are skipped (`Ok(None)`).
/// Missing columns are errors.
fn load_group<F>(
    dataset: &Path,
    segments: &Path,
    check_alignments: bool,
    filter: &F,
) -> Result<Option<Table>, Error>
where
    F: for<'a> Filter<(&'a str, &'a str)>,
{
    let mut table = match Table::from_path(segments) {
        Ok(t) if t.headers().is_empty() => {
            warn!("empty csv file: {:?}, skipping", segments);
            return Ok(None);
        }
        Ok(t) => t,
        Err(e) => {
            warn!("could not read {:?}: {}, skipping", segments, e);
            return Ok(None);
        }
    };

    let group_dir = group_dir(dataset, segments)?;
    let ids: Vec<String> = table
        .column("file")
        .ok_or_else(|| Error::Schema(format!("'file' column not found in {:?}", segments)))?
        .into_iter()
        .map(|file| format!("{group_dir}/{file}"))
        .collect();
    table.set_column("id", ids)?;

    if check_alignments {
        let (text, model_output) = match (
            table.column_index("text"),
            table.column_index("model_output"),
        ) {
            (Some(t), Some(m)) => (t, m),
            _ => {
                return Err(Error::Schema(format!(
                    "'model_output' or 'text' column not found in {:?}",
                    segments
                )))
            }
        };

        let nb_segments = table.len();
        table.retain(|row| filter.detect((row[text].as_str(), row[model_output].as_str())));
        debug!(
            "{:?}: kept {}/{} well aligned segments",
            segments,
            table.len(),
            nb_segments
        );
    }

    Ok(Some(table))
}

/// Split `dataset` with the default alignment filter and no progress reporting.
pub fn split(dataset: &Path, options: &SplitOptions) -> Result<SplitReport, Error> {
    split_with(dataset, options, &AlignmentFilter::default(), &NoProgress)
}

/// Split `dataset` into `train.csv`, `valid.csv` and `test.csv`.
///
/// `filter` decides which segments are kept when `options.check_alignments` is set.
/// `progress` gets an update for each recording group.
pub fn split_with<F>(
    dataset: &Path,
    options: &SplitOptions,
    filter: &F,
    progress: &dyn Progress,
) -> Result<SplitReport, Error>
where
    F: for<'a> Filter<(&'a str, &'a str)>,
{
    options.validate()?;
    info!("Splitting {:?} with split method: {}", dataset, options.method);

    if options.train_ratio == 1.0 {
        info!("split ratio is 1: no validation and test set");
    } else if options.test_ratio == 0.0 {
        info!("split test ratio is 0: there will be no test set");
    } else if options.test_ratio == 1.0 {
        info!("split test ratio is 1: there will be no validation set");
    } else {
        info!(
            "splitting into train, validation and test set with split ratio {} and split test ratio {}",
            options.train_ratio, options.test_ratio
        );
    }

    let groups = find_segment_tables(dataset)?;
    if groups.is_empty() {
        return Err(Error::NoDataFound(dataset.join("alignments")));
    }
    let nb_groups = groups.len();
    info!("found {} segment tables", nb_groups);

    let parts = match options.method {
        SplitMethod::Random => partition(
            groups,
            options.train_ratio,
            options.test_ratio,
            options.seed,
        ),
    };

    let mut report = SplitReport::default();
    let mut done = 0u64;

    for (split, groups) in parts.into_splits() {
        if groups.is_empty() {
            remove_manifest(&dataset.join(split.file_name()))?;
            continue;
        }

        let mut tables = Vec::with_capacity(groups.len());
        for segments in &groups {
            done += 1;
            progress.update(done, nb_groups as u64, &segments.to_string_lossy());
            debug!("reading segments from {:?}", segments);
            if let Some(table) = load_group(dataset, segments, options.check_alignments, filter)? {
                tables.push(table);
            }
        }

        let table = Table::concat(tables);
        let path = if table.is_empty() {
            warn!("[{}] no segments left, not writing {}", split, split.file_name());
            remove_manifest(&dataset.join(split.file_name()))?;
            None
        } else {
            let path = dataset.join(split.file_name());
            table.write_atomic(&path)?;
            Some(path)
        };

        info!(
            "[{}] {} groups ({:.3} of total), {} segments",
            split,
            groups.len(),
            groups.len() as f64 / nb_groups as f64,
            table.len()
        );

        report.summaries.push(SplitSummary {
            split,
            groups: groups.len(),
            rows: table.len(),
            path,
        });
    }

    progress.finish();
    Ok(report)
}
