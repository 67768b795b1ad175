/*! Corpus downloading

A corpus is fetched in a temporary folder created inside the destination folder,
optionally transcoded, then reorganized into `<dst>/<name>` following its layout.
The temporary folder is removed in every case.

Corpora that are already present in the destination folder are not downloaded again.
!*/
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::error::Error;
use crate::io::Table;
use crate::progress::Progress;
use crate::sources::{CorpusSpec, Ffmpeg, Fetcher, GitCli, TranscodeSpec, Transcoder};

/// Holds the tools used to fetch and prepare corpora.
pub struct Downloader<F: Fetcher, T: Transcoder> {
    fetcher: F,
    transcoder: T,
}

impl Default for Downloader<GitCli, Ffmpeg> {
    fn default() -> Self {
        Self::new(GitCli::default(), Ffmpeg::default())
    }
}

impl<F: Fetcher, T: Transcoder> Downloader<F, T> {
    pub fn new(fetcher: F, transcoder: T) -> Self {
        Self {
            fetcher,
            transcoder,
        }
    }

    /// Download `corpus` into `target_folder/<name>`, returning that path.
    pub fn download(
        &self,
        corpus: &CorpusSpec,
        target_folder: &Path,
        progress: &dyn Progress,
    ) -> Result<PathBuf, Error> {
        let dst = target_folder.join(&corpus.name);
        if dst.exists() {
            info!("{} already exists at {:?}, skipping", corpus.name, dst);
            return Ok(dst);
        }

        fs::create_dir_all(target_folder)?;

        // same filesystem as dst, so that moves are renames.
        let tmp = tempfile::Builder::new()
            .prefix(".rifs-")
            .tempdir_in(target_folder)?;
        let clone = tmp.path().join(&corpus.name);

        info!("Downloading {} from {}", corpus.name, corpus.url);
        self.fetcher.fetch(&corpus.url, &clone, progress)?;

        if let Some(transcode) = &corpus.transcode {
            self.transcode(&clone, transcode, progress)?;
        }

        fs::create_dir_all(&dst)?;
        for step in &corpus.layout {
            let from = clone.join(&step.from);
            let to = dst.join(&step.to);
            debug!("moving {:?} to {:?}", from, to);
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&from, &to).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("{}: could not move {} to {:?}: {}", corpus.name, step.from, to, e),
                )
            })?;
        }

        tmp.close()?;

        if corpus.private {
            warn!(
                "{} audio is private: contact the authors to get access to the recordings",
                corpus.name
            );
        }
        info!("{} is available at {:?}", corpus.name, dst);
        Ok(dst)
    }

    /// Convert every `<src_dir>/<id>.<src_ext>` of the manifest to `<dst_dir>/<id>.<dst_ext>`.
    fn transcode(
        &self,
        root: &Path,
        spec: &TranscodeSpec,
        progress: &dyn Progress,
    ) -> Result<(), Error> {
        let manifest = Table::from_path(&root.join(&spec.manifest))?;
        let ids = manifest.column(&spec.id_column).ok_or_else(|| {
            Error::Schema(format!(
                "'{}' column not found in {}",
                spec.id_column, spec.manifest
            ))
        })?;

        let src_dir = root.join(&spec.src_dir);
        let dst_dir = root.join(&spec.dst_dir);
        fs::create_dir_all(&dst_dir)?;

        let total = ids.len() as u64;
        info!("transcoding {} files to {}", total, spec.dst_ext);
        for (idx, id) in ids.iter().enumerate() {
            let src = src_dir.join(format!("{}.{}", id, spec.src_ext));
            let dst = dst_dir.join(format!("{}.{}", id, spec.dst_ext));
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)?;
            }
            self.transcoder.convert_to_wav(&src, &dst)?;
            progress.update(idx as u64 + 1, total, id);
        }
        progress.finish();
        Ok(())
    }

    /// Sequentially download corpora.
    pub fn download_all(
        &self,
        corpora: &[&CorpusSpec],
        target_folder: &Path,
        progress: &dyn Progress,
    ) -> Vec<Result<PathBuf, Error>> {
        let nb_corpora = corpora.len();
        corpora
            .iter()
            .enumerate()
            .map(|(id, corpus)| {
                info!("downloading {}/{}", id + 1, nb_corpora);
                let res = self.download(corpus, target_folder, progress);
                if let Err(e) = &res {
                    error!("{}: {}", corpus.name, e);
                }
                res
            })
            .collect()
    }
}
