//! Remote repository fetching.
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use itertools::Itertools;
use log::{debug, info};

use crate::error::Error;
use crate::progress::Progress;

/// Number of non-progress stderr lines kept for error messages.
const STDERR_TAIL: usize = 5;

/// Fetches a remote repository into an (empty) local folder.
pub trait Fetcher {
    fn fetch(&self, url: &str, dst: &Path, progress: &dyn Progress) -> Result<(), Error>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str, dst: &Path, progress: &dyn Progress) -> Result<(), Error> {
        (**self).fetch(url, dst, progress)
    }
}

/// Clones with the `git` executable.
///
/// `git clone --progress` prints counters such as `Receiving objects:  45% (450/1000)` on stderr,
/// which are forwarded to the progress sink.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Fetcher for GitCli {
    fn fetch(&self, url: &str, dst: &Path, progress: &dyn Progress) -> Result<(), Error> {
        info!("cloning {} into {:?}", url, dst);
        let mut child = Command::new(&self.program)
            .arg("clone")
            .arg("--progress")
            .arg(url)
            .arg(dst)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Fetch(format!("could not run {:?}: {}", self.program, e)))?;

        let mut tail = VecDeque::with_capacity(STDERR_TAIL);
        if let Some(stderr) = child.stderr.take() {
            // progress lines are \r-terminated
            for chunk in BufReader::new(stderr).split(b'\r') {
                let chunk = chunk?;
                for line in String::from_utf8_lossy(&chunk).lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match parse_progress(line) {
                        Some((current, total, phase)) => progress.update(current, total, phase),
                        None => {
                            debug!("git: {}", line);
                            if tail.len() == STDERR_TAIL {
                                tail.pop_front();
                            }
                            tail.push_back(line.to_string());
                        }
                    }
                }
            }
        }

        let status = child.wait()?;
        progress.finish();
        if !status.success() {
            return Err(Error::Fetch(format!(
                "git clone {} failed ({}): {}",
                url,
                status,
                tail.iter().join(" / ")
            )));
        }
        Ok(())
    }
}

/// Extract `(current, total, phase)` from a git progress line.
fn parse_progress(line: &str) -> Option<(u64, u64, &str)> {
    let (phase, counters) = line.split_once(':')?;
    let counters = counters.trim_start();
    // "remote: Counting objects: ..."
    let (phase, counters) = match counters.split_once(':') {
        Some((inner, rest)) if phase == "remote" => (inner, rest),
        _ => (phase, counters),
    };

    let open = counters.find('(')?;
    let close = open + counters[open..].find(')')?;
    let (current, total) = counters[open + 1..close].split_once('/')?;

    Some((
        current.trim().parse().ok()?,
        total.trim().parse().ok()?,
        phase.trim(),
    ))
}
