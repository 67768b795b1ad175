//! Audio transcoding.
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::Error;

/// Converts a single audio file to wav, overwriting `dst`.
pub trait Transcoder {
    fn convert_to_wav(&self, src: &Path, dst: &Path) -> Result<(), Error>;
}

impl<T: Transcoder + ?Sized> Transcoder for &T {
    fn convert_to_wav(&self, src: &Path, dst: &Path) -> Result<(), Error> {
        (**self).convert_to_wav(src, dst)
    }
}

/// Transcodes with the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for Ffmpeg {
    fn convert_to_wav(&self, src: &Path, dst: &Path) -> Result<(), Error> {
        debug!("converting {:?} to {:?}", src, dst);
        let output = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(src)
            .arg(dst)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Transcode(format!("could not run {:?}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(Error::Transcode(format!(
                "{:?} -> {:?} ({}): {}",
                src,
                dst,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = Ffmpeg::new("definitely-not-an-ffmpeg-binary");
        let res = ffmpeg.convert_to_wav(&dir.path().join("a.mp3"), &dir.path().join("a.wav"));
        assert!(matches!(res, Err(Error::Transcode(_))));
    }
}
