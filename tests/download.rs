use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use rifs_datasets::download::Downloader;
use rifs_datasets::error::Error;
use rifs_datasets::progress::{NoProgress, Progress};
use rifs_datasets::sources::{CorpusSpec, Fetcher, Move, TranscodeSpec, Transcoder, CATALOG};

/// Writes a fixed set of files instead of cloning.
#[derive(Default)]
struct FakeFetcher {
    files: Vec<(&'static str, &'static str)>,
    calls: Cell<usize>,
    fail: bool,
}

impl FakeFetcher {
    fn with_files(files: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            files,
            ..Default::default()
        }
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str, dst: &Path, progress: &dyn Progress) -> Result<(), Error> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(Error::Fetch(format!("{url} is unreachable")));
        }
        let total = self.files.len() as u64;
        for (idx, (path, content)) in self.files.iter().enumerate() {
            let path = dst.join(path);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, content)?;
            progress.update(idx as u64 + 1, total, "Receiving objects");
        }
        Ok(())
    }
}

/// Copies the source file, recording conversions.
#[derive(Default)]
struct FakeTranscoder {
    converted: RefCell<Vec<PathBuf>>,
}

impl Transcoder for FakeTranscoder {
    fn convert_to_wav(&self, src: &Path, dst: &Path) -> Result<(), Error> {
        if !src.is_file() {
            return Err(Error::Transcode(format!("{:?} not found", src)));
        }
        fs::copy(src, dst)?;
        self.converted.borrow_mut().push(dst.to_path_buf());
        Ok(())
    }
}

fn simple_corpus() -> CorpusSpec {
    CorpusSpec::new(
        "Simple",
        "file:///simple.git",
        vec![Move::same("all.csv"), Move::new("wav", "audio")],
    )
}

/// Entries of `dir`, hidden ones included.
fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test_log::test]
fn layout_is_applied() {
    let dst = tempfile::tempdir().unwrap();
    let fetcher = FakeFetcher::with_files(vec![
        ("all.csv", "id\n1\n"),
        ("wav/1.wav", "RIFF"),
        ("README.md", "not kept"),
    ]);
    let dl = Downloader::new(fetcher, FakeTranscoder::default());

    let path = dl
        .download(&simple_corpus(), dst.path(), &NoProgress)
        .unwrap();
    assert_eq!(path, dst.path().join("Simple"));
    assert_eq!(entries(&path), vec!["all.csv", "audio"]);
    assert_eq!(fs::read_to_string(path.join("audio/1.wav")).unwrap(), "RIFF");

    // clone folder is gone
    assert_eq!(entries(dst.path()), vec!["Simple"]);
}

#[test]
fn existing_corpus_is_not_downloaded() {
    let dst = tempfile::tempdir().unwrap();
    fs::create_dir_all(dst.path().join("Simple")).unwrap();
    fs::write(dst.path().join("Simple/keep.txt"), "mine").unwrap();

    let fetcher = FakeFetcher::with_files(vec![("all.csv", "id\n")]);
    let dl = Downloader::new(fetcher, FakeTranscoder::default());
    let path = dl
        .download(&simple_corpus(), dst.path(), &NoProgress)
        .unwrap();

    assert_eq!(path, dst.path().join("Simple"));
    assert_eq!(entries(&path), vec!["keep.txt"]);
}

#[test]
fn fetcher_is_not_called_when_present() {
    let dst = tempfile::tempdir().unwrap();
    fs::create_dir_all(dst.path().join("Simple")).unwrap();

    let fetcher = FakeFetcher::default();
    Downloader::new(&fetcher, FakeTranscoder::default())
        .download(&simple_corpus(), dst.path(), &NoProgress)
        .unwrap();
    assert_eq!(fetcher.calls.get(), 0);
}

#[test]
fn transcoding_happens_before_moves() {
    let dst = tempfile::tempdir().unwrap();
    let fetcher = FakeFetcher::with_files(vec![
        ("all.csv", "id,text\na,hej\nsub/b,dav\n"),
        ("audio/a.mp3", "A"),
        ("audio/sub/b.mp3", "B"),
        ("text/a.txt", "hej"),
    ]);
    let transcoder = FakeTranscoder::default();
    let corpus = CATALOG.get("DanskeTaler").unwrap().clone();
    let dl = Downloader::new(fetcher, &transcoder);

    let path = dl.download(&corpus, dst.path(), &NoProgress).unwrap();

    assert_eq!(transcoder.converted.borrow().len(), 2);
    assert_eq!(entries(&path), vec!["all.csv", "audio", "text"]);
    assert_eq!(fs::read_to_string(path.join("audio/a.wav")).unwrap(), "A");
    assert_eq!(fs::read_to_string(path.join("audio/sub/b.wav")).unwrap(), "B");
    assert!(!path.join("audio/a.mp3").exists());
}

#[test]
fn missing_audio_fails_transcoding() {
    let dst = tempfile::tempdir().unwrap();
    let fetcher = FakeFetcher::with_files(vec![("all.csv", "id\nmissing\n")]);
    let corpus = simple_corpus().with_transcode(TranscodeSpec::mp3_to_wav("audio", "wav"));
    let dl = Downloader::new(fetcher, FakeTranscoder::default());

    assert!(matches!(
        dl.download(&corpus, dst.path(), &NoProgress),
        Err(Error::Transcode(_))
    ));
    assert!(!dst.path().join("Simple").exists());
    assert!(entries(dst.path()).is_empty());
}

#[test]
fn missing_layout_entry() {
    let dst = tempfile::tempdir().unwrap();
    let fetcher = FakeFetcher::with_files(vec![("all.csv", "id\n")]);
    let dl = Downloader::new(fetcher, FakeTranscoder::default());

    assert!(matches!(
        dl.download(&simple_corpus(), dst.path(), &NoProgress),
        Err(Error::Io(_))
    ));
    // only the target remains, the clone is cleaned up
    assert_eq!(entries(dst.path()), vec!["Simple"]);
}

#[test]
fn failed_fetch_leaves_nothing() {
    let dst = tempfile::tempdir().unwrap();
    let fetcher = FakeFetcher {
        fail: true,
        ..Default::default()
    };
    let dl = Downloader::new(fetcher, FakeTranscoder::default());

    assert!(matches!(
        dl.download(&simple_corpus(), dst.path(), &NoProgress),
        Err(Error::Fetch(_))
    ));
    assert!(entries(dst.path()).is_empty());
}

#[test]
fn download_all_keeps_going() {
    let dst = tempfile::tempdir().unwrap();
    fs::create_dir_all(dst.path().join("Other")).unwrap();

    let fetcher = FakeFetcher::with_files(vec![("all.csv", "id\n")]);
    let dl = Downloader::new(&fetcher, FakeTranscoder::default());

    let broken = simple_corpus();
    let other = CorpusSpec::new("Other", "file:///other.git", vec![Move::same("all.csv")]);
    let results = dl.download_all(&[&broken, &other], dst.path(), &NoProgress);

    assert_eq!(results.len(), 2);
    assert!(results[0].is_err());
    assert_eq!(results[1].as_ref().unwrap(), &dst.path().join("Other"));
    assert_eq!(fetcher.calls.get(), 1);
}
