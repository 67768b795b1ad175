//! Corpus catalog.
//!
//! Every corpus is published as a git repository that has to be reorganized after cloning
//! (some files are moved, some audio is transcoded).
//! Corpora are described by a [CorpusSpec], and the known ones live in [struct@CATALOG].
//! Additional or replacement specs can be loaded from a JSON file:
//!
//! ```json
//! [
//!   {
//!     "name": "MyCorpus",
//!     "url": "https://example.com/my-corpus.git",
//!     "layout": [{"from": "all.csv", "to": "all.csv"}, {"from": "wav", "to": "audio"}]
//!   }
//! ]
//! ```
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Move `from` (relative to the clone) to `to` (relative to the corpus folder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: String,
    pub to: String,
}

impl Move {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Move keeping the same name.
    pub fn same(path: &str) -> Self {
        Self::new(path, path)
    }
}

fn default_manifest() -> String {
    "all.csv".to_string()
}
fn default_id_column() -> String {
    "id".to_string()
}
fn default_src_ext() -> String {
    "mp3".to_string()
}
fn default_dst_ext() -> String {
    "wav".to_string()
}

/// Transcode `<src_dir>/<id>.<src_ext>` to `<dst_dir>/<id>.<dst_ext>`
/// for every `id` of the manifest, before files are moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeSpec {
    #[serde(default = "default_manifest")]
    pub manifest: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    pub src_dir: String,
    pub dst_dir: String,
    #[serde(default = "default_src_ext")]
    pub src_ext: String,
    #[serde(default = "default_dst_ext")]
    pub dst_ext: String,
}

impl TranscodeSpec {
    /// mp3 to wav over `all.csv` ids.
    pub fn mp3_to_wav(src_dir: &str, dst_dir: &str) -> Self {
        Self {
            manifest: default_manifest(),
            id_column: default_id_column(),
            src_dir: src_dir.to_string(),
            dst_dir: dst_dir.to_string(),
            src_ext: default_src_ext(),
            dst_ext: default_dst_ext(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSpec {
    /// Name of the corpus, and of its folder once downloaded.
    pub name: String,
    pub url: String,
    pub layout: Vec<Move>,
    #[serde(default)]
    pub transcode: Option<TranscodeSpec>,
    /// Audio has to be requested from the authors.
    #[serde(default)]
    pub private: bool,
}

impl CorpusSpec {
    pub fn new(name: &str, url: &str, layout: Vec<Move>) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            layout,
            transcode: None,
            private: false,
        }
    }

    pub fn with_transcode(mut self, transcode: TranscodeSpec) -> Self {
        self.transcode = Some(transcode);
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    corpora: Vec<CorpusSpec>,
}

lazy_static! {
    /// Corpora of the project.
    pub static ref CATALOG: Catalog = Catalog::builtin();
}

impl Catalog {
    pub fn new(corpora: Vec<CorpusSpec>) -> Self {
        Self { corpora }
    }

    fn builtin() -> Self {
        let transcoded_layout = vec![
            Move::same("all.csv"),
            Move::same("text"),
            Move::new("audio_wav", "audio"),
        ];

        Self::new(vec![
            CorpusSpec::new(
                "LibriVoxDansk",
                "git@github.com:rifs-is-free-speech/LibriVoxDansk.git",
                vec![Move::same("all.csv"), Move::same("text"), Move::same("audio")],
            ),
            CorpusSpec::new(
                "DanPASS",
                "git@github.com:rifs-is-free-speech/DanPASS.git",
                vec![
                    Move::same("all.csv"),
                    Move::same("text_cleaning.csv"),
                    Move::same("text"),
                    Move::same("audio"),
                ],
            )
            .private(),
            CorpusSpec::new(
                "NSTDanishSpråkbanken",
                "git@github.com:rifs-is-free-speech/NSTDanishSpr-kbanken.git",
                vec![Move::same("all.csv"), Move::same("text"), Move::same("audio")],
            ),
            CorpusSpec::new(
                "CommonVoiceDansk",
                "git@github.com:rifs-is-free-speech/CommonVoiceDansk.git",
                vec![
                    Move::same("all.csv"),
                    Move::same("train.csv"),
                    Move::same("dev.csv"),
                    Move::same("test.csv"),
                    Move::same("cleaning.py"),
                    Move::same("audio"),
                ],
            )
            .private(),
            CorpusSpec::new(
                "DanskeTaler",
                "git@github.com:rifs-is-free-speech/DanskeTaler.git",
                transcoded_layout.clone(),
            )
            .with_transcode(TranscodeSpec::mp3_to_wav("audio", "audio_wav")),
            CorpusSpec::new(
                "Den2Radio",
                "git@github.com:rifs-is-free-speech/Den2Radio.git",
                transcoded_layout,
            )
            .with_transcode(TranscodeSpec::mp3_to_wav("audio", "audio_wav")),
        ])
    }

    /// Load a catalog from a JSON array of [CorpusSpec].
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        debug!("loading catalog from {:?}", path);
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Add the corpora of `other`, replacing the ones with the same name.
    pub fn extend(&mut self, other: Catalog) {
        for corpus in other.corpora {
            match self
                .corpora
                .iter_mut()
                .find(|c| c.name.to_lowercase() == corpus.name.to_lowercase())
            {
                Some(existing) => *existing = corpus,
                None => self.corpora.push(corpus),
            }
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&CorpusSpec> {
        let name = name.to_lowercase();
        self.corpora.iter().find(|c| c.name.to_lowercase() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpusSpec> {
        self.corpora.iter()
    }

    pub fn len(&self) -> usize {
        self.corpora.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpora.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names() {
        let names: Vec<&str> = CATALOG.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "LibriVoxDansk",
                "DanPASS",
                "NSTDanishSpråkbanken",
                "CommonVoiceDansk",
                "DanskeTaler",
                "Den2Radio"
            ]
        );
    }

    #[test]
    fn lookup_ignores_case() {
        let c = CATALOG.get("nstdanishspråkbanken").unwrap();
        assert!(c.url.ends_with("NSTDanishSpr-kbanken.git"));
        assert!(CATALOG.get("danpass").unwrap().private);
        assert!(CATALOG.get("unknown").is_none());
    }

    #[test]
    fn transcoded_corpora() {
        let c = CATALOG.get("DanskeTaler").unwrap();
        let t = c.transcode.as_ref().unwrap();
        assert_eq!(t.src_ext, "mp3");
        assert_eq!(t.dst_dir, "audio_wav");
        assert!(c.layout.contains(&Move::new("audio_wav", "audio")));
    }

    #[test]
    fn json_defaults() {
        let json = r#"[
            {"name": "Foo", "url": "file:///foo", "layout": [{"from": "a", "to": "b"}]},
            {"name": "Bar", "url": "file:///bar", "layout": [],
             "transcode": {"src_dir": "mp3", "dst_dir": "wav"}, "private": true}
        ]"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let foo = catalog.get("foo").unwrap();
        assert!(!foo.private);
        assert!(foo.transcode.is_none());
        assert_eq!(foo.layout, vec![Move::new("a", "b")]);

        let bar = catalog.get("bar").unwrap();
        assert!(bar.private);
        assert_eq!(
            bar.transcode,
            Some(TranscodeSpec {
                manifest: "all.csv".to_string(),
                id_column: "id".to_string(),
                src_dir: "mp3".to_string(),
                dst_dir: "wav".to_string(),
                src_ext: "mp3".to_string(),
                dst_ext: "wav".to_string(),
            })
        );
    }

    #[test]
    fn extend_overrides() {
        let mut catalog = CATALOG.clone();
        let before = catalog.len();
        catalog.extend(Catalog::new(vec![
            CorpusSpec::new("librivoxdansk", "file:///mirror", vec![]),
            CorpusSpec::new("New", "file:///new", vec![]),
        ]));

        assert_eq!(catalog.len(), before + 1);
        assert_eq!(catalog.get("LibriVoxDansk").unwrap().url, "file:///mirror");
        assert!(catalog.get("new").is_some());
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, serde_json::to_string(&*CATALOG).unwrap()).unwrap();
        assert_eq!(Catalog::from_path(&path).unwrap(), *CATALOG);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Catalog::from_path(&path), Err(Error::Serde(_))));
    }
}
