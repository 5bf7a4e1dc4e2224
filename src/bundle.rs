//! JavaScript bundling collaborator.
//!
//! Maps each named target of the manifest to a content-hashed public asset
//! path. Bundling runs once at startup, before routes are expanded; any
//! failure is fatal.
//!
//! The default [`HashBundler`] does no transpiling: it copies the entry
//! file to `<out_dir>/<stem>_<hash>.js`, where `<hash>` is derived from the
//! file contents.

use crate::{log, manifest::JavascriptTarget};
use sha2::{Digest, Sha256};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Target name → public asset path (e.g. `/static/js/main_1a2b3c4d5e6f7a8b.js`)
pub type AssetMap = BTreeMap<String, String>;

/// Hex characters of the digest kept in file names
const HASH_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("javascript target `{0}`: cannot read `{1}`")]
    Read(String, PathBuf, #[source] std::io::Error),

    #[error("javascript target `{0}`: cannot write `{1}`")]
    Write(String, PathBuf, #[source] std::io::Error),

    #[error("javascript target `{0}`: `{1}` has no file name")]
    InvalidSource(String, PathBuf),
}

pub trait Bundler {
    fn bundle(&self, targets: &BTreeMap<String, JavascriptTarget>) -> Result<AssetMap, BundleError>;
}

/// Copies each entry to a content-hashed file under its `out_dir`.
pub struct HashBundler {
    root: PathBuf,
}

impl HashBundler {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn emit(&self, name: &str, target: &JavascriptTarget) -> Result<String, BundleError> {
        let source = self.root.join(&target.source);
        let contents = fs::read(&source)
            .map_err(|err| BundleError::Read(name.to_owned(), source.clone(), err))?;

        let stem = target
            .source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| BundleError::InvalidSource(name.to_owned(), target.source.clone()))?;
        let file_name = format!("{stem}_{}.js", content_hash(&contents));

        let out_dir = self.root.join(&target.out_dir);
        let dest = out_dir.join(&file_name);
        fs::create_dir_all(&out_dir)
            .and_then(|()| fs::write(&dest, &contents))
            .map_err(|err| BundleError::Write(name.to_owned(), dest.clone(), err))?;

        Ok(public_path(&target.out_dir, &file_name))
    }
}

impl Bundler for HashBundler {
    fn bundle(
        &self,
        targets: &BTreeMap<String, JavascriptTarget>,
    ) -> Result<AssetMap, BundleError> {
        let mut emitted = AssetMap::new();
        for (name, target) in targets {
            let public = self.emit(name, target)?;
            log!("bundle"; "{name} -> {public}");
            emitted.insert(name.clone(), public);
        }
        Ok(emitted)
    }
}

fn content_hash(contents: &[u8]) -> String {
    let digest = Sha256::digest(contents);
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash
}

/// `/<out_dir>/<file>` with forward slashes regardless of platform
fn public_path(out_dir: &Path, file_name: &str) -> String {
    let dir = out_dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .filter(|c| c != "." && c != "/")
        .collect::<Vec<_>>()
        .join("/");
    if dir.is_empty() {
        format!("/{file_name}")
    } else {
        format!("/{dir}/{file_name}")
    }
}
