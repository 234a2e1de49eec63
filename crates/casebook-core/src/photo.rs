//! Photo association: where a crime's photo lives on disk.
//!
//! The mapping is a pure function of the crime id and a storage root. Nothing
//! here writes files or touches the store; capture and decoding belong to
//! whatever front end owns the camera.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Resolves photo paths under a fixed root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoStore {
  root: PathBuf,
}

impl PhotoStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// File name for the photo of `id`, e.g. `IMG_<uuid>.jpg`. One photo per
  /// crime; a recapture overwrites it.
  pub fn file_name(id: Uuid) -> String { format!("IMG_{}.jpg", id.hyphenated()) }

  /// Full path for the photo of `id`. Always the same for the same id.
  pub fn path(&self, id: Uuid) -> PathBuf { self.root.join(Self::file_name(id)) }

  /// Whether a photo file is currently present for `id`. A missing photo is
  /// an ordinary state, not an error.
  pub fn exists(&self, id: Uuid) -> bool { self.path(id).is_file() }
}
