//! Runtime configuration: optional TOML file, then `CASEBOOK_*` environment
//! variables, then defaults.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use casebook_core::projection::SortOrder;
use serde::Deserialize;

/// Everything `casebook` needs to know before opening the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file.
  pub store_path: PathBuf,
  /// Directory holding one `IMG_<id>.jpg` per crime.
  pub photo_dir:  PathBuf,
  /// Where tracing output goes while the terminal UI owns the screen.
  pub log_file:   Option<PathBuf>,
  pub sort:       SortOrder,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("casebook.db"),
      photo_dir:  PathBuf::from("photos"),
      log_file:   None,
      sort:       SortOrder::default(),
    }
  }
}

impl Settings {
  /// Load settings from `path` (if it exists) layered under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("CASEBOOK"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise settings")?;

    Ok(settings.expanded())
  }

  /// Expand a leading `~` in every path.
  fn expanded(self) -> Self {
    Self {
      store_path: expand_tilde(&self.store_path),
      photo_dir:  expand_tilde(&self.photo_dir),
      log_file:   self.log_file.as_deref().map(expand_tilde),
      ..self
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.sort, SortOrder::NewestFirst);
    assert_eq!(settings.photo_dir, PathBuf::from("photos"));
    assert!(settings.log_file.is_none());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("casebook.toml");
    fs::write(
      &path,
      "store_path = \"/tmp/cases.db\"\nphoto_dir = \"/tmp/pics\"\nsort = \"title\"\n",
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.store_path, PathBuf::from("/tmp/cases.db"));
    assert_eq!(settings.photo_dir, PathBuf::from("/tmp/pics"));
    assert_eq!(settings.sort, SortOrder::Title);
  }

  #[test]
  fn tilde_is_left_alone_without_slash() {
    assert_eq!(expand_tilde(Path::new("~user/x")), PathBuf::from("~user/x"));
    assert_eq!(expand_tilde(Path::new("/abs/x")), PathBuf::from("/abs/x"));
  }
}
