//! Runtime configuration, read from an optional TOML file and `LINEAGE_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use lineage_core::mutation::MaritalChecks;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// argon2 PHC string for the shared login secret. Only serving needs it.
  #[serde(default)]
  pub private_key_hash: Option<String>,
  #[serde(default = "default_photo_dir")]
  pub photo_dir:        PathBuf,
  #[serde(default = "default_photo_base_url")]
  pub photo_base_url:   String,
  #[serde(default)]
  pub marital_checks:   MaritalChecks,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/lineage/registry.db") }
fn default_photo_dir() -> PathBuf { PathBuf::from("~/.local/share/lineage/photos") }
fn default_photo_base_url() -> String { "/photos".to_owned() }

impl ServerConfig {
  /// Layer `LINEAGE_*` environment variables over the file at `path`, which
  /// may be absent.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LINEAGE"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn photo_dir(&self) -> PathBuf { expand_tilde(&self.photo_dir) }

  /// The login secret hash, required before the API can be served.
  pub fn private_key_hash(&self) -> anyhow::Result<&str> {
    self
      .private_key_hash
      .as_deref()
      .filter(|h| !h.trim().is_empty())
      .context("private_key_hash is not set; generate one with --hash-secret")
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
  use super::*;

  fn parse(toml: &str) -> Result<ServerConfig, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()?
      .try_deserialize()
  }

  #[test]
  fn defaults_fill_every_field() {
    let cfg = parse(r#"private_key_hash = "$argon2id$v=19$abc""#).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.marital_checks, MaritalChecks::Relaxed);
    assert_eq!(cfg.photo_base_url, "/photos");
    assert_eq!(cfg.private_key_hash().unwrap(), "$argon2id$v=19$abc");
  }

  #[test]
  fn store_only_modes_load_without_a_secret() {
    let cfg = parse(r#"store_path = "/var/lib/lineage/registry.db""#).unwrap();
    assert_eq!(cfg.store_path(), PathBuf::from("/var/lib/lineage/registry.db"));
    assert!(cfg.private_key_hash().is_err());

    let blank = parse(r#"private_key_hash = "  ""#).unwrap();
    assert!(blank.private_key_hash().is_err());
  }

  #[test]
  fn marital_checks_can_be_strict() {
    let cfg = parse(
      r#"
        private_key_hash = "x"
        port = 9000
        marital_checks = "strict"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.marital_checks, MaritalChecks::Strict);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
