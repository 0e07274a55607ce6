//! Deployment configuration of the key authority.
//!
//! All fields have defaults, so an empty JSON object `{}` is a valid
//! configuration:
//!
//! ```
//! use medabe::config::AbeConfig;
//! let config = AbeConfig::from_json(r#"{ "universe_size": 16 }"#).unwrap();
//! assert_eq!(config.scheme, "waters11");
//! assert_eq!(config.universe_size, 16);
//! ```
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::directory::AttributeDirectory;
use crate::error::AbeError;
use crate::schemes::waters11::Waters11;
use crate::utils::group::GROUP_NAME;

pub const DEFAULT_UNIVERSE_SIZE: usize = 100;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AbeConfig {
    /// Only `waters11` (any case) is supported.
    pub scheme: String,
    /// Name of the pairing group, must be `BN254`.
    pub group: String,
    pub universe_size: usize,
    pub key_dir: PathBuf,
    pub public_key_file: String,
    pub master_key_file: String,
    /// Attribute names, bound to ids in order.
    pub attributes: Vec<String>,
}

impl Default for AbeConfig {
    fn default() -> Self {
        AbeConfig {
            scheme: "waters11".to_string(),
            group: GROUP_NAME.to_string(),
            universe_size: DEFAULT_UNIVERSE_SIZE,
            key_dir: PathBuf::from("./keys"),
            public_key_file: "public_key.json".to_string(),
            master_key_file: "master_key.json".to_string(),
            attributes: Vec::new(),
        }
    }
}

impl AbeConfig {
    pub fn from_json(data: &str) -> Result<AbeConfig, AbeError> {
        let config: AbeConfig = serde_json::from_str(data).map_err(|e| AbeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<AbeConfig, AbeError> {
        AbeConfig::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), AbeError> {
        if !self.scheme.eq_ignore_ascii_case("waters11") {
            return Err(AbeError::Config(format!("unsupported scheme {}", self.scheme)));
        }
        if self.group != GROUP_NAME {
            return Err(AbeError::Config(format!("unsupported pairing group {}", self.group)));
        }
        if self.universe_size == 0 {
            return Err(AbeError::Config("universe_size must be positive".to_string()));
        }
        for file in [&self.public_key_file, &self.master_key_file] {
            if file.is_empty() || file.contains('/') || file.contains('\\') {
                return Err(AbeError::Config(format!("invalid key file name '{}'", file)));
            }
        }
        if self.public_key_file == self.master_key_file {
            return Err(AbeError::Config("public and master key files must differ".to_string()));
        }
        if self.attributes.len() > self.universe_size {
            return Err(AbeError::Config(format!(
                "{} attributes do not fit into a universe of size {}",
                self.attributes.len(),
                self.universe_size
            )));
        }
        Ok(())
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.key_dir.join(&self.public_key_file)
    }

    pub fn master_key_path(&self) -> PathBuf {
        self.key_dir.join(&self.master_key_file)
    }

    pub fn scheme(&self) -> Result<Waters11, AbeError> {
        Waters11::new(self.universe_size)
    }

    pub fn directory(&self) -> Result<AttributeDirectory, AbeError> {
        AttributeDirectory::from_names(self.universe_size, &self.attributes)
    }
}
