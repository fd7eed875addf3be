use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::{wrap_io_err, Error};

lazy_static! {
    static ref CONFIGDIR: PathBuf = {
        dirs::config_dir()
            .unwrap_or("./".into())
    };
    pub static ref DEFAULT_CONFIG: PathBuf = {
        Path::join(&CONFIGDIR, "unixar/config.toml")
    };
}

pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// How a byte range is cut out of an archive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpliceStrategy {
    /// Shift the tail of the file left in place, then truncate. A failure
    /// partway leaves the archive partially shifted.
    InPlace,
    /// Write the remaining bytes to a temporary file next to the archive and
    /// rename it over the original.
    #[default]
    RewriteViaTemp,
}

/// What `append` does when a member with the same name already exists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Add another member; lookups by name return the first one
    #[default]
    Allow,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub splice: SpliceStrategy,
    /// Size in bytes of the buffer used to copy and shift data
    pub block_size: usize,
    pub duplicates: DuplicatePolicy,
    /// Take an advisory lock on the archive while it is open
    pub lock: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            splice: SpliceStrategy::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            duplicates: DuplicatePolicy::default(),
            lock: true,
        }
    }
}

impl Config {
    /// Read a config file.
    pub fn open(file: &Path) -> Result<Config, Error> {
        let text = fs::read_to_string(file).map_err(wrap_io_err!(file, "Reading config"))?;
        Config::parse(&text, file)
    }

    /// Read [`DEFAULT_CONFIG`], falling back to the defaults when it does not
    /// exist.
    pub fn load_default() -> Result<Config, Error> {
        match fs::read_to_string(&*DEFAULT_CONFIG) {
            Ok(text) => Config::parse(&text, &DEFAULT_CONFIG),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(Error::Io {
                source: err,
                path: Some(DEFAULT_CONFIG.clone()),
                context: "Reading config",
            }),
        }
    }

    fn parse(text: &str, file: &Path) -> Result<Config, Error> {
        let config: Config = toml::from_str(text).map_err(|source| Error::Config {
            path: file.to_path_buf(),
            source,
        })?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), Error> {
        if self.block_size == 0 {
            return Err(Error::InvalidBlockSize(self.block_size));
        }
        Ok(())
    }

    /// Allocate a copy buffer of `block_size` bytes
    pub(crate) fn buffer(&self) -> Result<Vec<u8>, Error> {
        self.check()?;
        Ok(vec![0; self.block_size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = Config::parse("", Path::new("empty.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.splice, SpliceStrategy::RewriteViaTemp);
        assert_eq!(config.duplicates, DuplicatePolicy::Allow);
        assert!(config.lock);
    }

    #[test]
    fn parse_all_fields() {
        let text = r#"
            splice = "in_place"
            block_size = 512
            duplicates = "reject"
            lock = false
        "#;
        let config = Config::parse(text, Path::new("config.toml")).unwrap();
        assert_eq!(
            config,
            Config {
                splice: SpliceStrategy::InPlace,
                block_size: 512,
                duplicates: DuplicatePolicy::Reject,
                lock: false,
            }
        );
    }

    #[test]
    fn zero_block_size() {
        let err = Config::parse("block_size = 0", Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, Error::InvalidBlockSize(0)));
    }

    #[test]
    fn unknown_strategy() {
        let err = Config::parse(r#"splice = "mmap""#, Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn serialize_round_trip() {
        let config = Config {
            splice: SpliceStrategy::InPlace,
            ..Config::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(Config::parse(&text, Path::new("config.toml")).unwrap(), config);
    }
}
