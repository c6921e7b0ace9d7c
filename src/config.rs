//! Runtime configuration
//!
//! A handful of settings the `config` command can read and tweak with the
//! `item = value` grammar:
//!
//! ```text
//! cli.base   = 10 | 16    output base for integer values
//! cli.quiet  = 0 | 1      terse listings
//! block.size = bytes      default hex-dump length
//! scan.align = bytes      scan stride; 0 means the element size
//! ```

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cli: CliConfig,
    pub block: BlockConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Output base for integer values: 10 or 16.
    pub base: u32,
    /// Terse listings when set.
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockConfig {
    /// Default byte count for `hex` dumps.
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Scan stride in bytes; 0 uses the element size.
    pub align: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            cli: CliConfig {
                base: 10,
                quiet: false,
            },
            block: BlockConfig { size: 256 },
            scan: ScanConfig { align: 0 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownItem(String),
    InvalidValue(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownItem(item) => write!(f, "unknown config item '{}'", item),
            ConfigError::InvalidValue(item, value) => {
                write!(f, "invalid value '{}' for config item '{}'", value, item)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub const ITEMS: [&'static str; 4] = ["cli.base", "cli.quiet", "block.size", "scan.align"];

    pub fn get(&self, item: &str) -> Option<String> {
        match item {
            "cli.base" => Some(self.cli.base.to_string()),
            "cli.quiet" => Some((self.cli.quiet as u32).to_string()),
            "block.size" => Some(self.block.size.to_string()),
            "scan.align" => Some(self.scan.align.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, item: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue(item.to_string(), value.to_string());
        match item {
            "cli.base" => match value.parse() {
                Ok(base @ (10 | 16)) => {
                    self.cli.base = base;
                    Ok(())
                }
                _ => Err(invalid()),
            },
            "cli.quiet" => match value {
                "0" => {
                    self.cli.quiet = false;
                    Ok(())
                }
                "1" => {
                    self.cli.quiet = true;
                    Ok(())
                }
                _ => Err(invalid()),
            },
            "block.size" => match value.parse() {
                Ok(size) if size > 0 => {
                    self.block.size = size;
                    Ok(())
                }
                _ => Err(invalid()),
            },
            "scan.align" => value
                .parse()
                .map(|align| self.scan.align = align)
                .map_err(|_| invalid()),
            _ => Err(ConfigError::UnknownItem(item.to_string())),
        }
    }
}
