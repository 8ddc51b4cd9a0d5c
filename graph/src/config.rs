use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{GraphError, Result};

/// Order in which deferred merge parents are walked once the primary chain
/// of a commit has been laid down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeOrder {
    /// First merge parent encountered is walked first
    #[default]
    Discovery,
    /// Last merge parent encountered is walked first
    Reverse,
}

impl FromStr for MergeOrder {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "discovery" => Ok(MergeOrder::Discovery),
            "reverse" => Ok(MergeOrder::Reverse),
            other => Err(GraphError::InvalidConfig(format!(
                "unknown merge order '{}', expected 'discovery' or 'reverse'",
                other
            ))),
        }
    }
}

/// History building options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub merge_order: MergeOrder,
    /// Start from every branch, remote branch and tag instead of HEAD only
    pub all_refs: bool,
}

impl HistoryConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() -> anyhow::Result<()> {
        let config = HistoryConfig::from_toml("")?;
        assert_eq!(config, HistoryConfig::default());
        assert_eq!(config.merge_order, MergeOrder::Discovery);
        assert!(!config.all_refs);
        Ok(())
    }

    #[test]
    fn parses_fields() -> anyhow::Result<()> {
        let config = HistoryConfig::from_toml("merge_order = \"reverse\"\nall_refs = true\n")?;
        assert_eq!(config.merge_order, MergeOrder::Reverse);
        assert!(config.all_refs);
        Ok(())
    }

    #[test]
    fn rejects_unknown_order() {
        assert!(HistoryConfig::from_toml("merge_order = \"sideways\"").is_err());
        assert!("sideways".parse::<MergeOrder>().is_err());
    }

    #[test]
    fn parses_order_names() -> anyhow::Result<()> {
        assert_eq!("Discovery".parse::<MergeOrder>()?, MergeOrder::Discovery);
        assert_eq!("reverse".parse::<MergeOrder>()?, MergeOrder::Reverse);
        Ok(())
    }

    #[test]
    fn loads_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "merge_order = \"reverse\"")?;

        let config = HistoryConfig::load_from_file(file.path())?;
        assert_eq!(config.merge_order, MergeOrder::Reverse);
        Ok(())
    }
}
