//! File configuration for a chaincode host.
//!
//! ```json
//! {
//!   "engine": { "maxCandidates": 128, "adminIdentities": ["9f2c..."] },
//!   "logLevel": "tessera_protocol=debug,info",
//!   "logFormat": "json",
//!   "dataDir": "/var/lib/tessera"
//! }
//! ```
//!
//! Every field is optional. Without `dataDir` the ledger is temporary.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use tessera_protocol::EngineConfig;

use crate::dispatch::Chaincode;
use crate::logging::LogFormat;
use crate::sled_ledger::SledLedger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChaincodeConfig {
    pub engine: EngineConfig,
    pub log_level: String,
    pub log_format: LogFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            data_dir: None,
        }
    }
}

impl ChaincodeConfig {
    /// Read and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("loading config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(raw).context("parsing configuration")?;
        config.engine.validate().context("invalid engine configuration")?;
        Ok(config)
    }

    /// Open the configured ledger and wrap it in a [`Chaincode`].
    pub fn build(&self) -> anyhow::Result<Chaincode<SledLedger>> {
        let ledger = match &self.data_dir {
            Some(dir) => SledLedger::open(dir)
                .with_context(|| format!("opening ledger at {}", dir.display()))?,
            None => SledLedger::open_temporary().context("opening temporary ledger")?,
        };
        Ok(Chaincode::new(ledger, self.engine.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_yields_defaults() {
        let config = ChaincodeConfig::from_json("{}").unwrap();
        assert_eq!(config, ChaincodeConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"engine": {{"maxCandidates": 8}}, "logFormat": "json"}}"#
        )
        .unwrap();

        let config = ChaincodeConfig::load(file.path()).unwrap();
        assert_eq!(config.engine.max_candidates, 8);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_invalid_engine_config_rejected() {
        let err = ChaincodeConfig::from_json(r#"{"engine": {"maxCandidates": 0}}"#).unwrap_err();
        assert!(format!("{err:#}").contains("maxCandidates"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = ChaincodeConfig::load("/nonexistent/tessera.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tessera.json"));
    }

    #[test]
    fn test_build_with_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChaincodeConfig {
            data_dir: Some(dir.path().join("ledger")),
            ..ChaincodeConfig::default()
        };
        let chaincode = config.build().unwrap();
        assert_eq!(chaincode.backend().sequence().unwrap(), 0);
    }
}
