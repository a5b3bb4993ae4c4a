//! Local deployment log.
//!
//! A JSON array of [`DeploymentRecord`]s in a single file. The log is pure
//! bookkeeping: it is never consulted for chain state.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::data::validate::{validate_address, validate_hash, ValidationError};

/// Maximum label length in characters.
const MAX_LABEL_LEN: usize = 120;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("label is longer than 120 characters")]
    LabelTooLong,

    #[error("deployment log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("deployment log is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub address: String,
    pub tx_hash: String,
    pub deployer: String,
    pub label: String,
    /// UNIX seconds at which the record was stored.
    pub timestamp: u64,
}

/// Request body for recording a deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDeployment {
    pub address: String,
    pub tx_hash: String,
    pub deployer: String,
    #[serde(default)]
    pub label: String,
}

impl NewDeployment {
    fn validate(&self) -> Result<(), StoreError> {
        validate_address(&self.address)?;
        validate_hash(&self.tx_hash)?;
        validate_address(&self.deployer).map_err(|e| ValidationError {
            field: "deployer",
            message: e.message,
        })?;
        if self.label.chars().count() > MAX_LABEL_LEN {
            return Err(StoreError::LabelTooLong);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct DeploymentLog {
    path: PathBuf,
    records: Vec<DeploymentRecord>,
}

impl DeploymentLog {
    /// Open the log at `path`; a missing file is an empty log.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, records })
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[DeploymentRecord] {
        &self.records
    }

    pub fn newest_first(&self) -> Vec<DeploymentRecord> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    /// Validate, stamp, append and persist a deployment.
    pub async fn record(
        &mut self,
        new: NewDeployment,
        timestamp: u64,
    ) -> Result<DeploymentRecord, StoreError> {
        new.validate()?;
        let record = DeploymentRecord {
            address: new.address,
            tx_hash: new.tx_hash,
            deployer: new.deployer,
            label: new.label.trim().to_string(),
            timestamp,
        };
        self.records.push(record.clone());
        if let Err(e) = self.persist().await {
            self.records.pop();
            return Err(e);
        }
        Ok(record)
    }

    /// Write the whole log through a temp file in the same directory and
    /// rename it into place.
    async fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&self.records)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(std::io::Error::other)??;
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample(label: &str) -> NewDeployment {
        NewDeployment {
            address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            tx_hash: format!("0x{}", "1f".repeat(32)),
            deployer: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn missing_file_is_empty_log() {
        let dir = tempdir().unwrap();
        let log = DeploymentLog::load(dir.path().join("deployments.json")).unwrap();
        assert!(log.records().is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            DeploymentLog::load(&path),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn records_persist_across_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        let mut log = DeploymentLog::load(&path).unwrap();
        log.record(sample("  vault  "), 100).await.unwrap();
        log.record(sample("registry"), 200).await.unwrap();

        let reloaded = DeploymentLog::load(&path).unwrap();
        assert_eq!(reloaded.records().len(), 2);
        assert_eq!(reloaded.records()[0].label, "vault");
        assert_eq!(reloaded.newest_first()[0].label, "registry");
        // Only the log itself is left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, ["deployments.json"]);
    }

    #[tokio::test]
    async fn rejects_invalid_records() {
        let dir = tempdir().unwrap();
        let mut log = DeploymentLog::load(dir.path().join("d.json")).unwrap();

        let mut bad = sample("x");
        bad.tx_hash = "0x1234".to_string();
        assert!(matches!(
            log.record(bad, 1).await,
            Err(StoreError::Invalid(ValidationError { field: "hash", .. }))
        ));

        let mut bad = sample("x");
        bad.deployer = "nobody".to_string();
        assert!(matches!(
            log.record(bad, 1).await,
            Err(StoreError::Invalid(ValidationError {
                field: "deployer",
                ..
            }))
        ));

        assert!(matches!(
            log.record(sample(&"x".repeat(121)), 1).await,
            Err(StoreError::LabelTooLong)
        ));
        assert!(log.records().is_empty());
    }

    #[tokio::test]
    async fn failed_write_does_not_keep_record() {
        let dir = tempdir().unwrap();
        let mut log = DeploymentLog::load(dir.path().join("missing/dir/d.json")).unwrap();
        assert!(matches!(
            log.record(sample("x"), 1).await,
            Err(StoreError::Io(_))
        ));
        assert!(log.records().is_empty());
    }
}
