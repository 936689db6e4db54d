use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use super::parse::parse_transfer_export;
use super::types::TransactionRecord;

/// Seam to the wallet-data collaborator: whoever can answer "what are this
/// address's transfers" can drive the graph.
pub trait TransactionSource: Send + Sync {
    fn fetch(&self, address: &str) -> Result<Vec<TransactionRecord>>;
}

/// Reads captured explorer exports from a directory, one `<address>.json`
/// file per address, so the whole app runs offline.
#[derive(Clone, Debug)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn export_path(&self, address: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", address.trim().to_ascii_lowercase()))
    }
}

impl TransactionSource for JsonDirSource {
    fn fetch(&self, address: &str) -> Result<Vec<TransactionRecord>> {
        let path = self.export_path(address);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read transaction export {}", path.display()))?;
        let records = parse_transfer_export(&raw, address)
            .with_context(|| format!("failed to parse transaction export {}", path.display()))?;
        debug!(address, count = records.len(), "loaded transaction export");
        Ok(records)
    }
}
