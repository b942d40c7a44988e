//! The two tables of record, and their shared snapshot format.

mod active;
mod requests;

pub use active::SubscriptionTable;
pub use requests::RequestTable;

use crate::error::{Result, SubscriptionError};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// Magic bytes for the tables snapshot file.
const TABLES_MAGIC: &[u8; 4] = b"SUB\0";

/// Current snapshot format version.
const TABLES_VERSION: u8 = 1;

/// Both tables as one unit.
///
/// They serialize together so the snapshot on disk can never hold a request
/// and a subscription for the same pair from different points in time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    pub requests: RequestTable,
    pub subscriptions: SubscriptionTable,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a snapshot of both tables.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;

        file.write_all(TABLES_MAGIC)?;
        file.write_all(&[TABLES_VERSION])?;

        let encoded = rmp_serde::to_vec(self)?;
        file.write_all(&(encoded.len() as u64).to_le_bytes())?;
        file.write_all(&encoded)?;

        file.sync_all()?;
        Ok(())
    }

    /// Load a snapshot of both tables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != TABLES_MAGIC {
            return Err(SubscriptionError::InvalidFormat(
                "Invalid tables snapshot magic".into(),
            ));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != TABLES_VERSION {
            return Err(SubscriptionError::InvalidFormat(format!(
                "Unsupported tables snapshot version: {}",
                version[0]
            )));
        }

        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes) as usize;

        let mut encoded = vec![0u8; len];
        file.read_exact(&mut encoded)?;

        Ok(rmp_serde::from_slice(&encoded)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RequestKey, Timestamp};
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tables.bin");

        let mut tables = Tables::new();
        tables
            .requests
            .insert(RequestKey::new("alice", "Finance_Reports"), Timestamp(10))
            .unwrap();
        let id = tables
            .subscriptions
            .insert(RequestKey::new("bob", "Ops_Reports"), Timestamp(20))
            .unwrap();
        tables.save(&path).unwrap();

        let loaded = Tables::load(&path).unwrap();
        assert_eq!(loaded.requests.len(), 1);
        assert_eq!(loaded.subscriptions.len(), 1);
        assert_eq!(
            loaded
                .subscriptions
                .find_by_key(&RequestKey::new("bob", "Ops_Reports"))
                .unwrap()
                .id,
            id
        );
    }

    #[test]
    fn test_id_counter_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tables.bin");

        let mut tables = Tables::new();
        let key = RequestKey::new("alice", "Finance_Reports");
        let first = tables.subscriptions.insert(key.clone(), Timestamp(1)).unwrap();
        tables.subscriptions.delete_by_id(first).unwrap();
        tables.save(&path).unwrap();

        let mut loaded = Tables::load(&path).unwrap();
        let second = loaded.subscriptions.insert(key, Timestamp(2)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tables.bin");
        std::fs::write(&path, b"XXXX\x01junk").unwrap();

        let result = Tables::load(&path);
        assert!(matches!(result, Err(SubscriptionError::InvalidFormat(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tables.bin");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(TABLES_MAGIC);
        bytes.push(99);
        std::fs::write(&path, &bytes).unwrap();

        let result = Tables::load(&path);
        assert!(matches!(result, Err(SubscriptionError::InvalidFormat(_))));
    }
}
