// Snapshots live under `evm:state:<root>`, the most recent root under
// LATEST_STATE_ROOT_KEY.

use std::{path::Path, sync::Arc};

use kvdb::KeyValueDB;
use kvdb_rocksdb::{Database, DatabaseConfig};
use revm::primitives::B256;

use crate::{
    error::{Error, Result},
    state::WorldState,
};

pub const LATEST_STATE_ROOT_KEY: &[u8] = b"evm:LatestStateRootKey";

const STATE_PREFIX: &[u8] = b"evm:state:";
const COL_STATE: u32 = 0;
const NUM_COLUMNS: u32 = 1;

/// Subdirectory of the data directory holding the database.
pub const DB_DIR: &str = "evm";

#[derive(Clone)]
pub struct StateStore {
    db: Arc<dyn KeyValueDB>,
}

impl StateStore {
    pub fn in_memory() -> Self {
        Self { db: Arc::new(kvdb_memorydb::create(NUM_COLUMNS)) }
    }

    /// Opens (or creates) the database under `<datadir>/evm`. The flag tells
    /// whether it existed before this call.
    pub fn open(datadir: &Path) -> Result<(Self, bool)> {
        let path = datadir.join(DB_DIR);
        let existed = path.exists();
        if existed {
            tracing::info!(path = %path.display(), "datadir already exists");
        }
        tracing::info!(path = %path.display(), "loading database");
        std::fs::create_dir_all(&path)?;
        let db = Database::open(&DatabaseConfig::with_columns(NUM_COLUMNS), &path)?;
        Ok((Self { db: Arc::new(db) }, existed))
    }

    pub fn latest_root(&self) -> Result<Option<B256>> {
        let value = self.db.get(COL_STATE, LATEST_STATE_ROOT_KEY)?;
        Ok(value.filter(|v| v.len() == 32).map(|v| B256::from_slice(&v)))
    }

    pub fn load(&self, root: B256) -> Result<WorldState> {
        if root == B256::ZERO {
            return Ok(WorldState::default());
        }
        let raw = self.db.get(COL_STATE, &state_key(root))?.ok_or(Error::UnknownRoot(root))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Stores `state` and marks its root as the latest, in one write.
    pub fn commit(&self, state: &WorldState) -> Result<B256> {
        let root = state.root()?;
        let mut tx = self.db.transaction();
        if root != B256::ZERO {
            tx.put(COL_STATE, &state_key(root), &serde_json::to_vec(state)?);
        }
        tx.put(COL_STATE, LATEST_STATE_ROOT_KEY, root.as_slice());
        self.db.write(tx)?;
        tracing::debug!(%root, accounts = state.accounts.len(), "committed state");
        Ok(root)
    }
}

fn state_key(root: B256) -> Vec<u8> {
    [STATE_PREFIX, root.as_slice()].concat()
}
