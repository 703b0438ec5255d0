// World-state snapshots persisted between runs, and their conversion to and
// from the EVM library's in-memory database.

use std::collections::BTreeMap;

use revm::{
    db::{AccountState, CacheDB, EmptyDB},
    primitives::{AccountInfo, Address, Bytecode, BytecodeDecodeError, Bytes, B256, U256},
};
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

pub type MemoryDb = CacheDB<EmptyDB>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub nonce: u64,
    pub balance: U256,
    #[serde(default, skip_serializing_if = "<[u8]>::is_empty")]
    pub code: Bytes,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<B256, B256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    pub accounts: BTreeMap<Address, AccountSnapshot>,
}

impl WorldState {
    /// Root the snapshot is stored under. The empty world has the zero root so
    /// a fresh store needs no entry for it.
    pub fn root(&self) -> Result<B256, serde_json::Error> {
        if self.accounts.is_empty() {
            return Ok(B256::ZERO);
        }
        let encoded = serde_json::to_vec(self)?;
        let mut out = [0u8; 32];
        let mut hasher = Keccak::v256();
        hasher.update(&encoded);
        hasher.finalize(&mut out);
        Ok(B256::from(out))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Fails if a stored account carries code the EVM library cannot decode.
    pub fn into_db(self) -> Result<MemoryDb, BytecodeDecodeError> {
        let mut db = CacheDB::new(EmptyDB::default());
        for (address, account) in self.accounts {
            let bytecode = Bytecode::new_raw_checked(account.code)?;
            let info = AccountInfo::new(account.balance, account.nonce, bytecode.hash_slow(), bytecode);
            db.insert_account_info(address, info);
            if let Some(entry) = db.accounts.get_mut(&address) {
                entry.storage.extend(
                    account.storage.into_iter().map(|(slot, value)| (U256::from_be_bytes(slot.0), U256::from_be_bytes(value.0))),
                );
            }
        }
        Ok(db)
    }

    pub fn from_db(db: &MemoryDb) -> Self {
        let mut accounts = BTreeMap::new();
        for (address, account) in &db.accounts {
            if matches!(account.account_state, AccountState::NotExisting) {
                continue;
            }
            let code = account
                .info
                .code
                .clone()
                .or_else(|| db.contracts.get(&account.info.code_hash).cloned())
                .map(|code| code.original_bytes())
                .unwrap_or_default();
            let storage = account
                .storage
                .iter()
                .filter(|(_, value)| !value.is_zero())
                .map(|(slot, value)| (B256::from(*slot), B256::from(*value)))
                .collect();
            accounts.insert(
                *address,
                AccountSnapshot { nonce: account.info.nonce, balance: account.info.balance, code, storage },
            );
        }
        Self { accounts }
    }
}
