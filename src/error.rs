use std::path::PathBuf;

use revm::primitives::{BytecodeDecodeError, B256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("state database: {0}")]
    Database(#[from] std::io::Error),
    #[error("state snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("unknown state root {0}")]
    UnknownRoot(B256),
    #[error("transaction rejected: {0}")]
    Execution(String),
    #[error("read {}: {source}", path.display())]
    CodeFile { path: PathBuf, source: std::io::Error },
    #[error("invalid hex in {what}: {source}")]
    Hex { what: &'static str, source: hex::FromHexError },
    #[error("EOF-formatted code (0xef00 prefix) is not supported")]
    EofCode,
    #[error("invalid bytecode: {0}")]
    Bytecode(#[from] BytecodeDecodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
