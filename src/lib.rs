pub mod opcodes;
pub mod disasm;
pub mod deploy;
pub mod error;
pub mod state;
pub mod store;
pub mod config;
pub mod runner;
pub mod logging;

pub use config::{EvmArgs, Header, Message, Mode, RunConfig};
pub use deploy::{wrap, wrap_hex, DeployError};
pub use error::{Error, Result};
pub use runner::{Outcome, Runner};
pub use state::{AccountSnapshot, WorldState};
pub use store::{StateStore, LATEST_STATE_ROOT_KEY};
