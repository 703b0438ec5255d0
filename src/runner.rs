// Single-transaction runner: load state, execute one create or call, persist
// the post-state.

use std::time::{Duration, Instant};

use revm::{
    inspector_handle_register,
    inspectors::TracerEip3155,
    primitives::{
        AccountInfo, Address, Bytecode, Bytes, ExecutionResult, Output, SpecId, TxKind, B256, U256,
    },
    Evm,
};

use crate::{
    config::{Header, Message, Mode, RunConfig},
    disasm,
    error::{Error, Result},
    state::{MemoryDb, WorldState},
    store::StateStore,
};

#[derive(Debug, Clone)]
pub struct Outcome {
    /// Root the post-state was committed under.
    pub root: B256,
    /// Return data, or the deployed code for a successful create.
    pub output: Bytes,
    pub created: Option<Address>,
    pub gas_used: u64,
    /// Revert or halt reason. The state is committed either way.
    pub failure: Option<String>,
    pub elapsed: Duration,
    pub state: WorldState,
}

pub struct Runner {
    store: StateStore,
    root: B256,
}

impl Runner {
    /// Opens the store named by the config and picks the root to start from.
    ///
    /// With a data directory that already existed, `--root` wins over the
    /// latest committed root. Everything else starts from the empty state.
    pub fn open(config: &RunConfig) -> Result<Self> {
        let (store, existed) = match &config.datadir {
            Some(dir) => StateStore::open(dir)?,
            None => (StateStore::in_memory(), false),
        };
        let root = if existed {
            match config.root {
                Some(root) => root,
                None => store.latest_root()?.unwrap_or_default(),
            }
        } else {
            if config.root.is_some() {
                tracing::warn!("no existing state to load, ignoring --root");
            }
            B256::ZERO
        };
        Ok(Self::with_store(store, root))
    }

    pub fn with_store(store: StateStore, root: B256) -> Self {
        Self { store, root }
    }

    pub fn run(&self, config: &RunConfig) -> Result<Outcome> {
        tracing::info!(root = %self.root, "loading root hash");
        let mut db = self.store.load(self.root)?.into_db()?;

        ensure_account(&mut db, config.message.from);

        let (kind, data) = match config.mode {
            Mode::Create => {
                let init: Bytes = [&config.code[..], &config.message.data[..]].concat().into();
                (TxKind::Create, init)
            }
            Mode::Call => {
                set_code(&mut db, config.message.to, config.code.clone())?;
                (TxKind::Call(config.message.to), config.message.data.clone())
            }
        };
        if config.debug {
            tracing::debug!("code:\n{}", disasm::listing(&config.code));
        }

        let start = Instant::now();
        let result = execute(&mut db, &config.message, &config.header, kind, data, config.debug)?;
        let elapsed = start.elapsed();
        tracing::debug!(?result, "execution finished");

        let gas_used = result.gas_used();
        let (output, created, failure) = match result {
            ExecutionResult::Success { output: Output::Call(out), .. } => (out, None, None),
            ExecutionResult::Success { output: Output::Create(out, address), .. } => {
                if let Some(address) = address {
                    tracing::info!(%address, "contract created");
                }
                (out, address, None)
            }
            ExecutionResult::Revert { output, .. } => (output, None, Some("execution reverted".to_string())),
            ExecutionResult::Halt { reason, .. } => (Bytes::new(), None, Some(format!("{reason:?}"))),
        };

        let state = WorldState::from_db(&db);
        let root = self.store.commit(&state)?;
        Ok(Outcome { root, output, created, gas_used, failure, elapsed, state })
    }
}

fn ensure_account(db: &mut MemoryDb, address: Address) {
    if !db.accounts.contains_key(&address) {
        db.insert_account_info(address, AccountInfo::default());
    }
}

/// Replaces the code at `address`, creating the account if needed. Balance,
/// nonce and storage are kept.
fn set_code(db: &mut MemoryDb, address: Address, code: Bytes) -> Result<()> {
    let bytecode = Bytecode::new_raw_checked(code)?;
    let mut info = db.accounts.get(&address).map(|account| account.info.clone()).unwrap_or_default();
    info.code_hash = bytecode.hash_slow();
    info.code = Some(bytecode);
    db.insert_account_info(address, info);
    Ok(())
}

/// Executes and commits one transaction. With `trace` set, every executed
/// step is written to stderr as an EIP-3155 JSON line.
fn execute(
    db: &mut MemoryDb,
    message: &Message,
    header: &Header,
    kind: TxKind,
    data: Bytes,
    trace: bool,
) -> Result<ExecutionResult> {
    let builder = Evm::builder()
        .with_db(db)
        .modify_cfg_env(|cfg| {
            cfg.disable_balance_check = true;
            cfg.disable_block_gas_limit = true;
            cfg.disable_base_fee = true;
        })
        .modify_block_env(|block| {
            block.number = header.number;
            block.coinbase = header.coinbase;
            block.timestamp = header.time;
            block.gas_limit = header.gas_limit;
            block.difficulty = header.difficulty;
            block.prevrandao = Some(B256::from(header.difficulty));
            block.basefee = U256::ZERO;
        })
        .modify_tx_env(|tx| {
            tx.caller = message.from;
            tx.transact_to = kind;
            tx.data = data;
            tx.value = message.value;
            tx.gas_limit = message.gas;
            tx.gas_price = message.gas_price;
            tx.nonce = None;
        });

    let result = if trace {
        builder
            .with_external_context(TracerEip3155::new(Box::new(std::io::stderr())))
            .with_spec_id(SpecId::CANCUN)
            .append_handler_register(inspector_handle_register)
            .build()
            .transact_commit()
    } else {
        builder.with_spec_id(SpecId::CANCUN).build().transact_commit()
    };
    result.map_err(|e| Error::Execution(e.to_string()))
}
