use std::path::PathBuf;

use clap::Parser;
use revm::primitives::{Address, Bytes, B256, U256};

use crate::error::{Error, Result};

/// `left_pad("sender")`
pub const DEFAULT_FROM: &str = "0x000000000000000000000000000073656e646572";
/// `left_pad("receiver")`
pub const DEFAULT_TO: &str = "0x0000000000000000000000007265636569766572";
/// `left_pad("coinbase")`
pub const DEFAULT_COINBASE: &str = "0x000000000000000000000000636f696e62617365";

#[derive(Debug, Parser)]
#[command(name = "evm", version, about = "the evm command line interface")]
pub struct EvmArgs {
    /// Output full trace logs
    #[arg(long)]
    pub debug: bool,
    /// Sets the verbosity level (0=warn, 1=info, 2=debug, 3=trace)
    #[arg(long, default_value_t = 0)]
    pub verbosity: u8,
    /// Display system stats
    #[arg(long)]
    pub sysstat: bool,
    /// Dumps the state after the run
    #[arg(long)]
    pub dump: bool,

    /// EVM code as hex, or @file holding hex
    #[arg(long, default_value = "")]
    pub code: String,
    /// Run as contract creation with code ++ input as init code
    #[arg(long)]
    pub create: bool,
    /// Gas limit for the evm
    #[arg(long, default_value_t = 10_000_000_000)]
    pub gas: u64,
    /// Price set for the evm
    #[arg(long, default_value = "1", value_parser = parse_u256)]
    pub price: U256,
    /// Value set for the evm
    #[arg(long, default_value = "0", value_parser = parse_u256)]
    pub value: U256,
    /// Input for the EVM
    #[arg(long, default_value = "", value_parser = parse_bytes)]
    pub input: Bytes,
    /// Address sending the call
    #[arg(long, default_value = DEFAULT_FROM, value_parser = parse_address)]
    pub from: Address,
    /// Destination address receiving the call
    #[arg(long, default_value = DEFAULT_TO, value_parser = parse_address)]
    pub to: Address,

    /// Directory to load/store persistent state
    #[arg(long)]
    pub datadir: Option<PathBuf>,
    /// State root to load
    #[arg(long, value_parser = parse_hash)]
    pub root: Option<B256>,

    /// Set coinbase address
    #[arg(long, default_value = DEFAULT_COINBASE, value_parser = parse_address)]
    pub coinbase: Address,
    /// Mining difficulty
    #[arg(long, default_value = "0", value_parser = parse_u256)]
    pub difficulty: U256,
    /// Block number
    #[arg(long, default_value = "0", value_parser = parse_u256)]
    pub number: U256,
    /// Set the per-block gas-limit
    #[arg(long = "gas-limit", default_value = "10000000", value_parser = parse_u256)]
    pub gas_limit: U256,
    /// Last block time
    #[arg(long, default_value = "0", value_parser = parse_u256)]
    pub time: U256,
}

/// Transaction-level inputs handed to the EVM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: Address,
    pub to: Address,
    pub gas_price: U256,
    pub gas: u64,
    pub value: U256,
    pub data: Bytes,
}

/// Block context the transaction executes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub coinbase: Address,
    pub difficulty: U256,
    pub number: U256,
    pub gas_limit: U256,
    pub time: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Call,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub code: Bytes,
    pub message: Message,
    pub header: Header,
    pub datadir: Option<PathBuf>,
    pub root: Option<B256>,
    pub dump: bool,
    pub sysstat: bool,
    pub debug: bool,
    pub verbosity: u8,
}

impl EvmArgs {
    pub fn into_config(self) -> Result<RunConfig> {
        let code = read_code_arg(&self.code)?;
        if code.starts_with(&[0xef, 0x00]) {
            return Err(Error::EofCode);
        }
        Ok(RunConfig {
            mode: if self.create { Mode::Create } else { Mode::Call },
            code,
            message: Message {
                from: self.from,
                to: self.to,
                gas_price: self.price,
                gas: self.gas,
                value: self.value,
                data: self.input,
            },
            header: Header {
                coinbase: self.coinbase,
                difficulty: self.difficulty,
                number: self.number,
                gas_limit: self.gas_limit,
                time: self.time,
            },
            datadir: self.datadir,
            root: self.root,
            dump: self.dump,
            sysstat: self.sysstat,
            debug: self.debug,
            verbosity: self.verbosity,
        })
    }
}

/// `@path` reads hex text from a file, anything else is hex itself.
fn read_code_arg(arg: &str) -> Result<Bytes> {
    if let Some(path) = arg.strip_prefix('@') {
        let text = std::fs::read_to_string(path)
            .map_err(|source| Error::CodeFile { path: PathBuf::from(path), source })?;
        decode_hex(&text).map_err(|source| Error::Hex { what: "code file", source })
    } else {
        decode_hex(arg).map_err(|source| Error::Hex { what: "--code", source })
    }
}

fn decode_hex(s: &str) -> Result<Bytes, hex::FromHexError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    Ok(hex::decode(s)?.into())
}

pub fn parse_bytes(s: &str) -> Result<Bytes, String> {
    decode_hex(s).map_err(|e| format!("invalid hex: {e}"))
}

/// Decimal, or hex with a `0x` prefix.
pub fn parse_u256(s: &str) -> Result<U256, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(s, 10),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

pub fn parse_address(s: &str) -> Result<Address, String> {
    let bytes = decode_hex(s).map_err(|e| format!("invalid address {s:?}: {e}"))?;
    if bytes.len() != 20 {
        return Err(format!("invalid address {s:?}: expected 20 bytes, got {}", bytes.len()));
    }
    Ok(Address::from_slice(&bytes))
}

pub fn parse_hash(s: &str) -> Result<B256, String> {
    let bytes = decode_hex(s).map_err(|e| format!("invalid hash {s:?}: {e}"))?;
    if bytes.len() != 32 {
        return Err(format!("invalid hash {s:?}: expected 32 bytes, got {}", bytes.len()));
    }
    Ok(B256::from_slice(&bytes))
}
