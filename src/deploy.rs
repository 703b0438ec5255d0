// Deploy code layout:
//
//   PUSHk <len>  DUP1  PUSH1 <codeLocation>  PUSH1 0x00  CODECOPY  PUSH1 0x00  RETURN  <runtime>
//
// codeLocation is the offset of the runtime code and must fit in one byte.

use thiserror::Error;

use crate::opcodes::{CODECOPY, DUP1, PUSH1, RETURN};

/// Largest offset addressable by the single-byte push of the code location.
pub const MAX_CODE_LOCATION: usize = u8::MAX as usize;

/// Runtime code is copied to, and returned from, this memory offset.
const MEMORY_OFFSET: u8 = 0x00;

const COPY_RETURN_TAIL: [u8; 6] = [PUSH1, MEMORY_OFFSET, CODECOPY, PUSH1, MEMORY_OFFSET, RETURN];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeployError {
    #[error(transparent)]
    Decode(#[from] hex::FromHexError),
    #[error("runtime code is empty")]
    EmptyCode,
    #[error("deploy code prefix longer than 255 bytes (runtime code would start at offset {0})")]
    PrefixTooLong(usize),
}

/// Big-endian bytes of `len` with leading zero bytes stripped. Zero encodes as
/// the empty sequence.
pub fn length_encoding(len: u64) -> Vec<u8> {
    let skip = (len.leading_zeros() / 8) as usize;
    len.to_be_bytes()[skip..].to_vec()
}

/// Offset of the runtime code given the length of the push-length and dup
/// instructions that precede the code-location push.
pub fn code_location(head_len: usize) -> Result<u8, DeployError> {
    let location = head_len.saturating_add(2 + COPY_RETURN_TAIL.len());
    if location > MAX_CODE_LOCATION {
        return Err(DeployError::PrefixTooLong(location));
    }
    Ok(location as u8)
}

/// Constructor prefix for runtime code of `code_len` bytes.
pub fn deploy_prefix(code_len: usize) -> Result<Vec<u8>, DeployError> {
    if code_len == 0 {
        return Err(DeployError::EmptyCode);
    }
    let length = length_encoding(code_len as u64);

    let mut prefix = Vec::with_capacity(length.len() + 4 + COPY_RETURN_TAIL.len());
    // length is 1..=8 bytes here, so this stays within PUSH1..PUSH8
    prefix.push(PUSH1 + (length.len() as u8 - 1));
    prefix.extend_from_slice(&length);
    prefix.push(DUP1);

    let location = code_location(prefix.len())?;
    prefix.extend_from_slice(&[PUSH1, location]);
    prefix.extend_from_slice(&COPY_RETURN_TAIL);
    Ok(prefix)
}

/// Prefix `runtime` with its constructor.
pub fn wrap(runtime: &[u8]) -> Result<Vec<u8>, DeployError> {
    let mut code = deploy_prefix(runtime.len())?;
    code.extend_from_slice(runtime);
    Ok(code)
}

/// Hex in, hex out. Surrounding whitespace is ignored; a `0x` prefix is not accepted.
pub fn wrap_hex(input: &str) -> Result<String, DeployError> {
    let runtime = hex::decode(input.trim())?;
    let code = wrap(&runtime)?;
    tracing::debug!(runtime_len = runtime.len(), deploy_len = code.len(), "wrapped runtime code");
    Ok(hex::encode(code))
}
