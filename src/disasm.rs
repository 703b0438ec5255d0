use std::fmt;

use crate::opcodes;

/// One decoded instruction. `immediate` is truncated when a PUSH runs past the end of the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub pc: usize,
    pub opcode: u8,
    pub immediate: &'a [u8],
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}: ", self.pc)?;
        match opcodes::name(self.opcode) {
            Some(name) => f.write_str(name)?,
            None => write!(f, "0x{:02x}", self.opcode)?,
        }
        if opcodes::immediate_size(self.opcode) > 0 {
            write!(f, " 0x{}", hex::encode(self.immediate))?;
        }
        Ok(())
    }
}

pub fn disassemble(code: &[u8]) -> Vec<Instruction<'_>> {
    let mut out = Vec::new();
    let mut pc = 0usize;
    while pc < code.len() {
        let opcode = code[pc];
        let start = pc + 1;
        let end = (start + opcodes::immediate_size(opcode)).min(code.len());
        out.push(Instruction { pc, opcode, immediate: &code[start..end] });
        pc = start + opcodes::immediate_size(opcode);
    }
    out
}

/// Multi-line listing, one instruction per line.
pub fn listing(code: &[u8]) -> String {
    disassemble(code).iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}
