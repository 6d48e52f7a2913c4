//! Single-pass opcode scan over raw EVM bytecode.
//!
//! The scan walks the byte stream linearly, stepping over PUSH immediates so
//! literal data is never read as an instruction. Bytes following a halting
//! instruction are treated as unreachable until the next `JUMPDEST`.

use crate::opcodes::{Kind, Target};

pub struct Scanner;

impl Scanner {
    /// Offset of the first reachable occurrence of `target`, if any.
    pub fn find(code: &[u8], target: Target) -> Option<usize> {
        let needle = target.code();
        let mut halted = false;
        let mut pc = 0;

        while pc < code.len() {
            let op = code[pc];
            match Kind::of(op) {
                Kind::JumpDest => halted = false,
                Kind::Push(n) => {
                    // A truncated immediate pushes `pc` past the end and ends the loop.
                    pc += 1 + n;
                    continue;
                }
                Kind::Halt => {
                    if op == needle && !halted {
                        return Some(pc);
                    }
                    halted = true;
                }
                Kind::Other => {
                    if op == needle && !halted {
                        return Some(pc);
                    }
                }
            }
            pc += 1;
        }

        None
    }

    pub fn contains(code: &[u8], target: Target) -> bool {
        Self::find(code, target).is_some()
    }
}
