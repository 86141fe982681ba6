// Serializes a frozen `Program` to the two output formats named in §6.2.
// Both emitters are pure functions of the resolved 512-word control store
// view built here once and shared between them.

pub mod binary;
pub mod text;

use crate::encoder::constants::CONTROL_STORE_SIZE;
use crate::program::Program;

/// One micro-word ready for serialization: `(next_address, control)`, both
/// zero for any address the allocator never reached.
pub type Word = (u16, u32);

/// Builds the full `CONTROL_STORE_SIZE`-word view from a program's
/// instructions. An instruction with an unresolved `next_address` (dead
/// code the allocator left undetermined) emits as a zero word, per §9.
pub fn control_store(program: &Program) -> Vec<Word> {
    let mut words = vec![(0u16, 0u32); CONTROL_STORE_SIZE];

    for instruction in &program.instructions {
        let (Some(address), Some(next_address)) = (instruction.address, instruction.next_address) else {
            continue;
        };
        words[address as usize] = (next_address, instruction.control);
    }

    words
}
