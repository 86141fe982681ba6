use super::{control_store, Word};
use crate::program::Program;

const NEXT_ADDRESS_BITS: u32 = 9;
const CONTROL_BITS: u32 = 27;
const WORD_BITS: u32 = NEXT_ADDRESS_BITS + CONTROL_BITS;

/// Packs every word's 36 bits, MSB-first, into a contiguous byte stream;
/// the final byte is zero-padded on the right if `36 * N` isn't a multiple
/// of 8.
pub fn emit(program: &Program) -> Vec<u8> {
    let words = control_store(program);
    let mut bit_buffer: u64 = 0;
    let mut bit_count: u32 = 0;
    let mut bytes = Vec::with_capacity((words.len() * WORD_BITS as usize).div_ceil(8));

    for word in words {
        push_word(&mut bit_buffer, &mut bit_count, &mut bytes, word);
    }

    if bit_count > 0 {
        let pad = 8 - bit_count;
        bit_buffer <<= pad;
        bytes.push(bit_buffer as u8);
    }

    bytes
}

fn push_word(bit_buffer: &mut u64, bit_count: &mut u32, bytes: &mut Vec<u8>, (next_address, control): Word) {
    let word: u64 = ((next_address as u64) << CONTROL_BITS) | control as u64;
    for bit in (0..WORD_BITS).rev() {
        let value = (word >> bit) & 1;
        *bit_buffer = (*bit_buffer << 1) | value;
        *bit_count += 1;
        if *bit_count == 8 {
            bytes.push(*bit_buffer as u8);
            *bit_buffer = 0;
            *bit_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::allocate;
    use crate::parser::parse_source;
    use crate::translator::translate;

    #[test]
    fn packs_to_the_expected_byte_count() {
        let lines = parse_source("main = 0x000: halt\n").unwrap();
        let mut program = translate(&lines).unwrap();
        allocate(&mut program).unwrap();

        let bytes = emit(&program);
        let total_bits = 512u32 * WORD_BITS;
        assert_eq!(bytes.len(), total_bits.div_ceil(8) as usize);
    }

    #[test]
    fn halt_word_is_the_default_control_with_next_address_zero() {
        let lines = parse_source("main = 0x000: halt\n").unwrap();
        let mut program = translate(&lines).unwrap();
        allocate(&mut program).unwrap();

        let bytes = emit(&program);
        // next_address=0 (9 zero bits) then control bits 26..0, bits 0 and 3 set.
        // Byte 0: next_address[8..1] = 00000000
        assert_eq!(bytes[0], 0x00);
    }
}
