use super::{control_store, Word};
use crate::program::Program;

const NEXT_ADDRESS_BITS: u32 = 9;
const CONTROL_BITS: u32 = 27;

/// One `'0'`/`'1'` line per word: 9-bit next-address then 27-bit control,
/// each MSB-first.
pub fn emit(program: &Program) -> String {
    let words = control_store(program);
    let mut out = String::with_capacity(words.len() * (NEXT_ADDRESS_BITS + CONTROL_BITS + 1) as usize);
    for word in words {
        write_word(&mut out, word);
        out.push('\n');
    }
    out
}

fn write_word(out: &mut String, (next_address, control): Word) {
    for bit in (0..NEXT_ADDRESS_BITS).rev() {
        out.push(if next_address & (1 << bit) != 0 { '1' } else { '0' });
    }
    for bit in (0..CONTROL_BITS).rev() {
        out.push(if control & (1 << bit) != 0 { '1' } else { '0' });
    }
}

/// Parses a text listing produced by [`emit`] back into `(next_address,
/// control)` words, for the emitter round-trip property (§8 property 8).
pub fn parse(listing: &str) -> Vec<Word> {
    listing
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            let bits: Vec<u8> = line.bytes().map(|b| if b == b'1' { 1 } else { 0 }).collect();
            let next_address = bits[..NEXT_ADDRESS_BITS as usize]
                .iter()
                .fold(0u16, |acc, &b| (acc << 1) | b as u16);
            let control = bits[NEXT_ADDRESS_BITS as usize..]
                .iter()
                .fold(0u32, |acc, &b| (acc << 1) | b as u32);
            (next_address, control)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::allocate;
    use crate::parser::parse_source;
    use crate::translator::translate;

    #[test]
    fn round_trips_through_text() {
        let lines = parse_source("main = 0x000: halt\n").unwrap();
        let mut program = translate(&lines).unwrap();
        allocate(&mut program).unwrap();

        let listing = emit(&program);
        assert_eq!(listing.lines().count(), 512);
        assert_eq!(listing.lines().next().unwrap().len(), 36);

        let parsed = parse(&listing);
        assert_eq!(parsed, control_store(&program));
    }
}
