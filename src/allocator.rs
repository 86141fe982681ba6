// Three-phase placement of a translated `Program` onto the control store:
// apply reclaim promises, place block-annotated blocks (coupling if/else
// pairs at the required +256 displacement), then resolve whatever
// next-address fields are still symbolic.

use std::collections::HashSet;

use crate::chunks::FreeChunkChain;
use crate::encoder::constants::CONTROL_STORE_SIZE;
use crate::errors::MalError;
use crate::program::Program;

pub fn allocate(program: &mut Program) -> Result<(), MalError> {
    let mut chain = FreeChunkChain::new(CONTROL_STORE_SIZE as u16);

    apply_reclaim_promises(program, &mut chain)?;
    place_blocks(program, &mut chain)?;
    resolve_next_addresses(program);

    Ok(())
}

fn apply_reclaim_promises(program: &Program, chain: &mut FreeChunkChain) -> Result<(), MalError> {
    for &(s, e) in &program.reclaim_promises {
        chain.reclaim(s, e)?;
    }
    Ok(())
}

fn place_blocks(program: &mut Program, chain: &mut FreeChunkChain) -> Result<(), MalError> {
    let mut placed: HashSet<usize> = HashSet::new();
    let starts: Vec<usize> = program.block_annotations.keys().copied().collect();

    for start in starts {
        if placed.contains(&start) {
            continue;
        }
        let size = *program.block_annotations.get(&start).expect("start came from the map");
        let label = program.instructions[start].label.clone().unwrap_or_default();

        let partner = if label.is_empty() {
            None
        } else {
            program.if_else_pairs.get(&label).cloned()
        };

        match partner {
            Some(partner_label) => {
                let partner_start = *program.count_for_label.get(&partner_label).ok_or_else(|| {
                    MalError::InfeasibleLayout {
                        reason: format!(
                            "if/else pair ({label}, {partner_label}) names an undeclared label \"{partner_label}\""
                        ),
                    }
                })?;
                let partner_size = *program.block_annotations.get(&partner_start).ok_or_else(|| {
                    MalError::InfeasibleLayout {
                        reason: format!(
                            "if/else pair ({label}, {partner_label}) couples an unpinned label with pinned label \"{partner_label}\""
                        ),
                    }
                })?;

                let (else_label, else_start, else_size, if_label, if_start, if_size) =
                    if program.is_else(&label) {
                        (label.clone(), start, size, partner_label.clone(), partner_start, partner_size)
                    } else {
                        (partner_label.clone(), partner_start, partner_size, label.clone(), start, size)
                    };

                let (else_addr, if_addr) = chain.displaced_pair(else_size, if_size, 256)?;

                allocate_region(program, chain, &else_label, else_start, else_size, else_addr)?;
                allocate_region(program, chain, &if_label, if_start, if_size, if_addr)?;

                placed.insert(else_start);
                placed.insert(if_start);
            }
            None => {
                let addr = chain.first_chunk_ge(size)?;
                allocate_region(program, chain, &label, start, size, addr)?;
                placed.insert(start);
            }
        }
    }

    Ok(())
}

/// Reclaims `[a, a+k-1]`, records the label's address, and assigns every
/// instruction in the block its address and (save for the last) its
/// sequential next-address.
fn allocate_region(
    program: &mut Program,
    chain: &mut FreeChunkChain,
    label: &str,
    start: usize,
    size: u32,
    a: u16,
) -> Result<(), MalError> {
    chain.reclaim(a, a + size as u16 - 1)?;
    if !label.is_empty() {
        program.address_for_label.insert(label.to_string(), Some(a));
    }

    for j in 0..size {
        let addr = a + j as u16;
        let instruction = &mut program.instructions[start + j as usize];
        instruction.address = Some(addr);
        if j < size - 1 {
            instruction.next_address = Some(addr + 1);
        }
    }

    Ok(())
}

fn resolve_next_addresses(program: &mut Program) {
    for instruction in &mut program.instructions {
        if instruction.next_address.is_some() {
            continue;
        }
        if let Some(target) = &instruction.target_label {
            if let Some(Some(addr)) = program.address_for_label.get(target) {
                instruction.next_address = Some(*addr);
                continue;
            }
        }
        if instruction.is_halt {
            instruction.next_address = instruction.address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::translator::translate;

    fn run(source: &str) -> Program {
        let lines = parse_source(source).unwrap();
        let mut program = translate(&lines).unwrap();
        allocate(&mut program).unwrap();
        program
    }

    #[test]
    fn halt_self_loops() {
        let program = run("main = 0x000: halt\n");
        assert_eq!(program.instructions[0].address, Some(0));
        assert_eq!(program.instructions[0].next_address, Some(0));
    }

    #[test]
    fn forward_goto_resolves_through_first_free_chunk() {
        let program = run("main = 0x000: goto loop\nloop: H = H + 1; goto loop\n");
        let loop_addr = program.address_for_label["loop"].unwrap();
        assert_eq!(loop_addr, 1);
        assert_eq!(program.instructions[0].next_address, Some(loop_addr));
        assert_eq!(program.instructions[1].next_address, Some(loop_addr));
    }

    #[test]
    fn if_else_pair_is_displaced_by_256() {
        let program = run(
            "start = 0x000: Z = TOS; if (Z) goto isz; else goto nnz\nnnz: H = H; goto start\nisz: MDR = 0; goto start\n",
        );
        let nnz = program.address_for_label["nnz"].unwrap();
        let isz = program.address_for_label["isz"].unwrap();
        assert_eq!(isz - nnz, 256);
        assert_eq!(isz % 256, nnz % 256);
        assert_eq!(program.instructions[0].next_address, Some(nnz));
    }

    #[test]
    fn overlapping_pins_are_infeasible() {
        let lines = parse_source("a = 0x010: H = H + 1\nb = 0x010: halt\n").unwrap();
        let mut program = translate(&lines).unwrap();
        assert!(matches!(allocate(&mut program), Err(MalError::InfeasibleLayout { .. })));
    }

    #[test]
    fn if_else_naming_an_undeclared_label_is_infeasible_not_a_panic() {
        let lines = parse_source(
            "start: Z = TOS; if (Z) goto isz_typo; else goto nnz\nnnz: H = H; goto start\n",
        )
        .unwrap();
        let mut program = translate(&lines).unwrap();
        assert!(matches!(allocate(&mut program), Err(MalError::InfeasibleLayout { .. })));
    }

    #[test]
    fn if_else_coupling_a_pinned_label_with_an_unpinned_one_is_infeasible_not_a_panic() {
        let lines = parse_source(
            "main = 0x000: Z = TOS; if (Z) goto fixed; else goto nnz\nfixed = 0x0A0: halt\nnnz: H = H; goto main\n",
        )
        .unwrap();
        let mut program = translate(&lines).unwrap();
        assert!(matches!(allocate(&mut program), Err(MalError::InfeasibleLayout { .. })));
    }

    #[test]
    fn unpinned_blocks_pack_into_remaining_free_chunks() {
        let program = run(
            "a = 0x010: H = H\nH = H\nH = H; goto b\nb: H = H\nH = H; goto c\nc: H = H\nH = H\nH = H\nH = H; halt\n",
        );
        let b = program.address_for_label["b"].unwrap();
        let c = program.address_for_label["c"].unwrap();
        // first_chunk_ge(2) on [0,15] (after reclaiming the pinned [16,18])
        // lands the size-2 block at 0, leaving [2,15] for the size-4 block.
        assert_eq!(b, 0);
        assert_eq!(c, 2);
    }
}
