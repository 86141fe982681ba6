// Single left-to-right walk over the parsed program. Drives two
// mutually-exclusive state machines (contiguous allocation following a pin,
// and size-only block annotation for unpinned runs) and populates the
// `Program`'s label tables and if/else registrations. Never assigns
// addresses for block-annotated instructions; that is the allocator's job.

use crate::ast::{ParsedLine, Statement};
use crate::encoder::{self, Instruction};
use crate::errors::MalError;
use crate::program::Program;

#[derive(Debug)]
enum Mode {
    None,
    Contiguous { pin: u16, cursor: u16 },
    Annotating { start: usize, size: u32 },
}

pub fn translate(lines: &[ParsedLine]) -> Result<Program, MalError> {
    let mut program = Program::new();
    let mut mode = Mode::None;

    for (index, line) in lines.iter().enumerate() {
        let encoded = encoder::encode(line);
        let mut instruction = encoded.instruction;

        if let Some(pair) = encoded.if_else {
            program.add_if_else_target(&pair.if_label, &pair.else_label)?;
        }

        if let Some(label) = &line.label {
            if program.address_for_label.contains_key(&label.name) {
                return Err(MalError::DuplicateLabel(label.name.clone()));
            }
            program.address_for_label.insert(label.name.clone(), label.address);
            program.count_for_label.insert(label.name.clone(), index);

            if let Some(pin) = label.address {
                cancel_on_pin(&mut mode, &mut program);
                mode = Mode::Contiguous { pin, cursor: pin };
            } else if matches!(mode, Mode::None) {
                mode = Mode::Annotating { start: index, size: 0 };
            }
        } else if matches!(mode, Mode::None) {
            mode = Mode::Annotating { start: index, size: 0 };
        }

        let terminal = is_terminal(&line.statement);
        apply_mode(&mut mode, &mut instruction, terminal, &mut program);
        program.instructions.push(instruction);
    }

    close_at_eof(&mut mode, &mut program);
    Ok(program)
}

fn is_terminal(statement: &Option<Statement>) -> bool {
    matches!(
        statement,
        Some(Statement::Halt)
            | Some(Statement::ControlOnly(_))
            | Some(Statement::Assign { control: Some(_), .. })
            | Some(Statement::MemoryOnly { control: Some(_), .. })
    )
}

/// Accounts for the current instruction under whichever mode is active, and
/// commits the mode (reclaim promise / block annotation) if this instruction
/// is the block's terminal control statement.
fn apply_mode(mode: &mut Mode, instruction: &mut Instruction, terminal: bool, program: &mut Program) {
    match mode {
        Mode::Contiguous { pin, cursor } => {
            let addr = *cursor;
            instruction.address = Some(addr);
            *cursor += 1;
            if !terminal {
                instruction.next_address = Some(addr + 1);
            }
            if terminal {
                program.reclaim_promises.push((*pin, addr));
                *mode = Mode::None;
            }
        }
        Mode::Annotating { start, size } => {
            *size += 1;
            if terminal {
                program.block_annotations.insert(*start, *size);
                *mode = Mode::None;
            }
        }
        Mode::None => unreachable!("every instruction is accounted for by some mode"),
    }
}

/// A pinned label always cancels an open annotation outright: the annotated
/// block becomes unreachable (not an error) unless a later goto targets it.
/// An open contiguous run, which structurally should already have been
/// closed by its own terminal instruction, is committed defensively so its
/// addresses are not left available for the allocator to reuse.
fn cancel_on_pin(mode: &mut Mode, program: &mut Program) {
    match std::mem::replace(mode, Mode::None) {
        Mode::None | Mode::Annotating { .. } => {}
        Mode::Contiguous { pin, cursor } => {
            program.reclaim_promises.push((pin, cursor - 1));
        }
    }
}

/// End-of-program commits whatever mode is still open.
fn close_at_eof(mode: &mut Mode, program: &mut Program) {
    match std::mem::replace(mode, Mode::None) {
        Mode::None => {}
        Mode::Contiguous { pin, cursor } => {
            program.reclaim_promises.push((pin, cursor - 1));
        }
        Mode::Annotating { start, size } => {
            if size > 0 {
                program.block_annotations.insert(start, size);
            }
        }
    }
}
