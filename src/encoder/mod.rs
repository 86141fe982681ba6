// Maps a single parsed source line to a 27-bit control field plus the
// metadata the translator needs: host label, symbolic branch target, halt
// flag, and (when the statement names one directly) an explicit next
// address. Encoding never looks at neighboring lines or addresses; it is a
// pure function of one `ParsedLine` (property 6).

pub mod constants;

use crate::ast::*;
use constants::*;

/// One micro-word, before address assignment. `address`/`next_address` start
/// `None` and are filled in by the translator and allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub address: Option<u16>,
    pub next_address: Option<u16>,
    pub control: u32,
    pub is_halt: bool,
    pub label: Option<String>,
    pub target_label: Option<String>,
}

impl Instruction {
    fn with_control(control: u32) -> Self {
        Instruction {
            address: None,
            next_address: None,
            control,
            is_halt: false,
            label: None,
            target_label: None,
        }
    }
}

/// An if/else statement also registers a branch-displacement pair; the
/// translator owns enforcing the bidirectional uniqueness invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfElsePair {
    pub if_label: String,
    pub else_label: String,
}

pub struct Encoded {
    pub instruction: Instruction,
    pub if_else: Option<IfElsePair>,
}

pub fn encode(line: &ParsedLine) -> Encoded {
    let mut instruction = Instruction::with_control(DEFAULT_CONTROL);
    instruction.label = line.label.as_ref().map(|l| l.name.clone());

    let if_else = match &line.statement {
        None | Some(Statement::Empty) => None,
        Some(Statement::Halt) => {
            instruction.is_halt = true;
            None
        }
        Some(Statement::Assign {
            assignment,
            memory,
            control,
        }) => {
            apply_assignment(&mut instruction.control, assignment);
            if let Some(memory) = memory {
                apply_memory(&mut instruction.control, memory);
            }
            control.as_ref().and_then(|c| apply_control(&mut instruction, c))
        }
        Some(Statement::MemoryOnly { memory, control }) => {
            apply_memory(&mut instruction.control, memory);
            control.as_ref().and_then(|c| apply_control(&mut instruction, c))
        }
        Some(Statement::ControlOnly(control)) => apply_control(&mut instruction, control),
    };

    Encoded { instruction, if_else }
}

fn apply_assignment(control: &mut u32, assignment: &Assignment) {
    for destination in &assignment.destinations {
        apply_destination(control, destination);
    }
    apply_expression(control, &assignment.expression);
}

fn apply_destination(control: &mut u32, destination: &Destination) {
    let bit = match destination {
        Destination::Reg(CRegister::Mar) => C_MAR,
        Destination::Reg(CRegister::Mdr) => C_MDR,
        Destination::Reg(CRegister::Pc) => C_PC,
        Destination::Reg(CRegister::Sp) => C_SP,
        Destination::Reg(CRegister::Lv) => C_LV,
        Destination::Reg(CRegister::Cpp) => C_CPP,
        Destination::Reg(CRegister::Tos) => C_TOS,
        Destination::Reg(CRegister::Opc) => C_OPC,
        Destination::Reg(CRegister::H) => C_H,
        // N/Z latch the ALU's own N/Z outputs every cycle; no C-bus write
        // enable corresponds to them.
        Destination::N | Destination::Z => return,
    };
    *control |= 1 << bit;
}

fn apply_expression(control: &mut u32, expression: &Expression) {
    let bits: &[u32] = match expression.operation {
        Operation::AAndB => &[EN_A, EN_B],
        Operation::AOrB => &[F_1, EN_A, EN_B],
        Operation::NotA => &[F_1, EN_A, INV_A],
        Operation::NotB => &[F_0, EN_A, EN_B],
        Operation::APlusB => &[F_0, F_1, EN_A, EN_B],
        Operation::APlusOne => &[F_0, F_1, EN_A, INC],
        Operation::BPlusOne => &[F_0, F_1, EN_B, INC],
        Operation::BMinusA => &[F_0, F_1, EN_A, EN_B, INV_A, INC],
        Operation::NegA => &[F_0, F_1, EN_A, INV_A, INC],
        Operation::BMinusOne => &[F_0, F_1, EN_B, INV_A],
        Operation::APlusBPlusOne => &[F_0, F_1, EN_A, EN_B, INC],
        Operation::A => &[F_1, EN_A],
        Operation::B => &[F_1, EN_B],
        Operation::NegOne => &[F_0, F_1, INV_A],
        Operation::Zero => &[F_1],
        Operation::One => &[F_0, F_1, INC],
    };
    for bit in bits {
        *control |= 1 << bit;
    }

    match expression.shift {
        Shift::None => {}
        Shift::Lsl8 => *control |= 1 << SLL_8,
        Shift::Sra1 => *control |= 1 << SRA_1,
    }

    if let Some(b_register) = expression.b_register {
        apply_b_register(control, b_register);
    }
}

fn apply_b_register(control: &mut u32, b_register: BRegister) {
    let value: u32 = match b_register {
        BRegister::Mar => 0b0000,
        BRegister::Pc => 0b0001,
        BRegister::Mbr => 0b0010,
        BRegister::MbrU => 0b0011,
        BRegister::Sp => 0b0100,
        BRegister::Lv => 0b0101,
        BRegister::Cpp => 0b0110,
        BRegister::Tos => 0b0111,
        BRegister::Opc => 0b1000,
    };
    *control = (*control & !B_SOURCE_MASK) | value;
}

fn apply_memory(control: &mut u32, memory: &MemoryOp) {
    if memory.read {
        *control |= 1 << READ;
    }
    if memory.write {
        *control |= 1 << WRITE;
    }
    if memory.fetch {
        *control |= 1 << FETCH;
    }
}

fn apply_control(instruction: &mut Instruction, control: &Control) -> Option<IfElsePair> {
    match control {
        Control::Goto(label) => {
            instruction.target_label = Some(label.clone());
            None
        }
        Control::GotoMbr(addr) => {
            instruction.control |= 1 << JMPC;
            instruction.next_address = Some(addr.unwrap_or(0));
            None
        }
        Control::IfElse {
            condition,
            if_label,
            else_label,
        } => {
            match condition {
                Condition::N => instruction.control |= 1 << JAMN,
                Condition::Z => instruction.control |= 1 << JAMZ,
            }
            instruction.target_label = Some(else_label.clone());
            Some(IfElsePair {
                if_label: if_label.clone(),
                else_label: else_label.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(label: Option<Label>, statement: Option<Statement>) -> ParsedLine {
        ParsedLine {
            line_number: 1,
            label,
            statement,
        }
    }

    #[test]
    fn encodes_pinned_straight_line() {
        // main = 0x000: MDR = MDR + 1; wr
        let parsed = line(
            Some(Label {
                name: "main".into(),
                address: Some(0x000),
            }),
            Some(Statement::Assign {
                assignment: Assignment {
                    destinations: vec![Destination::Reg(CRegister::Mdr)],
                    expression: Expression {
                        operation: Operation::BPlusOne,
                        b_register: Some(BRegister::Mbr),
                        shift: Shift::None,
                    },
                },
                memory: Some(MemoryOp {
                    read: false,
                    write: true,
                    fetch: false,
                }),
                control: None,
            }),
        );

        let encoded = encode(&parsed);
        let control = encoded.instruction.control;

        assert_eq!(control & B_SOURCE_MASK, 0b0010);
        assert_ne!(control & (1 << WRITE), 0);
        assert_eq!(control & (1 << READ), 0);
        assert_ne!(control & (1 << C_MDR), 0);
        assert_ne!(control & (1 << F_0), 0);
        assert_ne!(control & (1 << F_1), 0);
        assert_ne!(control & (1 << EN_B), 0);
        assert_ne!(control & (1 << INC), 0);
        assert!(!encoded.instruction.is_halt);
        assert!(encoded.if_else.is_none());
    }

    #[test]
    fn encodes_halt_like_empty_plus_flag() {
        let empty = encode(&line(None, Some(Statement::Empty)));
        let halt = encode(&line(None, Some(Statement::Halt)));
        assert_eq!(empty.instruction.control, DEFAULT_CONTROL);
        assert_eq!(halt.instruction.control, DEFAULT_CONTROL);
        assert!(!empty.instruction.is_halt);
        assert!(halt.instruction.is_halt);
    }

    #[test]
    fn encodes_if_else_and_registers_pair() {
        let parsed = line(
            None,
            Some(Statement::Assign {
                assignment: Assignment {
                    destinations: vec![Destination::Z],
                    expression: Expression {
                        operation: Operation::B,
                        b_register: Some(BRegister::Tos),
                        shift: Shift::None,
                    },
                },
                memory: None,
                control: Some(Control::IfElse {
                    condition: Condition::Z,
                    if_label: "isz".into(),
                    else_label: "nnz".into(),
                }),
            }),
        );

        let encoded = encode(&parsed);
        assert_ne!(encoded.instruction.control & (1 << JAMZ), 0);
        assert_eq!(encoded.instruction.target_label.as_deref(), Some("nnz"));
        let pair = encoded.if_else.unwrap();
        assert_eq!(pair.if_label, "isz");
        assert_eq!(pair.else_label, "nnz");
    }

    #[test]
    fn goto_mbr_sets_jmpc_and_explicit_next_address() {
        let encoded = encode(&line(None, Some(Statement::ControlOnly(Control::GotoMbr(Some(0x0A))))));
        assert_ne!(encoded.instruction.control & (1 << JMPC), 0);
        assert_eq!(encoded.instruction.next_address, Some(0x0A));
    }
}
