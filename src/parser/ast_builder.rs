/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use crate::ast::*;
use crate::errors::MalError;
use crate::parser::Rule;
use pest::iterators::{Pair, Pairs};

pub fn build_line(pair: Pair<Rule>, line_number: usize) -> Result<Option<ParsedLine>, MalError> {
    let mut label = None;
    let mut statement = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::label => label = Some(build_label(inner)),
            Rule::statement => statement = Some(build_statement(inner)),
            other => unreachable!("unexpected line child: {other:?}"),
        }
    }

    if label.is_none() && statement.is_none() {
        return Ok(None);
    }

    Ok(Some(ParsedLine {
        line_number,
        label,
        statement,
    }))
}

fn build_label(pair: Pair<Rule>) -> Label {
    let mut inner = pair.into_inner();
    let name = inner.next().expect("label always names itself").as_str().to_string();
    let address = inner.next().map(|addr| parse_address(addr.as_str()));
    Label { name, address }
}

fn parse_address(text: &str) -> u16 {
    u16::from_str_radix(&text[2..], 16).expect("grammar guarantees hex digits after 0x")
}

// `statement`'s alternatives are unwrapped sequences, not each under their
// own named rule, so its children arrive flattened: the first tells us which
// alternative matched, the rest (memory/control) are optional tails.
fn build_statement(pair: Pair<Rule>) -> Statement {
    let mut inner = pair.into_inner();
    let first = inner.next().expect("statement always matches something");

    match first.as_rule() {
        Rule::empty_stmt => Statement::Empty,
        Rule::halt_stmt => Statement::Halt,
        Rule::assignment => {
            let assignment = build_assignment(first);
            let (memory, control) = build_memory_and_control(inner);
            Statement::Assign {
                assignment,
                memory,
                control,
            }
        }
        Rule::memory => {
            let memory = build_memory(first);
            let control = inner.next().map(build_control);
            Statement::MemoryOnly { memory, control }
        }
        Rule::control => Statement::ControlOnly(build_control(first)),
        other => unreachable!("unexpected statement alternative: {other:?}"),
    }
}

fn build_memory_and_control(mut inner: Pairs<Rule>) -> (Option<MemoryOp>, Option<Control>) {
    let mut memory = None;
    let mut control = None;
    for pair in inner.by_ref() {
        match pair.as_rule() {
            Rule::memory => memory = Some(build_memory(pair)),
            Rule::control => control = Some(build_control(pair)),
            other => unreachable!("unexpected assignment tail: {other:?}"),
        }
    }
    (memory, control)
}

fn build_assignment(pair: Pair<Rule>) -> Assignment {
    let mut inner = pair.into_inner();
    let destination = build_destination(inner.next().expect("assignment has a destination"));
    let expr_pair = inner.next().expect("assignment has an expression");

    let mut expr_inner = expr_pair.into_inner();
    let first = expr_inner.next().expect("expression always matches something");

    match first.as_rule() {
        Rule::assignment => {
            let mut nested = build_assignment(first);
            nested.destinations.insert(0, destination);
            nested
        }
        Rule::operation => {
            let (operation, b_register) = build_operation(first);
            let shift = expr_inner.next().map(build_shift).unwrap_or(Shift::None);
            Assignment {
                destinations: vec![destination],
                expression: Expression {
                    operation,
                    b_register,
                    shift,
                },
            }
        }
        other => unreachable!("unexpected expression child: {other:?}"),
    }
}

fn build_destination(pair: Pair<Rule>) -> Destination {
    match pair.clone().into_inner().next() {
        Some(c_register_pair) if c_register_pair.as_rule() == Rule::c_register => {
            Destination::Reg(build_c_register(c_register_pair))
        }
        _ => match pair.as_str() {
            "N" => Destination::N,
            "Z" => Destination::Z,
            other => unreachable!("unexpected destination token: {other}"),
        },
    }
}

fn build_c_register(pair: Pair<Rule>) -> CRegister {
    match normalize(pair.as_str()).as_str() {
        "MAR" => CRegister::Mar,
        "MDR" => CRegister::Mdr,
        "PC" => CRegister::Pc,
        "SP" => CRegister::Sp,
        "LV" => CRegister::Lv,
        "CPP" => CRegister::Cpp,
        "TOS" => CRegister::Tos,
        "OPC" => CRegister::Opc,
        "H" => CRegister::H,
        other => unreachable!("unexpected C register: {other}"),
    }
}

fn build_b_register(pair: Pair<Rule>) -> BRegister {
    match normalize(pair.as_str()).as_str() {
        "PC" => BRegister::Pc,
        // "MDR" is accepted as a B-bus source mnemonic alongside "MBR" and
        // encodes to the same selector value (see DESIGN.md).
        "MBR" | "MDR" => BRegister::Mbr,
        "MBRU" => BRegister::MbrU,
        "SP" => BRegister::Sp,
        "LV" => BRegister::Lv,
        "CPP" => BRegister::Cpp,
        "TOS" => BRegister::Tos,
        "OPC" => BRegister::Opc,
        other => unreachable!("unexpected B register: {other}"),
    }
}

fn build_shift(pair: Pair<Rule>) -> Shift {
    match normalize(pair.as_str()).as_str() {
        "<< 8" | "<<8" => Shift::Lsl8,
        ">> 1" | ">>1" => Shift::Sra1,
        other => unreachable!("unexpected shift token: {other}"),
    }
}

// `operation` wraps exactly one tagged row of the §4.1 bit-pattern table;
// pull the concrete B register (if any) out of that row's own children.
fn build_operation(pair: Pair<Rule>) -> (Operation, Option<BRegister>) {
    let row = pair.into_inner().next().expect("operation always matches a row");
    let rule = row.as_rule();
    let b_register = row
        .into_inner()
        .find(|p| p.as_rule() == Rule::b_register)
        .map(build_b_register);

    let operation = match rule {
        Rule::op_a_and_b | Rule::op_b_and_a => Operation::AAndB,
        Rule::op_a_or_b | Rule::op_b_or_a => Operation::AOrB,
        Rule::op_not_a => Operation::NotA,
        Rule::op_not_b => Operation::NotB,
        Rule::op_a_plus_b_plus_one => Operation::APlusBPlusOne,
        Rule::op_a_plus_b | Rule::op_b_plus_a => Operation::APlusB,
        Rule::op_a_plus_one => Operation::APlusOne,
        Rule::op_b_plus_one => Operation::BPlusOne,
        Rule::op_b_minus_a => Operation::BMinusA,
        Rule::op_b_minus_one => Operation::BMinusOne,
        Rule::op_neg_a => Operation::NegA,
        Rule::op_neg_one => Operation::NegOne,
        Rule::op_a => Operation::A,
        Rule::op_b => Operation::B,
        Rule::op_zero => Operation::Zero,
        Rule::op_one => Operation::One,
        other => unreachable!("unexpected operation row: {other:?}"),
    };

    (operation, b_register)
}

fn build_memory(pair: Pair<Rule>) -> MemoryOp {
    let mut memory = MemoryOp::default();
    for token in pair.into_inner() {
        match token.as_rule() {
            Rule::memory_token => {
                let inner = token.into_inner().next().expect("memory_token wraps one flag");
                match inner.as_rule() {
                    Rule::rd_flag => memory.read = true,
                    Rule::wr_flag => memory.write = true,
                    Rule::fetch_flag => memory.fetch = true,
                    other => unreachable!("unexpected memory flag: {other:?}"),
                }
            }
            other => unreachable!("unexpected memory child: {other:?}"),
        }
    }
    memory
}

fn build_control(pair: Pair<Rule>) -> Control {
    let row = pair.into_inner().next().expect("control always matches a row");

    match row.as_rule() {
        Rule::ctrl_goto_mbr => {
            let addr = row.into_inner().next().map(|p| parse_address(p.as_str()));
            Control::GotoMbr(addr)
        }
        Rule::ctrl_goto => {
            let label = row.into_inner().next().expect("goto has a target name").as_str().to_string();
            Control::Goto(label)
        }
        Rule::ctrl_if_else => {
            let mut inner = row.into_inner();
            let condition = match inner.next().expect("if has a condition").as_str() {
                "N" => Condition::N,
                "Z" => Condition::Z,
                other => unreachable!("unexpected condition: {other}"),
            };
            let if_label = inner.next().expect("if has a goto target").as_str().to_string();
            let else_label = inner.next().expect("if has an else target").as_str().to_string();
            Control::IfElse {
                condition,
                if_label,
                else_label,
            }
        }
        other => unreachable!("unexpected control row: {other:?}"),
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
