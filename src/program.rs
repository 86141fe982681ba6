// Aggregate data model threaded through translator -> allocator -> emitters.
// Built incrementally by the translator, mutated in place by the allocator,
// frozen (read-only) once handed to an emitter.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::encoder::Instruction;
use crate::errors::MalError;

#[derive(Debug, Default)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub address_for_label: HashMap<String, Option<u16>>,
    pub count_for_label: HashMap<String, usize>,
    /// Bidirectional: if `(a, b)` is present then so is `(b, a)`.
    pub if_else_pairs: HashMap<String, String>,
    /// Names on the "else" side of a registered pair.
    pub else_set: HashSet<String>,
    pub reclaim_promises: Vec<(u16, u16)>,
    /// Block-start instruction index -> block size in words, source order.
    pub block_annotations: BTreeMap<usize, u32>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Registers `(if_label, else_label)` bidirectionally. Idempotent when
    /// the identical pair is re-added; an error when either name is already
    /// bound to a different partner.
    pub fn add_if_else_target(&mut self, if_label: &str, else_label: &str) -> Result<(), MalError> {
        if let Some(existing) = self.if_else_pairs.get(if_label) {
            if existing == else_label {
                return Ok(());
            }
            return Err(MalError::InvalidIfElse {
                label: if_label.to_string(),
                existing: existing.clone(),
            });
        }
        if let Some(existing) = self.if_else_pairs.get(else_label) {
            if existing == if_label {
                return Ok(());
            }
            return Err(MalError::InvalidIfElse {
                label: else_label.to_string(),
                existing: existing.clone(),
            });
        }

        self.if_else_pairs.insert(if_label.to_string(), else_label.to_string());
        self.if_else_pairs.insert(else_label.to_string(), if_label.to_string());
        self.else_set.insert(else_label.to_string());
        Ok(())
    }

    pub fn is_else(&self, label: &str) -> bool {
        self.else_set.contains(label)
    }
}
