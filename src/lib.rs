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

pub mod allocator;
pub mod ast;
pub mod chunks;
pub mod emit;
pub mod encoder;
pub mod errors;
pub mod parser;
pub mod program;
pub mod translator;

use anyhow::{Context, Result};

use program::Program;

extern crate pest;
extern crate pest_derive;

/// Runs the full pipeline — parse, translate, allocate — and hands back the
/// frozen `Program` an emitter can walk.
pub fn assemble(source: &str) -> Result<Program> {
    let lines = parser::parse_source(source).context("Failed during parsing stage")?;

    let mut program = translator::translate(&lines).context("Failed during translation stage")?;

    allocator::allocate(&mut program).context("Failed during allocation stage")?;

    Ok(program)
}
