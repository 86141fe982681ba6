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

mod ast_builder;

use crate::ast::ParsedLine;
use crate::errors::MalError;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub struct MalParser;

/// Parses a whole MAL source file into one `ParsedLine` per non-blank line.
pub fn parse_source(source: &str) -> Result<Vec<ParsedLine>, MalError> {
    let mut program_pairs = MalParser::parse(Rule::program, source)?;
    let program = program_pairs.next().expect("program rule always matches");

    let mut lines = Vec::new();
    for line_pair in program.into_inner() {
        if line_pair.as_rule() != Rule::line {
            continue; // EOI
        }
        let line_number = line_pair.as_span().start_pos().line_col().0;
        if let Some(parsed) = ast_builder::build_line(line_pair, line_number)? {
            lines.push(parsed);
        }
    }

    Ok(lines)
}
