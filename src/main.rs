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

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, ValueEnum};
use malasm::emit::{binary, text};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Binary,
    Text,
}

#[derive(ClapParser)]
#[clap(version = "0.1.0", author = "Connor Nolan")]
struct Opts {
    input: PathBuf,
    #[clap(short, long, value_enum, default_value = "binary")]
    format: Format,
    #[clap(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let result = Opts::try_parse()
        .map_err(anyhow::Error::from)
        .and_then(run);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("prog: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: Opts) -> anyhow::Result<()> {
    let source = fs::read_to_string(&opts.input)?;
    let program = malasm::assemble(&source)?;

    let output = opts.output.unwrap_or_else(|| match opts.format {
        Format::Binary => PathBuf::from("a.out"),
        Format::Text => PathBuf::from("a.txt"),
    });

    match opts.format {
        Format::Binary => fs::write(&output, binary::emit(&program))?,
        Format::Text => fs::write(&output, text::emit(&program))?,
    }

    println!("Successfully assembled {} to {}", opts.input.display(), output.display());
    Ok(())
}
