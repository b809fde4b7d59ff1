// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for txt2tex.
//!
//! This binary provides the `txt2tex` command for converting exported
//! Signal chat transcripts to LaTeX documents.

use lexopt::prelude::*;
use snafu::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use txt2tex::attachments::{self, Catalog};
use txt2tex::renderer;

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("missing required input file (see --help)"))]
    MissingInput,

    #[snafu(display("failed to index attachments: {source}"))]
    IndexAttachments { source: attachments::CatalogError },

    #[snafu(display("could not open {}: {source}", path.display()))]
    OpenInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("could not open {} for writing: {source}", path.display()))]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to convert {}: {source}", path.display()))]
    Convert {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert exported Signal chat transcripts to LaTeX

Usage: {name} <INPUT>

Arguments:
  <INPUT>  Exported chat transcript (plain text)

The document is written next to the input file with its extension
replaced by .tex. Attachment references are resolved against the
./attachments directory under the current working directory; compile
the result with lualatex from that same directory.

Options:
  -h, --help     Print help
  -V, --version  Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<PathBuf, Error> {
    let mut input = None;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next().context(ParseArgsSnafu)? {
        match arg {
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(path) if input.is_none() => input = Some(PathBuf::from(path)),
            _ => return Err(arg.unexpected()).context(ParseArgsSnafu),
        }
    }

    input.ok_or(Error::MissingInput)
}

fn run() -> Result<(), Error> {
    let input = parse_args()?;
    let output = input.with_extension("tex");

    // Indexed before the output file is created.
    let mut catalog =
        Catalog::load(Path::new(attachments::ATTACHMENTS_DIR)).context(IndexAttachmentsSnafu)?;

    let reader = BufReader::new(File::open(&input).context(OpenInputSnafu { path: &input })?);
    let writer =
        BufWriter::new(File::create(&output).context(CreateOutputSnafu { path: &output })?);

    renderer::render_document(reader, &mut catalog, writer)
        .context(ConvertSnafu { path: &input })?;

    eprintln!("Wrote {}", output.display());
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
