// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert exported Signal chat transcripts to LaTeX.
//!
//! Signal's "export chat" feature produces a plain-text transcript plus
//! an `attachments/` directory of media files. This crate turns that
//! pair into a LaTeX document ready for lualatex.
//!
//! # Overview
//!
//! A conversion run has three stages:
//!
//! 1. The attachment directory is indexed into an
//!    [`attachments::Catalog`] recording each file's name and size.
//! 2. Each transcript line is classified with [`parser::classify`]:
//!    export metadata is dropped, sender lines lose their phone
//!    numbers, `Attachment:` references are parsed, and the rest is
//!    prose.
//! 3. [`renderer::render_document`] resolves references against the
//!    catalog and emits the document, with images included full-width,
//!    other attachments quoted by path, and unresolved references kept
//!    visible as placeholder blocks.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{BufReader, BufWriter};
//! use std::path::Path;
//! use txt2tex::attachments::{ATTACHMENTS_DIR, Catalog};
//! use txt2tex::renderer;
//!
//! let mut catalog = Catalog::load(Path::new(ATTACHMENTS_DIR)).unwrap();
//! let input = BufReader::new(File::open("messages.txt").unwrap());
//! let output = BufWriter::new(File::create("messages.tex").unwrap());
//!
//! renderer::render_document(input, &mut catalog, output).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`attachments`]: attachment discovery and reference matching
//! - [`parser`]: transcript line classification and reference parsing
//! - [`renderer`]: LaTeX escaping and document generation

#![deny(missing_docs)]

pub mod attachments;
pub mod parser;
pub mod renderer;
