// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! LaTeX rendering for classified transcript lines.
//!
//! This module turns a transcript stream into a complete LaTeX
//! document: a fixed preamble, one fragment per input line, and a
//! closing marker. Prose is escaped and given a forced line break;
//! resolved attachments become `\includegraphics` blocks or quoted
//! attachment notes; unresolved references stay visible as placeholder
//! blocks so they can be fixed up by hand.
//!
//! The output targets lualatex: the preamble loads `fontspec` and
//! declares an `\emoji` text-font command through which every
//! non-ASCII character is routed, so the main body font needs no
//! symbol or emoji coverage.
//!
//! # Example
//!
//! ```
//! use txt2tex::attachments::Catalog;
//! use txt2tex::renderer::render_document;
//!
//! let transcript = "From: Jane Doe (+15551234567)\nSee you at 8!\n";
//! let mut catalog = Catalog::default();
//! let mut output = Vec::new();
//!
//! render_document(transcript.as_bytes(), &mut catalog, &mut output).unwrap();
//!
//! let document = String::from_utf8(output).unwrap();
//! assert!(document.contains("From: Jane Doe\\\\"));
//! assert!(document.contains("See you at 8!\\\\"));
//! ```

use crate::attachments::{ATTACHMENTS_DIR, Catalog, has_image_extension};
use crate::parser::{self, Line};
use std::io::{self, BufRead, Write};

/// Document preamble emitted before any transcript content.
///
/// Targets lualatex: `fontspec` provides the Unicode main font and the
/// `\emoji` command renders non-ASCII characters through a dedicated
/// emoji font.
pub const PREAMBLE: &str = r"\documentclass[a4paper,11pt]{article}
\usepackage[margin=25mm]{geometry}
\usepackage{graphicx}
\usepackage{fontspec}
\setmainfont{Latin Modern Roman}
\newfontfamily\emojifont{Segoe UI Emoji}
\DeclareTextFontCommand{\emoji}{\emojifont}
\setlength{\emergencystretch}{3em}
\begin{document}

";

/// Closing marker emitted after the last transcript line.
pub const CLOSING: &str = "\n\\end{document}\n";

/// Converts a transcript stream into a complete LaTeX document.
///
/// Reads `input` line by line, resolves attachment references against
/// `catalog`, and writes the preamble, one fragment per line, and the
/// closing marker to `out`. Input is read as raw bytes and decoded
/// with replacement, so malformed UTF-8 shows up as U+FFFD in the
/// document instead of aborting the conversion.
///
/// # Errors
///
/// Returns the first I/O error raised while reading `input` or writing
/// `out`.
pub fn render_document<R: BufRead, W: Write>(
    mut input: R,
    catalog: &mut Catalog,
    mut out: W,
) -> io::Result<()> {
    out.write_all(PREAMBLE.as_bytes())?;

    let mut raw = Vec::new();
    loop {
        raw.clear();
        if input.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&raw);
        render_line(&text, catalog, &mut out)?;
    }

    out.write_all(CLOSING.as_bytes())?;
    out.flush()
}

/// Renders one transcript line as its output fragment, if any.
fn render_line<W: Write>(line: &str, catalog: &mut Catalog, out: &mut W) -> io::Result<()> {
    match parser::classify(line) {
        Line::Skipped => Ok(()),
        Line::Blank => out.write_all(b"\n\n"),
        Line::Prose(text) => writeln!(out, "{}\\\\", escape_latex(text)),
        Line::Attachment(reference) => match catalog.claim(&reference) {
            Some(entry) => {
                let rel_path = format!("{ATTACHMENTS_DIR}/{}", entry.name);
                if reference.is_image_mime() || has_image_extension(&entry.name) {
                    write_image_fragment(out, &rel_path)
                } else {
                    write_attachment_fragment(out, &rel_path)
                }
            }
            None => write_unmatched_fragment(out, parser::trim_line_end(line)),
        },
    }
}

/// Writes the block-level image inclusion for a resolved image file.
///
/// The graphic is constrained to the page body and keeps its aspect
/// ratio; `\detokenize` shields the filename from LaTeX's special
/// characters.
fn write_image_fragment<W: Write>(out: &mut W, rel_path: &str) -> io::Result<()> {
    write!(
        out,
        "\n\\par\\noindent\n\\includegraphics[width=\\linewidth,height=0.9\\textheight,keepaspectratio]{{\\detokenize{{{rel_path}}}}}\n\\par\\medskip\n\n"
    )
}

/// Writes the quoted note for a resolved non-image attachment.
fn write_attachment_fragment<W: Write>(out: &mut W, rel_path: &str) -> io::Result<()> {
    write!(
        out,
        "\n\\begin{{quote}}\n\\textbf{{Attachment:}} \\detokenize{{{rel_path}}}\n\\end{{quote}}\n\n"
    )
}

/// Writes the placeholder block for a reference no file matched,
/// quoting the escaped source line so it can be located afterwards.
fn write_unmatched_fragment<W: Write>(out: &mut W, line: &str) -> io::Result<()> {
    write!(
        out,
        "\n\\begin{{quote}}\n\\textbf{{Unmatched attachment placeholder:}} {}\\end{{quote}}\n\n",
        escape_latex(line)
    )
}

/// Escapes one line of prose for LaTeX.
///
/// Characters from LaTeX's reserved set are replaced with their safe
/// commands, other ASCII passes through unchanged, and every non-ASCII
/// character is wrapped in `\emoji{…}` so it renders through the
/// dedicated emoji font.
///
/// # Example
///
/// ```
/// use txt2tex::renderer::escape_latex;
///
/// assert_eq!(escape_latex("100% tax & 5$ fee"), "100\\% tax \\& 5\\$ fee");
/// assert_eq!(escape_latex("café"), "caf\\emoji{é}");
/// ```
#[must_use]
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            '#' => escaped.push_str("\\#"),
            '$' => escaped.push_str("\\$"),
            '%' => escaped.push_str("\\%"),
            '&' => escaped.push_str("\\&"),
            '_' => escaped.push_str("\\_"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            '~' => escaped.push_str("\\textasciitilde{}"),
            c if c.is_ascii() => escaped.push(c),
            c => {
                escaped.push_str("\\emoji{");
                escaped.push(c);
                escaped.push('}');
            }
        }
    }
    escaped
}
