// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Line classification for Signal's text transcript format.
//!
//! A Signal text export is line-oriented: each message is a run of
//! metadata lines (`From:`, `Received:`, `Type:`), optional
//! `Attachment:` references, and the message body as plain prose with
//! blank lines between paragraphs.
//!
//! # Format Overview
//!
//! ```text
//! From: Jane Doe (+15551234567)
//! Received: 2024-03-01 18:12:43
//! Type: incoming
//!
//! Hi! Photos from today 🎉
//! Attachment: no filename (image/jpeg, 439593 bytes)
//! ```
//!
//! [`classify`] sorts each line into a [`Line`] category; attachment
//! lines additionally carry the parsed [`Reference`]. Classification
//! never fails: malformed attachment lines simply produce a reference
//! with fewer usable fields.
//!
//! # Example
//!
//! ```
//! use txt2tex::parser::{classify, Line};
//!
//! assert_eq!(classify("Type: incoming\n"), Line::Skipped);
//! assert_eq!(classify("Hello there.\n"), Line::Prose("Hello there."));
//!
//! match classify("Attachment: photo.png (image/png, 311164 bytes)\n") {
//!     Line::Attachment(reference) => {
//!         assert_eq!(reference.name.as_deref(), Some("photo.png"));
//!         assert_eq!(reference.mime, "image/png");
//!         assert_eq!(reference.size, Some(311_164));
//!     }
//!     other => panic!("expected an attachment line, got {other:?}"),
//! }
//! ```

/// Prefix marking an attachment reference. Unlike the metadata
/// prefixes, the marker is matched case-sensitively.
const ATTACHMENT_MARKER: &str = "Attachment:";

/// Name field value the export emits when the filename was lost.
const NO_FILENAME: &str = "no filename";

/// A parsed attachment reference from one transcript line.
///
/// Any field may be unusable on its own: exports regularly drop the
/// filename (`no filename`), and malformed lines leave the mime type
/// empty or the byte count absent. A reference with neither a usable
/// name nor a usable size can never match a file, which is a valid
/// outcome rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    /// Filename as printed in the transcript, when one was given.
    pub name: Option<String>,

    /// Declared MIME type, empty when the parenthetical is malformed.
    pub mime: String,

    /// Declared size in bytes, absent when unparseable.
    pub size: Option<u64>,
}

impl Reference {
    /// Returns `true` if the declared mime type is an image type.
    #[must_use]
    pub fn is_image_mime(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Classification of one transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Export metadata, dropped from the output entirely.
    Skipped,

    /// An empty line, rendered as a paragraph break.
    Blank,

    /// Ordinary message text, escaped and given a forced line break.
    Prose(&'a str),

    /// A reference to an exported attachment file.
    Attachment(Reference),
}

/// Classifies one transcript line.
///
/// The trailing newline and any other trailing whitespace are ignored.
/// `Type:` and `Received:` metadata is dropped; `From:` lines lose
/// their trailing parenthetical (typically a phone number) and fall
/// through to prose; `Attachment:` lines are parsed into a
/// [`Reference`]; everything else is prose, or a blank line.
#[must_use]
pub fn classify(line: &str) -> Line<'_> {
    let line = trim_line_end(line);

    if has_prefix_ignore_case(line, "Type:") || has_prefix_ignore_case(line, "Received:") {
        return Line::Skipped;
    }

    if has_prefix_ignore_case(line, "From:") {
        let redacted = match line.find('(') {
            Some(paren) => trim_line_end(&line[..paren]),
            None => line,
        };
        return Line::Prose(redacted);
    }

    if let Some(rest) = line.strip_prefix(ATTACHMENT_MARKER) {
        return Line::Attachment(parse_reference(rest));
    }

    if line.is_empty() {
        return Line::Blank;
    }

    Line::Prose(line)
}

/// Trims the trailing newline and any other trailing ASCII whitespace.
#[must_use]
pub fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(is_line_whitespace)
}

/// Parses the remainder of an `Attachment:` line.
///
/// Expected shapes:
///
/// ```text
/// Attachment: no filename (image/jpeg, 439593 bytes)
/// Attachment: myImage.png (image/png, 311164 bytes)
/// ```
///
/// Everything before the first `(` is the name field; the
/// parenthetical splits on the first comma into mime type and byte
/// count. Missing pieces degrade to absent fields rather than turning
/// the line back into prose.
fn parse_reference(rest: &str) -> Reference {
    let rest = rest.trim_start_matches(is_line_whitespace);

    let Some((name_field, parenthetical)) = rest.split_once('(') else {
        return Reference::default();
    };

    let name_field = name_field.trim_end_matches(is_line_whitespace);
    let name = if name_field.is_empty() || name_field == NO_FILENAME {
        None
    } else {
        Some(name_field.to_owned())
    };
    let mut reference = Reference {
        name,
        ..Reference::default()
    };

    let Some((inner, _)) = parenthetical.split_once(')') else {
        return reference;
    };

    let Some((mime, size_field)) = inner.trim_end_matches(is_line_whitespace).split_once(',')
    else {
        return reference;
    };
    reference.mime = mime.trim_matches(is_line_whitespace).to_owned();
    reference.size = parse_byte_count(size_field);

    reference
}

/// Extracts the leading decimal integer from text like ` 439593 bytes`.
fn parse_byte_count(field: &str) -> Option<u64> {
    let field = field.trim_start_matches(is_line_whitespace);
    let digits_end = field
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(field.len());
    field[..digits_end].parse().ok()
}

/// Matches the whitespace trimmed from transcript fields: ASCII
/// whitespace plus vertical tab, which `char::is_ascii_whitespace`
/// excludes.
const fn is_line_whitespace(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\u{0b}'
}

fn has_prefix_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
