// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Attachment discovery and matching.
//!
//! Signal's text export names attachments inline (`Attachment: …`) but
//! writes the files themselves into an `attachments/` directory next to
//! the transcript, frequently under a different, platform-assigned
//! filename. This module builds a [`Catalog`] of the files actually on
//! disk and resolves each textual reference to at most one of them.
//!
//! # Matching
//!
//! A reference is resolved with the first rule that produces a hit:
//!
//! 1. Exact, case-sensitive filename equality.
//! 2. For `image/*` references, equal byte size plus a recognized image
//!    extension.
//! 3. Equal byte size, any file type.
//!
//! Byte size carries most of the weight because exported names rarely
//! survive on disk; the extension preference keeps an image reference
//! from binding to a same-sized non-image sidecar file. Every resolved
//! entry is consumed, so one file never serves two transcript lines.
//!
//! # Example
//!
//! ```
//! use txt2tex::attachments::{Catalog, CatalogEntry};
//! use txt2tex::parser::Reference;
//!
//! let mut catalog = Catalog::from_entries(vec![CatalogEntry {
//!     name: "IMG_0001.jpg".into(),
//!     path: "attachments/IMG_0001.jpg".into(),
//!     size: 439_593,
//!     consumed: false,
//! }]);
//!
//! let reference = Reference {
//!     name: None,
//!     mime: "image/jpeg".into(),
//!     size: Some(439_593),
//! };
//!
//! let entry = catalog.claim(&reference).expect("size should match");
//! assert_eq!(entry.name, "IMG_0001.jpg");
//! assert!(catalog.claim(&reference).is_none(), "entry is consumed");
//! ```

use crate::parser::Reference;
use snafu::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the attachment source directory, relative to the working
/// directory of both the conversion run and the later lualatex run.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Filename extensions treated as raster images.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"];

/// Error type for attachment catalog construction.
#[derive(Debug, Snafu)]
pub enum CatalogError {
    /// The attachment directory could not be opened for listing.
    #[snafu(display("could not open attachment directory {}: {source}", path.display()))]
    OpenDir {
        /// The directory that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// One file discovered in the attachment source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Base filename, as listed.
    pub name: String,

    /// Full path of the file.
    pub path: PathBuf,

    /// File size in bytes.
    pub size: u64,

    /// Whether the entry has already been bound to a transcript line.
    pub consumed: bool,
}

/// The set of attachment files available to one conversion run.
///
/// Built once at startup from a directory listing and afterwards only
/// mutated by [`Catalog::claim`], which flips entries to consumed as
/// transcript lines bind them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog from the regular files in `dir`.
    ///
    /// Subdirectories, symbolic links, and special files are ignored,
    /// as is any entry that disappears or turns unreadable between
    /// listing and stat. Entries are sorted by filename so size-based
    /// tie-breaking does not depend on the platform's directory
    /// enumeration order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::OpenDir`] when the directory itself
    /// cannot be read.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let listing = fs::read_dir(dir).context(OpenDirSnafu { path: dir })?;

        let mut entries = Vec::new();
        for dir_entry in listing {
            let Ok(dir_entry) = dir_entry else { continue };
            let Ok(metadata) = dir_entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            entries.push(CatalogEntry {
                name: dir_entry.file_name().to_string_lossy().into_owned(),
                path: dir_entry.path(),
                size: metadata.len(),
                consumed: false,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { entries })
    }

    /// Builds a catalog from pre-listed entries, preserving their order.
    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Returns the catalog entries in matching order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Resolves `reference` to an unconsumed entry and claims it.
    ///
    /// Tries an exact filename match first; failing that, a byte-size
    /// match, preferring files with an image extension when the
    /// reference declares an `image/*` mime type. The first unconsumed
    /// entry in catalog order wins. A claimed entry is marked consumed
    /// before it is returned and is skipped by every later call, so
    /// repeated identical references bind distinct files.
    ///
    /// Returns `None` when nothing matches, including for references
    /// that carry neither a usable name nor a usable size.
    pub fn claim(&mut self, reference: &Reference) -> Option<&CatalogEntry> {
        let index = self.find(reference)?;
        self.entries[index].consumed = true;
        Some(&self.entries[index])
    }

    fn find(&self, reference: &Reference) -> Option<usize> {
        if let Some(name) = reference.name.as_deref() {
            if let Some(index) = self.first_unconsumed(|entry| entry.name == name) {
                return Some(index);
            }
        }

        let size = reference.size?;
        if reference.is_image_mime() {
            let preferred = self
                .first_unconsumed(|entry| entry.size == size && has_image_extension(&entry.name));
            if let Some(index) = preferred {
                return Some(index);
            }
        }
        self.first_unconsumed(|entry| entry.size == size)
    }

    fn first_unconsumed(&self, matches: impl Fn(&CatalogEntry) -> bool) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| !entry.consumed && matches(entry))
    }
}

/// Returns `true` if `name` carries a recognized image extension.
///
/// The comparison is case-insensitive. A leading dot alone (as in
/// `.png` dotfiles) does not count as an extension.
#[must_use]
pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_entry(name: &str, size: u64) -> CatalogEntry {
        CatalogEntry {
            name: name.into(),
            path: Path::new(ATTACHMENTS_DIR).join(name),
            size,
            consumed: false,
        }
    }

    fn make_reference(name: Option<&str>, mime: &str, size: Option<u64>) -> Reference {
        Reference {
            name: name.map(str::to_owned),
            mime: mime.into(),
            size,
        }
    }

    #[test]
    fn recognizes_image_extensions_case_insensitively() {
        for name in [
            "a.png", "b.jpg", "c.jpeg", "d.gif", "e.bmp", "f.tif", "g.tiff", "H.PNG", "i.JpG",
        ] {
            assert!(has_image_extension(name), "{name} should count as an image");
        }
    }

    #[test]
    fn rejects_non_image_extensions() {
        for name in ["a.pdf", "b.txt", "c", "d.png.gpg", ".png", "e."] {
            assert!(
                !has_image_extension(name),
                "{name} should not count as an image"
            );
        }
    }

    #[test]
    fn name_match_wins_over_size_match() {
        let mut catalog = Catalog::from_entries(vec![
            make_entry("photo.jpg", 1024),
            make_entry("report.dat", 2048),
        ]);
        // Name points at the non-image entry, size at the image entry.
        let reference = make_reference(Some("report.dat"), "image/jpeg", Some(1024));

        let claimed = catalog.claim(&reference).unwrap();
        assert_eq!(claimed.name, "report.dat");
        assert!(!catalog.entries()[0].consumed);
    }

    #[test]
    fn missed_name_falls_back_to_size() {
        let mut catalog = Catalog::from_entries(vec![make_entry("renamed.png", 512)]);
        let reference = make_reference(Some("original.png"), "image/png", Some(512));

        assert_eq!(catalog.claim(&reference).unwrap().name, "renamed.png");
    }

    #[test]
    fn image_reference_prefers_image_extension_on_size_ties() {
        let mut catalog = Catalog::from_entries(vec![
            make_entry("sidecar.txt", 4096),
            make_entry("picture.jpg", 4096),
        ]);
        let reference = make_reference(None, "image/jpeg", Some(4096));

        assert_eq!(catalog.claim(&reference).unwrap().name, "picture.jpg");
    }

    #[test]
    fn image_reference_without_image_file_still_matches_by_size() {
        let mut catalog = Catalog::from_entries(vec![make_entry("scan.dat", 4096)]);
        let reference = make_reference(None, "image/jpeg", Some(4096));

        assert_eq!(catalog.claim(&reference).unwrap().name, "scan.dat");
    }

    #[test]
    fn non_image_reference_takes_first_size_match() {
        let mut catalog = Catalog::from_entries(vec![
            make_entry("notes.txt", 4096),
            make_entry("picture.jpg", 4096),
        ]);
        let reference = make_reference(None, "application/pdf", Some(4096));

        assert_eq!(catalog.claim(&reference).unwrap().name, "notes.txt");
    }

    #[test]
    fn consumed_entries_are_skipped() {
        let mut catalog = Catalog::from_entries(vec![
            make_entry("first.bin", 100),
            make_entry("second.bin", 100),
        ]);
        let reference = make_reference(None, "application/octet-stream", Some(100));

        assert_eq!(catalog.claim(&reference).unwrap().name, "first.bin");
        assert_eq!(catalog.claim(&reference).unwrap().name, "second.bin");
        assert!(catalog.claim(&reference).is_none());
    }

    #[test]
    fn unusable_reference_matches_nothing() {
        let mut catalog = Catalog::from_entries(vec![make_entry("only.bin", 100)]);

        assert!(catalog.claim(&make_reference(None, "", None)).is_none());
        assert!(!catalog.entries()[0].consumed);
    }

    #[test]
    fn matching_is_deterministic() {
        let entries = vec![
            make_entry("a.bin", 7),
            make_entry("b.bin", 7),
            make_entry("c.jpg", 7),
        ];
        let references = [
            make_reference(None, "image/png", Some(7)),
            make_reference(None, "text/plain", Some(7)),
            make_reference(Some("b.bin"), "", None),
        ];

        let run = |mut catalog: Catalog| -> Vec<Option<String>> {
            references
                .iter()
                .map(|reference| catalog.claim(reference).map(|entry| entry.name.clone()))
                .collect()
        };

        let first = run(Catalog::from_entries(entries.clone()));
        let second = run(Catalog::from_entries(entries));
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                Some("c.jpg".into()),
                Some("a.bin".into()),
                Some("b.bin".into())
            ]
        );
    }

    #[test]
    fn load_indexes_regular_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zebra.txt"), b"12345").unwrap();
        fs::write(dir.path().join("alpha.png"), b"123").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();
        let names: Vec<&str> = catalog
            .entries()
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();

        assert_eq!(names, ["alpha.png", "zebra.txt"]);
        assert_eq!(catalog.entries()[0].size, 3);
        assert_eq!(catalog.entries()[1].size, 5);
        assert!(catalog.entries().iter().all(|entry| !entry.consumed));
    }

    #[test]
    fn load_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere");

        let error = Catalog::load(&missing).unwrap_err();
        assert!(
            error
                .to_string()
                .contains("could not open attachment directory")
        );
    }
}
