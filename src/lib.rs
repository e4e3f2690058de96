//! # rpbo
//!
//! Read, write and randomly access PBO packed archives.
//!
//! A PBO is a single file holding a small text header, a table of entry
//! metadata, every member's bytes back to back and a trailing SHA-1 checksum.
//! This library parses the table, extracts single members or the whole tree,
//! and packs a directory (or an explicit list of entries) into a new archive.
//!
//! ## Features
//!
//! - Optional product header (prefix, name, version, extra strings)
//! - Streaming extraction straight from the file, or from a preloaded copy of
//!   the data region
//! - Whole-archive extraction with host path separators
//! - Archive creation from a directory tree or from explicit entries
//! - SHA-1 checksum computation and verification
//!
//! ## Example
//!
//! ```no_run
//! use rpbo::{Archive, LoadMode};
//!
//! fn main() -> anyhow::Result<()> {
//!     let archive = Archive::open("addon.pbo", LoadMode::Stream)?;
//!
//!     // List all files in the archive
//!     for entry in archive.entries() {
//!         println!("{} ({} bytes)", entry.file_name, entry.data_size);
//!     }
//!
//!     archive.extract_all(std::path::Path::new("addon"))?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod pbo;

pub use cli::Cli;
pub use io::{LocalFileReader, MemoryReader, PayloadSource, ReadAt};
pub use pbo::{
    Archive, FileEntry, LoadMode, PackingMethod, PboError, PboResult, PboWriter, ProductEntry,
    clone_archive, create,
};
