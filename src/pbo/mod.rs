//! PBO archive parsing, extraction and creation.
//!
//! ## Architecture
//!
//! - [`structures`]: entry model and format constants
//! - [`primitives`]: integer, string and entry-record codecs
//! - [`parser`]: decodes the archive layout from any `Read + Seek`
//! - [`Archive`]: an opened archive plus its payload source
//! - extraction methods on [`Archive`], written once against [`ReadAt`](crate::io::ReadAt)
//! - [`writer`]: builds archives from a directory or explicit entries
//!
//! ## Format Overview
//!
//! A PBO file consists of:
//! 1. A `0x00` signature byte and an optional product header
//! 2. The entry table, ended by an all-zero record
//! 3. Every payload back to back, in table order
//! 4. A `0x00` marker and the SHA-1 of everything before it
//!
//! Entries carry no offsets. A payload's position is the data start plus the
//! sizes of all entries before it, so table order is significant.
//!
//! ## Limitations
//!
//! - Compressed (`Cprs`) payloads are listed but cannot be extracted
//! - No in-place editing; rebuild with [`clone_archive`]

mod archive;
mod error;
mod extractor;
pub mod parser;
mod path;
pub mod primitives;
pub mod structures;
pub mod writer;

pub use archive::{Archive, LoadMode};
pub use error::{PboError, PboResult};
pub use parser::{ArchiveLayout, PboParser};
pub use path::{ENTRY_SEPARATOR, entry_name, host_path};
pub use structures::*;
pub use writer::{PboWriter, clone_archive, create};
