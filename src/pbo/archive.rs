use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::io::{LocalFileReader, MemoryReader, PayloadSource, ReadAt};

use super::error::{PboError, PboResult};
use super::parser::{ArchiveLayout, PboParser};
use super::primitives::hex;
use super::structures::*;

/// How payloads are served after an archive is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Read each payload from the file on disk when it is requested
    #[default]
    Stream,
    /// Copy the whole data region into memory up front
    Preload,
}

/// An opened PBO archive.
///
/// Holds the parsed layout and the payload source. Nothing here changes after
/// [`Archive::open`] returns, so extraction only needs `&self`.
pub struct Archive {
    path: PathBuf,
    layout: ArchiveLayout,
    /// Absolute payload offset of each entry, in table order
    offsets: Vec<u64>,
    source: PayloadSource,
}

impl Archive {
    /// Open and parse the archive at `path`.
    ///
    /// With [`LoadMode::Preload`] the data region is read into memory before
    /// returning and the file is closed.
    pub fn open(path: impl AsRef<Path>, mode: LoadMode) -> PboResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PboError::ArchiveNotFound(path.to_path_buf()),
            _ => PboError::Io(e),
        })?;
        let file_len = file.metadata()?.len();

        let mut parser = PboParser::new(BufReader::new(file));
        let layout = parser.parse()?;

        let source = match mode {
            LoadMode::Stream => PayloadSource::File(LocalFileReader::new(path)?),
            LoadMode::Preload => {
                let mut reader = parser.into_inner();
                let len = file_len
                    .checked_sub(layout.data_start + CHECKSUM_LEN as u64)
                    .ok_or_else(|| PboError::Malformed("data region overruns the file".into()))?;
                reader.seek(SeekFrom::Start(layout.data_start))?;
                let mut data = vec![0u8; len as usize];
                reader
                    .read_exact(&mut data)
                    .map_err(PboError::from_parse_io)?;
                PayloadSource::Memory(MemoryReader::new(layout.data_start, data))
            }
        };

        Ok(Self::from_layout(path.to_path_buf(), layout, source))
    }

    fn from_layout(path: PathBuf, layout: ArchiveLayout, source: PayloadSource) -> Self {
        let mut offsets = Vec::with_capacity(layout.entries.len());
        let mut next = layout.data_start;
        for e in &layout.entries {
            offsets.push(next);
            next += u64::from(e.data_size);
        }
        Self {
            path,
            layout,
            offsets,
            source,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in table order
    pub fn entries(&self) -> &[FileEntry] {
        &self.layout.entries
    }

    pub fn product(&self) -> &ProductEntry {
        &self.layout.product
    }

    pub fn data_start(&self) -> u64 {
        self.layout.data_start
    }

    /// The digest stored at the end of the archive
    pub fn checksum(&self) -> &[u8; CHECKSUM_LEN] {
        &self.layout.checksum
    }

    pub fn is_preloaded(&self) -> bool {
        self.source.is_preloaded()
    }

    pub(crate) fn source(&self) -> &dyn ReadAt {
        &self.source
    }

    /// Find an entry by its stored name.
    pub fn entry(&self, name: &str) -> Option<&FileEntry> {
        self.layout.entries.iter().find(|e| e.file_name == name)
    }

    /// Table index of `entry`.
    ///
    /// A reference into [`Archive::entries`] resolves to that exact slot, so
    /// identical duplicates stay distinct. Entries from elsewhere match the
    /// first equal one.
    pub(crate) fn index_of(&self, entry: &FileEntry) -> PboResult<usize> {
        self.layout
            .entries
            .iter()
            .position(|e| std::ptr::eq(e, entry))
            .or_else(|| self.layout.entries.iter().position(|e| e == entry))
            .ok_or_else(|| PboError::UnknownEntry(entry.file_name.clone()))
    }

    /// Absolute offset of `entry`'s payload: the data start plus the sizes of
    /// every entry before it.
    pub fn payload_offset(&self, entry: &FileEntry) -> PboResult<u64> {
        Ok(self.offsets[self.index_of(entry)?])
    }

    pub(crate) fn offset_at(&self, index: usize) -> u64 {
        self.offsets[index]
    }

    /// SHA-1 over every byte before the checksum marker.
    pub fn compute_checksum(&self) -> PboResult<[u8; CHECKSUM_LEN]> {
        let file = File::open(&self.path)?;
        let mut limited = file.take(self.layout.data_end());
        let mut hasher = Sha1::new();
        let mut buf = vec![0u8; COPY_CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let n = limited.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            total += n as u64;
        }
        if total != self.layout.data_end() {
            return Err(PboError::Malformed("archive shrank while hashing".into()));
        }
        let mut digest = [0u8; CHECKSUM_LEN];
        digest.copy_from_slice(&hasher.finalize());
        Ok(digest)
    }

    /// Recompute the digest and compare it with the stored one.
    pub fn verify_checksum(&self) -> PboResult<()> {
        let computed = self.compute_checksum()?;
        if computed != self.layout.checksum {
            return Err(PboError::ChecksumMismatch {
                stored: hex(&self.layout.checksum),
                computed: hex(&computed),
            });
        }
        Ok(())
    }
}
