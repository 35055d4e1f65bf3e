//! Byte source and bootstrap/TOC parsing for Crate files.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path as FsPath;
use std::sync::Arc;

use memmap2::Mmap;
use parking_lot::RwLock;

use super::format::*;
use crate::util::{Error, Result};

/// Random-access byte source for a Crate file.
///
/// Prefers memory mapping; falls back to buffered file access, and accepts
/// an owned in-memory buffer for byte-stream inputs. All reads are by
/// absolute offset; there is no shared cursor, so a source can be read
/// from several decode workers at once.
pub struct CrateSource {
    inner: SourceInner,
    size: u64,
}

enum SourceInner {
    Mmap(Mmap),
    File(Arc<RwLock<File>>),
    Memory(Vec<u8>),
}

impl CrateSource {
    /// Open a file with memory mapping.
    pub fn open(path: impl AsRef<FsPath>) -> Result<Self> {
        Self::open_opts(path, true)
    }

    /// Open a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<FsPath>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();
        if size < BOOTSTRAP_SIZE as u64 {
            return Err(Error::UnexpectedEof(size));
        }

        let inner = if use_mmap {
            // Safety: the file is opened read-only; truncation during a
            // read surfaces as a bounds error, not UB on these targets.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            SourceInner::Mmap(mmap)
        } else {
            SourceInner::File(Arc::new(RwLock::new(file)))
        };

        Ok(Self { inner, size })
    }

    /// Wrap an in-memory byte buffer.
    pub fn from_memory(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self {
            inner: SourceInner::Memory(data),
            size,
        }
    }

    /// Total size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read into an existing buffer at an absolute offset.
    pub fn read_into(&self, pos: u64, buf: &mut [u8]) -> Result<()> {
        let end = pos
            .checked_add(buf.len() as u64)
            .ok_or(Error::UnexpectedEof(u64::MAX))?;
        if end > self.size {
            return Err(Error::UnexpectedEof(end));
        }

        match &self.inner {
            SourceInner::Mmap(mmap) => {
                buf.copy_from_slice(&mmap[pos as usize..pos as usize + buf.len()]);
                Ok(())
            }
            SourceInner::Memory(data) => {
                buf.copy_from_slice(&data[pos as usize..pos as usize + buf.len()]);
                Ok(())
            }
            SourceInner::File(file) => {
                let mut f = file.write();
                f.seek(SeekFrom::Start(pos))?;
                f.read_exact(buf)?;
                Ok(())
            }
        }
    }

    /// Read `len` bytes at an absolute offset.
    pub fn read_bytes(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(pos, &mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&self, pos: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_into(pos, &mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u32(&self, pos: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(pos, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_u64(&self, pos: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(pos, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
}

/// Parsed bootstrap header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bootstrap {
    pub version: (u8, u8, u8),
    pub toc_offset: u64,
}

impl Bootstrap {
    /// Parse and validate the bootstrap header.
    pub fn read(source: &CrateSource) -> Result<Self> {
        if source.size() < BOOTSTRAP_SIZE as u64 {
            return Err(Error::UnexpectedEof(source.size()));
        }
        let header = source.read_bytes(0, BOOTSTRAP_SIZE)?;

        if &header[0..MAGIC.len()] != MAGIC {
            return Err(Error::InvalidMagic);
        }

        let version = (
            header[VERSION_OFFSET],
            header[VERSION_OFFSET + 1],
            header[VERSION_OFFSET + 2],
        );
        if version.0 != 0 {
            return Err(Error::UnsupportedVersion(version.0, version.1, version.2));
        }

        let toc_offset = u64::from_le_bytes(
            header[TOC_OFFSET_POS..TOC_OFFSET_POS + 8]
                .try_into()
                .expect("bootstrap header is 19 bytes"),
        );
        if toc_offset < BOOTSTRAP_SIZE as u64 || toc_offset >= source.size() {
            return Err(Error::structural(
                "TOC",
                toc_offset,
                "TOC offset outside the file",
            ));
        }

        Ok(Self {
            version,
            toc_offset,
        })
    }
}

/// One named byte range from the TOC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

/// Table of contents.
#[derive(Clone, Debug, Default)]
pub struct Toc {
    sections: Vec<Section>,
}

impl Toc {
    /// Read the TOC at the bootstrap's offset, validating every range.
    pub fn read(source: &CrateSource, toc_offset: u64) -> Result<Self> {
        let count = source.read_u64(toc_offset)?;
        let max_entries = (source.size() - toc_offset) / TOC_ENTRY_SIZE as u64;
        if count > max_entries {
            return Err(Error::structural(
                "TOC",
                toc_offset,
                format!("entry count {count} exceeds file capacity"),
            ));
        }

        let mut sections = Vec::with_capacity(count as usize);
        let mut pos = toc_offset + 8;
        for _ in 0..count {
            let entry = source.read_bytes(pos, TOC_ENTRY_SIZE)?;
            let name_len = entry[..16].iter().position(|&b| b == 0).unwrap_or(16);
            let name = std::str::from_utf8(&entry[..name_len])
                .map_err(|_| Error::structural("TOC", pos, "section name is not UTF-8"))?
                .to_string();
            let start = u64::from_le_bytes(entry[16..24].try_into().expect("fixed slice"));
            let size = u64::from_le_bytes(entry[24..32].try_into().expect("fixed slice"));

            let end = start
                .checked_add(size)
                .ok_or_else(|| Error::structural("TOC", pos, "section range overflows"))?;
            if end > source.size() {
                return Err(Error::structural(
                    "TOC",
                    pos,
                    format!("section `{name}` extends past end of file"),
                ));
            }

            sections.push(Section { name, start, size });
            pos += TOC_ENTRY_SIZE as u64;
        }

        Ok(Self { sections })
    }

    pub fn find(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Section names present but not in the known set.
    pub fn unknown_sections(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| !REQUIRED_SECTIONS.contains(&s.name.as_str()))
            .map(|s| s.name.as_str())
            .collect()
    }

    #[inline]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}
