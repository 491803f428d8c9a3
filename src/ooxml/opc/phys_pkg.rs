//! The zip container underneath a package.
//!
//! Members that are not rewritten are copied in their compressed form, so
//! their bytes, compression method and timestamps survive a render untouched.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

/// Reads members out of archive bytes it borrows; nothing is decompressed
/// until asked for.
pub struct PhysPkgReader<'data> {
    archive: ZipArchive<Cursor<&'data [u8]>>,
}

impl<'data> PhysPkgReader<'data> {
    /// Open the central directory of `data`.
    pub fn new(data: &'data [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Decompressed content of the member for `pack_uri`.
    pub fn blob_for(&mut self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(pack_uri.membername()) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(OpcError::PartNotFound(pack_uri.to_string()));
            },
            Err(e) => return Err(e.into()),
        };

        let mut blob = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut blob)?;
        Ok(blob)
    }

    /// The `.rels` part of `source_uri`, or `None` when it has none.
    pub fn rels_xml_for(&mut self, source_uri: &PackURI) -> Result<Option<Vec<u8>>> {
        match self.blob_for(&source_uri.rels_uri()) {
            Ok(blob) => Ok(Some(blob)),
            Err(OpcError::PartNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Member names in archive order.
    pub fn member_names(&self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i).map(String::from))
            .collect()
    }

    /// Compression method a member is stored with.
    pub fn compression_for(&mut self, index: usize) -> Result<CompressionMethod> {
        Ok(self.archive.by_index_raw(index)?.compression())
    }

    /// Copy member `index` into `writer` without decompressing it.
    pub fn copy_raw_to<W: Write + Seek>(
        &mut self,
        index: usize,
        writer: &mut PhysPkgWriter<W>,
    ) -> Result<()> {
        let file = self.archive.by_index_raw(index)?;
        writer.archive.raw_copy_file(file)?;
        Ok(())
    }
}

/// Writes a new archive.
///
/// Freshly written members get a fixed timestamp, so the same input always
/// produces the same archive bytes.
pub struct PhysPkgWriter<W: Write + Seek> {
    archive: ZipWriter<W>,
}

impl PhysPkgWriter<Cursor<Vec<u8>>> {
    /// A writer collecting the archive in a `Vec<u8>`.
    pub fn in_memory() -> Self {
        Self::new(Cursor::new(Vec::new()))
    }
}

impl<W: Write + Seek> PhysPkgWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            archive: ZipWriter::new(inner),
        }
    }

    /// Add a member. `level` is ignored for stored members.
    pub fn write(
        &mut self,
        pack_uri: &PackURI,
        blob: &[u8],
        method: CompressionMethod,
        level: Option<i64>,
    ) -> Result<()> {
        let level = match method {
            CompressionMethod::Stored => None,
            _ => level,
        };
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(level)
            .last_modified_time(zip::DateTime::default());

        self.archive.start_file(pack_uri.membername(), options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Write the central directory and hand back the sink.
    pub fn finish(self) -> Result<W> {
        Ok(self.archive.finish()?)
    }
}
