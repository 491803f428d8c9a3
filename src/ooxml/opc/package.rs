/// Objects that implement reading and rewriting OPC packages.
///
/// This module provides the OpcPackage type, an immutable in-memory OPC package.
/// Parts are decompressed on request; [`OpcPackage::rewrite`] produces a new
/// archive in which only the replaced members are re-encoded.
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use crate::ooxml::opc::rel::Relationships;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::trace;
use zip::CompressionMethod;

/// Main API class for working with OPC packages.
///
/// Holds the raw archive bytes plus the package-level relationships. The
/// package is never mutated after loading, so it can be shared across threads.
#[derive(Debug)]
pub struct OpcPackage {
    /// The original archive bytes
    data: Vec<u8>,

    /// Member names in archive order
    members: Vec<String>,

    /// Package-level relationships (`_rels/.rels`)
    rels: Relationships,
}

impl OpcPackage {
    /// Open an OPC package from a file.
    ///
    /// # Arguments
    /// * `path` - Path to the package file (.docx)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Load an OPC package from a reader.
    ///
    /// # Arguments
    /// * `reader` - A reader that yields the whole archive
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Load an OPC package from owned bytes.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a ZIP archive or the package
    /// relationships cannot be parsed.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut reader = PhysPkgReader::new(&data)?;
        let members = reader.member_names();
        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let rels = match reader.rels_xml_for(&package_uri)? {
            Some(xml) => Relationships::from_xml(&xml, PACKAGE_URI)?,
            None => Relationships::default(),
        };
        trace!(members = members.len(), rels = rels.len(), "opened OPC package");

        drop(reader);
        Ok(Self {
            data,
            members,
            rels,
        })
    }

    /// Package-level relationships.
    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Relationships whose source is `source`; empty when the part has no `.rels`.
    pub fn part_rels(&self, source: &PackURI) -> Result<Relationships> {
        let mut reader = PhysPkgReader::new(&self.data)?;
        match reader.rels_xml_for(source)? {
            Some(xml) => Relationships::from_xml(&xml, source.base_uri()),
            None => Ok(Relationships::default()),
        }
    }

    /// Get the decompressed content of a part.
    pub fn blob_for(&self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        PhysPkgReader::new(&self.data)?.blob_for(pack_uri)
    }

    /// Check whether the archive has a member for `pack_uri`.
    #[inline]
    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.members.iter().any(|m| m == pack_uri.membername())
    }

    /// Member names in archive order.
    #[inline]
    pub fn member_names(&self) -> &[String] {
        &self.members
    }

    /// The original archive bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Write a new archive in which the members named in `replacements`
    /// (by member name, without leading slash) carry new content.
    ///
    /// Member order is preserved. Untouched members are copied without being
    /// decompressed. Replaced members keep their original compression method
    /// (falling back to Deflate for methods this build cannot encode).
    ///
    /// # Arguments
    /// * `replacements` - New content keyed by member name
    /// * `level` - Deflate level for replaced members; `None` keeps the default
    pub fn rewrite(
        &self,
        replacements: &HashMap<String, Vec<u8>>,
        level: Option<i64>,
    ) -> Result<Vec<u8>> {
        let mut reader = PhysPkgReader::new(&self.data)?;
        let mut writer = PhysPkgWriter::in_memory();

        for (index, name) in self.members.iter().enumerate() {
            match replacements.get(name) {
                Some(blob) => {
                    let method = match reader.compression_for(index)? {
                        CompressionMethod::Stored => CompressionMethod::Stored,
                        _ => CompressionMethod::Deflated,
                    };
                    writer.write(&PackURI::from_membername(name), blob, method, level)?;
                },
                None => reader.copy_raw_to(index, &mut writer)?,
            }
        }

        let out = writer.finish()?.into_inner();
        trace!(bytes = out.len(), replaced = replacements.len(), "rewrote OPC package");
        Ok(out)
    }
}
