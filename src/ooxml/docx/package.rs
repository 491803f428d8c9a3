/// Package implementation for Word documents.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::PackURI;
use crate::ooxml::opc::constants::{reltype_suffix, relationship_type};
use std::fmt;
use tracing::{debug, warn};

/// Member used when `_rels/.rels` names no main document.
const DEFAULT_MAIN_DOCUMENT: &str = "/word/document.xml";

/// The kind of WordprocessingML part that can carry merge fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Document,
    Header,
    Footer,
    Footnotes,
    Endnotes,
    Comments,
}

impl PartKind {
    /// Map a relationship type (by its last segment) to a part kind.
    pub fn from_reltype(reltype: &str) -> Option<Self> {
        match reltype_suffix(reltype) {
            "officeDocument" => Some(PartKind::Document),
            "header" => Some(PartKind::Header),
            "footer" => Some(PartKind::Footer),
            "footnotes" => Some(PartKind::Footnotes),
            "endnotes" => Some(PartKind::Endnotes),
            "comments" => Some(PartKind::Comments),
            _ => None,
        }
    }

    /// Guess a part kind from a member name, for packages without relationships.
    pub fn from_membername(name: &str) -> Option<Self> {
        let file = name.rsplit('/').next()?;
        let stem = file.strip_suffix(".xml")?;
        let base = stem.trim_end_matches(|c: char| c.is_ascii_digit());
        match base {
            "header" => Some(PartKind::Header),
            "footer" => Some(PartKind::Footer),
            "footnotes" => Some(PartKind::Footnotes),
            "endnotes" => Some(PartKind::Endnotes),
            "comments" => Some(PartKind::Comments),
            _ => None,
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PartKind::Document => "document",
            PartKind::Header => "header",
            PartKind::Footer => "footer",
            PartKind::Footnotes => "footnotes",
            PartKind::Endnotes => "endnotes",
            PartKind::Comments => "comments",
        };
        f.write_str(name)
    }
}

/// A part that is parsed and merged by the template engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPart {
    pub uri: PackURI,
    pub kind: PartKind,
}

/// A Word (.docx) package.
///
/// Wraps an OPC package and knows which parts hold document content: the
/// main document plus the headers, footers, notes and comments it references.
///
/// # Examples
///
/// ```rust,no_run
/// use quince::ooxml::docx::Package;
///
/// let pkg = Package::open("letter.docx")?;
/// for part in pkg.story_parts() {
///     println!("{} ({})", part.uri, part.kind);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Package {
    /// The underlying OPC package
    opc: OpcPackage,

    /// Main document first, then referenced parts in relationship order
    stories: Vec<StoryPart>,
}

impl Package {
    /// Open a .docx package from a file path.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Create a .docx package from owned bytes.
    ///
    /// # Errors
    /// Fails if the bytes are not a ZIP archive or the main document part is missing.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let main = Self::locate_main_document(&opc)?;
        let mut stories = vec![StoryPart {
            uri: main.clone(),
            kind: PartKind::Document,
        }];

        let rels = opc.part_rels(&main)?;
        if rels.is_empty() {
            // No relationships to follow: fall back to conventional names
            for name in opc.member_names() {
                if let Some(kind) = PartKind::from_membername(name) {
                    stories.push(StoryPart {
                        uri: PackURI::from_membername(name),
                        kind,
                    });
                }
            }
        } else {
            for rel in rels.iter().filter(|rel| !rel.is_external()) {
                let Some(kind) = PartKind::from_reltype(rel.reltype()) else {
                    continue;
                };
                let uri = rel.target_partname()?;
                if !opc.contains(&uri) {
                    warn!(part = %uri, "relationship target is missing from the package");
                    continue;
                }
                if stories.iter().all(|s| s.uri != uri) {
                    stories.push(StoryPart { uri, kind });
                }
            }
        }

        debug!(main = %main, parts = stories.len(), "located template parts");
        Ok(Self { opc, stories })
    }

    /// Find the main document through the package relationships.
    fn locate_main_document(opc: &OpcPackage) -> Result<PackURI> {
        let suffix = reltype_suffix(relationship_type::OFFICE_DOCUMENT);
        if let Some(rel) = opc.rels().internal_by_suffix(suffix).next() {
            let uri = rel.target_partname()?;
            if opc.contains(&uri) {
                return Ok(uri);
            }
            return Err(OoxmlError::PartNotFound(uri.to_string()));
        }

        let fallback = PackURI::from_membername(DEFAULT_MAIN_DOCUMENT);
        if opc.contains(&fallback) {
            Ok(fallback)
        } else {
            Err(OoxmlError::PartNotFound(format!(
                "main document part ({})",
                DEFAULT_MAIN_DOCUMENT
            )))
        }
    }

    /// The main document part.
    #[inline]
    pub fn main_document(&self) -> &PackURI {
        &self.stories[0].uri
    }

    /// Every part that carries document content, main document first.
    #[inline]
    pub fn story_parts(&self) -> &[StoryPart] {
        &self.stories
    }

    /// The underlying OPC package.
    #[inline]
    pub fn opc(&self) -> &OpcPackage {
        &self.opc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::scaffold::DocxBuilder;

    #[test]
    fn test_part_kind_from_membername() {
        assert_eq!(PartKind::from_membername("word/header12.xml"), Some(PartKind::Header));
        assert_eq!(PartKind::from_membername("word/footnotes.xml"), Some(PartKind::Footnotes));
        assert_eq!(PartKind::from_membername("word/styles.xml"), None);
        assert_eq!(PartKind::from_membername("word/_rels/header1.xml.rels"), None);
    }

    #[test]
    fn test_locates_referenced_parts() {
        let bytes = DocxBuilder::new("<w:p/>")
            .header("<w:p/>")
            .footer("<w:p/>")
            .build()
            .unwrap();
        let pkg = Package::from_bytes(bytes).unwrap();

        assert_eq!(pkg.main_document().as_str(), "/word/document.xml");
        let kinds: Vec<_> = pkg.story_parts().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, [PartKind::Document, PartKind::Header, PartKind::Footer]);
    }

    #[test]
    fn test_missing_main_document() {
        let bytes = DocxBuilder::new("<w:p/>").without_document().build().unwrap();
        assert!(matches!(
            Package::from_bytes(bytes),
            Err(OoxmlError::PartNotFound(_))
        ));
    }
}
