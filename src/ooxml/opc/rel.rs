//! Reading `.rels` parts.
//!
//! Story parts are found by following the relationships of the package and
//! of the main document, so only reading is needed.
use crate::ooxml::opc::constants::{reltype_suffix, target_mode};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;

/// One `<Relationship>` entry.
#[derive(Debug, Clone)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    /// Relative part reference, or a URL for external targets
    target_ref: String,
    /// Directory of the source part
    base_uri: String,
    is_external: bool,
}

impl Relationship {
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Part name of an internal target; external targets are an error.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(
                format!("'{}' points outside the package", self.r_id),
            ));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Collection of relationships from a single source, in document order.
#[derive(Debug, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Parse a `.rels` part.
    ///
    /// # Arguments
    /// * `rels_xml` - The raw XML of the relationships part
    /// * `base_uri` - Base URI of the source part, for resolving relative targets
    pub fn from_xml(rels_xml: &[u8], base_uri: &str) -> Result<Self> {
        let mut rels = Vec::new();
        let mut reader = Reader::from_reader(rels_xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = None;
                        let mut reltype = None;
                        let mut target_ref = None;
                        let mut mode = target_mode::INTERNAL.to_string();

                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"Id" => r_id = Some(attr.unescape_value()?.to_string()),
                                b"Type" => reltype = Some(attr.unescape_value()?.to_string()),
                                b"Target" => target_ref = Some(attr.unescape_value()?.to_string()),
                                b"TargetMode" => mode = attr.unescape_value()?.to_string(),
                                _ => {},
                            }
                        }

                        if let (Some(r_id), Some(reltype), Some(target_ref)) =
                            (r_id, reltype, target_ref)
                        {
                            rels.push(Relationship {
                                r_id,
                                reltype,
                                target_ref,
                                base_uri: base_uri.to_string(),
                                is_external: mode == target_mode::EXTERNAL,
                            });
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::Rels(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        Ok(Self { rels })
    }

    /// Get a relationship by its ID.
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// Internal relationships whose type URI ends in `suffix`.
    ///
    /// Matching on the last segment accepts both the transitional and the
    /// Strict OOXML namespace for the same relationship.
    pub fn internal_by_suffix<'a>(
        &'a self,
        suffix: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.rels
            .iter()
            .filter(move |rel| !rel.is_external && reltype_suffix(&rel.reltype) == suffix)
    }

    /// Iterate over all relationships.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Relationship> {
        self.rels.iter()
    }

    /// Number of relationships.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Whether the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}
