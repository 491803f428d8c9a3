//! Minimal valid Word packages.
//!
//! Builds a `.docx` around caller-supplied body XML so templates can be
//! produced in code (tests, demos) without binary fixtures. The generated
//! package has the same member layout Word writes: content types, package
//! relationships, the main document with its relationships, styles, and any
//! headers, footers or footnotes that were added.

use crate::ooxml::opc::constants::{content_type as ct, namespace as ns};
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use zip::CompressionMethod;

/// Namespace declarations put on every generated story root.
fn story_namespaces() -> String {
    format!(
        "xmlns:w=\"{}\" xmlns:r=\"{}\" \
         xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\"",
        ns::WML_MAIN,
        ns::OFC_RELATIONSHIPS
    )
}

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\r\n",
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:docDefaults><w:rPrDefault><w:rPr><w:sz w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults>"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#,
    "</w:styles>"
);

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

/// Builder for a minimal `.docx` package.
///
/// # Examples
///
/// ```
/// use quince::ooxml::docx::scaffold::DocxBuilder;
///
/// let bytes = DocxBuilder::new("<w:p><w:r><w:t>Hello</w:t></w:r></w:p>")
///     .header("<w:p><w:r><w:t>Page header</w:t></w:r></w:p>")
///     .build()?;
/// assert!(bytes.starts_with(b"PK"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocxBuilder {
    body: String,
    headers: Vec<String>,
    footers: Vec<String>,
    footnotes: Vec<String>,
    extra: Vec<(String, Vec<u8>)>,
    with_document: bool,
    method: CompressionMethod,
}

impl DocxBuilder {
    /// Start a package whose `w:body` holds `body_xml` (paragraphs and tables,
    /// using the `w:` prefix).
    pub fn new<S: Into<String>>(body_xml: S) -> Self {
        Self {
            body: body_xml.into(),
            headers: Vec::new(),
            footers: Vec::new(),
            footnotes: Vec::new(),
            extra: Vec::new(),
            with_document: true,
            method: CompressionMethod::Deflated,
        }
    }

    /// Add a default header whose `w:hdr` holds `xml`.
    #[inline]
    pub fn header<S: Into<String>>(mut self, xml: S) -> Self {
        self.headers.push(xml.into());
        self
    }

    /// Add a default footer whose `w:ftr` holds `xml`.
    #[inline]
    pub fn footer<S: Into<String>>(mut self, xml: S) -> Self {
        self.footers.push(xml.into());
        self
    }

    /// Add a footnote whose `w:footnote` holds `xml`.
    #[inline]
    pub fn footnote<S: Into<String>>(mut self, xml: S) -> Self {
        self.footnotes.push(xml.into());
        self
    }

    /// Add an arbitrary member, e.g. `word/media/image1.png`.
    #[inline]
    pub fn member<S: Into<String>>(mut self, name: S, data: Vec<u8>) -> Self {
        self.extra.push((name.into(), data));
        self
    }

    /// Store members uncompressed.
    #[inline]
    pub fn stored(mut self) -> Self {
        self.method = CompressionMethod::Stored;
        self
    }

    /// Leave out `word/document.xml` while still referencing it.
    #[inline]
    pub fn without_document(mut self) -> Self {
        self.with_document = false;
        self
    }

    /// Write the package.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::in_memory();
        let mut put = |name: &str, data: &[u8]| -> Result<()> {
            writer.write(&PackURI::from_membername(name), data, self.method, None)
        };

        put("[Content_Types].xml", self.content_types_xml().as_bytes())?;
        put("_rels/.rels", self.package_rels_xml().as_bytes())?;
        if self.with_document {
            put("word/document.xml", self.document_xml().as_bytes())?;
        }
        put("word/_rels/document.xml.rels", self.document_rels_xml().as_bytes())?;
        put("word/styles.xml", STYLES_XML.as_bytes())?;

        for (i, xml) in self.headers.iter().enumerate() {
            let part = format!("{}<w:hdr {}>{}</w:hdr>", XML_DECLARATION, story_namespaces(), xml);
            put(&format!("word/header{}.xml", i + 1), part.as_bytes())?;
        }
        for (i, xml) in self.footers.iter().enumerate() {
            let part = format!("{}<w:ftr {}>{}</w:ftr>", XML_DECLARATION, story_namespaces(), xml);
            put(&format!("word/footer{}.xml", i + 1), part.as_bytes())?;
        }
        if !self.footnotes.is_empty() {
            put("word/footnotes.xml", self.footnotes_xml().as_bytes())?;
        }
        for (name, data) in &self.extra {
            put(name, data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = format!(
            "{}<Types xmlns=\"{}\">\
             <Default Extension=\"rels\" ContentType=\"{}\"/>\
             <Default Extension=\"xml\" ContentType=\"{}\"/>\
             <Default Extension=\"png\" ContentType=\"image/png\"/>\
             <Override PartName=\"/word/document.xml\" ContentType=\"{}\"/>",
            XML_DECLARATION,
            ns::OPC_CONTENT_TYPES,
            ct::OPC_RELATIONSHIPS,
            ct::XML,
            ct::WML_DOCUMENT_MAIN
        );
        for i in 1..=self.headers.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/word/header{}.xml\" ContentType=\"{}\"/>",
                i,
                ct::WML_HEADER
            ));
        }
        for i in 1..=self.footers.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/word/footer{}.xml\" ContentType=\"{}\"/>",
                i,
                ct::WML_FOOTER
            ));
        }
        if !self.footnotes.is_empty() {
            xml.push_str(&format!(
                "<Override PartName=\"/word/footnotes.xml\" ContentType=\"{}\"/>",
                ct::WML_FOOTNOTES
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn package_rels_xml(&self) -> String {
        format!(
            "{}<Relationships xmlns=\"{}\">\
             <Relationship Id=\"rId1\" Type=\"{}/officeDocument\" Target=\"word/document.xml\"/>\
             </Relationships>",
            XML_DECLARATION,
            ns::OPC_RELATIONSHIPS,
            ns::OFC_RELATIONSHIPS
        )
    }

    fn document_rels_xml(&self) -> String {
        let mut xml = format!(
            "{}<Relationships xmlns=\"{}\">\
             <Relationship Id=\"rId1\" Type=\"{}/styles\" Target=\"styles.xml\"/>",
            XML_DECLARATION,
            ns::OPC_RELATIONSHIPS,
            ns::OFC_RELATIONSHIPS
        );
        for (id, target, kind) in self.story_rels() {
            xml.push_str(&format!(
                "<Relationship Id=\"{}\" Type=\"{}/{}\" Target=\"{}\"/>",
                id,
                ns::OFC_RELATIONSHIPS,
                kind,
                target
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    /// `(rId, target, relationship kind)` for every generated story part.
    fn story_rels(&self) -> Vec<(String, String, &'static str)> {
        let mut rels = Vec::new();
        let mut next = 2;
        for i in 1..=self.headers.len() {
            rels.push((format!("rId{}", next), format!("header{}.xml", i), "header"));
            next += 1;
        }
        for i in 1..=self.footers.len() {
            rels.push((format!("rId{}", next), format!("footer{}.xml", i), "footer"));
            next += 1;
        }
        if !self.footnotes.is_empty() {
            rels.push((format!("rId{}", next), "footnotes.xml".to_string(), "footnotes"));
        }
        rels
    }

    fn document_xml(&self) -> String {
        let mut sect = String::from("<w:sectPr>");
        for (id, _, kind) in self.story_rels() {
            match kind {
                "header" => sect.push_str(&format!(
                    "<w:headerReference w:type=\"default\" r:id=\"{}\"/>",
                    id
                )),
                "footer" => sect.push_str(&format!(
                    "<w:footerReference w:type=\"default\" r:id=\"{}\"/>",
                    id
                )),
                _ => {},
            }
        }
        sect.push_str("<w:pgSz w:w=\"11906\" w:h=\"16838\"/></w:sectPr>");

        format!(
            "{}<w:document {}><w:body>{}{}</w:body></w:document>",
            XML_DECLARATION,
            story_namespaces(),
            self.body,
            sect
        )
    }

    fn footnotes_xml(&self) -> String {
        let mut xml = format!("{}<w:footnotes {}>", XML_DECLARATION, story_namespaces());
        for (i, note) in self.footnotes.iter().enumerate() {
            xml.push_str(&format!("<w:footnote w:id=\"{}\">{}</w:footnote>", i + 1, note));
        }
        xml.push_str("</w:footnotes>");
        xml
    }
}
