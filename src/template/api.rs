//! The public entry points: loading a template and rendering it.
use crate::common::{Error, Location, Result};
use crate::ooxml::docx::body::Part;
use crate::ooxml::docx::package::{Package, PartKind};
use crate::ooxml::docx::repair::{DrawingIds, max_drawing_id, repair_tables};
use crate::ooxml::docx::xml::XmlDocument;
use crate::template::compile::compile_story;
use crate::template::options::TemplateOptions;
use crate::template::render::Renderer;
use crate::template::scanner::Scanner;
use crate::template::value::Value;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, trace};

/// One story part, compiled.
#[derive(Debug)]
struct CompiledPart {
    /// Member name, without leading slash
    name: String,
    kind: PartKind,
    part: Part,
    placeholders: usize,
}

/// A loaded `.docx` template.
///
/// Loading parses every part that carries document content, recognizes the
/// placeholders and pairs the block markers, so template defects surface
/// here rather than at render time. A `Template` is immutable afterwards:
/// share it freely (it is `Send + Sync`) and render it as often as needed.
///
/// # Examples
///
/// ```rust,no_run
/// use quince::{Template, Value};
///
/// let template = Template::from_file("invoice.docx")?;
/// let data = Value::map([
///     ("name", Value::from("Ada")),
///     ("items", Value::List(vec![Value::map([("sku", Value::from("A-1"))])])),
/// ]);
/// template.render(&data)?.write_to_file("out.docx")?;
/// # Ok::<(), quince::Error>(())
/// ```
#[derive(Debug)]
pub struct Template {
    package: Package,
    options: TemplateOptions,
    parts: Vec<CompiledPart>,
    /// Largest drawing id in the template
    drawing_floor: u32,
}

impl Template {
    /// Load a template from the bytes of a `.docx` package.
    ///
    /// # Errors
    /// - [`Error::Package`] if the bytes are not a zip archive or have no main document
    /// - [`Error::MalformedTemplate`] for XML that cannot be parsed or overlapping blocks
    /// - [`Error::UnmatchedBlock`] for a block marker without its partner
    /// - [`Error::Format`] for a format specifier that cannot be parsed
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(data, TemplateOptions::default())
    }

    /// [`Template::from_bytes`] with explicit options.
    pub fn from_bytes_with_options(data: Vec<u8>, options: TemplateOptions) -> Result<Self> {
        options.validate()?;
        let started = Instant::now();
        let package = Package::from_bytes(data)?;

        let mut parts = Vec::with_capacity(package.story_parts().len());
        let mut drawing_floor = 0;
        for story in package.story_parts() {
            let name = story.uri.membername().to_string();
            let blob = package.opc().blob_for(&story.uri)?;
            let doc = XmlDocument::parse(&blob).map_err(|e| Error::malformed(e, Location::part(name.as_str())))?;
            drawing_floor = drawing_floor.max(max_drawing_id(&doc.root));

            let mut part = Part::from_document(doc);
            let placeholders = compile_part(&mut part, &name, &options)?;
            parts.push(CompiledPart {
                name,
                kind: story.kind,
                part,
                placeholders,
            });
        }

        debug!(
            parts = parts.len(),
            placeholders = parts.iter().map(|p| p.placeholders).sum::<usize>(),
            elapsed = ?started.elapsed(),
            "loaded template"
        );
        Ok(Self {
            package,
            options,
            parts,
            drawing_floor,
        })
    }

    /// Load a template from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_options(path, TemplateOptions::default())
    }

    /// [`Template::from_file`] with explicit options.
    pub fn from_file_with_options<P: AsRef<Path>>(path: P, options: TemplateOptions) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes_with_options(data, options)
    }

    /// Load a template from a reader that yields the whole package.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, TemplateOptions::default())
    }

    /// [`Template::from_reader`] with explicit options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: TemplateOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(data, options)
    }

    /// The options the template was loaded with.
    #[inline]
    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Names of the parts that contain placeholders, in package order.
    pub fn templated_parts(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .filter(|p| p.placeholders > 0)
            .map(|p| p.name.as_str())
    }

    /// Number of placeholders found across all parts.
    pub fn placeholder_count(&self) -> usize {
        self.parts.iter().map(|p| p.placeholders).sum()
    }

    /// Merge `data` into the template.
    ///
    /// Parts without placeholders are copied from the template unchanged.
    /// Any error aborts the whole render; no partial document is returned.
    ///
    /// # Errors
    /// - [`Error::UnresolvedPath`] in strict mode, for a path that resolves to nothing
    /// - [`Error::TypeMismatch`] for a list or map bound to a scalar placeholder, or
    ///   a scalar bound to a block
    /// - [`Error::Format`] for a value the placeholder's format cannot render
    pub fn render(&self, data: &Value) -> Result<RenderOutput> {
        let started = Instant::now();
        let targets: Vec<&CompiledPart> = self.parts.iter().filter(|p| p.placeholders > 0).collect();

        let docs: Vec<XmlDocument> = if self.options.parallel {
            targets
                .par_iter()
                .map(|compiled| self.render_part(compiled, data))
                .collect::<Result<_>>()?
        } else {
            targets
                .iter()
                .map(|compiled| self.render_part(compiled, data))
                .collect::<Result<_>>()?
        };

        let mut ids = DrawingIds::new(self.drawing_floor);
        let mut replacements = HashMap::with_capacity(docs.len());
        for (compiled, mut doc) in targets.into_iter().zip(docs) {
            let renumbered = ids.renumber(&mut doc.root);
            if renumbered > 0 {
                debug!(part = %compiled.name, renumbered, "renumbered duplicate drawing ids");
            }
            replacements.insert(compiled.name.clone(), doc.to_xml().into_bytes());
        }

        let bytes = self
            .package
            .opc()
            .rewrite(&replacements, self.options.compression_level)?;
        debug!(
            parts = replacements.len(),
            bytes = bytes.len(),
            elapsed = ?started.elapsed(),
            "rendered template"
        );
        Ok(RenderOutput { bytes })
    }

    /// Render any serializable value, converted through [`Value::from_serialize`].
    ///
    /// # Errors
    /// [`Error::Data`] if `data` cannot be serialized, plus everything
    /// [`Template::render`] reports.
    pub fn render_serialize<T: Serialize + ?Sized>(&self, data: &T) -> Result<RenderOutput> {
        let value = Value::from_serialize(data)?;
        self.render(&value)
    }

    fn render_part(&self, compiled: &CompiledPart, data: &Value) -> Result<XmlDocument> {
        let mut doc = Renderer::new(&self.options, &compiled.name).render(&compiled.part, data)?;
        let stats = repair_tables(&mut doc.root);
        if !stats.is_empty() {
            debug!(
                part = %compiled.name,
                kind = %compiled.kind,
                tables_removed = stats.tables_removed,
                cells_filled = stats.cells_filled,
                "repaired tables"
            );
        }
        Ok(doc)
    }
}

/// Scan and compile every story of `part`; returns the placeholder count.
fn compile_part(part: &mut Part, name: &str, options: &TemplateOptions) -> Result<usize> {
    let scanner = Scanner::new(&options.open, &options.close, name);
    let mut placeholders = 0;
    let mut regions = 0;
    part.try_for_each_story_mut(&mut |blocks| {
        placeholders += scanner.scan_blocks(blocks)?;
        regions += compile_story(blocks, name)?.regions;
        Ok::<(), Error>(())
    })?;
    trace!(part = name, placeholders, regions, "compiled part");
    Ok(placeholders)
}

/// The bytes of a rendered `.docx` package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    bytes: Vec<u8>,
}

impl RenderOutput {
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the package to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the package to a file, replacing it if it exists.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

impl AsRef<[u8]> for RenderOutput {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<RenderOutput> for Vec<u8> {
    fn from(output: RenderOutput) -> Self {
        output.bytes
    }
}
