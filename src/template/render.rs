//! Merging a compiled part with data.
//!
//! Rendering never touches the compiled model: every call builds a fresh
//! element tree, so one template can be rendered concurrently with different
//! data.
use crate::common::xml::strip_invalid_xml_chars;
use crate::common::{Error, Location, Result};
use crate::ooxml::docx::body::{
    Block, Container, Content, Field, Inline, Part, PartNode, RowItem, TableItem, TokenRun, text_element,
    token_run_element,
};
use crate::ooxml::docx::xml::{XmlDocument, XmlElement, XmlNode};
use crate::template::format::default_text;
use crate::template::options::TemplateOptions;
use crate::template::resolver::{Position, Scope};
use crate::template::token::Token;
use crate::template::value::Value;
use std::borrow::Cow;

/// Renders the parts of one template.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    options: &'a TemplateOptions,
    part: &'a str,
}

impl<'a> Renderer<'a> {
    pub fn new(options: &'a TemplateOptions, part: &'a str) -> Self {
        Self { options, part }
    }

    /// Merge `data` into a copy of `part`.
    pub fn render(&self, part: &Part, data: &Value) -> Result<XmlDocument> {
        let scope = Scope::root(data);
        Ok(XmlDocument {
            declaration: part.declaration.clone(),
            prolog: part.prolog.clone(),
            root: self.container(&part.root, &scope)?,
            epilog: part.epilog.clone(),
        })
    }

    fn container(&self, container: &Container, scope: &Scope<'_>) -> Result<XmlElement> {
        let children = match &container.content {
            Content::Nodes(nodes) => nodes
                .iter()
                .map(|node| match node {
                    PartNode::Container(c) => self.container(c, scope).map(XmlNode::Element),
                    PartNode::Node(n) => Ok(n.clone()),
                })
                .collect::<Result<Vec<_>>>()?,
            Content::Story(blocks) => {
                let mut out = Vec::with_capacity(blocks.len());
                self.blocks(blocks, scope, &mut out)?;
                out
            },
        };
        Ok(container.tag.element(children))
    }

    fn blocks(&self, blocks: &[Block], scope: &Scope<'_>, out: &mut Vec<XmlNode>) -> Result<()> {
        for block in blocks {
            match block {
                Block::Paragraph(p) => {
                    if p.elided {
                        continue;
                    }
                    let mut children = Vec::with_capacity(p.inlines.len());
                    self.inlines(&p.inlines, scope, &mut children)?;
                    out.push(XmlNode::Element(p.tag.element(children)));
                },
                Block::Table(table) => {
                    let mut children = Vec::with_capacity(table.items.len());
                    self.table_items(&table.items, scope, &mut children)?;
                    out.push(XmlNode::Element(table.tag.element(children)));
                },
                Block::Sdt(sdt) => {
                    let mut inner = Vec::with_capacity(sdt.blocks.len());
                    self.blocks(&sdt.blocks, scope, &mut inner)?;
                    let mut children = sdt.before.clone();
                    children.push(XmlNode::Element(sdt.content.element(inner)));
                    children.extend(sdt.after.iter().cloned());
                    out.push(XmlNode::Element(sdt.tag.element(children)));
                },
                Block::Repeat(r) => {
                    self.repeat(&r.token, scope, &mut |child: &Scope<'_>| {
                        self.blocks(&r.body, child, out)
                    })?
                },
                Block::Other(node) => out.push(node.clone()),
            }
        }
        Ok(())
    }

    fn table_items(&self, items: &[TableItem], scope: &Scope<'_>, out: &mut Vec<XmlNode>) -> Result<()> {
        for item in items {
            match item {
                TableItem::Row(row) => {
                    if row.elided {
                        continue;
                    }
                    let mut children = Vec::with_capacity(row.items.len());
                    for cell in &row.items {
                        match cell {
                            RowItem::Cell(cell) => {
                                let mut blocks = Vec::with_capacity(cell.blocks.len());
                                self.blocks(&cell.blocks, scope, &mut blocks)?;
                                children.push(XmlNode::Element(cell.tag.element(blocks)));
                            },
                            RowItem::Other(node) => children.push(node.clone()),
                        }
                    }
                    out.push(XmlNode::Element(row.tag.element(children)));
                },
                TableItem::Repeat(r) => {
                    self.repeat(&r.token, scope, &mut |child: &Scope<'_>| {
                        self.table_items(&r.body, child, out)
                    })?
                },
                TableItem::Other(node) => out.push(node.clone()),
            }
        }
        Ok(())
    }

    fn inlines(&self, inlines: &[Inline], scope: &Scope<'_>, out: &mut Vec<XmlNode>) -> Result<()> {
        for inline in inlines {
            match inline {
                Inline::Run(run) => out.push(XmlNode::Element(run.to_element())),
                Inline::Group(group) => {
                    let mut children = Vec::with_capacity(group.inlines.len());
                    self.inlines(&group.inlines, scope, &mut children)?;
                    out.push(XmlNode::Element(group.tag.element(children)));
                },
                Inline::Field(field) => {
                    let text = self.field_text(field, scope)?;
                    out.push(XmlNode::Element(self.text_run(&field.run, &text)));
                },
                Inline::Marker(_) => {},
                Inline::Repeat(r) => {
                    self.repeat(&r.token, scope, &mut |child: &Scope<'_>| {
                        self.inlines(&r.body, child, out)
                    })?
                },
                Inline::Other(node) => out.push(node.clone()),
            }
        }
        Ok(())
    }

    /// Run `body` once per repetition the value of `token` calls for.
    ///
    /// Lists repeat per element, maps and objects render once with the value
    /// as the current element, booleans act as a condition, and null or
    /// absent values render nothing.
    fn repeat(
        &self,
        token: &Token,
        scope: &Scope<'_>,
        body: &mut dyn FnMut(&Scope<'_>) -> Result<()>,
    ) -> Result<()> {
        let Some(value) = self.lookup(token, scope)? else {
            return Ok(());
        };
        match value.as_ref() {
            Value::List(items) => {
                let len = items.len();
                for (index, item) in items.iter().enumerate() {
                    body(&scope.child(item, Some(Position { index, len })))?;
                }
            },
            Value::Null | Value::Bool(false) => {},
            Value::Bool(true) => body(scope)?,
            current @ (Value::Map(_) | Value::Object(_)) => body(&scope.child(current, None))?,
            other => {
                return Err(Error::TypeMismatch {
                    token: token.source.clone(),
                    reason: format!("cannot repeat over a {} value", other.kind()),
                    location: self.location(token),
                });
            },
        }
        Ok(())
    }

    /// Resolve the path of `token`; absent is an error only in strict mode.
    fn lookup<'s>(&self, token: &Token, scope: &Scope<'s>) -> Result<Option<Cow<'s, Value>>> {
        match scope.resolve(&token.path) {
            Some(value) => Ok(Some(value)),
            None if self.options.strict => Err(Error::UnresolvedPath {
                path: token.path.as_str().to_string(),
                token: token.source.clone(),
                location: self.location(token),
            }),
            None => Ok(None),
        }
    }

    fn field_text(&self, field: &Field, scope: &Scope<'_>) -> Result<String> {
        let token = &field.token;
        let Some(value) = self.lookup(token, scope)? else {
            return Ok(String::new());
        };
        if matches!(value.as_ref(), Value::List(_) | Value::Map(_) | Value::Object(_)) {
            return Err(Error::TypeMismatch {
                token: token.source.clone(),
                reason: format!(
                    "'{}' is a {}; use a block to render it",
                    token.path,
                    value.kind()
                ),
                location: self.location(token),
            });
        }

        match &field.format {
            Some(spec) => spec
                .apply(&value, &self.options.currency_symbol)
                .map_err(|e| Error::Format {
                    token: token.source.clone(),
                    spec: e.spec,
                    reason: e.reason,
                    location: self.location(token),
                }),
            None => default_text(&value)
                .map(|text| text.into_owned())
                .map_err(|reason| Error::TypeMismatch {
                    token: token.source.clone(),
                    reason,
                    location: self.location(token),
                }),
        }
    }

    /// A run carrying `text` with the field's formatting.
    fn text_run(&self, run: &TokenRun, text: &str) -> XmlElement {
        let text = if self.options.strip_invalid_xml_chars {
            strip_invalid_xml_chars(text)
        } else {
            text.into()
        };
        if !self.options.line_breaks || !text.contains('\n') {
            return token_run_element(run, text.into_owned());
        }

        let mut children = Vec::new();
        if let Some(props) = &run.props {
            children.push(XmlNode::Element(props.clone()));
        }
        let br = format!("{}br", run.tag.prefix());
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                children.push(XmlNode::Element(XmlElement::new(br.as_str())));
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            if !line.is_empty() {
                children.push(XmlNode::Element(text_element(run.text.clone(), line.to_string())));
            }
        }
        run.tag.element(children)
    }

    #[inline]
    fn location(&self, token: &Token) -> Location {
        Location::paragraph(self.part, token.paragraph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::xml::XmlDocument;
    use crate::template::compile::compile_story;
    use crate::template::scanner::Scanner;

    const PART: &str = "word/document.xml";

    fn compile(body: &str) -> Part {
        let xml = format!(
            r#"<w:document xmlns:w="w"><w:body>{}</w:body></w:document>"#,
            body
        );
        let mut part = Part::from_document(XmlDocument::parse(xml.as_bytes()).unwrap());
        let scanner = Scanner::new("{{", "}}", PART);
        part.try_for_each_story_mut(&mut |blocks: &mut Vec<Block>| {
            scanner.scan_blocks(blocks)?;
            compile_story(blocks, PART).map(|_| ())
        })
        .unwrap();
        part
    }

    fn render_with(body: &str, data: &Value, options: &TemplateOptions) -> Result<String> {
        let part = compile(body);
        let doc = Renderer::new(options, PART).render(&part, data)?;
        Ok(doc.root.to_xml())
    }

    fn render(body: &str, data: &Value) -> String {
        render_with(body, data, &TemplateOptions::default()).unwrap()
    }

    fn text(body: &str, data: &Value) -> String {
        let xml = render(body, data);
        XmlDocument::parse(xml.as_bytes()).unwrap().root.text()
    }

    #[test]
    fn test_scalar_keeps_run_formatting() {
        let data = Value::map([("name", Value::from("Ada"))]);
        let out = render(r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>{{name}}</w:t></w:r></w:p>"#, &data);
        assert!(out.contains("<w:r><w:rPr><w:b/></w:rPr><w:t>Ada</w:t></w:r>"), "{out}");
    }

    #[test]
    fn test_escaping_and_line_breaks() {
        let data = Value::map([("note", Value::from("a < b\nc & d"))]);
        let out = render(r#"<w:p><w:r><w:t>{{note}}</w:t></w:r></w:p>"#, &data);
        assert!(out.contains("<w:t>a &lt; b</w:t><w:br/><w:t>c &amp; d</w:t>"), "{out}");

        let options = TemplateOptions::default().with_line_breaks(false);
        let out = render_with(r#"<w:p><w:r><w:t>{{note}}</w:t></w:r></w:p>"#, &data, &options).unwrap();
        assert!(!out.contains("<w:br/>"));
    }

    #[test]
    fn test_invalid_chars_stripped() {
        let data = Value::map([("v", Value::from("a\u{1}b"))]);
        assert_eq!(text(r#"<w:p><w:r><w:t>{{v}}</w:t></w:r></w:p>"#, &data), "ab");
    }

    #[test]
    fn test_list_repeats_paragraphs_with_variables() {
        let data = Value::map([(
            "items",
            Value::List(vec![
                Value::map([("sku", Value::from("A"))]),
                Value::map([("sku", Value::from("B"))]),
            ]),
        )]);
        let body = concat!(
            r#"<w:p><w:r><w:t>{{#items}}</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>{{@number}}. {{sku}}{{#@last}}!{{/@last}};</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>{{/items}}</w:t></w:r></w:p>"#
        );
        assert_eq!(text(body, &data), "1. A;2. B!;");
    }

    #[test]
    fn test_absent_null_and_false_render_nothing() {
        let body = r#"<w:p><w:r><w:t>[{{#x}}shown{{/x}}]</w:t></w:r></w:p>"#;
        assert_eq!(text(body, &Value::map::<&str, _>([])), "[]");
        assert_eq!(text(body, &Value::map([("x", Value::Null)])), "[]");
        assert_eq!(text(body, &Value::map([("x", Value::Bool(false))])), "[]");
        assert_eq!(text(body, &Value::map([("x", Value::Bool(true))])), "[shown]");
        assert_eq!(text(body, &Value::map([("x", Value::List(vec![]))])), "[]");
    }

    #[test]
    fn test_map_block_binds_current() {
        let data = Value::map([("customer", Value::map([("name", Value::from("Ada"))]))]);
        let body = r#"<w:p><w:r><w:t>{{#customer}}{{name}}/{{this.name}}{{/customer}}</w:t></w:r></w:p>"#;
        assert_eq!(text(body, &data), "Ada/Ada");
    }

    #[test]
    fn test_strict_unresolved_path() {
        let data = Value::map([("invoice", Value::map([("customer", Value::map::<&str, _>([]))]))]);
        let body = r#"<w:p/><w:p><w:r><w:t>Tel: {{invoice.customer.phone}}</w:t></w:r></w:p>"#;
        assert_eq!(text(body, &data), "Tel: ");

        let strict = TemplateOptions::default().with_strict(true);
        match render_with(body, &data, &strict) {
            Err(Error::UnresolvedPath { path, token, location }) => {
                assert_eq!(path, "invoice.customer.phone");
                assert_eq!(token, "{{invoice.customer.phone}}");
                assert_eq!(location, Location::paragraph(PART, 2));
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatches() {
        let data = Value::map([("items", Value::List(vec![Value::from(1)])), ("n", Value::from(3))]);
        let scalar = render_with(
            r#"<w:p><w:r><w:t>{{items}}</w:t></w:r></w:p>"#,
            &data,
            &TemplateOptions::default(),
        );
        assert!(matches!(scalar, Err(Error::TypeMismatch { .. })));

        let block = render_with(
            r#"<w:p><w:r><w:t>{{#n}}x{{/n}}</w:t></w:r></w:p>"#,
            &data,
            &TemplateOptions::default(),
        );
        assert!(matches!(block, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_format_error_at_render() {
        let data = Value::map([("d", Value::from("not a date"))]);
        let result = render_with(
            r#"<w:p><w:r><w:t>{{d | yyyy-MM-dd}}</w:t></w:r></w:p>"#,
            &data,
            &TemplateOptions::default(),
        );
        match result {
            Err(Error::Format { token, spec, .. }) => {
                assert_eq!(token, "{{d | yyyy-MM-dd}}");
                assert_eq!(spec, "yyyy-MM-dd");
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_render_leaves_compiled_part_untouched() {
        let part = compile(r#"<w:p><w:r><w:t>{{name}}</w:t></w:r></w:p>"#);
        let before = part.clone();
        let options = TemplateOptions::default();
        let renderer = Renderer::new(&options, PART);
        renderer.render(&part, &Value::map([("name", Value::from("x"))])).unwrap();
        assert_eq!(part, before);
    }
}
