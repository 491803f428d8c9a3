//! Placeholder recognition across run boundaries.
//!
//! Word splits text into runs wherever formatting, spell-check state or edit
//! history changes, so `{{name}}` can arrive as `{{`, `na`, `me}}` in three
//! runs. The scanner concatenates the text of all runs of one inline list,
//! finds the placeholders in that string, and rebuilds the list so that each
//! placeholder becomes exactly one [`Field`] or [`Marker`]:
//!
//! - text before and after a placeholder stays in runs with the formatting
//!   of the run it came from;
//! - the placeholder adopts the formatting of the run holding its first
//!   character;
//! - run content inside a placeholder (tabs, breaks) is dropped, while
//!   non-run markup inside it (bookmarks, proofing marks, empty runs) is
//!   moved after it.
//!
//! Inline wrappers such as hyperlinks are scanned on their own; a placeholder
//! must not straddle their boundary.
use crate::common::{Error, Location, Result};
use crate::ooxml::docx::body::{
    Block, Field, Inline, Marker, RowItem, Run, RunContent, TableItem, Tag, Text, TokenRun,
};
use crate::ooxml::docx::xml::XmlElement;
use crate::template::format::FormatSpec;
use crate::template::token::{Token, TokenKind};
use memchr::memmem;
use std::mem;
use std::ops::Range;
use tracing::warn;

/// Finds and normalizes placeholders in the paragraphs of one part.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    open: &'a str,
    close: &'a str,
    part: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(open: &'a str, close: &'a str, part: &'a str) -> Self {
        Self { open, close, part }
    }

    /// Normalize every paragraph reachable from `blocks`; returns the number
    /// of placeholders found.
    pub fn scan_blocks(&self, blocks: &mut [Block]) -> Result<usize> {
        let mut found = 0;
        for block in blocks {
            match block {
                Block::Paragraph(p) => {
                    let inlines = mem::take(&mut p.inlines);
                    p.inlines = self.normalize(inlines, p.ordinal, &mut found)?;
                },
                Block::Table(table) => {
                    for item in &mut table.items {
                        let TableItem::Row(row) = item else { continue };
                        for cell in &mut row.items {
                            if let RowItem::Cell(cell) = cell {
                                found += self.scan_blocks(&mut cell.blocks)?;
                            }
                        }
                    }
                },
                Block::Sdt(sdt) => found += self.scan_blocks(&mut sdt.blocks)?,
                Block::Repeat(_) | Block::Other(_) => {},
            }
        }
        Ok(found)
    }

    /// Normalize one inline list of paragraph `paragraph`.
    pub fn normalize(&self, inlines: Vec<Inline>, paragraph: usize, found: &mut usize) -> Result<Vec<Inline>> {
        // Wrappers first: each one is its own scan unit
        let mut items = Vec::with_capacity(inlines.len());
        for inline in inlines {
            items.push(match inline {
                Inline::Group(mut group) => {
                    let nested = mem::take(&mut group.inlines);
                    group.inlines = self.normalize(nested, paragraph, found)?;
                    Inline::Group(group)
                },
                other => other,
            });
        }

        let text = run_text(&items);
        let tokens = self.find_tokens(&text, paragraph)?;
        if tokens.is_empty() {
            return Ok(items);
        }
        *found += tokens.len();

        let mut rebuild = Rebuild {
            scanner: self,
            paragraph,
            tokens: &tokens,
            next: 0,
            active: None,
            deferred: Vec::new(),
            out: Vec::with_capacity(items.len() + tokens.len()),
        };
        let mut pos = 0;
        for inline in items {
            match inline {
                Inline::Run(run) => {
                    let len = run_len(&run);
                    let touches = rebuild.active.is_some()
                        || tokens.get(rebuild.next).is_some_and(|t| t.start < pos + len);
                    if !touches {
                        rebuild.out.push(Inline::Run(run));
                    } else if len == 0 {
                        rebuild.deferred.push(Inline::Run(run));
                    } else {
                        rebuild.split_run(run, pos)?;
                    }
                    pos += len;
                },
                other if rebuild.active.is_some() => rebuild.deferred.push(other),
                other => rebuild.out.push(other),
            }
        }

        if let Some(active) = rebuild.active {
            return Err(Error::malformed(
                format!("unterminated placeholder '{}'", active.text),
                Location::paragraph(self.part, paragraph),
            ));
        }
        Ok(rebuild.out)
    }

    /// Byte ranges of all placeholders in `text`, delimiters included.
    fn find_tokens(&self, text: &str, paragraph: usize) -> Result<Vec<Range<usize>>> {
        let mut tokens = Vec::new();
        let mut from = 0;
        while let Some(offset) = memmem::find(&text.as_bytes()[from..], self.open.as_bytes()) {
            let start = from + offset;
            let inner = start + self.open.len();
            let Some(len) = memmem::find(&text.as_bytes()[inner..], self.close.as_bytes()) else {
                let preview: String = text[start..].chars().take(40).collect();
                return Err(Error::malformed(
                    format!("placeholder '{}' has no closing '{}'", preview, self.close),
                    Location::paragraph(self.part, paragraph),
                ));
            };
            let end = inner + len + self.close.len();
            tokens.push(start..end);
            from = end;
        }
        Ok(tokens)
    }

    /// Parse a complete placeholder text into a field or marker.
    fn compile_token(&self, source: &str, run: TokenRun, paragraph: usize) -> Result<Inline> {
        let location = || Location::paragraph(self.part, paragraph);
        let inner = &source[self.open.len()..source.len() - self.close.len()];
        let token = Token::parse(source, inner, paragraph).map_err(|e| Error::malformed(e, location()))?;

        if token.kind != TokenKind::Scalar {
            return Ok(Inline::Marker(Marker { run, token }));
        }
        let format = match token.format.as_deref() {
            Some(spec) => Some(FormatSpec::parse(spec).map_err(|e| Error::Format {
                token: token.source.clone(),
                spec: e.spec,
                reason: e.reason,
                location: location(),
            })?),
            None => None,
        };
        Ok(Inline::Field(Field { run, token, format }))
    }
}

/// A placeholder being collected from one or more runs.
struct Active {
    run: TokenRun,
    text: String,
    end: usize,
}

struct Rebuild<'s, 'a> {
    scanner: &'s Scanner<'a>,
    paragraph: usize,
    tokens: &'s [Range<usize>],
    next: usize,
    active: Option<Active>,
    /// Non-text content met inside the current placeholder
    deferred: Vec<Inline>,
    out: Vec<Inline>,
}

impl Rebuild<'_, '_> {
    /// Split a run that overlaps at least one placeholder; `pos` is the
    /// offset of its first character in the scanned text.
    fn split_run(&mut self, run: Run, pos: usize) -> Result<()> {
        let Run { tag, props, content } = run;
        let tokens = self.tokens;
        let mut outside: Vec<RunContent> = Vec::new();
        let mut offset = pos;

        for item in content {
            let text = match item {
                RunContent::Text(text) => text,
                RunContent::Other(node) => {
                    match &self.active {
                        None => outside.push(RunContent::Other(node)),
                        Some(active) => warn!(
                            part = self.scanner.part,
                            paragraph = self.paragraph,
                            element = node.as_element().map_or("text", |e| e.local_name()),
                            placeholder = %active.text,
                            "dropped run content inside a placeholder"
                        ),
                    }
                    continue;
                },
            };

            let Text { tag: text_tag, value } = text;
            let len = value.len();
            let mut local = 0;
            while local < len {
                if let Some(active) = &mut self.active {
                    let take = (active.end - offset).min(len);
                    active.text.push_str(&value[local..take]);
                    local = take;
                    if offset + local == active.end {
                        self.finish_token()?;
                    }
                } else if let Some(token) = tokens.get(self.next).filter(|t| t.start < offset + len) {
                    let start = token.start - offset;
                    if start > local {
                        outside.push(RunContent::Text(Text {
                            tag: text_tag.clone(),
                            value: value[local..start].to_string(),
                        }));
                    }
                    self.flush(&tag, &props, &mut outside);
                    self.active = Some(Active {
                        run: TokenRun {
                            tag: tag.clone(),
                            props: props.clone(),
                            text: text_tag.clone(),
                        },
                        text: String::with_capacity(token.len()),
                        end: token.end,
                    });
                    self.next += 1;
                    local = start;
                } else {
                    outside.push(RunContent::Text(Text {
                        tag: text_tag.clone(),
                        value: value[local..].to_string(),
                    }));
                    local = len;
                }
            }
            offset += len;
        }

        self.flush(&tag, &props, &mut outside);
        Ok(())
    }

    /// Emit the run pieces collected outside placeholders as one run.
    fn flush(&mut self, tag: &Tag, props: &Option<XmlElement>, outside: &mut Vec<RunContent>) {
        if outside.is_empty() {
            return;
        }
        self.out.push(Inline::Run(Run {
            tag: tag.clone(),
            props: props.clone(),
            content: mem::take(outside),
        }));
    }

    fn finish_token(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };
        let inline = self
            .scanner
            .compile_token(&active.text, active.run, self.paragraph)?;
        self.out.push(inline);
        self.out.append(&mut self.deferred);
        Ok(())
    }
}

fn run_len(run: &Run) -> usize {
    run.content
        .iter()
        .map(|c| match c {
            RunContent::Text(t) => t.value.len(),
            RunContent::Other(_) => 0,
        })
        .sum()
}

/// Text of the runs directly in `inlines`; wrappers are not included.
fn run_text(inlines: &[Inline]) -> String {
    let mut text = String::new();
    for inline in inlines {
        if let Inline::Run(run) = inline {
            for content in &run.content {
                if let RunContent::Text(t) = content {
                    text.push_str(&t.value);
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::body::Part;
    use crate::ooxml::docx::xml::XmlDocument;

    fn paragraph(inner: &str) -> Vec<Inline> {
        let xml = format!(
            "<w:document xmlns:w=\"w\"><w:body><w:p>{}</w:p></w:body></w:document>",
            inner
        );
        let part = Part::from_document(XmlDocument::parse(xml.as_bytes()).unwrap());
        let mut inlines = Vec::new();
        part.for_each_story(&mut |blocks| {
            if let Some(Block::Paragraph(p)) = blocks.first() {
                inlines = p.inlines.clone();
            }
        });
        inlines
    }

    fn scan(inner: &str) -> Result<Vec<Inline>> {
        let mut found = 0;
        Scanner::new("{{", "}}", "word/document.xml").normalize(paragraph(inner), 1, &mut found)
    }

    #[test]
    fn test_single_run() {
        let out = scan("<w:r><w:t xml:space=\"preserve\">Hello {{name}}!</w:t></w:r>").unwrap();
        assert_eq!(out.len(), 3);
        let Inline::Run(before) = &out[0] else { panic!("{:?}", out[0]) };
        assert_eq!(before.text(), "Hello ");
        let Inline::Field(field) = &out[1] else { panic!("{:?}", out[1]) };
        assert_eq!(field.token.path.as_str(), "name");
        assert_eq!(field.token.source, "{{name}}");
        let Inline::Run(after) = &out[2] else { panic!("{:?}", out[2]) };
        assert_eq!(after.text(), "!");
    }

    #[test]
    fn test_split_across_runs_takes_first_formatting() {
        let out = scan(concat!(
            "<w:r><w:rPr><w:b/></w:rPr><w:t>Dear {</w:t></w:r>",
            "<w:proofErr w:type=\"spellStart\"/>",
            "<w:r><w:rPr><w:i/></w:rPr><w:t>{na</w:t></w:r>",
            "<w:r><w:t>me}}, hi</w:t></w:r>",
        ))
        .unwrap();

        let kinds: Vec<&str> = out
            .iter()
            .map(|i| match i {
                Inline::Run(_) => "run",
                Inline::Field(_) => "field",
                Inline::Other(_) => "other",
                _ => "?",
            })
            .collect();
        assert_eq!(kinds, ["run", "field", "other", "run"]);

        let Inline::Field(field) = &out[1] else { unreachable!() };
        assert_eq!(field.token.source, "{{name}}");
        let props = field.run.props.as_ref().unwrap();
        assert!(props.elements().any(|e| e.is("b")));

        let Inline::Run(tail) = &out[3] else { unreachable!() };
        assert_eq!(tail.text(), ", hi");
        assert!(tail.props.is_none());
    }

    #[test]
    fn test_markers_and_formats() {
        let out = scan("<w:r><w:t>{{#items}}{{price|%.2f}}{{/items}}</w:t></w:r>").unwrap();
        assert_eq!(out.len(), 3);
        assert!(matches!(&out[0], Inline::Marker(m) if m.token.kind == TokenKind::BlockStart));
        let Inline::Field(field) = &out[1] else { unreachable!() };
        assert_eq!(field.format.as_ref().map(|f| f.as_str()), Some("%.2f"));
        assert!(matches!(&out[2], Inline::Marker(m) if m.token.kind == TokenKind::BlockEnd));
    }

    #[test]
    fn test_hyperlink_is_scanned_separately() {
        let out = scan("<w:hyperlink><w:r><w:t>{{url}}</w:t></w:r></w:hyperlink><w:r><w:t>x</w:t></w:r>")
            .unwrap();
        let Inline::Group(group) = &out[0] else { panic!() };
        assert!(matches!(group.inlines[0], Inline::Field(_)));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            scan("<w:r><w:t>{{name</w:t></w:r>"),
            Err(Error::MalformedTemplate { .. })
        ));
        assert!(matches!(
            scan("<w:r><w:t>{{a b}}</w:t></w:r>"),
            Err(Error::MalformedTemplate { .. })
        ));
        let err = scan("<w:r><w:t>{{total|%.2q}}</w:t></w:r>").unwrap_err();
        let Error::Format { token, spec, location, .. } = err else { panic!("{:?}", err) };
        assert_eq!(token, "{{total|%.2q}}");
        assert_eq!(spec, "%.2q");
        assert_eq!(location.paragraph, Some(1));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_content_inside_placeholder_is_dropped_with_warning() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let out = tracing::subscriber::with_default(subscriber, || {
            scan("<w:r><w:t>{{na</w:t><w:tab/><w:t>me}} done</w:t></w:r>")
        })
        .unwrap();
        assert!(matches!(&out[0], Inline::Field(f) if f.token.source == "{{name}}"));
        let Inline::Run(tail) = &out[1] else { panic!("{:?}", out[1]) };
        assert_eq!(tail.text(), " done");
        assert!(!tail.content.iter().any(|c| matches!(c, RunContent::Other(_))));

        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("WARN"), "{log}");
        assert!(log.contains("dropped run content inside a placeholder"), "{log}");
        assert!(log.contains("element=\"tab\"") || log.contains("element=tab"), "{log}");
    }

    #[test]
    fn test_text_without_tokens_is_untouched() {
        let input = paragraph("<w:r><w:t>a}}b</w:t></w:r><w:r><w:tab/></w:r>");
        let mut found = 0;
        let out = Scanner::new("{{", "}}", "p")
            .normalize(input.clone(), 1, &mut found)
            .unwrap();
        assert_eq!(out, input);
        assert_eq!(found, 0);
    }
}
