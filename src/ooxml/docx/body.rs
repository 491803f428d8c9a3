//! Typed body model for WordprocessingML stories.
//!
//! A part is read into a generic [`XmlDocument`] first; every story container
//! in it (`w:body`, `w:hdr`, `w:ftr`, `w:footnote`, `w:endnote`, `w:comment`)
//! is then lifted into blocks, paragraphs, runs and tables. Everything the
//! engine does not need to understand (paragraph and run properties, drawings,
//! bookmarks, section properties) stays an opaque [`XmlNode`] and is written
//! back verbatim.
//!
//! The same tree carries compiled template nodes: [`Field`], [`Marker`] and
//! [`Repeat`]. [`Part::into_document`] serializes a tree without merging,
//! turning fields and markers back into their placeholder text.
use crate::ooxml::docx::xml::{Attribute, XmlDocument, XmlElement, XmlNode, local_name};
use crate::template::format::FormatSpec;
use crate::template::token::Token;

/// Elements whose children are a sequence of blocks.
const STORY_ELEMENTS: [&str; 6] = ["body", "hdr", "ftr", "footnote", "endnote", "comment"];

/// Inline wrappers whose children are themselves inline content.
const INLINE_GROUPS: [&str; 10] = [
    "hyperlink",
    "ins",
    "moveTo",
    "smartTag",
    "customXml",
    "sdt",
    "sdtContent",
    "fldSimple",
    "bdo",
    "dir",
];

/// An element's name and attributes, without its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attrs: Vec<Attribute>,
}

impl Tag {
    /// Split an element into its tag and its children.
    pub fn split(element: XmlElement) -> (Tag, Vec<XmlNode>) {
        let XmlElement {
            name,
            attrs,
            children,
        } = element;
        (Tag { name, attrs }, children)
    }

    /// A tag with no attributes.
    pub fn named<S: Into<String>>(name: S) -> Self {
        Tag {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Build an element with this tag around `children`.
    pub fn element(&self, children: Vec<XmlNode>) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            attrs: self.attrs.clone(),
            children,
        }
    }

    /// Consuming variant of [`Tag::element`].
    pub fn into_element(self, children: Vec<XmlNode>) -> XmlElement {
        XmlElement {
            name: self.name,
            attrs: self.attrs,
            children,
        }
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix including the colon.
    pub fn prefix(&self) -> &str {
        match self.name.find(':') {
            Some(pos) => &self.name[..=pos],
            None => "",
        }
    }
}

/// A whole part: the generic element skeleton around its stories.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub declaration: Option<String>,
    pub prolog: Vec<XmlNode>,
    pub root: Container,
    pub epilog: Vec<XmlNode>,
}

/// An element that is either a story or leads to stories.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub tag: Tag,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Content of a non-story element
    Nodes(Vec<PartNode>),
    /// Content of a story element
    Story(Vec<Block>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartNode {
    Container(Container),
    Node(XmlNode),
}

/// Block-level content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Sdt(BlockSdt),
    Repeat(Repeat<Block>),
    Other(XmlNode),
}

/// A `w:p`.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub tag: Tag,
    pub inlines: Vec<Inline>,
    /// 1-based position among all paragraphs of the part
    pub ordinal: usize,
    /// Set when the paragraph only delimits a repeated region and is not output
    pub elided: bool,
}

/// A `w:tbl`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub tag: Tag,
    pub items: Vec<TableItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableItem {
    Row(Row),
    Repeat(Repeat<TableItem>),
    Other(XmlNode),
}

/// A `w:tr`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub tag: Tag,
    pub items: Vec<RowItem>,
    /// Set when the row only delimits a repeated region and is not output
    pub elided: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowItem {
    Cell(Cell),
    Other(XmlNode),
}

/// A `w:tc`; its content is body-like.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub tag: Tag,
    pub blocks: Vec<Block>,
}

/// A block-level content control (`w:sdt` with a `w:sdtContent`).
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSdt {
    pub tag: Tag,
    pub before: Vec<XmlNode>,
    pub content: Tag,
    pub blocks: Vec<Block>,
    pub after: Vec<XmlNode>,
}

/// Paragraph-level content.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Group(Group),
    Field(Field),
    Marker(Marker),
    Repeat(Repeat<Inline>),
    Other(XmlNode),
}

/// A `w:r`.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub tag: Tag,
    /// The leading `w:rPr`, copied verbatim
    pub props: Option<XmlElement>,
    pub content: Vec<RunContent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(Text),
    Other(XmlNode),
}

/// A `w:t` with its unescaped value.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub tag: Tag,
    pub value: String,
}

/// An inline wrapper such as `w:hyperlink` or `w:ins`.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub tag: Tag,
    pub inlines: Vec<Inline>,
}

/// The run a placeholder was normalized into.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRun {
    pub tag: Tag,
    pub props: Option<XmlElement>,
    pub text: Tag,
}

/// A scalar placeholder; rendered as one run with the first source run's formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub run: TokenRun,
    pub token: Token,
    /// The token's format specifier, parsed when the template is loaded
    pub format: Option<FormatSpec>,
}

/// A block start or end marker; renders as nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub run: TokenRun,
    pub token: Token,
}

/// A region repeated once per element of the value bound to `token`.
#[derive(Debug, Clone, PartialEq)]
pub struct Repeat<T> {
    pub token: Token,
    pub body: Vec<T>,
}

impl Run {
    /// Text of all `w:t` children.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                RunContent::Text(t) => Some(t.value.as_str()),
                RunContent::Other(_) => None,
            })
            .collect()
    }
}

impl Paragraph {
    /// Visible text, including text inside inline wrappers.
    pub fn text(&self) -> String {
        let mut out = String::new();
        inline_text(&self.inlines, &mut out);
        out
    }
}

fn inline_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Run(run) => out.push_str(&run.text()),
            Inline::Group(group) => inline_text(&group.inlines, out),
            Inline::Field(f) => out.push_str(&f.token.source),
            Inline::Marker(m) => out.push_str(&m.token.source),
            Inline::Repeat(r) => inline_text(&r.body, out),
            Inline::Other(_) => {},
        }
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

impl Part {
    /// Lift a parsed part into the typed model.
    pub fn from_document(doc: XmlDocument) -> Part {
        let mut reader = ModelReader { paragraphs: 0 };
        Part {
            declaration: doc.declaration,
            prolog: doc.prolog,
            root: reader.container(doc.root),
            epilog: doc.epilog,
        }
    }

    /// Number of paragraphs in the part.
    pub fn paragraph_count(&self) -> usize {
        let mut count = 0;
        self.for_each_story(&mut |blocks| count += count_paragraphs(blocks));
        count
    }

    /// Visit every story's blocks in document order.
    pub fn for_each_story(&self, f: &mut impl FnMut(&[Block])) {
        fn visit(container: &Container, f: &mut impl FnMut(&[Block])) {
            match &container.content {
                Content::Story(blocks) => f(blocks),
                Content::Nodes(nodes) => {
                    for node in nodes {
                        if let PartNode::Container(c) = node {
                            visit(c, f);
                        }
                    }
                },
            }
        }
        visit(&self.root, f);
    }

    /// Visit every story's blocks mutably, in document order.
    pub fn try_for_each_story_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Vec<Block>) -> Result<(), E>,
    ) -> Result<(), E> {
        fn visit<E>(
            container: &mut Container,
            f: &mut impl FnMut(&mut Vec<Block>) -> Result<(), E>,
        ) -> Result<(), E> {
            match &mut container.content {
                Content::Story(blocks) => f(blocks),
                Content::Nodes(nodes) => {
                    for node in nodes {
                        if let PartNode::Container(c) = node {
                            visit(c, f)?;
                        }
                    }
                    Ok(())
                },
            }
        }
        visit(&mut self.root, f)
    }
}

fn count_paragraphs(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(_) => 1,
            Block::Table(t) => t.items.iter().map(count_table_item).sum(),
            Block::Sdt(sdt) => count_paragraphs(&sdt.blocks),
            Block::Repeat(r) => count_paragraphs(&r.body),
            Block::Other(_) => 0,
        })
        .sum()
}

fn count_table_item(item: &TableItem) -> usize {
    match item {
        TableItem::Row(row) => row
            .items
            .iter()
            .map(|c| match c {
                RowItem::Cell(cell) => count_paragraphs(&cell.blocks),
                RowItem::Other(_) => 0,
            })
            .sum(),
        TableItem::Repeat(r) => r.body.iter().map(count_table_item).sum(),
        TableItem::Other(_) => 0,
    }
}

struct ModelReader {
    paragraphs: usize,
}

impl ModelReader {
    fn container(&mut self, element: XmlElement) -> Container {
        let is_story = STORY_ELEMENTS.contains(&element.local_name());
        let (tag, children) = Tag::split(element);
        let content = if is_story {
            Content::Story(self.blocks(children))
        } else {
            Content::Nodes(
                children
                    .into_iter()
                    .map(|node| match node {
                        XmlNode::Element(el) => PartNode::Container(self.container(el)),
                        other => PartNode::Node(other),
                    })
                    .collect(),
            )
        };
        Container { tag, content }
    }

    fn blocks(&mut self, nodes: Vec<XmlNode>) -> Vec<Block> {
        nodes.into_iter().map(|node| self.block(node)).collect()
    }

    fn block(&mut self, node: XmlNode) -> Block {
        let XmlNode::Element(el) = node else {
            return Block::Other(node);
        };
        match el.local_name() {
            "p" => {
                self.paragraphs += 1;
                let ordinal = self.paragraphs;
                let (tag, children) = Tag::split(el);
                Block::Paragraph(Paragraph {
                    tag,
                    inlines: self.inlines(children),
                    ordinal,
                    elided: false,
                })
            },
            "tbl" => {
                let (tag, children) = Tag::split(el);
                let items = children.into_iter().map(|n| self.table_item(n)).collect();
                Block::Table(Table { tag, items })
            },
            "sdt" if el.elements().any(|c| c.is("sdtContent")) => self.block_sdt(el),
            _ => Block::Other(XmlNode::Element(el)),
        }
    }

    fn block_sdt(&mut self, el: XmlElement) -> Block {
        let (tag, children) = Tag::split(el);
        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut content = None;
        for child in children {
            match child {
                XmlNode::Element(c) if content.is_none() && c.is("sdtContent") => {
                    let (content_tag, nodes) = Tag::split(c);
                    content = Some((content_tag, self.blocks(nodes)));
                },
                other if content.is_none() => before.push(other),
                other => after.push(other),
            }
        }
        let (content, blocks) = content.unwrap_or_else(|| (Tag::named("w:sdtContent"), Vec::new()));
        Block::Sdt(BlockSdt {
            tag,
            before,
            content,
            blocks,
            after,
        })
    }

    fn table_item(&mut self, node: XmlNode) -> TableItem {
        match node {
            XmlNode::Element(el) if el.is("tr") => {
                let (tag, children) = Tag::split(el);
                let items = children
                    .into_iter()
                    .map(|n| match n {
                        XmlNode::Element(c) if c.is("tc") => {
                            let (tag, children) = Tag::split(c);
                            RowItem::Cell(Cell {
                                tag,
                                blocks: self.blocks(children),
                            })
                        },
                        other => RowItem::Other(other),
                    })
                    .collect();
                TableItem::Row(Row {
                    tag,
                    items,
                    elided: false,
                })
            },
            other => TableItem::Other(other),
        }
    }

    fn inlines(&mut self, nodes: Vec<XmlNode>) -> Vec<Inline> {
        nodes.into_iter().map(|node| self.inline(node)).collect()
    }

    fn inline(&mut self, node: XmlNode) -> Inline {
        let XmlNode::Element(el) = node else {
            return Inline::Other(node);
        };
        if el.is("r") {
            return Inline::Run(read_run(el));
        }
        if INLINE_GROUPS.contains(&el.local_name()) {
            let (tag, children) = Tag::split(el);
            return Inline::Group(Group {
                tag,
                inlines: self.inlines(children),
            });
        }
        Inline::Other(XmlNode::Element(el))
    }
}

fn read_run(el: XmlElement) -> Run {
    let (tag, children) = Tag::split(el);
    let mut children = children.into_iter().peekable();
    let has_props = matches!(children.peek(), Some(XmlNode::Element(first)) if first.is("rPr"));
    let props = match has_props.then(|| children.next()).flatten() {
        Some(XmlNode::Element(props)) => Some(props),
        _ => None,
    };
    let content = children
        .map(|node| match node {
            XmlNode::Element(t) if t.is("t") => {
                let value = t.text();
                let (tag, _) = Tag::split(t);
                RunContent::Text(Text { tag, value })
            },
            other => RunContent::Other(other),
        })
        .collect();
    Run {
        tag,
        props,
        content,
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

impl Part {
    /// Serialize without merging: fields and markers are written back as
    /// their placeholder text and repeated regions appear once.
    pub fn into_document(self) -> XmlDocument {
        XmlDocument {
            declaration: self.declaration,
            prolog: self.prolog,
            root: container_into_element(self.root),
            epilog: self.epilog,
        }
    }
}

fn container_into_element(container: Container) -> XmlElement {
    let children = match container.content {
        Content::Nodes(nodes) => nodes
            .into_iter()
            .map(|n| match n {
                PartNode::Container(c) => XmlNode::Element(container_into_element(c)),
                PartNode::Node(node) => node,
            })
            .collect(),
        Content::Story(blocks) => {
            let mut out = Vec::with_capacity(blocks.len());
            push_blocks(blocks, &mut out);
            out
        },
    };
    container.tag.into_element(children)
}

fn push_blocks(blocks: Vec<Block>, out: &mut Vec<XmlNode>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => {
                let mut children = Vec::with_capacity(p.inlines.len());
                push_inlines(p.inlines, &mut children);
                out.push(XmlNode::Element(p.tag.into_element(children)));
            },
            Block::Table(t) => {
                let mut children = Vec::with_capacity(t.items.len());
                push_table_items(t.items, &mut children);
                out.push(XmlNode::Element(t.tag.into_element(children)));
            },
            Block::Sdt(sdt) => {
                let mut inner = Vec::with_capacity(sdt.blocks.len());
                push_blocks(sdt.blocks, &mut inner);
                let mut children = sdt.before;
                children.push(XmlNode::Element(sdt.content.into_element(inner)));
                children.extend(sdt.after);
                out.push(XmlNode::Element(sdt.tag.into_element(children)));
            },
            Block::Repeat(r) => push_blocks(r.body, out),
            Block::Other(node) => out.push(node),
        }
    }
}

fn push_table_items(items: Vec<TableItem>, out: &mut Vec<XmlNode>) {
    for item in items {
        match item {
            TableItem::Row(row) => {
                let children = row
                    .items
                    .into_iter()
                    .map(|c| match c {
                        RowItem::Cell(cell) => {
                            let mut blocks = Vec::with_capacity(cell.blocks.len());
                            push_blocks(cell.blocks, &mut blocks);
                            XmlNode::Element(cell.tag.into_element(blocks))
                        },
                        RowItem::Other(node) => node,
                    })
                    .collect();
                out.push(XmlNode::Element(row.tag.into_element(children)));
            },
            TableItem::Repeat(r) => push_table_items(r.body, out),
            TableItem::Other(node) => out.push(node),
        }
    }
}

fn push_inlines(inlines: Vec<Inline>, out: &mut Vec<XmlNode>) {
    for inline in inlines {
        match inline {
            Inline::Run(run) => out.push(XmlNode::Element(run_into_element(run))),
            Inline::Group(g) => {
                let mut children = Vec::with_capacity(g.inlines.len());
                push_inlines(g.inlines, &mut children);
                out.push(XmlNode::Element(g.tag.into_element(children)));
            },
            Inline::Field(Field { run, token, .. }) | Inline::Marker(Marker { run, token }) => {
                out.push(XmlNode::Element(token_run_element(&run, token.source)));
            },
            Inline::Repeat(r) => push_inlines(r.body, out),
            Inline::Other(node) => out.push(node),
        }
    }
}

fn run_into_element(run: Run) -> XmlElement {
    let mut children = Vec::with_capacity(run.content.len() + 1);
    if let Some(props) = run.props {
        children.push(XmlNode::Element(props));
    }
    for content in run.content {
        children.push(match content {
            RunContent::Text(t) => XmlNode::Element(text_element(t.tag, t.value)),
            RunContent::Other(node) => node,
        });
    }
    run.tag.into_element(children)
}

impl Run {
    /// Serialize a copy of this run.
    pub fn to_element(&self) -> XmlElement {
        run_into_element(self.clone())
    }
}

/// A `w:t` holding `value`, with `xml:space="preserve"` set exactly when
/// leading or trailing whitespace would otherwise be dropped by readers.
pub fn text_element(tag: Tag, value: String) -> XmlElement {
    let mut element = tag.into_element(Vec::new());
    let needs_preserve = value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace);
    if needs_preserve {
        element.set_attr("xml:space", "preserve");
    }
    if !value.is_empty() {
        element.children.push(XmlNode::Text(value));
    }
    element
}

/// A run with the token run's formatting and `text` as its only content.
pub fn token_run_element(run: &TokenRun, text: String) -> XmlElement {
    let mut children = Vec::with_capacity(2);
    if let Some(props) = &run.props {
        children.push(XmlNode::Element(props.clone()));
    }
    children.push(XmlNode::Element(text_element(run.text.clone(), text)));
    run.tag.element(children)
}
