//! Turning block markers into repeated regions.
//!
//! After scanning, block start and end markers sit at arbitrary depths of a
//! story. Each marker gets an address (the path of child indices from the
//! story down to the marker), markers are paired with a stack, and the common
//! prefix of a pair's addresses decides what the region repeats:
//!
//! | both markers in                         | repeated unit              |
//! |-----------------------------------------|----------------------------|
//! | the same inline list                    | the inlines between them   |
//! | paragraphs of the same block list       | those paragraphs           |
//! | rows (or cells of one row) of a table   | those rows                 |
//! | one paragraph holding a whole table row | that row                   |
//!
//! Delimiter rows and paragraphs that hold nothing but markers are elided
//! from the output. Finally the regions of each list are nested into
//! [`Repeat`] nodes, innermost lists first, so that wrapping never shifts an
//! address that is still needed.
use crate::common::{Error, Location, Result};
use crate::ooxml::docx::body::{Block, Inline, Paragraph, Repeat, Row, RowItem, RunContent, TableItem};
use crate::template::token::{Token, TokenKind};
use std::collections::BTreeMap;
use tracing::trace;

/// Paragraph children that do not make a paragraph visible.
const NON_CONTENT: [&str; 9] = [
    "pPr",
    "proofErr",
    "bookmarkStart",
    "bookmarkEnd",
    "permStart",
    "permEnd",
    "commentRangeStart",
    "commentRangeEnd",
    "lastRenderedPageBreak",
];

/// One step from a list into one of its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Step {
    Block(usize),
    Row(usize),
    Cell(usize),
    Inline(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionKind {
    Inlines,
    Paragraphs,
    Rows,
}

struct MarkerRef {
    address: Vec<Step>,
    token: Token,
}

#[derive(Debug)]
struct Region {
    /// Address of the list holding the repeated items
    container: Vec<Step>,
    kind: RegionKind,
    lo: usize,
    hi: usize,
    /// Index of the start marker; of two equal spans the outer one opens first
    opened: usize,
    token: Token,
    start: Vec<Step>,
    end: Vec<Step>,
}

/// Summary of one compiled story.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompileStats {
    pub regions: usize,
    pub elided: usize,
}

/// Pair the markers of one story and wrap their regions.
pub fn compile_story(blocks: &mut Vec<Block>, part: &str) -> Result<CompileStats> {
    let mut markers = Vec::new();
    collect_blocks(blocks, &mut Vec::new(), &mut markers);
    if markers.is_empty() {
        return Ok(CompileStats::default());
    }

    let mut regions = pair(&markers, part)?;
    for region in &mut regions {
        promote_to_row(blocks, region);
    }
    let mut stats = CompileStats {
        regions: regions.len(),
        elided: 0,
    };
    for region in &regions {
        stats.elided += elide(blocks, region);
    }

    let mut by_container: BTreeMap<Vec<Step>, Vec<Region>> = BTreeMap::new();
    for region in regions {
        by_container.entry(region.container.clone()).or_default().push(region);
    }
    let mut containers: Vec<_> = by_container.into_iter().collect();
    // Deepest lists first: wrapping shifts indices only inside the wrapped list
    containers.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    for (container, regions) in containers {
        let Some(list) = locate(blocks, &container) else {
            return Err(Error::malformed(
                "repeated region in an unsupported position",
                Location::part(part),
            ));
        };
        match list {
            ListMut::Blocks(items) => wrap(items, regions, part, |token, body| {
                Block::Repeat(Repeat { token, body })
            })?,
            ListMut::Rows(items) => wrap(items, regions, part, |token, body| {
                TableItem::Repeat(Repeat { token, body })
            })?,
            ListMut::Inlines(items) => wrap(items, regions, part, |token, body| {
                Inline::Repeat(Repeat { token, body })
            })?,
            ListMut::Cells(_) => {
                return Err(Error::malformed(
                    "cells cannot be repeated on their own",
                    Location::part(part),
                ));
            },
        }
    }

    trace!(part, regions = stats.regions, elided = stats.elided, "compiled story");
    Ok(stats)
}

fn collect_blocks(blocks: &[Block], address: &mut Vec<Step>, out: &mut Vec<MarkerRef>) {
    for (i, block) in blocks.iter().enumerate() {
        address.push(Step::Block(i));
        match block {
            Block::Paragraph(p) => collect_inlines(&p.inlines, address, out),
            Block::Table(table) => {
                for (r, item) in table.items.iter().enumerate() {
                    let TableItem::Row(row) = item else { continue };
                    address.push(Step::Row(r));
                    for (c, cell) in row.items.iter().enumerate() {
                        if let RowItem::Cell(cell) = cell {
                            address.push(Step::Cell(c));
                            collect_blocks(&cell.blocks, address, out);
                            address.pop();
                        }
                    }
                    address.pop();
                }
            },
            Block::Sdt(sdt) => collect_blocks(&sdt.blocks, address, out),
            Block::Repeat(_) | Block::Other(_) => {},
        }
        address.pop();
    }
}

fn collect_inlines(inlines: &[Inline], address: &mut Vec<Step>, out: &mut Vec<MarkerRef>) {
    for (i, inline) in inlines.iter().enumerate() {
        address.push(Step::Inline(i));
        match inline {
            Inline::Marker(marker) => out.push(MarkerRef {
                address: address.clone(),
                token: marker.token.clone(),
            }),
            Inline::Group(group) => collect_inlines(&group.inlines, address, out),
            _ => {},
        }
        address.pop();
    }
}

fn location(part: &str, token: &Token) -> Location {
    Location::paragraph(part, token.paragraph)
}

/// Match start and end markers in document order.
fn pair(markers: &[MarkerRef], part: &str) -> Result<Vec<Region>> {
    let mut stack: Vec<usize> = Vec::new();
    let mut regions = Vec::new();

    for (idx, marker) in markers.iter().enumerate() {
        if marker.token.kind == TokenKind::BlockStart {
            stack.push(idx);
            continue;
        }

        let unmatched = || Error::UnmatchedBlock {
            token: marker.token.source.clone(),
            location: location(part, &marker.token),
        };
        let Some(&top) = stack.last() else {
            return Err(unmatched());
        };
        let open = &markers[top];
        if open.token.path != marker.token.path {
            if stack.iter().any(|&s| markers[s].token.path == marker.token.path) {
                return Err(Error::malformed(
                    format!(
                        "'{}' closes a block while '{}' is still open inside it",
                        marker.token.source, open.token.source
                    ),
                    location(part, &marker.token),
                ));
            }
            return Err(unmatched());
        }

        stack.pop();
        regions.push(classify(open, marker, top, part)?);
    }

    if let Some(&open) = stack.last() {
        let token = &markers[open].token;
        return Err(Error::UnmatchedBlock {
            token: token.source.clone(),
            location: location(part, token),
        });
    }
    Ok(regions)
}

/// Decide what a matched pair repeats.
fn classify(start: &MarkerRef, end: &MarkerRef, opened: usize, part: &str) -> Result<Region> {
    let (a, b) = (&start.address, &end.address);
    let k = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();

    let region = |container: &[Step], kind, lo, hi| Region {
        container: container.to_vec(),
        kind,
        lo,
        hi,
        opened,
        token: start.token.clone(),
        start: a.clone(),
        end: b.clone(),
    };

    let is_inline = |addr: &Vec<Step>, i: usize| matches!(addr.get(i), Some(Step::Inline(_)));
    match (a.get(k), b.get(k)) {
        (Some(&Step::Inline(lo)), Some(&Step::Inline(hi))) if a.len() == k + 1 && b.len() == k + 1 => {
            Ok(region(&a[..k], RegionKind::Inlines, lo, hi))
        },
        (Some(&Step::Block(lo)), Some(&Step::Block(hi)))
            if a.len() == k + 2 && b.len() == k + 2 && is_inline(a, k + 1) && is_inline(b, k + 1) =>
        {
            Ok(region(&a[..k], RegionKind::Paragraphs, lo, hi))
        },
        (Some(&Step::Row(lo)), Some(&Step::Row(hi))) => Ok(region(&a[..k], RegionKind::Rows, lo, hi)),
        (Some(&Step::Cell(_)), Some(&Step::Cell(_))) => match a.get(k.wrapping_sub(1)) {
            Some(&Step::Row(row)) => Ok(region(&a[..k - 1], RegionKind::Rows, row, row)),
            _ => Err(misplaced(start, end, part)),
        },
        _ => Err(misplaced(start, end, part)),
    }
}

/// Turn an inline region into a row region when its markers bracket the
/// whole content of the table row holding the paragraph.
///
/// A block nested inside such a region has the outer markers beside it and
/// stays inline.
fn promote_to_row(blocks: &mut [Block], region: &mut Region) {
    if region.kind != RegionKind::Inlines {
        return;
    }
    let [table @ .., Step::Row(row), Step::Cell(cell), Step::Block(block)] = region.container.as_slice() else {
        return;
    };
    let (table, row, cell, block) = (table.to_vec(), *row, *cell, *block);
    let Some(target) = row_at(blocks, &table, row) else {
        return;
    };
    let (lo, hi) = (region.lo, region.hi);
    let bracketed = target.items.iter().enumerate().all(|(c, item)| match item {
        RowItem::Cell(tc) => tc.blocks.iter().enumerate().all(|(b, content)| match content {
            Block::Paragraph(p) if c == cell && b == block => {
                p.inlines.len() > hi && blank(&p.inlines[..lo]) && blank(&p.inlines[hi + 1..])
            },
            Block::Paragraph(p) => markers_only(&p.inlines),
            Block::Other(_) => true,
            _ => false,
        }),
        RowItem::Other(_) => true,
    });
    if !bracketed {
        return;
    }

    trace!(token = %region.token.source, row, "inline region spans its whole row");
    region.container = table;
    region.kind = RegionKind::Rows;
    region.lo = row;
    region.hi = row;
}

fn misplaced(start: &MarkerRef, end: &MarkerRef, part: &str) -> Error {
    Error::malformed(
        format!(
            "'{}' and '{}' must be in the same paragraph, in paragraphs of the same \
             body or cell, or in rows of the same table",
            start.token.source, end.token.source
        ),
        location(part, &start.token),
    )
}

/// Mark delimiter rows and paragraphs that hold nothing but markers; returns
/// how many were elided.
fn elide(blocks: &mut [Block], region: &Region) -> usize {
    let mut count = 0;
    if region.kind == RegionKind::Rows && region.lo < region.hi {
        for index in [region.lo, region.hi] {
            if let Some(row) = row_at(blocks, &region.container, index)
                && row_markers_only(row)
            {
                row.elided = true;
                count += 1;
            }
        }
    }

    for marker in [&region.start, &region.end] {
        // Address of the paragraph holding the marker
        let Some(paragraph_len) = marker.iter().position(|s| matches!(s, Step::Inline(_))) else {
            continue;
        };
        let paragraph_addr = &marker[..paragraph_len];
        let applies = match region.kind {
            RegionKind::Inlines => false,
            RegionKind::Paragraphs => paragraph_len == region.container.len() + 1,
            RegionKind::Rows => cell_has_other_content(blocks, paragraph_addr),
        };
        if !applies {
            continue;
        }
        if let Some(p) = paragraph_at(blocks, paragraph_addr)
            && !p.elided
            && markers_only(&p.inlines)
        {
            p.elided = true;
            count += 1;
        }
    }
    count
}

/// Whether the paragraph at `addr` sits directly in a cell that also holds
/// other paragraphs or tables.
fn cell_has_other_content(blocks: &mut [Block], addr: &[Step]) -> bool {
    let Some((Step::Block(index), parent)) = addr.split_last() else {
        return false;
    };
    if !matches!(parent.last(), Some(Step::Cell(_))) {
        return false;
    }
    match locate_slice(blocks, parent) {
        Some(ListMut::Blocks(siblings)) => siblings
            .iter()
            .enumerate()
            .any(|(i, b)| i != *index && matches!(b, Block::Paragraph(_) | Block::Table(_))),
        _ => false,
    }
}

fn row_markers_only(row: &Row) -> bool {
    row.items.iter().all(|item| match item {
        RowItem::Cell(cell) => cell.blocks.iter().all(|block| match block {
            Block::Paragraph(p) => markers_only(&p.inlines),
            Block::Other(_) => true,
            _ => false,
        }),
        RowItem::Other(_) => true,
    })
}

fn markers_only(inlines: &[Inline]) -> bool {
    inlines.iter().all(|inline| match inline {
        Inline::Marker(_) => true,
        Inline::Run(run) => run.content.iter().all(|c| match c {
            RunContent::Text(t) => t.value.is_empty(),
            RunContent::Other(node) => node
                .as_element()
                .is_some_and(|e| NON_CONTENT.contains(&e.local_name())),
        }),
        Inline::Other(node) => {
            node.is_blank_text()
                || node
                    .as_element()
                    .is_some_and(|e| NON_CONTENT.contains(&e.local_name()))
        },
        Inline::Group(_) | Inline::Field(_) | Inline::Repeat(_) => false,
    })
}

/// No content and no markers.
fn blank(inlines: &[Inline]) -> bool {
    markers_only(inlines) && !inlines.iter().any(|i| matches!(i, Inline::Marker(_)))
}

/// A mutable view of the list an address prefix leads to.
enum ListMut<'a> {
    Blocks(&'a mut Vec<Block>),
    Rows(&'a mut Vec<TableItem>),
    Cells(&'a mut Vec<RowItem>),
    Inlines(&'a mut Vec<Inline>),
}

fn locate<'a>(blocks: &'a mut Vec<Block>, prefix: &[Step]) -> Option<ListMut<'a>> {
    let mut current = ListMut::Blocks(blocks);
    for step in prefix {
        current = descend(current, *step)?;
    }
    Some(current)
}

fn locate_slice<'a>(blocks: &'a mut [Block], prefix: &[Step]) -> Option<ListMut<'a>> {
    let (first, rest) = prefix.split_first()?;
    let Step::Block(i) = *first else {
        return None;
    };
    let mut current = enter_block(blocks.get_mut(i)?)?;
    for step in rest {
        current = descend(current, *step)?;
    }
    Some(current)
}

fn enter_block(block: &mut Block) -> Option<ListMut<'_>> {
    match block {
        Block::Paragraph(p) => Some(ListMut::Inlines(&mut p.inlines)),
        Block::Table(t) => Some(ListMut::Rows(&mut t.items)),
        Block::Sdt(s) => Some(ListMut::Blocks(&mut s.blocks)),
        Block::Repeat(_) | Block::Other(_) => None,
    }
}

fn descend(list: ListMut<'_>, step: Step) -> Option<ListMut<'_>> {
    match (list, step) {
        (ListMut::Blocks(items), Step::Block(i)) => enter_block(items.get_mut(i)?),
        (ListMut::Rows(items), Step::Row(i)) => match items.get_mut(i)? {
            TableItem::Row(row) => Some(ListMut::Cells(&mut row.items)),
            _ => None,
        },
        (ListMut::Cells(items), Step::Cell(i)) => match items.get_mut(i)? {
            RowItem::Cell(cell) => Some(ListMut::Blocks(&mut cell.blocks)),
            RowItem::Other(_) => None,
        },
        (ListMut::Inlines(items), Step::Inline(i)) => match items.get_mut(i)? {
            Inline::Group(group) => Some(ListMut::Inlines(&mut group.inlines)),
            _ => None,
        },
        _ => None,
    }
}

fn paragraph_at<'a>(blocks: &'a mut [Block], addr: &[Step]) -> Option<&'a mut Paragraph> {
    let (Step::Block(index), parent) = addr.split_last()? else {
        return None;
    };
    let siblings: &mut [Block] = if parent.is_empty() {
        blocks
    } else {
        match locate_slice(blocks, parent)? {
            ListMut::Blocks(items) => items,
            _ => return None,
        }
    };
    match siblings.get_mut(*index)? {
        Block::Paragraph(p) => Some(p),
        _ => None,
    }
}

fn row_at<'a>(blocks: &'a mut [Block], table: &[Step], index: usize) -> Option<&'a mut Row> {
    match locate_slice(blocks, table)? {
        ListMut::Rows(items) => match items.get_mut(index)? {
            TableItem::Row(row) => Some(row),
            _ => None,
        },
        _ => None,
    }
}

struct Node {
    region: Region,
    children: Vec<Node>,
}

/// Nest the regions of one list into a forest; partial overlap is an error.
fn forest(mut regions: Vec<Region>, part: &str) -> Result<Vec<Node>> {
    regions.sort_by(|a, b| {
        a.lo.cmp(&b.lo)
            .then_with(|| b.hi.cmp(&a.hi))
            .then_with(|| a.opened.cmp(&b.opened))
    });

    fn attach(node: Node, stack: &mut [Node], roots: &mut Vec<Node>) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    let mut roots = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    for region in regions {
        while stack.last().is_some_and(|top| top.region.hi < region.lo) {
            if let Some(done) = stack.pop() {
                attach(done, &mut stack, &mut roots);
            }
        }
        if let Some(top) = stack.last()
            && region.hi > top.region.hi
        {
            return Err(Error::malformed(
                format!(
                    "blocks '{}' and '{}' overlap",
                    top.region.token.source, region.token.source
                ),
                location(part, &region.token),
            ));
        }
        stack.push(Node {
            region,
            children: Vec::new(),
        });
    }
    while let Some(done) = stack.pop() {
        attach(done, &mut stack, &mut roots);
    }
    Ok(roots)
}

/// Replace each region's items in `items` by one repeat node.
fn wrap<T>(items: &mut Vec<T>, regions: Vec<Region>, part: &str, make: impl Fn(Token, Vec<T>) -> T + Copy) -> Result<()> {
    let roots = forest(regions, part)?;
    let mut slots: Vec<Option<T>> = items.drain(..).map(Some).collect();
    let len = slots.len();
    *items = assemble(&mut slots, 0, len, roots, make);
    Ok(())
}

fn assemble<T>(
    slots: &mut [Option<T>],
    start: usize,
    end: usize,
    nodes: Vec<Node>,
    make: impl Fn(Token, Vec<T>) -> T + Copy,
) -> Vec<T> {
    let mut out = Vec::new();
    let mut i = start;
    for node in nodes {
        let (lo, hi) = (node.region.lo, node.region.hi.min(end.saturating_sub(1)));
        out.extend(slots[i.min(lo)..lo].iter_mut().filter_map(Option::take));
        let body = assemble(slots, lo, hi + 1, node.children, make);
        out.push(make(node.region.token, body));
        i = hi + 1;
    }
    if i < end {
        out.extend(slots[i..end].iter_mut().filter_map(Option::take));
    }
    out
}
