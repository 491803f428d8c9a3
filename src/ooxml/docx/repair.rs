//! Structural fixes applied to merged parts.
//!
//! Repeating and removing content can leave structures that Word refuses to
//! open without a repair prompt: cells without a trailing paragraph, tables
//! without rows, and drawings that share a `wp:docPr` id.
use crate::ooxml::docx::xml::{XmlElement, XmlNode};
use std::collections::HashSet;

/// Counts of the fixes applied to one part.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairStats {
    pub tables_removed: usize,
    pub cells_filled: usize,
}

impl RepairStats {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables_removed == 0 && self.cells_filled == 0
    }
}

/// Drop tables that lost all their rows and make every cell end with a paragraph.
///
/// # Examples
///
/// ```
/// use quince::ooxml::docx::repair::repair_tables;
/// use quince::ooxml::docx::xml::XmlDocument;
///
/// let xml = r#"<w:body xmlns:w="w"><w:tbl><w:tblPr/></w:tbl><w:p/></w:body>"#;
/// let mut doc = XmlDocument::parse(xml.as_bytes()).unwrap();
/// let stats = repair_tables(&mut doc.root);
/// assert_eq!(stats.tables_removed, 1);
/// assert_eq!(doc.root.elements().count(), 1);
/// ```
pub fn repair_tables(root: &mut XmlElement) -> RepairStats {
    let mut stats = RepairStats::default();
    repair_element(root, &mut stats);
    stats
}

fn repair_element(el: &mut XmlElement, stats: &mut RepairStats) {
    for child in &mut el.children {
        if let XmlNode::Element(child) = child {
            repair_element(child, stats);
        }
    }

    let before = el.children.len();
    el.children
        .retain(|node| !matches!(node, XmlNode::Element(child) if child.is("tbl") && !has_rows(child)));
    stats.tables_removed += before - el.children.len();

    if el.is("tc") && !el.elements().last().is_some_and(|last| last.is("p")) {
        let name = format!("{}p", el.prefix());
        el.children.push(XmlNode::Element(XmlElement::new(name)));
        stats.cells_filled += 1;
    }
}

/// Rows may sit directly in the table or inside row-level wrappers.
fn has_rows(table: &XmlElement) -> bool {
    table
        .elements()
        .any(|child| matches!(child.local_name(), "tr" | "sdt" | "customXml"))
}

/// Largest numeric `wp:docPr` id in `root`, or 0.
pub fn max_drawing_id(root: &XmlElement) -> u32 {
    let mut max = 0;
    visit(root, &mut |el| {
        if let Some(id) = doc_pr_id(el) {
            max = max.max(id);
        }
    });
    max
}

fn visit(el: &XmlElement, f: &mut impl FnMut(&XmlElement)) {
    f(el);
    for child in el.elements() {
        visit(child, f);
    }
}

fn doc_pr_id(el: &XmlElement) -> Option<u32> {
    if !el.is("docPr") {
        return None;
    }
    el.attr("id").and_then(|id| atoi_simd::parse::<u32, false, false>(id.as_bytes()).ok())
}

/// Hands out drawing ids across the parts of one rendered package.
///
/// The first drawing to claim an id keeps it; later drawings with the same
/// id (copies made by repetition) get fresh ids above every id seen so far.
#[derive(Debug)]
pub struct DrawingIds {
    seen: HashSet<u32>,
    next: u32,
}

impl DrawingIds {
    /// `floor` is the largest id already present anywhere in the package.
    pub fn new(floor: u32) -> Self {
        Self {
            seen: HashSet::new(),
            next: floor.saturating_add(1),
        }
    }

    /// Renumber duplicate ids under `root`; returns how many were changed.
    pub fn renumber(&mut self, root: &mut XmlElement) -> usize {
        let mut changed = 0;
        root.walk_mut(&mut |el| {
            let Some(id) = doc_pr_id(el) else { return };
            if self.seen.insert(id) {
                return;
            }
            let fresh = self.next;
            self.next = self.next.saturating_add(1);
            self.seen.insert(fresh);
            el.set_attr("id", itoa::Buffer::new().format(fresh));
            changed += 1;
        });
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::xml::XmlDocument;

    fn root(xml: &str) -> XmlElement {
        XmlDocument::parse(xml.as_bytes()).unwrap().root
    }

    #[test]
    fn test_cell_gets_trailing_paragraph() {
        let mut el = root(concat!(
            r#"<w:tbl xmlns:w="w"><w:tr>"#,
            r#"<w:tc><w:tcPr/></w:tc>"#,
            r#"<w:tc><w:p/></w:tc>"#,
            r#"<w:tc><w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl></w:tc>"#,
            r#"</w:tr></w:tbl>"#
        ));
        let stats = repair_tables(&mut el);
        assert_eq!(stats.cells_filled, 2);
        assert_eq!(stats.tables_removed, 0);
        assert!(el.to_xml().contains("<w:tc><w:tcPr/><w:p/></w:tc>"));
    }

    #[test]
    fn test_removing_nested_table_fills_cell() {
        let mut el = root(r#"<w:tbl xmlns:w="w"><w:tr><w:tc><w:tbl><w:tblPr/></w:tbl></w:tc></w:tr></w:tbl>"#);
        let stats = repair_tables(&mut el);
        assert_eq!(stats.tables_removed, 1);
        assert_eq!(stats.cells_filled, 1);
        assert_eq!(
            el.to_xml(),
            r#"<w:tbl xmlns:w="w"><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl>"#
        );
    }

    #[test]
    fn test_duplicate_drawing_ids() {
        let mut el = root(concat!(
            r#"<w:body xmlns:w="w" xmlns:wp="wp">"#,
            r#"<wp:docPr id="3" name="a"/><wp:docPr id="3" name="a"/><wp:docPr id="7" name="b"/>"#,
            r#"</w:body>"#
        ));
        assert_eq!(max_drawing_id(&el), 7);

        let mut ids = DrawingIds::new(7);
        assert_eq!(ids.renumber(&mut el), 1);
        let found: Vec<_> = el.elements().filter_map(|e| e.attr("id")).collect();
        assert_eq!(found, ["3", "8", "7"]);
    }
}
