/// Word (.docx) document support.
///
/// - `package`: finds the main document and the headers, footers, notes and
///   comments it references
/// - `xml`: a lossless element tree for one part
/// - `body`: paragraphs, runs and tables on top of that tree
/// - `repair`: structural fixes applied after merging
/// - `scaffold`: builds minimal packages from body XML
pub mod body;
pub mod package;
pub mod repair;
pub mod scaffold;
pub mod xml;

pub use package::{Package, PartKind, StoryPart};
