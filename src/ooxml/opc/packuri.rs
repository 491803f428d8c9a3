//! Part names inside a package.
//!
//! A part name is an absolute, slash-separated path such as
//! `/word/document.xml`. Zip members carry the same name without the leading
//! slash; [`PackURI::membername`] and [`PackURI::from_membername`] convert
//! between the two.
use std::fmt;

/// The package pseudo-partname; its relationships live in `/_rels/.rels`
pub const PACKAGE_URI: &str = "/";

/// An absolute part name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Wrap `uri`, which must begin with `/`.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if uri.starts_with('/') {
            Ok(Self { uri })
        } else {
            Err(format!("part name '{}' is not absolute", uri))
        }
    }

    /// The part name of zip member `name` (e.g. `word/document.xml`).
    pub fn from_membername(name: &str) -> Self {
        Self {
            uri: format!("/{}", name.trim_start_matches('/')),
        }
    }

    /// Resolve a relationship target against the directory of its source part.
    ///
    /// `..` and `.` segments are collapsed; a target starting with `/` is
    /// already package-absolute.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::ooxml::opc::PackURI;
    ///
    /// let uri = PackURI::from_rel_ref("/word", "../customXml/item1.xml").unwrap();
    /// assert_eq!(uri.as_str(), "/customXml/item1.xml");
    /// ```
    pub fn from_rel_ref(base_uri: &str, target: &str) -> Result<Self, String> {
        let joined = match target.strip_prefix('/') {
            Some(_) => target.to_string(),
            None => format!("{}/{}", base_uri.trim_end_matches('/'), target),
        };

        let mut segments: Vec<&str> = Vec::new();
        for segment in joined.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    segments.pop();
                },
                other => segments.push(other),
            }
        }
        Self::new(format!("/{}", segments.join("/")))
    }

    /// Directory of this part (`/word` for `/word/document.xml`, `/` at the top).
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Last segment of the name; empty for the package itself.
    pub fn filename(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or("")
    }

    /// Zip member name: the part name without its leading slash.
    #[inline]
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Name of the `.rels` part holding this part's relationships.
    pub fn rels_uri(&self) -> PackURI {
        let dir = self.base_uri().trim_end_matches('/');
        PackURI {
            uri: format!("{}/_rels/{}.rels", dir, self.filename()),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for PackURI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_absolute() {
        assert!(PackURI::new("/word/document.xml").is_ok());
        assert!(PackURI::new("word/document.xml").is_err());
    }

    #[test]
    fn test_member_names() {
        let uri = PackURI::from_membername("word/document.xml");
        assert_eq!(uri.as_str(), "/word/document.xml");
        assert_eq!(uri.base_uri(), "/word");
        assert_eq!(uri.filename(), "document.xml");
        assert_eq!(uri.membername(), "word/document.xml");

        let package = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(package.base_uri(), "/");
        assert_eq!(package.filename(), "");
        assert_eq!(package.membername(), "");
    }

    #[test]
    fn test_relationship_targets() {
        let cases = [
            ("/word", "header1.xml", "/word/header1.xml"),
            ("/word", "./footer2.xml", "/word/footer2.xml"),
            ("/", "word/document.xml", "/word/document.xml"),
            ("/word", "/word/footnotes.xml", "/word/footnotes.xml"),
            ("/word/sub", "../../media/a.png", "/media/a.png"),
        ];
        for (base, target, expected) in cases {
            assert_eq!(PackURI::from_rel_ref(base, target).unwrap().as_str(), expected, "{target}");
        }
    }

    #[test]
    fn test_rels_uri() {
        let uri = PackURI::new("/word/document.xml").unwrap();
        assert_eq!(uri.rels_uri().as_str(), "/word/_rels/document.xml.rels");
        assert_eq!(PackURI::new(PACKAGE_URI).unwrap().rels_uri().as_str(), "/_rels/.rels");
    }
}
