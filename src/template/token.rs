//! Placeholder expressions.
//!
//! The text between a pair of delimiters is one of
//!
//! - `path` or `path | format`: a scalar field,
//! - `#path`: the start of a repeated region bound to `path`,
//! - `/path`: the end of that region.
//!
//! A path is a dot-separated list of segments (`invoice.customer.name`,
//! `items.0.sku`). `.` and `this` name the current element of the innermost
//! region, and `this.x` looks `x` up on that element only. Segments starting
//! with `@` (`@index`, `@number`, `@first`, `@last`) read the position of the
//! innermost list being repeated.
use smallvec::SmallVec;
use std::fmt;

/// What a placeholder does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Scalar,
    BlockStart,
    BlockEnd,
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Canonical text, used in error messages and to pair block markers
    text: String,
    segments: SmallVec<[String; 4]>,
    /// Starts at the current element (`this.x`) instead of searching scopes
    anchored: bool,
}

impl Path {
    /// Parse a path expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::template::token::Path;
    ///
    /// let path = Path::parse("invoice.items.0.sku").unwrap();
    /// assert_eq!(path.segments(), ["invoice", "items", "0", "sku"]);
    /// assert!(Path::parse(".").unwrap().is_current());
    /// assert!(Path::parse("a..b").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty path".to_string());
        }
        if text == "." || text == "this" {
            return Ok(Path {
                text: text.to_string(),
                segments: SmallVec::new(),
                anchored: true,
            });
        }

        let mut segments: SmallVec<[String; 4]> = SmallVec::new();
        for segment in text.split('.') {
            if segment.is_empty() {
                return Err(format!("empty segment in path '{}'", text));
            }
            if let Some(bad) = segment.chars().find(|&c| !is_segment_char(c)) {
                return Err(format!("invalid character '{}' in path '{}'", bad, text));
            }
            if segment.starts_with('@') && !segments.is_empty() {
                return Err(format!("'{}' must start the path '{}'", segment, text));
            }
            segments.push(segment.to_string());
        }

        let anchored = segments[0] == "this";
        if anchored {
            segments.remove(0);
        }
        Ok(Path {
            text: text.to_string(),
            segments,
            anchored,
        })
    }

    /// The path as written (trimmed).
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether the path names the current element itself.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether lookup starts at the current element only.
    #[inline]
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[inline]
fn is_segment_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '@' | '$')
}

/// A placeholder found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub path: Path,
    /// Format specifier after `|`, trimmed
    pub format: Option<String>,
    /// The placeholder exactly as it appears in the document, delimiters included
    pub source: String,
    /// 1-based paragraph ordinal within its part
    pub paragraph: usize,
}

impl Token {
    /// Parse the text between the delimiters of `source`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::template::token::{Token, TokenKind};
    ///
    /// let token = Token::parse("{{ total | #,##0.00 }}", " total | #,##0.00 ", 1).unwrap();
    /// assert_eq!(token.kind, TokenKind::Scalar);
    /// assert_eq!(token.path.as_str(), "total");
    /// assert_eq!(token.format.as_deref(), Some("#,##0.00"));
    ///
    /// let start = Token::parse("{{#items}}", "#items", 2).unwrap();
    /// assert_eq!(start.kind, TokenKind::BlockStart);
    /// ```
    pub fn parse(source: &str, inner: &str, paragraph: usize) -> Result<Self, String> {
        let inner = inner.trim();
        let (kind, rest) = if let Some(rest) = inner.strip_prefix('#') {
            (TokenKind::BlockStart, rest)
        } else if let Some(rest) = inner.strip_prefix('/') {
            (TokenKind::BlockEnd, rest)
        } else {
            (TokenKind::Scalar, inner)
        };

        let (path, format) = match rest.split_once('|') {
            Some(_) if kind != TokenKind::Scalar => {
                return Err(format!("block marker '{}' cannot take a format", source));
            },
            Some((path, format)) => {
                let format = format.trim();
                if format.is_empty() {
                    return Err(format!("empty format in '{}'", source));
                }
                (path, Some(format.to_string()))
            },
            None => (rest, None),
        };

        let path = Path::parse(path).map_err(|e| format!("{} in '{}'", e, source))?;
        Ok(Token {
            kind,
            path,
            format,
            source: source.to_string(),
            paragraph,
        })
    }

    #[inline]
    pub fn is_block(&self) -> bool {
        self.kind != TokenKind::Scalar
    }
}
