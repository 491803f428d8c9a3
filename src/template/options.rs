/// Configuration for loading and rendering templates.
///
/// Options are fixed when a [`Template`](crate::Template) is loaded: the
/// delimiters decide which text is recognized as a placeholder, and the
/// remaining settings apply to every render of that template.
///
/// # Examples
///
/// ```rust
/// use quince::TemplateOptions;
///
/// // Create with defaults
/// let options = TemplateOptions::default();
/// assert_eq!(options.open, "{{");
///
/// // Or customize
/// let options = TemplateOptions::new()
///     .with_delimiters("[[", "]]")
///     .with_strict(true)
///     .with_currency_symbol("€");
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Opening placeholder delimiter
    pub open: String,
    /// Closing placeholder delimiter
    pub close: String,
    /// Whether a path that resolves to nothing is an error
    pub strict: bool,
    /// Whether characters not allowed in XML 1.0 are removed from substituted text
    pub strip_invalid_xml_chars: bool,
    /// Whether `\n` in substituted text becomes a line break
    pub line_breaks: bool,
    /// Text used for the `¤` pattern letter
    pub currency_symbol: String,
    /// Deflate level for rewritten parts; `None` uses the library default
    pub compression_level: Option<i64>,
    /// Whether the parts of a package are rendered on the rayon thread pool
    pub parallel: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
            strict: false,
            strip_invalid_xml_chars: true,
            line_breaks: true,
            currency_symbol: "$".to_string(),
            compression_level: None,
            parallel: false,
        }
    }
}

impl TemplateOptions {
    /// Create a new `TemplateOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder delimiters.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use quince::TemplateOptions;
    ///
    /// let options = TemplateOptions::new().with_delimiters("<<", ">>");
    /// assert_eq!((options.open.as_str(), options.close.as_str()), ("<<", ">>"));
    /// ```
    #[inline]
    pub fn with_delimiters<O: Into<String>, C: Into<String>>(mut self, open: O, close: C) -> Self {
        self.open = open.into();
        self.close = close.into();
        self
    }

    /// Set whether unresolved paths fail the render.
    ///
    /// In non-strict mode a missing scalar renders as empty text and a missing
    /// list repeats its region zero times.
    #[inline]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set whether invalid XML characters are removed from substituted text.
    #[inline]
    pub fn with_strip_invalid_xml_chars(mut self, strip: bool) -> Self {
        self.strip_invalid_xml_chars = strip;
        self
    }

    /// Set whether newlines in substituted text become `<w:br/>`.
    #[inline]
    pub fn with_line_breaks(mut self, line_breaks: bool) -> Self {
        self.line_breaks = line_breaks;
        self
    }

    /// Set the currency symbol used by number patterns.
    #[inline]
    pub fn with_currency_symbol<S: Into<String>>(mut self, symbol: S) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Set the deflate level (0-9) for rewritten parts.
    #[inline]
    pub fn with_compression_level(mut self, level: Option<i64>) -> Self {
        self.compression_level = level;
        self
    }

    /// Set whether parts are rendered in parallel.
    ///
    /// Only pays off for templates with many large headers or footers.
    #[inline]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check that the options can be used.
    ///
    /// # Errors
    /// Returns `Error::InvalidOptions` for empty, identical or overlapping
    /// delimiters, delimiters containing block marker characters, or a
    /// compression level outside 0-9.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: String| Err(crate::Error::InvalidOptions(msg));

        if self.open.is_empty() || self.close.is_empty() {
            return invalid("delimiters must not be empty".to_string());
        }
        if self.open == self.close {
            return invalid(format!("opening and closing delimiters are both '{}'", self.open));
        }
        if self.close.contains(self.open.as_str()) {
            return invalid(format!(
                "closing delimiter '{}' contains the opening delimiter '{}'",
                self.close, self.open
            ));
        }
        if let Some(c) = self
            .open
            .chars()
            .chain(self.close.chars())
            .find(|c| c.is_whitespace() || matches!(c, '#' | '/' | '|'))
        {
            return invalid(format!("delimiters must not contain {:?}", c));
        }
        if let Some(level) = self.compression_level
            && !(0..=9).contains(&level)
        {
            return invalid(format!("compression level {} is outside 0-9", level));
        }
        Ok(())
    }
}
