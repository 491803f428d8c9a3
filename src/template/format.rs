//! Value formatting.
//!
//! Without a specifier every value has one canonical text form: integers and
//! decimals in plain notation (decimals keep their scale), floats in shortest
//! round-trip form, dates as `yyyy-MM-dd`, date-times as
//! `yyyy-MM-ddTHH:mm:ss`, booleans as `true`/`false`.
//!
//! A specifier after `|` in a placeholder selects one of
//!
//! - a keyword: `upper`, `lower`, `trim`, `capitalize`;
//! - a printf conversion: `%[flags][width][.precision](d|f)` with flags
//!   `,` (grouping), `+`, ` `, `0` and `-`, optionally surrounded by literal
//!   text (`%%` is a literal percent sign);
//! - a number pattern: `#,##0.00`, `0.0%`, `¤#,##0.00`, `'USD' 0.00`;
//! - a date pattern: `dd MMM yyyy`, `EEEE, d MMMM yyyy HH:mm:ss.SSS`, `h:mm a`
//!   (`S`, `SS` and `SSS` print the fraction of a second truncated to
//!   tenths, hundredths and milliseconds);
//! - a choice for booleans: `Yes/No`.
//!
//! Patterns are parsed once, when the template is loaded; which
//! interpretation applies is decided by the type of the value. Rounding is
//! always half-to-even.
use crate::template::value::Value;
use bitflags::bitflags;
use chrono::format::{Fixed, Item, Numeric, Pad};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use phf::phf_map;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::borrow::Cow;
use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::{Chars, FromStr};
use thiserror::Error;

/// Largest number of fraction digits a pattern may ask for.
const MAX_FRACTION_DIGITS: u32 = 28;

/// Largest printf field width.
const MAX_WIDTH: usize = 256;

/// A specifier that cannot be parsed or does not fit the value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid format '{spec}': {reason}")]
pub struct FormatError {
    pub spec: String,
    pub reason: String,
}

/// Text transformations usable on any scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Upper,
    Lower,
    Trim,
    Capitalize,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "upper" => Keyword::Upper,
    "lower" => Keyword::Lower,
    "trim" => Keyword::Trim,
    "capitalize" => Keyword::Capitalize,
};

impl Keyword {
    fn apply(self, text: &str) -> String {
        match self {
            Keyword::Upper => text.to_uppercase(),
            Keyword::Lower => text.to_lowercase(),
            Keyword::Trim => text.trim().to_string(),
            Keyword::Capitalize => {
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            },
        }
    }
}

/// A parsed format specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    source: String,
    kind: SpecKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SpecKind {
    Keyword(Keyword),
    Printf(Printf),
    /// Every interpretation the text admits; the value picks one
    Patterns {
        number: Option<NumberPattern>,
        date: Option<DatePattern>,
        choice: Option<(String, String)>,
    },
}

impl FormatSpec {
    /// Parse a specifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::Value;
    /// use quince::template::format::FormatSpec;
    ///
    /// let spec = FormatSpec::parse("#,##0.00").unwrap();
    /// assert_eq!(spec.apply(&Value::Int(1234), "$").unwrap(), "1,234.00");
    /// assert!(FormatSpec::parse("%.2q").is_err());
    /// ```
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let error = |reason: String| FormatError {
            spec: spec.to_string(),
            reason,
        };

        let kind = if let Some(keyword) = KEYWORDS.get(spec) {
            SpecKind::Keyword(*keyword)
        } else if spec.contains('%') && !is_number_pattern_percent(spec) {
            SpecKind::Printf(Printf::parse(spec).map_err(error)?)
        } else {
            let number = NumberPattern::parse(spec);
            let date = DatePattern::parse(spec);
            let choice = match spec.split('/').collect::<Vec<_>>()[..] {
                [yes, no] => Some((yes.to_string(), no.to_string())),
                _ => None,
            };
            if number.is_err() && date.is_err() && choice.is_none() {
                let reason = match (number, date) {
                    (Err(n), Err(d)) => format!("not a number pattern ({}) or a date pattern ({})", n, d),
                    _ => "unrecognized pattern".to_string(),
                };
                return Err(error(reason));
            }
            SpecKind::Patterns {
                number: number.ok(),
                date: date.ok(),
                choice,
            }
        };

        Ok(Self {
            source: spec.to_string(),
            kind,
        })
    }

    /// The specifier as written.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Format `value`; `currency` replaces the `¤` pattern letter.
    pub fn apply(&self, value: &Value, currency: &str) -> Result<String, FormatError> {
        self.render(value, currency).map_err(|reason| FormatError {
            spec: self.source.clone(),
            reason,
        })
    }

    fn render(&self, value: &Value, currency: &str) -> Result<String, String> {
        if value.is_null() {
            return Ok(String::new());
        }
        match &self.kind {
            SpecKind::Keyword(keyword) => Ok(keyword.apply(&default_text(value)?)),
            SpecKind::Printf(printf) => {
                let number = decimal_of(value)?;
                printf.format(number)
            },
            SpecKind::Patterns {
                number,
                date,
                choice,
            } => match value {
                Value::Bool(b) => match choice {
                    Some((yes, no)) => Ok(if *b { yes.clone() } else { no.clone() }),
                    None => Err("booleans need a 'yes/no' choice".to_string()),
                },
                Value::Int(_) | Value::Float(_) | Value::Decimal(_) => match number {
                    Some(pattern) => pattern.format(decimal_of(value)?, currency),
                    None => Err(format!("not a number pattern for the {} value", value.kind())),
                },
                Value::Date(d) => match date {
                    Some(pattern) => pattern.format(*d, None),
                    None => Err("not a date pattern for the date value".to_string()),
                },
                Value::DateTime(dt) => match date {
                    Some(pattern) => pattern.format(dt.date(), Some(dt.time())),
                    None => Err("not a date pattern for the date-time value".to_string()),
                },
                Value::String(s) => {
                    if let (Some(pattern), Some(n)) = (number, parse_decimal(s)) {
                        return pattern.format(n, currency);
                    }
                    if let (Some(pattern), Some((d, t))) = (date, parse_iso_date(s)) {
                        return pattern.format(d, t);
                    }
                    Err(format!("the string '{}' does not fit the pattern", s))
                },
                other => Err(format!("a {} cannot be formatted", other.kind())),
            },
        }
    }
}

/// A `%` that belongs to a number pattern (`0.0%`) rather than a conversion.
fn is_number_pattern_percent(spec: &str) -> bool {
    let mut in_quote = false;
    let mut digits = false;
    for c in spec.chars() {
        match c {
            '\'' => in_quote = !in_quote,
            '#' | '0' if !in_quote => digits = true,
            '%' if !in_quote => return digits,
            _ => {},
        }
    }
    false
}

/// Canonical text of a scalar.
///
/// # Examples
///
/// ```
/// use quince::Value;
/// use quince::template::format::default_text;
/// use rust_decimal::Decimal;
///
/// assert_eq!(default_text(&Value::Float(2.0)).unwrap(), "2");
/// assert_eq!(default_text(&Value::Decimal(Decimal::new(15000, 2))).unwrap(), "150.00");
/// assert!(default_text(&Value::List(vec![])).is_err());
/// ```
pub fn default_text(value: &Value) -> Result<Cow<'_, str>, String> {
    let text = match value {
        Value::Null => Cow::Borrowed(""),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Int(i) => Cow::Owned(itoa::Buffer::new().format(*i).to_string()),
        Value::Float(x) => Cow::Owned(float_text(*x)),
        Value::Decimal(d) => Cow::Owned(d.to_string()),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => Cow::Owned(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        other => return Err(format!("a {} has no text form", other.kind())),
    };
    Ok(text)
}

fn float_text(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let mut buffer = ryu::Buffer::new();
    let text = buffer.format_finite(x);
    text.strip_suffix(".0").unwrap_or(text).to_string()
}

fn decimal_of(value: &Value) -> Result<Decimal, String> {
    match value {
        Value::Int(i) => Ok(Decimal::from(*i)),
        Value::Decimal(d) => Ok(*d),
        Value::Float(x) => {
            Decimal::from_f64(*x).ok_or_else(|| format!("{} cannot be formatted as a number", x))
        },
        Value::String(s) => parse_decimal(s).ok_or_else(|| format!("'{}' is not a number", s)),
        other => Err(format!("a {} is not a number", other.kind())),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Accept `yyyy-MM-dd`, `yyyy-MM-ddTHH:mm:ss[.fff]` (or with a space) and RFC 3339.
fn parse_iso_date(s: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some((d, None));
    }
    let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))?;
    Some((dt.date(), Some(dt.time())))
}

/// Insert `sep` between groups of `size` digits, counting from the right.
fn group_digits(digits: &str, size: usize, sep: char) -> String {
    if size == 0 || digits.len() <= size {
        return digits.to_string();
    }
    let lead = digits.len() % size;
    let mut out = String::with_capacity(digits.len() + digits.len() / size);
    for (i, c) in digits.char_indices() {
        if i > 0 && (i + size - lead) % size == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// Round half-to-even and split into integer and fraction digits.
fn round_digits(value: Decimal, scale: u32) -> (bool, String, String) {
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    (negative, int.to_string(), frac.to_string())
}

// ---------------------------------------------------------------------------
// printf
// ---------------------------------------------------------------------------

bitflags! {
    /// printf conversion flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PrintfFlags: u8 {
        /// `,` thousands grouping
        const GROUPING = 0x01;
        /// `+` sign on positive numbers
        const PLUS = 0x02;
        /// ` ` space in place of a plus sign
        const SPACE = 0x04;
        /// `0` pad with zeros
        const ZERO = 0x08;
        /// `-` left-justify
        const LEFT = 0x10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Integer,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Printf {
    prefix: String,
    suffix: String,
    flags: PrintfFlags,
    width: usize,
    precision: Option<u32>,
    conversion: Conversion,
}

impl Printf {
    fn parse(spec: &str) -> Result<Self, String> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut conversion: Option<(PrintfFlags, usize, Option<u32>, Conversion)> = None;

        let mut pos = 0;
        while pos < spec.len() {
            let rest = &spec[pos..];
            let target = if conversion.is_none() { &mut prefix } else { &mut suffix };
            if rest.starts_with("%%") {
                target.push('%');
                pos += 2;
            } else if rest.starts_with('%') {
                if conversion.is_some() {
                    return Err("more than one conversion".to_string());
                }
                let (parsed, used) = Self::conversion(&rest[1..])?;
                conversion = Some(parsed);
                pos += 1 + used;
            } else {
                let c = rest.chars().next().unwrap_or_default();
                target.push(c);
                pos += c.len_utf8().max(1);
            }
        }

        let (flags, width, precision, conversion) =
            conversion.ok_or_else(|| "no conversion".to_string())?;
        Ok(Self {
            prefix,
            suffix,
            flags,
            width,
            precision,
            conversion,
        })
    }

    /// Parse the text after `%`; returns the conversion and the bytes used.
    fn conversion(s: &str) -> Result<((PrintfFlags, usize, Option<u32>, Conversion), usize), String> {
        let bytes = s.as_bytes();
        let mut pos = 0;

        let mut flags = PrintfFlags::empty();
        while let Some(&b) = bytes.get(pos) {
            let flag = match b {
                b',' => PrintfFlags::GROUPING,
                b'+' => PrintfFlags::PLUS,
                b' ' => PrintfFlags::SPACE,
                b'0' => PrintfFlags::ZERO,
                b'-' => PrintfFlags::LEFT,
                _ => break,
            };
            flags |= flag;
            pos += 1;
        }

        let start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        let width = if pos > start {
            atoi_simd::parse::<usize, false, false>(&bytes[start..pos]).map_err(|_| "invalid width".to_string())?
        } else {
            0
        };
        if width > MAX_WIDTH {
            return Err(format!("width {} is larger than {}", width, MAX_WIDTH));
        }

        let mut precision = None;
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            let start = pos;
            while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
            if pos == start {
                return Err("missing precision after '.'".to_string());
            }
            let p = atoi_simd::parse::<u32, false, false>(&bytes[start..pos])
                .map_err(|_| "invalid precision".to_string())?;
            if p > MAX_FRACTION_DIGITS {
                return Err(format!("precision {} is larger than {}", p, MAX_FRACTION_DIGITS));
            }
            precision = Some(p);
        }

        let conversion = match s[pos..].chars().next() {
            Some('d') => Conversion::Integer,
            Some('f') => Conversion::Fixed,
            Some(c) => return Err(format!("unsupported conversion '{}'", c)),
            None => return Err("missing conversion".to_string()),
        };
        if conversion == Conversion::Integer && precision.is_some() {
            return Err("'%d' takes no precision".to_string());
        }
        Ok(((flags, width, precision, conversion), pos + 1))
    }

    fn format(&self, value: Decimal) -> Result<String, String> {
        let scale = match self.conversion {
            Conversion::Integer => {
                if !value.fract().is_zero() {
                    return Err(format!("'%d' needs an integer, got {}", value));
                }
                0
            },
            Conversion::Fixed => self.precision.unwrap_or(6),
        };

        let (negative, int, mut frac) = round_digits(value, scale);
        while frac.len() < scale as usize {
            frac.push('0');
        }
        let int = if self.flags.contains(PrintfFlags::GROUPING) {
            group_digits(&int, 3, ',')
        } else {
            int
        };

        let sign = if negative {
            "-"
        } else if self.flags.contains(PrintfFlags::PLUS) {
            "+"
        } else if self.flags.contains(PrintfFlags::SPACE) {
            " "
        } else {
            ""
        };
        let mut digits = int;
        if !frac.is_empty() {
            digits.push('.');
            digits.push_str(&frac);
        }

        let len = sign.len() + digits.chars().count();
        let pad = self.width.saturating_sub(len);
        let mut body = String::with_capacity(len + pad);
        if self.flags.contains(PrintfFlags::LEFT) {
            body.push_str(sign);
            body.push_str(&digits);
            body.extend(std::iter::repeat_n(' ', pad));
        } else if self.flags.contains(PrintfFlags::ZERO) {
            body.push_str(sign);
            body.extend(std::iter::repeat_n('0', pad));
            body.push_str(&digits);
        } else {
            body.extend(std::iter::repeat_n(' ', pad));
            body.push_str(sign);
            body.push_str(&digits);
        }

        Ok(format!("{}{}{}", self.prefix, body, self.suffix))
    }
}

// ---------------------------------------------------------------------------
// Number patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum AffixPart {
    Literal(String),
    Currency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NumberPattern {
    prefix: Vec<AffixPart>,
    suffix: Vec<AffixPart>,
    multiplier: u32,
    grouping: Option<usize>,
    min_int: usize,
    min_frac: u32,
    max_frac: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prefix,
    Body,
    Suffix,
}

impl NumberPattern {
    fn parse(spec: &str) -> Result<Self, String> {
        let mut phase = Phase::Prefix;
        let mut prefix = Vec::new();
        let mut suffix = Vec::new();
        let mut body = String::new();
        let mut multiplier = 1;

        let mut chars = spec.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '#' | '0' | ',' | '.' if phase != Phase::Suffix => {
                    phase = Phase::Body;
                    body.push(c);
                    continue;
                },
                '#' | '0' | ',' | '.' => return Err(format!("'{}' after the number", c)),
                ';' => return Err("negative subpatterns are not supported".to_string()),
                _ => {},
            }

            if phase == Phase::Body {
                phase = Phase::Suffix;
            }
            let affix = if phase == Phase::Prefix { &mut prefix } else { &mut suffix };
            let part = match c {
                '\'' => AffixPart::Literal(quoted(&mut chars)?),
                '%' | '‰' => {
                    if multiplier != 1 {
                        return Err("more than one percent or per-mille sign".to_string());
                    }
                    multiplier = if c == '%' { 100 } else { 1000 };
                    AffixPart::Literal(c.to_string())
                },
                '¤' => AffixPart::Currency,
                other => AffixPart::Literal(other.to_string()),
            };
            match (affix.last_mut(), part) {
                (Some(AffixPart::Literal(last)), AffixPart::Literal(next)) => last.push_str(&next),
                (_, part) => affix.push(part),
            }
        }

        if phase == Phase::Prefix {
            return Err("no digits".to_string());
        }

        let (int, frac) = match body.split_once('.') {
            Some((_, frac)) if frac.contains('.') => {
                return Err("more than one decimal separator".to_string());
            },
            Some((int, frac)) => (int, frac),
            None => (body.as_str(), ""),
        };

        let mut min_int = 0;
        for c in int.chars() {
            match c {
                '#' if min_int > 0 => return Err("'#' after '0' in the integer part".to_string()),
                '0' => min_int += 1,
                _ => {},
            }
        }
        let grouping = match int.rfind(',') {
            Some(pos) if pos + 1 == int.len() => {
                return Err("grouping separator at the end of the integer part".to_string());
            },
            Some(pos) => Some(int.len() - pos - 1),
            None => None,
        };

        let (mut min_frac, mut max_frac) = (0u32, 0u32);
        for c in frac.chars() {
            match c {
                '0' if max_frac > min_frac => return Err("'0' after '#' in the fraction".to_string()),
                '0' => {
                    min_frac += 1;
                    max_frac += 1;
                },
                '#' => max_frac += 1,
                _ => return Err("grouping separator in the fraction".to_string()),
            }
        }
        if max_frac > MAX_FRACTION_DIGITS {
            return Err(format!("more than {} fraction digits", MAX_FRACTION_DIGITS));
        }
        if !int.contains(['#', '0']) && max_frac == 0 {
            return Err("no digits".to_string());
        }

        Ok(Self {
            prefix,
            suffix,
            multiplier,
            grouping,
            min_int,
            min_frac,
            max_frac,
        })
    }

    fn format(&self, value: Decimal, currency: &str) -> Result<String, String> {
        let scaled = value
            .checked_mul(Decimal::from(self.multiplier))
            .ok_or_else(|| format!("{} is too large", value))?;
        let (negative, int, frac) = round_digits(scaled, self.max_frac);

        let mut frac = frac.trim_end_matches('0').to_string();
        while frac.len() < self.min_frac as usize {
            frac.push('0');
        }

        let mut int = int.trim_start_matches('0').to_string();
        if int.len() < self.min_int {
            int.insert_str(0, &"0".repeat(self.min_int - int.len()));
        }
        if int.is_empty() && frac.is_empty() {
            int.push('0');
        }
        if let Some(size) = self.grouping {
            int = group_digits(&int, size, ',');
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        push_affix(&mut out, &self.prefix, currency);
        out.push_str(&int);
        if !frac.is_empty() {
            out.push('.');
            out.push_str(&frac);
        }
        push_affix(&mut out, &self.suffix, currency);
        Ok(out)
    }
}

fn push_affix(out: &mut String, parts: &[AffixPart], currency: &str) {
    for part in parts {
        match part {
            AffixPart::Literal(s) => out.push_str(s),
            AffixPart::Currency => out.push_str(currency),
        }
    }
}

/// Read a quoted literal after its opening quote; `''` is a literal quote.
fn quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String, String> {
    let mut text = String::new();
    loop {
        match chars.next() {
            Some('\'') if chars.peek() == Some(&'\'') => {
                chars.next();
                text.push('\'');
            },
            Some('\'') if text.is_empty() => return Ok("'".to_string()),
            Some('\'') => return Ok(text),
            Some(c) => text.push(c),
            None => return Err("unterminated quote".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Date patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateItem {
    Numeric(Numeric, Pad),
    Fixed(Fixed),
    /// Fraction of a second, truncated to this many digits (1-3)
    Fraction(u32),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DatePattern {
    items: Vec<DateItem>,
    has_time: bool,
}

impl DatePattern {
    fn parse(spec: &str) -> Result<Self, String> {
        let mut items: Vec<DateItem> = Vec::new();
        let mut has_time = false;
        let mut chars = spec.chars().peekable();

        while let Some(c) = chars.next() {
            let literal = if c == '\'' {
                Some(quoted(&mut chars)?)
            } else if !c.is_ascii_alphabetic() {
                Some(c.to_string())
            } else {
                None
            };
            if let Some(text) = literal {
                match items.last_mut() {
                    Some(DateItem::Literal(last)) => last.push_str(&text),
                    _ => items.push(DateItem::Literal(text)),
                }
                continue;
            }

            let mut count = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                count += 1;
            }
            has_time |= matches!(c, 'H' | 'h' | 'm' | 's' | 'S' | 'a');

            let item = match (c, count) {
                ('y', 2) => DateItem::Numeric(Numeric::YearMod100, Pad::Zero),
                ('y', _) => DateItem::Numeric(Numeric::Year, Pad::Zero),
                ('M', 1) => DateItem::Numeric(Numeric::Month, Pad::None),
                ('M', 2) => DateItem::Numeric(Numeric::Month, Pad::Zero),
                ('M', 3) => DateItem::Fixed(Fixed::ShortMonthName),
                ('M', _) => DateItem::Fixed(Fixed::LongMonthName),
                ('d', 1) => DateItem::Numeric(Numeric::Day, Pad::None),
                ('d', 2) => DateItem::Numeric(Numeric::Day, Pad::Zero),
                ('E', 1..=3) => DateItem::Fixed(Fixed::ShortWeekdayName),
                ('E', _) => DateItem::Fixed(Fixed::LongWeekdayName),
                ('H', 1) => DateItem::Numeric(Numeric::Hour, Pad::None),
                ('H', 2) => DateItem::Numeric(Numeric::Hour, Pad::Zero),
                ('h', 1) => DateItem::Numeric(Numeric::Hour12, Pad::None),
                ('h', 2) => DateItem::Numeric(Numeric::Hour12, Pad::Zero),
                ('m', 1) => DateItem::Numeric(Numeric::Minute, Pad::None),
                ('m', 2) => DateItem::Numeric(Numeric::Minute, Pad::Zero),
                ('s', 1) => DateItem::Numeric(Numeric::Second, Pad::None),
                ('s', 2) => DateItem::Numeric(Numeric::Second, Pad::Zero),
                ('S', 1..=3) => DateItem::Fraction(count as u32),
                ('a', 1) => DateItem::Fixed(Fixed::UpperAmPm),
                (c, n) => {
                    return Err(format!("unsupported pattern letters '{}'", c.to_string().repeat(n)));
                },
            };
            items.push(item);
        }

        if items.iter().all(|item| matches!(item, DateItem::Literal(_))) {
            return Err("no date fields".to_string());
        }
        Ok(Self { items, has_time })
    }

    fn format(&self, date: NaiveDate, time: Option<NaiveTime>) -> Result<String, String> {
        if time.is_none() && self.has_time {
            return Err("time fields used on a date without time".to_string());
        }
        let millis = time.map_or(0, |t| (t.nanosecond() / 1_000_000).min(999));
        let items: Vec<Item<'_>> = self
            .items
            .iter()
            .map(|item| match item {
                DateItem::Numeric(numeric, pad) => Item::Numeric(numeric.clone(), *pad),
                DateItem::Fixed(fixed) => Item::Fixed(fixed.clone()),
                DateItem::Fraction(digits) => {
                    let value = millis / 10u32.pow(3 - digits);
                    Item::OwnedLiteral(format!("{:0width$}", value, width = *digits as usize).into_boxed_str())
                },
                DateItem::Literal(text) => Item::Literal(text),
            })
            .collect();

        let mut out = String::new();
        let written = match time {
            Some(t) => write!(out, "{}", date.and_time(t).format_with_items(items.iter())),
            None => write!(out, "{}", date.format_with_items(items.iter())),
        };
        written.map_err(|_| format!("{} cannot be shown with this pattern", date))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: Value, spec: &str) -> String {
        FormatSpec::parse(spec).unwrap().apply(&value, "$").unwrap()
    }

    fn dec(s: &str) -> Value {
        Value::Decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_default_text() {
        assert_eq!(default_text(&Value::Int(-42)).unwrap(), "-42");
        assert_eq!(default_text(&Value::Float(0.1)).unwrap(), "0.1");
        assert_eq!(default_text(&Value::Bool(false)).unwrap(), "false");
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(default_text(&Value::Date(date)).unwrap(), "2024-03-05");
        let dt = date.and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(default_text(&Value::DateTime(dt)).unwrap(), "2024-03-05T09:30:00");
    }

    #[test]
    fn test_printf() {
        assert_eq!(fmt(dec("150.00"), "%.2f"), "150.00");
        assert_eq!(fmt(dec("150"), "%.2f"), "150.00");
        assert_eq!(fmt(dec("1234567.5"), "%,.2f"), "1,234,567.50");
        assert_eq!(fmt(dec("-3.5"), "%08.2f"), "-0003.50");
        assert_eq!(fmt(Value::Int(5), "%+d"), "+5");
        assert_eq!(fmt(Value::Int(42), "%5d"), "   42");
        assert_eq!(fmt(Value::Int(42), "%-5d|"), "42   |");
        assert_eq!(fmt(Value::Float(2.5), "%.0f"), "2");
        assert_eq!(fmt(Value::Float(0.125), "%.2f%%"), "0.12%");
        assert_eq!(fmt(Value::from("19.999"), "EUR %.2f"), "EUR 20.00");
    }

    #[test]
    fn test_printf_errors() {
        assert!(FormatSpec::parse("%.2q").is_err());
        assert!(FormatSpec::parse("%.2d").is_err());
        assert!(FormatSpec::parse("%d %d").is_err());
        assert!(FormatSpec::parse("%.f").is_err());
        let spec = FormatSpec::parse("%d").unwrap();
        let err = spec.apply(&dec("1.5"), "$").unwrap_err();
        assert_eq!(err.spec, "%d");
        assert!(spec.apply(&Value::from("abc"), "$").is_err());
    }

    #[test]
    fn test_number_patterns() {
        assert_eq!(fmt(Value::Float(1234567.891), "#,##0.00"), "1,234,567.89");
        assert_eq!(fmt(Value::Float(0.125), "0.0%"), "12.5%");
        assert_eq!(fmt(Value::Float(0.5), "#.##"), ".5");
        assert_eq!(fmt(Value::Int(0), "#.##"), "0");
        assert_eq!(fmt(dec("2.5"), "0"), "2");
        assert_eq!(fmt(dec("3.5"), "0"), "4");
        assert_eq!(fmt(dec("-1234.5"), "¤#,##0.00"), "-$1,234.50");
        assert_eq!(fmt(Value::Int(7), "000"), "007");
        assert_eq!(fmt(Value::Int(1234), "'No.' 0"), "No. 1234");
        assert_eq!(fmt(Value::Int(12345678), "#,####"), "1234,5678");
    }

    #[test]
    fn test_number_pattern_errors() {
        assert!(NumberPattern::parse("0.#0").is_err());
        assert!(NumberPattern::parse("0#").is_err());
        assert!(NumberPattern::parse("0.0.0").is_err());
        assert!(NumberPattern::parse("#,").is_err());
        assert!(NumberPattern::parse("0;(0)").is_err());
        assert!(FormatSpec::parse("xyz").is_err());
    }

    #[test]
    fn test_date_patterns() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(fmt(Value::Date(date), "dd MMM yyyy"), "05 Mar 2024");
        assert_eq!(fmt(Value::Date(date), "EEEE, d MMMM yy"), "Tuesday, 5 March 24");
        assert_eq!(fmt(Value::Date(date), "dd/MM/yyyy"), "05/03/2024");

        let dt = date.and_hms_milli_opt(14, 7, 9, 123).unwrap();
        assert_eq!(fmt(Value::DateTime(dt), "yyyy-MM-dd HH:mm:ss.SSS"), "2024-03-05 14:07:09.123");
        assert_eq!(fmt(Value::DateTime(dt), "ss.S"), "09.1");
        assert_eq!(fmt(Value::DateTime(dt), "ss.SS"), "09.12");
        let late = date.and_hms_milli_opt(0, 0, 0, 987).unwrap();
        assert_eq!(fmt(Value::DateTime(late), "s.SS"), "0.98");
        assert!(FormatSpec::parse("HH:mm:ss.SSSS").is_err());
        assert_eq!(fmt(Value::DateTime(dt), "h:mm a"), "2:07 PM");
        assert_eq!(fmt(Value::DateTime(dt), "yyyy-MM-dd'T'HH 'o''clock'"), "2024-03-05T14 o'clock");
        assert_eq!(fmt(Value::from("2024-03-05"), "d MMM"), "5 Mar");
    }

    #[test]
    fn test_date_pattern_errors() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let spec = FormatSpec::parse("HH:mm").unwrap();
        assert!(spec.apply(&Value::Date(date), "$").is_err());
        assert!(DatePattern::parse("yyyy-QQ").is_err());
        assert!(FormatSpec::parse("'unterminated").is_err());
    }

    #[test]
    fn test_keywords_and_choice() {
        assert_eq!(fmt(Value::from("ada lovelace"), "capitalize"), "Ada lovelace");
        assert_eq!(fmt(Value::from("Ada"), "upper"), "ADA");
        assert_eq!(fmt(Value::from("  x "), "trim"), "x");
        assert_eq!(fmt(Value::Int(3), "lower"), "3");
        assert_eq!(fmt(Value::Bool(true), "Yes/No"), "Yes");
        assert_eq!(fmt(Value::Bool(false), "Yes/No"), "No");
        assert_eq!(fmt(Value::Null, "#,##0.00"), "");
        let spec = FormatSpec::parse("0.00").unwrap();
        assert!(spec.apply(&Value::Bool(true), "$").is_err());
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits("1234567", 3, ','), "1,234,567");
        assert_eq!(group_digits("123456", 3, ','), "123,456");
        assert_eq!(group_digits("12", 3, ','), "12");
    }
}
