//! Path lookup against nested render scopes.
//!
//! Each repeated region pushes a [`Scope`] whose current value is the element
//! being rendered. The first segment of a path is looked up from the
//! innermost scope outwards, so fields of enclosing elements and of the data
//! root stay reachable inside a block; the remaining segments descend from
//! whatever the first one found, with no further fallback.
use crate::template::token::Path;
use crate::template::value::Value;
use std::borrow::Cow;

/// Position of the element bound by a list region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub index: usize,
    pub len: usize,
}

/// One level of the render context.
#[derive(Debug)]
pub struct Scope<'s> {
    current: &'s Value,
    parent: Option<&'s Scope<'s>>,
    position: Option<Position>,
}

impl<'s> Scope<'s> {
    /// The outermost scope, bound to the data root.
    pub fn root(value: &'s Value) -> Self {
        Self {
            current: value,
            parent: None,
            position: None,
        }
    }

    /// A nested scope whose current value is `current`.
    pub fn child<'c>(&'c self, current: &'c Value, position: Option<Position>) -> Scope<'c>
    where
        's: 'c,
    {
        Scope {
            current,
            parent: Some(self),
            position,
        }
    }

    /// The value the innermost region is bound to.
    #[inline]
    pub fn current(&self) -> &'s Value {
        self.current
    }

    /// Resolve `path`; `None` means absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::Value;
    /// use quince::template::resolver::Scope;
    /// use quince::template::token::Path;
    ///
    /// let data = Value::map([(
    ///     "invoice",
    ///     Value::map([("customer", Value::map([("name", Value::from("Ada"))]))]),
    /// )]);
    /// let scope = Scope::root(&data);
    ///
    /// let name = scope.resolve(&Path::parse("invoice.customer.name").unwrap());
    /// assert_eq!(name.as_deref(), Some(&Value::from("Ada")));
    /// assert!(scope.resolve(&Path::parse("invoice.customer.phone").unwrap()).is_none());
    /// ```
    pub fn resolve(&self, path: &Path) -> Option<Cow<'s, Value>> {
        let Some((first, rest)) = path.segments().split_first() else {
            return Some(Cow::Borrowed(self.current));
        };

        let mut value = if path.is_anchored() {
            field(self.current, first)?
        } else if first.starts_with('@') {
            Cow::Owned(self.variable(first)?)
        } else {
            self.frames().find_map(|frame| field(frame.current, first))?
        };

        for segment in rest {
            value = match value {
                Cow::Borrowed(v) => field(v, segment)?,
                Cow::Owned(v) => Cow::Owned(field(&v, segment)?.into_owned()),
            };
        }
        Some(value)
    }

    /// Scope variables read the innermost list position.
    fn variable(&self, name: &str) -> Option<Value> {
        let pos = self.frames().find_map(|frame| frame.position)?;
        let value = match name {
            "@index" => Value::from(pos.index),
            "@number" => Value::from(pos.index + 1),
            "@first" => Value::Bool(pos.index == 0),
            "@last" => Value::Bool(pos.index + 1 == pos.len),
            _ => return None,
        };
        Some(value)
    }

    fn frames(&self) -> impl Iterator<Item = &Scope<'s>> {
        std::iter::successors(Some(self), |scope| scope.parent)
    }
}

/// One step of a path: a map key, an object field or a list index.
fn field<'a>(value: &'a Value, segment: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Map(map) => map.get(segment).map(Cow::Borrowed),
        Value::List(items) => {
            let index = atoi_simd::parse::<usize, false, false>(segment.as_bytes()).ok()?;
            items.get(index).map(Cow::Borrowed)
        },
        Value::Object(source) => source.field(segment).map(Cow::Owned),
        _ => None,
    }
}
