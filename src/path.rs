//! Scene-graph paths.
//!
//! A [`Path`] is an immutable `(prim_part, prop_part, element)` triple:
//! `/Root/Cube` names a prim, `/Root/Cube.size` names a property on it.
//! Canonical forms: the root is `("/", "", "")`; an absolute prim path
//! `("/A/B", "", "B")`; a property path `("/A/B", "prop:sub", "prop:sub")`.
//!
//! Relational-attribute brackets (`[...]`), variant selections (`{...}`)
//! and `..` segments are not supported; constructing such a path yields
//! the invalid path.

use std::fmt;
use std::hash::{Hash, Hasher};

/// What a path denotes. Recorded when known; equality ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathType {
    Prim,
    PrimProperty,
    RelationalAttribute,
    MapperArg,
    Target,
    Mapper,
    PrimVariantSelection,
    Expression,
    Root,
}

/// Immutable scene-graph path.
#[derive(Clone, Debug, Default)]
pub struct Path {
    prim_part: String,
    prop_part: String,
    element: String,
    path_type: Option<PathType>,
    valid: bool,
}

impl Path {
    /// The absolute root path `/`.
    pub fn root() -> Self {
        Self {
            prim_part: "/".to_string(),
            prop_part: String::new(),
            element: String::new(),
            path_type: Some(PathType::Root),
            valid: true,
        }
    }

    /// The invalid path.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Construct from a prim part and a property part; either may be empty.
    ///
    /// Trailing `/` is stripped (except on the root). Unsupported syntax
    /// yields the invalid path.
    pub fn new(prim_part: &str, prop_part: &str) -> Self {
        if !is_supported_syntax(prim_part) || !is_supported_syntax(prop_part) {
            return Self::invalid();
        }
        if prim_part.is_empty() && prop_part.is_empty() {
            return Self::invalid();
        }
        if prim_part == "/" && prop_part.is_empty() {
            return Self::root();
        }

        let mut prim = prim_part.to_string();
        while prim.len() > 1 && prim.ends_with('/') {
            prim.pop();
        }

        if !prop_part.is_empty() {
            // Property path; prim part may be empty for a relative `.prop`.
            return Self {
                prim_part: prim,
                prop_part: prop_part.to_string(),
                element: prop_part.to_string(),
                path_type: Some(PathType::PrimProperty),
                valid: true,
            };
        }

        let element = prim
            .rsplit('/')
            .next()
            .unwrap_or(prim.as_str())
            .to_string();
        Self {
            prim_part: prim,
            prop_part: String::new(),
            element,
            path_type: Some(PathType::Prim),
            valid: true,
        }
    }

    /// Parse a full path string of the form `prim` or `prim.prop`.
    pub fn from_string(s: &str) -> Self {
        match s.find('.') {
            Some(pos) => Self::new(&s[..pos], &s[pos + 1..]),
            None => Self::new(s, ""),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.valid && self.prim_part == "/" && self.prop_part.is_empty()
    }

    /// True when the prim part starts with `/`.
    #[inline]
    pub fn is_absolute(&self) -> bool {
        self.valid && self.prim_part.starts_with('/')
    }

    /// True when this path denotes a property.
    #[inline]
    pub fn is_property(&self) -> bool {
        self.valid && !self.prop_part.is_empty()
    }

    #[inline]
    pub fn prim_part(&self) -> &str {
        &self.prim_part
    }

    #[inline]
    pub fn prop_part(&self) -> &str {
        &self.prop_part
    }

    /// The element (leaf) name: the last prim component, or the property
    /// name for property paths. Empty for the root.
    #[inline]
    pub fn element_name(&self) -> &str {
        &self.element
    }

    #[inline]
    pub fn path_type(&self) -> Option<PathType> {
        self.path_type
    }

    /// Full name, `prim_part` joined with `.prop_part` when present.
    pub fn full_path_name(&self) -> String {
        if self.prop_part.is_empty() {
            self.prim_part.clone()
        } else {
            format!("{}.{}", self.prim_part, self.prop_part)
        }
    }

    /// Append a prim element. Requires an empty property part.
    pub fn append_element(&self, elem: &str) -> Self {
        if !self.valid || !self.prop_part.is_empty() || elem.is_empty() {
            return Self::invalid();
        }
        if !is_supported_syntax(elem) || elem.contains('/') {
            return Self::invalid();
        }
        let prim = if self.prim_part == "/" {
            format!("/{elem}")
        } else {
            format!("{}/{elem}", self.prim_part)
        };
        Self {
            prim_part: prim,
            prop_part: String::new(),
            element: elem.to_string(),
            path_type: Some(PathType::Prim),
            valid: true,
        }
    }

    /// Append a property name. Requires an empty property part.
    pub fn append_property(&self, prop: &str) -> Self {
        if !self.valid || !self.prop_part.is_empty() || prop.is_empty() {
            return Self::invalid();
        }
        if !is_supported_syntax(prop) || prop.contains('/') {
            return Self::invalid();
        }
        Self {
            prim_part: self.prim_part.clone(),
            prop_part: prop.to_string(),
            element: prop.to_string(),
            path_type: Some(PathType::PrimProperty),
            valid: true,
        }
    }

    /// Peel the first element off an absolute path:
    /// `/A/B` yields `(/A, B)`, `/A` yields `(/A, invalid)`,
    /// `A` yields `(invalid, A)`.
    pub fn split_at_root(&self) -> (Self, Self) {
        if !self.valid {
            return (Self::invalid(), Self::invalid());
        }
        if !self.is_absolute() {
            return (Self::invalid(), self.clone());
        }
        if self.is_root() {
            return (Self::root(), Self::invalid());
        }

        let rest = &self.prim_part[1..];
        match rest.find('/') {
            Some(pos) => {
                let head = Self::new(&self.prim_part[..pos + 1], "");
                let tail = Self::new(&rest[pos + 1..], &self.prop_part);
                (head, tail)
            }
            None => {
                let head = Self::new(&self.prim_part, "");
                if self.prop_part.is_empty() {
                    (head, Self::invalid())
                } else {
                    (head, Self::new("", &self.prop_part))
                }
            }
        }
    }

    /// The parent prim path. Invalid for the root, for single-element
    /// paths, and for relative paths without a parent.
    pub fn parent_prim(&self) -> Self {
        if !self.valid || self.is_root() {
            return Self::invalid();
        }
        // For a property path the parent prim is the prim part itself.
        if !self.prop_part.is_empty() {
            return Self::new(&self.prim_part, "");
        }
        match self.prim_part.rfind('/') {
            Some(0) => Self::invalid(),
            Some(pos) => Self::new(&self.prim_part[..pos], ""),
            None => Self::invalid(),
        }
    }

    /// Express this path relative to `base`. Both must be absolute and
    /// `self` must be at or under `base`; otherwise `self` is returned
    /// unchanged.
    pub fn make_relative(&self, base: &Path) -> Self {
        if !self.is_absolute() || !base.is_absolute() || !base.prop_part.is_empty() {
            return self.clone();
        }
        if self.prim_part == base.prim_part {
            return Self::new("", &self.prop_part);
        }
        let prefix = if base.is_root() {
            "/".to_string()
        } else {
            format!("{}/", base.prim_part)
        };
        match self.prim_part.strip_prefix(&prefix) {
            Some(rest) => Self::new(rest, &self.prop_part),
            None => self.clone(),
        }
    }
}

fn is_supported_syntax(part: &str) -> bool {
    !(part.contains('[')
        || part.contains(']')
        || part.contains('{')
        || part.contains('}')
        || part.contains(".."))
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.valid == other.valid
            && self.prim_part == other.prim_part
            && self.prop_part == other.prop_part
            && self.element == other.element
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.valid.hash(state);
        self.prim_part.hash(state);
        self.prop_part.hash(state);
        self.element.hash(state);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return write!(f, "<invalid>");
        }
        if self.prop_part.is_empty() {
            write!(f, "{}", self.prim_part)
        } else {
            write!(f, "{}.{}", self.prim_part, self.prop_part)
        }
    }
}
