//! Concrete non-numeric value types: tokens, asset paths, dictionaries,
//! composition arc records, and the small closed enums.

use std::fmt;
use std::sync::Arc;

use crate::path::Path;
use crate::value::Value;

/// Interned immutable string. Cheap to clone, compares by content.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(Arc<str>);

impl Token {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(Arc::from(s.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Reference to an external asset, with an optionally resolved filesystem
/// location. The core resolves against the layer's base directory but never
/// opens the asset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetPath {
    pub asset_path: String,
    pub resolved_path: Option<String>,
}

impl AssetPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            asset_path: path.into(),
            resolved_path: None,
        }
    }

    /// Resolve a relative asset path against a base directory.
    /// Absolute paths and empty base directories are left untouched.
    pub fn resolve(&mut self, base_dir: &str) {
        if self.resolved_path.is_some() || base_dir.is_empty() {
            return;
        }
        if self.asset_path.starts_with('/') || self.asset_path.is_empty() {
            return;
        }
        let mut resolved = String::with_capacity(base_dir.len() + 1 + self.asset_path.len());
        resolved.push_str(base_dir);
        if !base_dir.ends_with('/') {
            resolved.push('/');
        }
        resolved.push_str(&self.asset_path);
        self.resolved_path = Some(resolved);
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}@", self.asset_path)
    }
}

/// Insertion-ordered string-keyed map of values (`dictionary` in USD).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<(String, Value)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any entry with the same key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        for (k, v) in &mut self.entries {
            if k == &key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.set(k, v);
        }
        dict
    }
}

/// Time remapping applied by a composition arc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerOffset {
    pub offset: f64,
    pub scale: f64,
}

impl Default for LayerOffset {
    fn default() -> Self {
        Self {
            offset: 0.0,
            scale: 1.0,
        }
    }
}

impl LayerOffset {
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.offset == 0.0 && self.scale == 1.0
    }
}

/// A `references` composition arc entry. The reader records arcs; it does
/// not flatten them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reference {
    pub asset_path: AssetPath,
    pub prim_path: Path,
    pub layer_offset: LayerOffset,
    pub custom_data: Dictionary,
}

/// A `payload` composition arc entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    pub asset_path: AssetPath,
    pub prim_path: Path,
    pub layer_offset: LayerOffset,
}

/// Prim specifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Specifier {
    #[default]
    Def = 0,
    Over = 1,
    Class = 2,
}

impl Specifier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Over => "over",
            Self::Class => "class",
        }
    }

    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Def),
            1 => Some(Self::Over),
            2 => Some(Self::Class),
            _ => None,
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Property permission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Permission {
    #[default]
    Public = 0,
    Private = 1,
}

impl Permission {
    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Public),
            1 => Some(Self::Private),
            _ => None,
        }
    }
}

/// Attribute variability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Variability {
    #[default]
    Varying = 0,
    Uniform = 1,
    Config = 2,
}

impl Variability {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Varying => "varying",
            Self::Uniform => "uniform",
            Self::Config => "config",
        }
    }

    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Varying),
            1 => Some(Self::Uniform),
            2 => Some(Self::Config),
            _ => None,
        }
    }
}

/// Model kind metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Model,
    Group,
    Assembly,
    Component,
    Subcomponent,
    SceneLibrary,
}

impl Kind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "model" => Some(Self::Model),
            "group" => Some(Self::Group),
            "assembly" => Some(Self::Assembly),
            "component" => Some(Self::Component),
            "subcomponent" => Some(Self::Subcomponent),
            "sceneLibrary" => Some(Self::SceneLibrary),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Group => "group",
            Self::Assembly => "assembly",
            Self::Component => "component",
            Self::Subcomponent => "subcomponent",
            Self::SceneLibrary => "sceneLibrary",
        }
    }
}

/// Stage up axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "X" => Some(Self::X),
            "Y" => Some(Self::Y),
            "Z" => Some(Self::Z),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }
}

/// Primvar interpolation metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interpolation {
    Constant,
    Uniform,
    Varying,
    Vertex,
    FaceVarying,
}

impl Interpolation {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "constant" => Some(Self::Constant),
            "uniform" => Some(Self::Uniform),
            "varying" => Some(Self::Varying),
            "vertex" => Some(Self::Vertex),
            "faceVarying" => Some(Self::FaceVarying),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Uniform => "uniform",
            Self::Varying => "varying",
            Self::Vertex => "vertex",
            Self::FaceVarying => "faceVarying",
        }
    }
}
