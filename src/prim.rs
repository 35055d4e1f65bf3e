//! Prims: typed nodes of the scene graph.
//!
//! A [`Prim`] owns its typed body, its ordered properties, and its child
//! prims; a [`crate::stage::Stage`] owns the root prims. Paths stored in
//! properties (connections, relationship targets) are references by name,
//! never ownership, which keeps the tree movable without cycle breakers.

use std::fmt;
use std::ops::Index;

use crate::attr::Property;
use crate::listop::ListEditQual;
use crate::path::Path;
use crate::schema::PrimBody;
use crate::value::{Dictionary, Kind, Payload, Reference, Specifier, Token};

/// Recognized applied API schema names. The set is closed; unknown names
/// are a structural error at decode time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiSchemaName {
    MaterialBindingAPI,
    SkelBindingAPI,
    ShapingAPI,
    CollectionAPI,
    VisibilityAPI,
    GeomModelAPI,
    MotionAPI,
    PhysicsRigidBodyAPI,
    PhysicsCollisionAPI,
    PhysicsMassAPI,
}

impl ApiSchemaName {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MaterialBindingAPI" => Some(Self::MaterialBindingAPI),
            "SkelBindingAPI" => Some(Self::SkelBindingAPI),
            "ShapingAPI" => Some(Self::ShapingAPI),
            "CollectionAPI" => Some(Self::CollectionAPI),
            "VisibilityAPI" => Some(Self::VisibilityAPI),
            "GeomModelAPI" => Some(Self::GeomModelAPI),
            "MotionAPI" => Some(Self::MotionAPI),
            "PhysicsRigidBodyAPI" => Some(Self::PhysicsRigidBodyAPI),
            "PhysicsCollisionAPI" => Some(Self::PhysicsCollisionAPI),
            "PhysicsMassAPI" => Some(Self::PhysicsMassAPI),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaterialBindingAPI => "MaterialBindingAPI",
            Self::SkelBindingAPI => "SkelBindingAPI",
            Self::ShapingAPI => "ShapingAPI",
            Self::CollectionAPI => "CollectionAPI",
            Self::VisibilityAPI => "VisibilityAPI",
            Self::GeomModelAPI => "GeomModelAPI",
            Self::MotionAPI => "MotionAPI",
            Self::PhysicsRigidBodyAPI => "PhysicsRigidBodyAPI",
            Self::PhysicsCollisionAPI => "PhysicsCollisionAPI",
            Self::PhysicsMassAPI => "PhysicsMassAPI",
        }
    }
}

impl fmt::Display for ApiSchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Applied API schemas with the single qualifier they were authored under.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiSchemas {
    pub list_edit: ListEditQual,
    pub names: Vec<ApiSchemaName>,
}

/// Variant selections authored on a prim, in authored order.
pub type VariantSelectionMap = Vec<(String, String)>;

/// Prim-level metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimMeta {
    pub active: Option<bool>,
    pub hidden: Option<bool>,
    pub kind: Option<Kind>,
    pub asset_info: Option<Dictionary>,
    pub custom_data: Option<Dictionary>,
    pub doc: Option<String>,
    pub comment: Option<String>,
    pub display_name: Option<String>,
    pub scene_name: Option<String>,
    pub api_schemas: Option<ApiSchemas>,
    // Composition arcs are recorded, not flattened.
    pub references: Option<(ListEditQual, Vec<Reference>)>,
    pub payload: Option<(ListEditQual, Vec<Payload>)>,
    pub inherits: Option<(ListEditQual, Vec<Path>)>,
    pub specializes: Option<(ListEditQual, Vec<Path>)>,
    pub variant_sets: Option<(ListEditQual, Vec<Token>)>,
    pub variants: Option<VariantSelectionMap>,
    /// Unrecognized metadata fields, in authored order.
    pub meta: Dictionary,
    /// Free-standing comment strings.
    pub strings: Vec<String>,
}

impl PrimMeta {
    pub fn authored(&self) -> bool {
        self.active.is_some()
            || self.hidden.is_some()
            || self.kind.is_some()
            || self.asset_info.is_some()
            || self.custom_data.is_some()
            || self.doc.is_some()
            || self.comment.is_some()
            || self.display_name.is_some()
            || self.scene_name.is_some()
            || self.api_schemas.is_some()
            || self.references.is_some()
            || self.payload.is_some()
            || self.inherits.is_some()
            || self.specializes.is_some()
            || self.variant_sets.is_some()
            || self.variants.is_some()
            || !self.meta.is_empty()
            || !self.strings.is_empty()
    }
}

/// Insertion-ordered map of properties keyed by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, Property)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, replacing an existing entry of the same name in
    /// place (order preserved).
    pub fn insert(&mut self, name: impl Into<String>, prop: Property) {
        let name = name.into();
        for (k, v) in &mut self.entries {
            if k == &name {
                *v = prop;
                return;
            }
        }
        self.entries.push((name, prop));
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Index<&str> for PropertyMap {
    type Output = Property;

    /// Panics when the property is absent; use [`PropertyMap::get`] for a
    /// fallible lookup.
    fn index(&self, name: &str) -> &Property {
        self.get(name)
            .unwrap_or_else(|| panic!("no property named `{name}`"))
    }
}

/// Properties and children selected by one variant of a variantSet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariantContent {
    pub props: PropertyMap,
    pub children: Vec<Prim>,
}

/// A node in the scene graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Prim {
    name: String,
    element_path: Path,
    abs_path: Path,
    specifier: Specifier,
    body: PrimBody,
    pub meta: PrimMeta,
    props: PropertyMap,
    children: Vec<Prim>,
    /// Per-variant content, keyed `variantSet=variant`. Populated only
    /// when variants are captured; selection is not applied here.
    variants: Vec<(String, VariantContent)>,
}

impl Prim {
    pub fn new(name: impl Into<String>, body: PrimBody) -> Self {
        let name = name.into();
        let element_path = Path::new(&name, "");
        Self {
            name,
            element_path,
            abs_path: Path::invalid(),
            specifier: Specifier::Def,
            body,
            meta: PrimMeta::default(),
            props: PropertyMap::new(),
            children: Vec::new(),
            variants: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leaf name as a path.
    #[inline]
    pub fn element_path(&self) -> &Path {
        &self.element_path
    }

    /// Absolute path of this prim within its stage.
    #[inline]
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    pub fn set_abs_path(&mut self, path: Path) {
        self.abs_path = path;
    }

    #[inline]
    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    pub fn set_specifier(&mut self, specifier: Specifier) {
        self.specifier = specifier;
    }

    #[inline]
    pub fn body(&self) -> &PrimBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut PrimBody {
        &mut self.body
    }

    /// The prim's schema type name (`"Xform"`, `"Mesh"`, ...).
    pub fn type_name(&self) -> &'static str {
        self.body.type_name()
    }

    #[inline]
    pub fn properties(&self) -> &PropertyMap {
        &self.props
    }

    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.props
    }

    #[inline]
    pub fn children(&self) -> &[Prim] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Prim> {
        &mut self.children
    }

    pub fn add_child(&mut self, child: Prim) {
        self.children.push(child);
    }

    pub fn find_child(&self, name: &str) -> Option<&Prim> {
        self.children.iter().find(|c| c.name == name)
    }

    #[inline]
    pub fn variants(&self) -> &[(String, VariantContent)] {
        &self.variants
    }

    pub fn variants_mut(&mut self) -> &mut Vec<(String, VariantContent)> {
        &mut self.variants
    }
}
