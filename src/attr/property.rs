//! Properties: the discriminated slot a Prim holds under each name.

use crate::attr::{Attribute, TimeSampleInterpolation};
use crate::listop::ListEditQual;
use crate::path::Path;
use crate::value::ValueTyped;

/// A relationship: one or more target paths plus a list-edit qualifier.
///
/// Targets are references by name; a relationship never owns the prims or
/// properties it points at.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Relationship {
    targets: Vec<Path>,
    single: bool,
    pub list_edit: ListEditQual,
}

impl Relationship {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single target.
    pub fn set_single(&mut self, path: Path) {
        self.targets = vec![path];
        self.single = true;
    }

    /// Set a target list.
    pub fn set_vector(&mut self, paths: Vec<Path>) {
        self.targets = paths;
        self.single = false;
    }

    #[inline]
    pub fn targets(&self) -> &[Path] {
        &self.targets
    }

    /// True when authored as a single target rather than a list.
    #[inline]
    pub fn is_single(&self) -> bool {
        self.single
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A typed connection: target property path(s) plus the declared value
/// type name of the source attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Connection {
    pub type_name: String,
    targets: Vec<Path>,
    single: bool,
    pub list_edit: ListEditQual,
}

impl Connection {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn set_single(&mut self, path: Path) {
        self.targets = vec![path];
        self.single = true;
    }

    pub fn set_vector(&mut self, paths: Vec<Path>) {
        self.targets = paths;
        self.single = false;
    }

    #[inline]
    pub fn targets(&self) -> &[Path] {
        &self.targets
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.single
    }
}

/// The shape of a property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKind {
    /// Declared attribute with neither value nor connection
    /// (e.g. `float outputs:r`); carries the declared type name.
    EmptyAttribute(String),
    /// Attribute with a value container.
    Attribute(Attribute),
    /// Relationship with targets.
    Relationship(Relationship),
    /// `rel` declaration with no targets authored.
    NoTargetsRelationship,
    /// Typed connection to other property path(s).
    Connection(Connection),
}

/// A named slot on a Prim.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    kind: PropertyKind,
    custom: bool,
}

impl Property {
    pub fn new(kind: PropertyKind, custom: bool) -> Self {
        Self { kind, custom }
    }

    pub fn new_attribute(attr: Attribute, custom: bool) -> Self {
        Self::new(PropertyKind::Attribute(attr), custom)
    }

    pub fn new_empty_attribute(type_name: impl Into<String>, custom: bool) -> Self {
        Self::new(PropertyKind::EmptyAttribute(type_name.into()), custom)
    }

    pub fn new_relationship(rel: Relationship, custom: bool) -> Self {
        Self::new(PropertyKind::Relationship(rel), custom)
    }

    pub fn new_connection(conn: Connection, custom: bool) -> Self {
        Self::new(PropertyKind::Connection(conn), custom)
    }

    #[inline]
    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    #[inline]
    pub fn custom(&self) -> bool {
        self.custom
    }

    pub fn set_custom(&mut self, custom: bool) {
        self.custom = custom;
    }

    #[inline]
    pub fn is_attribute(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::Attribute(_) | PropertyKind::EmptyAttribute(_)
        )
    }

    #[inline]
    pub fn is_relationship(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::Relationship(_) | PropertyKind::NoTargetsRelationship
        )
    }

    #[inline]
    pub fn is_connection(&self) -> bool {
        matches!(self.kind, PropertyKind::Connection(_))
    }

    pub fn attribute(&self) -> Option<&Attribute> {
        match &self.kind {
            PropertyKind::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn attribute_mut(&mut self) -> Option<&mut Attribute> {
        match &mut self.kind {
            PropertyKind::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn relationship(&self) -> Option<&Relationship> {
        match &self.kind {
            PropertyKind::Relationship(rel) => Some(rel),
            _ => None,
        }
    }

    pub fn connection(&self) -> Option<&Connection> {
        match &self.kind {
            PropertyKind::Connection(conn) => Some(conn),
            _ => None,
        }
    }

    /// Declared value type name, when the property has one.
    pub fn value_type_name(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::EmptyAttribute(ty) => Some(ty),
            PropertyKind::Attribute(attr) => Some(attr.type_name()),
            PropertyKind::Connection(conn) => Some(&conn.type_name),
            _ => None,
        }
    }

    /// Connection target paths, empty unless this is a connection.
    pub fn connection_targets(&self) -> &[Path] {
        match &self.kind {
            PropertyKind::Connection(conn) => conn.targets(),
            _ => &[],
        }
    }

    /// Convenience: evaluate the attribute at the default probe.
    pub fn get_value<T: ValueTyped + Clone>(&self) -> Option<T> {
        self.attribute().and_then(|a| a.get_value::<T>())
    }

    /// Convenience: evaluate the attribute at time `t`.
    pub fn get_value_at<T: ValueTyped + Clone>(
        &self,
        t: f64,
        interp: TimeSampleInterpolation,
    ) -> Option<T> {
        self.attribute().and_then(|a| a.get_value_at::<T>(t, interp))
    }
}
