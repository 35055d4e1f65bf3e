//! Typed Prim records.
//!
//! Each schema type a Prim can declare (`Xform`, `Mesh`, `Sphere`, ...) is
//! a record in the value universe with a type id in the Prim range. The
//! records carry the characteristic attributes of their schema as typed
//! wrappers; everything else a prim authors stays in its property map.

use crate::attr::{PropertyKind, TypedAttribute, TypedAttributeWithFallback,
    TypedTerminalAttribute};
use crate::prim::PropertyMap;
use crate::util::{DMat4, Vec2, Vec3};
use crate::value::{AssetPath, Token, ValueTyped, PRIM_TYPE_ID_BASE};

/// Fallback prim record, used when `typeName` is missing or unknown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {}

/// Grouping prim with no transform of its own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {}

/// Transform node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Xform {
    pub xform_op_order: TypedAttribute<Vec<Token>>,
}

/// Polygon mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomMesh {
    pub points: TypedAttribute<Vec<Vec3>>,
    pub face_vertex_indices: TypedAttribute<Vec<i32>>,
    pub face_vertex_counts: TypedAttribute<Vec<i32>>,
    pub normals: TypedAttribute<Vec<Vec3>>,
    pub double_sided: TypedAttributeWithFallback<bool>,
}

/// Subset of mesh faces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomSubset {
    pub indices: TypedAttribute<Vec<i32>>,
}

/// Point cloud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomPoints {
    pub points: TypedAttribute<Vec<Vec3>>,
    pub widths: TypedAttribute<Vec<f32>>,
}

/// Axis-aligned cube.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomCube {
    pub size: TypedAttributeWithFallback<f64>,
}

impl Default for GeomCube {
    fn default() -> Self {
        Self {
            size: TypedAttributeWithFallback::new(2.0),
        }
    }
}

/// Sphere.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomSphere {
    pub radius: TypedAttributeWithFallback<f64>,
}

impl Default for GeomSphere {
    fn default() -> Self {
        Self {
            radius: TypedAttributeWithFallback::new(1.0),
        }
    }
}

/// Cylinder along an axis.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomCylinder {
    pub radius: TypedAttributeWithFallback<f64>,
    pub height: TypedAttributeWithFallback<f64>,
    pub axis: TypedAttributeWithFallback<Token>,
}

impl Default for GeomCylinder {
    fn default() -> Self {
        Self {
            radius: TypedAttributeWithFallback::new(1.0),
            height: TypedAttributeWithFallback::new(2.0),
            axis: TypedAttributeWithFallback::new(Token::new("Z")),
        }
    }
}

/// Capsule along an axis.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomCapsule {
    pub radius: TypedAttributeWithFallback<f64>,
    pub height: TypedAttributeWithFallback<f64>,
    pub axis: TypedAttributeWithFallback<Token>,
}

impl Default for GeomCapsule {
    fn default() -> Self {
        Self {
            radius: TypedAttributeWithFallback::new(0.5),
            height: TypedAttributeWithFallback::new(1.0),
            axis: TypedAttributeWithFallback::new(Token::new("Z")),
        }
    }
}

/// Cone along an axis.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomCone {
    pub radius: TypedAttributeWithFallback<f64>,
    pub height: TypedAttributeWithFallback<f64>,
    pub axis: TypedAttributeWithFallback<Token>,
}

impl Default for GeomCone {
    fn default() -> Self {
        Self {
            radius: TypedAttributeWithFallback::new(1.0),
            height: TypedAttributeWithFallback::new(2.0),
            axis: TypedAttributeWithFallback::new(Token::new("Z")),
        }
    }
}

/// Basis curves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomBasisCurves {
    pub curve_vertex_counts: TypedAttribute<Vec<i32>>,
    pub points: TypedAttribute<Vec<Vec3>>,
    pub widths: TypedAttribute<Vec<f32>>,
}

/// NURBS curves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomNurbsCurves {
    pub curve_vertex_counts: TypedAttribute<Vec<i32>>,
    pub points: TypedAttribute<Vec<Vec3>>,
    pub order: TypedAttribute<Vec<i32>>,
    pub knots: TypedAttribute<Vec<f64>>,
}

/// Camera.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomCamera {
    pub focal_length: TypedAttributeWithFallback<f32>,
    pub horizontal_aperture: TypedAttributeWithFallback<f32>,
    pub vertical_aperture: TypedAttributeWithFallback<f32>,
    pub clipping_range: TypedAttributeWithFallback<Vec2>,
}

impl Default for GeomCamera {
    fn default() -> Self {
        Self {
            focal_length: TypedAttributeWithFallback::new(50.0),
            horizontal_aperture: TypedAttributeWithFallback::new(20.955),
            vertical_aperture: TypedAttributeWithFallback::new(15.2908),
            clipping_range: TypedAttributeWithFallback::new(Vec2::new(1.0, 1.0e6)),
        }
    }
}

/// Instancer scattering prototypes at positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointInstancer {
    pub positions: TypedAttribute<Vec<Vec3>>,
    pub proto_indices: TypedAttribute<Vec<i32>>,
}

/// Material with output terminals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub surface: TypedTerminalAttribute<Token>,
    pub displacement: TypedTerminalAttribute<Token>,
    pub volume: TypedTerminalAttribute<Token>,
}

/// Shader node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shader {
    pub info_id: TypedAttribute<Token>,
}

/// Container for shading networks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeGraph {}

/// Root of a skeleton hierarchy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkelRoot {}

/// Skeleton joints and bind state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    pub joints: TypedAttribute<Vec<Token>>,
    pub bind_transforms: TypedAttribute<Vec<DMat4>>,
    pub rest_transforms: TypedAttribute<Vec<DMat4>>,
}

/// Joint animation source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkelAnimation {
    pub joints: TypedAttribute<Vec<Token>>,
}

/// Blend shape offsets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlendShape {
    pub offsets: TypedAttribute<Vec<Vec3>>,
    pub point_indices: TypedAttribute<Vec<i32>>,
}

macro_rules! lux_light {
    ($(#[$doc:meta])* $name:ident { $($field:ident: $ty:ty = $fallback:expr),* $(,)? }) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            pub intensity: TypedAttributeWithFallback<f32>,
            pub color: TypedAttributeWithFallback<Vec3>,
            $(pub $field: $ty),*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    intensity: TypedAttributeWithFallback::new(1.0),
                    color: TypedAttributeWithFallback::new(Vec3::ONE),
                    $($field: $fallback),*
                }
            }
        }
    };
}

lux_light! {
    /// Sphere-shaped area light.
    LuxSphereLight {
        radius: TypedAttributeWithFallback<f32> = TypedAttributeWithFallback::new(0.5),
    }
}

lux_light! {
    /// Environment dome light.
    LuxDomeLight {
        texture_file: TypedAttribute<AssetPath> = TypedAttribute::new(),
    }
}

lux_light! {
    /// Disk-shaped area light.
    LuxDiskLight {
        radius: TypedAttributeWithFallback<f32> = TypedAttributeWithFallback::new(0.5),
    }
}

lux_light! {
    /// Distant (sun-like) light.
    LuxDistantLight {
        angle: TypedAttributeWithFallback<f32> = TypedAttributeWithFallback::new(0.53),
    }
}

lux_light! {
    /// Cylinder-shaped area light.
    LuxCylinderLight {
        length: TypedAttributeWithFallback<f32> = TypedAttributeWithFallback::new(1.0),
        radius: TypedAttributeWithFallback<f32> = TypedAttributeWithFallback::new(0.5),
    }
}

lux_light! {
    /// Rectangular area light.
    LuxRectLight {
        width: TypedAttributeWithFallback<f32> = TypedAttributeWithFallback::new(1.0),
        height: TypedAttributeWithFallback<f32> = TypedAttributeWithFallback::new(1.0),
    }
}

lux_light! {
    /// Light emitted by bound geometry.
    LuxGeometryLight {}
}

macro_rules! prim_bodies {
    ($(($variant:ident, $ty:ty, $offset:expr, $name:expr)),* $(,)?) => {
        /// The typed body of a Prim, one alternative per schema type.
        #[derive(Clone, Debug, PartialEq)]
        pub enum PrimBody {
            $($variant($ty)),*
        }

        impl PrimBody {
            /// Type id in the Prim range.
            pub fn type_id(&self) -> u32 {
                match self {
                    $(Self::$variant(_) => PRIM_TYPE_ID_BASE + $offset),*
                }
            }

            /// The schema type name as authored in `typeName`.
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $name),*
                }
            }

            /// Construct a default record for a `typeName`. `None` for
            /// unknown names.
            pub fn from_type_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant(<$ty>::default())),)*
                    _ => None,
                }
            }
        }

        $(
            impl From<$ty> for PrimBody {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

prim_bodies! {
    (Model, Model, 0, "Model"),
    (Scope, Scope, 1, "Scope"),
    (Xform, Xform, 2, "Xform"),
    (Mesh, GeomMesh, 3, "Mesh"),
    (GeomSubset, GeomSubset, 4, "GeomSubset"),
    (Points, GeomPoints, 5, "Points"),
    (Cube, GeomCube, 6, "Cube"),
    (Sphere, GeomSphere, 7, "Sphere"),
    (Cylinder, GeomCylinder, 8, "Cylinder"),
    (Capsule, GeomCapsule, 9, "Capsule"),
    (Cone, GeomCone, 10, "Cone"),
    (BasisCurves, GeomBasisCurves, 11, "BasisCurves"),
    (NurbsCurves, GeomNurbsCurves, 12, "NurbsCurves"),
    (Camera, GeomCamera, 13, "Camera"),
    (PointInstancer, PointInstancer, 14, "PointInstancer"),
    (Material, Material, 15, "Material"),
    (Shader, Shader, 16, "Shader"),
    (NodeGraph, NodeGraph, 17, "NodeGraph"),
    (SkelRoot, SkelRoot, 18, "SkelRoot"),
    (Skeleton, Skeleton, 19, "Skeleton"),
    (SkelAnimation, SkelAnimation, 20, "SkelAnimation"),
    (BlendShape, BlendShape, 21, "BlendShape"),
    (SphereLight, LuxSphereLight, 22, "SphereLight"),
    (DomeLight, LuxDomeLight, 23, "DomeLight"),
    (DiskLight, LuxDiskLight, 24, "DiskLight"),
    (DistantLight, LuxDistantLight, 25, "DistantLight"),
    (CylinderLight, LuxCylinderLight, 26, "CylinderLight"),
    (RectLight, LuxRectLight, 27, "RectLight"),
    (GeometryLight, LuxGeometryLight, 28, "GeometryLight"),
}

/// Copy an attribute's evaluated state into a typed wrapper. The first
/// name in `names` that resolves wins.
fn fill_typed<T: ValueTyped + Clone>(
    dst: &mut TypedAttribute<T>,
    props: &PropertyMap,
    names: &[&str],
) {
    for name in names {
        let Some(prop) = props.get(name) else {
            continue;
        };
        match prop.kind() {
            PropertyKind::Attribute(attr) => {
                dst.meta = attr.meta.clone();
                if attr.is_blocked() {
                    dst.set_blocked(true);
                } else if let Some(v) = attr.get_value::<T>() {
                    dst.set_value(v);
                }
            }
            PropertyKind::Connection(conn) => {
                dst.set_connections(conn.targets().to_vec());
            }
            _ => {}
        }
        return;
    }
}

fn fill_fallback<T: ValueTyped + Clone>(
    dst: &mut TypedAttributeWithFallback<T>,
    props: &PropertyMap,
    names: &[&str],
) {
    for name in names {
        let Some(prop) = props.get(name) else {
            continue;
        };
        match prop.kind() {
            PropertyKind::Attribute(attr) => {
                dst.meta = attr.meta.clone();
                if attr.is_blocked() {
                    dst.set_blocked(true);
                } else if let Some(v) = attr.get_value::<T>() {
                    dst.set_value(v);
                }
            }
            PropertyKind::Connection(conn) => {
                if let Some(first) = conn.targets().first() {
                    dst.set_connection(first.clone());
                }
            }
            _ => {}
        }
        return;
    }
}

fn fill_terminal<T>(dst: &mut TypedTerminalAttribute<T>, props: &PropertyMap, name: &str) {
    if props.contains(name) {
        dst.set_authored(true);
    }
}

impl PrimBody {
    /// Populate the record's characteristic attributes from a decoded
    /// property map. Records without characteristic attributes are
    /// untouched; the property map itself stays the source of truth for
    /// everything else.
    pub fn harvest(&mut self, props: &PropertyMap) {
        match self {
            Self::Xform(x) => {
                fill_typed(&mut x.xform_op_order, props, &["xformOpOrder"]);
            }
            Self::Mesh(m) => {
                fill_typed(&mut m.points, props, &["points"]);
                fill_typed(&mut m.face_vertex_indices, props, &["faceVertexIndices"]);
                fill_typed(&mut m.face_vertex_counts, props, &["faceVertexCounts"]);
                fill_typed(&mut m.normals, props, &["normals"]);
                fill_fallback(&mut m.double_sided, props, &["doubleSided"]);
            }
            Self::GeomSubset(s) => {
                fill_typed(&mut s.indices, props, &["indices"]);
            }
            Self::Points(p) => {
                fill_typed(&mut p.points, props, &["points"]);
                fill_typed(&mut p.widths, props, &["widths"]);
            }
            Self::Cube(c) => {
                fill_fallback(&mut c.size, props, &["size"]);
            }
            Self::Sphere(s) => {
                fill_fallback(&mut s.radius, props, &["radius"]);
            }
            Self::Cylinder(c) => {
                fill_fallback(&mut c.radius, props, &["radius"]);
                fill_fallback(&mut c.height, props, &["height"]);
                fill_fallback(&mut c.axis, props, &["axis"]);
            }
            Self::Capsule(c) => {
                fill_fallback(&mut c.radius, props, &["radius"]);
                fill_fallback(&mut c.height, props, &["height"]);
                fill_fallback(&mut c.axis, props, &["axis"]);
            }
            Self::Cone(c) => {
                fill_fallback(&mut c.radius, props, &["radius"]);
                fill_fallback(&mut c.height, props, &["height"]);
                fill_fallback(&mut c.axis, props, &["axis"]);
            }
            Self::BasisCurves(c) => {
                fill_typed(&mut c.curve_vertex_counts, props, &["curveVertexCounts"]);
                fill_typed(&mut c.points, props, &["points"]);
                fill_typed(&mut c.widths, props, &["widths"]);
            }
            Self::NurbsCurves(c) => {
                fill_typed(&mut c.curve_vertex_counts, props, &["curveVertexCounts"]);
                fill_typed(&mut c.points, props, &["points"]);
                fill_typed(&mut c.order, props, &["order"]);
                fill_typed(&mut c.knots, props, &["knots"]);
            }
            Self::Camera(c) => {
                fill_fallback(&mut c.focal_length, props, &["focalLength"]);
                fill_fallback(&mut c.horizontal_aperture, props, &["horizontalAperture"]);
                fill_fallback(&mut c.vertical_aperture, props, &["verticalAperture"]);
                fill_fallback(&mut c.clipping_range, props, &["clippingRange"]);
            }
            Self::PointInstancer(p) => {
                fill_typed(&mut p.positions, props, &["positions"]);
                fill_typed(&mut p.proto_indices, props, &["protoIndices"]);
            }
            Self::Material(m) => {
                fill_terminal(&mut m.surface, props, "outputs:surface");
                fill_terminal(&mut m.displacement, props, "outputs:displacement");
                fill_terminal(&mut m.volume, props, "outputs:volume");
            }
            Self::Shader(s) => {
                fill_typed(&mut s.info_id, props, &["info:id"]);
            }
            Self::Skeleton(s) => {
                fill_typed(&mut s.joints, props, &["joints"]);
                fill_typed(&mut s.bind_transforms, props, &["bindTransforms"]);
                fill_typed(&mut s.rest_transforms, props, &["restTransforms"]);
            }
            Self::SkelAnimation(s) => {
                fill_typed(&mut s.joints, props, &["joints"]);
            }
            Self::BlendShape(b) => {
                fill_typed(&mut b.offsets, props, &["offsets"]);
                fill_typed(&mut b.point_indices, props, &["pointIndices"]);
            }
            Self::SphereLight(l) => {
                fill_fallback(&mut l.intensity, props, &["inputs:intensity", "intensity"]);
                fill_fallback(&mut l.color, props, &["inputs:color", "color"]);
                fill_fallback(&mut l.radius, props, &["inputs:radius", "radius"]);
            }
            Self::DomeLight(l) => {
                fill_fallback(&mut l.intensity, props, &["inputs:intensity", "intensity"]);
                fill_fallback(&mut l.color, props, &["inputs:color", "color"]);
                fill_typed(&mut l.texture_file, props, &["inputs:texture:file", "texture:file"]);
            }
            Self::DiskLight(l) => {
                fill_fallback(&mut l.intensity, props, &["inputs:intensity", "intensity"]);
                fill_fallback(&mut l.color, props, &["inputs:color", "color"]);
                fill_fallback(&mut l.radius, props, &["inputs:radius", "radius"]);
            }
            Self::DistantLight(l) => {
                fill_fallback(&mut l.intensity, props, &["inputs:intensity", "intensity"]);
                fill_fallback(&mut l.color, props, &["inputs:color", "color"]);
                fill_fallback(&mut l.angle, props, &["inputs:angle", "angle"]);
            }
            Self::CylinderLight(l) => {
                fill_fallback(&mut l.intensity, props, &["inputs:intensity", "intensity"]);
                fill_fallback(&mut l.color, props, &["inputs:color", "color"]);
                fill_fallback(&mut l.length, props, &["inputs:length", "length"]);
                fill_fallback(&mut l.radius, props, &["inputs:radius", "radius"]);
            }
            Self::RectLight(l) => {
                fill_fallback(&mut l.intensity, props, &["inputs:intensity", "intensity"]);
                fill_fallback(&mut l.color, props, &["inputs:color", "color"]);
                fill_fallback(&mut l.width, props, &["inputs:width", "width"]);
                fill_fallback(&mut l.height, props, &["inputs:height", "height"]);
            }
            Self::GeometryLight(l) => {
                fill_fallback(&mut l.intensity, props, &["inputs:intensity", "intensity"]);
                fill_fallback(&mut l.color, props, &["inputs:color", "color"]);
            }
            Self::Model(_) | Self::Scope(_) | Self::NodeGraph(_) | Self::SkelRoot(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{Attribute, Property};
    use crate::value::PRIM_TYPE_ID_BASE;

    #[test]
    fn test_from_type_name() {
        let body = PrimBody::from_type_name("Sphere").unwrap();
        assert_eq!(body.type_name(), "Sphere");
        assert!(body.type_id() >= PRIM_TYPE_ID_BASE);
        assert!(PrimBody::from_type_name("NotASchema").is_none());
    }

    #[test]
    fn test_harvest_sphere_radius() {
        let mut props = PropertyMap::new();
        let mut radius = Attribute::new("radius", "double");
        radius.set_value(3.0f64);
        props.insert("radius", Property::new_attribute(radius, false));

        let mut body = PrimBody::from_type_name("Sphere").unwrap();
        body.harvest(&props);

        let PrimBody::Sphere(sphere) = body else {
            panic!("expected Sphere");
        };
        assert_eq!(sphere.radius.get_value(), Some(3.0));
    }

    #[test]
    fn test_fallbacks_when_unauthored() {
        let body = PrimBody::from_type_name("Cube").unwrap();
        let PrimBody::Cube(cube) = body else {
            panic!("expected Cube");
        };
        assert_eq!(cube.size.get_value(), Some(2.0));
        assert!(!cube.size.authored());
    }

    #[test]
    fn test_material_terminal() {
        let mut props = PropertyMap::new();
        props.insert(
            "outputs:surface",
            Property::new_empty_attribute("token", false),
        );

        let mut body = PrimBody::from_type_name("Material").unwrap();
        body.harvest(&props);

        let PrimBody::Material(mat) = body else {
            panic!("expected Material");
        };
        assert!(mat.surface.authored());
        assert!(!mat.displacement.authored());
    }
}
