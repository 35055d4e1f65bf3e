//! The discriminated value universe.
//!
//! [`Value`] holds one alternative from a closed set of concrete types.
//! The discriminant maps one-to-one onto the stable type ids in
//! [`crate::value::type_id`]; array forms are separate alternatives whose
//! ids carry [`ARRAY_BIT`]. Conversions in and out go through the
//! [`ValueTyped`] trait so a tag mismatch yields `None`, never a panic.

use half::f16;

use crate::attr::{Relationship, TimeSamples};
use crate::listop::ListOp;
use crate::path::Path;
use crate::schema::PrimBody;
use crate::util::{
    DMat2, DMat3, DMat4, DQuat, DVec2, DVec3, DVec4, Half2, Half3, Half4, IVec2, IVec3, IVec4,
    Mat4, Quat, Quath, Vec2, Vec3, Vec4,
};
use crate::value::type_id::*;
use crate::value::{AssetPath, Dictionary, LayerOffset, Payload, Permission, Reference,
    Specifier, Token, Variability};

/// Rust types that live in the value universe.
pub trait ValueTyped: Sized {
    /// Stable type id ([`ARRAY_BIT`] set for array types).
    const TYPE_ID: u32;
    /// Canonical type name, e.g. `"float3"` or `"token[]"`.
    const TYPE_NAME: &'static str;

    fn from_value_ref(value: &Value) -> Option<&Self>;
    fn into_value(self) -> Value;
}

macro_rules! value_universe {
    ($(($variant:ident, $ty:ty, $id:expr, $name:expr)),* $(,)?) => {
        /// A tagged value from the closed universe of USD types.
        ///
        /// `Invalid` is the distinguished null state: a `Value` either holds
        /// a payload of its declared type id or is `Invalid`.
        #[derive(Clone, Debug, PartialEq, Default)]
        pub enum Value {
            /// The distinguished invalid (null) state.
            #[default]
            Invalid,
            /// Authored absence of a value (`None` in USDA).
            Block,
            /// Typed Prim record; ids in the Prim range.
            Prim(Box<PrimBody>),
            $($variant($ty)),*
        }

        impl Value {
            /// Stable type id of the held alternative.
            pub fn type_id(&self) -> u32 {
                match self {
                    Value::Invalid => TYPE_ID_INVALID,
                    Value::Block => TYPE_ID_VALUE_BLOCK,
                    Value::Prim(body) => body.type_id(),
                    $(Value::$variant(_) => $id),*
                }
            }

            /// Canonical type name of the held alternative.
            pub fn type_name(&self) -> &'static str {
                match self {
                    Value::Invalid => "nullptr",
                    Value::Block => "none",
                    Value::Prim(body) => body.type_name(),
                    $(Value::$variant(_) => $name),*
                }
            }
        }

        $(
            impl ValueTyped for $ty {
                const TYPE_ID: u32 = $id;
                const TYPE_NAME: &'static str = $name;

                fn from_value_ref(value: &Value) -> Option<&Self> {
                    match value {
                        Value::$variant(x) => Some(x),
                        _ => None,
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_universe! {
    (Bool, bool, TYPE_ID_BOOL, "bool"),
    (UChar, u8, TYPE_ID_UCHAR, "uchar"),
    (Int, i32, TYPE_ID_INT, "int"),
    (UInt, u32, TYPE_ID_UINT, "uint"),
    (Int64, i64, TYPE_ID_INT64, "int64"),
    (UInt64, u64, TYPE_ID_UINT64, "uint64"),
    (Half, f16, TYPE_ID_HALF, "half"),
    (Float, f32, TYPE_ID_FLOAT, "float"),
    (Double, f64, TYPE_ID_DOUBLE, "double"),
    (String, std::string::String, TYPE_ID_STRING, "string"),
    (Token, Token, TYPE_ID_TOKEN, "token"),
    (AssetPath, AssetPath, TYPE_ID_ASSET_PATH, "asset"),
    (Matrix2d, DMat2, TYPE_ID_MATRIX2D, "matrix2d"),
    (Matrix3d, DMat3, TYPE_ID_MATRIX3D, "matrix3d"),
    (Matrix4d, DMat4, TYPE_ID_MATRIX4D, "matrix4d"),
    (Matrix4f, Mat4, TYPE_ID_MATRIX4F, "matrix4f"),
    (Quatd, DQuat, TYPE_ID_QUATD, "quatd"),
    (Quatf, Quat, TYPE_ID_QUATF, "quatf"),
    (Quath, Quath, TYPE_ID_QUATH, "quath"),
    (Double2, DVec2, TYPE_ID_DOUBLE2, "double2"),
    (Float2, Vec2, TYPE_ID_FLOAT2, "float2"),
    (Half2, Half2, TYPE_ID_HALF2, "half2"),
    (Int2, IVec2, TYPE_ID_INT2, "int2"),
    (Double3, DVec3, TYPE_ID_DOUBLE3, "double3"),
    (Float3, Vec3, TYPE_ID_FLOAT3, "float3"),
    (Half3, Half3, TYPE_ID_HALF3, "half3"),
    (Int3, IVec3, TYPE_ID_INT3, "int3"),
    (Double4, DVec4, TYPE_ID_DOUBLE4, "double4"),
    (Float4, Vec4, TYPE_ID_FLOAT4, "float4"),
    (Half4, Half4, TYPE_ID_HALF4, "half4"),
    (Int4, IVec4, TYPE_ID_INT4, "int4"),
    (Dictionary, Dictionary, TYPE_ID_DICTIONARY, "dictionary"),
    (TokenListOp, ListOp<Token>, TYPE_ID_TOKEN_LISTOP, "tokenListOp"),
    (StringListOp, ListOp<std::string::String>, TYPE_ID_STRING_LISTOP, "stringListOp"),
    (PathListOp, ListOp<Path>, TYPE_ID_PATH_LISTOP, "pathListOp"),
    (ReferenceListOp, ListOp<Reference>, TYPE_ID_REFERENCE_LISTOP, "referenceListOp"),
    (PayloadListOp, ListOp<Payload>, TYPE_ID_PAYLOAD_LISTOP, "payloadListOp"),
    (IntListOp, ListOp<i32>, TYPE_ID_INT_LISTOP, "intListOp"),
    (UIntListOp, ListOp<u32>, TYPE_ID_UINT_LISTOP, "uintListOp"),
    (Int64ListOp, ListOp<i64>, TYPE_ID_INT64_LISTOP, "int64ListOp"),
    (UInt64ListOp, ListOp<u64>, TYPE_ID_UINT64_LISTOP, "uint64ListOp"),
    (PathVector, Vec<Path>, TYPE_ID_PATH_VECTOR, "path[]"),
    (Specifier, Specifier, TYPE_ID_SPECIFIER, "specifier"),
    (Permission, Permission, TYPE_ID_PERMISSION, "permission"),
    (Variability, Variability, TYPE_ID_VARIABILITY, "variability"),
    (LayerOffset, LayerOffset, TYPE_ID_LAYER_OFFSET, "layerOffset"),
    (Payload, Payload, TYPE_ID_PAYLOAD, "payload"),
    (Reference, Reference, TYPE_ID_REFERENCE, "reference"),
    (TimeSamples, TimeSamples, TYPE_ID_TIMESAMPLES, "timeSamples"),
    (Relationship, Relationship, TYPE_ID_RELATIONSHIP, "rel"),
    // Array alternatives
    (BoolArray, Vec<bool>, TYPE_ID_BOOL | ARRAY_BIT, "bool[]"),
    (UCharArray, Vec<u8>, TYPE_ID_UCHAR | ARRAY_BIT, "uchar[]"),
    (IntArray, Vec<i32>, TYPE_ID_INT | ARRAY_BIT, "int[]"),
    (UIntArray, Vec<u32>, TYPE_ID_UINT | ARRAY_BIT, "uint[]"),
    (Int64Array, Vec<i64>, TYPE_ID_INT64 | ARRAY_BIT, "int64[]"),
    (UInt64Array, Vec<u64>, TYPE_ID_UINT64 | ARRAY_BIT, "uint64[]"),
    (HalfArray, Vec<f16>, TYPE_ID_HALF | ARRAY_BIT, "half[]"),
    (FloatArray, Vec<f32>, TYPE_ID_FLOAT | ARRAY_BIT, "float[]"),
    (DoubleArray, Vec<f64>, TYPE_ID_DOUBLE | ARRAY_BIT, "double[]"),
    (StringArray, Vec<std::string::String>, TYPE_ID_STRING | ARRAY_BIT, "string[]"),
    (TokenArray, Vec<Token>, TYPE_ID_TOKEN | ARRAY_BIT, "token[]"),
    (AssetPathArray, Vec<AssetPath>, TYPE_ID_ASSET_PATH | ARRAY_BIT, "asset[]"),
    (Matrix2dArray, Vec<DMat2>, TYPE_ID_MATRIX2D | ARRAY_BIT, "matrix2d[]"),
    (Matrix3dArray, Vec<DMat3>, TYPE_ID_MATRIX3D | ARRAY_BIT, "matrix3d[]"),
    (Matrix4dArray, Vec<DMat4>, TYPE_ID_MATRIX4D | ARRAY_BIT, "matrix4d[]"),
    (Matrix4fArray, Vec<Mat4>, TYPE_ID_MATRIX4F | ARRAY_BIT, "matrix4f[]"),
    (QuatdArray, Vec<DQuat>, TYPE_ID_QUATD | ARRAY_BIT, "quatd[]"),
    (QuatfArray, Vec<Quat>, TYPE_ID_QUATF | ARRAY_BIT, "quatf[]"),
    (QuathArray, Vec<Quath>, TYPE_ID_QUATH | ARRAY_BIT, "quath[]"),
    (Double2Array, Vec<DVec2>, TYPE_ID_DOUBLE2 | ARRAY_BIT, "double2[]"),
    (Float2Array, Vec<Vec2>, TYPE_ID_FLOAT2 | ARRAY_BIT, "float2[]"),
    (Half2Array, Vec<Half2>, TYPE_ID_HALF2 | ARRAY_BIT, "half2[]"),
    (Int2Array, Vec<IVec2>, TYPE_ID_INT2 | ARRAY_BIT, "int2[]"),
    (Double3Array, Vec<DVec3>, TYPE_ID_DOUBLE3 | ARRAY_BIT, "double3[]"),
    (Float3Array, Vec<Vec3>, TYPE_ID_FLOAT3 | ARRAY_BIT, "float3[]"),
    (Half3Array, Vec<Half3>, TYPE_ID_HALF3 | ARRAY_BIT, "half3[]"),
    (Int3Array, Vec<IVec3>, TYPE_ID_INT3 | ARRAY_BIT, "int3[]"),
    (Double4Array, Vec<DVec4>, TYPE_ID_DOUBLE4 | ARRAY_BIT, "double4[]"),
    (Float4Array, Vec<Vec4>, TYPE_ID_FLOAT4 | ARRAY_BIT, "float4[]"),
    (Half4Array, Vec<Half4>, TYPE_ID_HALF4 | ARRAY_BIT, "half4[]"),
    (Int4Array, Vec<IVec4>, TYPE_ID_INT4 | ARRAY_BIT, "int4[]"),
}

impl Value {
    /// Construct a value from any type in the universe.
    #[inline]
    pub fn make<T: ValueTyped>(v: T) -> Self {
        v.into_value()
    }

    /// Borrow the payload if the tag matches `T`.
    #[inline]
    pub fn as_ref<T: ValueTyped>(&self) -> Option<&T> {
        T::from_value_ref(self)
    }

    /// Copy the payload out if the tag matches `T`.
    #[inline]
    pub fn get<T: ValueTyped + Clone>(&self) -> Option<T> {
        T::from_value_ref(self).cloned()
    }

    /// True unless this is the distinguished invalid state.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Value::Invalid)
    }

    /// True for the authored absence marker.
    #[inline]
    pub fn is_block(&self) -> bool {
        matches!(self, Value::Block)
    }

    /// True when the held alternative is an array type.
    #[inline]
    pub fn is_array(&self) -> bool {
        self.type_id() & ARRAY_BIT != 0
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
