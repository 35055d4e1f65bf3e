//! Stable type identifiers for the value universe.
//!
//! Every concrete value type has a 32-bit id. Array types reuse the scalar
//! id with [`ARRAY_BIT`] set. Role types (`point3f`, `color3f`, ...) have
//! distinct ids but share storage with an underlying type; the Crate decoder
//! resolves a declared `typeName` to the underlying id when upcasting
//! narrowed numeric payloads.

/// Bit set on a type id to denote the 1-D array form of a scalar type.
pub const ARRAY_BIT: u32 = 1 << 20;

/// Base id for typed Prim records (schema bodies). Ids at or above this
/// value never appear in a Crate `ValueRep`.
pub const PRIM_TYPE_ID_BASE: u32 = 256;

// Scalar and structured type ids. The low 8 bits of a Crate `ValueRep`
// type tag enumerate exactly these values.
pub const TYPE_ID_INVALID: u32 = 0;
pub const TYPE_ID_BOOL: u32 = 1;
pub const TYPE_ID_UCHAR: u32 = 2;
pub const TYPE_ID_INT: u32 = 3;
pub const TYPE_ID_UINT: u32 = 4;
pub const TYPE_ID_INT64: u32 = 5;
pub const TYPE_ID_UINT64: u32 = 6;
pub const TYPE_ID_HALF: u32 = 7;
pub const TYPE_ID_FLOAT: u32 = 8;
pub const TYPE_ID_DOUBLE: u32 = 9;
pub const TYPE_ID_STRING: u32 = 10;
pub const TYPE_ID_TOKEN: u32 = 11;
pub const TYPE_ID_ASSET_PATH: u32 = 12;
pub const TYPE_ID_MATRIX2D: u32 = 13;
pub const TYPE_ID_MATRIX3D: u32 = 14;
pub const TYPE_ID_MATRIX4D: u32 = 15;
pub const TYPE_ID_MATRIX4F: u32 = 16;
pub const TYPE_ID_QUATD: u32 = 17;
pub const TYPE_ID_QUATF: u32 = 18;
pub const TYPE_ID_QUATH: u32 = 19;
pub const TYPE_ID_DOUBLE2: u32 = 20;
pub const TYPE_ID_FLOAT2: u32 = 21;
pub const TYPE_ID_HALF2: u32 = 22;
pub const TYPE_ID_INT2: u32 = 23;
pub const TYPE_ID_DOUBLE3: u32 = 24;
pub const TYPE_ID_FLOAT3: u32 = 25;
pub const TYPE_ID_HALF3: u32 = 26;
pub const TYPE_ID_INT3: u32 = 27;
pub const TYPE_ID_DOUBLE4: u32 = 28;
pub const TYPE_ID_FLOAT4: u32 = 29;
pub const TYPE_ID_HALF4: u32 = 30;
pub const TYPE_ID_INT4: u32 = 31;
pub const TYPE_ID_DICTIONARY: u32 = 32;
pub const TYPE_ID_TOKEN_LISTOP: u32 = 33;
pub const TYPE_ID_STRING_LISTOP: u32 = 34;
pub const TYPE_ID_PATH_LISTOP: u32 = 35;
pub const TYPE_ID_REFERENCE_LISTOP: u32 = 36;
pub const TYPE_ID_PAYLOAD_LISTOP: u32 = 37;
pub const TYPE_ID_INT_LISTOP: u32 = 38;
pub const TYPE_ID_UINT_LISTOP: u32 = 39;
pub const TYPE_ID_INT64_LISTOP: u32 = 40;
pub const TYPE_ID_UINT64_LISTOP: u32 = 41;
pub const TYPE_ID_PATH_VECTOR: u32 = 42;
pub const TYPE_ID_SPECIFIER: u32 = 43;
pub const TYPE_ID_PERMISSION: u32 = 44;
pub const TYPE_ID_VARIABILITY: u32 = 45;
pub const TYPE_ID_LAYER_OFFSET: u32 = 46;
pub const TYPE_ID_PAYLOAD: u32 = 47;
pub const TYPE_ID_REFERENCE: u32 = 48;
pub const TYPE_ID_TIMESAMPLES: u32 = 49;
pub const TYPE_ID_VALUE_BLOCK: u32 = 50;
pub const TYPE_ID_RELATIONSHIP: u32 = 51;

// Role type ids. Distinct identity, shared storage.
pub const TYPE_ID_POINT3F: u32 = 64;
pub const TYPE_ID_POINT3D: u32 = 65;
pub const TYPE_ID_NORMAL3F: u32 = 66;
pub const TYPE_ID_NORMAL3D: u32 = 67;
pub const TYPE_ID_VECTOR3F: u32 = 68;
pub const TYPE_ID_VECTOR3D: u32 = 69;
pub const TYPE_ID_COLOR3F: u32 = 70;
pub const TYPE_ID_COLOR3D: u32 = 71;
pub const TYPE_ID_COLOR4F: u32 = 72;
pub const TYPE_ID_COLOR4D: u32 = 73;
pub const TYPE_ID_TEXCOORD2F: u32 = 74;
pub const TYPE_ID_TEXCOORD3F: u32 = 75;
pub const TYPE_ID_TEXCOORD2H: u32 = 76;
pub const TYPE_ID_TEXCOORD3H: u32 = 77;
pub const TYPE_ID_FRAME4D: u32 = 78;

/// Descriptor for a named value type, as resolved from a `typeName` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueType {
    /// The type's own id (with [`ARRAY_BIT`] applied for `name[]` forms).
    pub id: u32,
    /// Storage id. Equals `id` for non-role types.
    pub underlying_id: u32,
    /// True for `name[]` forms.
    pub array: bool,
}

// (name, id, underlying id). Role entries point at their storage type;
// everything else underlies itself.
const NAME_TABLE: &[(&str, u32, u32)] = &[
    ("bool", TYPE_ID_BOOL, TYPE_ID_BOOL),
    ("uchar", TYPE_ID_UCHAR, TYPE_ID_UCHAR),
    ("int", TYPE_ID_INT, TYPE_ID_INT),
    ("uint", TYPE_ID_UINT, TYPE_ID_UINT),
    ("int64", TYPE_ID_INT64, TYPE_ID_INT64),
    ("uint64", TYPE_ID_UINT64, TYPE_ID_UINT64),
    ("half", TYPE_ID_HALF, TYPE_ID_HALF),
    ("float", TYPE_ID_FLOAT, TYPE_ID_FLOAT),
    ("double", TYPE_ID_DOUBLE, TYPE_ID_DOUBLE),
    ("string", TYPE_ID_STRING, TYPE_ID_STRING),
    ("token", TYPE_ID_TOKEN, TYPE_ID_TOKEN),
    ("asset", TYPE_ID_ASSET_PATH, TYPE_ID_ASSET_PATH),
    ("matrix2d", TYPE_ID_MATRIX2D, TYPE_ID_MATRIX2D),
    ("matrix3d", TYPE_ID_MATRIX3D, TYPE_ID_MATRIX3D),
    ("matrix4d", TYPE_ID_MATRIX4D, TYPE_ID_MATRIX4D),
    ("matrix4f", TYPE_ID_MATRIX4F, TYPE_ID_MATRIX4F),
    ("quatd", TYPE_ID_QUATD, TYPE_ID_QUATD),
    ("quatf", TYPE_ID_QUATF, TYPE_ID_QUATF),
    ("quath", TYPE_ID_QUATH, TYPE_ID_QUATH),
    ("double2", TYPE_ID_DOUBLE2, TYPE_ID_DOUBLE2),
    ("float2", TYPE_ID_FLOAT2, TYPE_ID_FLOAT2),
    ("half2", TYPE_ID_HALF2, TYPE_ID_HALF2),
    ("int2", TYPE_ID_INT2, TYPE_ID_INT2),
    ("double3", TYPE_ID_DOUBLE3, TYPE_ID_DOUBLE3),
    ("float3", TYPE_ID_FLOAT3, TYPE_ID_FLOAT3),
    ("half3", TYPE_ID_HALF3, TYPE_ID_HALF3),
    ("int3", TYPE_ID_INT3, TYPE_ID_INT3),
    ("double4", TYPE_ID_DOUBLE4, TYPE_ID_DOUBLE4),
    ("float4", TYPE_ID_FLOAT4, TYPE_ID_FLOAT4),
    ("half4", TYPE_ID_HALF4, TYPE_ID_HALF4),
    ("int4", TYPE_ID_INT4, TYPE_ID_INT4),
    ("dictionary", TYPE_ID_DICTIONARY, TYPE_ID_DICTIONARY),
    ("timeSamples", TYPE_ID_TIMESAMPLES, TYPE_ID_TIMESAMPLES),
    ("none", TYPE_ID_VALUE_BLOCK, TYPE_ID_VALUE_BLOCK),
    ("rel", TYPE_ID_RELATIONSHIP, TYPE_ID_RELATIONSHIP),
    // Role types
    ("point3f", TYPE_ID_POINT3F, TYPE_ID_FLOAT3),
    ("point3d", TYPE_ID_POINT3D, TYPE_ID_DOUBLE3),
    ("normal3f", TYPE_ID_NORMAL3F, TYPE_ID_FLOAT3),
    ("normal3d", TYPE_ID_NORMAL3D, TYPE_ID_DOUBLE3),
    ("vector3f", TYPE_ID_VECTOR3F, TYPE_ID_FLOAT3),
    ("vector3d", TYPE_ID_VECTOR3D, TYPE_ID_DOUBLE3),
    ("color3f", TYPE_ID_COLOR3F, TYPE_ID_FLOAT3),
    ("color3d", TYPE_ID_COLOR3D, TYPE_ID_DOUBLE3),
    ("color4f", TYPE_ID_COLOR4F, TYPE_ID_FLOAT4),
    ("color4d", TYPE_ID_COLOR4D, TYPE_ID_DOUBLE4),
    ("texCoord2f", TYPE_ID_TEXCOORD2F, TYPE_ID_FLOAT2),
    ("texCoord3f", TYPE_ID_TEXCOORD3F, TYPE_ID_FLOAT3),
    ("texCoord2h", TYPE_ID_TEXCOORD2H, TYPE_ID_HALF2),
    ("texCoord3h", TYPE_ID_TEXCOORD3H, TYPE_ID_HALF3),
    ("frame4d", TYPE_ID_FRAME4D, TYPE_ID_MATRIX4D),
];

/// Resolve a type name (optionally `[]`-suffixed) to its descriptor.
pub fn value_type_from_name(name: &str) -> Option<ValueType> {
    let (base, array) = match name.strip_suffix("[]") {
        Some(base) => (base, true),
        None => (name, false),
    };
    let bit = if array { ARRAY_BIT } else { 0 };
    NAME_TABLE
        .iter()
        .find(|(n, _, _)| *n == base)
        .map(|&(_, id, under)| ValueType {
            id: id | bit,
            underlying_id: under | bit,
            array,
        })
}

/// Resolve a type name to the id of its storage type, for Crate upcast.
///
/// `"color3f"` resolves to the id of `float3`; `"float"` resolves to
/// itself. Returns `None` for names outside the universe.
pub fn try_get_underlying_type_id(name: &str) -> Option<u32> {
    value_type_from_name(name).map(|vt| vt.underlying_id)
}

/// Scalar name for a type id (array bit ignored). `None` if unknown.
pub fn scalar_type_name(id: u32) -> Option<&'static str> {
    let base = id & !ARRAY_BIT;
    NAME_TABLE
        .iter()
        .find(|&&(_, tid, _)| tid == base)
        .map(|&(n, _, _)| n)
}

/// True when the id denotes a role type (distinct identity, shared storage).
#[inline]
pub fn is_role_type_id(id: u32) -> bool {
    let base = id & !ARRAY_BIT;
    (TYPE_ID_POINT3F..=TYPE_ID_FRAME4D).contains(&base)
}

/// Byte size of one element for fixed-size numeric types, used for bounds
/// validation before array allocation. `None` for variable-size types.
pub fn element_byte_size(id: u32) -> Option<usize> {
    let size = match id & !ARRAY_BIT {
        TYPE_ID_BOOL | TYPE_ID_UCHAR => 1,
        TYPE_ID_HALF => 2,
        TYPE_ID_INT | TYPE_ID_UINT | TYPE_ID_FLOAT | TYPE_ID_HALF2 => 4,
        TYPE_ID_INT64 | TYPE_ID_UINT64 | TYPE_ID_DOUBLE => 8,
        TYPE_ID_FLOAT2 | TYPE_ID_INT2 | TYPE_ID_QUATH | TYPE_ID_HALF4 => 8,
        TYPE_ID_HALF3 => 6,
        TYPE_ID_DOUBLE2 | TYPE_ID_FLOAT4 | TYPE_ID_INT4 | TYPE_ID_QUATF => 16,
        TYPE_ID_FLOAT3 | TYPE_ID_INT3 => 12,
        TYPE_ID_DOUBLE3 => 24,
        TYPE_ID_DOUBLE4 | TYPE_ID_QUATD | TYPE_ID_MATRIX2D => 32,
        TYPE_ID_MATRIX3D => 72,
        TYPE_ID_MATRIX4D => 128,
        TYPE_ID_MATRIX4F => 64,
        TYPE_ID_LAYER_OFFSET => 16,
        _ => return None,
    };
    Some(size)
}
