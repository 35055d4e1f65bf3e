//! Narrow-to-wide numeric conversion for Crate payloads.
//!
//! The Crate format may store a numeric field in a narrower form than the
//! declared `typeName` (a `color3f` attribute inlined as `half3`, a `double`
//! inlined as `float`). This is the single place that bridges stored and
//! declared types; everything downstream assumes they agree.

use crate::value::type_id::*;
use crate::value::Value;

/// Widen `value` in place so its type matches `required_name`.
///
/// `required_name` may be a role name (`"color3f"`); it is resolved to its
/// underlying storage type first. Returns `true` when the value already has
/// the required type or was widened to it, `false` when no documented
/// widening pair applies. Idempotent: re-applying to an already-widened
/// value is a no-op returning `true`.
pub fn upcast_numeric(required_name: &str, value: &mut Value) -> bool {
    let Some(target) = try_get_underlying_type_id(required_name) else {
        return false;
    };
    if value.type_id() == target {
        return true;
    }

    let widened = match (target, &*value) {
        // half -> float / double
        (TYPE_ID_FLOAT, Value::Half(h)) => Value::Float(h.to_f32()),
        (TYPE_ID_DOUBLE, Value::Half(h)) => Value::Double(h.to_f64()),
        (TYPE_ID_DOUBLE, Value::Float(f)) => Value::Double(f64::from(*f)),

        // halfN / floatN vectors
        (TYPE_ID_FLOAT2, Value::Half2(h)) => Value::Float2(h.to_vec2()),
        (TYPE_ID_DOUBLE2, Value::Half2(h)) => Value::Double2(h.to_vec2().as_dvec2()),
        (TYPE_ID_DOUBLE2, Value::Float2(v)) => Value::Double2(v.as_dvec2()),
        (TYPE_ID_FLOAT3, Value::Half3(h)) => Value::Float3(h.to_vec3()),
        (TYPE_ID_DOUBLE3, Value::Half3(h)) => Value::Double3(h.to_vec3().as_dvec3()),
        (TYPE_ID_DOUBLE3, Value::Float3(v)) => Value::Double3(v.as_dvec3()),
        (TYPE_ID_FLOAT4, Value::Half4(h)) => Value::Float4(h.to_vec4()),
        (TYPE_ID_DOUBLE4, Value::Half4(h)) => Value::Double4(h.to_vec4().as_dvec4()),
        (TYPE_ID_DOUBLE4, Value::Float4(v)) => Value::Double4(v.as_dvec4()),

        // Array forms, element-wise
        (t, Value::HalfArray(a)) if t == TYPE_ID_FLOAT | ARRAY_BIT => {
            Value::FloatArray(a.iter().map(|h| h.to_f32()).collect())
        }
        (t, Value::HalfArray(a)) if t == TYPE_ID_DOUBLE | ARRAY_BIT => {
            Value::DoubleArray(a.iter().map(|h| h.to_f64()).collect())
        }
        (t, Value::FloatArray(a)) if t == TYPE_ID_DOUBLE | ARRAY_BIT => {
            Value::DoubleArray(a.iter().map(|f| f64::from(*f)).collect())
        }
        (t, Value::Half2Array(a)) if t == TYPE_ID_FLOAT2 | ARRAY_BIT => {
            Value::Float2Array(a.iter().map(|h| h.to_vec2()).collect())
        }
        (t, Value::Half2Array(a)) if t == TYPE_ID_DOUBLE2 | ARRAY_BIT => {
            Value::Double2Array(a.iter().map(|h| h.to_vec2().as_dvec2()).collect())
        }
        (t, Value::Float2Array(a)) if t == TYPE_ID_DOUBLE2 | ARRAY_BIT => {
            Value::Double2Array(a.iter().map(|v| v.as_dvec2()).collect())
        }
        (t, Value::Half3Array(a)) if t == TYPE_ID_FLOAT3 | ARRAY_BIT => {
            Value::Float3Array(a.iter().map(|h| h.to_vec3()).collect())
        }
        (t, Value::Half3Array(a)) if t == TYPE_ID_DOUBLE3 | ARRAY_BIT => {
            Value::Double3Array(a.iter().map(|h| h.to_vec3().as_dvec3()).collect())
        }
        (t, Value::Float3Array(a)) if t == TYPE_ID_DOUBLE3 | ARRAY_BIT => {
            Value::Double3Array(a.iter().map(|v| v.as_dvec3()).collect())
        }
        (t, Value::Half4Array(a)) if t == TYPE_ID_FLOAT4 | ARRAY_BIT => {
            Value::Float4Array(a.iter().map(|h| h.to_vec4()).collect())
        }
        (t, Value::Half4Array(a)) if t == TYPE_ID_DOUBLE4 | ARRAY_BIT => {
            Value::Double4Array(a.iter().map(|h| h.to_vec4().as_dvec4()).collect())
        }
        (t, Value::Float4Array(a)) if t == TYPE_ID_DOUBLE4 | ARRAY_BIT => {
            Value::Double4Array(a.iter().map(|v| v.as_dvec4()).collect())
        }

        _ => return false,
    };

    *value = widened;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Half3;
    use crate::value::Token;
    use half::f16;

    #[test]
    fn test_half_to_float() {
        let mut v = Value::Half(f16::from_f32(1.5));
        assert!(upcast_numeric("float", &mut v));
        assert_eq!(v.get::<f32>(), Some(1.5));
    }

    #[test]
    fn test_role_name_resolves_storage() {
        let h = Half3::new(
            f16::from_f32(0.25),
            f16::from_f32(0.5),
            f16::from_f32(1.0),
        );
        let mut v = Value::Half3(h);
        assert!(upcast_numeric("color3f", &mut v));
        assert_eq!(v.type_id(), TYPE_ID_FLOAT3);
        let c = v.get::<crate::util::Vec3>().unwrap();
        assert_eq!(c.x, 0.25);
        assert_eq!(c.y, 0.5);
        assert_eq!(c.z, 1.0);
    }

    #[test]
    fn test_idempotent() {
        let mut v = Value::Half(f16::from_f32(3.0));
        assert!(upcast_numeric("double", &mut v));
        let once = v.clone();
        assert!(upcast_numeric("double", &mut v));
        assert_eq!(v, once);
    }

    #[test]
    fn test_no_applicable_pair() {
        let mut v = Value::from(Token::new("abc"));
        assert!(!upcast_numeric("float", &mut v));
        // value untouched on failure
        assert_eq!(v.type_name(), "token");

        let mut narrow = Value::Double(1.0);
        assert!(!upcast_numeric("half", &mut narrow));
    }

    #[test]
    fn test_array_upcast() {
        let mut v = Value::HalfArray(vec![f16::from_f32(1.0), f16::from_f32(2.0)]);
        assert!(upcast_numeric("float[]", &mut v));
        assert_eq!(v.get::<Vec<f32>>(), Some(vec![1.0, 2.0]));
    }
}
