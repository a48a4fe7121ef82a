use crate::{
    bits::BitArray,
    enums::Enum,
    integer::Integer,
    types::{Color, ObjectRef, PlayerRef, Rotation, Vector2, Vector3, Vector4},
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Any value the codec can carry.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(Integer),
    F32(f32),
    F64(f64),
    String(String),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    Map(BTreeMap<Key, Value>),
    Vector2(Vector2),
    Vector3(Vector3),
    Vector4(Vector4),
    Rotation(Rotation),
    Color(Color),
    Player(PlayerRef),
    Object(ObjectRef),
    Bits(BitArray),
    Enum(Enum),
    /// A user extension: tag plus opaque payload bytes.
    Ext(i8, Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(*self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        self.as_bool().is_some()
    }

    pub fn is_int(&self) -> bool {
        self.as_int().is_some()
    }

    pub fn is_str(&self) -> bool {
        self.as_str().is_some()
    }

    pub fn is_bin(&self) -> bool {
        self.as_slice().is_some()
    }

    pub fn is_array(&self) -> bool {
        self.as_array().is_some()
    }

    pub fn is_map(&self) -> bool {
        self.as_map().is_some()
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_int(&self) -> Option<Integer> {
        if let Value::Integer(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Integer(ref n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Integer(ref n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Integer(ref n) => Some(n.as_f64()),
            Value::F32(n) => Some(From::from(n)),
            Value::F64(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(ref val) = *self {
            Some(val.as_str())
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> Option<&[u8]> {
        if let Value::Binary(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        if let Value::Array(ref array) = *self {
            Some(array)
        } else {
            None
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match *self {
            Value::Array(ref mut array) => Some(array),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Key, Value>> {
        if let Value::Map(ref map) = *self {
            Some(map)
        } else {
            None
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<Key, Value>> {
        match *self {
            Value::Map(ref mut map) => Some(map),
            _ => None,
        }
    }

    pub fn as_bits(&self) -> Option<&BitArray> {
        if let Value::Bits(ref bits) = *self {
            Some(bits)
        } else {
            None
        }
    }

    pub fn as_enum(&self) -> Option<&Enum> {
        if let Value::Enum(ref e) = *self {
            Some(e)
        } else {
            None
        }
    }

    /// A short name for the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        use self::Value::*;
        match self {
            Null => "null",
            Boolean(_) => "boolean",
            Integer(_) => "integer",
            F32(_) => "f32",
            F64(_) => "f64",
            String(_) => "string",
            Binary(_) => "binary",
            Array(_) => "array",
            Map(_) => "map",
            Vector2(_) => "vector2",
            Vector3(_) => "vector3",
            Vector4(_) => "vector4",
            Rotation(_) => "rotation",
            Color(_) => "color",
            Player(_) => "player",
            Object(_) => "object",
            Bits(_) => "bit array",
            Enum(_) => "enum",
            Ext(..) => "extension",
        }
    }
}

macro_rules! impl_value_from {
    ($t: ty, $variant: ident) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v.into())
            }
        }
    };
}

impl_value_from!(bool, Boolean);
impl_value_from!(u8, Integer);
impl_value_from!(u16, Integer);
impl_value_from!(u32, Integer);
impl_value_from!(u64, Integer);
impl_value_from!(i8, Integer);
impl_value_from!(i16, Integer);
impl_value_from!(i32, Integer);
impl_value_from!(i64, Integer);
impl_value_from!(Integer, Integer);
impl_value_from!(f32, F32);
impl_value_from!(f64, F64);
impl_value_from!(&str, String);
impl_value_from!(String, String);
impl_value_from!(Vec<u8>, Binary);
impl_value_from!(Vec<Value>, Array);
impl_value_from!(BTreeMap<Key, Value>, Map);
impl_value_from!(Vector2, Vector2);
impl_value_from!(Vector3, Vector3);
impl_value_from!(Vector4, Vector4);
impl_value_from!(Rotation, Rotation);
impl_value_from!(Color, Color);
impl_value_from!(PlayerRef, Player);
impl_value_from!(ObjectRef, Object);
impl_value_from!(BitArray, Bits);
impl_value_from!(Enum, Enum);

/// A value usable as a map key.
///
/// The source model keys tables with any scalar; here the keyable kinds are
/// spelled out so the map can hold a total order. Float keys are expected to
/// come through [`Key::canonical`], which folds integral floats into
/// [`Key::Integer`] and rejects NaN, keeping equality well behaved.
#[derive(Clone, Debug)]
pub enum Key {
    Boolean(bool),
    Integer(Integer),
    F64(f64),
    String(String),
    Binary(Vec<u8>),
}

impl Key {
    /// Fold this key into its canonical form: a float that holds an integral
    /// value becomes the matching integer key. Returns `None` for NaN.
    pub fn canonical(self) -> Option<Key> {
        match self {
            Key::F64(f) => {
                if f.is_nan() {
                    None
                } else if f.fract() == 0.0 && (i64::MIN as f64..9_223_372_036_854_775_808.0).contains(&f) {
                    Some(Key::Integer(Integer::from(f as i64)))
                } else {
                    Some(Key::F64(f))
                }
            }
            other => Some(other),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Key::Boolean(_) => 0,
            Key::Integer(_) => 1,
            Key::F64(_) => 2,
            Key::String(_) => 3,
            Key::Binary(_) => 4,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Key::Integer(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Key) -> Ordering {
        match (self, other) {
            (Key::Boolean(a), Key::Boolean(b)) => a.cmp(b),
            (Key::Integer(a), Key::Integer(b)) => a.cmp(b),
            (Key::F64(a), Key::F64(b)) => a.total_cmp(b),
            (Key::String(a), Key::String(b)) => a.cmp(b),
            (Key::Binary(a), Key::Binary(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Key) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl From<bool> for Key {
    fn from(v: bool) -> Key {
        Key::Boolean(v)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Key {
        Key::Integer(v.into())
    }
}

impl From<u64> for Key {
    fn from(v: u64) -> Key {
        Key::Integer(v.into())
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Key {
        Key::String(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Key {
        Key::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let v = Value::from("hello");
        assert!(v.is_str());
        assert_eq!(v.as_str(), Some("hello"));
        assert_eq!(v.as_bool(), None);

        let v = Value::from(3i64);
        assert_eq!(v.as_i64(), Some(3));
        assert_eq!(v.as_u64(), Some(3));
        assert_eq!(v.as_f64(), Some(3.0));

        assert!(Value::Null.is_null());
        assert_eq!(Value::from(1.5f64).as_f64(), Some(1.5));
    }

    #[test]
    fn key_canonicalization() {
        assert_eq!(Key::F64(2.0).canonical(), Some(Key::Integer(2.into())));
        assert_eq!(Key::F64(-7.0).canonical(), Some(Key::Integer((-7).into())));
        assert_eq!(Key::F64(2.5).canonical(), Some(Key::F64(2.5)));
        assert_eq!(Key::F64(f64::NAN).canonical(), None);
        assert_eq!(
            Key::from("x").canonical(),
            Some(Key::String("x".to_string()))
        );
    }

    #[test]
    fn key_ordering_is_total() {
        let mut keys = vec![
            Key::from("b"),
            Key::F64(0.5),
            Key::from(true),
            Key::from(2i64),
            Key::from("a"),
            Key::Binary(vec![9]),
            Key::from(-1i64),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                Key::from(true),
                Key::from(-1i64),
                Key::from(2i64),
                Key::F64(0.5),
                Key::from("a"),
                Key::from("b"),
                Key::Binary(vec![9]),
            ]
        );
    }

    #[test]
    fn map_keeps_last_write() {
        let mut map = BTreeMap::new();
        map.insert(Key::from(2i64), Value::from("first"));
        map.insert(Key::F64(2.0).canonical().unwrap(), Value::from("second"));
        assert_eq!(map.len(), 1);
        assert_eq!(map[&Key::from(2i64)].as_str(), Some("second"));
    }
}
