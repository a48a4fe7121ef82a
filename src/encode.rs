//! Configurable MessagePack encoding of [`Value`] trees.

use crate::{
    constants::constant_selector,
    error::{Error, Result},
    integer::{get_int_internal, IntPriv, Integer},
    marker::{ExtType, Marker, USER_TAG_MIN},
    value::{Key, Value},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deepest value nesting the codec will walk.
pub const MAX_DEPTH: usize = 100;

/// Which string markers the encoder may emit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringMode {
    /// Only fixstr/str16/str32, for decoders predating str8.
    Compat,
    /// The full string marker set.
    #[default]
    Standard,
    /// Emit strings as bin*; they decode as binary values.
    Binary,
}

/// How non-negative integers pick their markers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntMode {
    /// Non-negative values try the positive encodings first.
    #[default]
    Unsigned,
    /// Never emit uint markers; wide non-negative values must fit `i64`.
    Signed,
}

/// Precision for `F64` values on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberMode {
    /// Narrow to float32.
    Float,
    /// Keep float64.
    #[default]
    Double,
}

/// How integer-keyed maps are laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayMode {
    /// A map keyed exactly 1..=n becomes an array; anything sparse stays a map.
    #[default]
    WithoutHole,
    /// Any positive-integer-keyed map becomes an array padded to its max
    /// index with nils.
    WithHole,
    /// Every container is emitted as a map, arrays included.
    AlwaysMap,
}

/// The encoder's configuration surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeConfig {
    pub strings: StringMode,
    pub ints: IntMode,
    pub numbers: NumberMode,
    pub arrays: ArrayMode,
}

/// Byte sink shared by the real encoder and measure mode.
trait Output {
    fn put(&mut self, byte: u8);
    fn put_slice(&mut self, bytes: &[u8]);
}

impl Output for Vec<u8> {
    fn put(&mut self, byte: u8) {
        self.push(byte);
    }
    fn put_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

struct Counter(usize);

impl Output for Counter {
    fn put(&mut self, _byte: u8) {
        self.0 += 1;
    }
    fn put_slice(&mut self, bytes: &[u8]) {
        self.0 += bytes.len();
    }
}

/// Serialize a value onto a byte vector.
pub fn encode_value(buf: &mut Vec<u8>, value: &Value, config: &EncodeConfig) -> Result<()> {
    write_value(buf, value, config, 0)
}

/// Measure mode: the exact number of bytes [`encode_value`] would produce
/// for the same input and configuration, without producing them.
pub fn encoded_len(value: &Value, config: &EncodeConfig) -> Result<usize> {
    let mut counter = Counter(0);
    write_value(&mut counter, value, config, 0)?;
    Ok(counter.0)
}

fn write_value<O: Output>(
    out: &mut O,
    value: &Value,
    config: &EncodeConfig,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::ParseLimit("value nesting too deep"));
    }
    // Values that compare equal to a well-known constant ship as its
    // one-byte selector instead of their general extension.
    if let Some(sel) = constant_selector(value) {
        return write_ext(out, ExtType::Constant.into(), &[sel]);
    }
    match value {
        Value::Null => out.put(Marker::Null.into()),
        Value::Boolean(v) => out.put(if *v { Marker::True } else { Marker::False }.into()),
        Value::Integer(v) => write_int(out, v, config)?,
        Value::F32(v) => {
            out.put(Marker::F32.into());
            out.put_slice(&v.to_bits().to_be_bytes());
        }
        Value::F64(v) => match config.numbers {
            NumberMode::Double => {
                out.put(Marker::F64.into());
                out.put_slice(&v.to_bits().to_be_bytes());
            }
            NumberMode::Float => {
                out.put(Marker::F32.into());
                out.put_slice(&(*v as f32).to_bits().to_be_bytes());
            }
        },
        Value::String(v) => write_str(out, v, config)?,
        Value::Binary(v) => write_bin(out, v)?,
        Value::Array(v) => match config.arrays {
            ArrayMode::AlwaysMap => {
                write_map_head(out, v.len())?;
                for (i, item) in v.iter().enumerate() {
                    write_int(out, &Integer::from(i as u64 + 1), config)?;
                    write_value(out, item, config, depth + 1)?;
                }
            }
            _ => {
                write_array_head(out, v.len())?;
                for item in v {
                    write_value(out, item, config, depth + 1)?;
                }
            }
        },
        Value::Map(map) => write_map(out, map, config, depth)?,
        Value::Vector2(v) => {
            let mut payload = [0u8; 8];
            payload[..4].copy_from_slice(&v.x.to_bits().to_be_bytes());
            payload[4..].copy_from_slice(&v.y.to_bits().to_be_bytes());
            write_ext(out, ExtType::Vector2.into(), &payload)?;
        }
        Value::Vector3(v) => {
            let mut payload = [0u8; 12];
            payload[..4].copy_from_slice(&v.x.to_bits().to_be_bytes());
            payload[4..8].copy_from_slice(&v.y.to_bits().to_be_bytes());
            payload[8..].copy_from_slice(&v.z.to_bits().to_be_bytes());
            write_ext(out, ExtType::Vector3.into(), &payload)?;
        }
        Value::Vector4(v) => {
            let mut payload = [0u8; 16];
            payload[..4].copy_from_slice(&v.x.to_bits().to_be_bytes());
            payload[4..8].copy_from_slice(&v.y.to_bits().to_be_bytes());
            payload[8..12].copy_from_slice(&v.z.to_bits().to_be_bytes());
            payload[12..].copy_from_slice(&v.w.to_bits().to_be_bytes());
            write_ext(out, ExtType::Vector4.into(), &payload)?;
        }
        Value::Rotation(v) => {
            let mut payload = [0u8; 12];
            payload[..4].copy_from_slice(&v.x.to_bits().to_be_bytes());
            payload[4..8].copy_from_slice(&v.y.to_bits().to_be_bytes());
            payload[8..].copy_from_slice(&v.z.to_bits().to_be_bytes());
            write_ext(out, ExtType::Rotation.into(), &payload)?;
        }
        Value::Color(v) => {
            write_ext(out, ExtType::Color.into(), &[v.r, v.g, v.b, v.a])?;
        }
        Value::Player(p) => match p.packed() {
            Some((hi, lo)) => {
                let mut payload = [0u8; 16];
                payload[..8].copy_from_slice(&hi.to_be_bytes());
                payload[8..].copy_from_slice(&lo.to_be_bytes());
                write_ext(out, ExtType::PlayerId.into(), &payload)?;
            }
            None => write_ext(out, ExtType::PlayerIdStr.into(), p.id().as_bytes())?,
        },
        Value::Object(o) => match o.packed() {
            Some(word) => {
                write_ext(out, ExtType::ObjectId.into(), &word.to_be_bytes())?;
            }
            None => write_ext(out, ExtType::ObjectIdStr.into(), o.id().as_bytes())?,
        },
        Value::Bits(bits) => {
            let mut payload = Vec::with_capacity(1 + bits.as_bytes().len());
            payload.push(bits.partial_bits());
            payload.extend_from_slice(bits.as_bytes());
            write_ext(out, ExtType::BitArray.into(), &payload)?;
        }
        Value::Enum(e) => {
            let mut keys = Vec::with_capacity(e.len());
            let mut values = Vec::with_capacity(e.len());
            for (key, value) in e.iter() {
                keys.push(Value::from(key));
                values.push(Value::from(value));
            }
            // The nested columns use the default configuration so the
            // payload bytes don't depend on the outer encoder's modes.
            let mut payload = Vec::new();
            let pair = Value::Array(vec![Value::Array(keys), Value::Array(values)]);
            write_value(&mut payload, &pair, &EncodeConfig::default(), depth + 1)?;
            write_ext(out, ExtType::Enum.into(), &payload)?;
        }
        Value::Ext(tag, payload) => {
            if *tag < USER_TAG_MIN {
                return Err(Error::InvalidArgument(format!(
                    "Extension tag {} is reserved",
                    tag
                )));
            }
            write_ext(out, *tag, payload)?;
        }
    }
    Ok(())
}

fn write_int<O: Output>(out: &mut O, v: &Integer, config: &EncodeConfig) -> Result<()> {
    match get_int_internal(v) {
        IntPriv::PosInt(v) => match config.ints {
            IntMode::Unsigned => {
                if v <= 127 {
                    out.put(Marker::PosFixInt(v as u8).into());
                } else if v <= u8::MAX as u64 {
                    out.put(Marker::UInt8.into());
                    out.put(v as u8);
                } else if v <= u16::MAX as u64 {
                    out.put(Marker::UInt16.into());
                    out.put_slice(&(v as u16).to_be_bytes());
                } else if v <= u32::MAX as u64 {
                    out.put(Marker::UInt32.into());
                    out.put_slice(&(v as u32).to_be_bytes());
                } else {
                    out.put(Marker::UInt64.into());
                    out.put_slice(&v.to_be_bytes());
                }
            }
            IntMode::Signed => {
                if v <= 127 {
                    out.put(Marker::PosFixInt(v as u8).into());
                } else if v <= i16::MAX as u64 {
                    out.put(Marker::Int16.into());
                    out.put_slice(&(v as i16).to_be_bytes());
                } else if v <= i32::MAX as u64 {
                    out.put(Marker::Int32.into());
                    out.put_slice(&(v as i32).to_be_bytes());
                } else if v <= i64::MAX as u64 {
                    out.put(Marker::Int64.into());
                    out.put_slice(&(v as i64).to_be_bytes());
                } else {
                    return Err(Error::UnsupportedValue(
                        "integer above i64::MAX in signed mode",
                    ));
                }
            }
        },
        IntPriv::NegInt(v) => {
            if v >= -32 {
                out.put(Marker::NegFixInt(v as i8).into());
            } else if v >= i8::MIN as i64 {
                out.put(Marker::Int8.into());
                out.put(v as u8);
            } else if v >= i16::MIN as i64 {
                out.put(Marker::Int16.into());
                out.put_slice(&(v as i16).to_be_bytes());
            } else if v >= i32::MIN as i64 {
                out.put(Marker::Int32.into());
                out.put_slice(&(v as i32).to_be_bytes());
            } else {
                out.put(Marker::Int64.into());
                out.put_slice(&v.to_be_bytes());
            }
        }
    }
    Ok(())
}

fn write_str<O: Output>(out: &mut O, v: &str, config: &EncodeConfig) -> Result<()> {
    if let StringMode::Binary = config.strings {
        return write_bin(out, v.as_bytes());
    }
    let len = v.len();
    if len <= 31 {
        out.put(Marker::FixStr(len as u8).into());
    } else if len <= u8::MAX as usize && config.strings == StringMode::Standard {
        out.put(Marker::Str8.into());
        out.put(len as u8);
    } else if len <= u16::MAX as usize {
        out.put(Marker::Str16.into());
        out.put_slice(&(len as u16).to_be_bytes());
    } else if len <= u32::MAX as usize {
        out.put(Marker::Str32.into());
        out.put_slice(&(len as u32).to_be_bytes());
    } else {
        return Err(Error::UnsupportedValue("string longer than u32::MAX bytes"));
    }
    out.put_slice(v.as_bytes());
    Ok(())
}

fn write_bin<O: Output>(out: &mut O, v: &[u8]) -> Result<()> {
    let len = v.len();
    if len <= u8::MAX as usize {
        out.put(Marker::Bin8.into());
        out.put(len as u8);
    } else if len <= u16::MAX as usize {
        out.put(Marker::Bin16.into());
        out.put_slice(&(len as u16).to_be_bytes());
    } else if len <= u32::MAX as usize {
        out.put(Marker::Bin32.into());
        out.put_slice(&(len as u32).to_be_bytes());
    } else {
        return Err(Error::UnsupportedValue("binary longer than u32::MAX bytes"));
    }
    out.put_slice(v);
    Ok(())
}

fn write_array_head<O: Output>(out: &mut O, len: usize) -> Result<()> {
    if len <= 15 {
        out.put(Marker::FixArray(len as u8).into());
    } else if len <= u16::MAX as usize {
        out.put(Marker::Array16.into());
        out.put_slice(&(len as u16).to_be_bytes());
    } else if len <= u32::MAX as usize {
        out.put(Marker::Array32.into());
        out.put_slice(&(len as u32).to_be_bytes());
    } else {
        return Err(Error::UnsupportedValue("array longer than u32::MAX items"));
    }
    Ok(())
}

fn write_map_head<O: Output>(out: &mut O, len: usize) -> Result<()> {
    if len <= 15 {
        out.put(Marker::FixMap(len as u8).into());
    } else if len <= u16::MAX as usize {
        out.put(Marker::Map16.into());
        out.put_slice(&(len as u16).to_be_bytes());
    } else if len <= u32::MAX as usize {
        out.put(Marker::Map32.into());
        out.put_slice(&(len as u32).to_be_bytes());
    } else {
        return Err(Error::UnsupportedValue("map longer than u32::MAX entries"));
    }
    Ok(())
}

fn write_ext<O: Output>(out: &mut O, tag: i8, payload: &[u8]) -> Result<()> {
    let len = payload.len();
    match len {
        1 => out.put(Marker::FixExt1.into()),
        2 => out.put(Marker::FixExt2.into()),
        4 => out.put(Marker::FixExt4.into()),
        8 => out.put(Marker::FixExt8.into()),
        16 => out.put(Marker::FixExt16.into()),
        _ if len <= u8::MAX as usize => {
            out.put(Marker::Ext8.into());
            out.put(len as u8);
        }
        _ if len <= u16::MAX as usize => {
            out.put(Marker::Ext16.into());
            out.put_slice(&(len as u16).to_be_bytes());
        }
        _ if len <= u32::MAX as usize => {
            out.put(Marker::Ext32.into());
            out.put_slice(&(len as u32).to_be_bytes());
        }
        _ => return Err(Error::UnsupportedValue("extension longer than u32::MAX")),
    }
    out.put(tag as u8);
    out.put_slice(payload);
    Ok(())
}

fn write_key<O: Output>(out: &mut O, key: &Key, config: &EncodeConfig) -> Result<()> {
    match key {
        Key::Boolean(v) => out.put(if *v { Marker::True } else { Marker::False }.into()),
        Key::Integer(v) => write_int(out, v, config)?,
        Key::F64(v) => match config.numbers {
            NumberMode::Double => {
                out.put(Marker::F64.into());
                out.put_slice(&v.to_bits().to_be_bytes());
            }
            NumberMode::Float => {
                out.put(Marker::F32.into());
                out.put_slice(&(*v as f32).to_bits().to_be_bytes());
            }
        },
        Key::String(v) => write_str(out, v, config)?,
        Key::Binary(v) => write_bin(out, v)?,
    }
    Ok(())
}

/// The length of the array a dense 1..=n integer-keyed map becomes, if it is
/// one.
fn dense_len(map: &BTreeMap<Key, Value>) -> Option<usize> {
    let mut expected = 1i64;
    for key in map.keys() {
        if key.as_i64()? != expected {
            return None;
        }
        expected = expected.checked_add(1)?;
    }
    Some(map.len())
}

/// The max index of an all-positive-integer-keyed map, if it is one.
fn holey_max(map: &BTreeMap<Key, Value>) -> Option<i64> {
    let mut max = 0i64;
    for key in map.keys() {
        let idx = key.as_i64()?;
        if idx < 1 {
            return None;
        }
        max = max.max(idx);
    }
    (max > 0).then_some(max)
}

fn write_map<O: Output>(
    out: &mut O,
    map: &BTreeMap<Key, Value>,
    config: &EncodeConfig,
    depth: usize,
) -> Result<()> {
    match config.arrays {
        ArrayMode::WithoutHole => {
            if let Some(len) = dense_len(map) {
                write_array_head(out, len)?;
                for value in map.values() {
                    write_value(out, value, config, depth + 1)?;
                }
                return Ok(());
            }
        }
        ArrayMode::WithHole => {
            if let Some(max) = holey_max(map) {
                write_array_head(out, max as usize)?;
                for idx in 1..=max {
                    match map.get(&Key::from(idx)) {
                        Some(value) => write_value(out, value, config, depth + 1)?,
                        None => out.put(Marker::Null.into()),
                    }
                }
                return Ok(());
            }
        }
        ArrayMode::AlwaysMap => {}
    }
    write_map_head(out, map.len())?;
    for (key, value) in map {
        write_key(out, key, config)?;
        write_value(out, value, config, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, ObjectRef, PlayerRef, Vector3};

    fn enc(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_value(&mut buf, value, &EncodeConfig::default()).unwrap();
        buf
    }

    fn enc_with(value: &Value, config: &EncodeConfig) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_value(&mut buf, value, config).unwrap();
        buf
    }

    #[test]
    fn scalars() {
        assert_eq!(enc(&Value::Null), hex::decode("c0").unwrap());
        assert_eq!(enc(&Value::from(false)), hex::decode("c2").unwrap());
        assert_eq!(enc(&Value::from(true)), hex::decode("c3").unwrap());
        assert_eq!(enc(&Value::from(0i64)), hex::decode("00").unwrap());
        assert_eq!(enc(&Value::from(127i64)), hex::decode("7f").unwrap());
        assert_eq!(enc(&Value::from(128i64)), hex::decode("cc80").unwrap());
        assert_eq!(enc(&Value::from(256i64)), hex::decode("cd0100").unwrap());
        assert_eq!(
            enc(&Value::from(65536i64)),
            hex::decode("ce00010000").unwrap()
        );
        assert_eq!(
            enc(&Value::from(u64::MAX)),
            hex::decode("cfffffffffffffffff").unwrap()
        );
        assert_eq!(enc(&Value::from(-1i64)), hex::decode("ff").unwrap());
        assert_eq!(enc(&Value::from(-32i64)), hex::decode("e0").unwrap());
        assert_eq!(enc(&Value::from(-33i64)), hex::decode("d0df").unwrap());
        assert_eq!(enc(&Value::from(-129i64)), hex::decode("d1ff7f").unwrap());
        assert_eq!(
            enc(&Value::from(-40000i64)),
            hex::decode("d2ffff63c0").unwrap()
        );
        assert_eq!(
            enc(&Value::from(i64::MIN)),
            hex::decode("d38000000000000000").unwrap()
        );
        assert_eq!(
            enc(&Value::from(1.5f64)),
            hex::decode("cb3ff8000000000000").unwrap()
        );
        assert_eq!(
            enc(&Value::from(1.5f32)),
            hex::decode("ca3fc00000").unwrap()
        );
    }

    #[test]
    fn signed_mode_integers() {
        let cfg = EncodeConfig {
            ints: IntMode::Signed,
            ..Default::default()
        };
        assert_eq!(enc_with(&Value::from(5i64), &cfg), hex::decode("05").unwrap());
        assert_eq!(
            enc_with(&Value::from(128i64), &cfg),
            hex::decode("d10080").unwrap()
        );
        assert_eq!(
            enc_with(&Value::from(40000i64), &cfg),
            hex::decode("d200009c40").unwrap()
        );
        assert_eq!(
            enc_with(&Value::from(i64::MAX), &cfg),
            hex::decode("d37fffffffffffffff").unwrap()
        );
        let mut buf = Vec::new();
        assert_eq!(
            encode_value(&mut buf, &Value::from(u64::MAX), &cfg),
            Err(Error::UnsupportedValue(
                "integer above i64::MAX in signed mode"
            ))
        );
    }

    #[test]
    fn number_mode_narrows_doubles() {
        let cfg = EncodeConfig {
            numbers: NumberMode::Float,
            ..Default::default()
        };
        assert_eq!(
            enc_with(&Value::from(1.5f64), &cfg),
            hex::decode("ca3fc00000").unwrap()
        );
    }

    #[test]
    fn strings_per_mode() {
        assert_eq!(enc(&Value::from("abc")), hex::decode("a3616263").unwrap());
        let long = "x".repeat(32);
        let mut expect = hex::decode("d920").unwrap();
        expect.extend_from_slice(long.as_bytes());
        assert_eq!(enc(&Value::from(long.as_str())), expect);

        let compat = EncodeConfig {
            strings: StringMode::Compat,
            ..Default::default()
        };
        let mut expect = hex::decode("da0020").unwrap();
        expect.extend_from_slice(long.as_bytes());
        assert_eq!(enc_with(&Value::from(long.as_str()), &compat), expect);

        let binary = EncodeConfig {
            strings: StringMode::Binary,
            ..Default::default()
        };
        assert_eq!(
            enc_with(&Value::from("abc"), &binary),
            hex::decode("c403616263").unwrap()
        );
    }

    #[test]
    fn binary_values() {
        assert_eq!(
            enc(&Value::Binary(vec![1, 2, 3])),
            hex::decode("c403010203").unwrap()
        );
        let big = vec![0u8; 300];
        let out = enc(&Value::Binary(big));
        assert_eq!(&out[..3], &hex::decode("c5012c").unwrap()[..]);
        assert_eq!(out.len(), 3 + 300);
    }

    #[test]
    fn containers() {
        let v = Value::Array(vec![Value::from(1i64), Value::from("a")]);
        assert_eq!(enc(&v), hex::decode("9201a161").unwrap());

        let mut map = BTreeMap::new();
        map.insert(Key::from("k"), Value::from(7i64));
        assert_eq!(enc(&Value::Map(map)), hex::decode("81a16b07").unwrap());

        let many: Vec<Value> = (0..16).map(|_| Value::Null).collect();
        let out = enc(&Value::Array(many));
        assert_eq!(&out[..3], &hex::decode("dc0010").unwrap()[..]);
    }

    #[test]
    fn array_modes() {
        let mut dense = BTreeMap::new();
        dense.insert(Key::from(1i64), Value::from("a"));
        dense.insert(Key::from(2i64), Value::from("b"));
        // Dense integer keys collapse to an array by default.
        assert_eq!(enc(&Value::Map(dense.clone())), hex::decode("92a161a162").unwrap());

        let mut sparse = BTreeMap::new();
        sparse.insert(Key::from(1i64), Value::from("a"));
        sparse.insert(Key::from(4i64), Value::from("b"));
        // Sparse stays a map by default...
        assert_eq!(
            enc(&Value::Map(sparse.clone())),
            hex::decode("8201a16104a162").unwrap()
        );
        // ...and pads to the max index in hole mode.
        let holes = EncodeConfig {
            arrays: ArrayMode::WithHole,
            ..Default::default()
        };
        assert_eq!(
            enc_with(&Value::Map(sparse.clone()), &holes),
            hex::decode("94a161c0c0a162").unwrap()
        );

        let always = EncodeConfig {
            arrays: ArrayMode::AlwaysMap,
            ..Default::default()
        };
        assert_eq!(
            enc_with(&Value::Map(dense), &always),
            hex::decode("8201a16102a162").unwrap()
        );
        assert_eq!(
            enc_with(
                &Value::Array(vec![Value::from("a"), Value::from("b")]),
                &always
            ),
            hex::decode("8201a16102a162").unwrap()
        );

        // Zero-based or non-integer keys never become arrays.
        let mut zero = BTreeMap::new();
        zero.insert(Key::from(0i64), Value::from("a"));
        assert_eq!(enc_with(&Value::Map(zero), &holes), hex::decode("8100a161").unwrap());
    }

    #[test]
    fn domain_extensions() {
        assert_eq!(
            enc(&Value::Color(Color::new(1, 2, 3, 4))),
            hex::decode("d60201020304").unwrap()
        );
        assert_eq!(
            enc(&Value::Vector3(Vector3::new(1.0, 2.0, 3.0))),
            hex::decode("c70c003f8000004000000040400000").unwrap()
        );
        assert_eq!(
            enc(&Value::Object(ObjectRef::new("8D4B561900000092"))),
            hex::decode("d7078d4b561900000092").unwrap()
        );
        // A decorated id has no packed form and ships verbatim.
        let decorated = Value::Object(ObjectRef::new("8D4B561900000092:Cube"));
        let mut expect = hex::decode("c71508").unwrap();
        expect.extend_from_slice(b"8D4B561900000092:Cube");
        assert_eq!(enc(&decorated), expect);

        let player = Value::Player(PlayerRef::new("000000000000002a0000000000000007"));
        assert_eq!(
            enc(&player),
            hex::decode("d805000000000000002a0000000000000007").unwrap()
        );
    }

    #[test]
    fn constants_win_over_general_extensions() {
        assert_eq!(
            enc(&Value::Color(Color::WHITE)),
            hex::decode("d4280a").unwrap()
        );
        assert_eq!(
            enc(&Value::Vector3(Vector3::ZERO)),
            hex::decode("d42834").unwrap()
        );
        assert_eq!(
            enc(&Value::Object(ObjectRef::UNASSIGNED)),
            hex::decode("d42800").unwrap()
        );
    }

    #[test]
    fn bit_array_extension() {
        let mut bits = crate::BitArray::new(12, false);
        bits.set(0, true).unwrap();
        bits.set(11, true).unwrap();
        // 1 length byte + partial count + two data bytes under ext8.
        assert_eq!(
            enc(&Value::Bits(bits)),
            hex::decode("c70329040108").unwrap()
        );
    }

    #[test]
    fn user_extensions() {
        assert_eq!(
            enc(&Value::Ext(43, vec![0xAA, 0xBB, 0xCC])),
            hex::decode("c7032baabbcc").unwrap()
        );
        assert_eq!(
            enc(&Value::Ext(100, vec![0xAA])),
            hex::decode("d464aa").unwrap()
        );
        let mut buf = Vec::new();
        assert!(encode_value(
            &mut buf,
            &Value::Ext(5, vec![]),
            &EncodeConfig::default()
        )
        .is_err());
        assert!(encode_value(
            &mut buf,
            &Value::Ext(-2, vec![]),
            &EncodeConfig::default()
        )
        .is_err());
    }

    #[test]
    fn measure_matches_encode() {
        let mut map = BTreeMap::new();
        map.insert(Key::from("name"), Value::from("tester"));
        map.insert(Key::from("score"), Value::from(90210i64));
        map.insert(Key::F64(2.5), Value::from(true));
        let corpus = vec![
            Value::Null,
            Value::from(-5000i64),
            Value::from("measure me"),
            Value::Binary(vec![7; 77]),
            Value::Color(Color::RUBY),
            Value::Vector3(Vector3::new(0.5, -0.5, 9.0)),
            Value::Map(map),
            Value::Array(vec![Value::from(1i64), Value::Null, Value::from("x")]),
        ];
        for config in [
            EncodeConfig::default(),
            EncodeConfig {
                strings: StringMode::Binary,
                ints: IntMode::Signed,
                numbers: NumberMode::Float,
                arrays: ArrayMode::AlwaysMap,
            },
        ] {
            for value in &corpus {
                let mut buf = Vec::new();
                encode_value(&mut buf, value, &config).unwrap();
                assert_eq!(encoded_len(value, &config).unwrap(), buf.len());
            }
        }
    }

    #[test]
    fn depth_limit() {
        let mut v = Value::Null;
        for _ in 0..(MAX_DEPTH + 2) {
            v = Value::Array(vec![v]);
        }
        let mut buf = Vec::new();
        assert_eq!(
            encode_value(&mut buf, &v, &EncodeConfig::default()),
            Err(Error::ParseLimit("value nesting too deep"))
        );
    }
}
