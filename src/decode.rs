//! Decoding MessagePack bytes back into [`Value`] trees.

use crate::{
    bits::BitArray,
    constants::constant_value,
    encode::MAX_DEPTH,
    enums::Enum,
    error::{Error, Result},
    marker::{ExtType, Marker, USER_TAG_MIN},
    types::{Color, ObjectRef, PlayerRef, Rotation, Vector2, Vector3, Vector4},
    value::{Key, Value},
};
use byteorder::{BigEndian, ReadBytesExt};
use std::collections::BTreeMap;

/// A decoder for a user extension payload.
pub type ExtDecodeFn = fn(&[u8]) -> Result<Value>;

/// Decoders for user-defined extension tags.
///
/// Tags below [`USER_TAG_MIN`] belong to the built-in domain types and
/// cannot be registered. A registration, once made, cannot be replaced.
#[derive(Clone, Debug, Default)]
pub struct ExtRegistry {
    decoders: BTreeMap<i8, ExtDecodeFn>,
}

impl ExtRegistry {
    pub fn new() -> ExtRegistry {
        ExtRegistry::default()
    }

    /// Register a decoder for `tag`. The encode side has no counterpart to
    /// register: user values are built as [`Value::Ext`] and written
    /// verbatim.
    pub fn register(&mut self, tag: i8, decoder: ExtDecodeFn) -> Result<()> {
        if tag < USER_TAG_MIN {
            return Err(Error::InvalidArgument(format!(
                "Extension tag {} is reserved",
                tag
            )));
        }
        if self.decoders.contains_key(&tag) {
            return Err(Error::ReadOnly("An existing extension registration"));
        }
        self.decoders.insert(tag, decoder);
        Ok(())
    }

    fn get(&self, tag: i8) -> Option<ExtDecodeFn> {
        self.decoders.get(&tag).copied()
    }
}

/// Decode a single value occupying the whole buffer. Trailing bytes fail
/// with [`Error::ExtraBytes`].
pub fn decode_value(buf: &[u8], registry: &ExtRegistry) -> Result<Value> {
    let mut cursor = buf;
    let value = read_value(&mut cursor, registry, 0)?;
    if !cursor.is_empty() {
        return Err(Error::ExtraBytes {
            remaining: cursor.len(),
        });
    }
    Ok(value)
}

/// Decode one value from the front of the buffer, returning it along with
/// the number of bytes consumed.
pub fn decode_value_prefix(buf: &[u8], registry: &ExtRegistry) -> Result<(Value, usize)> {
    let mut cursor = buf;
    let value = read_value(&mut cursor, registry, 0)?;
    Ok((value, buf.len() - cursor.len()))
}

fn short(step: &'static str, expected: usize, buf: &[u8]) -> Error {
    Error::Truncated {
        step,
        expected,
        actual: buf.len(),
    }
}

fn read_value(buf: &mut &[u8], registry: &ExtRegistry, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(Error::ParseLimit("value nesting too deep"));
    }
    let marker = Marker::from_u8(buf.read_u8().map_err(|_| short("read marker", 1, buf))?);
    Ok(match marker {
        Marker::Null => Value::Null,
        Marker::Reserved => return Err(Error::BadEncode("Reserved marker found".into())),
        Marker::False => Value::Boolean(false),
        Marker::True => Value::Boolean(true),
        Marker::PosFixInt(v) => Value::Integer(v.into()),
        Marker::NegFixInt(v) => Value::Integer(v.into()),
        Marker::UInt8 => {
            Value::Integer(read_scalar(buf, "decode uint8", 1, |b| b.read_u8())?.into())
        }
        Marker::UInt16 => Value::Integer(
            read_scalar(buf, "decode uint16", 2, |b| b.read_u16::<BigEndian>())?.into(),
        ),
        Marker::UInt32 => Value::Integer(
            read_scalar(buf, "decode uint32", 4, |b| b.read_u32::<BigEndian>())?.into(),
        ),
        Marker::UInt64 => Value::Integer(
            read_scalar(buf, "decode uint64", 8, |b| b.read_u64::<BigEndian>())?.into(),
        ),
        Marker::Int8 => {
            Value::Integer(read_scalar(buf, "decode int8", 1, |b| b.read_i8())?.into())
        }
        Marker::Int16 => Value::Integer(
            read_scalar(buf, "decode int16", 2, |b| b.read_i16::<BigEndian>())?.into(),
        ),
        Marker::Int32 => Value::Integer(
            read_scalar(buf, "decode int32", 4, |b| b.read_i32::<BigEndian>())?.into(),
        ),
        Marker::Int64 => Value::Integer(
            read_scalar(buf, "decode int64", 8, |b| b.read_i64::<BigEndian>())?.into(),
        ),
        Marker::F32 => Value::F32(read_scalar(buf, "decode f32", 4, |b| {
            b.read_f32::<BigEndian>()
        })?),
        Marker::F64 => Value::F64(read_scalar(buf, "decode f64", 8, |b| {
            b.read_f64::<BigEndian>()
        })?),
        Marker::FixStr(len) => Value::String(read_raw_str(buf, len as usize)?.to_string()),
        Marker::Str8 => {
            let len = read_scalar(buf, "decode str8 length", 1, |b| b.read_u8())? as usize;
            Value::String(read_raw_str(buf, len)?.to_string())
        }
        Marker::Str16 => {
            let len =
                read_scalar(buf, "decode str16 length", 2, |b| b.read_u16::<BigEndian>())? as usize;
            Value::String(read_raw_str(buf, len)?.to_string())
        }
        Marker::Str32 => {
            let len =
                read_scalar(buf, "decode str32 length", 4, |b| b.read_u32::<BigEndian>())? as usize;
            Value::String(read_raw_str(buf, len)?.to_string())
        }
        Marker::Bin8 => {
            let len = read_scalar(buf, "decode bin8 length", 1, |b| b.read_u8())? as usize;
            Value::Binary(read_raw_bin(buf, len)?.to_vec())
        }
        Marker::Bin16 => {
            let len =
                read_scalar(buf, "decode bin16 length", 2, |b| b.read_u16::<BigEndian>())? as usize;
            Value::Binary(read_raw_bin(buf, len)?.to_vec())
        }
        Marker::Bin32 => {
            let len =
                read_scalar(buf, "decode bin32 length", 4, |b| b.read_u32::<BigEndian>())? as usize;
            Value::Binary(read_raw_bin(buf, len)?.to_vec())
        }
        Marker::FixArray(len) => read_array(buf, len as usize, registry, depth)?,
        Marker::Array16 => {
            let len =
                read_scalar(buf, "decode array16 length", 2, |b| b.read_u16::<BigEndian>())?
                    as usize;
            read_array(buf, len, registry, depth)?
        }
        Marker::Array32 => {
            let len =
                read_scalar(buf, "decode array32 length", 4, |b| b.read_u32::<BigEndian>())?
                    as usize;
            read_array(buf, len, registry, depth)?
        }
        Marker::FixMap(len) => read_map(buf, len as usize, registry, depth)?,
        Marker::Map16 => {
            let len =
                read_scalar(buf, "decode map16 length", 2, |b| b.read_u16::<BigEndian>())? as usize;
            read_map(buf, len, registry, depth)?
        }
        Marker::Map32 => {
            let len =
                read_scalar(buf, "decode map32 length", 4, |b| b.read_u32::<BigEndian>())? as usize;
            read_map(buf, len, registry, depth)?
        }
        Marker::FixExt1 => read_ext(buf, 1, registry, depth)?,
        Marker::FixExt2 => read_ext(buf, 2, registry, depth)?,
        Marker::FixExt4 => read_ext(buf, 4, registry, depth)?,
        Marker::FixExt8 => read_ext(buf, 8, registry, depth)?,
        Marker::FixExt16 => read_ext(buf, 16, registry, depth)?,
        Marker::Ext8 => {
            let len = read_scalar(buf, "decode ext8 length", 1, |b| b.read_u8())? as usize;
            read_ext(buf, len, registry, depth)?
        }
        Marker::Ext16 => {
            let len =
                read_scalar(buf, "decode ext16 length", 2, |b| b.read_u16::<BigEndian>())? as usize;
            read_ext(buf, len, registry, depth)?
        }
        Marker::Ext32 => {
            let len =
                read_scalar(buf, "decode ext32 length", 4, |b| b.read_u32::<BigEndian>())? as usize;
            read_ext(buf, len, registry, depth)?
        }
    })
}

fn read_scalar<T, F>(buf: &mut &[u8], step: &'static str, size: usize, read: F) -> Result<T>
where
    F: FnOnce(&mut &[u8]) -> std::io::Result<T>,
{
    let avail = buf.len();
    read(buf).map_err(|_| Error::Truncated {
        step,
        expected: size,
        actual: avail,
    })
}

/// Reference `len` bytes out of the buffer, advancing it.
fn read_raw_bin<'a>(buf: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if buf.len() >= len {
        let (data, rem) = buf.split_at(len);
        *buf = rem;
        Ok(data)
    } else {
        Err(short("read raw bytes", len, buf))
    }
}

/// Reference a UTF-8 string of `len` bytes out of the buffer, advancing it.
fn read_raw_str<'a>(buf: &mut &'a [u8], len: usize) -> Result<&'a str> {
    let data = read_raw_bin(buf, len)?;
    std::str::from_utf8(data).map_err(|_| Error::BadEncode("String wasn't valid UTF-8".into()))
}

fn read_array(
    buf: &mut &[u8],
    len: usize,
    registry: &ExtRegistry,
    depth: usize,
) -> Result<Value> {
    let mut v = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        v.push(read_value(buf, registry, depth + 1)?);
    }
    Ok(Value::Array(v))
}

fn read_map(buf: &mut &[u8], len: usize, registry: &ExtRegistry, depth: usize) -> Result<Value> {
    let mut map = BTreeMap::new();
    for _ in 0..len {
        let key = read_value(buf, registry, depth + 1)?;
        let value = read_value(buf, registry, depth + 1)?;
        // Nil and NaN keys are dropped; their values were still consumed
        // above so the cursor stays aligned. Numeric keys collapse to their
        // canonical form, last write winning.
        let key = match key {
            Value::Null => continue,
            Value::Boolean(b) => Key::Boolean(b),
            Value::Integer(n) => Key::Integer(n),
            Value::F32(f) => match Key::F64(f as f64).canonical() {
                Some(k) => k,
                None => continue,
            },
            Value::F64(f) => match Key::F64(f).canonical() {
                Some(k) => k,
                None => continue,
            },
            Value::String(s) => Key::String(s),
            Value::Binary(b) => Key::Binary(b),
            other => {
                return Err(Error::BadEncode(format!(
                    "A {} cannot be a map key",
                    other.kind()
                )))
            }
        };
        map.insert(key, value);
    }
    Ok(Value::Map(map))
}

fn payload_f32(payload: &mut &[u8]) -> Result<f32> {
    read_scalar(payload, "decode extension f32", 4, |b| {
        b.read_f32::<BigEndian>()
    })
}

fn read_ext(buf: &mut &[u8], len: usize, registry: &ExtRegistry, depth: usize) -> Result<Value> {
    let tag = read_scalar(buf, "decode ext tag", 1, |b| b.read_i8())?;
    let mut payload = read_raw_bin(buf, len)?;
    let Some(ext) = ExtType::from_i8(tag) else {
        if tag >= USER_TAG_MIN {
            if let Some(decoder) = registry.get(tag) {
                return decoder(payload);
            }
        }
        return Err(Error::UnknownExtension(tag));
    };
    let expect_len = |need: usize| -> Result<()> {
        if len == need {
            Ok(())
        } else {
            Err(Error::BadEncode(format!(
                "Extension tag {} has payload length {}, wanted {}",
                tag, len, need
            )))
        }
    };
    Ok(match ext {
        ExtType::Vector2 => {
            expect_len(8)?;
            Value::Vector2(Vector2::new(
                payload_f32(&mut payload)?,
                payload_f32(&mut payload)?,
            ))
        }
        ExtType::Vector3 => {
            expect_len(12)?;
            Value::Vector3(Vector3::new(
                payload_f32(&mut payload)?,
                payload_f32(&mut payload)?,
                payload_f32(&mut payload)?,
            ))
        }
        ExtType::Vector4 => {
            expect_len(16)?;
            Value::Vector4(Vector4::new(
                payload_f32(&mut payload)?,
                payload_f32(&mut payload)?,
                payload_f32(&mut payload)?,
                payload_f32(&mut payload)?,
            ))
        }
        ExtType::Rotation => {
            expect_len(12)?;
            Value::Rotation(Rotation::new(
                payload_f32(&mut payload)?,
                payload_f32(&mut payload)?,
                payload_f32(&mut payload)?,
            ))
        }
        ExtType::Color => {
            expect_len(4)?;
            Value::Color(Color::new(payload[0], payload[1], payload[2], payload[3]))
        }
        ExtType::PlayerId => {
            expect_len(16)?;
            let hi = read_scalar(&mut payload, "decode player id", 8, |b| {
                b.read_u64::<BigEndian>()
            })?;
            let lo = read_scalar(&mut payload, "decode player id", 8, |b| {
                b.read_u64::<BigEndian>()
            })?;
            Value::Player(PlayerRef::from_packed(hi, lo))
        }
        ExtType::PlayerIdStr => {
            let id = std::str::from_utf8(payload)
                .map_err(|_| Error::BadEncode("Player id wasn't valid UTF-8".into()))?;
            Value::Player(PlayerRef::new(id))
        }
        ExtType::ObjectId => {
            expect_len(8)?;
            let word = read_scalar(&mut payload, "decode object id", 8, |b| {
                b.read_u64::<BigEndian>()
            })?;
            Value::Object(ObjectRef::from_packed(word))
        }
        ExtType::ObjectIdStr => {
            let id = std::str::from_utf8(payload)
                .map_err(|_| Error::BadEncode("Object id wasn't valid UTF-8".into()))?;
            Value::Object(ObjectRef::new(id))
        }
        ExtType::Constant => {
            expect_len(1)?;
            constant_value(payload[0]).ok_or(Error::UnknownConstant(payload[0]))?
        }
        ExtType::BitArray => {
            if payload.is_empty() {
                return Err(Error::BadEncode("Bit array payload is empty".into()));
            }
            Value::Bits(BitArray::from_packed_bytes(&payload[1..], payload[0])?)
        }
        ExtType::Enum => {
            let (pair, used) = decode_value_prefix(payload, registry)?;
            if used != payload.len() {
                return Err(Error::BadEncode("Enum payload has trailing bytes".into()));
            }
            let Some([keys, values]) = pair.as_array().map(|a| a.as_slice()).and_then(|a| {
                <&[Value; 2]>::try_from(a).ok()
            }) else {
                return Err(Error::BadEncode(
                    "Enum payload wasn't a key/value column pair".into(),
                ));
            };
            let keys = decode_enum_keys(keys)?;
            let values = decode_enum_values(values)?;
            Value::Enum(Enum::from_columns(keys, values)?)
        }
    })
}

fn decode_enum_keys(keys: &Value) -> Result<Vec<String>> {
    let Some(keys) = keys.as_array() else {
        return Err(Error::BadEncode("Enum keys weren't an array".into()));
    };
    keys.iter()
        .map(|k| {
            k.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::BadEncode("Enum key wasn't a string".into()))
        })
        .collect()
}

fn decode_enum_values(values: &Value) -> Result<Vec<i64>> {
    let Some(values) = values.as_array() else {
        return Err(Error::BadEncode("Enum values weren't an array".into()));
    };
    values
        .iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| Error::BadEncode("Enum value wasn't an integer".into()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_value, ArrayMode, EncodeConfig};

    fn round_trip(value: &Value) -> Value {
        let mut buf = Vec::new();
        encode_value(&mut buf, value, &EncodeConfig::default()).unwrap();
        decode_value(&buf, &ExtRegistry::new()).unwrap()
    }

    #[test]
    fn scalar_round_trips() {
        for value in [
            Value::Null,
            Value::from(true),
            Value::from(false),
            Value::from(0i64),
            Value::from(127i64),
            Value::from(128i64),
            Value::from(-32i64),
            Value::from(-33i64),
            Value::from(i64::MIN),
            Value::from(u64::MAX),
            Value::from(1.25f32),
            Value::from(-1234.5f64),
            Value::from("a string with some length to it"),
            Value::Binary((0u8..=255).collect()),
        ] {
            assert_eq!(round_trip(&value), value, "value {:?}", value);
        }
    }

    #[test]
    fn container_round_trips() {
        let mut map = BTreeMap::new();
        map.insert(Key::from("alpha"), Value::from(1i64));
        map.insert(Key::from(true), Value::from("t"));
        map.insert(Key::F64(0.5), Value::Null);
        map.insert(Key::Binary(vec![1, 2]), Value::from(2i64));
        let value = Value::Array(vec![
            Value::Map(map),
            Value::Array(vec![Value::from(9i64); 20]),
            Value::from("tail"),
        ]);
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn domain_round_trips() {
        for value in [
            Value::Vector2(Vector2::new(4.25, -1.0)),
            Value::Vector3(Vector3::new(1.0, 2.0, 3.0)),
            Value::Vector4(Vector4::new(0.1, 0.2, 0.3, 0.4)),
            Value::Rotation(Rotation::new(0.0, 90.0, -45.0)),
            Value::Color(Color::new(12, 34, 56, 78)),
            Value::Color(Color::EMERALD),
            Value::Vector3(Vector3::FORWARD),
            Value::Vector2(Vector2::ZERO),
            Value::Vector4(Vector4::ONE),
            Value::Rotation(Rotation::ZERO),
            Value::Object(ObjectRef::UNASSIGNED),
            Value::Object(ObjectRef::new("8D4B561900000092")),
            Value::Object(ObjectRef::new("8D4B561900000092:Cube")),
            Value::Player(PlayerRef::new("52e2395cd7cf4e9f8f31d767c4822222")),
            Value::Player(PlayerRef::new("short-id")),
            Value::Ext(77, vec![1, 2, 3, 4, 5]),
        ] {
            assert_eq!(round_trip(&value), value, "value {:?}", value);
        }
    }

    #[test]
    fn bit_array_of_577_bits_round_trips() {
        let mut bits = BitArray::new(577, false);
        bits.set(0, true).unwrap();
        bits.set(317, true).unwrap();
        bits.set(576, true).unwrap();
        let value = Value::Bits(bits);
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn enum_round_trips() {
        let value = Value::Enum(
            Enum::new([("idle", 0), ("walk", 1), ("sprint", 4), ("swim", -3)]).unwrap(),
        );
        assert_eq!(round_trip(&value), value);

        let value = Value::Enum(Enum::descending([("high", 9), ("low", 2)]).unwrap());
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn dense_map_decodes_as_array() {
        let mut dense = BTreeMap::new();
        dense.insert(Key::from(1i64), Value::from("a"));
        dense.insert(Key::from(2i64), Value::from("b"));
        let decoded = round_trip(&Value::Map(dense));
        assert_eq!(
            decoded,
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn holey_map_round_trips_with_nil_slots() {
        let mut sparse = BTreeMap::new();
        sparse.insert(Key::from(1i64), Value::from("a"));
        sparse.insert(Key::from(3i64), Value::from("b"));
        let cfg = EncodeConfig {
            arrays: ArrayMode::WithHole,
            ..Default::default()
        };
        let mut buf = Vec::new();
        encode_value(&mut buf, &Value::Map(sparse), &cfg).unwrap();
        let decoded = decode_value(&buf, &ExtRegistry::new()).unwrap();
        assert_eq!(
            decoded,
            Value::Array(vec![Value::from("a"), Value::Null, Value::from("b")])
        );
    }

    #[test]
    fn nil_and_nan_keys_are_discarded() {
        // {nil: 1, "a": 2}
        let bytes = hex::decode("82c001a16102").unwrap();
        let decoded = decode_value(&bytes, &ExtRegistry::new()).unwrap();
        let map = decoded.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&Key::from("a")], Value::from(2i64));

        // {NaN: 1, "a": 2}
        let bytes = hex::decode("82cb7ff800000000000001a16102").unwrap();
        let decoded = decode_value(&bytes, &ExtRegistry::new()).unwrap();
        assert_eq!(decoded.as_map().unwrap().len(), 1);
    }

    #[test]
    fn numeric_keys_collapse_to_last_write() {
        // {2.0: "a", 2: "b"}
        let bytes = hex::decode("82cb4000000000000000a16102a162").unwrap();
        let decoded = decode_value(&bytes, &ExtRegistry::new()).unwrap();
        let map = decoded.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&Key::from(2i64)], Value::from("b"));
    }

    #[test]
    fn truncation_and_trailing() {
        let mut buf = Vec::new();
        encode_value(
            &mut buf,
            &Value::from("truncate me"),
            &EncodeConfig::default(),
        )
        .unwrap();
        for cut in 0..buf.len() {
            let err = decode_value(&buf[..cut], &ExtRegistry::new()).unwrap_err();
            assert!(
                matches!(err, Error::Truncated { .. }),
                "cut {} gave {:?}",
                cut,
                err
            );
        }

        let mut extra = buf.clone();
        extra.push(0x00);
        assert_eq!(
            decode_value(&extra, &ExtRegistry::new()),
            Err(Error::ExtraBytes { remaining: 1 })
        );
        let (value, used) = decode_value_prefix(&extra, &ExtRegistry::new()).unwrap();
        assert_eq!(value, Value::from("truncate me"));
        assert_eq!(used, buf.len());
    }

    #[test]
    fn unknown_extension_and_constant() {
        // fixext1 with unassigned built-in-range tag 9
        let bytes = hex::decode("d409ff").unwrap();
        assert_eq!(
            decode_value(&bytes, &ExtRegistry::new()),
            Err(Error::UnknownExtension(9))
        );
        // fixext1 with unregistered user tag 77
        let bytes = hex::decode("d44dff").unwrap();
        assert_eq!(
            decode_value(&bytes, &ExtRegistry::new()),
            Err(Error::UnknownExtension(77))
        );
        // Constant with reserved selector 99
        let bytes = hex::decode("d42863").unwrap();
        assert_eq!(
            decode_value(&bytes, &ExtRegistry::new()),
            Err(Error::UnknownConstant(99))
        );
    }

    #[test]
    fn registry_dispatch() {
        fn as_pair(payload: &[u8]) -> Result<Value> {
            Ok(Value::Array(vec![
                Value::from(payload.len() as u64),
                Value::Binary(payload.to_vec()),
            ]))
        }
        let mut registry = ExtRegistry::new();
        registry.register(77, as_pair).unwrap();
        assert_eq!(
            registry.register(77, as_pair),
            Err(Error::ReadOnly("An existing extension registration"))
        );
        assert!(registry.register(40, as_pair).is_err());
        assert!(registry.register(42, as_pair).is_err());

        let bytes = hex::decode("d44dff").unwrap();
        let decoded = decode_value(&bytes, &registry).unwrap();
        assert_eq!(
            decoded,
            Value::Array(vec![Value::from(1u64), Value::Binary(vec![0xff])])
        );
    }

    #[test]
    fn reserved_marker_fails() {
        assert!(matches!(
            decode_value(&[0xc1], &ExtRegistry::new()),
            Err(Error::BadEncode(_))
        ));
    }

    #[test]
    fn bad_ext_payload_lengths() {
        // Vector3 under fixext4
        let bytes = hex::decode("d60000000000").unwrap();
        assert!(matches!(
            decode_value(&bytes, &ExtRegistry::new()),
            Err(Error::BadEncode(_))
        ));
    }

    #[test]
    fn depth_limit_on_malicious_nesting() {
        // 200 nested fixarray1 markers with no terminal value.
        let bytes = vec![0x91u8; 200];
        assert_eq!(
            decode_value(&bytes, &ExtRegistry::new()),
            Err(Error::ParseLimit("value nesting too deep"))
        );
    }
}
