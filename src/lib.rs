//! stash-pack is a serialization and compression pipeline for game
//! player-data that must squeeze into a tight per-player storage budget.
//!
//! Values are reduced to standard MessagePack with extension types for the
//! game-domain values (vectors, rotations, colors, player and object
//! references, bit arrays, enums), then run through a variable-width LZW
//! compressor behind a small `l z w` framing header. Everything round-trips:
//! decoding a stored blob rebuilds the original [`Value`] tree.
//!
//! ```
//! use stash_pack::{Pipeline, Value, Key};
//! use std::collections::BTreeMap;
//!
//! let mut save = BTreeMap::new();
//! save.insert(Key::from("gold"), Value::from(1250u64));
//! save.insert(Key::from("name"), Value::from("kara"));
//! let save = Value::Map(save);
//!
//! let mut pipeline = Pipeline::new();
//! let stored = pipeline.compress(&save).unwrap();
//! assert_eq!(pipeline.decompress(&stored.bytes).unwrap(), save);
//! ```
//!
//! The layers underneath the [`Pipeline`] façade are usable on their own:
//! [`encode::encode_value`]/[`decode::decode_value`] for the MessagePack
//! codec, and the [`lzw`] module for the compressor.

mod bits;
mod constants;
mod enums;
mod error;
mod integer;
mod marker;
mod pipeline;
mod types;
mod value;

pub mod decode;
pub mod encode;
pub mod lzw;

pub use self::bits::BitArray;
pub use self::decode::{decode_value, decode_value_prefix, ExtDecodeFn, ExtRegistry};
pub use self::encode::{
    encode_value, encoded_len, ArrayMode, EncodeConfig, IntMode, NumberMode, StringMode,
};
pub use self::enums::Enum;
pub use self::error::{Error, Result};
pub use self::integer::Integer;
pub use self::pipeline::{Compressed, Pipeline, DEFAULT_SOFT_CAP};
pub use self::types::{Color, ObjectRef, PlayerRef, Rotation, Vector2, Vector3, Vector4};
pub use self::value::{Key, Value};
