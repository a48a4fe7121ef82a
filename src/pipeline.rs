//! The compression pipeline: values to MessagePack to framed LZW, and back.

use crate::{
    decode::{decode_value, ExtDecodeFn, ExtRegistry},
    encode::{encode_value, EncodeConfig},
    error::{Error, Result},
    lzw::{self, BitOrder},
    value::Value,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::debug;

/// Pre-compression size above which the pipeline skips LZW and hands the
/// MessagePack bytes back verbatim.
pub const DEFAULT_SOFT_CAP: usize = 4090;

/// The outcome of [`Pipeline::compress`].
#[derive(Clone, Debug, PartialEq)]
pub struct Compressed {
    /// The stored form: a framed LZW stream, or the raw MessagePack bytes
    /// when the soft cap elected not to compress.
    pub bytes: Vec<u8>,
    /// MessagePack size before compression.
    pub raw_len: usize,
    /// Size of `bytes`.
    pub compressed_len: usize,
    /// `compressed_len / raw_len`, kept to three decimals, rounded down.
    /// Exactly 1.0 for the not-compressed case.
    pub ratio: f64,
}

/// An encoder/decoder pairing for player-data blobs.
///
/// The pipeline owns one LZW encoder and one decoder and resets them per
/// call, so their scratch buffers are paid for once. It is therefore a
/// single-consumer object: clone-free sharing across workers is not
/// supported, give each worker its own.
pub struct Pipeline {
    config: EncodeConfig,
    registry: ExtRegistry,
    order: BitOrder,
    soft_cap: usize,
    version: Option<u8>,
    chunk_hook: Option<Box<dyn FnMut() + Send>>,
    encoder: lzw::Encoder,
    decoder: lzw::Decoder,
}

impl Pipeline {
    /// A pipeline with the default configuration: LSB-first packing, the
    /// default encode modes, and the default soft cap.
    pub fn new() -> Pipeline {
        Pipeline {
            config: EncodeConfig::default(),
            registry: ExtRegistry::new(),
            order: BitOrder::Lsb,
            soft_cap: DEFAULT_SOFT_CAP,
            version: None,
            chunk_hook: None,
            // Width 8 is always valid, so construction cannot fail.
            encoder: lzw::Encoder::new(BitOrder::Lsb, 8).expect("valid literal width"),
            decoder: lzw::Decoder::new(BitOrder::Lsb, 8).expect("valid literal width"),
        }
    }

    pub fn with_config(mut self, config: EncodeConfig) -> Pipeline {
        self.config = config;
        self
    }

    pub fn with_order(mut self, order: BitOrder) -> Pipeline {
        self.order = order;
        self
    }

    pub fn with_soft_cap(mut self, soft_cap: usize) -> Pipeline {
        self.soft_cap = soft_cap;
        self
    }

    /// Tag every blob with a version byte, checked on decompression.
    pub fn with_version(mut self, version: u8) -> Pipeline {
        self.version = Some(version);
        self
    }

    /// Install a hook invoked at each ~4 KiB decompression boundary. Hosts
    /// with a per-frame instruction quota can cooperatively yield here; it
    /// is a no-op everywhere else.
    pub fn with_chunk_hook(mut self, hook: impl FnMut() + Send + 'static) -> Pipeline {
        self.chunk_hook = Some(Box::new(hook));
        self
    }

    /// Register a decoder for a user extension tag.
    pub fn register_ext(&mut self, tag: i8, decoder: ExtDecodeFn) -> Result<()> {
        self.registry.register(tag, decoder)
    }

    /// Encode a value and, unless it exceeds the soft cap, LZW-compress it.
    pub fn compress(&mut self, value: &Value) -> Result<Compressed> {
        let mut raw = Vec::new();
        match self.version {
            Some(version) => {
                let tagged = Value::Array(vec![Value::from(version), value.clone()]);
                encode_value(&mut raw, &tagged, &self.config)?;
            }
            None => encode_value(&mut raw, value, &self.config)?,
        }
        let raw_len = raw.len();
        if raw_len > self.soft_cap {
            debug!(
                "payload of {} bytes is over the {} byte soft cap, storing raw",
                raw_len, self.soft_cap
            );
            return Ok(Compressed {
                bytes: raw,
                raw_len,
                compressed_len: raw_len,
                ratio: 1.0,
            });
        }
        self.encoder.reset(self.order, 8)?;
        let mut bytes = Vec::with_capacity(raw_len / 2 + 8);
        bytes.extend_from_slice(&lzw::MAGIC);
        self.encoder.write(&mut bytes, &raw)?;
        self.encoder.finish(&mut bytes);
        let compressed_len = bytes.len();
        let ratio = (compressed_len as f64 / raw_len as f64 * 1000.0).floor() / 1000.0;
        debug!(
            "compressed {} bytes to {} (ratio {:.3})",
            raw_len, compressed_len, ratio
        );
        Ok(Compressed {
            bytes,
            raw_len,
            compressed_len,
            ratio,
        })
    }

    /// Decode a stored blob back into its value. Framed input is
    /// LZW-decompressed first; anything else is taken as raw MessagePack.
    pub fn decompress(&mut self, bytes: &[u8]) -> Result<Value> {
        let value = match lzw::framed_order(bytes) {
            Some(order) => {
                self.decoder.reset(order, 8)?;
                let mut raw = Vec::with_capacity(bytes.len().saturating_mul(2));
                let hook = &mut self.chunk_hook;
                self.decoder.decode(&bytes[lzw::MAGIC.len()..], |chunk| {
                    raw.extend_from_slice(chunk);
                    if let Some(hook) = hook {
                        hook();
                    }
                    Ok(())
                })?;
                decode_value(&raw, &self.registry)?
            }
            None => decode_value(bytes, &self.registry)?,
        };
        match self.version {
            None => Ok(value),
            Some(expected) => {
                let mismatch = || Error::VersionMismatch {
                    expected,
                    actual: 0,
                };
                let Value::Array(mut items) = value else {
                    return Err(mismatch());
                };
                if items.len() != 2 {
                    return Err(mismatch());
                }
                let data = items.pop();
                let tag = items.pop();
                let (Some(tag), Some(data)) = (tag, data) else {
                    return Err(mismatch());
                };
                let actual = tag.as_u64().ok_or_else(mismatch)?;
                if actual != expected as u64 {
                    return Err(Error::VersionMismatch {
                        expected,
                        actual: actual.min(u8::MAX as u64) as u8,
                    });
                }
                Ok(data)
            }
        }
    }

    /// [`compress`](Pipeline::compress), then wrap the blob in standard
    /// base64 for hosts that only store text.
    pub fn compress_b64(&mut self, value: &Value) -> Result<String> {
        let compressed = self.compress(value)?;
        Ok(BASE64.encode(compressed.bytes))
    }

    /// Undo [`compress_b64`](Pipeline::compress_b64).
    pub fn decompress_b64(&mut self, text: &str) -> Result<Value> {
        let bytes = BASE64
            .decode(text)
            .map_err(|e| Error::BadEncode(format!("Invalid base64: {}", e)))?;
        self.decompress(&bytes)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
    }
}
