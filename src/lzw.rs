//! Variable-width LZW compression.
//!
//! Codes start one bit wider than the literals and grow up to 12 bits; when
//! the code space fills, the encoder emits a clear code and starts its
//! dictionary over. Both bit orders are supported: LSB-first (the GIF
//! packing) and MSB-first. A compressed blob produced by
//! [`compress_framed`] opens with the bytes `l z w`, and the first stream
//! byte (always derived from the leading clear code) doubles as the
//! bit-order discriminator.
//!
//! The encoder and decoder own their scratch (a 16384-slot hash table, and
//! the suffix/prefix chains plus an 8 KiB expansion buffer, respectively).
//! Neither is safe to share across concurrent users; hold one per worker
//! and [`reset`](Encoder::reset) it between streams to keep the
//! allocations.

use crate::error::{Error, Result};
use log::trace;

const MAX_WIDTH: u32 = 12;
const MAX_CODE: u32 = (1 << MAX_WIDTH) - 1;
const TABLE_SIZE: usize = 1 << (MAX_WIDTH + 2);
const TABLE_MASK: u32 = (TABLE_SIZE - 1) as u32;
const INVALID_CODE: u32 = u32::MAX;
const INVALID_ENTRY: u32 = 0;
const DECODER_INVALID: u16 = u16::MAX;
const FLUSH_AT: usize = 1 << MAX_WIDTH;

/// The three magic bytes opening a framed stream.
pub const MAGIC: [u8; 3] = *b"lzw";

/// The order bits are packed into bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitOrder {
    /// Least-significant bits first, as used by GIF.
    Lsb,
    /// Most-significant bits first, as used by TIFF and PDF.
    Msb,
}

fn check_lit_width(lit_width: u32) -> Result<()> {
    if (2..=8).contains(&lit_width) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "LZW literal width {} is outside 2..=8",
            lit_width
        )))
    }
}

/// An LZW compressor.
///
/// Feed input with [`write`](Encoder::write) (callable any number of times),
/// then [`finish`](Encoder::finish) the stream. After finishing, call
/// [`reset`](Encoder::reset) before starting another stream.
pub struct Encoder {
    order: BitOrder,
    lit_width: u32,
    /// Bit accumulator and its fill, for the packing order in use.
    bits: u32,
    n_bits: u32,
    width: u32,
    /// The next code to assign.
    hi: u32,
    /// The code at which the width must grow.
    overflow: u32,
    saved_code: u32,
    /// Open-addressed map of (prefix code << 8 | literal) to code. Slots
    /// hold key<<12 | value; zero marks empty, which no live entry can
    /// collide with since assigned codes always exceed the literal range.
    table: Vec<u32>,
}

impl Encoder {
    pub fn new(order: BitOrder, lit_width: u32) -> Result<Encoder> {
        check_lit_width(lit_width)?;
        let clear = 1u32 << lit_width;
        Ok(Encoder {
            order,
            lit_width,
            bits: 0,
            n_bits: 0,
            width: lit_width + 1,
            hi: clear + 1,
            overflow: clear << 1,
            saved_code: INVALID_CODE,
            table: vec![INVALID_ENTRY; TABLE_SIZE],
        })
    }

    /// Restore the starting state, keeping the hash table allocation.
    pub fn reset(&mut self, order: BitOrder, lit_width: u32) -> Result<()> {
        check_lit_width(lit_width)?;
        let clear = 1u32 << lit_width;
        self.order = order;
        self.lit_width = lit_width;
        self.bits = 0;
        self.n_bits = 0;
        self.width = lit_width + 1;
        self.hi = clear + 1;
        self.overflow = clear << 1;
        self.saved_code = INVALID_CODE;
        self.table.fill(INVALID_ENTRY);
        Ok(())
    }

    /// Compress `src` onto `dst`. Output lags input by one pending code,
    /// which [`finish`](Encoder::finish) flushes.
    pub fn write(&mut self, dst: &mut Vec<u8>, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        if self.lit_width < 8 {
            let max = (1u32 << self.lit_width) as u16 - 1;
            if let Some(&byte) = src.iter().find(|&&b| b as u16 > max) {
                return Err(Error::LiteralOverflow {
                    byte,
                    max: max as u8,
                });
            }
        }
        let mut src = src;
        let mut code = if self.saved_code == INVALID_CODE {
            // First write of the stream: open with a clear code, then the
            // first byte seeds the run.
            self.emit(dst, 1 << self.lit_width);
            let first = src[0] as u32;
            src = &src[1..];
            first
        } else {
            self.saved_code
        };
        'literals: for &x in src {
            let literal = x as u32;
            let key = code << 8 | literal;
            // A hash hit extends the current run without emitting anything.
            let hash = (key >> 12 ^ key) & TABLE_MASK;
            let mut h = hash;
            loop {
                let t = self.table[h as usize];
                if t == INVALID_ENTRY {
                    break;
                }
                if key == t >> 12 {
                    code = t & MAX_CODE;
                    continue 'literals;
                }
                h = (h + 1) & TABLE_MASK;
            }
            // Miss: the run ends here and the literal starts the next one.
            self.emit(dst, code);
            code = literal;
            if self.inc_hi(dst) {
                // Out of codes; the table was cleared, so there is nothing
                // to insert for this key.
                continue 'literals;
            }
            let mut h = hash;
            loop {
                if self.table[h as usize] == INVALID_ENTRY {
                    self.table[h as usize] = (key << 12) | self.hi;
                    break;
                }
                h = (h + 1) & TABLE_MASK;
            }
        }
        self.saved_code = code;
        Ok(())
    }

    /// Flush the pending code, the eof code, and any partial byte. The
    /// encoder must be [`reset`](Encoder::reset) before its next stream.
    pub fn finish(&mut self, dst: &mut Vec<u8>) {
        if self.saved_code != INVALID_CODE {
            self.emit(dst, self.saved_code);
            self.inc_hi(dst);
        } else {
            // Nothing was ever written; the stream still opens with a clear.
            self.emit(dst, 1 << self.lit_width);
        }
        self.emit(dst, (1 << self.lit_width) + 1);
        if self.n_bits > 0 {
            if self.order == BitOrder::Msb {
                self.bits >>= 24;
            }
            dst.push(self.bits as u8);
        }
    }

    /// Advance `hi`, growing the width at each overflow threshold. When the
    /// code space is spent, emits a clear code, starts the dictionary over,
    /// and returns true.
    fn inc_hi(&mut self, dst: &mut Vec<u8>) -> bool {
        self.hi += 1;
        if self.hi == self.overflow {
            self.width += 1;
            self.overflow <<= 1;
        }
        if self.hi == MAX_CODE {
            trace!("lzw code space spent, clearing dictionary");
            let clear = 1u32 << self.lit_width;
            self.emit(dst, clear);
            self.width = self.lit_width + 1;
            self.hi = clear + 1;
            self.overflow = clear << 1;
            self.table.fill(INVALID_ENTRY);
            return true;
        }
        false
    }

    fn emit(&mut self, dst: &mut Vec<u8>, code: u32) {
        match self.order {
            BitOrder::Lsb => {
                self.bits |= code << self.n_bits;
                self.n_bits += self.width;
                while self.n_bits >= 8 {
                    dst.push(self.bits as u8);
                    self.bits >>= 8;
                    self.n_bits -= 8;
                }
            }
            BitOrder::Msb => {
                self.bits |= code << (32 - self.width - self.n_bits);
                self.n_bits += self.width;
                while self.n_bits >= 8 {
                    dst.push((self.bits >> 24) as u8);
                    self.bits <<= 8;
                    self.n_bits -= 8;
                }
            }
        }
    }
}

/// An LZW decompressor.
///
/// [`decode`](Decoder::decode) hands output to a sink closure in chunks of
/// at least 4 KiB (plus a final partial chunk), which is also the natural
/// place for a cooperative caller to yield.
pub struct Decoder {
    order: BitOrder,
    lit_width: u32,
    bits: u32,
    n_bits: u32,
    width: u32,
    clear: u16,
    eof: u16,
    /// The highest code the dictionary currently knows.
    hi: u16,
    overflow: u16,
    /// The code most recently seen, or invalid right after a clear.
    last: u16,
    /// suffix[c] is the final byte of code c's expansion; prefix[c] the code
    /// for everything before it.
    suffix: Vec<u8>,
    prefix: Vec<u16>,
    /// Expansions are written right-to-left into the tail half, then copied
    /// to the fill point at the head.
    output: Vec<u8>,
    o: usize,
}

impl Decoder {
    pub fn new(order: BitOrder, lit_width: u32) -> Result<Decoder> {
        check_lit_width(lit_width)?;
        let clear = 1u16 << lit_width;
        Ok(Decoder {
            order,
            lit_width,
            bits: 0,
            n_bits: 0,
            width: lit_width + 1,
            clear,
            eof: clear + 1,
            hi: clear + 1,
            overflow: clear << 1,
            last: DECODER_INVALID,
            suffix: vec![0; 1 << MAX_WIDTH],
            prefix: vec![0; 1 << MAX_WIDTH],
            output: vec![0; 2 << MAX_WIDTH],
            o: 0,
        })
    }

    /// Restore the starting state, keeping the chain and output buffers.
    /// Stale chain entries are never read: codes above `hi` are rejected,
    /// and everything below is rewritten before use.
    pub fn reset(&mut self, order: BitOrder, lit_width: u32) -> Result<()> {
        check_lit_width(lit_width)?;
        let clear = 1u16 << lit_width;
        self.order = order;
        self.lit_width = lit_width;
        self.bits = 0;
        self.n_bits = 0;
        self.width = lit_width + 1;
        self.clear = clear;
        self.eof = clear + 1;
        self.hi = clear + 1;
        self.overflow = clear << 1;
        self.last = DECODER_INVALID;
        self.o = 0;
        Ok(())
    }

    /// Decompress a whole stream, delivering output through `sink`.
    pub fn decode<F>(&mut self, src: &[u8], mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let mut src = src;
        loop {
            let code = self.read_code(&mut src)?;
            if code < self.clear {
                // Literal code.
                self.output[self.o] = code as u8;
                self.o += 1;
                if self.last != DECODER_INVALID {
                    self.suffix[self.hi as usize] = code as u8;
                    self.prefix[self.hi as usize] = self.last;
                }
            } else if code == self.clear {
                trace!("lzw clear code, resetting dictionary");
                self.width = self.lit_width + 1;
                self.hi = self.eof;
                self.overflow = 1 << self.width;
                self.last = DECODER_INVALID;
                continue;
            } else if code == self.eof {
                sink(&self.output[..self.o])?;
                self.o = 0;
                return Ok(());
            } else if code <= self.hi {
                let mut c = code;
                let mut i = self.output.len() - 1;
                if code == self.hi && self.last != DECODER_INVALID {
                    // The unseen-code case: expands to the previous
                    // expansion followed by its own head byte.
                    c = self.last;
                    while c >= self.clear {
                        c = self.prefix[c as usize];
                    }
                    self.output[i] = c as u8;
                    i -= 1;
                    c = self.last;
                }
                while c >= self.clear {
                    self.output[i] = self.suffix[c as usize];
                    i -= 1;
                    c = self.prefix[c as usize];
                }
                self.output[i] = c as u8;
                let len = self.output.len() - i;
                self.output.copy_within(i.., self.o);
                self.o += len;
                if self.last != DECODER_INVALID {
                    self.suffix[self.hi as usize] = c as u8;
                    self.prefix[self.hi as usize] = self.last;
                }
            } else {
                return Err(Error::InvalidCode(code));
            }
            self.last = code;
            self.hi += 1;
            if self.hi >= self.overflow {
                if self.width == MAX_WIDTH {
                    // Width is capped; roll hi back to keep hi < overflow
                    // and stop adding entries until the next clear.
                    self.last = DECODER_INVALID;
                    self.hi -= 1;
                } else {
                    self.width += 1;
                    self.overflow <<= 1;
                }
            }
            if self.o >= FLUSH_AT {
                sink(&self.output[..self.o])?;
                self.o = 0;
            }
        }
    }

    /// Decompress a whole stream into a vector.
    pub fn decode_to_vec(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(src.len().saturating_mul(2));
        self.decode(src, |chunk| {
            out.extend_from_slice(chunk);
            Ok(())
        })?;
        Ok(out)
    }

    fn read_code(&mut self, src: &mut &[u8]) -> Result<u16> {
        while self.n_bits < self.width {
            let Some((&x, rest)) = src.split_first() else {
                return Err(Error::UnexpectedEof);
            };
            *src = rest;
            match self.order {
                BitOrder::Lsb => self.bits |= (x as u32) << self.n_bits,
                BitOrder::Msb => self.bits |= (x as u32) << (24 - self.n_bits),
            }
            self.n_bits += 8;
        }
        let code = match self.order {
            BitOrder::Lsb => {
                let code = (self.bits & ((1 << self.width) - 1)) as u16;
                self.bits >>= self.width;
                code
            }
            BitOrder::Msb => {
                let code = (self.bits >> (32 - self.width)) as u16;
                self.bits <<= self.width;
                code
            }
        };
        self.n_bits -= self.width;
        Ok(code)
    }
}

/// One-shot compression of a byte slice, no framing header.
pub fn encode_to_vec(src: &[u8], order: BitOrder, lit_width: u32) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(order, lit_width)?;
    let mut out = Vec::with_capacity(src.len() / 2 + 16);
    encoder.write(&mut out, src)?;
    encoder.finish(&mut out);
    Ok(out)
}

/// One-shot decompression of a headerless stream.
pub fn decode_to_vec(src: &[u8], order: BitOrder, lit_width: u32) -> Result<Vec<u8>> {
    Decoder::new(order, lit_width)?.decode_to_vec(src)
}

/// Compress with the `l z w` framing header. The stream's own first byte
/// (0x00 LSB-first, 0x80 MSB-first) discriminates the bit order on decode.
pub fn compress_framed(src: &[u8], order: BitOrder) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len() / 2 + 8);
    out.extend_from_slice(&MAGIC);
    let mut encoder = Encoder::new(order, 8)?;
    encoder.write(&mut out, src)?;
    encoder.finish(&mut out);
    Ok(out)
}

/// The bit order a framed blob was packed with, or `None` when the 4-byte
/// prefix doesn't match and the blob should pass through verbatim.
pub fn framed_order(src: &[u8]) -> Option<BitOrder> {
    match src {
        [l, z, w, 0x00, ..] if [*l, *z, *w] == MAGIC => Some(BitOrder::Lsb),
        [l, z, w, 0x80, ..] if [*l, *z, *w] == MAGIC => Some(BitOrder::Msb),
        _ => None,
    }
}

/// Undo [`compress_framed`]. Returns `Ok(None)` for input without the
/// framing prefix.
pub fn decompress_framed(src: &[u8]) -> Result<Option<Vec<u8>>> {
    let Some(order) = framed_order(src) else {
        return Ok(None);
    };
    Decoder::new(order, 8)?.decode_to_vec(&src[MAGIC.len()..]).map(Some)
}
