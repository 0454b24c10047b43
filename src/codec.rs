//! # Tuple codec
//!
//! Order-preserving, self-delimiting encoding of [`Value`]/[`Tuple`] to
//! byte strings, following the FoundationDB tuple layer's wire format
//! (the scheme `hoply`, the project this crate grew out of, inherited
//! directly — see `original_source/hoply/hoply.py` for the reference
//! implementation this module is a direct Rust rendering of).
//!
//! Two guarantees matter above all else:
//!
//! 1. **Round trip**: `decode(encode(v)) == v` for every supported value.
//! 2. **Order preservation**: `encode(a) <= encode(b)` (byte-lexicographic)
//!    iff `a <= b` (`Value`/`Tuple`'s own `Ord`). Every prefix-range scan
//!    the store issues depends on this holding exactly.
//!
//! ## Wire format
//!
//! A single leading type-tag byte, then a type-specific payload:
//!
//! | Tag | Type | Payload |
//! |-----|------|---------|
//! | `0x00` | null | none |
//! | `0x01` | bytes | raw bytes, `0x00` escaped as `0x00 0xFF`, terminated by `0x00` |
//! | `0x02` | text | UTF-8 of the same shape as bytes |
//! | `0x0B` | negative big-int | 1 byte length-complement, then complemented big-endian magnitude |
//! | `0x0C..0x13` | negative int (1..8 bytes) | big-endian `size_limit[n] + value` |
//! | `0x14` | integer zero | none |
//! | `0x15..0x1C` | positive int (1..8 bytes) | big-endian magnitude |
//! | `0x1D` | positive big-int | 1 byte length, then big-endian magnitude |
//! | `0x21` | double | 8-byte big-endian IEEE-754, sign-bit-flip scheme |
//! | `0x26`/`0x27` | false/true | none |
//! | `0x30` | UUID | 16 raw bytes |

use crate::error::CodecError;
use crate::value::{Tuple, Value};
use uuid::Uuid;

const NULL_CODE: u8 = 0x00;
const BYTES_CODE: u8 = 0x01;
const STRING_CODE: u8 = 0x02;
const NEG_INT_START: u8 = 0x0B;
const INT_ZERO_CODE: u8 = 0x14;
const POS_INT_END: u8 = 0x1D;
const DOUBLE_CODE: u8 = 0x21;
const FALSE_CODE: u8 = 0x26;
const TRUE_CODE: u8 = 0x27;
const UUID_CODE: u8 = 0x30;

/// `size_limits[n] == 2^(8n) - 1`, the largest magnitude representable in
/// `n` bytes. Index 0 is unused (magnitude 0 is the zero tag).
const fn size_limit(n: u32) -> u128 {
    (1u128 << (8 * n)) - 1
}

/// Encode a single value, appending its bytes to `out`.
pub fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(NULL_CODE),
        Value::Bytes(b) => encode_escaped(BYTES_CODE, b, out),
        Value::Text(s) => encode_escaped(STRING_CODE, s.as_bytes(), out),
        Value::Int(i) => encode_int(*i, out),
        Value::Float(f) => encode_float(*f, out),
        Value::Bool(false) => out.push(FALSE_CODE),
        Value::Bool(true) => out.push(TRUE_CODE),
        Value::Uuid(u) => {
            out.push(UUID_CODE);
            out.extend_from_slice(u.as_bytes());
        }
    }
}

fn encode_escaped(tag: u8, bytes: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    for &b in bytes {
        if b == 0x00 {
            out.push(0x00);
            out.push(0xFF);
        } else {
            out.push(b);
        }
    }
    out.push(0x00);
}

fn be_tail(value: u128, n: u32) -> [u8; 16] {
    let full = value.to_be_bytes();
    let mut out = [0u8; 16];
    out[16 - n as usize..].copy_from_slice(&full[16 - n as usize..]);
    out
}

fn encode_int(value: i128, out: &mut Vec<u8>) {
    use std::cmp::Ordering::*;
    match value.cmp(&0) {
        Equal => out.push(INT_ZERO_CODE),
        Greater => {
            let value = value as u128;
            if value >= size_limit(8) {
                let length = (128 - value.leading_zeros()).div_ceil(8);
                out.push(POS_INT_END);
                out.push(length as u8);
                let full = value.to_be_bytes();
                out.extend_from_slice(&full[16 - length as usize..]);
            } else {
                let n = (1..=8).find(|&n| size_limit(n) >= value).unwrap();
                out.push(INT_ZERO_CODE + n as u8);
                let bytes = be_tail(value, n);
                out.extend_from_slice(&bytes[16 - n as usize..]);
            }
        }
        Less => {
            // value.unsigned_abs() handles i128::MIN correctly (u128 is wide enough).
            let mag = value.unsigned_abs();
            if mag >= size_limit(8) {
                let length = (128 - mag.leading_zeros()).div_ceil(8);
                let adjusted = size_limit(length) - mag;
                out.push(NEG_INT_START);
                out.push((length as u8) ^ 0xFF);
                let full = adjusted.to_be_bytes();
                out.extend_from_slice(&full[16 - length as usize..]);
            } else {
                let n = (1..=8).find(|&n| size_limit(n) >= mag).unwrap();
                let adjusted = size_limit(n) - mag;
                out.push(INT_ZERO_CODE - n as u8);
                let bytes = be_tail(adjusted, n);
                out.extend_from_slice(&bytes[16 - n as usize..]);
            }
        }
    }
}

fn float_adjust_encode(bytes: [u8; 8]) -> [u8; 8] {
    if bytes[0] & 0x80 != 0 {
        bytes.map(|b| !b)
    } else {
        let mut b = bytes;
        b[0] ^= 0x80;
        b
    }
}

fn float_adjust_decode(bytes: [u8; 8]) -> [u8; 8] {
    if bytes[0] & 0x80 != 0x80 {
        bytes.map(|b| !b)
    } else {
        let mut b = bytes;
        b[0] ^= 0x80;
        b
    }
}

fn encode_float(f: f64, out: &mut Vec<u8>) {
    out.push(DOUBLE_CODE);
    out.extend_from_slice(&float_adjust_encode(f.to_be_bytes()));
}

/// Encode a full tuple by concatenating each element's encoding.
pub fn encode_tuple(tuple: &Tuple) -> Vec<u8> {
    let mut out = Vec::new();
    for v in tuple.values() {
        encode_value(v, &mut out);
    }
    out
}

/// Decode a single value starting at `pos`, returning the value and the
/// offset just past it.
pub fn decode_value(bytes: &[u8], pos: usize) -> Result<(Value, usize), CodecError> {
    let tag = *bytes.get(pos).ok_or(CodecError::TruncatedPayload(0, pos, 1))?;
    match tag {
        NULL_CODE => Ok((Value::Null, pos + 1)),
        BYTES_CODE => {
            let (raw, end) = decode_escaped(bytes, pos)?;
            Ok((Value::Bytes(raw), end))
        }
        STRING_CODE => {
            let (raw, end) = decode_escaped(bytes, pos)?;
            let s = String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8(pos))?;
            Ok((Value::Text(s), end))
        }
        NEG_INT_START => decode_neg_bigint(bytes, pos),
        POS_INT_END => decode_pos_bigint(bytes, pos),
        INT_ZERO_CODE => Ok((Value::Int(0), pos + 1)),
        t if (NEG_INT_START + 1..INT_ZERO_CODE).contains(&t) => decode_fixed_int(bytes, pos, t, true),
        t if (INT_ZERO_CODE + 1..POS_INT_END).contains(&t) => decode_fixed_int(bytes, pos, t, false),
        DOUBLE_CODE => {
            let end = pos + 9;
            let payload = bytes.get(pos + 1..end).ok_or(CodecError::TruncatedPayload(tag, pos, 8))?;
            let arr: [u8; 8] = payload.try_into().expect("slice is exactly 8 bytes");
            let restored = float_adjust_decode(arr);
            Ok((Value::Float(f64::from_be_bytes(restored)), end))
        }
        FALSE_CODE => Ok((Value::Bool(false), pos + 1)),
        TRUE_CODE => Ok((Value::Bool(true), pos + 1)),
        UUID_CODE => {
            let end = pos + 17;
            let payload = bytes.get(pos + 1..end).ok_or(CodecError::TruncatedPayload(tag, pos, 16))?;
            let arr: [u8; 16] = payload.try_into().expect("slice is exactly 16 bytes");
            Ok((Value::Uuid(Uuid::from_bytes(arr)), end))
        }
        other => Err(CodecError::UnknownTag(other, pos)),
    }
}

/// Find the end of an escaped bytes/text payload: the first `0x00` not
/// immediately followed by `0xFF`.
fn find_terminator(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        match bytes[pos..].iter().position(|&b| b == 0x00) {
            None => return bytes.len(),
            Some(rel) => {
                let zero_pos = pos + rel;
                if zero_pos + 1 == bytes.len() || bytes[zero_pos + 1] != 0xFF {
                    return zero_pos;
                }
                pos = zero_pos + 2;
            }
        }
    }
}

fn decode_escaped(bytes: &[u8], pos: usize) -> Result<(Vec<u8>, usize), CodecError> {
    let start = pos + 1;
    let end = find_terminator(bytes, start);
    if end >= bytes.len() {
        return Err(CodecError::TruncatedPayload(bytes[pos], pos, 1));
    }
    let mut raw = Vec::with_capacity(end - start);
    let mut i = start;
    while i < end {
        if bytes[i] == 0x00 {
            // `find_terminator` only stops at an unescaped 0x00, so every
            // 0x00 strictly before `end` is part of an escaped 0x00 0xFF pair.
            raw.push(0x00);
            i += 2;
        } else {
            raw.push(bytes[i]);
            i += 1;
        }
    }
    Ok((raw, end + 1))
}

fn be_to_u128(bytes: &[u8]) -> u128 {
    let mut buf = [0u8; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    u128::from_be_bytes(buf)
}

fn decode_fixed_int(bytes: &[u8], pos: usize, tag: u8, negative: bool) -> Result<(Value, usize), CodecError> {
    let n = if negative { (INT_ZERO_CODE - tag) as usize } else { (tag - INT_ZERO_CODE) as usize };
    let end = pos + 1 + n;
    let payload = bytes.get(pos + 1..end).ok_or(CodecError::TruncatedPayload(tag, pos, n))?;
    let raw = be_to_u128(payload);
    let value = if negative {
        let limit = size_limit(n as u32);
        let mag = limit - raw;
        -(i128::try_from(mag).map_err(|_| CodecError::IntegerOverflow)?)
    } else {
        i128::try_from(raw).map_err(|_| CodecError::IntegerOverflow)?
    };
    Ok((Value::Int(value), end))
}

fn decode_pos_bigint(bytes: &[u8], pos: usize) -> Result<(Value, usize), CodecError> {
    let length = *bytes.get(pos + 1).ok_or(CodecError::TruncatedPayload(POS_INT_END, pos, 1))? as usize;
    if length > 16 {
        return Err(CodecError::IntegerOverflow);
    }
    let start = pos + 2;
    let end = start + length;
    let payload = bytes.get(start..end).ok_or(CodecError::TruncatedPayload(POS_INT_END, pos, length))?;
    let magnitude = be_to_u128(payload);
    let value = i128::try_from(magnitude).map_err(|_| CodecError::IntegerOverflow)?;
    Ok((Value::Int(value), end))
}

fn decode_neg_bigint(bytes: &[u8], pos: usize) -> Result<(Value, usize), CodecError> {
    let length_byte = *bytes.get(pos + 1).ok_or(CodecError::TruncatedPayload(NEG_INT_START, pos, 1))?;
    let length = (length_byte ^ 0xFF) as usize;
    if length > 16 {
        return Err(CodecError::IntegerOverflow);
    }
    let start = pos + 2;
    let end = start + length;
    let payload = bytes.get(start..end).ok_or(CodecError::TruncatedPayload(NEG_INT_START, pos, length))?;
    let adjusted = be_to_u128(payload);
    let limit = size_limit(length as u32);
    let magnitude = limit - adjusted;
    let value = -(i128::try_from(magnitude).map_err(|_| CodecError::IntegerOverflow)?);
    Ok((Value::Int(value), end))
}

/// Decode a complete tuple of `arity` elements from `bytes`. Errors if the
/// bytes don't decode to exactly `arity` values (trailing bytes) or decode
/// fails partway through (propagated as a [`CodecError`]).
pub fn decode_tuple(bytes: &[u8], arity: usize) -> Result<Tuple, CodecError> {
    let mut pos = 0;
    let mut values = Vec::with_capacity(arity);
    for _ in 0..arity {
        let (v, next) = decode_value(bytes, pos)?;
        values.push(v);
        pos = next;
    }
    if pos != bytes.len() {
        return Err(CodecError::TrailingBytes(pos, bytes.len()));
    }
    Ok(Tuple::new(values))
}
