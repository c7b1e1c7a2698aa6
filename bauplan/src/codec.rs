//! Primitive encode/decode pairs and the table that selects them per wire kind and byte order.
//!
//! Encoders read the field value and append to the buffer. Decoders consume from the buffer and
//! overwrite a pre-typed slot: the slot's variant decides whether the bits of an `Int32` become an
//! `i32`, a `u32` or an `f32`. Strings and byte blobs are prefixed by their length as a big endian
//! `u32`, independent of the configured byte order.

use crate::buffer::Buffer;
use crate::error::{DecodeError, EncodeError};
use crate::kind::WireKind;
use crate::order::ByteOrder;
use crate::value::Value;
use std::convert::TryFrom;
use std::fmt::{self, Debug, Formatter};
use std::str::from_utf8;

pub type EncodeFn = fn(&mut Buffer, &Value) -> Result<(), EncodeError>;
pub type DecodeFn = fn(&mut Buffer, &mut Value) -> Result<(), DecodeError>;

const LENGTH_ORDER: ByteOrder = ByteOrder::Big;

/// The encode/decode pair bound to one field
#[derive(Clone, Copy)]
pub struct Codec {
    kind: WireKind,
    order: Option<ByteOrder>,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

impl Codec {

    /// Looks up the pair for `kind` under `order`. Records have no primitive codec, they are walked
    /// through their own plan instead.
    pub fn select(kind: WireKind, order: ByteOrder) -> Option<Codec> {
        let (encode, decode) = match (kind, order) {
            (WireKind::Bool, _)                   => pair(enc_bool, dec_bool),
            (WireKind::Int8, _)                   => pair(enc_int8, dec_int8),
            (WireKind::Int16, ByteOrder::Little)  => pair(enc_int16_le, dec_int16_le),
            (WireKind::Int16, ByteOrder::Big)     => pair(enc_int16_be, dec_int16_be),
            (WireKind::Int32, ByteOrder::Little)  => pair(enc_int32_le, dec_int32_le),
            (WireKind::Int32, ByteOrder::Big)     => pair(enc_int32_be, dec_int32_be),
            (WireKind::Int64, ByteOrder::Little)  => pair(enc_int64_le, dec_int64_le),
            (WireKind::Int64, ByteOrder::Big)     => pair(enc_int64_be, dec_int64_be),
            (WireKind::String, _)                 => pair(enc_string, dec_string),
            (WireKind::Bytes, _)                  => pair(enc_bytes, dec_bytes),
            (WireKind::RecordByValue, _)
                | (WireKind::RecordByReference, _) => return None,
        };
        Some(Codec { kind, order: if kind.is_order_sensitive() { Some(order) } else { None }, encode, decode })
    }

    pub fn kind(&self) -> WireKind {
        self.kind
    }

    /// The byte order this pair was resolved for, `None` for kinds that don't depend on it
    pub fn order(&self) -> Option<ByteOrder> {
        self.order
    }

}

impl PartialEq for Codec {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.order == other.order
    }
}

impl Debug for Codec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").field("kind", &self.kind).field("order", &self.order).finish()
    }
}

fn pair(encode: EncodeFn, decode: DecodeFn) -> (EncodeFn, DecodeFn) {
    (encode, decode)
}

fn enc_mismatch(expected: &'static str, found: &Value) -> EncodeError {
    EncodeError::Mismatch { expected, found: found.name() }
}

fn dec_mismatch(expected: &'static str, slot: &Value) -> DecodeError {
    DecodeError::Mismatch { expected, found: slot.name() }
}

fn enc_bool(b: &mut Buffer, v: &Value) -> Result<(), EncodeError> {
    match *v {
        Value::Bool(v) => { b.put_u8(v as u8); Ok(()) },
        ref other      => Err(enc_mismatch("Bool", other)),
    }
}

fn dec_bool(b: &mut Buffer, slot: &mut Value) -> Result<(), DecodeError> {
    let v = match b.get_u8()? {
        0 => false,
        1 => true,
        x => return Err(DecodeError::Bool(x)),
    };
    match slot {
        Value::Bool(s) => { *s = v; Ok(()) },
        other          => Err(dec_mismatch("Bool", other)),
    }
}

fn enc_int8(b: &mut Buffer, v: &Value) -> Result<(), EncodeError> {
    match *v {
        Value::I8(v) => { b.put_u8(v as u8); Ok(()) },
        Value::U8(v) => { b.put_u8(v); Ok(()) },
        ref other    => Err(enc_mismatch("Int8", other)),
    }
}

fn dec_int8(b: &mut Buffer, slot: &mut Value) -> Result<(), DecodeError> {
    let bits = b.get_u8()?;
    match slot {
        Value::I8(s) => { *s = bits as i8; Ok(()) },
        Value::U8(s) => { *s = bits; Ok(()) },
        other        => Err(dec_mismatch("Int8", other)),
    }
}

fn bits16(v: &Value) -> Result<u16, EncodeError> {
    match *v {
        Value::I16(v) => Ok(v as u16),
        Value::U16(v) => Ok(v),
        ref other     => Err(enc_mismatch("Int16", other)),
    }
}

fn set_bits16(slot: &mut Value, bits: u16) -> Result<(), DecodeError> {
    match slot {
        Value::I16(s) => { *s = bits as i16; Ok(()) },
        Value::U16(s) => { *s = bits; Ok(()) },
        other         => Err(dec_mismatch("Int16", other)),
    }
}

fn bits32(v: &Value) -> Result<u32, EncodeError> {
    match *v {
        Value::I32(v) => Ok(v as u32),
        Value::U32(v) => Ok(v),
        Value::F32(v) => Ok(v.to_bits()),
        ref other     => Err(enc_mismatch("Int32", other)),
    }
}

fn set_bits32(slot: &mut Value, bits: u32) -> Result<(), DecodeError> {
    match slot {
        Value::I32(s) => { *s = bits as i32; Ok(()) },
        Value::U32(s) => { *s = bits; Ok(()) },
        Value::F32(s) => { *s = f32::from_bits(bits); Ok(()) },
        other         => Err(dec_mismatch("Int32", other)),
    }
}

fn bits64(v: &Value) -> Result<u64, EncodeError> {
    match *v {
        Value::I64(v) => Ok(v as u64),
        Value::U64(v) => Ok(v),
        Value::F64(v) => Ok(v.to_bits()),
        ref other     => Err(enc_mismatch("Int64", other)),
    }
}

fn set_bits64(slot: &mut Value, bits: u64) -> Result<(), DecodeError> {
    match slot {
        Value::I64(s) => { *s = bits as i64; Ok(()) },
        Value::U64(s) => { *s = bits; Ok(()) },
        Value::F64(s) => { *s = f64::from_bits(bits); Ok(()) },
        other         => Err(dec_mismatch("Int64", other)),
    }
}

macro_rules! int_codec {
    ($enc:ident, $dec:ident, $put:ident, $get:ident, $bits:ident, $set:ident, $order:expr) => {
        fn $enc(b: &mut Buffer, v: &Value) -> Result<(), EncodeError> {
            b.$put($bits(v)?, $order);
            Ok(())
        }

        fn $dec(b: &mut Buffer, slot: &mut Value) -> Result<(), DecodeError> {
            let bits = b.$get($order)?;
            $set(slot, bits)
        }
    };
}

int_codec!(enc_int16_le, dec_int16_le, put_u16, get_u16, bits16, set_bits16, ByteOrder::Little);
int_codec!(enc_int16_be, dec_int16_be, put_u16, get_u16, bits16, set_bits16, ByteOrder::Big);
int_codec!(enc_int32_le, dec_int32_le, put_u32, get_u32, bits32, set_bits32, ByteOrder::Little);
int_codec!(enc_int32_be, dec_int32_be, put_u32, get_u32, bits32, set_bits32, ByteOrder::Big);
int_codec!(enc_int64_le, dec_int64_le, put_u64, get_u64, bits64, set_bits64, ByteOrder::Little);
int_codec!(enc_int64_be, dec_int64_be, put_u64, get_u64, bits64, set_bits64, ByteOrder::Big);

fn put_length_prefixed(b: &mut Buffer, v: &[u8]) -> Result<(), EncodeError> {
    let len = u32::try_from(v.len()).map_err(|_| EncodeError::Length(v.len()))?;
    b.put_u32(len, LENGTH_ORDER);
    b.put_slice(v);
    Ok(())
}

fn get_length_prefixed(b: &mut Buffer) -> Result<&[u8], DecodeError> {
    let len = b.get_u32(LENGTH_ORDER)? as usize;
    b.get_slice(len)
}

fn enc_string(b: &mut Buffer, v: &Value) -> Result<(), EncodeError> {
    match v {
        Value::Str(v) => put_length_prefixed(b, v.as_bytes()),
        other         => Err(enc_mismatch("String", other)),
    }
}

fn dec_string(b: &mut Buffer, slot: &mut Value) -> Result<(), DecodeError> {
    let v = from_utf8(get_length_prefixed(b)?)?;
    match slot {
        Value::Str(s) => { s.clear(); s.push_str(v); Ok(()) },
        other         => Err(dec_mismatch("String", other)),
    }
}

fn enc_bytes(b: &mut Buffer, v: &Value) -> Result<(), EncodeError> {
    match v {
        Value::Bytes(v) => put_length_prefixed(b, v),
        other           => Err(enc_mismatch("Bytes", other)),
    }
}

fn dec_bytes(b: &mut Buffer, slot: &mut Value) -> Result<(), DecodeError> {
    let v = get_length_prefixed(b)?;
    match slot {
        Value::Bytes(s) => { s.clear(); s.extend_from_slice(v); Ok(()) },
        other           => Err(dec_mismatch("Bytes", other)),
    }
}
