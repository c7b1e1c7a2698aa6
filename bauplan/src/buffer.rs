use crate::error::DecodeError;
use crate::order::ByteOrder;
use std::convert::TryInto;

/// A growable byte buffer with a read cursor. Writes always append, reads consume from the cursor.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Buffer {
    buf: Vec<u8>,
    pos: usize,
}

macro_rules! scalar {
    ($put:ident, $get:ident, $t:ty) => {
        pub fn $put(&mut self, v: $t, order: ByteOrder) {
            match order {
                ByteOrder::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
                ByteOrder::Big    => self.buf.extend_from_slice(&v.to_be_bytes()),
            }
        }

        pub fn $get(&mut self, order: ByteOrder) -> Result<$t, DecodeError> {
            let bytes: [u8; std::mem::size_of::<$t>()] = self.get_slice(std::mem::size_of::<$t>())?.try_into().map_err(|_| DecodeError::Eof)?;
            Ok(match order {
                ByteOrder::Little => <$t>::from_le_bytes(bytes),
                ByteOrder::Big    => <$t>::from_be_bytes(bytes),
            })
        }
    };
}

impl Buffer {

    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing bytes for decoding, starting at position zero
    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self { buf: bytes.into(), pos: 0 }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        let b = *self.buf.get(self.pos).ok_or(DecodeError::Eof)?;
        self.pos += 1;
        Ok(b)
    }

    scalar!(put_u16, get_u16, u16);
    scalar!(put_u32, get_u32, u32);
    scalar!(put_u64, get_u64, u64);

    pub fn put_slice(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn get_slice(&mut self, len: usize) -> Result<&[u8], DecodeError> {
        if self.remaining() < len {
            Err(DecodeError::Eof)
        } else {
            self.pos += len;
            Ok(&self.buf[self.pos - len .. self.pos])
        }
    }

    /// Number of bytes not yet consumed by reads
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

}
