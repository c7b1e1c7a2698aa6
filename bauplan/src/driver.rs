//! Walking a plan against a buffer. The first failing field aborts the record; errors carry the
//! dotted path of that field.

use crate::buffer::Buffer;
use crate::desc::Record;
use crate::error::{DecodeError, DecoderError, EncodeError, EncoderError, Error};
use crate::kind::WireKind;
use crate::plan::{FieldBinding, Plan, Registry, Target};
use crate::value::Value;

const ABSENT: u8 = 0;
const PRESENT: u8 = 1;

/// How deep records may nest on the wire before [`Decoder::decode`] gives up
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

pub struct Encoder<'b> {
    buf: &'b mut Buffer,
    path: Vec<String>,
}

impl<'b> Encoder<'b> {

    pub fn encode(plan: &Plan, value: &Value, buf: &'b mut Buffer) -> Result<(), EncoderError> {
        let mut encoder = Self { buf, path: Vec::new() };
        encoder.encode_record(plan, value).map_err(|e| e.at(encoder.path.join(".")))
    }

    fn encode_record(&mut self, plan: &Plan, value: &Value) -> Result<(), EncodeError> {
        let fields = match value {
            Value::Record(fields) => fields,
            other => return Err(EncodeError::Mismatch { expected: "Record", found: other.name() }),
        };
        let bindings = plan.bindings();
        if fields.len() != bindings.len() {
            return Err(EncodeError::Arity { expected: bindings.len(), found: fields.len() });
        }
        for (binding, field) in bindings.iter().zip(fields) {
            self.path.push(binding.name().to_owned());
            self.encode_field(binding, field)?;
            self.path.pop();
        }
        Ok(())
    }

    fn encode_field(&mut self, binding: &FieldBinding, value: &Value) -> Result<(), EncodeError> {
        match binding.target() {
            Target::Codec { codec, .. } => (codec.encode)(self.buf, value),
            Target::Record(plan) if binding.kind() == WireKind::RecordByReference => match value {
                Value::Ref(None) => {
                    self.buf.put_u8(ABSENT);
                    Ok(())
                },
                Value::Ref(Some(inner)) => {
                    self.buf.put_u8(PRESENT);
                    self.encode_record(plan, inner)
                },
                other => Err(EncodeError::Mismatch { expected: "Ref", found: other.name() }),
            },
            Target::Record(plan) => self.encode_record(plan, value),
        }
    }

}

pub struct Decoder<'b> {
    buf: &'b mut Buffer,
    path: Vec<String>,
    depth: usize,
    limit: usize,
}

impl<'b> Decoder<'b> {

    pub fn decode(plan: &Plan, buf: &'b mut Buffer) -> Result<Value, DecoderError> {
        Self::decode_with_limit(plan, buf, DEFAULT_DEPTH_LIMIT)
    }

    /// Decodes one record, failing with [`DecodeError::Depth`] once records nest more than `limit`
    /// levels deep. Self-referential records otherwise nest as deep as the input says.
    pub fn decode_with_limit(plan: &Plan, buf: &'b mut Buffer, limit: usize) -> Result<Value, DecoderError> {
        let mut decoder = Self { buf, path: Vec::new(), depth: 0, limit };
        decoder.decode_record(plan).map_err(|e| e.at(decoder.path.join("."), decoder.buf.position()))
    }

    fn decode_record(&mut self, plan: &Plan) -> Result<Value, DecodeError> {
        if self.depth == self.limit {
            return Err(DecodeError::Depth(self.limit));
        }
        self.depth += 1;
        let bindings = plan.bindings();
        let mut fields = Vec::with_capacity(bindings.len());
        for binding in bindings {
            self.path.push(binding.name().to_owned());
            fields.push(self.decode_field(binding)?);
            self.path.pop();
        }
        self.depth -= 1;
        Ok(Value::Record(fields))
    }

    fn decode_field(&mut self, binding: &FieldBinding) -> Result<Value, DecodeError> {
        match binding.target() {
            Target::Codec { codec, zero } => {
                let mut slot = zero.clone();
                (codec.decode)(self.buf, &mut slot)?;
                Ok(slot)
            },
            Target::Record(plan) if binding.kind() == WireKind::RecordByReference => match self.buf.get_u8()? {
                ABSENT  => Ok(Value::Ref(None)),
                PRESENT => Ok(Value::Ref(Some(Box::new(self.decode_record(plan)?)))),
                x       => Err(DecodeError::Marker(x)),
            },
            Target::Record(plan) => self.decode_record(plan),
        }
    }

}

impl Registry {

    /// Encodes a record value of type `T` with its cached plan
    pub fn to_bytes<T: Record>(&self, value: &Value) -> Result<Vec<u8>, Error> {
        let plan = self.plan_of::<T>()?;
        let mut buf = Buffer::new();
        Encoder::encode(&plan, value, &mut buf)?;
        Ok(buf.into_inner())
    }

    /// Decodes exactly one record of type `T`, rejecting trailing bytes
    pub fn from_bytes<T: Record>(&self, bytes: &[u8]) -> Result<Value, Error> {
        let plan = self.plan_of::<T>()?;
        let mut buf = Buffer::from_bytes(bytes);
        let value = Decoder::decode(&plan, &mut buf)?;
        match buf.remaining() {
            0 => Ok(value),
            n => Err(DecodeError::Trailing(n).at(String::new(), buf.position()).into()),
        }
    }

}

#[cfg(test)]
mod test {
    use super::{Decoder, Encoder, ABSENT, DEFAULT_DEPTH_LIMIT, PRESENT};
    use crate::buffer::Buffer;
    use crate::error::{DecodeError, DecoderError, EncodeError, EncoderError, Error};
    use crate::order::ByteOrder;
    use crate::plan::Registry;
    use crate::value::Value;

    crate::record! {
        struct Message {
            flag: bool,
            id: i32,
            label: String,
            payload: Vec<u8>,
        }
    }

    crate::record! {
        struct Node {
            value: u16,
            next: Option<Box<Node>>,
        }
    }

    crate::record! {
        struct Envelope {
            seq: u64,
            body: Message,
        }
    }

    fn encode_err(result: Result<Vec<u8>, Error>) -> EncoderError {
        match result {
            Err(Error::Encode(e)) => e,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn decode_err(result: Result<Value, Error>) -> DecoderError {
        match result {
            Err(Error::Decode(e)) => e,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn message(label: &str, payload: &[u8]) -> Value {
        Value::Record(vec![Value::from(true), Value::from(-7i32), Value::from(label), Value::from(payload)])
    }

    #[test]
    fn roundtrip() {
        let registry = Registry::with_byte_order(ByteOrder::Little);
        for value in [message("hello", &[1, 2, 3]), message("", &[])] {
            let bytes = registry.to_bytes::<Message>(&value).unwrap();
            assert_eq!(value, registry.from_bytes::<Message>(&bytes).unwrap());
        }
    }

    #[test]
    fn wire_layout() {
        let registry = Registry::with_byte_order(ByteOrder::Big);
        let bytes = registry.to_bytes::<Message>(&message("ab", &[9])).unwrap();
        assert_eq!(vec![
            0x01,                   // flag
            0xff, 0xff, 0xff, 0xf9, // id
            0x00, 0x00, 0x00, 0x02, // label length
            0x61, 0x62,             // 'ab'
            0x00, 0x00, 0x00, 0x01, // payload length
            0x09,
        ], bytes);
    }

    #[test]
    fn references() {
        let registry = Registry::with_byte_order(ByteOrder::Little);
        let list = Value::Record(vec![Value::U16(1), Value::Ref(Some(Box::new(
            Value::Record(vec![Value::U16(2), Value::Ref(None)])
        )))]);
        let bytes = registry.to_bytes::<Node>(&list).unwrap();
        assert_eq!(vec![0x01, 0x00, PRESENT, 0x02, 0x00, ABSENT], bytes);
        assert_eq!(list, registry.from_bytes::<Node>(&bytes).unwrap());
        assert_eq!(1, registry.derivations());
    }

    #[test]
    fn nested_by_value() {
        let registry = Registry::with_byte_order(ByteOrder::Little);
        let value = Value::Record(vec![Value::U64(u64::MAX), message("x", &[0])]);
        let bytes = registry.to_bytes::<Envelope>(&value).unwrap();
        assert_eq!(8 + 1 + 4 + 4 + 1 + 4 + 1, bytes.len());
        assert_eq!(value, registry.from_bytes::<Envelope>(&bytes).unwrap());
    }

    #[test]
    fn encode_errors_carry_path() {
        let registry = Registry::new();
        let value = Value::Record(vec![Value::U64(1), Value::Record(vec![Value::from(true), Value::from("oops"), Value::from(""), Value::Bytes(vec![])])]);
        let e = encode_err(registry.to_bytes::<Envelope>(&value));
        assert_eq!("body.id", e.path());
        assert_eq!(EncodeError::Mismatch { expected: "Int32", found: "Str" }, e.into_inner());
        let e = encode_err(registry.to_bytes::<Envelope>(&Value::Record(vec![Value::U64(1)])));
        assert_eq!("", e.path());
        assert_eq!(EncodeError::Arity { expected: 2, found: 1 }, e.into_inner());
    }

    #[test]
    fn decode_errors() {
        let registry = Registry::new();
        let e = decode_err(registry.from_bytes::<Node>(&[0x01, 0x00, 0x07]));
        assert_eq!("next", e.path());
        assert_eq!(3, e.position());
        assert_eq!(DecodeError::Marker(7), e.into_inner());
        assert_eq!(DecodeError::Trailing(1), decode_err(registry.from_bytes::<Node>(&[0x01, 0x00, ABSENT, 0xff])).into_inner());
        assert_eq!(DecodeError::Eof, decode_err(registry.from_bytes::<Node>(&[0x01])).into_inner());
    }

    #[test]
    fn streaming() {
        let registry = Registry::new();
        let plan = registry.plan_of::<Node>().unwrap();
        let mut buf = Buffer::new();
        let first = Value::Record(vec![Value::U16(10), Value::Ref(None)]);
        let second = Value::Record(vec![Value::U16(20), Value::Ref(None)]);
        Encoder::encode(&plan, &first, &mut buf).unwrap();
        Encoder::encode(&plan, &second, &mut buf).unwrap();
        assert_eq!(first, Decoder::decode(&plan, &mut buf).unwrap());
        assert_eq!(second, Decoder::decode(&plan, &mut buf).unwrap());
        assert_eq!(0, buf.remaining());
    }

    #[test]
    fn depth_limit() {
        let registry = Registry::new();
        let plan = registry.plan_of::<Node>().unwrap();

        let mut buf = Buffer::from_bytes(vec![PRESENT; 1_000_000]);
        let e = Decoder::decode(&plan, &mut buf).unwrap_err();
        assert_eq!(vec!["next"; DEFAULT_DEPTH_LIMIT].join("."), e.path());
        assert_eq!(DecodeError::Depth(DEFAULT_DEPTH_LIMIT), e.into_inner());

        // value, present marker per level, then an absent marker on the last one
        let mut bytes = Vec::new();
        for _ in 0..3 {
            bytes.extend_from_slice(&[0x07, 0x00, PRESENT]);
        }
        bytes.extend_from_slice(&[0x07, 0x00, ABSENT]);
        assert!(Decoder::decode_with_limit(&plan, &mut Buffer::from_bytes(bytes.clone()), 4).is_ok());
        let e = Decoder::decode_with_limit(&plan, &mut Buffer::from_bytes(bytes), 3).unwrap_err();
        assert_eq!(DecodeError::Depth(3), e.into_inner());
    }

}
