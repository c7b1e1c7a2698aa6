use serde::{ser, Serialize};
use bauplan::{Record, Registry, Value};
use log::trace;

use crate::error::{Error, Result};

/// Turns a serde data model value into a [`Value`]. Structs become positional records, options become
/// references and sequences of `u8` become byte blobs. Everything else is rejected.
pub struct Serializer;

pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(Serializer)
}

pub fn to_bytes<T: Serialize + Record>(registry: &Registry, value: &T) -> Result<Vec<u8>> {
    let value = to_value(value)?;
    trace!("encoding {} as {}", T::name(), value);
    Ok(registry.to_bytes::<T>(&value)?)
}

impl ser::Serializer for Serializer {

    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SeqSerializer;
    type SerializeTuple = ser::Impossible<Value, Error>;
    type SerializeTupleStruct = ser::Impossible<Value, Error>;
    type SerializeTupleVariant = ser::Impossible<Value, Error>;
    type SerializeMap = ser::Impossible<Value, Error>;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = ser::Impossible<Value, Error>;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::I8(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::I16(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::I32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::I64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::U8(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::U16(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::U32(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::U64(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::F32(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::F64(v))
    }

    fn serialize_char(self, _v: char) -> Result<Value> {
        Err(Error::Unsupported("char"))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Ref(None))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value> {
        Ok(Value::Ref(Some(Box::new(value.serialize(self)?))))
    }

    fn serialize_unit(self) -> Result<Value> {
        Err(Error::Unsupported("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Err(Error::Unsupported("unit struct"))
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, _variant: &'static str) -> Result<Value> {
        Err(Error::Unsupported("enum"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _name: &'static str, _index: u32, _variant: &'static str, _value: &T) -> Result<Value> {
        Err(Error::Unsupported("enum"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SeqSerializer { bytes: Vec::with_capacity(len.unwrap_or(0)) })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::Unsupported("tuple"))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
        Err(Error::Unsupported("tuple struct"))
    }

    fn serialize_tuple_variant(self, _name: &'static str, _index: u32, _variant: &'static str, _len: usize) -> Result<Self::SerializeTupleVariant> {
        Err(Error::Unsupported("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::Unsupported("map"))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        Ok(StructSerializer { fields: Vec::with_capacity(len) })
    }

    fn serialize_struct_variant(self, _name: &'static str, _index: u32, _variant: &'static str, _len: usize) -> Result<Self::SerializeStructVariant> {
        Err(Error::Unsupported("enum"))
    }

}

pub struct SeqSerializer {
    bytes: Vec<u8>,
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        match value.serialize(Serializer)? {
            Value::U8(b) => { self.bytes.push(b); Ok(()) },
            other => Err(Error::Seq(other.name())),
        }
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Bytes(self.bytes))
    }

}

pub struct StructSerializer {
    fields: Vec<Value>,
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Result<()> {
        self.fields.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.fields))
    }

}
