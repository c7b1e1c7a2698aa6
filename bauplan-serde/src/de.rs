use serde::de::{self, DeserializeOwned, DeserializeSeed, MapAccess, Visitor};
use serde::de::value::{SeqDeserializer, StrDeserializer};
use bauplan::{Plan, Record, Registry, Value};
use log::trace;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Feeds a [`Value`] to serde. Records are positional, so every record needs the plan that names
/// its fields; nested records take the plans of their bindings.
pub struct Deserializer {
    value: Value,
    plan: Option<Arc<Plan>>,
}

impl Deserializer {
    pub fn new(value: Value, plan: Arc<Plan>) -> Self {
        Deserializer { value, plan: Some(plan) }
    }
}

pub fn from_value<T: DeserializeOwned + Record>(registry: &Registry, value: Value) -> Result<T> {
    let plan = registry.plan_of::<T>()?;
    T::deserialize(Deserializer::new(value, plan))
}

pub fn from_bytes<T: DeserializeOwned + Record>(registry: &Registry, bytes: &[u8]) -> Result<T> {
    let value = registry.from_bytes::<T>(bytes)?;
    trace!("decoded {} as {}", T::name(), value);
    from_value(registry, value)
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bool(v)      => visitor.visit_bool(v),
            Value::I8(v)        => visitor.visit_i8(v),
            Value::U8(v)        => visitor.visit_u8(v),
            Value::I16(v)       => visitor.visit_i16(v),
            Value::U16(v)       => visitor.visit_u16(v),
            Value::I32(v)       => visitor.visit_i32(v),
            Value::U32(v)       => visitor.visit_u32(v),
            Value::F32(v)       => visitor.visit_f32(v),
            Value::I64(v)       => visitor.visit_i64(v),
            Value::U64(v)       => visitor.visit_u64(v),
            Value::F64(v)       => visitor.visit_f64(v),
            Value::Str(v)       => visitor.visit_string(v),
            Value::Bytes(v)     => visitor.visit_byte_buf(v),
            Value::Ref(None)    => visitor.visit_none(),
            Value::Ref(Some(v)) => visitor.visit_some(Deserializer { value: *v, plan: self.plan }),
            Value::Record(fields) => match self.plan {
                Some(plan) => visitor.visit_map(RecordAccess::new(plan, fields)?),
                None => Err(Error::MissingPlan),
            },
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Ref(None)    => visitor.visit_none(),
            Value::Ref(Some(v)) => visitor.visit_some(Deserializer { value: *v, plan: self.plan }),
            _                   => visitor.visit_some(self),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bytes(v) => {
                let mut seq = SeqDeserializer::<_, Error>::new(v.into_iter());
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            },
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str], _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("enum"))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct map struct identifier ignored_any
    }
}

/// Presents a positional record as a map keyed by the binding names of its plan
struct RecordAccess {
    plan: Arc<Plan>,
    fields: std::vec::IntoIter<Value>,
    index: usize,
    pending: Option<Value>,
}

impl RecordAccess {
    fn new(plan: Arc<Plan>, fields: Vec<Value>) -> Result<Self> {
        if plan.bindings().len() != fields.len() {
            return Err(Error::Arity { record: plan.name().to_owned(), expected: plan.bindings().len(), found: fields.len() });
        }
        Ok(RecordAccess { plan, fields: fields.into_iter(), index: 0, pending: None })
    }
}

impl<'de> MapAccess<'de> for RecordAccess {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.fields.next() {
            None => Ok(None),
            Some(value) => {
                self.pending = Some(value);
                let name = self.plan.bindings()[self.index].name();
                seed.deserialize(StrDeserializer::<Error>::new(name)).map(Some)
            },
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self.pending.take().ok_or_else(|| Error::Message("value requested before key".to_owned()))?;
        let plan = self.plan.bindings()[self.index].nested().cloned();
        self.index += 1;
        seed.deserialize(Deserializer { value, plan })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}
