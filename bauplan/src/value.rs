use crate::desc::TypeDesc;
use std::fmt::{Display, Formatter, self};

/// A dynamically typed field value. Records are positional: the n-th value belongs to the n-th
/// binding of the record's plan.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    F32(f32),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Record(Vec<Value>),
    /// A nullable record reference
    Ref(Option<Box<Value>>),
}

impl Value {

    /// Returns the mnemonic of the value. This is useful for error messages.
    pub fn name(&self) -> &'static str {
        match *self {
            Value::Bool(_)   => "Bool",
            Value::I8(_)     => "I8",
            Value::U8(_)     => "U8",
            Value::I16(_)    => "I16",
            Value::U16(_)    => "U16",
            Value::I32(_)    => "I32",
            Value::U32(_)    => "U32",
            Value::F32(_)    => "F32",
            Value::I64(_)    => "I64",
            Value::U64(_)    => "U64",
            Value::F64(_)    => "F64",
            Value::Str(_)    => "Str",
            Value::Bytes(_)  => "Bytes",
            Value::Record(_) => "Record",
            Value::Ref(_)    => "Ref",
        }
    }

    /// The empty slot a decoder fills for a field of the given declared type. The slot's variant
    /// decides how the raw bits read from the wire are interpreted. Records have no zero value here,
    /// their slots are built from the nested plan.
    pub fn zero(ty: &TypeDesc) -> Option<Self> {
        match ty {
            TypeDesc::Bool => Some(Value::Bool(false)),
            TypeDesc::I8   => Some(Value::I8(0)),
            TypeDesc::U8   => Some(Value::U8(0)),
            TypeDesc::I16  => Some(Value::I16(0)),
            TypeDesc::U16  => Some(Value::U16(0)),
            TypeDesc::I32  => Some(Value::I32(0)),
            TypeDesc::U32  => Some(Value::U32(0)),
            TypeDesc::F32  => Some(Value::F32(0.0)),
            TypeDesc::I64  => Some(Value::I64(0)),
            TypeDesc::U64  => Some(Value::U64(0)),
            TypeDesc::F64  => Some(Value::F64(0.0)),
            TypeDesc::Str  => Some(Value::Str(String::new())),
            TypeDesc::Seq(inner) if **inner == TypeDesc::U8 => Some(Value::Bytes(Vec::new())),
            _ => None,
        }
    }

}

macro_rules! from {
    ($($t:ty => $v:ident),* $(,)?) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$v(v)
            }
        })*
    };
}

from! {
    bool    => Bool,
    i8      => I8,
    u8      => U8,
    i16     => I16,
    u16     => U16,
    i32     => I32,
    u32     => U32,
    f32     => F32,
    i64     => I64,
    u64     => U64,
    f64     => F64,
    String  => Str,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Value::Bool(v)      => write!(f, "{}", v),
            Value::I8(v)        => write!(f, "{}", v),
            Value::U8(v)        => write!(f, "{}", v),
            Value::I16(v)       => write!(f, "{}", v),
            Value::U16(v)       => write!(f, "{}", v),
            Value::I32(v)       => write!(f, "{}", v),
            Value::U32(v)       => write!(f, "{}", v),
            Value::F32(v)       => write!(f, "${}", v),
            Value::I64(v)       => write!(f, "{}", v),
            Value::U64(v)       => write!(f, "{}", v),
            Value::F64(v)       => write!(f, "$${}", v),
            Value::Str(v)       => write!(f, "\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::Bytes(v)     => write!(f, "{:02x?}", v),
            Value::Ref(None)    => f.write_str("null"),
            Value::Ref(Some(v)) => write!(f, "&{}", v),
            Value::Record(v)    => {
                f.write_str("(")?;
                for (i, value) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str(")")
            },
        }
    }
}
