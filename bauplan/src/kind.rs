use crate::desc::{FieldDecl, TypeDesc, RecordRef};
use crate::error::PlanError;
use std::fmt::{Display, Formatter, self};

/// The wire-level category of a field. Every supported declared type maps to exactly one kind.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WireKind {
    Bool,
    Int8,
    Int16,
    /// Also used for `f32`, which travels as its bit pattern
    Int32,
    /// Also used for `f64`, which travels as its bit pattern
    Int64,
    String,
    Bytes,
    RecordByValue,
    /// A nullable record, preceded on the wire by a presence marker
    RecordByReference,
}

impl WireKind {

    /// Returns the mnemonic of the kind. This is useful for error messages.
    pub fn name(&self) -> &'static str {
        match *self {
            WireKind::Bool              => "Bool",
            WireKind::Int8              => "Int8",
            WireKind::Int16             => "Int16",
            WireKind::Int32             => "Int32",
            WireKind::Int64             => "Int64",
            WireKind::String            => "String",
            WireKind::Bytes             => "Bytes",
            WireKind::RecordByValue     => "RecordByValue",
            WireKind::RecordByReference => "RecordByReference",
        }
    }

    /// The encoded size of fixed-width kinds
    pub fn width(&self) -> Option<usize> {
        match *self {
            WireKind::Bool | WireKind::Int8 => Some(1),
            WireKind::Int16                 => Some(2),
            WireKind::Int32                 => Some(4),
            WireKind::Int64                 => Some(8),
            _                               => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, WireKind::RecordByValue | WireKind::RecordByReference)
    }

    /// Multi-byte scalars are the only kinds whose codec depends on the byte order
    pub fn is_order_sensitive(&self) -> bool {
        matches!(self, WireKind::Int16 | WireKind::Int32 | WireKind::Int64)
    }

}

impl Display for WireKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}

/// Determines the wire kind of a declared field. Classification is a pure function of the declared type.
pub fn classify(record: &str, field: &FieldDecl) -> Result<WireKind, PlanError> {
    classify_type(&field.ty).ok_or_else(|| PlanError::UnsupportedFieldType {
        record: record.to_owned(),
        field: field.name.clone(),
        ty: field.ty.to_string(),
    })
}

fn classify_type(ty: &TypeDesc) -> Option<WireKind> {
    match ty {
        TypeDesc::Bool                                     => Some(WireKind::Bool),
        TypeDesc::I8  | TypeDesc::U8                       => Some(WireKind::Int8),
        TypeDesc::I16 | TypeDesc::U16                      => Some(WireKind::Int16),
        TypeDesc::I32 | TypeDesc::U32 | TypeDesc::F32      => Some(WireKind::Int32),
        TypeDesc::I64 | TypeDesc::U64 | TypeDesc::F64      => Some(WireKind::Int64),
        TypeDesc::Str                                      => Some(WireKind::String),
        TypeDesc::Seq(inner) if **inner == TypeDesc::U8    => Some(WireKind::Bytes),
        TypeDesc::Record(_)                                => Some(WireKind::RecordByValue),
        TypeDesc::Optional(inner)                          => match **inner {
            TypeDesc::Record(_) => Some(WireKind::RecordByReference),
            _                   => None,
        },
        TypeDesc::Char
            | TypeDesc::Unit
            | TypeDesc::Seq(_)
            | TypeDesc::Map(_, _)                          => None,
    }
}

/// The nested record a field refers to, if any
pub fn nested(ty: &TypeDesc) -> Option<&RecordRef> {
    match ty {
        TypeDesc::Record(r) => Some(r),
        TypeDesc::Optional(inner) => match &**inner {
            TypeDesc::Record(r) => Some(r),
            _ => None,
        },
        _ => None,
    }
}
