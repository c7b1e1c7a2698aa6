use std::fmt::{Display, Formatter, self};

/// Raised while deriving a [`Plan`](crate::Plan). A failed derivation is never cached: asking for the
/// same type again re-runs the derivation and fails the same way.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// A field's declared type doesn't map to any [`WireKind`](crate::WireKind).
    UnsupportedFieldType { record: String, field: String, ty: String },
    /// A plan was requested for something that isn't a record.
    InvalidUsage(String),
    /// A record contains itself by value, directly or through other records held by value. Recursion
    /// must go through a reference.
    RecursiveByValue { record: String, field: String },
}

impl std::error::Error for PlanError {}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            PlanError::UnsupportedFieldType { record, field, ty } => write!(f, "Field {}.{} has unsupported type {}", record, field, ty),
            PlanError::InvalidUsage(ty) => write!(f, "Plans can only be derived for records, not for {}", ty),
            PlanError::RecursiveByValue { record, field } => write!(f, "Field {}.{} contains its own record by value", record, field),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct DecoderError {
    inner: DecodeError,
    path: String,
    at: usize,
}

impl DecoderError {

    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    /// Dotted path of the field that failed, e.g. `order.customer.name`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Buffer position at which decoding stopped
    pub fn position(&self) -> usize {
        self.at
    }

}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
       Some(&self.inner)
    }
}

impl Display for DecoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self.path.is_empty() {
            true  => write!(f, "{} at input position {}", self.inner, self.at),
            false => write!(f, "{} in field `{}` at input position {}", self.inner, self.path, self.at),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum DecodeError {
    Eof,
    Utf8(std::str::Utf8Error),
    Bool(u8),
    Marker(u8),
    Mismatch { expected: &'static str, found: &'static str },
    Trailing(usize),
    /// Records nested deeper than the decoder's limit
    Depth(usize),
}

impl DecodeError {

    pub fn at(self, path: String, at: usize) -> DecoderError {
        DecoderError { inner: self, path, at }
    }

}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(e: std::str::Utf8Error) -> DecodeError {
        DecodeError::Utf8(e)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DecodeError::Eof => f.write_str("Unexpected end of buffer while decoding"),
            DecodeError::Utf8(e) => write!(f, "String slice was not valid Utf-8: {}", e),
            DecodeError::Bool(b) => write!(f, "Byte {:#04x} is not a valid bool", b),
            DecodeError::Marker(b) => write!(f, "Byte {:#04x} is not a valid presence marker", b),
            DecodeError::Mismatch { expected, found } => write!(f, "Cannot decode {} into a slot of type {}", expected, found),
            DecodeError::Trailing(n) => write!(f, "{} trailing bytes after record", n),
            DecodeError::Depth(limit) => write!(f, "Records nested deeper than {} levels", limit),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct EncoderError {
    inner: EncodeError,
    path: String,
}

impl EncoderError {

    pub fn into_inner(self) -> EncodeError {
        self.inner
    }

    pub fn path(&self) -> &str {
        &self.path
    }

}

impl std::error::Error for EncoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
       Some(&self.inner)
    }
}

impl Display for EncoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self.path.is_empty() {
            true  => write!(f, "{}", self.inner),
            false => write!(f, "{} in field `{}`", self.inner, self.path),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum EncodeError {
    Mismatch { expected: &'static str, found: &'static str },
    Arity { expected: usize, found: usize },
    Length(usize),
}

impl EncodeError {

    pub fn at(self, path: String) -> EncoderError {
        EncoderError { inner: self, path }
    }

}

impl std::error::Error for EncodeError {}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            EncodeError::Mismatch { expected, found } => write!(f, "Expected a value of kind {}, found {}", expected, found),
            EncodeError::Arity { expected, found } => write!(f, "Record has {} fields but the plan expects {}", found, expected),
            EncodeError::Length(value) => write!(f, "Length {} exceeds maximum {}", value, u32::MAX),
        }
    }
}

/// Everything that can go wrong between asking for a plan and holding the decoded value.
#[derive(Debug, PartialEq)]
pub enum Error {
    Plan(PlanError),
    Encode(EncoderError),
    Decode(DecoderError),
}

impl From<PlanError> for Error {
    fn from(e: PlanError) -> Error {
        Error::Plan(e)
    }
}

impl From<EncoderError> for Error {
    fn from(e: EncoderError) -> Error {
        Error::Encode(e)
    }
}

impl From<DecoderError> for Error {
    fn from(e: DecoderError) -> Error {
        Error::Decode(e)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Plan(e) => Some(e),
            Error::Encode(e) => Some(e),
            Error::Decode(e) => Some(e),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::Plan(e) => write!(f, "Planning error: {}", e),
            Error::Encode(e) => write!(f, "Encoding error: {}", e),
            Error::Decode(e) => write!(f, "Decoding error: {}", e),
        }
    }
}
