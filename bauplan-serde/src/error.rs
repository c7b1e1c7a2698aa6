use std;
use std::fmt::{self, Display};
use serde::{de, ser};
use bauplan::PlanError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Planning, encoding or decoding failed
    Bauplan(bauplan::Error),
    /// The serde data model construct has no wire kind, e.g. maps or enums
    Unsupported(&'static str),
    /// A sequence that isn't made of bytes
    Seq(&'static str),
    /// A record value doesn't line up with its plan
    Arity { record: String, expected: usize, found: usize },
    /// A record was found where no plan is known
    MissingPlan,
    Message(String),
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(msg) => fmt.write_str(msg),
            Error::Bauplan(e) => write!(fmt, "{}", e),
            Error::Unsupported(what) => write!(fmt, "{} cannot be marshalled, only structs of scalars, strings, bytes and nested structs can", what),
            Error::Seq(found) => write!(fmt, "Only byte sequences are supported, found an element of kind {}", found),
            Error::Arity { record, expected, found } => write!(fmt, "Record {} has {} fields but its plan has {}", record, found, expected),
            Error::MissingPlan => fmt.write_str("Found a record without a plan"),
        }
    }
}

impl From<bauplan::Error> for Error {
    fn from(e: bauplan::Error) -> Error {
        Error::Bauplan(e)
    }
}

impl From<PlanError> for Error {
    fn from(e: PlanError) -> Error {
        Error::Bauplan(e.into())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Bauplan(e) => Some(e),
            _ => None,
        }
    }
}
