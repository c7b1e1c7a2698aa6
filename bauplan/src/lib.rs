//! Marshal records of fixed-width scalars, strings, byte blobs and nested records into a raw binary
//! layout. For every record type a [`Plan`] is derived once: the ordered list of its fields, each
//! bound to the codec of its [`WireKind`] or to the plan of a nested record. Plans are cached in a
//! [`Registry`] for the lifetime of the registry and reused for every value of the type.
//!
//! # Wire format
//!
//! Fields are written in declaration order without any framing or field tags:
//!
//! * `bool` is a single byte, `0` or `1`
//! * 8, 16, 32 and 64 bit integers and floats take their natural width in the configured
//!   [`ByteOrder`]; floats are written as their bit pattern
//! * strings and byte blobs are a big endian `u32` length followed by the raw bytes
//! * records by value are inlined
//! * records by reference (`Option<Box<T>>`) are a marker byte, `0` for absent and `1` for present,
//!   followed by the inlined record if present
//!
//! # A note on byte order
//!
//! A plan resolves the codec of each multi-byte field when it is derived. Changing the process-wide
//! order with [`set_byte_order`] afterwards does not affect plans that already exist, so types derived
//! before and after the change use different byte orders. Set the order once at startup or pin it per
//! registry with [`Registry::with_byte_order`].
//!
//! # Examples
//!
//! ```
//! use bauplan::*;
//!
//! record! {
//!     pub struct Message {
//!         pub flag: bool,
//!         pub id: u32,
//!         pub label: String,
//!     }
//! }
//!
//! let registry = Registry::with_byte_order(ByteOrder::Big);
//! let value = Value::Record(vec![Value::Bool(true), Value::U32(0x01020304), Value::from("hi")]);
//! let bytes = registry.to_bytes::<Message>(&value).unwrap();
//! assert_eq!(bytes, [
//!     0x01,                   // flag
//!     0x01, 0x02, 0x03, 0x04, // id
//!     0x00, 0x00, 0x00, 0x02, // length of label
//!     0x68, 0x69,             // 'hi'
//! ]);
//! assert_eq!(value, registry.from_bytes::<Message>(&bytes).unwrap());
//! ```

mod buffer;
mod codec;
mod desc;
mod driver;
mod error;
mod kind;
mod order;
mod plan;
mod value;

pub use buffer::*;
pub use codec::*;
pub use desc::*;
pub use driver::*;
pub use error::*;
pub use kind::{classify, WireKind};
pub use order::*;
pub use plan::*;
pub use value::*;
