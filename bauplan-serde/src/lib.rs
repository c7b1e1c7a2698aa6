//! Marshal your serde data structures through `bauplan` plans.
//!
//! `bauplan` needs the layout of a type before the first value is encoded, which serde can only
//! reveal by serializing a value. The layout therefore comes from the [`Record`](bauplan::Record)
//! implementation (usually written with [`bauplan::record!`]), while serde moves the values in and out
//! of the positional [`Value`](bauplan::Value) representation the plans operate on. Struct fields must
//! be serialized in declaration order, which is what `#[derive(Serialize)]` does, and must not be
//! skipped.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use bauplan::{record, ByteOrder, Registry};
//!
//! record! {
//!     #[derive(Serialize, Deserialize, PartialEq, Debug)]
//!     pub struct Cat {
//!         pub name: String,
//!         pub lives: u8,
//!         pub friend: Option<Box<Cat>>,
//!     }
//! }
//!
//! let registry = Registry::with_byte_order(ByteOrder::Little);
//! let cat = Cat {
//!     name: "Jessica".to_owned(),
//!     lives: 9,
//!     friend: Some(Box::new(Cat { name: "Wantan".to_owned(), lives: 7, friend: None })),
//! };
//!
//! let bytes = bauplan_serde::to_bytes(&registry, &cat).unwrap();
//! assert_eq!(bytes, [
//!     0x00, 0x00, 0x00, 0x07,                   // length of name
//!       0x4a, 0x65, 0x73, 0x73, 0x69, 0x63, 0x61, // 'Jessica'
//!     0x09,                                     // lives
//!     0x01,                                     // friend is present
//!       0x00, 0x00, 0x00, 0x06,                 // length of name
//!         0x57, 0x61, 0x6e, 0x74, 0x61, 0x6e,   // 'Wantan'
//!       0x07,                                   // lives
//!       0x00,                                   // friend is absent
//! ]);
//!
//! let decoded: Cat = bauplan_serde::from_bytes(&registry, &bytes).unwrap();
//! assert_eq!(cat, decoded);
//! ```

mod de;
mod error;
mod ser;

pub use de::{from_bytes, from_value, Deserializer};
pub use error::{Error, Result};
pub use ser::{to_bytes, to_value, Serializer};
