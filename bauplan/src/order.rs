//! The byte order of multi-byte scalars. There is one process-wide setting which is consulted whenever
//! a plan binds a 16, 32 or 64 bit field. Plans remember the codec they resolved, not the setting, so
//! the order should be chosen once at startup before the first plan is derived.

use std::fmt::{Display, Formatter, self};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ByteOrder {
    Little = 0,
    Big = 1,
}

static CURRENT: AtomicU8 = AtomicU8::new(ByteOrder::Little as u8);

/// Returns the process-wide byte order. Defaults to little endian.
pub fn byte_order() -> ByteOrder {
    match CURRENT.load(Ordering::Acquire) {
        x if x == ByteOrder::Big as u8 => ByteOrder::Big,
        _ => ByteOrder::Little,
    }
}

/// Sets the process-wide byte order.
///
/// Plans derived before this call keep the codecs they were built with. Changing the order after
/// the first multi-byte field has been bound therefore leaves the process with types encoded in
/// different byte orders. Nothing guards against this; use
/// [`Registry::with_byte_order`](crate::Registry::with_byte_order) to pin an order per registry.
pub fn set_byte_order(order: ByteOrder) {
    CURRENT.store(order as u8, Ordering::Release);
}

impl ByteOrder {

    pub fn name(&self) -> &'static str {
        match *self {
            ByteOrder::Little => "little",
            ByteOrder::Big    => "big",
        }
    }

}

impl Display for ByteOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}

impl FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(ByteOrder::Little),
            "big" | "be" | "network" => Ok(ByteOrder::Big),
            other => Err(format!("unknown byte order `{}`, expected one of little, le, big, be", other)),
        }
    }
}
