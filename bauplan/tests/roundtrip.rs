use bauplan::*;
use proptest::prelude::*;

record! {
    pub struct Inner {
        pub tag: u8,
        pub text: String,
    }
}

record! {
    pub struct Outer {
        pub flag: bool,
        pub small: i16,
        pub ratio: f32,
        pub big: u64,
        pub blob: Vec<u8>,
        pub inner: Inner,
        pub maybe: Option<Box<Inner>>,
    }
}

fn inner() -> impl Strategy<Value = Value> {
    (any::<u8>(), ".*").prop_map(|(tag, text)| Value::Record(vec![Value::U8(tag), Value::Str(text)]))
}

fn outer() -> impl Strategy<Value = Value> {
    (
        any::<bool>(),
        any::<i16>(),
        any::<f32>().prop_filter("NaN never equals itself", |f| !f.is_nan()),
        any::<u64>(),
        proptest::collection::vec(any::<u8>(), 0..64),
        inner(),
        proptest::option::of(inner()),
    ).prop_map(|(flag, small, ratio, big, blob, inner, maybe)| Value::Record(vec![
        Value::Bool(flag),
        Value::I16(small),
        Value::F32(ratio),
        Value::U64(big),
        Value::Bytes(blob),
        inner,
        Value::Ref(maybe.map(Box::new)),
    ]))
}

proptest! {
    #[test]
    fn roundtrip(value in outer(), big_endian in any::<bool>()) {
        let registry = Registry::with_byte_order(if big_endian { ByteOrder::Big } else { ByteOrder::Little });
        let bytes = registry.to_bytes::<Outer>(&value).unwrap();
        prop_assert_eq!(value, registry.from_bytes::<Outer>(&bytes).unwrap());
    }
}
