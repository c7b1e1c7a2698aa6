use bauplan::*;
use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

record! {
    pub struct Message {
        pub flag: bool,
        pub id: i32,
        pub label: String,
        pub payload: Vec<u8>,
    }
}

record! {
    pub struct Sample {
        pub a: u8,
        pub b: i16,
        pub c: f32,
        pub d: f64,
    }
}

record! {
    pub struct Tree {
        pub weight: u32,
        pub left: Option<Box<Tree>>,
        pub right: Option<Box<Tree>>,
    }
}

record! {
    pub struct Lookup {
        pub name: String,
        pub entries: HashMap<String, u64>,
    }
}

fn kinds(plan: &Plan) -> Vec<(String, WireKind)> {
    plan.bindings().iter().map(|b| (b.name().to_owned(), b.kind())).collect()
}

#[test]
fn deterministic() {
    let first = Registry::new();
    let second = Registry::new();
    let a = first.plan_of::<Sample>().unwrap();
    let b = second.plan_of::<Sample>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(kinds(&a), kinds(&b));
    assert_eq!(vec![
        ("a".to_owned(), WireKind::Int8),
        ("b".to_owned(), WireKind::Int16),
        ("c".to_owned(), WireKind::Int32),
        ("d".to_owned(), WireKind::Int64),
    ], kinds(&a));
}

#[test]
fn concurrent_first_use_derives_once() {
    const THREADS: usize = 16;
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS).map(|_| {
        let registry = registry.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            registry.plan_of::<Message>().unwrap()
        })
    }).collect();
    let plans: Vec<Arc<Plan>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(1, registry.derivations());
    for plan in plans.iter() {
        assert!(Arc::ptr_eq(&plans[0], plan));
        assert!(plan.is_frozen());
        assert_eq!(kinds(&plans[0]), kinds(plan));
    }
}

#[test]
fn concurrent_mixed_types() {
    let registry = Arc::new(Registry::new());
    let handles: Vec<_> = (0..8).map(|i| {
        let registry = registry.clone();
        thread::spawn(move || match i % 2 {
            0 => registry.plan_of::<Tree>().unwrap().bindings().len(),
            _ => registry.plan_of::<Sample>().unwrap().bindings().len(),
        })
    }).collect();
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(if i % 2 == 0 { 3 } else { 4 }, h.join().unwrap());
    }
    assert_eq!(2, registry.derivations());
}

#[test]
fn self_reference() {
    let registry = Registry::new();
    let plan = registry.plan_of::<Tree>().unwrap();
    assert!(Arc::ptr_eq(&plan, plan.bindings()[1].nested().unwrap()));
    assert!(Arc::ptr_eq(&plan, plan.bindings()[2].nested().unwrap()));
    assert_eq!(WireKind::RecordByReference, plan.bindings()[1].kind());
    assert_eq!(1, registry.len());
}

#[test]
fn endianness_per_registry() {
    let value = Value::Record(vec![Value::Bool(false), Value::I32(0x01020304), Value::from(""), Value::Bytes(vec![])]);
    let little = Registry::with_byte_order(ByteOrder::Little).to_bytes::<Message>(&value).unwrap();
    let big = Registry::with_byte_order(ByteOrder::Big).to_bytes::<Message>(&value).unwrap();
    assert_eq!([0x04, 0x03, 0x02, 0x01], little[1..5]);
    assert_eq!([0x01, 0x02, 0x03, 0x04], big[1..5]);
    let little_plan = Registry::with_byte_order(ByteOrder::Little).plan_of::<Message>().unwrap();
    let big_plan = Registry::with_byte_order(ByteOrder::Big).plan_of::<Message>().unwrap();
    assert_ne!(little_plan.bindings()[1].codec(), big_plan.bindings()[1].codec());
    assert_eq!(little_plan.bindings()[2].codec(), big_plan.bindings()[2].codec());
}

#[test]
fn unsupported_is_never_cached() {
    let registry = Registry::new();
    let first = registry.plan_of::<Lookup>().unwrap_err();
    assert!(matches!(&first, PlanError::UnsupportedFieldType { field, .. } if field == "entries"));
    assert_eq!("Field Lookup.entries has unsupported type map<str, u64>", first.to_string());
    assert!(registry.is_empty());
    assert_eq!(first, registry.plan_of::<Lookup>().unwrap_err());
    assert!(matches!(registry.to_bytes::<Lookup>(&Value::Record(vec![])), Err(Error::Plan(_))));
    assert_eq!(0, registry.derivations());
}

#[test]
fn roundtrip_edge_cases() {
    let registry = Registry::new();
    for (flag, label, payload) in [(true, "label", vec![0u8, 255]), (false, "", vec![]), (true, "ünïcödé", vec![7; 1024])] {
        let value = Value::Record(vec![Value::Bool(flag), Value::I32(i32::MIN), Value::from(label), Value::Bytes(payload)]);
        let bytes = registry.to_bytes::<Message>(&value).unwrap();
        assert_eq!(value, registry.from_bytes::<Message>(&bytes).unwrap());
    }
    assert_eq!(1, registry.derivations());
}

#[test]
fn absent_and_present_references() {
    let registry = Registry::new();
    let leaf = |w: u32| Value::Record(vec![Value::U32(w), Value::Ref(None), Value::Ref(None)]);
    let tree = Value::Record(vec![Value::U32(1), Value::Ref(Some(Box::new(leaf(2)))), Value::Ref(None)]);
    let bytes = registry.to_bytes::<Tree>(&tree).unwrap();
    assert_eq!(4 + 1 + (4 + 1 + 1) + 1, bytes.len());
    assert_eq!(tree, registry.from_bytes::<Tree>(&bytes).unwrap());
    let bytes = registry.to_bytes::<Tree>(&leaf(3)).unwrap();
    assert_eq!(leaf(3), registry.from_bytes::<Tree>(&bytes).unwrap());
    assert_eq!(1, registry.derivations());
}

#[test]
fn global_registry_is_shared() {
    let a = Registry::global().plan_of::<Sample>().unwrap();
    let b = Registry::global().plan_of::<Sample>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
