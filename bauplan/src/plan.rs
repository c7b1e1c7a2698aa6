//! Deriving and caching plans.
//!
//! A [`Plan`] is the ordered list of field bindings for one record type. Plans are derived lazily by
//! a [`Registry`] on first use and shared as `Arc<Plan>` afterwards. Derivation happens under the
//! registry's write lock: an empty plan is published first, then its fields are classified one by
//! one, recursing into nested records through the same locked map. A record that refers back to a
//! type whose derivation is in progress receives the published placeholder, which is how recursive
//! types terminate. The bindings are set exactly once, before the write lock is released, so no other
//! thread can observe a plan that is still being built.

use crate::codec::Codec;
use crate::desc::{FieldDecl, Record, RecordId, RecordRef, TypeDesc};
use crate::error::PlanError;
use crate::kind::{self, WireKind};
use crate::order::{self, ByteOrder};
use crate::value::Value;
use log::{debug, trace};
use parking_lot::RwLock;
use std::collections::hash_map::{Entry, HashMap};
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

pub struct Plan {
    id: RecordId,
    name: String,
    bindings: OnceLock<Vec<FieldBinding>>,
}

impl Plan {

    fn building(record: &RecordRef) -> Self {
        Self { id: record.id().clone(), name: record.name().to_owned(), bindings: OnceLock::new() }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field bindings in declaration order, which is also wire order. Empty while the plan is
    /// still being derived.
    pub fn bindings(&self) -> &[FieldBinding] {
        self.bindings.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_frozen(&self) -> bool {
        self.bindings.get().is_some()
    }

}

impl Debug for Plan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan").field("name", &self.name).field("bindings", &self.bindings()).finish()
    }
}

/// Where a field's value goes: through a primitive codec or through the plan of a nested record.
#[derive(Clone)]
pub enum Target {
    /// `zero` is the typed slot the decoder fills
    Codec { codec: Codec, zero: Value },
    Record(Arc<Plan>),
}

impl Debug for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            // nested plans may be recursive, print their name only
            Target::Record(plan) => write!(f, "Record({})", plan.name()),
            Target::Codec { codec, .. } => write!(f, "{:?}", codec),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldBinding {
    name: String,
    declared: TypeDesc,
    kind: WireKind,
    target: Target,
}

impl FieldBinding {

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> &TypeDesc {
        &self.declared
    }

    pub fn kind(&self) -> WireKind {
        self.kind
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The plan of the nested record for record kinds
    pub fn nested(&self) -> Option<&Arc<Plan>> {
        match &self.target {
            Target::Record(plan) => Some(plan),
            Target::Codec { .. } => None,
        }
    }

    pub fn codec(&self) -> Option<&Codec> {
        match &self.target {
            Target::Codec { codec, .. } => Some(codec),
            Target::Record(_) => None,
        }
    }

}

type Plans = HashMap<RecordId, Arc<Plan>>;

/// The plan cache. Entries are added on first use and never evicted.
pub struct Registry {
    plans: RwLock<Plans>,
    order: Option<ByteOrder>,
    derivations: AtomicUsize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {

    /// A registry binding multi-byte fields according to the process-wide [`byte_order`](crate::byte_order)
    pub fn new() -> Self {
        Self { plans: RwLock::new(HashMap::new()), order: None, derivations: AtomicUsize::new(0) }
    }

    /// A registry binding multi-byte fields in `order`, regardless of the process-wide setting
    pub fn with_byte_order(order: ByteOrder) -> Self {
        Self { order: Some(order), ..Self::new() }
    }

    /// The process-wide registry
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn plan_of<T: Record>(&self) -> Result<Arc<Plan>, PlanError> {
        self.plan_for(&RecordRef::of::<T>())
    }

    /// Fails with [`PlanError::InvalidUsage`] if `ty` isn't a record
    pub fn plan(&self, ty: &TypeDesc) -> Result<Arc<Plan>, PlanError> {
        match ty {
            TypeDesc::Record(record) => self.plan_for(record),
            other => Err(PlanError::InvalidUsage(other.to_string())),
        }
    }

    pub fn plan_for(&self, record: &RecordRef) -> Result<Arc<Plan>, PlanError> {
        if let Some(plan) = self.plans.read().get(record.id()) {
            return Ok(plan.clone());
        }
        let mut plans = self.plans.write();
        let mut published = Vec::new();
        let result = self.plan_locked(&mut plans, record, &mut published)
            .and_then(|plan| check_inline(&plan).map(|_| plan));
        match result {
            Ok(plan) => {
                self.derivations.fetch_add(published.len(), Ordering::Relaxed);
                Ok(plan)
            },
            Err(e) => {
                // placeholders of this pass may be referenced by plans that were frozen around them
                for id in published.iter() {
                    plans.remove(id);
                }
                debug!("derivation of {} failed: {}", record.name(), e);
                Err(e)
            },
        }
    }

    fn plan_locked(&self, plans: &mut Plans, record: &RecordRef, published: &mut Vec<RecordId>) -> Result<Arc<Plan>, PlanError> {
        let plan = match plans.entry(record.id().clone()) {
            Entry::Occupied(entry) => return Ok(entry.get().clone()),
            Entry::Vacant(entry)   => entry.insert(Arc::new(Plan::building(record))).clone(),
        };
        published.push(record.id().clone());
        let fields = record.fields();
        let mut bindings = Vec::with_capacity(fields.len());
        for field in fields {
            let kind = kind::classify(record.name(), &field)?;
            let target = match kind::nested(&field.ty) {
                Some(nested) => Target::Record(self.plan_locked(plans, nested, published)?),
                None => self.codec_target(record, &field, kind)?,
            };
            trace!("{}.{}: {} -> {:?}", record.name(), field.name, kind, target);
            bindings.push(FieldBinding { name: field.name, declared: field.ty, kind, target });
        }
        debug!("derived plan for {} with {} fields", record.name(), bindings.len());
        let frozen = plan.bindings.set(bindings).is_ok();
        debug_assert!(frozen, "plan for {} frozen twice", record.name());
        Ok(plan)
    }

    fn codec_target(&self, record: &RecordRef, field: &FieldDecl, kind: WireKind) -> Result<Target, PlanError> {
        let unsupported = || PlanError::UnsupportedFieldType {
            record: record.name().to_owned(),
            field: field.name.clone(),
            ty: field.ty.to_string(),
        };
        let codec = Codec::select(kind, self.byte_order()).ok_or_else(unsupported)?;
        let zero = Value::zero(&field.ty).ok_or_else(unsupported)?;
        Ok(Target::Codec { codec, zero })
    }

    /// The byte order new bindings are resolved with
    pub fn byte_order(&self) -> ByteOrder {
        self.order.unwrap_or_else(order::byte_order)
    }

    /// Number of plans derived and kept so far. Work rolled back after a failure isn't counted.
    pub fn derivations(&self) -> usize {
        self.derivations.load(Ordering::Relaxed)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.plans.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

}

/// Rejects records that reach themselves again through fields held by value only. Such a record has
/// no finite encoding; recursion has to pass through a reference.
fn check_inline(root: &Arc<Plan>) -> Result<(), PlanError> {
    let mut seen = HashSet::new();
    let mut done = HashSet::new();
    let mut pending = vec![root.clone()];
    while let Some(plan) = pending.pop() {
        if !seen.insert(plan.id().clone()) {
            continue;
        }
        inline_cycle(&plan, &mut Vec::new(), &mut done)?;
        pending.extend(plan.bindings().iter().filter_map(|b| b.nested().cloned()));
    }
    Ok(())
}

fn inline_cycle(plan: &Plan, chain: &mut Vec<RecordId>, done: &mut HashSet<RecordId>) -> Result<(), PlanError> {
    if done.contains(plan.id()) {
        return Ok(());
    }
    chain.push(plan.id().clone());
    for binding in plan.bindings() {
        if let (WireKind::RecordByValue, Some(nested)) = (binding.kind(), binding.nested()) {
            if chain.contains(nested.id()) {
                return Err(PlanError::RecursiveByValue { record: plan.name().to_owned(), field: binding.name().to_owned() });
            }
            inline_cycle(nested, chain, done)?;
        }
    }
    chain.pop();
    done.insert(plan.id().clone());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{Registry, Target};
    use crate::desc::{Describe, FieldDecl, RecordId, RecordRef, TypeDesc};
    use crate::error::PlanError;
    use crate::kind::WireKind;
    use crate::order::ByteOrder;
    use std::any::TypeId;
    use std::collections::HashMap;
    use std::sync::Arc;

    crate::record! {
        struct Point {
            x: i32,
            y: i32,
        }
    }

    crate::record! {
        struct Shape {
            name: String,
            origin: Point,
            anchor: Option<Box<Point>>,
            scale: f64,
        }
    }

    crate::record! {
        struct Broken {
            ok: Point,
            lookup: HashMap<String, u32>,
        }
    }

    #[test]
    fn bindings_in_declaration_order() {
        let registry = Registry::with_byte_order(ByteOrder::Little);
        let plan = registry.plan_of::<Shape>().unwrap();
        let kinds: Vec<_> = plan.bindings().iter().map(|b| (b.name(), b.kind())).collect();
        assert_eq!(vec![
            ("name", WireKind::String),
            ("origin", WireKind::RecordByValue),
            ("anchor", WireKind::RecordByReference),
            ("scale", WireKind::Int64),
        ], kinds);
        assert_eq!(Some(ByteOrder::Little), plan.bindings()[3].codec().unwrap().order());
        assert!(plan.is_frozen());
    }

    #[test]
    fn nested_plans_are_shared() {
        let registry = Registry::new();
        let shape = registry.plan_of::<Shape>().unwrap();
        let point = registry.plan_of::<Point>().unwrap();
        assert!(Arc::ptr_eq(&point, shape.bindings()[1].nested().unwrap()));
        assert!(Arc::ptr_eq(&point, shape.bindings()[2].nested().unwrap()));
        assert_eq!(2, registry.derivations());
        assert_eq!(2, registry.len());
    }

    #[test]
    fn cached_after_first_use() {
        let registry = Registry::new();
        let first = registry.plan_of::<Point>().unwrap();
        let second = registry.plan_of::<Point>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, registry.derivations());
    }

    #[test]
    fn failure_rolls_back() {
        let registry = Registry::new();
        let expected = PlanError::UnsupportedFieldType {
            record: "Broken".into(),
            field: "lookup".into(),
            ty: "map<str, u32>".into(),
        };
        assert_eq!(Err(expected.clone()), registry.plan_of::<Broken>().map(|_| ()));
        assert!(registry.is_empty());
        assert!(!registry.contains(&RecordId::Native(TypeId::of::<Broken>())));
        assert_eq!(Err(expected), registry.plan_of::<Broken>().map(|_| ()));
        assert!(registry.is_empty());
    }

    #[test]
    fn invalid_usage() {
        let registry = Registry::new();
        assert_eq!(Err(PlanError::InvalidUsage("u32".into())), registry.plan(&u32::describe()).map(|_| ()));
        assert_eq!(Err(PlanError::InvalidUsage("Option<Point>".into())), registry.plan(&Option::<Point>::describe()).map(|_| ()));
        assert!(registry.plan(&Point::describe()).is_ok());
    }

    #[test]
    fn mutual_recursion() {
        fn parent() -> RecordRef {
            RecordRef::named("Parent", || vec![FieldDecl::of::<u8, _>("id"), FieldDecl::new("child", TypeDesc::reference(child()))])
        }
        fn child() -> RecordRef {
            RecordRef::named("Child", || vec![FieldDecl::new("parent", TypeDesc::reference(parent())), FieldDecl::of::<bool, _>("leaf")])
        }
        let registry = Registry::new();
        let p = registry.plan_for(&parent()).unwrap();
        let c = registry.plan_for(&child()).unwrap();
        assert!(Arc::ptr_eq(&c, p.bindings()[1].nested().unwrap()));
        assert!(Arc::ptr_eq(&p, c.bindings()[0].nested().unwrap()));
        assert!(c.is_frozen());
        assert_eq!(2, registry.derivations());
        assert!(matches!(c.bindings()[1].target(), Target::Codec { .. }));
    }

    #[test]
    fn failure_behind_cycle_is_not_cached() {
        fn outer() -> RecordRef {
            RecordRef::named("Outer", || vec![FieldDecl::new("inner", TypeDesc::Record(inner())), FieldDecl::of::<char, _>("bad")])
        }
        fn inner() -> RecordRef {
            RecordRef::named("Inner", || vec![FieldDecl::new("back", TypeDesc::reference(outer()))])
        }
        let registry = Registry::new();
        assert!(registry.plan_for(&outer()).is_err());
        assert!(registry.is_empty());
        assert_eq!(0, registry.derivations());
        assert!(registry.plan_for(&inner()).is_err());
        assert!(registry.is_empty());
        assert_eq!(0, registry.derivations());
    }

    #[test]
    fn contains_itself_by_value() {
        fn itself() -> RecordRef {
            RecordRef::named("Itself", || vec![FieldDecl::of::<u8, _>("tag"), FieldDecl::new("again", TypeDesc::Record(itself()))])
        }
        let registry = Registry::new();
        let expected = PlanError::RecursiveByValue { record: "Itself".into(), field: "again".into() };
        assert_eq!(Err(expected.clone()), registry.plan_for(&itself()).map(|_| ()));
        assert!(registry.is_empty());
        assert_eq!(Err(expected), registry.plan_for(&itself()).map(|_| ()));
        assert_eq!(0, registry.derivations());
    }

    #[test]
    fn inline_cycle_through_other_records() {
        fn first() -> RecordRef {
            RecordRef::named("First", || vec![FieldDecl::new("second", TypeDesc::Record(second()))])
        }
        fn second() -> RecordRef {
            RecordRef::named("Second", || vec![FieldDecl::new("first", TypeDesc::Record(first()))])
        }
        let registry = Registry::new();
        assert!(matches!(registry.plan_for(&first()), Err(PlanError::RecursiveByValue { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn inline_cycle_entered_through_reference() {
        // Head reaches Body through a reference first, while Body and Head also hold each other by value
        fn head() -> RecordRef {
            RecordRef::named("Head", || vec![
                FieldDecl::new("link", TypeDesc::reference(body())),
                FieldDecl::new("body", TypeDesc::Record(body())),
            ])
        }
        fn body() -> RecordRef {
            RecordRef::named("Body", || vec![FieldDecl::new("head", TypeDesc::Record(head()))])
        }
        let registry = Registry::new();
        assert!(matches!(registry.plan_for(&head()), Err(PlanError::RecursiveByValue { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn reference_breaks_inline_chain() {
        fn outer() -> RecordRef {
            RecordRef::named("Outer", || vec![FieldDecl::new("inner", TypeDesc::Record(inner()))])
        }
        fn inner() -> RecordRef {
            RecordRef::named("Inner", || vec![FieldDecl::new("back", TypeDesc::reference(outer()))])
        }
        let registry = Registry::new();
        let plan = registry.plan_for(&outer()).unwrap();
        assert_eq!(WireKind::RecordByValue, plan.bindings()[0].kind());
        assert_eq!(2, registry.derivations());
    }

}
