//! Describing record types. A record type is an ordered list of named fields, each with a declared
//! [`TypeDesc`]. Rust types opt in by implementing [`Record`] (usually through the [`record!`](crate::record)
//! macro); runtime schemas build [`RecordRef`]s by hand with [`RecordRef::named`].

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Identifies a record layout. This is the key of the plan cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    /// A Rust type implementing [`Record`]
    Native(TypeId),
    /// A record from a runtime schema. Names must be unique within the registry they are used with.
    Named(Arc<str>),
}

/// Produces the field list of a record on demand, so that recursive records can refer to themselves.
pub type FieldSource = Arc<dyn Fn() -> Vec<FieldDecl> + Send + Sync>;

#[derive(Clone)]
pub struct RecordRef {
    id: RecordId,
    name: Arc<str>,
    fields: FieldSource,
}

impl RecordRef {

    pub fn of<T: Record>() -> Self {
        Self { id: RecordId::Native(TypeId::of::<T>()), name: T::name().into(), fields: Arc::new(T::fields) }
    }

    pub fn named<F>(name: &str, fields: F) -> Self where F: Fn() -> Vec<FieldDecl> + Send + Sync + 'static {
        let name: Arc<str> = name.into();
        Self { id: RecordId::Named(name.clone()), name, fields: Arc::new(fields) }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared fields in declaration order
    pub fn fields(&self) -> Vec<FieldDecl> {
        (self.fields)()
    }

}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Debug for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordRef").field("id", &self.id).field("name", &self.name).finish()
    }
}

/// The declared type of a field, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    I64,
    U64,
    F64,
    Char,
    Unit,
    Str,
    Seq(Box<TypeDesc>),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    Optional(Box<TypeDesc>),
    Record(RecordRef),
}

impl TypeDesc {

    pub fn record<T: Record>() -> Self {
        TypeDesc::Record(RecordRef::of::<T>())
    }

    /// Shorthand for a nullable reference to a record
    pub fn reference(record: RecordRef) -> Self {
        TypeDesc::Optional(Box::new(TypeDesc::Record(record)))
    }

    pub fn bytes() -> Self {
        TypeDesc::Seq(Box::new(TypeDesc::U8))
    }

}

impl Display for TypeDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Bool        => f.write_str("bool"),
            TypeDesc::I8          => f.write_str("i8"),
            TypeDesc::U8          => f.write_str("u8"),
            TypeDesc::I16         => f.write_str("i16"),
            TypeDesc::U16         => f.write_str("u16"),
            TypeDesc::I32         => f.write_str("i32"),
            TypeDesc::U32         => f.write_str("u32"),
            TypeDesc::F32         => f.write_str("f32"),
            TypeDesc::I64         => f.write_str("i64"),
            TypeDesc::U64         => f.write_str("u64"),
            TypeDesc::F64         => f.write_str("f64"),
            TypeDesc::Char        => f.write_str("char"),
            TypeDesc::Unit        => f.write_str("()"),
            TypeDesc::Str         => f.write_str("str"),
            TypeDesc::Seq(t)      => write!(f, "[{}]", t),
            TypeDesc::Map(k, v)   => write!(f, "map<{}, {}>", k, v),
            TypeDesc::Optional(t) => write!(f, "Option<{}>", t),
            TypeDesc::Record(r)   => f.write_str(r.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDesc,
}

impl FieldDecl {

    pub fn new<S: Into<String>>(name: S, ty: TypeDesc) -> Self {
        Self { name: name.into(), ty }
    }

    pub fn of<T: Describe + ?Sized, S: Into<String>>(name: S) -> Self {
        Self::new(name, T::describe())
    }

}

/// A Rust type whose values are records.
pub trait Record: 'static {
    fn name() -> &'static str;
    fn fields() -> Vec<FieldDecl>;
}

/// Maps a Rust type to its declared [`TypeDesc`]. Implemented for the standard types a field may
/// have, including ones the classifier will reject, so that the rejection carries a useful message.
pub trait Describe {
    fn describe() -> TypeDesc;
}

macro_rules! describe {
    ($($t:ty => $d:expr),* $(,)?) => {
        $(impl Describe for $t {
            fn describe() -> TypeDesc {
                $d
            }
        })*
    };
}

describe! {
    bool   => TypeDesc::Bool,
    i8     => TypeDesc::I8,
    u8     => TypeDesc::U8,
    i16    => TypeDesc::I16,
    u16    => TypeDesc::U16,
    i32    => TypeDesc::I32,
    u32    => TypeDesc::U32,
    f32    => TypeDesc::F32,
    i64    => TypeDesc::I64,
    u64    => TypeDesc::U64,
    f64    => TypeDesc::F64,
    char   => TypeDesc::Char,
    ()     => TypeDesc::Unit,
    str    => TypeDesc::Str,
    String => TypeDesc::Str,
}

impl<T: Describe + ?Sized> Describe for &T {
    fn describe() -> TypeDesc {
        T::describe()
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn describe() -> TypeDesc {
        T::describe()
    }
}

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeDesc {
        TypeDesc::Seq(Box::new(T::describe()))
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDesc {
        TypeDesc::Seq(Box::new(T::describe()))
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDesc {
        TypeDesc::Optional(Box::new(T::describe()))
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn describe() -> TypeDesc {
        TypeDesc::Map(Box::new(K::describe()), Box::new(V::describe()))
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> TypeDesc {
        TypeDesc::Map(Box::new(K::describe()), Box::new(V::describe()))
    }
}

/// Declares a struct together with its [`Record`] and [`Describe`] implementations. Attributes on the
/// struct and on its fields are passed through unchanged.
///
/// ```
/// bauplan::record! {
///     #[derive(Debug)]
///     pub struct Node {
///         pub value: i32,
///         pub next: Option<Box<Node>>,
///     }
/// }
///
/// use bauplan::Record;
/// assert_eq!(2, Node::fields().len());
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field : $ty ),*
        }

        impl $crate::Record for $name {
            fn name() -> &'static str {
                stringify!($name)
            }

            fn fields() -> ::std::vec::Vec<$crate::FieldDecl> {
                ::std::vec![ $( $crate::FieldDecl::new(stringify!($field), <$ty as $crate::Describe>::describe()) ),* ]
            }
        }

        impl $crate::Describe for $name {
            fn describe() -> $crate::TypeDesc {
                $crate::TypeDesc::record::<$name>()
            }
        }
    };
}
