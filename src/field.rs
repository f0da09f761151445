use std::time::Duration;

///
/// Descriptor capability for structures whose fields can be overridden.
///
/// Implementors hand out their field table in declaration order; each
/// entry borrows the field it describes, so the walk can write straight
/// into the structure. Private fields may still be listed; mark them
/// [`read_only`](Field::read_only) and the walk will refuse to touch
/// them instead of silently skipping an override someone set.
///
pub trait Overridable {
    fn fields(&mut self) -> Vec<Field<'_>>;
}

///
/// Shape of a value as the walk sees it: a structure it can descend
/// into, or something it must leave alone.
///
/// Opaque stands in for absent nested values (`None`) and for dynamic
/// values whose runtime shape has no fields to offer.
///
pub enum Node<'a> {
    Struct(&'a mut dyn Overridable),
    Opaque,
}

impl<'a> Node<'a> {
    /// Node over an optional nested structure; `None` reads as opaque.
    #[inline]
    pub fn optional<T: Overridable>(target: Option<&'a mut T>) -> Self {
        match target {
            Some(target) => Node::Struct(target),
            None => Node::Opaque,
        }
    }

    /// Reborrow, so the same node can be walked under more than one key.
    pub(crate) fn reborrow(&mut self) -> Node<'_> {
        match self {
            Node::Struct(target) => Node::Struct(&mut **target),
            Node::Opaque => Node::Opaque,
        }
    }
}

impl<'a, T: Overridable> From<&'a mut T> for Node<'a> {
    #[inline]
    fn from(target: &'a mut T) -> Self {
        Node::Struct(target)
    }
}

///
/// One entry of a descriptor table.
///
pub struct Field<'a> {
    pub(crate) name: &'static str,
    pub(crate) rename: Option<&'static str>,
    pub(crate) settable: bool,
    pub(crate) kind: Kind<'a>,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, kind: impl Into<Kind<'a>>) -> Self {
        Field {
            name,
            rename: None,
            settable: true,
            kind: kind.into(),
        }
    }

    /// Explicit override-name hint, e.g. mirroring a serialization tag.
    pub fn renamed(mut self, rename: &'static str) -> Self {
        self.rename = Some(rename);
        self
    }

    /// Mark the field as one the walk may inspect but never write.
    pub fn read_only(mut self) -> Self {
        self.settable = false;
        self
    }

    /// Override key for this field under `prefix`.
    ///
    /// Hyphens are normalized to underscores first; shells cannot easily
    /// reference variables containing hyphens.
    pub(crate) fn key(&self, prefix: &str) -> String {
        let name = self.rename.unwrap_or(self.name).replace('-', "_");
        if prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", prefix, name).to_uppercase()
        }
    }
}

///
/// Declared kind of a field.
///
pub enum Kind<'a> {
    /// Terminal value the walk can coerce into.
    Scalar(Scalar<'a>),
    /// Nested structure, or a reference to one.
    Struct(Node<'a>),
    /// Ordered sequence of nested structures. Elements answer to both
    /// the plain key and a `_<index>` suffixed one.
    Seq(Vec<Node<'a>>),
    /// Open kind the descriptor cannot classify. Walked as a structure
    /// when its runtime shape happens to be one, skipped otherwise.
    Other(Node<'a>),
}

impl<'a> Kind<'a> {
    /// Sequence over any iterator of nested structures.
    pub fn seq<T>(items: impl IntoIterator<Item = &'a mut T>) -> Self
    where
        T: Overridable + 'a,
    {
        Kind::Seq(items.into_iter().map(Node::from).collect())
    }
}

///
/// Typed slot for a terminal field.
///
pub enum Scalar<'a> {
    Str(&'a mut String),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Usize(&'a mut usize),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Bool(&'a mut bool),
    Duration(&'a mut Duration),
}

impl Scalar<'_> {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Scalar::Str(_) => "string",
            Scalar::I8(_) => "i8",
            Scalar::I16(_) => "i16",
            Scalar::I32(_) => "i32",
            Scalar::I64(_) => "i64",
            Scalar::Isize(_) => "isize",
            Scalar::U8(_) => "u8",
            Scalar::U16(_) => "u16",
            Scalar::U32(_) => "u32",
            Scalar::U64(_) => "u64",
            Scalar::Usize(_) => "usize",
            Scalar::F32(_) => "f32",
            Scalar::F64(_) => "f64",
            Scalar::Bool(_) => "bool",
            Scalar::Duration(_) => "duration",
        }
    }
}

macro_rules! scalar_kind {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl<'a> From<&'a mut $ty> for Kind<'a> {
                #[inline]
                fn from(slot: &'a mut $ty) -> Self {
                    Kind::Scalar(Scalar::$variant(slot))
                }
            }
        )*
    };
}

scalar_kind! {
    Str => String,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    Isize => isize,
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    Usize => usize,
    F32 => f32,
    F64 => f64,
    Bool => bool,
    Duration => Duration,
}
