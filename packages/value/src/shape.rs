//! Destination shapes.
//!
//! A [`Shape`] is what the marshaler dispatches on when it normalizes a
//! generic value into a typed record. The set is closed: every destination
//! type reduces to one of these variants through its [`Described`] impl.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{Attributes, Value};

/// The kind of value a destination expects.
#[derive(Clone, Debug)]
pub enum Shape {
    /// Any generic value, kept as is.
    Any,
    Bool,
    Integer,
    Float,
    String,
    /// Go-style duration text or integer nanoseconds.
    Duration,
    /// A point in time; RFC 3339 text or a native time.
    Timestamp,
    /// An open map kept verbatim.
    Attributes,
    /// A polymorphic payload identified by its `@type` tag.
    Envelope,
    List(Box<Shape>),
    Map(Box<Shape>),
    Struct(StructShape),
}

impl Shape {
    pub fn list(item: Shape) -> Self {
        Shape::List(Box::new(item))
    }

    pub fn map(value: Shape) -> Self {
        Shape::Map(Box::new(value))
    }

    pub fn record(name: &'static str, fields: Vec<Field>) -> Self {
        Shape::Struct(StructShape { name, fields })
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Shape::Any => "any",
            Shape::Bool => "bool",
            Shape::Integer => "integer",
            Shape::Float => "float",
            Shape::String => "string",
            Shape::Duration => "duration",
            Shape::Timestamp => "timestamp",
            Shape::Attributes => "attributes map",
            Shape::Envelope => "typed payload",
            Shape::List(_) => "list",
            Shape::Map(_) => "map",
            Shape::Struct(s) => s.name,
        }
    }
}

/// Fields of a structured destination, by external name.
#[derive(Clone, Debug)]
pub struct StructShape {
    name: &'static str,
    fields: Vec<Field>,
}

impl StructShape {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// One named field. The shape is produced lazily so recursive types
/// (a column holding columns) stay finite.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    name: &'static str,
    shape: fn() -> Shape,
}

impl Field {
    pub fn of<T: Described>(name: &'static str) -> Self {
        Field {
            name,
            shape: T::shape,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> Shape {
        (self.shape)()
    }
}

/// Types that can describe their own destination shape.
pub trait Described {
    fn shape() -> Shape;
}

macro_rules! described_as {
    ($shape:expr => $($ty:ty),+) => {
        $(
            impl Described for $ty {
                fn shape() -> Shape {
                    $shape
                }
            }
        )+
    };
}

described_as!(Shape::Bool => bool);
described_as!(Shape::Integer => i8, i16, i32, i64, u8, u16, u32, u64, usize);
described_as!(Shape::Float => f32, f64);
described_as!(Shape::String => String);
described_as!(Shape::Duration => Duration);
described_as!(Shape::Timestamp => DateTime<Utc>);
described_as!(Shape::Attributes => Attributes);
described_as!(Shape::Any => Value);

impl<T: Described> Described for Option<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: Described> Described for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: Described> Described for Vec<T> {
    fn shape() -> Shape {
        Shape::list(T::shape())
    }
}

impl<T: Described> Described for BTreeMap<String, T> {
    fn shape() -> Shape {
        Shape::map(T::shape())
    }
}

impl<T: Described, S> Described for HashMap<String, T, S> {
    fn shape() -> Shape {
        Shape::map(T::shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node;

    impl Described for Node {
        fn shape() -> Shape {
            Shape::record(
                "Node",
                vec![Field::of::<String>("name"), Field::of::<Vec<Node>>("children")],
            )
        }
    }

    #[test]
    fn recursive_shapes_resolve_lazily() {
        let Shape::Struct(node) = Node::shape() else {
            panic!("expected struct shape");
        };
        let children = node.field("children").unwrap().shape();
        let Shape::List(item) = children else {
            panic!("expected list shape");
        };
        assert_eq!(item.describe(), "Node");
        assert!(node.field("missing").is_none());
    }

    #[test]
    fn optional_fields_take_the_inner_shape() {
        assert!(matches!(Option::<DateTime<Utc>>::shape(), Shape::Timestamp));
        assert!(matches!(BTreeMap::<String, i64>::shape(), Shape::Map(_)));
    }
}
