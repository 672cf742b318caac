//! The `schema!` macro: one declaration yields the struct, its serde
//! representation and its [`Described`](harvest_value::Described) shape.
//!
//! Every field is optional on input (`#[serde(default)]`) and omitted on
//! output when it holds its default value, mirroring how protobuf JSON with
//! original field names treats unset fields. A field can carry an external
//! name with `field as "name": Type`.

pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

macro_rules! schema {
    (@name $field:ident $ext:literal) => { $ext };
    (@name $field:ident) => { stringify!($field) };

    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident $(as $ext:literal)? : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                #[serde(skip_serializing_if = "crate::schema::is_default")]
                $(#[serde(rename = $ext)])?
                pub $field: $ty,
            )*
        }

        impl harvest_value::Described for $name {
            fn shape() -> harvest_value::Shape {
                harvest_value::Shape::record(
                    stringify!($name),
                    vec![
                        $(harvest_value::Field::of::<$ty>(schema!(@name $field $($ext)?)),)*
                    ],
                )
            }
        }
    };
}
