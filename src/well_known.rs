//! Types from `google.protobuf` that are never synthesized from their descriptors.
//! Declarations for them live outside the generated files, under the
//! `google.protobuf` namespace.

pub const WELL_KNOWN_PACKAGE: &str = "google.protobuf";

const WELL_KNOWN_TYPES: &[&str] = &[
    "Any",
    "BoolValue",
    "BytesValue",
    "DoubleValue",
    "Duration",
    "Empty",
    "FieldMask",
    "FloatValue",
    "Int32Value",
    "Int64Value",
    "ListValue",
    "NullValue",
    "StringValue",
    "Struct",
    "Timestamp",
    "UInt32Value",
    "UInt64Value",
    "Value",
];

pub struct WellKnownType {
    pub full_name: String,
    pub name: &'static str,
}

impl WellKnownType {
    pub fn try_from_full_name(full_name: &str) -> Option<Self> {
        let name = full_name
            .strip_prefix(WELL_KNOWN_PACKAGE)?
            .strip_prefix('.')?;

        WELL_KNOWN_TYPES
            .iter()
            .find(|&&known| known == name)
            .map(|&name| WellKnownType {
                full_name: full_name.to_owned(),
                name,
            })
    }

    pub fn all() -> impl Iterator<Item = WellKnownType> {
        WELL_KNOWN_TYPES.iter().map(|&name| WellKnownType {
            full_name: format!("{WELL_KNOWN_PACKAGE}.{name}"),
            name,
        })
    }
}
