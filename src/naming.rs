use heck::ToLowerCamelCase;

use crate::options::FieldNaming;

/// Joins an enclosing type's local name with a nested type's own name.
pub const NESTED_SEPARATOR: &str = "_";

/// `Outer` + `Inner` => `Outer_Inner`, top-level types keep their name.
pub fn type_name(enclosing: Option<&str>, name: &str) -> String {
    match enclosing {
        Some(enclosing) => format!("{enclosing}{NESTED_SEPARATOR}{name}"),
        None => name.to_owned(),
    }
}

pub fn field_name(name: &str, naming: FieldNaming) -> String {
    match naming {
        FieldNaming::Original => name.to_owned(),
        FieldNaming::CamelCase => name.to_lower_camel_case(),
    }
}

pub fn enum_value_name(name: &str) -> &str {
    name
}

pub fn service_name(name: &str) -> String {
    format!("{name}Service")
}
