use crate::{
    error::{GenerateError, Result},
    naming,
    options::GeneratorOptions,
    schema::{FieldKind, FieldType, Presence, ScalarKind},
    symbols::SymbolTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Number,
    Boolean,
    String,
    Bytes,
}

/// A TypeScript type, before it knows which namespace it is written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Primitive(Primitive),
    Reference { namespace: Vec<String>, name: String },
    Array(Box<TypeExpr>),
    Index { key: Box<TypeExpr>, value: Box<TypeExpr> },
    AsyncIterator(Box<TypeExpr>),
}

impl TypeExpr {
    /// Renders the type as seen from inside the namespace `scope`. References into the
    /// same namespace, or into the global one, stay unqualified. Dotted references are
    /// only valid if `SymbolTable::resolve_from` accepted them for the same scope.
    pub fn render(&self, scope: &[String], options: &GeneratorOptions) -> String {
        match self {
            TypeExpr::Primitive(Primitive::Number) => "number".to_owned(),
            TypeExpr::Primitive(Primitive::Boolean) => "boolean".to_owned(),
            TypeExpr::Primitive(Primitive::String) => "string".to_owned(),
            TypeExpr::Primitive(Primitive::Bytes) => "Uint8Array".to_owned(),

            TypeExpr::Reference { namespace, name } => {
                if namespace == scope || namespace.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{name}", namespace.join("."))
                }
            }

            TypeExpr::Array(element) => format!("Array<{}>", element.render(scope, options)),

            TypeExpr::Index { key, value } => format!(
                "{{ [key: {}]: {} }}",
                key.render(scope, options),
                value.render(scope, options)
            ),

            TypeExpr::AsyncIterator(item) => {
                format!("{}<{}>", options.async_iterator, item.render(scope, options))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    pub name: String,
    pub optional: bool,
    pub type_expr: TypeExpr,
}

/// Maps one field of `owner`, a message declared in the namespace `scope`.
pub fn map_field(
    field: &FieldType,
    owner: &str,
    scope: &[String],
    symbols: &SymbolTable,
    options: &GeneratorOptions,
) -> Result<MappedField> {
    let path = format!("{owner}.{}", field.name);

    let optional = match (&field.kind, field.presence) {
        (FieldKind::Map { .. }, Presence::Required) => {
            return Err(GenerateError::unsupported(
                &path,
                "map fields can't be marked required",
            ));
        }

        (_, Presence::Required) => false,
        (_, Presence::Optional) => true,
    };

    Ok(MappedField {
        name: naming::field_name(&field.name, options.field_naming),
        optional,
        type_expr: map_kind(&field.kind, &path, scope, symbols)?,
    })
}

pub fn map_reference(
    full_name: &str,
    path: &str,
    scope: &[String],
    symbols: &SymbolTable,
) -> Result<TypeExpr> {
    let symbol = symbols.resolve_from(full_name, scope, path)?;

    Ok(TypeExpr::Reference {
        namespace: symbol.namespace.clone(),
        name: symbol.name.clone(),
    })
}

fn map_kind(
    kind: &FieldKind,
    path: &str,
    scope: &[String],
    symbols: &SymbolTable,
) -> Result<TypeExpr> {
    match kind {
        FieldKind::Scalar(scalar) => Ok(TypeExpr::Primitive(map_scalar(*scalar))),

        FieldKind::Message(full_name) | FieldKind::Enum(full_name) => {
            map_reference(full_name, path, scope, symbols)
        }

        FieldKind::Repeated(element) => match element.as_ref() {
            FieldKind::Repeated(_) | FieldKind::Map { .. } => Err(GenerateError::unsupported(
                path,
                "repeated fields can't hold maps or other repeated fields",
            )),

            element => Ok(TypeExpr::Array(Box::new(map_kind(element, path, scope, symbols)?))),
        },

        FieldKind::Map { key, value } => {
            let key = match key.as_ref() {
                FieldKind::Scalar(ScalarKind::String | ScalarKind::Bool) => Primitive::String,

                FieldKind::Scalar(
                    ScalarKind::Int32
                    | ScalarKind::Int64
                    | ScalarKind::Uint32
                    | ScalarKind::Uint64
                    | ScalarKind::Sint32
                    | ScalarKind::Sint64
                    | ScalarKind::Fixed32
                    | ScalarKind::Fixed64
                    | ScalarKind::Sfixed32
                    | ScalarKind::Sfixed64,
                ) => Primitive::Number,

                other => {
                    return Err(GenerateError::unsupported(
                        path,
                        format!("{other:?} can't be used as a map key"),
                    ));
                }
            };

            let value = match value.as_ref() {
                FieldKind::Repeated(_) | FieldKind::Map { .. } => {
                    return Err(GenerateError::unsupported(
                        path,
                        "map values can't be maps or repeated fields",
                    ));
                }

                value => map_kind(value, path, scope, symbols)?,
            };

            Ok(TypeExpr::Index {
                key: Box::new(TypeExpr::Primitive(key)),
                value: Box::new(value),
            })
        }
    }
}

fn map_scalar(scalar: ScalarKind) -> Primitive {
    match scalar {
        ScalarKind::Double
        | ScalarKind::Float
        | ScalarKind::Int32
        | ScalarKind::Int64
        | ScalarKind::Uint32
        | ScalarKind::Uint64
        | ScalarKind::Sint32
        | ScalarKind::Sint64
        | ScalarKind::Fixed32
        | ScalarKind::Fixed64
        | ScalarKind::Sfixed32
        | ScalarKind::Sfixed64 => Primitive::Number,
        ScalarKind::Bool => Primitive::Boolean,
        ScalarKind::String => Primitive::String,
        ScalarKind::Bytes => Primitive::Bytes,
    }
}
