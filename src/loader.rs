//! Turns protoc's descriptors into the schema graph.

use std::collections::HashMap;

use prost_reflect::{DescriptorPool, ExtensionDescriptor, Kind};
use prost_types::{
    field_descriptor_proto::{Label, Type},
    source_code_info::Location,
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    ServiceDescriptorProto,
};

use crate::{
    error::{GenerateError, Result},
    schema::{
        Comments, EnumType, EnumValue, FieldKind, FieldType, MessageType, MethodType, Presence,
        ScalarKind, SchemaFile, ServiceType, StreamingMode,
    },
};

// Field numbers from descriptor.proto, used to build source code info paths.
const FILE_MESSAGE_TYPE: i32 = 4;
const FILE_ENUM_TYPE: i32 = 5;
const FILE_SERVICE: i32 = 6;
const MESSAGE_FIELD: i32 = 2;
const MESSAGE_NESTED_TYPE: i32 = 3;
const MESSAGE_ENUM_TYPE: i32 = 4;
const ENUM_VALUE: i32 = 2;
const SERVICE_METHOD: i32 = 2;

const REQUIRED_OPTION: &str = "required";

/// Looks up the custom `required` field option, e.g. `[(tstypes.required) = true]`.
///
/// prost-types drops extensions while decoding, so the options are read back from a
/// descriptor pool built from the undecoded file bytes.
pub struct RequiredOptions {
    pool: Option<DescriptorPool>,
    extensions: Vec<ExtensionDescriptor>,
}

impl RequiredOptions {
    /// Only the proto2 `required` label counts.
    pub fn none() -> Self {
        Self {
            pool: None,
            extensions: Vec::new(),
        }
    }

    pub fn from_pool(pool: &DescriptorPool) -> Self {
        let extensions: Vec<_> = pool
            .all_extensions()
            .filter(|extension| {
                extension.name() == REQUIRED_OPTION
                    && extension.containing_message().full_name() == "google.protobuf.FieldOptions"
                    && matches!(extension.kind(), Kind::Bool)
            })
            .collect();

        tracing::debug!(
            extensions = extensions.len(),
            "found required field extensions"
        );

        Self {
            pool: Some(pool.clone()),
            extensions,
        }
    }

    fn is_required(&self, message_full_name: &str, field_name: &str) -> bool {
        if self.extensions.is_empty() {
            return false;
        }

        let Some(field) = self
            .pool
            .as_ref()
            .and_then(|pool| pool.get_message_by_name(message_full_name))
            .and_then(|message| message.get_field_by_name(field_name))
        else {
            return false;
        };

        let options = field.options();

        self.extensions.iter().any(|extension| {
            options.has_extension(extension)
                && options.get_extension(extension).as_bool() == Some(true)
        })
    }
}

pub fn load_files(
    files: &[FileDescriptorProto],
    required: &RequiredOptions,
) -> Result<Vec<SchemaFile>> {
    files
        .iter()
        .map(|file| FileLoader::new(file, required).load())
        .collect()
}

struct FileLoader<'a> {
    file: &'a FileDescriptorProto,
    locations: HashMap<&'a [i32], &'a Location>,
    required: &'a RequiredOptions,
}

impl<'a> FileLoader<'a> {
    fn new(file: &'a FileDescriptorProto, required: &'a RequiredOptions) -> Self {
        let locations = file
            .source_code_info
            .iter()
            .flat_map(|info| &info.location)
            .map(|location| (location.path.as_slice(), location))
            .collect();

        Self {
            file,
            locations,
            required,
        }
    }

    fn load(&self) -> Result<SchemaFile> {
        let package = self.file.package();

        tracing::debug!(file = self.file.name(), package, "loading file");

        Ok(SchemaFile {
            name: self.file.name().to_owned(),
            package: package.to_owned(),
            dependencies: self.file.dependency.clone(),

            enums: self
                .file
                .enum_type
                .iter()
                .enumerate()
                .map(|(index, descriptor)| {
                    self.load_enum(descriptor, package, vec![FILE_ENUM_TYPE, index as i32])
                })
                .collect(),

            messages: self
                .file
                .message_type
                .iter()
                .enumerate()
                .map(|(index, descriptor)| {
                    self.load_message(descriptor, package, vec![FILE_MESSAGE_TYPE, index as i32])
                })
                .collect::<Result<_>>()?,

            services: self
                .file
                .service
                .iter()
                .enumerate()
                .map(|(index, descriptor)| {
                    self.load_service(descriptor, package, vec![FILE_SERVICE, index as i32])
                })
                .collect(),
        })
    }

    fn comments(&self, path: &[i32]) -> Comments {
        match self.locations.get(path) {
            Some(location) => Comments {
                leading: location.leading_comments.clone(),
                trailing: location.trailing_comments.clone(),
            },
            None => Comments::default(),
        }
    }

    fn load_message(
        &self,
        descriptor: &DescriptorProto,
        scope: &str,
        path: Vec<i32>,
    ) -> Result<MessageType> {
        let full_name = qualify(scope, descriptor.name());

        let fields = descriptor
            .field
            .iter()
            .enumerate()
            .map(|(index, field)| {
                self.load_field(
                    field,
                    descriptor,
                    &full_name,
                    child_path(&path, MESSAGE_FIELD, index),
                )
            })
            .collect::<Result<_>>()?;

        let nested_messages = descriptor
            .nested_type
            .iter()
            .enumerate()
            .map(|(index, nested_type)| {
                self.load_message(
                    nested_type,
                    &full_name,
                    child_path(&path, MESSAGE_NESTED_TYPE, index),
                )
            })
            .collect::<Result<_>>()?;

        let nested_enums = descriptor
            .enum_type
            .iter()
            .enumerate()
            .map(|(index, nested_enum)| {
                self.load_enum(
                    nested_enum,
                    &full_name,
                    child_path(&path, MESSAGE_ENUM_TYPE, index),
                )
            })
            .collect();

        Ok(MessageType {
            name: descriptor.name().to_owned(),
            fields,
            nested_messages,
            nested_enums,
            map_entry: is_map_entry(descriptor),
            comments: self.comments(&path),
            full_name,
        })
    }

    fn load_field(
        &self,
        field: &FieldDescriptorProto,
        message: &DescriptorProto,
        message_full_name: &str,
        path: Vec<i32>,
    ) -> Result<FieldType> {
        let field_path = format!("{message_full_name}.{}", field.name());
        let single = single_kind(field);

        let kind = if field.label() == Label::Repeated {
            match map_entry_of(field, message, message_full_name) {
                Some(entry) => {
                    let key = entry_field(entry, 1, &field_path)?;
                    let value = entry_field(entry, 2, &field_path)?;

                    FieldKind::Map {
                        key: Box::new(single_kind(key)),
                        value: Box::new(single_kind(value)),
                    }
                }

                None => FieldKind::Repeated(Box::new(single)),
            }
        } else {
            single
        };

        let presence = if field.label() == Label::Required
            || self.required.is_required(message_full_name, field.name())
        {
            Presence::Required
        } else {
            Presence::Optional
        };

        Ok(FieldType {
            name: field.name().to_owned(),
            kind,
            presence,
            comments: self.comments(&path),
        })
    }

    fn load_enum(&self, descriptor: &EnumDescriptorProto, scope: &str, path: Vec<i32>) -> EnumType {
        EnumType {
            full_name: qualify(scope, descriptor.name()),
            name: descriptor.name().to_owned(),
            values: descriptor
                .value
                .iter()
                .enumerate()
                .map(|(index, value)| EnumValue {
                    name: value.name().to_owned(),
                    number: value.number(),
                    comments: self.comments(&child_path(&path, ENUM_VALUE, index)),
                })
                .collect(),
            comments: self.comments(&path),
        }
    }

    fn load_service(
        &self,
        descriptor: &ServiceDescriptorProto,
        scope: &str,
        path: Vec<i32>,
    ) -> ServiceType {
        ServiceType {
            full_name: qualify(scope, descriptor.name()),
            name: descriptor.name().to_owned(),
            methods: descriptor
                .method
                .iter()
                .enumerate()
                .map(|(index, method)| MethodType {
                    name: method.name().to_owned(),
                    input_type: method.input_type().to_owned(),
                    output_type: method.output_type().to_owned(),
                    streaming: StreamingMode::from_flags(
                        method.client_streaming(),
                        method.server_streaming(),
                    ),
                    comments: self.comments(&child_path(&path, SERVICE_METHOD, index)),
                })
                .collect(),
            comments: self.comments(&path),
        }
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_owned()
    } else {
        format!("{scope}.{name}")
    }
}

fn child_path(path: &[i32], field_number: i32, index: usize) -> Vec<i32> {
    let mut path = path.to_vec();
    path.push(field_number);
    path.push(index as i32);
    path
}

fn is_map_entry(descriptor: &DescriptorProto) -> bool {
    descriptor
        .options
        .as_ref()
        .is_some_and(|options| options.map_entry())
}

// protoc always nests the synthesized entry inside the message declaring the map
fn map_entry_of<'a>(
    field: &FieldDescriptorProto,
    message: &'a DescriptorProto,
    message_full_name: &str,
) -> Option<&'a DescriptorProto> {
    if field.r#type() != Type::Message {
        return None;
    }

    let entry_name = field
        .type_name()
        .strip_prefix('.')?
        .strip_prefix(message_full_name)?
        .strip_prefix('.')?;

    message
        .nested_type
        .iter()
        .find(|nested_type| nested_type.name() == entry_name && is_map_entry(nested_type))
}

fn entry_field<'a>(
    entry: &'a DescriptorProto,
    number: i32,
    field_path: &str,
) -> Result<&'a FieldDescriptorProto> {
    entry
        .field
        .iter()
        .find(|field| field.number() == number)
        .ok_or_else(|| {
            GenerateError::unsupported(
                field_path,
                format!("map entry {} has no field {number}", entry.name()),
            )
        })
}

fn single_kind(field: &FieldDescriptorProto) -> FieldKind {
    let type_name = || field.type_name().trim_start_matches('.').to_owned();

    match field.r#type() {
        Type::Double => FieldKind::Scalar(ScalarKind::Double),
        Type::Float => FieldKind::Scalar(ScalarKind::Float),
        Type::Int64 => FieldKind::Scalar(ScalarKind::Int64),
        Type::Uint64 => FieldKind::Scalar(ScalarKind::Uint64),
        Type::Int32 => FieldKind::Scalar(ScalarKind::Int32),
        Type::Fixed64 => FieldKind::Scalar(ScalarKind::Fixed64),
        Type::Fixed32 => FieldKind::Scalar(ScalarKind::Fixed32),
        Type::Bool => FieldKind::Scalar(ScalarKind::Bool),
        Type::String => FieldKind::Scalar(ScalarKind::String),
        Type::Bytes => FieldKind::Scalar(ScalarKind::Bytes),
        Type::Uint32 => FieldKind::Scalar(ScalarKind::Uint32),
        Type::Sfixed32 => FieldKind::Scalar(ScalarKind::Sfixed32),
        Type::Sfixed64 => FieldKind::Scalar(ScalarKind::Sfixed64),
        Type::Sint32 => FieldKind::Scalar(ScalarKind::Sint32),
        Type::Sint64 => FieldKind::Scalar(ScalarKind::Sint64),
        // a group's body is an ordinary nested message
        Type::Message | Type::Group => FieldKind::Message(type_name()),
        Type::Enum => FieldKind::Enum(type_name()),
    }
}

#[cfg(test)]
mod tests {
    use prost_types::{source_code_info, MessageOptions, SourceCodeInfo};

    use super::*;

    fn field(
        name: &str,
        number: i32,
        label: Label,
        r#type: Type,
        type_name: &str,
    ) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_owned()),
            number: Some(number),
            label: Some(label as i32),
            r#type: Some(r#type as i32),
            type_name: (!type_name.is_empty()).then(|| type_name.to_owned()),
            ..Default::default()
        }
    }

    fn file() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("shop.proto".to_owned()),
            package: Some("acme.shop".to_owned()),
            message_type: vec![DescriptorProto {
                name: Some("Order".to_owned()),
                field: vec![
                    field("id", 1, Label::Required, Type::String, ""),
                    field("tags", 2, Label::Repeated, Type::String, ""),
                    field("stock", 3, Label::Repeated, Type::Message, ".acme.shop.Order.StockEntry"),
                    field("status", 4, Label::Optional, Type::Enum, ".acme.shop.Order.Status"),
                ],
                nested_type: vec![DescriptorProto {
                    name: Some("StockEntry".to_owned()),
                    field: vec![
                        field("key", 1, Label::Optional, Type::String, ""),
                        field("value", 2, Label::Optional, Type::Int32, ""),
                    ],
                    options: Some(MessageOptions {
                        map_entry: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                enum_type: vec![EnumDescriptorProto {
                    name: Some("Status".to_owned()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            source_code_info: Some(SourceCodeInfo {
                location: vec![source_code_info::Location {
                    path: vec![FILE_MESSAGE_TYPE, 0, MESSAGE_FIELD, 1],
                    leading_comments: Some(" Free-form tags.\n".to_owned()),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn loads_fields() {
        let files = load_files(&[file()], &RequiredOptions::none()).unwrap();
        let order = &files[0].messages[0];

        assert_eq!(order.full_name, "acme.shop.Order");
        assert_eq!(order.nested_enums[0].full_name, "acme.shop.Order.Status");
        assert!(order.nested_messages[0].map_entry);

        assert_eq!(order.fields[0].presence, Presence::Required);
        assert_eq!(order.fields[1].presence, Presence::Optional);

        assert_eq!(
            order.fields[1].kind,
            FieldKind::Repeated(Box::new(FieldKind::Scalar(ScalarKind::String)))
        );
        assert_eq!(
            order.fields[1].comments.leading.as_deref(),
            Some(" Free-form tags.\n")
        );

        assert_eq!(
            order.fields[2].kind,
            FieldKind::Map {
                key: Box::new(FieldKind::Scalar(ScalarKind::String)),
                value: Box::new(FieldKind::Scalar(ScalarKind::Int32)),
            }
        );

        assert_eq!(
            order.fields[3].kind,
            FieldKind::Enum("acme.shop.Order.Status".to_owned())
        );
    }

    #[test]
    fn same_named_entry_elsewhere_is_not_a_map() {
        let mut file = file();
        file.message_type[0].field.push(field(
            "restock",
            5,
            Label::Repeated,
            Type::Message,
            ".acme.other.StockEntry",
        ));

        let files = load_files(&[file], &RequiredOptions::none()).unwrap();

        assert_eq!(
            files[0].messages[0].fields[4].kind,
            FieldKind::Repeated(Box::new(FieldKind::Message(
                "acme.other.StockEntry".to_owned()
            )))
        );
    }

    #[test]
    fn groups_are_messages() {
        let mut file = file();
        file.message_type[0].field.push(field(
            "legacy",
            5,
            Label::Optional,
            Type::Group,
            ".acme.shop.Order.Legacy",
        ));

        let files = load_files(&[file], &RequiredOptions::none()).unwrap();

        assert_eq!(
            files[0].messages[0].fields[4].kind,
            FieldKind::Message("acme.shop.Order.Legacy".to_owned())
        );
    }
}
