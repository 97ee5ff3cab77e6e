use std::collections::HashMap;

use crate::{
    error::{GenerateError, Result},
    naming,
    options::GeneratorOptions,
    schema::{Comments, EnumType, MessageType, MethodType, SchemaFile, ServiceType},
    symbols::SymbolTable,
    types::{self, TypeExpr},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Enum(EnumDeclaration),
    Interface(InterfaceDeclaration),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Enum(declaration) => &declaration.name,
            Declaration::Interface(declaration) => &declaration.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDeclaration {
    pub name: String,
    pub comments: Comments,
    pub values: Vec<Enumerant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerant {
    pub name: String,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDeclaration {
    pub name: String,
    pub comments: Comments,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub optional: bool,
    pub shape: MemberShape,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberShape {
    Property(TypeExpr),
    /// `(r:input) => output`
    Call { input: TypeExpr, output: TypeExpr },
}

/// Builds the declarations owned by a single file, in schema order: enums, then
/// messages (each preceded by its flattened nested types), then one interface per
/// service.
pub fn build_declarations(
    file: &SchemaFile,
    symbols: &SymbolTable,
    options: &GeneratorOptions,
) -> Result<Vec<Declaration>> {
    FileBuilder {
        symbols,
        options,
        scope: file.package_segments(),
        declarations: Vec::new(),
    }
    .build(file)
}

struct FileBuilder<'a> {
    symbols: &'a SymbolTable,
    options: &'a GeneratorOptions,
    scope: Vec<String>,
    declarations: Vec<Declaration>,
}

impl FileBuilder<'_> {
    fn build(mut self, file: &SchemaFile) -> Result<Vec<Declaration>> {
        for descriptor in &file.enums {
            self.add_enum(descriptor, None);
        }

        for message in &file.messages {
            self.add_message(message, None)?;
        }

        for service in &file.services {
            self.add_service(service)?;
        }

        Ok(self.declarations)
    }

    fn add_message(&mut self, message: &MessageType, enclosing: Option<&str>) -> Result<()> {
        if message.map_entry {
            return Ok(());
        }

        let name = naming::type_name(enclosing, &message.name);

        for nested_enum in &message.nested_enums {
            self.add_enum(nested_enum, Some(&name));
        }

        for nested_message in &message.nested_messages {
            self.add_message(nested_message, Some(&name))?;
        }

        let mut members = Vec::with_capacity(message.fields.len());
        let mut taken: HashMap<String, &str> = HashMap::new();

        for field in &message.fields {
            let mapped = types::map_field(
                field,
                &message.full_name,
                &self.scope,
                self.symbols,
                self.options,
            )?;

            if let Some(first) = taken.insert(mapped.name.clone(), &field.name) {
                return Err(GenerateError::NameCollision {
                    scope: message.full_name.clone(),
                    identifier: mapped.name,
                    first: first.to_owned(),
                    second: field.name.clone(),
                });
            }

            members.push(Member {
                name: mapped.name,
                optional: mapped.optional,
                shape: MemberShape::Property(mapped.type_expr),
                comments: field.comments.clone(),
            });
        }

        tracing::debug!(name = %name, fields = members.len(), "declared message");

        self.declarations.push(Declaration::Interface(InterfaceDeclaration {
            name,
            comments: message.comments.clone(),
            members,
        }));

        Ok(())
    }

    fn add_enum(&mut self, descriptor: &EnumType, enclosing: Option<&str>) {
        let name = naming::type_name(enclosing, &descriptor.name);

        tracing::debug!(name = %name, values = descriptor.values.len(), "declared enum");

        self.declarations.push(Declaration::Enum(EnumDeclaration {
            name,
            comments: descriptor.comments.clone(),
            values: descriptor
                .values
                .iter()
                .map(|value| {
                    tracing::trace!(value = %value.name, number = value.number, "enumerant");

                    Enumerant {
                        name: naming::enum_value_name(&value.name).to_owned(),
                        comments: value.comments.clone(),
                    }
                })
                .collect(),
        }));
    }

    fn add_service(&mut self, service: &ServiceType) -> Result<()> {
        let members = service
            .methods
            .iter()
            .map(|method| self.method_member(service, method))
            .collect::<Result<Vec<_>>>()?;

        self.declarations.push(Declaration::Interface(InterfaceDeclaration {
            name: naming::service_name(&service.name),
            comments: service.comments.clone(),
            members,
        }));

        Ok(())
    }

    fn method_member(&self, service: &ServiceType, method: &MethodType) -> Result<Member> {
        let path = format!("{}.{}", service.full_name, method.name);

        let mut input = types::map_reference(&method.input_type, &path, &self.scope, self.symbols)?;
        let mut output =
            types::map_reference(&method.output_type, &path, &self.scope, self.symbols)?;

        if method.streaming.streams_input() {
            input = TypeExpr::AsyncIterator(Box::new(input));
        }

        if method.streaming.streams_output() {
            output = TypeExpr::AsyncIterator(Box::new(output));
        }

        Ok(Member {
            name: method.name.clone(),
            optional: false,
            shape: MemberShape::Call { input, output },
            comments: method.comments.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        options::FieldNaming,
        schema::{EnumValue, FieldKind, FieldType, ScalarKind, StreamingMode},
        types::Primitive,
    };

    fn point() -> TypeExpr {
        TypeExpr::Reference {
            namespace: vec!["routeguide".to_owned()],
            name: "Point".to_owned(),
        }
    }

    fn file() -> SchemaFile {
        let method = |name: &str, streaming| MethodType {
            name: name.to_owned(),
            input_type: ".routeguide.Point".to_owned(),
            output_type: ".routeguide.Point".to_owned(),
            streaming,
            comments: Comments::default(),
        };

        SchemaFile {
            name: "route_guide.proto".to_owned(),
            package: "routeguide".to_owned(),
            messages: vec![MessageType {
                full_name: "routeguide.Point".to_owned(),
                name: "Point".to_owned(),
                fields: vec![FieldType::new(
                    "latitude",
                    FieldKind::Scalar(ScalarKind::Int32),
                )],
                nested_enums: vec![EnumType {
                    full_name: "routeguide.Point.Kind".to_owned(),
                    name: "Kind".to_owned(),
                    values: vec![EnumValue {
                        name: "WEB".to_owned(),
                        number: 7,
                        comments: Comments::default(),
                    }],
                    comments: Comments::default(),
                }],
                nested_messages: vec![MessageType {
                    full_name: "routeguide.Point.TagsEntry".to_owned(),
                    name: "TagsEntry".to_owned(),
                    map_entry: true,
                    ..Default::default()
                }],
                ..Default::default()
            }],
            services: vec![ServiceType {
                full_name: "routeguide.RouteGuide".to_owned(),
                name: "RouteGuide".to_owned(),
                methods: vec![
                    method("Unary", StreamingMode::Unary),
                    method("Client", StreamingMode::ClientStreaming),
                    method("Server", StreamingMode::ServerStreaming),
                    method("Both", StreamingMode::Bidirectional),
                ],
                comments: Comments::default(),
            }],
            ..Default::default()
        }
    }

    fn build(file: &SchemaFile, options: &GeneratorOptions) -> Result<Vec<Declaration>> {
        let symbols = SymbolTable::build(std::slice::from_ref(file))?;
        build_declarations(file, &symbols, options)
    }

    #[test]
    fn nested_types_come_first_and_map_entries_are_skipped() {
        let declarations = build(&file(), &GeneratorOptions::default()).unwrap();
        let names: Vec<&str> = declarations.iter().map(Declaration::name).collect();

        assert_eq!(names, ["Point_Kind", "Point", "RouteGuideService"]);
    }

    #[test]
    fn enum_values_use_their_names() {
        let declarations = build(&file(), &GeneratorOptions::default()).unwrap();

        let Declaration::Enum(kind) = &declarations[0] else {
            panic!("expected an enum, got {:?}", declarations[0]);
        };

        assert_eq!(kind.values[0].name, "WEB");
    }

    #[test]
    fn streaming_shapes() {
        let declarations = build(&file(), &GeneratorOptions::default()).unwrap();

        let Declaration::Interface(service) = &declarations[2] else {
            panic!("expected an interface, got {:?}", declarations[2]);
        };

        let stream = || TypeExpr::AsyncIterator(Box::new(point()));
        let shapes: Vec<&MemberShape> = service.members.iter().map(|member| &member.shape).collect();

        assert_eq!(
            shapes,
            [
                &MemberShape::Call {
                    input: point(),
                    output: point()
                },
                &MemberShape::Call {
                    input: stream(),
                    output: point()
                },
                &MemberShape::Call {
                    input: point(),
                    output: stream()
                },
                &MemberShape::Call {
                    input: stream(),
                    output: stream()
                },
            ]
        );
    }

    #[test]
    fn colliding_field_names() {
        let mut file = file();
        file.messages[0].fields = vec![
            FieldType::new("page_number", FieldKind::Scalar(ScalarKind::Int32)),
            FieldType::new("pageNumber", FieldKind::Scalar(ScalarKind::Int32)),
        ];

        assert!(build(&file, &GeneratorOptions::default()).is_ok());

        let camel_case = GeneratorOptions {
            field_naming: FieldNaming::CamelCase,
            ..Default::default()
        };

        assert_eq!(
            build(&file, &camel_case),
            Err(GenerateError::NameCollision {
                scope: "routeguide.Point".to_owned(),
                identifier: "pageNumber".to_owned(),
                first: "page_number".to_owned(),
                second: "pageNumber".to_owned(),
            })
        );
    }

    #[test]
    fn fields_are_optional_unless_required() {
        let mut file = file();
        file.messages[0].fields = vec![
            FieldType::new("a", FieldKind::Scalar(ScalarKind::String)),
            FieldType::new("b", FieldKind::Scalar(ScalarKind::String)).required(),
        ];

        let declarations = build(&file, &GeneratorOptions::default()).unwrap();
        let Declaration::Interface(point) = &declarations[1] else {
            panic!("expected an interface, got {:?}", declarations[1]);
        };

        assert_eq!(
            point.members,
            [
                Member {
                    name: "a".to_owned(),
                    optional: true,
                    shape: MemberShape::Property(TypeExpr::Primitive(Primitive::String)),
                    comments: Comments::default(),
                },
                Member {
                    name: "b".to_owned(),
                    optional: false,
                    shape: MemberShape::Property(TypeExpr::Primitive(Primitive::String)),
                    comments: Comments::default(),
                },
            ]
        );
    }
}
