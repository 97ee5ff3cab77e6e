//! The schema graph the generator works on. It is loaded once per request from the
//! descriptors protoc hands us (see `loader`) and never mutated afterward.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    pub leading: Option<String>,
    pub trailing: Option<String>,
}

#[cfg(test)]
impl Comments {
    pub fn leading(text: &str) -> Self {
        Self {
            leading: Some(text.to_owned()),
            trailing: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaFile {
    /// Path as protoc knows it, e.g. `routeguide/route_guide.proto`.
    pub name: String,
    pub package: String,
    pub dependencies: Vec<String>,
    pub enums: Vec<EnumType>,
    pub messages: Vec<MessageType>,
    pub services: Vec<ServiceType>,
}

impl SchemaFile {
    pub fn package_segments(&self) -> Vec<String> {
        package_segments(&self.package)
    }
}

pub fn package_segments(package: &str) -> Vec<String> {
    package
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageType {
    /// Without the leading dot: `routeguide.Point`.
    pub full_name: String,
    pub name: String,
    pub fields: Vec<FieldType>,
    pub nested_messages: Vec<MessageType>,
    pub nested_enums: Vec<EnumType>,
    /// Synthesized by protoc for a `map<K, V>` field. Never declared on its own.
    pub map_entry: bool,
    pub comments: Comments,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumType {
    pub full_name: String,
    pub name: String,
    pub values: Vec<EnumValue>,
    pub comments: Comments,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// Fully-qualified name of the referenced message.
    Message(String),
    /// Fully-qualified name of the referenced enum.
    Enum(String),
    Map {
        key: Box<FieldKind>,
        value: Box<FieldKind>,
    },
    Repeated(Box<FieldKind>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Presence {
    #[default]
    Optional,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub name: String,
    pub kind: FieldKind,
    pub presence: Presence,
    pub comments: Comments,
}

#[cfg(test)]
impl FieldType {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            presence: Presence::Optional,
            comments: Comments::default(),
        }
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceType {
    pub full_name: String,
    pub name: String,
    pub methods: Vec<MethodType>,
    pub comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingMode {
    Unary,
    ClientStreaming,
    ServerStreaming,
    Bidirectional,
}

impl StreamingMode {
    pub fn from_flags(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => StreamingMode::Unary,
            (true, false) => StreamingMode::ClientStreaming,
            (false, true) => StreamingMode::ServerStreaming,
            (true, true) => StreamingMode::Bidirectional,
        }
    }

    pub fn streams_input(self) -> bool {
        matches!(
            self,
            StreamingMode::ClientStreaming | StreamingMode::Bidirectional
        )
    }

    pub fn streams_output(self) -> bool {
        matches!(
            self,
            StreamingMode::ServerStreaming | StreamingMode::Bidirectional
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodType {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    pub streaming: StreamingMode,
    pub comments: Comments,
}
