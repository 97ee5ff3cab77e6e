use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::FileDescriptorProto;

use crate::error::{GenerateError, Result};

/// `google.protobuf.compiler.CodeGeneratorRequest`, keeping every `proto_file` as
/// its undecoded bytes. Decoding straight into prost-types would throw away the custom
/// options we need.
#[derive(Clone, PartialEq, Message)]
pub struct RawCodeGeneratorRequest {
    #[prost(string, repeated, tag = "1")]
    pub file_to_generate: Vec<String>,

    #[prost(string, optional, tag = "2")]
    pub parameter: Option<String>,

    #[prost(bytes = "vec", repeated, tag = "15")]
    pub proto_file: Vec<Vec<u8>>,
}

/// `google.protobuf.FileDescriptorSet` with undecoded files.
#[derive(Clone, PartialEq, Message)]
pub struct RawFileDescriptorSet {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub file: Vec<Vec<u8>>,
}

impl RawCodeGeneratorRequest {
    pub fn decode_files(&self) -> Result<Vec<FileDescriptorProto>> {
        self.proto_file
            .iter()
            .map(|bytes| {
                FileDescriptorProto::decode(bytes.as_slice())
                    .map_err(|error| GenerateError::Descriptor(error.to_string()))
            })
            .collect()
    }

    /// Fails when the files don't form a complete, valid schema, e.g. when a type
    /// they reference is missing.
    pub fn descriptor_pool(&self) -> Result<DescriptorPool> {
        let bytes = RawFileDescriptorSet {
            file: self.proto_file.clone(),
        }
        .encode_to_vec();

        DescriptorPool::decode(bytes.as_slice())
            .map_err(|error| GenerateError::Descriptor(error.to_string()))
    }
}
