use prost_types::compiler::{
    code_generator_response::{Feature, File},
    CodeGeneratorResponse,
};

use crate::{
    declarations::build_declarations,
    emitter::{emit_file, output_file_name},
    error::{GenerateError, Result},
    loader::{self, RequiredOptions},
    options::GeneratorOptions,
    request::RawCodeGeneratorRequest,
    schema::SchemaFile,
    symbols::SymbolTable,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub content: String,
}

pub fn generate_response(request: RawCodeGeneratorRequest) -> CodeGeneratorResponse {
    match generate_request(&request) {
        Ok(files) => {
            tracing::info!(files = files.len(), "generated declarations");

            CodeGeneratorResponse {
                error: None,
                supported_features: Some(Feature::Proto3Optional as u64),
                file: files
                    .into_iter()
                    .map(|file| File {
                        name: Some(file.name),
                        content: Some(file.content),
                        ..Default::default()
                    })
                    .collect(),
            }
        }

        Err(error) => {
            tracing::error!(%error, "generation failed");

            CodeGeneratorResponse {
                error: Some(error.to_string()),
                supported_features: Some(Feature::Proto3Optional as u64),
                file: Vec::new(),
            }
        }
    }
}

fn generate_request(request: &RawCodeGeneratorRequest) -> Result<Vec<OutputFile>> {
    let options = GeneratorOptions::from_parameter(request.parameter.as_deref())?;
    let descriptors = request.decode_files()?;

    let pool = request.descriptor_pool();
    let required = match &pool {
        Ok(pool) => RequiredOptions::from_pool(pool),
        Err(error) => {
            tracing::debug!(%error, "couldn't build descriptor pool");
            RequiredOptions::none()
        }
    };

    let files = loader::load_files(&descriptors, &required)?;
    let output = generate(&files, &request.file_to_generate, &options)?;

    // Our own resolution reports broken schemas more precisely, so a pool error only
    // surfaces when nothing else went wrong.
    pool?;

    Ok(output)
}

/// Generates one declaration file for every file in `file_to_generate`. `files` must
/// contain those files and everything they import.
pub fn generate(
    files: &[SchemaFile],
    file_to_generate: &[String],
    options: &GeneratorOptions,
) -> Result<Vec<OutputFile>> {
    let symbols = SymbolTable::build(files)?;

    // resolve every loaded file, not only the requested ones
    let declarations = files
        .iter()
        .map(|file| build_declarations(file, &symbols, options))
        .collect::<Result<Vec<_>>>()?;

    file_to_generate
        .iter()
        .map(|name| {
            let index = files
                .iter()
                .position(|file| &file.name == name)
                .ok_or_else(|| GenerateError::UnknownFile(name.clone()))?;

            let file = &files[index];
            let file_declarations = &declarations[index];

            tracing::debug!(
                file = %file.name,
                imports = file.dependencies.len(),
                declarations = file_declarations.len(),
                "emitting file"
            );

            Ok(OutputFile {
                name: output_file_name(file),
                content: emit_file(file, file_declarations, options),
            })
        })
        .collect()
}
