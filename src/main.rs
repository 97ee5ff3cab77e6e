use std::io::{Read, Write};

use color_eyre::eyre::WrapErr;
use prost::Message;
use tracing_subscriber::EnvFilter;

mod declarations;
mod emitter;
mod error;
mod generator;
mod loader;
mod naming;
mod options;
mod request;
mod schema;
mod string_builder;
mod symbols;
mod types;
mod well_known;


const LOG_ENV: &str = "PROTOC_GEN_TSTYPES_LOG";

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_logging();

    let stdin = std::io::stdin();
    let mut bytes: Vec<u8> = Vec::new();
    stdin
        .lock()
        .read_to_end(&mut bytes)
        .wrap_err("couldn't read to end of stdin")?;

    let request = request::RawCodeGeneratorRequest::decode(bytes.as_slice()).wrap_err(
        "couldn't parse CodeGeneratorRequest, make sure you're using this as a plugin to protoc",
    )?;

    let mut output = Vec::new();
    generator::generate_response(request)
        .encode(&mut output)
        .wrap_err("couldn't encode CodeGeneratorResponse")?;

    std::io::stdout()
        .write_all(&output)
        .wrap_err("couldn't write to stdout")?;

    Ok(())
}

// stdout belongs to protoc
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
