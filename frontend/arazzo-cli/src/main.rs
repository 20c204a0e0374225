mod cli;
mod renderer;

use std::path::Path;

use arazzo_core::navigation::path_to_uri;
use arazzo_core::{Error, LanguageSession, Validator};
use serde::Serialize;

use crate::cli::{Command, OutputFormat};
use crate::renderer::Renderer;

#[derive(Serialize)]
struct CliJsonErrorEnvelope<'a> {
    status: &'static str,
    code: &'static str,
    message: String,
    command: &'a str,
}

fn main() {
    let args = cli::Cli::parse_args();
    let output = args.output;
    let name = command_name(&args.command);

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            match output {
                OutputFormat::Text => eprintln!("arazzo failed: {error}"),
                OutputFormat::Json => print_json_error_envelope(name, &error),
            }
            std::process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when the document has error findings.
fn run(args: cli::Cli) -> arazzo_core::Result<bool> {
    let config = arazzo_core::config::load(args.config.as_deref())?;
    arazzo_core::logging::init_tracing(&config.log_level);
    let renderer = Renderer::new(args.output);
    let session = LanguageSession::new(config);

    match args.command {
        Command::Validate { file, offline } => {
            let uri = document_uri(&file)?;
            if !offline {
                session.indexer().build_index(&uri)?;
            }
            let document = session.get_model(&uri)?;
            let validator = if offline {
                Validator::new()
            } else {
                Validator::with_index(session.index().clone())
            };
            let findings = validator.validate(&document);
            renderer.render_findings(&file.display().to_string(), &findings)?;
            Ok(!findings.iter().any(|finding| finding.is_error()))
        }
        Command::Index { file } => {
            let uri = document_uri(&file)?;
            let report = session.indexer().build_index(&uri)?;
            tracing::debug!(?report, "index command finished");
            renderer.render_index(&report, &session.index().list_all())?;
            Ok(true)
        }
        Command::Lookup { file, operation_id } => {
            let uri = document_uri(&file)?;
            session.indexer().build_index(&uri)?;
            let bare = arazzo_core::validation::workflows::bare_operation_id(&operation_id);
            let record = session.index().lookup(bare).ok_or_else(|| {
                Error::NotFound(format!(
                    "operation '{bare}' is not declared in any API description near '{}'",
                    file.display()
                ))
            })?;
            renderer.render_record(&record)?;
            Ok(true)
        }
        Command::Model { file } => {
            let document = session.get_model(&document_uri(&file)?)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(true)
        }
    }
}

fn document_uri(file: &Path) -> arazzo_core::Result<String> {
    if file.is_absolute() {
        return path_to_uri(file);
    }
    path_to_uri(&std::env::current_dir()?.join(file))
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Validate { .. } => "validate",
        Command::Index { .. } => "index",
        Command::Lookup { .. } => "lookup",
        Command::Model { .. } => "model",
    }
}

fn print_json_error_envelope(command: &str, error: &Error) {
    let envelope = CliJsonErrorEnvelope {
        status: "error",
        code: error_code(error),
        message: error.to_string(),
        command,
    };
    match serde_json::to_string(&envelope) {
        Ok(json) => println!("{json}"),
        Err(_) => eprintln!("arazzo failed: {error}"),
    }
}

fn error_code(error: &Error) -> &'static str {
    match error {
        Error::Parse(_) => "parse_error",
        Error::InvalidUri(_) => "invalid_uri",
        Error::Discovery(_) => "discovery_error",
        Error::Indexing(_) => "indexing_error",
        Error::Config(_) => "config_error",
        Error::NotFound(_) => "not_found",
        Error::Serialization(_) => "serialization_error",
        Error::Io(_) => "io_error",
    }
}
