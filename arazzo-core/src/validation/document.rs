use crate::model::ArazzoDocument;
use crate::validation::{Finding, SUPPORTED_VERSIONS};

const SOURCE_TYPES: [&str; 2] = ["openapi", "arazzo"];

pub fn check_document(document: &ArazzoDocument, out: &mut Vec<Finding>) {
    let version = document.arazzo.trim();
    if version.is_empty() {
        out.push(Finding::error(0, "Missing required field: arazzo"));
    } else if !SUPPORTED_VERSIONS.contains(&version) {
        out.push(Finding::error(
            0,
            format!(
                "Unsupported Arazzo version '{version}' (expected one of {})",
                SUPPORTED_VERSIONS.join(", ")
            ),
        ));
    }

    if document.info.title.trim().is_empty() {
        out.push(Finding::error(0, "Missing required field: info.title"));
    }
    if document.info.version.trim().is_empty() {
        out.push(Finding::error(0, "Missing required field: info.version"));
    }
    if document.source_descriptions.is_empty() {
        out.push(Finding::error(0, "Missing required field: sourceDescriptions"));
    }
    if document.workflows.is_empty() {
        out.push(Finding::error(0, "Missing required field: workflows"));
    }
}

pub fn check_source_descriptions(document: &ArazzoDocument, out: &mut Vec<Finding>) {
    for (position, source) in document.source_descriptions.iter().enumerate() {
        let name = source.name.trim();
        let label = if name.is_empty() {
            format!("#{}", position + 1)
        } else {
            format!("'{name}'")
        };

        if name.is_empty() {
            out.push(Finding::error(
                0,
                format!("Source description {label} is missing required field: name"),
            ));
        }
        if source.url.trim().is_empty() {
            out.push(Finding::error(
                0,
                format!("Source description {label} is missing required field: url"),
            ));
        }

        let kind = source.kind.trim();
        if !kind.is_empty() && !SOURCE_TYPES.contains(&kind) {
            out.push(Finding::error(
                0,
                format!(
                    "Source description {label} has invalid type '{kind}' (expected openapi or arazzo)"
                ),
            ));
        }
    }
}
