use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::navigation::types::{OperationRecord, ParsedOpenApiFile};
use crate::navigation::uri::{file_name, uri_to_path};

const HTTP_METHODS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "head", "options", "trace",
];

#[derive(Debug, Clone)]
pub struct Extraction {
    pub file: ParsedOpenApiFile,
    pub warning: Option<String>,
}

pub fn extract(file_uri: &str) -> Result<Extraction> {
    let path = uri_to_path(file_uri)?;
    let text = std::fs::read_to_string(&path).map_err(|err| {
        Error::Indexing(format!("failed to read '{}': {err}", path.display()))
    })?;

    let is_json = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));

    extract_from_text(file_uri, &text, is_json)
}

pub fn extract_from_text(file_uri: &str, text: &str, is_json: bool) -> Result<Extraction> {
    let root = decode(text, is_json)
        .map_err(|reason| Error::Indexing(format!("failed to decode '{file_uri}': {reason}")))?;

    let mut file = ParsedOpenApiFile::empty(file_uri);
    file.version = string_at(&root, &["openapi"]);
    file.title = string_at(&root, &["info", "title"]);
    file.description = string_at(&root, &["info", "description"]);

    let Some(paths) = root.get("paths").and_then(Value::as_mapping) else {
        return Ok(Extraction {
            file,
            warning: Some(format!("'{file_uri}' has no paths object")),
        });
    };

    let display_name = file_name(file_uri);
    for (route, item) in paths {
        let Some(route) = route.as_str() else {
            continue;
        };
        let Some(item) = item.as_mapping() else {
            continue;
        };

        for (method, operation) in item {
            let Some(method) = method
                .as_str()
                .filter(|method| HTTP_METHODS.iter().any(|known| known.eq_ignore_ascii_case(method)))
            else {
                continue;
            };

            let operation_id = string_at(operation, &["operationId"]);
            if operation_id.is_empty() {
                continue;
            }

            file.operations.push(OperationRecord {
                line: operation_line(text, &operation_id).unwrap_or(0),
                operation_id,
                method: method.to_ascii_uppercase(),
                path: route.to_owned(),
                summary: string_at(operation, &["summary"]),
                description: string_at(operation, &["description"]),
                file_uri: file_uri.to_owned(),
                file_name: display_name.clone(),
                tags: operation
                    .get("tags")
                    .and_then(Value::as_sequence)
                    .map(|tags| {
                        tags.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_owned)
                            .collect()
                    })
                    .unwrap_or_default(),
            });
        }
    }

    Ok(Extraction {
        file,
        warning: None,
    })
}

fn decode(text: &str, is_json: bool) -> std::result::Result<Value, String> {
    if is_json {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|err| format!("invalid JSON: {err}"))?;
        return serde_yaml::to_value(json).map_err(|err| err.to_string());
    }
    serde_yaml::from_str(text).map_err(|err| format!("invalid YAML: {err}"))
}

fn string_at(value: &Value, keys: &[&str]) -> String {
    let mut current = value;
    for key in keys {
        match current.get(*key) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    match current {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

/// Zero-based line of the `operationId` declaration whose value is exactly `id`.
pub fn operation_line(text: &str, id: &str) -> Option<usize> {
    text.lines()
        .position(|line| declared_operation_id(line) == Some(id))
}

pub(crate) fn declared_operation_id(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once("operationId")?;
    let rest = rest.trim_start_matches(['"', '\'']).trim_start();
    let rest = rest.strip_prefix(':')?.trim_start();
    let rest = rest.trim_start_matches(['"', '\'']);
    let end = rest
        .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ',' | '}' | '#'))
        .unwrap_or(rest.len());
    let value = &rest[..end];
    (!value.is_empty()).then_some(value)
}
