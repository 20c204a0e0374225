use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::model::{ArazzoDocument, STEP_POSITION_PREFIX, WORKFLOW_POSITION_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// `{` as the first non-whitespace character means JSON; anything else is
    /// treated as YAML.
    pub fn sniff(text: &str) -> Self {
        if text.trim_start().starts_with('{') {
            Self::Json
        } else {
            Self::Yaml
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Result<ArazzoDocument> {
        if text.trim().is_empty() {
            return Err(Error::Parse("empty document".to_owned()));
        }

        let mut document = match SourceFormat::sniff(text) {
            SourceFormat::Json => serde_json::from_str::<ArazzoDocument>(text)
                .map_err(|err| Error::Parse(format!("invalid JSON: {err}")))?,
            SourceFormat::Yaml => serde_yaml::from_str::<ArazzoDocument>(text)
                .map_err(|err| Error::Parse(format!("invalid YAML: {err}")))?,
        };

        document.positions = scan_positions(text);

        let positions = &document.positions;
        for workflow in &mut document.workflows {
            workflow.line = lookup(positions, WORKFLOW_POSITION_PREFIX, &workflow.workflow_id);
            for step in &mut workflow.steps {
                step.line = lookup(positions, STEP_POSITION_PREFIX, &step.step_id);
            }
        }

        Ok(document)
    }
}

fn lookup(positions: &HashMap<String, usize>, prefix: &str, id: &str) -> usize {
    positions
        .get(&format!("{prefix}{id}"))
        .copied()
        .unwrap_or(0)
}

fn workflow_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| id_line_pattern("workflowId"))
}

fn step_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| id_line_pattern("stepId"))
}

// Group 1 is everything before the key, so its length is the key column.
fn id_line_pattern(key: &str) -> Regex {
    Regex::new(&format!(
        r#"^(\s*(?:-\s+)?(?:\{{\s*)?["']?){key}["']?\s*:\s*["']?([^"'\s,#{{}}]+)"#
    ))
    .expect("built-in id pattern compiles")
}

struct IdMatch<'a> {
    line: usize,
    column: usize,
    id: &'a str,
}

fn collect_matches<'a>(pattern: &Regex, text: &'a str) -> Vec<IdMatch<'a>> {
    text.lines()
        .enumerate()
        .filter_map(|(line, content)| {
            let captures = pattern.captures(content)?;
            let column = captures.get(1).map_or(0, |prefix| prefix.as_str().len());
            let id = captures.get(2)?.as_str();
            Some(IdMatch { line, column, id })
        })
        .collect()
}

/// Builds the `workflow:<id>` / `step:<id>` line map. Only keys at the
/// shallowest column are declarations; the last one for an id wins.
pub fn scan_positions(text: &str) -> HashMap<String, usize> {
    let mut positions = HashMap::new();
    for (pattern, prefix) in [
        (workflow_id_pattern(), WORKFLOW_POSITION_PREFIX),
        (step_id_pattern(), STEP_POSITION_PREFIX),
    ] {
        let matches = collect_matches(pattern, text);
        let Some(declaration_column) = matches.iter().map(|found| found.column).min() else {
            continue;
        };
        for found in matches
            .iter()
            .filter(|found| found.column == declaration_column)
        {
            positions.insert(format!("{prefix}{}", found.id), found.line);
        }
    }
    positions
}
