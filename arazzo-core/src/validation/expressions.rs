use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::model::{Step, Workflow};
use crate::validation::Finding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionPrefix {
    Inputs,
    Steps,
    Workflows,
    Outputs,
    Components,
    SourceDescriptions,
    Response,
    Request,
    StatusCode,
    Url,
    Method,
}

impl ExpressionPrefix {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "inputs" => Some(Self::Inputs),
            "steps" => Some(Self::Steps),
            "workflows" => Some(Self::Workflows),
            "outputs" => Some(Self::Outputs),
            "components" => Some(Self::Components),
            "sourceDescriptions" => Some(Self::SourceDescriptions),
            "response" => Some(Self::Response),
            "request" => Some(Self::Request),
            "statusCode" => Some(Self::StatusCode),
            "url" => Some(Self::Url),
            "method" => Some(Self::Method),
            _ => None,
        }
    }
}

/// One `$prefix.reference` occurrence inside a string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeExpression<'a> {
    pub prefix: ExpressionPrefix,
    pub reference: &'a str,
}

impl<'a> RuntimeExpression<'a> {
    pub fn target(&self) -> Option<&'a str> {
        let head = self
            .reference
            .split_once('.')
            .map_or(self.reference, |(head, _)| head);
        (!head.is_empty()).then_some(head)
    }
}

fn expression_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\$(inputs|steps|workflows|outputs|components|sourceDescriptions|response|request|statusCode|url|method)(?:\.([A-Za-z0-9_\-.\[\]#/]+))?",
        )
        .expect("built-in runtime expression pattern compiles")
    })
}

pub fn scan_runtime_expressions(value: &str) -> Vec<RuntimeExpression<'_>> {
    expression_pattern()
        .captures_iter(value)
        .filter_map(|captures| {
            let prefix = ExpressionPrefix::parse(captures.get(1)?.as_str())?;
            let reference = captures
                .get(2)
                .map_or("", |reference| reference.as_str().trim_end_matches('.'));
            Some(RuntimeExpression { prefix, reference })
        })
        .collect()
}

/// Whether `target` is declared strictly before the step at `current`.
/// The scan stops at `current`, so self and forward references fail.
fn declared_before(workflow: &Workflow, current: usize, target: &str) -> bool {
    for (position, step) in workflow.steps.iter().enumerate() {
        if position == current {
            return false;
        }
        if step.step_id == target {
            return true;
        }
    }
    false
}

fn string_parameter_values(step: &Step) -> impl Iterator<Item = &str> {
    step.parameters
        .iter()
        .filter_map(|parameter| parameter.value.as_str())
}

pub fn check_step_references(
    workflow: &Workflow,
    current: usize,
    workflow_ids: &HashSet<&str>,
    out: &mut Vec<Finding>,
) {
    let step = &workflow.steps[current];
    for value in string_parameter_values(step) {
        for expression in scan_runtime_expressions(value) {
            let Some(target) = expression.target() else {
                continue;
            };
            match expression.prefix {
                ExpressionPrefix::Steps if !declared_before(workflow, current, target) => {
                    out.push(Finding::error(
                        step.line,
                        format!(
                            "Step '{}' references step '{target}' which is not defined before it in workflow '{}'",
                            step.step_id, workflow.workflow_id
                        ),
                    ));
                }
                ExpressionPrefix::Workflows if !workflow_ids.contains(target) => {
                    out.push(Finding::error(
                        step.line,
                        format!(
                            "Step '{}' references unknown workflow '{target}'",
                            step.step_id
                        ),
                    ));
                }
                _ => {}
            }
        }
    }
}
