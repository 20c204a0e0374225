use std::collections::HashSet;

use crate::model::{ArazzoDocument, Step, Workflow};
use crate::navigation::SymbolIndex;
use crate::validation::expressions::check_step_references;
use crate::validation::Finding;

const SOURCE_QUALIFIER: &str = "$sourceDescriptions.";

pub fn check_workflows(
    document: &ArazzoDocument,
    index: Option<&SymbolIndex>,
    out: &mut Vec<Finding>,
) {
    let workflow_ids = document
        .workflows
        .iter()
        .map(|workflow| workflow.workflow_id.as_str())
        .filter(|id| !id.trim().is_empty())
        .collect::<HashSet<_>>();
    // An empty index means discovery has not run yet, not that every
    // operation is missing.
    let index = index.filter(|index| index.count() > 0);

    let mut seen = HashSet::new();
    for workflow in &document.workflows {
        let id = workflow.workflow_id.trim();
        if id.is_empty() {
            out.push(Finding::error(
                workflow.line,
                "Workflow is missing required field: workflowId",
            ));
        } else if !seen.insert(id) {
            out.push(Finding::error(
                workflow.line,
                format!("Duplicate workflowId '{id}'"),
            ));
        }

        if workflow.steps.is_empty() {
            out.push(Finding::error(
                workflow.line,
                format!("Workflow '{id}' must have at least one step"),
            ));
        }

        check_steps(workflow, &workflow_ids, index, out);
    }
}

fn check_steps(
    workflow: &Workflow,
    workflow_ids: &HashSet<&str>,
    index: Option<&SymbolIndex>,
    out: &mut Vec<Finding>,
) {
    let mut seen = HashSet::new();
    for (position, step) in workflow.steps.iter().enumerate() {
        let step_id = step.step_id.trim();
        if step_id.is_empty() {
            out.push(Finding::error(
                step.line,
                format!(
                    "Step in workflow '{}' is missing required field: stepId",
                    workflow.workflow_id
                ),
            ));
        } else if !seen.insert(step_id) {
            out.push(Finding::error(
                step.line,
                format!(
                    "Duplicate stepId '{step_id}' in workflow '{}'",
                    workflow.workflow_id
                ),
            ));
        }

        match step.targets().len() {
            0 => out.push(Finding::error(
                step.line,
                format!(
                    "Step '{step_id}' must have one of operationId, operationPath, or workflowId"
                ),
            )),
            1 => {}
            _ => out.push(Finding::error(
                step.line,
                format!(
                    "Step '{step_id}' can only have one of operationId, operationPath, or workflowId"
                ),
            )),
        }

        check_step_references(workflow, position, workflow_ids, out);

        if let Some(index) = index {
            check_operation_resolves(step, index, out);
        }
    }
}

/// Strips the `$sourceDescriptions.<name>.` qualifier Arazzo allows when
/// several sources declare the same operation id.
pub fn bare_operation_id(operation_id: &str) -> &str {
    operation_id
        .strip_prefix(SOURCE_QUALIFIER)
        .and_then(|rest| rest.split_once('.'))
        .map_or(operation_id, |(_, bare)| bare)
}

fn check_operation_resolves(step: &Step, index: &SymbolIndex, out: &mut Vec<Finding>) {
    let Some(operation_id) = step
        .operation_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return;
    };

    let bare = bare_operation_id(operation_id);
    if index.lookup(bare).is_none() {
        out.push(Finding::warning(
            step.line,
            format!(
                "Operation '{bare}' used by step '{}' was not found in any indexed API description",
                step.step_id
            ),
        ));
    }
}
