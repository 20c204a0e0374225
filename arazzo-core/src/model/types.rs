use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub const WORKFLOW_POSITION_PREFIX: &str = "workflow:";
pub const STEP_POSITION_PREFIX: &str = "step:";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArazzoDocument {
    #[serde(deserialize_with = "scalar_string")]
    pub arazzo: String,
    pub info: Info,
    pub source_descriptions: Vec<SourceDescription>,
    pub workflows: Vec<Workflow>,
    pub components: Option<Components>,
    /// Zero-based line of each `workflow:<id>` / `step:<id>` key found in the
    /// raw text.
    #[serde(skip_deserializing)]
    pub positions: HashMap<String, usize>,
}

impl ArazzoDocument {
    pub fn line_of(&self, key: &str) -> usize {
        self.positions.get(key).copied().unwrap_or(0)
    }

    pub fn workflow_line(&self, workflow_id: &str) -> usize {
        self.line_of(&format!("{WORKFLOW_POSITION_PREFIX}{workflow_id}"))
    }

    pub fn step_line(&self, step_id: &str) -> usize {
        self.line_of(&format!("{STEP_POSITION_PREFIX}{step_id}"))
    }

    pub fn workflow(&self, workflow_id: &str) -> Option<&Workflow> {
        self.workflows
            .iter()
            .find(|workflow| workflow.workflow_id == workflow_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    #[serde(deserialize_with = "scalar_string")]
    pub title: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(deserialize_with = "scalar_string")]
    pub summary: String,
    #[serde(deserialize_with = "scalar_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDescription {
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(deserialize_with = "scalar_string")]
    pub url: String,
    #[serde(rename = "type", deserialize_with = "scalar_string")]
    pub kind: String,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Workflow {
    #[serde(deserialize_with = "scalar_string")]
    pub workflow_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub inputs: Option<Value>,
    pub depends_on: Vec<String>,
    pub steps: Vec<Step>,
    pub parameters: Vec<Parameter>,
    pub success_actions: Vec<Action>,
    pub failure_actions: Vec<Action>,
    pub outputs: BTreeMap<String, Value>,
    #[serde(skip_deserializing)]
    pub line: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Step {
    #[serde(deserialize_with = "scalar_string")]
    pub step_id: String,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub operation_path: Option<String>,
    pub workflow_id: Option<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub success_criteria: Vec<Criterion>,
    pub on_success: Vec<Action>,
    pub on_failure: Vec<Action>,
    pub outputs: BTreeMap<String, Value>,
    #[serde(skip_deserializing)]
    pub line: usize,
}

impl Step {
    /// The targets this step declares, in `operationId`, `operationPath`,
    /// `workflowId` order. Empty strings count as absent.
    pub fn targets(&self) -> Vec<(&'static str, &str)> {
        [
            ("operationId", self.operation_id.as_deref()),
            ("operationPath", self.operation_path.as_deref()),
            ("workflowId", self.workflow_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .filter(|value| !value.trim().is_empty())
                .map(|value| (field, value))
        })
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub value: Value,
    /// Set when the entry is a reusable `$components.parameters.*` reference.
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestBody {
    pub content_type: Option<String>,
    pub payload: Value,
    pub replacements: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Criterion {
    pub condition: String,
    pub context: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Action {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub workflow_id: Option<String>,
    pub step_id: Option<String>,
    pub retry_after: Option<f64>,
    pub retry_limit: Option<u64>,
    pub criteria: Vec<Criterion>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Components {
    pub inputs: BTreeMap<String, Value>,
    pub parameters: BTreeMap<String, Value>,
    pub success_actions: BTreeMap<String, Value>,
    pub failure_actions: BTreeMap<String, Value>,
}

// `version: 1.0` decodes as "1.0"; `null` as "".
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        Value::Bool(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar value, found {other}"
        ))),
    }
}
