pub mod types;

pub use types::{
    Action, ArazzoDocument, Components, Criterion, Info, Parameter, RequestBody,
    SourceDescription, Step, Workflow, STEP_POSITION_PREFIX, WORKFLOW_POSITION_PREFIX,
};
