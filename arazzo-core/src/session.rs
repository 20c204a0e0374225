use lsp_types::{Diagnostic, Location, Position, Range, Uri};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::schema::ServiceConfig;
use crate::diagnostics;
use crate::error::{Error, Result};
use crate::model::ArazzoDocument;
use crate::navigation::openapi::declared_operation_id;
use crate::navigation::uri::{uri_key, uri_to_path};
use crate::navigation::{FileCache, Indexer, OperationRecord, SymbolIndex};
use crate::parser::Parser;
use crate::validation::workflows::bare_operation_id;
use crate::validation::Validator;

const ARAZZO_NAME_MARKERS: [&str; 2] = [".arazzo.", "-arazzo."];
const ARAZZO_CONTENT_MARKER: &str = "arazzo:";
const OPENAPI_CONTENT_MARKERS: [&str; 2] = ["openapi:", "\"openapi\""];

pub struct LanguageSession {
    config: ServiceConfig,
    documents: RwLock<HashMap<String, String>>,
    parser: Parser,
    validator: Validator,
    index: Arc<SymbolIndex>,
    cache: Arc<FileCache>,
    indexer: Arc<Indexer>,
}

impl LanguageSession {
    pub fn new(config: ServiceConfig) -> Self {
        let index = Arc::new(SymbolIndex::new());
        let cache = Arc::new(FileCache::new(config.cache.ttl()));
        let indexer = Arc::new(Indexer::new(
            index.clone(),
            cache.clone(),
            config.discovery.clone(),
        ));

        Self {
            validator: Validator::with_index(index.clone()),
            parser: Parser::new(),
            documents: RwLock::new(HashMap::new()),
            config,
            index,
            cache,
            indexer,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<SymbolIndex> {
        &self.index
    }

    pub fn cache(&self) -> &Arc<FileCache> {
        &self.cache
    }

    pub fn indexer(&self) -> &Arc<Indexer> {
        &self.indexer
    }

    fn store(&self, uri: &str, text: String) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri_key(uri), text);
    }

    pub fn text(&self, uri: &str) -> Option<String> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&uri_key(uri))
            .cloned()
    }

    pub fn did_open(&self, uri: &str, text: String) -> Vec<Diagnostic> {
        tracing::info!(uri, "document opened");
        let diagnostics = self.diagnostics(&text);
        self.store(uri, text);

        if self.is_arazzo_file(uri) {
            let indexer = self.indexer.clone();
            let workflow_uri = uri.to_owned();
            spawn_background(move || match indexer.build_index(&workflow_uri) {
                Ok(report) => tracing::info!(
                    uri = %workflow_uri,
                    operations = indexer.index().count(),
                    indexed = report.indexed,
                    "operation index built"
                ),
                Err(err) => tracing::error!(uri = %workflow_uri, "failed to build operation index: {err}"),
            });
        }

        diagnostics
    }

    pub fn did_change(&self, uri: &str, text: String) -> Vec<Diagnostic> {
        tracing::debug!(uri, bytes = text.len(), "document changed");
        let diagnostics = self.diagnostics(&text);
        self.store(uri, text);
        diagnostics
    }

    pub fn did_save(&self, uri: &str, text: Option<String>) -> Vec<Diagnostic> {
        tracing::info!(uri, "document saved");
        if let Some(text) = text.filter(|text| !text.is_empty()) {
            self.store(uri, text);
        }

        let diagnostics = self
            .text(uri)
            .map(|text| self.diagnostics(&text))
            .unwrap_or_default();

        if self.is_openapi_file(uri) {
            let indexer = self.indexer.clone();
            let file_uri = uri.to_owned();
            spawn_background(move || match indexer.reindex_file(&file_uri) {
                Ok(operations) => {
                    tracing::info!(uri = %file_uri, operations, "api description re-indexed")
                }
                Err(err) => tracing::error!(uri = %file_uri, "failed to re-index api description: {err}"),
            });
        }

        diagnostics
    }

    // The empty list clears the editor's markers.
    pub fn did_close(&self, uri: &str) -> Vec<Diagnostic> {
        tracing::info!(uri, "document closed");
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&uri_key(uri));
        Vec::new()
    }

    pub fn is_arazzo_file(&self, uri: &str) -> bool {
        ARAZZO_NAME_MARKERS.iter().any(|marker| uri.contains(marker))
            || self
                .text(uri)
                .is_some_and(|text| text.contains(ARAZZO_CONTENT_MARKER))
    }

    pub fn is_openapi_file(&self, uri: &str) -> bool {
        self.index.contains_file(uri)
            || self.text(uri).is_some_and(|text| {
                OPENAPI_CONTENT_MARKERS
                    .iter()
                    .any(|marker| text.contains(marker))
            })
    }

    pub fn diagnostics(&self, text: &str) -> Vec<Diagnostic> {
        let config = &self.config.diagnostics;
        match self.parser.parse(text) {
            Ok(document) => {
                let findings = self.validator.validate(&document);
                tracing::debug!(findings = findings.len(), "document validated");
                diagnostics::from_findings(&findings, config)
            }
            Err(err) => vec![diagnostics::parse_failure(&err, config)],
        }
    }

    /// Parses the open text for `uri`, falling back to the file on disk.
    pub fn get_model(&self, uri: &str) -> Result<ArazzoDocument> {
        let text = match self.text(uri) {
            Some(text) => text,
            None => {
                let path = uri_to_path(uri)?;
                tracing::debug!(uri, path = %path.display(), "document not open, reading from disk");
                std::fs::read_to_string(&path).map_err(|err| {
                    Error::NotFound(format!(
                        "failed to read '{}' (from uri '{uri}'): {err}",
                        path.display()
                    ))
                })?
            }
        };

        let document = self.parser.parse(&text)?;
        tracing::debug!(uri, workflows = document.workflows.len(), "model parsed");
        Ok(document)
    }

    /// Resolves the operation declared on `line` of an open document.
    pub fn definition(&self, uri: &str, line: usize, character: usize) -> Option<OperationRecord> {
        let text = self.text(uri)?;
        let current = text.lines().nth(line)?;
        if character > current.chars().count() {
            return None;
        }

        let operation_id = bare_operation_id(declared_operation_id(current)?);
        let record = self.index.lookup(operation_id);
        if record.is_none() {
            tracing::debug!(uri, operation_id, "operation not in index");
        }
        record
    }

    pub fn definition_location(
        &self,
        uri: &str,
        line: usize,
        character: usize,
    ) -> Result<Option<Location>> {
        self.definition(uri, line, character)
            .map(|record| location(&record))
            .transpose()
    }
}

pub fn location(record: &OperationRecord) -> Result<Location> {
    let uri = Uri::from_str(&record.file_uri)
        .map_err(|err| Error::InvalidUri(format!("'{}': {err}", record.file_uri)))?;
    let line = u32::try_from(record.line).unwrap_or(u32::MAX);
    Ok(Location::new(
        uri,
        Range::new(Position::new(line, 0), Position::new(line, 0)),
    ))
}

// Blocking pool under a runtime, a plain thread otherwise.
fn spawn_background<F>(task: F)
where
    F: FnOnce() + Send + 'static,
{
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        drop(handle.spawn_blocking(task));
        return;
    }

    if let Err(err) = std::thread::Builder::new()
        .name("arazzo-index".to_owned())
        .spawn(task)
    {
        tracing::error!("failed to spawn background index task: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::{location, LanguageSession};
    use crate::config::schema::ServiceConfig;
    use crate::navigation::uri::path_to_uri;
    use crate::navigation::OperationRecord;
    use lsp_types::DiagnosticSeverity;
    use std::time::{Duration, Instant};

    const WORKFLOW: &str = r#"arazzo: 1.0.0
info:
  title: Pets
  version: 1.0.0
sourceDescriptions:
  - name: pets
    url: ./pets.yaml
    type: openapi
workflows:
  - workflowId: adopt
    steps:
      - stepId: find
        operationId: $sourceDescriptions.pets.getPet
"#;

    fn session() -> LanguageSession {
        LanguageSession::new(ServiceConfig::default())
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        condition()
    }

    #[test]
    fn detects_document_kinds_by_name_and_content() {
        let session = session();
        assert!(session.is_arazzo_file("file:///w/pets.arazzo.yaml"));
        assert!(session.is_arazzo_file("file:///w/pets-arazzo.json"));
        assert!(!session.is_arazzo_file("file:///w/flow.yaml"));

        session.did_change("file:///w/flow.yaml", "arazzo: 1.0.0\n".to_owned());
        assert!(session.is_arazzo_file("file:///w/flow.yaml"));

        session.did_change("file:///w/api.json", "{\"openapi\": \"3.1.0\"}".to_owned());
        assert!(session.is_openapi_file("file:///w/api.json"));
        assert!(!session.is_openapi_file("file:///w/other.json"));
    }

    #[test]
    fn parse_failure_yields_single_error() {
        let diagnostics = session().did_change("file:///w/a.yaml", "workflows: [".to_owned());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostics[0].range.start.line, 0);
    }

    #[test]
    fn close_forgets_text_and_clears_markers() {
        let session = session();
        session.did_change("file:///w/a.yaml", "info: {}\n".to_owned());
        assert!(session.did_close("file:///w/a.yaml").is_empty());
        assert!(session.text("file:///w/a.yaml").is_none());
    }

    #[test]
    fn open_builds_index_in_background_and_definition_resolves() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("pets.yaml"),
            "openapi: 3.0.0\npaths:\n  /pets/{id}:\n    get:\n      operationId: getPet\n",
        )
        .expect("write spec");
        let workflow = path_to_uri(&dir.path().join("flow.arazzo.yaml")).expect("uri");

        let session = session();
        let diagnostics = session.did_open(&workflow, WORKFLOW.to_owned());
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(wait_for(|| session.index().lookup("getPet").is_some()));

        let record = session.definition(&workflow, 12, 20).expect("definition");
        assert_eq!(record.line, 4);
        assert!(session.definition(&workflow, 11, 4).is_none());
        assert!(session.definition(&workflow, 12, 500).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn open_inside_a_runtime_uses_the_blocking_pool() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("pets.yaml"),
            "openapi: 3.0.0\npaths:\n  /pets:\n    get:\n      operationId: listPets\n",
        )
        .expect("write spec");
        let workflow = path_to_uri(&dir.path().join("pets-arazzo.yaml")).expect("uri");

        let session = session();
        session.did_open(&workflow, WORKFLOW.to_owned());

        let deadline = Instant::now() + Duration::from_secs(5);
        while session.index().lookup("listPets").is_none() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(session.index().lookup("listPets").is_some());
    }

    #[test]
    fn save_reindexes_known_api_descriptions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec_path = dir.path().join("pets.yaml");
        std::fs::write(&spec_path, "openapi: 3.0.0\npaths:\n  /a:\n    get:\n      operationId: oldName\n")
            .expect("write spec");
        let spec_uri = path_to_uri(&spec_path).expect("uri");

        let session = session();
        session.indexer().index_file(&spec_uri).expect("index");

        std::fs::write(&spec_path, "openapi: 3.0.0\npaths:\n  /a:\n    get:\n      operationId: newName\n")
            .expect("rewrite spec");
        session.did_save(&spec_uri, None);

        assert!(wait_for(|| session.index().lookup("newName").is_some()));
        assert!(session.index().lookup("oldName").is_none());
    }

    #[test]
    fn save_under_another_uri_spelling_reindexes_the_same_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec_path = dir.path().join("pets.yaml");
        std::fs::write(&spec_path, "openapi: 3.0.0\npaths:\n  /a:\n    get:\n      operationId: oldName\n")
            .expect("write spec");
        let spec_uri = path_to_uri(&spec_path).expect("uri");
        let localhost = spec_uri.replacen("file://", "file://localhost", 1);

        let session = session();
        session.indexer().index_file(&spec_uri).expect("index");
        assert!(session.is_openapi_file(&localhost));

        std::fs::write(&spec_path, "openapi: 3.0.0\npaths:\n  /a:\n    get:\n      operationId: newName\n")
            .expect("rewrite spec");
        session.did_save(&localhost, None);

        assert!(wait_for(|| session.index().lookup("newName").is_some()));
        assert!(session.index().lookup("oldName").is_none());
        assert_eq!(session.index().file_count(), 1);

        session.did_change(&localhost, "arazzo: 1.0.0\n".to_owned());
        assert!(session.text(&spec_uri).is_some());
    }

    #[test]
    fn get_model_prefers_open_text_then_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("flow.arazzo.yaml");
        std::fs::write(&path, WORKFLOW).expect("write workflow");
        let uri = path_to_uri(&path).expect("uri");

        let session = session();
        let from_disk = session.get_model(&uri).expect("model from disk");
        assert_eq!(from_disk.workflows[0].workflow_id, "adopt");

        session.did_change(&uri, WORKFLOW.replace("adopt", "rehome"));
        let from_memory = session.get_model(&uri).expect("model from memory");
        assert_eq!(from_memory.workflows[0].workflow_id, "rehome");

        let missing = path_to_uri(&dir.path().join("missing.yaml")).expect("uri");
        let error = session.get_model(&missing).expect_err("missing file should fail");
        assert!(error.to_string().contains("failed to read"));
        assert!(session.get_model("untitled:1").is_err());
    }

    #[test]
    fn location_points_at_declaration_line() {
        let record = OperationRecord {
            operation_id: "getPet".to_owned(),
            file_uri: "file:///specs/pets.yaml".to_owned(),
            line: 42,
            ..OperationRecord::default()
        };
        let location = location(&record).expect("valid uri");
        assert_eq!(location.range.start.line, 42);
        assert_eq!(location.uri.as_str(), "file:///specs/pets.yaml");
    }
}
