use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::schema::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::navigation::uri::{path_to_uri, uri_to_path};

const OPENAPI_MARKERS: [&str; 2] = ["openapi:", "\"openapi\""];

/// OpenAPI descriptions in the workflow's directory, its subdirectories down
/// to `max_depth`, and the parent directory.
pub fn discover(workflow_uri: &str, config: &DiscoveryConfig) -> Result<Vec<String>> {
    let workflow_path = uri_to_path(workflow_uri)?;
    let Some(dir) = workflow_path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        tracing::warn!(uri = workflow_uri, "workflow document has no parent directory");
        return Ok(Vec::new());
    };

    let mut candidates = BTreeSet::new();
    if let Err(err) = list_files(dir, &mut candidates) {
        tracing::warn!(uri = workflow_uri, "{err}");
    }
    for err in walk_subdirectories(dir, config, &mut candidates) {
        tracing::warn!(uri = workflow_uri, "{err}");
    }
    if let Some(parent) = dir.parent().filter(|parent| *parent != dir) {
        if let Err(err) = list_files(parent, &mut candidates) {
            tracing::warn!(uri = workflow_uri, "{err}");
        }
    }

    let mut uris = Vec::new();
    for path in candidates {
        if path == workflow_path
            || !has_extension(&path, &config.extensions)
            || !has_openapi_marker(&path, config.marker_bytes)
        {
            continue;
        }
        match path_to_uri(&path) {
            Ok(uri) => uris.push(uri),
            Err(err) => tracing::warn!(path = %path.display(), "skipping candidate: {err}"),
        }
    }

    tracing::debug!(
        uri = workflow_uri,
        found = uris.len(),
        "api description discovery finished"
    );
    Ok(uris)
}

fn list_files(dir: &Path, out: &mut BTreeSet<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|err| {
        Error::Discovery(format!("failed to read directory '{}': {err}", dir.display()))
    })?;

    for entry in entries.flatten() {
        if entry.file_type().is_ok_and(|kind| kind.is_file()) {
            out.insert(entry.path());
        }
    }
    Ok(())
}

// Walk failures are collected rather than returned; the rest of the tree still counts.
fn walk_subdirectories(
    dir: &Path,
    config: &DiscoveryConfig,
    out: &mut BTreeSet<PathBuf>,
) -> Vec<Error> {
    let excluded = config.excluded_dirs.clone();
    let mut walker = WalkBuilder::new(dir);
    walker
        .standard_filters(false)
        .hidden(true)
        .follow_links(false)
        // Depth 1 is the directory itself; subdirectories start at 2.
        .max_depth(Some(config.max_depth + 1))
        .filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_some_and(|kind| kind.is_dir()) {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !excluded.iter().any(|skip| skip.as_str() == name)
        });

    let mut errors = Vec::new();
    for entry in walker.build() {
        match entry {
            Ok(entry) if entry.file_type().is_some_and(|kind| kind.is_file()) => {
                out.insert(entry.into_path());
            }
            Ok(_) => {}
            Err(err) => errors.push(Error::Discovery(format!(
                "failed to walk '{}': {err}",
                dir.display()
            ))),
        }
    }
    errors
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(extension) = path.extension().and_then(|value| value.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
}

/// Looks for an `openapi` key in the first `limit` bytes.
pub fn has_openapi_marker(path: &Path, limit: usize) -> bool {
    let mut head = Vec::with_capacity(limit);
    let read = File::open(path).and_then(|file| file.take(limit as u64).read_to_end(&mut head));
    if let Err(err) = read {
        tracing::debug!(path = %path.display(), "cannot inspect candidate: {err}");
        return false;
    }

    let head = String::from_utf8_lossy(&head);
    OPENAPI_MARKERS.iter().any(|marker| head.contains(marker))
}
