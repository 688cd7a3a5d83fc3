use super::parser::{ParsedScript, parse_script};
use super::runtime::Registry;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SCRIPT_EXTENSION: &str = "dzs";

/// `.dzs` files directly inside each directory, ordered by file name within a directory.
/// Missing directories are skipped.
pub fn discover(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "script directory not readable");
                continue;
            }
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION))
            .collect();
        found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        files.extend(found);
    }
    files
}

fn log_issues(parsed: &ParsedScript) {
    for issue in &parsed.issues {
        warn!(file = %issue.file, line = issue.line, error = %issue.error, "script block skipped");
    }
}

/// Builds a registry from in-memory sources; `(name, source)` pairs in load order.
pub fn load_sources<'a>(sources: impl IntoIterator<Item = (&'a str, &'a str)>) -> Registry {
    let mut registry = Registry::default();
    for (name, src) in sources {
        let parsed = parse_script(src, name);
        log_issues(&parsed);
        registry.add(parsed);
    }
    registry
}

/// Reads and parses every script found under `dirs`. Unreadable files are logged and skipped.
pub fn load_dirs(dirs: &[PathBuf]) -> Registry {
    let mut registry = Registry::default();
    for path in discover(dirs) {
        let src = match std::fs::read_to_string(&path) {
            Ok(src) => src,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to read script");
                continue;
            }
        };
        let parsed = parse_script(&src, &display_name(&path));
        log_issues(&parsed);
        debug!(
            file = %path.display(),
            handlers = parsed.handlers.len(),
            statements = parsed.top_level.len(),
            "script parsed"
        );
        registry.add(parsed);
    }
    info!(
        files = registry.files,
        handlers = registry.handler_count(),
        issues = registry.issues,
        "scripts loaded"
    );
    registry
}

fn display_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
