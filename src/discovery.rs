//! Source document discovery and staleness.
//!
//! Every `*.json` file under the source directory is a document. The output
//! directory, hidden entries and the project config file are skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::config::{ResolvedConfig, PROJECT_CONFIG_FILE};
use crate::error::{BuildError, BuildResult};
use crate::slug::{slugify, target_path};

/// File name of the cross-document reference manifest.
pub const MANIFEST_FILE: &str = "myst.xref.json";

const SOURCE_EXTENSION: &str = "json";

// ============================================================================
// Documents
// ============================================================================

/// A source document found under the source directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Document {
    /// Path relative to the source directory, without extension, `/`-separated.
    pub docname: String,
    /// Path of the source tree file.
    pub source: PathBuf,
}

impl Document {
    pub fn new(docname: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Document {
            docname: docname.into(),
            source: source.into(),
        }
    }

    pub fn slug(&self) -> String {
        slugify(&self.docname)
    }

    /// Where this document's envelope is written.
    pub fn target(&self, out_dir: &Path) -> PathBuf {
        target_path(out_dir, &self.docname)
    }
}

/// Derive a document name from a source path relative to the source root.
pub fn docname_for(relative: &Path) -> Option<String> {
    if relative.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
        return None;
    }
    let stem = relative.with_extension("");
    let parts: Vec<&str> = stem
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Find every document under `source_dir`, sorted by name.
pub fn discover(source_dir: &Path, out_dir: &Path) -> BuildResult<Vec<Document>> {
    if !source_dir.is_dir() {
        return Err(BuildError::SourceDirNotFound {
            path: source_dir.to_path_buf(),
        });
    }
    let root = source_dir.canonicalize()?;
    // Only an existing output directory can hold files to skip.
    let out_dir = out_dir.canonicalize().ok();

    let mut documents = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !should_skip(e, out_dir.as_deref()))
    {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(&root).map_err(io::Error::other)?;
        if entry.depth() == 1 && relative == Path::new(PROJECT_CONFIG_FILE) {
            continue;
        }
        if let Some(docname) = docname_for(relative) {
            trace!(docname = %docname, "found document");
            documents.push(Document::new(docname, entry.path()));
        }
    }

    documents.sort();
    debug!(count = documents.len(), root = %root.display(), "discovered documents");
    Ok(documents)
}

fn should_skip(entry: &DirEntry, out_dir: Option<&Path>) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    if entry.file_name().to_str().is_some_and(|n| n.starts_with('.')) {
        return true;
    }
    out_dir.is_some_and(|out| entry.path() == out)
}

// ============================================================================
// Staleness
// ============================================================================

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Whether `target` needs rebuilding from `source`.
///
/// A missing target, or one older than its source, is stale. A source that
/// no longer exists is never stale.
pub fn is_stale(source: &Path, target: &Path) -> bool {
    let Some(source_time) = modified(source) else {
        return false;
    };
    match modified(target) {
        Some(target_time) => target_time < source_time,
        None => true,
    }
}

/// The work a build has to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Documents to (re)write, sorted by name.
    pub documents: Vec<Document>,
    /// Manifest to rewrite; present whenever any document is written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
}

impl BuildPlan {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document names followed by the manifest path, if any.
    pub fn entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = self.documents.iter().map(|d| d.docname.clone()).collect();
        if let Some(manifest) = &self.manifest {
            entries.push(manifest.to_string_lossy().into_owned());
        }
        entries
    }
}

/// Plan a build: every stale document (or all of them when forced), plus the
/// manifest when anything is written.
pub fn plan(documents: &[Document], config: &ResolvedConfig) -> BuildPlan {
    let out_dir = config.out_dir();
    let documents: Vec<Document> = documents
        .iter()
        .filter(|doc| config.force() || is_stale(&doc.source, &doc.target(out_dir)))
        .cloned()
        .collect();
    let manifest = if documents.is_empty() {
        None
    } else {
        Some(out_dir.join(MANIFEST_FILE))
    };
    BuildPlan {
        documents,
        manifest,
    }
}

/// Discover documents and plan which of them are outdated.
pub fn outdated_documents(config: &ResolvedConfig) -> BuildResult<BuildPlan> {
    let documents = discover(config.source_dir(), config.out_dir())?;
    Ok(plan(&documents, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliOverrides;
    use std::time::Duration;
    use tempfile::TempDir;

    const DOC: &str = r#"{"type": "document"}"#;

    fn config_for(dir: &TempDir, force: bool) -> ResolvedConfig {
        let cli = CliOverrides {
            source_dir: Some(dir.path().to_path_buf()),
            force,
            ..Default::default()
        };
        ResolvedConfig::resolve_with_env(&cli, |_| None).unwrap()
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    mod docnames {
        use super::*;

        #[test]
        fn test_docname_for() {
            assert_eq!(docname_for(Path::new("index.json")), Some("index".to_string()));
            assert_eq!(
                docname_for(Path::new("guide/install.json")),
                Some("guide/install".to_string())
            );
            assert_eq!(docname_for(Path::new("notes.txt")), None);
        }

        #[test]
        fn test_discover_sorted_and_filtered() {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("guide")).unwrap();
            fs::create_dir_all(dir.path().join(".cache")).unwrap();
            fs::create_dir_all(dir.path().join("_build/myst")).unwrap();
            fs::write(dir.path().join("index.json"), DOC).unwrap();
            fs::write(dir.path().join("guide/install.json"), DOC).unwrap();
            fs::write(dir.path().join("about.json"), DOC).unwrap();
            fs::write(dir.path().join("readme.txt"), "x").unwrap();
            fs::write(dir.path().join(".cache/skip.json"), DOC).unwrap();
            fs::write(dir.path().join("_build/myst/index.json"), DOC).unwrap();
            fs::write(dir.path().join(PROJECT_CONFIG_FILE), "{}").unwrap();

            let config = config_for(&dir, false);
            let docs = discover(config.source_dir(), config.out_dir()).unwrap();
            let names: Vec<&str> = docs.iter().map(|d| d.docname.as_str()).collect();
            assert_eq!(names, vec!["about", "guide/install", "index"]);
        }

        #[test]
        fn test_missing_source_dir() {
            let dir = TempDir::new().unwrap();
            let missing = dir.path().join("nope");
            let err = discover(&missing, &missing.join("out")).unwrap_err();
            assert!(matches!(err, BuildError::SourceDirNotFound { .. }));
        }
    }

    mod staleness {
        use super::*;

        #[test]
        fn test_missing_target_is_stale() {
            let dir = TempDir::new().unwrap();
            let source = dir.path().join("a.json");
            fs::write(&source, DOC).unwrap();
            assert!(is_stale(&source, &dir.path().join("out.json")));
        }

        #[test]
        fn test_older_target_is_stale() {
            let dir = TempDir::new().unwrap();
            let source = dir.path().join("a.json");
            let target = dir.path().join("out.json");
            fs::write(&source, DOC).unwrap();
            fs::write(&target, "{}").unwrap();

            let now = SystemTime::now();
            set_mtime(&target, now - Duration::from_secs(60));
            set_mtime(&source, now);
            assert!(is_stale(&source, &target));

            set_mtime(&target, now + Duration::from_secs(60));
            assert!(!is_stale(&source, &target));
        }

        #[test]
        fn test_vanished_source_is_not_stale() {
            let dir = TempDir::new().unwrap();
            assert!(!is_stale(
                &dir.path().join("gone.json"),
                &dir.path().join("out.json")
            ));
        }
    }

    mod planning {
        use super::*;

        #[test]
        fn test_manifest_follows_outdated_documents() {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("b.json"), DOC).unwrap();
            fs::write(dir.path().join("a.json"), DOC).unwrap();
            let config = config_for(&dir, false);

            let plan = outdated_documents(&config).unwrap();
            let manifest = config.out_dir().join(MANIFEST_FILE);
            assert_eq!(
                plan.entries(),
                vec![
                    "a".to_string(),
                    "b".to_string(),
                    manifest.to_string_lossy().into_owned()
                ]
            );
        }

        #[test]
        fn test_up_to_date_plan_is_empty() {
            let dir = TempDir::new().unwrap();
            let source = dir.path().join("a.json");
            fs::write(&source, DOC).unwrap();
            let config = config_for(&dir, false);

            let doc = Document::new("a", &source);
            let target = doc.target(config.out_dir());
            fs::create_dir_all(config.out_dir()).unwrap();
            fs::write(&target, "{}").unwrap();
            set_mtime(&target, SystemTime::now() + Duration::from_secs(60));

            let plan = outdated_documents(&config).unwrap();
            assert!(plan.is_empty());
            assert!(plan.manifest.is_none());
            assert!(plan.entries().is_empty());

            let forced = outdated_documents(&config_for(&dir, true)).unwrap();
            assert_eq!(forced.documents.len(), 1);
            assert!(forced.manifest.is_some());
        }
    }
}
