//! Document builds.
//!
//! Each outdated document is read, transformed and written on the rayon
//! thread pool. A failing document is reported in the build response and does
//! not stop the others; the manifest is written once every document is done.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use mystbuild_core::{transform, DocTree, RuleSet, Transformation};

use crate::config::ResolvedConfig;
use crate::discovery::{discover, plan, Document, MANIFEST_FILE};
use crate::error::{BuildError, BuildResult};
use crate::output::{
    Article, BuildResponse, DocumentReport, ErrorInfo, StatsInfo, Warning, XrefManifest,
    SCHEMA_VERSION,
};

// ============================================================================
// Single Documents
// ============================================================================

/// A transformed document together with the bytes it was read from.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub docname: String,
    pub source: Vec<u8>,
    pub transformation: Transformation,
}

impl Transformed {
    pub fn into_article(self) -> Article {
        Article::new(&self.docname, &self.source, self.transformation.root)
    }
}

/// Read, parse and transform one document.
pub fn transform_document(document: &Document, rules: &RuleSet) -> BuildResult<Transformed> {
    let source = fs::read(&document.source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => BuildError::DocumentNotFound {
            path: document.source.clone(),
        },
        _ => BuildError::Io(e),
    })?;
    let tree = DocTree::from_json_slice(&source).map_err(|source| BuildError::Parse {
        docname: document.docname.clone(),
        source,
    })?;
    let transformation = transform(&tree, rules).map_err(|source| BuildError::Transform {
        docname: document.docname.clone(),
        source,
    })?;
    debug!(
        docname = %document.docname,
        nodes = transformation.stats.nodes_visited,
        "transformed document"
    );
    Ok(Transformed {
        docname: document.docname.clone(),
        source,
        transformation,
    })
}

/// Transform a single source file given by path.
///
/// The document name is the file stem.
pub fn transform_file(path: &Path, rules: &RuleSet) -> BuildResult<Transformed> {
    let docname = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| BuildError::invalid_args(format!("not a document: {}", path.display())))?;
    transform_document(&Document::new(docname, path), rules)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> BuildResult<()> {
    let bytes = serde_json::to_vec(value)?;
    fs::write(path, bytes).map_err(|e| BuildError::write(path, e))
}

/// Transform one document and write its envelope into `out_dir`.
pub fn build_document(
    document: &Document,
    out_dir: &Path,
    rules: &RuleSet,
) -> BuildResult<(PathBuf, StatsInfo)> {
    let _span = info_span!("build.document", docname = %document.docname).entered();
    let transformed = transform_document(document, rules)?;
    let stats = StatsInfo::from(&transformed.transformation.stats);
    let target = document.target(out_dir);
    write_json(&target, &transformed.into_article())?;
    debug!(docname = %document.docname, target = %target.display(), "wrote document");
    Ok((target, stats))
}

/// Write the reference manifest listing every document.
pub fn write_manifest(out_dir: &Path, documents: &[Document]) -> BuildResult<PathBuf> {
    let manifest = XrefManifest::new(documents.iter().map(|d| d.docname.as_str()));
    let path = out_dir.join(MANIFEST_FILE);
    write_json(&path, &manifest)?;
    Ok(path)
}

// ============================================================================
// Whole Builds
// ============================================================================

fn report(document: &Document, outcome: BuildResult<(PathBuf, StatsInfo)>) -> DocumentReport {
    match outcome {
        Ok((target, stats)) => DocumentReport {
            docname: document.docname.clone(),
            status: "ok".to_string(),
            target: Some(target),
            stats: Some(stats),
            error: None,
        },
        Err(err) => {
            warn!(docname = %document.docname, error = %err, "document failed");
            DocumentReport {
                docname: document.docname.clone(),
                status: "error".to_string(),
                target: None,
                stats: None,
                error: Some(ErrorInfo::from_error(&err)),
            }
        }
    }
}

fn dangling_warning(report: &DocumentReport) -> Option<Warning> {
    let dangling = report.stats?.dangling_anchors;
    if dangling == 0 {
        return None;
    }
    Some(Warning {
        code: "DanglingAnchor".to_string(),
        message: format!("{dangling} anchor(s) had no following node to attach to"),
        docname: Some(report.docname.clone()),
    })
}

/// Build every outdated document (or every document when forced) and rewrite
/// the manifest.
pub fn build(config: &ResolvedConfig, rules: &RuleSet) -> BuildResult<BuildResponse> {
    let out_dir = config.out_dir();
    let documents = discover(config.source_dir(), out_dir)?;
    let work = plan(&documents, config);

    if work.is_empty() {
        info!(total = documents.len(), "all documents up to date");
    } else {
        fs::create_dir_all(out_dir).map_err(|e| BuildError::write(out_dir, e))?;
    }

    let reports: Vec<DocumentReport> = work
        .documents
        .par_iter()
        .map(|doc| report(doc, build_document(doc, out_dir, rules)))
        .collect();

    let manifest = match work.manifest {
        Some(_) => Some(write_manifest(out_dir, &documents)?),
        None => None,
    };

    let warnings: Vec<Warning> = reports.iter().filter_map(dangling_warning).collect();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    info!(
        built = reports.len() - failed,
        failed,
        total = documents.len(),
        "build finished"
    );

    Ok(BuildResponse {
        status: if failed == 0 { "ok" } else { "partial" }.to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        out_dir: out_dir.to_path_buf(),
        documents: reports,
        manifest,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliOverrides;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> ResolvedConfig {
        let cli = CliOverrides {
            source_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        ResolvedConfig::resolve_with_env(&cli, |_| None).unwrap()
    }

    fn write_doc(dir: &TempDir, name: &str, doc: Value) {
        let path = dir.path().join(format!("{name}.json"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, serde_json::to_vec(&doc).unwrap()).unwrap();
    }

    fn paragraph(text: &str) -> Value {
        json!({"type": "document", "children": [
            {"type": "paragraph", "children": [{"type": "Text", "text": text}]}
        ]})
    }

    #[test]
    fn test_transform_file_reports_missing_document() {
        let dir = TempDir::new().unwrap();
        let err = transform_file(&dir.path().join("absent.json"), &RuleSet::standard())
            .unwrap_err();
        assert!(matches!(err, BuildError::DocumentNotFound { .. }));
    }

    #[test]
    fn test_transform_file_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        let err = transform_file(&path, &RuleSet::standard()).unwrap_err();
        assert_eq!(err.docname(), Some("broken"));
        assert!(matches!(err, BuildError::Parse { .. }));
    }

    #[test]
    fn test_build_writes_envelopes_and_manifest() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "index", paragraph("Hello"));
        write_doc(&dir, "guide/install", paragraph("Install"));
        let config = config_for(&dir);

        let response = build(&config, &RuleSet::standard()).unwrap();
        assert_eq!(response.status, "ok");
        assert_eq!(response.documents.len(), 2);

        let envelope: Value = serde_json::from_slice(
            &fs::read(config.out_dir().join("guide%2Finstall.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(envelope["kind"], json!("Article"));
        assert_eq!(envelope["location"], json!("/guide/install"));
        assert_eq!(envelope["mdast"]["children"][0]["type"], json!("paragraph"));

        let manifest: Value =
            serde_json::from_slice(&fs::read(config.out_dir().join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(manifest["references"].as_array().unwrap().len(), 2);
        assert_eq!(manifest["references"][0]["url"], json!("/guide%2Finstall"));
    }

    #[test]
    fn test_failed_document_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "good", paragraph("fine"));
        write_doc(
            &dir,
            "bad",
            json!({"type": "document", "children": [{"type": "footnote"}]}),
        );
        let config = config_for(&dir);

        let response = build(&config, &RuleSet::standard()).unwrap();
        assert_eq!(response.status, "partial");
        assert_eq!(response.failed(), 1);

        let bad = response.documents.iter().find(|d| d.docname == "bad").unwrap();
        assert_eq!(bad.error.as_ref().unwrap().code, 4);
        assert!(config.out_dir().join("good.json").is_file());
        assert!(!config.out_dir().join("bad.json").exists());
        assert!(response.manifest.is_some());
    }

    #[test]
    fn test_dangling_anchor_becomes_warning() {
        let dir = TempDir::new().unwrap();
        write_doc(
            &dir,
            "index",
            json!({"type": "document", "children": [
                {"type": "paragraph"},
                {"type": "target", "attributes": {"refid": "end"}}
            ]}),
        );
        let response = build(&config_for(&dir), &RuleSet::standard()).unwrap();
        assert_eq!(response.status, "ok");
        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.warnings[0].code, "DanglingAnchor");
        assert_eq!(response.warnings[0].docname.as_deref(), Some("index"));
    }

    #[test]
    fn test_second_build_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "index", paragraph("Hello"));
        let config = config_for(&dir);

        let first = build(&config, &RuleSet::standard()).unwrap();
        assert_eq!(first.documents.len(), 1);

        let second = build(&config, &RuleSet::standard()).unwrap();
        assert!(second.documents.is_empty());
        assert!(second.manifest.is_none());
    }
}
