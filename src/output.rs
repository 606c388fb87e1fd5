//! JSON output types: per-document envelopes, the reference manifest, and
//! CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Always JSON:** All CLI output is valid JSON (no mixed text/JSON)
//! 2. **Status first:** Every response has `status` as first field
//! 3. **Deterministic:** Same input -> same output (field order, array ordering)

use std::io::{self, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use mystbuild_core::{MdNode, TraversalStats};

use crate::config::ResolvedConfig;
use crate::discovery::BuildPlan;
use crate::error::{BuildError, OutputErrorCode};
use crate::slug::slugify;

/// Current schema version for all CLI responses.
pub const SCHEMA_VERSION: &str = "1";

/// Manifest format version.
pub const XREF_VERSION: &str = "1";

/// MyST version the envelopes and manifest are produced for.
pub const MYST_VERSION: &str = "1.2.9";

// ============================================================================
// Content Hash
// ============================================================================

/// SHA-256 hash of document content, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

// ============================================================================
// Article Envelope
// ============================================================================

/// The file written for each document: its mdast plus page metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Always "Article".
    pub kind: String,
    pub sha256: ContentHash,
    pub slug: String,
    /// "/" followed by the document name.
    pub location: String,
    pub dependencies: Vec<Value>,
    pub frontmatter: serde_json::Map<String, Value>,
    pub mdast: MdNode,
    pub references: Value,
}

impl Article {
    pub fn new(docname: &str, source: &[u8], mdast: MdNode) -> Self {
        Article {
            kind: "Article".to_string(),
            sha256: ContentHash::compute(source),
            slug: slugify(docname),
            location: format!("/{docname}"),
            dependencies: Vec::new(),
            frontmatter: serde_json::Map::new(),
            mdast,
            references: json!({"cite": {"order": [], "data": {}}}),
        }
    }
}

// ============================================================================
// Reference Manifest
// ============================================================================

/// One page entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrefEntry {
    /// Always "page".
    pub kind: String,
    pub url: String,
    pub data: String,
}

impl XrefEntry {
    pub fn page(docname: &str) -> Self {
        let slug = slugify(docname);
        XrefEntry {
            kind: "page".to_string(),
            url: format!("/{slug}"),
            data: format!("/{slug}.json"),
        }
    }
}

/// `myst.xref.json`: every known page, so pages can link to each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrefManifest {
    pub version: String,
    pub myst: String,
    pub references: Vec<XrefEntry>,
}

impl XrefManifest {
    /// Build a manifest listing `docnames` in the order given.
    pub fn new<'a>(docnames: impl IntoIterator<Item = &'a str>) -> Self {
        XrefManifest {
            version: XREF_VERSION.to_string(),
            myst: MYST_VERSION.to_string(),
            references: docnames.into_iter().map(XrefEntry::page).collect(),
        }
    }
}

// ============================================================================
// CLI Responses
// ============================================================================

/// Per-document outcome in a build report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub docname: String,
    /// "ok" or "error".
    pub status: String,
    /// Envelope path (present on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Traversal counters reported for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsInfo {
    pub nodes: usize,
    pub results: usize,
    pub anchors: usize,
    pub dangling_anchors: usize,
}

impl From<&TraversalStats> for StatsInfo {
    fn from(stats: &TraversalStats) -> Self {
        StatsInfo {
            nodes: stats.nodes_visited,
            results: stats.results_produced,
            anchors: stats.sibling_actions_applied,
            dangling_anchors: stats.dangling_actions,
        }
    }
}

/// A non-fatal problem noticed during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docname: Option<String>,
}

/// Response for `build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResponse {
    /// "ok" when every document built, "partial" otherwise.
    pub status: String,
    pub schema_version: String,
    pub out_dir: PathBuf,
    pub documents: Vec<DocumentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
    pub warnings: Vec<Warning>,
}

impl BuildResponse {
    pub fn failed(&self) -> usize {
        self.documents.iter().filter(|d| d.error.is_some()).count()
    }
}

/// Response for `outdated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutdatedResponse {
    pub status: String,
    pub schema_version: String,
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Outdated document names followed by the manifest path.
    pub outdated: Vec<String>,
}

impl OutdatedResponse {
    pub fn new(config: &ResolvedConfig, plan: &BuildPlan) -> Self {
        OutdatedResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            source_dir: config.source_dir().to_path_buf(),
            out_dir: config.out_dir().to_path_buf(),
            outdated: plan.entries(),
        }
    }
}

/// Response for `transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResponse {
    pub status: String,
    pub schema_version: String,
    pub docname: String,
    pub stats: StatsInfo,
    pub mdast: MdNode,
}

/// Error information in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &BuildError) -> Self {
        let details = match err {
            BuildError::Transform { source, .. } => {
                let mut details = json!({"kind": source.code()});
                if let Some(node) = source.node() {
                    details["node"] = json!(node.index());
                }
                Some(details)
            }
            BuildError::SourceDirNotFound { path }
            | BuildError::DocumentNotFound { path }
            | BuildError::InvalidConfig { path, .. }
            | BuildError::Write { path, .. } => Some(json!({"path": path})),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &BuildError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// The output is deterministic: same input produces identical bytes.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mystbuild_core::doctree::NodeId;
    use mystbuild_core::TransformError;

    mod envelope {
        use super::*;

        #[test]
        fn test_article_shape() {
            let article = Article::new("guide/intro", b"{}", MdNode::parent("root"));
            let value = serde_json::to_value(&article).unwrap();
            assert_eq!(
                value,
                json!({
                    "kind": "Article",
                    "sha256": "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a",
                    "slug": "guide%2Fintro",
                    "location": "/guide/intro",
                    "dependencies": [],
                    "frontmatter": {},
                    "mdast": {"type": "root", "children": []},
                    "references": {"cite": {"order": [], "data": {}}}
                })
            );
        }

        #[test]
        fn test_content_hash_is_hex_sha256() {
            let hash = ContentHash::compute(b"");
            assert_eq!(
                hash.0,
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
            );
        }
    }

    mod manifest {
        use super::*;

        #[test]
        fn test_manifest_shape() {
            let manifest = XrefManifest::new(["index", "api reference"]);
            assert_eq!(
                serde_json::to_value(&manifest).unwrap(),
                json!({
                    "version": "1",
                    "myst": "1.2.9",
                    "references": [
                        {"kind": "page", "url": "/index", "data": "/index.json"},
                        {"kind": "page", "url": "/api+reference", "data": "/api+reference.json"}
                    ]
                })
            );
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn test_error_response_for_transform_failure() {
            let err = BuildError::Transform {
                docname: "index".to_string(),
                source: TransformError::UnsupportedReferenceKind {
                    refuri: Some("https://example.com".to_string()),
                    node: NodeId(7),
                },
            };
            let response = ErrorResponse::from_error(&err);
            assert_eq!(response.status, "error");
            assert_eq!(response.error.code, 4);
            let details = response.error.details.unwrap();
            assert_eq!(details["node"], json!(7));
        }

        #[test]
        fn test_emit_response_is_pretty_and_deterministic() {
            let response = ErrorResponse::from_error(&BuildError::invalid_args("bad"));
            let mut first = Vec::new();
            let mut second = Vec::new();
            emit_response(&response, &mut first).unwrap();
            emit_response(&response, &mut second).unwrap();
            assert_eq!(first, second);

            let text = String::from_utf8(first).unwrap();
            assert!(text.starts_with("{\n  \"status\": \"error\""));
            assert!(text.ends_with("}\n"));
        }
    }
}
