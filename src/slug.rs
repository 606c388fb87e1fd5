//! Document slugs and output locations.
//!
//! A slug is the document name encoded the way HTML forms encode values:
//! ASCII alphanumerics and `_ . - ~` pass through, a space becomes `+`, and
//! every other byte (including `/`) is percent-encoded.

use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes that are percent-encoded. Space is left alone here and turned into
/// `+` afterwards.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b' ');

/// Encode `docname` as a slug.
pub fn slugify(docname: &str) -> String {
    utf8_percent_encode(docname, FORM)
        .to_string()
        .replace(' ', "+")
}

/// Path of the envelope written for `docname`.
pub fn target_path(out_dir: &Path, docname: &str) -> PathBuf {
    out_dir.join(format!("{}.json", slugify(docname)))
}

/// URI other documents use to link to `docname`.
pub fn target_uri(docname: &str) -> String {
    slugify(docname)
}
