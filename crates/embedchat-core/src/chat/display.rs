//! Answer text cleanup.
//!
//! Answers can carry bracketed control annotations such as
//! `[source: doc1]` or citation markers like `[d_12:c_7]`. They are removed
//! before the answer is shown.

use std::sync::LazyLock;

use regex::Regex;

static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\[\]:]+:[^\[\]]*\]").expect("valid annotation regex"));

static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid space regex"));

/// Remove `[key: value]` annotations, collapse runs of spaces, and trim.
pub fn strip_annotations(answer: &str) -> String {
    let without = ANNOTATION.replace_all(answer, "");
    SPACE_RUN.replace_all(&without, " ").trim().to_string()
}
