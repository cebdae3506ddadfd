//! Errors of the rewriting pipeline.

use thiserror::Error;

/// A message body the pipeline cannot work with at all.
///
/// Anything short of this (unknown colors, broken style blocks, odd markup)
/// is skipped rather than reported.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    /// The body is empty or only whitespace
    #[error("message body is empty")]
    EmptyDocument,
    /// The parsed document has no `<body>` element (e.g. a frameset document)
    #[error("message body has no <body> element")]
    MissingBody,
}
