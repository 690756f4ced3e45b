//! Reply summaries and bookmarks.

use crate::types::{BoltDict, BoltValue};

/// The summary a server attaches to a completed request.
///
/// A successful summary carries the request's metadata; a failed one
/// carries `code` and `message` entries describing what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    metadata: BoltDict,
    success: bool,
}

impl Summary {
    pub(crate) fn new(metadata: BoltDict, success: bool) -> Self {
        Self { metadata, success }
    }

    pub fn metadata(&self) -> &BoltDict {
        &self.metadata
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// The server status code of a failed summary.
    pub fn code(&self) -> Option<&str> {
        self.metadata.get("code").and_then(BoltValue::as_str)
    }

    /// The human-readable message of a failed summary.
    pub fn message(&self) -> Option<&str> {
        self.metadata.get("message").and_then(BoltValue::as_str)
    }
}

/// The terminal value of a response: a [`Summary`], or the IGNORED
/// sentinel.
///
/// IGNORED is not an error. It marks a request the server skipped
/// because an earlier pipelined request failed; it is distinct from both
/// a successful and a failed summary and counts as unsuccessful.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Summary(Summary),
    Ignored,
}

impl Outcome {
    /// True only for a successful [`Summary`]; IGNORED and failures are
    /// both unsuccessful.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Summary(summary) => summary.success(),
            Self::Ignored => false,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Self::Summary(summary) => Some(summary),
            Self::Ignored => None,
        }
    }

    pub fn metadata(&self) -> Option<&BoltDict> {
        self.summary().map(Summary::metadata)
    }
}

/// An opaque causal-consistency token from a COMMIT summary.
///
/// Passing it back as a bookmark on a later transaction's options makes
/// the server wait until it has seen the committed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark(Option<String>);

impl Bookmark {
    pub(crate) fn new(value: Option<String>) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_summary_exposes_code_and_message() {
        let summary = Summary::new(
            BoltDict::from([
                (
                    "code".to_string(),
                    BoltValue::String("Neo.ClientError.Statement.SyntaxError".into()),
                ),
                ("message".to_string(), BoltValue::String("boom".into())),
            ]),
            false,
        );
        assert!(!summary.success());
        assert_eq!(summary.code(), Some("Neo.ClientError.Statement.SyntaxError"));
        assert_eq!(summary.message(), Some("boom"));
    }

    #[test]
    fn ignored_is_not_success() {
        assert!(!Outcome::Ignored.is_success());
        assert!(Outcome::Ignored.is_ignored());
        assert!(Outcome::Ignored.summary().is_none());
    }

    #[test]
    fn successful_summary_outcome() {
        let outcome = Outcome::Summary(Summary::new(BoltDict::new(), true));
        assert!(outcome.is_success());
        assert!(!outcome.is_ignored());
    }
}
