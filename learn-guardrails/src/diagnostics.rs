//! Content-validation failures and path-qualified diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Path label used for diagnostics about the whole document.
pub const ROOT_PATH: &str = "<root>";

/// Result of one validation stage: the accepted value or the violated rules.
pub type ValidationOutcome<T> = Result<T, ContentViolation>;

/// One violated rule, qualified by the path of the offending value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    path: String,
    message: String,
}

impl Diagnostic {
    /// Creates a diagnostic for the supplied path.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a diagnostic about the whole document.
    #[must_use]
    pub fn root(message: impl Into<String>) -> Self {
        Self::new(ROOT_PATH, message)
    }

    /// Returns the dotted path (`flashcards[2].answer`).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the violation message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Pipeline stage that rejected a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    /// Raw completion could not be turned into JSON.
    Parse,
    /// JSON failed the template response schema.
    Schema,
    /// JSON failed the template guardrails.
    Guardrail,
    /// JSON failed the technique's domain contract.
    Domain,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parse => "response parsing",
            Self::Schema => "schema validation",
            Self::Guardrail => "guardrail check",
            Self::Domain => "domain validation",
        })
    }
}

/// A content-quality failure: retryable, never a sign of infrastructure trouble.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentViolation {
    stage: ValidationStage,
    diagnostics: Vec<Diagnostic>,
}

impl ContentViolation {
    /// Creates a violation from diagnostics in report order.
    #[must_use]
    pub fn new(stage: ValidationStage, diagnostics: Vec<Diagnostic>) -> Self {
        Self { stage, diagnostics }
    }

    /// Creates a violation carrying a single diagnostic.
    #[must_use]
    pub fn single(stage: ValidationStage, diagnostic: Diagnostic) -> Self {
        Self::new(stage, vec![diagnostic])
    }

    /// Returns the rejecting stage.
    #[must_use]
    pub const fn stage(&self) -> ValidationStage {
        self.stage
    }

    /// Returns the diagnostics in report order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Joins the diagnostics with `; `.
    #[must_use]
    pub fn summary(&self) -> String {
        join_diagnostics(&self.diagnostics)
    }
}

impl fmt::Display for ContentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.summary())
    }
}

impl std::error::Error for ContentViolation {}

/// Joins diagnostics with `; ` in the order given.
#[must_use]
pub fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Converts a JSON pointer (`/flashcards/2/answer`) into a dotted path
/// (`flashcards[2].answer`). The empty pointer maps to [`ROOT_PATH`].
#[must_use]
pub fn pointer_to_path(pointer: &str) -> String {
    let mut path = String::new();
    for token in pointer.split('/').skip(1) {
        let token = token.replace("~1", "/").replace("~0", "~");
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(&token);
            path.push(']');
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(&token);
        }
    }
    if path.is_empty() {
        ROOT_PATH.to_owned()
    } else {
        path
    }
}
