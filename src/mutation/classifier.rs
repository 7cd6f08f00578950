//! Classification of deploy and test failures into mutant verdicts.

use crate::core::Error;

use super::MutantStatus;

/// Prefix the platform puts on compilation failures.
pub const DEPLOYMENT_FAILURE_MARKER: &str = "Deployment failed";

/// Markers of governor/usage limit exceptions.
pub const GOVERNOR_LIMIT_MARKERS: &[&str] = &["System.LimitException", "LIMIT_EXCEEDED"];

/// Outcome of classifying a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: MutantStatus,
    pub reason: Option<String>,
}

impl Verdict {
    fn new(status: MutantStatus, reason: Option<String>) -> Self {
        Self { status, reason }
    }
}

/// One step in the classification chain.
pub trait FailureClassifier: Send + Sync {
    /// Return a verdict if this classifier recognizes the message.
    fn classify(&self, message: &str) -> Option<Verdict>;
}

/// Compilation failures: the mutant never reached the tests.
pub struct DeploymentFailureClassifier;

impl FailureClassifier for DeploymentFailureClassifier {
    fn classify(&self, message: &str) -> Option<Verdict> {
        message
            .starts_with(DEPLOYMENT_FAILURE_MARKER)
            .then(|| Verdict::new(MutantStatus::CompileError, Some(message.to_string())))
    }
}

/// Governor limit exceptions count as kills.
pub struct GovernorLimitClassifier;

impl FailureClassifier for GovernorLimitClassifier {
    fn classify(&self, message: &str) -> Option<Verdict> {
        GOVERNOR_LIMIT_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
            .then(|| Verdict::new(MutantStatus::Killed, None))
    }
}

/// Anything else is a runtime error.
pub struct RuntimeErrorClassifier;

impl FailureClassifier for RuntimeErrorClassifier {
    fn classify(&self, message: &str) -> Option<Verdict> {
        Some(Verdict::new(
            MutantStatus::RuntimeError,
            Some(message.to_string()),
        ))
    }
}

/// Ordered chain of classifiers; the first match wins.
pub struct ClassifierChain {
    classifiers: Vec<Box<dyn FailureClassifier>>,
}

impl Default for ClassifierChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(DeploymentFailureClassifier),
            Box::new(GovernorLimitClassifier),
            Box::new(RuntimeErrorClassifier),
        ])
    }
}

impl ClassifierChain {
    pub fn new(classifiers: Vec<Box<dyn FailureClassifier>>) -> Self {
        Self { classifiers }
    }

    /// Classify a raw failure message.
    pub fn classify_message(&self, message: &str) -> Verdict {
        self.classifiers
            .iter()
            .find_map(|c| c.classify(message))
            .unwrap_or_else(|| Verdict::new(MutantStatus::RuntimeError, Some(message.to_string())))
    }

    /// Classify an error raised by a deploy or test call.
    pub fn classify(&self, error: &Error) -> Verdict {
        self.classify_message(&error.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_failure_is_compile_error() {
        let chain = ClassifierChain::default();
        let message = "Deployment failed: Calculator line 4: Unexpected token '*-'";
        let verdict = chain.classify(&Error::remote(message));
        assert_eq!(verdict.status, MutantStatus::CompileError);
        assert_eq!(verdict.reason.as_deref(), Some(message));
    }

    #[test]
    fn test_marker_must_be_a_prefix() {
        let chain = ClassifierChain::default();
        let verdict = chain.classify_message("Error: Deployment failed later");
        assert_eq!(verdict.status, MutantStatus::RuntimeError);
    }

    #[test]
    fn test_governor_limit_is_killed() {
        let chain = ClassifierChain::default();
        let verdict = chain.classify_message(
            "System.LimitException: Too many SOQL queries: 101",
        );
        assert_eq!(verdict.status, MutantStatus::Killed);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn test_other_errors_are_runtime_errors() {
        let chain = ClassifierChain::default();
        let verdict = chain.classify(&Error::remote("Request timed out"));
        assert_eq!(verdict.status, MutantStatus::RuntimeError);
        assert_eq!(verdict.reason.as_deref(), Some("Request timed out"));
    }

    #[test]
    fn test_non_remote_errors_are_stringified() {
        let chain = ClassifierChain::default();
        let io = std::io::Error::other("connection reset");
        let verdict = chain.classify(&Error::from(io));
        assert_eq!(verdict.status, MutantStatus::RuntimeError);
        assert_eq!(verdict.reason.as_deref(), Some("I/O error: connection reset"));
    }

    #[test]
    fn test_empty_chain_falls_back_to_runtime_error() {
        let chain = ClassifierChain::new(Vec::new());
        assert_eq!(
            chain.classify_message("anything").status,
            MutantStatus::RuntimeError
        );
    }
}
