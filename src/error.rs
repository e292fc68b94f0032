use thiserror::Error;

/// Result type for tolc-sema operations
pub type Result<T> = std::result::Result<T, Error>;

/// Hard failures of the semantic core.
///
/// User-facing problems in the analysed program are reported as
/// diagnostics through [`crate::common::diag::Log`] and never surface
/// here. Only configuration problems, provider failures and internal
/// invariant violations do.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Internal compiler error while {context}: {message}")]
    Internal { context: String, message: String },

    #[error("Class file for {class} not found: {reason}")]
    CompletionFailure { class: String, reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create an internal error with the phase that was running
    pub fn internal(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a completion failure for a class that could not be supplied
    pub fn completion_failure(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CompletionFailure {
            class: class.into(),
            reason: reason.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn is_completion_failure(&self) -> bool {
        matches!(self, Self::CompletionFailure { .. })
    }
}

/// Build an [`Error::Internal`] carrying the analysis context.
///
/// ```ignore
/// return Err(internal_error!("lowering switch", "unexpected label {:?}", label));
/// ```
#[macro_export]
macro_rules! internal_error {
    ($context:expr, $($arg:tt)+) => {
        $crate::error::Error::internal($context, format!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_macro_formats_message() {
        let err = internal_error!("entering class", "missing owner for {}", "Foo");
        assert_eq!(
            err.to_string(),
            "Internal compiler error while entering class: missing owner for Foo"
        );
    }

    #[test]
    fn completion_failure_is_distinguishable() {
        let err = Error::completion_failure("p.Missing", "no such class");
        assert!(err.is_completion_failure());
        assert!(!Error::config_error("x").is_completion_failure());
    }
}
