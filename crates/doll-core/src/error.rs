use thiserror::Error;

/// Every failure aborts the whole run; there is no partial figure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FigureError {
    #[error("{context}: invalid parameter: {reason}")]
    InvalidParameter { context: String, reason: String },
    #[error("{context}: depends on `{dependency}`, which has not been created yet")]
    MissingDependency { context: String, dependency: String },
    #[error("{context}: host failed to allocate {resource}: {reason}")]
    HostResourceFailure {
        context: String,
        resource: String,
        reason: String,
    },
}

impl FigureError {
    pub fn invalid(context: impl Into<String>, reason: impl Into<String>) -> Self {
        FigureError::InvalidParameter {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(context: impl Into<String>, dependency: impl Into<String>) -> Self {
        FigureError::MissingDependency {
            context: context.into(),
            dependency: dependency.into(),
        }
    }

    pub fn context(&self) -> &str {
        match self {
            FigureError::InvalidParameter { context, .. }
            | FigureError::MissingDependency { context, .. }
            | FigureError::HostResourceFailure { context, .. } => context,
        }
    }

    /// Prefixes the error context with the enclosing step, `outer/inner`.
    pub fn in_context(mut self, outer: &str) -> Self {
        let context = match &mut self {
            FigureError::InvalidParameter { context, .. }
            | FigureError::MissingDependency { context, .. }
            | FigureError::HostResourceFailure { context, .. } => context,
        };
        let current = std::mem::take(context);
        *context = if current.is_empty() {
            outer.to_string()
        } else if current == outer || current.starts_with(&format!("{outer}/")) {
            current
        } else {
            format!("{outer}/{current}")
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_prefixed_once() {
        let err = FigureError::invalid("", "radius must be positive")
            .in_context("head")
            .in_context("figure");
        assert_eq!(err.context(), "figure/head");
        assert_eq!(
            err.to_string(),
            "figure/head: invalid parameter: radius must be positive"
        );
    }

    #[test]
    fn missing_dependency_message_names_the_dependency() {
        let err = FigureError::missing("smile", "Black");
        assert_eq!(
            err.to_string(),
            "smile: depends on `Black`, which has not been created yet"
        );
    }
}
