//! Request-scoped correlation context for tracing spans.

use tracing::Span;
use uuid::Uuid;

/// A correlation context threaded through one logical operation
/// (a scheduler turn, a headless run) so every span it opens carries
/// the same request id.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    component: String,
    operation: Option<String>,
}

impl RequestContext {
    /// Start a new context for `component`, with a freshly generated
    /// request id.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            component: component.into(),
            operation: None,
        }
    }

    /// Attach an operation name, shown in the span.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// This context's request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Open a tracing span carrying this context's fields. Entering the
    /// returned span is the caller's responsibility (`span.enter()`
    /// returns a [`RequestGuard`]-compatible guard).
    pub fn span(&self) -> Span {
        match &self.operation {
            Some(operation) => tracing::info_span!(
                "request",
                request_id = %self.request_id,
                component = %self.component,
                operation = %operation,
            ),
            None => tracing::info_span!(
                "request",
                request_id = %self.request_id,
                component = %self.component,
            ),
        }
    }
}

/// The guard returned by entering a [`RequestContext`]'s span. This is
/// a type alias rather than a wrapper: `tracing::span::Entered<'_>`
/// already does the right thing on drop.
pub type RequestGuard<'a> = tracing::span::Entered<'a>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_carries_a_generated_id() {
        let ctx = RequestContext::new("scheduler");
        assert!(!ctx.request_id().is_empty());
    }

    #[test]
    fn with_operation_is_chainable() {
        let ctx = RequestContext::new("scheduler").with_operation("pack_prompt");
        assert_eq!(ctx.operation.as_deref(), Some("pack_prompt"));
    }
}
