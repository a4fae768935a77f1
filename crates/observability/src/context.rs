use std::future::Future;

tokio::task_local! {
    static TRACE_ID: String;
}

/// Run `fut` with `trace_id` as the current trace id.
///
/// Scopes nest; the innermost one wins.
pub async fn with_trace_id<F>(trace_id: impl Into<String>, fut: F) -> F::Output
where
    F: Future,
{
    TRACE_ID.scope(trace_id.into(), fut).await
}

/// Trace id of the enclosing [`with_trace_id`] scope, if any.
pub fn current_trace_id() -> Option<String> {
    TRACE_ID.try_with(|id| id.clone()).ok()
}
