use {super::error::PipelineError, async_trait::async_trait, std::sync::Arc, uuid::Uuid};

/// Structured record shipped to the diagnostic sink when something fails.
/// `message` is the display form, `detail` the full debug form — the
/// redacted string on the purchase record never comes from here.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    pub id: Uuid,
    pub resource_type: String,
    pub function: String,
    pub message: String,
    pub detail: String,
    pub context: serde_json::Value,
}

/// Append-only external log. Implementations make one attempt and swallow
/// their own failures — losing a diagnostic must never fail the caller.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn record(&self, event: &DiagnosticEvent);
}

/// Captures raw errors with context and hands them to the sink. Awaited so
/// ordering is deterministic, but infallible from the caller's view.
#[derive(Clone)]
pub struct ErrorReporter {
    sink: Arc<dyn DiagnosticSink>,
}

impl ErrorReporter {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    pub async fn report(
        &self,
        resource_type: &str,
        function: &str,
        error: &PipelineError,
        context: serde_json::Value,
    ) {
        let event = DiagnosticEvent {
            id: Uuid::now_v7(),
            resource_type: resource_type.to_string(),
            function: function.to_string(),
            message: error.to_string(),
            detail: format!("{error:?}"),
            context,
        };
        self.sink.record(&event).await;
    }
}
