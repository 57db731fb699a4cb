use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Span};

/// Per-request context carrying a log correlation id and a cancellation
/// token. Cloning shares both.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    log_id: Option<String>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Start a new context whose log id is `"{date}_{time}_{postfix}"` in UTC.
    pub fn new(postfix: &str) -> Self {
        let log_id = generate_log_id(Utc::now(), postfix);
        info!(log_id = %log_id, "Created request context");

        Self {
            log_id: Some(log_id),
            cancel: CancellationToken::new(),
        }
    }

    /// Context without a log id, for work that is not tied to a request.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_log_id<S: Into<String>>(log_id: S) -> Self {
        Self {
            log_id: Some(log_id.into()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn log_id(&self) -> Option<&str> {
        self.log_id.as_deref()
    }

    /// Derived context with the same log id. Cancelling the parent cancels the
    /// child, not the other way round.
    pub fn child(&self) -> Self {
        Self {
            log_id: self.log_id.clone(),
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Span tagged with this context's log id, for `tracing::Instrument`.
    pub fn span(&self) -> Span {
        info_span!("request", log_id = self.log_id().unwrap_or(UNKNOWN_LOG_ID))
    }
}

pub(crate) const UNKNOWN_LOG_ID: &str = "unknown";

fn generate_log_id(now: DateTime<Utc>, postfix: &str) -> String {
    format!(
        "{}_{}_{}",
        now.format("%Y-%m-%d"),
        now.format("%H:%M:%S"),
        postfix
    )
}
