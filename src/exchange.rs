//! Request drivers: run one exchange against a backend and walk the session
//! through its lifecycle.

use crate::api::{QueryBackend, ResponseAccumulator, Utf8ChunkDecoder};
use crate::config::{AppConfig, StreamFilter};
use crate::error::QueryError;
use crate::session::SessionState;
use crate::types::ResponseMode;
use futures::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Access to the session the drivers mutate.
///
/// Each call is short and never held across an await, so UI signals and plain
/// references both work.
pub trait SessionHandle {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut SessionState) -> R) -> R;
}

impl SessionHandle for &mut SessionState {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut **self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct StreamOptions {
    pub filter: StreamFilter,
    pub chunk_delay: Duration,
}

impl From<&AppConfig> for StreamOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            filter: config.filter.clone(),
            chunk_delay: config.chunk_delay,
        }
    }
}

/// Send `text` and show the single JSON answer.
pub async fn run_one_shot<H, B>(
    mut session: H,
    backend: &B,
    text: &str,
) -> Result<String, QueryError>
where
    H: SessionHandle,
    B: QueryBackend + ?Sized,
{
    let query = session.with_session(|s| s.begin_request(text, ResponseMode::Json))?;
    answer_one_shot(session, backend, &query).await
}

/// Second half of [`run_one_shot`], for callers that already ran `begin_request`.
pub async fn answer_one_shot<H, B>(
    mut session: H,
    backend: &B,
    query: &str,
) -> Result<String, QueryError>
where
    H: SessionHandle,
    B: QueryBackend + ?Sized,
{
    info!(endpoint = backend.endpoint(), mode = "json", "sending query");

    match backend.complete(query).await {
        Ok(response) => {
            info!(chars = response.chars().count(), "query answered");
            session.with_session(|s| s.finish_one_shot(query, &response));
            Ok(response)
        }
        Err(err) => {
            error!(error = %err, "query failed");
            session.with_session(|s| s.fail(&err));
            Err(err)
        }
    }
}

/// Send `text` and grow the last assistant message as the body streams in.
pub async fn run_stream<H, B>(
    mut session: H,
    backend: &B,
    text: &str,
    options: &StreamOptions,
    cancel: CancellationToken,
) -> Result<String, QueryError>
where
    H: SessionHandle,
    B: QueryBackend + ?Sized,
{
    let query = session.with_session(|s| s.begin_request(text, ResponseMode::Stream))?;
    stream_response(session, backend, &query, options, cancel).await
}

/// Second half of [`run_stream`], for callers that already ran `begin_request`.
pub async fn stream_response<H, B>(
    mut session: H,
    backend: &B,
    query: &str,
    options: &StreamOptions,
    cancel: CancellationToken,
) -> Result<String, QueryError>
where
    H: SessionHandle,
    B: QueryBackend + ?Sized,
{
    info!(endpoint = backend.endpoint(), mode = "stream", "sending query");

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(QueryError::Cancelled),
        opened = backend.open_stream(query) => opened,
    };
    let mut chunks = match opened {
        Ok(Some(chunks)) => chunks,
        Ok(None) => {
            let err = QueryError::NoResponse("response had no body".to_string());
            warn!(error = %err, "stream skipped");
            session.with_session(|s| s.fail(&err));
            return Err(err);
        }
        Err(err) => {
            if err != QueryError::Cancelled {
                error!(error = %err, "stream request failed");
            }
            session.with_session(|s| s.fail(&err));
            return Err(err);
        }
    };

    session.with_session(|s| s.start_stream());
    let mut decoder = Utf8ChunkDecoder::default();
    let mut accumulated = ResponseAccumulator::new(&options.filter);
    let mut received = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            item = chunks.next() => Some(item),
        };
        let item = match next {
            Some(item) => item,
            None => {
                info!(received, "stream cancelled");
                session.with_session(|s| s.cancel());
                return Err(QueryError::Cancelled);
            }
        };

        match item {
            Some(Ok(bytes)) => {
                received += bytes.len();
                debug!(bytes = bytes.len(), received, "chunk");
                // a held-back partial character means this chunk continues a word
                let join = !decoder.has_pending();
                let piece = decoder.decode(&bytes);
                let current = accumulated.push_with(&piece, join);
                session.with_session(|s| s.publish(current));

                if !options.chunk_delay.is_zero() {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(options.chunk_delay) => {}
                    }
                }
            }
            Some(Err(err)) => {
                let err = QueryError::Truncated {
                    received,
                    reason: err.to_string(),
                };
                error!(error = %err, "stream broke");
                session.with_session(|s| s.fail(&err));
                return Err(err);
            }
            None => break,
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        let current = accumulated.push_with(&tail, false);
        session.with_session(|s| s.publish(current));
    }

    let text = accumulated.into_text();
    info!(received, chars = text.chars().count(), "stream finished");
    session.with_session(|s| s.finish_stream());
    Ok(text)
}
