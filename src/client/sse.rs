//! Server-Sent Events (SSE) stream handling for `message/stream` responses.
//!
//! Decodes SSE frames from the HTTP body and deserializes their `data:`
//! payloads into [`StreamResponse`] events. A body that fails or closes
//! before the agent sent a stream-ending event surfaces as
//! [`A2AError::Disconnected`].

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{A2AError, A2AResult};
use crate::types::StreamResponse;

/// A stream of A2A server-sent events.
///
/// Supports both pull-based (`next()`) and `futures::Stream` consumption.
///
/// # Example
///
/// ```no_run
/// # async fn example(mut stream: a2a_chat::client::SseStream) {
/// while let Some(event) = stream.next().await {
///     match event {
///         Ok(response) => println!("Got event: {:?}", response),
///         Err(e) => eprintln!("Stream error: {}", e),
///     }
/// }
/// # }
/// ```
pub struct SseStream {
    receiver: mpsc::Receiver<A2AResult<StreamResponse>>,
    /// Background reader; aborted when the stream is dropped.
    reader: Option<tokio::task::JoinHandle<()>>,
}

impl Drop for SseStream {
    fn drop(&mut self) {
        if let Some(reader) = &self.reader {
            reader.abort();
        }
    }
}

impl std::fmt::Debug for SseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseStream").finish_non_exhaustive()
    }
}

impl SseStream {
    /// Create an `SseStream` from a raw `reqwest::Response`.
    ///
    /// Spawns a background task that decodes the body and sends parsed
    /// events through a channel.
    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        Self::spawn_reader(response.bytes_stream())
    }

    fn spawn_reader<S, B, E>(body: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send,
        E: std::fmt::Display + Send,
    {
        let (tx, rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            if let Err(e) = pump(body, &tx).await {
                // Receiver may already be gone.
                let _ = tx.send(Err(e)).await;
            }
        });

        Self {
            receiver: rx,
            reader: Some(task),
        }
    }

    /// Create a stream that yields the given items and then ends.
    ///
    /// Useful for custom [`super::Transport`] implementations that do not
    /// read from HTTP.
    pub fn from_events(events: Vec<A2AResult<StreamResponse>>) -> Self {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity matches the item count, so this never fails.
            let _ = tx.try_send(event);
        }
        Self {
            receiver: rx,
            reader: None,
        }
    }

    /// Get the next event from the stream.
    ///
    /// Returns `None` when the stream is exhausted and `Some(Err(...))` on
    /// parse, protocol, or disconnect errors.
    pub async fn next(&mut self) -> Option<A2AResult<StreamResponse>> {
        self.receiver.recv().await
    }
}

impl Stream for SseStream {
    type Item = A2AResult<StreamResponse>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Drive a byte stream through the decoder, forwarding events to `tx`.
async fn pump<S, B, E>(body: S, tx: &mpsc::Sender<A2AResult<StreamResponse>>) -> A2AResult<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = SseDecoder::default();
    let mut finished = false;

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) if finished => {
                debug!("ignoring SSE read error after final event: {e}");
                return Ok(());
            }
            Err(e) => {
                return Err(A2AError::Disconnected(format!(
                    "error reading SSE stream: {e}"
                )))
            }
        };

        for event in decoder.feed(chunk.as_ref())? {
            finished |= event.ends_stream();
            if tx.send(Ok(event)).await.is_err() {
                return Ok(());
            }
        }
    }

    if let Some(event) = decoder.finish()? {
        finished |= event.ends_stream();
        if tx.send(Ok(event)).await.is_err() {
            return Ok(());
        }
    }

    if finished {
        Ok(())
    } else {
        Err(A2AError::Disconnected(
            "agent closed the stream before the exchange finished".to_string(),
        ))
    }
}

/// Incremental SSE frame decoder.
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across chunks decode correctly. Consecutive `data:` lines
/// are joined with `\n` and dispatched at the blank line ending the event.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    data: Option<String>,
}

impl SseDecoder {
    fn feed(&mut self, chunk: &[u8]) -> A2AResult<Vec<StreamResponse>> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = std::str::from_utf8(&line)
                .map_err(|e| A2AError::Transport(format!("invalid UTF-8 in SSE stream: {e}")))?;
            if let Some(event) = self.line(line.trim_end_matches(['\n', '\r']))? {
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Flush whatever is left once the body has ended.
    fn finish(&mut self) -> A2AResult<Option<StreamResponse>> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = std::str::from_utf8(&rest)
            .map_err(|e| A2AError::Transport(format!("invalid UTF-8 in SSE stream: {e}")))?;
        let rest = rest.trim_end_matches('\r');
        if !rest.is_empty() {
            if let Some(event) = self.line(rest)? {
                return Ok(Some(event));
            }
        }
        self.dispatch()
    }

    fn line(&mut self, line: &str) -> A2AResult<Option<StreamResponse>> {
        // Blank line = event boundary.
        if line.is_empty() {
            return self.dispatch();
        }
        // Comments are keep-alives.
        if line.starts_with(':') {
            return Ok(None);
        }
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            }
        }
        // event:, id:, retry: carry nothing the client uses.
        Ok(None)
    }

    fn dispatch(&mut self) -> A2AResult<Option<StreamResponse>> {
        match self.data.take() {
            Some(data) => parse_event_data(&data),
            None => Ok(None),
        }
    }
}

/// Parse one SSE event payload.
///
/// Accepts raw events (the data is a `StreamResponse` directly) and
/// JSON-RPC wrapped events (`{"jsonrpc": "2.0", "id": .., "result": ..}`, as
/// sent by the Python SDK). A wrapped `error` becomes [`A2AError::JsonRpc`].
fn parse_event_data(data: &str) -> A2AResult<Option<StreamResponse>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| {
        A2AError::InvalidJson(format!("failed to parse SSE event data: {e} (data: {data})"))
    })?;

    let event_value = if value.get("jsonrpc").is_some() {
        if let Some(error) = value.get("error") {
            let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(A2AError::JsonRpc {
                code,
                message,
                data: error.get("data").cloned(),
            });
        }
        value.get("result").cloned().ok_or_else(|| {
            A2AError::InvalidJson(format!(
                "JSON-RPC SSE response has neither 'result' nor 'error': {data}"
            ))
        })?
    } else {
        value
    };

    let event: StreamResponse = serde_json::from_value(event_value).map_err(|e| {
        A2AError::InvalidJson(format!(
            "failed to parse SSE event as StreamResponse: {e} (data: {data})"
        ))
    })?;

    Ok(Some(event))
}
