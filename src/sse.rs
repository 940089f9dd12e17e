//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module handles parsing of the SSE streams returned by the chat
//! completions endpoint, converting raw byte streams into [`ChatStreamEvent`]s.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::types::{ChatCompletionChunk, ChatStreamEvent};
use crate::{Error, Result};

/// Process a stream of bytes into a stream of server-sent events.
///
/// Events are delimited by blank lines. Each event's `data:` lines are joined
/// and decoded as a [`ChatCompletionChunk`], except for the `[DONE]` sentinel.
/// Comment lines and events without data are skipped.
///
/// ```
/// # use bytes::Bytes;
/// # use futures::StreamExt;
/// # use groqchat::ChatStreamEvent;
/// # use groqchat::sse::process_sse;
/// # tokio_test::block_on(async {
/// let body = "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";
/// let bytes = futures::stream::iter(vec![Ok::<_, reqwest::Error>(Bytes::from(body))]);
/// let events: Vec<_> = process_sse(bytes).collect().await;
/// match &events[0] {
///     Ok(ChatStreamEvent::Chunk(chunk)) => assert_eq!(chunk.text_delta(), Some("Hi")),
///     other => panic!("unexpected event: {other:?}"),
/// }
/// assert!(matches!(events[1], Ok(ChatStreamEvent::Done)));
/// # });
/// ```
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatStreamEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let stream = Box::pin(byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    }));

    let pending: Vec<u8> = Vec::new();
    let buffer = String::new();

    stream::unfold(
        (stream, pending, buffer),
        move |(mut stream, mut pending, mut buffer)| async move {
            loop {
                while let Some((event, remaining)) = extract_event(&buffer) {
                    buffer = remaining;
                    if let Some(event) = event {
                        record(&event);
                        return Some((event, (stream, pending, buffer)));
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        pending.extend_from_slice(&bytes);
                        if let Err(err) = decode_utf8(&mut pending, &mut buffer) {
                            STREAM_ERRORS.click();
                            return Some((Err(err), (stream, pending, buffer)));
                        }
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, pending, buffer)));
                    }
                    None => {
                        if !pending.is_empty() {
                            pending.clear();
                            STREAM_ERRORS.click();
                            return Some((
                                Err(Error::encoding(
                                    "stream ended inside a UTF-8 sequence",
                                    None,
                                )),
                                (stream, pending, buffer),
                            ));
                        }
                        // A final event may arrive without its trailing blank line.
                        if !buffer.trim().is_empty() {
                            let tail = std::mem::take(&mut buffer);
                            if let Some(event) = parse_event(&tail) {
                                record(&event);
                                return Some((event, (stream, pending, buffer)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Moves the complete UTF-8 prefix of `pending` into `buffer`.
///
/// A character cut off at the end of `pending` stays there until the next
/// chunk completes it.  Line endings are normalized after joining so that a
/// `\r\n` split across chunks is still recognized.
fn decode_utf8(pending: &mut Vec<u8>, buffer: &mut String) -> Result<()> {
    let mut first_error = None;
    loop {
        let (valid, invalid) = match std::str::from_utf8(&pending[..]) {
            Ok(text) => (text.len(), None),
            Err(e) => (e.valid_up_to(), e.error_len().map(|len| (e, len))),
        };
        buffer.push_str(std::str::from_utf8(&pending[..valid])?);
        pending.drain(..valid);
        match invalid {
            Some((e, len)) => {
                pending.drain(..len);
                first_error.get_or_insert(e);
            }
            None => break,
        }
    }
    if buffer.contains("\r\n") {
        *buffer = buffer.replace("\r\n", "\n");
    }
    match first_error {
        Some(e) => Err(Error::encoding(
            format!("Invalid UTF-8 in stream: {e}"),
            Some(Box::new(e)),
        )),
        None => Ok(()),
    }
}

fn record(event: &Result<ChatStreamEvent>) {
    match event {
        Ok(_) => STREAM_EVENTS.click(),
        Err(_) => STREAM_ERRORS.click(),
    }
}

/// Extract a complete SSE event from a buffer string.
///
/// Returns `None` when the buffer holds no complete event yet.  The inner
/// option is `None` for events that carry nothing to deliver.
fn extract_event(buffer: &str) -> Option<(Option<Result<ChatStreamEvent>>, String)> {
    let (event_text, rest) = buffer.split_once("\n\n")?;
    Some((parse_event(event_text), rest.to_string()))
}

fn parse_event(event_text: &str) -> Option<Result<ChatStreamEvent>> {
    let mut data: Option<String> = None;
    for line in event_text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }

    let data = data?;
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(Ok(ChatStreamEvent::Done));
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(data)
        && let Some(error) = value.get("error")
    {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or(data)
            .to_string();
        let error_type = error
            .get("type")
            .and_then(|t| t.as_str())
            .map(String::from);
        return Some(Err(Error::api(500, error_type, message)));
    }
    Some(
        serde_json::from_str::<ChatCompletionChunk>(data)
            .map(ChatStreamEvent::Chunk)
            .map_err(|e| {
                Error::serialization(
                    format!("Failed to parse event JSON: {e}"),
                    Some(Box::new(e)),
                )
            }),
    )
}
