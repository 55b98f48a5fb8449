//! NDJSON stream decoding for chat and comparison responses.
//!
//! This module converts the raw byte stream of an `application/x-ndjson`
//! response body into a lazy stream of [`ChatDelta`] values. Records are
//! framed on newlines at the byte level before UTF-8 decoding, so a
//! multi-byte character split across chunk boundaries is reassembled
//! intact. Malformed lines are counted and skipped; they never abort the
//! stream.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::observability::{STREAM_BYTES, STREAM_DELTAS, STREAM_PARSE_ERRORS, STREAM_RECORDS};
use crate::types::{ChatDelta, StreamRecord};

/// Decoder state threaded through the unfold loop.
struct DecodeState<S> {
    source: S,
    buffer: BytesMut,
    finished: bool,
}

/// What one complete line contributes to the output stream.
enum LineOutcome {
    /// Nothing to yield; keep decoding.
    Skip,
    /// A content delta to yield.
    Delta(ChatDelta),
    /// Terminal record: optionally one final citations delta, then end.
    Terminal(Option<ChatDelta>),
    /// Terminal record carrying an in-band service error.
    Fail(Error),
}

/// Decodes a response byte stream into a stream of [`ChatDelta`]s.
///
/// The returned stream is single-pass and forward-only: it terminates when
/// the terminal record (`done: true`) arrives or the byte stream closes,
/// and cannot be restarted. Dropping it mid-stream drops the underlying
/// byte stream, releasing the transport on every exit path.
///
/// Chat and comparison responses share this routine; they differ only in
/// endpoint and request payload, never in record shape.
pub fn chat_deltas<S>(byte_stream: S) -> impl Stream<Item = Result<ChatDelta>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    let state = DecodeState {
        source: byte_stream,
        buffer: BytesMut::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            // Drain complete lines already buffered before pulling more bytes.
            while let Some(line) = take_line(&mut state.buffer) {
                match decode_line(&line) {
                    LineOutcome::Skip => continue,
                    LineOutcome::Delta(delta) => {
                        STREAM_DELTAS.click();
                        return Some((Ok(delta), state));
                    }
                    LineOutcome::Terminal(final_delta) => {
                        state.finished = true;
                        return match final_delta {
                            Some(delta) => {
                                STREAM_DELTAS.click();
                                Some((Ok(delta), state))
                            }
                            None => None,
                        };
                    }
                    LineOutcome::Fail(err) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                }
            }

            match state.source.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    state.buffer.extend_from_slice(&bytes);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((
                        Err(Error::streaming(
                            format!("error in HTTP stream: {err}"),
                            Some(Box::new(err)),
                        )),
                        state,
                    ));
                }
                None => {
                    // The wire contract newline-terminates every record, so a
                    // non-empty trailing fragment here is discarded.
                    return None;
                }
            }
        }
    })
}

/// Splits one newline-terminated line off the front of the buffer.
///
/// Returns `None` while the buffer holds only an incomplete fragment; the
/// fragment stays buffered for the next chunk.
fn take_line(buffer: &mut BytesMut) -> Option<Bytes> {
    let newline = buffer.iter().position(|&b| b == b'\n')?;
    let mut line = buffer.split_to(newline + 1);
    line.truncate(newline);
    if line.last() == Some(&b'\r') {
        let len = line.len();
        line.truncate(len - 1);
    }
    Some(line.freeze())
}

/// Decodes one complete line into its contribution to the output stream.
fn decode_line(line: &[u8]) -> LineOutcome {
    let Ok(text) = std::str::from_utf8(line) else {
        STREAM_PARSE_ERRORS.click();
        return LineOutcome::Skip;
    };
    let text = text.trim();
    if text.is_empty() {
        return LineOutcome::Skip;
    }

    let record: StreamRecord = match serde_json::from_str(text) {
        Ok(record) => record,
        Err(_) => {
            STREAM_PARSE_ERRORS.click();
            return LineOutcome::Skip;
        }
    };
    STREAM_RECORDS.click();

    if record.done {
        if let Some(message) = record.error {
            return LineOutcome::Fail(Error::streaming(
                format!("service reported an error: {message}"),
                None,
            ));
        }
        return LineOutcome::Terminal(record.sources.map(ChatDelta::sources));
    }

    match record.content_fragment() {
        Some(content) => LineOutcome::Delta(ChatDelta::text(content)),
        None => LineOutcome::Skip,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::stream;
    use serde_json::json;

    use super::*;

    type Chunks = stream::Iter<std::vec::IntoIter<std::result::Result<Bytes, reqwest::Error>>>;

    fn chunks(parts: &[&[u8]]) -> Chunks {
        let owned: Vec<_> = parts
            .iter()
            .map(|part| Ok(Bytes::copy_from_slice(part)))
            .collect();
        stream::iter(owned)
    }

    async fn collect_texts<S>(body: S) -> Vec<String>
    where
        S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
    {
        let mut deltas = Box::pin(chat_deltas(body));
        let mut texts = Vec::new();
        while let Some(item) = deltas.next().await {
            if let Some(text) = item.unwrap().as_text() {
                texts.push(text.to_string());
            }
        }
        texts
    }

    #[tokio::test]
    async fn concatenation_preserves_arrival_order() {
        let body = chunks(&[
            b"{\"message\":{\"content\":\"The \"}}\n",
            b"{\"content\":\"merging \"}\n{\"message\":{\"content\":\"unit\"}}\n",
            b"{\"done\":true}\n",
        ]);
        let texts = collect_texts(body).await;
        assert_eq!(texts.concat(), "The merging unit");
    }

    #[tokio::test]
    async fn terminal_sources_yield_one_final_delta() {
        let body = chunks(&[
            b"{\"content\":\"a\"}\n",
            b"{\"done\":true,\"sources\":[\"IEC 61850-9-2 \\u00a75\"]}\n",
        ]);
        let mut deltas = Box::pin(chat_deltas(body));

        let first = deltas.next().await.unwrap().unwrap();
        assert_eq!(first.as_text(), Some("a"));

        let last = deltas.next().await.unwrap().unwrap();
        assert!(last.is_sources());
        assert_eq!(last.as_sources(), Some(&json!(["IEC 61850-9-2 §5"])));

        assert!(deltas.next().await.is_none());
    }

    #[tokio::test]
    async fn terminal_without_sources_yields_nothing() {
        let body = chunks(&[b"{\"content\":\"a\"}\n{\"done\":true}\n"]);
        let mut deltas = Box::pin(chat_deltas(body));
        assert_eq!(deltas.next().await.unwrap().unwrap().as_text(), Some("a"));
        assert!(deltas.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_line_is_skipped_not_fatal() {
        let body = chunks(&[b"{\"content\":\"a\"}\n{not json}\n{\"content\":\"b\"}\n{\"done\":true}\n"]);
        let texts = collect_texts(body).await;
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn valid_json_without_content_yields_nothing() {
        let body = chunks(&[
            b"{\"model\":\"llama3.1:latest\"}\n",
            b"{\"message\":{\"content\":\"\"}}\n",
            b"{\"content\":\"x\"}\n",
            b"{\"done\":true}\n",
        ]);
        let texts = collect_texts(body).await;
        assert_eq!(texts, vec!["x"]);
    }

    #[tokio::test]
    async fn utf8_split_across_chunk_boundary() {
        // "é" is 0xC3 0xA9; the boundary falls between the two bytes.
        let line = "{\"content\":\"caf\u{e9}\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let body = chunks(&[&line[..split], &line[split..], b"{\"done\":true}\n"]);
        let texts = collect_texts(body).await;
        assert_eq!(texts, vec!["café"]);
    }

    #[tokio::test]
    async fn three_byte_sequence_split_mid_character() {
        // "標" is 0xE6 0xA8 0x99; split after the first byte.
        let line = "{\"content\":\"\u{6a19}\u{6e96}\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xE6).unwrap() + 1;
        let body = chunks(&[&line[..split], &line[split..], b"{\"done\":true}\n"]);
        let texts = collect_texts(body).await;
        assert_eq!(texts, vec!["標準"]);
    }

    #[tokio::test]
    async fn line_split_across_chunks() {
        let body = chunks(&[b"{\"content\":", b"\"spanning\"}", b"\n{\"done\":true}\n"]);
        let texts = collect_texts(body).await;
        assert_eq!(texts, vec!["spanning"]);
    }

    #[tokio::test]
    async fn lines_after_terminal_record_are_ignored() {
        let body = chunks(&[b"{\"done\":true}\n{\"content\":\"late\"}\n"]);
        let texts = collect_texts(body).await;
        assert!(texts.is_empty());
    }

    #[tokio::test]
    async fn trailing_unterminated_fragment_is_dropped() {
        let body = chunks(&[b"{\"content\":\"a\"}\n{\"content\":\"never terminated\"}"]);
        let texts = collect_texts(body).await;
        assert_eq!(texts, vec!["a"]);
    }

    #[tokio::test]
    async fn crlf_lines_decode() {
        let body = chunks(&[b"{\"content\":\"a\"}\r\n{\"done\":true}\r\n"]);
        let texts = collect_texts(body).await;
        assert_eq!(texts, vec!["a"]);
    }

    #[tokio::test]
    async fn in_band_error_surfaces_as_streaming_error() {
        let body = chunks(&[b"{\"content\":\"a\"}\n{\"done\":true,\"error\":\"model not loaded\"}\n"]);
        let mut deltas = Box::pin(chat_deltas(body));
        assert_eq!(deltas.next().await.unwrap().unwrap().as_text(), Some("a"));
        let err = deltas.next().await.unwrap().unwrap_err();
        assert!(err.is_streaming());
        assert!(err.to_string().contains("model not loaded"));
        assert!(deltas.next().await.is_none());
    }

    #[tokio::test]
    async fn decoder_does_not_read_ahead() {
        // Chunks are pulled only when the buffer holds no complete line. A
        // chunk that panics when polled stands guard: yielding the buffered
        // delta must not touch it.
        let good: std::result::Result<Bytes, reqwest::Error> =
            Ok(Bytes::from_static(b"{\"content\":\"a\"}\n"));
        let trap = stream::once(async { panic!("pulled past the buffered line") });
        let body = stream::iter(vec![good]).chain(trap);
        let mut deltas = Box::pin(chat_deltas(Box::pin(body)));
        assert_eq!(deltas.next().await.unwrap().unwrap().as_text(), Some("a"));
    }

    #[tokio::test]
    async fn dropping_mid_stream_releases_source_exactly_once() {
        struct SourceGuard(Arc<AtomicUsize>);
        impl Drop for SourceGuard {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let guard = SourceGuard(drops.clone());
        let parts: Vec<std::result::Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from_static(b"{\"content\":\"a\"}\n")),
            Ok(Bytes::from_static(b"{\"content\":\"b\"}\n")),
            Ok(Bytes::from_static(b"{\"done\":true}\n")),
        ];
        let body = stream::iter(parts).map(move |part| {
            let _held = &guard;
            part
        });

        {
            let mut deltas = Box::pin(chat_deltas(body));
            let first = deltas.next().await.unwrap().unwrap();
            assert_eq!(first.as_text(), Some("a"));
            // Abandon the rest of the stream.
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn take_line_keeps_partial_fragment() {
        let mut buffer = BytesMut::from(&b"complete\npartial"[..]);
        assert_eq!(take_line(&mut buffer).as_deref(), Some(&b"complete"[..]));
        assert!(take_line(&mut buffer).is_none());
        assert_eq!(&buffer[..], b"partial");
    }
}
