//! Stateful consumer that turns raw response chunks into stream events.
//!
//! Chunks are decoded, appended to a text buffer, and every complete
//! segment (terminated by a blank line) is cut off the front of the buffer
//! and parsed. Whatever follows the last separator stays buffered until the
//! next chunk or [`StreamConsumer::finalize`].

use crate::sse::decoder::Utf8StreamDecoder;
use crate::sse::events::{SseParseError, StreamEvent};
use crate::sse::parser::parse_segment;

/// Blank line separating two events
pub const EVENT_SEPARATOR: &str = "\n\n";

/// Incremental chat stream consumer.
///
/// One consumer serves exactly one response body.
#[derive(Debug, Default)]
pub struct StreamConsumer {
    decoder: Utf8StreamDecoder,
    /// Decoded text that has not yet formed a complete segment
    buffer: String,
    /// Count of segments skipped as malformed
    skipped: usize,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk and return the events it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let text = self.decoder.decode(chunk);
        self.buffer.push_str(&text);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find(EVENT_SEPARATOR) {
            let segment: String = self.buffer.drain(..pos + EVENT_SEPARATOR.len()).collect();
            self.accept(&segment[..pos], &mut events);
        }
        events
    }

    /// Parse whatever is left once the transport reports end of stream.
    ///
    /// The remainder is treated as one final segment; the buffer is empty
    /// afterwards, so a second call returns nothing.
    pub fn finalize(&mut self) -> Vec<StreamEvent> {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);

        let remainder = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        self.accept(&remainder, &mut events);
        events
    }

    /// Drop buffered text and decoder state without parsing it.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.decoder.reset();
    }

    /// Text received but not yet terminated by a separator
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Number of malformed segments skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn accept(&mut self, segment: &str, events: &mut Vec<StreamEvent>) {
        match parse_segment(segment) {
            Ok(Some(event)) => {
                tracing::debug!(event_type = event.event_type_name(), "stream event parsed");
                events.push(event);
            }
            Ok(None) => {}
            Err(SseParseError::MissingDataPrefix) => {
                self.skipped += 1;
                tracing::debug!(segment = %segment.trim(), "skipping segment without data prefix");
            }
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(error = %e, segment = %segment.trim(), "failed to parse SSE segment");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::events::SourceDocument;

    fn token(content: &str) -> StreamEvent {
        StreamEvent::Token {
            content: content.to_string(),
        }
    }

    fn feed_all(chunks: &[&[u8]]) -> Vec<StreamEvent> {
        let mut consumer = StreamConsumer::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(consumer.feed(chunk));
        }
        events.extend(consumer.finalize());
        events
    }

    const FULL_STREAM: &str = concat!(
        "data: {\"type\":\"search_complete\",\"doc_count\":2}\n\n",
        "data: {\"type\":\"token\",\"content\":\"根据\"}\n\n",
        "data: {\"type\":\"token\",\"content\":\"文档😀\"}\n\n",
        "data: {\"type\":\"sources\",\"documents\":[{\"id\":3,\"name\":\"手册.pdf\"}]}\n\n",
        "data: {\"type\":\"done\"}\n\n",
    );

    #[test]
    fn test_token_split_across_chunks() {
        let events = feed_all(&[
            b"data: {\"typ",
            b"e\":\"token\",\"content\":\"Hi\"}\n\n",
        ]);
        assert_eq!(events, vec![token("Hi")]);
    }

    #[test]
    fn test_incomplete_segment_is_retained() {
        let mut consumer = StreamConsumer::new();
        assert!(consumer.feed(b"data: {\"type\":\"token\",").is_empty());
        assert_eq!(consumer.buffered(), "data: {\"type\":\"token\",");

        let events = consumer.feed(b"\"content\":\"a\"}\n\ndata: {\"type\"");
        assert_eq!(events, vec![token("a")]);
        assert_eq!(consumer.buffered(), "data: {\"type\"");
    }

    #[test]
    fn test_separator_split_across_chunks() {
        let mut consumer = StreamConsumer::new();
        assert!(consumer
            .feed(b"data: {\"type\":\"token\",\"content\":\"x\"}\n")
            .is_empty());
        assert_eq!(consumer.feed(b"\n"), vec![token("x")]);
        assert_eq!(consumer.buffered(), "");
    }

    #[test]
    fn test_any_chunking_matches_single_feed() {
        let bytes = FULL_STREAM.as_bytes();
        let expected = feed_all(&[bytes]);
        assert_eq!(expected.len(), 5);

        for split in 0..=bytes.len() {
            let events = feed_all(&[&bytes[..split], &bytes[split..]]);
            assert_eq!(events, expected, "split at byte {}", split);
        }

        // One byte at a time
        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(feed_all(&singles), expected);
    }

    #[test]
    fn test_multibyte_content_survives_byte_splits() {
        let events = feed_all(&FULL_STREAM.as_bytes().chunks(3).collect::<Vec<_>>());
        assert_eq!(events[1], token("根据"));
        assert_eq!(events[2], token("文档😀"));
        assert_eq!(
            events[3],
            StreamEvent::Sources {
                documents: vec![SourceDocument::new(3, "手册.pdf")]
            }
        );
    }

    #[test]
    fn test_segment_without_prefix_is_consumed_silently() {
        let mut consumer = StreamConsumer::new();
        let events = consumer.feed(b"event: token\n\n: ping\n\n");
        assert!(events.is_empty());
        assert_eq!(consumer.buffered(), "");
        assert_eq!(consumer.skipped(), 2);
    }

    #[test]
    fn test_malformed_json_does_not_abort_stream() {
        let mut consumer = StreamConsumer::new();
        let events = consumer.feed(
            b"data: {\"type\":\"token\",\"content\":\"a\"}\n\n\
              data: {broken\n\n\
              data: {\"type\":\"token\",\"content\":\"b\"}\n\n",
        );
        assert_eq!(events, vec![token("a"), token("b")]);
        assert_eq!(consumer.skipped(), 1);
    }

    #[test]
    fn test_blank_segments_are_ignored() {
        let mut consumer = StreamConsumer::new();
        let events = consumer.feed(b"\n\n\n\n  \n\ndata: {\"type\":\"done\"}\n\n");
        assert_eq!(events, vec![StreamEvent::Done]);
        assert_eq!(consumer.skipped(), 0);
    }

    #[test]
    fn test_finalize_parses_trailing_event() {
        let mut consumer = StreamConsumer::new();
        assert!(consumer.feed(b"data: {\"type\":\"done\"}").is_empty());
        assert_eq!(consumer.finalize(), vec![StreamEvent::Done]);
        assert_eq!(consumer.buffered(), "");
        assert!(consumer.finalize().is_empty());
    }

    #[test]
    fn test_finalize_drops_incomplete_trailing_event() {
        let mut consumer = StreamConsumer::new();
        consumer.feed(b"data: {\"type\":\"token\",\"content\":\"unfinished");
        assert!(consumer.finalize().is_empty());
        assert_eq!(consumer.buffered(), "");
    }

    #[test]
    fn test_finalize_drops_trailing_text_without_prefix() {
        let mut consumer = StreamConsumer::new();
        consumer.feed(b"{\"type\":\"done\"}");
        assert!(consumer.finalize().is_empty());
    }

    #[test]
    fn test_reset_discards_buffer() {
        let mut consumer = StreamConsumer::new();
        consumer.feed(b"data: {\"type\":\"done\"}");
        consumer.reset();
        assert_eq!(consumer.buffered(), "");
        assert!(consumer.finalize().is_empty());
    }

    #[test]
    fn test_events_after_done_are_still_emitted_in_order() {
        // Filtering post-terminal events is the turn's job, not the consumer's
        let events = feed_all(&[b"data: {\"type\":\"done\"}\n\ndata: {\"type\":\"token\",\"content\":\"late\"}\n\n"]);
        assert_eq!(events, vec![StreamEvent::Done, token("late")]);
    }
}
