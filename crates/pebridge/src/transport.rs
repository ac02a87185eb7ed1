//! Transport seam: word batches in and out of the bridge.
//!
//! The bridge consumes inbound batches of 32-bit UMP words from an mpsc
//! channel and emits response packets through a [`WordSink`]. In-process
//! loopback (tests, the stdio harness) wires both ends to channels; a BLE
//! or RTP transport would implement [`WordSink`] over its own session.
//! Connection lifecycle belongs to the transport, not the bridge.
//!
//! The stdio harness frames one batch per line of whitespace-separated
//! hex words; the helpers at the bottom implement that framing.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// The outbound side of the transport is gone.
#[derive(Debug, Error)]
#[error("transport closed")]
pub struct TransportClosed;

/// Outbound half of a word transport.
///
/// Sends are invoked concurrently from in-flight response tasks, so
/// implementations must be safe to share.
#[async_trait]
pub trait WordSink: Send + Sync {
    /// Deliver one packet's words, in order.
    async fn send(&self, words: &[u32]) -> Result<(), TransportClosed>;
}

#[async_trait]
impl WordSink for mpsc::Sender<Vec<u32>> {
    async fn send(&self, words: &[u32]) -> Result<(), TransportClosed> {
        mpsc::Sender::send(self, words.to_vec())
            .await
            .map_err(|_| TransportClosed)
    }
}

/// Parse one line of whitespace-separated hex words.
///
/// Accepts an optional `0x` prefix per token. Returns `None` if any token
/// is not a 32-bit hex value; an empty line parses as an empty batch.
pub fn parse_word_line(line: &str) -> Option<Vec<u32>> {
    line.split_whitespace()
        .map(|token| u32::from_str_radix(token.trim_start_matches("0x"), 16).ok())
        .collect()
}

/// Format words as a single lowercase hex line.
pub fn format_word_line(words: &[u32]) -> String {
    words
        .iter()
        .map(|w| format!("{w:08x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn word_line_round_trip() {
        let words = vec![0x3001_486f, 0x6f74_0000];
        let line = format_word_line(&words);
        assert_eq!(line, "3001486f 6f740000");
        assert_eq!(parse_word_line(&line), Some(words));
    }

    #[test]
    fn parse_accepts_0x_prefix() {
        assert_eq!(
            parse_word_line("0x30014142 0x43000000"),
            Some(vec![0x3001_4142, 0x4300_0000])
        );
    }

    #[test]
    fn parse_rejects_non_hex_tokens() {
        assert_eq!(parse_word_line("3001 nope"), None);
        assert_eq!(parse_word_line("123456789"), None);
    }

    #[test]
    fn empty_line_is_an_empty_batch() {
        assert_eq!(parse_word_line(""), Some(Vec::new()));
    }

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (tx, mut rx) = mpsc::channel::<Vec<u32>>(4);
        let sink: &dyn WordSink = &tx;
        sink.send(&[1, 2]).await.unwrap();
        sink.send(&[3, 4]).await.unwrap();
        assert_eq!(rx.recv().await, Some(vec![1, 2]));
        assert_eq!(rx.recv().await, Some(vec![3, 4]));
    }

    #[tokio::test]
    async fn closed_channel_reports_transport_closed() {
        let (tx, rx) = mpsc::channel::<Vec<u32>>(1);
        drop(rx);
        let sink: &dyn WordSink = &tx;
        assert!(sink.send(&[0]).await.is_err());
    }
}
