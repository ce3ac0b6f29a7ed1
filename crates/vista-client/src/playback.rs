// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recorded message streams: gzip-compressed CBOR files replayed on a clock.

use std::io::{Read, Write};
use std::time::Duration;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info};
use vista_proto::Message;

/// Errors raised while loading or saving a recording.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Underlying read or write failed.
    #[error("recording i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The decompressed bytes are not a valid recording.
    #[error("recording encoding: {0}")]
    Codec(String),
    /// The recording holds no messages.
    #[error("recording is empty")]
    Empty,
    /// Timestamps or loop index are out of range.
    #[error("invalid recording: {0}")]
    Invalid(String),
}

/// A timed message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Index to jump back to after the end; `None` plays once.
    pub loop_start_index: Option<usize>,
    /// Total length in seconds, at least the last timestamp.
    pub duration_seconds: f64,
    /// `(seconds, message)` pairs in non-decreasing time order.
    pub messages: Vec<(f64, Message)>,
}

impl Recording {
    /// Check timestamps are finite, ordered and non-negative and the loop
    /// index is in range.
    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.messages.is_empty() {
            return Err(PlaybackError::Empty);
        }
        let mut prev = 0.0_f64;
        for (i, (t, _)) in self.messages.iter().enumerate() {
            if !t.is_finite() || *t < prev {
                return Err(PlaybackError::Invalid(format!("timestamp {t} at index {i}")));
            }
            prev = *t;
        }
        if !self.duration_seconds.is_finite() {
            return Err(PlaybackError::Invalid("duration is not finite".into()));
        }
        if let Some(start) = self.loop_start_index {
            if start >= self.messages.len() {
                return Err(PlaybackError::Invalid(format!(
                    "loop start {start} past {} messages",
                    self.messages.len()
                )));
            }
        }
        Ok(())
    }

    /// Read and validate a gzip-compressed recording.
    pub fn read_from(reader: impl Read) -> Result<Self, PlaybackError> {
        let recording: Self = ciborium::de::from_reader(GzDecoder::new(reader))
            .map_err(|e| PlaybackError::Codec(e.to_string()))?;
        recording.validate()?;
        Ok(recording)
    }

    /// Write as gzip-compressed CBOR.
    pub fn write_to(&self, writer: impl Write) -> Result<(), PlaybackError> {
        let mut gz = GzEncoder::new(writer, Compression::default());
        ciborium::ser::into_writer(self, &mut gz).map_err(|e| PlaybackError::Codec(e.to_string()))?;
        gz.finish()?;
        Ok(())
    }
}

/// Counters reported when [`play`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Messages handed to the sink.
    pub messages: usize,
    /// Times playback jumped back to the loop start.
    pub loops: u32,
}

fn secs(t: f64) -> Duration {
    Duration::try_from_secs_f64(t.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Replay `recording` into `sink` on the tokio clock.
///
/// Timestamps count from the call, so a first message at 0.25 waits a quarter
/// second. Every message whose timestamp has been reached goes out in one
/// batch. A looping recording never finishes; drop the future to stop it.
pub async fn play(recording: &Recording, mut sink: impl FnMut(Message)) -> PlaybackStats {
    let mut stats = PlaybackStats::default();
    let msgs = &recording.messages;
    if msgs.is_empty() {
        return stats;
    }
    let mut index = 0;
    let mut offset = 0.0;
    let mut base = Instant::now();
    loop {
        let next_t = msgs[index].0;
        sleep_until(base + secs(next_t - offset)).await;
        let now_t = (offset + base.elapsed().as_secs_f64()).max(next_t);
        while let Some((t, msg)) = msgs.get(index) {
            if *t > now_t {
                break;
            }
            sink(msg.clone());
            stats.messages += 1;
            index += 1;
        }
        if index < msgs.len() {
            continue;
        }
        let Some(start) = recording.loop_start_index.filter(|s| *s < msgs.len()) else {
            info!(messages = stats.messages, "playback finished");
            return stats;
        };
        let current = offset + base.elapsed().as_secs_f64();
        sleep(secs(recording.duration_seconds - current)).await;
        stats.loops += 1;
        debug!(loop_start = start, loops = stats.loops, "playback looping");
        index = start;
        offset = msgs[start].0;
        base = Instant::now();
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use vista_proto::LabelMessage;

    fn label(name: &str) -> Message {
        Message::Label(LabelMessage {
            name: name.into(),
            text: String::new(),
        })
    }

    fn recording(loop_start_index: Option<usize>) -> Recording {
        Recording {
            loop_start_index,
            duration_seconds: 1.0,
            messages: vec![(0.25, label("/a")), (0.25, label("/b")), (0.75, label("/c"))],
        }
    }

    fn name(msg: &Message) -> String {
        match msg {
            Message::Label(l) => l.name.clone(),
            other => other.kind().to_string(),
        }
    }

    #[test]
    fn file_format_roundtrips_through_gzip() {
        let rec = recording(Some(1));
        let mut bytes = Vec::new();
        rec.write_to(&mut bytes).expect("write");
        assert_eq!(&bytes[..2], &[0x1f, 0x8b], "gzip magic");
        assert_eq!(Recording::read_from(bytes.as_slice()).expect("read"), rec);
    }

    #[test]
    fn invalid_recordings_are_rejected() {
        let mut rec = recording(Some(3));
        assert!(matches!(rec.validate(), Err(PlaybackError::Invalid(_))));
        rec.loop_start_index = None;
        rec.messages.swap(0, 2);
        assert!(matches!(rec.validate(), Err(PlaybackError::Invalid(_))));
        rec.messages.clear();
        assert!(matches!(rec.validate(), Err(PlaybackError::Empty)));
        assert!(matches!(
            Recording::read_from(&b"not gzip"[..]),
            Err(PlaybackError::Codec(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn plays_once_at_recorded_offsets() {
        let start = Instant::now();
        let mut seen = Vec::new();
        let stats = play(&recording(None), |m| seen.push((start.elapsed(), name(&m)))).await;
        assert_eq!(stats, PlaybackStats { messages: 3, loops: 0 });
        assert_eq!(
            seen,
            [
                (Duration::from_millis(250), "/a".to_string()),
                (Duration::from_millis(250), "/b".to_string()),
                (Duration::from_millis(750), "/c".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_message_waits_for_its_timestamp() {
        let rec = Recording {
            loop_start_index: None,
            duration_seconds: 0.25,
            messages: vec![(0.25, label("/only"))],
        };
        let start = Instant::now();
        let mut at = None;
        play(&rec, |_| at = Some(start.elapsed())).await;
        assert_eq!(at, Some(Duration::from_millis(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn loops_back_after_duration() {
        let start = Instant::now();
        let mut seen = Vec::new();
        let rec = recording(Some(1));
        let _ = tokio::time::timeout(
            Duration::from_millis(1600),
            play(&rec, |m| seen.push((start.elapsed(), name(&m)))),
        )
        .await;
        // /c lands at 0.75s, the loop waits out the 0.25s left of the
        // duration, then resumes at /b with its own timestamp as the origin.
        let names: Vec<_> = seen.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, ["/a", "/b", "/c", "/b", "/c"]);
        assert_eq!(seen[3].0, Duration::from_millis(1000));
        assert_eq!(seen[4].0, Duration::from_millis(1500));
    }
}
