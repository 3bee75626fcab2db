use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::RecordedVideo;

/// Identifies one recording within the lifetime of a capture resource.
pub type RecordingSessionId = u32;

/// Timing and identity of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCaptureSessionInfo {
    pub session_id: RecordingSessionId,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl VideoCaptureSessionInfo {
    pub fn new(session_id: RecordingSessionId) -> Self {
        Self {
            session_id,
            start_time: None,
            end_time: None,
        }
    }

    /// Length of a finished session, None while either bound is missing.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Seconds recorded so far: full duration once ended, elapsed time while
    /// running, zero before the hardware began.
    pub fn current_duration_secs(&self) -> f64 {
        let Some(start) = self.start_time else {
            return 0.0;
        };
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - start).num_milliseconds() as f64 / 1000.0
    }
}

impl fmt::Display for VideoCaptureSessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn time(value: Option<DateTime<Utc>>) -> String {
            value.map_or_else(|| "Invalid".to_string(), |t| t.to_rfc3339())
        }
        let duration = self
            .duration()
            .map_or_else(|| "Invalid".to_string(), |d| format!("{:.3}", d.num_milliseconds() as f64 / 1000.0));
        write!(
            f,
            "StartTime: {}, EndTime: {}, Duration: {}, Id: {}",
            time(self.start_time),
            time(self.end_time),
            duration,
            self.session_id
        )
    }
}

/// A recording that stopped normally, with the file it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedRecording {
    pub session: VideoCaptureSessionInfo,
    pub video: RecordedVideo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_requires_both_bounds() {
        let mut info = VideoCaptureSessionInfo::new(7);
        assert_eq!(info.duration(), None);
        assert_eq!(info.current_duration_secs(), 0.0);

        let start = Utc::now();
        info.start_time = Some(start);
        assert_eq!(info.duration(), None);

        info.end_time = Some(start + chrono::Duration::milliseconds(1500));
        assert_eq!(info.duration(), Some(chrono::Duration::milliseconds(1500)));
        approx::assert_relative_eq!(info.current_duration_secs(), 1.5);
    }

    #[test]
    fn display_marks_missing_times() {
        let info = VideoCaptureSessionInfo::new(3);
        let text = info.to_string();
        assert!(text.contains("StartTime: Invalid"));
        assert!(text.ends_with("Id: 3"));
    }
}
