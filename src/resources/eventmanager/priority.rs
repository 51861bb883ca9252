//! Dispatch priority levels.
//!
//! [`Priority::Realtime`] bypasses buffering entirely. The remaining levels
//! are buffered and drained once per tick in [`Priority::BUFFERED`] order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordering class controlling when a published event is delivered.
///
/// Lower tags are delivered first. `Realtime` and `High` have distinct tags:
/// only `Realtime` skips the pending buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Priority {
    /// Delivered synchronously inside `publish`, never queued.
    Realtime = 0,
    /// First buffered level to drain.
    High = 1,
    /// The default level. Drained after `High`, before `Low`.
    #[default]
    Normal = 2,
    /// Drained last.
    Low = 3,
}

impl Priority {
    /// Buffered levels in drain order.
    pub const BUFFERED: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    /// Number of buffered levels (excludes `Realtime`).
    pub const QUEUE_COUNT: usize = Self::BUFFERED.len();

    /// Index into the per-level queue arrays, `None` for `Realtime`.
    pub fn queue_index(self) -> Option<usize> {
        match self {
            Priority::Realtime => None,
            Priority::High => Some(0),
            Priority::Normal => Some(1),
            Priority::Low => Some(2),
        }
    }

    /// True if events of this level skip the pending buffers.
    pub fn is_realtime(self) -> bool {
        self == Priority::Realtime
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Realtime => "realtime",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realtime" => Ok(Priority::Realtime),
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(format!("Unknown priority '{}'", other)),
        }
    }
}
