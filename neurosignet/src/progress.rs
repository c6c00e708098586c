//! Timer driven progress sequence for the `/ws/progress` channel.
//!
//! The sequence is fixed: `0, step, 2*step, ...` always ending at exactly 100, with `interval`
//! elapsing before every item. It is not tied to any real work.

use std::time::Duration;

use futures::{Stream, StreamExt, stream};
use serde_json::Value;

use crate::api::models::progress::{ProgressStatus, ServerMessage};
use crate::config::ProgressConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSchedule {
    interval: Duration,
    step: u8,
}

impl ProgressSchedule {
    pub fn new(interval: Duration, step: u8) -> Self {
        Self {
            interval,
            step: step.clamp(1, 100),
        }
    }

    /// Percentages emitted, in order
    pub fn percentages(&self) -> Vec<u8> {
        let mut values: Vec<u8> = (0..=100u8).step_by(self.step as usize).collect();
        if values.last() != Some(&100) {
            values.push(100);
        }
        values
    }

    /// Stream of `progress_update` messages for `task_id`
    pub fn updates(&self, task_id: Value) -> impl Stream<Item = ServerMessage> + Send + 'static {
        let interval = self.interval;
        stream::iter(self.percentages()).then(move |progress| {
            let task_id = task_id.clone();
            async move {
                tokio::time::sleep(interval).await;
                ServerMessage::ProgressUpdate {
                    task_id,
                    progress,
                    status: ProgressStatus::Processing,
                }
            }
        })
    }
}

impl From<&ProgressConfig> for ProgressSchedule {
    fn from(config: &ProgressConfig) -> Self {
        Self::new(config.interval, config.step)
    }
}
