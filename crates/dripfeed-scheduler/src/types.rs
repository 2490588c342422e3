use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Defines when and how often a job should run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Run repeatedly with a fixed interval in seconds.
    Interval { every_secs: u64 },

    /// Run every day at the given hour and minute (UTC).
    Daily { hour: u8, minute: u8 },
}

impl Schedule {
    pub fn validate(&self) -> Result<()> {
        match self {
            Schedule::Interval { every_secs } if *every_secs == 0 => Err(
                SchedulerError::InvalidSchedule("interval must be at least 1 second".into()),
            ),
            Schedule::Daily { hour, minute } if *hour > 23 || *minute > 59 => Err(
                SchedulerError::InvalidSchedule(format!("{hour:02}:{minute:02} is not a time of day")),
            ),
            _ => Ok(()),
        }
    }
}

/// What the receiver of a fired job should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    /// Pull every ingestion source into the queue.
    Sync,
    /// Publish the head of the queue.
    Publish,
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for its next_run time.
    Pending,
    /// No further run could be computed.
    Completed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// UUID v4 string.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    pub schedule: Schedule,
    pub action: JobAction,
    pub status: JobStatus,
    /// Most recent fire time, if any.
    pub last_run: Option<DateTime<Utc>>,
    /// Next planned fire time; `None` once the job is completed.
    pub next_run: Option<DateTime<Utc>>,
    /// Number of times the job has fired.
    pub run_count: u32,
}
