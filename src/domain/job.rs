use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{JobId, OrderId};

/// Fixed Fibonacci-like backoff schedule, in seconds. Index is clamped to
/// the last entry once `attempt` exceeds its length.
pub const RETRY_DELAYS: &[u64] = &[1, 1, 1, 2, 2, 2, 3, 5, 8, 8, 13, 13, 13, 21, 34];

pub fn next_attempt_delay(attempt: u32) -> std::time::Duration {
    let idx = (attempt as usize).min(RETRY_DELAYS.len() - 1);
    std::time::Duration::from_secs(RETRY_DELAYS[idx])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobType {
    PollAccrual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    New,
    Processing,
    Processed,
    Failed,
}

/// Durable work unit driving the accrual pipeline. `entity_id` is the
/// order this job polls; the job has no back-pointer from the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub entity_id: OrderId,
    pub attempt: u32,
    pub last_error: Option<String>,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(entity_id: OrderId, job_type: JobType) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            job_type,
            status: JobStatus::New,
            entity_id,
            attempt: 0,
            last_error: None,
            next_attempt_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the job terminal-failed. `next_attempt_at` is cleared.
    pub fn mark_failed(&mut self, err: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.last_error = Some(err.into());
        self.next_attempt_at = None;
        self.updated_at = Utc::now();
    }

    /// Marks the job terminal-processed. `next_attempt_at` is cleared.
    pub fn mark_processed(&mut self) {
        self.status = JobStatus::Processed;
        self.next_attempt_at = None;
        self.updated_at = Utc::now();
    }

    /// Reschedules for another attempt, bumping `attempt` by one and
    /// computing the next delay from `RETRY_DELAYS`.
    pub fn reschedule(&mut self) {
        self.status = JobStatus::Processing;
        self.next_attempt_at = Some(Utc::now() + next_attempt_delay(self.attempt));
        self.attempt += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_attempt_delay_clamps_to_last_entry() {
        let last = *RETRY_DELAYS.last().unwrap();
        assert_eq!(next_attempt_delay(1000).as_secs(), last);
        assert_eq!(next_attempt_delay(0).as_secs(), RETRY_DELAYS[0]);
    }

    #[test]
    fn new_job_is_due_immediately() {
        let j = Job::new(OrderId::new(), JobType::PollAccrual);
        assert_eq!(j.status, JobStatus::New);
        assert_eq!(j.attempt, 0);
        assert!(j.next_attempt_at.is_some());
    }

    #[test]
    fn mark_failed_clears_next_attempt() {
        let mut j = Job::new(OrderId::new(), JobType::PollAccrual);
        j.mark_failed("boom");
        assert_eq!(j.status, JobStatus::Failed);
        assert!(j.next_attempt_at.is_none());
        assert_eq!(j.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn reschedule_bumps_attempt_and_sets_future_next_attempt() {
        let mut j = Job::new(OrderId::new(), JobType::PollAccrual);
        let before = Utc::now();
        j.reschedule();
        assert_eq!(j.attempt, 1);
        assert_eq!(j.status, JobStatus::Processing);
        assert!(j.next_attempt_at.unwrap() > before);
    }
}
