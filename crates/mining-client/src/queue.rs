//! Activity queue and drain policy
//!
//! Small, frequent interactions are buffered and submitted in batches. The
//! queue is inspected on every change: it flushes once it holds
//! `batch_threshold` entries or its oldest entry has waited `flush_after`;
//! otherwise the caller arms a timer for the oldest entry's deadline.

use crate::config::BatchSubmission;
use crate::types::{ActivityEntry, ActivitySubmission};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_BATCH_THRESHOLD: usize = 3;
pub const DEFAULT_FLUSH_AFTER: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainPolicy {
    pub batch_threshold: usize,
    pub flush_after: Duration,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        Self {
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            flush_after: DEFAULT_FLUSH_AFTER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainDecision {
    /// Nothing queued
    Idle,
    Flush,
    /// Not ready; inspect again at this instant
    WaitUntil(Instant),
}

#[derive(Debug, Default)]
pub struct ActivityQueue {
    entries: Vec<ActivityEntry>,
}

impl ActivityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ActivityEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn oldest(&self) -> Option<&ActivityEntry> {
        self.entries.first()
    }

    pub fn inspect(&self, policy: &DrainPolicy, now: Instant) -> DrainDecision {
        let Some(oldest) = self.oldest() else {
            return DrainDecision::Idle;
        };
        if self.entries.len() >= policy.batch_threshold {
            return DrainDecision::Flush;
        }
        let deadline = oldest.enqueued_at + policy.flush_after;
        if now >= deadline {
            DrainDecision::Flush
        } else {
            DrainDecision::WaitUntil(deadline)
        }
    }

    /// Take every queued entry; later pushes start a fresh batch.
    pub fn take_batch(&mut self) -> Batch {
        Batch {
            entries: std::mem::take(&mut self.entries),
        }
    }
}

/// Entries removed from the queue for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    entries: Vec<ActivityEntry>,
}

/// How a batch goes over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Single(ActivitySubmission),
    /// Summed points and tokens reported under the first entry's type.
    Aggregate(ActivitySubmission),
    Itemized(Vec<ActivitySubmission>),
}

impl Batch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn total_points(&self) -> u64 {
        self.entries.iter().map(|e| e.points).sum()
    }

    pub fn total_tokens(&self) -> f64 {
        self.entries.iter().map(|e| e.tokens).sum()
    }

    /// `None` for an empty batch.
    pub fn submission(&self, mode: BatchSubmission) -> Option<Submission> {
        let first = self.entries.first()?;
        if self.entries.len() == 1 {
            return Some(Submission::Single(first.into()));
        }
        Some(match mode {
            BatchSubmission::Aggregate => Submission::Aggregate(ActivitySubmission {
                activity: first.activity,
                points: self.total_points(),
                tokens: self.total_tokens(),
            }),
            BatchSubmission::Itemized => {
                Submission::Itemized(self.entries.iter().map(ActivitySubmission::from).collect())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityType;

    fn entry(activity: ActivityType, points: u64, tokens: f64, at: Instant) -> ActivityEntry {
        ActivityEntry {
            activity,
            points,
            tokens,
            enqueued_at: at,
        }
    }

    #[test]
    fn test_empty_queue_is_idle() {
        let queue = ActivityQueue::new();
        assert_eq!(
            queue.inspect(&DrainPolicy::default(), Instant::now()),
            DrainDecision::Idle
        );
    }

    #[test]
    fn test_threshold_triggers_flush() {
        let now = Instant::now();
        let mut queue = ActivityQueue::new();
        queue.push(entry(ActivityType::Like, 1, 0.1, now));
        queue.push(entry(ActivityType::Like, 1, 0.1, now));
        assert!(matches!(
            queue.inspect(&DrainPolicy::default(), now),
            DrainDecision::WaitUntil(_)
        ));

        queue.push(entry(ActivityType::Comment, 5, 0.5, now));
        assert_eq!(
            queue.inspect(&DrainPolicy::default(), now),
            DrainDecision::Flush
        );
    }

    #[test]
    fn test_oldest_entry_deadline() {
        let start = Instant::now();
        let mut queue = ActivityQueue::new();
        queue.push(entry(ActivityType::Post, 10, 1.0, start));
        let policy = DrainPolicy::default();

        assert_eq!(
            queue.inspect(&policy, start + Duration::from_millis(400)),
            DrainDecision::WaitUntil(start + Duration::from_millis(1000))
        );
        assert_eq!(
            queue.inspect(&policy, start + Duration::from_millis(1000)),
            DrainDecision::Flush
        );
    }

    #[test]
    fn test_take_batch_clears_queue() {
        let now = Instant::now();
        let mut queue = ActivityQueue::new();
        queue.push(entry(ActivityType::Like, 1, 0.1, now));
        let batch = queue.take_batch();
        assert_eq!(batch.len(), 1);
        assert!(queue.is_empty());

        queue.push(entry(ActivityType::Share, 3, 0.3, now));
        assert_eq!(batch.len(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_aggregate_uses_first_type() {
        let now = Instant::now();
        let mut queue = ActivityQueue::new();
        queue.push(entry(ActivityType::Comment, 5, 0.5, now));
        queue.push(entry(ActivityType::Like, 1, 0.25, now));
        queue.push(entry(ActivityType::Post, 10, 1.0, now));
        let batch = queue.take_batch();

        assert_eq!(
            batch.submission(BatchSubmission::Aggregate),
            Some(Submission::Aggregate(ActivitySubmission {
                activity: ActivityType::Comment,
                points: 16,
                tokens: 1.75,
            }))
        );

        match batch.submission(BatchSubmission::Itemized) {
            Some(Submission::Itemized(items)) => {
                let kinds: Vec<_> = items.iter().map(|i| i.activity).collect();
                assert_eq!(
                    kinds,
                    vec![ActivityType::Comment, ActivityType::Like, ActivityType::Post]
                );
            }
            other => panic!("expected itemized submission, got {other:?}"),
        }
    }

    #[test]
    fn test_single_entry_submitted_directly() {
        let mut queue = ActivityQueue::new();
        queue.push(entry(ActivityType::Invite, 20, 2.0, Instant::now()));
        let batch = queue.take_batch();
        assert!(matches!(
            batch.submission(BatchSubmission::Itemized),
            Some(Submission::Single(_))
        ));
        assert_eq!(ActivityQueue::new().take_batch().submission(BatchSubmission::Aggregate), None);
    }
}
