//! Deduplicating aggregator: folds extracted candidates into one record per
//! identifier and yields them in identifier order.

use std::collections::BTreeMap;

use tracing::trace;

use mirreview_shared::PublicationRecord;

use crate::extract::ExtractedCandidate;

/// Accumulates candidates keyed by identifier.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: BTreeMap<String, PublicationRecord>,
    duplicates_merged: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one candidate in.
    ///
    /// A repeated identifier only contributes its topic, and only when that
    /// topic is not already among the record's original topics. Title, date
    /// and URL of the first occurrence are kept.
    pub fn push(&mut self, item: ExtractedCandidate) {
        let topic = item.topic.as_deref().filter(|t| !t.is_empty());
        let candidate = item.candidate;

        if let Some(record) = self.records.get_mut(&candidate.identifier) {
            self.duplicates_merged += 1;
            if let Some(topic) = topic {
                if !record.original_topics.iter().any(|t| t == topic) {
                    trace!(identifier = %record.identifier, %topic, "topic merged into duplicate");
                    record.original_topics.push(topic.to_string());
                    record.assigned_topics.push(topic.to_string());
                }
            }
            return;
        }

        let record = PublicationRecord::new(
            candidate.identifier.clone(),
            candidate.title,
            candidate.date,
            candidate.source_url,
            topic,
        );
        self.records.insert(candidate.identifier, record);
    }

    /// Number of candidates folded into an existing record so far.
    pub fn duplicates_merged(&self) -> usize {
        self.duplicates_merged
    }

    /// Records sorted ascending by identifier.
    pub fn finish(self) -> Vec<PublicationRecord> {
        self.records.into_values().collect()
    }
}

impl Extend<ExtractedCandidate> for Aggregator {
    fn extend<I: IntoIterator<Item = ExtractedCandidate>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

/// Aggregate a candidate stream into the final publication list.
pub fn aggregate<I>(candidates: I) -> Vec<PublicationRecord>
where
    I: IntoIterator<Item = ExtractedCandidate>,
{
    let mut aggregator = Aggregator::new();
    aggregator.extend(candidates);
    aggregator.finish()
}
