use chrono::{DateTime, Utc};

use super::record::{GeneratedImageRecord, GenerationKind};
use crate::images::ImageResource;

/// Append-only list of generated images for one session.
///
/// - records are kept in insertion order; [`SessionHistory::recent`] walks them
///   newest first for display
/// - ids are fresh v4 uuids, regenerated on the (unlikely) collision
/// - timestamps never go backwards, a stepped-back clock is clamped to the
///   latest recorded time
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    records: Vec<GeneratedImageRecord>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record for a fresh generation and appends it.
    pub fn record(
        &mut self,
        kind: GenerationKind,
        prompt: impl Into<String>,
        image: ImageResource,
    ) -> &GeneratedImageRecord {
        self.record_at(kind, prompt, image, Utc::now())
    }

    pub(crate) fn record_at(
        &mut self,
        kind: GenerationKind,
        prompt: impl Into<String>,
        image: ImageResource,
        now: DateTime<Utc>,
    ) -> &GeneratedImageRecord {
        let created_at = match self.latest_timestamp() {
            Some(latest) if latest > now => latest,
            _ => now,
        };
        let mut id = uuid::Uuid::new_v4().to_string();
        while self.contains(&id) {
            id = uuid::Uuid::new_v4().to_string();
        }
        let index = self.records.len();
        self.records.push(GeneratedImageRecord::new(
            id,
            image,
            prompt.into(),
            kind,
            created_at,
        ));
        &self.records[index]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|record| record.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&GeneratedImageRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn latest(&self) -> Option<&GeneratedImageRecord> {
        self.records.last()
    }

    /// Insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GeneratedImageRecord> {
        self.records.iter()
    }

    /// Display order: most recent first.
    pub fn recent(&self) -> impl Iterator<Item = &GeneratedImageRecord> {
        self.records.iter().rev()
    }

    fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(GeneratedImageRecord::created_at)
    }
}
