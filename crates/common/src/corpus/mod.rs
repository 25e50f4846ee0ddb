//! Penal-code records and corpus snapshots
//!
//! A [`Corpus`] is an owned, read-only snapshot of every record, built once
//! from a [`RecordStore`] and shared behind an `Arc` by concurrent queries.
//! Refreshing it means building a new snapshot, never mutating one in place.

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One statute article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier
    pub id: i64,

    /// Article number, e.g. "Art. 350"
    pub label: String,

    /// Full statute text
    pub body: String,

    /// Classification, may be empty
    #[serde(default)]
    pub category: String,

    /// Section heading, may be empty
    #[serde(default)]
    pub section: String,

    /// Document embedding, present once enrichment ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl Record {
    pub fn new(id: i64, label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            body: body.into(),
            category: String::new(),
            section: String::new(),
            vector: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// Whether the record carries a usable embedding
    pub fn is_vectorized(&self) -> bool {
        self.vector.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Text sent to the embedding provider for this record
    pub fn embedding_text(&self) -> String {
        let mut text = self.label.clone();
        for part in [&self.category, &self.section, &self.body] {
            if !part.is_empty() {
                text.push_str(" - ");
                text.push_str(part);
            }
        }
        text
    }
}

/// Read access to stored records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record in id order; vectors are not guaranteed to be populated
    async fn list_all_records(&self) -> Result<Vec<Record>>;

    /// Records that carry a vector, with the vector populated
    async fn list_vectorized_records(&self) -> Result<Vec<Record>>;

    /// Records whose label contains `needle`
    async fn find_by_label_substring(&self, needle: &str) -> Result<Vec<Record>>;

    /// Single record lookup
    async fn find_by_id(&self, id: i64) -> Result<Option<Record>>;
}

/// Immutable snapshot of the corpus
#[derive(Debug, Clone)]
pub struct Corpus {
    records: Vec<Record>,
    vectorized: usize,
    loaded_at: DateTime<Utc>,
}

impl Corpus {
    /// Build a snapshot; records are kept in id order
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|r| r.id);
        let vectorized = records.iter().filter(|r| r.is_vectorized()).count();

        Self {
            records,
            vectorized,
            loaded_at: Utc::now(),
        }
    }

    /// Empty snapshot
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Read a fresh snapshot from a store
    ///
    /// Vectors come from the vector reader and are only attached to records
    /// that do not already carry one.
    pub async fn load(store: &dyn RecordStore) -> Result<Self> {
        let mut records = store.list_all_records().await?;
        let vectors: HashMap<i64, Vec<f32>> = store
            .list_vectorized_records()
            .await?
            .into_iter()
            .filter_map(|r| r.vector.map(|v| (r.id, v)))
            .collect();

        for record in records.iter_mut().filter(|r| r.vector.is_none()) {
            if let Some(vector) = vectors.get(&record.id) {
                record.vector = Some(vector.clone());
            }
        }

        let corpus = Self::new(records);
        tracing::info!(
            records = corpus.len(),
            vectorized = corpus.vectorized_count(),
            "Corpus snapshot loaded"
        );
        Ok(corpus)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn vectorized_count(&self) -> usize {
        self.vectorized
    }

    /// Whether at least one record can be scored by vector similarity
    pub fn has_vectors(&self) -> bool {
        self.vectorized > 0
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Record store held in memory
///
/// Used by tests and by deployments that ship the corpus as JSON.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Parse a JSON array of records
    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<Record> = serde_json::from_str(raw)?;
        Ok(Self::new(records))
    }

    pub async fn insert(&self, record: Record) {
        self.records.write().await.push(record);
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list_all_records(&self) -> Result<Vec<Record>> {
        let mut records = self.records.read().await.clone();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn list_vectorized_records(&self) -> Result<Vec<Record>> {
        let records = self.list_all_records().await?;
        Ok(records.into_iter().filter(|r| r.is_vectorized()).collect())
    }

    async fn find_by_label_substring(&self, needle: &str) -> Result<Vec<Record>> {
        let needle = needle.to_lowercase();
        let records = self.list_all_records().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.label.to_lowercase().contains(&needle))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Record>> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new(3, "Art. 350", "Quiconque soustrait frauduleusement une chose...")
                .with_category("Vol"),
            Record::new(1, "Art. 254", "L'homicide commis volontairement est qualifié meurtre.")
                .with_vector(vec![0.1, 0.2]),
            Record::new(2, "Art. 35", "Procédure."),
        ]
    }

    #[test]
    fn test_corpus_orders_by_id() {
        let corpus = Corpus::new(sample());
        let ids: Vec<i64> = corpus.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(corpus.vectorized_count(), 1);
        assert!(corpus.has_vectors());
    }

    #[test]
    fn test_empty_vector_is_not_vectorized() {
        let record = Record::new(1, "Art. 1", "x").with_vector(vec![]);
        assert!(!record.is_vectorized());
    }

    #[test]
    fn test_embedding_text_skips_empty_fields() {
        let record = Record::new(1, "Art. 350", "Texte").with_category("Vol");
        assert_eq!(record.embedding_text(), "Art. 350 - Vol - Texte");
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let store = InMemoryStore::new(sample());
        let corpus = Corpus::load(&store).await.unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.get(1).unwrap().vector, Some(vec![0.1, 0.2]));
        assert!(corpus.get(3).unwrap().vector.is_none());
    }

    #[tokio::test]
    async fn test_label_substring_lookup() {
        let store = InMemoryStore::new(sample());
        let found = store.find_by_label_substring("art. 35").await.unwrap();
        let labels: Vec<&str> = found.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Art. 35", "Art. 350"]);
    }

    #[tokio::test]
    async fn test_store_from_json() {
        let raw = r#"[{"id": 7, "label": "Art. 7", "body": "Texte"}]"#;
        let store = InMemoryStore::from_json(raw).unwrap();
        let record = store.find_by_id(7).await.unwrap().unwrap();
        assert_eq!(record.category, "");
        assert!(record.vector.is_none());
    }
}
