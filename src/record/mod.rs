use serde::{Deserialize, Serialize};

pub mod store;

/// A persisted analysis. Immutable once saved; a correction is a delete
/// followed by a fresh submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: u64,
    pub date: String,
    pub title: String,
    pub classification: String,
    pub response: String,
    pub original_text: String,
}

/// A classification result that has not (or not yet) been persisted:
/// the endpoint's output plus the text sample it was produced from.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub title: String,
    pub classification: String,
    pub response: String,
    pub original_text: String,
}

impl From<&AnalysisRecord> for Analysis {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            title: record.title.clone(),
            classification: record.classification.clone(),
            response: record.response.clone(),
            original_text: record.original_text.clone(),
        }
    }
}

/// Next free id for a collection: one past the highest id present, so ids
/// stay unique and ascending no matter how fast saves happen.
pub fn next_id(records: &[AnalysisRecord]) -> u64 {
    records.iter().map(|record| record.id).max().map_or(1, |id| id + 1)
}
