//! Request and response payloads of the dream endpoints.

use serde::{Deserialize, Serialize};

use crate::analysis::types::{DreamAnalysis, DreamEntry};

#[derive(Debug, Clone, Serialize)]
pub struct AddDreamRequest<'a> {
    pub dream_text: &'a str,
    pub mood_score: i32,
    pub analysis: &'a DreamAnalysis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddDreamResponse {
    #[serde(default)]
    pub dream_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DreamsResponse {
    pub dreams: Vec<DreamEntry>,
}
