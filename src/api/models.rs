use serde::{Deserialize, Serialize};
use crate::summarize::Summary;

#[derive(Deserialize)]
pub struct SummarizeRequest {
    // Absent url becomes an empty string, reported as InvalidRequest
    // by the pipeline instead of a serde rejection
    #[serde(default)]
    pub url: String,
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub title: String,
    pub excerpt: String,
    pub summary: String,
    #[serde(skip_serializing_if = "is_false")]
    pub cached: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl From<Summary> for SummarizeResponse {
    fn from(s: Summary) -> Self {
        SummarizeResponse {
            title: s.title,
            excerpt: s.excerpt,
            summary: s.summary,
            cached: s.cached,
        }
    }
}
