//! Minimal upstream (ServiceM8-style) resource payloads consumed by the
//! portal's proxy routes. The upstream API is treated as a black box; only
//! the fields the portal surfaces are modeled.

use serde::{Deserialize, Serialize};

/// A job record from the upstream field-service API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub uuid: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub job_address: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub generated_job_id: Option<String>,
    #[serde(default)]
    pub company_uuid: Option<String>,
}

/// Payload for creating a note against a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJobNote {
    pub related_object_uuid: String,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_deserializes_with_missing_fields() {
        let json = r#"{"uuid":"job-1","status":"Quote"}"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.uuid, "job-1");
        assert_eq!(job.status.as_deref(), Some("Quote"));
        assert!(job.company_uuid.is_none());
    }

    #[test]
    fn note_serializes_expected_shape() {
        let note = NewJobNote {
            related_object_uuid: "job-1".into(),
            note: "Customer approved quote".into(),
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["related_object_uuid"], "job-1");
    }
}
