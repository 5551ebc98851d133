// Exam authoring types
// Exams group questions into mondai sections; questions carry an audio
// clip and ordered answer options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ExamPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Minutes allowed for the whole exam.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    /// Authoring wizard progress, advanced as steps complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Exam {
    pub exam_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub time_limit: Option<u32>,
    pub current_step: u32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExamListResponse {
    pub exams: Vec<Exam>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerPayload {
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
    pub answer_id: String,
    pub question_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub is_correct: bool,
    #[serde(default)]
    pub order_index: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QuestionPayload {
    pub exam_id: String,
    /// Mondai section label, e.g. "mondai1".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mondai_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_clip_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<AnswerPayload>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub question_id: String,
    pub exam_id: String,
    #[serde(default)]
    pub mondai_group: Option<String>,
    #[serde(default)]
    pub question_number: Option<u32>,
    #[serde(default)]
    pub audio_clip_url: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioUploadResponse {
    pub question_id: String,
    pub audio_clip_url: String,
    /// Seconds, when the backend could probe the file.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_payload_omits_absent_fields() {
        let payload = ExamPayload {
            title: "N2 聴解 Mock".to_string(),
            description: None,
            time_limit: Some(50),
            audio_id: None,
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"title":"N2 聴解 Mock","time_limit":50}"#
        );
    }

    #[test]
    fn test_question_defaults_missing_collections() {
        let question: Question = serde_json::from_str(
            r#"{"question_id":"q1","exam_id":"e1"}"#,
        )
        .unwrap();
        assert!(question.answers.is_empty());
        assert!(question.mondai_group.is_none());
    }
}
