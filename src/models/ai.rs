// AI exam-generation job types
// The pipeline runs server-side; clients only start jobs and poll.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Processing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiJobStatus {
    pub job_id: String,
    pub status: JobState,
    #[serde(default)]
    pub progress_message: String,
    #[serde(default)]
    pub result: Option<AiExamResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AiJobStatus {
    /// The job has settled, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self.status, JobState::Done | JobState::Failed)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiExamResult {
    pub raw_transcript: String,
    pub refined_script: String,
    #[serde(default)]
    pub timestamps: Option<Vec<AiTimestampMondai>>,
    pub questions: Vec<AiQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiTimestampMondai {
    pub mondai_number: u32,
    pub title: String,
    pub start_time: f64,
    pub end_time: f64,
    pub questions: Vec<AiTimestampQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiTimestampQuestion {
    pub question_number: u32,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiQuestion {
    pub mondai_group: String,
    pub question_number: u32,
    #[serde(default)]
    pub introduction: Option<String>,
    pub script_text: String,
    pub question_text: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    pub answers: Vec<AiQuestionOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiQuestionOption {
    pub label: String,
    pub content: String,
    pub is_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_deserializes_and_settles() {
        let pending: AiJobStatus = serde_json::from_str(
            r#"{"job_id":"j1","status":"processing","progress_message":"Transcribing audio"}"#,
        )
        .unwrap();
        assert_eq!(pending.status, JobState::Processing);
        assert!(!pending.is_finished());

        let failed: AiJobStatus = serde_json::from_str(
            r#"{"job_id":"j1","status":"failed","error":"ASR timeout"}"#,
        )
        .unwrap();
        assert!(failed.is_finished());
        assert_eq!(failed.error.as_deref(), Some("ASR timeout"));
    }
}
