// Exam authoring client
// Exam, question, and answer CRUD plus per-question audio upload.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};

use super::{into_json, into_unit};
use crate::error::ApiError;
use crate::gateway::AuthGateway;
use crate::models::{
    Answer, AnswerPayload, AudioUploadResponse, Exam, ExamListResponse, ExamPayload, ExamUpdate,
    Question, QuestionPayload,
};

pub struct ExamClient {
    gateway: Arc<AuthGateway>,
}

impl ExamClient {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    pub async fn create_exam(&self, payload: &ExamPayload) -> Result<Exam, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.post("/api/exams").json(payload))
            .await?;
        into_json(response).await
    }

    pub async fn update_exam(&self, exam_id: &str, update: &ExamUpdate) -> Result<Exam, ApiError> {
        let response = self
            .gateway
            .send(
                self.gateway
                    .patch(&format!("/api/exams/{exam_id}"))
                    .json(update),
            )
            .await?;
        into_json(response).await
    }

    pub async fn get_exam(&self, exam_id: &str) -> Result<Exam, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.get(&format!("/api/exams/{exam_id}")))
            .await?;
        into_json(response).await
    }

    pub async fn delete_exam(&self, exam_id: &str) -> Result<(), ApiError> {
        let response = self
            .gateway
            .send(self.gateway.delete(&format!("/api/exams/{exam_id}")))
            .await?;
        into_unit(response).await
    }

    pub async fn list_exams(&self) -> Result<ExamListResponse, ApiError> {
        let response = self.gateway.send(self.gateway.get("/api/exams")).await?;
        into_json(response).await
    }

    pub async fn create_question(&self, payload: &QuestionPayload) -> Result<Question, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.post("/api/questions").json(payload))
            .await?;
        into_json(response).await
    }

    pub async fn update_question(
        &self,
        question_id: &str,
        payload: &QuestionPayload,
    ) -> Result<Question, ApiError> {
        let response = self
            .gateway
            .send(
                self.gateway
                    .patch(&format!("/api/questions/{question_id}"))
                    .json(payload),
            )
            .await?;
        into_json(response).await
    }

    pub async fn delete_question(&self, question_id: &str) -> Result<(), ApiError> {
        let response = self
            .gateway
            .send(self.gateway.delete(&format!("/api/questions/{question_id}")))
            .await?;
        into_unit(response).await
    }

    pub async fn exam_questions(&self, exam_id: &str) -> Result<Vec<Question>, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.get(&format!("/api/exams/{exam_id}/questions")))
            .await?;
        into_json(response).await
    }

    /// Attach an audio clip to a question. The multipart form cannot be
    /// cloned, so it is rebuilt from the buffered bytes if a token refresh
    /// leads to a retry.
    pub async fn upload_question_audio(
        &self,
        question_id: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<AudioUploadResponse, ApiError> {
        let path = format!("/api/questions/{question_id}/audio");
        let response = self
            .gateway
            .send_with(|| {
                let form = Form::new()
                    .part("file", Part::bytes(data.clone()).file_name(file_name.to_string()));
                self.gateway.post(&path).multipart(form)
            })
            .await?;
        into_json(response).await
    }

    pub async fn create_answer(&self, payload: &AnswerPayload) -> Result<Answer, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.post("/api/answers").json(payload))
            .await?;
        into_json(response).await
    }

    pub async fn update_answer(
        &self,
        answer_id: &str,
        payload: &AnswerPayload,
    ) -> Result<Answer, ApiError> {
        let response = self
            .gateway
            .send(
                self.gateway
                    .patch(&format!("/api/answers/{answer_id}"))
                    .json(payload),
            )
            .await?;
        into_json(response).await
    }

    pub async fn delete_answer(&self, answer_id: &str) -> Result<(), ApiError> {
        let response = self
            .gateway
            .send(self.gateway.delete(&format!("/api/answers/{answer_id}")))
            .await?;
        into_unit(response).await
    }
}
