// AI exam-generation client
// Starts a server-side generation job from an audio file and polls it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};

use super::{into_json, into_unit};
use crate::error::ApiError;
use crate::gateway::AuthGateway;
use crate::models::AiJobStatus;

pub struct AiExamClient {
    gateway: Arc<AuthGateway>,
}

impl AiExamClient {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Upload an exam recording and start the generation pipeline.
    /// Returns the freshly created job for polling.
    pub async fn generate_exam_from_audio(
        &self,
        file_name: &str,
        data: Vec<u8>,
        jlpt_level: &str,
        title: &str,
    ) -> Result<AiJobStatus, ApiError> {
        let response = self
            .gateway
            .send_with(|| {
                let form = Form::new()
                    .part("file", Part::bytes(data.clone()).file_name(file_name.to_string()))
                    .text("jlpt_level", jlpt_level.to_string())
                    .text("title", title.to_string());
                self.gateway.post("/api/ai/generate-exam").multipart(form)
            })
            .await?;
        into_json(response).await
    }

    pub async fn job_status(&self, job_id: &str) -> Result<AiJobStatus, ApiError> {
        let response = self
            .gateway
            .send(self.gateway.get(&format!("/api/ai/job/{job_id}")))
            .await?;
        into_json(response).await
    }

    /// Release a finished job from server memory.
    pub async fn delete_job(&self, job_id: &str) -> Result<(), ApiError> {
        let response = self
            .gateway
            .send(self.gateway.delete(&format!("/api/ai/job/{job_id}")))
            .await?;
        into_unit(response).await
    }

    /// Poll until the job settles, at a fixed interval.
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        poll_interval: Duration,
    ) -> Result<AiJobStatus, ApiError> {
        loop {
            let status = self.job_status(job_id).await?;
            if status.is_finished() {
                return Ok(status);
            }
            tracing::debug!(
                job_id,
                progress = %status.progress_message,
                "generation job still running"
            );
            tokio::time::sleep(poll_interval).await;
        }
    }
}
