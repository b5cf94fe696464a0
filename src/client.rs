use reqwest::multipart::{Form, Part};

use crate::relay::{UploadEnvelope, IMAGE_FIELD, UPLOAD_PATH};
use crate::scores::{parse_scores, ClientError, ScoreMapping, SelectedImage};

/// Talks to a running relay the same way the browser page does.
#[derive(Debug, Clone)]
pub struct ScoreClient {
    http: reqwest::Client,
    upload_url: String,
}

impl ScoreClient {
    pub fn new(server: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: format!("{}{}", server.trim_end_matches('/'), UPLOAD_PATH),
        }
    }

    pub async fn submit(&self, image: &SelectedImage) -> Result<ScoreMapping, ClientError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self.http.post(&self.upload_url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::UploadStatus(response.status().as_u16()));
        }

        let body = response.text().await?;
        let envelope: UploadEnvelope =
            serde_json::from_str(&body).map_err(|_| ClientError::Format)?;
        match envelope {
            UploadEnvelope {
                success: true,
                result: Some(result),
                ..
            } if !result.is_empty() => parse_scores(&result),
            _ => Err(ClientError::Format),
        }
    }
}
