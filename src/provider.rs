//! Chat-completion client for the vision model that reads the exam sheet.

use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::RelayError;

/// Instruction sent alongside every exam image.
pub const GRADING_PROMPT: &str = "Can you read the handwritten exam scores on this exam sheet? \
If a question has no score, or only has a line drawn through it, its score is 0 (zero). \
Send only the question numbers and their scores in JSON format, like {\"1\":\"5\",\"2\":\"7\"}. \
Do not add any comments, only show the result.";

const FALLBACK_MIME: &str = "image/jpeg";
const LOG_EXCERPT_CHARS: usize = 500;

/// An uploaded image, held only for the duration of one request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl Upload {
    /// The MIME type used in the data URL: the declared `image/*` type, else
    /// the sniffed format, else JPEG.
    pub fn mime_type(&self) -> String {
        if let Some(declared) = self
            .content_type
            .as_deref()
            .filter(|ct| ct.starts_with("image/"))
        {
            return declared.to_string();
        }

        image::guess_format(&self.bytes)
            .ok()
            .and_then(mime_for_format)
            .unwrap_or(FALLBACK_MIME)
            .to_string()
    }

    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// MIME type for an image file on disk, judged by its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .ok()
        .and_then(mime_for_format)
        .unwrap_or(FALLBACK_MIME)
}

fn mime_for_format(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Tiff => Some("image/tiff"),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Issues exactly one chat-completion call per graded image. No retries.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: SecretString,
}

impl ProviderClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key: config.api_key.clone(),
        }
    }

    pub fn build_request(&self, upload: &Upload) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: GRADING_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: upload.data_url(),
                        },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        }
    }

    /// Sends the image and returns the first choice's text, untouched.
    ///
    /// `Ok(None)` means the first choice carried no content; zero choices is
    /// [`RelayError::NoChoices`].
    pub async fn read_scores(&self, upload: &Upload) -> Result<Option<String>, RelayError> {
        let payload = self.build_request(upload);

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            image_bytes = upload.bytes.len(),
            "Sending request to provider"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body: body.chars().take(LOG_EXCERPT_CHARS).collect(),
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)?;
        let first = completion
            .choices
            .into_iter()
            .next()
            .ok_or(RelayError::NoChoices)?;

        Ok(first.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ProviderClient {
        let config = Config {
            api_key: SecretString::new("sk-test".into()),
            base_url: "http://localhost:9000/v1/".into(),
            model: "gpt-4o".into(),
            max_tokens: 300,
            host: "127.0.0.1".into(),
            port: 0,
            max_upload_bytes: 1024,
        };
        ProviderClient::new(&config)
    }

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn declared_image_type_wins() {
        let upload = Upload {
            bytes: PNG_MAGIC.to_vec(),
            content_type: Some("image/webp".into()),
            file_name: None,
        };
        assert_eq!(upload.mime_type(), "image/webp");
    }

    #[test]
    fn generic_type_falls_back_to_sniffing() {
        let upload = Upload {
            bytes: PNG_MAGIC.to_vec(),
            content_type: Some("application/octet-stream".into()),
            file_name: Some("sheet".into()),
        };
        assert_eq!(upload.mime_type(), "image/png");
    }

    #[test]
    fn unknown_bytes_are_labelled_jpeg() {
        let upload = Upload {
            bytes: b"hello".to_vec(),
            content_type: None,
            file_name: None,
        };
        assert_eq!(upload.data_url(), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn file_extension_picks_the_mime_type() {
        assert_eq!(mime_for_path(Path::new("exam.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("scans/exam.WEBP")), "image/webp");
        assert_eq!(mime_for_path(Path::new("exam.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("exam")), "image/jpeg");
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(client().endpoint, "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn request_body_has_text_then_image_part() {
        let upload = Upload {
            bytes: b"hello".to_vec(),
            content_type: Some("image/png".into()),
            file_name: None,
        };
        let body = serde_json::to_value(client().build_request(&upload)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "user");
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], GRADING_PROMPT);
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(
            content[1]["image_url"]["url"],
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn reply_without_choices_field_decodes_as_empty() {
        let reply: ChatCompletionResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(reply.choices.is_empty());
    }
}
