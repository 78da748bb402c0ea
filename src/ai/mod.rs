//! AI summary of a certification task via the Gemini `generateContent` API.
//!
//! Analysis is best-effort: any failure, including a missing API key, is
//! logged and replaced by [`FALLBACK_ANALYSIS`]. Callers never see an error.

use std::time::Duration;

use anyhow::{anyhow, Context};
use halaltrack_core::models::Stage;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;

pub const FALLBACK_ANALYSIS: &str = "Maaf, analisis AI saat ini tidak tersedia.";

const SYSTEM_INSTRUCTION: &str = "Anda adalah konsultan sertifikasi Halal profesional. \
     Berikan respon yang sangat ringkas, terstruktur (bullet points), dan profesional \
     dalam Bahasa Indonesia.";
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Analyzer {
    client: reqwest::Client,
    config: AiConfig,
}

impl Analyzer {
    pub fn new(config: AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    /// An analyzer that always answers with the fallback text.
    pub fn disabled() -> Self {
        Self::new(AiConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn analyze(&self, name: &str, description: &str, stage: Stage) -> String {
        let Some(api_key) = self.config.api_key.as_deref() else {
            tracing::warn!("AI analysis requested but no API key is configured");
            return FALLBACK_ANALYSIS.to_string();
        };

        match self.generate(api_key, &build_prompt(name, description, stage)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("AI analysis failed: {:#}", e);
                FALLBACK_ANALYSIS.to_string()
            }
        }
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        tracing::debug!("Requesting AI analysis from {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateRequest::new(prompt))
            .send()
            .await
            .context("AI request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("AI endpoint returned {}", status));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("AI response was not valid JSON")?;
        body.text().ok_or_else(|| anyhow!("AI response contained no text"))
    }
}

pub fn build_prompt(name: &str, description: &str, stage: Stage) -> String {
    format!(
        "Analisis tugas sertifikasi Halal berikut:\n\
         Nama: {}\n\
         Deskripsi: {}\n\
         Tahap Saat Ini: {}\n\n\
         Berikan ringkasan singkat mengenai potensi risiko, dokumen yang diperlukan untuk \
         tahap ini, dan saran untuk mempercepat proses.",
        name,
        description,
        stage.label()
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn new(prompt: &str) -> Self {
        Self {
            system_instruction: Content::text(None, SYSTEM_INSTRUCTION),
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts joined. `None` when empty.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}
