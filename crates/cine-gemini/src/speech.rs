//! Emotional speech synthesis.

use cine_models::Genre;
use tracing::{info, warn};

use crate::gateway::GenerationGateway;
use crate::prompts;
use crate::provider::Provider;
use crate::types::{GenerateContentRequest, GenerationConfig};
use crate::voice::VoicePersona;

impl<P: Provider> GenerationGateway<P> {
    /// Perform `text` as base64 PCM16 mono audio at 24 kHz.
    ///
    /// Never fails: any provider error, including exhausted retries, and a
    /// response without audio both yield `None`.
    pub async fn synthesize_performance(
        &self,
        text: &str,
        brief: &str,
        genre: Genre,
    ) -> Option<String> {
        if text.trim().is_empty() {
            warn!("Skipping speech synthesis for empty text");
            return None;
        }

        let voice = VoicePersona::select(genre, text);
        let request = GenerateContentRequest::text(prompts::performance(text, brief, genre))
            .with_config(GenerationConfig::speech(voice.as_str()));

        let response = match self.call("speech", &self.config.tts_model, &request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(voice = %voice, "Speech synthesis failed: {}", e);
                return None;
            }
        };

        match response.first_inline_data() {
            Some(audio) => {
                info!(voice = %voice, bytes_b64 = audio.data.len(), "Performance synthesized");
                Some(audio.data.clone())
            }
            None => {
                warn!(voice = %voice, "Provider returned no audio");
                None
            }
        }
    }
}
