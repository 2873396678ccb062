//! Manuscript analysis: extract a visual manifest from a script.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GeminiResult;
use crate::gateway::GenerationGateway;
use crate::normalize::parse_structured;
use crate::prompts;
use crate::provider::Provider;
use crate::types::{GenerateContentRequest, GenerationConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterDraft {
    pub name: String,
    pub role: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentDraft {
    pub name: String,
    pub mood: String,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotifDraft {
    pub label: String,
    pub icon: String,
    pub description: String,
    pub frequency: Option<String>,
}

/// Manifest candidates extracted from a manuscript. Ids are assigned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManuscriptAnalysis {
    pub characters: Vec<CharacterDraft>,
    pub environments: Vec<EnvironmentDraft>,
    pub motifs: Vec<MotifDraft>,
}

impl ManuscriptAnalysis {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.environments.is_empty() && self.motifs.is_empty()
    }

    /// Drop entries without a usable name or label.
    fn prune(mut self) -> Self {
        self.characters.retain(|c| !c.name.trim().is_empty());
        self.environments.retain(|e| !e.name.trim().is_empty());
        self.motifs.retain(|m| !m.label.trim().is_empty());
        self
    }
}

impl<P: Provider> GenerationGateway<P> {
    /// Extract characters, environments and motifs from a manuscript.
    ///
    /// Malformed output yields an empty analysis; provider failures propagate
    /// after retries so the caller can leave its manifest untouched.
    pub async fn analyze_manuscript(&self, manuscript: &str) -> GeminiResult<ManuscriptAnalysis> {
        let request = GenerateContentRequest::text(prompts::manuscript_analysis(manuscript))
            .with_config(GenerationConfig::json(prompts::analysis_schema()));

        let response = self
            .call("analyze_manuscript", &self.config.text_model, &request)
            .await?;

        let analysis: ManuscriptAnalysis = parse_structured(response.text().unwrap_or_default());
        let analysis = analysis.prune();

        info!(
            characters = analysis.characters.len(),
            environments = analysis.environments.len(),
            motifs = analysis.motifs.len(),
            "Manuscript analyzed"
        );
        Ok(analysis)
    }
}
