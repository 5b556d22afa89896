use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the analysis-engine round trip and artifact
/// storage. The engine deadline is a hard limit: exceeding it fails the
/// orchestration, it is not retried within the same request.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub artifact_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(300),
            artifact_dir: PathBuf::from("artifacts"),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("INSIGHTDECK_ENGINE_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("INSIGHTDECK_ENGINE_TIMEOUT_SECS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            artifact_dir: std::env::var("INSIGHTDECK_ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
        }
    }
}
