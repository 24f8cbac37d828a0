use std::time::Duration;

use agentflow_providers::Settings;

/// Runtime knobs for the turn engine. Everything has a default so a caller
/// can get moving with `EngineConfig::default()` and override only what
/// matters to them.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model id passed to `ChatModel::generate` on every call.
    pub model_id: String,
    /// Inference settings applied to every model call.
    pub settings: Settings,
    /// Hard cap on model-call/tool-dispatch iterations within one turn.
    /// Reaching this without a final non-tool-call response ends the turn
    /// with `EngineError::MaxIterations`.
    pub max_iterations: usize,
    /// Per-tool-call timeout, derived once per turn from the outer
    /// cancellation token.
    pub tool_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_id: "default".to_string(),
            settings: Settings::default(),
            max_iterations: 8,
            tool_timeout: Duration::from_secs(30),
        }
    }
}
