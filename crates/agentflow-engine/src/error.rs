/// Errors a turn can end with. Everything recoverable in the ordinary
/// course of a conversation (tool not found, tool failure, a missing
/// schema field) is fed back to the model instead of surfacing here — this
/// enum covers only the ways a turn can fail outright.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The tool-dispatch loop reached `EngineConfig::max_iterations`
    /// without the model producing a final, tool-call-free message.
    #[error("turn exceeded max iterations ({iterations}); last assistant message: {last_message:?}")]
    MaxIterations { iterations: usize, last_message: Option<String> },

    /// The caller's cancellation token fired before the turn completed.
    #[error("turn cancelled")]
    Cancelled { partial: Option<String> },

    #[error(transparent)]
    Domain(#[from] agentflow_types::error::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
