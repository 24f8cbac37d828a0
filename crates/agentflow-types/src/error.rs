/// Shared error type used across all agentflow crates.
///
/// Each variant corresponds to one of the error kinds in the runtime's
/// error-handling design: config and session-not-found are returned
/// directly to callers, the model/tool kinds are recorded onto the turn
/// (tool failures are fed back to the model rather than aborting it), and
/// `Json`/`Io` cover the usual serialization/filesystem failure surface.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Agent built without a required collaborator (model, session store).
    #[error("config: {0}")]
    Config(String),

    /// `get` on an unknown or expired session id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Network, 5xx, or rate-limit failure from the chat model. Retried
    /// with backoff inside the adapter before ever reaching the caller.
    #[error("model error (transient): {0}")]
    ModelTransient(String),

    /// Authentication failure or malformed response after all retries.
    #[error("model error (fatal): {0}")]
    ModelFatal(String),

    /// The model requested a tool that isn't registered.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Tool call arguments were not valid JSON, or not an object.
    #[error("tool argument parse error: {0}")]
    ToolArgParse(String),

    /// The tool itself returned an error, or its timeout elapsed.
    #[error("tool execution error: {0}")]
    ToolExec(String),

    /// Session `save` failed. Logged; the turn result is still returned.
    #[error("persist failed: {0}")]
    Persist(String),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
