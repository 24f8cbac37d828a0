use serde_json::Value;

/// Everything about a turn's execution that isn't the answer itself: how
/// many iterations it took, how the flow engine behaved, schema-guided
/// collection progress, and whether structured-output parsing succeeded.
#[derive(Debug, Clone, Default)]
pub struct TurnMetadata {
    pub iterations: usize,
    pub conditions_evaluated: usize,
    pub rules_fired: usize,
    /// `true` when a schema is attached and collection is still in
    /// progress (at least one required field missing).
    pub schema_collection: bool,
    /// The missing required field names, in schema declaration order.
    /// Empty whenever `schema_collection` is `false`.
    pub missing_fields: Vec<String>,
    /// Set when structured-output parsing was attempted and failed. A
    /// failure here never fails the turn — the caller decides what to do
    /// with an unparsed response.
    pub structured_parse_error: Option<String>,
}

/// The result of one `Engine::chat` call: the assistant's final message,
/// optional structured output, and turn telemetry.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub message: String,
    pub structured: Option<Value>,
    pub metadata: TurnMetadata,
}
