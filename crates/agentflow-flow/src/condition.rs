use agentflow_types::error::Result;

use crate::context::TurnData;

/// A predicate evaluated against the turn's current state. Errors are
/// logged by the engine and treated as `false` — a misbehaving condition
/// never aborts a turn.
pub trait Condition: Send + Sync {
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool>;
}

/// Case-insensitive substring match against the turn's triggering user
/// input.
pub struct Contains {
    needle: String,
}

impl Contains {
    pub fn new(needle: impl Into<String>) -> Self {
        Self { needle: needle.into().to_lowercase() }
    }
}

impl Condition for Contains {
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool> {
        Ok(data.latest_user_input.to_lowercase().contains(&self.needle))
    }
}

/// True once the session has accumulated at least `n` message entries.
pub struct MessageCountAtLeast {
    n: usize,
}

impl MessageCountAtLeast {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl Condition for MessageCountAtLeast {
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool> {
        Ok(data.session.message_count() >= self.n)
    }
}

/// True while any of the named fields is absent from session state.
pub struct MissingFields {
    names: Vec<String>,
}

impl MissingFields {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { names: names.into_iter().map(Into::into).collect() }
    }
}

impl Condition for MissingFields {
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool> {
        Ok(self.names.iter().any(|n| !data.session.state.contains_key(n)))
    }
}

/// True when session state's `stage` key equals the given value.
pub struct CompletionStage {
    stage: String,
}

impl CompletionStage {
    pub fn new(stage: impl Into<String>) -> Self {
        Self { stage: stage.into() }
    }
}

impl Condition for CompletionStage {
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool> {
        Ok(data
            .session
            .state
            .get("stage")
            .and_then(|v| v.as_str())
            .is_some_and(|s| s == self.stage))
    }
}

/// Wraps a plain closure as a `Condition`, for callers who don't want to
/// define a type.
pub struct Predicate<F>(F)
where
    F: Fn(&TurnData<'_>) -> Result<bool> + Send + Sync;

impl<F> Predicate<F>
where
    F: Fn(&TurnData<'_>) -> Result<bool> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Condition for Predicate<F>
where
    F: Fn(&TurnData<'_>) -> Result<bool> + Send + Sync,
{
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool> {
        (self.0)(data)
    }
}

pub struct And(pub Box<dyn Condition>, pub Box<dyn Condition>);

impl Condition for And {
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool> {
        Ok(self.0.evaluate(data)? && self.1.evaluate(data)?)
    }
}

pub struct Or(pub Box<dyn Condition>, pub Box<dyn Condition>);

impl Condition for Or {
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool> {
        Ok(self.0.evaluate(data)? || self.1.evaluate(data)?)
    }
}

pub struct Not(pub Box<dyn Condition>);

impl Condition for Not {
    fn evaluate(&self, data: &TurnData<'_>) -> Result<bool> {
        Ok(!self.0.evaluate(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_types::session::Session;

    fn data<'a>(session: &'a Session, input: &'a str) -> TurnData<'a> {
        TurnData { session, latest_user_input: input }
    }

    #[test]
    fn contains_is_case_insensitive() {
        let session = Session::new("s1", None);
        let cond = Contains::new("urgent");
        assert!(cond.evaluate(&data(&session, "This is URGENT!")).unwrap());
        assert!(!cond.evaluate(&data(&session, "all good")).unwrap());
    }

    #[test]
    fn message_count_at_least_fires_exactly_at_the_boundary() {
        let mut session = Session::new("s1", None);
        let cond = MessageCountAtLeast::new(2);
        session.append(agentflow_types::session::HistoryEntry::message(
            agentflow_types::Role::User,
            "one",
        ));
        assert!(!cond.evaluate(&data(&session, "")).unwrap(), "n-1 messages must not fire");

        session.append(agentflow_types::session::HistoryEntry::message(
            agentflow_types::Role::Assistant,
            "two",
        ));
        assert!(cond.evaluate(&data(&session, "")).unwrap(), "exactly n messages must fire");

        session.append(agentflow_types::session::HistoryEntry::message(
            agentflow_types::Role::User,
            "three",
        ));
        assert!(cond.evaluate(&data(&session, "")).unwrap(), "n+1 messages must still fire");
    }

    #[test]
    fn missing_fields_true_until_all_present() {
        let mut session = Session::new("s1", None);
        let cond = MissingFields::new(["email", "issue"]);
        assert!(cond.evaluate(&data(&session, "")).unwrap());
        session.state.insert("email".into(), serde_json::json!("a@b.com"));
        assert!(cond.evaluate(&data(&session, "")).unwrap());
        session.state.insert("issue".into(), serde_json::json!("broken login"));
        assert!(!cond.evaluate(&data(&session, "")).unwrap());
    }

    #[test]
    fn and_or_not_compose() {
        let session = Session::new("s1", None);
        let cond = And(
            Box::new(Contains::new("urgent")),
            Box::new(Not(Box::new(Contains::new("ignore")))),
        );
        assert!(cond.evaluate(&data(&session, "urgent issue")).unwrap());
        assert!(!cond.evaluate(&data(&session, "urgent, please ignore")).unwrap());

        let or_cond = Or(Box::new(Contains::new("a")), Box::new(Contains::new("b")));
        assert!(or_cond.evaluate(&data(&session, "b only")).unwrap());
    }

    #[test]
    fn completion_stage_matches_state_value() {
        let mut session = Session::new("s1", None);
        session.state.insert("stage".into(), serde_json::json!("collecting"));
        let cond = CompletionStage::new("collecting");
        assert!(cond.evaluate(&data(&session, "")).unwrap());
        let other = CompletionStage::new("done");
        assert!(!other.evaluate(&data(&session, "")).unwrap());
    }
}
