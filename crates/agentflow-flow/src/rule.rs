use agentflow_types::session::Session;

use crate::action::Action;
use crate::condition::Condition;
use crate::context::{TurnContext, TurnData};

/// One condition/action pair the engine evaluates before each model call.
///
/// Rules fire in descending `priority` order; rules with equal priority
/// fire in the order they were registered. A rule whose condition doesn't
/// hold is simply skipped — no short-circuiting of later rules.
pub struct FlowRule {
    pub name: String,
    pub priority: i32,
    pub condition: Box<dyn Condition>,
    pub action: Box<dyn Action>,
    pub description: String,
}

impl FlowRule {
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        condition: Box<dyn Condition>,
        action: Box<dyn Action>,
    ) -> Self {
        Self { name: name.into(), priority, condition, action, description: String::new() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Evaluates an ordered set of `FlowRule`s against the current turn state,
/// mutating a `TurnContext` for every rule whose condition holds.
pub struct FlowEngine {
    rules: Vec<FlowRule>,
}

impl FlowEngine {
    pub fn new(mut rules: Vec<FlowRule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[FlowRule] {
        &self.rules
    }

    /// Evaluate every rule in priority order (stable, so equal-priority
    /// rules keep registration order), applying the action of every rule
    /// whose condition returns `true`.
    ///
    /// A condition that errors is logged and treated as `false`. An action
    /// that errors is logged and does not stop evaluation of later rules.
    /// Takes `session` mutably (rather than through `TurnData`, which only
    /// borrows it) so an action can write into session history.
    pub fn evaluate(&self, session: &mut Session, latest_user_input: &str, ctx: &mut TurnContext) {
        for rule in &self.rules {
            ctx.telemetry.conditions_evaluated += 1;
            let holds = {
                let data = TurnData { session: &*session, latest_user_input };
                match rule.condition.evaluate(&data) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(rule = %rule.name, error = %e, "flow condition errored, treating as false");
                        false
                    }
                }
            };
            if !holds {
                continue;
            }
            ctx.telemetry.rules_fired += 1;
            if let Err(e) = rule.action.apply(ctx, session) {
                tracing::warn!(rule = %rule.name, error = %e, "flow action errored");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AppendSystemInstruction;
    use crate::condition::Contains;

    fn always_true() -> Box<dyn Condition> {
        Box::new(Contains::new(""))
    }

    #[test]
    fn rules_fire_in_descending_priority_order() {
        let rules = vec![
            FlowRule::new("low", 1, always_true(), Box::new(AppendSystemInstruction::new("low"))),
            FlowRule::new("high", 10, always_true(), Box::new(AppendSystemInstruction::new("high"))),
            FlowRule::new("mid", 5, always_true(), Box::new(AppendSystemInstruction::new("mid"))),
        ];
        let engine = FlowEngine::new(rules);
        let names: Vec<&str> = engine.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn equal_priority_rules_keep_registration_order() {
        let rules = vec![
            FlowRule::new("first", 5, always_true(), Box::new(AppendSystemInstruction::new("a"))),
            FlowRule::new("second", 5, always_true(), Box::new(AppendSystemInstruction::new("b"))),
        ];
        let engine = FlowEngine::new(rules);
        let mut session = Session::new("s1", None);
        let mut ctx = TurnContext::new();
        engine.evaluate(&mut session, "", &mut ctx);
        assert_eq!(ctx.system_instructions, vec!["a", "b"]);
    }

    #[test]
    fn non_matching_condition_is_skipped_without_affecting_later_rules() {
        let rules = vec![
            FlowRule::new(
                "urgent",
                10,
                Box::new(Contains::new("urgent")),
                Box::new(AppendSystemInstruction::new("URGENT-ACK")),
            ),
            FlowRule::new("always", 1, always_true(), Box::new(AppendSystemInstruction::new("always"))),
        ];
        let engine = FlowEngine::new(rules);
        let mut session = Session::new("s1", None);
        let mut ctx = TurnContext::new();
        engine.evaluate(&mut session, "nothing special", &mut ctx);
        assert_eq!(ctx.system_instructions, vec!["always"]);
        assert_eq!(ctx.telemetry.conditions_evaluated, 2);
        assert_eq!(ctx.telemetry.rules_fired, 1);
    }

    #[test]
    fn erroring_condition_is_treated_as_false_and_does_not_abort_evaluation() {
        struct AlwaysErrors;
        impl Condition for AlwaysErrors {
            fn evaluate(&self, _data: &TurnData<'_>) -> agentflow_types::error::Result<bool> {
                Err(agentflow_types::error::Error::Other("boom".into()))
            }
        }
        let rules = vec![
            FlowRule::new("broken", 10, Box::new(AlwaysErrors), Box::new(AppendSystemInstruction::new("x"))),
            FlowRule::new("always", 1, always_true(), Box::new(AppendSystemInstruction::new("always"))),
        ];
        let engine = FlowEngine::new(rules);
        let mut session = Session::new("s1", None);
        let mut ctx = TurnContext::new();
        engine.evaluate(&mut session, "", &mut ctx);
        assert_eq!(ctx.system_instructions, vec!["always"]);
        assert_eq!(ctx.telemetry.rules_fired, 1);
    }
}
