//! The workflow state model.
//!
//! A [`State`] is one step of a workflow document: an identity
//! ([`StateId`](crate::types::StateId) plus construction
//! [`StateToken`](crate::types::StateToken)), the common input/output
//! transformation fields, an optional unconditional successor, and a
//! [`StateKind`] describing what the step does. The kind is a closed tagged
//! union: each variant carries only the fields its kind needs, and rendering
//! pattern-matches on it rather than dispatching virtually.
//!
//! States are constructed through the per-kind builders ([`Pass`], [`Task`],
//! [`Choice`], [`Wait`], [`Succeed`], [`Fail`], [`Parallel`], [`Map`],
//! [`Custom`]), which expose only the setters valid for that kind and convert
//! into `State`. Construction is infallible; identifier uniqueness and
//! transition integrity are checked later, when the state is registered into
//! a [`StateGraph`](crate::graph::StateGraph) and when the graph is rendered.
//!
//! # Examples
//!
//! ```rust
//! use stepgraph::state::{Pass, State, Task};
//! use stepgraph::policy::RetryPolicy;
//!
//! let hello: State = Pass::new("Hello").with_comment("first step").into();
//! assert_eq!(hello.id().as_str(), "Hello");
//!
//! let work: State = Task::new("DoWork", "arn:aws:lambda:::function:work")
//!     .with_timeout_seconds(30)
//!     .add_retry(RetryPolicy::new())
//!     .into();
//! assert!(work.kind().supports_next());
//! ```

mod builders;

pub use builders::{Choice, Custom, Fail, Map, Parallel, Pass, Succeed, Task, Wait};

use serde_json::{json, Map as JsonMap, Value};

use crate::condition::Condition;
use crate::errors::StateGraphError;
use crate::graph::StateGraph;
use crate::policy::{CatchPolicy, RetryPolicy};
use crate::types::{StateId, StateToken};

/// One step of a workflow document.
///
/// Identity (`id`) is fixed at construction; successor links stay mutable
/// through [`Chain`](crate::chain::Chain) operations until the graph is
/// rendered. Cloning preserves the construction token, so clones count as
/// the same state for cross-graph-reuse detection.
#[derive(Clone, Debug)]
pub struct State {
    pub(crate) id: StateId,
    pub(crate) token: StateToken,
    pub(crate) comment: Option<String>,
    pub(crate) input_path: Option<String>,
    pub(crate) output_path: Option<String>,
    pub(crate) parameters: Option<Value>,
    pub(crate) result_path: Option<String>,
    pub(crate) result_selector: Option<Value>,
    pub(crate) next: Option<StateId>,
    pub(crate) kind: StateKind,
}

/// What a state does, as a closed union over the workflow language kinds.
#[derive(Clone, Debug)]
pub enum StateKind {
    /// Passes input to output, optionally injecting a fixed result.
    Pass { result: Option<Value> },
    /// Invokes an external resource.
    Task {
        resource: String,
        timeout_seconds: Option<u32>,
        heartbeat_seconds: Option<u32>,
        handlers: ErrorHandlers,
    },
    /// Routes to the first matching condition, in declaration order.
    Choice {
        choices: Vec<ChoiceRule>,
        default: Option<StateId>,
    },
    /// Pauses until a duration elapses or a timestamp passes.
    Wait { trigger: WaitTrigger },
    /// Terminates the workflow successfully.
    Succeed,
    /// Terminates the workflow as failed.
    Fail {
        error: Option<String>,
        cause: Option<String>,
    },
    /// Runs every branch graph against the same input.
    Parallel {
        branches: Vec<StateGraph>,
        handlers: ErrorHandlers,
    },
    /// Applies one iterator graph to each element of an input collection.
    Map {
        iterator: Option<Box<StateGraph>>,
        items_path: Option<String>,
        max_concurrency: Option<u32>,
        handlers: ErrorHandlers,
    },
    /// A raw state object supplied verbatim by the caller.
    Custom { body: Value },
}

/// One ordered `(condition, target)` pair of a Choice state.
#[derive(Clone, Debug)]
pub struct ChoiceRule {
    pub condition: Condition,
    pub next: StateId,
}

/// What a Wait state waits for.
#[derive(Clone, Debug, PartialEq)]
pub enum WaitTrigger {
    /// A fixed number of seconds.
    Seconds(u32),
    /// An absolute RFC3339 timestamp.
    Timestamp(String),
    /// A number of seconds read from the input data.
    SecondsPath(String),
    /// A timestamp read from the input data.
    TimestampPath(String),
}

/// Ordered retry and catch policies carried by work states.
#[derive(Clone, Debug, Default)]
pub struct ErrorHandlers {
    pub retry: Vec<RetryPolicy>,
    pub catch: Vec<CatchPolicy>,
}

impl ErrorHandlers {
    pub(crate) fn is_empty(&self) -> bool {
        self.retry.is_empty() && self.catch.is_empty()
    }
}

impl StateKind {
    /// The `Type` field value for this kind. `Custom` bodies carry their own.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            StateKind::Pass { .. } => "Pass",
            StateKind::Task { .. } => "Task",
            StateKind::Choice { .. } => "Choice",
            StateKind::Wait { .. } => "Wait",
            StateKind::Succeed => "Succeed",
            StateKind::Fail { .. } => "Fail",
            StateKind::Parallel { .. } => "Parallel",
            StateKind::Map { .. } => "Map",
            StateKind::Custom { .. } => "Custom",
        }
    }

    /// Whether this kind takes an unconditional `Next` transition.
    ///
    /// Choice routes through its rules and default; Succeed and Fail are
    /// terminal.
    #[must_use]
    pub fn supports_next(&self) -> bool {
        !matches!(
            self,
            StateKind::Choice { .. } | StateKind::Succeed | StateKind::Fail { .. }
        )
    }

    /// Whether this kind terminates its workflow branch unconditionally.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StateKind::Succeed | StateKind::Fail { .. })
    }

    pub(crate) fn handlers(&self) -> Option<&ErrorHandlers> {
        match self {
            StateKind::Task { handlers, .. }
            | StateKind::Parallel { handlers, .. }
            | StateKind::Map { handlers, .. } => Some(handlers),
            _ => None,
        }
    }

    pub(crate) fn handlers_mut(&mut self) -> Option<&mut ErrorHandlers> {
        match self {
            StateKind::Task { handlers, .. }
            | StateKind::Parallel { handlers, .. }
            | StateKind::Map { handlers, .. } => Some(handlers),
            _ => None,
        }
    }

    pub(crate) fn child_graphs(&self) -> Vec<&StateGraph> {
        match self {
            StateKind::Parallel { branches, .. } => branches.iter().collect(),
            StateKind::Map {
                iterator: Some(it), ..
            } => vec![it.as_ref()],
            _ => Vec::new(),
        }
    }

    pub(crate) fn child_graphs_mut(&mut self) -> Vec<&mut StateGraph> {
        match self {
            StateKind::Parallel { branches, .. } => branches.iter_mut().collect(),
            StateKind::Map {
                iterator: Some(it), ..
            } => vec![it.as_mut()],
            _ => Vec::new(),
        }
    }
}

fn put(obj: &mut JsonMap<String, Value>, key: &str, value: Value) {
    obj.insert(key.to_string(), value);
}

impl State {
    pub(crate) fn new(id: impl Into<StateId>, kind: StateKind) -> Self {
        State {
            id: id.into(),
            token: StateToken::fresh(),
            comment: None,
            input_path: None,
            output_path: None,
            parameters: None,
            result_path: None,
            result_selector: None,
            next: None,
            kind,
        }
    }

    /// This state's identifier.
    #[must_use]
    pub fn id(&self) -> &StateId {
        &self.id
    }

    /// This state's construction token.
    #[must_use]
    pub fn token(&self) -> StateToken {
        self.token
    }

    /// This state's kind.
    #[must_use]
    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    /// The unconditional successor, if one has been linked.
    #[must_use]
    pub fn next(&self) -> Option<&StateId> {
        self.next.as_ref()
    }

    /// Renders this state to its JSON object.
    ///
    /// Branch and iterator graphs render recursively as nested documents.
    pub(crate) fn render(&self) -> Result<Value, StateGraphError> {
        let mut obj = match &self.kind {
            StateKind::Custom { body } => body.as_object().cloned().unwrap_or_default(),
            _ => JsonMap::new(),
        };
        if !matches!(self.kind, StateKind::Custom { .. }) {
            put(&mut obj, "Type", json!(self.kind.type_name()));
        }
        if let Some(comment) = &self.comment {
            put(&mut obj, "Comment", json!(comment));
        }
        if let Some(path) = &self.input_path {
            put(&mut obj, "InputPath", json!(path));
        }
        if let Some(path) = &self.output_path {
            put(&mut obj, "OutputPath", json!(path));
        }
        if let Some(parameters) = &self.parameters {
            put(&mut obj, "Parameters", parameters.clone());
        }
        if let Some(selector) = &self.result_selector {
            put(&mut obj, "ResultSelector", selector.clone());
        }
        if let Some(path) = &self.result_path {
            put(&mut obj, "ResultPath", json!(path));
        }

        match &self.kind {
            StateKind::Pass { result } => {
                if let Some(result) = result {
                    put(&mut obj, "Result", result.clone());
                }
            }
            StateKind::Task {
                resource,
                timeout_seconds,
                heartbeat_seconds,
                handlers,
            } => {
                put(&mut obj, "Resource", json!(resource));
                if let Some(seconds) = timeout_seconds {
                    put(&mut obj, "TimeoutSeconds", json!(seconds));
                }
                if let Some(seconds) = heartbeat_seconds {
                    put(&mut obj, "HeartbeatSeconds", json!(seconds));
                }
                render_handlers(&mut obj, handlers);
            }
            StateKind::Choice { choices, default } => {
                let rules = choices
                    .iter()
                    .map(|rule| {
                        let mut rendered = rule
                            .condition
                            .render()
                            .as_object()
                            .cloned()
                            .unwrap_or_default();
                        put(&mut rendered, "Next", json!(rule.next.as_str()));
                        Value::Object(rendered)
                    })
                    .collect::<Vec<_>>();
                put(&mut obj, "Choices", Value::Array(rules));
                if let Some(default) = default {
                    put(&mut obj, "Default", json!(default.as_str()));
                }
            }
            StateKind::Wait { trigger } => match trigger {
                WaitTrigger::Seconds(seconds) => put(&mut obj, "Seconds", json!(seconds)),
                WaitTrigger::Timestamp(ts) => put(&mut obj, "Timestamp", json!(ts)),
                WaitTrigger::SecondsPath(path) => put(&mut obj, "SecondsPath", json!(path)),
                WaitTrigger::TimestampPath(path) => put(&mut obj, "TimestampPath", json!(path)),
            },
            StateKind::Succeed => {}
            StateKind::Fail { error, cause } => {
                if let Some(error) = error {
                    put(&mut obj, "Error", json!(error));
                }
                if let Some(cause) = cause {
                    put(&mut obj, "Cause", json!(cause));
                }
            }
            StateKind::Parallel { branches, handlers } => {
                if branches.is_empty() {
                    return Err(StateGraphError::EmptyParallel {
                        id: self.id.clone(),
                    });
                }
                let rendered = branches
                    .iter()
                    .map(|branch| branch.render_document(false))
                    .collect::<Result<Vec<_>, _>>()?;
                put(&mut obj, "Branches", Value::Array(rendered));
                render_handlers(&mut obj, handlers);
            }
            StateKind::Map {
                iterator,
                items_path,
                max_concurrency,
                handlers,
            } => {
                let iterator = iterator.as_ref().ok_or_else(|| {
                    StateGraphError::MissingIterator {
                        id: self.id.clone(),
                    }
                })?;
                put(&mut obj, "Iterator", iterator.render_document(false)?);
                if let Some(path) = items_path {
                    put(&mut obj, "ItemsPath", json!(path));
                }
                if let Some(limit) = max_concurrency {
                    put(&mut obj, "MaxConcurrency", json!(limit));
                }
                render_handlers(&mut obj, handlers);
            }
            StateKind::Custom { .. } => {}
        }

        if self.kind.supports_next() {
            match &self.next {
                Some(next) => {
                    obj.remove("End");
                    put(&mut obj, "Next", json!(next.as_str()));
                }
                None => {
                    // Custom bodies may already carry their own transition.
                    if !obj.contains_key("Next") && !obj.contains_key("End") {
                        put(&mut obj, "End", json!(true));
                    }
                }
            }
        }
        Ok(Value::Object(obj))
    }
}

fn render_handlers(obj: &mut JsonMap<String, Value>, handlers: &ErrorHandlers) {
    if !handlers.retry.is_empty() {
        let retry = handlers.retry.iter().map(RetryPolicy::render).collect();
        put(obj, "Retry", Value::Array(retry));
    }
    if !handlers.catch.is_empty() {
        let catch = handlers.catch.iter().map(CatchPolicy::render).collect();
        put(obj, "Catch", Value::Array(catch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_renders_end_when_unlinked() {
        let state: State = Pass::new("A").into();
        assert_eq!(
            state.render().unwrap(),
            json!({"Type": "Pass", "End": true})
        );
    }

    #[test]
    fn pass_renders_transform_fields() {
        let state: State = Pass::new("A")
            .with_comment("note")
            .with_input_path("$.in")
            .with_output_path("$.out")
            .with_parameters(json!({"k": "v"}))
            .with_result(json!({"fixed": 1}))
            .with_result_path("$.result")
            .into();
        assert_eq!(
            state.render().unwrap(),
            json!({
                "Type": "Pass",
                "Comment": "note",
                "InputPath": "$.in",
                "OutputPath": "$.out",
                "Parameters": {"k": "v"},
                "Result": {"fixed": 1},
                "ResultPath": "$.result",
                "End": true,
            })
        );
    }

    #[test]
    fn terminal_kinds_render_without_transition() {
        let succeed: State = Succeed::new("Done").into();
        assert_eq!(succeed.render().unwrap(), json!({"Type": "Succeed"}));

        let fail: State = Fail::new("Boom")
            .with_error("States.Oops")
            .with_cause("it broke")
            .into();
        assert_eq!(
            fail.render().unwrap(),
            json!({"Type": "Fail", "Error": "States.Oops", "Cause": "it broke"})
        );
    }

    #[test]
    fn wait_trigger_variants_render_distinct_fields() {
        let by_seconds: State = Wait::seconds("W", 10).into();
        assert_eq!(
            by_seconds.render().unwrap(),
            json!({"Type": "Wait", "Seconds": 10, "End": true})
        );

        let by_path: State = Wait::timestamp_path("W", "$.until").into();
        assert_eq!(
            by_path.render().unwrap(),
            json!({"Type": "Wait", "TimestampPath": "$.until", "End": true})
        );
    }

    #[test]
    fn custom_body_keeps_its_own_transition() {
        let state: State = Custom::new(
            "Raw",
            json!({"Type": "Task", "Resource": "arn:x", "Next": "Elsewhere"}),
        )
        .into();
        assert_eq!(
            state.render().unwrap(),
            json!({"Type": "Task", "Resource": "arn:x", "Next": "Elsewhere"})
        );
    }

    #[test]
    fn clones_share_a_token() {
        let state: State = Pass::new("A").into();
        let copy = state.clone();
        assert_eq!(state.token(), copy.token());

        let other: State = Pass::new("A").into();
        assert_ne!(state.token(), other.token());
    }
}
