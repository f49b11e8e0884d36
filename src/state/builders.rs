//! Typed builders for each state kind.
//!
//! Each builder exposes only the setters that are valid for its kind, so a
//! Succeed state cannot be given a `ResultPath` and a Pass state cannot be
//! given retry policies. Every builder converts into [`State`] via `From`,
//! which is what [`StateGraph::register`](crate::graph::StateGraph::register)
//! accepts.

use serde_json::Value;
use tracing::warn;

use crate::condition::Condition;
use crate::graph::StateGraph;
use crate::policy::{CatchPolicy, RetryPolicy};
use crate::state::{ChoiceRule, ErrorHandlers, State, StateKind, WaitTrigger};
use crate::types::StateId;

macro_rules! string_field_setters {
    ($($(#[$meta:meta])* $method:ident => $field:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $method(mut self, value: impl Into<String>) -> Self {
                self.state.$field = Some(value.into());
                self
            }
        )+
    };
}

macro_rules! json_field_setters {
    ($($(#[$meta:meta])* $method:ident => $field:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $method(mut self, value: Value) -> Self {
                self.state.$field = Some(value);
                self
            }
        )+
    };
}

macro_rules! into_state {
    ($($builder:ident),+ $(,)?) => {
        $(
            impl From<$builder> for State {
                fn from(builder: $builder) -> State {
                    builder.state
                }
            }
        )+
    };
}

into_state!(Pass, Task, Choice, Wait, Succeed, Fail, Parallel, Map, Custom);

/// Builder for a Pass state.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use stepgraph::state::{Pass, State};
///
/// let state: State = Pass::new("Inject")
///     .with_result(json!({"ok": true}))
///     .with_result_path("$.status")
///     .into();
/// ```
#[derive(Clone, Debug)]
pub struct Pass {
    state: State,
}

impl Pass {
    #[must_use]
    pub fn new(id: impl Into<StateId>) -> Self {
        Pass {
            state: State::new(id, StateKind::Pass { result: None }),
        }
    }

    string_field_setters! {
        /// Attaches a human-readable comment.
        with_comment => comment,
        /// Selects the portion of the input passed to this state.
        with_input_path => input_path,
        /// Selects the portion of the output passed onward.
        with_output_path => output_path,
        /// Places the result at this path within the input.
        with_result_path => result_path,
    }

    json_field_setters! {
        /// Reshapes the effective input.
        with_parameters => parameters,
    }

    /// Sets the fixed result this state injects.
    #[must_use]
    pub fn with_result(mut self, result: Value) -> Self {
        self.state.kind = StateKind::Pass {
            result: Some(result),
        };
        self
    }
}

/// Builder for a Task state invoking an external resource.
///
/// # Examples
///
/// ```rust
/// use stepgraph::policy::{CatchPolicy, RetryPolicy, ERRORS_TIMEOUT};
/// use stepgraph::state::{State, Task};
///
/// let state: State = Task::new("Charge", "arn:aws:lambda:::function:charge")
///     .with_timeout_seconds(30)
///     .add_retry(RetryPolicy::for_errors([ERRORS_TIMEOUT]))
///     .add_catch(CatchPolicy::new("Refund"))
///     .into();
/// ```
#[derive(Clone, Debug)]
pub struct Task {
    state: State,
}

impl Task {
    #[must_use]
    pub fn new(id: impl Into<StateId>, resource: impl Into<String>) -> Self {
        Task {
            state: State::new(
                id,
                StateKind::Task {
                    resource: resource.into(),
                    timeout_seconds: None,
                    heartbeat_seconds: None,
                    handlers: ErrorHandlers::default(),
                },
            ),
        }
    }

    string_field_setters! {
        /// Attaches a human-readable comment.
        with_comment => comment,
        /// Selects the portion of the input passed to this state.
        with_input_path => input_path,
        /// Selects the portion of the output passed onward.
        with_output_path => output_path,
        /// Places the task result at this path within the input.
        with_result_path => result_path,
    }

    json_field_setters! {
        /// Reshapes the effective input.
        with_parameters => parameters,
        /// Reshapes the raw task result before `ResultPath` applies.
        with_result_selector => result_selector,
    }

    /// Fails the task with `States.Timeout` after this many seconds.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u32) -> Self {
        if let StateKind::Task {
            timeout_seconds, ..
        } = &mut self.state.kind
        {
            *timeout_seconds = Some(seconds);
        }
        self
    }

    /// Fails the task with `States.HeartbeatTimeout` if no heartbeat arrives
    /// within this many seconds.
    #[must_use]
    pub fn with_heartbeat_seconds(mut self, seconds: u32) -> Self {
        if let StateKind::Task {
            heartbeat_seconds, ..
        } = &mut self.state.kind
        {
            *heartbeat_seconds = Some(seconds);
        }
        self
    }

    /// Appends a retry policy. Policies apply in the order added.
    #[must_use]
    pub fn add_retry(mut self, retry: RetryPolicy) -> Self {
        if let StateKind::Task { handlers, .. } = &mut self.state.kind {
            handlers.retry.push(retry);
        }
        self
    }

    /// Appends a catch policy. Policies apply in the order added.
    #[must_use]
    pub fn add_catch(mut self, catch: CatchPolicy) -> Self {
        if let StateKind::Task { handlers, .. } = &mut self.state.kind {
            handlers.catch.push(catch);
        }
        self
    }
}

/// Builder for a Choice state routing on its input.
///
/// Rules are evaluated in the order [`when`](Choice::when) was called; the
/// first match wins. [`otherwise`](Choice::otherwise) installs the fallback
/// taken when no rule matches.
///
/// # Examples
///
/// ```rust
/// use stepgraph::condition::Condition;
/// use stepgraph::state::{Choice, State};
///
/// let state: State = Choice::new("Route")
///     .when(Condition::number_greater_than("$.amount", 100.0), "Review")
///     .when(Condition::is_null("$.amount", true), "Reject")
///     .otherwise("Approve")
///     .into();
/// ```
#[derive(Clone, Debug)]
pub struct Choice {
    state: State,
}

impl Choice {
    #[must_use]
    pub fn new(id: impl Into<StateId>) -> Self {
        Choice {
            state: State::new(
                id,
                StateKind::Choice {
                    choices: Vec::new(),
                    default: None,
                },
            ),
        }
    }

    string_field_setters! {
        /// Attaches a human-readable comment.
        with_comment => comment,
        /// Selects the portion of the input passed to this state.
        with_input_path => input_path,
        /// Selects the portion of the output passed onward.
        with_output_path => output_path,
    }

    /// Appends a `(condition, target)` rule.
    #[must_use]
    pub fn when(mut self, condition: Condition, next: impl Into<StateId>) -> Self {
        if let StateKind::Choice { choices, .. } = &mut self.state.kind {
            choices.push(ChoiceRule {
                condition,
                next: next.into(),
            });
        }
        self
    }

    /// Sets the fallback target taken when no rule matches.
    ///
    /// Calling this twice replaces the fallback and logs a warning; the
    /// rendered document keeps the last value.
    #[must_use]
    pub fn otherwise(mut self, next: impl Into<StateId>) -> Self {
        let next = next.into();
        if let StateKind::Choice { default, .. } = &mut self.state.kind {
            if let Some(existing) = default.as_ref() {
                warn!(
                    id = %self.state.id,
                    existing = %existing,
                    requested = %next,
                    "replacing existing otherwise target on choice state"
                );
            }
            *default = Some(next);
        }
        self
    }
}

/// Builder for a Wait state.
///
/// The four constructors correspond to the four mutually exclusive wait
/// triggers; picking one at construction means a Wait state can never carry
/// two.
#[derive(Clone, Debug)]
pub struct Wait {
    state: State,
}

impl Wait {
    /// Waits a fixed number of seconds.
    #[must_use]
    pub fn seconds(id: impl Into<StateId>, seconds: u32) -> Self {
        Self::with_trigger(id, WaitTrigger::Seconds(seconds))
    }

    /// Waits until an absolute RFC3339 timestamp.
    #[must_use]
    pub fn timestamp(id: impl Into<StateId>, timestamp: impl Into<String>) -> Self {
        Self::with_trigger(id, WaitTrigger::Timestamp(timestamp.into()))
    }

    /// Waits a number of seconds read from the input at `path`.
    #[must_use]
    pub fn seconds_path(id: impl Into<StateId>, path: impl Into<String>) -> Self {
        Self::with_trigger(id, WaitTrigger::SecondsPath(path.into()))
    }

    /// Waits until a timestamp read from the input at `path`.
    #[must_use]
    pub fn timestamp_path(id: impl Into<StateId>, path: impl Into<String>) -> Self {
        Self::with_trigger(id, WaitTrigger::TimestampPath(path.into()))
    }

    fn with_trigger(id: impl Into<StateId>, trigger: WaitTrigger) -> Self {
        Wait {
            state: State::new(id, StateKind::Wait { trigger }),
        }
    }

    string_field_setters! {
        /// Attaches a human-readable comment.
        with_comment => comment,
        /// Selects the portion of the input passed to this state.
        with_input_path => input_path,
        /// Selects the portion of the output passed onward.
        with_output_path => output_path,
    }
}

/// Builder for a Succeed state.
#[derive(Clone, Debug)]
pub struct Succeed {
    state: State,
}

impl Succeed {
    #[must_use]
    pub fn new(id: impl Into<StateId>) -> Self {
        Succeed {
            state: State::new(id, StateKind::Succeed),
        }
    }

    string_field_setters! {
        /// Attaches a human-readable comment.
        with_comment => comment,
        /// Selects the portion of the input recorded as workflow output.
        with_input_path => input_path,
        /// Selects the portion of the output recorded as workflow output.
        with_output_path => output_path,
    }
}

/// Builder for a Fail state.
///
/// # Examples
///
/// ```rust
/// use stepgraph::state::{Fail, State};
///
/// let state: State = Fail::new("OutOfStock")
///     .with_error("Inventory.Empty")
///     .with_cause("no units left to ship")
///     .into();
/// ```
#[derive(Clone, Debug)]
pub struct Fail {
    state: State,
}

impl Fail {
    #[must_use]
    pub fn new(id: impl Into<StateId>) -> Self {
        Fail {
            state: State::new(
                id,
                StateKind::Fail {
                    error: None,
                    cause: None,
                },
            ),
        }
    }

    string_field_setters! {
        /// Attaches a human-readable comment.
        with_comment => comment,
    }

    /// Sets the error name reported by this failure.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        if let StateKind::Fail { error: slot, .. } = &mut self.state.kind {
            *slot = Some(error.into());
        }
        self
    }

    /// Sets the human-readable cause reported by this failure.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        if let StateKind::Fail { cause: slot, .. } = &mut self.state.kind {
            *slot = Some(cause.into());
        }
        self
    }
}

/// Builder for a Parallel state running branch graphs concurrently.
///
/// A Parallel state must carry at least one branch by render time;
/// [`EmptyParallel`](crate::errors::StateGraphError::EmptyParallel)
/// otherwise.
///
/// # Examples
///
/// ```rust
/// use stepgraph::graph::StateGraph;
/// use stepgraph::state::{Parallel, Pass, State};
///
/// let mut branch = StateGraph::new();
/// branch.register(Pass::new("Audit")).unwrap();
/// branch.start_at("Audit");
///
/// let state: State = Parallel::new("FanOut").branch(branch).into();
/// ```
#[derive(Clone, Debug)]
pub struct Parallel {
    state: State,
}

impl Parallel {
    #[must_use]
    pub fn new(id: impl Into<StateId>) -> Self {
        Parallel {
            state: State::new(
                id,
                StateKind::Parallel {
                    branches: Vec::new(),
                    handlers: ErrorHandlers::default(),
                },
            ),
        }
    }

    string_field_setters! {
        /// Attaches a human-readable comment.
        with_comment => comment,
        /// Selects the portion of the input passed to every branch.
        with_input_path => input_path,
        /// Selects the portion of the output passed onward.
        with_output_path => output_path,
        /// Places the branch results array at this path within the input.
        with_result_path => result_path,
    }

    json_field_setters! {
        /// Reshapes the effective input.
        with_parameters => parameters,
        /// Reshapes the branch results before `ResultPath` applies.
        with_result_selector => result_selector,
    }

    /// Appends a branch graph. Branches render in the order added.
    ///
    /// A `TimeoutSeconds` set on the branch graph is ignored; only the
    /// top-level graph's timeout renders. A warning is logged so the
    /// misplaced setting is not silently lost.
    #[must_use]
    pub fn branch(mut self, graph: StateGraph) -> Self {
        if graph.timeout_seconds().is_some() {
            warn!(
                id = %self.state.id,
                "branch graph timeout is ignored; set it on the top-level graph"
            );
        }
        if let StateKind::Parallel { branches, .. } = &mut self.state.kind {
            branches.push(graph);
        }
        self
    }

    /// Appends a retry policy covering the whole parallel block.
    #[must_use]
    pub fn add_retry(mut self, retry: RetryPolicy) -> Self {
        if let StateKind::Parallel { handlers, .. } = &mut self.state.kind {
            handlers.retry.push(retry);
        }
        self
    }

    /// Appends a catch policy covering the whole parallel block.
    #[must_use]
    pub fn add_catch(mut self, catch: CatchPolicy) -> Self {
        if let StateKind::Parallel { handlers, .. } = &mut self.state.kind {
            handlers.catch.push(catch);
        }
        self
    }
}

/// Builder for a Map state applying an iterator graph per input element.
///
/// A Map state must carry an iterator graph by render time;
/// [`MissingIterator`](crate::errors::StateGraphError::MissingIterator)
/// otherwise.
#[derive(Clone, Debug)]
pub struct Map {
    state: State,
}

impl Map {
    #[must_use]
    pub fn new(id: impl Into<StateId>) -> Self {
        Map {
            state: State::new(
                id,
                StateKind::Map {
                    iterator: None,
                    items_path: None,
                    max_concurrency: None,
                    handlers: ErrorHandlers::default(),
                },
            ),
        }
    }

    string_field_setters! {
        /// Attaches a human-readable comment.
        with_comment => comment,
        /// Selects the portion of the input passed to this state.
        with_input_path => input_path,
        /// Selects the portion of the output passed onward.
        with_output_path => output_path,
        /// Places the per-element results array at this path within the input.
        with_result_path => result_path,
    }

    json_field_setters! {
        /// Reshapes the per-element input.
        with_parameters => parameters,
        /// Reshapes the results array before `ResultPath` applies.
        with_result_selector => result_selector,
    }

    /// Selects the input collection to iterate over.
    #[must_use]
    pub fn with_items_path(mut self, path: impl Into<String>) -> Self {
        if let StateKind::Map { items_path, .. } = &mut self.state.kind {
            *items_path = Some(path.into());
        }
        self
    }

    /// Caps how many elements may be processed concurrently.
    #[must_use]
    pub fn with_max_concurrency(mut self, limit: u32) -> Self {
        if let StateKind::Map {
            max_concurrency, ..
        } = &mut self.state.kind
        {
            *max_concurrency = Some(limit);
        }
        self
    }

    /// Sets the graph applied to each element of the input collection.
    ///
    /// Calling this twice replaces the iterator and logs a warning. A
    /// `TimeoutSeconds` set on the iterator graph is ignored, as for
    /// [`Parallel::branch`].
    #[must_use]
    pub fn iterator(mut self, graph: StateGraph) -> Self {
        if graph.timeout_seconds().is_some() {
            warn!(
                id = %self.state.id,
                "iterator graph timeout is ignored; set it on the top-level graph"
            );
        }
        if let StateKind::Map { iterator, .. } = &mut self.state.kind {
            if iterator.is_some() {
                warn!(id = %self.state.id, "replacing existing iterator graph on map state");
            }
            *iterator = Some(Box::new(graph));
        }
        self
    }

    /// Appends a retry policy covering the whole map block.
    #[must_use]
    pub fn add_retry(mut self, retry: RetryPolicy) -> Self {
        if let StateKind::Map { handlers, .. } = &mut self.state.kind {
            handlers.retry.push(retry);
        }
        self
    }

    /// Appends a catch policy covering the whole map block.
    #[must_use]
    pub fn add_catch(mut self, catch: CatchPolicy) -> Self {
        if let StateKind::Map { handlers, .. } = &mut self.state.kind {
            handlers.catch.push(catch);
        }
        self
    }
}

/// Builder for a raw state supplied as a JSON object.
///
/// The body renders verbatim, so fields this crate does not model stay
/// available. The body's own `Type` is kept as-is, and its `Next`/`End` are
/// preserved unless the state is linked into a chain, in which case the
/// chain's `Next` wins.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use stepgraph::state::{Custom, State};
///
/// let state: State = Custom::new(
///     "Athena",
///     json!({"Type": "Task", "Resource": "arn:aws:states:::athena:startQueryExecution"}),
/// )
/// .into();
/// ```
#[derive(Clone, Debug)]
pub struct Custom {
    state: State,
}

impl Custom {
    #[must_use]
    pub fn new(id: impl Into<StateId>, body: Value) -> Self {
        Custom {
            state: State::new(id, StateKind::Custom { body }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn choice_rules_keep_declaration_order() {
        let state: State = Choice::new("Route")
            .when(Condition::string_equals("$.kind", "a"), "HandleA")
            .when(Condition::string_equals("$.kind", "b"), "HandleB")
            .into();
        let StateKind::Choice { choices, .. } = state.kind() else {
            panic!("expected a choice kind");
        };
        let targets: Vec<_> = choices.iter().map(|r| r.next.as_str()).collect();
        assert_eq!(targets, ["HandleA", "HandleB"]);
    }

    #[test]
    fn otherwise_twice_keeps_last_target() {
        let state: State = Choice::new("Route")
            .otherwise("First")
            .otherwise("Second")
            .into();
        let StateKind::Choice { default, .. } = state.kind() else {
            panic!("expected a choice kind");
        };
        assert_eq!(default.as_ref().map(StateId::as_str), Some("Second"));
    }

    #[test]
    fn task_handlers_keep_order_added() {
        let state: State = Task::new("T", "arn:x")
            .add_retry(RetryPolicy::for_errors(["First"]))
            .add_retry(RetryPolicy::for_errors(["Second"]))
            .into();
        let handlers = state.kind().handlers().cloned().unwrap_or_default();
        assert_eq!(handlers.retry[0].errors, ["First"]);
        assert_eq!(handlers.retry[1].errors, ["Second"]);
    }

    #[test]
    fn parallel_branches_append() {
        let mut one = StateGraph::new();
        one.register(Pass::new("A")).unwrap();
        one.start_at("A");
        let mut two = StateGraph::new();
        two.register(Pass::new("B")).unwrap();
        two.start_at("B");

        let state: State = Parallel::new("FanOut").branch(one).branch(two).into();
        assert_eq!(state.kind().child_graphs().len(), 2);
    }

    #[test]
    fn map_iterator_replaces_on_second_call() {
        let mut first = StateGraph::new();
        first.register(Pass::new("A")).unwrap();
        first.start_at("A");
        let mut second = StateGraph::new();
        second.register(Pass::new("B")).unwrap();
        second.start_at("B");

        let state: State = Map::new("Each").iterator(first).iterator(second).into();
        let children = state.kind().child_graphs();
        assert_eq!(children.len(), 1);
        assert!(children[0].contains("B"));
        assert_eq!(
            state.render().unwrap(),
            json!({
                "Type": "Map",
                "Iterator": {
                    "StartAt": "B",
                    "States": {"B": {"Type": "Pass", "End": true}},
                },
                "End": true,
            })
        );
    }
}
