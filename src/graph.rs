//! The workflow graph: a registry of states plus a start pointer.
//!
//! [`StateGraph`] is the arena every state lives in. Construction is split
//! into two phases:
//!
//! 1. **Build**: [`register`](StateGraph::register) states, link them with
//!    [`Chain`](crate::chain::Chain) operations, set
//!    [`start_at`](StateGraph::start_at). Transitions are plain string ids
//!    during this phase, so states can reference targets registered later.
//! 2. **Validate and render**: [`to_graph_json`](StateGraph::to_graph_json)
//!    walks the whole workflow tree (this graph plus every nested branch and
//!    iterator graph), checks identifier uniqueness and transition integrity,
//!    and only then renders the JSON document.
//!
//! Rendering is read-only and deterministic: the same graph always produces
//! the same document, and rendering twice never mutates the graph.
//!
//! # Quick Start
//!
//! ```rust
//! use stepgraph::chain::Chain;
//! use stepgraph::graph::StateGraph;
//! use stepgraph::state::{Pass, Succeed};
//!
//! fn build() -> Result<serde_json::Value, stepgraph::errors::StateGraphError> {
//!     let mut graph = StateGraph::new();
//!     graph.register(Pass::new("Prepare"))?;
//!     graph.register(Pass::new("Work"))?;
//!     graph.register(Succeed::new("Done"))?;
//!     Chain::start(&graph, "Prepare")?
//!         .next(&mut graph, "Work")?
//!         .next(&mut graph, "Done")?;
//!     graph.start_at("Prepare");
//!     graph.to_graph_json()
//! }
//! # build().unwrap();
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{json, Map as JsonMap, Value};
use tracing::debug;

use crate::chain::{AfterwardsOptions, Chain};
use crate::errors::StateGraphError;
use crate::state::{State, StateKind};
use crate::traversal;
use crate::types::{StateId, StateToken};

/// A mutable registry of workflow states.
///
/// States are stored by id; registration order is preserved for deterministic
/// iteration and validation. A graph owns its nested branch and iterator
/// graphs outright, forming a tree of graphs under one top-level document.
#[derive(Clone, Debug, Default)]
pub struct StateGraph {
    states: FxHashMap<StateId, State>,
    order: Vec<StateId>,
    start_at: Option<StateId>,
    timeout_seconds: Option<u32>,
}

impl StateGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a state into this graph, returning its id.
    ///
    /// Re-registering the same state value (same construction token) is an
    /// idempotent no-op that keeps the already-registered state. Registering
    /// a *different* state under an id this graph already holds is a
    /// [`DuplicateStateId`](StateGraphError::DuplicateStateId) error.
    ///
    /// Uniqueness across sibling graphs (e.g. two Parallel branches) cannot
    /// be seen from inside one graph; those collisions surface when the
    /// whole tree is checked by [`validate`](StateGraph::validate).
    pub fn register(&mut self, state: impl Into<State>) -> Result<StateId, StateGraphError> {
        let state = state.into();
        let id = state.id().clone();
        if let Some(existing) = self.states.get(&id) {
            if existing.token() == state.token() {
                return Ok(id);
            }
            return Err(StateGraphError::DuplicateStateId { id });
        }
        debug!(id = %id, kind = state.kind().type_name(), "registered state");
        self.order.push(id.clone());
        self.states.insert(id.clone(), state);
        Ok(id)
    }

    /// Declares which state the workflow starts at.
    ///
    /// The id does not need to be registered yet; it is checked at
    /// validation time.
    pub fn start_at(&mut self, id: impl Into<StateId>) -> &mut Self {
        self.start_at = Some(id.into());
        self
    }

    /// The declared start state, if any.
    #[must_use]
    pub fn start(&self) -> Option<&StateId> {
        self.start_at.as_ref()
    }

    /// Sets the whole-workflow timeout.
    ///
    /// Only the top-level graph's timeout renders; a timeout set on a branch
    /// or iterator graph is ignored with a warning when the graph is
    /// attached.
    pub fn set_timeout_seconds(&mut self, seconds: u32) -> &mut Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// The whole-workflow timeout, if set.
    #[must_use]
    pub fn timeout_seconds(&self) -> Option<u32> {
        self.timeout_seconds
    }

    /// Whether this graph directly holds a state with the given id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    /// Looks up a state by id in this graph (not in nested graphs).
    #[must_use]
    pub fn state(&self, id: &str) -> Option<&State> {
        self.states.get(id)
    }

    /// Number of states registered directly in this graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether this graph has no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates states in registration order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.order.iter().filter_map(|id| self.states.get(id))
    }

    /// Iterates state ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &StateId> {
        self.order.iter()
    }

    pub(crate) fn get(&self, id: &StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &StateId) -> Option<&mut State> {
        self.states.get_mut(id)
    }

    /// Prepends `prefix` to every state id in this graph and rewrites every
    /// reference to match: `Next` links, choice rules and defaults, catch
    /// targets, the start pointer, and all of the above in nested branch and
    /// iterator graphs.
    ///
    /// This is how one workflow fragment is instantiated more than once in a
    /// single document without id collisions: clone the fragment, prefix
    /// each clone distinctly, then attach them.
    pub fn prefix_states(&mut self, prefix: &str) -> &mut Self {
        self.order = self.order.iter().map(|id| id.with_prefix(prefix)).collect();
        if let Some(start) = &self.start_at {
            self.start_at = Some(start.with_prefix(prefix));
        }
        let old = std::mem::take(&mut self.states);
        for (_, mut state) in old {
            state.id = state.id.with_prefix(prefix);
            if let Some(next) = &state.next {
                state.next = Some(next.with_prefix(prefix));
            }
            if let StateKind::Choice { choices, default } = &mut state.kind {
                for rule in choices.iter_mut() {
                    rule.next = rule.next.with_prefix(prefix);
                }
                if let Some(default) = default {
                    *default = default.with_prefix(prefix);
                }
            }
            if let Some(handlers) = state.kind.handlers_mut() {
                for catch in &mut handlers.catch {
                    catch.next = catch.next.with_prefix(prefix);
                }
            }
            for child in state.kind.child_graphs_mut() {
                child.prefix_states(prefix);
            }
            self.states.insert(state.id.clone(), state);
        }
        self
    }

    /// Collects the open end states reachable from a Choice state's rule
    /// targets into a [`Chain`], so whatever follows the choice can be
    /// linked after all its branches at once.
    ///
    /// With [`include_otherwise`](AfterwardsOptions::include_otherwise) set
    /// and no fallback installed yet, the choice itself becomes an end of
    /// the returned chain; extending that chain installs the fallback.
    /// States reachable through more than one rule contribute their ends
    /// once.
    pub fn afterwards(
        &self,
        choice: impl Into<StateId>,
        options: AfterwardsOptions,
    ) -> Result<Chain, StateGraphError> {
        let choice = choice.into();
        let state = self
            .states
            .get(&choice)
            .ok_or_else(|| StateGraphError::UnknownState { id: choice.clone() })?;
        let StateKind::Choice { choices, default } = state.kind() else {
            return Err(StateGraphError::NotAChoice { id: choice });
        };

        let mut visited = FxHashSet::default();
        visited.insert(choice.clone());
        let mut ends = Vec::new();
        for rule in choices {
            traversal::collect_end_states(
                self,
                &rule.next,
                options.include_error_handlers,
                &mut visited,
                &mut ends,
            )?;
        }
        match default {
            Some(default) if options.include_otherwise => {
                traversal::collect_end_states(
                    self,
                    default,
                    options.include_error_handlers,
                    &mut visited,
                    &mut ends,
                )?;
            }
            None if options.include_otherwise => ends.push(choice.clone()),
            _ => {}
        }
        Ok(Chain::custom(choice, ends))
    }

    /// Checks the whole workflow tree without rendering it.
    ///
    /// Detects duplicate ids and cross-graph state reuse across this graph
    /// and every nested graph, dangling transitions, missing start states,
    /// branchless Parallel states, and iterator-less Map states. The first
    /// violation in registration order is reported.
    pub fn validate(&self) -> Result<(), StateGraphError> {
        let mut seen_ids = FxHashSet::default();
        let mut seen_tokens = FxHashSet::default();
        self.validate_tree(&mut seen_ids, &mut seen_tokens)
    }

    fn validate_tree(
        &self,
        seen_ids: &mut FxHashSet<StateId>,
        seen_tokens: &mut FxHashSet<StateToken>,
    ) -> Result<(), StateGraphError> {
        let start = self
            .start_at
            .as_ref()
            .ok_or(StateGraphError::MissingStartState)?;
        if !self.states.contains_key(start) {
            return Err(StateGraphError::UnknownState { id: start.clone() });
        }
        for id in &self.order {
            let Some(state) = self.states.get(id) else {
                continue;
            };
            // Token reuse means the same state value was claimed by two
            // graphs; an id collision between distinct states is a rename
            // problem instead.
            if !seen_tokens.insert(state.token()) {
                return Err(StateGraphError::CrossGraphReuse { id: id.clone() });
            }
            if !seen_ids.insert(id.clone()) {
                return Err(StateGraphError::DuplicateStateId { id: id.clone() });
            }
            for target in traversal::outgoing_targets(state, true) {
                if !self.states.contains_key(target) {
                    return Err(StateGraphError::DanglingTransition {
                        from: id.clone(),
                        to: target.clone(),
                    });
                }
            }
            match state.kind() {
                StateKind::Parallel { branches, .. } if branches.is_empty() => {
                    return Err(StateGraphError::EmptyParallel { id: id.clone() });
                }
                StateKind::Map { iterator: None, .. } => {
                    return Err(StateGraphError::MissingIterator { id: id.clone() });
                }
                _ => {}
            }
            for child in state.kind().child_graphs() {
                child.validate_tree(seen_ids, seen_tokens)?;
            }
        }
        Ok(())
    }

    /// Validates the whole tree, then renders it to a workflow document.
    ///
    /// The document carries `StartAt`, `States`, and (top level only)
    /// `TimeoutSeconds`. Object keys render in sorted order, so equal graphs
    /// serialize to byte-equal documents.
    pub fn to_graph_json(&self) -> Result<Value, StateGraphError> {
        self.validate()?;
        self.render_document(true)
    }

    /// Renders without re-validating. Nested graphs render with
    /// `top_level = false`, which drops their `TimeoutSeconds`.
    pub(crate) fn render_document(&self, top_level: bool) -> Result<Value, StateGraphError> {
        let start = self
            .start_at
            .as_ref()
            .ok_or(StateGraphError::MissingStartState)?;
        let mut states = JsonMap::new();
        for id in &self.order {
            if let Some(state) = self.states.get(id) {
                states.insert(id.as_str().to_string(), state.render()?);
            }
        }
        let mut doc = JsonMap::new();
        doc.insert("StartAt".to_string(), json!(start.as_str()));
        if top_level {
            if let Some(timeout) = self.timeout_seconds {
                doc.insert("TimeoutSeconds".to_string(), json!(timeout));
            }
        }
        doc.insert("States".to_string(), Value::Object(states));
        Ok(Value::Object(doc))
    }
}
