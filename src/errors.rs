//! Error taxonomy for graph construction and rendering.
//!
//! Every variant of [`StateGraphError`] is a synchronous usage error: it
//! indicates a defect in how the caller assembled the workflow description,
//! not a transient condition. Nothing here is retried; the correct response
//! is to fix the construction code.

use miette::Diagnostic;
use thiserror::Error;

use crate::types::StateId;

/// Errors raised while assembling, validating, or rendering a workflow graph.
#[derive(Debug, Error, Diagnostic)]
pub enum StateGraphError {
    /// Two distinct states claim the same identifier within one workflow
    /// tree (top-level graph plus every nested branch and iterator).
    #[error("duplicate state id `{id}` in workflow graph")]
    #[diagnostic(
        code(stepgraph::graph::duplicate_state_id),
        help(
            "Rename one of the conflicting states, or apply prefix_states to \
             the fragment before attaching it."
        )
    )]
    DuplicateStateId { id: StateId },

    /// The same state (same construction token) is claimed by two graphs in
    /// one workflow tree, e.g. a cloned state registered into two Parallel
    /// branches.
    #[error("state `{id}` is already claimed by another graph in this workflow")]
    #[diagnostic(
        code(stepgraph::graph::cross_graph_reuse),
        help("Construct a fresh state per graph instead of cloning one across branches.")
    )]
    CrossGraphReuse { id: StateId },

    /// `Chain::next` was called on a chain with no open end states, e.g.
    /// directly after a Succeed or Fail state.
    #[error("cannot extend chain starting at `{start}`: it has no open end states")]
    #[diagnostic(
        code(stepgraph::chain::empty_extension),
        help("Terminal states (Succeed, Fail) cannot transition to a next state.")
    )]
    EmptyChainExtension { start: StateId },

    /// A chain tried to overwrite an already-installed unconditional
    /// transition with a different target.
    #[error("state `{id}` already transitions to `{existing}`; refusing to relink to `{requested}`")]
    #[diagnostic(
        code(stepgraph::chain::successor_conflict),
        help("Each state takes exactly one unconditional successor; route rejoins through a Choice.")
    )]
    SuccessorConflict {
        id: StateId,
        existing: StateId,
        requested: StateId,
    },

    /// A chain tried to overwrite a Choice state's already-installed default
    /// transition with a different target.
    #[error("choice `{id}` already falls through to `{existing}`; refusing to relink to `{requested}`")]
    #[diagnostic(code(stepgraph::chain::default_conflict))]
    DefaultConflict {
        id: StateId,
        existing: StateId,
        requested: StateId,
    },

    /// A transition (`Next`, `Default`, a choice rule, or a catch handler)
    /// names a state that is not registered in the same graph.
    #[error("state `{from}` references `{to}`, which is not registered in the same graph")]
    #[diagnostic(
        code(stepgraph::graph::dangling_transition),
        help("Transitions may only target states registered in the same (sub-)graph.")
    )]
    DanglingTransition { from: StateId, to: StateId },

    /// An operation was anchored at a state id the graph does not contain.
    #[error("unknown state id `{id}`")]
    #[diagnostic(code(stepgraph::graph::unknown_state))]
    UnknownState { id: StateId },

    /// The graph (or a nested branch/iterator graph) has no start state.
    #[error("graph has no start state")]
    #[diagnostic(
        code(stepgraph::graph::missing_start),
        help("Call start_at(..) on every graph, including branch and iterator graphs.")
    )]
    MissingStartState,

    /// A Choice-only operation (when/otherwise/afterwards) was applied to a
    /// state of another kind.
    #[error("state `{id}` is not a Choice state")]
    #[diagnostic(code(stepgraph::graph::not_a_choice))]
    NotAChoice { id: StateId },

    /// A Parallel state has no branches; the document would be invalid.
    #[error("parallel state `{id}` has no branches")]
    #[diagnostic(code(stepgraph::graph::empty_parallel))]
    EmptyParallel { id: StateId },

    /// A Map state has no iterator graph; the document would be invalid.
    #[error("map state `{id}` has no iterator")]
    #[diagnostic(code(stepgraph::graph::missing_iterator))]
    MissingIterator { id: StateId },
}
