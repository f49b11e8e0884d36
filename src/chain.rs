//! Linking states into sequences.
//!
//! A [`Chain`] is a lightweight handle over a [`StateGraph`]: a start id
//! plus the ids of the currently open ends (states that still need an
//! unconditional successor). Extending a chain with [`next`](Chain::next)
//! mutates the underlying graph, linking every open end to the new target,
//! then returns a new chain whose ends are the target's open ends.
//!
//! Chains hold ids, not states, so they stay valid while the graph grows
//! and they never fight the borrow checker over graph ownership.
//!
//! # Examples
//!
//! ```rust
//! use stepgraph::chain::Chain;
//! use stepgraph::graph::StateGraph;
//! use stepgraph::state::Pass;
//!
//! let mut graph = StateGraph::new();
//! graph.register(Pass::new("A")).unwrap();
//! graph.register(Pass::new("B")).unwrap();
//!
//! let chain = Chain::start(&graph, "A").unwrap().next(&mut graph, "B").unwrap();
//! assert_eq!(chain.start_state().as_str(), "A");
//! assert_eq!(chain.end_states()[0].as_str(), "B");
//! ```

use crate::errors::StateGraphError;
use crate::graph::StateGraph;
use crate::state::{State, StateKind};
use crate::types::StateId;

/// Options for [`StateGraph::afterwards`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AfterwardsOptions {
    /// Also walk catch-handler transitions when collecting reachable ends.
    pub include_error_handlers: bool,
    /// Also cover the no-rule-matched path. With a fallback installed its
    /// reachable ends are included; without one, the choice state itself
    /// becomes an end so extending the chain installs the fallback.
    pub include_otherwise: bool,
}

impl AfterwardsOptions {
    /// Walks catch-handler transitions too.
    #[must_use]
    pub fn include_error_handlers(mut self) -> Self {
        self.include_error_handlers = true;
        self
    }

    /// Covers the no-rule-matched path too.
    #[must_use]
    pub fn include_otherwise(mut self) -> Self {
        self.include_otherwise = true;
        self
    }
}

/// A start state plus the open ends of everything linked after it.
#[derive(Clone, Debug)]
pub struct Chain {
    start: StateId,
    ends: Vec<StateId>,
}

impl Chain {
    /// Begins a chain at a registered state.
    ///
    /// The state itself is the chain's only open end if it can take an
    /// unconditional successor. Choice, Succeed, and Fail states start with
    /// no open ends; route a Choice's continuations through
    /// [`StateGraph::afterwards`] instead.
    pub fn start(graph: &StateGraph, state: impl Into<StateId>) -> Result<Self, StateGraphError> {
        let id = state.into();
        let state = graph
            .get(&id)
            .ok_or_else(|| StateGraphError::UnknownState { id: id.clone() })?;
        let ends = open_ends_of(state);
        Ok(Chain { start: id, ends })
    }

    /// Assembles a chain from explicit parts, without consulting a graph.
    ///
    /// This is the escape hatch for fan-in shapes the other constructors
    /// cannot express; the ids are taken on trust and checked only when the
    /// chain is extended.
    #[must_use]
    pub fn custom(start: impl Into<StateId>, ends: impl IntoIterator<Item = StateId>) -> Self {
        Chain {
            start: start.into(),
            ends: ends.into_iter().collect(),
        }
    }

    /// Links every open end of this chain to `to`, a registered state.
    ///
    /// Plain ends take `to` as their `Next`; Choice ends take it as their
    /// `Default`. An end already linked to `to` is left alone; one linked
    /// elsewhere is a
    /// [`SuccessorConflict`](StateGraphError::SuccessorConflict) (or
    /// [`DefaultConflict`](StateGraphError::DefaultConflict)). A chain with
    /// no open ends cannot be extended at all:
    /// [`EmptyChainExtension`](StateGraphError::EmptyChainExtension).
    pub fn next(
        self,
        graph: &mut StateGraph,
        to: impl Into<StateId>,
    ) -> Result<Self, StateGraphError> {
        let to = to.into();
        if self.ends.is_empty() {
            return Err(StateGraphError::EmptyChainExtension { start: self.start });
        }
        let target = graph
            .get(&to)
            .ok_or_else(|| StateGraphError::UnknownState { id: to.clone() })?;
        let ends = open_ends_of(target);
        for end in &self.ends {
            link(graph, end, &to)?;
        }
        Ok(Chain {
            start: self.start,
            ends,
        })
    }

    /// Links two chains end to start, returning the combined chain.
    pub fn sequence(
        graph: &mut StateGraph,
        first: Chain,
        then: &Chain,
    ) -> Result<Chain, StateGraphError> {
        if first.ends.is_empty() {
            return Err(StateGraphError::EmptyChainExtension { start: first.start });
        }
        for end in &first.ends {
            link(graph, end, &then.start)?;
        }
        Ok(Chain {
            start: first.start,
            ends: then.ends.clone(),
        })
    }

    /// The state this chain starts at.
    #[must_use]
    pub fn start_state(&self) -> &StateId {
        &self.start
    }

    /// The states still needing an unconditional successor.
    #[must_use]
    pub fn end_states(&self) -> &[StateId] {
        &self.ends
    }
}

// A state stays an end of its chain even once linked; link() decides
// whether a second extension is a no-op or a conflict.
fn open_ends_of(state: &State) -> Vec<StateId> {
    if state.kind().supports_next() {
        vec![state.id().clone()]
    } else {
        Vec::new()
    }
}

fn link(graph: &mut StateGraph, from: &StateId, to: &StateId) -> Result<(), StateGraphError> {
    let state = graph
        .get_mut(from)
        .ok_or_else(|| StateGraphError::UnknownState { id: from.clone() })?;
    match &mut state.kind {
        StateKind::Choice { default, .. } => match default {
            Some(existing) if existing == to => Ok(()),
            Some(existing) => Err(StateGraphError::DefaultConflict {
                id: from.clone(),
                existing: existing.clone(),
                requested: to.clone(),
            }),
            None => {
                *default = Some(to.clone());
                Ok(())
            }
        },
        kind if kind.is_terminal() => Err(StateGraphError::EmptyChainExtension {
            start: from.clone(),
        }),
        _ => match &state.next {
            Some(existing) if existing == to => Ok(()),
            Some(existing) => Err(StateGraphError::SuccessorConflict {
                id: from.clone(),
                existing: existing.clone(),
                requested: to.clone(),
            }),
            None => {
                state.next = Some(to.clone());
                Ok(())
            }
        },
    }
}
