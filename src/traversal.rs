//! Read-only walks over a single graph's transition structure.
//!
//! These walks stay within one [`StateGraph`]; they do not descend into
//! branch or iterator graphs, whose states are unreachable by transition
//! from the parent. Targets that are not registered are skipped here;
//! [`StateGraph::validate`] is where dangling transitions are reported.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::errors::StateGraphError;
use crate::graph::StateGraph;
use crate::state::{State, StateKind};
use crate::types::StateId;

/// Every id a state can hand control to: its `Next`, its choice rules and
/// default, and (when `follow_error_handlers` is set) its catch targets.
#[must_use]
pub fn outgoing_targets(state: &State, follow_error_handlers: bool) -> Vec<&StateId> {
    let mut targets = Vec::new();
    if let Some(next) = state.next() {
        targets.push(next);
    }
    if let StateKind::Choice { choices, default } = state.kind() {
        targets.extend(choices.iter().map(|rule| &rule.next));
        if let Some(default) = default {
            targets.push(default);
        }
    }
    if follow_error_handlers {
        if let Some(handlers) = state.kind().handlers() {
            targets.extend(handlers.catch.iter().map(|catch| &catch.next));
        }
    }
    targets
}

/// All states reachable from `from` by following transitions, in
/// breadth-first discovery order, `from` included.
pub fn reachable_states(
    graph: &StateGraph,
    from: impl Into<StateId>,
    follow_error_handlers: bool,
) -> Result<Vec<StateId>, StateGraphError> {
    let from = from.into();
    if graph.get(&from).is_none() {
        return Err(StateGraphError::UnknownState { id: from });
    }
    let mut visited = FxHashSet::default();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();
    visited.insert(from.clone());
    queue.push_back(from);
    while let Some(id) = queue.pop_front() {
        let Some(state) = graph.get(&id) else {
            continue;
        };
        order.push(id.clone());
        for target in outgoing_targets(state, follow_error_handlers) {
            if graph.get(target).is_some() && visited.insert(target.clone()) {
                queue.push_back(target.clone());
            }
        }
    }
    Ok(order)
}

/// The reachable states that still need an unconditional successor: they
/// support `Next` but have none linked. Terminal states and Choice states
/// never qualify.
pub fn reachable_end_states(
    graph: &StateGraph,
    from: impl Into<StateId>,
    follow_error_handlers: bool,
) -> Result<Vec<StateId>, StateGraphError> {
    let mut visited = FxHashSet::default();
    let mut ends = Vec::new();
    collect_end_states(
        graph,
        &from.into(),
        follow_error_handlers,
        &mut visited,
        &mut ends,
    )?;
    Ok(ends)
}

/// Walk from `from`, appending open ends to `ends`. The shared `visited` set
/// lets multiple walks over one graph (e.g. per choice rule) dedup against
/// each other.
pub(crate) fn collect_end_states(
    graph: &StateGraph,
    from: &StateId,
    follow_error_handlers: bool,
    visited: &mut FxHashSet<StateId>,
    ends: &mut Vec<StateId>,
) -> Result<(), StateGraphError> {
    if graph.get(from).is_none() {
        return Err(StateGraphError::UnknownState { id: from.clone() });
    }
    let mut queue = VecDeque::new();
    if visited.insert(from.clone()) {
        queue.push_back(from.clone());
    }
    while let Some(id) = queue.pop_front() {
        let Some(state) = graph.get(&id) else {
            continue;
        };
        if state.kind().supports_next() && state.next().is_none() {
            ends.push(id.clone());
        }
        for target in outgoing_targets(state, follow_error_handlers) {
            if graph.get(target).is_some() && visited.insert(target.clone()) {
                queue.push_back(target.clone());
            }
        }
    }
    Ok(())
}
