//! Integration tests for linking states with chains.

use serde_json::json;
use stepgraph::chain::Chain;
use stepgraph::errors::StateGraphError;
use stepgraph::graph::StateGraph;
use stepgraph::state::{Pass, Succeed, Task};
use stepgraph::types::StateId;

#[test]
fn two_state_sequence_renders_next_and_end() {
    let mut graph = StateGraph::new();
    graph.register(Pass::new("A")).unwrap();
    graph.register(Pass::new("B")).unwrap();
    Chain::start(&graph, "A")
        .unwrap()
        .next(&mut graph, "B")
        .unwrap();
    graph.start_at("A");

    assert_eq!(
        graph.to_graph_json().unwrap(),
        json!({
            "StartAt": "A",
            "States": {
                "A": {"Type": "Pass", "Next": "B"},
                "B": {"Type": "Pass", "End": true},
            },
        })
    );
}

#[test]
fn chain_tracks_ends_across_extensions() {
    let mut graph = StateGraph::new();
    graph.register(Pass::new("A")).unwrap();
    graph.register(Task::new("B", "arn:x")).unwrap();
    graph.register(Succeed::new("Done")).unwrap();

    let chain = Chain::start(&graph, "A").unwrap();
    assert_eq!(chain.end_states(), [StateId::new("A")]);

    let chain = chain.next(&mut graph, "B").unwrap();
    assert_eq!(chain.end_states(), [StateId::new("B")]);

    let chain = chain.next(&mut graph, "Done").unwrap();
    assert_eq!(chain.start_state().as_str(), "A");
    assert!(chain.end_states().is_empty());
}

#[test]
fn extending_past_a_terminal_state_fails() {
    let mut graph = StateGraph::new();
    graph.register(Pass::new("A")).unwrap();
    graph.register(Succeed::new("Done")).unwrap();
    graph.register(Pass::new("After")).unwrap();

    let chain = Chain::start(&graph, "A")
        .unwrap()
        .next(&mut graph, "Done")
        .unwrap();
    let err = chain.next(&mut graph, "After").unwrap_err();
    assert!(matches!(
        err,
        StateGraphError::EmptyChainExtension { start } if start.as_str() == "A"
    ));
}

#[test]
fn next_requires_a_registered_target() {
    let mut graph = StateGraph::new();
    graph.register(Pass::new("A")).unwrap();
    let err = Chain::start(&graph, "A")
        .unwrap()
        .next(&mut graph, "Ghost")
        .unwrap_err();
    assert!(matches!(
        err,
        StateGraphError::UnknownState { id } if id.as_str() == "Ghost"
    ));
}

#[test]
fn conflicting_relink_reports_both_targets() {
    let mut graph = StateGraph::new();
    graph.register(Pass::new("A")).unwrap();
    graph.register(Pass::new("B")).unwrap();
    graph.register(Pass::new("C")).unwrap();
    Chain::start(&graph, "A")
        .unwrap()
        .next(&mut graph, "B")
        .unwrap();

    let err = Chain::start(&graph, "A")
        .unwrap()
        .next(&mut graph, "C")
        .unwrap_err();
    assert!(matches!(
        err,
        StateGraphError::SuccessorConflict { id, existing, requested }
            if id.as_str() == "A" && existing.as_str() == "B" && requested.as_str() == "C"
    ));
}

#[test]
fn relinking_the_same_target_changes_nothing() {
    let mut graph = StateGraph::new();
    graph.register(Pass::new("A")).unwrap();
    graph.register(Pass::new("B")).unwrap();
    Chain::start(&graph, "A")
        .unwrap()
        .next(&mut graph, "B")
        .unwrap();
    let before = {
        graph.start_at("A");
        graph.to_graph_json().unwrap()
    };

    Chain::start(&graph, "A")
        .unwrap()
        .next(&mut graph, "B")
        .unwrap();
    assert_eq!(graph.to_graph_json().unwrap(), before);
}

#[test]
fn sequence_joins_two_chains() {
    let mut graph = StateGraph::new();
    for id in ["A", "B", "C", "D"] {
        graph.register(Pass::new(id)).unwrap();
    }
    let first = Chain::start(&graph, "A")
        .unwrap()
        .next(&mut graph, "B")
        .unwrap();
    let second = Chain::start(&graph, "C")
        .unwrap()
        .next(&mut graph, "D")
        .unwrap();

    let joined = Chain::sequence(&mut graph, first, &second).unwrap();
    assert_eq!(joined.start_state().as_str(), "A");
    assert_eq!(joined.end_states(), [StateId::new("D")]);
    assert_eq!(
        graph.state("B").unwrap().next().map(StateId::as_str),
        Some("C")
    );
}

#[test]
fn custom_chain_links_every_listed_end() {
    let mut graph = StateGraph::new();
    for id in ["A", "B", "Join"] {
        graph.register(Pass::new(id)).unwrap();
    }
    let chain = Chain::custom("A", [StateId::new("A"), StateId::new("B")]);
    chain.next(&mut graph, "Join").unwrap();

    for id in ["A", "B"] {
        assert_eq!(
            graph.state(id).unwrap().next().map(StateId::as_str),
            Some("Join")
        );
    }
}
