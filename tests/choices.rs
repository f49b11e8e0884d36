//! Integration tests for Choice routing and fan-in after a choice.

use serde_json::json;
use stepgraph::chain::{AfterwardsOptions, Chain};
use stepgraph::condition::Condition;
use stepgraph::errors::StateGraphError;
use stepgraph::graph::StateGraph;
use stepgraph::policy::CatchPolicy;
use stepgraph::state::{Choice, Fail, Pass, Succeed, Task};
use stepgraph::types::StateId;

#[test]
fn choice_workflow_renders_rules_in_order() {
    let mut graph = StateGraph::new();
    graph
        .register(
            Choice::new("Route")
                .when(Condition::number_greater_than("$.amount", 100.0), "Review")
                .when(Condition::boolean_equals("$.vip", true), "FastTrack")
                .otherwise("Standard"),
        )
        .unwrap();
    graph.register(Pass::new("Review")).unwrap();
    graph.register(Pass::new("FastTrack")).unwrap();
    graph.register(Pass::new("Standard")).unwrap();
    graph.start_at("Route");

    assert_eq!(
        graph.to_graph_json().unwrap(),
        json!({
            "StartAt": "Route",
            "States": {
                "Route": {
                    "Type": "Choice",
                    "Choices": [
                        {"Variable": "$.amount", "NumericGreaterThan": 100.0, "Next": "Review"},
                        {"Variable": "$.vip", "BooleanEquals": true, "Next": "FastTrack"},
                    ],
                    "Default": "Standard",
                },
                "Review": {"Type": "Pass", "End": true},
                "FastTrack": {"Type": "Pass", "End": true},
                "Standard": {"Type": "Pass", "End": true},
            },
        })
    );
}

fn branching_graph() -> StateGraph {
    let mut graph = StateGraph::new();
    graph
        .register(
            Choice::new("Route")
                .when(Condition::string_equals("$.kind", "a"), "PathA")
                .when(Condition::string_equals("$.kind", "b"), "PathB"),
        )
        .unwrap();
    graph.register(Pass::new("PathA")).unwrap();
    graph.register(Pass::new("PathB")).unwrap();
    graph.register(Pass::new("Join")).unwrap();
    graph.start_at("Route");
    graph
}

#[test]
fn afterwards_collects_branch_ends() {
    let mut graph = branching_graph();
    let chain = graph
        .afterwards("Route", AfterwardsOptions::default())
        .unwrap();
    assert_eq!(
        chain.end_states(),
        [StateId::new("PathA"), StateId::new("PathB")]
    );

    chain.next(&mut graph, "Join").unwrap();
    for id in ["PathA", "PathB"] {
        assert_eq!(
            graph.state(id).unwrap().next().map(StateId::as_str),
            Some("Join")
        );
    }
}

#[test]
fn afterwards_dedups_shared_sub_paths() {
    let mut graph = StateGraph::new();
    graph
        .register(
            Choice::new("Route")
                .when(Condition::string_equals("$.kind", "a"), "Shared")
                .when(Condition::string_equals("$.kind", "b"), "Shared"),
        )
        .unwrap();
    graph.register(Pass::new("Shared")).unwrap();
    graph.start_at("Route");

    let chain = graph
        .afterwards("Route", AfterwardsOptions::default())
        .unwrap();
    assert_eq!(chain.end_states(), [StateId::new("Shared")]);
}

#[test]
fn afterwards_without_otherwise_leaves_default_path_out() {
    let mut graph = branching_graph();
    graph
        .afterwards("Route", AfterwardsOptions::default())
        .unwrap()
        .next(&mut graph, "Join")
        .unwrap();

    let state = graph.state("Route").unwrap();
    let stepgraph::state::StateKind::Choice { default, .. } = state.kind() else {
        panic!("expected a choice kind");
    };
    assert!(default.is_none());
}

#[test]
fn afterwards_with_otherwise_installs_default_on_extension() {
    let mut graph = branching_graph();
    let chain = graph
        .afterwards("Route", AfterwardsOptions::default().include_otherwise())
        .unwrap();
    // No fallback installed yet, so the choice itself is an open end.
    assert!(chain.end_states().contains(&StateId::new("Route")));

    chain.next(&mut graph, "Join").unwrap();
    let state = graph.state("Route").unwrap();
    let stepgraph::state::StateKind::Choice { default, .. } = state.kind() else {
        panic!("expected a choice kind");
    };
    assert_eq!(default.as_ref().map(StateId::as_str), Some("Join"));
}

#[test]
fn afterwards_follows_installed_default_when_asked() {
    let mut graph = StateGraph::new();
    graph
        .register(
            Choice::new("Route")
                .when(Condition::string_equals("$.kind", "a"), "PathA")
                .otherwise("Fallback"),
        )
        .unwrap();
    graph.register(Pass::new("PathA")).unwrap();
    graph.register(Pass::new("Fallback")).unwrap();
    graph.start_at("Route");

    let chain = graph
        .afterwards("Route", AfterwardsOptions::default().include_otherwise())
        .unwrap();
    assert_eq!(
        chain.end_states(),
        [StateId::new("PathA"), StateId::new("Fallback")]
    );
}

#[test]
fn afterwards_can_include_catch_targets() {
    let mut graph = StateGraph::new();
    graph
        .register(
            Choice::new("Route").when(Condition::string_equals("$.kind", "a"), "Work"),
        )
        .unwrap();
    graph
        .register(Task::new("Work", "arn:x").add_catch(CatchPolicy::new("Recover")))
        .unwrap();
    graph.register(Pass::new("Recover")).unwrap();
    graph.start_at("Route");

    let without = graph
        .afterwards("Route", AfterwardsOptions::default())
        .unwrap();
    assert_eq!(without.end_states(), [StateId::new("Work")]);

    let with = graph
        .afterwards(
            "Route",
            AfterwardsOptions::default().include_error_handlers(),
        )
        .unwrap();
    assert_eq!(
        with.end_states(),
        [StateId::new("Work"), StateId::new("Recover")]
    );
}

#[test]
fn afterwards_skips_terminal_branch_ends() {
    let mut graph = StateGraph::new();
    graph
        .register(
            Choice::new("Route")
                .when(Condition::string_equals("$.kind", "a"), "Open")
                .when(Condition::string_equals("$.kind", "b"), "Closed"),
        )
        .unwrap();
    graph.register(Pass::new("Open")).unwrap();
    graph.register(Succeed::new("Closed")).unwrap();
    graph.start_at("Route");

    let chain = graph
        .afterwards("Route", AfterwardsOptions::default())
        .unwrap();
    assert_eq!(chain.end_states(), [StateId::new("Open")]);
}

#[test]
fn afterwards_rejects_non_choice_states() {
    let mut graph = StateGraph::new();
    graph.register(Pass::new("NotARouter")).unwrap();
    let err = graph
        .afterwards("NotARouter", AfterwardsOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        StateGraphError::NotAChoice { id } if id.as_str() == "NotARouter"
    ));
}

#[test]
fn default_conflict_reports_both_targets() {
    let mut graph = branching_graph();
    graph.register(Fail::new("GiveUp")).unwrap();
    graph
        .afterwards("Route", AfterwardsOptions::default().include_otherwise())
        .unwrap()
        .next(&mut graph, "Join")
        .unwrap();

    let err = Chain::custom("Route", [StateId::new("Route")])
        .next(&mut graph, "GiveUp")
        .unwrap_err();
    assert!(matches!(
        err,
        StateGraphError::DefaultConflict { id, existing, requested }
            if id.as_str() == "Route"
                && existing.as_str() == "Join"
                && requested.as_str() == "GiveUp"
    ));
}

#[test]
fn choice_starts_a_chain_with_no_open_ends() {
    let mut graph = branching_graph();
    let chain = Chain::start(&graph, "Route").unwrap();
    assert!(chain.end_states().is_empty());
    assert!(matches!(
        chain.next(&mut graph, "Join"),
        Err(StateGraphError::EmptyChainExtension { .. })
    ));
}
