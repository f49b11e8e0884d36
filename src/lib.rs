//! # Stepgraph: Workflow Document Builder
//!
//! Stepgraph builds state-machine workflow documents programmatically: you
//! assemble typed states into a graph, link them into chains, and render the
//! whole thing to the JSON document an external workflow runtime executes.
//! The crate never executes anything itself; its job is to make invalid
//! documents hard to construct and to fail fast, with precise errors, when
//! one is constructed anyway.
//!
//! ## Core Concepts
//!
//! - **States**: Typed steps (Pass, Task, Choice, Wait, Succeed, Fail,
//!   Parallel, Map, Custom) built with per-kind builders
//! - **Graph**: The arena states are registered into, with a start pointer
//!   and an optional workflow timeout
//! - **Chains**: Handles for linking states into sequences, including
//!   fanning back in after a Choice
//! - **Conditions**: Boolean expression trees routing Choice states
//! - **Validation**: A whole-tree check (uniqueness, transition integrity)
//!   that runs before any document is rendered
//!
//! ## Quick Start
//!
//! ```rust
//! use stepgraph::chain::Chain;
//! use stepgraph::condition::Condition;
//! use stepgraph::graph::StateGraph;
//! use stepgraph::state::{Choice, Fail, Succeed, Task};
//!
//! fn build() -> Result<serde_json::Value, stepgraph::errors::StateGraphError> {
//!     let mut graph = StateGraph::new();
//!     graph.register(Task::new("CheckStock", "arn:aws:lambda:::function:check"))?;
//!     graph.register(
//!         Choice::new("InStock?")
//!             .when(Condition::number_greater_than("$.count", 0.0), "Ship")
//!             .otherwise("Reject"),
//!     )?;
//!     graph.register(Task::new("Ship", "arn:aws:lambda:::function:ship"))?;
//!     graph.register(Fail::new("Reject").with_error("Inventory.Empty"))?;
//!     graph.register(Succeed::new("Done"))?;
//!
//!     Chain::start(&graph, "CheckStock")?.next(&mut graph, "InStock?")?;
//!     Chain::start(&graph, "Ship")?.next(&mut graph, "Done")?;
//!     graph.start_at("CheckStock");
//!
//!     graph.to_graph_json()
//! }
//! # build().unwrap();
//! ```
//!
//! ### Fanning in after a Choice
//!
//! [`StateGraph::afterwards`](graph::StateGraph::afterwards) collects the
//! open ends downstream of a Choice's rules into one [`chain::Chain`], so a
//! shared continuation can be linked once:
//!
//! ```rust
//! use stepgraph::chain::AfterwardsOptions;
//! use stepgraph::condition::Condition;
//! use stepgraph::graph::StateGraph;
//! use stepgraph::state::{Choice, Pass, Succeed};
//!
//! # fn build() -> Result<(), stepgraph::errors::StateGraphError> {
//! let mut graph = StateGraph::new();
//! graph.register(
//!     Choice::new("Route")
//!         .when(Condition::boolean_equals("$.fast", true), "FastPath")
//!         .otherwise("SlowPath"),
//! )?;
//! graph.register(Pass::new("FastPath"))?;
//! graph.register(Pass::new("SlowPath"))?;
//! graph.register(Succeed::new("Done"))?;
//!
//! graph
//!     .afterwards("Route", AfterwardsOptions::default().include_otherwise())?
//!     .next(&mut graph, "Done")?;
//! graph.start_at("Route");
//! graph.to_graph_json()?;
//! # Ok(())
//! # }
//! # build().unwrap();
//! ```
//!
//! ## Module Guide
//!
//! - [`types`]: state identifiers and construction tokens
//! - [`state`]: the state model and per-kind builders
//! - [`condition`]: boolean conditions for Choice routing
//! - [`policy`]: retry and catch policies for work states
//! - [`graph`]: the state registry, validation, and rendering
//! - [`chain`]: linking states into sequences
//! - [`traversal`]: read-only reachability walks
//! - [`errors`]: the construction-error taxonomy

pub mod chain;
pub mod condition;
pub mod errors;
pub mod graph;
pub mod policy;
pub mod state;
pub mod traversal;
pub mod types;
