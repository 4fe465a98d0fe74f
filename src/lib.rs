//! An evaluation engine for an interactive SHACL/SPARQL session.
//!
//! Cells arrive as text and run as atomic evaluation cycles: directive
//! lines ("magics") mutate the graph store or the remote query
//! configuration, and the residual payload is routed either to a remote
//! SPARQL endpoint or into the local data graph. The [`router::Kernel`]
//! is the entry point; [`repl`] wraps it in a line-oriented driver.

pub mod complete;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod magic;
pub mod model;
pub mod repl;
pub mod router;
pub mod shacl;
pub mod sparql;

pub use complete::{complete, inspect, token_at_cursor};
pub use config::{CliArgs, KernelConfig};
pub use error::{KernelError, Result};
pub use graph::{GraphKind, GraphStore};
pub use model::{
    CompleteReply, CycleOutcome, CycleResult, CycleStatus, InspectReply, KernelInfo, Notification,
    StreamName,
};
pub use router::{Kernel, is_query};
pub use shacl::{InferenceMode, Severity, ShapeValidator, ValidationReport, ValidationResult};
pub use sparql::{QueryConfig, QueryExecutor, SparqlClient};
