//! The graph store: two independently mutable named graphs, *data* and
//! *shapes*, backed by oxigraph stores.
//!
//! Mutations parse incoming Turtle into a scratch store first, so a parse
//! failure leaves the target graph untouched and the cycle can report an
//! unchanged triple count.

use oxigraph::io::RdfFormat;
use oxigraph::model::GraphNameRef;
use oxigraph::store::Store;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{KernelError, Result};
use crate::shacl::{InferenceMode, ShapeValidator, ValidationReport};

/// Which of the two graphs an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    Data,
    Shapes,
}

/// Holds the subject data graph and the constraint shapes graph.
///
/// The two graphs never share triples; every operation addresses exactly
/// one of them (or, for [`GraphStore::clear`], optionally both).
pub struct GraphStore {
    data: Store,
    shapes: Store,
}

impl GraphStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            data: Store::new()?,
            shapes: Store::new()?,
        })
    }

    fn store(&self, which: GraphKind) -> &Store {
        match which {
            GraphKind::Data => &self.data,
            GraphKind::Shapes => &self.shapes,
        }
    }

    /// Replace the graph's entire content with the parsed `turtle`.
    /// Returns the new triple count.
    pub fn load(&mut self, which: GraphKind, turtle: &str) -> Result<usize> {
        let scratch = parse_turtle(turtle)?;
        let target = self.store(which);
        target.clear()?;
        copy_quads(&scratch, target)?;
        Ok(target.len()?)
    }

    /// Parse `turtle` and merge it into the graph. Returns the number of
    /// triples actually added (duplicates do not count).
    pub fn append(&mut self, which: GraphKind, turtle: &str) -> Result<usize> {
        let scratch = parse_turtle(turtle)?;
        let target = self.store(which);
        let before = target.len()?;
        copy_quads(&scratch, target)?;
        Ok(target.len()? - before)
    }

    /// Empty one graph, or both when `which` is `None`. Idempotent.
    pub fn clear(&mut self, which: Option<GraphKind>) -> Result<()> {
        match which {
            Some(kind) => self.store(kind).clear()?,
            None => {
                self.data.clear()?;
                self.shapes.clear()?;
            }
        }
        Ok(())
    }

    pub fn count(&self, which: GraphKind) -> Result<usize> {
        Ok(self.store(which).len()?)
    }

    /// Turtle serialization of the graph. An empty graph serializes to an
    /// empty string, never an error.
    pub fn serialize(&self, which: GraphKind) -> Result<String> {
        let store = self.store(which);
        if store.is_empty()? {
            return Ok(String::new());
        }
        let buffer = store
            .dump_graph_to_writer(GraphNameRef::DefaultGraph, RdfFormat::Turtle, Vec::new())
            .map_err(|err| KernelError::Internal(anyhow::Error::new(err)))?;
        String::from_utf8(buffer)
            .map_err(|err| KernelError::Internal(anyhow::Error::new(err)))
    }

    /// Validate the data graph against the shapes graph.
    ///
    /// All-or-nothing: each graph is checked independently and a distinct
    /// precondition message names the missing one before the validator is
    /// ever invoked.
    pub fn validate(&self, inference: InferenceMode) -> Result<ValidationReport> {
        if self.shapes.is_empty()? {
            return Err(KernelError::Precondition(
                "No shapes graph loaded. Use %shapes to load shapes first.".to_string(),
            ));
        }
        if self.data.is_empty()? {
            return Err(KernelError::Precondition(
                "No data graph loaded. Use %data to load data first.".to_string(),
            ));
        }
        let validator = ShapeValidator::new(&self.shapes);
        validator.validate(&self.data, inference)
    }
}

fn parse_turtle(turtle: &str) -> Result<Store> {
    let scratch = Store::new()?;
    scratch
        .load_from_reader(RdfFormat::Turtle, turtle.as_bytes())
        .map_err(|err| KernelError::Parse(err.to_string()))?;
    Ok(scratch)
}

fn copy_quads(from: &Store, to: &Store) -> Result<()> {
    for quad in from.iter() {
        let quad = quad?;
        to.insert(&quad)?;
    }
    Ok(())
}
