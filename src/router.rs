//! The execution router: one evaluation cycle per cell submission.
//!
//! A cycle parses the directive block, runs state magics against the graph
//! store, runs config magics against the query configuration, then routes
//! any residual payload to either the remote query client or the data
//! graph. The first error aborts the cycle; errors never cross this
//! boundary as panics.

use tracing::{debug, warn};

use crate::error::Result;
use crate::graph::{GraphKind, GraphStore};
use crate::magic::{MagicBlock, StateMagic, StateMagicKind};
use crate::model::{CycleOutcome, CycleResult, KernelInfo, Notification};
use crate::shacl::InferenceMode;
use crate::sparql::{MAGICS, QUERY_STARTERS, QueryConfig, QueryExecutor, SparqlClient, process_magic};

/// True when the payload starts with a query keyword. Pure; first match
/// wins over the fixed ordered set.
pub fn is_query(payload: &str) -> bool {
    let upper = payload.trim_start().to_uppercase();
    QUERY_STARTERS
        .iter()
        .any(|keyword| upper.starts_with(keyword))
}

/// Session state plus the collaborators one evaluation cycle touches.
pub struct Kernel {
    graphs: GraphStore,
    query_config: QueryConfig,
    executor: Box<dyn QueryExecutor>,
    inference: InferenceMode,
    sequence: u64,
}

impl Kernel {
    pub fn new() -> Result<Self> {
        Ok(Self::with_executor(Box::new(SparqlClient::new()?))?)
    }

    /// Build a kernel around a caller-supplied query executor. Tests use
    /// this to run cycles without a network.
    pub fn with_executor(executor: Box<dyn QueryExecutor>) -> Result<Self> {
        Ok(Self {
            graphs: GraphStore::new()?,
            query_config: QueryConfig::default(),
            executor,
            inference: InferenceMode::default(),
            sequence: 0,
        })
    }

    pub fn info(&self) -> KernelInfo {
        KernelInfo::default()
    }

    pub fn graphs(&self) -> &GraphStore {
        &self.graphs
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query_config
    }

    pub fn query_config_mut(&mut self) -> &mut QueryConfig {
        &mut self.query_config
    }

    pub fn set_inference(&mut self, inference: InferenceMode) {
        self.inference = inference;
    }

    /// Run one evaluation cycle.
    ///
    /// Silent cycles bump the sequence and return OK without touching any
    /// state. Otherwise the cycle runs to completion or to its first
    /// error; notifications produced before the error are kept, and the
    /// error itself is appended as a single stderr notification.
    pub fn execute(&mut self, code: &str, silent: bool) -> CycleResult {
        self.sequence += 1;
        let sequence = self.sequence;
        if silent {
            return CycleResult::ok(sequence);
        }

        let mut notifications = Vec::new();
        match self.run_cycle(code, &mut notifications) {
            Ok(()) => CycleResult {
                outcome: CycleOutcome::ok(sequence),
                notifications,
            },
            Err(err) => {
                warn!(sequence, error = %err, "evaluation cycle failed");
                notifications.push(Notification::stderr(err.trace().join("\n")));
                CycleResult {
                    outcome: CycleOutcome::error(sequence, &err),
                    notifications,
                }
            }
        }
    }

    fn run_cycle(&mut self, code: &str, notifications: &mut Vec<Notification>) -> Result<()> {
        let block = MagicBlock::parse(code);
        if block.is_empty_input() {
            return Ok(());
        }
        debug!(
            state = block.state.len(),
            config = block.config.len(),
            payload = !block.payload.is_empty(),
            "cycle parsed"
        );

        let state_ran = !block.state.is_empty();
        for magic in &block.state {
            let text = self.run_state_magic(magic, &block.payload)?;
            notifications.push(Notification::stdout(text));
        }
        // A cell of state magics alone is complete; the payload was the
        // magics' content and must not fall through to classification.
        if state_ran && block.config.is_empty() {
            return Ok(());
        }

        if !block.config.is_empty() {
            let outputs: Vec<String> = block
                .config
                .iter()
                .map(|line| process_magic(line, &mut self.query_config))
                .collect();
            notifications.push(Notification::display_text(outputs.join("\n")));
        }

        let payload = block.payload.trim();
        if payload.is_empty() {
            return Ok(());
        }

        if is_query(payload) {
            let text = self
                .executor
                .execute(payload, self.sequence, &self.query_config)?;
            notifications.push(Notification::display_text(text));
        } else if !state_ran {
            let added = self.graphs.append(GraphKind::Data, payload)?;
            let total = self.graphs.count(GraphKind::Data)?;
            notifications.push(Notification::stdout(format!(
                "Added {added} triples to data graph. Total: {total} triples."
            )));
        }
        Ok(())
    }

    fn run_state_magic(&mut self, magic: &StateMagic, payload: &str) -> Result<String> {
        match magic.kind {
            StateMagicKind::Data => {
                let count = self.graphs.load(GraphKind::Data, payload)?;
                Ok(format!("Loaded data graph with {count} triples."))
            }
            StateMagicKind::Shapes => {
                let count = self.graphs.load(GraphKind::Shapes, payload)?;
                Ok(format!("Loaded shapes graph with {count} triples."))
            }
            StateMagicKind::Validate => {
                let report = self.graphs.validate(self.inference)?;
                let verdict = if report.conforms() { "PASSED" } else { "FAILED" };
                Ok(format!("Validation {verdict}\n\n{}", report.text()))
            }
            StateMagicKind::Clear => match magic.args.first().map(String::as_str) {
                None => {
                    self.graphs.clear(None)?;
                    Ok("Cleared all graphs.".to_string())
                }
                Some("data") => {
                    self.graphs.clear(Some(GraphKind::Data))?;
                    Ok("Cleared data graph.".to_string())
                }
                Some("shapes") => {
                    self.graphs.clear(Some(GraphKind::Shapes))?;
                    Ok("Cleared shapes graph.".to_string())
                }
                Some(_) => Ok("Usage: %clear [data|shapes]".to_string()),
            },
            StateMagicKind::Show => {
                if magic.args.is_empty() {
                    self.show_graphs()
                } else {
                    // With an argument this is the result-limit magic.
                    Ok(process_magic(&magic.raw, &mut self.query_config))
                }
            }
            StateMagicKind::Help => Ok(help_text()),
        }
    }

    fn show_graphs(&self) -> Result<String> {
        let mut output = Vec::new();
        let data_count = self.graphs.count(GraphKind::Data)?;
        output.push(format!("Data graph: {data_count} triples"));
        if data_count > 0 {
            output.push("\nData:".to_string());
            output.push(self.graphs.serialize(GraphKind::Data)?);
        }
        let shapes_count = self.graphs.count(GraphKind::Shapes)?;
        output.push(format!("\nShapes graph: {shapes_count} triples"));
        if shapes_count > 0 {
            output.push("\nShapes:".to_string());
            output.push(self.graphs.serialize(GraphKind::Shapes)?);
        }
        Ok(output.join("\n"))
    }
}

/// Full help text: graph magics, then the config magic table.
pub fn help_text() -> String {
    let mut out = String::from(
        "SHACL Kernel - Available Commands\n\n\
         Graph Magic Commands:\n\
         \x20 %data      - Load data graph (Turtle format)\n\
         \x20 %shapes    - Load shapes graph (Turtle format)\n\
         \x20 %validate  - Validate data against shapes\n\
         \x20 %show      - Show current graphs\n\
         \x20 %clear     - Clear all graphs\n\
         \x20 %help      - Show this help message\n\n\
         Query Magic Commands:\n",
    );
    for (name, (args, help)) in MAGICS.iter() {
        out.push_str(&format!("  {name} {args} - {help}\n"));
    }
    out.push_str(
        "\nUsage:\n\
         \x20 - Use graph magics (%data, %shapes, %validate) for SHACL validation\n\
         \x20 - Use query magics (%endpoint, ...) and SPARQL queries for querying endpoints\n\
         \x20 - Without magic commands, Turtle input is added to the data graph\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CycleStatus;

    struct EchoExecutor;

    impl QueryExecutor for EchoExecutor {
        fn execute(&self, query: &str, seq: u64, _cfg: &QueryConfig) -> Result<String> {
            Ok(format!("ran[{seq}]: {query}"))
        }
    }

    fn kernel() -> Kernel {
        Kernel::with_executor(Box::new(EchoExecutor)).unwrap()
    }

    #[test]
    fn query_classifier_is_prefix_based() {
        assert!(is_query("SELECT * WHERE { ?s ?p ?o }"));
        assert!(is_query("  select ?s where { ?s ?p ?o }"));
        assert!(is_query("ASK { ?s ?p ?o }"));
        assert!(!is_query("@prefix ex: <http://example.org/> ."));
        assert!(!is_query(""));
    }

    #[test]
    fn silent_cycle_only_bumps_sequence() {
        let mut kernel = kernel();
        let result = kernel.execute("%data\nbroken turtle ...", true);
        assert!(result.outcome.is_ok());
        assert_eq!(result.outcome.sequence, 1);
        assert!(result.notifications.is_empty());
        assert_eq!(kernel.graphs().count(GraphKind::Data).unwrap(), 0);
    }

    #[test]
    fn empty_cell_is_ok_with_no_notifications() {
        let mut kernel = kernel();
        let result = kernel.execute("# just a comment\n\n", false);
        assert!(result.outcome.is_ok());
        assert!(result.notifications.is_empty());
    }

    #[test]
    fn state_magic_consumes_payload_as_content() {
        let mut kernel = kernel();
        let result = kernel.execute(
            "%data\n@prefix ex: <http://example.org/> .\nex:a ex:p ex:b .",
            false,
        );
        assert!(result.outcome.is_ok());
        assert_eq!(kernel.graphs().count(GraphKind::Data).unwrap(), 1);
        match &result.notifications[0] {
            Notification::Stream { text, .. } => {
                assert_eq!(text, "Loaded data graph with 1 triples.");
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn query_payload_routes_to_executor() {
        let mut kernel = kernel();
        let result = kernel.execute("SELECT * WHERE { ?s ?p ?o }", false);
        assert!(result.outcome.is_ok());
        match &result.notifications[0] {
            Notification::Display { data } => {
                let text = data["text/plain"].as_str().unwrap();
                assert!(text.starts_with("ran[1]: SELECT"));
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn bare_turtle_appends_to_data_graph() {
        let mut kernel = kernel();
        let result = kernel.execute(
            "@prefix ex: <http://example.org/> .\nex:a ex:p ex:b .",
            false,
        );
        assert!(result.outcome.is_ok());
        assert_eq!(kernel.graphs().count(GraphKind::Data).unwrap(), 1);
        match &result.notifications[0] {
            Notification::Stream { text, .. } => {
                assert_eq!(text, "Added 1 triples to data graph. Total: 1 triples.");
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn error_outcome_carries_name_and_stderr() {
        let mut kernel = kernel();
        let result = kernel.execute("%validate", false);
        assert_eq!(result.outcome.status, CycleStatus::Error);
        assert_eq!(result.outcome.error_name.as_deref(), Some("PreconditionError"));
        assert!(matches!(
            result.notifications.last(),
            Some(Notification::Stream { text, .. }) if text.contains("No shapes graph loaded")
        ));
    }

    #[test]
    fn show_with_argument_sets_result_limit() {
        let mut kernel = kernel();
        let result = kernel.execute("%show 5", false);
        assert!(result.outcome.is_ok());
        assert_eq!(kernel.query_config().result_limit, Some(5));
    }

    #[test]
    fn show_without_argument_dumps_graphs() {
        let mut kernel = kernel();
        kernel.execute(
            "%data\n@prefix ex: <http://example.org/> .\nex:a ex:p ex:b .",
            false,
        );
        let result = kernel.execute("%show", false);
        match &result.notifications[0] {
            Notification::Stream { text, .. } => {
                assert!(text.starts_with("Data graph: 1 triples"));
                assert!(text.contains("Shapes graph: 0 triples"));
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }
}
