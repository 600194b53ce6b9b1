//! Turn trace — the reasoning scratchpad for a single turn.
//!
//! Records what the agent thought, which actions it took, what the tools
//! returned, and which errors it recovered from. A trace is:
//!
//! - **Turn-scoped**: a fresh trace starts with every turn and replaces the
//!   previous one on the session when the turn ends
//! - **Model-visible while the turn runs**: rendered into every prompt
//! - **Inspectable afterwards**: kept on the session for observability

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// The kind of trace entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Think,
    Action,
    Result,
    Error,
}

impl TraceKind {
    pub fn label(&self) -> &'static str {
        match self {
            TraceKind::Think => "Think",
            TraceKind::Action => "Action",
            TraceKind::Result => "Result",
            TraceKind::Error => "Error",
        }
    }
}

/// Append-only log of one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub entries: Vec<TraceEntry>,

    /// Iterations consumed by the turn that produced this trace.
    pub iterations: usize,

    /// Iteration ceiling the turn ran under.
    pub max_iterations: usize,
}

impl Trace {
    /// Create an empty trace for a turn with the given ceiling.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            entries: Vec::new(),
            iterations: 0,
            max_iterations,
        }
    }

    pub fn add_think(&mut self, text: &str) {
        self.push(TraceKind::Think, text);
    }

    pub fn add_action(&mut self, text: &str) {
        self.push(TraceKind::Action, text);
    }

    pub fn add_result(&mut self, text: &str) {
        self.push(TraceKind::Result, text);
    }

    pub fn add_error(&mut self, text: &str) {
        self.push(TraceKind::Error, text);
    }

    fn push(&mut self, kind: TraceKind, text: &str) {
        self.entries.push(TraceEntry {
            kind,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Start another iteration. Returns `false`, without counting, once the
    /// ceiling has been reached.
    pub fn tick(&mut self) -> bool {
        if self.iterations >= self.max_iterations {
            return false;
        }
        self.iterations += 1;
        true
    }

    /// Number of entries of the given kind.
    pub fn count(&self, kind: TraceKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Render the trace as `Label: text` lines, one entry per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(entry.kind.label());
            out.push_str(": ");
            out.push_str(&entry.text);
            out.push('\n');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trace_is_empty() {
        let trace = Trace::new(8);
        assert!(trace.is_empty());
        assert_eq!(trace.iterations, 0);
        assert_eq!(trace.max_iterations, 8);
    }

    #[test]
    fn entries_keep_append_order() {
        let mut trace = Trace::default();
        trace.add_think("Customer gave their name");
        trace.add_action("getCustomerApplications(\"Jane Smith\")");
        trace.add_result("[]");
        trace.add_error("Unknown tool: getCrads");

        let kinds: Vec<_> = trace.entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![TraceKind::Think, TraceKind::Action, TraceKind::Result, TraceKind::Error]
        );
        assert_eq!(trace.count(TraceKind::Action), 1);
    }

    #[test]
    fn iteration_tracking() {
        let mut trace = Trace::new(3);
        assert!(trace.tick()); // 1
        assert!(trace.tick()); // 2
        assert!(trace.tick()); // 3
        assert!(!trace.tick()); // ceiling reached
        assert_eq!(trace.iterations, 3);
    }

    #[test]
    fn render_uses_labels() {
        let mut trace = Trace::default();
        trace.add_think("look up cards");
        trace.add_action("getCards()");
        trace.add_result("[{\"id\":1}]");

        assert_eq!(
            trace.render(),
            "Think: look up cards\nAction: getCards()\nResult: [{\"id\":1}]\n"
        );
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&TraceKind::Think).unwrap();
        assert_eq!(json, "\"think\"");
    }
}
