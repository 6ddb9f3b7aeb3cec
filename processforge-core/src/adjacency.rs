//! Adjacency Indexer - Incoming/Outgoing Flow Ids per Node
//!
//! Built once per serialization and read-only afterwards. Keys and values
//! borrow from the caller's flow list.

use std::collections::HashMap;

use crate::model::Flow;

#[derive(Debug, Default)]
pub struct AdjacencyIndex<'g> {
    incoming: HashMap<&'g str, Vec<&'g str>>,
    outgoing: HashMap<&'g str, Vec<&'g str>>,
}

impl<'g> AdjacencyIndex<'g> {
    /// Index flows in input order. Flows without both endpoints are skipped.
    pub fn build(flows: &'g [Flow]) -> Self {
        let mut incoming: HashMap<&str, Vec<&str>> = HashMap::with_capacity(flows.len());
        let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::with_capacity(flows.len());

        for flow in flows {
            if !flow.is_connected() {
                tracing::warn!(flow = %flow.id, "flow lacks source or target, not indexed");
                continue;
            }
            outgoing.entry(flow.source.as_str()).or_default().push(flow.id.as_str());
            incoming.entry(flow.target.as_str()).or_default().push(flow.id.as_str());
        }

        Self { incoming, outgoing }
    }

    pub fn incoming(&self, node_id: &str) -> &[&'g str] {
        self.incoming.get(node_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn outgoing(&self, node_id: &str) -> &[&'g str] {
        self.outgoing.get(node_id).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(id: &str, source: &str, target: &str) -> Flow {
        Flow {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            name: None,
        }
    }

    #[test]
    fn test_preserves_input_order() {
        let flows = vec![
            flow("f9", "a", "c"),
            flow("f1", "b", "c"),
            flow("f5", "a", "b"),
        ];
        let index = AdjacencyIndex::build(&flows);
        assert_eq!(index.incoming("c"), ["f9", "f1"]);
        assert_eq!(index.outgoing("a"), ["f9", "f5"]);
        assert_eq!(index.incoming("b"), ["f5"]);
        assert_eq!(index.outgoing("b"), ["f1"]);
    }

    #[test]
    fn test_skips_unconnected_flows() {
        let flows = vec![flow("f1", "", "b"), flow("f2", "a", ""), flow("f3", "a", "b")];
        let index = AdjacencyIndex::build(&flows);
        assert_eq!(index.outgoing("a"), ["f3"]);
        assert_eq!(index.incoming("b"), ["f3"]);
        assert!(index.outgoing("").is_empty());
        assert!(index.incoming("").is_empty());
    }

    #[test]
    fn test_skipped_flow_logged_as_warning() {
        use std::io;
        use std::sync::{Arc, Mutex};

        struct Sink(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Sink {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&captured);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || Sink(Arc::clone(&writer)))
            .finish();

        let flows = vec![flow("f1", "a", "")];
        tracing::subscriber::with_default(subscriber, || {
            AdjacencyIndex::build(&flows);
        });

        let logged = String::from_utf8(captured.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("WARN"));
        assert!(logged.contains("not indexed"));
        assert!(logged.contains("f1"));
    }

    #[test]
    fn test_unknown_node_has_no_flows() {
        let index = AdjacencyIndex::build(&[]);
        assert!(index.incoming("ghost").is_empty());
        assert!(index.outgoing("ghost").is_empty());
    }

    #[test]
    fn test_self_loop_counts_both_ways() {
        let flows = vec![flow("loop", "a", "a")];
        let index = AdjacencyIndex::build(&flows);
        assert_eq!(index.incoming("a"), ["loop"]);
        assert_eq!(index.outgoing("a"), ["loop"]);
    }
}
