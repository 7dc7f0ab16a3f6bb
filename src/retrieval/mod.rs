//! Retrieval of supporting fragments for a query
//!
//! There is no corpus behind this yet: `retrieve_information` returns the
//! same three placeholder fragments for every query.

/// Placeholder fragments returned for every query, in order
pub const PLACEHOLDER_FRAGMENTS: [&str; 3] = [
    "Exemplo de informação 1 relacionada à consulta",
    "Exemplo de informação 2 relacionada à consulta",
    "Exemplo de informação 3 relacionada à consulta",
];

/// Retrieve fragments relevant to `query`.
///
/// The query content is ignored and the call cannot fail.
pub fn retrieve_information(_query: &str) -> Vec<String> {
    PLACEHOLDER_FRAGMENTS.iter().map(|s| s.to_string()).collect()
}

/// Source of fragments for the generator
pub trait Retriever: Send + Sync {
    /// Return an ordered sequence of fragments for `query`
    fn retrieve(&self, query: &str) -> Vec<String>;
}

/// Retriever backed by the fixed placeholder fragments
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRetriever;

impl StaticRetriever {
    pub fn new() -> Self {
        Self
    }
}

impl Retriever for StaticRetriever {
    fn retrieve(&self, query: &str) -> Vec<String> {
        let fragments = retrieve_information(query);
        log::debug!("Retrieved {} fragments", fragments.len());
        fragments
    }
}
