use crate::cache::{GraphCache, denylist_terms, is_denylisted};
use crate::config::Config;
use crate::data::Store;
use crate::error::Result;
use chrono::{DateTime, Utc};
use refweb_graph::{
    AssembleOptions, Corpus, Edge, Graph, GraphAssembler, Node, SizeScaler, SizeTable, traverse,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Source of "now" used for freshness decisions
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// How a read treats an existing cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Any cached entry is served, however old
    Interactive,
    /// Entries not written today (UTC) are recomputed and overwritten
    Population,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedGraph {
    pub document_nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedComments {
    pub comment_nodes: Vec<Node>,
}

/// Cache-backed compute path for connected-document graphs
pub struct GraphEngine {
    corpus: Arc<Corpus>,
    cache: GraphCache,
    scaler: SizeScaler,
    sizes: SizeTable,
    options: AssembleOptions,
    clock: Clock,
}

impl GraphEngine {
    pub fn new(corpus: Arc<Corpus>, store: Arc<Store>) -> Self {
        let scaler = SizeScaler::default();
        let sizes = scaler.size_table(corpus.documents());
        Self {
            corpus,
            cache: GraphCache::new(store),
            scaler,
            sizes,
            options: AssembleOptions::default(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn from_config(corpus: Arc<Corpus>, store: Arc<Store>, config: &Config) -> Self {
        Self::new(corpus, store)
            .with_scaler(config.sizing.scaler())
            .with_options(config.graph.assemble_options())
    }

    /// Replace the scaler; corpus-wide sizes are recomputed
    pub fn with_scaler(mut self, scaler: SizeScaler) -> Self {
        self.sizes = scaler.size_table(self.corpus.documents());
        self.scaler = scaler;
        self
    }

    pub fn with_options(mut self, options: AssembleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    pub fn store(&self) -> &Store {
        self.cache.store()
    }

    /// Documents and edges of the neighborhood around the document titled `name`.
    ///
    /// An unknown name yields an empty result with no `updated_at` and
    /// writes nothing.
    pub fn connected_graph(&self, name: &str, depth: u32, mode: ReadMode) -> Result<ConnectedGraph> {
        let Some(seed) = self.corpus.find_by_name(name) else {
            debug!("No document named {:?}", name);
            return Ok(ConnectedGraph::default());
        };
        let key = seed.name();

        if let Some(entry) = self.cache.get(key, depth)? {
            let now = (self.clock)();
            if mode == ReadMode::Interactive || entry.is_fresh(now) {
                debug!("Cache hit for ({}, {}) in {:?} mode", key, depth, mode);
                return Ok(ConnectedGraph {
                    document_nodes: entry.document_nodes,
                    edges: entry.edges,
                    updated_at: Some(entry.updated_at),
                });
            }
            debug!("Stale entry for ({}, {}) from {}", key, depth, entry.updated_at);
        }

        let graph = self.compute(&seed.id, depth);
        let updated_at = self.cache.put(key, depth, &graph)?;
        let (document_nodes, _, edges) = graph.into_parts();

        Ok(ConnectedGraph {
            document_nodes,
            edges,
            updated_at: Some(updated_at),
        })
    }

    /// Comment nodes of the neighborhood around `name`. Any cached entry is
    /// served; a miss computes and caches the full graph.
    pub fn connected_comments(&self, name: &str, depth: u32) -> Result<ConnectedComments> {
        let Some(seed) = self.corpus.find_by_name(name) else {
            return Ok(ConnectedComments::default());
        };
        let key = seed.name();

        if let Some(comment_nodes) = self.cache.comments(key, depth)? {
            debug!("Comment cache hit for ({}, {})", key, depth);
            return Ok(ConnectedComments { comment_nodes });
        }

        let graph = self.compute(&seed.id, depth);
        self.cache.put(key, depth, &graph)?;
        let (_, comment_nodes, _) = graph.into_parts();

        Ok(ConnectedComments { comment_nodes })
    }

    /// Traverse from `seed_id` and assemble the full graph without touching the cache
    pub fn compute(&self, seed_id: &str, depth: u32) -> Graph {
        let hood = traverse(&self.corpus, seed_id, depth);
        let graph = GraphAssembler::new(&self.corpus, &self.sizes, &self.scaler)
            .with_options(self.options.clone())
            .assemble(&hood);
        debug!(
            "Computed graph for {} at depth {}: {} nodes, {} edges",
            seed_id,
            depth,
            graph.nodes.len(),
            graph.edges.len()
        );
        graph
    }

    /// Distinct non-empty document names in corpus order
    pub fn document_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.corpus
            .documents()
            .iter()
            .map(|d| d.name())
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    /// Document names minus any containing a denylisted term (case-insensitive)
    pub fn population_candidates(&self, denylist: &[String]) -> Vec<String> {
        let terms = denylist_terms(denylist);
        self.document_names()
            .into_iter()
            .filter(|name| !is_denylisted(name, &terms))
            .collect()
    }
}
