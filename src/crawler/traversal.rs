//! Tree traversal - the recursive fetch, persist and count loop
//!
//! A crawl walks the tree depth-first from a root id:
//! - Fetching each node's document
//! - Writing it to storage before looking at its children
//! - Recursing into children not seen before
//! - Folding leaf question counts into a running total

use crate::config::Config;
use crate::crawler::{build_http_client, CancelFlag, DocumentFetcher, FetchError, RetryPolicy};
use crate::document::NodeId;
use crate::output::{CrawlReport, NodeOutcome};
use crate::state::{IgnoreSet, NodeState, QuestionCounter, VisitedSet};
use crate::storage::{open_storage, Storage};
use crate::url::node_url;
use crate::CrawlError;
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

type VisitFuture<'a> = Pin<Box<dyn Future<Output = Result<NodeState, CrawlError>> + Send + 'a>>;

/// State owned by a single crawl invocation
struct CrawlRun {
    visited: VisitedSet,
    /// Ids reported as `DepthExceeded` that a shorter path may still enter
    deferred: HashSet<NodeId>,
    counter: QuestionCounter,
    report: CrawlReport,
}

/// Walks the question tree and mirrors it to storage
pub struct TreeCrawler {
    fetcher: DocumentFetcher,
    storage: Box<dyn Storage>,
    tree_root: String,
    ignore: IgnoreSet,
    max_depth: u32,
    progress_interval: u64,
    cancel: CancelFlag,
}

impl TreeCrawler {
    /// Creates a crawler from explicit parts
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Document fetcher used for every node
    /// * `storage` - Destination for persisted documents
    /// * `tree_root` - URL prefix node ids are appended to
    pub fn new(fetcher: DocumentFetcher, storage: Box<dyn Storage>, tree_root: &str) -> Self {
        let cancel = CancelFlag::new();
        Self {
            fetcher: fetcher.with_cancel_flag(cancel.clone()),
            storage,
            tree_root: tree_root.to_string(),
            ignore: IgnoreSet::empty(),
            max_depth: u32::MAX,
            progress_interval: crate::state::DEFAULT_PROGRESS_INTERVAL,
            cancel,
        }
    }

    /// Creates a crawler with an HTTP client, retry policy and file
    /// storage built from the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(TreeCrawler)` - Ready to crawl
    /// * `Err(CrawlError)` - Client or output directory could not be set up
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let fetcher = DocumentFetcher::new(client, RetryPolicy::from_config(&config.crawler));
        let storage = open_storage(Path::new(&config.output.directory), &config.output.extension)?;

        Ok(Self::new(fetcher, Box::new(storage), &config.crawler.tree_root)
            .with_ignore(config.ignore_set())
            .with_max_depth(config.crawler.max_depth)
            .with_progress_interval(config.crawler.progress_interval))
    }

    pub fn with_ignore(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Handle that stops the crawl when cancelled
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Crawls the tree below `root`
    ///
    /// Each call starts with an empty visited set and a zero question
    /// count. Per-node failures, including a document that cannot be
    /// written, are recorded in the report; only losing the output
    /// directory aborts the crawl.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use qtree_mirror::config::load_config;
    /// use qtree_mirror::crawler::TreeCrawler;
    /// use qtree_mirror::document::NodeId;
    /// use std::path::Path;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = load_config(Path::new("mirror.toml"))?;
    /// let mut crawler = TreeCrawler::from_config(&config)?;
    /// let report = crawler.crawl(&NodeId::from(config.crawler.root_id.as_str())).await?;
    /// println!("{} questions", report.total_questions);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(&mut self, root: &NodeId) -> Result<CrawlReport, CrawlError> {
        tracing::info!("Starting crawl at {} ({})", root, self.tree_root);

        let mut run = CrawlRun {
            visited: VisitedSet::new(),
            deferred: HashSet::new(),
            counter: QuestionCounter::new(self.progress_interval),
            report: CrawlReport::new(root.clone()),
        };

        run.visited.mark(root);
        let state = self.visit(&mut run, root, 0).await?;

        run.report.total_questions = run.counter.total();
        run.report.finish();

        tracing::info!(
            "Crawl finished: root {}, {} nodes, {} files, {} questions",
            state,
            run.report.outcomes.len(),
            self.storage.persisted_count(),
            run.report.total_questions
        );

        Ok(run.report)
    }

    /// Visits one node that the caller has already marked as visited
    ///
    /// Returns the node's terminal state, or `Unvisited` if the crawl was
    /// cancelled before the node could be fetched.
    fn visit<'a>(
        &'a mut self,
        run: &'a mut CrawlRun,
        id: &'a NodeId,
        depth: u32,
    ) -> VisitFuture<'a> {
        Box::pin(async move {
            if self.cancel.is_cancelled() {
                run.report.cancelled = true;
                return Ok(NodeState::Unvisited);
            }

            let url = match node_url(&self.tree_root, id.as_str()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Cannot build URL for {}: {}", id, e);
                    let outcome = NodeOutcome::new(id.clone(), NodeState::Failed, depth)
                        .with_error(e.to_string());
                    run.report.record(outcome);
                    return Ok(NodeState::Failed);
                }
            };

            let mut state = NodeState::Unvisited;
            state.advance(NodeState::Fetching);

            tracing::debug!("Fetching {} (depth {})", url, depth);
            let document = match self.fetcher.fetch(&url).await {
                Ok(document) => document,
                Err(FetchError::Cancelled { .. }) => {
                    run.report.cancelled = true;
                    return Ok(NodeState::Unvisited);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", id, e);
                    state.advance(NodeState::Failed);
                    let outcome = NodeOutcome::new(id.clone(), state, depth).with_error(e.to_string());
                    run.report.record(outcome);
                    return Ok(state);
                }
            };

            if document.is_discardable() {
                tracing::debug!("Node {} lists no TextId, discarding", id);
                state.advance(NodeState::Discarded);
                run.report.record(NodeOutcome::new(id.clone(), state, depth));
                return Ok(state);
            }

            let path = match self.storage.persist(&document) {
                Ok(path) => path,
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("Cannot write {}, skipping its subtree: {}", id, e);
                    state.advance(NodeState::Failed);
                    let outcome = NodeOutcome::new(id.clone(), state, depth).with_error(e.to_string());
                    run.report.record(outcome);
                    return Ok(state);
                }
                Err(e) => return Err(e.into()),
            };
            state.advance(NodeState::Persisted);

            let mut has_real_child = false;
            for child in &document.child_ids {
                if child == id || document.self_id.as_ref() == Some(child) {
                    continue;
                }

                if self.ignore.is_ignored(child.as_str()) {
                    if run.visited.mark(child) {
                        tracing::debug!("Ignoring {}", child);
                        let outcome = NodeOutcome::new(child.clone(), NodeState::Ignored, depth + 1);
                        run.report.record(outcome);
                    }
                    continue;
                }

                // Checked before marking so a shorter path can still enter it
                if depth + 1 > self.max_depth {
                    if !run.visited.contains(child.as_str()) && run.deferred.insert(child.clone()) {
                        tracing::warn!("Not entering {}: depth {} exceeds limit", child, depth + 1);
                        let outcome =
                            NodeOutcome::new(child.clone(), NodeState::DepthExceeded, depth + 1);
                        run.report.record(outcome);
                    }
                    continue;
                }

                if !run.visited.mark(child) {
                    tracing::trace!("Already visited {}", child);
                    continue;
                }
                if run.deferred.remove(child) {
                    run.report.discard(child.as_str());
                }

                let child_state = self.visit(run, child, depth + 1).await?;
                if child_state.was_persisted() {
                    has_real_child = true;
                }
            }

            state.advance(if has_real_child {
                NodeState::Branch
            } else {
                NodeState::Leaf
            });

            let mut outcome = NodeOutcome::new(id.clone(), state, depth);
            outcome.path = path;
            if state == NodeState::Leaf {
                if let Some(questions) = document.questions_num {
                    outcome.questions = Some(questions);
                    if let Some(milestone) = run.counter.add(questions) {
                        tracing::info!("Progress: {} questions counted", milestone);
                        run.report.milestones.push(milestone);
                    }
                }
            }

            run.report.record(outcome);
            Ok(state)
        })
    }
}
