//! The aggregation controller behind the browse view.
//!
//! [`FeedController`] owns the accumulated record list and the per-museum
//! pagination cursors.  It never performs I/O: every operation that needs
//! data returns a [`FetchPlan`], the runtime executes the plan (see
//! [`crate::fetch`]) and hands the [`FetchOutcome`] back to
//! [`apply`](FeedController::apply).
//!
//! ```text
//!            start / select_source / retry
//!   Idle ──────────────────────────────────► InitialLoading
//!                                              │        │
//!                                     success  │        │ failure
//!                                              ▼        ▼
//!             load_more ┌──────────────────  Ready    Failed ── retry ──►
//!            ┌──────────┘                      ▲
//!            ▼                                 │ success or partial
//!       LoadingMore ───────────────────────────┘ (never fails the feed)
//! ```
//!
//! ## Modes
//!
//! * **Single museum** — plain page-number pagination, records appended
//!   verbatim.
//! * **All museums** — one [`SourceCursor`] per museum.  Each round asks
//!   every non-exhausted museum for its next page in parallel, shuffles the
//!   new batch, drops ids already shown and appends the rest.
//!
//! ## Stale responses
//!
//! Every reset bumps a generation counter and every plan carries the
//! generation it was issued under.  Outcomes from an older generation are
//! discarded, so a slow response for a museum the user has already switched
//! away from cannot overwrite the current list.

pub mod shuffle;
pub mod sort;

use std::collections::{BTreeMap, HashSet};

use crate::catalog::{per_source_page_size, SourceSelection};
use crate::error::FetchError;
use crate::source::{Artwork, Page, SourceId};

use shuffle::Shuffler;

/// Lifecycle of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    InitialLoading,
    Ready,
    LoadingMore,
    Failed(FetchError),
}

/// Pagination bookkeeping for one museum in the combined feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCursor {
    pub next_page: u32,
    pub exhausted: bool,
}

impl Default for SourceCursor {
    fn default() -> Self {
        Self {
            next_page: 1,
            exhausted: false,
        }
    }
}

impl SourceCursor {
    /// Move past a page the museum has just served.
    fn advance(&mut self, page: &Page) {
        self.next_page = page.current_page + 1;
        self.exhausted = !page.has_next();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    More,
}

/// One page request inside a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTarget {
    pub source: SourceId,
    pub page: u32,
    pub page_size: u32,
}

/// Requests the controller wants executed, all in parallel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub generation: u64,
    pub kind: LoadKind,
    pub targets: Vec<PageTarget>,
}

/// The joined results of a [`FetchPlan`], one entry per target.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub generation: u64,
    pub kind: LoadKind,
    pub results: Vec<(SourceId, Result<Page, FetchError>)>,
}

/// What applying an outcome did, for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Issued under an older generation; ignored.
    Stale,
    /// The feed is ready.  `failures` lists museums that did not answer this
    /// round; their cursors are untouched so the next round retries them.
    Loaded {
        added: usize,
        failures: Vec<FetchError>,
    },
    /// The initial load failed; the feed is in [`FeedStatus::Failed`].
    Failed(FetchError),
}

/// Page metadata of the single-museum feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_records: u64,
}

pub struct FeedController {
    selection: SourceSelection,
    page_size: u32,
    status: FeedStatus,
    generation: u64,
    records: Vec<Artwork>,
    seen: HashSet<String>,
    cursors: BTreeMap<SourceId, SourceCursor>,
    /// Last reported total per museum; the combined total is their sum.
    totals: BTreeMap<SourceId, u64>,
    page: Option<PageInfo>,
    shuffler: Box<dyn Shuffler>,
}

impl FeedController {
    pub fn new(selection: SourceSelection, page_size: u32, shuffler: Box<dyn Shuffler>) -> Self {
        Self {
            selection,
            page_size: page_size.max(1),
            status: FeedStatus::Idle,
            generation: 0,
            records: Vec::new(),
            seen: HashSet::new(),
            cursors: BTreeMap::new(),
            totals: BTreeMap::new(),
            page: None,
            shuffler,
        }
    }

    // -- accessors -----------------------------------------------------------

    pub fn selection(&self) -> SourceSelection {
        self.selection
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    /// Accumulated records in arrival order.
    pub fn records(&self) -> &[Artwork] {
        &self.records
    }

    pub fn cursor(&self, source: SourceId) -> Option<SourceCursor> {
        self.cursors.get(&source).copied()
    }

    pub fn page_info(&self) -> Option<PageInfo> {
        self.page
    }

    /// Total matching records as reported upstream.  In the combined feed
    /// this is the sum of both museums' totals, a display estimate only.
    pub fn approximate_total(&self) -> u64 {
        match self.selection {
            SourceSelection::All => self.totals.values().sum(),
            SourceSelection::Only(_) => self.page.map_or(0, |p| p.total_records),
        }
    }

    /// Whether a further load-more could return anything.
    pub fn has_more(&self) -> bool {
        match self.selection {
            SourceSelection::All => self.cursors.values().any(|c| !c.exhausted),
            SourceSelection::Only(_) => self
                .page
                .is_some_and(|p| p.current_page < p.total_pages),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.status,
            FeedStatus::InitialLoading | FeedStatus::LoadingMore
        )
    }

    // -- transitions ---------------------------------------------------------

    /// Drop everything and begin a fresh initial load.
    pub fn start(&mut self) -> FetchPlan {
        self.generation += 1;
        self.records.clear();
        self.seen.clear();
        self.totals.clear();
        self.page = None;
        self.cursors.clear();
        if self.selection == SourceSelection::All {
            for source in SourceId::ALL {
                self.cursors.insert(source, SourceCursor::default());
            }
        }
        self.status = FeedStatus::InitialLoading;
        log::info!(
            "[feed] initial load for {} (generation {})",
            self.selection,
            self.generation
        );

        let targets = match self.selection {
            SourceSelection::Only(source) => vec![PageTarget {
                source,
                page: 1,
                page_size: self.page_size,
            }],
            SourceSelection::All => {
                let share = per_source_page_size(self.page_size);
                SourceId::ALL
                    .into_iter()
                    .map(|source| PageTarget {
                        source,
                        page: 1,
                        page_size: share,
                    })
                    .collect()
            }
        };
        self.plan(LoadKind::Initial, targets)
    }

    /// Switch museums.  The list is cleared immediately.
    pub fn select_source(&mut self, selection: SourceSelection) -> FetchPlan {
        self.selection = selection;
        self.start()
    }

    /// Re-run the initial load after a failure.  No-op in any other state.
    pub fn retry(&mut self) -> Option<FetchPlan> {
        matches!(self.status, FeedStatus::Failed(_)).then(|| self.start())
    }

    /// Ask for the next batch.
    ///
    /// Returns `None` (and sends nothing) when another load is in flight,
    /// the feed is not ready, or no museum has anything left.
    pub fn load_more(&mut self) -> Option<FetchPlan> {
        if self.status != FeedStatus::Ready {
            log::debug!("[feed] load-more dropped in state {:?}", self.status);
            return None;
        }

        let targets: Vec<PageTarget> = match self.selection {
            SourceSelection::Only(source) => {
                let page = self.page?;
                if page.current_page >= page.total_pages {
                    return None;
                }
                vec![PageTarget {
                    source,
                    page: page.current_page + 1,
                    page_size: self.page_size,
                }]
            }
            SourceSelection::All => {
                let share = per_source_page_size(self.page_size);
                self.cursors
                    .iter()
                    .filter(|(_, cursor)| !cursor.exhausted)
                    .map(|(&source, cursor)| PageTarget {
                        source,
                        page: cursor.next_page,
                        page_size: share,
                    })
                    .collect()
            }
        };
        if targets.is_empty() {
            return None;
        }

        self.status = FeedStatus::LoadingMore;
        Some(self.plan(LoadKind::More, targets))
    }

    /// Fold a finished plan back into the feed.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Applied {
        if outcome.generation != self.generation {
            log::debug!(
                "[feed] dropping stale outcome (generation {} != {})",
                outcome.generation,
                self.generation
            );
            return Applied::Stale;
        }
        let expected = match outcome.kind {
            LoadKind::Initial => FeedStatus::InitialLoading,
            LoadKind::More => FeedStatus::LoadingMore,
        };
        if self.status != expected {
            return Applied::Stale;
        }

        match (self.selection, outcome.kind) {
            (SourceSelection::Only(_), LoadKind::Initial) => self.apply_single_initial(outcome),
            (SourceSelection::Only(_), LoadKind::More) => self.apply_single_more(outcome),
            (SourceSelection::All, kind) => self.apply_combined(kind, outcome),
        }
    }

    // -- internals -----------------------------------------------------------

    fn plan(&self, kind: LoadKind, targets: Vec<PageTarget>) -> FetchPlan {
        FetchPlan {
            generation: self.generation,
            kind,
            targets,
        }
    }

    fn apply_single_initial(&mut self, outcome: FetchOutcome) -> Applied {
        match single_result(outcome) {
            Ok(page) => {
                self.page = Some(page_info(&page));
                let added = page.records.len();
                self.append_verbatim(page.records);
                self.status = FeedStatus::Ready;
                Applied::Loaded {
                    added,
                    failures: Vec::new(),
                }
            }
            Err(err) => {
                log::warn!("[feed] initial load failed: {err}");
                self.status = FeedStatus::Failed(err.clone());
                Applied::Failed(err)
            }
        }
    }

    fn apply_single_more(&mut self, outcome: FetchOutcome) -> Applied {
        self.status = FeedStatus::Ready;
        match single_result(outcome) {
            Ok(page) => {
                self.page = Some(page_info(&page));
                let added = page.records.len();
                self.append_verbatim(page.records);
                Applied::Loaded {
                    added,
                    failures: Vec::new(),
                }
            }
            Err(err) => {
                log::warn!("[feed] load-more failed: {err}");
                Applied::Loaded {
                    added: 0,
                    failures: vec![err],
                }
            }
        }
    }

    fn apply_combined(&mut self, kind: LoadKind, outcome: FetchOutcome) -> Applied {
        let mut batch = Vec::new();
        let mut failures = Vec::new();
        let attempted = outcome.results.len();

        for (source, result) in outcome.results {
            match result {
                Ok(page) => {
                    self.cursors.entry(source).or_default().advance(&page);
                    self.totals.insert(source, page.total_records);
                    batch.extend(page.records);
                }
                Err(err) => {
                    if matches!(err, FetchError::MissingCredential { .. }) {
                        // Without a key the museum can never answer.
                        self.cursors.entry(source).or_default().exhausted = true;
                    }
                    log::warn!("[feed] {source} failed: {err}");
                    failures.push(err);
                }
            }
        }

        if kind == LoadKind::Initial && failures.len() == attempted {
            let err = FetchError::Aggregate { errors: failures };
            self.status = FeedStatus::Failed(err.clone());
            return Applied::Failed(err);
        }

        self.shuffler.shuffle(&mut batch);
        let before = self.records.len();
        for art in batch {
            if self.seen.insert(art.id.clone()) {
                self.records.push(art);
            }
        }
        self.status = FeedStatus::Ready;
        Applied::Loaded {
            added: self.records.len() - before,
            failures,
        }
    }

    fn append_verbatim(&mut self, records: Vec<Artwork>) {
        for art in &records {
            self.seen.insert(art.id.clone());
        }
        self.records.extend(records);
    }
}

fn page_info(page: &Page) -> PageInfo {
    PageInfo {
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_records: page.total_records,
    }
}

fn single_result(outcome: FetchOutcome) -> Result<Page, FetchError> {
    outcome
        .results
        .into_iter()
        .next()
        .map(|(_, result)| result)
        .unwrap_or(Err(FetchError::Aggregate { errors: Vec::new() }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
