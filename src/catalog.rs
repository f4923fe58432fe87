//! The unified fetch façade.
//!
//! [`Catalog`] is the only thing the presentation layer talks to.  It owns
//! one adapter per museum and hides them behind two calls:
//!
//! * [`get_artworks`](Catalog::get_artworks) — a page for one museum, or a
//!   merged first page across both;
//! * [`get_artwork_details`](Catalog::get_artwork_details) — one record by
//!   tagged id, routed to the museum named in the id's prefix.
//!
//! The feed controller additionally uses [`source_page`](Catalog::source_page)
//! to drive each museum's pagination on its own.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::error::{FetchError, FetchResult};
use crate::feed::shuffle::Shuffler;
use crate::source::{split_tagged_id, Artwork, ArtworkDetail, ArtworkSource, Page, SourceId};

/// Fraction of the requested page size asked of each museum when both are
/// combined, so two responses together land near the requested size.
pub const ALL_SOURCES_SHARE: f64 = 0.6;

/// Which museum(s) a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceSelection {
    #[default]
    All,
    Only(SourceId),
}

impl SourceSelection {
    /// The cycle order used by the UI: all, then each museum.
    pub fn next(self) -> Self {
        match self {
            SourceSelection::All => SourceSelection::Only(SourceId::Aic),
            SourceSelection::Only(SourceId::Aic) => SourceSelection::Only(SourceId::Harvard),
            SourceSelection::Only(SourceId::Harvard) => SourceSelection::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceSelection::All => "All museums",
            SourceSelection::Only(source) => source.label(),
        }
    }
}

impl fmt::Display for SourceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelection::All => f.write_str("all"),
            SourceSelection::Only(source) => source.fmt(f),
        }
    }
}

impl FromStr for SourceSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(SourceSelection::All);
        }
        s.parse::<SourceId>()
            .map(SourceSelection::Only)
            .map_err(|_| anyhow::anyhow!("Invalid source '{s}'. Valid options: all, aic, harvard"))
    }
}

/// Page size asked of each museum when both are combined.
pub fn per_source_page_size(page_size: u32) -> u32 {
    ((f64::from(page_size) * ALL_SOURCES_SHARE).ceil() as u32).max(1)
}

pub struct Catalog {
    aic: Arc<dyn ArtworkSource>,
    harvard: Arc<dyn ArtworkSource>,
    shuffler: Mutex<Box<dyn Shuffler>>,
}

impl Catalog {
    pub fn new(
        aic: Arc<dyn ArtworkSource>,
        harvard: Arc<dyn ArtworkSource>,
        shuffler: Box<dyn Shuffler>,
    ) -> Self {
        Self {
            aic,
            harvard,
            shuffler: Mutex::new(shuffler),
        }
    }

    fn source(&self, id: SourceId) -> &Arc<dyn ArtworkSource> {
        match id {
            SourceId::Aic => &self.aic,
            SourceId::Harvard => &self.harvard,
        }
    }

    pub fn is_available(&self, id: SourceId) -> bool {
        self.source(id).is_available()
    }

    /// One page straight from one museum, metadata untouched.
    pub async fn source_page(&self, id: SourceId, page: u32, page_size: u32) -> FetchResult<Page> {
        self.source(id).fetch_page(page.max(1), page_size.max(1)).await
    }

    /// Fetch a page for the given selection.
    ///
    /// For [`SourceSelection::All`] only page 1 exists: both museums are
    /// asked concurrently for a share of `page_size`, one failure is
    /// tolerated, and the combined records are shuffled and truncated.  The
    /// reported totals are an estimate (sum of both museums' totals).
    pub async fn get_artworks(
        &self,
        selection: SourceSelection,
        page: u32,
        page_size: u32,
    ) -> FetchResult<Page> {
        let page_size = page_size.max(1);
        let sources = match selection {
            SourceSelection::Only(source) => return self.source_page(source, page, page_size).await,
            SourceSelection::All => SourceId::ALL,
        };
        if page > 1 {
            return Err(FetchError::UnsupportedPage { page });
        }

        let share = per_source_page_size(page_size);
        let (first, second) = tokio::join!(
            self.source_page(sources[0], 1, share),
            self.source_page(sources[1], 1, share),
        );

        let mut records = Vec::new();
        let mut total_records = 0u64;
        let mut errors = Vec::new();
        for (id, result) in sources.into_iter().zip([first, second]) {
            match result {
                Ok(page) => {
                    total_records += page.total_records;
                    records.extend(page.records);
                }
                Err(err) => {
                    log::warn!("[catalog] {id} failed in combined fetch: {err}");
                    errors.push(err);
                }
            }
        }
        if errors.len() == sources.len() {
            return Err(FetchError::Aggregate { errors });
        }

        self.shuffle(&mut records);
        records.truncate(page_size as usize);

        let total_pages = total_records.div_ceil(u64::from(page_size)).max(1);
        Ok(Page {
            records,
            current_page: 1,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total_records,
        })
    }

    /// Look up one artwork by tagged id.
    pub async fn get_artwork_details(&self, tagged_id: &str) -> FetchResult<ArtworkDetail> {
        let (source, native_id) = split_tagged_id(tagged_id)?;
        self.source(source).fetch_detail(native_id).await
    }

    fn shuffle(&self, records: &mut [Artwork]) {
        match self.shuffler.lock() {
            Ok(mut shuffler) => shuffler.shuffle(records),
            Err(poisoned) => poisoned.into_inner().shuffle(records),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
