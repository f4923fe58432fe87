//! Museum source abstraction layer.
//!
//! This module defines the [`ArtworkSource`] trait and the common data
//! types in [`artwork`].  Concrete adapters live in sub-modules: [`aic`]
//! for the Art Institute of Chicago and [`harvard`] for Harvard Art
//! Museums.
//!
//! ## For contributors — adding a new museum
//!
//! 1. Add a variant to [`SourceId`].
//! 2. Create a new file in this directory, define a struct holding the
//!    base URL, HTTP client and any credentials, and implement
//!    [`ArtworkSource`] for it.
//! 3. Keep the JSON mapping in pure `parse_*` functions so it can be tested
//!    on fixtures.
//! 4. Register it in [`Catalog`](crate::catalog::Catalog).
//!
//! Pagination, de-duplication, interleaving and the UI are source-agnostic.

pub mod aic;
mod artwork;
pub mod harvard;

pub use aic::AicSource;
pub use artwork::{split_tagged_id, tag_id, Artwork, ArtworkDetail, Page, SourceId};
pub use harvard::HarvardSource;

pub(crate) use artwork::non_blank;
#[cfg(test)]
pub(crate) use artwork::tests::make_artwork;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult};

/// Trait that every museum adapter implements.
///
/// Calls are issued from tokio tasks, possibly two at once, so
/// implementations must be `Send + Sync`.
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    /// Which museum this adapter talks to.
    fn id(&self) -> SourceId;

    /// Whether the adapter can issue requests at all.  An adapter that
    /// returns `false` fails every call with
    /// [`FetchError::MissingCredential`] without touching the network.
    fn is_available(&self) -> bool {
        true
    }

    /// Fetch one page of the museum's collection.
    ///
    /// `page` is 1-based; both arguments are at least 1.
    async fn fetch_page(&self, page: u32, page_size: u32) -> FetchResult<Page>;

    /// Fetch the full record for one native id.
    async fn fetch_detail(&self, native_id: &str) -> FetchResult<ArtworkDetail>;
}

/// Build the shared HTTP client used by the adapters.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("artfeed/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Send a GET request and decode its JSON body.
///
/// Any non-success status becomes [`FetchError::Upstream`]; a 404 on a
/// detail lookup is turned into [`FetchError::NotFound`] by passing
/// `not_found_id`.
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    source_id: SourceId,
    request: reqwest::RequestBuilder,
    not_found_id: Option<&str>,
) -> FetchResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::transport(source_id, e))?;

    let status = response.status();
    if !status.is_success() {
        log::warn!("[{source_id}] upstream returned {status}");
        return Err(match not_found_id {
            Some(id) if status == reqwest::StatusCode::NOT_FOUND => FetchError::NotFound {
                id: tag_id(source_id, id),
            },
            _ => FetchError::Upstream {
                source_id,
                status: status.as_u16(),
            },
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::transport(source_id, e))?;
    serde_json::from_slice(&body).map_err(|e| FetchError::decode(source_id, e))
}

/// Pages reported by an upstream are clamped so `total_pages >= 1` and
/// `current_page >= 1`, whatever the API says about an empty collection.
pub(crate) fn clamp_pagination(current_page: u32, total_pages: u32) -> (u32, u32) {
    (current_page.max(1), total_pages.max(1))
}
