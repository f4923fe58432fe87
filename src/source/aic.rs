//! Art Institute of Chicago source.
//!
//! Talks to the public `api.artic.edu` collection API.  No key is needed.
//! Images are served through the museum's IIIF server, so the list and
//! detail responses only carry an `image_id`; the URL is assembled from the
//! `config.iiif_url` block that accompanies every response.

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    clamp_pagination, get_json, non_blank, tag_id, Artwork, ArtworkDetail, ArtworkSource, Page,
    SourceId,
};
use crate::error::FetchResult;

pub const DEFAULT_BASE_URL: &str = "https://api.artic.edu/api/v1";

/// Used when a response omits its `config` block.
const DEFAULT_IIIF_URL: &str = "https://www.artic.edu/iiif/2";

const LIST_FIELDS: &str = "id,title,artist_title,image_id";
const DETAIL_FIELDS: &str =
    "id,title,artist_title,artist_display,image_id,description,dimensions,date_display,medium_display";

/// An Art Institute of Chicago data source.
pub struct AicSource {
    base_url: String,
    client: reqwest::Client,
}

impl AicSource {
    /// Create a new AIC source.
    ///
    /// * `base_url` — API root without a trailing slash (normally
    ///   [`DEFAULT_BASE_URL`]).
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Map an already-fetched list response into a [`Page`].
    pub fn parse_page(response: ListResponse) -> Page {
        let iiif = iiif_base(response.config.as_ref());
        let records = response
            .data
            .into_iter()
            .map(|art| Artwork {
                id: tag_id(SourceId::Aic, art.id),
                title: title_or_untitled(art.title),
                creator: non_blank(art.artist_title),
                image_url: image_url(iiif, art.image_id),
                source: SourceId::Aic,
            })
            .collect();

        let (current_page, total_pages) = clamp_pagination(
            response.pagination.current_page,
            response.pagination.total_pages,
        );
        Page {
            records,
            current_page,
            total_pages,
            total_records: response.pagination.total,
        }
    }

    /// Map an already-fetched detail response into an [`ArtworkDetail`].
    pub fn parse_detail(response: DetailResponse) -> ArtworkDetail {
        let iiif = iiif_base(response.config.as_ref());
        let art = response.data;
        ArtworkDetail {
            artwork: Artwork {
                id: tag_id(SourceId::Aic, art.id),
                title: title_or_untitled(art.title),
                creator: non_blank(art.artist_title).or_else(|| non_blank(art.artist_display)),
                image_url: image_url(iiif, art.image_id),
                source: SourceId::Aic,
            },
            description: non_blank(art.description),
            dimensions: non_blank(art.dimensions),
            date: non_blank(art.date_display),
            medium: non_blank(art.medium_display),
            origin_url: Some(format!("https://www.artic.edu/artworks/{}", art.id)),
        }
    }
}

#[async_trait]
impl ArtworkSource for AicSource {
    fn id(&self) -> SourceId {
        SourceId::Aic
    }

    async fn fetch_page(&self, page: u32, page_size: u32) -> FetchResult<Page> {
        log::debug!("[aic] fetching page {page} (limit {page_size})");
        let request = self.client.get(format!("{}/artworks", self.base_url)).query(&[
            ("page", page.to_string()),
            ("limit", page_size.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ]);
        let response: ListResponse = get_json(SourceId::Aic, request, None).await?;
        Ok(Self::parse_page(response))
    }

    async fn fetch_detail(&self, native_id: &str) -> FetchResult<ArtworkDetail> {
        log::debug!("[aic] fetching artwork {native_id}");
        let request = self
            .client
            .get(format!("{}/artworks/{}", self.base_url, native_id))
            .query(&[("fields", DETAIL_FIELDS)]);
        let response: DetailResponse = get_json(SourceId::Aic, request, Some(native_id)).await?;
        Ok(Self::parse_detail(response))
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pagination: Pagination,
    #[serde(default)]
    data: Vec<ListArtwork>,
    config: Option<ApiConfig>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    total_pages: u32,
    #[serde(default = "first_page")]
    current_page: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct ListArtwork {
    id: u64,
    title: Option<String>,
    artist_title: Option<String>,
    image_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    data: DetailArtwork,
    config: Option<ApiConfig>,
}

#[derive(Debug, Deserialize)]
struct DetailArtwork {
    id: u64,
    title: Option<String>,
    artist_title: Option<String>,
    artist_display: Option<String>,
    image_id: Option<String>,
    description: Option<String>,
    dimensions: Option<String>,
    date_display: Option<String>,
    medium_display: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiConfig {
    iiif_url: Option<String>,
}

fn iiif_base(config: Option<&ApiConfig>) -> &str {
    config
        .and_then(|c| c.iiif_url.as_deref())
        .unwrap_or(DEFAULT_IIIF_URL)
}

/// IIIF image API: full region, 843px wide (the size the museum's own site
/// serves), no rotation, default quality.
fn image_url(iiif_base: &str, image_id: Option<String>) -> Option<String> {
    non_blank(image_id).map(|id| format!("{iiif_base}/{id}/full/843,/0/default.jpg"))
}

fn title_or_untitled(title: Option<String>) -> String {
    non_blank(title).unwrap_or_else(|| "(untitled)".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_page_extracts_records_and_pagination() {
        let json = r#"{
          "pagination": {"total": 120, "limit": 2, "offset": 0, "total_pages": 60, "current_page": 1},
          "data": [
            {"id": 27992, "title": "A Sunday on La Grande Jatte", "artist_title": "Georges Seurat", "image_id": "2d484387"},
            {"id": 28560, "title": "The Bedroom", "artist_title": null, "image_id": null}
          ],
          "config": {"iiif_url": "https://www.artic.edu/iiif/2"}
        }"#;

        let page = AicSource::parse_page(serde_json::from_str(json).unwrap());

        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 60);
        assert_eq!(page.total_records, 120);
        assert_eq!(page.records.len(), 2);

        let first = &page.records[0];
        assert_eq!(first.id, "aic-27992");
        assert_eq!(first.creator.as_deref(), Some("Georges Seurat"));
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://www.artic.edu/iiif/2/2d484387/full/843,/0/default.jpg")
        );
        assert_eq!(first.source, SourceId::Aic);

        let second = &page.records[1];
        assert!(second.creator.is_none());
        assert!(second.image_url.is_none());
    }

    #[test]
    fn missing_title_and_config_fall_back() {
        let json = r#"{
          "pagination": {"total": 1, "total_pages": 1, "current_page": 1},
          "data": [{"id": 1, "title": "", "artist_title": "", "image_id": "abc"}]
        }"#;

        let page = AicSource::parse_page(serde_json::from_str(json).unwrap());

        assert_eq!(page.records[0].title, "(untitled)");
        assert!(page.records[0].creator.is_none(), "blank maps to None");
        assert!(page.records[0]
            .image_url
            .as_deref()
            .unwrap()
            .starts_with(DEFAULT_IIIF_URL));
    }

    #[test]
    fn empty_collection_reports_one_page() {
        let json = r#"{"pagination": {"total": 0, "total_pages": 0, "current_page": 1}, "data": []}"#;
        let page = AicSource::parse_page(serde_json::from_str(json).unwrap());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
    }

    #[test]
    fn parse_detail_maps_optional_fields() {
        let json = r#"{
          "data": {
            "id": 27992,
            "title": "A Sunday on La Grande Jatte",
            "artist_title": null,
            "artist_display": "Georges Seurat\nFrench, 1859-1891",
            "image_id": "2d484387",
            "description": "<p>Pointillism.</p>",
            "dimensions": "207.5 × 308.1 cm",
            "date_display": "1884-86",
            "medium_display": null
          },
          "config": {"iiif_url": "https://iiif.example"}
        }"#;

        let detail = AicSource::parse_detail(serde_json::from_str(json).unwrap());

        assert_eq!(detail.artwork.id, "aic-27992");
        assert_eq!(
            detail.artwork.creator.as_deref(),
            Some("Georges Seurat\nFrench, 1859-1891")
        );
        assert_eq!(detail.description.as_deref(), Some("<p>Pointillism.</p>"));
        assert_eq!(detail.date.as_deref(), Some("1884-86"));
        assert!(detail.medium.is_none());
        assert_eq!(
            detail.origin_url.as_deref(),
            Some("https://www.artic.edu/artworks/27992")
        );
        assert!(detail
            .artwork
            .image_url
            .unwrap()
            .starts_with("https://iiif.example/2d484387/"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let src = AicSource::new("https://api.example/v1/", reqwest::Client::new());
        assert_eq!(src.base_url, "https://api.example/v1");
        assert_eq!(src.id(), SourceId::Aic);
        assert!(src.is_available());
    }
}
