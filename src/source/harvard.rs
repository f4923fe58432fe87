//! Harvard Art Museums source.
//!
//! The API requires a key passed as the `apikey` query parameter.  A source
//! built without one stays registered but reports itself unavailable and
//! fails every call with [`FetchError::MissingCredential`] before any
//! request is built, so the combined feed can carry on with the other
//! museum.

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    clamp_pagination, get_json, non_blank, tag_id, Artwork, ArtworkDetail, ArtworkSource, Page,
    SourceId,
};
use crate::error::{FetchError, FetchResult};

pub const DEFAULT_BASE_URL: &str = "https://api.harvardartmuseums.org";

const LIST_FIELDS: &str = "id,title,people,primaryimageurl,images";

/// Appended to image URLs so the image server returns a screen-sized
/// rendition rather than the full-resolution scan.
const IMAGE_SIZE_HINT: &str = "height=600";

/// A Harvard Art Museums data source.
pub struct HarvardSource {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HarvardSource {
    /// Create a new Harvard source.  A blank `api_key` counts as absent.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: non_blank(api_key),
            client,
        }
    }

    fn api_key(&self) -> FetchResult<&str> {
        self.api_key
            .as_deref()
            .ok_or(FetchError::MissingCredential {
                source_id: SourceId::Harvard,
            })
    }

    /// Map an already-fetched list response into a [`Page`].
    pub fn parse_page(response: ListResponse) -> Page {
        let records = response.records.into_iter().map(to_artwork).collect();
        let (current_page, total_pages) =
            clamp_pagination(response.info.page, response.info.pages);
        Page {
            records,
            current_page,
            total_pages,
            total_records: response.info.totalrecords,
        }
    }

    /// Map an already-fetched object record into an [`ArtworkDetail`].
    pub fn parse_detail(mut object: Object) -> ArtworkDetail {
        let description = non_blank(object.description.take());
        let dimensions = non_blank(object.dimensions.take());
        let date = non_blank(object.dated.take());
        let medium = non_blank(object.medium.take());
        let origin_url = non_blank(object.url.take());
        ArtworkDetail {
            artwork: to_artwork(object),
            description,
            dimensions,
            date,
            medium,
            origin_url,
        }
    }
}

#[async_trait]
impl ArtworkSource for HarvardSource {
    fn id(&self) -> SourceId {
        SourceId::Harvard
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_page(&self, page: u32, page_size: u32) -> FetchResult<Page> {
        let key = self.api_key()?;
        log::debug!("[harvard] fetching page {page} (size {page_size})");
        let request = self.client.get(format!("{}/object", self.base_url)).query(&[
            ("apikey", key.to_string()),
            ("page", page.to_string()),
            ("size", page_size.to_string()),
            ("hasimage", "1".to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ]);
        let response: ListResponse = get_json(SourceId::Harvard, request, None).await?;
        Ok(Self::parse_page(response))
    }

    async fn fetch_detail(&self, native_id: &str) -> FetchResult<ArtworkDetail> {
        let key = self.api_key()?;
        log::debug!("[harvard] fetching object {native_id}");
        let request = self
            .client
            .get(format!("{}/object/{}", self.base_url, native_id))
            .query(&[("apikey", key)]);
        let object: Object = get_json(SourceId::Harvard, request, Some(native_id)).await?;
        Ok(Self::parse_detail(object))
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListResponse {
    info: Info,
    #[serde(default)]
    records: Vec<Object>,
}

#[derive(Debug, Deserialize)]
struct Info {
    #[serde(default)]
    totalrecords: u64,
    #[serde(default)]
    pages: u32,
    #[serde(default = "first_page")]
    page: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct Object {
    id: u64,
    title: Option<String>,
    #[serde(default)]
    people: Vec<Person>,
    primaryimageurl: Option<String>,
    #[serde(default)]
    images: Vec<Image>,
    description: Option<String>,
    dimensions: Option<String>,
    dated: Option<String>,
    medium: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Person {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Image {
    baseimageurl: Option<String>,
}

fn to_artwork(object: Object) -> Artwork {
    let creator = object
        .people
        .into_iter()
        .find_map(|p| non_blank(p.name));
    let image = non_blank(object.primaryimageurl).or_else(|| {
        object
            .images
            .into_iter()
            .find_map(|img| non_blank(img.baseimageurl))
    });
    Artwork {
        id: tag_id(SourceId::Harvard, object.id),
        title: non_blank(object.title).unwrap_or_else(|| "(untitled)".to_string()),
        creator,
        image_url: image.map(|url| with_size_hint(&url)),
        source: SourceId::Harvard,
    }
}

fn with_size_hint(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{IMAGE_SIZE_HINT}")
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
          "info": {"totalrecordsperquery": 2, "totalrecords": 9, "pages": 5, "page": 2},
          "records": [
            {"id": 299843, "title": "Self-Portrait", "people": [{"name": "Vincent van Gogh", "role": "Artist"}],
             "primaryimageurl": "https://nrs.harvard.edu/urn-3:HUAM:DDC251942", "images": []},
            {"id": 12, "title": "Bowl", "people": [],
             "primaryimageurl": null, "images": [{"baseimageurl": "https://nrs.harvard.edu/urn-3:HUAM:X1"}]}
          ]
        }"#;

        let page = HarvardSource::parse_page(serde_json::from_str(json).unwrap());

        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.total_records, 9);
        assert!(page.has_next());

        let first = &page.records[0];
        assert_eq!(first.id, "harvard-299843");
        assert_eq!(first.creator.as_deref(), Some("Vincent van Gogh"));
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://nrs.harvard.edu/urn-3:HUAM:DDC251942?height=600")
        );

        let second = &page.records[1];
        assert!(second.creator.is_none());
        assert_eq!(
            second.image_url.as_deref(),
            Some("https://nrs.harvard.edu/urn-3:HUAM:X1?height=600"),
            "falls back to the first gallery image"
        );
    }

    #[test]
    fn record_without_images_has_no_url() {
        let json = r#"{"info": {"totalrecords": 1, "pages": 1, "page": 1},
                       "records": [{"id": 1, "title": null}]}"#;
        let page = HarvardSource::parse_page(serde_json::from_str(json).unwrap());
        assert_eq!(page.records[0].title, "(untitled)");
        assert!(page.records[0].image_url.is_none());
    }

    #[test]
    fn size_hint_respects_existing_query() {
        assert_eq!(with_size_hint("https://a/b?x=1"), "https://a/b?x=1&height=600");
        assert_eq!(with_size_hint("https://a/b"), "https://a/b?height=600");
    }

    #[test]
    fn parse_detail_maps_optional_fields() {
        let json = r#"{
          "id": 299843, "title": "Self-Portrait",
          "people": [{"name": "Vincent van Gogh"}],
          "primaryimageurl": "https://img/1",
          "description": null, "dimensions": "61.5 x 50.3 cm", "dated": "1887",
          "medium": "Oil on canvas", "url": "https://harvardartmuseums.org/collections/object/299843"
        }"#;

        let detail = HarvardSource::parse_detail(serde_json::from_str(json).unwrap());

        assert_eq!(detail.artwork.id, "harvard-299843");
        assert!(detail.description.is_none());
        assert_eq!(detail.dimensions.as_deref(), Some("61.5 x 50.3 cm"));
        assert_eq!(detail.date.as_deref(), Some("1887"));
        assert_eq!(detail.medium.as_deref(), Some("Oil on canvas"));
        assert_eq!(
            detail.origin_url.as_deref(),
            Some("https://harvardartmuseums.org/collections/object/299843")
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        // Unroutable base URL: reaching the network would surface as a
        // transport error rather than the credential error asserted here.
        let src = HarvardSource::new("http://127.0.0.1:9", Some("  ".into()), reqwest::Client::new());
        assert!(!src.is_available());

        let err = src.fetch_page(1, 10).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::MissingCredential {
                source_id: SourceId::Harvard
            }
        );
        let err = src.fetch_detail("1").await.unwrap_err();
        assert!(matches!(err, FetchError::MissingCredential { .. }));
    }
}
