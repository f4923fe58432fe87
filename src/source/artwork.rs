//! The normalised data types shared by every museum source.
//!
//! `Artwork` is one entry in the feed, whichever API it came from.  Each
//! source adapter converts its native JSON into these structs so the rest of
//! the application (pagination, de-duplication, sorting, favourites,
//! rendering) never has to know which museum produced a record.
//!
//! ## Ids
//!
//! Native ids are only unique inside one museum, so every record carries a
//! *tagged id* of the form `"<source>-<native id>"` (for example
//! `aic-27992` or `harvard-299843`).  Tagged ids are built by
//! [`tag_id`] and taken apart by [`split_tagged_id`]; both are pure, so the
//! same `(source, native id)` pair always yields the same tagged id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, FetchResult};

/// One upstream museum API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// Art Institute of Chicago.
    Aic,
    /// Harvard Art Museums.
    Harvard,
}

impl SourceId {
    /// Every source, in a fixed order.
    pub const ALL: [SourceId; 2] = [SourceId::Aic, SourceId::Harvard];

    /// The tag used in tagged ids and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::Aic => "aic",
            SourceId::Harvard => "harvard",
        }
    }

    /// Human-readable museum name.
    pub fn label(self) -> &'static str {
        match self {
            SourceId::Aic => "Art Institute of Chicago",
            SourceId::Harvard => "Harvard Art Museums",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "aic" | "chicago" => Ok(SourceId::Aic),
            "harvard" => Ok(SourceId::Harvard),
            _ => Err(anyhow::anyhow!(
                "Invalid source '{s}'. Valid options: aic, harvard"
            )),
        }
    }
}

/// Build the globally unique id for a record.
pub fn tag_id(source: SourceId, native_id: impl fmt::Display) -> String {
    format!("{}-{}", source.as_str(), native_id)
}

/// Split a tagged id at its first `-` into the source and the native id.
///
/// Both museums use integer ids, so a native id must be all ASCII digits;
/// anything else would end up as extra path segments in the request URL.
pub fn split_tagged_id(tagged_id: &str) -> FetchResult<(SourceId, &str)> {
    let invalid = || FetchError::InvalidId {
        id: tagged_id.to_string(),
    };
    let (prefix, native) = tagged_id.split_once('-').ok_or_else(invalid)?;
    if native.is_empty() || !native.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let source = SourceId::ALL
        .into_iter()
        .find(|s| s.as_str() == prefix)
        .ok_or_else(invalid)?;
    Ok((source, native))
}

/// A single artwork, normalised from any source.
///
/// Optional fields are `None` when the upstream did not provide them; an
/// adapter never substitutes an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    /// Tagged id, see [`tag_id`].
    pub id: String,

    /// Display title.
    pub title: String,

    /// Artist or maker, if the museum records one.
    pub creator: Option<String>,

    /// A directly loadable image URL.
    pub image_url: Option<String>,

    /// Which museum the record came from.
    pub source: SourceId,
}

/// An artwork together with the fields only the detail endpoints return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkDetail {
    #[serde(flatten)]
    pub artwork: Artwork,

    /// Free text, possibly containing HTML markup.
    pub description: Option<String>,
    pub dimensions: Option<String>,
    /// Display date as the museum writes it ("c. 1885", "1503-1519").
    pub date: Option<String>,
    pub medium: Option<String>,
    /// The museum's own web page for the object.
    pub origin_url: Option<String>,
}

/// One page of results plus the pagination metadata the source reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub records: Vec<Artwork>,
    /// 1-based.
    pub current_page: u32,
    /// Always at least 1, even for an empty result.
    pub total_pages: u32,
    pub total_records: u64,
}

impl Page {
    /// Whether a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Turn empty or whitespace-only strings into `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Shorthand constructor for tests across the crate.
    pub fn make_artwork(source: SourceId, native: u32, title: &str, creator: Option<&str>) -> Artwork {
        Artwork {
            id: tag_id(source, native),
            title: title.to_string(),
            creator: creator.map(String::from),
            image_url: None,
            source,
        }
    }

    #[test]
    fn tag_id_is_stable() {
        assert_eq!(tag_id(SourceId::Aic, 27992), "aic-27992");
        assert_eq!(tag_id(SourceId::Aic, 27992), tag_id(SourceId::Aic, "27992"));
        assert_eq!(tag_id(SourceId::Harvard, 1), "harvard-1");
    }

    #[test]
    fn split_routes_on_first_separator() {
        assert_eq!(split_tagged_id("aic-27992").unwrap(), (SourceId::Aic, "27992"));
        assert_eq!(
            split_tagged_id("harvard-299843").unwrap(),
            (SourceId::Harvard, "299843")
        );
    }

    #[test]
    fn split_rejects_malformed_ids() {
        for bad in [
            "",
            "aic",
            "aic-",
            "moma-1",
            "-1",
            "AIC1",
            "harvard-12-b",
            "aic-1/manifest",
            "aic-1?fields=x",
            "aic-abc",
        ] {
            assert_eq!(
                split_tagged_id(bad),
                Err(FetchError::InvalidId { id: bad.to_string() }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn source_id_parses_case_insensitively() {
        assert_eq!("AIC".parse::<SourceId>().unwrap(), SourceId::Aic);
        assert_eq!("Harvard".parse::<SourceId>().unwrap(), SourceId::Harvard);
        assert!("louvre".parse::<SourceId>().is_err());
    }

    #[test]
    fn artwork_serialises_with_camel_case_keys() {
        let art = Artwork {
            image_url: Some("https://img/1.jpg".into()),
            ..make_artwork(SourceId::Harvard, 7, "Study", None)
        };
        let json = serde_json::to_value(&art).unwrap();
        assert_eq!(json["imageUrl"], "https://img/1.jpg");
        assert_eq!(json["source"], "harvard");
        assert!(json["creator"].is_null());

        let back: Artwork = serde_json::from_value(json).unwrap();
        assert_eq!(back, art);
    }

    #[test]
    fn non_blank_drops_empty_strings() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some("x".into())), Some("x".into()));
        assert_eq!(non_blank(None), None);
    }
}
