//! Client-side ordering of the accumulated feed.
//!
//! Sorting is a view transform only: it never touches the controller's
//! record list or its cursors, and it is re-applied whenever either the
//! list or the settings change.

use std::cmp::Ordering;

use crate::source::Artwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Creator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn label(&self) -> String {
        let field = match self.field {
            SortField::Title => "title",
            SortField::Creator => "artist",
        };
        let arrow = match self.direction {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        };
        format!("{field} {arrow}")
    }

    fn key(&self, art: &Artwork) -> String {
        match self.field {
            SortField::Title => art.title.to_lowercase(),
            SortField::Creator => art.creator.as_deref().unwrap_or("").to_lowercase(),
        }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match self.direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        }
    }
}

/// Return the records in display order.
///
/// `None` keeps arrival order.  The sort is stable, so records with equal
/// keys keep their relative order in both directions.
pub fn sorted<'a>(records: &'a [Artwork], order: Option<SortOrder>) -> Vec<&'a Artwork> {
    let Some(order) = order else {
        return records.iter().collect();
    };
    let mut keyed: Vec<(String, &Artwork)> =
        records.iter().map(|art| (order.key(art), art)).collect();
    keyed.sort_by(|(a, _), (b, _)| order.compare(a, b));
    keyed.into_iter().map(|(_, art)| art).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{make_artwork, SourceId};

    fn sample() -> Vec<Artwork> {
        vec![
            make_artwork(SourceId::Aic, 1, "banana", Some("Zed")),
            make_artwork(SourceId::Aic, 2, "Apple", None),
            make_artwork(SourceId::Harvard, 3, "cherry", Some("amy")),
            make_artwork(SourceId::Harvard, 4, "apple", Some("Bob")),
        ]
    }

    fn ids(records: &[&Artwork]) -> Vec<String> {
        records.iter().map(|a| a.id.clone()).collect()
    }

    const TITLE_ASC: SortOrder = SortOrder {
        field: SortField::Title,
        direction: SortDirection::Ascending,
    };

    #[test]
    fn no_order_keeps_arrival() {
        let records = sample();
        assert_eq!(
            ids(&sorted(&records, None)),
            ["aic-1", "aic-2", "harvard-3", "harvard-4"]
        );
    }

    #[test]
    fn title_sort_is_case_insensitive_and_stable() {
        let records = sample();
        // "Apple" (aic-2) and "apple" (harvard-4) tie and keep arrival order.
        assert_eq!(
            ids(&sorted(&records, Some(TITLE_ASC))),
            ["aic-2", "harvard-4", "aic-1", "harvard-3"]
        );
    }

    #[test]
    fn descending_keeps_ties_in_arrival_order() {
        let records = sample();
        let desc = SortOrder {
            direction: SortDirection::Descending,
            ..TITLE_ASC
        };
        assert_eq!(
            ids(&sorted(&records, Some(desc))),
            ["harvard-3", "aic-1", "aic-2", "harvard-4"]
        );
    }

    #[test]
    fn missing_creator_sorts_as_empty() {
        let records = sample();
        let order = SortOrder {
            field: SortField::Creator,
            direction: SortDirection::Ascending,
        };
        assert_eq!(
            ids(&sorted(&records, Some(order))),
            ["aic-2", "harvard-3", "harvard-4", "aic-1"]
        );
    }

    #[test]
    fn sorting_twice_is_identical() {
        let records = sample();
        for field in [SortField::Title, SortField::Creator] {
            for direction in [SortDirection::Ascending, SortDirection::Descending] {
                let order = Some(SortOrder { field, direction });
                let once: Vec<Artwork> = sorted(&records, order).into_iter().cloned().collect();
                let twice = sorted(&once, order);
                assert_eq!(ids(&twice), ids(&sorted(&records, order)));
            }
        }
    }

    #[test]
    fn descending_reverses_non_equal_pairs() {
        let records = sample();
        for field in [SortField::Title, SortField::Creator] {
            let asc = SortOrder {
                field,
                direction: SortDirection::Ascending,
            };
            let desc = SortOrder {
                direction: SortDirection::Descending,
                ..asc
            };
            let up = sorted(&records, Some(asc));
            let down = sorted(&records, Some(desc));
            let pos = |list: &[&Artwork], id: &str| list.iter().position(|a| a.id == id).unwrap();
            for a in &records {
                for b in &records {
                    if asc.key(a) < asc.key(b) {
                        assert!(pos(&up, &a.id) < pos(&up, &b.id));
                        assert!(pos(&down, &a.id) > pos(&down, &b.id));
                    }
                }
            }
        }
    }
}
