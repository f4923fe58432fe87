use chrono::{DateTime, Duration, Utc};
use ratatui::widgets::ListState;

use crate::catalog::SourceSelection;
use crate::error::FetchError;
use crate::favorites::FavoritesStore;
use crate::feed::sort::{self, SortDirection, SortField, SortOrder};
use crate::feed::{Applied, FeedController, FeedStatus};
use crate::fetch::{Command, FetchMsg};
use crate::source::{Artwork, ArtworkDetail, SourceId};

/// How long a transient notice stays in the status bar.
const NOTICE_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Browse,
    Detail,
    Exhibition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading { id: String },
    Loaded(Box<ArtworkDetail>),
    Failed { id: String, error: FetchError },
}

/// A status-bar message that expires on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

pub struct App {
    pub feed: FeedController,
    pub favorites: FavoritesStore,
    pub view: View,
    /// Selection in the browse list (indexes the sorted view).
    pub list_state: ListState,
    /// Selection in the exhibition list.
    pub exhibition_state: ListState,
    pub detail: Option<DetailState>,
    detail_generation: u64,
    /// Where `Esc` goes from the detail pane.
    detail_return: View,
    pub sort: Option<SortOrder>,
    pub notice: Option<Notice>,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Requests waiting for the dispatcher.
    commands: Vec<Command>,
}

impl App {
    pub fn new(feed: FeedController, favorites: FavoritesStore) -> Self {
        Self {
            feed,
            favorites,
            view: View::Browse,
            list_state: ListState::default(),
            exhibition_state: ListState::default(),
            detail: None,
            detail_generation: 0,
            detail_return: View::Browse,
            sort: None,
            notice: None,
            quit: false,
            commands: Vec::new(),
        }
    }

    /// Kick off the first load.
    pub fn start(&mut self) {
        let plan = self.feed.start();
        self.commands.push(Command::Feed(plan));
    }

    /// Hand queued requests to the caller.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// The feed in display order.
    pub fn visible_records(&self) -> Vec<&Artwork> {
        sort::sorted(self.feed.records(), self.sort)
    }

    /// The artwork the current view is pointing at.
    pub fn selected_artwork(&self) -> Option<&Artwork> {
        match self.view {
            View::Browse => self
                .list_state
                .selected()
                .and_then(|i| self.visible_records().get(i).copied()),
            View::Exhibition => self
                .exhibition_state
                .selected()
                .and_then(|i| self.favorites.entries().get(i)),
            View::Detail => match &self.detail {
                Some(DetailState::Loaded(detail)) => Some(&detail.artwork),
                _ => None,
            },
        }
    }

    // -- incoming results ----------------------------------------------------

    /// Apply one message from the fetch tasks.
    pub fn apply(&mut self, msg: FetchMsg) {
        match msg {
            FetchMsg::Feed(outcome) => {
                let selected = self.selected_browse_id();
                let applied = self.feed.apply(outcome);
                self.on_feed_applied(applied, selected);
            }
            FetchMsg::Detail { generation, result } => {
                if generation != self.detail_generation || self.view != View::Detail {
                    return;
                }
                let id = match &self.detail {
                    Some(DetailState::Loading { id }) => id.clone(),
                    _ => return,
                };
                self.detail = Some(match result {
                    Ok(detail) => DetailState::Loaded(Box::new(detail)),
                    Err(error) => DetailState::Failed { id, error },
                });
            }
        }
    }

    fn on_feed_applied(&mut self, applied: Applied, selected: Option<String>) {
        match applied {
            Applied::Stale | Applied::Failed(_) => {}
            Applied::Loaded { added, failures } => {
                // With a sort active, new rows can land above the cursor.
                self.reselect(selected);
                if self.list_state.selected().is_none() && !self.feed.records().is_empty() {
                    self.list_state.select(Some(0));
                }
                if let Some(err) = failures.first() {
                    self.post_notice(format!("Some artworks could not be loaded: {err}"));
                } else if added > 0 {
                    self.post_notice(format!("Loaded {added} artworks"));
                }
            }
        }
    }

    // -- notices -------------------------------------------------------------

    pub fn post_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            posted_at: Utc::now(),
        });
    }

    /// Clear the notice once it has been shown long enough.
    pub fn expire_notice(&mut self, now: DateTime<Utc>) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| now - n.posted_at >= Duration::seconds(NOTICE_TTL_SECS))
        {
            self.notice = None;
        }
    }

    // -- feed actions --------------------------------------------------------

    /// List-end reached, or the user asked for the next page.
    pub fn request_more(&mut self) {
        if let Some(plan) = self.feed.load_more() {
            self.commands.push(Command::Feed(plan));
        }
    }

    pub fn cycle_source(&mut self) {
        self.select_source(self.feed.selection().next());
    }

    pub fn select_source(&mut self, selection: SourceSelection) {
        let plan = self.feed.select_source(selection);
        self.commands.push(Command::Feed(plan));
        self.list_state.select(None);
        self.post_notice(format!("Showing {}", selection.label()));
    }

    /// Retry after a failure, otherwise reload from the first page.
    pub fn reload(&mut self) {
        let plan = match self.feed.retry() {
            Some(plan) => plan,
            None => self.feed.start(),
        };
        self.commands.push(Command::Feed(plan));
        self.list_state.select(None);
    }

    /// none → title → artist → none.
    pub fn cycle_sort(&mut self) {
        let selected = self.selected_browse_id();
        let direction = self.sort.map_or(SortDirection::Ascending, |s| s.direction);
        self.sort = match self.sort.map(|s| s.field) {
            None => Some(SortOrder {
                field: SortField::Title,
                direction,
            }),
            Some(SortField::Title) => Some(SortOrder {
                field: SortField::Creator,
                direction,
            }),
            Some(SortField::Creator) => None,
        };
        self.reselect(selected);
        self.clamp_selection();
    }

    pub fn flip_sort_direction(&mut self) {
        let selected = self.selected_browse_id();
        if let Some(order) = &mut self.sort {
            order.direction = order.direction.flipped();
        }
        self.reselect(selected);
    }

    /// Id of the highlighted browse row.
    fn selected_browse_id(&self) -> Option<String> {
        let index = self.list_state.selected()?;
        self.visible_records().get(index).map(|art| art.id.clone())
    }

    /// Point the browse selection back at `id` after the display order
    /// changed.  Leaves the selection alone if the record is gone.
    fn reselect(&mut self, id: Option<String>) {
        let Some(id) = id else { return };
        let index = self.visible_records().iter().position(|art| art.id == id);
        if let Some(index) = index {
            self.list_state.select(Some(index));
        }
    }

    // -- detail & exhibition -------------------------------------------------

    pub fn open_detail(&mut self) {
        let Some(id) = self.selected_artwork().map(|a| a.id.clone()) else {
            return;
        };
        self.detail_generation += 1;
        self.detail_return = self.view;
        self.detail = Some(DetailState::Loading { id: id.clone() });
        self.view = View::Detail;
        self.commands.push(Command::Detail {
            generation: self.detail_generation,
            tagged_id: id,
        });
    }

    pub fn close_detail(&mut self) {
        self.view = self.detail_return;
        self.detail = None;
    }

    pub fn toggle_exhibition(&mut self) {
        self.view = match self.view {
            View::Exhibition => View::Browse,
            _ => View::Exhibition,
        };
        self.detail = None;
        if self.view == View::Exhibition && self.exhibition_state.selected().is_none() {
            self.select_first();
        }
    }

    pub fn toggle_favorite(&mut self) {
        let Some(artwork) = self.selected_artwork().cloned() else {
            return;
        };
        let now_favorite = self.favorites.toggle(&artwork);
        let text = if now_favorite {
            format!("Added \"{}\" to your exhibition", artwork.title)
        } else {
            format!("Removed \"{}\" from your exhibition", artwork.title)
        };
        self.post_notice(text);
        if self.view == View::Exhibition {
            self.clamp_selection();
        }
    }

    // -- navigation ----------------------------------------------------------

    fn current_len(&self) -> usize {
        match self.view {
            View::Browse => self.feed.records().len(),
            View::Exhibition => self.favorites.len(),
            View::Detail => 0,
        }
    }

    fn current_state(&mut self) -> &mut ListState {
        match self.view {
            View::Exhibition => &mut self.exhibition_state,
            _ => &mut self.list_state,
        }
    }

    /// Moving onto the last browse row counts as reaching the end of the
    /// list and asks for more.
    fn after_move(&mut self) {
        let len = self.current_len();
        if self.view == View::Browse
            && len > 0
            && self.list_state.selected() == Some(len - 1)
        {
            self.request_more();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.current_len();
        let state = self.current_state();
        match (state.selected(), len) {
            (_, 0) => state.select(None),
            (Some(i), len) if i >= len => state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn select_next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        state.select(Some(i));
        self.after_move();
    }

    pub fn select_previous(&mut self) {
        if self.current_len() == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if self.current_len() > 0 {
            self.current_state().select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        let len = self.current_len();
        if len > 0 {
            self.current_state().select(Some(len - 1));
            self.after_move();
        }
    }

    /// One-line summary of the feed for the status bar.
    pub fn feed_summary(&self) -> String {
        let shown = self.feed.records().len();
        match self.feed.status() {
            FeedStatus::Idle => "Idle".into(),
            FeedStatus::InitialLoading => "Loading…".into(),
            FeedStatus::LoadingMore => format!("{shown} shown, loading more…"),
            FeedStatus::Failed(_) => "Load failed".into(),
            FeedStatus::Ready => {
                let total = self.feed.approximate_total();
                let more = if self.feed.has_more() { "" } else { " (end)" };
                match (self.feed.selection(), self.feed.page_info()) {
                    (SourceSelection::Only(_), Some(page)) => format!(
                        "{shown} of {total}{more} · page {}/{}",
                        page.current_page, page.total_pages
                    ),
                    (SourceSelection::Only(_), None) => format!("{shown} of {total}{more}"),
                    (SourceSelection::All, _) => {
                        format!("{shown} of ~{total}{more} · {}", self.source_progress())
                    }
                }
            }
        }
    }

    /// Where each museum's cursor stands in the combined feed, e.g.
    /// `aic p3, harvard done`.
    fn source_progress(&self) -> String {
        SourceId::ALL
            .into_iter()
            .filter_map(|id| {
                self.feed.cursor(id).map(|c| {
                    if c.exhausted {
                        format!("{id} done")
                    } else {
                        format!("{id} p{}", c.next_page)
                    }
                })
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::BlobStore;
    use crate::feed::shuffle::KeepOrder;
    use crate::feed::FetchOutcome;
    use crate::source::{make_artwork, Page};
    use std::io;

    struct NullStore;

    impl BlobStore for NullStore {
        fn read(&self, _key: &str) -> io::Result<Option<String>> {
            Ok(None)
        }
        fn write(&self, _key: &str, _value: &str) -> io::Result<()> {
            Ok(())
        }
        fn remove(&self, _key: &str) -> io::Result<()> {
            Ok(())
        }
    }

    fn new_app(selection: SourceSelection) -> App {
        let feed = FeedController::new(selection, 3, Box::new(KeepOrder));
        App::new(feed, FavoritesStore::load(Box::new(NullStore)))
    }

    fn page(source: SourceId, from: u32, current: u32, total_pages: u32) -> Page {
        let titles = ["Cypress", "apple", "Birch"];
        Page {
            records: (0..3)
                .map(|i| make_artwork(source, from + i, titles[i as usize], None))
                .collect(),
            current_page: current,
            total_pages,
            total_records: u64::from(3 * total_pages),
        }
    }

    /// Answer the single queued feed command with `page`.
    fn answer(app: &mut App, result: Result<Page, FetchError>) {
        let commands = app.take_commands();
        let Some(Command::Feed(plan)) = commands.into_iter().last() else {
            panic!("no feed command queued");
        };
        let source = plan.targets[0].source;
        app.apply(FetchMsg::Feed(FetchOutcome {
            generation: plan.generation,
            kind: plan.kind,
            results: vec![(source, result)],
        }));
    }

    fn loaded_app() -> App {
        let mut app = new_app(SourceSelection::Only(SourceId::Aic));
        app.start();
        answer(&mut app, Ok(page(SourceId::Aic, 0, 1, 3)));
        app
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty() {
        let app = new_app(SourceSelection::All);
        assert!(app.feed.records().is_empty());
        assert!(!app.quit);
        assert_eq!(app.view, View::Browse);
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn start_queues_initial_load() {
        let mut app = new_app(SourceSelection::All);
        app.start();
        let commands = app.take_commands();
        assert_eq!(commands.len(), 1);
        assert!(matches!(&commands[0], Command::Feed(plan) if plan.targets.len() == 2));
        assert!(app.take_commands().is_empty());
    }

    // -- feed ----------------------------------------------------------------

    #[test]
    fn first_page_selects_first_row() {
        let app = loaded_app();
        assert_eq!(app.feed.records().len(), 3);
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.feed_summary(), "3 of 9 · page 1/3");
    }

    #[test]
    fn combined_summary_shows_each_museum() {
        let mut app = new_app(SourceSelection::All);
        app.start();
        let Some(Command::Feed(plan)) = app.take_commands().pop() else {
            panic!("no feed command queued");
        };
        app.apply(FetchMsg::Feed(FetchOutcome {
            generation: plan.generation,
            kind: plan.kind,
            results: vec![
                (SourceId::Aic, Ok(page(SourceId::Aic, 0, 1, 3))),
                (SourceId::Harvard, Ok(page(SourceId::Harvard, 0, 1, 1))),
            ],
        }));
        assert_eq!(app.feed_summary(), "6 of ~12 · aic p2, harvard done");
    }

    #[test]
    fn reaching_the_end_requests_more_once() {
        let mut app = loaded_app();
        app.select_last();
        app.select_next();
        let commands = app.take_commands();
        assert_eq!(commands.len(), 1, "second trigger dropped while in flight");
        assert!(matches!(&commands[0], Command::Feed(plan) if plan.targets[0].page == 2));
    }

    #[test]
    fn load_more_failure_posts_notice_and_keeps_rows() {
        let mut app = loaded_app();
        app.select_last();
        answer(
            &mut app,
            Err(FetchError::Upstream {
                source_id: SourceId::Aic,
                status: 500,
            }),
        );
        assert_eq!(app.feed.records().len(), 3);
        assert!(app
            .notice
            .as_ref()
            .unwrap()
            .text
            .contains("HTTP 500"));
    }

    #[test]
    fn cycling_source_clears_list_and_queues_load() {
        let mut app = loaded_app();
        app.cycle_source();
        assert!(app.feed.records().is_empty());
        assert!(app.list_state.selected().is_none());
        assert_eq!(
            app.feed.selection(),
            SourceSelection::Only(SourceId::Harvard)
        );
        assert_eq!(app.take_commands().len(), 1);
    }

    #[test]
    fn reload_after_failure_retries() {
        let mut app = new_app(SourceSelection::Only(SourceId::Aic));
        app.start();
        answer(
            &mut app,
            Err(FetchError::Upstream {
                source_id: SourceId::Aic,
                status: 503,
            }),
        );
        assert!(matches!(app.feed.status(), FeedStatus::Failed(_)));
        app.reload();
        assert_eq!(*app.feed.status(), FeedStatus::InitialLoading);
        assert_eq!(app.take_commands().len(), 1);
    }

    // -- sorting -------------------------------------------------------------

    #[test]
    fn sort_cycles_and_reorders_view_only() {
        let mut app = loaded_app();
        app.cycle_sort();
        let titles: Vec<&str> = app.visible_records().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["apple", "Birch", "Cypress"]);
        assert_eq!(app.feed.records()[0].title, "Cypress", "feed order untouched");

        app.flip_sort_direction();
        let titles: Vec<&str> = app.visible_records().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["Cypress", "Birch", "apple"]);

        app.cycle_sort();
        assert_eq!(app.sort.unwrap().field, SortField::Creator);
        app.cycle_sort();
        assert!(app.sort.is_none());
    }

    #[test]
    fn selection_follows_the_record_when_load_more_sorts_in_above() {
        let mut app = loaded_app();
        app.cycle_sort();
        // apple (aic-1), Birch (aic-2), Cypress (aic-0)
        app.list_state.select(Some(1));
        assert_eq!(app.selected_artwork().unwrap().id, "aic-2");

        app.request_more();
        answer(&mut app, Ok(page(SourceId::Aic, 3, 2, 3)));

        // apple, apple, Birch, Birch, Cypress, Cypress
        assert_eq!(app.feed.records().len(), 6);
        assert_eq!(app.list_state.selected(), Some(2));
        assert_eq!(app.selected_artwork().unwrap().id, "aic-2");
    }

    #[test]
    fn changing_the_sort_keeps_the_highlighted_record() {
        let mut app = loaded_app();
        assert_eq!(app.selected_artwork().unwrap().id, "aic-0");

        app.cycle_sort();
        assert_eq!(app.selected_artwork().unwrap().id, "aic-0");
        assert_eq!(app.list_state.selected(), Some(2));

        app.flip_sort_direction();
        assert_eq!(app.selected_artwork().unwrap().id, "aic-0");
        assert_eq!(app.list_state.selected(), Some(0));
    }

    // -- detail --------------------------------------------------------------

    fn detail_for(artwork: Artwork) -> ArtworkDetail {
        ArtworkDetail {
            artwork,
            description: Some("<p>Hi</p>".into()),
            dimensions: None,
            date: None,
            medium: None,
            origin_url: None,
        }
    }

    #[test]
    fn open_detail_queues_lookup_and_applies_result() {
        let mut app = loaded_app();
        app.open_detail();
        assert_eq!(app.view, View::Detail);
        let commands = app.take_commands();
        let Some(Command::Detail { generation, tagged_id }) = commands.first().cloned() else {
            panic!("expected detail command");
        };
        assert_eq!(tagged_id, "aic-0");

        let art = app.feed.records()[0].clone();
        app.apply(FetchMsg::Detail {
            generation,
            result: Ok(detail_for(art)),
        });
        assert!(matches!(app.detail, Some(DetailState::Loaded(_))));
        assert_eq!(app.selected_artwork().unwrap().id, "aic-0");

        app.close_detail();
        assert_eq!(app.view, View::Browse);
    }

    #[test]
    fn stale_detail_response_is_ignored() {
        let mut app = loaded_app();
        app.open_detail();
        let first = app.take_commands();
        app.close_detail();
        app.select_next();
        app.open_detail();

        let Some(Command::Detail { generation, .. }) = first.first().cloned() else {
            panic!("expected detail command");
        };
        let art = app.feed.records()[0].clone();
        app.apply(FetchMsg::Detail {
            generation,
            result: Ok(detail_for(art)),
        });
        assert_eq!(
            app.detail,
            Some(DetailState::Loading {
                id: "aic-1".into()
            })
        );
    }

    #[test]
    fn detail_not_found_is_recorded() {
        let mut app = loaded_app();
        app.open_detail();
        let generation = match app.take_commands().pop() {
            Some(Command::Detail { generation, .. }) => generation,
            other => panic!("expected detail command, got {other:?}"),
        };
        app.apply(FetchMsg::Detail {
            generation,
            result: Err(FetchError::NotFound { id: "aic-0".into() }),
        });
        assert!(matches!(
            app.detail,
            Some(DetailState::Failed {
                error: FetchError::NotFound { .. },
                ..
            })
        ));
    }

    // -- exhibition ----------------------------------------------------------

    #[test]
    fn favorites_toggle_from_browse_and_exhibition() {
        let mut app = loaded_app();
        app.toggle_favorite();
        assert!(app.favorites.contains("aic-0"));

        app.toggle_exhibition();
        assert_eq!(app.view, View::Exhibition);
        assert_eq!(app.exhibition_state.selected(), Some(0));
        assert_eq!(app.selected_artwork().unwrap().id, "aic-0");

        app.toggle_favorite();
        assert!(app.favorites.is_empty());
        assert!(app.exhibition_state.selected().is_none());

        app.toggle_exhibition();
        assert_eq!(app.view, View::Browse);
    }

    // -- notices -------------------------------------------------------------

    #[test]
    fn notices_expire() {
        let mut app = new_app(SourceSelection::All);
        app.post_notice("hello");
        let posted = app.notice.as_ref().unwrap().posted_at;

        app.expire_notice(posted + Duration::seconds(1));
        assert!(app.notice.is_some());
        app.expire_notice(posted + Duration::seconds(NOTICE_TTL_SECS));
        assert!(app.notice.is_none());
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn select_next_on_empty_is_noop() {
        let mut app = new_app(SourceSelection::All);
        app.select_next();
        assert!(app.list_state.selected().is_none());
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn select_previous_clamps_at_zero() {
        let mut app = loaded_app();
        app.select_first();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn select_next_clamps_at_last_item() {
        let mut app = loaded_app();
        app.select_last();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));
    }
}
