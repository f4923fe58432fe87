//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  Nothing in this module mutates
//! the feed; it only reads `App` and draws widgets.
//!
//! ## For contributors
//!
//! * The layout is three rows: a one-line header (source and sort), the
//!   body for the current [`View`], and a one-line status bar.
//! * Colours and styles are defined inline.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DetailState, View};
use crate::error::FetchError;
use crate::feed::{sort, FeedStatus};
use crate::source::{Artwork, ArtworkDetail};

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(app, frame, header_area);
    match app.view {
        View::Browse => draw_browse(app, frame, main_area),
        View::Detail => draw_detail(app, frame, main_area),
        View::Exhibition => draw_exhibition(app, frame, main_area),
    }
    draw_status_bar(app, frame, status_area);
}

fn draw_header(app: &App, frame: &mut Frame, area: Rect) {
    let sort = app
        .sort
        .map(|s| s.label())
        .unwrap_or_else(|| "feed order".into());
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " artfeed ",
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(
            app.feed.selection().label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  sort: "),
        Span::styled(sort, Style::default().fg(Color::Magenta)),
        Span::raw("  exhibition: "),
        Span::styled(
            app.favorites.len().to_string(),
            Style::default().fg(Color::Yellow),
        ),
    ]));
    frame.render_widget(header, area);
}

/// One list row: favourite marker, title, artist, museum tag.
fn artwork_line<'a>(art: &'a Artwork, favorite: bool) -> Line<'a> {
    let marker = if favorite { "★ " } else { "  " };
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(&art.title, Style::default().fg(Color::White)),
    ];
    if let Some(creator) = &art.creator {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(creator, Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("[{}]", art.source),
        Style::default().fg(Color::Cyan),
    ));
    Line::from(spans)
}

fn highlighted(list: List<'_>) -> List<'_> {
    list.highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .bg(Color::DarkGray),
    )
    .highlight_symbol("▸ ")
}

/// Render the scrollable artwork feed, or the full-screen load state.
fn draw_browse(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = if app.feed.is_loading() {
        " Artworks (loading…) "
    } else {
        " Artworks "
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    match app.feed.status() {
        FeedStatus::Failed(err) => {
            let text = vec![
                Line::from(Span::styled(
                    "Couldn't load artworks",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(err.to_string()),
                Line::from(""),
                Line::from(if err.is_retryable() {
                    "Press r to retry or Tab to pick another museum."
                } else {
                    "Press Tab to pick another museum."
                }),
            ];
            let body = Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(body, area);
            return;
        }
        FeedStatus::Idle | FeedStatus::InitialLoading => {
            let body = Paragraph::new("Loading artworks…")
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(body, area);
            return;
        }
        FeedStatus::Ready | FeedStatus::LoadingMore => {}
    }

    // Borrow fields individually so `list_state` stays free for the render.
    let list_items: Vec<ListItem> = sort::sorted(app.feed.records(), app.sort)
        .into_iter()
        .map(|art| ListItem::new(artwork_line(art, app.favorites.contains(&art.id))))
        .collect();

    if list_items.is_empty() {
        let body = Paragraph::new("No artworks found.")
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(body, area);
        return;
    }

    let list = highlighted(List::new(list_items).block(block));
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_exhibition(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" My exhibition ")
        .borders(Borders::ALL);

    if app.favorites.is_empty() {
        let body = Paragraph::new("Your exhibition is empty. Press f on an artwork to add it.")
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(body, area);
        return;
    }

    let list_items: Vec<ListItem> = app
        .favorites
        .entries()
        .iter()
        .map(|art| ListItem::new(artwork_line(art, true)))
        .collect();
    let list = highlighted(List::new(list_items).block(block));
    frame.render_stateful_widget(list, area, &mut app.exhibition_state);
}

fn draw_detail(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().title(" Artwork ").borders(Borders::ALL);
    let text = match &app.detail {
        None => vec![Line::from("Nothing selected.")],
        Some(DetailState::Loading { id }) => vec![Line::from(format!("Loading {id}…"))],
        Some(DetailState::Failed { id, error }) => vec![
            Line::from(Span::styled(
                match error {
                    FetchError::NotFound { .. } => format!("{id} was not found."),
                    other => format!("Couldn't load {id}: {other}"),
                },
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
            Line::from("Press Esc to go back."),
        ],
        Some(DetailState::Loaded(detail)) => {
            detail_lines(detail, app.favorites.contains(&detail.artwork.id))
        }
    };
    let body = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

fn detail_lines(detail: &ArtworkDetail, favorite: bool) -> Vec<Line<'_>> {
    let art = &detail.artwork;
    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                if favorite { "★ " } else { "" },
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                art.title.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(art.creator.as_deref().unwrap_or("Unknown artist")),
        Line::from(""),
    ];
    let fields = [
        ("Date", detail.date.as_deref()),
        ("Medium", detail.medium.as_deref()),
        ("Dimensions", detail.dimensions.as_deref()),
        ("Museum", Some(art.source.label())),
        ("Image", art.image_url.as_deref()),
        ("Web", detail.origin_url.as_deref()),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            lines.push(Line::from(vec![
                Span::styled(format!("{name:<11}"), label),
                Span::raw(value),
            ]));
        }
    }
    if let Some(description) = &detail.description {
        lines.push(Line::from(""));
        for paragraph in strip_markup(description).lines() {
            lines.push(Line::from(paragraph.to_string()));
        }
    }
    lines
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let message = match &app.notice {
        Some(notice) => notice.text.clone(),
        None => app.feed_summary(),
    };
    let help = match app.view {
        View::Browse => "q quit  ↑/↓ scroll  Enter details  f favourite  Tab museum  s/o sort  n more  e exhibition",
        View::Detail => "Esc back  f favourite  q quit",
        View::Exhibition => "Esc/e back  ↑/↓ scroll  Enter details  f remove  q quit",
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(message, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} artworks", app.feed.records().len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::raw(help),
    ]));
    frame.render_widget(status, area);
}

/// Turn an HTML fragment into plain text: tags dropped, block-level
/// closers become line breaks, and the common entities are decoded.
pub fn strip_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag.trim().to_ascii_lowercase();
                if matches!(name.as_str(), "/p" | "br" | "br/" | "br /" | "/div" | "/li") {
                    out.push('\n');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => out.push(c),
        }
    }
    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    decoded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
