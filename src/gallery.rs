use crossterm::event::KeyCode;
use tracing::{debug, info, warn};

use crate::apod::FetchError;
use crate::media::{DetailMedia, MediaEntry, MediaKind};

pub const TRIGGER_LABEL: &str = "Load gallery";
pub const LOADING_LABEL: &str = "Loading...";
pub const INITIAL_MESSAGE: &str = "Press r or activate \"Load gallery\" to fetch astronomy media.";
const INITIAL_STATUS: &str = "Ready.";
pub const MAX_COLUMNS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub index: usize,
    pub kind: MediaKind,
    pub caption: String,
    pub source: String,
}

impl Card {
    fn from_entry(index: usize, entry: &MediaEntry) -> Self {
        Self {
            index,
            kind: entry.kind,
            caption: entry.caption(),
            source: entry.card_source().to_string(),
        }
    }
}

// Either a message or the cards, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Board {
    Message(String),
    Cards(Vec<Card>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLink {
    pub label: String,
    pub url: String,
}

impl OverlayLink {
    fn new<L: Into<String>, U: Into<String>>(label: L, url: U) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub index: usize,
    pub title: String,
    pub date: String,
    pub explanation: String,
    pub media: DetailMedia,
    pub links: Vec<OverlayLink>,
}

impl Detail {
    fn from_entry(index: usize, entry: &MediaEntry) -> Self {
        let media = entry.detail_media();
        let links = match &media {
            DetailMedia::Player {
                embed_url,
                watch_url,
                ..
            } => vec![
                OverlayLink::new("▶ Play in embedded YouTube player", embed_url.as_str()),
                OverlayLink::new("Open on YouTube", watch_url.as_str()),
            ],
            DetailMedia::Still {
                link: Some(url), ..
            } => vec![OverlayLink::new("Open video in new tab", url.as_str())],
            DetailMedia::Still { link: None, .. } => Vec::new(),
        };
        Self {
            index,
            title: entry.display_title().to_string(),
            date: entry.display_date().to_string(),
            explanation: entry.display_explanation().to_string(),
            media,
            links,
        }
    }

    pub fn still_source(&self) -> Option<&str> {
        match &self.media {
            DetailMedia::Still { source, .. } if !source.is_empty() => Some(source.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Closed,
    Open(Detail),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    None,
    Trigger,
    Card(usize),
    Close,
    Link(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Trigger,
    Card(usize),
    Close,
    Link(usize),
    Panel,
    Backdrop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    None,
    Load,
    OpenUrl(String),
    Quit,
}

pub struct Gallery {
    entries: Vec<MediaEntry>,
    board: Board,
    overlay: Overlay,
    focus: Focus,
    restore_focus: Focus,
    pending_request: Option<u64>,
    next_request_id: u64,
    columns: usize,
    status: String,
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Gallery {
    pub fn new(columns: usize) -> Self {
        Self {
            entries: Vec::new(),
            board: Board::Message(INITIAL_MESSAGE.to_string()),
            overlay: Overlay::Closed,
            focus: Focus::Trigger,
            restore_focus: Focus::None,
            pending_request: None,
            next_request_id: 1,
            columns: columns.clamp(1, MAX_COLUMNS),
            status: INITIAL_STATUS.to_string(),
        }
    }

    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cards(&self) -> &[Card] {
        match &self.board {
            Board::Cards(cards) => cards,
            Board::Message(_) => &[],
        }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn detail(&self) -> Option<&Detail> {
        match &self.overlay {
            Overlay::Open(detail) => Some(detail),
            Overlay::Closed => None,
        }
    }

    pub fn is_overlay_open(&self) -> bool {
        matches!(self.overlay, Overlay::Open(_))
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = message.into();
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.clamp(1, MAX_COLUMNS);
    }

    pub fn is_loading(&self) -> bool {
        self.pending_request.is_some()
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.is_loading()
    }

    pub fn trigger_label(&self) -> &'static str {
        if self.is_loading() {
            LOADING_LABEL
        } else {
            TRIGGER_LABEL
        }
    }

    pub fn begin_load(&mut self) -> Option<u64> {
        if self.is_loading() {
            debug!("load requested while busy; ignoring");
            return None;
        }
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending_request = Some(request_id);
        self.status = "Fetching media...".to_string();
        Some(request_id)
    }

    // Responses for anything but the pending request are dropped.
    pub fn finish_load(
        &mut self,
        request_id: u64,
        result: Result<Vec<MediaEntry>, FetchError>,
    ) -> bool {
        if self.pending_request != Some(request_id) {
            debug!(request_id, "discarding stale media response");
            return false;
        }
        self.pending_request = None;

        match result {
            Ok(entries) => {
                info!(request_id, count = entries.len(), "media loaded");
                self.status = format!("Loaded {} media entries.", entries.len());
                self.render(entries);
            }
            Err(err) => {
                warn!(request_id, error = %err, "media load failed");
                self.status = format!("Load failed: {err}");
                self.show_message(err.user_message());
            }
        }
        true
    }

    pub fn render(&mut self, entries: Vec<MediaEntry>) {
        let cards = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Card::from_entry(index, entry))
            .collect();
        self.entries = entries;
        self.board = Board::Cards(cards);
        if let Focus::Card(index) = self.focus {
            if index >= self.entries.len() {
                self.focus = Focus::None;
            }
        }
    }

    pub fn show_message<S: Into<String>>(&mut self, message: S) {
        self.board = Board::Message(message.into());
        if matches!(self.focus, Focus::Card(_)) {
            self.focus = Focus::None;
        }
    }

    pub fn open(&mut self, index: usize) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        let detail = Detail::from_entry(index, entry);
        debug!(index, title = %detail.title, "opening detail overlay");
        if !self.is_overlay_open() {
            self.restore_focus = self.focus;
        }
        self.overlay = Overlay::Open(detail);
        self.focus = Focus::Close;
        true
    }

    pub fn close(&mut self) -> bool {
        if !self.is_overlay_open() {
            return false;
        }
        self.overlay = Overlay::Closed;
        let previous = std::mem::replace(&mut self.restore_focus, Focus::None);
        self.focus = if self.can_focus(previous) {
            previous
        } else {
            Focus::None
        };
        debug!(focus = ?self.focus, "closed detail overlay");
        true
    }

    pub fn can_focus(&self, focus: Focus) -> bool {
        match focus {
            Focus::None => false,
            Focus::Trigger => !self.is_overlay_open(),
            Focus::Card(index) => !self.is_overlay_open() && index < self.cards().len(),
            Focus::Close => self.is_overlay_open(),
            Focus::Link(index) => self
                .detail()
                .map(|detail| index < detail.links.len())
                .unwrap_or(false),
        }
    }

    fn focus_order(&self) -> Vec<Focus> {
        match &self.overlay {
            Overlay::Open(detail) => std::iter::once(Focus::Close)
                .chain((0..detail.links.len()).map(Focus::Link))
                .collect(),
            Overlay::Closed => std::iter::once(Focus::Trigger)
                .chain((0..self.cards().len()).map(Focus::Card))
                .collect(),
        }
    }

    pub fn focus_next(&mut self) {
        self.cycle_focus(true);
    }

    pub fn focus_previous(&mut self) {
        self.cycle_focus(false);
    }

    fn cycle_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        if order.is_empty() {
            return;
        }
        let next = match order.iter().position(|focus| *focus == self.focus) {
            Some(pos) if forward => (pos + 1) % order.len(),
            Some(pos) => (pos + order.len() - 1) % order.len(),
            None if forward => 0,
            None => order.len() - 1,
        };
        self.focus = order[next];
    }

    fn move_in_grid(&mut self, code: KeyCode) {
        let count = self.cards().len();
        let columns = self.columns;
        self.focus = match (self.focus, code) {
            (Focus::Card(index), KeyCode::Right) if index + 1 < count => Focus::Card(index + 1),
            (Focus::Card(index), KeyCode::Left) if index > 0 => Focus::Card(index - 1),
            (Focus::Card(0), KeyCode::Left) => Focus::Trigger,
            (Focus::Card(index), KeyCode::Down) if index + columns < count => {
                Focus::Card(index + columns)
            }
            (Focus::Card(index), KeyCode::Up) if index >= columns => Focus::Card(index - columns),
            (Focus::Card(_), KeyCode::Up) => Focus::Trigger,
            (Focus::Trigger | Focus::None, KeyCode::Down | KeyCode::Right) if count > 0 => {
                Focus::Card(0)
            }
            (Focus::None, _) => Focus::Trigger,
            (focus, _) => focus,
        };
    }

    pub fn activate_focused(&mut self) -> Command {
        match self.focus {
            Focus::None => Command::None,
            Focus::Trigger => {
                if self.trigger_enabled() {
                    Command::Load
                } else {
                    Command::None
                }
            }
            Focus::Card(index) => {
                self.open(index);
                Command::None
            }
            Focus::Close => {
                self.close();
                Command::None
            }
            Focus::Link(index) => self
                .detail()
                .and_then(|detail| detail.links.get(index))
                .map(|link| Command::OpenUrl(link.url.clone()))
                .unwrap_or(Command::None),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Command {
        if self.is_overlay_open() {
            return match code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.close();
                    Command::None
                }
                KeyCode::Tab | KeyCode::Right | KeyCode::Down | KeyCode::Char('j') => {
                    self.focus_next();
                    Command::None
                }
                KeyCode::BackTab | KeyCode::Left | KeyCode::Up | KeyCode::Char('k') => {
                    self.focus_previous();
                    Command::None
                }
                KeyCode::Enter | KeyCode::Char(' ') => self.activate_focused(),
                _ => Command::None,
            };
        }

        match code {
            KeyCode::Char('q') => Command::Quit,
            KeyCode::Esc => Command::None,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.trigger_enabled() {
                    Command::Load
                } else {
                    Command::None
                }
            }
            KeyCode::Tab => {
                self.focus_next();
                Command::None
            }
            KeyCode::BackTab => {
                self.focus_previous();
                Command::None
            }
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                self.move_in_grid(code);
                Command::None
            }
            KeyCode::Char('h') => self.handle_key(KeyCode::Left),
            KeyCode::Char('j') => self.handle_key(KeyCode::Down),
            KeyCode::Char('k') => self.handle_key(KeyCode::Up),
            KeyCode::Char('l') => self.handle_key(KeyCode::Right),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_focused(),
            _ => Command::None,
        }
    }

    pub fn handle_click(&mut self, target: HitTarget) -> Command {
        if self.is_overlay_open() {
            return match target {
                HitTarget::Close => {
                    self.close();
                    Command::None
                }
                HitTarget::Link(index) if self.can_focus(Focus::Link(index)) => {
                    self.focus = Focus::Link(index);
                    self.activate_focused()
                }
                HitTarget::Panel | HitTarget::Link(_) => Command::None,
                HitTarget::Backdrop | HitTarget::Trigger | HitTarget::Card(_) => {
                    self.close();
                    Command::None
                }
            };
        }

        match target {
            HitTarget::Trigger => {
                self.focus = Focus::Trigger;
                self.activate_focused()
            }
            HitTarget::Card(index) if self.can_focus(Focus::Card(index)) => {
                self.focus = Focus::Card(index);
                self.activate_focused()
            }
            _ => Command::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MediaService, StaticMediaService};
    use crate::media::sample;

    fn loaded(entries: Vec<MediaEntry>) -> Gallery {
        let mut gallery = Gallery::new(2);
        let id = gallery.begin_load().unwrap();
        assert!(gallery.finish_load(id, Ok(entries)));
        gallery
    }

    fn three() -> Vec<MediaEntry> {
        vec![
            sample(MediaKind::Image, "first"),
            sample(MediaKind::Video, "second"),
            sample(MediaKind::Image, "third"),
        ]
    }

    #[test]
    fn starts_idle_with_placeholder() {
        let gallery = Gallery::default();
        assert!(!gallery.is_loading());
        assert_eq!(gallery.trigger_label(), TRIGGER_LABEL);
        assert_eq!(gallery.board(), &Board::Message(INITIAL_MESSAGE.to_string()));
        assert!(gallery.entries().is_empty());
    }

    #[test]
    fn busy_gate_blocks_second_load() {
        let mut gallery = Gallery::default();
        let first = gallery.begin_load();
        assert!(first.is_some());
        assert!(gallery.is_loading());
        assert!(!gallery.trigger_enabled());
        assert_eq!(gallery.trigger_label(), LOADING_LABEL);
        assert_eq!(gallery.begin_load(), None);
        assert_eq!(gallery.handle_key(KeyCode::Char('r')), Command::None);
        assert_eq!(gallery.handle_key(KeyCode::Enter), Command::None);
    }

    #[test]
    fn empty_source_shows_message_and_reenables_trigger() {
        let mut gallery = Gallery::default();
        let id = gallery.begin_load().unwrap();
        let result = StaticMediaService::new("[]").load_media();
        gallery.finish_load(id, result);
        assert_eq!(
            gallery.board(),
            &Board::Message("No media entries found.".to_string())
        );
        assert!(gallery.trigger_enabled());
        assert_eq!(gallery.trigger_label(), TRIGGER_LABEL);
    }

    #[test]
    fn non_array_source_shows_format_message() {
        let mut gallery = Gallery::default();
        let id = gallery.begin_load().unwrap();
        gallery.finish_load(id, StaticMediaService::new("{}").load_media());
        let Board::Message(message) = gallery.board() else {
            panic!("expected a message");
        };
        assert!(message.contains("unexpected data format"));
    }

    #[test]
    fn network_failure_shows_retry_message_and_restores_label() {
        let mut gallery = loaded(three());
        let id = gallery.begin_load().unwrap();
        gallery.finish_load(id, Err(FetchError::Network("connection refused".into())));
        let Board::Message(message) = gallery.board() else {
            panic!("expected a message");
        };
        assert!(message.contains("try again"));
        assert!(gallery.cards().is_empty());
        assert!(gallery.trigger_enabled());
        assert_eq!(gallery.trigger_label(), TRIGGER_LABEL);
        assert_eq!(gallery.handle_key(KeyCode::Char('r')), Command::Load);
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut gallery = Gallery::default();
        let id = gallery.begin_load().unwrap();
        assert!(!gallery.finish_load(id + 1, Ok(three())));
        assert!(gallery.is_loading());
        assert!(gallery.finish_load(id, Ok(three())));
        assert!(!gallery.finish_load(id, Err(FetchError::Empty)));
        assert_eq!(gallery.cards().len(), 3);
    }

    #[test]
    fn successful_load_replaces_working_set() {
        let mut gallery = loaded(three());
        let id = gallery.begin_load().unwrap();
        gallery.finish_load(id, Ok(vec![sample(MediaKind::Image, "only")]));
        assert_eq!(gallery.entries().len(), 1);
        assert_eq!(gallery.cards().len(), 1);
        assert_eq!(gallery.cards()[0].caption, "only (2024-01-01)");
    }

    #[test]
    fn render_is_idempotent() {
        let mut gallery = Gallery::default();
        gallery.render(three());
        gallery.render(three());
        assert_eq!(gallery.cards().len(), 3);
        let indices: Vec<_> = gallery.cards().iter().map(|card| card.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(gallery.cards()[1].caption.starts_with("▶ "));
    }

    #[test]
    fn open_reflects_entry_with_defaults() {
        let mut entries = three();
        entries[1].title.clear();
        entries[1].date.clear();
        entries[1].explanation.clear();
        let mut gallery = loaded(entries.clone());

        for (index, entry) in entries.iter().enumerate() {
            assert!(gallery.open(index));
            let detail = gallery.detail().unwrap();
            assert_eq!(detail.index, index);
            assert_eq!(detail.title, entry.display_title());
            assert_eq!(detail.date, entry.display_date());
            assert_eq!(detail.explanation, entry.display_explanation());
            gallery.close();
        }

        gallery.open(1);
        let detail = gallery.detail().unwrap();
        assert_eq!(detail.title, "Untitled");
        assert_eq!(detail.date, "Unknown date");
        assert_eq!(detail.explanation, "No explanation available.");
    }

    #[test]
    fn open_out_of_range_is_ignored() {
        let mut gallery = loaded(three());
        assert!(!gallery.open(9));
        assert!(!gallery.is_overlay_open());
    }

    #[test]
    fn reopening_replaces_previous_media() {
        let mut entries = three();
        entries[1].url = "https://youtu.be/abc123XYZ".into();
        let mut gallery = loaded(entries);
        gallery.open(1);
        assert_eq!(gallery.detail().unwrap().links.len(), 2);
        gallery.open(0);
        let detail = gallery.detail().unwrap();
        assert!(detail.links.is_empty());
        assert_eq!(detail.still_source(), Some("https://apod.example/first.jpg"));
    }

    #[test]
    fn keyboard_activation_opens_and_escape_restores_focus() {
        let mut gallery = loaded(three());
        gallery.handle_key(KeyCode::Tab);
        assert_eq!(gallery.focus(), Focus::Card(0));
        gallery.handle_key(KeyCode::Tab);
        assert_eq!(gallery.focus(), Focus::Card(1));

        gallery.handle_key(KeyCode::Char(' '));
        assert!(gallery.is_overlay_open());
        assert_eq!(gallery.focus(), Focus::Close);
        assert_eq!(gallery.detail().unwrap().index, 1);

        gallery.handle_key(KeyCode::Esc);
        assert!(!gallery.is_overlay_open());
        assert_eq!(gallery.focus(), Focus::Card(1));
    }

    #[test]
    fn escape_while_closed_is_noop() {
        let mut gallery = loaded(three());
        gallery.handle_key(KeyCode::Tab);
        let focus = gallery.focus();
        assert_eq!(gallery.handle_key(KeyCode::Esc), Command::None);
        assert!(!gallery.is_overlay_open());
        assert_eq!(gallery.focus(), focus);
        assert_eq!(gallery.cards().len(), 3);
        assert!(!gallery.close());
    }

    #[test]
    fn close_without_focusable_origin_clears_focus() {
        let mut gallery = loaded(three());
        gallery.handle_click(HitTarget::Card(2));
        assert!(gallery.is_overlay_open());
        gallery.render(vec![sample(MediaKind::Image, "solo")]);
        gallery.close();
        assert_eq!(gallery.focus(), Focus::None);
    }

    #[test]
    fn backdrop_click_closes_but_panel_click_does_not() {
        let mut gallery = loaded(three());
        gallery.handle_click(HitTarget::Card(0));
        assert_eq!(gallery.handle_click(HitTarget::Panel), Command::None);
        assert!(gallery.is_overlay_open());
        gallery.handle_click(HitTarget::Backdrop);
        assert!(!gallery.is_overlay_open());
        assert_eq!(gallery.focus(), Focus::Card(0));
    }

    #[test]
    fn close_control_closes() {
        let mut gallery = loaded(three());
        gallery.open(0);
        assert_eq!(gallery.handle_key(KeyCode::Enter), Command::None);
        assert!(!gallery.is_overlay_open());
    }

    #[test]
    fn overlay_links_open_urls() {
        let mut entries = three();
        entries[1].url = "https://www.youtube.com/watch?v=abc123XYZ".into();
        let mut gallery = loaded(entries);
        gallery.open(1);
        gallery.handle_key(KeyCode::Tab);
        assert_eq!(gallery.focus(), Focus::Link(0));
        assert_eq!(
            gallery.handle_key(KeyCode::Enter),
            Command::OpenUrl("https://www.youtube.com/embed/abc123XYZ".into())
        );
        assert_eq!(
            gallery.handle_click(HitTarget::Link(1)),
            Command::OpenUrl("https://www.youtube.com/watch?v=abc123XYZ".into())
        );
        assert!(gallery.is_overlay_open());
    }

    #[test]
    fn trigger_click_requests_load() {
        let mut gallery = Gallery::default();
        assert_eq!(gallery.handle_click(HitTarget::Trigger), Command::Load);
        gallery.begin_load();
        assert_eq!(gallery.handle_click(HitTarget::Trigger), Command::None);
    }

    #[test]
    fn grid_navigation_follows_columns() {
        let mut gallery = loaded(three());
        assert_eq!(gallery.columns(), 2);
        gallery.handle_key(KeyCode::Down);
        assert_eq!(gallery.focus(), Focus::Card(0));
        gallery.handle_key(KeyCode::Down);
        assert_eq!(gallery.focus(), Focus::Card(2));
        gallery.handle_key(KeyCode::Down);
        assert_eq!(gallery.focus(), Focus::Card(2));
        gallery.handle_key(KeyCode::Up);
        assert_eq!(gallery.focus(), Focus::Card(0));
        gallery.handle_key(KeyCode::Up);
        assert_eq!(gallery.focus(), Focus::Trigger);
    }

    #[test]
    fn column_count_is_bounded() {
        assert_eq!(Gallery::new(0).columns(), 1);
        assert_eq!(Gallery::new(usize::MAX).columns(), MAX_COLUMNS);
        let mut gallery = Gallery::default();
        gallery.set_columns(usize::MAX / 2);
        assert_eq!(gallery.columns(), MAX_COLUMNS);
    }

    #[test]
    fn tab_wraps_around_trigger_and_cards() {
        let mut gallery = loaded(three());
        gallery.handle_key(KeyCode::BackTab);
        assert_eq!(gallery.focus(), Focus::Card(2));
        gallery.handle_key(KeyCode::Tab);
        assert_eq!(gallery.focus(), Focus::Trigger);
    }

    #[test]
    fn quit_only_when_overlay_closed() {
        let mut gallery = loaded(three());
        gallery.open(0);
        assert_eq!(gallery.handle_key(KeyCode::Char('q')), Command::None);
        assert!(!gallery.is_overlay_open());
        assert_eq!(gallery.handle_key(KeyCode::Char('q')), Command::Quit);
    }
}
