use std::collections::HashMap;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use image::RgbImage;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use reqwest::blocking::Client;
use textwrap::wrap;
use tracing::{debug, info};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use url::Url;

use crate::data::MediaService;
use crate::gallery::{Board, Card, Command, Detail, Focus, Gallery, HitTarget};
use crate::loader::{self, AsyncResponse};
use crate::media::{DetailMedia, MediaKind};
use crate::preview;

const CARD_HEIGHT: u16 = 5;
const CAPTION_LINES: usize = 2;

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BACKDROP: Color = Color::Rgb(17, 17, 27);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_TEXT_DIM: Color = Color::Rgb(88, 91, 112);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_VIDEO: Color = Color::Rgb(250, 179, 135);
const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const CLOSE_LABEL: &str = "Close";

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

enum PreviewState {
    Pending,
    Ready(RgbImage),
    Failed,
}

struct RenderedPreview {
    url: String,
    cols: u16,
    rows: u16,
    lines: Vec<Line<'static>>,
}

pub struct Options {
    pub service: Arc<dyn MediaService>,
    pub columns: usize,
    pub preview_client: Option<Client>,
    pub config_path: String,
}

pub struct Model {
    gallery: Gallery,
    service: Arc<dyn MediaService>,
    source_label: String,
    config_path: String,
    preview_client: Option<Client>,
    previews: HashMap<String, PreviewState>,
    rendered_preview: Option<RenderedPreview>,
    hits: Vec<(Rect, HitTarget)>,
    row_offset: usize,
    scroll_anchor: Focus,
    spinner: Spinner,
    needs_redraw: bool,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let percent_x = percent_x.min(100);
    let percent_y = percent_y.min(100);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage(100 - percent_x - (100 - percent_x) / 2),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage(100 - percent_y - (100 - percent_y) / 2),
        ])
        .split(horizontal[1]);
    vertical[1]
}

fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

fn source_label(url: &str) -> String {
    if url.trim().is_empty() {
        return String::new();
    }
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .filter(|segment| !segment.is_empty())
            .or_else(|| parsed.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string()),
        Err(_) => url.to_string(),
    }
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn button_span(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default().bg(COLOR_PANEL_FOCUSED_BG);
    style = if !enabled {
        style.fg(COLOR_TEXT_DIM).add_modifier(Modifier::ITALIC)
    } else if focused {
        style
            .fg(COLOR_BG)
            .bg(COLOR_ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        style.fg(COLOR_TEXT_PRIMARY).add_modifier(Modifier::BOLD)
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn card_lines(card: &Card, width: usize) -> Vec<Line<'static>> {
    let caption_style = match card.kind {
        MediaKind::Video => Style::default().fg(COLOR_VIDEO),
        MediaKind::Image => Style::default().fg(COLOR_TEXT_PRIMARY),
    }
    .add_modifier(Modifier::BOLD);

    let width = width.max(1);
    let mut lines: Vec<Line<'static>> = wrap(&card.caption, width)
        .into_iter()
        .take(CAPTION_LINES)
        .map(|line| Line::from(Span::styled(line.into_owned(), caption_style)))
        .collect();
    while lines.len() < CAPTION_LINES {
        lines.push(Line::default());
    }

    let source = if card.source.is_empty() {
        Span::styled(
            "no preview source".to_string(),
            Style::default()
                .fg(COLOR_TEXT_DIM)
                .add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::styled(
            truncate_to_width(
                &format!("{}: {}", card.kind.label(), source_label(&card.source)),
                width,
            ),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        )
    };
    lines.push(Line::from(source));
    lines
}

fn scroll_rows(offset: usize, focus_row: usize, visible: usize, total: usize) -> usize {
    let visible = visible.max(1);
    let mut offset = offset;
    if focus_row < offset {
        offset = focus_row;
    } else if focus_row >= offset + visible {
        offset = focus_row + 1 - visible;
    }
    offset.min(total.saturating_sub(visible))
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            gallery: Gallery::new(opts.columns),
            source_label: opts.service.describe(),
            service: opts.service,
            config_path: opts.config_path,
            preview_client: opts.preview_client,
            previews: HashMap::new(),
            rendered_preview: None,
            hits: Vec::new(),
            row_offset: 0,
            scroll_anchor: Focus::None,
            spinner: Spinner::new(),
            needs_redraw: true,
            response_tx,
            response_rx,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(DisableMouseCapture)?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key.code) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.gallery.is_loading() {
                    if self.spinner.advance() {
                        self.mark_dirty();
                    }
                } else {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    // true = quit
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let command = self.gallery.handle_key(code);
        let quit = self.apply_command(command);
        self.after_interaction();
        quit
    }

    fn handle_mouse(&mut self, event: MouseEvent) {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let target = self.hit_test(event.column, event.row);
                let target = match target {
                    Some(target) => target,
                    None if self.gallery.is_overlay_open() => HitTarget::Backdrop,
                    None => return,
                };
                let command = self.gallery.handle_click(target);
                self.apply_command(command);
                self.after_interaction();
            }
            MouseEventKind::ScrollDown if !self.gallery.is_overlay_open() => {
                self.row_offset = self.row_offset.saturating_add(1);
                self.mark_dirty();
            }
            MouseEventKind::ScrollUp if !self.gallery.is_overlay_open() => {
                self.row_offset = self.row_offset.saturating_sub(1);
                self.mark_dirty();
            }
            _ => {}
        }
    }

    fn hit_test(&self, column: u16, row: u16) -> Option<HitTarget> {
        self.hits
            .iter()
            .rev()
            .find(|(rect, _)| rect_contains(*rect, column, row))
            .map(|(_, target)| *target)
    }

    fn after_interaction(&mut self) {
        self.ensure_preview_requested();
        self.mark_dirty();
    }

    fn apply_command(&mut self, command: Command) -> bool {
        match command {
            Command::None => false,
            Command::Quit => true,
            Command::Load => {
                self.start_load();
                false
            }
            Command::OpenUrl(url) => {
                match webbrowser::open(&url) {
                    Ok(_) => self.gallery.set_status(format!("Opened {url} in your browser.")),
                    Err(err) => self
                        .gallery
                        .set_status(format!("Failed to open {url}: {err}")),
                }
                false
            }
        }
    }

    fn start_load(&mut self) {
        let Some(request_id) = self.gallery.begin_load() else {
            return;
        };
        info!(request_id, source = %self.source_label, "fetching media");
        self.spinner.reset();
        loader::spawn_media_load(self.service.clone(), request_id, self.response_tx.clone());
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Media { request_id, result } => {
                if self.gallery.finish_load(request_id, result) {
                    self.row_offset = 0;
                    self.scroll_anchor = Focus::None;
                }
            }
            AsyncResponse::Preview { url, result } => {
                let state = match result {
                    Ok(image) => PreviewState::Ready(image),
                    Err(_) => PreviewState::Failed,
                };
                self.previews.insert(url, state);
            }
        }
    }

    fn ensure_preview_requested(&mut self) {
        let Some(client) = &self.preview_client else {
            return;
        };
        let Some(source) = self.gallery.detail().and_then(Detail::still_source) else {
            return;
        };
        if self.previews.contains_key(source) {
            return;
        }
        debug!(url = %source, "requesting preview");
        let source = source.to_string();
        self.previews.insert(source.clone(), PreviewState::Pending);
        preview::spawn_preview(client.clone(), source, self.response_tx.clone());
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        self.hits.clear();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.gallery.is_loading() {
            format!("{} {}", self.spinner.frame(), self.gallery.status())
        } else {
            self.gallery.status().to_string()
        };
        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        self.draw_toolbar(frame, layout[1]);
        self.draw_board(frame, layout[2]);

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[3]);

        if self.gallery.is_overlay_open() {
            self.draw_overlay(frame, full);
        }
    }

    fn draw_toolbar(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let button = button_span(
            self.gallery.trigger_label(),
            self.gallery.focus() == Focus::Trigger && !self.gallery.is_overlay_open(),
            self.gallery.trigger_enabled(),
        );
        let button_width = (button.width() as u16).min(area.width);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(button_width)])
            .split(area);

        let title = Line::from(vec![
            Span::styled(
                " APOD-TUI ",
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("· {}", self.source_label),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ),
        ]);
        frame.render_widget(
            Paragraph::new(title).style(Style::default().bg(COLOR_PANEL_BG)),
            chunks[0],
        );
        frame.render_widget(Paragraph::new(Line::from(button)), chunks[1]);
        self.hits.push((chunks[1], HitTarget::Trigger));
    }

    fn draw_board(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER_IDLE))
            .style(Style::default().bg(COLOR_PANEL_BG));

        let cards = match self.gallery.board() {
            Board::Message(message) => {
                let paragraph = Paragraph::new(message.clone())
                    .block(block.title(Span::styled(
                        "Gallery",
                        Style::default().fg(COLOR_ACCENT),
                    )))
                    .style(Style::default().fg(COLOR_TEXT_SECONDARY))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                frame.render_widget(paragraph, area);
                return;
            }
            Board::Cards(cards) => cards.clone(),
        };

        let inner = block.inner(area);
        let columns = self.gallery.columns();
        let total_rows = cards.len().div_ceil(columns);
        let visible_rows = usize::from((inner.height / CARD_HEIGHT).max(1));

        let focus = self.gallery.focus();
        if focus != self.scroll_anchor {
            if let Focus::Card(index) = focus {
                self.row_offset =
                    scroll_rows(self.row_offset, index / columns, visible_rows, total_rows);
            }
            self.scroll_anchor = focus;
        }
        self.row_offset = self
            .row_offset
            .min(total_rows.saturating_sub(visible_rows));

        let last_row = (self.row_offset + visible_rows).min(total_rows);
        let title = format!(
            "Gallery · {} entries · rows {}-{} of {}",
            cards.len(),
            self.row_offset + 1,
            last_row,
            total_rows
        );
        frame.render_widget(
            block.title(Span::styled(title, Style::default().fg(COLOR_ACCENT))),
            area,
        );

        let constraints: Vec<Constraint> = (0..columns)
            .map(|_| Constraint::Ratio(1, columns as u32))
            .collect();

        for (visible_row, row) in (self.row_offset..last_row).enumerate() {
            let y = inner.y + (visible_row as u16) * CARD_HEIGHT;
            if y + CARD_HEIGHT > inner.y + inner.height {
                break;
            }
            let row_area = Rect {
                x: inner.x,
                y,
                width: inner.width,
                height: CARD_HEIGHT,
            };
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(constraints.clone())
                .split(row_area);

            for (column, cell) in cells.iter().enumerate() {
                let Some(card) = cards.get(row * columns + column) else {
                    break;
                };
                self.draw_card(frame, *cell, card, focus == Focus::Card(card.index));
            }
        }
    }

    fn draw_card(&mut self, frame: &mut Frame<'_>, area: Rect, card: &Card, focused: bool) {
        let (border, background) = if focused {
            (COLOR_BORDER_FOCUSED, COLOR_PANEL_SELECTED_BG)
        } else {
            (COLOR_BORDER_IDLE, COLOR_PANEL_BG)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(background))
            .title(Span::styled(
                format!(" {} ", card.index + 1),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ));
        let inner = block.inner(area);
        let lines = card_lines(card, usize::from(inner.width));
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
        self.hits.push((area, HitTarget::Card(card.index)));
    }

    fn draw_overlay(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let Some(detail) = self.gallery.detail().cloned() else {
            return;
        };
        let focus = self.gallery.focus();

        frame.render_widget(
            Block::default().style(Style::default().fg(COLOR_TEXT_DIM).bg(COLOR_BACKDROP)),
            area,
        );
        self.hits.push((area, HitTarget::Backdrop));

        let panel = centered_rect(80, 85, area);
        frame.render_widget(Clear, panel);
        let block = Block::default()
            .title(Span::styled(
                detail.title.clone(),
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_ACCENT))
            .style(Style::default().bg(COLOR_PANEL_BG));
        let inner = block.inner(panel);
        frame.render_widget(block, panel);
        self.hits.push((panel, HitTarget::Panel));

        let link_rows = detail.links.len() as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Percentage(55),
                Constraint::Length(link_rows),
                Constraint::Min(3),
            ])
            .split(inner);

        let close = button_span(CLOSE_LABEL, focus == Focus::Close, true);
        let close_width = (close.width() as u16).min(chunks[0].width);
        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(close_width)])
            .split(chunks[0]);
        frame.render_widget(
            Paragraph::new(detail.date.clone()).style(Style::default().fg(COLOR_TEXT_SECONDARY)),
            header[0],
        );
        frame.render_widget(Paragraph::new(Line::from(close)), header[1]);
        self.hits.push((header[1], HitTarget::Close));

        let media = self.media_text(&detail, chunks[1]);
        frame.render_widget(
            Paragraph::new(media).alignment(Alignment::Center),
            chunks[1],
        );

        for (index, link) in detail.links.iter().enumerate() {
            let row = Rect {
                x: chunks[2].x,
                y: chunks[2].y + index as u16,
                width: chunks[2].width,
                height: 1,
            };
            if row.y >= chunks[2].y + chunks[2].height {
                break;
            }
            let span = button_span(&link.label, focus == Focus::Link(index), true);
            let width = (span.width() as u16).min(row.width);
            frame.render_widget(Paragraph::new(Line::from(span)), row);
            self.hits.push((
                Rect {
                    width,
                    ..row
                },
                HitTarget::Link(index),
            ));
        }

        let explanation = Paragraph::new(detail.explanation.clone())
            .style(Style::default().fg(COLOR_TEXT_PRIMARY))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::TOP).border_style(
                Style::default().fg(COLOR_BORDER_IDLE),
            ));
        frame.render_widget(explanation, chunks[3]);
    }

    fn media_text(&mut self, detail: &Detail, area: Rect) -> Text<'static> {
        let secondary = Style::default().fg(COLOR_TEXT_SECONDARY);
        match &detail.media {
            DetailMedia::Player {
                video_id,
                embed_url,
                ..
            } => Text::from(vec![
                Line::default(),
                Line::from(Span::styled(
                    format!("▶ YouTube video {video_id}"),
                    Style::default()
                        .fg(COLOR_VIDEO)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(embed_url.clone(), secondary)),
            ]),
            DetailMedia::Still { source, .. } if source.is_empty() => Text::from(Line::from(
                Span::styled("No image available.", secondary),
            )),
            DetailMedia::Still { source, .. } => {
                let label = format!("[image: {}]", source_label(source));
                if self.preview_client.is_none() {
                    return Text::from(vec![
                        Line::from(Span::styled(label, secondary)),
                        Line::from(Span::styled(source.clone(), secondary)),
                    ]);
                }
                if let Some(lines) = self.preview_lines(source, area) {
                    return Text::from(lines);
                }
                match self.previews.get(source) {
                    Some(PreviewState::Failed) => Text::from(vec![
                        Line::from(Span::styled(label, secondary)),
                        Line::from(Span::styled(
                            "Preview unavailable.",
                            Style::default().fg(COLOR_ERROR),
                        )),
                    ]),
                    _ => Text::from(vec![
                        Line::from(Span::styled(label, secondary)),
                        Line::from(Span::styled(
                            format!("{} Loading image...", self.spinner.frame()),
                            secondary,
                        )),
                    ]),
                }
            }
        }
    }

    fn preview_lines(&mut self, url: &str, area: Rect) -> Option<Vec<Line<'static>>> {
        if let Some(cached) = &self.rendered_preview {
            if cached.url == url && cached.cols == area.width && cached.rows == area.height {
                return Some(cached.lines.clone());
            }
        }
        let Some(PreviewState::Ready(image)) = self.previews.get(url) else {
            return None;
        };
        let lines = preview::half_block_lines(image, area.width, area.height);
        self.rendered_preview = Some(RenderedPreview {
            url: url.to_string(),
            cols: area.width,
            rows: area.height,
            lines: lines.clone(),
        });
        Some(lines)
    }

    fn footer_text(&self) -> String {
        if self.gallery.is_overlay_open() {
            return "Detail: Tab move · Enter/Space activate · Esc or click outside to close"
                .to_string();
        }
        let mut parts: Vec<String> = Vec::new();
        if self.gallery.cards().is_empty() {
            parts.push("r or Enter on the button loads the gallery".to_string());
        } else {
            parts.push("Tab/arrows move · Enter/Space open · click a card".to_string());
            parts.push("r reload".to_string());
        }
        parts.push(format!("config: {}", self.config_path));
        parts.push("q quit".to_string());
        parts.join(" · ")
    }
}
