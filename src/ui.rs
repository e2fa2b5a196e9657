// src/ui.rs
use crate::app::{App, FocusedPanel};
use crate::episode::Episode;
use crate::episode_download::FeedState;
use crate::episode_factory::convert_duration_to_time_string;
use chrono::{DateTime, Locale, Local, TimeZone};
use log::warn;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};
use std::rc::Rc;

const BRAND_COLOR: Color = Color::Rgb(130, 87, 229);
const DEFAULT_TEXT_WIDTH: usize = 80;

/// Header date, `EEEEEE, d MMMM` in Brazilian Portuguese (e.g. `sex, 8 janeiro`).
pub fn format_header_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format_localized("%a, %-d %B", Locale::pt_BR).to_string()
}

/// Show notes arrive as HTML; anything that looks like markup goes through html2text.
pub fn format_description(description: Option<&str>) -> String {
    match description {
        Some(desc_str) if desc_str.contains('<') && desc_str.contains("</") => {
            match html2text::from_read(desc_str.as_bytes(), DEFAULT_TEXT_WIDTH) {
                Ok(text_content) => text_content
                    .lines()
                    .map(|line| line.trim_end())
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<&str>>()
                    .join("\n"),
                Err(e) => {
                    warn!("Failed to parse HTML description with html2text: {}", e);
                    desc_str.to_string()
                }
            }
        }
        Some(desc_str) => desc_str.to_string(),
        None => "Sem descrição para este episódio.".to_string(),
    }
    .trim()
    .to_string()
}

/// Members, date and duration above the show notes.
pub fn format_episode_details(episode: &Episode) -> String {
    format!(
        "{}\n{} · {}\n\n{}",
        episode.members(),
        episode.published_at(),
        episode.duration_as_string(),
        format_description(episode.description())
    )
}

pub struct LayoutChunks {
    pub header_chunk: Rect,
    pub latest_chunk: Rect,
    pub all_chunk: Rect,
    pub show_notes_chunk: Rect,
    pub player_chunk: Rect,
    pub hint_chunk: Rect,
}

pub fn compute_layout(frame_size: Rect) -> LayoutChunks {
    let main_chunks: Rc<[Rect]> = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame_size);

    let content_columns: Rc<[Rect]> = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(main_chunks[1]);

    let list_rows: Rc<[Rect]> = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(content_columns[0]);

    LayoutChunks {
        header_chunk: main_chunks[0],
        latest_chunk: list_rows[0],
        all_chunk: list_rows[1],
        show_notes_chunk: content_columns[1],
        player_chunk: main_chunks[2],
        hint_chunk: main_chunks[3],
    }
}

/// Updates state that depends on the frame size, outside the draw closure.
pub fn prepare_ui_layout(app: &mut App, frame_size: Rect) {
    let layout_chunks: LayoutChunks = compute_layout(frame_size);
    let inner_area: Rect = Block::default().borders(Borders::ALL).inner(layout_chunks.show_notes_chunk);
    app.show_notes_state.set_dimensions(inner_area.width, inner_area.height);
}

fn panel_block(title: String, focused: bool) -> Block<'static> {
    let border_style = if focused {
        Style::default().fg(BRAND_COLOR)
    } else {
        Style::default().fg(Color::White)
    };
    Block::default().title(title).borders(Borders::ALL).border_style(border_style)
}

fn render_header(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("Podcastr", Style::default().fg(BRAND_COLOR).add_modifier(Modifier::BOLD)),
        Span::raw("  |  O melhor para você ouvir, sempre  |  "),
        Span::raw(format_header_date(&Local::now())),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, area);
}

fn render_latest(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused_panel == FocusedPanel::Latest;
    let block = panel_block("Últimos lançamentos".to_string(), focused);

    let items: Vec<ListItem> = match &app.feed_state {
        FeedState::Loaded(feed) => feed
            .latest
            .iter()
            .map(|episode| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        episode.title().to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!(
                            "{} · {} · {}",
                            episode.members(),
                            episode.published_at(),
                            episode.duration_as_string()
                        ),
                        Style::default().fg(Color::Gray),
                    )),
                ])
            })
            .collect(),
        FeedState::Unavailable(reason) => {
            vec![ListItem::new(format!("Episódios indisponíveis: {}", reason))
                .style(Style::default().fg(Color::Red))]
        }
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol(if focused { ">> " } else { "   " });
    let mut state = ListState::default();
    state.select(app.selected_latest_index);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_all_episodes(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused_panel == FocusedPanel::AllEpisodes;
    let block = panel_block("Todos episódios".to_string(), focused);

    let rows: Vec<Row> = app
        .feed_state
        .feed()
        .map(|feed| {
            feed.all
                .iter()
                .map(|episode| {
                    Row::new(vec![
                        Cell::from(episode.title().to_string()),
                        Cell::from(episode.members().to_string()),
                        Cell::from(episode.published_at().to_string()),
                        Cell::from(episode.duration_as_string().to_string()),
                    ])
                })
                .collect()
        })
        .unwrap_or_default();

    let header = Row::new(vec!["Podcast", "Integrantes", "Data", "Duração"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Percentage(42),
        Constraint::Percentage(30),
        Constraint::Length(10),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol(if focused { ">> " } else { "   " });
    let mut state = TableState::default();
    state.select(app.selected_all_index);
    f.render_stateful_widget(table, area, &mut state);
}

fn render_show_notes(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused_panel == FocusedPanel::ShowNotes;
    let title = app
        .selected_episode()
        .map_or_else(|| "Detalhes".to_string(), |e| format!("Detalhes: {}", e.title()));

    let paragraph = Paragraph::new(app.show_notes_state.content.clone())
        .wrap(Wrap { trim: true })
        .block(panel_block(title, focused))
        .scroll((app.show_notes_state.scroll_offset_vertical, 0));
    f.render_widget(paragraph, area);
}

fn render_player(f: &mut Frame, app: &App, area: Rect) {
    let snapshot = &app.player_snapshot;
    let block = Block::default()
        .title("Tocando agora")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRAND_COLOR));

    let Some(episode) = snapshot.current_episode() else {
        let empty = Paragraph::new("Selecione um podcast para ouvir")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    };

    let inner = block.inner(area);
    f.render_widget(block, area);
    let rows: Rc<[Rect]> = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let flag = |on: bool, label: &'static str| {
        let style = if on { Style::default().fg(BRAND_COLOR) } else { Style::default().fg(Color::DarkGray) };
        Span::styled(label, style)
    };
    let now_playing = Line::from(vec![
        Span::raw(if snapshot.is_playing { "▶ " } else { "⏸ " }),
        Span::styled(episode.title().to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" - {}  ", episode.members())),
        flag(snapshot.has_previous, "[b]anterior "),
        flag(snapshot.has_next, "[n]próximo "),
        flag(snapshot.is_looping, "[l]repetir "),
        flag(snapshot.is_shuffling, "[s]aleatório"),
    ]);
    f.render_widget(Paragraph::new(now_playing), rows[0]);

    let label = format!(
        "{} / {}",
        convert_duration_to_time_string(app.clock.elapsed().as_secs()),
        episode.duration_as_string()
    );
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(BRAND_COLOR).bg(Color::Black))
        .ratio(app.clock.progress(&app.player))
        .label(label);
    f.render_widget(gauge, rows[1]);
}

pub fn ui(f: &mut Frame, app: &App) {
    let layout_chunks: LayoutChunks = compute_layout(f.size());

    render_header(f, layout_chunks.header_chunk);
    render_latest(f, app, layout_chunks.latest_chunk);
    render_all_episodes(f, app, layout_chunks.all_chunk);
    render_show_notes(f, app, layout_chunks.show_notes_chunk);
    render_player(f, app, layout_chunks.player_chunk);

    let hint_text: &str = "[Tab] Painel | [↑/↓] Navegar | [Enter] Tocar lista | [p] Tocar episódio | [Espaço] Play/Pause | [c] Limpar | [q] Sair";
    let hint_widget: Paragraph = Paragraph::new(hint_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint_widget, layout_chunks.hint_chunk);
}
