//! Main content area rendering (song lists and the queue)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{ActiveSection, ContentState, ContentView, Song, UiState};
use super::utils::{calculate_num_width, format_song_duration, truncate_string};

pub fn render_main_content(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    content_state: &ContentState,
    queue: &[Song],
    queue_index: Option<usize>,
    playing_song_id: Option<&str>,
) {
    let is_focused = ui_state.active_section == ActiveSection::MainContent;
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    if content_state.is_loading {
        let loading = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Content ")
                    .border_style(border_style),
            );
        frame.render_widget(loading, area);
        return;
    }

    match &content_state.view {
        ContentView::Empty => {
            let content = Paragraph::new(
                "Type in search and press Enter to find music\n\nUse Tab to navigate between sections\nUse ↑/↓ to select items\nPress Enter to play",
            )
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .padding(Padding::horizontal(1))
                    .border_style(border_style),
            );
            frame.render_widget(content, area);
        }
        ContentView::Songs { title, songs, selected } => {
            render_song_list(
                frame,
                area,
                &format!(" {} ({}) ", title, songs.len()),
                songs,
                *selected,
                is_focused,
                playing_song_id,
            );
        }
        ContentView::Queue { selected } => {
            render_queue(
                frame,
                area,
                queue,
                queue_index,
                *selected,
                is_focused,
            );
        }
    }
}

fn render_song_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    songs: &[Song],
    selected: usize,
    is_focused: bool,
    playing_song_id: Option<&str>,
) {
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    if songs.is_empty() {
        let empty = Paragraph::new("Nothing here yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title.to_string())
                    .padding(Padding::horizontal(1))
                    .border_style(border_style),
            );
        frame.render_widget(empty, area);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let items = song_items(songs, selected, is_focused, playing_song_id, content_width);

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .padding(Padding::horizontal(1))
                .border_style(border_style),
        )
        .highlight_style(Style::default());

    let mut list_state = ListState::default();
    list_state.select(Some(selected + 1)); // +1 for header

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn song_items(
    songs: &[Song],
    selected: usize,
    is_focused: bool,
    playing_song_id: Option<&str>,
    content_width: usize,
) -> Vec<ListItem<'static>> {
    let num_width = calculate_num_width(songs.len());
    let duration_width = 6;
    // leading space + number + marker + separators + duration column
    let fixed_width = 1 + num_width + 2 + 2 + 2 + 2 + duration_width;
    let remaining = content_width.saturating_sub(fixed_width);
    let title_width = (remaining * 45) / 100;
    let artist_width = (remaining * 30) / 100;
    let album_width = remaining.saturating_sub(title_width + artist_width);

    let mut items = Vec::with_capacity(songs.len() + 1);

    let header = format!(
        " {:>num_width$}    {}  {}  {}  {:>duration_width$}",
        "#",
        truncate_string("Title", title_width),
        truncate_string("Artist", artist_width),
        truncate_string("Album", album_width),
        "Length",
    );
    items.push(ListItem::new(header).style(Style::default().fg(Color::DarkGray)));

    for (i, song) in songs.iter().enumerate() {
        let is_playing_row = playing_song_id == Some(song.id.as_str());
        let marker = if is_playing_row { "▶ " } else { "  " };
        let row = format!(
            " {:>num_width$}  {}{}  {}  {}  {:>duration_width$}",
            i + 1,
            marker,
            truncate_string(&song.title, title_width),
            truncate_string(&song.artist, artist_width),
            truncate_string(song.album.as_deref().unwrap_or("-"), album_width),
            format_song_duration(song.duration),
        );

        let style = if i == selected && is_focused {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if i == selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else if is_playing_row {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        items.push(ListItem::new(row).style(style));
    }

    items
}

fn render_queue(
    frame: &mut Frame,
    area: Rect,
    queue: &[Song],
    queue_index: Option<usize>,
    selected: usize,
    is_focused: bool,
) {
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    if queue.is_empty() {
        let empty = Paragraph::new("Queue is empty\n\nOpen a song list and press Enter to start one")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Queue ")
                    .padding(Padding::horizontal(1))
                    .border_style(border_style),
            );
        frame.render_widget(empty, area);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let num_width = calculate_num_width(queue.len());
    let duration_width = 6;
    let fixed_width = 1 + num_width + 2 + 2 + 2 + duration_width;
    let remaining = content_width.saturating_sub(fixed_width);
    let title_width = (remaining * 55) / 100;
    let artist_width = remaining.saturating_sub(title_width);

    let items: Vec<ListItem> = queue
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let is_cursor = queue_index == Some(i);
            let marker = if is_cursor { "▶ " } else { "  " };
            let row = format!(
                " {:>num_width$}  {}{}  {}  {:>duration_width$}",
                i + 1,
                marker,
                truncate_string(&song.title, title_width),
                truncate_string(&song.artist, artist_width),
                format_song_duration(song.duration),
            );

            let style = if i == selected && is_focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if i == selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else if is_cursor {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            ListItem::new(row).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Queue ({} songs) ", queue.len()))
                .padding(Padding::horizontal(1))
                .border_style(border_style),
        )
        .highlight_style(Style::default());

    let mut list_state = ListState::default();
    list_state.select(Some(selected));

    frame.render_stateful_widget(list, area, &mut list_state);
}
