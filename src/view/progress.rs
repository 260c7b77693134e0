//! Transport bar rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::PlaybackInfo;
use super::utils::format_time;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let status_text = if let Some(error) = &playback.error {
        format!(" ⚠ {}", error)
    } else {
        match &playback.song {
            None => " No song playing".to_string(),
            Some(song) => {
                let album = song.album.as_deref().unwrap_or("Single");
                if playback.is_playing {
                    format!(" ▶ {} | {} ({})", song.title, song.artist, album)
                } else {
                    format!("⏸  {} | {} ({})", song.title, song.artist, album)
                }
            }
        }
    };

    let volume_text = format!("Vol: {}%", (playback.volume * 100.0).round() as u32);
    let queue_text = match playback.queue_position {
        Some(position) if playback.queue_len > 0 => {
            format!("Queue: {}/{}", position + 1, playback.queue_len)
        }
        _ => "Queue: -".to_string(),
    };

    let time_str = format!(
        "{} / {}",
        format_time(playback.current_time),
        format_time(playback.duration)
    );

    let progress_ratio = if playback.duration > 0.0 {
        (playback.current_time / playback.duration).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Length(3)])
        .split(area);

    let title = format!("{} ", status_text);
    let controls_info = format!(" {} | {} ", queue_text, volume_text);

    let gauge_color = if playback.error.is_some() {
        Color::Red
    } else {
        Color::Green
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, inner_chunks[0]);
}
