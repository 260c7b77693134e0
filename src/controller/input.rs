//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{ActiveSection, SessionPhase};
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;
        let phase = match model.get_session().await {
            Some(session) => session.phase().await,
            None => SessionPhase::Bootstrapping,
        };

        if phase != SessionPhase::Authenticated {
            drop(model);
            return self.handle_auth_key(key, phase).await;
        }

        // Handle error message first (blocks all other interactions)
        if model.has_error().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    model.clear_error().await;
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        // Handle help popup
        if model.is_help_popup_open().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => {
                    model.hide_help_popup().await;
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        // Handle create-playlist input modal
        if model.is_create_playlist_open().await {
            match key.code {
                KeyCode::Esc => model.close_create_playlist().await,
                KeyCode::Enter => {
                    let name = model.get_create_playlist_input().await;
                    model.close_create_playlist().await;
                    drop(model);
                    self.create_playlist(&name).await;
                }
                KeyCode::Backspace => model.create_playlist_backspace().await,
                KeyCode::Char(c) => model.create_playlist_input_char(c).await,
                _ => {}
            }
            return Ok(());
        }

        // Handle add-to-playlist picker modal
        if model.is_playlist_picker_open().await {
            match key.code {
                KeyCode::Up => model.picker_move_up().await,
                KeyCode::Down => model.picker_move_down().await,
                KeyCode::Enter => {
                    if let Some((playlist, song)) = model.get_picker_selection().await {
                        model.close_playlist_picker().await;
                        drop(model);
                        self.add_song_to_playlist(&playlist.id, &song.id).await;
                    }
                }
                KeyCode::Esc | KeyCode::Char('a') | KeyCode::Char('A') => {
                    model.close_playlist_picker().await;
                }
                _ => {}
            }
            return Ok(());
        }

        let ui_state = model.get_ui_state().await;

        // Handle search input when in search section
        if ui_state.active_section == ActiveSection::Search {
            match key.code {
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        model.cycle_section_backward().await;
                    } else {
                        model.cycle_section_forward().await;
                    }
                    return Ok(());
                }
                KeyCode::Enter => {
                    let query = ui_state.search_query.clone();
                    drop(model);
                    if !query.is_empty() {
                        self.perform_search(&query).await;
                    }
                    return Ok(());
                }
                KeyCode::Esc => {
                    model.update_search_query(String::new()).await;
                    return Ok(());
                }
                KeyCode::Backspace => {
                    model.backspace_search().await;
                    return Ok(());
                }
                KeyCode::Char(c) => {
                    // Q still quits even in search mode when Ctrl is pressed
                    if (c == 'q' || c == 'Q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        model.set_should_quit(true).await;
                        return Ok(());
                    }
                    model.append_to_search(c).await;
                    return Ok(());
                }
                _ => {}
            }
        }

        // Handle MainContent section navigation
        if ui_state.active_section == ActiveSection::MainContent {
            match key.code {
                KeyCode::Up => {
                    model.content_move_up().await;
                    return Ok(());
                }
                KeyCode::Down => {
                    let (queue, _) = model.get_queue_snapshot().await;
                    model.content_move_down(queue.len()).await;
                    return Ok(());
                }
                KeyCode::Enter => {
                    drop(model);
                    self.play_selected().await;
                    return Ok(());
                }
                KeyCode::Backspace | KeyCode::Esc => {
                    model.navigate_back().await;
                    return Ok(());
                }
                KeyCode::Char('a') | KeyCode::Char('A') => {
                    if let Some(song) = model.get_selected_song().await {
                        model.open_playlist_picker(song).await;
                    }
                    return Ok(());
                }
                _ => {}
            }
        }

        // Global keybindings
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    model.cycle_section_backward().await;
                } else {
                    model.cycle_section_forward().await;
                }
            }
            KeyCode::BackTab => {
                model.cycle_section_backward().await;
            }
            KeyCode::Up => {
                model.move_selection_up().await;
            }
            KeyCode::Down => {
                model.move_selection_down().await;
            }
            KeyCode::Enter => {
                // Handle Enter based on active section
                let ui_state = model.get_ui_state().await;
                if ui_state.active_section == ActiveSection::Library {
                    let selected = ui_state.library_selected;
                    drop(model);
                    self.open_library_item(selected).await;
                    return Ok(());
                }
            }
            // Play/Pause toggle
            KeyCode::Char(' ') => {
                drop(model);
                self.toggle_playback().await;
            }
            // Next track
            KeyCode::Char('n') | KeyCode::Char('N') => {
                drop(model);
                self.next_track().await;
            }
            // Previous track
            KeyCode::Char('p') | KeyCode::Char('P') => {
                drop(model);
                self.previous_track().await;
            }
            // Volume up
            KeyCode::Char('+') | KeyCode::Char('=') => {
                drop(model);
                self.volume_up().await;
            }
            // Volume down
            KeyCode::Char('-') => {
                drop(model);
                self.volume_down().await;
            }
            // Seek backward / forward
            KeyCode::Char(',') => {
                drop(model);
                self.seek_backward().await;
            }
            KeyCode::Char('.') => {
                drop(model);
                self.seek_forward().await;
            }
            // Show queue
            KeyCode::Char('u') | KeyCode::Char('U') => {
                model.show_queue_view().await;
                model.set_active_section(ActiveSection::MainContent).await;
            }
            // Create playlist
            KeyCode::Char('c') | KeyCode::Char('C') => {
                model.open_create_playlist().await;
            }
            // Focus search
            KeyCode::Char('g') | KeyCode::Char('G') => {
                model.set_active_section(ActiveSection::Search).await;
            }
            // Focus playlists
            KeyCode::Char('l') | KeyCode::Char('L') => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    drop(model);
                    self.logout().await;
                } else {
                    model.set_active_section(ActiveSection::Playlists).await;
                }
            }
            // Show help popup
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.show_help_popup().await;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_auth_key(&self, key: KeyEvent, phase: SessionPhase) -> Result<()> {
        let model = self.model.lock().await;

        // Ignore everything except quit while the stored credential is
        // still being checked.
        if phase == SessionPhase::Bootstrapping {
            if key.code == KeyCode::Esc {
                model.set_should_quit(true).await;
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => {
                model.set_should_quit(true).await;
            }
            KeyCode::Tab | KeyCode::Down => {
                model.auth_focus_next().await;
            }
            KeyCode::BackTab | KeyCode::Up => {
                model.auth_focus_prev().await;
            }
            KeyCode::Enter => {
                drop(model);
                self.submit_auth().await;
            }
            KeyCode::Backspace => {
                model.auth_backspace().await;
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    match c {
                        // Switch between login and register
                        't' | 'T' => model.toggle_auth_mode().await,
                        // Toggle "remember me"
                        'r' | 'R' => model.toggle_remember().await,
                        'q' | 'Q' => model.set_should_quit(true).await,
                        _ => {}
                    }
                } else {
                    model.auth_input(c).await;
                }
            }
            _ => {}
        }
        Ok(())
    }
}
