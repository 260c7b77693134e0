//! Content view state for the main area

use super::types::Song;

/// Represents the current view in the main content area
#[derive(Clone, Debug, Default)]
pub enum ContentView {
    #[default]
    Empty,
    /// A titled list of songs (library listing or search results).
    Songs {
        title: String,
        songs: Vec<Song>,
        selected: usize,
    },
    /// The playback queue; contents come from the player core at render time.
    Queue {
        selected: usize,
    },
}

/// State for the main content area
#[derive(Clone, Debug, Default)]
pub struct ContentState {
    pub view: ContentView,
    pub navigation_stack: Vec<ContentView>,
    pub is_loading: bool,
}
