//src/history.rs
use crate::store::WorkoutSession;

pub const HISTORY_PAGE_SIZE: usize = 10;

/// Client-side pagination over the session list, most recent first.
///
/// A fixed page size, an end-of-data flag, and load-more calls that append
/// the next slice to the visible subset.
#[derive(Debug, Default)]
pub struct SessionHistory {
    sessions: Vec<WorkoutSession>,
    displayed: usize,
    current_page: usize,
    has_more: bool,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-runs the full load-sort-paginate sequence, resetting to page 1.
    /// Sessions are sorted descending by date.
    pub fn refresh(&mut self, mut sessions: Vec<WorkoutSession>) {
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        self.displayed = sessions.len().min(HISTORY_PAGE_SIZE);
        self.has_more = sessions.len() > HISTORY_PAGE_SIZE;
        self.current_page = 1;
        self.sessions = sessions;
    }

    /// Appends the next page to the displayed subset. Returns the number of
    /// newly displayed sessions; a call past the end is a no-op.
    pub fn load_more(&mut self) -> usize {
        if !self.has_more {
            return 0;
        }
        let next_page = self.current_page + 1;
        let start_index = (next_page - 1) * HISTORY_PAGE_SIZE;
        let end_index = start_index + HISTORY_PAGE_SIZE;

        if start_index >= self.sessions.len() {
            self.has_more = false;
            return 0;
        }
        let new_displayed = self.sessions.len().min(end_index);
        let appended = new_displayed - self.displayed;
        self.displayed = new_displayed;
        self.current_page = next_page;
        self.has_more = end_index < self.sessions.len();
        appended
    }

    /// The currently visible slice, newest first.
    pub fn displayed(&self) -> &[WorkoutSession] {
        &self.sessions[..self.displayed]
    }

    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total(&self) -> usize {
        self.sessions.len()
    }
}
