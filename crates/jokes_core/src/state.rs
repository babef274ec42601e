use crate::{Joke, Query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Progress {
    #[default]
    NotShown,
    Shown,
    Hidden,
}

/// Per-cycle aggregation state. Created fresh for every search and dropped when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCycle {
    query: Query,
    jokes: Vec<Joke>,
    pages: usize,
    progress: Progress,
    finished: bool,
}

impl SearchCycle {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            jokes: Vec::new(),
            pages: 0,
            progress: Progress::NotShown,
            finished: false,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Aggregate so far, most recent page first.
    pub fn jokes(&self) -> &[Joke] {
        &self.jokes
    }

    pub fn is_empty(&self) -> bool {
        self.jokes.is_empty()
    }

    pub fn pages_received(&self) -> usize {
        self.pages
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_progress_visible(&self) -> bool {
        self.progress == Progress::Shown
    }

    pub(crate) fn prepend_page(&mut self, page: Vec<Joke>) {
        self.pages += 1;
        let older = std::mem::replace(&mut self.jokes, page);
        self.jokes.extend(older);
    }

    /// Returns true when the indicator transitions to shown.
    pub(crate) fn show_progress(&mut self) -> bool {
        if self.progress != Progress::NotShown {
            return false;
        }
        self.progress = Progress::Shown;
        true
    }

    /// Returns true when the indicator transitions to hidden.
    pub(crate) fn hide_progress(&mut self) -> bool {
        if self.progress != Progress::Shown {
            return false;
        }
        self.progress = Progress::Hidden;
        true
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }
}
