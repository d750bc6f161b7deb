use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::debounce::Debouncer;
use crate::error::FetchError;
use crate::models::{QueryCache, Story};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    FrontPageLoading,
    FrontPageLoaded,
    Searching,
    SearchLoaded,
    FetchFailed,
}

impl SearchState {
    pub fn is_loading(self) -> bool {
        matches!(self, SearchState::FrontPageLoading | SearchState::Searching)
    }

    fn loading_for(term: &str) -> Self {
        if term.is_empty() {
            SearchState::FrontPageLoading
        } else {
            SearchState::Searching
        }
    }

    fn loaded_for(term: &str) -> Self {
        if term.is_empty() {
            SearchState::FrontPageLoaded
        } else {
            SearchState::SearchLoaded
        }
    }
}

/// A fetch the controller wants issued. `generation` tags the eventual outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub term: String,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub term: String,
    pub result: Result<Vec<Story>, FetchError>,
}

/// Owns the committed search term and everything derived from it.
///
/// The controller does no I/O. Methods that may require network work return a
/// [`FetchRequest`]; whoever performs it feeds the result back through
/// [`QueryController::apply`]. Outcomes carrying an outdated generation are
/// dropped, so a slow response for an abandoned term never overwrites a newer one.
pub struct QueryController {
    debouncer: Debouncer,
    committed_term: Option<String>,
    generation: u64,
    state: SearchState,
    stories: Vec<Story>,
    cache: QueryCache,
}

impl QueryController {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            debouncer: Debouncer::new(config.debounce),
            committed_term: None,
            generation: 0,
            state: SearchState::FrontPageLoading,
            stories: Vec::new(),
            cache: QueryCache::new(config.cache_ttl),
        }
    }

    /// Kicks off the initial front-page load.
    pub fn start(&mut self, now: Instant) -> Option<FetchRequest> {
        self.commit("", now)
    }

    pub fn handle_input(&mut self, raw: &str, now: Instant) {
        self.debouncer.record_keystroke(raw, now);
    }

    /// Commits the debounced input once the quiet window has passed.
    pub fn tick(&mut self, now: Instant) -> Option<FetchRequest> {
        let value = self.debouncer.poll(now)?;
        self.commit(&value, now)
    }

    /// Commits whatever was typed without waiting for the quiet window.
    pub fn flush(&mut self, now: Instant) -> Option<FetchRequest> {
        let value = self.debouncer.flush()?;
        self.commit(&value, now)
    }

    fn commit(&mut self, raw: &str, now: Instant) -> Option<FetchRequest> {
        let term = raw.trim();
        // A failed term may be committed again to retry it
        let unchanged = self.committed_term.as_deref() == Some(term);
        if unchanged && self.state != SearchState::FetchFailed {
            debug!(term, "term unchanged, keeping current results");
            return None;
        }

        info!(term, "committing search term");
        self.committed_term = Some(term.to_string());
        self.generation += 1;

        let evicted = self.cache.evict_stale(now);
        if evicted > 0 {
            debug!(evicted, "evicted stale cache entries");
        }

        if let Some(cached) = self.cache.get_fresh(term, now) {
            debug!(term, count = cached.len(), "serving cached stories");
            self.stories = cached.to_vec();
            self.state = SearchState::loaded_for(term);
            return None;
        }

        self.state = SearchState::loading_for(term);
        Some(FetchRequest {
            generation: self.generation,
            term: term.to_string(),
        })
    }

    /// Re-fetches the committed term, bypassing the cache.
    ///
    /// Input still inside the quiet window is left pending and commits on a
    /// later [`QueryController::tick`].
    pub fn retry(&mut self) -> Option<FetchRequest> {
        let term = self.committed_term.clone()?;
        info!(term = %term, "retrying search");
        self.cache.invalidate(&term);
        self.generation += 1;
        self.state = SearchState::loading_for(&term);
        Some(FetchRequest {
            generation: self.generation,
            term,
        })
    }

    /// Applies a finished fetch. Returns false when the outcome was stale.
    pub fn apply(&mut self, outcome: FetchOutcome, now: Instant) -> bool {
        // Anything tagged with an older generation lost the race
        if outcome.generation != self.generation {
            debug!(
                term = %outcome.term,
                generation = outcome.generation,
                current = self.generation,
                "dropping stale fetch outcome"
            );
            return false;
        }

        match outcome.result {
            Ok(stories) => {
                info!(term = %outcome.term, count = stories.len(), "stories loaded");
                self.cache.update_stories(&outcome.term, stories.clone(), now);
                self.stories = stories;
                self.state = SearchState::loaded_for(&outcome.term);
            }
            Err(err) => {
                warn!(term = %outcome.term, error = %err, "fetch failed");
                self.cache.mark_failed(&outcome.term, now);
                // Never leave results from an earlier term on screen
                self.stories.clear();
                self.state = SearchState::FetchFailed;
            }
        }
        true
    }

    /// Tears the controller down: no pending keystroke may commit afterwards,
    /// and any outcome still in flight is treated as stale.
    pub fn shutdown(&mut self) {
        self.debouncer.cancel();
        self.generation += 1;
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn committed_term(&self) -> Option<&str> {
        self.committed_term.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn debounce_remaining(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_remaining(now)
    }
}
