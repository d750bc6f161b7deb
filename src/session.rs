use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

use crate::config::AppConfig;
use crate::controller::{FetchRequest, QueryController, SearchState};
use crate::dispatcher::FetchDispatcher;
use crate::hn_client::StoryFetcher;
use crate::render::ListView;

/// Wires the query controller to the fetch dispatcher for one search view.
pub struct SearchSession<F: StoryFetcher> {
    controller: QueryController,
    dispatcher: FetchDispatcher<F>,
    skeleton_rows: usize,
}

impl<F: StoryFetcher> SearchSession<F> {
    pub fn new(config: &AppConfig, fetcher: Arc<F>, runtime: Handle) -> Self {
        Self {
            controller: QueryController::new(config),
            dispatcher: FetchDispatcher::new(fetcher, runtime),
            skeleton_rows: config.skeleton_rows,
        }
    }

    pub fn set_on_complete(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.dispatcher.set_on_complete(hook);
    }

    pub fn start(&mut self, now: Instant) {
        let before = self.controller.generation();
        let request = self.controller.start(now);
        self.issue(before, request);
    }

    // Dispatches the request, or drops in-flight work that a cache hit made stale
    fn issue(&mut self, before: u64, request: Option<FetchRequest>) -> bool {
        match request {
            Some(request) => {
                self.dispatcher.dispatch(request);
                true
            }
            None if self.controller.generation() != before => {
                self.dispatcher.shutdown();
                true
            }
            None => false,
        }
    }

    pub fn on_input(&mut self, raw: &str, now: Instant) {
        self.controller.handle_input(raw, now);
    }

    /// Advances the debounce timer and applies finished fetches.
    /// Returns true when anything visible changed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let before = self.controller.generation();
        let request = self.controller.tick(now);
        let mut changed = self.issue(before, request);

        while let Some(outcome) = self.dispatcher.try_recv() {
            changed |= self.controller.apply(outcome, now);
        }

        changed
    }

    /// Commits the typed text right away (Enter in the search box).
    pub fn commit_now(&mut self, now: Instant) {
        let before = self.controller.generation();
        let request = self.controller.flush(now);
        self.issue(before, request);
    }

    pub fn retry(&mut self) {
        if let Some(request) = self.controller.retry() {
            self.dispatcher.dispatch(request);
        }
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown();
        self.dispatcher.shutdown();
    }

    pub fn state(&self) -> SearchState {
        self.controller.state()
    }

    #[cfg(test)]
    pub fn stories(&self) -> &[crate::models::Story] {
        self.controller.stories()
    }

    pub fn committed_term(&self) -> Option<&str> {
        self.controller.committed_term()
    }

    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.controller.debounce_remaining(now)
    }

    pub fn view(&self) -> ListView {
        ListView::build(self.controller.state(), self.controller.stories(), self.skeleton_rows)
    }

    #[cfg(test)]
    pub(crate) fn dispatcher_mut(&mut self) -> &mut FetchDispatcher<F> {
        &mut self.dispatcher
    }

    #[cfg(test)]
    pub(crate) fn controller_mut(&mut self) -> &mut QueryController {
        &mut self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::fakes::ScriptedFetcher;
    use crate::hn_client::test_server::serve_once;
    use crate::hn_client::HackerNewsClient;

    fn wait_for_outcome<F: StoryFetcher>(session: &mut SearchSession<F>, now: Instant) {
        let outcome = session
            .dispatcher_mut()
            .recv_timeout(Duration::from_secs(5))
            .expect("fetch outcome");
        session.controller_mut().apply(outcome, now);
    }

    // Pumps the way the UI does once per frame until `done` holds.
    fn pump_until<F: StoryFetcher>(
        session: &mut SearchSession<F>,
        now: Instant,
        done: impl Fn(&SearchSession<F>) -> bool,
    ) {
        for _ in 0..500 {
            session.pump(now);
            if done(session) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("session never settled, state is {:?}", session.state());
    }

    fn titles<F: StoryFetcher>(session: &SearchSession<F>) -> Vec<String> {
        match session.view() {
            ListView::Stories(rows) => rows.into_iter().map(|row| row.title).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn late_outcome_for_old_term_is_dropped_by_pump() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .with_delay("slow", Duration::from_millis(300))
                .with_delay("fast", Duration::from_millis(100)),
        );
        let mut session = SearchSession::new(&AppConfig::default(), Arc::clone(&fetcher), runtime.handle().clone());

        let t0 = Instant::now();
        session.start(t0);
        pump_until(&mut session, t0, |s| s.state() == SearchState::FrontPageLoaded);

        session.on_input("slow", t0);
        assert!(session.pump(t0 + Duration::from_millis(300)));

        // The slow outcome lands in the channel before the next term is committed.
        for _ in 0..200 {
            if fetcher.finished().contains(&"slow".to_string()) {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        std::thread::sleep(Duration::from_millis(50));

        // Commits "fast", then drains and drops the outcome for "slow".
        session.on_input("fast", t0 + Duration::from_millis(400));
        assert!(session.pump(t0 + Duration::from_millis(700)));
        assert_eq!(session.state(), SearchState::Searching);
        assert!(session.view().is_loading());

        pump_until(&mut session, t0 + Duration::from_millis(700), |s| {
            s.state() == SearchState::SearchLoaded
        });
        assert_eq!(titles(&session), vec!["Result for 'fast'".to_string()]);
        assert_eq!(
            fetcher.calls(),
            vec!["".to_string(), "slow".to_string(), "fast".to_string()]
        );
    }

    #[test]
    fn cache_hit_aborts_fetch_for_superseded_term() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::default().with_delay("slow", Duration::from_millis(300)));
        let mut session = SearchSession::new(&AppConfig::default(), Arc::clone(&fetcher), runtime.handle().clone());

        let t0 = Instant::now();
        session.start(t0);
        pump_until(&mut session, t0, |s| s.state() == SearchState::FrontPageLoaded);

        session.on_input("slow", t0);
        session.pump(t0 + Duration::from_millis(300));
        assert!(session.dispatcher_mut().is_busy());

        // Back to the front page, which is still cached.
        session.on_input("", t0 + Duration::from_millis(400));
        assert!(session.pump(t0 + Duration::from_millis(700)));
        assert_eq!(session.state(), SearchState::FrontPageLoaded);
        assert!(!session.dispatcher_mut().is_busy());

        std::thread::sleep(Duration::from_millis(600));
        assert!(!session.pump(t0 + Duration::from_millis(700)));
        assert_eq!(fetcher.finished(), vec!["".to_string()]);
    }

    #[test]
    fn enter_commits_without_waiting() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut session = SearchSession::new(&AppConfig::default(), Arc::clone(&fetcher), runtime.handle().clone());

        let t0 = Instant::now();
        session.start(t0);
        pump_until(&mut session, t0, |s| s.state() == SearchState::FrontPageLoaded);

        session.on_input("rust", t0);
        session.commit_now(t0);
        assert_eq!(session.state(), SearchState::Searching);
        assert_eq!(session.next_wakeup(t0), None);

        pump_until(&mut session, t0, |s| s.state() == SearchState::SearchLoaded);
        assert_eq!(titles(&session), vec!["Result for 'rust'".to_string()]);
    }

    #[test]
    fn typing_burst_fetches_only_final_term() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::default());
        let config = AppConfig::default();
        let mut session = SearchSession::new(&config, Arc::clone(&fetcher), runtime.handle().clone());

        let now = Instant::now();
        session.start(now);
        assert_eq!(session.view().row_count(), 10);
        wait_for_outcome(&mut session, now);
        assert_eq!(session.state(), SearchState::FrontPageLoaded);

        for (i, value) in ["s", "se", "sea", "sear"].iter().enumerate() {
            let at = now + Duration::from_millis(100 * i as u64);
            session.on_input(value, at);
            session.pump(at);
        }
        assert!(session.pump(now + Duration::from_millis(600)));
        assert!(session.view().is_loading());

        wait_for_outcome(&mut session, now + Duration::from_millis(600));
        assert_eq!(fetcher.calls(), vec!["".to_string(), "sear".to_string()]);
        assert_eq!(session.stories()[0].title, "Result for 'sear'");
        assert_eq!(session.committed_term(), Some("sear"));
    }

    #[test]
    fn failed_fetch_renders_empty_non_loading_view() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut session = SearchSession::new(&AppConfig::default(), fetcher, runtime.handle().clone());

        let now = Instant::now();
        session.start(now);
        wait_for_outcome(&mut session, now);

        session.on_input("boom", now);
        session.pump(now + Duration::from_millis(300));
        wait_for_outcome(&mut session, now);

        let view = session.view();
        assert_eq!(session.state(), SearchState::FetchFailed);
        assert!(!view.is_loading());
        assert_eq!(view.row_count(), 0);
        assert_eq!(view, ListView::Failed);
    }

    #[test]
    fn unreachable_api_ends_in_failed_state() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let config = AppConfig::default().with_base_url("http://127.0.0.1:1");
        let client = Arc::new(HackerNewsClient::new(&config).unwrap());
        let mut session = SearchSession::new(&config, client, runtime.handle().clone());

        let now = Instant::now();
        session.start(now);
        wait_for_outcome(&mut session, now);

        assert_eq!(session.state(), SearchState::FetchFailed);
        assert_eq!(session.view().row_count(), 0);
    }

    #[test]
    fn mocked_front_page_renders_one_linked_row() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (base_url, server) = serve_once(
            200,
            r#"{"hits":[{"objectID":"1","title":"Foo","points":42,"url":"http://x","num_comments":3}]}"#,
        );
        let config = AppConfig::default().with_base_url(base_url);
        let client = Arc::new(HackerNewsClient::new(&config).unwrap());
        let mut session = SearchSession::new(&config, client, runtime.handle().clone());

        let now = Instant::now();
        session.start(now);
        wait_for_outcome(&mut session, now);
        server.join().unwrap();

        match session.view() {
            ListView::Stories(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].title, "Foo");
                assert_eq!(rows[0].points_label, "42 points");
                assert_eq!(rows[0].comments_label, "3 comments");
                assert_eq!(rows[0].link.as_deref(), Some("http://x"));
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }
}
