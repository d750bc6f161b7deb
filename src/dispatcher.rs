use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::controller::{FetchOutcome, FetchRequest};
use crate::hn_client::StoryFetcher;

type RepaintHook = Arc<dyn Fn() + Send + Sync>;

/// Runs fetches on the tokio runtime and hands outcomes back to the UI thread.
///
/// Only the newest request is kept alive; dispatching a new one aborts the
/// previous task.
pub struct FetchDispatcher<F: StoryFetcher> {
    fetcher: Arc<F>,
    runtime: Handle,
    sender: Sender<FetchOutcome>,
    receiver: Receiver<FetchOutcome>,
    in_flight: Option<(u64, JoinHandle<()>)>,
    on_complete: Option<RepaintHook>,
}

impl<F: StoryFetcher> FetchDispatcher<F> {
    pub fn new(fetcher: Arc<F>, runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            fetcher,
            runtime,
            sender,
            receiver,
            in_flight: None,
            on_complete: None,
        }
    }

    /// Called from the fetch task after an outcome was sent (used to wake egui).
    pub fn set_on_complete(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.on_complete = Some(Arc::new(hook));
    }

    pub fn dispatch(&mut self, request: FetchRequest) {
        self.abort_in_flight();

        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();
        let on_complete = self.on_complete.clone();
        let generation = request.generation;

        debug!(term = %request.term, generation, "dispatching fetch");
        // Sends exactly one outcome unless aborted
        let handle = self.runtime.spawn(async move {
            let result = fetcher.fetch_stories(&request.term).await;
            let outcome = FetchOutcome {
                generation: request.generation,
                term: request.term,
                result,
            };
            // The receiver is gone once the app has shut down.
            if sender.send(outcome).is_ok() {
                if let Some(hook) = on_complete {
                    hook();
                }
            }
        });

        self.in_flight = Some((generation, handle));
    }

    fn abort_in_flight(&mut self) {
        if let Some((generation, handle)) = self.in_flight.take() {
            // Finished tasks already sent their outcome
            if !handle.is_finished() {
                debug!(generation, "aborting superseded fetch");
                handle.abort();
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<FetchOutcome> {
        let outcome = self.receiver.try_recv().ok()?;
        Some(self.settle(outcome))
    }

    fn settle(&mut self, outcome: FetchOutcome) -> FetchOutcome {
        if matches!(&self.in_flight, Some((generation, _)) if *generation == outcome.generation) {
            self.in_flight = None;
        }
        outcome
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    pub fn shutdown(&mut self) {
        self.abort_in_flight();
    }

    #[cfg(test)]
    pub fn recv_timeout(&mut self, timeout: std::time::Duration) -> Option<FetchOutcome> {
        let outcome = self.receiver.recv_timeout(timeout).ok()?;
        Some(self.settle(outcome))
    }
}

impl<F: StoryFetcher> Drop for FetchDispatcher<F> {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
