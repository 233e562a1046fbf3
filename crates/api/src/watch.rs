//! Per-poll countdown tickers.
//!
//! A watched poll gets its own task that recomputes the display state once a
//! second and pushes snapshots over a channel, mirroring how the view layer
//! polls the timing resolver. Navigating away stops the ticker promptly;
//! in-flight vote casts are unaffected.

use chrono::Utc;
use dashmap::DashMap;
use engine::timing::{self, DisplayState};
use model::{Poll, PollId, PollStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::mpsc, time};

const TICK: Duration = Duration::from_secs(1);

type Updates = mpsc::UnboundedReceiver<DisplayState>;
type Cancel = mpsc::UnboundedSender<()>;
type ViewRegistry = DashMap<PollId, Cancel>;

/// Registry of live poll views, one ticker task each.
#[derive(Clone, Default)]
pub struct Watcher {
    views: Arc<ViewRegistry>,
}

impl Watcher {
    /// Starts ticking for the given poll. The first snapshot is delivered
    /// immediately; one follows every second until the poll completes, the
    /// receiver is dropped, or [`Watcher::stop`] is called.
    ///
    /// Returns `None` while another view already holds this poll, including
    /// the brief window in which a stopped ticker is still winding down.
    pub fn watch(&self, poll: &Poll) -> Option<Updates> {
        let (cancel_tx, mut cancel_rx) = mpsc::unbounded_channel();
        let (tx, rx) = mpsc::unbounded_channel();

        use dashmap::mapref::entry::Entry;
        match self.views.entry(poll.id.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(cancel_tx);
            }
            Entry::Occupied(_) => return None,
        }

        let views = Arc::clone(&self.views);
        let id = poll.id.clone();
        let (start, end) = (poll.start_time, poll.end_time);
        tokio::spawn(async move {
            loop {
                let state = timing::display(Utc::now(), start, end);
                let done = state.status == PollStatus::Completed;
                if tx.send(state).is_err() || done {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = cancel_rx.recv() => break,
                    () = time::sleep(TICK) => {}
                }
            }
            // The ticker owns its registry slot until it actually exits.
            views.remove(&id);
        });

        Some(rx)
    }

    /// Cancels the ticker for a poll view. The update channel closes without
    /// a final snapshot.
    pub fn stop(&self, id: &PollId) {
        if let Some(view) = self.views.get(id) {
            let _ = view.send(());
        }
    }

    pub fn is_watching(&self, id: &PollId) -> bool {
        self.views.contains_key(id)
    }
}
