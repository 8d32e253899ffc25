use tokio::sync::mpsc::UnboundedSender;

use crate::app_event::AppEvent;

/// Clonable handle for publishing [`AppEvent`]s into the app loop.
#[derive(Clone)]
pub(crate) struct AppEventSender {
    tx: UnboundedSender<AppEvent>,
}

impl AppEventSender {
    pub(crate) fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Best-effort send; the loop shutting down makes events moot.
    pub(crate) fn send(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }
}
