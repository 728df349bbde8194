//! Lifecycle bridge to a stateful table widget that owns the rows it renders.
//!
//! The binding holds at most one live widget. Any change in the list snapshot tears the
//! current widget down immediately; the replacement is only built once the host signals that
//! the new rows have been rendered (`render_committed`). Teardown failures are logged and never
//! block the next initialization.

use std::sync::Arc;

use shared::domain::Record;
use tracing::{debug, warn};

use crate::list::ListSnapshot;

pub trait TableWidget: Send {
    fn destroy(self: Box<Self>) -> anyhow::Result<()>;
}

pub trait TableWidgetFactory: Send + Sync {
    fn initialize(&self, rows: &[Record]) -> anyhow::Result<Box<dyn TableWidget>>;
}

pub struct ExternalTableBinding {
    factory: Arc<dyn TableWidgetFactory>,
    live: Option<Box<dyn TableWidget>>,
    pending: Option<Vec<Record>>,
    last_revision: Option<u64>,
}

impl ExternalTableBinding {
    pub fn new(factory: Arc<dyn TableWidgetFactory>) -> Self {
        Self {
            factory,
            live: None,
            pending: None,
            last_revision: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.live.is_some()
    }

    pub fn has_pending_render(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns `false` when the snapshot was already seen.
    pub fn data_changed(&mut self, snapshot: &ListSnapshot) -> bool {
        if self.last_revision == Some(snapshot.revision) {
            return false;
        }
        self.last_revision = Some(snapshot.revision);
        self.detach();
        self.pending = (!snapshot.loading).then(|| snapshot.records.clone());
        true
    }

    /// Builds the widget for the rows queued by the last `data_changed`, if any.
    pub fn render_committed(&mut self) -> bool {
        match self.pending.take() {
            Some(rows) => self.attach(&rows),
            None => false,
        }
    }

    pub fn attach(&mut self, rows: &[Record]) -> bool {
        self.detach();
        match self.factory.initialize(rows) {
            Ok(widget) => {
                debug!(rows = rows.len(), "table widget initialized");
                self.live = Some(widget);
                true
            }
            Err(err) => {
                warn!(%err, "table widget initialization failed");
                false
            }
        }
    }

    pub fn detach(&mut self) {
        if let Some(widget) = self.live.take() {
            if let Err(err) = widget.destroy() {
                warn!(%err, "table widget teardown failed");
            }
        }
    }

    /// Drops any queued render and destroys the live widget.
    pub fn shutdown(&mut self) {
        self.pending = None;
        self.detach();
    }
}

impl Drop for ExternalTableBinding {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod tests;
