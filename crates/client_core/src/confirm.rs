use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tracing::info;

/// Blocking yes/no prompt surface.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Answers yes without asking; for non-interactive runs that opted in up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

#[async_trait]
impl Confirmer for AssumeYes {
    async fn confirm(&self, _message: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome<T> {
    Declined,
    Ran(T),
}

pub struct ConfirmationGate {
    confirmer: Arc<dyn Confirmer>,
}

impl ConfirmationGate {
    pub fn new(confirmer: Arc<dyn Confirmer>) -> Self {
        Self { confirmer }
    }

    /// Runs `action` only after an explicit yes. Declining has no side effects.
    pub async fn confirm_and_run<F, Fut, T>(&self, message: &str, action: F) -> GateOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.confirmer.confirm(message).await {
            info!(message, "destructive action declined");
            return GateOutcome::Declined;
        }
        GateOutcome::Ran(action().await)
    }
}
