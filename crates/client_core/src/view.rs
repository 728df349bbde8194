//! One collection screen: list, table widget, create/edit modal and guarded delete wired
//! together.

use std::{future::Future, pin::pin, sync::Arc};

use shared::{domain::RecordId, error::ErrorKind};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    api::ResourceApi,
    confirm::{ConfirmationGate, Confirmer, GateOutcome},
    currency::CurrencyFormatter,
    form::FormSchema,
    list::{FetchOutcome, PaginatedListController, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_WINDOW},
    modal::{ModalFormController, SubmitOutcome},
    notify::{Notification, Notifier},
    table::{ExternalTableBinding, TableWidgetFactory},
};

pub const DELETED_MESSAGE: &str = "Record deleted successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    Deleted,
    Failed(ErrorKind),
}

#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub page_size: u32,
    pub page_window: u32,
    pub formatter: CurrencyFormatter,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_window: DEFAULT_PAGE_WINDOW,
            formatter: CurrencyFormatter::default(),
        }
    }
}

/// External collaborators a view talks to.
#[derive(Clone)]
pub struct ViewDependencies {
    pub api: Arc<dyn ResourceApi>,
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
    pub widgets: Arc<dyn TableWidgetFactory>,
}

pub struct ResourceView {
    collection: String,
    api: Arc<dyn ResourceApi>,
    notifier: Arc<dyn Notifier>,
    list: Arc<PaginatedListController>,
    modal: ModalFormController,
    gate: ConfirmationGate,
    table: Mutex<ExternalTableBinding>,
}

impl ResourceView {
    pub fn new(
        collection: impl Into<String>,
        schema: FormSchema,
        options: ViewOptions,
        deps: ViewDependencies,
    ) -> Self {
        let collection = collection.into();
        let list = Arc::new(
            PaginatedListController::new(
                collection.clone(),
                options.page_size,
                deps.api.clone(),
                deps.notifier.clone(),
            )
            .with_window(options.page_window),
        );
        let modal = ModalFormController::new(
            schema,
            options.formatter,
            deps.api.clone(),
            deps.notifier.clone(),
            list.clone(),
        );
        Self {
            collection,
            api: deps.api,
            notifier: deps.notifier,
            list,
            modal,
            gate: ConfirmationGate::new(deps.confirmer),
            table: Mutex::new(ExternalTableBinding::new(deps.widgets)),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn list(&self) -> &PaginatedListController {
        &self.list
    }

    pub fn modal(&self) -> &ModalFormController {
        &self.modal
    }

    pub async fn table_attached(&self) -> bool {
        self.table.lock().await.is_attached()
    }

    pub async fn mount(&self) -> FetchOutcome {
        self.tracked(self.list.fetch_page()).await
    }

    /// Mounts directly on `page`. `None` when the page turns out to be out of range; the
    /// first page is shown in that case.
    pub async fn mount_at(&self, page: u32) -> Option<FetchOutcome> {
        self.tracked(async {
            let first = self.list.fetch_page().await;
            if page == 1 || first != FetchOutcome::Applied {
                Some(first)
            } else {
                self.list.go_to_page(page).await
            }
        })
        .await
    }

    pub async fn navigate(&self, page: u32) -> Option<FetchOutcome> {
        self.tracked(self.list.go_to_page(page)).await
    }

    pub async fn open_create(&self) -> bool {
        self.modal.open_create().await
    }

    /// Loads the latest copy of the record before opening the edit form.
    pub async fn open_edit(&self, id: RecordId) -> bool {
        match self.api.get(&self.collection, id).await {
            Ok(record) => self.modal.open_edit(&record).await,
            Err(err) => {
                self.notifier.notify(Notification::failure(&err));
                false
            }
        }
    }

    pub async fn set_field(&self, name: &str, raw: &str) -> bool {
        self.modal.set_field(name, raw).await
    }

    pub async fn cancel(&self) {
        self.modal.cancel().await;
    }

    pub async fn submit(&self) -> SubmitOutcome {
        self.tracked(self.modal.submit()).await
    }

    /// Asks for confirmation, deletes, then refetches. A failed delete does not refetch.
    pub async fn delete(&self, id: RecordId) -> DeleteOutcome {
        let message = format!("Delete record {id} from {}?", self.collection);
        let result = self
            .gate
            .confirm_and_run(&message, || self.api.delete(&self.collection, id))
            .await;

        match result {
            GateOutcome::Declined => DeleteOutcome::Declined,
            GateOutcome::Ran(Ok(())) => {
                info!(collection = %self.collection, record_id = id.0, "record deleted");
                self.notifier.notify(Notification::success(DELETED_MESSAGE));
                self.tracked(self.list.refresh()).await;
                DeleteOutcome::Deleted
            }
            GateOutcome::Ran(Err(err)) => {
                self.notifier.notify(Notification::failure(&err));
                DeleteOutcome::Failed(err.kind)
            }
        }
    }

    pub async fn unmount(&self) {
        self.table.lock().await.shutdown();
    }

    /// Runs a list operation, tearing the widget down as soon as a fetch starts loading, then
    /// renders whatever the list settled on.
    async fn tracked<F: Future>(&self, op: F) -> F::Output {
        let mut snapshots = self.list.subscribe();
        let mut op = pin!(op);
        let output = loop {
            tokio::select! {
                output = &mut op => break output,
                Ok(()) = snapshots.changed() => {
                    let snapshot = snapshots.borrow_and_update().clone();
                    if snapshot.loading {
                        self.table.lock().await.data_changed(&snapshot);
                    }
                }
            }
        };
        self.sync_table().await;
        output
    }

    async fn sync_table(&self) {
        let snapshot = self.list.snapshot().await;
        let mut table = self.table.lock().await;
        if table.data_changed(&snapshot) {
            table.render_committed();
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
