//! Create/edit dialog state machine.
//!
//! `Closed → Create`, `Closed → Edit(record)`, and back to `Closed` on cancel or a successful
//! submit. Leaving an open state always discards the form.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use shared::{
    domain::{Record, RecordId},
    error::{ClientError, ErrorKind},
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    api::{success_message, ResourceApi},
    currency::CurrencyFormatter,
    form::{FieldValue, FormSchema, FormValues},
    list::PaginatedListController,
    notify::{Notification, Notifier},
};

pub const CREATED_MESSAGE: &str = "Record created successfully";
pub const UPDATED_MESSAGE: &str = "Record updated successfully";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Create { form: FormValues },
    Edit { record_id: RecordId, form: FormValues },
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn form(&self) -> Option<&FormValues> {
        match self {
            Self::Closed => None,
            Self::Create { form } | Self::Edit { form, .. } => Some(form),
        }
    }

    fn form_mut(&mut self) -> Option<&mut FormValues> {
        match self {
            Self::Closed => None,
            Self::Create { form } | Self::Edit { form, .. } => Some(form),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Closed modal or a submission already in flight.
    Ignored,
    Created,
    Updated,
    Failed(ErrorKind),
}

struct ModalInner {
    state: ModalState,
    submitting: bool,
    /// Bumped on every open; a submit only closes the dialog it was started from.
    generation: u64,
}

impl ModalInner {
    fn open(&mut self, state: ModalState) {
        self.generation += 1;
        self.state = state;
    }
}

pub struct ModalFormController {
    collection: String,
    schema: FormSchema,
    formatter: CurrencyFormatter,
    api: Arc<dyn ResourceApi>,
    notifier: Arc<dyn Notifier>,
    list: Arc<PaginatedListController>,
    inner: Mutex<ModalInner>,
}

impl ModalFormController {
    pub fn new(
        schema: FormSchema,
        formatter: CurrencyFormatter,
        api: Arc<dyn ResourceApi>,
        notifier: Arc<dyn Notifier>,
        list: Arc<PaginatedListController>,
    ) -> Self {
        Self {
            collection: list.collection().to_string(),
            schema,
            formatter,
            api,
            notifier,
            list,
            inner: Mutex::new(ModalInner {
                state: ModalState::Closed,
                submitting: false,
                generation: 0,
            }),
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub async fn state(&self) -> ModalState {
        self.inner.lock().await.state.clone()
    }

    pub async fn is_submitting(&self) -> bool {
        self.inner.lock().await.submitting
    }

    pub async fn open_create(&self) -> bool {
        self.open_create_on(Local::now().date_naive()).await
    }

    /// Opens a blank form whose date fields default to `today`.
    pub async fn open_create_on(&self, today: NaiveDate) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state.is_open() {
            return false;
        }
        inner.open(ModalState::Create {
            form: FormValues::defaults(&self.schema, today, &self.formatter),
        });
        true
    }

    pub async fn open_edit(&self, record: &Record) -> bool {
        let Some(record_id) = record.id() else {
            let err = ClientError::new(ErrorKind::Format, "Record has no identifier");
            self.notifier.notify(Notification::failure(&err));
            return false;
        };
        let mut inner = self.inner.lock().await;
        if inner.state.is_open() {
            return false;
        }
        inner.open(ModalState::Edit {
            record_id,
            form: FormValues::from_record(&self.schema, record, &self.formatter),
        });
        true
    }

    /// Sets one field from raw input. Ignored while closed.
    pub async fn set_field(&self, name: &str, raw: &str) -> bool {
        let value = FieldValue::from_input(self.schema.kind_of(name), raw, &self.formatter);
        let mut inner = self.inner.lock().await;
        match inner.state.form_mut() {
            Some(form) => {
                *form = form.with_field(name, value);
                true
            }
            None => false,
        }
    }

    pub async fn cancel(&self) {
        self.inner.lock().await.state = ModalState::Closed;
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let (target, payload, generation) = {
            let mut inner = self.inner.lock().await;
            if inner.submitting {
                debug!(collection = %self.collection, "submit ignored: already in flight");
                return SubmitOutcome::Ignored;
            }
            let (target, form) = match &inner.state {
                ModalState::Closed => return SubmitOutcome::Ignored,
                ModalState::Create { form } => (None, form),
                ModalState::Edit { record_id, form } => (Some(*record_id), form),
            };
            if let Err(err) = form.validate(&self.schema) {
                self.notifier.notify(Notification::failure(&err));
                return SubmitOutcome::Failed(err.kind);
            }
            let payload = form.to_payload(&self.formatter);
            inner.submitting = true;
            (target, payload, inner.generation)
        };

        let result = match target {
            None => self.api.create(&self.collection, payload).await,
            Some(id) => self.api.update(&self.collection, id, payload).await,
        };

        {
            let mut inner = self.inner.lock().await;
            inner.submitting = false;
            if result.is_ok() && inner.generation == generation {
                inner.state = ModalState::Closed;
            }
        }

        match result {
            Ok(body) => {
                let (outcome, fallback) = match target {
                    None => (SubmitOutcome::Created, CREATED_MESSAGE),
                    Some(_) => (SubmitOutcome::Updated, UPDATED_MESSAGE),
                };
                info!(collection = %self.collection, record_id = ?target, "record saved");
                self.notifier.notify(Notification::success(
                    success_message(&body).unwrap_or_else(|| fallback.to_string()),
                ));
                self.list.refresh().await;
                outcome
            }
            Err(err) => {
                self.notifier.notify(Notification::failure(&err));
                SubmitOutcome::Failed(err.kind)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/modal_tests.rs"]
mod tests;
