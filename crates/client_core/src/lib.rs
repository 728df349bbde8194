//! Client core for the inventory administration console: an authenticated, paginated
//! resource controller and the pieces it is built from.

pub mod api;
pub mod auth;
pub mod confirm;
pub mod currency;
pub mod form;
pub mod list;
pub mod modal;
pub mod notify;
pub mod sequencer;
pub mod table;
pub mod view;

pub use api::{HttpResourceApi, ResourceApi};
pub use auth::{AuthProvider, FileTokenProvider, StaticTokenProvider};
pub use confirm::{AssumeYes, ConfirmationGate, Confirmer, GateOutcome};
pub use currency::CurrencyFormatter;
pub use form::{FieldKind, FieldSpec, FieldValue, FormSchema, FormValues};
pub use list::{FetchOutcome, ListSnapshot, PageNavigation, PaginatedListController};
pub use modal::{ModalFormController, ModalState, SubmitOutcome};
pub use notify::{ChannelNotifier, Notification, NotificationLevel, Notifier};
pub use sequencer::{RequestSequencer, RequestToken};
pub use table::{ExternalTableBinding, TableWidget, TableWidgetFactory};
pub use view::{DeleteOutcome, ResourceView, ViewDependencies, ViewOptions};

#[cfg(test)]
pub(crate) mod test_support;
