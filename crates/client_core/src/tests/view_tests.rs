use super::*;
use crate::{
    form::{FieldKind, FieldSpec},
    notify::NotificationLevel,
    test_support::{CountingWidgets, FixedAnswer, RecordingNotifier, ScriptedApi},
};
use shared::error::ClientError;
use std::sync::atomic::Ordering;

struct Fixture {
    api: Arc<ScriptedApi>,
    notifier: Arc<RecordingNotifier>,
    confirmer: Arc<FixedAnswer>,
    widgets: Arc<CountingWidgets>,
    view: ResourceView,
}

fn fixture(confirm: bool) -> Fixture {
    let api = Arc::new(ScriptedApi::with_rows(25, 10));
    let notifier = Arc::new(RecordingNotifier::default());
    let confirmer = Arc::new(FixedAnswer::new(confirm));
    let widgets = Arc::new(CountingWidgets::default());
    let view = ResourceView::new(
        "assets",
        FormSchema::new(vec![
            FieldSpec::new("nama", FieldKind::Text).required(),
            FieldSpec::new("biaya", FieldKind::Currency),
        ]),
        ViewOptions::default(),
        ViewDependencies {
            api: api.clone(),
            notifier: notifier.clone(),
            confirmer: confirmer.clone(),
            widgets: widgets.clone(),
        },
    );
    Fixture {
        api,
        notifier,
        confirmer,
        widgets,
        view,
    }
}

#[tokio::test]
async fn mount_and_navigation_keep_a_single_widget() {
    let fx = fixture(true);
    assert_eq!(fx.view.mount().await, FetchOutcome::Applied);
    assert!(fx.view.table_attached().await);

    fx.view.navigate(2).await;
    fx.view.navigate(3).await;
    assert_eq!(fx.view.navigate(9).await, None);

    assert_eq!(fx.widgets.max_live.load(Ordering::SeqCst), 1);
    assert_eq!(fx.widgets.initialized.load(Ordering::SeqCst), 3);
    assert_eq!(fx.widgets.rows_seen.lock().unwrap().as_slice(), &[10, 10, 5]);

    fx.view.unmount().await;
    assert_eq!(fx.widgets.live.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn declined_delete_has_no_side_effects() {
    let fx = fixture(false);
    fx.view.mount().await;
    let calls_before = fx.api.list_call_count();

    assert_eq!(fx.view.delete(RecordId(3)).await, DeleteOutcome::Declined);

    assert_eq!(fx.confirmer.asked.lock().unwrap().len(), 1);
    assert!(fx.api.deleted.lock().unwrap().is_empty());
    assert_eq!(fx.api.list_call_count(), calls_before);
    assert!(fx.notifier.all().is_empty());
}

#[tokio::test]
async fn confirmed_delete_refetches_and_notifies() {
    let fx = fixture(true);
    fx.view.mount().await;

    assert_eq!(fx.view.delete(RecordId(3)).await, DeleteOutcome::Deleted);

    assert_eq!(fx.api.deleted.lock().unwrap().as_slice(), &[RecordId(3)]);
    assert_eq!(fx.api.list_call_count(), 2);
    let seen = fx.notifier.all();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].level, NotificationLevel::Success);
    assert_eq!(seen[0].message, DELETED_MESSAGE);
}

#[tokio::test]
async fn failed_delete_reports_server_message_without_refetch() {
    let fx = fixture(true);
    fx.view.mount().await;
    fx.api
        .fail_mutations_with(Some(ClientError::server(500, r#"{ "message": "locked" }"#)));

    assert_eq!(
        fx.view.delete(RecordId(3)).await,
        DeleteOutcome::Failed(ErrorKind::Server { status: 500 })
    );

    assert_eq!(fx.api.list_call_count(), 1);
    let errors = fx.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "locked");
}

#[tokio::test]
async fn edit_loads_the_record_first() {
    let fx = fixture(true);
    fx.view.mount().await;

    assert!(fx.view.open_edit(RecordId(4)).await);
    assert!(fx.view.set_field("nama", "item-4 (servis)").await);
    assert_eq!(fx.view.submit().await, SubmitOutcome::Updated);
    assert_eq!(fx.api.updated.lock().unwrap()[0].0, RecordId(4));
    assert_eq!(fx.widgets.max_live.load(Ordering::SeqCst), 1);

    assert!(!fx.view.open_edit(RecordId(999)).await);
    assert_eq!(
        fx.notifier.errors()[0].kind,
        Some(ErrorKind::Server { status: 404 })
    );
}

#[tokio::test]
async fn create_flow_through_the_view() {
    let fx = fixture(true);
    fx.view.mount().await;

    assert!(fx.view.open_create().await);
    fx.view.set_field("nama", "Lemari").await;
    fx.view.set_field("biaya", "1.500.000").await;
    assert_eq!(fx.view.submit().await, SubmitOutcome::Created);

    let created = fx.api.created.lock().unwrap().clone();
    assert_eq!(created[0]["biaya"], serde_json::json!(1_500_000));
    assert!(!fx.view.modal().state().await.is_open());

    fx.view.open_create().await;
    fx.view.cancel().await;
    assert!(!fx.view.modal().state().await.is_open());
}

#[tokio::test]
async fn mount_at_renders_only_the_requested_page() {
    let fx = fixture(true);
    assert_eq!(fx.view.mount_at(3).await, Some(FetchOutcome::Applied));
    assert_eq!(fx.widgets.initialized.load(Ordering::SeqCst), 1);
    assert_eq!(fx.widgets.rows_seen.lock().unwrap().as_slice(), &[5]);

    let other = fixture(true);
    assert_eq!(other.view.mount_at(9).await, None);
    assert_eq!(other.view.list().page().await.number, 1);
    assert!(other.view.table_attached().await);
}

#[tokio::test]
async fn widget_is_torn_down_while_a_page_is_loading() {
    let fx = fixture(true);
    fx.view.mount().await;
    assert!(fx.view.table_attached().await);

    let release = fx.api.gate(2);
    let view = Arc::new(fx.view);
    let navigating = tokio::spawn({
        let view = view.clone();
        async move { view.navigate(2).await }
    });
    fx.api.wait_for_list_calls(2).await;

    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while view.table_attached().await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("widget still attached during the fetch");
    assert!(view.list().snapshot().await.loading);
    assert_eq!(fx.widgets.destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(fx.widgets.live.load(Ordering::SeqCst), 0);

    release.send(()).expect("fetch waiting on the gate");
    assert_eq!(navigating.await.expect("join"), Some(FetchOutcome::Applied));
    assert!(view.table_attached().await);
    assert_eq!(fx.widgets.max_live.load(Ordering::SeqCst), 1);
    assert_eq!(fx.widgets.rows_seen.lock().unwrap().as_slice(), &[10, 10]);
}
