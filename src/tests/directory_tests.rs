#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use tokio_util::sync::CancellationToken;

    use crate::app::App;
    use crate::config::ClientConfig;
    use crate::directory::{delete_prompt, AssumeYes, Confirm, DeleteOutcome, RefreshOutcome};
    use crate::error::AppError;
    use crate::notice::NoticeKind;
    use crate::state::AppContext;
    use crate::tests::{record, remote_config, Call, MockStore};
    use crate::view::{ListingView, ViewModel};

    struct Answer {
        yes: bool,
        asked: Mutex<Vec<String>>,
    }

    impl Answer {
        fn new(yes: bool) -> Self {
            Self { yes, asked: Mutex::new(Vec::new()) }
        }
    }

    impl Confirm for Answer {
        fn confirm(&self, prompt: &str) -> bool {
            self.asked.lock().unwrap().push(prompt.to_string());
            self.yes
        }
    }

    fn setup(store: MockStore) -> (App, AppContext, Arc<MockStore>) {
        let store = Arc::new(store);
        let ctx = AppContext::new(ClientConfig::default());
        let app = App::new(ctx.clone(), store.clone());
        (app, ctx, store)
    }

    #[tokio::test]
    async fn test_refresh_replaces_listing() {
        let (app, ctx, store) =
            setup(MockStore::new(remote_config(false, false)).with_files(vec![record("a.txt", 1), record("b.txt", 2)]));
        app.init().await.unwrap();

        let listing = ctx.listing().await;
        assert_eq!(listing.records.len(), 2);
        assert!(listing.known.contains("a.txt") && listing.known.contains("b.txt"));

        store.set_files(vec![record("c.txt", 3)]);
        assert_eq!(app.update().await, RefreshOutcome::Listed(1));
        let listing = ctx.listing().await;
        assert_eq!(listing.records, vec![record("c.txt", 3)]);
        assert!(!listing.known.contains("a.txt"));
        assert!(store.calls().contains(&Call::List("/files/".to_string())));
    }

    #[tokio::test]
    async fn test_sinkhole_never_lists() {
        let (app, ctx, store) =
            setup(MockStore::new(remote_config(false, true)).with_files(vec![record("secret.txt", 1)]));
        app.init().await.unwrap();

        assert_eq!(app.update().await, RefreshOutcome::Sinkhole);
        assert_eq!(store.list_calls(), 0);
        assert!(ctx.listing().await.records.is_empty());
        assert_eq!(app.view(None).await.listing, ListingView::SinkholeBanner);
    }

    #[tokio::test]
    async fn test_switch_to_sinkhole_clears_listing() {
        let (app, ctx, store) =
            setup(MockStore::new(remote_config(false, false)).with_files(vec![record("a.txt", 1)]));
        app.init().await.unwrap();
        assert_eq!(ctx.known_names().await.len(), 1);

        store.set_config(Some(remote_config(false, true)));
        app.config_cache().refresh().await;
        assert_eq!(app.update().await, RefreshOutcome::Sinkhole);

        let listing = ctx.listing().await;
        assert!(listing.records.is_empty());
        assert!(listing.known.is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_keeps_previous_listing() {
        let (app, ctx, store) =
            setup(MockStore::new(remote_config(false, false)).with_files(vec![record("a.txt", 1)]));
        app.init().await.unwrap();

        store.fail_list(Some(500));
        assert_eq!(app.update().await, RefreshOutcome::Failed);
        assert_eq!(ctx.listing().await.records, vec![record("a.txt", 1)]);
        assert_eq!(ctx.metrics.get_snapshot().list_failures, 1);
    }

    #[tokio::test]
    async fn test_refresh_skipped_without_config() {
        let (app, ctx, store) = setup(MockStore::new(remote_config(false, false)));
        store.set_config(None);
        assert!(app.init().await.is_err());
        assert_eq!(app.update().await, RefreshOutcome::Skipped);
        assert_eq!(store.list_calls(), 0);
        assert_eq!(app.view(None).await.listing, ListingView::Unavailable);
        assert_eq!(ctx.metrics.get_snapshot().config_failures, 1);
    }

    #[tokio::test]
    async fn test_config_failure_drops_cached_config() {
        let (app, ctx, store) = setup(MockStore::new(remote_config(false, false)));
        app.init().await.unwrap();
        assert!(ctx.remote_config().await.is_some());

        store.set_config(None);
        assert!(app.config_cache().refresh().await.is_none());
        assert!(ctx.remote_config().await.is_none());
        assert!(!app.view(None).await.upload_enabled);
    }

    #[tokio::test]
    async fn test_stale_listing_is_discarded() {
        let ctx = AppContext::new(ClientConfig::default());
        let older = ctx.next_ticket();
        let newer = ctx.next_ticket();

        assert!(ctx.apply_listing(newer, vec![record("new.txt", 1)]).await);
        assert!(!ctx.apply_listing(older, vec![record("old.txt", 1)]).await);

        let listing = ctx.listing().await;
        assert_eq!(listing.records, vec![record("new.txt", 1)]);
        assert_eq!(listing.ticket, newer);
    }

    #[tokio::test]
    async fn test_overlapping_refresh_keeps_newest() {
        let (app, ctx, store) =
            setup(MockStore::new(remote_config(false, false)).with_files(vec![record("old.txt", 1)]));
        app.config_cache().refresh().await.unwrap();

        // The first refresh fetches "old.txt" but answers last.
        let release = store.hold_next_list();
        let directory = app.directory().clone();
        let first = tokio::spawn(async move { directory.refresh().await });
        while store.list_calls() == 0 {
            tokio::task::yield_now().await;
        }

        store.set_files(vec![record("new.txt", 2)]);
        assert_eq!(app.update().await, RefreshOutcome::Listed(1));

        release.notify_one();
        assert_eq!(first.await.unwrap(), RefreshOutcome::Stale);

        let listing = ctx.listing().await;
        assert_eq!(listing.records, vec![record("new.txt", 2)]);
        assert!(!listing.known.contains("old.txt"));
    }

    #[tokio::test]
    async fn test_delete_confirmed() {
        let (app, ctx, store) =
            setup(MockStore::new(remote_config(false, false)).with_files(vec![record("my file.txt", 1)]));
        app.init().await.unwrap();
        let lists_before = store.list_calls();

        let answer = Answer::new(true);
        assert_eq!(app.delete("my file.txt", &answer).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(*answer.asked.lock().unwrap(), vec![delete_prompt("my file.txt")]);
        assert!(store.calls().contains(&Call::Delete("/files/delete/my%20file.txt".to_string())));
        assert_eq!(store.list_calls() - lists_before, 1);
        assert!(ctx.listing().await.records.is_empty());

        let status = ctx.status(Instant::now());
        assert_eq!(status.kind, NoticeKind::Success);
        assert_eq!(status.text, "File deleted: my file.txt");
    }

    #[tokio::test]
    async fn test_delete_declined_sends_nothing() {
        let (app, _ctx, store) =
            setup(MockStore::new(remote_config(false, false)).with_files(vec![record("a.txt", 1)]));
        app.init().await.unwrap();
        let calls_before = store.calls().len();

        assert_eq!(app.delete("a.txt", &Answer::new(false)).await.unwrap(), DeleteOutcome::Declined);
        assert_eq!(store.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_delete_failure_still_refreshes() {
        let (app, ctx, store) =
            setup(MockStore::new(remote_config(false, false)).with_files(vec![record("a.txt", 1)]));
        app.init().await.unwrap();
        store.fail_delete(Some(404));
        let lists_before = store.list_calls();

        let result = app.delete("a.txt", &AssumeYes).await;
        assert!(matches!(result, Err(AppError::DeleteFailed { .. })));
        assert_eq!(store.list_calls() - lists_before, 1);

        let status = ctx.status(Instant::now());
        assert_eq!(status.kind, NoticeKind::Error);
        assert_eq!(status.text, "Delete failed");
    }

    #[tokio::test]
    async fn test_readonly_refuses_delete() {
        let (app, _ctx, store) =
            setup(MockStore::new(remote_config(true, false)).with_files(vec![record("a.txt", 1)]));
        app.init().await.unwrap();

        let answer = Answer::new(true);
        assert!(matches!(app.delete("a.txt", &answer).await, Err(AppError::ReadonlyMode)));
        assert!(answer.asked.lock().unwrap().is_empty());
        assert!(!store.calls().iter().any(|c| matches!(c, Call::Delete(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_picks_up_server_changes() {
        let (app, _ctx, store) = setup(MockStore::new(remote_config(false, false)));
        app.init().await.unwrap();

        let shutdown = CancellationToken::new();
        let seen: Arc<Mutex<Vec<ViewModel>>> = Arc::new(Mutex::new(Vec::new()));

        let driver = async {
            store.set_files(vec![record("late.txt", 4)]);
            // Listing timer fires every 5 s with the default settings.
            tokio::time::sleep(Duration::from_secs(6)).await;
            shutdown.cancel();
        };
        let sink = seen.clone();
        let runner = app.run(shutdown.clone(), move |view| sink.lock().unwrap().push(view.clone()));
        tokio::join!(runner, driver);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].entries().is_empty());
        assert_eq!(seen[1].entries()[0].name, "late.txt");
    }
}
