//! The orchestrator: one posting run from state load to audit record.

use crate::audit;
use crate::captions::Captions;
use crate::error::{AppError, Result};
use crate::publish::Publisher;
use crate::source::{CandidateImage, ImageSource};
use crate::state::StateStore;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Maximum number of images published in one run (Telegram media group limit).
pub const BATCH_SIZE: usize = 10;

/// Why a run finished without posting. None of these mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Caption list is empty
    NoCaptions,
    /// Nothing in the source document survived dedup filtering
    NoCandidates,
    /// Every selected image failed to download
    NoDownloads,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoCaptions => write!(f, "no captions configured"),
            SkipReason::NoCandidates => write!(f, "no new images available to post"),
            SkipReason::NoDownloads => write!(f, "no images were successfully downloaded"),
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Posted { count: usize, caption: String },
    Skipped(SkipReason),
}

/// Drives one run. Generic over the store, source and publisher seams so
/// tests can substitute in-memory fakes for all three.
pub struct Runner {
    captions: Captions,
    batch_size: usize,
    audit_log: PathBuf,
}

impl Runner {
    pub fn new(captions: Captions, audit_log: impl Into<PathBuf>) -> Self {
        Self {
            captions,
            batch_size: BATCH_SIZE,
            audit_log: audit_log.into(),
        }
    }

    pub async fn run<S, I, P>(
        &self,
        store: &mut S,
        source: &I,
        publisher: &P,
    ) -> Result<RunOutcome>
    where
        S: StateStore,
        I: ImageSource,
        P: Publisher,
    {
        if self.captions.is_empty() {
            warn!("❌ Caption list is empty, nothing to post");
            return Ok(RunOutcome::Skipped(SkipReason::NoCaptions));
        }

        // INIT → STATE_LOADED
        let snapshot = store.load().await;
        info!(
            "🔢 Loaded state: caption_index={}, post_counter={}, {} images in ledger",
            snapshot.posting.caption_index,
            snapshot.posting.post_counter,
            snapshot.used_images.len()
        );

        // The caption is spent in memory right away; the advanced state only
        // reaches the store after a successful publish.
        let (caption, advanced) = self.captions.next(&snapshot.posting);
        debug!("Caption for this run: {:?}", caption);

        // STATE_LOADED → CANDIDATES_SELECTED
        let candidates = source.list_candidates().await.map_err(AppError::Source)?;
        if candidates.is_empty() {
            warn!("❌ No wallpapers found in source document");
            return Ok(RunOutcome::Skipped(SkipReason::NoCandidates));
        }

        let selected: Vec<String> = snapshot
            .used_images
            .filter_unseen(&candidates)
            .into_iter()
            .take(self.batch_size)
            .collect();

        info!(
            "ℹ️ Selected {} of {} candidate images",
            selected.len(),
            candidates.len()
        );

        if selected.is_empty() {
            info!("No new images available to post");
            return Ok(RunOutcome::Skipped(SkipReason::NoCandidates));
        }

        // CANDIDATES_SELECTED → IMAGES_FETCHED
        // A single failed download drops only that image.
        let mut images: Vec<CandidateImage> = Vec::with_capacity(selected.len());
        for url in &selected {
            match source.fetch(url).await {
                Ok(bytes) => images.push(CandidateImage {
                    url: url.clone(),
                    bytes,
                }),
                Err(e) => warn!("❌ Failed to download image {}: {:#}", url, e),
            }
        }

        if images.is_empty() {
            warn!("❌ No images were successfully downloaded");
            return Ok(RunOutcome::Skipped(SkipReason::NoDownloads));
        }

        // IMAGES_FETCHED → PUBLISHED
        // A publish failure aborts here: counter, index and ledger stay as
        // they were, so the next scheduled run retries the same batch.
        publisher.publish(&caption, &images).await?;

        // PUBLISHED → COMMITTED
        // Only images that actually went out enter the ledger.
        let published: Vec<String> = images.into_iter().map(|img| img.url).collect();
        let mut committed = snapshot;
        committed.used_images.commit(published.iter().cloned());
        committed.posting = advanced;

        if let Err(e) = store.save(&committed).await {
            // The post is already out; state may now diverge from remote
            // until the next run. Surface it, don't fail the run.
            warn!("⚠️ Failed to persist state after publish: {:#}", e);
        }

        // COMMITTED → DONE
        if let Err(e) = audit::append_records(&self.audit_log, &published, &caption) {
            warn!("⚠️ Failed to append audit log: {}", e);
        }

        Ok(RunOutcome::Posted {
            count: published.len(),
            caption,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::PublishError;
    use crate::state::{MemoryStore, PostingState, StateSnapshot};
    use anyhow::bail;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct FakeSource {
        candidates: Vec<String>,
        failing: HashSet<String>,
        list_calls: Mutex<usize>,
    }

    impl FakeSource {
        fn new(candidates: &[&str]) -> Self {
            Self {
                candidates: candidates.iter().map(|s| s.to_string()).collect(),
                failing: HashSet::new(),
                list_calls: Mutex::new(0),
            }
        }

        fn with_failing(mut self, urls: &[&str]) -> Self {
            self.failing = urls.iter().map(|s| s.to_string()).collect();
            self
        }

        fn list_calls(&self) -> usize {
            *self.list_calls.lock().unwrap()
        }
    }

    impl ImageSource for FakeSource {
        async fn list_candidates(&self) -> anyhow::Result<Vec<String>> {
            *self.list_calls.lock().unwrap() += 1;
            Ok(self.candidates.clone())
        }

        async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
            if self.failing.contains(url) {
                bail!("simulated download failure for {}", url);
            }
            Ok(url.as_bytes().to_vec())
        }
    }

    #[derive(Default)]
    struct FakePublisher {
        fail_with: Option<fn() -> PublishError>,
        sent: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakePublisher {
        fn failing_with(f: fn() -> PublishError) -> Self {
            Self {
                fail_with: Some(f),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<(String, Vec<String>)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Publisher for FakePublisher {
        async fn publish(
            &self,
            caption: &str,
            images: &[CandidateImage],
        ) -> std::result::Result<(), PublishError> {
            if let Some(make_err) = self.fail_with {
                return Err(make_err());
            }
            self.sent.lock().unwrap().push((
                caption.to_string(),
                images.iter().map(|img| img.url.clone()).collect(),
            ));
            Ok(())
        }
    }

    fn runner(captions: &[&str], dir: &tempfile::TempDir) -> Runner {
        Runner::new(
            Captions::from_entries(captions.iter().map(|s| s.to_string()).collect()),
            dir.path().join("post_log.txt"),
        )
    }

    fn url_list(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("https://cdn.example/{}.jpg", i)).collect()
    }

    #[tokio::test]
    async fn test_fresh_run_posts_first_ten_and_commits() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["Morning vibes", "Night mode"], &dir);

        let all = url_list(12);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs);
        let publisher = FakePublisher::default();
        let mut store = MemoryStore::new();

        let outcome = runner.run(&mut store, &source, &publisher).await.unwrap();

        match outcome {
            RunOutcome::Posted { count, caption } => {
                assert_eq!(count, 10);
                assert_eq!(caption, "#1 Morning vibes ");
            }
            other => panic!("Expected Posted, got {:?}", other),
        }

        let sent = publisher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, all[..10].to_vec());

        let saved = store.current().unwrap();
        assert_eq!(
            saved.posting,
            PostingState {
                caption_index: 1,
                post_counter: 1
            }
        );
        assert_eq!(saved.used_images.len(), 10);
        assert!(saved.used_images.contains(&all[0]));
        assert!(!saved.used_images.contains(&all[10]));

        let log = std::fs::read_to_string(dir.path().join("post_log.txt")).unwrap();
        assert_eq!(log.lines().count(), 10);
    }

    #[tokio::test]
    async fn test_already_used_images_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["Morning vibes", "Night mode"], &dir);

        let all = url_list(12);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs);
        let publisher = FakePublisher::default();

        let mut snapshot = StateSnapshot::default();
        snapshot.used_images.commit(all[..5].iter().cloned());
        let mut store = MemoryStore::with_snapshot(snapshot);

        let outcome = runner.run(&mut store, &source, &publisher).await.unwrap();

        // 7 unseen remain, fewer than the batch size, all of them go out.
        match outcome {
            RunOutcome::Posted { count, .. } => assert_eq!(count, 7),
            other => panic!("Expected Posted, got {:?}", other),
        }
        assert_eq!(publisher.sent()[0].1, all[5..].to_vec());
        assert_eq!(store.current().unwrap().used_images.len(), 12);
    }

    #[tokio::test]
    async fn test_empty_caption_list_skips_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&[], &dir);

        let source = FakeSource::new(&["https://cdn.example/1.jpg"]);
        let publisher = FakePublisher::default();
        let mut store = MemoryStore::new();

        let outcome = runner.run(&mut store, &source, &publisher).await.unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Skipped(SkipReason::NoCaptions)
        ));
        assert_eq!(source.list_calls(), 0);
        assert!(publisher.sent().is_empty());
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_nothing_unseen_skips_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["cap"], &dir);

        let all = url_list(3);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs);
        let publisher = FakePublisher::default();

        let mut snapshot = StateSnapshot::default();
        snapshot.used_images.commit(all.iter().cloned());
        let before = snapshot.clone();
        let mut store = MemoryStore::with_snapshot(snapshot);

        let outcome = runner.run(&mut store, &source, &publisher).await.unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Skipped(SkipReason::NoCandidates)
        ));
        assert!(publisher.sent().is_empty());
        assert_eq!(store.current(), Some(&before));
    }

    #[tokio::test]
    async fn test_failed_downloads_drop_only_that_image() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["cap"], &dir);

        let all = url_list(3);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs).with_failing(&[all[1].as_str()]);
        let publisher = FakePublisher::default();
        let mut store = MemoryStore::new();

        let outcome = runner.run(&mut store, &source, &publisher).await.unwrap();

        match outcome {
            RunOutcome::Posted { count, .. } => assert_eq!(count, 2),
            other => panic!("Expected Posted, got {:?}", other),
        }
        assert_eq!(
            publisher.sent()[0].1,
            vec![all[0].clone(), all[2].clone()]
        );

        // The failed image is not in the ledger and stays eligible.
        let saved = store.current().unwrap();
        assert_eq!(saved.used_images.len(), 2);
        assert!(!saved.used_images.contains(&all[1]));
    }

    #[tokio::test]
    async fn test_all_downloads_failing_skips_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["cap"], &dir);

        let all = url_list(2);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let failing: Vec<&str> = refs.clone();
        let source = FakeSource::new(&refs).with_failing(&failing);
        let publisher = FakePublisher::default();
        let mut store = MemoryStore::new();

        let outcome = runner.run(&mut store, &source, &publisher).await.unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Skipped(SkipReason::NoDownloads)
        ));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_permission_denied_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["cap a", "cap b"], &dir);

        let all = url_list(4);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs);
        let publisher = FakePublisher::failing_with(|| {
            PublishError::PermissionDenied("bot is not a channel admin".to_string())
        });

        let snapshot = StateSnapshot {
            posting: PostingState {
                caption_index: 1,
                post_counter: 7,
            },
            ..Default::default()
        };
        let before = snapshot.clone();
        let mut store = MemoryStore::with_snapshot(snapshot);

        let err = runner
            .run(&mut store, &source, &publisher)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Publish(PublishError::PermissionDenied(_))
        ));
        assert_eq!(store.current(), Some(&before));
        assert!(!dir.path().join("post_log.txt").exists());
    }

    #[tokio::test]
    async fn test_platform_error_aborts_before_commit() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["cap"], &dir);

        let all = url_list(2);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs);
        let publisher =
            FakePublisher::failing_with(|| PublishError::Platform("flood wait".to_string()));
        let mut store = MemoryStore::new();

        let err = runner
            .run(&mut store, &source, &publisher)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Publish(PublishError::Platform(_))));
        assert!(store.current().is_none());
    }

    struct FailingSaveStore;

    impl StateStore for FailingSaveStore {
        async fn load(&mut self) -> StateSnapshot {
            StateSnapshot::default()
        }

        async fn save(&mut self, _snapshot: &StateSnapshot) -> anyhow::Result<()> {
            bail!("simulated state sync failure")
        }
    }

    #[tokio::test]
    async fn test_save_failure_after_publish_still_counts_as_success() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["cap"], &dir);

        let all = url_list(1);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs);
        let publisher = FakePublisher::default();
        let mut store = FailingSaveStore;

        // The post already went out; a failed commit is a warning, not a
        // run failure.
        let outcome = runner.run(&mut store, &source, &publisher).await.unwrap();

        match outcome {
            RunOutcome::Posted { count, caption } => {
                assert_eq!(count, 1);
                assert_eq!(caption, "#1 cap ");
            }
            other => panic!("Expected Posted, got {:?}", other),
        }
        assert_eq!(publisher.sent().len(), 1);

        // The audit record is still appended.
        let log = std::fs::read_to_string(dir.path().join("post_log.txt")).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_caption_rotation_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["one", "two"], &dir);
        let publisher = FakePublisher::default();
        let mut store = MemoryStore::new();

        let first = url_list(1);
        let refs: Vec<&str> = first.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs);
        runner.run(&mut store, &source, &publisher).await.unwrap();

        let second = vec!["https://cdn.example/next.jpg".to_string()];
        let refs: Vec<&str> = second.iter().map(String::as_str).collect();
        let source = FakeSource::new(&refs);
        runner.run(&mut store, &source, &publisher).await.unwrap();

        let sent = publisher.sent();
        assert_eq!(sent[0].0, "#1 one ");
        assert_eq!(sent[1].0, "#2 two ");
        assert_eq!(
            store.current().unwrap().posting,
            PostingState {
                caption_index: 0,
                post_counter: 2
            }
        );
    }
}
