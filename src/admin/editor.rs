//! Layout editor: applies reorder gestures locally and persists them.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::{LayoutError, ReorderError};
use crate::layout::{self, BucketId, ConfigStore, StepConfiguration};

use super::reorder::{self, ReorderGesture, ReorderOperation};

/// What an accepted gesture did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Nothing changed and nothing was sent.
    Discarded,
    /// Local state changed and every affected bucket was saved.
    Applied(ReorderOperation),
}

/// Administrator-side holder of the step configuration.
///
/// Mutations are optimistic: local state changes first, then one save per
/// changed bucket is issued. A failed save is reported but not rolled back,
/// so local and remote state may differ until [`LayoutEditor::retry`] or
/// [`LayoutEditor::reload`] succeeds. Concurrent editors are last-write-wins
/// per bucket.
pub struct LayoutEditor {
    store: Arc<dyn ConfigStore>,
    layout: StepConfiguration,
}

impl LayoutEditor {
    pub fn new(store: Arc<dyn ConfigStore>, layout: StepConfiguration) -> Self {
        Self { store, layout }
    }

    /// Fetch the current configuration from the store.
    pub async fn load(store: Arc<dyn ConfigStore>) -> Result<Self, LayoutError> {
        let layout = store.load().await?;
        layout::report_anomalies(&layout);
        Ok(Self::new(store, layout))
    }

    pub fn layout(&self) -> &StepConfiguration {
        &self.layout
    }

    /// Apply a gesture and persist every bucket it changed.
    ///
    /// Rejected gestures leave state untouched. On
    /// [`ReorderError::PersistenceFailed`] local state already holds the new
    /// layout.
    pub async fn apply(
        &mut self,
        gesture: &ReorderGesture,
    ) -> Result<ReorderOutcome, ReorderError> {
        let operation = match reorder::plan(&self.layout, gesture) {
            Ok(Some(op)) => op,
            Ok(None) => {
                debug!(field = %gesture.field, "Reorder gesture changes nothing");
                return Ok(ReorderOutcome::Discarded);
            }
            Err(e) => {
                info!(
                    field = %gesture.field,
                    source = %gesture.source,
                    error = %e,
                    "Reorder rejected"
                );
                return Err(e);
            }
        };

        operation.apply_to(&mut self.layout);
        info!(
            field = %operation.moved,
            from = %operation.source,
            to = %operation.destination,
            "Field moved"
        );

        let failed = self.save_buckets(&operation.changed_buckets()).await;
        if failed.is_empty() {
            Ok(ReorderOutcome::Applied(operation))
        } else {
            Err(ReorderError::PersistenceFailed {
                failed,
                operation: Some(operation),
            })
        }
    }

    /// Re-send the local contents of `buckets`.
    pub async fn retry(&self, buckets: &[BucketId]) -> Result<(), ReorderError> {
        let failed = self.save_buckets(buckets).await;
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ReorderError::PersistenceFailed {
                failed,
                operation: None,
            })
        }
    }

    /// Replace local state with whatever the store holds now.
    pub async fn reload(&mut self) -> Result<(), LayoutError> {
        let layout = self.store.load().await?;
        layout::report_anomalies(&layout);
        self.layout = layout;
        Ok(())
    }

    /// Save each bucket concurrently. Every save is attempted; returns the
    /// buckets whose save failed.
    async fn save_buckets(&self, buckets: &[BucketId]) -> Vec<BucketId> {
        let saves = buckets.iter().map(|&bucket| {
            let fields = self.layout.bucket(bucket).to_vec();
            async move { (bucket, self.store.save(bucket, &fields).await) }
        });

        join_all(saves)
            .await
            .into_iter()
            .filter_map(|(bucket, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    warn!(%bucket, error = %e, "Failed to persist step configuration");
                    Some(bucket)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::admin::DropTarget;
    use crate::fields::FieldId;

    #[derive(Default)]
    struct RecordingStore {
        remote: Mutex<StepConfiguration>,
        failing: Mutex<Vec<BucketId>>,
        saves: Mutex<Vec<(BucketId, Vec<FieldId>)>>,
    }

    impl RecordingStore {
        fn with(layout: StepConfiguration) -> Arc<Self> {
            Arc::new(Self {
                remote: Mutex::new(layout),
                ..Default::default()
            })
        }

        fn fail(&self, buckets: &[BucketId]) {
            *self.failing.lock().unwrap() = buckets.to_vec();
        }

        fn saves(&self) -> Vec<(BucketId, Vec<FieldId>)> {
            self.saves.lock().unwrap().clone()
        }

        fn remote(&self) -> StepConfiguration {
            self.remote.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConfigStore for RecordingStore {
        async fn load(&self) -> Result<StepConfiguration, LayoutError> {
            Ok(self.remote())
        }

        async fn save(&self, bucket: BucketId, fields: &[FieldId]) -> Result<(), LayoutError> {
            self.saves.lock().unwrap().push((bucket, fields.to_vec()));
            if self.failing.lock().unwrap().contains(&bucket) {
                return Err(LayoutError::SaveFailed {
                    bucket,
                    reason: "503".into(),
                });
            }
            self.remote.lock().unwrap().set_bucket(bucket, fields.to_vec());
            Ok(())
        }
    }

    fn ids(items: &[&str]) -> Vec<FieldId> {
        items.iter().map(|s| FieldId::new(*s)).collect()
    }

    fn start() -> StepConfiguration {
        let mut layout = StepConfiguration::new();
        layout.set_bucket(BucketId::Step2, ids(&["A", "B"]));
        layout.set_bucket(BucketId::Step3, ids(&["X", "Y"]));
        layout
    }

    async fn editor(store: &Arc<RecordingStore>) -> LayoutEditor {
        LayoutEditor::load(store.clone()).await.unwrap()
    }

    #[tokio::test]
    async fn same_bucket_move_saves_once() {
        let store = RecordingStore::with(start());
        let mut editor = editor(&store).await;

        let outcome = editor
            .apply(&ReorderGesture::new(
                "B",
                BucketId::Step2,
                Some(DropTarget::onto(BucketId::Step2, "A")),
            ))
            .await
            .unwrap();

        assert!(matches!(outcome, ReorderOutcome::Applied(_)));
        assert_eq!(store.saves(), vec![(BucketId::Step2, ids(&["B", "A"]))]);
        assert_eq!(store.remote(), *editor.layout());
    }

    #[tokio::test]
    async fn cross_bucket_move_saves_both() {
        let store = RecordingStore::with(start());
        let mut editor = editor(&store).await;

        editor
            .apply(&ReorderGesture::new(
                "B",
                BucketId::Step2,
                Some(DropTarget::onto(BucketId::Step3, "Y")),
            ))
            .await
            .unwrap();

        let mut saved: Vec<_> = store.saves().into_iter().map(|(b, _)| b).collect();
        saved.sort();
        assert_eq!(saved, vec![BucketId::Step2, BucketId::Step3]);
        assert_eq!(store.remote().bucket(BucketId::Step3), ids(&["X", "B", "Y"]));
    }

    #[tokio::test]
    async fn no_op_gesture_sends_nothing() {
        let store = RecordingStore::with(start());
        let mut editor = editor(&store).await;

        let outcome = editor
            .apply(&ReorderGesture::new(
                "A",
                BucketId::Step2,
                Some(DropTarget::onto(BucketId::Step2, "A")),
            ))
            .await
            .unwrap();
        assert_eq!(outcome, ReorderOutcome::Discarded);

        let outcome = editor
            .apply(&ReorderGesture::new("A", BucketId::Step2, None))
            .await
            .unwrap();
        assert_eq!(outcome, ReorderOutcome::Discarded);
        assert!(store.saves().is_empty());
        assert_eq!(*editor.layout(), start());
    }

    #[tokio::test]
    async fn rejected_gesture_sends_nothing() {
        let mut layout = start();
        layout.set_bucket(BucketId::Step2, ids(&["A"]));
        let store = RecordingStore::with(layout.clone());
        let mut editor = editor(&store).await;

        let err = editor
            .apply(&ReorderGesture::new(
                "A",
                BucketId::Step2,
                Some(DropTarget::bucket(BucketId::Step3)),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, ReorderError::WouldEmptyBucket { .. }));
        assert_eq!(*editor.layout(), layout);
        assert!(store.saves().is_empty());
    }

    #[tokio::test]
    async fn partial_failure_keeps_local_state_and_attempts_both() {
        let store = RecordingStore::with(start());
        let mut editor = editor(&store).await;
        store.fail(&[BucketId::Step2]);

        let err = editor
            .apply(&ReorderGesture::new(
                "B",
                BucketId::Step2,
                Some(DropTarget::bucket(BucketId::Step3)),
            ))
            .await
            .unwrap_err();

        match err {
            ReorderError::PersistenceFailed { failed, operation } => {
                assert_eq!(failed, vec![BucketId::Step2]);
                assert!(operation.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Optimistic local state is kept.
        assert_eq!(editor.layout().bucket(BucketId::Step2), ids(&["A"]));
        // The other bucket was still saved; remote now diverges.
        assert_eq!(store.saves().len(), 2);
        assert_eq!(store.remote().bucket(BucketId::Step3), ids(&["X", "Y", "B"]));
        assert_eq!(store.remote().bucket(BucketId::Step2), ids(&["A", "B"]));

        // Retry once the store recovers.
        store.fail(&[]);
        editor.retry(&[BucketId::Step2]).await.unwrap();
        assert_eq!(store.remote(), *editor.layout());
    }

    #[tokio::test]
    async fn reload_discards_unsaved_local_changes() {
        let store = RecordingStore::with(start());
        let mut editor = editor(&store).await;
        store.fail(&[BucketId::Step2]);

        let _ = editor
            .apply(&ReorderGesture::new(
                "B",
                BucketId::Step2,
                Some(DropTarget::onto(BucketId::Step2, "A")),
            ))
            .await;
        assert_ne!(*editor.layout(), start());

        editor.reload().await.unwrap();
        assert_eq!(*editor.layout(), start());
    }
}
