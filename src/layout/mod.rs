//! Step configuration: which field components each configurable step renders,
//! and the client contract for loading and saving it.

pub mod model;

use async_trait::async_trait;
use tracing::warn;

use crate::error::LayoutError;
use crate::fields::FieldId;

pub use model::{BucketId, StepConfiguration};

/// Remote store holding the step configuration.
///
/// `save` overwrites exactly one bucket. Callers that change several buckets
/// issue one call per bucket and deal with partial failure themselves.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<StepConfiguration, LayoutError>;

    async fn save(&self, bucket: BucketId, fields: &[FieldId]) -> Result<(), LayoutError>;
}

/// Load the configuration, falling back to an empty one when the store is
/// unavailable. Unknown and duplicated identifiers are reported, not dropped.
pub async fn load_or_empty(store: &dyn ConfigStore) -> StepConfiguration {
    let layout = match store.load().await {
        Ok(layout) => layout,
        Err(e) => {
            warn!(error = %e, "Step configuration unavailable, continuing with an empty layout");
            return StepConfiguration::new();
        }
    };
    report_anomalies(&layout);
    layout
}

/// Log identifiers the registry doesn't know and identifiers placed twice.
pub fn report_anomalies(layout: &StepConfiguration) {
    for (bucket, field) in layout.unknown_fields() {
        warn!(%bucket, %field, "Unknown field component in step configuration");
    }
    for field in layout.duplicated_fields() {
        warn!(%field, "Field component configured in more than one step");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreachable;

    #[async_trait]
    impl ConfigStore for Unreachable {
        async fn load(&self) -> Result<StepConfiguration, LayoutError> {
            Err(LayoutError::Unavailable("connection refused".into()))
        }

        async fn save(&self, bucket: BucketId, _fields: &[FieldId]) -> Result<(), LayoutError> {
            Err(LayoutError::SaveFailed {
                bucket,
                reason: "connection refused".into(),
            })
        }
    }

    struct Fixed(StepConfiguration);

    #[async_trait]
    impl ConfigStore for Fixed {
        async fn load(&self) -> Result<StepConfiguration, LayoutError> {
            Ok(self.0.clone())
        }

        async fn save(&self, _bucket: BucketId, _fields: &[FieldId]) -> Result<(), LayoutError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn unavailable_store_degrades_to_empty() {
        let layout = load_or_empty(&Unreachable).await;
        assert!(layout.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_kept() {
        let mut layout = StepConfiguration::default_layout();
        layout.set_bucket(BucketId::Step3, vec!["Mystery".into()]);
        let loaded = load_or_empty(&Fixed(layout.clone())).await;
        assert_eq!(loaded, layout);
    }
}
