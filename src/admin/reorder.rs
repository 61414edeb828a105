//! Reorder planning: turns one drag-and-drop gesture into the new contents of
//! every bucket it touches.
//!
//! Planning is pure. [`super::editor::LayoutEditor`] applies the result and
//! persists it.

use tracing::debug;

use crate::error::ReorderError;
use crate::fields::FieldId;
use crate::layout::{BucketId, StepConfiguration};

/// Where a dragged field was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub bucket: BucketId,
    /// The field it was dropped onto; `None` for the bucket itself.
    pub field: Option<FieldId>,
}

impl DropTarget {
    pub fn onto(bucket: BucketId, field: impl Into<FieldId>) -> Self {
        Self {
            bucket,
            field: Some(field.into()),
        }
    }

    pub fn bucket(bucket: BucketId) -> Self {
        Self { bucket, field: None }
    }
}

/// A single drag-and-drop interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderGesture {
    pub field: FieldId,
    pub source: BucketId,
    /// `None` when the field was released outside any bucket.
    pub target: Option<DropTarget>,
}

impl ReorderGesture {
    pub fn new(field: impl Into<FieldId>, source: BucketId, target: Option<DropTarget>) -> Self {
        Self {
            field: field.into(),
            source,
            target,
        }
    }
}

/// The effect of a gesture: the full new sequence of each changed bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOperation {
    pub source: BucketId,
    pub destination: BucketId,
    pub moved: FieldId,
    pub changes: Vec<(BucketId, Vec<FieldId>)>,
}

impl ReorderOperation {
    pub fn is_cross_bucket(&self) -> bool {
        self.source != self.destination
    }

    pub fn changed_buckets(&self) -> Vec<BucketId> {
        self.changes.iter().map(|(bucket, _)| *bucket).collect()
    }

    pub fn apply_to(&self, layout: &mut StepConfiguration) {
        for (bucket, fields) in &self.changes {
            layout.set_bucket(*bucket, fields.clone());
        }
    }
}

/// Plan a gesture against `layout`.
///
/// Returns `Ok(None)` for gestures that change nothing: no drop target, a drop
/// onto the dragged field itself, or a move that lands where it started.
/// Moving the only field out of (or within) its bucket is rejected because a
/// bucket must never end up empty.
pub fn plan(
    layout: &StepConfiguration,
    gesture: &ReorderGesture,
) -> Result<Option<ReorderOperation>, ReorderError> {
    let Some(target) = &gesture.target else {
        debug!(field = %gesture.field, "Drop outside any step, ignoring");
        return Ok(None);
    };

    let source_items = layout.bucket(gesture.source);
    let Some(from) = source_items.iter().position(|f| *f == gesture.field) else {
        return Err(ReorderError::NotInBucket {
            field: gesture.field.to_string(),
            bucket: gesture.source,
        });
    };

    if source_items.len() == 1 {
        return Err(ReorderError::WouldEmptyBucket {
            bucket: gesture.source,
        });
    }

    if target.field.as_ref() == Some(&gesture.field) {
        return Ok(None);
    }

    let changes = if target.bucket == gesture.source {
        // Array move: the field takes the target's index.
        let to = target
            .field
            .as_ref()
            .and_then(|over| source_items.iter().position(|f| f == over));
        let mut items = source_items.to_vec();
        let moved = items.remove(from);
        let to = to.unwrap_or(items.len()).min(items.len());
        items.insert(to, moved);
        if items == source_items {
            return Ok(None);
        }
        vec![(gesture.source, items)]
    } else {
        // Insert before the target, or at the end.
        let mut items = source_items.to_vec();
        let moved = items.remove(from);
        let mut dest = layout.bucket(target.bucket).to_vec();
        let at = target
            .field
            .as_ref()
            .and_then(|over| dest.iter().position(|f| f == over))
            .unwrap_or(dest.len());
        dest.insert(at, moved);
        vec![(gesture.source, items), (target.bucket, dest)]
    };

    Ok(Some(ReorderOperation {
        source: gesture.source,
        destination: target.bucket,
        moved: gesture.field.clone(),
        changes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<FieldId> {
        items.iter().map(|s| FieldId::new(*s)).collect()
    }

    fn layout(step2: &[&str], step3: &[&str]) -> StepConfiguration {
        let mut layout = StepConfiguration::new();
        layout.set_bucket(BucketId::Step2, ids(step2));
        layout.set_bucket(BucketId::Step3, ids(step3));
        layout
    }

    fn apply(layout: &mut StepConfiguration, gesture: ReorderGesture) -> Option<ReorderOperation> {
        let op = plan(layout, &gesture).unwrap();
        if let Some(op) = &op {
            op.apply_to(layout);
        }
        op
    }

    #[test]
    fn same_bucket_moves_onto_target_index() {
        let mut l = layout(&["A", "B", "C"], &["X"]);
        let op = apply(
            &mut l,
            ReorderGesture::new("C", BucketId::Step2, Some(DropTarget::onto(BucketId::Step2, "A"))),
        )
        .unwrap();
        assert_eq!(l.bucket(BucketId::Step2), ids(&["C", "A", "B"]));
        assert!(!op.is_cross_bucket());
        assert_eq!(op.changed_buckets(), vec![BucketId::Step2]);
    }

    #[test]
    fn same_bucket_forward_move_shifts_elements_back() {
        let mut l = layout(&["A", "B", "C", "D"], &["X"]);
        apply(
            &mut l,
            ReorderGesture::new("A", BucketId::Step2, Some(DropTarget::onto(BucketId::Step2, "C"))),
        );
        assert_eq!(l.bucket(BucketId::Step2), ids(&["B", "C", "A", "D"]));
    }

    #[test]
    fn dropping_onto_itself_is_a_no_op() {
        let l = layout(&["A", "B", "C"], &["X"]);
        let gesture =
            ReorderGesture::new("A", BucketId::Step2, Some(DropTarget::onto(BucketId::Step2, "A")));
        assert_eq!(plan(&l, &gesture).unwrap(), None);
    }

    #[test]
    fn no_target_is_a_no_op() {
        let l = layout(&["A", "B"], &["X"]);
        assert_eq!(plan(&l, &ReorderGesture::new("A", BucketId::Step2, None)).unwrap(), None);
    }

    #[test]
    fn move_to_current_position_is_a_no_op() {
        let l = layout(&["A", "B", "C"], &["X"]);
        let target = Some(DropTarget::bucket(BucketId::Step2));
        let gesture = ReorderGesture::new("C", BucketId::Step2, target);
        assert_eq!(plan(&l, &gesture).unwrap(), None);
    }

    #[test]
    fn cross_bucket_inserts_before_target() {
        let mut l = layout(&["A", "B"], &["X", "Y"]);
        let op = apply(
            &mut l,
            ReorderGesture::new("B", BucketId::Step2, Some(DropTarget::onto(BucketId::Step3, "Y"))),
        )
        .unwrap();
        assert_eq!(l.bucket(BucketId::Step2), ids(&["A"]));
        assert_eq!(l.bucket(BucketId::Step3), ids(&["X", "B", "Y"]));
        assert!(op.is_cross_bucket());
        assert_eq!(op.changed_buckets(), vec![BucketId::Step2, BucketId::Step3]);
    }

    #[test]
    fn cross_bucket_onto_bucket_appends() {
        let mut l = layout(&["A", "B"], &["X", "Y"]);
        apply(
            &mut l,
            ReorderGesture::new("A", BucketId::Step2, Some(DropTarget::bucket(BucketId::Step3))),
        );
        assert_eq!(l.bucket(BucketId::Step2), ids(&["B"]));
        assert_eq!(l.bucket(BucketId::Step3), ids(&["X", "Y", "A"]));
    }

    #[test]
    fn cross_bucket_into_missing_bucket_creates_it() {
        let mut l = StepConfiguration::new();
        l.set_bucket(BucketId::Step2, ids(&["A", "B"]));
        apply(
            &mut l,
            ReorderGesture::new("B", BucketId::Step2, Some(DropTarget::bucket(BucketId::Step3))),
        );
        assert_eq!(l.bucket(BucketId::Step3), ids(&["B"]));
    }

    #[test]
    fn sole_field_can_never_leave() {
        let l = layout(&["AboutMe"], &["AddressForm", "BirthdatePicker"]);
        let targets = [
            Some(DropTarget::onto(BucketId::Step2, "AboutMe")),
            Some(DropTarget::bucket(BucketId::Step2)),
            Some(DropTarget::bucket(BucketId::Step3)),
            Some(DropTarget::onto(BucketId::Step3, "AddressForm")),
            Some(DropTarget::onto(BucketId::Step3, "BirthdatePicker")),
        ];
        for target in targets {
            let gesture = ReorderGesture::new("AboutMe", BucketId::Step2, target.clone());
            let err = plan(&l, &gesture).unwrap_err();
            assert!(
                matches!(err, ReorderError::WouldEmptyBucket { bucket: BucketId::Step2 }),
                "target {target:?} should be rejected"
            );
        }
        assert_eq!(l.bucket(BucketId::Step2), ids(&["AboutMe"]));
    }

    #[test]
    fn field_must_be_in_source_bucket() {
        let l = layout(&["A", "B"], &["X"]);
        let target = Some(DropTarget::bucket(BucketId::Step2));
        let gesture = ReorderGesture::new("X", BucketId::Step2, target);
        assert!(matches!(
            plan(&l, &gesture),
            Err(ReorderError::NotInBucket { bucket: BucketId::Step2, .. })
        ));
    }
}
