//! Step configuration data model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fields::{self, FieldId};

/// A configurable wizard step. Step 1 (credentials) is fixed.
///
/// Serializes as the bare step number, so a configuration renders as
/// `{"2": [...], "3": [...]}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BucketId {
    Step2,
    Step3,
}

impl BucketId {
    pub const ALL: [BucketId; 2] = [Self::Step2, Self::Step3];

    pub fn number(&self) -> u8 {
        match self {
            Self::Step2 => 2,
            Self::Step3 => 3,
        }
    }
}

impl TryFrom<u8> for BucketId {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            2 => Ok(Self::Step2),
            3 => Ok(Self::Step3),
            other => Err(format!("step {other} is not configurable")),
        }
    }
}

impl From<BucketId> for u8 {
    fn from(bucket: BucketId) -> Self {
        bucket.number()
    }
}

impl std::fmt::Display for BucketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Mapping from configurable step to the ordered field components it renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepConfiguration {
    buckets: BTreeMap<BucketId, Vec<FieldId>>,
}

impl StepConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout seeded into a fresh backend.
    pub fn default_layout() -> Self {
        let mut layout = Self::new();
        layout.set_bucket(BucketId::Step2, vec!["AboutMe".into(), "AddressForm".into()]);
        layout.set_bucket(BucketId::Step3, vec!["BirthdatePicker".into()]);
        layout
    }

    /// Fields of a bucket in render order. A missing bucket reads as empty.
    pub fn bucket(&self, bucket: BucketId) -> &[FieldId] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_bucket(&mut self, bucket: BucketId, fields: Vec<FieldId>) {
        self.buckets.insert(bucket, fields);
    }

    pub fn buckets(&self) -> impl Iterator<Item = (BucketId, &[FieldId])> {
        self.buckets.iter().map(|(id, fields)| (*id, fields.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Identifiers with no registry entry. They render as nothing and impose
    /// no requirement, but are worth reporting.
    pub fn unknown_fields(&self) -> Vec<(BucketId, FieldId)> {
        self.buckets()
            .flat_map(|(id, ids)| {
                ids.iter()
                    .filter(|f| !fields::is_known(f))
                    .map(move |f| (id, f.clone()))
            })
            .collect()
    }

    /// Identifiers that appear more than once across the whole layout.
    pub fn duplicated_fields(&self) -> Vec<FieldId> {
        let mut seen = std::collections::HashSet::new();
        let mut dupes = Vec::new();
        for (_, ids) in self.buckets() {
            for field in ids {
                if !seen.insert(field) && !dupes.contains(field) {
                    dupes.push(field.clone());
                }
            }
        }
        dupes
    }
}
