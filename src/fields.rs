//! Field registry: static catalog of the field components a step can hold.
//!
//! Each entry names the widget that renders the component, the profile
//! attributes it populates, and the single attribute (if any) that must be
//! filled for a step containing it to count as complete.

use serde::{Deserialize, Serialize};

/// Opaque name of a field component, e.g. `"AboutMe"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FieldId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Profile attribute keys a field component can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileAttribute {
    AboutMe,
    StreetAddress,
    City,
    State,
    Zip,
    Birthdate,
}

impl ProfileAttribute {
    pub const ALL: [ProfileAttribute; 6] = [
        Self::AboutMe,
        Self::StreetAddress,
        Self::City,
        Self::State,
        Self::Zip,
        Self::Birthdate,
    ];

    /// Wire/column name of the attribute.
    pub fn key(&self) -> &'static str {
        match self {
            Self::AboutMe => "about_me",
            Self::StreetAddress => "street_address",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::Birthdate => "birthdate",
        }
    }
}

impl std::fmt::Display for ProfileAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The input widget a field component renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    TextArea,
    AddressBlock,
    DatePicker,
}

/// What a field component requires before its step is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Attribute(ProfileAttribute),
    None,
}

/// One registry entry.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub widget: Widget,
    pub populates: &'static [ProfileAttribute],
    pub requirement: Requirement,
}

/// All known field components.
pub static REGISTRY: &[FieldSpec] = &[
    FieldSpec {
        id: "AboutMe",
        title: "About Me",
        widget: Widget::TextArea,
        populates: &[ProfileAttribute::AboutMe],
        requirement: Requirement::Attribute(ProfileAttribute::AboutMe),
    },
    FieldSpec {
        id: "AddressForm",
        title: "Address Form",
        widget: Widget::AddressBlock,
        populates: &[
            ProfileAttribute::StreetAddress,
            ProfileAttribute::City,
            ProfileAttribute::State,
            ProfileAttribute::Zip,
        ],
        // Only the street line gates completion.
        requirement: Requirement::Attribute(ProfileAttribute::StreetAddress),
    },
    FieldSpec {
        id: "BirthdatePicker",
        title: "Birthdate",
        widget: Widget::DatePicker,
        populates: &[ProfileAttribute::Birthdate],
        requirement: Requirement::Attribute(ProfileAttribute::Birthdate),
    },
];

/// Look up a field component by identifier.
pub fn lookup(id: &FieldId) -> Option<&'static FieldSpec> {
    REGISTRY.iter().find(|spec| spec.id == id.as_str())
}

/// The requirement a field imposes. Unknown ids impose nothing.
pub fn requirement_of(id: &FieldId) -> Requirement {
    lookup(id)
        .map(|spec| spec.requirement)
        .unwrap_or(Requirement::None)
}

pub fn is_known(id: &FieldId) -> bool {
    lookup(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_fields_map_to_attributes() {
        assert_eq!(
            requirement_of(&"AboutMe".into()),
            Requirement::Attribute(ProfileAttribute::AboutMe)
        );
        assert_eq!(
            requirement_of(&"AddressForm".into()),
            Requirement::Attribute(ProfileAttribute::StreetAddress)
        );
        assert_eq!(
            requirement_of(&"BirthdatePicker".into()),
            Requirement::Attribute(ProfileAttribute::Birthdate)
        );
    }

    #[test]
    fn unknown_field_imposes_nothing() {
        let id = FieldId::new("FavoriteColor");
        assert!(!is_known(&id));
        assert_eq!(requirement_of(&id), Requirement::None);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup(&"aboutme".into()).is_none());
    }

    #[test]
    fn registry_ids_are_unique() {
        let mut ids: Vec<_> = REGISTRY.iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), REGISTRY.len());
    }

    #[test]
    fn required_attribute_is_populated_by_its_widget() {
        for spec in REGISTRY {
            if let Requirement::Attribute(attr) = spec.requirement {
                assert!(spec.populates.contains(&attr), "{} must populate {attr}", spec.id);
            }
        }
    }

    #[test]
    fn attribute_serde_matches_key() {
        for attr in ProfileAttribute::ALL {
            let json = serde_json::to_string(&attr).unwrap();
            assert_eq!(json, format!("\"{}\"", attr.key()));
        }
    }

    #[test]
    fn field_id_serializes_transparently() {
        let id = FieldId::new("AboutMe");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"AboutMe\"");
    }
}
