//! Static catalog of exportable voter fields.
//!
//! Every field a user can pick in the export dialog is described once here,
//! grouped by [`FieldCategory`]. The catalog is immutable; lookups by key go
//! through a lazily built index.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grouping shown as a section in the field picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Personal,
    Address,
    Districts,
    Voting,
}

impl FieldCategory {
    pub const ALL: [FieldCategory; 4] = [
        FieldCategory::Personal,
        FieldCategory::Address,
        FieldCategory::Districts,
        FieldCategory::Voting,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FieldCategory::Personal => "Personal Information",
            FieldCategory::Address => "Address",
            FieldCategory::Districts => "Districts",
            FieldCategory::Voting => "Voting History",
        }
    }
}

/// (key, display label, category) triple for one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub category: FieldCategory,
}

const fn field(key: &'static str, label: &'static str, category: FieldCategory) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        category,
    }
}

use FieldCategory::{Address, Districts, Personal, Voting};

static FIELDS: [FieldDescriptor; 34] = [
    // Personal
    field("voter_id", "Voter ID", Personal),
    field("first_name", "First Name", Personal),
    field("middle_name", "Middle Name", Personal),
    field("last_name", "Last Name", Personal),
    field("name_suffix", "Suffix", Personal),
    field("date_of_birth", "Date of Birth", Personal),
    field("gender", "Gender", Personal),
    field("race", "Race", Personal),
    field("party", "Party", Personal),
    field("phone", "Phone", Personal),
    field("email", "Email", Personal),
    // Address
    field("residence_address", "Residence Address", Address),
    field("residence_city", "Residence City", Address),
    field("residence_state", "Residence State", Address),
    field("residence_zip", "Residence ZIP", Address),
    field("mailing_address", "Mailing Address", Address),
    field("mailing_city", "Mailing City", Address),
    field("mailing_state", "Mailing State", Address),
    field("mailing_zip", "Mailing ZIP", Address),
    field("county", "County", Address),
    // Districts
    field("precinct", "Precinct", Districts),
    field("congressional_district", "Congressional District", Districts),
    field("state_senate_district", "State Senate District", Districts),
    field("state_house_district", "State House District", Districts),
    field("county_commission_district", "County Commission District", Districts),
    field("city_council_district", "City Council District", Districts),
    field("school_board_district", "School Board District", Districts),
    field("municipality", "Municipality", Districts),
    // Voting
    field("registration_date", "Registration Date", Voting),
    field("voter_status", "Voter Status", Voting),
    field("last_voted_date", "Last Voted", Voting),
    field("general_elections_voted", "General Elections Voted", Voting),
    field("primary_elections_voted", "Primary Elections Voted", Voting),
    field("absentee_status", "Absentee Status", Voting),
];

static INDEX: Lazy<HashMap<&'static str, &'static FieldDescriptor>> =
    Lazy::new(|| FIELDS.iter().map(|f| (f.key, f)).collect());

/// Every descriptor, in catalog order.
pub fn all_fields() -> &'static [FieldDescriptor] {
    &FIELDS
}

/// Categories in display order.
pub fn categories() -> &'static [FieldCategory] {
    &FieldCategory::ALL
}

/// Descriptors belonging to `category`, in catalog order.
pub fn fields_in(category: FieldCategory) -> impl Iterator<Item = &'static FieldDescriptor> {
    FIELDS.iter().filter(move |f| f.category == category)
}

pub fn descriptor(key: &str) -> Option<&'static FieldDescriptor> {
    INDEX.get(key).copied()
}

pub fn label_for(key: &str) -> Option<&'static str> {
    descriptor(key).map(|f| f.label)
}

/// Position of `key` in catalog order.
pub(crate) fn position(key: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<_> = all_fields().iter().map(|f| f.key).collect();
        assert_eq!(keys.len(), all_fields().len());
    }

    #[test]
    fn test_every_category_has_fields() {
        for category in categories() {
            assert!(fields_in(*category).count() > 0, "{category:?} is empty");
        }
    }

    #[test]
    fn test_fields_grouped_contiguously() {
        let total: usize = categories().iter().map(|c| fields_in(*c).count()).sum();
        assert_eq!(total, all_fields().len());
    }

    #[test]
    fn test_label_lookup() {
        assert_eq!(label_for("first_name"), Some("First Name"));
        assert_eq!(label_for("residence_zip"), Some("Residence ZIP"));
        assert_eq!(label_for("no_such_field"), None);
    }

    #[test]
    fn test_descriptor_carries_category() {
        let d = descriptor("precinct").unwrap();
        assert_eq!(d.category, FieldCategory::Districts);
        assert_eq!(d.key, "precinct");
    }

    #[test]
    fn test_position_follows_catalog_order() {
        assert_eq!(position("voter_id"), Some(0));
        assert!(position("first_name") < position("last_name"));
        assert_eq!(position("bogus"), None);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(FieldCategory::Voting.label(), "Voting History");
        let json = serde_json::to_string(&FieldCategory::Districts).unwrap();
        assert_eq!(json, "\"districts\"");
    }
}
