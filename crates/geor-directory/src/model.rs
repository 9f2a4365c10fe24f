//! Organization domain model.
//!
//! An organization groups users. Its optional extension holds the details
//! that are not part of the membership entry itself.

use serde::{Deserialize, Serialize};

/// An organization.
///
/// The identifier is the entry's common name and never changes once the
/// organization exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier (`cn`).
    pub id: String,
    /// Display name (`o`).
    pub name: Option<String>,
    /// Short name (`ou`).
    pub short_name: Option<String>,
    /// Cities, in order (`description`).
    pub cities: Vec<String>,
    /// Status (`businessCategory`).
    pub status: Option<String>,
    /// Identifiers of member users (`member`).
    pub members: Vec<String>,
}

impl Organization {
    /// Creates an organization with only its identifier set.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the short name.
    #[must_use]
    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    /// Sets the cities.
    #[must_use]
    pub fn with_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cities = cities.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the initial members.
    #[must_use]
    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    /// Checks if a user is a member.
    #[must_use]
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.eq_ignore_ascii_case(user_id))
    }
}

/// Additional details of an organization, stored as a sibling entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrganizationExtension {
    /// Identifier of the organization this extends (`o`).
    pub id: String,
    /// Organization type (`businessCategory`).
    pub org_type: Option<String>,
    /// Postal address (`postalAddress`).
    pub address: Option<String>,
}

impl OrganizationExtension {
    /// Creates an extension with only its identifier set.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the organization type.
    #[must_use]
    pub fn with_org_type(mut self, org_type: impl Into<String>) -> Self {
        self.org_type = Some(org_type.into());
        self
    }

    /// Sets the postal address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_fields() {
        let org = Organization::new("psc")
            .with_name("Project Steering Committee")
            .with_cities(["Paris", "Lyon"])
            .with_members(["testadmin"]);

        assert_eq!(org.id, "psc");
        assert_eq!(org.cities, vec!["Paris", "Lyon"]);
        assert!(org.short_name.is_none());
        assert!(org.has_member("TestAdmin"));
        assert!(!org.has_member("other"));
    }

    #[test]
    fn serializes_absent_fields_as_null_and_empty() {
        let json = serde_json::to_value(Organization::new("psc")).unwrap();
        assert_eq!(json["name"], serde_json::Value::Null);
        assert_eq!(json["cities"], serde_json::json!([]));
    }
}
