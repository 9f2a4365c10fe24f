//! Mapping between organization models and directory entries.
//!
//! Attribute names and object classes are fixed by the directory schema.

use crate::dn::{self, DirectoryLayout, ORG_EXT_RDN_ATTRIBUTE, ORG_RDN_ATTRIBUTE};
use crate::entry::LdapEntry;
use crate::error::{DirectoryError, DirectoryResult};
use crate::filter::OBJECT_CLASS;
use crate::model::{Organization, OrganizationExtension};
use crate::store::EntryAttributes;

/// Schema names used by organization entries.
pub mod schema {
    /// Root object class.
    pub const TOP: &str = "top";
    /// Object class of organization entries.
    pub const GROUP_OF_MEMBERS: &str = "groupOfMembers";
    /// Object class of organization extension entries.
    pub const ORGANIZATION: &str = "organization";

    /// Common name.
    pub const CN: &str = "cn";
    /// Organization name.
    pub const O: &str = "o";
    /// Organizational unit name.
    pub const OU: &str = "ou";
    /// Holds the flattened cities.
    pub const DESCRIPTION: &str = "description";
    /// Status or type.
    pub const BUSINESS_CATEGORY: &str = "businessCategory";
    /// Member DNs.
    pub const MEMBER: &str = "member";
    /// Back-reference to the extension entry.
    pub const SEE_ALSO: &str = "seeAlso";
    /// Postal address.
    pub const POSTAL_ADDRESS: &str = "postalAddress";
}

/// Separator of the flattened city list.
pub const CITY_SEPARATOR: char = ',';

/// Converts organizations to and from directory entries.
#[derive(Debug, Clone)]
pub struct OrgMapper {
    layout: DirectoryLayout,
}

impl OrgMapper {
    /// Creates a mapper for a directory layout.
    #[must_use]
    pub const fn new(layout: DirectoryLayout) -> Self {
        Self { layout }
    }

    /// Returns the layout.
    #[must_use]
    pub const fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    /// Returns the member DN of a user.
    #[must_use]
    pub fn member_dn(&self, user_id: &str) -> String {
        self.layout.user_dn(user_id)
    }

    /// Builds the attributes of a new organization entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::InvalidInput` for an empty identifier or a
    /// city that would not read back unchanged.
    ///
    /// Members naming the same entry are written once.
    pub fn org_attributes(&self, org: &Organization) -> DirectoryResult<EntryAttributes> {
        check_id(&org.id)?;
        let description = join_cities(&org.cities)?;

        let mut attrs: EntryAttributes = vec![
            (
                OBJECT_CLASS.to_string(),
                vec![schema::TOP.to_string(), schema::GROUP_OF_MEMBERS.to_string()],
            ),
            (schema::CN.to_string(), vec![org.id.clone()]),
        ];
        push_opt(&mut attrs, schema::O, org.name.as_deref());
        push_opt(&mut attrs, schema::OU, org.short_name.as_deref());
        push_opt(&mut attrs, schema::DESCRIPTION, description.as_deref());
        push_opt(&mut attrs, schema::BUSINESS_CATEGORY, org.status.as_deref());
        attrs.push((
            schema::SEE_ALSO.to_string(),
            vec![self.layout.org_ext_dn(&org.id)],
        ));

        let mut members: Vec<String> = Vec::with_capacity(org.members.len());
        for member in org.members.iter().map(|user| self.member_dn(user)) {
            if !members.iter().any(|m| dn::eq(m, &member)) {
                members.push(member);
            }
        }
        if !members.is_empty() {
            attrs.push((schema::MEMBER.to_string(), members));
        }

        Ok(attrs)
    }

    /// Builds an organization from its entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::ConsistencyViolation` when the entry has no
    /// usable identifier.
    pub fn org_from_entry(&self, entry: &LdapEntry) -> DirectoryResult<Organization> {
        let id = entry
            .get_attr(schema::CN)
            .map(str::to_string)
            .or_else(|| dn::leading_value(&entry.dn, ORG_RDN_ATTRIBUTE))
            .ok_or_else(|| {
                DirectoryError::consistency(format!("organization entry without cn: {}", entry.dn))
            })?;

        let members = entry
            .get_attrs(schema::MEMBER)
            .iter()
            .map(|member| {
                self.layout.user_id(member).unwrap_or_else(|| {
                    tracing::debug!(org = %id, member = %member, "member outside the users root");
                    member.clone()
                })
            })
            .collect();

        Ok(Organization {
            id,
            name: owned(entry.get_attr(schema::O)),
            short_name: owned(entry.get_attr(schema::OU)),
            cities: split_cities(entry.get_attr(schema::DESCRIPTION)),
            status: owned(entry.get_attr(schema::BUSINESS_CATEGORY)),
            members,
        })
    }

    /// Builds the attributes of a new extension entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::InvalidInput` for an empty identifier.
    pub fn ext_attributes(&self, ext: &OrganizationExtension) -> DirectoryResult<EntryAttributes> {
        check_id(&ext.id)?;

        let mut attrs: EntryAttributes = vec![
            (
                OBJECT_CLASS.to_string(),
                vec![schema::TOP.to_string(), schema::ORGANIZATION.to_string()],
            ),
            (schema::O.to_string(), vec![ext.id.clone()]),
        ];
        push_opt(&mut attrs, schema::BUSINESS_CATEGORY, ext.org_type.as_deref());
        push_opt(&mut attrs, schema::POSTAL_ADDRESS, ext.address.as_deref());
        Ok(attrs)
    }

    /// Builds an extension from its entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::ConsistencyViolation` when the entry has no
    /// usable identifier.
    pub fn ext_from_entry(&self, entry: &LdapEntry) -> DirectoryResult<OrganizationExtension> {
        let id = dn::leading_value(&entry.dn, ORG_EXT_RDN_ATTRIBUTE)
            .or_else(|| entry.get_attr(schema::O).map(str::to_string))
            .ok_or_else(|| {
                DirectoryError::consistency(format!("extension entry without o: {}", entry.dn))
            })?;

        Ok(OrganizationExtension {
            id,
            org_type: owned(entry.get_attr(schema::BUSINESS_CATEGORY)),
            address: owned(entry.get_attr(schema::POSTAL_ADDRESS)),
        })
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn push_opt(attrs: &mut EntryAttributes, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        attrs.push((name.to_string(), vec![value.to_string()]));
    }
}

fn check_id(id: &str) -> DirectoryResult<()> {
    if id.trim().is_empty() {
        return Err(DirectoryError::invalid("identifier cannot be empty"));
    }
    Ok(())
}

/// Flattens cities into one value, `None` when there is none.
///
/// ## Errors
///
/// Returns `DirectoryError::InvalidInput` when a city is blank, carries
/// surrounding whitespace or contains the separator.
pub fn join_cities(cities: &[String]) -> DirectoryResult<Option<String>> {
    for city in cities {
        if city.trim().is_empty() {
            return Err(DirectoryError::invalid("city cannot be blank"));
        }
        if city.trim() != city {
            return Err(DirectoryError::invalid(format!(
                "city '{city}' has leading or trailing whitespace"
            )));
        }
        if city.contains(CITY_SEPARATOR) {
            return Err(DirectoryError::invalid(format!(
                "city '{city}' contains the '{CITY_SEPARATOR}' separator"
            )));
        }
    }
    if cities.is_empty() {
        return Ok(None);
    }
    Ok(Some(cities.join(&CITY_SEPARATOR.to_string())))
}

/// Splits the flattened city list, skipping empty segments.
#[must_use]
pub fn split_cities(description: Option<&str>) -> Vec<String> {
    description
        .map(|d| {
            d.split(CITY_SEPARATOR)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn mapper() -> OrgMapper {
        OrgMapper::new(DirectoryLayout::default())
    }

    fn to_entry(dn: &str, attrs: EntryAttributes) -> LdapEntry {
        LdapEntry::new(dn, attrs.into_iter().collect::<HashMap<_, _>>())
    }

    #[test]
    fn org_attributes_include_schema_and_back_reference() {
        let org = Organization::new("psc")
            .with_name("PSC")
            .with_cities(["Paris", "Lyon"])
            .with_members(["testadmin"]);
        let attrs = mapper().org_attributes(&org).unwrap();
        let map: HashMap<_, _> = attrs.into_iter().collect();

        assert_eq!(map["objectClass"], vec!["top", "groupOfMembers"]);
        assert_eq!(map["description"], vec!["Paris,Lyon"]);
        assert_eq!(map["seeAlso"], vec!["o=psc,ou=orgs,dc=georchestra,dc=org"]);
        assert_eq!(map["member"], vec!["uid=testadmin,ou=users,dc=georchestra,dc=org"]);
        assert!(!map.contains_key("ou"));
        assert!(!map.contains_key("businessCategory"));
    }

    #[test]
    fn org_round_trips_through_entry() {
        let org = Organization::new("psc")
            .with_name("PSC")
            .with_short_name("psc")
            .with_status("REGISTERED")
            .with_cities(["Paris", "Lyon"])
            .with_members(["a", "b"]);
        let m = mapper();
        let entry = to_entry(&m.layout().org_dn("psc"), m.org_attributes(&org).unwrap());

        assert_eq!(m.org_from_entry(&entry).unwrap(), org);
    }

    #[test]
    fn foreign_members_are_kept_verbatim() {
        let entry = to_entry(
            "cn=psc,ou=orgs,dc=georchestra,dc=org",
            vec![
                ("cn".into(), vec!["psc".into()]),
                ("member".into(), vec!["uid=svc,ou=system,dc=georchestra,dc=org".into()]),
            ],
        );
        let org = mapper().org_from_entry(&entry).unwrap();
        assert_eq!(org.members, vec!["uid=svc,ou=system,dc=georchestra,dc=org"]);
    }

    #[test]
    fn rejects_unstorable_values() {
        let m = mapper();
        assert!(matches!(
            m.org_attributes(&Organization::new("")),
            Err(DirectoryError::InvalidInput(_))
        ));
        assert!(matches!(
            m.org_attributes(&Organization::new("x").with_cities(["Saint-Denis, Réunion"])),
            Err(DirectoryError::InvalidInput(_))
        ));
        assert!(m.ext_attributes(&OrganizationExtension::new("  ")).is_err());
    }

    #[test]
    fn rejects_cities_that_would_not_read_back() {
        for cities in [vec!["Paris", " Lyon"], vec!["Paris", ""], vec!["Lyon\t"], vec!["  "]] {
            let org = Organization::new("psc").with_cities(cities.clone());
            assert!(
                matches!(mapper().org_attributes(&org), Err(DirectoryError::InvalidInput(_))),
                "accepted {cities:?}"
            );
        }
    }

    #[test]
    fn duplicate_members_are_written_once() {
        let org = Organization::new("psc").with_members(["jdoe", "testadmin", "jdoe", "JDoe"]);
        let attrs = mapper().org_attributes(&org).unwrap();
        let map: HashMap<_, _> = attrs.into_iter().collect();

        assert_eq!(
            map["member"],
            vec![
                "uid=jdoe,ou=users,dc=georchestra,dc=org",
                "uid=testadmin,ou=users,dc=georchestra,dc=org",
            ]
        );
    }

    #[test]
    fn cities_split_skips_empty_segments() {
        assert_eq!(split_cities(Some("Paris,,Lyon,")), vec!["Paris", "Lyon"]);
        assert!(split_cities(None).is_empty());
        assert_eq!(join_cities(&[]).unwrap(), None);
    }

    #[test]
    fn extension_round_trips_through_entry() {
        let ext = OrganizationExtension::new("psc")
            .with_org_type("Association")
            .with_address("1 rue de la Paix, Paris");
        let m = mapper();
        let entry = to_entry(&m.layout().org_ext_dn("psc"), m.ext_attributes(&ext).unwrap());

        assert_eq!(m.ext_from_entry(&entry).unwrap(), ext);
    }

    #[test]
    fn entry_without_identifier_is_inconsistent() {
        let entry = to_entry("ou=orgs,dc=georchestra,dc=org", vec![]);
        assert!(matches!(
            mapper().org_from_entry(&entry),
            Err(DirectoryError::ConsistencyViolation(_))
        ));
    }
}
