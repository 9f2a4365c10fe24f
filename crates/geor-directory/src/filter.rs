//! LDAP search filters.
//!
//! Filters are built as values and encoded to RFC 4515 text only when handed
//! to the directory client, so assertion values are always escaped.

use std::fmt;

use crate::dn;
use crate::entry::LdapEntry;

/// Attribute holding an entry's object classes.
pub const OBJECT_CLASS: &str = "objectClass";

/// A search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `(attr=value)`.
    Equals(String, String),
    /// `(attr=*)`.
    Present(String),
    /// `(&...)`.
    And(Vec<Filter>),
    /// `(|...)`.
    Or(Vec<Filter>),
}

impl Filter {
    /// Equality assertion.
    #[must_use]
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals(attribute.into(), value.into())
    }

    /// `(objectClass=<class>)`.
    #[must_use]
    pub fn object_class(class: impl Into<String>) -> Self {
        Self::equals(OBJECT_CLASS, class)
    }

    /// Matches every entry.
    #[must_use]
    pub fn any() -> Self {
        Self::Present(OBJECT_CLASS.to_string())
    }

    /// Conjunction of the given filters.
    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Encodes the filter as RFC 4515 text.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Evaluates the filter against an entry.
    ///
    /// Equality uses case-insensitive matching; values of `member`-like
    /// attributes holding DNs are compared after DN normalization.
    #[must_use]
    pub fn matches(&self, entry: &LdapEntry) -> bool {
        match self {
            Self::Equals(attr, expected) => entry
                .get_attrs(attr)
                .iter()
                .any(|value| values_match(value, expected)),
            Self::Present(attr) => {
                attr.eq_ignore_ascii_case(OBJECT_CLASS) || entry.has_attr(attr)
            }
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(entry)),
        }
    }
}

fn values_match(actual: &str, expected: &str) -> bool {
    if actual.eq_ignore_ascii_case(expected) {
        return true;
    }
    actual.contains('=') && expected.contains('=') && dn::eq(actual, expected)
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(attr, value) => write!(f, "({attr}={})", ldap3::ldap_escape(value.as_str())),
            Self::Present(attr) => write!(f, "({attr}=*)"),
            Self::And(filters) => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Or(filters) => {
                f.write_str("(|")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn entry(pairs: &[(&str, &[&str])]) -> LdapEntry {
        let attributes: HashMap<String, Vec<String>> = pairs
            .iter()
            .map(|(k, vs)| ((*k).to_string(), vs.iter().map(|v| (*v).to_string()).collect()))
            .collect();
        LdapEntry::new("cn=psc,ou=orgs,dc=georchestra,dc=org", attributes)
    }

    #[test]
    fn encodes_membership_filter() {
        let filter = Filter::and([
            Filter::equals("member", "uid=jdoe,ou=users,dc=georchestra,dc=org"),
            Filter::object_class("groupOfMembers"),
        ]);
        assert_eq!(
            filter.encode(),
            "(&(member=uid=jdoe,ou=users,dc=georchestra,dc=org)(objectClass=groupOfMembers))"
        );
    }

    #[test]
    fn escapes_assertion_values() {
        let encoded = Filter::equals("cn", "a*(b)").encode();
        assert_eq!(encoded, "(cn=a\\2a\\28b\\29)");
        assert_eq!(Filter::any().encode(), "(objectClass=*)");
    }

    #[test]
    fn evaluates_against_entries() {
        let e = entry(&[
            ("objectClass", &["top", "groupOfMembers"]),
            ("cn", &["psc"]),
            ("member", &["uid=jdoe,ou=users,dc=georchestra,dc=org"]),
        ]);

        assert!(Filter::object_class("GROUPOFMEMBERS").matches(&e));
        assert!(Filter::equals("member", "UID=jdoe, ou=users,dc=georchestra,dc=org").matches(&e));
        assert!(!Filter::equals("member", "uid=other,ou=users,dc=georchestra,dc=org").matches(&e));
        assert!(Filter::Present("cn".into()).matches(&e));
        assert!(!Filter::Present("seeAlso".into()).matches(&e));
        assert!(Filter::Or(vec![Filter::equals("cn", "x"), Filter::equals("cn", "psc")]).matches(&e));
        assert!(!Filter::and([Filter::equals("cn", "psc"), Filter::object_class("organization")]).matches(&e));
    }
}
