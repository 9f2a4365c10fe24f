//! Directory entries.

use std::collections::HashMap;

use ldap3::SearchEntry;

/// An LDAP entry with its attributes.
///
/// Every attribute is multi-valued; an absent attribute reads as an empty
/// slice. Attribute names are matched case-insensitively, as servers are free
/// to return them in any case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished Name.
    pub dn: String,

    /// Attributes (all values are multi-valued).
    pub attributes: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(dn: impl Into<String>, attributes: HashMap<String, Vec<String>>) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }

    /// Creates an entry from an `ldap3` search result.
    #[must_use]
    pub fn from_search_entry(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Vec<String>> {
        self.attributes.get(name).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.lookup(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Gets all values of an attribute, in directory order.
    #[must_use]
    pub fn get_attrs(&self, name: &str) -> &[String] {
        self.lookup(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Checks if the entry has at least one value for an attribute.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|v| !v.is_empty())
    }

    /// Checks if the entry carries an object class.
    #[must_use]
    pub fn has_object_class(&self, class: &str) -> bool {
        self.get_attrs(crate::filter::OBJECT_CLASS)
            .iter()
            .any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Keeps only the requested attributes.
    ///
    /// An empty request or `*` keeps everything.
    #[must_use]
    pub fn project(mut self, requested: &[&str]) -> Self {
        if requested.is_empty() || requested.contains(&"*") {
            return self;
        }
        self.attributes
            .retain(|name, _| requested.iter().any(|r| r.eq_ignore_ascii_case(name)));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LdapEntry {
        let mut attrs = HashMap::new();
        attrs.insert("cn".to_string(), vec!["psc".to_string()]);
        attrs.insert(
            "objectclass".to_string(),
            vec!["top".to_string(), "groupOfMembers".to_string()],
        );
        attrs.insert("member".to_string(), vec![]);
        LdapEntry::new("cn=psc,ou=orgs,dc=georchestra,dc=org", attrs)
    }

    #[test]
    fn ldap_entry_get_attr() {
        let entry = sample();

        assert_eq!(entry.get_attr("cn"), Some("psc"));
        assert_eq!(entry.get_attr("CN"), Some("psc"));
        assert_eq!(entry.get_attr("missing"), None);
        assert!(entry.get_attrs("missing").is_empty());
        assert!(entry.has_attr("cn"));
        assert!(!entry.has_attr("member"));
    }

    #[test]
    fn object_class_lookup_ignores_case() {
        let entry = sample();
        assert!(entry.has_object_class("groupofmembers"));
        assert!(!entry.has_object_class("organization"));
    }

    #[test]
    fn projection_keeps_requested_attributes() {
        let entry = sample().project(&["CN"]);
        assert_eq!(entry.attributes.len(), 1);
        assert_eq!(entry.get_attr("cn"), Some("psc"));

        assert_eq!(sample().project(&[]).attributes.len(), 3);
        assert_eq!(sample().project(&["*"]).attributes.len(), 3);
    }
}
