//! Distinguished name construction.
//!
//! All functions here are pure: names are derived from the configured search
//! roots and the identifier, with no connection involved.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Naming attribute of organization entries.
pub const ORG_RDN_ATTRIBUTE: &str = "cn";

/// Naming attribute of organization extension entries.
pub const ORG_EXT_RDN_ATTRIBUTE: &str = "o";

/// Naming attribute of user entries.
pub const USER_RDN_ATTRIBUTE: &str = "uid";

/// Builds `attr=value` with the value escaped per RFC 4514.
#[must_use]
pub fn rdn(attribute: &str, value: &str) -> String {
    format!("{attribute}={}", ldap3::dn_escape(value))
}

/// Joins DN fragments, most specific first, skipping empty ones.
#[must_use]
pub fn join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Builds the DN of a child entry named `attr=value` under `parent`.
#[must_use]
pub fn child(parent: &str, attribute: &str, value: &str) -> String {
    join([rdn(attribute, value).as_str(), parent])
}

/// Splits a DN into its RDNs, honouring backslash escapes.
#[must_use]
pub fn split(dn: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in dn.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ',' | ';' => {
                parts.push(dn[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = dn[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

/// Returns the value of the leading RDN when its attribute is `attribute`.
///
/// `uid=jdoe,ou=users,dc=georchestra,dc=org` with `uid` gives `jdoe`.
#[must_use]
pub fn leading_value(dn: &str, attribute: &str) -> Option<String> {
    let first = *split(dn).first()?;
    let (attr, value) = first.split_once('=')?;
    if !attr.trim().eq_ignore_ascii_case(attribute) {
        return None;
    }
    Some(unescape_value(value.trim()).into_owned())
}

/// Returns the parent DN, or `None` for a single-RDN name.
#[must_use]
pub fn parent(dn: &str) -> Option<String> {
    let parts = split(dn);
    if parts.len() < 2 {
        return None;
    }
    Some(parts[1..].join(","))
}

/// Normalizes a DN for comparison.
///
/// Attribute types and values are lower-cased, whitespace around separators is
/// dropped and hex escapes are decoded, so that two spellings of the same name
/// compare equal.
#[must_use]
pub fn normalize(dn: &str) -> String {
    split(dn)
        .into_iter()
        .map(|rdn| match rdn.split_once('=') {
            Some((attr, value)) => format!(
                "{}={}",
                attr.trim().to_lowercase(),
                unescape_value(value.trim()).to_lowercase()
            ),
            None => rdn.to_lowercase(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Compares two DNs after normalization.
#[must_use]
pub fn eq(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Returns whether `dn` is `base` or lies below it.
#[must_use]
pub fn is_descendant_or_self(dn: &str, base: &str) -> bool {
    let dn = normalize(dn);
    let base = normalize(base);
    base.is_empty() || dn == base || dn.ends_with(&format!(",{base}"))
}

/// Decodes `\,` and `\2c` style escapes of an RDN value.
fn unescape_value(value: &str) -> Cow<'_, str> {
    if !value.contains('\\') {
        return Cow::Borrowed(value);
    }

    let mut bytes = Vec::with_capacity(value.len());
    let raw = value.as_bytes();
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() {
            let hex = raw.get(i + 1..i + 3).and_then(|pair| {
                std::str::from_utf8(pair)
                    .ok()
                    .and_then(|s| u8::from_str_radix(s, 16).ok())
            });
            if let Some(byte) = hex {
                bytes.push(byte);
                i += 3;
            } else {
                bytes.push(raw[i + 1]);
                i += 2;
            }
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

/// Where organizations and users live in the directory tree.
///
/// Both search roots are relative to `base_path`; either may also be given
/// fully qualified with an empty base path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryLayout {
    /// Organizations search root, e.g. `ou=orgs`.
    pub orgs_rdn: String,
    /// Users search root, e.g. `ou=users`.
    pub users_rdn: String,
    /// Base path qualifying both roots, e.g. `dc=georchestra,dc=org`.
    pub base_path: String,
}

impl DirectoryLayout {
    /// Creates a layout.
    #[must_use]
    pub fn new(
        orgs_rdn: impl Into<String>,
        users_rdn: impl Into<String>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            orgs_rdn: orgs_rdn.into(),
            users_rdn: users_rdn.into(),
            base_path: base_path.into(),
        }
    }

    /// Fully qualified organizations search root.
    #[must_use]
    pub fn orgs_base(&self) -> String {
        join([self.orgs_rdn.as_str(), self.base_path.as_str()])
    }

    /// Fully qualified users search root.
    #[must_use]
    pub fn users_base(&self) -> String {
        join([self.users_rdn.as_str(), self.base_path.as_str()])
    }

    /// DN of an organization entry: `cn=<id>,<orgs root>`.
    #[must_use]
    pub fn org_dn(&self, id: &str) -> String {
        child(&self.orgs_base(), ORG_RDN_ATTRIBUTE, id)
    }

    /// DN of an organization extension entry: `o=<id>,<orgs root>`.
    #[must_use]
    pub fn org_ext_dn(&self, id: &str) -> String {
        child(&self.orgs_base(), ORG_EXT_RDN_ATTRIBUTE, id)
    }

    /// DN of a user entry: `uid=<id>,<users root>`.
    #[must_use]
    pub fn user_dn(&self, id: &str) -> String {
        child(&self.users_base(), USER_RDN_ATTRIBUTE, id)
    }

    /// Recovers a user identifier from a member DN.
    ///
    /// Returns `None` when the DN is not a `uid=` entry of the users root.
    #[must_use]
    pub fn user_id(&self, member_dn: &str) -> Option<String> {
        let parent = parent(member_dn)?;
        if !eq(&parent, &self.users_base()) {
            return None;
        }
        leading_value(member_dn, USER_RDN_ATTRIBUTE)
    }
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self::new("ou=orgs", "ou=users", "dc=georchestra,dc=org")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_entry_names() {
        let layout = DirectoryLayout::default();

        assert_eq!(layout.orgs_base(), "ou=orgs,dc=georchestra,dc=org");
        assert_eq!(layout.org_dn("psc"), "cn=psc,ou=orgs,dc=georchestra,dc=org");
        assert_eq!(layout.org_ext_dn("psc"), "o=psc,ou=orgs,dc=georchestra,dc=org");
        assert_eq!(
            layout.user_dn("testadmin"),
            "uid=testadmin,ou=users,dc=georchestra,dc=org"
        );
    }

    #[test]
    fn fully_qualified_roots_without_base_path() {
        let layout = DirectoryLayout::new("ou=orgs,dc=example,dc=com", "ou=people,dc=example,dc=com", "");
        assert_eq!(layout.org_dn("acme"), "cn=acme,ou=orgs,dc=example,dc=com");
        assert_eq!(layout.user_dn("jdoe"), "uid=jdoe,ou=people,dc=example,dc=com");
    }

    #[test]
    fn escapes_special_characters_in_values() {
        let dn = rdn("cn", "Smith, John");
        assert!(dn.starts_with("cn=Smith"));
        assert_ne!(dn, "cn=Smith, John");
        assert_eq!(split(&child("ou=orgs", "cn", "Smith, John")).len(), 2);
        assert_eq!(
            leading_value(&child("ou=orgs", "cn", "Smith, John"), "cn").as_deref(),
            Some("Smith, John")
        );
    }

    #[test]
    fn splits_and_parents() {
        assert_eq!(split("uid=a, ou=users ,dc=org"), vec!["uid=a", "ou=users", "dc=org"]);
        assert_eq!(split("cn=a\\,b,dc=org"), vec!["cn=a\\,b", "dc=org"]);
        assert_eq!(parent("uid=a,ou=users,dc=org").as_deref(), Some("ou=users,dc=org"));
        assert_eq!(parent("dc=org"), None);
        assert!(split("").is_empty());
    }

    #[test]
    fn leading_value_checks_attribute() {
        let dn = "uid=jdoe,ou=users,dc=georchestra,dc=org";
        assert_eq!(leading_value(dn, "uid").as_deref(), Some("jdoe"));
        assert_eq!(leading_value(dn, "UID").as_deref(), Some("jdoe"));
        assert_eq!(leading_value(dn, "cn"), None);
    }

    #[test]
    fn normalizes_for_comparison() {
        assert!(eq(
            "UID=JDoe, OU=Users,DC=georchestra,DC=org",
            "uid=jdoe,ou=users,dc=georchestra,dc=org"
        ));
        assert!(eq("cn=a\\2cb,dc=org", "cn=a\\,b,dc=org"));
        assert!(!eq("uid=jdoe,ou=users", "uid=jdoe2,ou=users"));
    }

    #[test]
    fn descendant_checks() {
        let base = "ou=orgs,dc=georchestra,dc=org";
        assert!(is_descendant_or_self("cn=psc,ou=orgs,dc=georchestra,dc=org", base));
        assert!(is_descendant_or_self(base, base));
        assert!(!is_descendant_or_self("uid=jdoe,ou=users,dc=georchestra,dc=org", base));
        assert!(!is_descendant_or_self("cn=x,ou=orgsx,dc=georchestra,dc=org", base));
    }

    #[test]
    fn recovers_user_ids_from_member_dns() {
        let layout = DirectoryLayout::default();
        assert_eq!(
            layout.user_id(&layout.user_dn("jdoe")).as_deref(),
            Some("jdoe")
        );
        assert_eq!(layout.user_id("uid=jdoe,ou=system,dc=georchestra,dc=org"), None);
        assert_eq!(layout.user_id("cn=admin,ou=users,dc=georchestra,dc=org"), None);
    }
}
