//! Ordered property sources.
//!
//! A [`PropertySources`] list is consulted front to back and the first source
//! defining a key wins. Sources are either in-memory maps (typically loaded
//! from a Java `.properties` file) or the process environment.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Where a property source reads its values from.
#[derive(Debug, Clone)]
enum Values {
    Map(HashMap<String, String>),
    Environment,
}

/// A named set of properties.
#[derive(Debug, Clone)]
pub struct PropertySource {
    name: String,
    values: Values,
}

impl PropertySource {
    /// Creates a source backed by an in-memory map.
    #[must_use]
    pub fn from_map(name: impl Into<String>, values: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            values: Values::Map(values),
        }
    }

    /// Creates a source reading the process environment.
    ///
    /// A key such as `ldap.host` is also looked up as `ldap_host` and
    /// `LDAP_HOST`.
    #[must_use]
    pub fn environment() -> Self {
        Self {
            name: "systemEnvironment".to_string(),
            values: Values::Environment,
        }
    }

    /// Loads a Java `.properties` file.
    ///
    /// UTF-8 content is read as such; anything else is decoded as
    /// ISO-8859-1, the historical encoding of these files. The source is
    /// named after the file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::PropertyFile {
            path: path.to_path_buf(),
            source,
        })?;
        let content = decode(bytes);
        let values = parse_properties(&content)?;
        Ok(Self::from_map(format!("file [{}]", path.display()), values))
    }

    /// Returns the source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a key in this source only.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match &self.values {
            Values::Map(map) => map.get(key).cloned(),
            Values::Environment => env_lookup(key),
        }
    }
}

fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect())
}

fn env_lookup(key: &str) -> Option<String> {
    if let Ok(value) = std::env::var(key) {
        return Some(value);
    }
    let underscored = key.replace(&['.', '-'][..], "_");
    if let Ok(value) = std::env::var(&underscored) {
        return Some(value);
    }
    std::env::var(underscored.to_uppercase()).ok()
}

/// Ordered collection of property sources; first match wins.
#[derive(Debug, Clone, Default)]
pub struct PropertySources {
    sources: Vec<PropertySource>,
}

impl PropertySources {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a source with the highest precedence.
    ///
    /// A source with the same name is replaced.
    pub fn add_first(&mut self, source: PropertySource) {
        self.remove(source.name());
        self.sources.insert(0, source);
    }

    /// Inserts a source with the lowest precedence.
    ///
    /// A source with the same name is replaced.
    pub fn add_last(&mut self, source: PropertySource) {
        self.remove(source.name());
        self.sources.push(source);
    }

    /// Removes a source by name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<PropertySource> {
        let index = self.sources.iter().position(|s| s.name() == name)?;
        Some(self.sources.remove(index))
    }

    /// Returns whether a source with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s.name() == name)
    }

    /// Returns source names in precedence order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(PropertySource::name).collect()
    }

    /// Resolves a key against the sources in order.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| s.get(key))
    }

    /// Resolves a key, falling back to a default.
    #[must_use]
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Resolves a key that must be defined.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| Error::MissingProperty(key.to_string()))
    }

    /// Resolves and parses a key.
    ///
    /// Returns `Ok(None)` when no source defines it.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e: T::Err| Error::invalid_property(key, e.to_string()))
            })
            .transpose()
    }
}

/// Parses the content of a Java `.properties` file.
///
/// Supports `=`, `:` and whitespace separators, `#` and `!` comments,
/// backslash line continuations and the `\t \n \r \f \uXXXX` escapes.
/// When a key repeats, the last definition wins.
pub fn parse_properties(input: &str) -> Result<HashMap<String, String>> {
    let mut props = HashMap::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start_matches(is_blank);
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = String::new();
        let mut segment = trimmed;
        loop {
            if has_continuation(segment) {
                logical.push_str(&segment[..segment.len() - 1]);
                match lines.next() {
                    Some(next) => segment = next.trim_start_matches(is_blank),
                    None => break,
                }
            } else {
                logical.push_str(segment);
                break;
            }
        }

        let (key, value) = split_key_value(&logical);
        props.insert(unescape(key)?, unescape(value)?);
    }

    Ok(props)
}

const fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// A line continues when it ends with an odd number of backslashes.
fn has_continuation(segment: &str) -> bool {
    segment.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut split: Option<(usize, char)> = None;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                split = Some((i, c));
                break;
            }
            c if is_blank(c) => {
                split = Some((i, c));
                break;
            }
            _ => {}
        }
    }

    let Some((index, separator)) = split else {
        return (line, "");
    };

    let key = &line[..index];
    let mut rest = line[index + separator.len_utf8()..].trim_start_matches(is_blank);
    if is_blank(separator) {
        if let Some(stripped) = rest.strip_prefix(&['=', ':'][..]) {
            rest = stripped.trim_start_matches(is_blank);
        }
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let high = read_code_unit(&mut chars)?;
                let decoded = if (0xD800..0xDC00).contains(&high) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(Error::Syntax("unpaired surrogate in \\u escape".into()));
                    }
                    let low = read_code_unit(&mut chars)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(Error::Syntax("unpaired surrogate in \\u escape".into()));
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                let ch = char::from_u32(decoded)
                    .ok_or_else(|| Error::Syntax(format!("invalid code point {decoded:#x}")))?;
                out.push(ch);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_code_unit(chars: &mut std::str::Chars<'_>) -> Result<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return Err(Error::Syntax(format!("truncated \\u escape: \\u{hex}")));
    }
    u32::from_str_radix(&hex, 16)
        .map_err(|_| Error::Syntax(format!("malformed \\u escape: \\u{hex}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn parses_separators_and_comments() {
        let props = parse_properties(
            "# geOrchestra defaults\n\
             ! legacy comment\n\
             \n\
             ldapHost=localhost\n\
             ldapPort : 389\n\
             ldapBaseDn   dc=georchestra,dc=org\n\
             empty=\n\
             bare\n",
        )
        .unwrap();

        assert_eq!(props.get("ldapHost").map(String::as_str), Some("localhost"));
        assert_eq!(props.get("ldapPort").map(String::as_str), Some("389"));
        assert_eq!(
            props.get("ldapBaseDn").map(String::as_str),
            Some("dc=georchestra,dc=org")
        );
        assert_eq!(props.get("empty").map(String::as_str), Some(""));
        assert_eq!(props.get("bare").map(String::as_str), Some(""));
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn whitespace_then_equals_is_one_separator() {
        let props = parse_properties("key = value = more").unwrap();
        assert_eq!(props.get("key").map(String::as_str), Some("value = more"));
    }

    #[test]
    fn joins_continuation_lines() {
        let props = parse_properties("cities = Paris,\\\n    Lyon,\\\n    Grenoble\n").unwrap();
        assert_eq!(
            props.get("cities").map(String::as_str),
            Some("Paris,Lyon,Grenoble")
        );
    }

    #[test]
    fn escaped_backslash_does_not_continue() {
        let props = parse_properties("path=C:\\\\\nnext=1").unwrap();
        assert_eq!(props.get("path").map(String::as_str), Some("C:\\"));
        assert_eq!(props.get("next").map(String::as_str), Some("1"));
    }

    #[test]
    fn decodes_escapes() {
        let props =
            parse_properties("a\\=b=tab\\there\nname=Orl\\u00e9ans\nsmile=\\uD83D\\uDE00").unwrap();
        assert_eq!(props.get("a=b").map(String::as_str), Some("tab\there"));
        assert_eq!(props.get("name").map(String::as_str), Some("Orléans"));
        assert_eq!(props.get("smile").map(String::as_str), Some("\u{1F600}"));
    }

    #[test]
    fn rejects_truncated_unicode_escape() {
        let err = parse_properties("bad=\\u12").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn last_definition_wins() {
        let props = parse_properties("k=1\nk=2").unwrap();
        assert_eq!(props.get("k").map(String::as_str), Some("2"));
    }

    #[test]
    fn first_source_wins() {
        let mut sources = PropertySources::new();
        sources.add_last(PropertySource::from_map("defaults", map(&[("ldapHost", "ldap"), ("ldapPort", "389")])));
        sources.add_first(PropertySource::from_map("overrides", map(&[("ldapHost", "directory.example.org")])));

        assert_eq!(sources.get("ldapHost").as_deref(), Some("directory.example.org"));
        assert_eq!(sources.get("ldapPort").as_deref(), Some("389"));
        assert_eq!(sources.names(), vec!["overrides", "defaults"]);
    }

    #[test]
    fn adding_same_name_replaces() {
        let mut sources = PropertySources::new();
        sources.add_last(PropertySource::from_map("defaults", map(&[("a", "1")])));
        sources.add_first(PropertySource::from_map("defaults", map(&[("a", "2")])));

        assert_eq!(sources.names(), vec!["defaults"]);
        assert_eq!(sources.get("a").as_deref(), Some("2"));
    }

    #[test]
    fn parses_typed_values() {
        let mut sources = PropertySources::new();
        sources.add_last(PropertySource::from_map("m", map(&[("port", " 636 "), ("bad", "x")])));

        assert_eq!(sources.get_parsed::<u16>("port").unwrap(), Some(636));
        assert_eq!(sources.get_parsed::<u16>("missing").unwrap(), None);
        assert!(matches!(
            sources.get_parsed::<u16>("bad"),
            Err(Error::InvalidProperty { .. })
        ));
        assert!(matches!(
            sources.require("missing"),
            Err(Error::MissingProperty(_))
        ));
    }

    #[test]
    fn loads_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.properties");
        std::fs::write(&path, "ldapOrgsRdn=ou=orgs\n").unwrap();

        let source = PropertySource::from_file(&path).unwrap();
        assert!(source.name().contains("default.properties"));
        assert_eq!(source.get("ldapOrgsRdn").as_deref(), Some("ou=orgs"));
    }

    #[test]
    fn file_encoding_falls_back_to_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let latin1 = dir.path().join("latin1.properties");
        std::fs::write(&latin1, b"orgName=Communaut\xe9 de Montr\xe9al\n").unwrap();
        let utf8 = dir.path().join("utf8.properties");
        std::fs::write(&utf8, "orgName=Communauté de Montréal\n").unwrap();

        for path in [latin1, utf8] {
            let source = PropertySource::from_file(&path).unwrap();
            assert_eq!(source.get("orgName").as_deref(), Some("Communauté de Montréal"));
        }
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let err = PropertySource::from_file("/nonexistent/geor/default.properties").unwrap_err();
        assert!(err.is_file_error());
    }
}
