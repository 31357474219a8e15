// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema keyword registry
//!
//! Maps a schema name to the entity keywords it recognizes. A keyword either
//! maps to itself (list registration) or to an explicit token type (map
//! registration). At most one schema is active; the lexer resolves standard
//! keywords against the active table once per token.

use crate::error::SchemaError;
use rustc_hash::FxHashMap;

/// Token type names reserved by the lexer itself
pub const RESERVED_TOKEN_NAMES: &[&str] = &[
    "PART21_START",
    "PART21_END",
    "HEADER_SEC",
    "ENDSEC",
    "DATA",
    "INTEGER",
    "REAL",
    "STRING",
    "BINARY",
    "ENUMERATION",
    "ENTITY_INSTANCE_NAME",
    "USER_DEFINED_KEYWORD",
    "STANDARD_KEYWORD",
    "RAW",
];

/// Keywords recognized by one schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordSet {
    /// Each keyword is its own token type
    List(Vec<String>),
    /// Explicit keyword -> token type mapping
    Map(Vec<(String, String)>),
}

impl KeywordSet {
    /// Keywords mapping to themselves
    pub fn list<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeywordSet::List(keywords.into_iter().map(Into::into).collect())
    }

    /// Keywords mapping to explicit token types
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        KeywordSet::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    fn into_table(self) -> FxHashMap<String, String> {
        match self {
            KeywordSet::List(keywords) => keywords.into_iter().map(|k| (k.clone(), k)).collect(),
            KeywordSet::Map(pairs) => pairs.into_iter().collect(),
        }
    }
}

/// Registered schemas and the currently active one
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: FxHashMap<String, FxHashMap<String, String>>,
    active: Option<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a keyword table under `name`
    pub fn register_schema(
        &mut self,
        name: impl Into<String>,
        keywords: KeywordSet,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::AlreadyRegistered(name));
        }

        let table = keywords.into_table();
        for (keyword, token_type) in &table {
            if is_reserved(keyword) || is_reserved(token_type) {
                return Err(SchemaError::ReservedKeyword {
                    schema: name,
                    keyword: keyword.clone(),
                });
            }
        }

        self.schemas.insert(name, table);
        Ok(())
    }

    /// Select the schema whose keywords the lexer resolves against
    pub fn activate_schema(&mut self, name: &str) -> Result<(), SchemaError> {
        if !self.schemas.contains_key(name) {
            return Err(SchemaError::Unregistered(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Fall back to generic standard keywords
    pub fn deactivate(&mut self) {
        self.active = None;
    }

    pub fn active_schema(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Token type of `keyword` in the active schema
    #[inline]
    pub fn lookup(&self, keyword: &str) -> Option<&str> {
        let active = self.active.as_ref()?;
        self.schemas
            .get(active)?
            .get(keyword)
            .map(String::as_str)
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED_TOKEN_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_keywords_map_to_themselves() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_schema("CONFIG_CONTROL_DESIGN", KeywordSet::list(["POINT", "LINE"]))
            .unwrap();
        registry.activate_schema("CONFIG_CONTROL_DESIGN").unwrap();

        assert_eq!(registry.lookup("POINT"), Some("POINT"));
        assert_eq!(registry.lookup("CIRCLE"), None);
    }

    #[test]
    fn test_map_keywords() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_schema(
                "AP214",
                KeywordSet::map([("CARTESIAN_POINT", "POINT_TYPE")]),
            )
            .unwrap();
        registry.activate_schema("AP214").unwrap();
        assert_eq!(registry.lookup("CARTESIAN_POINT"), Some("POINT_TYPE"));
    }

    #[test]
    fn test_nothing_resolves_without_active_schema() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_schema("AP203", KeywordSet::list(["POINT"]))
            .unwrap();
        assert_eq!(registry.active_schema(), None);
        assert_eq!(registry.lookup("POINT"), None);

        registry.activate_schema("AP203").unwrap();
        registry.deactivate();
        assert_eq!(registry.lookup("POINT"), None);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_schema("AP203", KeywordSet::list(["POINT"]))
            .unwrap();
        assert_eq!(
            registry.register_schema("AP203", KeywordSet::list(["LINE"])),
            Err(SchemaError::AlreadyRegistered("AP203".into()))
        );
    }

    #[test]
    fn test_unregistered_activation() {
        let mut registry = SchemaRegistry::new();
        assert_eq!(
            registry.activate_schema("AP242"),
            Err(SchemaError::Unregistered("AP242".into()))
        );
    }

    #[test]
    fn test_reserved_keyword_collision() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .register_schema("BAD", KeywordSet::list(["POINT", "ENDSEC"]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::ReservedKeyword { ref keyword, .. } if keyword == "ENDSEC"));
        assert!(!registry.is_registered("BAD"));

        let err = registry
            .register_schema("BAD2", KeywordSet::map([("POINT", "STRING")]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::ReservedKeyword { .. }));
    }
}
