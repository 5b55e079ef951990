//! Naming conventions shared by every table in a Data Vault model.
//!
//! Field roles, table kinds and staging names are never declared explicitly:
//! they are derived from names using the rules configured here. A single
//! [`Conventions`] value is built once per load and passed by reference to
//! everything that needs it, so alternate conventions can be exercised in
//! tests without touching global state.

use serde::{Deserialize, Serialize};

/// The structural kind a table name implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// Hub: one row per business entity.
    Hub,
    /// Link: one row per relationship between hubs.
    Link,
    /// Satellite: historized attributes of a hub or link.
    Satellite,
}

impl TableKind {
    /// Returns a lowercase label for log and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hub => "hub",
            Self::Link => "link",
            Self::Satellite => "satellite",
        }
    }
}

/// Naming rules and SQL literals used to interpret a Data Vault model.
///
/// The delimiter, the unknown sentinel and the end of time literal are part
/// of the generated SQL's contract with the warehouse: changing any of them
/// changes every hash the warehouse computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    /// Name of the record source metadata field.
    pub record_source: String,
    /// Name of the record start timestamp metadata field.
    pub record_start_timestamp: String,
    /// Name of the record end timestamp metadata field.
    pub record_end_timestamp: String,
    /// Prefix of child key fields.
    pub child_key_prefix: String,
    /// Prefix shared by all metadata fields.
    pub metadata_prefix: String,
    /// Prefix of hashkey fields.
    pub hashkey_prefix: String,
    /// Suffix of hashkey fields, own and parent alike.
    pub hashkey_suffix: String,
    /// Suffix of business key fields.
    pub business_key_suffix: String,
    /// Suffix of hashdiff fields.
    pub hashdiff_suffix: String,
    /// Table name prefixes that mark a hub.
    pub hub_prefixes: Vec<String>,
    /// Table name prefixes that mark a link.
    pub link_prefixes: Vec<String>,
    /// Table name prefixes that mark a satellite.
    pub satellite_prefixes: Vec<String>,
    /// Delimiter placed between hashed fields.
    pub hash_delimiter: String,
    /// Sentinel stored when a business key arrives NULL.
    pub unknown_sentinel: String,
    /// Timestamp literal closing the current version of a satellite row.
    pub end_of_time: String,
    /// `strftime` suffix appended to the staging table physical name.
    pub staging_suffix_format: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            record_source: "r_source".to_string(),
            record_start_timestamp: "r_timestamp".to_string(),
            record_end_timestamp: "r_timestamp_end".to_string(),
            child_key_prefix: "ck".to_string(),
            metadata_prefix: "r".to_string(),
            hashkey_prefix: "h".to_string(),
            hashkey_suffix: "hashkey".to_string(),
            business_key_suffix: "id".to_string(),
            hashdiff_suffix: "hashdiff".to_string(),
            hub_prefixes: vec!["h".to_string()],
            link_prefixes: vec!["l".to_string()],
            satellite_prefixes: vec!["hs".to_string(), "ls".to_string()],
            hash_delimiter: "|~~|".to_string(),
            unknown_sentinel: "dv_unknown".to_string(),
            end_of_time: "9999-12-31T00:00:00.000000Z".to_string(),
            staging_suffix_format: "%Y%m%d_%H%M%S".to_string(),
        }
    }
}

impl Conventions {
    /// Name of the hashkey field a table of the given name owns.
    #[must_use]
    pub fn hashkey_field_name(&self, table_name: &str) -> String {
        format!("{table_name}_{}", self.hashkey_suffix)
    }

    /// Name every satellite gives its own hashdiff field.
    #[must_use]
    pub fn own_hashdiff_name(&self) -> String {
        format!("s_{}", self.hashdiff_suffix)
    }

    /// Name a hashdiff field takes once staged for the given satellite.
    #[must_use]
    pub fn staging_hashdiff_name(&self, satellite_name: &str) -> String {
        format!("{satellite_name}_{}", self.hashdiff_suffix)
    }

    /// Whether the name belongs to one of the three metadata fields.
    #[must_use]
    pub fn is_metadata_field(&self, field_name: &str) -> bool {
        field_name == self.record_source
            || field_name == self.record_start_timestamp
            || field_name == self.record_end_timestamp
    }

    /// Whether the prefix is reserved for keys, metadata or hashkeys.
    ///
    /// Business keys are recognised by exclusion, so any field carrying one
    /// of these prefixes can never be a business key.
    #[must_use]
    pub fn is_reserved_prefix(&self, prefix: &str) -> bool {
        prefix == self.child_key_prefix
            || prefix == self.metadata_prefix
            || prefix == self.hashkey_prefix
    }

    /// Kind implied by a table name, falling back to hub when no link or
    /// satellite prefix matches.
    ///
    /// The fallback keeps field role derivation total: fields may reference
    /// parent tables that are outside the current load.
    #[must_use]
    pub fn table_kind(&self, table_name: &str) -> TableKind {
        let prefix = name_prefix(table_name);
        if self.link_prefixes.iter().any(|p| p == prefix) {
            TableKind::Link
        } else if self.satellite_prefixes.iter().any(|p| p == prefix) {
            TableKind::Satellite
        } else {
            TableKind::Hub
        }
    }

    /// Strict variant of [`Self::table_kind`] used when interpreting user
    /// supplied table names: the prefix must be declared.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownTablePrefix`](crate::ModelError::UnknownTablePrefix)
    /// when the name carries none of the configured prefixes.
    pub fn parse_table_kind(&self, table_name: &str) -> crate::Result<TableKind> {
        let prefix = name_prefix(table_name);
        if self.hub_prefixes.iter().any(|p| p == prefix) {
            Ok(TableKind::Hub)
        } else if self.link_prefixes.iter().any(|p| p == prefix) {
            Ok(TableKind::Link)
        } else if self.satellite_prefixes.iter().any(|p| p == prefix) {
            Ok(TableKind::Satellite)
        } else {
            Err(crate::ModelError::UnknownTablePrefix {
                table: table_name.to_string(),
            })
        }
    }

    /// SQL literal for the end of time timestamp.
    #[must_use]
    pub fn end_of_time_sql(&self) -> String {
        format!("CAST('{}' AS TIMESTAMP)", self.end_of_time)
    }
}

/// First underscore separated token of a name.
pub(crate) fn name_prefix(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

/// Last underscore separated token of a name.
pub(crate) fn name_suffix(name: &str) -> &str {
    name.rsplit('_').next().unwrap_or(name)
}
