//! Error types for Data Vault model construction.

/// Errors that can occur while building a Data Vault model or generating
/// its load SQL.
///
/// The model is validated eagerly: table constructors and the load
/// orchestrator fail on the first rule violation instead of producing SQL
/// that the warehouse would reject at run time.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A field name does not match any naming convention rule.
    #[error("{table}.{field}: no field role could be assigned (check the naming conventions)")]
    UnassignableRole {
        /// Table the field belongs to.
        table: String,
        /// The offending field name.
        field: String,
    },

    /// A field required by the table kind is missing.
    #[error("{table}: no field named '{field}' found")]
    MissingField {
        /// Table that was searched.
        table: String,
        /// Name of the missing field.
        field: String,
    },

    /// A hub declares more than one business key.
    #[error("{table}: more than one business key detected: {keys}")]
    MultipleBusinessKeys {
        /// The offending hub.
        table: String,
        /// Comma separated list of the detected business keys.
        keys: String,
    },

    /// A link declares no business keys for its connected hubs.
    #[error("{table}: at least one business key for connected hubs is needed, none found")]
    MissingBusinessKeys {
        /// The offending link.
        table: String,
    },

    /// A link's business keys and connected hub hashkeys do not pair up.
    #[error(
        "{table}: the number of hashkeys and business keys for connected hubs \
         should be the same ({hashkey_parents} hashkeys, {business_keys} business keys)"
    )]
    KeyCountMismatch {
        /// The offending link.
        table: String,
        /// Number of business key fields found.
        business_keys: usize,
        /// Number of parent hashkey fields found.
        hashkey_parents: usize,
    },

    /// A satellite has no hashkey pointing at its parent table.
    #[error("{table}: no hashkey for parent table found")]
    MissingParentHashkey {
        /// The offending satellite.
        table: String,
    },

    /// A hashdiff field turned up outside a satellite.
    #[error("{table}.{field}: hashdiff fields can only belong to satellites")]
    HashdiffOutsideSatellite {
        /// Table that owns the field.
        table: String,
        /// The hashdiff field.
        field: String,
    },

    /// An effectivity satellite was built without driving keys.
    #[error("{table}: an effectivity satellite needs at least one driving key")]
    MissingDrivingKeys {
        /// The offending satellite.
        table: String,
    },

    /// A driving key is declared for a different satellite.
    #[error("{table}: driving key '{driving_key}' is declared for satellite '{satellite}'")]
    DrivingKeyMismatch {
        /// The satellite being built.
        table: String,
        /// Name of the driving key field.
        driving_key: String,
        /// Satellite the driving key actually belongs to.
        satellite: String,
    },

    /// A driving key references a parent table that is not a link.
    #[error("{table}: driving key parent table '{parent}' is not a link")]
    DrivingKeyParentNotLink {
        /// The satellite being built.
        table: String,
        /// The declared parent table.
        parent: String,
    },

    /// A table references a parent that is not part of the load.
    #[error("{table}: parent table '{parent}' missing in target tables")]
    MissingParentTable {
        /// The dependent table.
        table: String,
        /// Name of the absent parent.
        parent: String,
    },

    /// A resolved parent table has the wrong kind.
    #[error("{table}: parent table '{parent}' should be a {expected}")]
    ParentKindMismatch {
        /// The dependent table.
        table: String,
        /// Name of the resolved parent.
        parent: String,
        /// Kind the parent was expected to have.
        expected: &'static str,
    },

    /// A role playing hub and its parent hub have different shapes.
    #[error("{table}: field count does not match parent table '{parent}'")]
    FieldCountMismatch {
        /// The role playing hub.
        table: String,
        /// Its parent hub.
        parent: String,
    },

    /// A table name could not be resolved within the load.
    #[error("table '{table}' missing in target tables")]
    TableNotFound {
        /// The unresolved table name.
        table: String,
    },

    /// A table name carries none of the configured prefixes.
    #[error("'{table}' is not a valid table name (check the configured table prefixes)")]
    UnknownTablePrefix {
        /// The unrecognised table name.
        table: String,
    },

    /// No column metadata was supplied for a requested table.
    #[error("{table}: no column metadata found")]
    MissingColumns {
        /// The table without columns.
        table: String,
    },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
