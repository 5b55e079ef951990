//! Field role derivation.
//!
//! A field's role decides how it is staged, hashed and loaded. Roles are
//! never declared: they are derived from the field name, its position and
//! the kind of table it belongs to, following a fixed precedence. The
//! derivation is a pure function so the precedence can be tested without
//! building tables.

use crate::conventions::{name_prefix, name_suffix, Conventions, TableKind};
use crate::error::{ModelError, Result};

/// Role a field plays within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Hashkey of the table that owns the field.
    Hashkey,
    /// Hashkey of a connected table, e.g. a hub hashkey on a link.
    HashkeyParent,
    /// Hash of the descriptive fields, used to detect changed versions.
    Hashdiff,
    /// Natural key of a business entity.
    BusinessKey,
    /// Key that qualifies a relationship without identifying an entity.
    ChildKey,
    /// Attribute historized by a satellite.
    Descriptive,
    /// Record source or record timestamp bookkeeping field.
    Metadata,
}

impl FieldRole {
    /// Returns a lowercase label for log and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hashkey => "hashkey",
            Self::HashkeyParent => "hashkey parent",
            Self::Hashdiff => "hashdiff",
            Self::BusinessKey => "business key",
            Self::ChildKey => "child key",
            Self::Descriptive => "descriptive",
            Self::Metadata => "metadata",
        }
    }
}

/// Derives the role of a field from its name, position and parent table.
///
/// The rules are checked in order and the first match wins:
///
/// 1. a metadata field name is [`FieldRole::Metadata`];
/// 2. `{parent_table}_{hashkey_suffix}` is the table's own [`FieldRole::Hashkey`];
/// 3. any other name ending in the hashkey suffix is a [`FieldRole::HashkeyParent`];
/// 4. the child key prefix marks a [`FieldRole::ChildKey`];
/// 5. on hubs and links, a field without a reserved prefix that is not in
///    first position is a [`FieldRole::BusinessKey`];
/// 6. the hashdiff suffix marks a [`FieldRole::Hashdiff`];
/// 7. anything else on a satellite is [`FieldRole::Descriptive`].
///
/// # Errors
///
/// Returns [`ModelError::UnassignableRole`] when no rule matches.
pub fn derive_role(
    name: &str,
    parent_table_name: &str,
    position: u32,
    conventions: &Conventions,
) -> Result<FieldRole> {
    if conventions.is_metadata_field(name) {
        return Ok(FieldRole::Metadata);
    }
    if name_suffix(name) == conventions.hashkey_suffix {
        if name == conventions.hashkey_field_name(parent_table_name) {
            return Ok(FieldRole::Hashkey);
        }
        return Ok(FieldRole::HashkeyParent);
    }
    let prefix = name_prefix(name);
    if prefix == conventions.child_key_prefix {
        return Ok(FieldRole::ChildKey);
    }
    let parent_kind = conventions.table_kind(parent_table_name);
    if parent_kind != TableKind::Satellite
        && !conventions.is_reserved_prefix(prefix)
        && position != 1
    {
        return Ok(FieldRole::BusinessKey);
    }
    if name_suffix(name) == conventions.hashdiff_suffix {
        return Ok(FieldRole::Hashdiff);
    }
    if parent_kind == TableKind::Satellite {
        return Ok(FieldRole::Descriptive);
    }
    Err(ModelError::UnassignableRole {
        table: parent_table_name.to_string(),
        field: name.to_string(),
    })
}
