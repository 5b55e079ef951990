//! Links: one row per relationship between hubs.

use tracing::info;

use crate::conventions::Conventions;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::role::FieldRole;
use crate::staging::StagingTable;
use crate::table::{hub_link_dml, TableCore};

/// A link stores every observed combination of its connected hubs' business
/// keys, keyed by the MD5 hashkey of the combination plus any child keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    core: TableCore,
}

impl Link {
    /// Builds and validates a link.
    ///
    /// # Errors
    ///
    /// Beyond the common rules, the link must own a `{name}_hashkey` field
    /// and carry one business key per connected hub hashkey, at least one of
    /// each.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
        conventions: &Conventions,
    ) -> Result<Self> {
        let core = TableCore::new(schema, name, fields, conventions)?;
        core.require_field(&conventions.hashkey_field_name(core.name()))?;
        let business_keys = core.fields_with_role(FieldRole::BusinessKey).count();
        let hashkey_parents = core.fields_with_role(FieldRole::HashkeyParent).count();
        if business_keys != hashkey_parents {
            return Err(ModelError::KeyCountMismatch {
                table: core.name().to_string(),
                business_keys,
                hashkey_parents,
            });
        }
        if business_keys == 0 {
            return Err(ModelError::MissingBusinessKeys {
                table: core.name().to_string(),
            });
        }
        Ok(Self { core })
    }

    /// The shared table core.
    #[must_use]
    pub fn core(&self) -> &TableCore {
        &self.core
    }

    /// Table name, lowercased.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Names of the connected hubs, one per hashkey parent field.
    #[must_use]
    pub fn parent_hub_names(&self, conventions: &Conventions) -> Vec<String> {
        let suffix = format!("_{}", conventions.hashkey_suffix);
        self.core
            .fields_with_role(FieldRole::HashkeyParent)
            .map(|field| {
                field
                    .name
                    .strip_suffix(&suffix)
                    .unwrap_or(&field.name)
                    .to_string()
            })
            .collect()
    }

    /// Expression computing the link's hashkey in staging.
    ///
    /// # Errors
    ///
    /// Fails when the hashkey field is absent, which [`Link::new`] rules out.
    pub fn hashkey_sql(&self, conventions: &Conventions) -> Result<String> {
        self.core.hashkey_sql(conventions)
    }

    /// Merge statement loading the link from staging.
    ///
    /// # Errors
    ///
    /// Fails when the hashkey field is absent, which [`Link::new`] rules out.
    pub fn sql_load_statement(
        &self,
        staging_table: &StagingTable,
        conventions: &Conventions,
    ) -> Result<String> {
        let sql = hub_link_dml(&self.core, staging_table, conventions)?.render();
        info!("load statement generated for link {}", self.core.name());
        Ok(sql)
    }
}
