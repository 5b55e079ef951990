//! Hubs: one row per business entity.

use tracing::info;

use crate::conventions::Conventions;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::role::FieldRole;
use crate::staging::StagingTable;
use crate::table::{hub_link_dml, TableCore};

/// A hub stores every business key observed for one entity, keyed by the
/// MD5 hashkey of the business key.
#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    core: TableCore,
}

impl Hub {
    /// Builds and validates a hub.
    ///
    /// # Errors
    ///
    /// Beyond the common rules, the hub must own a `{name}_hashkey` field
    /// and may declare at most one business key.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
        conventions: &Conventions,
    ) -> Result<Self> {
        let core = TableCore::new(schema, name, fields, conventions)?;
        core.require_field(&conventions.hashkey_field_name(core.name()))?;
        let business_keys: Vec<&Field> = core.fields_with_role(FieldRole::BusinessKey).collect();
        if business_keys.len() > 1 {
            return Err(ModelError::MultipleBusinessKeys {
                table: core.name().to_string(),
                keys: business_keys
                    .iter()
                    .map(|field| field.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
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

    /// Entity the hub describes: the name without its table prefix.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        self.core
            .name()
            .split_once('_')
            .map_or("", |(_, entity)| entity)
    }

    /// Expression computing the hub's hashkey in staging.
    ///
    /// # Errors
    ///
    /// Fails when the hashkey field is absent, which [`Hub::new`] rules out.
    pub fn hashkey_sql(&self, conventions: &Conventions) -> Result<String> {
        self.core.hashkey_sql(conventions)
    }

    /// Merge statement loading the hub from staging.
    ///
    /// # Errors
    ///
    /// Fails when the hashkey field is absent, which [`Hub::new`] rules out.
    pub fn sql_load_statement(
        &self,
        staging_table: &StagingTable,
        conventions: &Conventions,
    ) -> Result<String> {
        let sql = hub_link_dml(&self.core, staging_table, conventions)?.render();
        info!("load statement generated for hub {}", self.core.name());
        Ok(sql)
    }
}
