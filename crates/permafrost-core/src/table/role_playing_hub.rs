//! Role playing hubs: alternate roles merged into a shared physical hub.

use tracing::info;

use crate::conventions::Conventions;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::role::FieldRole;
use crate::staging::StagingTable;
use crate::table::{Hub, TableCore};
use crate::template::RolePlayingHubDml;

/// A hub replaying another hub under a different role, for example a
/// delivery customer and a billing customer over one physical customer
/// hub. It keeps its own field names and hashkey in staging while its rows
/// are merged into the parent hub's table.
#[derive(Debug, Clone, PartialEq)]
pub struct RolePlayingHub {
    hub: Hub,
    parent_table_name: String,
}

impl RolePlayingHub {
    /// Builds and validates a role playing hub.
    ///
    /// # Errors
    ///
    /// Same rules as [`Hub::new`]. The parent is resolved later, when the
    /// table joins a load.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
        parent_table_name: impl Into<String>,
        conventions: &Conventions,
    ) -> Result<Self> {
        let hub = Hub::new(schema, name, fields, conventions)?;
        Ok(Self {
            hub,
            parent_table_name: parent_table_name.into().to_lowercase(),
        })
    }

    /// The hub this wraps.
    #[must_use]
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// The shared table core.
    #[must_use]
    pub fn core(&self) -> &TableCore {
        self.hub.core()
    }

    /// Table name, lowercased.
    #[must_use]
    pub fn name(&self) -> &str {
        self.hub.name()
    }

    /// Name of the physical hub this one merges into.
    #[must_use]
    pub fn parent_table_name(&self) -> &str {
        &self.parent_table_name
    }

    /// Entity this hub represents, without the table prefix.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        self.hub.entity_name()
    }

    /// Expression computing the hashkey in staging, under this hub's own
    /// field names.
    ///
    /// # Errors
    ///
    /// Fails when the hashkey field is absent, which [`RolePlayingHub::new`]
    /// rules out.
    pub fn hashkey_sql(&self, conventions: &Conventions) -> Result<String> {
        self.hub.hashkey_sql(conventions)
    }

    /// Merge statement loading the parent hub from this hub's staging
    /// columns.
    ///
    /// # Errors
    ///
    /// Fails when the parent's hashkey is missing or when the two tables
    /// disagree on their field count.
    pub fn sql_load_statement(
        &self,
        parent: &TableCore,
        staging_table: &StagingTable,
        conventions: &Conventions,
    ) -> Result<String> {
        let own_hashkey = self
            .core()
            .require_field(&conventions.hashkey_field_name(self.name()))?;
        let parent_hashkey =
            parent.require_field(&conventions.hashkey_field_name(parent.name()))?;
        let staging_source_fields: Vec<String> = self
            .core()
            .field_roles()
            .filter(|(_, role)| *role != FieldRole::Hashkey)
            .map(|(field, _)| field.name.clone())
            .collect();
        let parent_fields: Vec<String> = parent
            .field_roles()
            .filter(|(_, role)| *role != FieldRole::Hashkey)
            .map(|(field, _)| field.name.clone())
            .collect();
        if staging_source_fields.len() != parent_fields.len() {
            return Err(ModelError::FieldCountMismatch {
                table: self.name().to_string(),
                parent: parent.name().to_string(),
            });
        }
        let source_fields: Vec<String> = self
            .core()
            .field_roles()
            .filter(|(field, role)| {
                *role != FieldRole::Hashkey && field.name != conventions.record_source
            })
            .map(|(field, _)| field.name.clone())
            .collect();
        let sql = RolePlayingHubDml {
            target_schema: self.core().schema().to_string(),
            parent_table: parent.name().to_string(),
            staging_schema: staging_table.schema.clone(),
            staging_table: staging_table.physical_name.clone(),
            source_hashkey_field: own_hashkey.name.clone(),
            parent_hashkey_field: parent_hashkey.name.clone(),
            record_source_field: conventions.record_source.clone(),
            source_fields,
            parent_fields,
            staging_source_fields,
        }
        .render();
        info!("load statement generated for role playing hub {}", self.name());
        Ok(sql)
    }
}
