//! Effectivity satellites: satellites tracking the open relationship of a
//! link per driving key.

use tracing::info;

use crate::conventions::{Conventions, TableKind};
use crate::driving_key::DrivingKeyField;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::staging::StagingTable;
use crate::table::{Satellite, TableCore};
use crate::template::{self, EffectivitySatelliteDml, SatelliteDml};

/// A satellite on a link whose versions are partitioned by driving keys
/// instead of the link hashkey. Loading one closes the previously open
/// relationship for each driving key combination before opening the new
/// one.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectivitySatellite {
    satellite: Satellite,
    driving_keys: Vec<DrivingKeyField>,
}

impl EffectivitySatellite {
    /// Builds and validates an effectivity satellite.
    ///
    /// # Errors
    ///
    /// Beyond the satellite rules, at least one driving key is needed, each
    /// driving key must target this satellite and each driving key parent
    /// must be a link.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
        driving_keys: Vec<DrivingKeyField>,
        conventions: &Conventions,
    ) -> Result<Self> {
        let satellite = Satellite::new(schema, name, fields, conventions)?;
        if driving_keys.is_empty() {
            return Err(ModelError::MissingDrivingKeys {
                table: satellite.name().to_string(),
            });
        }
        for driving_key in &driving_keys {
            if driving_key.satellite_name != satellite.name() {
                return Err(ModelError::DrivingKeyMismatch {
                    table: satellite.name().to_string(),
                    driving_key: driving_key.name.clone(),
                    satellite: driving_key.satellite_name.clone(),
                });
            }
            if conventions.table_kind(&driving_key.parent_table_name) != TableKind::Link {
                return Err(ModelError::DrivingKeyParentNotLink {
                    table: satellite.name().to_string(),
                    parent: driving_key.parent_table_name.clone(),
                });
            }
        }
        Ok(Self {
            satellite,
            driving_keys,
        })
    }

    /// The plain satellite this wraps.
    #[must_use]
    pub fn satellite(&self) -> &Satellite {
        &self.satellite
    }

    /// The shared table core.
    #[must_use]
    pub fn core(&self) -> &TableCore {
        self.satellite.core()
    }

    /// Table name, lowercased.
    #[must_use]
    pub fn name(&self) -> &str {
        self.satellite.name()
    }

    /// Driving key fields, in declaration order.
    #[must_use]
    pub fn driving_keys(&self) -> &[DrivingKeyField] {
        &self.driving_keys
    }

    /// Name of the parent link.
    ///
    /// # Errors
    ///
    /// Fails when no hashkey parent exists, which [`EffectivitySatellite::new`]
    /// rules out.
    pub fn parent_table_name(&self, conventions: &Conventions) -> Result<String> {
        self.satellite.parent_table_name(conventions)
    }

    /// Expression computing the hashdiff in staging, identical to the plain
    /// satellite one.
    ///
    /// # Errors
    ///
    /// Fails when the hashdiff field is absent, which [`EffectivitySatellite::new`]
    /// rules out.
    pub fn hashdiff_sql(&self, parent: &TableCore, conventions: &Conventions) -> Result<String> {
        self.satellite.hashdiff_sql(parent, conventions)
    }

    /// Merge statement loading the effectivity satellite from staging.
    ///
    /// Needs the parent link to relate open versions back to the driving
    /// key fields they were opened for.
    ///
    /// # Errors
    ///
    /// Fails when a field [`EffectivitySatellite::new`] validated has gone
    /// missing.
    pub fn sql_load_statement(
        &self,
        parent: &TableCore,
        staging_table: &StagingTable,
        conventions: &Conventions,
    ) -> Result<String> {
        for driving_key in &self.driving_keys {
            parent.require_field(&driving_key.name)?;
        }
        let hashkey = self.satellite.parent_hashkey_field()?;
        let driving_key_names: Vec<String> = self
            .driving_keys
            .iter()
            .map(|driving_key| driving_key.name.clone())
            .collect();
        let SatelliteDml {
            target_schema,
            target_table,
            staging_schema,
            staging_table: staging_table_name,
            hashkey_field,
            hashdiff_field,
            staging_hashdiff_field,
            record_start_timestamp_field,
            record_end_timestamp_field,
            record_source_field,
            end_of_time,
            record_end_timestamp_expression,
            fields,
            descriptive_fields,
        } = self.satellite.dml_template(
            staging_table,
            &hashkey.name,
            template::record_end_timestamp_sql(&driving_key_names.join(", "), conventions),
            conventions,
        )?;
        let sql = EffectivitySatelliteDml {
            target_schema,
            target_table,
            staging_schema,
            staging_table: staging_table_name,
            link_table: parent.name().to_string(),
            hashkey_field,
            hashdiff_field,
            staging_hashdiff_field,
            record_start_timestamp_field,
            record_end_timestamp_field,
            record_source_field,
            end_of_time,
            record_end_timestamp_expression,
            fields,
            descriptive_fields,
            driving_keys: driving_key_names,
        }
        .render();
        info!(
            "load statement generated for effectivity satellite {}",
            self.name()
        );
        Ok(sql)
    }
}
