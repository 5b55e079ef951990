//! Satellites: historized attributes of a hub or link.

use tracing::info;

use crate::conventions::Conventions;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::role::FieldRole;
use crate::staging::StagingTable;
use crate::table::TableCore;
use crate::template::{self, SatelliteDml};

/// A satellite stores versions of its parent's descriptive fields. A new
/// version is detected by comparing hashdiffs; superseded versions are
/// closed by rewriting their record end timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Satellite {
    core: TableCore,
}

impl Satellite {
    /// Builds and validates a satellite.
    ///
    /// # Errors
    ///
    /// Beyond the common rules, the satellite must carry its parent's
    /// hashkey, a record end timestamp and its own hashdiff field.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
        conventions: &Conventions,
    ) -> Result<Self> {
        let core = TableCore::new(schema, name, fields, conventions)?;
        if core.fields_with_role(FieldRole::HashkeyParent).next().is_none() {
            return Err(ModelError::MissingParentHashkey {
                table: core.name().to_string(),
            });
        }
        core.require_field(&conventions.record_end_timestamp)?;
        core.require_field(&conventions.own_hashdiff_name())?;
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

    /// Name of the parent table, derived from the first hashkey parent
    /// field by stripping the hashkey suffix.
    ///
    /// # Errors
    ///
    /// Fails when no hashkey parent exists, which [`Satellite::new`] rules
    /// out.
    pub fn parent_table_name(&self, conventions: &Conventions) -> Result<String> {
        let parent_hashkey = self.parent_hashkey_field()?;
        let suffix = format!("_{}", conventions.hashkey_suffix);
        Ok(parent_hashkey
            .name
            .strip_suffix(&suffix)
            .unwrap_or(&parent_hashkey.name)
            .to_string())
    }

    /// Expression computing the satellite's hashdiff in staging.
    ///
    /// Hashes the parent's business keys and child keys followed by the
    /// satellite's descriptive fields, all in position order, stripping
    /// trailing delimiters so a newly appended descriptive field does not
    /// change the hashdiff of rows that carry NULL for it.
    ///
    /// # Errors
    ///
    /// Fails when the hashdiff field is absent, which [`Satellite::new`]
    /// rules out.
    pub fn hashdiff_sql(&self, parent: &TableCore, conventions: &Conventions) -> Result<String> {
        let hashdiff = self.core.require_field(&conventions.own_hashdiff_name())?;
        let delimiter = template::hash_delimiter_sql(conventions);
        let fragments: Vec<String> = parent
            .fields_with_role(FieldRole::BusinessKey)
            .map(|field| field.hash_concatenation_sql(FieldRole::BusinessKey, conventions))
            .chain(
                parent
                    .fields_with_role(FieldRole::ChildKey)
                    .map(|field| field.hash_concatenation_sql(FieldRole::ChildKey, conventions)),
            )
            .chain(
                self.core
                    .fields_with_role(FieldRole::Descriptive)
                    .map(|field| field.hash_concatenation_sql(FieldRole::Descriptive, conventions)),
            )
            .collect();
        Ok(template::hashdiff_sql(
            &fragments.join(&delimiter),
            &hashdiff.name_in_staging(FieldRole::Hashdiff, conventions),
            conventions,
        ))
    }

    /// Merge statement loading the satellite from staging.
    ///
    /// # Errors
    ///
    /// Fails when a field [`Satellite::new`] validated has gone missing.
    pub fn sql_load_statement(
        &self,
        staging_table: &StagingTable,
        conventions: &Conventions,
    ) -> Result<String> {
        let hashkey = self.parent_hashkey_field()?;
        let sql = self
            .dml_template(
                staging_table,
                &hashkey.name,
                template::record_end_timestamp_sql(&hashkey.name, conventions),
                conventions,
            )?
            .render();
        info!("load statement generated for satellite {}", self.core.name());
        Ok(sql)
    }

    /// First field carrying the parent's hashkey.
    pub(crate) fn parent_hashkey_field(&self) -> Result<&Field> {
        self.core
            .fields_with_role(FieldRole::HashkeyParent)
            .next()
            .ok_or_else(|| ModelError::MissingParentHashkey {
                table: self.core.name().to_string(),
            })
    }

    /// Fills the satellite merge template shared with effectivity
    /// satellites.
    pub(crate) fn dml_template(
        &self,
        staging_table: &StagingTable,
        hashkey_field: &str,
        record_end_timestamp_expression: String,
        conventions: &Conventions,
    ) -> Result<SatelliteDml> {
        let hashdiff = self.core.require_field(&conventions.own_hashdiff_name())?;
        Ok(SatelliteDml {
            target_schema: self.core.schema().to_string(),
            target_table: self.core.name().to_string(),
            staging_schema: staging_table.schema.clone(),
            staging_table: staging_table.physical_name.clone(),
            hashkey_field: hashkey_field.to_string(),
            hashdiff_field: hashdiff.name.clone(),
            staging_hashdiff_field: hashdiff.name_in_staging(FieldRole::Hashdiff, conventions),
            record_start_timestamp_field: conventions.record_start_timestamp.clone(),
            record_end_timestamp_field: conventions.record_end_timestamp.clone(),
            record_source_field: conventions.record_source.clone(),
            end_of_time: conventions.end_of_time_sql(),
            record_end_timestamp_expression,
            fields: self
                .core
                .fields()
                .iter()
                .map(|field| field.name.clone())
                .collect(),
            descriptive_fields: self
                .core
                .fields_with_role(FieldRole::Descriptive)
                .map(|field| field.name.clone())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::field::FieldDataType;

    use super::*;

    fn fields() -> Vec<Field> {
        vec![
            Field::new("hs_customer", "h_customer_hashkey", FieldDataType::Text, 1, true)
                .with_length(32),
            Field::new("hs_customer", "s_hashdiff", FieldDataType::Text, 2, true)
                .with_length(32),
            Field::new("hs_customer", "r_timestamp", FieldDataType::TimestampNtz, 3, true),
            Field::new("hs_customer", "r_timestamp_end", FieldDataType::TimestampNtz, 4, true),
            Field::new("hs_customer", "r_source", FieldDataType::Text, 5, true),
            Field::new("hs_customer", "test_string", FieldDataType::Text, 6, false),
            Field::new("hs_customer", "test_date", FieldDataType::Date, 7, false),
        ]
    }

    #[test]
    fn parent_table_name_strips_the_hashkey_suffix() {
        let conventions = Conventions::default();
        let satellite = Satellite::new("dv", "hs_customer", fields(), &conventions).unwrap();
        assert_eq!(
            satellite.parent_table_name(&conventions).unwrap(),
            "h_customer"
        );
    }

    #[test]
    fn satellite_requires_a_parent_hashkey() {
        let conventions = Conventions::default();
        let no_parent: Vec<Field> = fields()
            .into_iter()
            .filter(|field| field.name != "h_customer_hashkey")
            .collect();
        let err = Satellite::new("dv", "hs_customer", no_parent, &conventions).unwrap_err();
        assert_eq!(err.to_string(), "hs_customer: no hashkey for parent table found");
    }

    #[test]
    fn satellite_requires_an_end_timestamp_and_a_hashdiff() {
        let conventions = Conventions::default();
        let no_end: Vec<Field> = fields()
            .into_iter()
            .filter(|field| field.name != "r_timestamp_end")
            .collect();
        let err = Satellite::new("dv", "hs_customer", no_end, &conventions).unwrap_err();
        assert_eq!(
            err.to_string(),
            "hs_customer: no field named 'r_timestamp_end' found"
        );

        let no_hashdiff: Vec<Field> = fields()
            .into_iter()
            .filter(|field| field.name != "s_hashdiff")
            .collect();
        let err = Satellite::new("dv", "hs_customer", no_hashdiff, &conventions).unwrap_err();
        assert_eq!(err.to_string(), "hs_customer: no field named 's_hashdiff' found");
    }
}
