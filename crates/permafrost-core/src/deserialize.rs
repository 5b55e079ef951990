//! Builds a data vault model from column metadata, as extracted from an
//! information schema or declared in a manifest.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::conventions::{Conventions, TableKind};
use crate::driving_key::DrivingKeyField;
use crate::error::{ModelError, Result};
use crate::field::{Field, FieldDataType};
use crate::table::{EffectivitySatellite, Hub, Link, RolePlayingHub, Satellite, Table};

fn default_nullable() -> bool {
    true
}

/// One column of one target table, the unit a model is declared in.
///
/// Matches the shape of an information schema row: positions and
/// nullability are optional, columns without a position are numbered by
/// their order of appearance within the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Table the column belongs to.
    pub table_name: String,
    /// Column name.
    pub column_name: String,
    /// Snowflake data type.
    pub data_type: FieldDataType,
    /// Ordinal position within the table, 1 based.
    #[serde(default)]
    pub position: Option<u32>,
    /// Whether the column accepts NULLs. Defaults to true.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Numeric precision, for NUMBER columns.
    #[serde(default)]
    pub precision: Option<u8>,
    /// Numeric scale, for NUMBER columns.
    #[serde(default)]
    pub scale: Option<u8>,
    /// Character length, for TEXT columns.
    #[serde(default)]
    pub length: Option<u32>,
}

/// Turns column metadata into validated target tables.
///
/// Table kinds are derived from the configured table prefixes. Hubs listed
/// in the role playing mapping become role playing hubs; satellites with
/// driving keys become effectivity satellites.
#[derive(Debug, Clone)]
pub struct ModelDeserializer {
    target_schema: String,
    target_tables: Vec<String>,
    columns: Vec<ColumnMetadata>,
    driving_keys: Vec<DrivingKeyField>,
    role_playing_hubs: BTreeMap<String, String>,
    conventions: Conventions,
}

impl ModelDeserializer {
    /// Creates a deserializer for the given target tables, with default
    /// conventions, no driving keys and no role playing hubs.
    #[must_use]
    pub fn new(
        target_schema: impl Into<String>,
        target_tables: Vec<String>,
        columns: Vec<ColumnMetadata>,
    ) -> Self {
        Self {
            target_schema: target_schema.into(),
            target_tables,
            columns,
            driving_keys: Vec::new(),
            role_playing_hubs: BTreeMap::new(),
            conventions: Conventions::default(),
        }
    }

    /// Declares driving keys. A satellite referenced by at least one of
    /// them is built as an effectivity satellite.
    #[must_use]
    pub fn with_driving_keys(mut self, driving_keys: Vec<DrivingKeyField>) -> Self {
        self.driving_keys = driving_keys;
        self
    }

    /// Maps role playing hub names to the physical hub each one merges
    /// into. Parents absent from the target tables are appended to the
    /// model, their columns must be present in the metadata.
    #[must_use]
    pub fn with_role_playing_hubs(
        mut self,
        hubs: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.role_playing_hubs = hubs
            .into_iter()
            .map(|(hub, parent)| (hub.to_lowercase(), parent.to_lowercase()))
            .collect();
        self
    }

    /// Replaces the default naming conventions.
    #[must_use]
    pub fn with_conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Builds every target table from the column metadata.
    ///
    /// # Errors
    ///
    /// Fails when a table has no columns, carries an unknown prefix or
    /// breaks the validation rules of its kind.
    pub fn deserialize(&self) -> Result<Vec<Table>> {
        let mut fields_by_table = self.group_fields();
        let mut tables = Vec::new();
        for name in self.wanted_tables() {
            let fields = fields_by_table
                .remove(&name)
                .ok_or_else(|| ModelError::MissingColumns {
                    table: name.clone(),
                })?;
            tables.push(self.build_table(&name, fields)?);
        }
        info!("{} tables deserialized", tables.len());
        Ok(tables)
    }

    /// Groups the columns into fields, numbering unpositioned columns by
    /// their order of appearance.
    fn group_fields(&self) -> HashMap<String, Vec<Field>> {
        let mut counters: HashMap<String, u32> = HashMap::new();
        let mut fields_by_table: HashMap<String, Vec<Field>> = HashMap::new();
        for column in &self.columns {
            let table_name = column.table_name.to_lowercase();
            let counter = counters.entry(table_name.clone()).or_insert(0);
            *counter += 1;
            let mut field = Field::new(
                &column.table_name,
                &column.column_name,
                column.data_type,
                column.position.unwrap_or(*counter),
                !column.nullable,
            );
            field.precision = column.precision;
            field.scale = column.scale;
            field.length = column.length;
            fields_by_table.entry(table_name).or_default().push(field);
        }
        fields_by_table
    }

    /// Target tables plus role playing parents not listed among them, in
    /// declaration order, deduplicated.
    fn wanted_tables(&self) -> Vec<String> {
        let mut wanted: Vec<String> = Vec::new();
        for name in &self.target_tables {
            let name = name.to_lowercase();
            if !wanted.contains(&name) {
                wanted.push(name);
            }
        }
        for parent in self.role_playing_hubs.values() {
            if !wanted.contains(parent) {
                wanted.push(parent.clone());
            }
        }
        wanted
    }

    fn build_table(&self, name: &str, fields: Vec<Field>) -> Result<Table> {
        match self.conventions.parse_table_kind(name)? {
            TableKind::Hub => match self.role_playing_hubs.get(name) {
                Some(parent) => Ok(RolePlayingHub::new(
                    &self.target_schema,
                    name,
                    fields,
                    parent,
                    &self.conventions,
                )?
                .into()),
                None => {
                    Ok(Hub::new(&self.target_schema, name, fields, &self.conventions)?.into())
                }
            },
            TableKind::Link => {
                Ok(Link::new(&self.target_schema, name, fields, &self.conventions)?.into())
            }
            TableKind::Satellite => {
                let driving_keys: Vec<DrivingKeyField> = self
                    .driving_keys
                    .iter()
                    .filter(|driving_key| driving_key.satellite_name == name)
                    .cloned()
                    .collect();
                if driving_keys.is_empty() {
                    Ok(Satellite::new(&self.target_schema, name, fields, &self.conventions)?
                        .into())
                } else {
                    Ok(EffectivitySatellite::new(
                        &self.target_schema,
                        name,
                        fields,
                        driving_keys,
                        &self.conventions,
                    )?
                    .into())
                }
            }
        }
    }
}
