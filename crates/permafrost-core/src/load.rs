//! Orchestrates one load: staging table creation plus ordered merge
//! statements for every target table.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info};

use crate::conventions::Conventions;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::role::FieldRole;
use crate::staging::StagingTable;
use crate::table::{Table, TableCore};
use crate::template::{self, StagingDdl};

/// One load of a data vault model from one extract table.
///
/// Holds the target tables of the model, resolves the parent relationships
/// between them and renders the SQL that stages an extraction batch and
/// merges it into every target, in dependency order.
#[derive(Debug, Clone)]
pub struct DataVaultLoad {
    extract_schema: String,
    extract_table: String,
    staging_table: StagingTable,
    extract_start_timestamp: DateTime<Utc>,
    source: Option<String>,
    conventions: Conventions,
    target_tables: Vec<Table>,
    parents: Vec<Option<usize>>,
    tables_by_name: HashMap<String, usize>,
}

impl DataVaultLoad {
    /// Builds a load and resolves every parent relationship within it.
    ///
    /// Tables are sorted by loading order, then by name. The extract start
    /// timestamp becomes the record start timestamp of every staged row
    /// and the suffix of the staging table name.
    ///
    /// # Errors
    ///
    /// Fails when a dependent table references a parent that is absent
    /// from `target_tables` or that has the wrong kind.
    pub fn new<Tz: TimeZone>(
        extract_schema: impl Into<String>,
        extract_table: impl Into<String>,
        staging_schema: impl Into<String>,
        staging_table: impl Into<String>,
        extract_start_timestamp: DateTime<Tz>,
        mut target_tables: Vec<Table>,
        conventions: Conventions,
    ) -> Result<Self> {
        let extract_start_timestamp = extract_start_timestamp.with_timezone(&Utc);
        let staging_table = StagingTable::new(
            staging_schema,
            staging_table,
            extract_start_timestamp,
            &conventions,
        );
        target_tables
            .sort_by(|a, b| (a.loading_order(), a.name()).cmp(&(b.loading_order(), b.name())));
        let mut tables_by_name = HashMap::new();
        for (index, table) in target_tables.iter().enumerate() {
            tables_by_name
                .entry(table.name().to_string())
                .or_insert(index);
        }
        let parents = resolve_parents(&target_tables, &tables_by_name, &conventions)?;
        debug!("{} target tables resolved", target_tables.len());
        Ok(Self {
            extract_schema: extract_schema.into(),
            extract_table: extract_table.into(),
            staging_table,
            extract_start_timestamp,
            source: None,
            conventions,
            target_tables,
            parents,
            tables_by_name,
        })
    }

    /// Sets the record source literal written to every staged row. Without
    /// one, the extract table must carry its own record source column.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The staging table receiving this batch.
    #[must_use]
    pub fn staging_table(&self) -> &StagingTable {
        &self.staging_table
    }

    /// Target tables, sorted by loading order and name.
    #[must_use]
    pub fn target_tables(&self) -> &[Table] {
        &self.target_tables
    }

    /// The naming conventions in force.
    #[must_use]
    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// CREATE TABLE statement deriving the staging table from the extract
    /// table, computing hashkeys, hashdiffs, business keys and metadata
    /// along the way.
    ///
    /// Columns are deduplicated across target tables: a business key
    /// shared by a hub and a link is staged once, under the expression of
    /// the first table that carries it. Record end timestamps and parent
    /// hashkeys are never staged, they only exist in the targets.
    ///
    /// # Errors
    ///
    /// Fails when a hashkey or hashdiff column references a table missing
    /// from the load.
    pub fn staging_create_sql_statement(&self) -> Result<String> {
        let mut seen = HashSet::new();
        let mut fields_ddl = Vec::new();
        let mut fields_dml = Vec::new();
        for table in &self.target_tables {
            for (field, role) in table.core().field_roles() {
                if field.name == self.conventions.record_end_timestamp
                    || role == FieldRole::HashkeyParent
                {
                    continue;
                }
                if !seen.insert(field.name_in_staging(role, &self.conventions)) {
                    continue;
                }
                fields_ddl.push(field.ddl_in_staging(role, &self.conventions));
                fields_dml.push(self.staging_dml_expression(field, role)?);
            }
        }
        let sql = StagingDdl {
            staging_schema: self.staging_table.schema.clone(),
            staging_table: self.staging_table.physical_name.clone(),
            extract_schema: self.extract_schema.clone(),
            extract_table: self.extract_table.clone(),
            fields_ddl,
            fields_dml,
        }
        .render();
        info!(
            "staging statement generated for {}.{}",
            self.staging_table.schema, self.staging_table.physical_name
        );
        Ok(sql)
    }

    /// Load statements grouped by loading order: the staging statement
    /// alone, then hubs, then links, then satellites. Statements within a
    /// group touch independent tables and may run concurrently; groups
    /// must run in sequence.
    ///
    /// # Errors
    ///
    /// Fails when a statement references a table missing from the load.
    pub fn sql_load_scripts_by_group(&self) -> Result<Vec<Vec<String>>> {
        let mut by_order: BTreeMap<u8, Vec<String>> = BTreeMap::new();
        for (index, table) in self.target_tables.iter().enumerate() {
            by_order
                .entry(table.loading_order())
                .or_default()
                .push(self.table_load_statement(index)?);
        }
        let mut groups = vec![vec![self.staging_create_sql_statement()?]];
        groups.extend(by_order.into_values());
        Ok(groups)
    }

    /// Every load statement in execution order, starting with the staging
    /// statement.
    ///
    /// # Errors
    ///
    /// Fails when a statement references a table missing from the load.
    pub fn sql_load_script(&self) -> Result<Vec<String>> {
        Ok(self
            .sql_load_scripts_by_group()?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Merge statement for the table at `index`, resolving its parent
    /// when the kind needs one.
    fn table_load_statement(&self, index: usize) -> Result<String> {
        match &self.target_tables[index] {
            Table::Hub(hub) => hub.sql_load_statement(&self.staging_table, &self.conventions),
            Table::Link(link) => link.sql_load_statement(&self.staging_table, &self.conventions),
            Table::Satellite(satellite) => {
                satellite.sql_load_statement(&self.staging_table, &self.conventions)
            }
            Table::EffectivitySatellite(satellite) => {
                let parent = self.resolved_parent(
                    index,
                    &satellite.parent_table_name(&self.conventions)?,
                    satellite.name(),
                )?;
                satellite.sql_load_statement(parent, &self.staging_table, &self.conventions)
            }
            Table::RolePlayingHub(hub) => {
                let parent = self.resolved_parent(index, hub.parent_table_name(), hub.name())?;
                hub.sql_load_statement(parent, &self.staging_table, &self.conventions)
            }
        }
    }

    /// Staging expression for one column, dispatched on its name and role.
    fn staging_dml_expression(&self, field: &Field, role: FieldRole) -> Result<String> {
        if field.name == self.conventions.record_start_timestamp {
            return Ok(template::record_start_timestamp_sql(
                self.extract_start_timestamp,
                &self.conventions,
            ));
        }
        if field.name == self.conventions.record_source {
            if let Some(source) = &self.source {
                return Ok(template::record_source_sql(source, &self.conventions));
            }
        }
        match role {
            FieldRole::Hashkey => {
                let index = self.table_index(&field.parent_table_name)?;
                self.target_tables[index]
                    .core()
                    .hashkey_sql(&self.conventions)
            }
            FieldRole::Hashdiff => {
                let index = self.table_index(&field.parent_table_name)?;
                match &self.target_tables[index] {
                    Table::Satellite(satellite) => {
                        let parent = self.resolved_parent(
                            index,
                            &satellite.parent_table_name(&self.conventions)?,
                            satellite.name(),
                        )?;
                        satellite.hashdiff_sql(parent, &self.conventions)
                    }
                    Table::EffectivitySatellite(satellite) => {
                        let parent = self.resolved_parent(
                            index,
                            &satellite.parent_table_name(&self.conventions)?,
                            satellite.name(),
                        )?;
                        satellite.hashdiff_sql(parent, &self.conventions)
                    }
                    table => Err(ModelError::HashdiffOutsideSatellite {
                        table: table.name().to_string(),
                        field: field.name.clone(),
                    }),
                }
            }
            FieldRole::BusinessKey => {
                Ok(template::business_key_sql(&field.name, &self.conventions))
            }
            _ => Ok(field.name_in_staging(role, &self.conventions)),
        }
    }

    /// Core of the parent resolved for the table at `index`.
    fn resolved_parent(
        &self,
        index: usize,
        parent_name: &str,
        table_name: &str,
    ) -> Result<&TableCore> {
        self.parents
            .get(index)
            .copied()
            .flatten()
            .map(|parent_index| self.target_tables[parent_index].core())
            .ok_or_else(|| ModelError::MissingParentTable {
                table: table_name.to_string(),
                parent: parent_name.to_string(),
            })
    }

    fn table_index(&self, name: &str) -> Result<usize> {
        self.tables_by_name
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::TableNotFound {
                table: name.to_string(),
            })
    }
}

/// Resolves the parent of every table, validating its presence and kind.
fn resolve_parents(
    tables: &[Table],
    tables_by_name: &HashMap<String, usize>,
    conventions: &Conventions,
) -> Result<Vec<Option<usize>>> {
    tables
        .iter()
        .map(|table| resolve_parent(table, tables, tables_by_name, conventions))
        .collect()
}

fn resolve_parent(
    table: &Table,
    tables: &[Table],
    tables_by_name: &HashMap<String, usize>,
    conventions: &Conventions,
) -> Result<Option<usize>> {
    match table {
        Table::Hub(_) => Ok(None),
        Table::Link(link) => {
            for parent_name in link.parent_hub_names(conventions) {
                lookup_parent(tables_by_name, link.name(), &parent_name)?;
            }
            Ok(None)
        }
        Table::Satellite(satellite) => {
            let parent_name = satellite.parent_table_name(conventions)?;
            let index = lookup_parent(tables_by_name, satellite.name(), &parent_name)?;
            match &tables[index] {
                Table::Hub(_) | Table::RolePlayingHub(_) | Table::Link(_) => Ok(Some(index)),
                _ => Err(ModelError::ParentKindMismatch {
                    table: satellite.name().to_string(),
                    parent: parent_name,
                    expected: "hub or link",
                }),
            }
        }
        Table::EffectivitySatellite(satellite) => {
            let parent_name = satellite.parent_table_name(conventions)?;
            let index = lookup_parent(tables_by_name, satellite.name(), &parent_name)?;
            match &tables[index] {
                Table::Link(_) => Ok(Some(index)),
                _ => Err(ModelError::ParentKindMismatch {
                    table: satellite.name().to_string(),
                    parent: parent_name,
                    expected: "link",
                }),
            }
        }
        Table::RolePlayingHub(hub) => {
            let index = lookup_parent(tables_by_name, hub.name(), hub.parent_table_name())?;
            match &tables[index] {
                Table::Hub(_) => Ok(Some(index)),
                _ => Err(ModelError::ParentKindMismatch {
                    table: hub.name().to_string(),
                    parent: hub.parent_table_name().to_string(),
                    expected: "hub",
                }),
            }
        }
    }
}

fn lookup_parent(
    tables_by_name: &HashMap<String, usize>,
    table: &str,
    parent: &str,
) -> Result<usize> {
    tables_by_name
        .get(parent)
        .copied()
        .ok_or_else(|| ModelError::MissingParentTable {
            table: table.to_string(),
            parent: parent.to_string(),
        })
}
