//! SQL templates for the statements the generator emits.
//!
//! Each statement template is a struct whose fields are its placeholders:
//! a forgotten value is a missing struct field at compile time instead of a
//! malformed statement at load time. The smaller formula fragments shared
//! between templates live here as free functions.

use chrono::{DateTime, Utc};

use crate::conventions::Conventions;

/// Timestamp rendering used inside generated SQL literals.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Separator placed between two hashed field expressions.
pub(crate) fn hash_delimiter_sql(conventions: &Conventions) -> String {
    format!("||'{}'||", conventions.hash_delimiter)
}

/// MD5 hashkey expression with its column alias.
pub(crate) fn hashkey_sql(expression: &str, hashkey_name: &str) -> String {
    format!("MD5({expression}) AS {hashkey_name}")
}

/// MD5 hashdiff expression with its column alias.
///
/// Trailing delimiters are stripped before hashing so that appending fields
/// that are NULL for existing rows does not change their hashdiff.
pub(crate) fn hashdiff_sql(
    expression: &str,
    hashdiff_name: &str,
    conventions: &Conventions,
) -> String {
    let delimiter_pattern = regex_escape_sql(&conventions.hash_delimiter);
    format!("MD5(REGEXP_REPLACE({expression}, '({delimiter_pattern})+$', '')) AS {hashdiff_name}")
}

/// Escapes regex metacharacters for use inside a Snowflake string literal.
///
/// The backslash is doubled once for the regex engine and once for the SQL
/// string parser.
fn regex_escape_sql(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() * 3);
    for character in value.chars() {
        if r"\.+*?()|[]{}^$".contains(character) {
            escaped.push_str("\\\\");
        }
        escaped.push(character);
    }
    escaped
}

/// Record start timestamp literal with its column alias.
pub(crate) fn record_start_timestamp_sql(
    extract_start_timestamp: DateTime<Utc>,
    conventions: &Conventions,
) -> String {
    format!(
        "CAST('{}' AS TIMESTAMP) AS {}",
        extract_start_timestamp.format(TIMESTAMP_FORMAT),
        conventions.record_start_timestamp
    )
}

/// Record source literal with its column alias.
pub(crate) fn record_source_sql(source: &str, conventions: &Conventions) -> String {
    format!("'{source}' AS {}", conventions.record_source)
}

/// Business key expression defaulting NULLs to the unknown sentinel.
pub(crate) fn business_key_sql(field_name: &str, conventions: &Conventions) -> String {
    format!(
        "COALESCE({field_name}, '{}') AS {field_name}",
        conventions.unknown_sentinel
    )
}

/// Window expression producing the record end timestamp.
///
/// Each version within a partition ends one millisecond before the next one
/// starts; the current version ends at the end of time.
pub(crate) fn record_end_timestamp_sql(partition_fields: &str, conventions: &Conventions) -> String {
    format!(
        "LEAD(DATEADD(milliseconds, - 1, {start}), 1, {end_of_time}) \
         OVER (PARTITION BY {partition_fields} ORDER BY {start}) AS {end}",
        start = conventions.record_start_timestamp,
        end_of_time = conventions.end_of_time_sql(),
        end = conventions.record_end_timestamp,
    )
}

fn comma_list(fields: &[String]) -> String {
    fields.join(", ")
}

fn qualified_comma_list(alias: &str, fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| format!("{alias}.{field}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders `, {alias}.{field}` for each field, or nothing.
///
/// Used for field lists that follow a fixed part of a select list and may
/// legitimately be empty.
fn trailing_qualified_list(alias: &str, fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| format!(", {alias}.{field}"))
        .collect()
}

fn trailing_list(fields: &[String]) -> String {
    fields.iter().map(|field| format!(", {field}")).collect()
}

/// `CREATE TABLE ... AS SELECT` statement building the staging table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagingDdl {
    pub staging_schema: String,
    pub staging_table: String,
    pub extract_schema: String,
    pub extract_table: String,
    /// Column definitions, one per staged field.
    pub fields_ddl: Vec<String>,
    /// Select expressions feeding the columns, in the same order.
    pub fields_dml: Vec<String>,
}

impl StagingDdl {
    pub fn render(&self) -> String {
        format!(
            r"CREATE OR REPLACE TABLE {staging_schema}.{staging_table} (
  {fields_ddl}
)
AS
SELECT
  {fields_dml}
FROM {extract_schema}.{extract_table}",
            staging_schema = self.staging_schema,
            staging_table = self.staging_table,
            fields_ddl = self.fields_ddl.join(",\n  "),
            fields_dml = self.fields_dml.join(",\n  "),
            extract_schema = self.extract_schema,
            extract_table = self.extract_table,
        )
    }
}

/// MERGE statement loading a hub or a link from staging.
///
/// Hubs and links share a shape: insert the hashkeys that are not in the
/// target yet, concatenating the record sources of batches that carried the
/// same hashkey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HubLinkDml {
    pub target_schema: String,
    pub target_table: String,
    pub staging_schema: String,
    pub staging_table: String,
    pub source_hashkey_field: String,
    pub target_hashkey_field: String,
    pub record_source_field: String,
    /// Every field except the hashkey and the record source.
    pub source_fields: Vec<String>,
    /// Every field, in insert column order.
    pub target_fields: Vec<String>,
}

impl HubLinkDml {
    pub fn render(&self) -> String {
        format!(
            r"MERGE INTO {target_schema}.{target_table} AS target
  USING (
        SELECT DISTINCT
          {source_hashkey_field},
          LISTAGG(DISTINCT {record_source_field}, ',')
            WITHIN GROUP (ORDER BY {record_source_field})
            OVER (PARTITION BY {source_hashkey_field}) AS {record_source_field},
          {source_fields}
        FROM {staging_schema}.{staging_table}
        ) AS staging ON (target.{target_hashkey_field} = staging.{source_hashkey_field})
  WHEN NOT MATCHED THEN
    INSERT ({target_fields})
      VALUES ({staging_fields})",
            target_schema = self.target_schema,
            target_table = self.target_table,
            source_hashkey_field = self.source_hashkey_field,
            record_source_field = self.record_source_field,
            source_fields = self.source_fields.join(",\n          "),
            staging_schema = self.staging_schema,
            staging_table = self.staging_table,
            target_hashkey_field = self.target_hashkey_field,
            target_fields = comma_list(&self.target_fields),
            staging_fields = qualified_comma_list("staging", &self.target_fields),
        )
    }
}

/// MERGE statement loading a satellite from staging.
///
/// New versions are inserted and the versions they supersede have their end
/// timestamp rewritten, both in one statement over the affected records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SatelliteDml {
    pub target_schema: String,
    pub target_table: String,
    pub staging_schema: String,
    pub staging_table: String,
    /// Hashkey of the parent hub or link.
    pub hashkey_field: String,
    /// Hashdiff name inside the satellite.
    pub hashdiff_field: String,
    /// Hashdiff name inside the staging table.
    pub staging_hashdiff_field: String,
    pub record_start_timestamp_field: String,
    pub record_end_timestamp_field: String,
    pub record_source_field: String,
    /// Literal marking a version as current.
    pub end_of_time: String,
    /// Pre-rendered window expression closing superseded versions.
    pub record_end_timestamp_expression: String,
    /// Every field, in insert column order.
    pub fields: Vec<String>,
    /// Descriptive fields only, possibly none.
    pub descriptive_fields: Vec<String>,
}

impl SatelliteDml {
    pub fn render(&self) -> String {
        format!(
            r"MERGE INTO {target_schema}.{target_table} AS satellite
  USING (
        WITH
        filtered_staging AS (
          SELECT DISTINCT
            staging.{hashkey_field},
            staging.{staging_hashdiff_field},
            staging.{record_start_timestamp_field},
            staging.{record_source_field}{staging_descriptive_fields}
          FROM {staging_schema}.{staging_table} AS staging
        ),
        open_versions AS (
          SELECT
            satellite.{hashkey_field},
            satellite.{hashdiff_field},
            satellite.{record_start_timestamp_field},
            satellite.{record_source_field}{satellite_descriptive_fields}
          FROM {target_schema}.{target_table} AS satellite
          WHERE satellite.{record_end_timestamp_field} = {end_of_time}
        ),
        affected_records AS (
          SELECT
            staging.{hashkey_field},
            staging.{staging_hashdiff_field} AS {hashdiff_field},
            staging.{record_start_timestamp_field},
            staging.{record_source_field}{staging_descriptive_fields}
          FROM filtered_staging AS staging
            LEFT OUTER JOIN open_versions AS satellite
                            ON (satellite.{hashkey_field} = staging.{hashkey_field})
          WHERE satellite.{hashkey_field} IS NULL
             OR satellite.{hashdiff_field} <> staging.{staging_hashdiff_field}
          UNION ALL
          SELECT
            satellite.{hashkey_field},
            satellite.{hashdiff_field},
            satellite.{record_start_timestamp_field},
            satellite.{record_source_field}{satellite_descriptive_fields}
          FROM filtered_staging AS staging
            INNER JOIN open_versions AS satellite
                       ON (satellite.{hashkey_field} = staging.{hashkey_field})
          WHERE satellite.{hashdiff_field} <> staging.{staging_hashdiff_field}
        )
        SELECT
          {hashkey_field},
          {hashdiff_field},
          {record_start_timestamp_field},
          {record_end_timestamp_expression},
          {record_source_field}{descriptive_fields}
        FROM affected_records
        ) AS staging
    ON (satellite.{hashkey_field} = staging.{hashkey_field}
        AND satellite.{record_start_timestamp_field} = staging.{record_start_timestamp_field})
  WHEN MATCHED THEN
    UPDATE SET satellite.{record_end_timestamp_field} = staging.{record_end_timestamp_field}
  WHEN NOT MATCHED THEN
    INSERT ({fields})
      VALUES (staging.{hashkey_field}, staging.{hashdiff_field},
              staging.{record_start_timestamp_field}, staging.{record_end_timestamp_field},
              staging.{record_source_field}{staging_values})",
            target_schema = self.target_schema,
            target_table = self.target_table,
            hashkey_field = self.hashkey_field,
            hashdiff_field = self.hashdiff_field,
            staging_hashdiff_field = self.staging_hashdiff_field,
            record_start_timestamp_field = self.record_start_timestamp_field,
            record_end_timestamp_field = self.record_end_timestamp_field,
            record_source_field = self.record_source_field,
            end_of_time = self.end_of_time,
            record_end_timestamp_expression = self.record_end_timestamp_expression,
            staging_schema = self.staging_schema,
            staging_table = self.staging_table,
            staging_descriptive_fields = trailing_qualified_list("staging", &self.descriptive_fields),
            satellite_descriptive_fields =
                trailing_qualified_list("satellite", &self.descriptive_fields),
            descriptive_fields = trailing_list(&self.descriptive_fields),
            fields = comma_list(&self.fields),
            staging_values = trailing_qualified_list("staging", &self.descriptive_fields),
        )
    }
}

/// MERGE statement loading an effectivity satellite from staging.
///
/// Differs from the plain satellite in how versions are partitioned: the
/// driving keys, recovered through the parent link, decide which open
/// version a new row supersedes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EffectivitySatelliteDml {
    pub target_schema: String,
    pub target_table: String,
    pub staging_schema: String,
    pub staging_table: String,
    /// Parent link, joined to recover driving keys of open versions.
    pub link_table: String,
    pub hashkey_field: String,
    pub hashdiff_field: String,
    pub staging_hashdiff_field: String,
    pub record_start_timestamp_field: String,
    pub record_end_timestamp_field: String,
    pub record_source_field: String,
    pub end_of_time: String,
    /// Pre-rendered window expression partitioned by the driving keys.
    pub record_end_timestamp_expression: String,
    /// Every field, in insert column order.
    pub fields: Vec<String>,
    /// Descriptive fields only, possibly none.
    pub descriptive_fields: Vec<String>,
    /// Driving key field names within the parent link.
    pub driving_keys: Vec<String>,
}

impl EffectivitySatelliteDml {
    pub fn render(&self) -> String {
        format!(
            r"MERGE INTO {target_schema}.{target_table} AS satellite
  USING (
        WITH
        filtered_staging AS (
          SELECT DISTINCT
            staging.{hashkey_field},
            staging.{staging_hashdiff_field},
            staging.{record_start_timestamp_field},
            staging.{record_source_field},
            {staging_driving_keys}{staging_descriptive_fields}
          FROM {staging_schema}.{staging_table} AS staging
        ),
        open_versions AS (
          SELECT
            satellite.{hashkey_field},
            satellite.{hashdiff_field},
            satellite.{record_start_timestamp_field},
            satellite.{record_source_field},
            {link_driving_keys}{satellite_descriptive_fields}
          FROM {target_schema}.{target_table} AS satellite
            INNER JOIN {target_schema}.{link_table} AS l
                       ON (l.{hashkey_field} = satellite.{hashkey_field})
          WHERE satellite.{record_end_timestamp_field} = {end_of_time}
        ),
        affected_records AS (
          SELECT
            staging.{hashkey_field},
            staging.{staging_hashdiff_field} AS {hashdiff_field},
            staging.{record_start_timestamp_field},
            staging.{record_source_field},
            {staging_driving_keys}{staging_descriptive_fields}
          FROM filtered_staging AS staging
            LEFT OUTER JOIN open_versions AS satellite
                            ON ({driving_key_condition})
          WHERE satellite.{hashkey_field} IS NULL
             OR satellite.{hashkey_field} <> staging.{hashkey_field}
             OR satellite.{hashdiff_field} <> staging.{staging_hashdiff_field}
          UNION ALL
          SELECT
            satellite.{hashkey_field},
            satellite.{hashdiff_field},
            satellite.{record_start_timestamp_field},
            satellite.{record_source_field},
            {satellite_driving_keys}{satellite_descriptive_fields}
          FROM filtered_staging AS staging
            INNER JOIN open_versions AS satellite
                       ON ({driving_key_condition})
          WHERE satellite.{hashkey_field} <> staging.{hashkey_field}
             OR satellite.{hashdiff_field} <> staging.{staging_hashdiff_field}
        )
        SELECT
          {hashkey_field},
          {hashdiff_field},
          {record_start_timestamp_field},
          {record_end_timestamp_expression},
          {record_source_field}{descriptive_fields}
        FROM affected_records
        ) AS staging
    ON (satellite.{hashkey_field} = staging.{hashkey_field}
        AND satellite.{record_start_timestamp_field} = staging.{record_start_timestamp_field})
  WHEN MATCHED THEN
    UPDATE SET satellite.{record_end_timestamp_field} = staging.{record_end_timestamp_field}
  WHEN NOT MATCHED THEN
    INSERT ({fields})
      VALUES (staging.{hashkey_field}, staging.{hashdiff_field},
              staging.{record_start_timestamp_field}, staging.{record_end_timestamp_field},
              staging.{record_source_field}{staging_values})",
            target_schema = self.target_schema,
            target_table = self.target_table,
            link_table = self.link_table,
            hashkey_field = self.hashkey_field,
            hashdiff_field = self.hashdiff_field,
            staging_hashdiff_field = self.staging_hashdiff_field,
            record_start_timestamp_field = self.record_start_timestamp_field,
            record_end_timestamp_field = self.record_end_timestamp_field,
            record_source_field = self.record_source_field,
            end_of_time = self.end_of_time,
            record_end_timestamp_expression = self.record_end_timestamp_expression,
            staging_schema = self.staging_schema,
            staging_table = self.staging_table,
            staging_driving_keys = qualified_comma_list("staging", &self.driving_keys),
            link_driving_keys = qualified_comma_list("l", &self.driving_keys),
            satellite_driving_keys = qualified_comma_list("satellite", &self.driving_keys),
            driving_key_condition = self.driving_key_condition(),
            staging_descriptive_fields = trailing_qualified_list("staging", &self.descriptive_fields),
            satellite_descriptive_fields =
                trailing_qualified_list("satellite", &self.descriptive_fields),
            descriptive_fields = trailing_list(&self.descriptive_fields),
            fields = comma_list(&self.fields),
            staging_values = trailing_qualified_list("staging", &self.descriptive_fields),
        )
    }

    /// Equality of every driving key between staging and the open versions.
    fn driving_key_condition(&self) -> String {
        self.driving_keys
            .iter()
            .map(|field| format!("satellite.{field} = staging.{field}"))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// MERGE statement loading a role playing hub into its parent hub.
///
/// A role playing hub has no table of its own: new business keys observed
/// under the role are inserted into the parent, mapping the role's columns
/// onto the parent's columns position by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RolePlayingHubDml {
    pub target_schema: String,
    /// Parent hub, the physical merge target.
    pub parent_table: String,
    pub staging_schema: String,
    pub staging_table: String,
    /// Hashkey as named by the role playing hub.
    pub source_hashkey_field: String,
    /// Hashkey as named by the parent hub.
    pub parent_hashkey_field: String,
    pub record_source_field: String,
    /// Role playing fields except the hashkey and the record source.
    pub source_fields: Vec<String>,
    /// Parent columns receiving the insert, hashkey excluded.
    pub parent_fields: Vec<String>,
    /// Role playing columns feeding the insert, aligned with `parent_fields`.
    pub staging_source_fields: Vec<String>,
}

impl RolePlayingHubDml {
    pub fn render(&self) -> String {
        format!(
            r"MERGE INTO {target_schema}.{parent_table} AS hub
  USING (
        SELECT DISTINCT
          {source_hashkey_field},
          LISTAGG(DISTINCT {record_source_field}, ',')
            WITHIN GROUP (ORDER BY {record_source_field})
            OVER (PARTITION BY {source_hashkey_field}) AS {record_source_field},
          {source_fields}
        FROM {staging_schema}.{staging_table}
        ) AS staging ON (hub.{parent_hashkey_field} = staging.{source_hashkey_field})
  WHEN NOT MATCHED THEN
    INSERT ({parent_hashkey_field}, {parent_fields})
      VALUES (staging.{source_hashkey_field}, {staging_source_fields})",
            target_schema = self.target_schema,
            parent_table = self.parent_table,
            source_hashkey_field = self.source_hashkey_field,
            record_source_field = self.record_source_field,
            source_fields = self.source_fields.join(",\n          "),
            staging_schema = self.staging_schema,
            staging_table = self.staging_table,
            parent_hashkey_field = self.parent_hashkey_field,
            parent_fields = comma_list(&self.parent_fields),
            staging_source_fields = qualified_comma_list("staging", &self.staging_source_fields),
        )
    }
}
