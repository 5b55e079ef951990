//! Tests for satellite and effectivity satellite load statements and
//! hashdiff expressions.

mod common;
use common::*;

use permafrost_core::{Conventions, Field, FieldDataType, Satellite};

#[test]
fn satellite_merge_inserts_new_versions_and_closes_old_ones() {
    let conventions = Conventions::default();
    let sql = customer_satellite()
        .sql_load_statement(&staging_table(), &conventions)
        .unwrap();
    assert!(sql.starts_with("MERGE INTO dv.hs_customer AS satellite"));
    assert!(sql.contains("FROM dv_stg.orders_20190806_000000 AS staging"));
    assert!(sql.contains("staging.hs_customer_hashdiff"));
    assert!(sql.contains(
        "WHERE satellite.r_timestamp_end = CAST('9999-12-31T00:00:00.000000Z' AS TIMESTAMP)"
    ));
    assert!(sql.contains(
        "OVER (PARTITION BY h_customer_hashkey ORDER BY r_timestamp) AS r_timestamp_end"
    ));
    assert!(sql.contains("UPDATE SET satellite.r_timestamp_end = staging.r_timestamp_end"));
    assert!(sql.contains(
        "INSERT (h_customer_hashkey, s_hashdiff, r_timestamp, r_timestamp_end, r_source, \
         test_string,"
    ));
    assert!(sql.ends_with("staging.test_real)"));
}

#[test]
fn satellite_hashdiff_hashes_parent_keys_then_descriptive_fields() {
    let conventions = Conventions::default();
    let parent = customer_hub();
    let sql = customer_satellite()
        .hashdiff_sql(parent.core(), &conventions)
        .unwrap();
    let fragments = [
        "COALESCE(CAST(customer_id AS TEXT), 'dv_unknown')",
        "COALESCE(CAST(test_string AS TEXT), '')",
        "COALESCE(TO_CHAR(CAST(test_date AS DATE), 'yyyy-mm-dd'), '')",
        "COALESCE(TO_CHAR(CAST(test_timestamp_ntz AS TIMESTAMP_NTZ), \
         'yyyy-mm-dd hh24:mi:ss.ff9'), '')",
        "COALESCE(CAST(CAST(test_integer AS NUMBER (38, 0)) AS TEXT), '')",
        "COALESCE(CAST(CAST(test_decimal AS NUMBER (18, 8)) AS TEXT), '')",
        "COALESCE(CAST(x_customer_id AS TEXT), '')",
        "COALESCE(CAST(grouping_key AS TEXT), '')",
        "COALESCE(ST_ASTEXT(TO_GEOGRAPHY(test_geography)), '')",
        "COALESCE(CAST(CAST(test_array AS ARRAY) AS TEXT), '')",
        "COALESCE(CAST(CAST(test_object AS OBJECT) AS TEXT), '')",
        "COALESCE(CAST(CAST(test_variant AS VARIANT) AS TEXT), '')",
        "COALESCE(TO_CHAR(CAST(test_timestamp_tz AS TIMESTAMP_TZ), \
         'yyyy-mm-dd hh24:mi:ss.ff9 tzhtzm'), '')",
        "COALESCE(TO_CHAR(CAST(test_timestamp_ltz AS TIMESTAMP_LTZ), \
         'yyyy-mm-dd hh24:mi:ss.ff9 tzhtzm'), '')",
        "COALESCE(TO_CHAR(CAST(test_time AS TIME), 'hh24:mi:ss.ff9'), '')",
        "COALESCE(CAST(CAST(test_boolean AS BOOLEAN) AS TEXT), '')",
        "COALESCE(CAST(CAST(test_real AS REAL) AS TEXT), '')",
    ];
    let expected = format!(
        "MD5(REGEXP_REPLACE({}, '(\\\\|~~\\\\|)+$', '')) AS hs_customer_hashdiff",
        fragments.join("||'|~~|'||")
    );
    assert_eq!(sql, expected);
}

#[test]
fn appending_a_descriptive_field_keeps_the_prior_expression_as_prefix() {
    let conventions = Conventions::default();
    let parent = customer_hub();
    let base_fields = vec![
        Field::new("hs_customer", "h_customer_hashkey", FieldDataType::Text, 1, true)
            .with_length(32),
        Field::new("hs_customer", "s_hashdiff", FieldDataType::Text, 2, true).with_length(32),
        Field::new("hs_customer", "r_timestamp", FieldDataType::TimestampNtz, 3, true),
        Field::new("hs_customer", "r_timestamp_end", FieldDataType::TimestampNtz, 4, true),
        Field::new("hs_customer", "r_source", FieldDataType::Text, 5, true),
        Field::new("hs_customer", "test_string", FieldDataType::Text, 6, false),
    ];
    let mut extended_fields = base_fields.clone();
    extended_fields.push(Field::new(
        "hs_customer",
        "test_date",
        FieldDataType::Date,
        7,
        false,
    ));

    let base = Satellite::new("dv", "hs_customer", base_fields, &conventions).unwrap();
    let extended = Satellite::new("dv", "hs_customer", extended_fields, &conventions).unwrap();
    let base_sql = base.hashdiff_sql(parent.core(), &conventions).unwrap();
    let extended_sql = extended.hashdiff_sql(parent.core(), &conventions).unwrap();

    // Rows where the new field is NULL hash to the prior value because the
    // appended fragment collapses into the stripped trailing delimiters.
    let marker = ", '(\\\\|~~\\\\|)+$'";
    let appended = "||'|~~|'||COALESCE(TO_CHAR(CAST(test_date AS DATE), 'yyyy-mm-dd'), '')";
    assert_eq!(
        extended_sql,
        base_sql.replace(marker, &format!("{appended}{marker}"))
    );
}

#[test]
fn effectivity_satellite_merge_partitions_by_driving_keys() {
    let conventions = Conventions::default();
    let link = order_customer_link();
    let sql = order_customer_eff_satellite()
        .sql_load_statement(link.core(), &staging_table(), &conventions)
        .unwrap();
    assert!(sql.starts_with("MERGE INTO dv.ls_order_customer_eff AS satellite"));
    // Open versions recover their driving keys through the parent link.
    assert!(sql.contains("INNER JOIN dv.l_order_customer AS l"));
    assert!(sql.contains("ON (l.l_order_customer_hashkey = satellite.l_order_customer_hashkey)"));
    assert!(sql.contains("l.h_customer_hashkey"));
    // Staging rows meet open versions on the driving keys, not the hashkey.
    assert!(sql.contains("ON (satellite.h_customer_hashkey = staging.h_customer_hashkey)"));
    assert!(sql.contains(
        "OR satellite.l_order_customer_hashkey <> staging.l_order_customer_hashkey"
    ));
    assert!(sql.contains(
        "OVER (PARTITION BY h_customer_hashkey ORDER BY r_timestamp) AS r_timestamp_end"
    ));
    assert!(sql.contains(
        "INSERT (l_order_customer_hashkey, s_hashdiff, r_timestamp, r_timestamp_end, r_source, \
         dummy_descriptive_field)"
    ));
    assert!(sql.ends_with("staging.dummy_descriptive_field)"));
}

#[test]
fn satellites_resolve_their_parent_from_the_hashkey_field() {
    let conventions = Conventions::default();
    assert_eq!(
        customer_satellite().parent_table_name(&conventions).unwrap(),
        "h_customer"
    );
    assert_eq!(
        order_customer_eff_satellite()
            .parent_table_name(&conventions)
            .unwrap(),
        "l_order_customer"
    );
}
