//! End-to-end tests over the full fixture model: staging column layout,
//! script grouping and cross-table consistency.

mod common;
use common::*;

use permafrost_core::{Conventions, DataVaultLoad, Table};

fn staging_columns(sql: &str) -> Vec<String> {
    let ddl_block = sql
        .split_once("(\n")
        .map(|(_, rest)| rest)
        .and_then(|rest| rest.split_once("\n)\nAS"))
        .map(|(block, _)| block)
        .expect("staging statement should carry a column block");
    ddl_block
        .lines()
        .filter_map(|line| line.trim().split(' ').next())
        .map(str::to_string)
        .collect()
}

#[test]
fn staging_covers_every_column_of_the_model_exactly_once() {
    let sql = full_load().staging_create_sql_statement().unwrap();
    let expected = [
        "h_customer_hashkey",
        "r_timestamp",
        "r_source",
        "customer_id",
        "h_customer_role_playing_hashkey",
        "customer_role_playing_id",
        "h_order_hashkey",
        "order_id",
        "l_order_customer_hashkey",
        "ck_test_string",
        "ck_test_timestamp",
        "l_order_customer_role_playing_hashkey",
        "hs_customer_hashdiff",
        "test_string",
        "test_date",
        "test_timestamp_ntz",
        "test_integer",
        "test_decimal",
        "x_customer_id",
        "grouping_key",
        "test_geography",
        "test_array",
        "test_object",
        "test_variant",
        "test_timestamp_tz",
        "test_timestamp_ltz",
        "test_time",
        "test_boolean",
        "test_real",
        "ls_order_customer_eff_hashdiff",
        "dummy_descriptive_field",
        "ls_order_customer_role_playing_eff_hashdiff",
    ];
    assert_eq!(staging_columns(&sql), expected);
}

#[test]
fn staging_expressions_come_from_the_owning_tables() {
    let conventions = Conventions::default();
    let sql = full_load().staging_create_sql_statement().unwrap();
    assert!(sql.contains("CAST('2019-08-06T00:00:00.000000Z' AS TIMESTAMP) AS r_timestamp"));
    assert!(sql.contains("'test' AS r_source"));
    // Hashkeys are staged with the very expression the owning table hashes.
    let hub_hashkey = customer_hub().hashkey_sql(&conventions).unwrap();
    let link_hashkey = order_customer_link().hashkey_sql(&conventions).unwrap();
    assert!(sql.contains(&hub_hashkey));
    assert!(sql.contains(&link_hashkey));
    let satellite_hashdiff = customer_satellite()
        .hashdiff_sql(customer_hub().core(), &conventions)
        .unwrap();
    assert!(sql.contains(&satellite_hashdiff));
}

#[test]
fn groups_run_staging_then_hubs_then_links_then_satellites() {
    let groups = full_load().sql_load_scripts_by_group().unwrap();
    assert_eq!(
        groups.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![1, 3, 2, 3]
    );
    assert!(groups[0][0].starts_with("CREATE OR REPLACE TABLE dv_stg.orders_20190806_000000"));
    // Hubs within a group come sorted by name; the role playing hub merges
    // into its parent's physical table.
    assert!(groups[1][0].starts_with("MERGE INTO dv.h_customer AS target"));
    assert!(groups[1][1].starts_with("MERGE INTO dv.h_customer AS hub"));
    assert!(groups[1][2].starts_with("MERGE INTO dv.h_order AS target"));
    assert!(groups[2][0].starts_with("MERGE INTO dv.l_order_customer AS target"));
    assert!(groups[2][1].starts_with("MERGE INTO dv.l_order_customer_role_playing AS target"));
    assert!(groups[3][0].starts_with("MERGE INTO dv.hs_customer AS satellite"));
    assert!(groups[3][1].starts_with("MERGE INTO dv.ls_order_customer_eff AS satellite"));
    assert!(groups[3][2].starts_with("MERGE INTO dv.ls_order_customer_role_playing_eff AS satellite"));
}

#[test]
fn the_flat_script_preserves_group_order() {
    let load = full_load();
    let script = load.sql_load_script().unwrap();
    assert_eq!(script.len(), 9);
    let flattened: Vec<String> = load
        .sql_load_scripts_by_group()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(script, flattened);
}

#[test]
fn a_model_without_role_playing_tables_loads_too() {
    let load = load_of(vec![
        customer_hub().into(),
        order_hub().into(),
        order_customer_link().into(),
        customer_satellite().into(),
        order_customer_eff_satellite().into(),
    ]);
    let groups = load.sql_load_scripts_by_group().unwrap();
    assert_eq!(
        groups.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![1, 2, 1, 2]
    );
}

#[test]
fn a_role_playing_hub_needs_its_parent_in_the_load() {
    let err = DataVaultLoad::new(
        EXTRACT_SCHEMA,
        EXTRACT_TABLE,
        STAGING_SCHEMA,
        STAGING_TABLE,
        extract_start_timestamp(),
        vec![role_playing_customer_hub().into()],
        Conventions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "h_customer_role_playing: parent table 'h_customer' missing in target tables"
    );
}

#[test]
fn an_effectivity_satellite_parent_must_be_a_link() {
    let tables: Vec<Table> = vec![
        customer_hub().into(),
        misparented_eff_satellite().into(),
    ];
    let err = DataVaultLoad::new(
        EXTRACT_SCHEMA,
        EXTRACT_TABLE,
        STAGING_SCHEMA,
        STAGING_TABLE,
        extract_start_timestamp(),
        tables,
        Conventions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "ls_customer_eff: parent table 'h_customer' should be a link"
    );
}
