#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use permafrost_core::{
    Conventions, DataVaultLoad, DrivingKeyField, EffectivitySatellite, Field, FieldDataType, Hub,
    Link, RolePlayingHub, Satellite, StagingTable, Table,
};

pub const TARGET_SCHEMA: &str = "dv";
pub const EXTRACT_SCHEMA: &str = "dv_extract";
pub const EXTRACT_TABLE: &str = "extract_orders";
pub const STAGING_SCHEMA: &str = "dv_stg";
pub const STAGING_TABLE: &str = "orders";

pub fn extract_start_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 8, 6, 0, 0, 0).unwrap()
}

/// Staging table every fixture load writes to: `dv_stg.orders_20190806_000000`.
pub fn staging_table() -> StagingTable {
    StagingTable::new(
        STAGING_SCHEMA,
        STAGING_TABLE,
        extract_start_timestamp(),
        &Conventions::default(),
    )
}

fn hashkey(table: &str, name: &str, position: u32) -> Field {
    Field::new(table, name, FieldDataType::Text, position, true).with_length(32)
}

fn mandatory_text(table: &str, name: &str, position: u32) -> Field {
    Field::new(table, name, FieldDataType::Text, position, true)
}

fn metadata(table: &str, first_position: u32) -> Vec<Field> {
    vec![
        Field::new(table, "r_timestamp", FieldDataType::TimestampNtz, first_position, true),
        mandatory_text(table, "r_source", first_position + 1),
    ]
}

pub fn customer_hub() -> Hub {
    let mut fields = vec![hashkey("h_customer", "h_customer_hashkey", 1)];
    fields.extend(metadata("h_customer", 2));
    fields.push(mandatory_text("h_customer", "customer_id", 4));
    Hub::new(TARGET_SCHEMA, "h_customer", fields, &Conventions::default())
        .unwrap_or_else(|e| panic!("h_customer should build: {e}"))
}

pub fn order_hub() -> Hub {
    let mut fields = vec![hashkey("h_order", "h_order_hashkey", 1)];
    fields.extend(metadata("h_order", 2));
    fields.push(mandatory_text("h_order", "order_id", 4));
    Hub::new(TARGET_SCHEMA, "h_order", fields, &Conventions::default())
        .unwrap_or_else(|e| panic!("h_order should build: {e}"))
}

pub fn role_playing_customer_hub() -> RolePlayingHub {
    let mut fields = vec![hashkey(
        "h_customer_role_playing",
        "h_customer_role_playing_hashkey",
        1,
    )];
    fields.extend(metadata("h_customer_role_playing", 2));
    fields.push(mandatory_text(
        "h_customer_role_playing",
        "customer_role_playing_id",
        4,
    ));
    RolePlayingHub::new(
        TARGET_SCHEMA,
        "h_customer_role_playing",
        fields,
        "h_customer",
        &Conventions::default(),
    )
    .unwrap_or_else(|e| panic!("h_customer_role_playing should build: {e}"))
}

pub fn order_customer_link() -> Link {
    let table = "l_order_customer";
    let mut fields = vec![
        hashkey(table, "l_order_customer_hashkey", 1),
        hashkey(table, "h_order_hashkey", 2),
        hashkey(table, "h_customer_hashkey", 3),
        mandatory_text(table, "order_id", 4),
        mandatory_text(table, "customer_id", 5),
        mandatory_text(table, "ck_test_string", 6),
        Field::new(table, "ck_test_timestamp", FieldDataType::TimestampNtz, 7, true),
    ];
    fields.extend(metadata(table, 8));
    Link::new(TARGET_SCHEMA, table, fields, &Conventions::default())
        .unwrap_or_else(|e| panic!("l_order_customer should build: {e}"))
}

pub fn role_playing_order_customer_link() -> Link {
    let table = "l_order_customer_role_playing";
    let mut fields = vec![
        hashkey(table, "l_order_customer_role_playing_hashkey", 1),
        hashkey(table, "h_order_hashkey", 2),
        hashkey(table, "h_customer_role_playing_hashkey", 3),
        mandatory_text(table, "order_id", 4),
        mandatory_text(table, "customer_role_playing_id", 5),
        mandatory_text(table, "ck_test_string", 6),
        Field::new(table, "ck_test_timestamp", FieldDataType::TimestampNtz, 7, true),
    ];
    fields.extend(metadata(table, 8));
    Link::new(TARGET_SCHEMA, table, fields, &Conventions::default())
        .unwrap_or_else(|e| panic!("l_order_customer_role_playing should build: {e}"))
}

/// Satellite covering every Snowflake data type the generator handles.
pub fn customer_satellite() -> Satellite {
    let table = "hs_customer";
    let fields = vec![
        hashkey(table, "h_customer_hashkey", 1),
        hashkey(table, "s_hashdiff", 2),
        Field::new(table, "r_timestamp", FieldDataType::TimestampNtz, 3, true),
        Field::new(table, "r_timestamp_end", FieldDataType::TimestampNtz, 4, true),
        mandatory_text(table, "r_source", 5),
        Field::new(table, "test_string", FieldDataType::Text, 6, false),
        Field::new(table, "test_date", FieldDataType::Date, 7, false),
        Field::new(table, "test_timestamp_ntz", FieldDataType::TimestampNtz, 8, false),
        Field::new(table, "test_integer", FieldDataType::Number, 9, false)
            .with_precision(38, 0),
        Field::new(table, "test_decimal", FieldDataType::Number, 10, false)
            .with_precision(18, 8),
        Field::new(table, "x_customer_id", FieldDataType::Text, 11, false),
        Field::new(table, "grouping_key", FieldDataType::Text, 12, false),
        Field::new(table, "test_geography", FieldDataType::Geography, 13, false),
        Field::new(table, "test_array", FieldDataType::Array, 14, false),
        Field::new(table, "test_object", FieldDataType::Object, 15, false),
        Field::new(table, "test_variant", FieldDataType::Variant, 16, false),
        Field::new(table, "test_timestamp_tz", FieldDataType::TimestampTz, 17, false),
        Field::new(table, "test_timestamp_ltz", FieldDataType::TimestampLtz, 18, false),
        Field::new(table, "test_time", FieldDataType::Time, 19, false),
        Field::new(table, "test_boolean", FieldDataType::Boolean, 20, false),
        Field::new(table, "test_real", FieldDataType::Real, 21, false),
    ];
    Satellite::new(TARGET_SCHEMA, table, fields, &Conventions::default())
        .unwrap_or_else(|e| panic!("hs_customer should build: {e}"))
}

fn effectivity_fields(table: &str, link_hashkey: &str) -> Vec<Field> {
    vec![
        hashkey(table, link_hashkey, 1),
        hashkey(table, "s_hashdiff", 2),
        Field::new(table, "r_timestamp", FieldDataType::TimestampNtz, 3, true),
        Field::new(table, "r_timestamp_end", FieldDataType::TimestampNtz, 4, true),
        mandatory_text(table, "r_source", 5),
        Field::new(table, "dummy_descriptive_field", FieldDataType::Text, 6, true),
    ]
}

pub fn order_customer_eff_satellite() -> EffectivitySatellite {
    let table = "ls_order_customer_eff";
    EffectivitySatellite::new(
        TARGET_SCHEMA,
        table,
        effectivity_fields(table, "l_order_customer_hashkey"),
        vec![DrivingKeyField::new(
            "l_order_customer",
            "h_customer_hashkey",
            table,
        )],
        &Conventions::default(),
    )
    .unwrap_or_else(|e| panic!("ls_order_customer_eff should build: {e}"))
}

pub fn role_playing_eff_satellite() -> EffectivitySatellite {
    let table = "ls_order_customer_role_playing_eff";
    EffectivitySatellite::new(
        TARGET_SCHEMA,
        table,
        effectivity_fields(table, "l_order_customer_role_playing_hashkey"),
        vec![DrivingKeyField::new(
            "l_order_customer_role_playing",
            "h_customer_role_playing_hashkey",
            table,
        )],
        &Conventions::default(),
    )
    .unwrap_or_else(|e| panic!("ls_order_customer_role_playing_eff should build: {e}"))
}

/// An effectivity satellite whose hashkey points at a hub instead of a link.
pub fn misparented_eff_satellite() -> EffectivitySatellite {
    let table = "ls_customer_eff";
    EffectivitySatellite::new(
        TARGET_SCHEMA,
        table,
        effectivity_fields(table, "h_customer_hashkey"),
        vec![DrivingKeyField::new(
            "l_order_customer",
            "h_customer_hashkey",
            table,
        )],
        &Conventions::default(),
    )
    .unwrap_or_else(|e| panic!("ls_customer_eff should build: {e}"))
}

/// The eight table model: two hubs, a role playing hub, two links, one
/// satellite and two effectivity satellites.
pub fn full_model() -> Vec<Table> {
    vec![
        customer_hub().into(),
        order_hub().into(),
        role_playing_customer_hub().into(),
        order_customer_link().into(),
        role_playing_order_customer_link().into(),
        customer_satellite().into(),
        order_customer_eff_satellite().into(),
        role_playing_eff_satellite().into(),
    ]
}

pub fn load_of(tables: Vec<Table>) -> DataVaultLoad {
    DataVaultLoad::new(
        EXTRACT_SCHEMA,
        EXTRACT_TABLE,
        STAGING_SCHEMA,
        STAGING_TABLE,
        extract_start_timestamp(),
        tables,
        Conventions::default(),
    )
    .unwrap_or_else(|e| panic!("load should resolve: {e}"))
    .with_source("test")
}

/// Load over the full model.
pub fn full_load() -> DataVaultLoad {
    load_of(full_model())
}
