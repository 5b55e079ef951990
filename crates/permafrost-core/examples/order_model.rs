//! Order / Customer Data Vault - Load Script Example
//!
//! Builds a small order and customer model in code and prints the load
//! script for one extraction batch:
//! - two hubs and the link connecting them
//! - a satellite carrying the customer's descriptive attributes
//! - an effectivity satellite driven by the customer hashkey
//!
//! Run with: cargo run --example order_model

use chrono::Utc;
use permafrost_core::{
    Conventions, DataVaultLoad, DrivingKeyField, EffectivitySatellite, Field, FieldDataType, Hub,
    Link, Result, Satellite, Table,
};

fn hashkey(table: &str, name: &str, position: u32) -> Field {
    Field::new(table, name, FieldDataType::Text, position, true).with_length(32)
}

fn text(table: &str, name: &str, position: u32) -> Field {
    Field::new(table, name, FieldDataType::Text, position, false)
}

fn metadata(table: &str, position: u32) -> Vec<Field> {
    vec![
        Field::new(
            table,
            "r_timestamp",
            FieldDataType::TimestampNtz,
            position,
            true,
        ),
        Field::new(table, "r_source", FieldDataType::Text, position + 1, true),
    ]
}

fn hub(name: &str, business_key: &str, conventions: &Conventions) -> Result<Hub> {
    let mut fields = vec![
        hashkey(name, &format!("{name}_hashkey"), 1),
        text(name, business_key, 2),
    ];
    fields.extend(metadata(name, 3));
    Hub::new("dv", name, fields, conventions)
}

fn order_customer_link(conventions: &Conventions) -> Result<Link> {
    let name = "l_order_customer";
    let mut fields = vec![
        hashkey(name, "l_order_customer_hashkey", 1),
        hashkey(name, "h_order_hashkey", 2),
        hashkey(name, "h_customer_hashkey", 3),
        text(name, "order_id", 4),
        text(name, "customer_id", 5),
    ];
    fields.extend(metadata(name, 6));
    Link::new("dv", name, fields, conventions)
}

fn satellite_fields(name: &str, parent_hashkey: &str) -> Vec<Field> {
    let mut fields = vec![
        hashkey(name, parent_hashkey, 1),
        hashkey(name, "s_hashdiff", 2),
    ];
    fields.extend(metadata(name, 3));
    fields.push(Field::new(
        name,
        "r_timestamp_end",
        FieldDataType::TimestampNtz,
        5,
        true,
    ));
    fields
}

fn customer_satellite(conventions: &Conventions) -> Result<Satellite> {
    let name = "hs_customer";
    let mut fields = satellite_fields(name, "h_customer_hashkey");
    fields.push(text(name, "customer_name", 6));
    fields.push(text(name, "customer_country", 7));
    Satellite::new("dv", name, fields, conventions)
}

fn effectivity_satellite(conventions: &Conventions) -> Result<EffectivitySatellite> {
    let name = "ls_order_customer_eff";
    let mut fields = satellite_fields(name, "l_order_customer_hashkey");
    fields.push(text(name, "dummy_descriptive_field", 6));
    EffectivitySatellite::new(
        "dv",
        name,
        fields,
        vec![DrivingKeyField::new(
            "l_order_customer",
            "h_customer_hashkey",
            name,
        )],
        conventions,
    )
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let conventions = Conventions::default();
    let tables: Vec<Table> = vec![
        hub("h_customer", "customer_id", &conventions)?.into(),
        hub("h_order", "order_id", &conventions)?.into(),
        order_customer_link(&conventions)?.into(),
        customer_satellite(&conventions)?.into(),
        effectivity_satellite(&conventions)?.into(),
    ];
    let load = DataVaultLoad::new(
        "dv_extract",
        "extract_orders",
        "dv_stg",
        "orders",
        Utc::now(),
        tables,
        conventions,
    )?
    .with_source("order_api");

    let group_names = ["staging", "hubs", "links", "satellites"];
    for (group, name) in load.sql_load_scripts_by_group()?.iter().zip(group_names) {
        println!("-- {name}");
        for statement in group {
            println!("{statement};");
            println!();
        }
    }
    Ok(())
}
