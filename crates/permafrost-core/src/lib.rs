//! # permafrost-core
//!
//! A Data Vault 2.0 model builder and Snowflake SQL generator.
//!
//! This crate provides:
//! - Model types for hubs, links, satellites, effectivity satellites and
//!   role playing hubs, validated on construction
//! - A staging table generator computing hashkeys, hashdiffs and metadata
//!   once, in staging
//! - Idempotent MERGE statements for every table kind, grouped so each
//!   group can run concurrently
//! - A deserializer turning column metadata into a validated model
//!
//! ## Generating a load script
//!
//! Tables are built field by field and handed to a [`DataVaultLoad`],
//! which resolves their relationships and renders the SQL for one
//! extraction batch:
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use permafrost_core::{Conventions, DataVaultLoad, Field, FieldDataType, Hub};
//!
//! let conventions = Conventions::default();
//! let hub = Hub::new(
//!     "dv",
//!     "h_customer",
//!     vec![
//!         Field::new("h_customer", "h_customer_hashkey", FieldDataType::Text, 1, true)
//!             .with_length(32),
//!         Field::new("h_customer", "r_timestamp", FieldDataType::TimestampNtz, 2, true),
//!         Field::new("h_customer", "r_source", FieldDataType::Text, 3, true),
//!         Field::new("h_customer", "customer_id", FieldDataType::Text, 4, true),
//!     ],
//!     &conventions,
//! )
//! .unwrap();
//!
//! let load = DataVaultLoad::new(
//!     "dv_extract",
//!     "extract_orders",
//!     "dv_stg",
//!     "orders",
//!     Utc.with_ymd_and_hms(2019, 8, 6, 0, 0, 0).unwrap(),
//!     vec![hub.into()],
//!     conventions,
//! )
//! .unwrap()
//! .with_source("crm");
//!
//! // One staging statement, then one merge per target table.
//! assert_eq!(load.sql_load_script().unwrap().len(), 2);
//! ```
//!
//! ## Deserializing a model
//!
//! Models are usually declared as column metadata, the shape an
//! information schema already has:
//!
//! ```rust
//! use permafrost_core::{ColumnMetadata, ModelDeserializer, Table};
//!
//! let columns: Vec<ColumnMetadata> = serde_json::from_str(
//!     r#"[
//!       {"table_name": "h_order", "column_name": "h_order_hashkey",
//!        "data_type": "TEXT", "length": 32, "nullable": false},
//!       {"table_name": "h_order", "column_name": "r_timestamp",
//!        "data_type": "TIMESTAMP_NTZ", "nullable": false},
//!       {"table_name": "h_order", "column_name": "r_source",
//!        "data_type": "TEXT", "nullable": false},
//!       {"table_name": "h_order", "column_name": "order_id",
//!        "data_type": "TEXT", "nullable": false}
//!     ]"#,
//! )
//! .unwrap();
//!
//! let tables = ModelDeserializer::new("dv", vec!["h_order".to_string()], columns)
//!     .deserialize()
//!     .unwrap();
//! assert!(matches!(tables[0], Table::Hub(_)));
//! ```

pub mod conventions;
pub mod deserialize;
pub mod driving_key;
pub mod error;
pub mod field;
pub mod load;
pub mod role;
pub mod staging;
pub mod table;

mod template;

pub use conventions::{Conventions, TableKind};
pub use deserialize::{ColumnMetadata, ModelDeserializer};
pub use driving_key::DrivingKeyField;
pub use error::{ModelError, Result};
pub use field::{Field, FieldDataType};
pub use load::DataVaultLoad;
pub use role::{derive_role, FieldRole};
pub use staging::StagingTable;
pub use table::{
    EffectivitySatellite, Hub, Link, RolePlayingHub, Satellite, Table, TableCore,
};
