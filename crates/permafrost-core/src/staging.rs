//! The staging table fed by one extraction batch.

use chrono::{DateTime, Utc};

use crate::conventions::Conventions;

/// Staging table holding one extraction batch.
///
/// The physical name carries the extraction start timestamp so consecutive
/// batches land in distinct tables and a failed load can be replayed without
/// clobbering the previous batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingTable {
    /// Schema the staging table is created in.
    pub schema: String,
    /// Logical name, without the batch suffix.
    pub name: String,
    /// Physical name, `{name}_{batch suffix}`.
    pub physical_name: String,
}

impl StagingTable {
    /// Creates the staging table for the batch starting at the given instant.
    #[must_use]
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        extract_start_timestamp: DateTime<Utc>,
        conventions: &Conventions,
    ) -> Self {
        let name = name.into().to_lowercase();
        let physical_name = format!(
            "{name}_{}",
            extract_start_timestamp.format(&conventions.staging_suffix_format)
        );
        Self {
            schema: schema.into(),
            name,
            physical_name,
        }
    }
}
