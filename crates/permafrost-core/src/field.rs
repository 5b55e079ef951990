//! Fields and their SQL renderings.
//!
//! A [`Field`] is one column of a Data Vault table. Everything the generator
//! needs from a column is derived here: the staging DDL, the staging name and
//! the expression that feeds the MD5 hash of its table.

use serde::{Deserialize, Serialize};

use crate::conventions::{name_prefix, name_suffix, Conventions};
use crate::error::Result;
use crate::role::{derive_role, FieldRole};

/// Snowflake date format used when hashing date fields.
const DATE_FORMAT: &str = "yyyy-mm-dd";
/// Snowflake time format used when hashing time and timestamp fields.
const TIME_FORMAT: &str = "hh24:mi:ss.ff9";
/// Snowflake timezone format used when hashing timezone aware timestamps.
const TIMEZONE_FORMAT: &str = "tzhtzm";

/// Data types a staged field can carry.
///
/// The variants mirror Snowflake's type names. `FIXED`, the name Snowflake
/// metadata queries report for numeric columns, is accepted as an alias of
/// [`FieldDataType::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldDataType {
    /// Semi-structured array.
    Array,
    /// Boolean.
    Boolean,
    /// Date without time.
    Date,
    /// Geospatial value.
    Geography,
    /// Fixed point number with precision and scale.
    #[serde(alias = "FIXED")]
    Number,
    /// Semi-structured object.
    Object,
    /// Floating point number.
    Real,
    /// Text with optional maximum length.
    Text,
    /// Time without date.
    Time,
    /// Timestamp in the session's local timezone.
    TimestampLtz,
    /// Timestamp without timezone.
    TimestampNtz,
    /// Timestamp with timezone.
    TimestampTz,
    /// Semi-structured value of any type.
    Variant,
}

impl FieldDataType {
    /// Returns the Snowflake spelling of the type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Array => "ARRAY",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Geography => "GEOGRAPHY",
            Self::Number => "NUMBER",
            Self::Object => "OBJECT",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Time => "TIME",
            Self::TimestampLtz => "TIMESTAMP_LTZ",
            Self::TimestampNtz => "TIMESTAMP_NTZ",
            Self::TimestampTz => "TIMESTAMP_TZ",
            Self::Variant => "VARIANT",
        }
    }
}

/// One column of a Data Vault table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Name of the table the field belongs to.
    pub parent_table_name: String,
    /// Column name.
    pub name: String,
    /// Column data type.
    pub data_type: FieldDataType,
    /// One based position within the table definition.
    pub position: u32,
    /// Whether the staged column is declared NOT NULL.
    pub is_mandatory: bool,
    /// Numeric precision, meaningful for [`FieldDataType::Number`] only.
    pub precision: Option<u8>,
    /// Numeric scale, meaningful for [`FieldDataType::Number`] only.
    pub scale: Option<u8>,
    /// Maximum length, meaningful for [`FieldDataType::Text`] only.
    pub length: Option<u32>,
}

impl Field {
    /// Creates a field. Names are lowercased so lookups and comparisons can
    /// stay case sensitive.
    #[must_use]
    pub fn new(
        parent_table_name: impl Into<String>,
        name: impl Into<String>,
        data_type: FieldDataType,
        position: u32,
        is_mandatory: bool,
    ) -> Self {
        Self {
            parent_table_name: parent_table_name.into().to_lowercase(),
            name: name.into().to_lowercase(),
            data_type,
            position,
            is_mandatory,
            precision: None,
            scale: None,
            length: None,
        }
    }

    /// Sets the numeric precision and scale.
    #[must_use]
    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Sets the maximum text length.
    #[must_use]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// First underscore separated token of the field name.
    #[must_use]
    pub fn prefix(&self) -> &str {
        name_prefix(&self.name)
    }

    /// Last underscore separated token of the field name.
    #[must_use]
    pub fn suffix(&self) -> &str {
        name_suffix(&self.name)
    }

    /// Derives the role this field plays within its table.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnassignableRole`](crate::ModelError::UnassignableRole)
    /// when the name matches no naming convention rule.
    pub fn role(&self, conventions: &Conventions) -> Result<FieldRole> {
        derive_role(&self.name, &self.parent_table_name, self.position, conventions)
    }

    /// SQL spelling of the data type, including precision, scale or length
    /// when the type carries them.
    #[must_use]
    pub fn data_type_sql(&self) -> String {
        match self.data_type {
            FieldDataType::Number => match (self.precision, self.scale) {
                (Some(precision), Some(scale)) => format!("NUMBER ({precision}, {scale})"),
                _ => self.data_type.name().to_string(),
            },
            FieldDataType::Text => match self.length {
                Some(length) => format!("TEXT ({length})"),
                None => self.data_type.name().to_string(),
            },
            _ => self.data_type.name().to_string(),
        }
    }

    /// Name the field takes in the staging table.
    ///
    /// Hashdiffs are renamed to `{table}_{hashdiff_suffix}`: every satellite
    /// calls its own hashdiff `s_hashdiff`, which would collide in a staging
    /// table shared by several satellites. All other fields keep their name,
    /// so applying the rename twice changes nothing.
    #[must_use]
    pub fn name_in_staging(&self, role: FieldRole, conventions: &Conventions) -> String {
        if role == FieldRole::Hashdiff {
            conventions.staging_hashdiff_name(&self.parent_table_name)
        } else {
            self.name.clone()
        }
    }

    /// Column definition used in the staging table DDL.
    #[must_use]
    pub fn ddl_in_staging(&self, role: FieldRole, conventions: &Conventions) -> String {
        let not_null = if self.is_mandatory { " NOT NULL" } else { "" };
        format!(
            "{} {}{not_null}",
            self.name_in_staging(role, conventions),
            self.data_type_sql()
        )
    }

    /// Expression this field contributes to a hashkey or hashdiff.
    ///
    /// The value is normalised to text in a type dependent way, then wrapped
    /// in COALESCE so NULLs hash deterministically. Business keys default to
    /// the unknown sentinel, every other role defaults to the empty string so
    /// trailing delimiters can be stripped from hashdiffs.
    #[must_use]
    pub fn hash_concatenation_sql(&self, role: FieldRole, conventions: &Conventions) -> String {
        let cast_expression = if self.data_type == FieldDataType::Geography {
            // TO_GEOGRAPHY is needed to normalise the geography encoding
            // before it is rendered as text.
            format!("TO_GEOGRAPHY({})", self.name)
        } else {
            format!("CAST({} AS {})", self.name, self.data_type_sql())
        };
        let hash_expression = match self.data_type {
            FieldDataType::TimestampLtz | FieldDataType::TimestampTz => {
                format!("TO_CHAR({cast_expression}, '{DATE_FORMAT} {TIME_FORMAT} {TIMEZONE_FORMAT}')")
            }
            FieldDataType::TimestampNtz => {
                format!("TO_CHAR({cast_expression}, '{DATE_FORMAT} {TIME_FORMAT}')")
            }
            FieldDataType::Date => format!("TO_CHAR({cast_expression}, '{DATE_FORMAT}')"),
            FieldDataType::Time => format!("TO_CHAR({cast_expression}, '{TIME_FORMAT}')"),
            FieldDataType::Text => cast_expression,
            FieldDataType::Geography => format!("ST_ASTEXT({cast_expression})"),
            _ => format!("CAST({cast_expression} AS TEXT)"),
        };
        let default_value = if role == FieldRole::BusinessKey {
            conventions.unknown_sentinel.as_str()
        } else {
            ""
        };
        format!("COALESCE({hash_expression}, '{default_value}')")
    }
}
