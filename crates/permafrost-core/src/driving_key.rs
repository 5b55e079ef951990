//! Driving keys for effectivity satellites.

use serde::{Deserialize, Serialize};

/// One field of the driving key of an effectivity satellite.
///
/// The driving key is the subset of a link's fields that identifies the
/// entity whose single open relationship the satellite tracks. Versions are
/// partitioned by driving key instead of by hashkey, so a new relationship
/// for the same driving key closes the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivingKeyField {
    /// Link that owns the field.
    pub parent_table_name: String,
    /// Field name within the link.
    pub name: String,
    /// Effectivity satellite the driving key is declared for.
    pub satellite_name: String,
}

impl DrivingKeyField {
    /// Creates a driving key field. Names are lowercased like field names.
    #[must_use]
    pub fn new(
        parent_table_name: impl Into<String>,
        name: impl Into<String>,
        satellite_name: impl Into<String>,
    ) -> Self {
        Self {
            parent_table_name: parent_table_name.into().to_lowercase(),
            name: name.into().to_lowercase(),
            satellite_name: satellite_name.into().to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_lowercased() {
        let driving_key =
            DrivingKeyField::new("L_ORDER_CUSTOMER", "H_Customer_Hashkey", "LS_Order_Customer_Eff");
        assert_eq!(driving_key.parent_table_name, "l_order_customer");
        assert_eq!(driving_key.name, "h_customer_hashkey");
        assert_eq!(driving_key.satellite_name, "ls_order_customer_eff");
    }
}
