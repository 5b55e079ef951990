//! Data Vault table kinds.
//!
//! Every kind is a thin wrapper around [`TableCore`], which holds the schema,
//! the name and the role-classified fields. Constructors validate eagerly, so
//! a table value that exists is a table that can be loaded.

mod effectivity_satellite;
mod hub;
mod link;
mod role_playing_hub;
mod satellite;

use tracing::debug;

pub use effectivity_satellite::EffectivitySatellite;
pub use hub::Hub;
pub use link::Link;
pub use role_playing_hub::RolePlayingHub;
pub use satellite::Satellite;

use crate::conventions::Conventions;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::role::FieldRole;
use crate::staging::StagingTable;
use crate::template;

/// Schema, name and classified fields shared by every table kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCore {
    schema: String,
    name: String,
    fields: Vec<Field>,
    roles: Vec<FieldRole>,
}

impl TableCore {
    /// Builds the core, classifying every field and checking the rules all
    /// kinds share: the record source and record start timestamp must exist.
    pub(crate) fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
        conventions: &Conventions,
    ) -> Result<Self> {
        let name = name.into().to_lowercase();
        let mut fields = fields;
        fields.sort_by_key(|field| field.position);
        let roles = fields
            .iter()
            .map(|field| field.role(conventions))
            .collect::<Result<Vec<_>>>()?;
        let core = Self {
            schema: schema.into(),
            name,
            fields,
            roles,
        };
        core.require_field(&conventions.record_start_timestamp)?;
        core.require_field(&conventions.record_source)?;
        Ok(core)
    }

    /// Schema the table lives in.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Table name, lowercased.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields ordered by position.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields paired with their derived roles, in position order.
    pub fn field_roles(&self) -> impl Iterator<Item = (&Field, FieldRole)> {
        self.fields.iter().zip(self.roles.iter().copied())
    }

    /// Fields carrying the given role, in position order.
    pub fn fields_with_role(&self, role: FieldRole) -> impl Iterator<Item = &Field> {
        self.field_roles()
            .filter(move |(_, field_role)| *field_role == role)
            .map(|(field, _)| field)
    }

    /// Looks a field up by name. When a name is defined twice the later
    /// position wins.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().rev().find(|field| field.name == name)
    }

    /// Like [`Self::field_by_name`] but failing when absent.
    pub(crate) fn require_field(&self, name: &str) -> Result<&Field> {
        self.field_by_name(name).ok_or_else(|| ModelError::MissingField {
            table: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Expression computing the table's hashkey in staging.
    ///
    /// Hashes the business keys followed by the child keys, in position
    /// order, joined by the hash delimiter.
    pub(crate) fn hashkey_sql(&self, conventions: &Conventions) -> Result<String> {
        let hashkey = self.require_field(&conventions.hashkey_field_name(&self.name))?;
        let delimiter = template::hash_delimiter_sql(conventions);
        let fragments: Vec<String> = self
            .fields_with_role(FieldRole::BusinessKey)
            .map(|field| field.hash_concatenation_sql(FieldRole::BusinessKey, conventions))
            .chain(
                self.fields_with_role(FieldRole::ChildKey)
                    .map(|field| field.hash_concatenation_sql(FieldRole::ChildKey, conventions)),
            )
            .collect();
        let sql = template::hashkey_sql(&fragments.join(&delimiter), &hashkey.name);
        debug!("hashkey SQL for {}: {sql}", self.name);
        Ok(sql)
    }
}

/// Builds the merge statement placeholders hubs and links share.
pub(crate) fn hub_link_dml(
    core: &TableCore,
    staging_table: &StagingTable,
    conventions: &Conventions,
) -> Result<template::HubLinkDml> {
    let hashkey = core.require_field(&conventions.hashkey_field_name(core.name()))?;
    let source_fields = core
        .field_roles()
        .filter(|(field, role)| {
            *role != FieldRole::Hashkey && field.name != conventions.record_source
        })
        .map(|(field, _)| field.name.clone())
        .collect();
    let target_fields = core.fields().iter().map(|field| field.name.clone()).collect();
    Ok(template::HubLinkDml {
        target_schema: core.schema().to_string(),
        target_table: core.name().to_string(),
        staging_schema: staging_table.schema.clone(),
        staging_table: staging_table.physical_name.clone(),
        source_hashkey_field: hashkey.name.clone(),
        target_hashkey_field: hashkey.name.clone(),
        record_source_field: conventions.record_source.clone(),
        source_fields,
        target_fields,
    })
}

/// A target table of a Data Vault load.
///
/// The set of kinds is closed: the orchestrator dispatches on the variant to
/// generate the kind's load statement, and dependent kinds receive their
/// resolved parent as an argument instead of holding a back-reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    /// One row per business entity.
    Hub(Hub),
    /// One row per relationship between hubs.
    Link(Link),
    /// Historized attributes of a hub or link.
    Satellite(Satellite),
    /// Satellite partitioned by driving keys instead of its hashkey.
    EffectivitySatellite(EffectivitySatellite),
    /// Alias of a hub under another role, loaded into its parent.
    RolePlayingHub(RolePlayingHub),
}

impl Table {
    /// The core shared by every kind.
    #[must_use]
    pub fn core(&self) -> &TableCore {
        match self {
            Self::Hub(hub) => hub.core(),
            Self::Link(link) => link.core(),
            Self::Satellite(satellite) => satellite.core(),
            Self::EffectivitySatellite(satellite) => satellite.core(),
            Self::RolePlayingHub(hub) => hub.core(),
        }
    }

    /// Table name, lowercased.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core().name()
    }

    /// Position of the kind in the load order: hubs before links before
    /// satellites, so foreign hashkeys always resolve.
    #[must_use]
    pub fn loading_order(&self) -> u8 {
        match self {
            Self::Hub(_) | Self::RolePlayingHub(_) => 1,
            Self::Link(_) => 2,
            Self::Satellite(_) | Self::EffectivitySatellite(_) => 3,
        }
    }
}

impl From<Hub> for Table {
    fn from(hub: Hub) -> Self {
        Self::Hub(hub)
    }
}

impl From<Link> for Table {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

impl From<Satellite> for Table {
    fn from(satellite: Satellite) -> Self {
        Self::Satellite(satellite)
    }
}

impl From<EffectivitySatellite> for Table {
    fn from(satellite: EffectivitySatellite) -> Self {
        Self::EffectivitySatellite(satellite)
    }
}

impl From<RolePlayingHub> for Table {
    fn from(hub: RolePlayingHub) -> Self {
        Self::RolePlayingHub(hub)
    }
}
