//! Typed views of the Intersight managed objects these tools touch.
//!
//! Only the fields the tools read or write are modelled. Everything uses
//! Intersight's PascalCase property names on the wire, except `link` on
//! [`MoRef`], which the API spells in lowercase.
//!
//! `PolicyBucket` entries are kept as raw `serde_json::Value`s so that a
//! read-modify-write of the bucket re-sends every existing entry byte-for-byte,
//! including properties this crate doesn't know about.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const SERVER_PROFILES: &str = "/api/v1/server/Profiles";
pub const COMPUTE_BLADES: &str = "/api/v1/compute/Blades";
pub const ORGANIZATIONS: &str = "/api/v1/organization/Organizations";
pub const FC_POOLS: &str = "/api/v1/fcpool/Pools";
pub const FC_RESERVATIONS: &str = "/api/v1/fcpool/Reservations";
pub const SAN_CONNECTIVITY_POLICIES: &str = "/api/v1/vnic/SanConnectivityPolicies";

/// Envelope returned by every collection GET.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    /// `null` when the query matched nothing.
    #[serde(rename = "Results")]
    pub results: Option<Vec<T>>,
}

impl<T> ListResponse<T> {
    pub fn into_results(self) -> Vec<T> {
        self.results.unwrap_or_default()
    }
}

/// Typed pointer to another managed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MoRef {
    #[serde(default)]
    pub class_id: String,
    pub moid: String,
    #[serde(default)]
    pub object_type: String,
    #[serde(rename = "link", default)]
    pub link: String,
}

impl MoRef {
    /// Build a `mo.MoRef` whose `link` points at `{base_url}{collection}/{moid}`.
    pub fn new(base_url: &str, collection: &str, object_type: &str, moid: &str) -> Self {
        Self {
            class_id: "mo.MoRef".to_string(),
            moid: moid.to_string(),
            object_type: object_type.to_string(),
            link: format!("{base_url}{collection}/{moid}"),
        }
    }

    pub fn organization(base_url: &str, moid: &str) -> Self {
        Self::new(base_url, ORGANIZATIONS, "organization.Organization", moid)
    }

    pub fn fc_pool(base_url: &str, moid: &str) -> Self {
        Self::new(base_url, FC_POOLS, "fcpool.Pool", moid)
    }

    pub fn san_connectivity_policy(base_url: &str, moid: &str) -> Self {
        Self::new(
            base_url,
            SAN_CONNECTIVITY_POLICIES,
            "vnic.SanConnectivityPolicy",
            moid,
        )
    }
}

/// Any object looked up by name, where only the identity matters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamedObject {
    pub moid: String,
    #[serde(default)]
    pub name: String,
}

/// `server.Profile`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerProfile {
    #[serde(default)]
    pub moid: String,
    #[serde(default)]
    pub name: String,
    /// Physical server the profile is assigned to, if any.
    #[serde(default)]
    pub assigned_server: Option<MoRef>,
    #[serde(default)]
    pub policy_bucket: Vec<Value>,
}

/// How a blade is managed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ManagementMode {
    /// Intersight Managed Mode.
    Intersight,
    /// Legacy UCS Manager domain.
    Ucsm,
    Other(String),
}

impl From<String> for ManagementMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Intersight" => Self::Intersight,
            "UCSM" => Self::Ucsm,
            _ => Self::Other(value),
        }
    }
}

impl Default for ManagementMode {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

/// `compute.Blade`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Blade {
    pub moid: String,
    /// Sent as a string by Intersight.
    #[serde(default, deserialize_with = "location_id")]
    pub chassis_id: String,
    #[serde(default, deserialize_with = "location_id")]
    pub slot_id: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub management_mode: ManagementMode,
    /// UCSM service profile name; empty string when none is associated.
    #[serde(default)]
    pub service_profile: Option<String>,
}

impl fmt::Display for Blade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chassis_{}/Slot_{}, Serial: {}, Name: {}",
            self.chassis_id, self.slot_id, self.serial, self.name
        )
    }
}

/// Chassis and slot ids only ever get printed, so accept a string or a number.
fn location_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

/// Body of `POST /api/v1/fcpool/Reservations`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReservationRequest {
    pub allocation_type: String,
    pub id_purpose: String,
    pub identity: String,
    pub organization: MoRef,
    pub pool: MoRef,
}

impl ReservationRequest {
    /// Dynamic WWPN reservation of `wwpn` from `pool`.
    pub fn wwpn(wwpn: &str, organization: MoRef, pool: MoRef) -> Self {
        Self {
            allocation_type: "dynamic".to_string(),
            id_purpose: "WWPN".to_string(),
            identity: wwpn.to_string(),
            organization,
            pool,
        }
    }
}

/// Entry of a profile's `ReservationReferences` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReservationReference {
    pub class_id: String,
    pub consumer_name: String,
    pub consumer_type: String,
    pub object_type: String,
    pub reservation_moid: String,
}

impl ReservationReference {
    /// Reference binding a reservation to the named vHBA.
    pub fn vhba(consumer_name: &str, reservation_moid: &str) -> Self {
        Self {
            class_id: "fcpool.ReservationReference".to_string(),
            consumer_name: consumer_name.to_string(),
            consumer_type: "Vhba".to_string(),
            object_type: "fcpool.ReservationReference".to_string(),
            reservation_moid: reservation_moid.to_string(),
        }
    }
}
