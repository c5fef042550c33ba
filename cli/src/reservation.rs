//! WWPN reservation and vHBA assignment for server profiles.
//!
//! For each input record:
//!
//! 1. resolve organization, server profile, WWPN pool and SAN connectivity
//!    policy by name
//! 2. create one `fcpool.Reservation` per vHBA
//! 3. write both reservations into the profile's `ReservationReferences`
//!    (this replaces whatever list the profile had)
//! 4. re-read the profile's `PolicyBucket`, append the SAN connectivity policy
//!    and write the whole bucket back
//!
//! Nothing here is transactional. If a later step fails, reservations created
//! by step 2 stay behind; [`ReserveError`] lists their Moids so they can be
//! released by hand. Two writers updating the same profile's `PolicyBucket`
//! concurrently can lose an entry.

use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::client::{ClientError, IntersightClient, Query};
use crate::config::ServerRecord;
use crate::model::{
    MoRef, NamedObject, ReservationReference, ReservationRequest, FC_POOLS, FC_RESERVATIONS,
    ORGANIZATIONS, SAN_CONNECTIVITY_POLICIES, SERVER_PROFILES,
};

/// A vHBA and the WWPN it should get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vhba {
    pub name: String,
    pub wwpn: String,
}

impl ServerRecord {
    /// The record's vHBAs in input order.
    pub fn vhbas(&self) -> [Vhba; 2] {
        [
            Vhba {
                name: self.vhba0_name.clone(),
                wwpn: self.vhba0_wwpn.clone(),
            },
            Vhba {
                name: self.vhba1_name.clone(),
                wwpn: self.vhba1_wwpn.clone(),
            },
        ]
    }
}

/// Step of the pipeline, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    CreateReservation,
    AttachReservations,
    ReadPolicyBucket,
    UpdatePolicyBucket,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolving names",
            Self::CreateReservation => "creating WWPN reservation",
            Self::AttachReservations => "attaching reservations to profile",
            Self::ReadPolicyBucket => "reading profile policy bucket",
            Self::UpdatePolicyBucket => "adding SAN connectivity policy to profile",
        })
    }
}

/// A record failed partway through.
#[derive(Debug, Error)]
#[error("Server Profile {profile}: {stage} failed: {source}{}", orphans(.created_reservations))]
pub struct ReserveError {
    pub profile: String,
    pub stage: Stage,
    /// Reservations created before the failure; nothing released them.
    pub created_reservations: Vec<String>,
    #[source]
    pub source: ClientError,
}

fn orphans(moids: &[String]) -> String {
    if moids.is_empty() {
        String::new()
    } else {
        format!(" (reservations left behind: {})", moids.join(", "))
    }
}

/// Outcome of a successful record.
#[derive(Debug)]
pub struct Assignment {
    pub profile: String,
    pub vhbas: Vec<Vhba>,
    pub reservations: Vec<String>,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Server Profile: {} WWPNs associated successfully!",
            self.profile
        )?;
        for vhba in &self.vhbas {
            writeln!(f, "  {}: {}", vhba.name, vhba.wwpn)?;
        }
        Ok(())
    }
}

/// Resolved Moids for one record.
struct Targets {
    organization: String,
    profile: String,
    pool: String,
    san_policy: String,
}

#[derive(Deserialize)]
struct PolicyBucketView {
    #[serde(rename = "PolicyBucket", default)]
    policy_bucket: Vec<Value>,
}

#[derive(Deserialize)]
struct Created {
    #[serde(rename = "Moid")]
    moid: String,
}

/// `{"ReservationReferences": [...]}` for the given `(vHBA name, reservation
/// Moid)` pairs, in order.
pub fn reservation_references(pairs: &[(&str, &str)]) -> Value {
    let refs: Vec<ReservationReference> = pairs
        .iter()
        .map(|(name, moid)| ReservationReference::vhba(name, moid))
        .collect();
    json!({ "ReservationReferences": refs })
}

/// `{"PolicyBucket": [...]}` with `policy` appended after every existing entry.
pub fn append_policy(mut bucket: Vec<Value>, policy: &MoRef) -> Value {
    bucket.push(json!(policy));
    json!({ "PolicyBucket": bucket })
}

/// Run the whole pipeline for one record.
pub async fn assign(
    client: &IntersightClient,
    record: &ServerRecord,
) -> Result<Assignment, ReserveError> {
    let fail = |stage: Stage, created: &[String]| {
        let profile = record.sp_name.clone();
        let created_reservations = created.to_vec();
        move |source: ClientError| ReserveError {
            profile,
            stage,
            created_reservations,
            source,
        }
    };

    let targets = resolve(client, record)
        .await
        .map_err(fail(Stage::Resolve, &[]))?;
    let base = client.base_url();
    let vhbas = record.vhbas();

    let mut reservations = Vec::with_capacity(vhbas.len());
    for vhba in &vhbas {
        let request = ReservationRequest::wwpn(
            &vhba.wwpn,
            MoRef::organization(base, &targets.organization),
            MoRef::fc_pool(base, &targets.pool),
        );
        let created: Created = client
            .post(FC_RESERVATIONS, &json!(request))
            .await
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| {
                    ClientError::Protocol(format!("Reservation response has no Moid: {e}"))
                })
            })
            .map_err(fail(Stage::CreateReservation, &reservations))?;
        info!(
            "Reserved {} for {}/{} as {}",
            vhba.wwpn, record.sp_name, vhba.name, created.moid
        );
        reservations.push(created.moid);
    }

    let profile_path = format!("{SERVER_PROFILES}/{}", targets.profile);
    let pairs: Vec<(&str, &str)> = vhbas
        .iter()
        .zip(&reservations)
        .map(|(v, moid)| (v.name.as_str(), moid.as_str()))
        .collect();
    client
        .post(&profile_path, &reservation_references(&pairs))
        .await
        .map_err(fail(Stage::AttachReservations, &reservations))?;

    let current: PolicyBucketView = client
        .fetch(&profile_path, &Query::new().select("PolicyBucket"))
        .await
        .map_err(fail(Stage::ReadPolicyBucket, &reservations))?;
    let policy = MoRef::san_connectivity_policy(base, &targets.san_policy);
    client
        .post(&profile_path, &append_policy(current.policy_bucket, &policy))
        .await
        .map_err(fail(Stage::UpdatePolicyBucket, &reservations))?;

    Ok(Assignment {
        profile: record.sp_name.clone(),
        vhbas: vhbas.to_vec(),
        reservations,
    })
}

async fn resolve(client: &IntersightClient, record: &ServerRecord) -> Result<Targets, ClientError> {
    let org: NamedObject = client
        .find_by_name(ORGANIZATIONS, "organization", &record.org_name)
        .await?;
    let profile: NamedObject = client
        .find_by_name(SERVER_PROFILES, "server profile", &record.sp_name)
        .await?;
    let pool: NamedObject = client
        .find_by_name(FC_POOLS, "WWPN pool", &record.fcpool_name)
        .await?;
    let san_policy: NamedObject = client
        .find_by_name(
            SAN_CONNECTIVITY_POLICIES,
            "SAN connectivity policy",
            &record.sanconn_policy_name,
        )
        .await?;
    Ok(Targets {
        organization: org.moid,
        profile: profile.moid,
        pool: pool.moid,
        san_policy: san_policy.moid,
    })
}
