//! Blade servers with no profile.
//!
//! "No profile" means different things per management mode:
//!
//! - **IMM** (`ManagementMode = Intersight`): no `server.Profile` has the blade
//!   as its `AssignedServer`.
//! - **UCSM**: the blade's own `ServiceProfile` property is the empty string.
//!
//! The two checks are independent; a UCSM blade is never matched against the
//! profile set and an IMM blade's `ServiceProfile` is ignored.

use std::collections::HashSet;
use std::fmt;

use tracing::info;

use crate::client::{ClientError, IntersightClient, Query};
use crate::model::{Blade, ManagementMode, ServerProfile, COMPUTE_BLADES, SERVER_PROFILES};

/// Blades without a profile, split by management mode, in API order.
#[derive(Debug, Default)]
pub struct Availability {
    pub imm: Vec<Blade>,
    pub ucsm: Vec<Blade>,
}

/// Moids of every server some profile is assigned to.
pub fn assigned_servers(profiles: &[ServerProfile]) -> HashSet<&str> {
    profiles
        .iter()
        .filter_map(|p| p.assigned_server.as_ref())
        .map(|s| s.moid.as_str())
        .collect()
}

pub fn unassigned_blades(profiles: &[ServerProfile], blades: &[Blade]) -> Availability {
    let assigned = assigned_servers(profiles);

    let imm = blades
        .iter()
        .filter(|b| b.management_mode == ManagementMode::Intersight)
        .filter(|b| !assigned.contains(b.moid.as_str()))
        .cloned()
        .collect();

    let ucsm = blades
        .iter()
        .filter(|b| b.management_mode == ManagementMode::Ucsm)
        .filter(|b| b.service_profile.as_deref() == Some(""))
        .cloned()
        .collect();

    Availability { imm, ucsm }
}

/// Fetch profiles and blades and compute the report.
pub async fn collect(client: &IntersightClient) -> Result<Availability, ClientError> {
    let profiles: Vec<ServerProfile> = client
        .list_all(SERVER_PROFILES, &Query::new().select("Name,AssignedServer"))
        .await?;
    let blades: Vec<Blade> = client
        .list_all(
            COMPUTE_BLADES,
            &Query::new().select("ChassisId,SlotId,Serial,Name,ManagementMode,ServiceProfile"),
        )
        .await?;
    info!(
        "Fetched {} server profiles and {} blades",
        profiles.len(),
        blades.len()
    );
    Ok(unassigned_blades(&profiles, &blades))
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Servers with No Profiles:")?;
        writeln!(f, "  IMM Blade Servers:")?;
        for blade in &self.imm {
            writeln!(f, "    {blade}")?;
        }
        writeln!(f)?;
        writeln!(f, "  UCSM Blade Servers:")?;
        for blade in &self.ucsm {
            writeln!(f, "    {blade}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{mock_token, settings};
    use httpmock::prelude::*;
    use serde_json::{json, Value};

    fn blade(moid: &str, slot: i64, mode: &str, service_profile: &str) -> Value {
        json!({
            "Moid": moid,
            "ChassisId": "1",
            "SlotId": slot,
            "Serial": format!("FCH{slot}"),
            "Name": format!("blade-{slot}"),
            "ManagementMode": mode,
            "ServiceProfile": service_profile,
        })
    }

    fn profile(assigned: Option<&str>) -> Value {
        match assigned {
            Some(moid) => json!({
                "Moid": format!("sp-{moid}"),
                "Name": format!("sp-{moid}"),
                "AssignedServer": {"ClassId": "mo.MoRef", "Moid": moid, "ObjectType": "compute.Blade"},
            }),
            None => json!({"Moid": "sp-free", "Name": "sp-free", "AssignedServer": null}),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(v: Value) -> Vec<T> {
        serde_json::from_value(v).unwrap()
    }

    fn moids(blades: &[Blade]) -> Vec<&str> {
        blades.iter().map(|b| b.moid.as_str()).collect()
    }

    #[test]
    fn imm_blades_use_profile_set() {
        let profiles: Vec<ServerProfile> =
            decode(json!([profile(Some("b1")), profile(None), profile(Some("b9"))]));
        let blades: Vec<Blade> = decode(json!([
            blade("b1", 1, "Intersight", ""),
            blade("b2", 2, "Intersight", ""),
            blade("b3", 3, "Intersight", "leftover-name"),
        ]));
        let report = unassigned_blades(&profiles, &blades);
        assert_eq!(moids(&report.imm), ["b2", "b3"]);
        assert!(report.ucsm.is_empty());
    }

    #[test]
    fn ucsm_blades_use_service_profile_field() {
        // b4 is not in the profile set but has a UCSM service profile,
        // b5 is in the profile set but has none: only b5 is reported.
        let profiles: Vec<ServerProfile> = decode(json!([profile(Some("b5"))]));
        let blades: Vec<Blade> = decode(json!([
            blade("b4", 4, "UCSM", "org-root/ls-web"),
            blade("b5", 5, "UCSM", ""),
        ]));
        let report = unassigned_blades(&profiles, &blades);
        assert!(report.imm.is_empty());
        assert_eq!(moids(&report.ucsm), ["b5"]);
    }

    #[test]
    fn other_modes_are_never_reported() {
        let blades: Vec<Blade> = decode(json!([blade("b6", 6, "IntersightStandalone", "")]));
        let report = unassigned_blades(&[], &blades);
        assert!(report.imm.is_empty());
        assert!(report.ucsm.is_empty());
    }

    #[test]
    fn report_layout() {
        let blades: Vec<Blade> = decode(json!([
            blade("b1", 1, "Intersight", ""),
            blade("b2", 2, "UCSM", ""),
        ]));
        let report = unassigned_blades(&[], &blades).to_string();
        assert_eq!(
            report,
            "\nServers with No Profiles:\n  IMM Blade Servers:\n    \
             Chassis_1/Slot_1, Serial: FCH1, Name: blade-1\n\n  UCSM Blade Servers:\n    \
             Chassis_1/Slot_2, Serial: FCH2, Name: blade-2\n"
        );
    }

    #[tokio::test]
    async fn collect_from_api() {
        let server = MockServer::start_async().await;
        mock_token(&server, "tok").await;
        let profiles = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(SERVER_PROFILES)
                    .query_param("$select", "Name,AssignedServer");
                then.status(200)
                    .json_body(json!({"Results": [profile(Some("b1"))]}));
            })
            .await;
        let blades = server
            .mock_async(|when, then| {
                when.method(GET).path(COMPUTE_BLADES);
                then.status(200).json_body(json!({"Results": [
                    blade("b1", 1, "Intersight", ""),
                    blade("b2", 2, "Intersight", ""),
                    blade("b3", 3, "UCSM", ""),
                ]}));
            })
            .await;

        let client = IntersightClient::connect(settings(server.base_url()))
            .await
            .unwrap();
        let report = collect(&client).await.unwrap();
        assert_eq!(moids(&report.imm), ["b2"]);
        assert_eq!(moids(&report.ucsm), ["b3"]);
        profiles.assert_async().await;
        blades.assert_async().await;
    }
}
