//! CSV locomotor loader.
//!
//! # CSV format
//!
//! Two files.  The first has one row per locomotor:
//!
//! ```csv
//! name,shares_cell,crushes,crush_damage_types,wait_average,wait_spread
//! foot,true,,,40,10
//! tracked,false,infantry;wall,crush,40,10
//! ```
//!
//! `crushes` and `crush_damage_types` are `;`-separated class names, interned
//! into the caller's registries.  Empty fields mean "none".
//!
//! The second has one row per (locomotor, terrain) pair:
//!
//! ```csv
//! locomotor,terrain,speed,pathing_cost,transit_only
//! foot,clear,100,,false
//! tracked,clear,100,,false
//! tracked,rough,60,250,false
//! tracked,ramp,80,,true
//! ```
//!
//! `pathing_cost` may be empty (defaulting to `10000 / speed`).  Terrain
//! names are checked later, when the infos are resolved against a map.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use rts_core::{ClassRegistry, CrushClass, DamageType};

use crate::locomotor::{LocomotorInfo, TerrainSpeed};
use crate::{LocomotionError, LocomotionResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LocomotorRecord {
    name:               String,
    shares_cell:        bool,
    #[serde(default)]
    crushes:            String,
    #[serde(default)]
    crush_damage_types: String,
    wait_average:       Option<i32>,
    wait_spread:        Option<i32>,
}

#[derive(Deserialize)]
struct TerrainSpeedRecord {
    locomotor:    String,
    terrain:      String,
    speed:        u32,
    pathing_cost: Option<u32>,
    #[serde(default)]
    transit_only: bool,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load locomotor infos from two CSV files.  See the module docs for the
/// formats.
pub fn load_locomotors_csv(
    locomotors_path: &Path,
    speeds_path: &Path,
    crush_classes: &mut ClassRegistry<CrushClass>,
    damage_types: &mut ClassRegistry<DamageType>,
) -> LocomotionResult<Vec<LocomotorInfo>> {
    let locomotors = std::fs::File::open(locomotors_path)?;
    let speeds = std::fs::File::open(speeds_path)?;
    load_locomotors_reader(locomotors, speeds, crush_classes, damage_types)
}

/// Like [`load_locomotors_csv`] but accepts any `Read` sources.
///
/// Infos are returned in the order of the locomotor file.
pub fn load_locomotors_reader<R1: Read, R2: Read>(
    locomotors: R1,
    speeds: R2,
    crush_classes: &mut ClassRegistry<CrushClass>,
    damage_types: &mut ClassRegistry<DamageType>,
) -> LocomotionResult<Vec<LocomotorInfo>> {
    // ── Locomotor rows ────────────────────────────────────────────────────
    let mut infos: Vec<LocomotorInfo> = Vec::new();
    let mut reader = csv::Reader::from_reader(locomotors);
    for result in reader.deserialize::<LocomotorRecord>() {
        let row = result.map_err(|e| LocomotionError::Parse(e.to_string()))?;
        let name = row.name.trim();
        if infos.iter().any(|i| i.name == name) {
            return Err(LocomotionError::DuplicateLocomotor(name.to_owned()));
        }
        let mut info = LocomotorInfo::new(name)
            .shares_cell(row.shares_cell)
            .crushes(crush_classes.parse_list(&row.crushes)?)
            .crush_damage_types(damage_types.parse_list(&row.crush_damage_types)?);
        if let Some(avg) = row.wait_average {
            info.wait_average = avg;
        }
        if let Some(spread) = row.wait_spread {
            info.wait_spread = spread;
        }
        infos.push(info);
    }

    // ── Terrain speed rows ────────────────────────────────────────────────
    let mut reader = csv::Reader::from_reader(speeds);
    for result in reader.deserialize::<TerrainSpeedRecord>() {
        let row = result.map_err(|e| LocomotionError::Parse(e.to_string()))?;
        let locomotor = row.locomotor.trim();
        let info = infos
            .iter_mut()
            .find(|i| i.name == locomotor)
            .ok_or_else(|| LocomotionError::UnknownLocomotor(locomotor.to_owned()))?;
        let terrain = row.terrain.trim().to_owned();
        info.terrain_speeds.retain(|t| t.terrain != terrain);
        info.terrain_speeds.push(TerrainSpeed {
            terrain,
            speed:        row.speed,
            pathing_cost: row.pathing_cost,
            transit_only: row.transit_only,
        });
    }

    Ok(infos)
}
