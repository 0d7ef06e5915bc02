//! CSV hub-layout loader.
//!
//! # CSV format
//!
//! One row per hub.  `slots` and `radius` may be left empty to use the
//! defaults (8 slots, radius 1.5).
//!
//! ```csv
//! faction,x,z,slots,radius
//! Blue,-8,0,8,1.5
//! Red,8,0,,
//! ```
//!
//! Hubs are numbered in file order: the first row is `HubId(0)`.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use hv_core::Vec3;
use hv_hub::{HubSpec, DEFAULT_RADIUS, DEFAULT_SLOTS};

use crate::{SimError, SimResult};

#[derive(Deserialize)]
struct HubRecord {
    faction: String,
    x:       f32,
    z:       f32,
    slots:   Option<usize>,
    radius:  Option<f32>,
}

/// Load hub specs from a CSV file.
pub fn load_hubs_csv(path: &Path) -> SimResult<Vec<HubSpec>> {
    let file = std::fs::File::open(path).map_err(SimError::Io)?;
    load_hubs_reader(file)
}

/// Like [`load_hubs_csv`] but accepts any `Read` source.
pub fn load_hubs_reader<R: Read>(reader: R) -> SimResult<Vec<HubSpec>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut specs = Vec::new();
    for result in csv_reader.deserialize::<HubRecord>() {
        let rec = result?;
        let spec = HubSpec {
            faction: rec.faction,
            center:  Vec3::ground(rec.x, rec.z),
            slots:   rec.slots.unwrap_or(DEFAULT_SLOTS),
            radius:  rec.radius.unwrap_or(DEFAULT_RADIUS),
        };
        spec.validate()?;
        specs.push(spec);
    }
    if specs.is_empty() {
        return Err(SimError::NoHubs);
    }
    Ok(specs)
}
