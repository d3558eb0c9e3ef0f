//! Roster files
//!
//! The console loads the group to lift from a small TOML file:
//!
//! ```toml
//! [group]
//! name = "M73-A"
//!
//! [[athletes]]
//! name = "Alex Martin"
//! team = "CAN"
//! lot_number = 12
//! category = "M73"
//! body_weight = 72.4
//! snatch = [110]
//! clean_jerk = [135]
//! ```
//!
//! `snatch` and `clean_jerk` list the declared weights of up to three
//! attempts each.

use std::collections::HashSet;
use std::path::Path;

use libfop::error::ConfigError;
use libfop::types::{Athlete, Group, ATTEMPTS_PER_LIFT};
use libfop::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RosterFile {
    group: Option<GroupEntry>,
    #[serde(default)]
    athletes: Vec<AthleteEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    name: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AthleteEntry {
    name: String,
    team: Option<String>,
    lot_number: u32,
    category: Option<String>,
    body_weight: Option<f32>,
    #[serde(default)]
    snatch: Vec<u32>,
    #[serde(default)]
    clean_jerk: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub group: Option<Group>,
    pub athletes: Vec<Athlete>,
}

impl Roster {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: RosterFile = toml::from_str(content).map_err(ConfigError::ParseError)?;

        let mut lots = HashSet::new();
        let mut athletes = Vec::with_capacity(file.athletes.len());
        for entry in file.athletes {
            if !lots.insert(entry.lot_number) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate lot number {} in roster",
                    entry.lot_number
                ))
                .into());
            }
            athletes.push(entry.into_athlete()?);
        }

        Ok(Self {
            group: file.group.map(|g| Group {
                name: g.name,
                description: g.description,
            }),
            athletes,
        })
    }
}

impl AthleteEntry {
    fn into_athlete(self) -> Result<Athlete> {
        if self.snatch.len() > ATTEMPTS_PER_LIFT || self.clean_jerk.len() > ATTEMPTS_PER_LIFT {
            return Err(ConfigError::Invalid(format!(
                "{}: at most {} declared weights per lift",
                self.name, ATTEMPTS_PER_LIFT
            ))
            .into());
        }

        let mut athlete = Athlete::new(self.name, self.lot_number);
        athlete.team = self.team;
        athlete.category = self.category;
        athlete.body_weight = self.body_weight;
        for (slot, weight) in athlete.snatch.iter_mut().zip(self.snatch) {
            slot.requested = Some(weight);
        }
        for (slot, weight) in athlete.clean_jerk.iter_mut().zip(self.clean_jerk) {
            slot.requested = Some(weight);
        }
        Ok(athlete)
    }
}
