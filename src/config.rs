// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Engine configuration.
//!
//! Layers, lowest first: built-in defaults, a TOML file, then `EASYPARK_*`
//! environment variables (`EASYPARK_SPOTS=20`, `EASYPARK_RATES__CAR=6.5`).
//!
//! ```toml
//! database = "parking_system.db"
//! spots = 10
//!
//! [rates]
//! car = 5
//! motorcycle = 3
//! ```

use crate::lot::ParkingLot;
use crate::rate::RateTable;
use crate::store::DEFAULT_DB_NAME;
use crate::vehicle::VehicleClass;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration filename.
pub const DEFAULT_CONFIG_NAME: &str = "easypark.toml";

const ENV_PREFIX: &str = "EASYPARK_";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// SQLite database holding the `users` table.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Number of spots in the lot.
    #[serde(default = "default_spots")]
    pub spots: usize,

    /// Hourly rate by vehicle class name.
    #[serde(default = "default_rates")]
    pub rates: BTreeMap<String, Decimal>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            spots: default_spots(),
            rates: default_rates(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DB_NAME)
}

fn default_spots() -> usize {
    ParkingLot::DEFAULT_SIZE
}

fn default_rates() -> BTreeMap<String, Decimal> {
    BTreeMap::from([
        (VehicleClass::Car.to_string(), RateTable::DEFAULT_CAR_RATE),
        (VehicleClass::Motorcycle.to_string(), RateTable::DEFAULT_MOTORCYCLE_RATE),
    ])
}

impl Config {
    /// Loads configuration from `path` (if it exists) and the environment.
    ///
    /// Falls back to defaults on any parse error, after logging it.
    pub fn load(path: &Path) -> Self {
        let figment = Figment::from(Serialized::defaults(Config::default()));

        let figment = if path.exists() {
            figment.merge(Toml::file(path))
        } else {
            figment
        };
        let figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        match figment.extract() {
            Ok(config) => {
                if path.exists() {
                    tracing::info!("Loaded config from {:?}", path);
                }
                config
            }
            Err(e) => {
                tracing::warn!("Config error: {}", e);
                Self::default()
            }
        }
    }

    /// Rate table built from `rates`.
    ///
    /// Unknown class names and negative rates are skipped with a warning.
    pub fn rate_table(&self) -> RateTable {
        self.rates
            .iter()
            .filter_map(|(name, &rate)| {
                let class = match name.parse::<VehicleClass>() {
                    Ok(class) => class,
                    Err(_) => {
                        tracing::warn!("Ignoring rate for unknown vehicle class '{}'", name);
                        return None;
                    }
                };
                if rate < Decimal::ZERO {
                    tracing::warn!("Ignoring negative rate {} for '{}'", rate, name);
                    return None;
                }
                Some((class, rate))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.spots, 10);
        assert_eq!(config.database, PathBuf::from("parking_system.db"));
        assert_eq!(config.rate_table(), RateTable::default());
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join(DEFAULT_CONFIG_NAME));
        assert_eq!(config.spots, 10);
    }

    #[test]
    fn test_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_NAME);
        let config_content = r#"
database = "lot.db"
spots = 4

[rates]
car = 6.5
"#;
        std::fs::write(&path, config_content).unwrap();

        let config = Config::load(&path);
        assert_eq!(config.spots, 4);
        assert_eq!(config.database, PathBuf::from("lot.db"));

        let rates = config.rate_table();
        assert_eq!(rates.rate(VehicleClass::Car), Ok(dec!(6.5)));
        // Nested tables merge, so the default motorcycle rate survives.
        assert_eq!(rates.rate(VehicleClass::Motorcycle), Ok(dec!(3)));
    }

    #[test]
    fn rates_keep_exact_decimal_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_NAME);
        std::fs::write(&path, "[rates]\ncar = 0.1\nmotorcycle = \"2.35\"\n").unwrap();

        let config = Config::load(&path);
        assert_eq!(config.rates["car"], dec!(0.1));
        assert_eq!(config.rates["motorcycle"], dec!(2.35));
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_NAME);
        std::fs::write(&path, "spots = \"many\"").unwrap();

        let config = Config::load(&path);
        assert_eq!(config.spots, 10);
    }

    #[test]
    fn unknown_and_negative_rates_are_skipped() {
        let config = Config {
            rates: BTreeMap::from([
                ("car".to_string(), dec!(-1)),
                ("truck".to_string(), dec!(9)),
                ("motorcycle".to_string(), dec!(2)),
            ]),
            ..Config::default()
        };

        let rates = config.rate_table();
        assert!(rates.rate(VehicleClass::Car).is_err());
        assert_eq!(rates.rate(VehicleClass::Motorcycle), Ok(dec!(2)));
    }
}
