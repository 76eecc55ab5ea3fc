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

//! Hourly rates per vehicle class.

use crate::{ParkingError, VehicleClass};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Maps each vehicle class to its hourly rate in currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    rates: HashMap<VehicleClass, Decimal>,
}

impl RateTable {
    pub const DEFAULT_CAR_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
    pub const DEFAULT_MOTORCYCLE_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

    /// Creates an empty table. Every lookup fails until rates are added.
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Sets (or replaces) the hourly rate for `class`.
    pub fn with_rate(mut self, class: VehicleClass, rate: Decimal) -> Self {
        self.rates.insert(class, rate);
        self
    }

    /// Hourly rate for `class`.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::UnknownVehicleClass`] if the class has no rate.
    pub fn rate(&self, class: VehicleClass) -> Result<Decimal, ParkingError> {
        self.rates
            .get(&class)
            .copied()
            .ok_or(ParkingError::UnknownVehicleClass)
    }
}

impl Default for RateTable {
    /// Car = 5/h, Motorcycle = 3/h.
    fn default() -> Self {
        Self::empty()
            .with_rate(VehicleClass::Car, Self::DEFAULT_CAR_RATE)
            .with_rate(VehicleClass::Motorcycle, Self::DEFAULT_MOTORCYCLE_RATE)
    }
}

impl FromIterator<(VehicleClass, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (VehicleClass, Decimal)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}
