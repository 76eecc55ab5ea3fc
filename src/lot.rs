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

//! Fixed-size parking lot.
//!
//! # Example
//!
//! ```
//! use easypark_rs::{ParkingLot, SpotId, Username, Vehicle, VehicleClass};
//!
//! let mut lot = ParkingLot::new(2);
//! let vehicle = Vehicle::new(VehicleClass::Car, "ABC-123");
//! lot.occupy(&SpotId::from("A1"), vehicle, 2, Username::from("alice")).unwrap();
//!
//! assert_eq!(lot.available_spots().count(), 1);
//! assert_eq!(lot.occupied_spots().next().unwrap().id(), &SpotId::from("A1"));
//! ```

use crate::base::{SpotId, Username};
use crate::spot::{Occupancy, ParkingSpot, Session};
use crate::vehicle::Vehicle;
use crate::ParkingError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Ordered collection of spots, sized once at construction.
///
/// # Invariants
///
/// - Spot `i` has id `A{i+1}`; ids are never reused and the lot never resizes.
/// - A spot holds at most one session; `occupy` never overwrites.
///
/// The lot performs no balance or authorization checks. Those belong to
/// [`Billing`](crate::Billing).
#[derive(Debug, Clone)]
pub struct ParkingLot {
    spots: Vec<ParkingSpot>,
    /// Spot id to position in `spots`.
    index: HashMap<SpotId, usize>,
}

impl ParkingLot {
    pub const DEFAULT_SIZE: usize = 10;

    pub fn new(size: usize) -> Self {
        let spots: Vec<ParkingSpot> = (0..size)
            .map(|i| ParkingSpot::new(SpotId::from_index(i)))
            .collect();
        let index = spots
            .iter()
            .enumerate()
            .map(|(i, spot)| (spot.id().clone(), i))
            .collect();
        Self { spots, index }
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Every spot, in construction order.
    pub fn spots(&self) -> impl Iterator<Item = &ParkingSpot> {
        self.spots.iter()
    }

    /// Free spots, in construction order.
    pub fn available_spots(&self) -> impl Iterator<Item = &ParkingSpot> {
        self.spots.iter().filter(|spot| spot.is_free())
    }

    /// Occupied spots, in construction order.
    pub fn occupied_spots(&self) -> impl Iterator<Item = &ParkingSpot> {
        self.spots.iter().filter(|spot| !spot.is_free())
    }

    /// Looks up a spot by id.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SpotNotFound`] if the id is not part of the lot.
    pub fn spot(&self, spot_id: &SpotId) -> Result<&ParkingSpot, ParkingError> {
        self.index
            .get(spot_id)
            .and_then(|&i| self.spots.get(i))
            .ok_or(ParkingError::SpotNotFound)
    }

    fn spot_mut(&mut self, spot_id: &SpotId) -> Result<&mut ParkingSpot, ParkingError> {
        let i = *self.index.get(spot_id).ok_or(ParkingError::SpotNotFound)?;
        self.spots.get_mut(i).ok_or(ParkingError::SpotNotFound)
    }

    /// Starts a session on a free spot, timestamped with the current time.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::SpotNotFound`] - Unknown spot id.
    /// - [`ParkingError::SpotAlreadyOccupied`] - The spot already holds a vehicle.
    pub fn occupy(
        &mut self,
        spot_id: &SpotId,
        vehicle: Vehicle,
        planned_hours: u32,
        occupant: Username,
    ) -> Result<(), ParkingError> {
        self.occupy_at(spot_id, vehicle, planned_hours, occupant, Utc::now())
    }

    /// Same as [`occupy`](Self::occupy) with an explicit start time.
    pub fn occupy_at(
        &mut self,
        spot_id: &SpotId,
        vehicle: Vehicle,
        planned_hours: u32,
        occupant: Username,
        started_at: DateTime<Utc>,
    ) -> Result<(), ParkingError> {
        let spot = self.spot_mut(spot_id)?;
        if !spot.is_free() {
            return Err(ParkingError::SpotAlreadyOccupied);
        }
        spot.set_occupancy(Occupancy::Occupied(Session {
            vehicle,
            occupant,
            started_at,
            planned_hours,
        }));
        Ok(())
    }

    /// Ends the session on a spot, discarding its vehicle and session data.
    ///
    /// Returns the session that was closed.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::SpotNotFound`] - Unknown spot id.
    /// - [`ParkingError::SpotNotOccupied`] - The spot is already free.
    pub fn vacate(&mut self, spot_id: &SpotId) -> Result<Session, ParkingError> {
        let spot = self.spot_mut(spot_id)?;
        spot.take_session().ok_or(ParkingError::SpotNotOccupied)
    }

    /// Flips the watch flag on a spot, free or occupied. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SpotNotFound`] if the id is not part of the lot.
    pub fn toggle_watch(&mut self, spot_id: &SpotId) -> Result<bool, ParkingError> {
        Ok(self.spot_mut(spot_id)?.toggle_watch())
    }
}

impl Default for ParkingLot {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}
