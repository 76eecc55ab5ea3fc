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

//! Parking spots and the sessions they hold.
//!
//! A spot is a two-state machine:
//!
//! ```text
//!  Free ──occupy──► Occupied(Session) ──vacate──► Free
//! ```
//!
//! The watch flag is independent of occupancy and survives `vacate`.

use crate::base::{SpotId, Username};
use crate::vehicle::Vehicle;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One vehicle in one spot for one user, from occupy until vacate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub vehicle: Vehicle,
    pub occupant: Username,
    pub started_at: DateTime<Utc>,
    /// Advisory only. Exit fees use the actual elapsed time.
    pub planned_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Occupancy {
    Free,
    Occupied(Session),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParkingSpot {
    id: SpotId,
    occupancy: Occupancy,
    watched: bool,
}

impl ParkingSpot {
    pub fn new(id: SpotId) -> Self {
        Self {
            id,
            occupancy: Occupancy::Free,
            watched: false,
        }
    }

    pub fn id(&self) -> &SpotId {
        &self.id
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn is_free(&self) -> bool {
        matches!(self.occupancy, Occupancy::Free)
    }

    pub fn is_watched(&self) -> bool {
        self.watched
    }

    /// Flips the watch flag and returns the new value.
    pub(crate) fn toggle_watch(&mut self) -> bool {
        self.watched = !self.watched;
        self.watched
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&Session> {
        match &self.occupancy {
            Occupancy::Free => None,
            Occupancy::Occupied(session) => Some(session),
        }
    }

    pub(crate) fn set_occupancy(&mut self, occupancy: Occupancy) {
        self.occupancy = occupancy;
    }

    /// Frees the spot, handing back the session it held.
    pub(crate) fn take_session(&mut self) -> Option<Session> {
        match std::mem::replace(&mut self.occupancy, Occupancy::Free) {
            Occupancy::Occupied(session) => Some(session),
            Occupancy::Free => None,
        }
    }
}
