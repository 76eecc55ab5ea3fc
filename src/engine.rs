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

//! Parking engine.
//!
//! The [`Engine`] ties one [`ParkingLot`], one [`AccountStore`] and one
//! [`Billing`] together and is the only surface a presentation layer needs.
//!
//! # Operations
//!
//! - **Accounts**: sign up, log in, add funds.
//! - **Lot queries**: all, available, and occupied spots (snapshots), and
//!   the per-spot watch flag.
//! - **Sessions**: estimate, park, exit fee preview, pay and exit.
//!
//! # Thread Safety
//!
//! Park, exit and funding are check-then-act sequences. They all run inside
//! the same critical section (the lot mutex), so a spot can't be taken twice
//! and a balance can't be debited on a stale read.

use crate::account::{FundingMethod, User, hash_password};
use crate::base::{SpotId, Username};
use crate::billing::{Billing, ParkRequest};
use crate::lot::ParkingLot;
use crate::spot::ParkingSpot;
use crate::store::{AccountStore, SqliteAccountStore};
use crate::vehicle::{Vehicle, VehicleClass};
use crate::{Config, ParkingError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// Parking engine over an account store `S`.
///
/// # Invariants
///
/// - A spot holds at most one session.
/// - Balances are only lowered by [`pay_and_exit`](Self::pay_and_exit) and
///   never below zero.
/// - Only the user who parked can close a session.
pub struct Engine<S: AccountStore> {
    lot: Mutex<ParkingLot>,
    store: S,
    billing: Billing,
}

impl Engine<SqliteAccountStore> {
    /// Builds an engine backed by the SQLite database named in `config`.
    pub fn from_config(config: &Config) -> Result<Self, ParkingError> {
        let store = SqliteAccountStore::open(&config.database)?;
        Ok(Self::new(
            ParkingLot::new(config.spots),
            store,
            Billing::new(config.rate_table()),
        ))
    }
}

impl<S: AccountStore> Engine<S> {
    pub fn new(lot: ParkingLot, store: S, billing: Billing) -> Self {
        Engine {
            lot: Mutex::new(lot),
            store,
            billing,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn billing(&self) -> &Billing {
        &self.billing
    }

    /// Registers a new user with a zero balance.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::InvalidInput`] - Empty username or password.
    /// - [`ParkingError::DuplicateUser`] - Username already taken.
    pub fn signup(&self, username: &Username, password: &str) -> Result<(), ParkingError> {
        if username.as_str().is_empty() || password.is_empty() {
            return Err(ParkingError::InvalidInput(
                "username and password are required".into(),
            ));
        }
        self.store.create_user(username, &hash_password(password))?;
        tracing::info!(%username, "user signed up");
        Ok(())
    }

    /// Checks credentials and returns the user.
    ///
    /// Unknown users and wrong passwords both yield
    /// [`ParkingError::InvalidCredentials`].
    pub fn login(&self, username: &Username, password: &str) -> Result<User, ParkingError> {
        match self.store.get_user(username)? {
            Some(user) if user.verify_password(password) => {
                tracing::info!(%username, "user logged in");
                Ok(user)
            }
            _ => {
                tracing::debug!(%username, "login rejected");
                Err(ParkingError::InvalidCredentials)
            }
        }
    }

    /// Current state of a user, `None` if unknown.
    pub fn user(&self, username: &Username) -> Result<Option<User>, ParkingError> {
        self.store.get_user(username)
    }

    /// Credits a simulated top-up and returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::UnknownUser`] - No such user.
    /// - [`ParkingError::InvalidAmount`] - `amount` is not positive.
    pub fn add_funds(
        &self,
        username: &Username,
        amount: Decimal,
        method: FundingMethod,
    ) -> Result<Decimal, ParkingError> {
        let _guard = self.lot.lock();
        let user = self
            .store
            .get_user(username)?
            .ok_or(ParkingError::UnknownUser)?;
        let balance = user.credited(amount)?;
        self.store.set_balance(username, balance)?;
        tracing::info!(%username, %amount, %method, %balance, "funds added");
        Ok(balance)
    }

    /// Snapshot of every spot, in lot order.
    pub fn spots(&self) -> Vec<ParkingSpot> {
        self.lot.lock().spots().cloned().collect()
    }

    /// Snapshot of the free spots, in lot order.
    pub fn available_spots(&self) -> Vec<ParkingSpot> {
        self.lot.lock().available_spots().cloned().collect()
    }

    /// Snapshot of the occupied spots, in lot order.
    pub fn occupied_spots(&self) -> Vec<ParkingSpot> {
        self.lot.lock().occupied_spots().cloned().collect()
    }

    /// Flips the watch flag on `spot_id` and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SpotNotFound`] if the id is not part of the lot.
    pub fn toggle_watch(&self, spot_id: &SpotId) -> Result<bool, ParkingError> {
        let watched = self.lot.lock().toggle_watch(spot_id)?;
        tracing::debug!(spot = %spot_id, watched, "watch toggled");
        Ok(watched)
    }

    /// See [`Billing::estimate_cost`].
    pub fn estimate_cost(&self, class: VehicleClass, hours: i64) -> Result<Decimal, ParkingError> {
        self.billing.estimate_cost(class, hours)
    }

    /// Parks a vehicle starting now. Returns the estimated cost.
    pub fn park_vehicle(
        &self,
        username: &Username,
        spot_id: &SpotId,
        vehicle: Vehicle,
        planned_hours: i64,
    ) -> Result<Decimal, ParkingError> {
        self.park_vehicle_at(username, spot_id, vehicle, planned_hours, Utc::now())
    }

    /// Parks a vehicle with an explicit start time. See [`Billing::park_vehicle`].
    ///
    /// Returns [`ParkingError::InvalidInput`] if the license plate is blank.
    pub fn park_vehicle_at(
        &self,
        username: &Username,
        spot_id: &SpotId,
        vehicle: Vehicle,
        planned_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Decimal, ParkingError> {
        if vehicle.license_plate().trim().is_empty() {
            return Err(ParkingError::InvalidInput(
                "a license plate is required".into(),
            ));
        }
        let request = ParkRequest {
            username: username.clone(),
            spot_id: spot_id.clone(),
            vehicle,
            planned_hours,
        };
        let mut lot = self.lot.lock();
        match self.billing.park_vehicle(&mut lot, &self.store, request, now) {
            Ok(estimate) => {
                tracing::info!(%username, spot = %spot_id, %estimate, "vehicle parked");
                Ok(estimate)
            }
            Err(e) => {
                tracing::debug!(%username, spot = %spot_id, error = %e, "park rejected");
                Err(e)
            }
        }
    }

    /// Fee the occupant of `spot_id` would pay at `now`.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::SpotNotFound`] / [`ParkingError::SpotNotOccupied`].
    pub fn exit_fee(&self, spot_id: &SpotId, now: DateTime<Utc>) -> Result<Decimal, ParkingError> {
        let lot = self.lot.lock();
        self.billing.exit_fee(lot.spot(spot_id)?, now)
    }

    /// Debits the exit fee and frees the spot. Returns the fee charged.
    /// See [`Billing::pay_and_exit`].
    pub fn pay_and_exit(
        &self,
        username: &Username,
        spot_id: &SpotId,
        now: DateTime<Utc>,
    ) -> Result<Decimal, ParkingError> {
        let mut lot = self.lot.lock();
        match self
            .billing
            .pay_and_exit(&mut lot, &self.store, username, spot_id, now)
        {
            Ok(fee) => {
                tracing::info!(%username, spot = %spot_id, %fee, "vehicle exited");
                Ok(fee)
            }
            Err(e) => {
                tracing::debug!(%username, spot = %spot_id, error = %e, "exit rejected");
                Err(e)
            }
        }
    }
}
