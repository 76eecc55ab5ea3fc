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

//! Session billing.
//!
//! [`Billing`] prices parking sessions and coordinates the two balance-gated
//! transitions:
//!
//! - **Park**: the user's balance must cover the estimated cost. Nothing is
//!   deducted at this point.
//! - **Exit**: the fee for the actual elapsed time is debited, then the spot is
//!   freed.
//!
//! Only exit debits. Park is a funds check, not a pre-authorization, so a
//! session is charged exactly once.

use crate::account::User;
use crate::base::{SpotId, Username};
use crate::lot::ParkingLot;
use crate::rate::RateTable;
use crate::spot::ParkingSpot;
use crate::store::AccountStore;
use crate::vehicle::{Vehicle, VehicleClass};
use crate::ParkingError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Parameters of a park request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkRequest {
    pub username: Username,
    pub spot_id: SpotId,
    pub vehicle: Vehicle,
    pub planned_hours: i64,
}

/// Prices sessions from a [`RateTable`]. Holds no other state.
#[derive(Debug, Clone, Default)]
pub struct Billing {
    rates: RateTable,
}

impl Billing {
    /// Decimal places kept on exit fees.
    pub const FEE_PRECISION: u32 = 4;

    const MILLIS_PER_HOUR: i64 = 3_600_000;

    pub fn new(rates: RateTable) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// `rate(class) * hours`.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::InvalidDuration`] - `hours` is zero or negative, or
    ///   the cost overflows.
    /// - [`ParkingError::UnknownVehicleClass`] - The class has no rate.
    pub fn estimate_cost(&self, class: VehicleClass, hours: i64) -> Result<Decimal, ParkingError> {
        if hours <= 0 {
            return Err(ParkingError::InvalidDuration);
        }
        self.rates
            .rate(class)?
            .checked_mul(Decimal::from(hours))
            .ok_or(ParkingError::InvalidDuration)
    }

    /// Fee for an occupied spot, charged on the actual elapsed time at `now`.
    ///
    /// Elapsed time is measured in milliseconds and converted to fractional
    /// hours. A `now` earlier than the session start is billed as zero.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::SpotNotOccupied`] - The spot is free.
    /// - [`ParkingError::UnknownVehicleClass`] - The vehicle's class has no rate.
    /// - [`ParkingError::InvalidDuration`] - The fee overflows.
    pub fn exit_fee(&self, spot: &ParkingSpot, now: DateTime<Utc>) -> Result<Decimal, ParkingError> {
        let session = spot.session().ok_or(ParkingError::SpotNotOccupied)?;
        let rate = self.rates.rate(session.vehicle.class())?;
        let elapsed_ms = (now - session.started_at).num_milliseconds().max(0);
        let hours = Decimal::from(elapsed_ms) / Decimal::from(Self::MILLIS_PER_HOUR);
        let fee = rate
            .checked_mul(hours)
            .ok_or(ParkingError::InvalidDuration)?;
        Ok(fee.round_dp(Self::FEE_PRECISION))
    }

    /// Validates funds and occupies the requested spot, starting at `now`.
    ///
    /// The balance is checked against the estimate but not deducted.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::NotAuthenticated`] - Unknown user.
    /// - [`ParkingError::InvalidDuration`] / [`ParkingError::UnknownVehicleClass`] -
    ///   From the estimate.
    /// - [`ParkingError::InsufficientFunds`] - Balance below the estimate.
    /// - Any error from [`ParkingLot::occupy_at`], unchanged.
    pub fn park_vehicle(
        &self,
        lot: &mut ParkingLot,
        store: &dyn AccountStore,
        request: ParkRequest,
        now: DateTime<Utc>,
    ) -> Result<Decimal, ParkingError> {
        let user = authenticated(store, &request.username)?;
        let estimate = self.estimate_cost(request.vehicle.class(), request.planned_hours)?;
        let planned_hours =
            u32::try_from(request.planned_hours).map_err(|_| ParkingError::InvalidDuration)?;
        user.ensure_covers(estimate)?;

        lot.occupy_at(
            &request.spot_id,
            request.vehicle,
            planned_hours,
            request.username,
            now,
        )?;
        Ok(estimate)
    }

    /// Charges the exit fee to the session owner and frees the spot.
    ///
    /// Returns the fee that was debited. On any error neither the balance nor
    /// the spot changes.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::SpotNotFound`] / [`ParkingError::SpotNotOccupied`] - Bad spot.
    /// - [`ParkingError::NotOwner`] - The session belongs to someone else.
    /// - [`ParkingError::NotAuthenticated`] - Unknown user.
    /// - [`ParkingError::InsufficientFunds`] - Balance below the fee.
    pub fn pay_and_exit(
        &self,
        lot: &mut ParkingLot,
        store: &dyn AccountStore,
        username: &Username,
        spot_id: &SpotId,
        now: DateTime<Utc>,
    ) -> Result<Decimal, ParkingError> {
        let spot = lot.spot(spot_id)?;
        let session = spot.session().ok_or(ParkingError::SpotNotOccupied)?;
        if &session.occupant != username {
            return Err(ParkingError::NotOwner);
        }
        let fee = self.exit_fee(spot, now)?;

        let user = authenticated(store, username)?;
        let balance = user.debited(fee)?;
        store.set_balance(username, balance)?;

        // Cannot fail: the lot is borrowed mutably and the spot was just seen occupied.
        lot.vacate(spot_id)?;
        Ok(fee)
    }
}

fn authenticated(store: &dyn AccountStore, username: &Username) -> Result<User, ParkingError> {
    store
        .get_user(username)?
        .ok_or(ParkingError::NotAuthenticated)
}
