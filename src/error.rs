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

//! Error types for parking and account operations.

use thiserror::Error;

/// Parking and account errors.
///
/// Every variant is recoverable; callers match on the kind to decide what to
/// tell the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParkingError {
    /// Username is already registered
    #[error("username already exists")]
    DuplicateUser,

    /// No account exists for the username
    #[error("unknown user")]
    UnknownUser,

    /// Caller does not refer to a known user
    #[error("please log in first")]
    NotAuthenticated,

    /// Username or password did not match
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Spot identifier is not part of the lot
    #[error("spot not found")]
    SpotNotFound,

    /// Spot already holds a vehicle
    #[error("spot is already occupied")]
    SpotAlreadyOccupied,

    /// Spot holds no vehicle
    #[error("spot is not occupied")]
    SpotNotOccupied,

    /// Session belongs to another user
    #[error("spot is occupied by another user")]
    NotOwner,

    /// Duration is zero, negative or out of range
    #[error("invalid duration (must be a positive number of hours)")]
    InvalidDuration,

    /// Vehicle class has no rate
    #[error("unknown vehicle class")]
    UnknownVehicleClass,

    /// Balance does not cover the cost
    #[error("insufficient balance")]
    InsufficientFunds,

    /// Funding amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Required field is empty
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persistence layer failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for ParkingError {
    fn from(error: rusqlite::Error) -> Self {
        ParkingError::Storage(error.to_string())
    }
}
