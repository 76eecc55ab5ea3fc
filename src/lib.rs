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

//! # EasyPark
//!
//! This library provides a cashless parking engine: a fixed lot of numbered
//! spots, prepaid user balances persisted in SQLite, and time-based fees for
//! cars and motorcycles.
//!
//! ## Core Components
//!
//! - [`Engine`]: Entry point tying the lot, the account store and billing together
//! - [`ParkingLot`]: Fixed collection of [`ParkingSpot`]s and their sessions
//! - [`Billing`]: Cost estimates, exit fees, and the balance-gated park/exit flows
//! - [`AccountStore`]: User persistence ([`SqliteAccountStore`], [`MemoryAccountStore`])
//! - [`ParkingError`]: Error kinds for every failed operation
//!
//! ## Example
//!
//! ```
//! use easypark_rs::{
//!     Billing, Engine, FundingMethod, MemoryAccountStore, ParkingLot, SpotId, Username,
//!     Vehicle, VehicleClass,
//! };
//! use chrono::{Duration, Utc};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new(ParkingLot::new(2), MemoryAccountStore::new(), Billing::default());
//! let alice = Username::from("alice");
//! engine.signup(&alice, "secret").unwrap();
//! engine.add_funds(&alice, dec!(100), FundingMethod::Card).unwrap();
//!
//! // Park a motorcycle for a planned 2 hours
//! let start = Utc::now();
//! let spot = SpotId::from("A1");
//! let vehicle = Vehicle::new(VehicleClass::Motorcycle, "MC-42");
//! engine.park_vehicle_at(&alice, &spot, vehicle, 2, start).unwrap();
//!
//! // Leave after 2.5 hours: 3/h * 2.5h
//! let fee = engine.pay_and_exit(&alice, &spot, start + Duration::minutes(150)).unwrap();
//! assert_eq!(fee, dec!(7.5));
//! assert_eq!(engine.user(&alice).unwrap().unwrap().balance(), dec!(92.5));
//! ```
//!
//! ## Thread Safety
//!
//! The engine serializes park, exit and funding behind a single lock, so it can
//! be shared across threads without double-booking a spot or overdrawing a
//! balance.

pub mod account;
mod base;
mod billing;
mod config;
mod engine;
pub mod error;
mod lot;
mod rate;
mod spot;
mod store;
mod vehicle;

pub use account::{FundingMethod, User, hash_password};
pub use base::{SpotId, Username};
pub use billing::{Billing, ParkRequest};
pub use config::{Config, DEFAULT_CONFIG_NAME};
pub use engine::Engine;
pub use error::ParkingError;
pub use lot::ParkingLot;
pub use rate::RateTable;
pub use spot::{Occupancy, ParkingSpot, Session};
pub use store::{AccountStore, DEFAULT_DB_NAME, MemoryAccountStore, SqliteAccountStore};
pub use vehicle::{Vehicle, VehicleClass};
