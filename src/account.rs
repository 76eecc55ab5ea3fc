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

//! User accounts and credentials.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use easypark_rs::{User, Username, hash_password};
//!
//! let user = User::new(Username::from("alice"), hash_password("secret"));
//! assert_eq!(user.balance(), dec!(0));
//! assert!(user.verify_password("secret"));
//! ```

use crate::base::Username;
use crate::ParkingError;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Lowercase hex SHA-256 of the plaintext password.
///
/// Unsalted and single-round. Kept for compatibility with existing `users`
/// tables; do not reuse for new credential stores.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Simulated funding sources. Only used as a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundingMethod {
    GCash,
    Card,
}

impl fmt::Display for FundingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GCash => f.write_str("GCash"),
            Self::Card => f.write_str("Card"),
        }
    }
}

impl FromStr for FundingMethod {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcash" => Ok(Self::GCash),
            "card" => Ok(Self::Card),
            other => Err(ParkingError::InvalidInput(format!(
                "unknown funding method '{other}'"
            ))),
        }
    }
}

/// A registered user as read from an [`AccountStore`](crate::AccountStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    username: Username,
    password_hash: String,
    balance: Decimal,
}

impl User {
    const DECIMAL_PRECISION: u32 = 2;

    /// A freshly signed-up user with a zero balance.
    pub fn new(username: Username, password_hash: String) -> Self {
        Self::with_balance(username, password_hash, Decimal::ZERO)
    }

    pub fn with_balance(username: Username, password_hash: String, balance: Decimal) -> Self {
        Self {
            username,
            password_hash,
            balance,
        }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Whether `password` hashes to the stored digest.
    pub fn verify_password(&self, password: &str) -> bool {
        hash_password(password) == self.password_hash
    }

    /// Balance after adding `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidAmount`] if `amount` is not positive or
    /// the new balance would not fit in a `Decimal`.
    pub fn credited(&self, amount: Decimal) -> Result<Decimal, ParkingError> {
        if amount <= Decimal::ZERO {
            return Err(ParkingError::InvalidAmount);
        }
        self.balance
            .checked_add(amount)
            .ok_or(ParkingError::InvalidAmount)
    }

    /// Balance after removing `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InsufficientFunds`] if `amount` exceeds the balance.
    pub fn debited(&self, amount: Decimal) -> Result<Decimal, ParkingError> {
        self.ensure_covers(amount)?;
        let balance = self.balance - amount;
        debug_assert!(
            balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            balance
        );
        Ok(balance)
    }

    /// Checks the balance covers `amount` without changing anything.
    pub fn ensure_covers(&self, amount: Decimal) -> Result<(), ParkingError> {
        if self.balance < amount {
            return Err(ParkingError::InsufficientFunds);
        }
        Ok(())
    }
}

impl Serialize for User {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("User", 2)?;
        state.serialize_field("username", &self.username)?;
        state.serialize_field(
            "balance",
            &self.balance.round_dp(User::DECIMAL_PRECISION),
        )?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn user(balance: Decimal) -> User {
        User::with_balance(Username::from("alice"), hash_password("pw"), balance)
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn verify_password_rejects_wrong_password() {
        let user = user(dec!(0));
        assert!(user.verify_password("pw"));
        assert!(!user.verify_password("PW"));
    }

    #[test]
    fn credited_rejects_non_positive_amounts() {
        let user = user(dec!(10));
        assert_eq!(user.credited(dec!(0)), Err(ParkingError::InvalidAmount));
        assert_eq!(user.credited(dec!(-5)), Err(ParkingError::InvalidAmount));
        assert_eq!(user.credited(dec!(2.50)), Ok(dec!(12.50)));
    }

    #[test]
    fn credited_rejects_overflow() {
        let user = user(Decimal::MAX);
        assert_eq!(user.credited(dec!(1)), Err(ParkingError::InvalidAmount));
        assert_eq!(user.credited(Decimal::MAX), Err(ParkingError::InvalidAmount));
    }

    #[test]
    fn debited_never_goes_negative() {
        let user = user(dec!(10));
        assert_eq!(user.debited(dec!(10.01)), Err(ParkingError::InsufficientFunds));
        assert_eq!(user.debited(dec!(10)), Ok(dec!(0)));
    }

    #[test]
    fn funding_method_parse() {
        assert_eq!("GCash".parse::<FundingMethod>(), Ok(FundingMethod::GCash));
        assert_eq!("card".parse::<FundingMethod>(), Ok(FundingMethod::Card));
        assert!(matches!(
            "paypal".parse::<FundingMethod>(),
            Err(ParkingError::InvalidInput(_))
        ));
    }

    #[test]
    fn serializer_hides_hash_and_rounds_balance() {
        let json = serde_json::to_string(&user(dec!(92.505))).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["username"], "alice");
        // Banker's rounding: 92.505 -> 92.50
        assert_eq!(parsed["balance"].as_str().unwrap(), "92.50");
        assert!(parsed.get("password_hash").is_none());
    }
}
