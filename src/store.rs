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

//! Account storage.
//!
//! [`SqliteAccountStore`] is the durable store: every mutation is committed
//! before the call returns. [`MemoryAccountStore`] keeps the same contract in
//! process memory and is meant for tests and throwaway sessions.
//!
//! # Example
//!
//! ```
//! use easypark_rs::{AccountStore, SqliteAccountStore, Username, hash_password};
//! use rust_decimal_macros::dec;
//!
//! let store = SqliteAccountStore::in_memory().unwrap();
//! let alice = Username::from("alice");
//! store.create_user(&alice, &hash_password("secret")).unwrap();
//! store.set_balance(&alice, dec!(12.50)).unwrap();
//!
//! let user = store.get_user(&alice).unwrap().unwrap();
//! assert_eq!(user.balance(), dec!(12.50));
//! ```

use crate::account::User;
use crate::base::Username;
use crate::ParkingError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

/// Persistence contract for user accounts, keyed by username.
///
/// Stores do not enforce balance rules; [`Billing`](crate::Billing) does.
pub trait AccountStore: Send + Sync {
    /// Registers a user with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::DuplicateUser`] if the username is taken.
    fn create_user(&self, username: &Username, password_hash: &str) -> Result<(), ParkingError>;

    /// Looks up a user by exact username. A missing user is `Ok(None)`.
    fn get_user(&self, username: &Username) -> Result<Option<User>, ParkingError>;

    /// Overwrites the stored balance.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::UnknownUser`] if no such user exists.
    fn set_balance(&self, username: &Username, balance: Decimal) -> Result<(), ParkingError>;
}

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    balance TEXT NOT NULL
);";

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "parking_system.db";

/// SQLite-backed account store.
///
/// Balances are stored as decimal strings so they round-trip exactly.
pub struct SqliteAccountStore {
    conn: Mutex<Connection>,
}

impl SqliteAccountStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn open(path: &Path) -> Result<Self, ParkingError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ParkingError::Storage(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened account database");
        Self::with_connection(conn)
    }

    /// Creates an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, ParkingError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ParkingError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn parse_balance(raw: &str) -> Result<Decimal, ParkingError> {
    Decimal::from_str(raw)
        .map_err(|e| ParkingError::Storage(format!("corrupt balance '{raw}': {e}")))
}

impl AccountStore for SqliteAccountStore {
    fn create_user(&self, username: &Username, password_hash: &str) -> Result<(), ParkingError> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (username, password_hash, balance) VALUES (?1, ?2, ?3)",
            params![username.as_str(), password_hash, Decimal::ZERO.to_string()],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(ParkingError::DuplicateUser)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_user(&self, username: &Username) -> Result<Option<User>, ParkingError> {
        let conn = self.conn.lock();
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT username, password_hash, balance FROM users WHERE username = ?1",
                params![username.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((name, hash, balance)) => Ok(Some(User::with_balance(
                Username(name),
                hash,
                parse_balance(&balance)?,
            ))),
            None => Ok(None),
        }
    }

    fn set_balance(&self, username: &Username, balance: Decimal) -> Result<(), ParkingError> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE users SET balance = ?1 WHERE username = ?2",
            params![balance.to_string(), username.as_str()],
        )?;
        if updated == 0 {
            return Err(ParkingError::UnknownUser);
        }
        Ok(())
    }
}

/// In-memory account store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    users: DashMap<Username, User>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl AccountStore for MemoryAccountStore {
    fn create_user(&self, username: &Username, password_hash: &str) -> Result<(), ParkingError> {
        // Entry API gives an atomic check-and-insert.
        match self.users.entry(username.clone()) {
            Entry::Occupied(_) => Err(ParkingError::DuplicateUser),
            Entry::Vacant(entry) => {
                entry.insert(User::new(username.clone(), password_hash.to_owned()));
                Ok(())
            }
        }
    }

    fn get_user(&self, username: &Username) -> Result<Option<User>, ParkingError> {
        Ok(self.users.get(username).map(|user| user.clone()))
    }

    fn set_balance(&self, username: &Username, balance: Decimal) -> Result<(), ParkingError> {
        let mut user = self
            .users
            .get_mut(username)
            .ok_or(ParkingError::UnknownUser)?;
        *user = User::with_balance(username.clone(), user.password_hash().to_owned(), balance);
        Ok(())
    }
}
