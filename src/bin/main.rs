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

use chrono::Utc;
use clap::Parser;
use easypark_rs::{
    AccountStore, Config, DEFAULT_CONFIG_NAME, Engine, FundingMethod, ParkingError, ParkingSpot,
    SpotId, Username, Vehicle, VehicleClass,
};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// EasyPark - Cashless parking console
///
/// Reads commands from stdin, one per line, and prints one result line per
/// command. Type `help` for the command list.
#[derive(Parser, Debug)]
#[command(name = "easypark")]
#[command(about = "A cashless parking lot console", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_NAME)]
    config: PathBuf,

    /// SQLite database file (overrides the configuration)
    #[arg(short, long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Number of spots in the lot (overrides the configuration)
    #[arg(short, long)]
    spots: Option<usize>,
}

fn main() {
    // Logs go to stderr so stdout stays a clean transcript
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config);
    if let Some(database) = args.database {
        config.database = database;
    }
    if let Some(spots) = args.spots {
        config.spots = spots;
    }

    let engine = match Engine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!(
                "Error opening database '{}': {}",
                config.database.display(),
                e
            );
            process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    if let Err(e) = run_shell(&engine, stdin.lock(), std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

const USAGE: &str = "commands: signup <user> <password> | login <user> <password> | logout | \
balance | fund <amount> <gcash|card> | spots | available | occupied | watch <spot> | \
estimate <car|motorcycle> <hours> | park <spot> <car|motorcycle> <plate> <hours> | \
fee <spot> | exit <spot> | quit";

/// One parsed console command.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Signup { username: Username, password: String },
    Login { username: Username, password: String },
    Logout,
    Balance,
    Fund { amount: Decimal, method: FundingMethod },
    Spots,
    Available,
    Occupied,
    Watch { spot_id: SpotId },
    Estimate { class: VehicleClass, hours: i64 },
    Park {
        spot_id: SpotId,
        class: VehicleClass,
        plate: String,
        hours: i64,
    },
    Fee { spot_id: SpotId },
    Exit { spot_id: SpotId },
    Help,
    Quit,
}

fn parse_hours(raw: &str) -> Result<i64, ParkingError> {
    raw.parse()
        .map_err(|_| ParkingError::InvalidInput("please enter a valid duration".into()))
}

fn parse_amount(raw: &str) -> Result<Decimal, ParkingError> {
    Decimal::from_str(raw)
        .map_err(|_| ParkingError::InvalidInput("please enter a valid amount".into()))
}

impl FromStr for Command {
    type Err = ParkingError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            ["signup", user, password] => Command::Signup {
                username: Username::from(*user),
                password: (*password).to_owned(),
            },
            ["login", user, password] => Command::Login {
                username: Username::from(*user),
                password: (*password).to_owned(),
            },
            ["logout"] => Command::Logout,
            ["balance"] => Command::Balance,
            ["fund", amount, method] => Command::Fund {
                amount: parse_amount(amount)?,
                method: method.parse()?,
            },
            ["spots"] => Command::Spots,
            ["available"] => Command::Available,
            ["occupied"] => Command::Occupied,
            ["watch", spot] => Command::Watch {
                spot_id: SpotId::from(*spot),
            },
            ["estimate", class, hours] => Command::Estimate {
                class: class.parse()?,
                hours: parse_hours(hours)?,
            },
            ["park", spot, class, plate, hours] => Command::Park {
                spot_id: SpotId::from(*spot),
                class: class.parse()?,
                plate: (*plate).to_owned(),
                hours: parse_hours(hours)?,
            },
            ["fee", spot] => Command::Fee {
                spot_id: SpotId::from(*spot),
            },
            ["exit", spot] => Command::Exit {
                spot_id: SpotId::from(*spot),
            },
            ["help"] => Command::Help,
            ["quit"] | ["exit"] => Command::Quit,
            _ => return Err(ParkingError::InvalidInput(format!("unrecognized command '{line}'"))),
        };
        Ok(command)
    }
}

/// Console state: the engine plus whoever is logged in.
struct Shell<'a, S: AccountStore> {
    engine: &'a Engine<S>,
    current_user: Option<Username>,
}

impl<'a, S: AccountStore> Shell<'a, S> {
    fn new(engine: &'a Engine<S>) -> Self {
        Self {
            engine,
            current_user: None,
        }
    }

    fn user(&self) -> Result<&Username, ParkingError> {
        self.current_user.as_ref().ok_or(ParkingError::NotAuthenticated)
    }

    /// Runs one command and renders its success message.
    fn execute(&mut self, command: Command) -> Result<String, ParkingError> {
        match command {
            Command::Signup { username, password } => {
                self.engine.signup(&username, &password)?;
                Ok("Account created successfully".to_owned())
            }
            Command::Login { username, password } => {
                let user = self.engine.login(&username, &password)?;
                self.current_user = Some(user.username().clone());
                Ok(format!("Welcome, {}!", user.username()))
            }
            Command::Logout => {
                self.current_user = None;
                Ok("You have been logged out successfully.".to_owned())
            }
            Command::Balance => {
                let user = self
                    .engine
                    .user(self.user()?)?
                    .ok_or(ParkingError::NotAuthenticated)?;
                Ok(format!("Balance: ${:.2}", user.balance()))
            }
            Command::Fund { amount, method } => {
                self.engine.add_funds(self.user()?, amount, method)?;
                Ok(format!("${amount:.2} added to your account via {method}"))
            }
            Command::Spots => Ok(render_spots(&self.engine.spots())),
            Command::Available => Ok(render_ids(&self.engine.available_spots(), "No spots available")),
            Command::Occupied => Ok(render_ids(&self.engine.occupied_spots(), "No occupied spots")),
            Command::Watch { spot_id } => {
                if self.engine.toggle_watch(&spot_id)? {
                    Ok(format!("Now watching spot {spot_id}"))
                } else {
                    Ok(format!("Stopped watching spot {spot_id}"))
                }
            }
            Command::Estimate { class, hours } => {
                let cost = self.engine.estimate_cost(class, hours)?;
                Ok(format!("Estimated Cost: ${cost:.2}"))
            }
            Command::Park {
                spot_id,
                class,
                plate,
                hours,
            } => {
                let user = self.user()?;
                let cost =
                    self.engine
                        .park_vehicle(user, &spot_id, Vehicle::new(class, plate), hours)?;
                Ok(format!(
                    "Vehicle parked in spot {spot_id}. Estimated cost: ${cost:.2}"
                ))
            }
            Command::Fee { spot_id } => {
                let fee = self.engine.exit_fee(&spot_id, Utc::now())?;
                Ok(format!("Parking Fee: ${fee:.2}"))
            }
            Command::Exit { spot_id } => {
                let fee = self.engine.pay_and_exit(self.user()?, &spot_id, Utc::now())?;
                Ok(format!(
                    "Vehicle has exited from spot {spot_id}. ${fee:.2} deducted from your account."
                ))
            }
            Command::Help => Ok(USAGE.to_owned()),
            Command::Quit => Ok("Goodbye.".to_owned()),
        }
    }
}

fn render_spots(spots: &[ParkingSpot]) -> String {
    spots
        .iter()
        .map(|spot| {
            let status = match spot.session() {
                None => format!("{} Available", spot.id()),
                Some(session) => format!(
                    "{} Occupied ({} {})",
                    spot.id(),
                    session.vehicle.class(),
                    session.vehicle.license_plate()
                ),
            };
            if spot.is_watched() {
                format!("{status} [watched]")
            } else {
                status
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_ids(spots: &[ParkingSpot], empty: &str) -> String {
    if spots.is_empty() {
        return empty.to_owned();
    }
    spots
        .iter()
        .map(|spot| spot.id().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs console commands from `reader` until EOF or `quit`.
///
/// Blank lines and lines starting with `#` are ignored. Every other line
/// produces exactly one output line; failures are printed as `error: ...`
/// and do not stop the session.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing output fails.
pub fn run_shell<S, R, W>(engine: &Engine<S>, reader: R, mut writer: W) -> std::io::Result<()>
where
    S: AccountStore,
    R: BufRead,
    W: Write,
{
    let mut shell = Shell::new(engine);

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let command = line.parse::<Command>();
        let quit = command == Ok(Command::Quit);
        match command.and_then(|command| shell.execute(command)) {
            Ok(message) => writeln!(writer, "{message}")?,
            Err(e) => writeln!(writer, "error: {e}")?,
        }
        if quit {
            break;
        }
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use easypark_rs::{Billing, MemoryAccountStore, ParkingLot};
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    fn engine() -> Engine<MemoryAccountStore> {
        Engine::new(ParkingLot::new(2), MemoryAccountStore::new(), Billing::default())
    }

    fn transcript(engine: &Engine<MemoryAccountStore>, input: &str) -> Vec<String> {
        let mut output = Vec::new();
        run_shell(engine, Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn parse_park_command() {
        assert_eq!(
            "park A1 car ABC-123 2".parse::<Command>(),
            Ok(Command::Park {
                spot_id: SpotId::from("A1"),
                class: VehicleClass::Car,
                plate: "ABC-123".to_owned(),
                hours: 2,
            })
        );
    }

    #[test]
    fn parse_rejects_bad_duration() {
        assert_eq!(
            "estimate car two".parse::<Command>(),
            Err(ParkingError::InvalidInput("please enter a valid duration".into()))
        );
    }

    #[test]
    fn parse_exit_without_spot_is_quit() {
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!(
            "exit A2".parse::<Command>(),
            Ok(Command::Exit {
                spot_id: SpotId::from("A2")
            })
        );
    }

    #[test]
    fn signup_login_and_fund() {
        let engine = engine();
        let lines = transcript(
            &engine,
            "signup alice secret\n\
             login alice secret\n\
             fund 25.5 gcash\n\
             balance\n",
        );

        assert_eq!(
            lines,
            vec![
                "Account created successfully",
                "Welcome, alice!",
                "$25.50 added to your account via GCash",
                "Balance: $25.50",
            ]
        );
    }

    #[test]
    fn commands_require_login() {
        let engine = engine();
        let lines = transcript(&engine, "park A1 car ABC 1\nbalance\n");
        assert_eq!(
            lines,
            vec!["error: please log in first", "error: please log in first"]
        );
    }

    #[test]
    fn wrong_password_is_rejected() {
        let engine = engine();
        let lines = transcript(&engine, "signup bob pw\nlogin bob nope\n");
        assert_eq!(lines[1], "error: invalid username or password");
    }

    #[test]
    fn park_and_exit_round_trip() {
        let engine = engine();
        let lines = transcript(
            &engine,
            "signup alice pw\n\
             login alice pw\n\
             fund 100 card\n\
             estimate car 2\n\
             park A1 car ABC-123 2\n\
             available\n\
             spots\n\
             exit A1\n\
             occupied\n",
        );

        assert_eq!(lines[3], "Estimated Cost: $10.00");
        assert_eq!(lines[4], "Vehicle parked in spot A1. Estimated cost: $10.00");
        assert_eq!(lines[5], "A2");
        assert_eq!(lines[6], "A1 Occupied (car ABC-123), A2 Available");
        assert!(lines[7].starts_with("Vehicle has exited from spot A1."));
        assert_eq!(lines[8], "No occupied spots");
    }

    #[test]
    fn watch_toggles_and_shows_in_spots() {
        let engine = engine();
        let lines = transcript(
            &engine,
            "watch A2
             spots
             watch A2
             spots
             watch C3
",
        );

        assert_eq!(
            lines,
            vec![
                "Now watching spot A2",
                "A1 Available, A2 Available [watched]",
                "Stopped watching spot A2",
                "A1 Available, A2 Available",
                "error: spot not found",
            ]
        );
    }

    #[test]
    fn park_without_funds_fails() {
        let engine = engine();
        let lines = transcript(
            &engine,
            "signup alice pw\nlogin alice pw\npark A1 motorcycle M-1 1\n",
        );
        assert_eq!(lines[2], "error: insufficient balance");
        assert_eq!(engine.available_spots().len(), 2);
    }

    #[test]
    fn logout_forgets_user() {
        let engine = engine();
        let lines = transcript(
            &engine,
            "signup alice pw\nlogin alice pw\nlogout\nfund 5 card\n",
        );
        assert_eq!(lines[2], "You have been logged out successfully.");
        assert_eq!(lines[3], "error: please log in first");
        let alice = engine.user(&Username::from("alice")).unwrap().unwrap();
        assert_eq!(alice.balance(), dec!(0));
    }

    #[test]
    fn quit_stops_processing() {
        let engine = engine();
        let lines = transcript(&engine, "# comment\n\nquit\nsignup alice pw\n");
        assert_eq!(lines, vec!["Goodbye."]);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn unknown_command_reports_error() {
        let engine = engine();
        let lines = transcript(&engine, "dance\n");
        assert_eq!(lines, vec!["error: invalid input: unrecognized command 'dance'"]);
    }
}
