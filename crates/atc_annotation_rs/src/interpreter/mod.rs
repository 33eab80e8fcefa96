//! Interpretation of callsign and command frames into canonical ATC concepts.

mod callsign;
mod command;
pub mod limit;
pub mod rules;

pub use callsign::{
    AirlinePart, Callsign, NO_AIRLINE, NO_CALLSIGN, NO_FLIGHT_NUMBER, UNKNOWN_AIRLINE,
};
pub use command::{Command, NO_CONCEPT};
