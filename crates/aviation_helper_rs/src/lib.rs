//! Aviation helper library
//!
//! Lookup tables and spoken-form parsers shared by the annotation tooling:
//! the airline callsign table, the per-session callsign context, the spelled
//! alphabet, and the spoken number grammar.

pub mod errors;

pub mod clearance {
    pub mod airlines;
    pub mod callsign_context;
}

pub mod types {
    pub mod alphabet;
    pub mod spoken_number;
}

pub mod conversions;

pub use errors::Error;
