use std::{
    collections::HashSet,
    io::{BufRead, BufReader},
};

use serde::{Deserialize, Serialize};

use crate::errors::Error;
#[cfg(feature = "fs")]
use std::{fs::File, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContextCallsign {
    /// Airline designator, empty when the context line only named a flight number.
    pub airline: String,
    pub flight_number: String,
}

/// Callsigns known to be active in the current session, used to complete
/// callsigns that were only partially spoken.
#[derive(Debug, Clone, Default)]
pub struct CallsignContext {
    callsigns: Vec<ContextCallsign>,
    ambiguous_airlines: HashSet<String>,
    ambiguous_flight_numbers: HashSet<String>,
}

impl CallsignContext {
    pub fn new(callsigns: Vec<ContextCallsign>) -> Self {
        let mut context = Self::default();
        for callsign in callsigns {
            context.push(callsign);
        }
        context
    }

    /// One callsign per line, either `AIRLINE FLIGHTNUMBER` or `FLIGHTNUMBER`.
    pub fn load_context<R>(reader: R) -> Result<Self, Error>
    where
        R: std::io::Read,
    {
        let mut context = Self::default();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let callsign = match (fields.next(), fields.next()) {
                (Some(airline), Some(flight_number)) => ContextCallsign {
                    airline: airline.to_string(),
                    flight_number: flight_number.to_string(),
                },
                (Some(flight_number), None) => ContextCallsign {
                    airline: String::new(),
                    flight_number: flight_number.to_string(),
                },
                _ => continue,
            };
            context.push(callsign);
        }
        Ok(context)
    }

    #[cfg(feature = "fs")]
    pub fn load_context_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::load_context(file)
    }

    /// Adds a callsign; airlines or flight numbers seen twice become ambiguous.
    pub fn push(&mut self, callsign: ContextCallsign) {
        if self
            .callsigns
            .iter()
            .any(|known| known.airline == callsign.airline)
        {
            self.ambiguous_airlines.insert(callsign.airline.clone());
        }
        if self
            .callsigns
            .iter()
            .any(|known| known.flight_number == callsign.flight_number)
        {
            self.ambiguous_flight_numbers
                .insert(callsign.flight_number.clone());
        }
        self.callsigns.push(callsign);
    }

    pub fn callsigns(&self) -> &[ContextCallsign] {
        &self.callsigns
    }

    pub fn is_ambiguous_airline(&self, airline: &str) -> bool {
        self.ambiguous_airlines.contains(airline)
    }

    pub fn is_ambiguous_flight_number(&self, flight_number: &str) -> bool {
        self.ambiguous_flight_numbers.contains(flight_number)
    }

    pub fn is_empty(&self) -> bool {
        self.callsigns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_context() {
        let context =
            CallsignContext::load_context("DLH 456\n\nAMB 01\n  789  \n".as_bytes()).unwrap();
        assert_eq!(context.callsigns().len(), 3);
        assert_eq!(context.callsigns()[1].flight_number, "01");
        assert_eq!(context.callsigns()[2].airline, "");
        assert_eq!(context.callsigns()[2].flight_number, "789");
    }

    #[test]
    fn test_ambiguity() {
        let context =
            CallsignContext::load_context("DLH 456\nDLH 123\nAFR 456\n".as_bytes()).unwrap();
        assert!(context.is_ambiguous_airline("DLH"));
        assert!(!context.is_ambiguous_airline("AFR"));
        assert!(context.is_ambiguous_flight_number("456"));
        assert!(!context.is_ambiguous_flight_number("123"));
    }
}
