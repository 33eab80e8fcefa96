use std::{collections::HashMap, io::BufRead};

use serde::{Deserialize, Serialize};

use crate::errors::Error;
#[cfg(feature = "fs")]
use std::{fs::File, io::BufReader, path::Path};

/// Spoken airline names that recognizers commonly produce in place of the
/// name listed in the table.
pub const ALTERNATE_SPELLINGS: &[(&str, &str)] =
    &[("air_frans", "air_france"), ("hansa", "lufthansa")];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AirlineEntry {
    /// ICAO designator, e.g. `DLH`.
    pub code: String,
    /// Spoken telephony name, e.g. `lufthansa`.
    pub name: String,
}

/// Airline table mapping spoken names to their designator. Several names may
/// share a designator (`swiss` and `swiss_air` both map to `SWR`), but each
/// name appears only once.
#[derive(Debug, Clone, Default)]
pub struct Airlines {
    entries: Vec<AirlineEntry>,
    by_name: HashMap<String, usize>,
}

impl Airlines {
    /// Reads `CODE name` lines. Blank lines are ignored; any other line must
    /// have exactly two whitespace separated fields.
    pub fn load_airlines<R>(reader: R) -> Result<Self, Error>
    where
        R: std::io::Read,
    {
        let mut airlines = Airlines::default();
        let reader = std::io::BufReader::new(reader);
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [code, name] = fields.as_slice() else {
                return Err(Error::MalformedAirlineLine {
                    line: index + 1,
                    content: line.to_string(),
                });
            };
            airlines.insert(AirlineEntry {
                code: code.to_string(),
                name: name.to_string(),
            })?;
        }
        log::debug!("Loaded {} airline names", airlines.len());
        Ok(airlines)
    }

    #[cfg(feature = "fs")]
    pub fn load_airlines_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::load_airlines(BufReader::new(file))
    }

    pub fn insert(&mut self, entry: AirlineEntry) -> Result<(), Error> {
        if let Some(&existing) = self.by_name.get(&entry.name) {
            return Err(Error::DuplicateAirline {
                name: entry.name,
                first: self.entries[existing].code.clone(),
                second: entry.code,
            });
        }
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(|&index| self.entries[index].code.as_str())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Looks up a spoken airline, accepting known alternate spellings and
    /// multi-word names written with spaces instead of underscores.
    pub fn resolve(&self, spoken: &str) -> Option<&str> {
        let joined = spoken.split_whitespace().collect::<Vec<_>>().join("_");
        let name = ALTERNATE_SPELLINGS
            .iter()
            .find(|(alternate, _)| *alternate == joined)
            .map(|(_, name)| *name)
            .unwrap_or(joined.as_str());
        self.code_for(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn entries(&self) -> &[AirlineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
