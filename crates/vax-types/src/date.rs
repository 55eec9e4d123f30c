use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Calendar date of an availability slot or appointment.
///
/// Accepts `YYYY-MM-DD`, with one- or two-digit month and day, and rejects
/// anything that is not a real calendar day (`2021-02-30`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotDate(NaiveDate);

impl SlotDate {
    const FORMAT: &'static str = "%Y-%m-%d";

    pub fn parse(s: &str) -> Result<Self, TypeError> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT)
            .map(Self)
            .map_err(|_| TypeError::InvalidDate(s.to_string()))
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, TypeError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| TypeError::InvalidDate(format!("{year}-{month}-{day}")))
    }
}

impl From<NaiveDate> for SlotDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl FromStr for SlotDate {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for SlotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotDate({})", self.0.format(Self::FORMAT))
    }
}

impl fmt::Display for SlotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}
