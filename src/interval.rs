use crate::scheduler::SchedError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minutes dans une journée.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Heure murale `HH:MM` (24h), stockée en minutes depuis minuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_hm(hour: u8, minute: u8) -> Result<Self, SchedError> {
        if hour > 23 || minute > 59 {
            return Err(SchedError::InvalidTimeFormat(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self(u16::from(hour) * 60 + u16::from(minute)))
    }

    /// Construit depuis un nombre de minutes, ramené dans la journée.
    pub fn from_minutes_wrapping(minutes: u32) -> Self {
        Self((minutes % u32::from(MINUTES_PER_DAY)) as u16)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
    pub fn hour(self) -> u8 {
        (self.0 / 60) as u8
    }
    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }
}

impl FromStr for TimeOfDay {
    type Err = SchedError;

    /// Format strict : deux chiffres, `:`, deux chiffres.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedError::InvalidTimeFormat(raw.to_string());
        let bytes = raw.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let hour = (digits[0] - b'0') * 10 + (digits[1] - b'0');
        let minute = (digits[2] - b'0') * 10 + (digits[3] - b'0');
        Self::from_hm(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = SchedError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Intervalle `[start, end)` ancré sur une date civile.
///
/// `end <= start` encode un créneau qui passe minuit (ex. 22:00–06:00) :
/// la partie après minuit reste rattachée à la date de départ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeInterval {
    pub fn new(date: NaiveDate, start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { date, start, end }
    }

    /// Construit depuis des chaînes `HH:MM`.
    pub fn parse(date: NaiveDate, start: &str, end: &str) -> Result<Self, SchedError> {
        Ok(Self::new(date, start.parse()?, end.parse()?))
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_minutes(&self) -> u32 {
        let (s, e) = (u32::from(self.start.minutes()), u32::from(self.end.minutes()));
        if self.wraps_midnight() {
            u32::from(MINUTES_PER_DAY) - s + e
        } else {
            e - s
        }
    }

    /// Découpe en sous-plages de minutes `[a, b)` sur la journée.
    pub fn minute_ranges(&self) -> Vec<(u16, u16)> {
        let (s, e) = (self.start.minutes(), self.end.minutes());
        if !self.wraps_midnight() {
            return vec![(s, e)];
        }
        let mut out = vec![(s, MINUTES_PER_DAY)];
        if e > 0 {
            out.push((0, e));
        }
        out
    }

    /// Chevauchement strict : des bornes qui se touchent ne comptent pas.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        if self.date != other.date {
            return false;
        }
        let theirs = other.minute_ranges();
        self.minute_ranges()
            .iter()
            .any(|a| theirs.iter().any(|b| crate::scheduler::ranges_overlap(*a, *b)))
    }

    /// Vrai si `other` tient entièrement dans `self` (même date, wraparound compris).
    pub fn contains(&self, other: &TimeInterval) -> bool {
        let ours = self.minute_ranges();
        other
            .minute_ranges()
            .iter()
            .all(|(b0, b1)| ours.iter().any(|(a0, a1)| a0 <= b0 && b1 <= a1))
    }

    /// Même durée, nouvelle date et nouvelle heure de début.
    pub fn moved_to(&self, date: NaiveDate, start: TimeOfDay) -> Self {
        let end = TimeOfDay::from_minutes_wrapping(u32::from(start.minutes()) + self.duration_minutes());
        Self { date, start, end }
    }
}
