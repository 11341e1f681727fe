use crate::interval::{TimeInterval, TimeOfDay};
use crate::model::PhysicianId;
use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Disponibilité d'un jour de la semaine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub is_available: bool,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl DayAvailability {
    pub fn available(start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Self { is_available: true, start_time, end_time }
    }

    pub fn off(start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Self { is_available: false, start_time, end_time }
    }
}

/// Semaine type d'un médecin, indexée 0–6 (dimanche–samedi).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    pub days: [DayAvailability; 7],
}

impl WeeklyAvailability {
    /// Lundi–vendredi 08:00–17:00, week-end off.
    pub fn office_hours() -> Self {
        let start = TimeOfDay::from_minutes_wrapping(8 * 60);
        let end = TimeOfDay::from_minutes_wrapping(17 * 60);
        let on = DayAvailability::available(start, end);
        let off = DayAvailability::off(start, end);
        Self { days: [off, on, on, on, on, on, off] }
    }

    pub fn validate(&self) -> Result<()> {
        for (idx, day) in self.days.iter().enumerate() {
            if day.is_available && day.start_time == day.end_time {
                bail!("day {idx}: start_time and end_time cannot be equal");
            }
        }
        Ok(())
    }

    pub fn for_date(&self, date: NaiveDate) -> &DayAvailability {
        &self.days[date.weekday().num_days_from_sunday() as usize]
    }

    /// Vrai si le créneau tient dans la fenêtre du jour de départ.
    pub fn covers(&self, shift: &TimeInterval) -> bool {
        let day = self.for_date(shift.date);
        if !day.is_available {
            return false;
        }
        TimeInterval::new(shift.date, day.start_time, day.end_time).contains(shift)
    }
}

/// Disponibilités par médecin ; un médecin absent n'est pas contraint.
///
/// Chaque semaine est validée, y compris au chargement depuis JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<PhysicianId, WeeklyAvailability>",
    into = "BTreeMap<PhysicianId, WeeklyAvailability>"
)]
pub struct AvailabilityBook {
    entries: BTreeMap<PhysicianId, WeeklyAvailability>,
}

impl TryFrom<BTreeMap<PhysicianId, WeeklyAvailability>> for AvailabilityBook {
    type Error = anyhow::Error;

    fn try_from(entries: BTreeMap<PhysicianId, WeeklyAvailability>) -> Result<Self> {
        for (physician, week) in &entries {
            week.validate()
                .with_context(|| format!("availability of {}", physician.as_str()))?;
        }
        Ok(Self { entries })
    }
}

impl From<AvailabilityBook> for BTreeMap<PhysicianId, WeeklyAvailability> {
    fn from(book: AvailabilityBook) -> Self {
        book.entries
    }
}

impl AvailabilityBook {
    pub fn set(&mut self, physician: PhysicianId, week: WeeklyAvailability) -> Result<()> {
        week.validate()?;
        self.entries.insert(physician, week);
        Ok(())
    }

    pub fn remove(&mut self, physician: &PhysicianId) -> Option<WeeklyAvailability> {
        self.entries.remove(physician)
    }

    pub fn get(&self, physician: &PhysicianId) -> Option<&WeeklyAvailability> {
        self.entries.get(physician)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn weekdays_office() -> WeeklyAvailability {
        WeeklyAvailability::office_hours()
    }

    #[test]
    fn covers_inside_weekday_window() {
        let week = weekdays_office();
        // 2024-01-15 est un lundi
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert!(week.covers(&TimeInterval::new(monday, t("09:00"), t("17:00"))));
        assert!(!week.covers(&TimeInterval::new(monday, t("07:00"), t("12:00"))));
        assert!(!week.covers(&TimeInterval::new(monday, t("22:00"), t("06:00"))));
    }

    #[test]
    fn day_off_never_covers() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert!(!weekdays_office().covers(&TimeInterval::new(sunday, t("09:00"), t("10:00"))));
    }

    #[test]
    fn rejects_zero_length_window() {
        let mut week = weekdays_office();
        week.days[2] = DayAvailability::available(t("08:00"), t("08:00"));
        let mut book = AvailabilityBook::default();
        assert!(book.set(PhysicianId::new("p1"), week).is_err());
        assert!(book.is_empty());
    }

    #[test]
    fn loading_rejects_zero_length_window() {
        let mut week = weekdays_office();
        week.days[3] = DayAvailability::available(t("09:00"), t("09:00"));
        let mut raw = BTreeMap::new();
        raw.insert(PhysicianId::new("p1"), week);
        let json = serde_json::to_string(&raw).unwrap();

        let err = serde_json::from_str::<AvailabilityBook>(&json).unwrap_err();
        assert!(err.to_string().contains("p1"));

        raw.insert(PhysicianId::new("p1"), weekdays_office());
        let json = serde_json::to_string(&raw).unwrap();
        let book: AvailabilityBook = serde_json::from_str(&json).unwrap();
        assert_eq!(book.get(&PhysicianId::new("p1")), Some(&weekdays_office()));
    }
}
