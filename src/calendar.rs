use crate::interval::TimeOfDay;
use crate::model::ShiftStatus;
use crate::scheduler::{SchedError, ShiftRegistry};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Vue du calendrier ; les semaines commencent le lundi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CalendarView {
    Day,
    Week,
    Month,
}

impl CalendarView {
    /// Bornes incluses de la fenêtre affichée autour de `anchor`.
    pub fn window(self, anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            CalendarView::Day => (anchor, anchor),
            CalendarView::Week => {
                let start = anchor - Duration::days(i64::from(anchor.weekday().num_days_from_monday()));
                (start, start + Duration::days(6))
            }
            CalendarView::Month => {
                let start = anchor.with_day(1).unwrap_or(anchor);
                let next = if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
                };
                let end = next.and_then(|n| n.pred_opt()).unwrap_or(start);
                (start, end)
            }
        }
    }
}

/// Case horaire du calendrier où un shift est déposé.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub date: NaiveDate,
    pub hour: u8,
}

impl DropTarget {
    pub fn new(date: NaiveDate, hour: u8) -> Self {
        Self { date, hour }
    }

    pub fn start_time(&self) -> Result<TimeOfDay, SchedError> {
        TimeOfDay::from_hm(self.hour, 0)
    }
}

/// Chiffres du tableau de bord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub physicians: usize,
    pub scheduled_shifts: usize,
    pub scheduled_minutes: u64,
    pub conflicts: usize,
}

impl Summary {
    pub fn compute(registry: &ShiftRegistry, physicians: usize) -> Self {
        let active = registry.list(|s| s.status != ShiftStatus::Cancelled);
        Self {
            physicians,
            scheduled_shifts: active.len(),
            scheduled_minutes: active.iter().map(|s| u64::from(s.duration_minutes())).sum(),
            conflicts: registry.audit().len(),
        }
    }

    pub fn scheduled_hours(&self) -> f64 {
        self.scheduled_minutes as f64 / 60.0
    }
}
