use super::{ConflictFinding, ConflictKind, OvertimePolicy, RuleOptions, MAX_WINDOW_DAYS};
use crate::availability::AvailabilityBook;
use crate::model::{Shift, ShiftStatus};
use chrono::{Duration, NaiveDate};
use tracing::debug;

/// Évalue un candidat contre les shifts existants.
///
/// Toutes les règles sont appliquées (pas de court-circuit) et les constats
/// sortent dans l'ordre des règles : double réservation, lieu, heures sup',
/// indisponibilité. Dans une règle, l'ordre est celui de `existing`.
/// Un shift portant le même identifiant que le candidat est ignoré.
pub fn evaluate(
    candidate: &Shift,
    existing: &[Shift],
    opts: &RuleOptions,
    availability: &AvailabilityBook,
) -> Vec<ConflictFinding> {
    if opts.ignore_cancelled && candidate.status == ShiftStatus::Cancelled {
        return Vec::new();
    }

    let others: Vec<&Shift> = existing
        .iter()
        .filter(|s| s.id != candidate.id)
        .filter(|s| !(opts.ignore_cancelled && s.status == ShiftStatus::Cancelled))
        .collect();

    let mut out = double_bookings(candidate, &others);
    out.extend(location_overlaps(candidate, &others));
    if let Some(policy) = opts.overtime {
        out.extend(overtime(candidate, &others, policy));
    }
    out.extend(unavailable(candidate, availability));

    debug!(
        shift = candidate.id.as_str(),
        compared = others.len(),
        findings = out.len(),
        "evaluated placement"
    );
    out
}

/// Même médecin, même date : chevauchement, ou début identique, ou fin identique.
fn double_bookings(candidate: &Shift, others: &[&Shift]) -> Vec<ConflictFinding> {
    let interval = candidate.interval();
    others
        .iter()
        .filter(|s| s.physician_id == candidate.physician_id && s.date == candidate.date)
        .filter(|s| {
            s.start_time == candidate.start_time
                || s.end_time == candidate.end_time
                || s.interval().overlaps(&interval)
        })
        .map(|s| ConflictFinding {
            kind: ConflictKind::DoubleBooking,
            message: format!(
                "{} is already scheduled during this time",
                candidate.display_physician()
            ),
            shift_ids: vec![s.id.clone(), candidate.id.clone()],
        })
        .collect()
}

/// Même lieu non vide, même date, chevauchement strict uniquement.
fn location_overlaps(candidate: &Shift, others: &[&Shift]) -> Vec<ConflictFinding> {
    if candidate.location.is_empty() {
        return Vec::new();
    }
    let interval = candidate.interval();
    others
        .iter()
        .filter(|s| s.location == candidate.location && s.date == candidate.date)
        .filter(|s| s.interval().overlaps(&interval))
        .map(|s| ConflictFinding {
            kind: ConflictKind::Overlap,
            message: format!(
                "Location \"{}\" is already occupied during this time",
                candidate.location
            ),
            shift_ids: vec![s.id.clone(), candidate.id.clone()],
        })
        .collect()
}

/// Cherche la pire fenêtre de `window_days` jours contenant la date du candidat.
/// Les fenêtres qui sortent du calendrier représentable sont ignorées.
fn overtime(candidate: &Shift, others: &[&Shift], policy: OvertimePolicy) -> Option<ConflictFinding> {
    let window = i64::from(policy.window_days.clamp(1, MAX_WINDOW_DAYS));
    let limit = u64::from(policy.max_hours) * 60;
    let same_physician: Vec<&&Shift> = others
        .iter()
        .filter(|s| s.physician_id == candidate.physician_id)
        .collect();

    let mut worst: Option<(u64, NaiveDate, NaiveDate)> = None;
    for offset in 0..window {
        let Some(first) = candidate.date.checked_sub_signed(Duration::days(window - 1 - offset))
        else {
            continue;
        };
        let Some(last) = first.checked_add_signed(Duration::days(window - 1)) else {
            continue;
        };
        let total: u64 = same_physician
            .iter()
            .filter(|s| s.date >= first && s.date <= last)
            .map(|s| u64::from(s.duration_minutes()))
            .sum::<u64>()
            + u64::from(candidate.duration_minutes());
        if total > limit && worst.map_or(true, |(w, _, _)| total > w) {
            worst = Some((total, first, last));
        }
    }

    let (total, first, last) = worst?;
    let mut shift_ids: Vec<_> = same_physician
        .iter()
        .filter(|s| s.date >= first && s.date <= last)
        .map(|s| s.id.clone())
        .collect();
    shift_ids.push(candidate.id.clone());

    Some(ConflictFinding {
        kind: ConflictKind::Overtime,
        message: format!(
            "{} would be scheduled {}h{:02} within {} days (limit {}h)",
            candidate.display_physician(),
            total / 60,
            total % 60,
            window,
            policy.max_hours
        ),
        shift_ids,
    })
}

fn unavailable(candidate: &Shift, availability: &AvailabilityBook) -> Option<ConflictFinding> {
    let week = availability.get(&candidate.physician_id)?;
    if week.covers(&candidate.interval()) {
        return None;
    }
    Some(ConflictFinding {
        kind: ConflictKind::Unavailable,
        message: format!(
            "{} is not available during this time",
            candidate.display_physician()
        ),
        shift_ids: vec![candidate.id.clone()],
    })
}
