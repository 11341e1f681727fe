use super::{conflicts, util, ConflictFinding, Placement, RuleOptions, SchedError};
use crate::availability::AvailabilityBook;
use crate::interval::TimeOfDay;
use crate::model::{Shift, ShiftFilter, ShiftId, ShiftStatus};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

/// Registre en mémoire des shifts de la fenêtre affichée.
///
/// Les écritures passent par `propose_*` : le registre ne se met jamais
/// lui-même dans un état conflictuel. Les données chargées via
/// [`ShiftRegistry::with_shifts`] ne sont pas vérifiées contre les règles,
/// seulement contre les identifiants en double.
#[derive(Debug, Clone, Default)]
pub struct ShiftRegistry {
    shifts: Vec<Shift>,
    options: RuleOptions,
    availability: AvailabilityBook,
}

impl ShiftRegistry {
    pub fn new(options: RuleOptions) -> Self {
        Self {
            shifts: Vec::new(),
            options,
            availability: AvailabilityBook::default(),
        }
    }

    /// Charge des données externes telles quelles ; un identifiant en double est refusé.
    pub fn with_shifts(options: RuleOptions, shifts: Vec<Shift>) -> Result<Self, SchedError> {
        let mut seen = HashSet::with_capacity(shifts.len());
        for shift in &shifts {
            if !seen.insert(&shift.id) {
                warn!(shift = shift.id.as_str(), "duplicate shift id in loaded data");
                return Err(SchedError::DuplicateShift(shift.id.to_string()));
            }
        }
        Ok(Self {
            shifts,
            options,
            availability: AvailabilityBook::default(),
        })
    }

    pub fn set_availability(&mut self, availability: AvailabilityBook) {
        self.availability = availability;
    }

    pub fn availability(&self) -> &AvailabilityBook {
        &self.availability
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn get(&self, id: &ShiftId) -> Option<&Shift> {
        self.shifts.iter().find(|s| &s.id == id)
    }

    /// Évalue un candidat sans rien modifier.
    pub fn evaluate(&self, candidate: &Shift) -> Vec<ConflictFinding> {
        conflicts::evaluate(candidate, &self.shifts, &self.options, &self.availability)
    }

    /// Insère le shift si aucune règle ne le refuse (tout ou rien).
    pub fn propose_create(&mut self, shift: Shift) -> Result<Placement, SchedError> {
        if self.get(&shift.id).is_some() {
            return Err(SchedError::DuplicateShift(shift.id.to_string()));
        }
        let findings = self.evaluate(&shift);
        if !findings.is_empty() {
            warn!(
                shift = shift.id.as_str(),
                findings = findings.len(),
                "create rejected"
            );
            return Ok(Placement::Rejected(findings));
        }
        let id = shift.id.clone();
        info!(
            shift = id.as_str(),
            physician = shift.physician_id.as_str(),
            date = %shift.date,
            "shift created"
        );
        self.shifts.push(shift);
        Ok(Placement::Committed(id))
    }

    /// Déplace un shift en conservant sa durée ; l'original reste intact en cas de refus.
    pub fn propose_move(
        &mut self,
        id: &ShiftId,
        new_date: NaiveDate,
        new_start: TimeOfDay,
    ) -> Result<Placement, SchedError> {
        let Some(pos) = util::find_shift_index(&self.shifts, id) else {
            return Err(SchedError::UnknownShift(id.to_string()));
        };

        let moved = self.shifts[pos].interval().moved_to(new_date, new_start);
        let mut candidate = self.shifts[pos].clone();
        candidate.date = moved.date;
        candidate.start_time = moved.start;
        candidate.end_time = moved.end;

        let findings = self.evaluate(&candidate);
        if !findings.is_empty() {
            warn!(shift = id.as_str(), findings = findings.len(), "move rejected");
            return Ok(Placement::Rejected(findings));
        }
        info!(
            shift = id.as_str(),
            date = %candidate.date,
            start = %candidate.start_time,
            "shift moved"
        );
        self.shifts[pos] = candidate;
        Ok(Placement::Committed(id.clone()))
    }

    /// Suppression inconditionnelle ; un identifiant inconnu est une erreur.
    pub fn delete(&mut self, id: &ShiftId) -> Result<Shift, SchedError> {
        let Some(pos) = util::find_shift_index(&self.shifts, id) else {
            return Err(SchedError::UnknownShift(id.to_string()));
        };
        info!(shift = id.as_str(), "shift deleted");
        Ok(self.shifts.remove(pos))
    }

    /// Changement de statut, non vérifié contre les règles de placement.
    pub fn set_status(&mut self, id: &ShiftId, status: ShiftStatus) -> Result<(), SchedError> {
        let Some(pos) = util::find_shift_index(&self.shifts, id) else {
            return Err(SchedError::UnknownShift(id.to_string()));
        };
        let shift = &mut self.shifts[pos];
        shift.status = shift.status.transition_to(status)?;
        info!(shift = id.as_str(), status = status.as_str(), "status changed");
        Ok(())
    }

    /// Copie des shifts retenus par le prédicat, dans l'ordre d'insertion.
    pub fn list<F>(&self, predicate: F) -> Vec<Shift>
    where
        F: Fn(&Shift) -> bool,
    {
        self.shifts.iter().filter(|s| predicate(s)).cloned().collect()
    }

    pub fn list_filtered(&self, filter: &ShiftFilter) -> Vec<Shift> {
        self.list(|s| filter.matches(s))
    }

    pub fn snapshot(&self) -> Vec<Shift> {
        self.shifts.clone()
    }

    /// Rejoue les règles sur le contenu actuel, chaque shift contre ceux
    /// insérés avant lui : une paire en conflit n'est signalée qu'une fois.
    pub fn audit(&self) -> Vec<ConflictFinding> {
        let mut out = Vec::new();
        for idx in 0..self.shifts.len() {
            out.extend(conflicts::evaluate(
                &self.shifts[idx],
                &self.shifts[..idx],
                &self.options,
                &self.availability,
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Physician;
    use crate::scheduler::ConflictKind;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn shift(id: &str, who: &Physician, day: u32, start: &str, end: &str, loc: &str) -> Shift {
        let mut s = Shift::new(who, jan(day), t(start), t(end), loc);
        s.id = ShiftId::new(id);
        s
    }

    #[test]
    fn rejected_create_leaves_count_unchanged() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let mut reg = ShiftRegistry::default();
        let first = reg.propose_create(shift("1", &p1, 15, "08:00", "16:00", "A")).unwrap();
        assert_eq!(first, Placement::Committed(ShiftId::new("1")));

        let outcome = reg.propose_create(shift("2", &p1, 15, "15:00", "18:00", "B")).unwrap();
        assert!(!outcome.is_committed());
        assert_eq!(outcome.findings().len(), 1);
        assert_eq!(outcome.findings()[0].kind, ConflictKind::DoubleBooking);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_identifier_is_an_error() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let mut reg = ShiftRegistry::default();
        reg.propose_create(shift("1", &p1, 15, "08:00", "16:00", "A")).unwrap();
        let err = reg.propose_create(shift("1", &p1, 16, "08:00", "16:00", "A")).unwrap_err();
        assert!(matches!(err, SchedError::DuplicateShift(id) if id == "1"));
    }

    #[test]
    fn move_keeps_identity_and_duration() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let mut reg = ShiftRegistry::default();
        reg.propose_create(shift("1", &p1, 15, "08:00", "16:00", "A")).unwrap();

        let outcome = reg.propose_move(&ShiftId::new("1"), jan(16), t("20:00")).unwrap();
        assert!(outcome.is_committed());
        let moved = reg.get(&ShiftId::new("1")).unwrap();
        assert_eq!(moved.date, jan(16));
        assert_eq!(moved.start_time, t("20:00"));
        assert_eq!(moved.end_time, t("04:00"));
        assert_eq!(moved.duration_minutes(), 480);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn move_within_own_slot_does_not_conflict_with_itself() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let mut reg = ShiftRegistry::default();
        reg.propose_create(shift("1", &p1, 15, "08:00", "16:00", "A")).unwrap();
        let outcome = reg.propose_move(&ShiftId::new("1"), jan(15), t("09:00")).unwrap();
        assert!(outcome.is_committed());
    }

    #[test]
    fn rejected_move_leaves_original_untouched() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let p2 = Physician::with_id("P2", "Dr. B", "ER");
        let mut reg = ShiftRegistry::default();
        reg.propose_create(shift("1", &p1, 15, "08:00", "12:00", "OR 1")).unwrap();
        reg.propose_create(shift("2", &p2, 15, "13:00", "17:00", "OR 1")).unwrap();

        let outcome = reg.propose_move(&ShiftId::new("2"), jan(15), t("10:00")).unwrap();
        assert_eq!(outcome.findings()[0].kind, ConflictKind::Overlap);
        let untouched = reg.get(&ShiftId::new("2")).unwrap();
        assert_eq!(untouched.start_time, t("13:00"));
        assert_eq!(untouched.end_time, t("17:00"));
    }

    #[test]
    fn move_unknown_shift_fails() {
        let mut reg = ShiftRegistry::default();
        let err = reg.propose_move(&ShiftId::new("nope"), jan(15), t("09:00")).unwrap_err();
        assert!(matches!(err, SchedError::UnknownShift(_)));
    }

    #[test]
    fn delete_removes_exactly_one_or_errors() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let mut reg = ShiftRegistry::default();
        reg.propose_create(shift("1", &p1, 15, "08:00", "12:00", "")).unwrap();
        reg.propose_create(shift("2", &p1, 16, "08:00", "12:00", "")).unwrap();

        let removed = reg.delete(&ShiftId::new("1")).unwrap();
        assert_eq!(removed.id, ShiftId::new("1"));
        assert_eq!(reg.len(), 1);
        assert!(matches!(reg.delete(&ShiftId::new("1")), Err(SchedError::UnknownShift(_))));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn list_returns_detached_copies() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let mut reg = ShiftRegistry::default();
        reg.propose_create(shift("1", &p1, 15, "08:00", "12:00", "ER")).unwrap();

        let mut listed = reg.list(|_| true);
        listed[0].location = "elsewhere".into();
        assert_eq!(reg.get(&ShiftId::new("1")).unwrap().location, "ER");
    }

    #[test]
    fn status_changes_follow_state_machine() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let mut reg = ShiftRegistry::default();
        reg.propose_create(shift("1", &p1, 15, "08:00", "12:00", "")).unwrap();
        let id = ShiftId::new("1");

        reg.set_status(&id, ShiftStatus::Confirmed).unwrap();
        reg.set_status(&id, ShiftStatus::Completed).unwrap();
        assert!(matches!(
            reg.set_status(&id, ShiftStatus::Cancelled),
            Err(SchedError::InvalidTransition { .. })
        ));
        assert_eq!(reg.get(&id).unwrap().status, ShiftStatus::Completed);
    }

    #[test]
    fn bulk_load_refuses_duplicate_ids() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let err = ShiftRegistry::with_shifts(
            RuleOptions::default(),
            vec![
                shift("1", &p1, 15, "08:00", "12:00", ""),
                shift("2", &p1, 16, "08:00", "12:00", ""),
                shift("1", &p1, 17, "08:00", "12:00", ""),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchedError::DuplicateShift(id) if id == "1"));
    }

    #[test]
    fn audit_reports_preexisting_conflicts_once() {
        let p1 = Physician::with_id("P1", "Dr. A", "ER");
        let reg = ShiftRegistry::with_shifts(
            RuleOptions::default(),
            vec![
                shift("1", &p1, 15, "08:00", "16:00", "A"),
                shift("2", &p1, 15, "15:00", "18:00", "B"),
                shift("3", &p1, 16, "08:00", "16:00", "A"),
            ],
        )
        .unwrap();
        let findings = reg.audit();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].shift_ids, vec![ShiftId::new("1"), ShiftId::new("2")]);
    }
}
