use crate::calendar::{CalendarView, DropTarget};
use crate::interval::TimeOfDay;
use crate::model::{PhysicianId, Shift, ShiftId, ShiftKind, ShiftStatus};
use crate::scheduler::{Placement, RuleOptions, SchedError, ShiftRegistry};
use crate::storage::{PhysicianDirectory, Storage};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Saisie brute d'un formulaire de création.
#[derive(Debug, Clone, Default)]
pub struct ShiftDraft {
    /// Identifiant imposé (import) ; sinon un UUID est tiré.
    pub id: Option<ShiftId>,
    pub physician_id: Option<PhysicianId>,
    pub date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub kind: ShiftKind,
    pub location: String,
    pub notes: Option<String>,
}

/// Couche de séquencement entre les gestes utilisateur et le registre.
pub struct PlacementCoordinator<D> {
    registry: ShiftRegistry,
    directory: D,
}

impl<D: PhysicianDirectory> PlacementCoordinator<D> {
    pub fn new(registry: ShiftRegistry, directory: D) -> Self {
        Self { registry, directory }
    }

    /// Charge la fenêtre visible depuis le stockage ; un échec est propagé.
    pub fn load<S: Storage>(
        storage: &S,
        directory: D,
        options: RuleOptions,
        view: CalendarView,
        anchor: NaiveDate,
    ) -> Result<Self, SchedError> {
        let (from, to) = view.window(anchor);
        let shifts = storage.fetch_range(from, to)?;
        debug!(%from, %to, shifts = shifts.len(), "window loaded");
        Ok(Self::new(ShiftRegistry::with_shifts(options, shifts)?, directory))
    }

    pub fn registry(&self) -> &ShiftRegistry {
        &self.registry
    }
    pub fn registry_mut(&mut self) -> &mut ShiftRegistry {
        &mut self.registry
    }
    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn into_registry(self) -> ShiftRegistry {
        self.registry
    }

    /// Valide le brouillon, tamponne nom et spécialité, puis propose la création.
    pub fn create(&mut self, draft: ShiftDraft) -> Result<Placement, SchedError> {
        let shift = self.build_shift(draft)?;
        let outcome = self.registry.propose_create(shift)?;
        if let Placement::Rejected(findings) = &outcome {
            for finding in findings {
                warn!(kind = finding.kind.as_str(), "{}", finding.message);
            }
        }
        Ok(outcome)
    }

    fn build_shift(&self, draft: ShiftDraft) -> Result<Shift, SchedError> {
        let physician_id = draft
            .physician_id
            .filter(|id| !id.as_str().trim().is_empty())
            .ok_or(SchedError::MissingRequiredField("physician"))?;
        let date = draft.date.ok_or(SchedError::MissingRequiredField("date"))?;
        let start_time: TimeOfDay = draft.start_time.trim().parse()?;
        let end_time: TimeOfDay = draft.end_time.trim().parse()?;
        if start_time == end_time {
            return Err(SchedError::DegenerateInterval);
        }
        let physician = self
            .directory
            .find(&physician_id)
            .ok_or_else(|| SchedError::UnknownPhysician(physician_id.as_str().to_string()))?;

        let mut shift = Shift::new(&physician, date, start_time, end_time, draft.location.trim());
        if let Some(id) = draft.id {
            shift.id = id;
        }
        shift.kind = draft.kind;
        shift.notes = draft.notes.filter(|n| !n.trim().is_empty());
        Ok(shift)
    }

    /// Glisser-déposer : rien n'est modifié si le déplacement est refusé,
    /// l'appelant réaffiche alors la position d'origine.
    pub fn drop_shift(&mut self, id: &ShiftId, target: DropTarget) -> Result<Placement, SchedError> {
        let start = target.start_time()?;
        self.move_shift(id, target.date, start)
    }

    pub fn move_shift(
        &mut self,
        id: &ShiftId,
        date: NaiveDate,
        start: TimeOfDay,
    ) -> Result<Placement, SchedError> {
        self.registry.propose_move(id, date, start)
    }

    pub fn change_status(&mut self, id: &ShiftId, status: ShiftStatus) -> Result<(), SchedError> {
        self.registry.set_status(id, status)
    }

    pub fn delete(&mut self, id: &ShiftId) -> Result<Shift, SchedError> {
        self.registry.delete(id)
    }
}
