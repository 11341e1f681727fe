#![forbid(unsafe_code)]
//! Medplan — planification de gardes de médecins, en mémoire (sans BD).
//!
//! - Intervalles `HH:MM` avec passage de minuit.
//! - Détection de conflits : double réservation, lieu occupé, heures sup', indisponibilité.
//! - Registre à écritures vérifiées (création, déplacement, suppression).
//! - Stockage fichiers (JSON) et export CSV en dehors du cœur.

pub mod availability;
pub mod calendar;
pub mod coordinator;
pub mod interval;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use availability::{AvailabilityBook, DayAvailability, WeeklyAvailability};
pub use calendar::{CalendarView, DropTarget, Summary};
pub use coordinator::{PlacementCoordinator, ShiftDraft};
pub use interval::{TimeInterval, TimeOfDay};
pub use model::{
    Physician, PhysicianId, Roster, Shift, ShiftFilter, ShiftId, ShiftKind, ShiftStatus,
};
pub use scheduler::{
    ConflictFinding, ConflictKind, OvertimePolicy, Placement, RuleOptions, SchedError,
    ShiftRegistry,
};
pub use storage::{JsonStorage, PhysicianDirectory, Storage};
