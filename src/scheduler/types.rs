use crate::model::ShiftId;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Plafond d'heures sur une fenêtre glissante (règle heures sup').
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimePolicy {
    pub max_hours: u32,
    /// Fenêtre en jours se terminant à la date du candidat (incluse).
    pub window_days: u32,
}

/// Plus longue fenêtre acceptée (une année bissextile).
pub const MAX_WINDOW_DAYS: u32 = 366;

impl OvertimePolicy {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            bail!(
                "window_days must be between 1 and {MAX_WINDOW_DAYS} (got {})",
                self.window_days
            );
        }
        Ok(())
    }
}

impl Default for OvertimePolicy {
    fn default() -> Self {
        Self {
            max_hours: 60,
            window_days: 7,
        }
    }
}

/// Options d'évaluation des règles.
///
/// Par défaut un shift annulé occupe toujours son médecin et son lieu ;
/// `ignore_cancelled` les retire des deux côtés de l'évaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    pub ignore_cancelled: bool,
    pub overtime: Option<OvertimePolicy>,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            ignore_cancelled: false,
            overtime: None,
        }
    }
}

impl RuleOptions {
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let opts: Self = serde_json::from_slice(&data)
            .with_context(|| format!("parsing rule options {}", path.display()))?;
        opts.validate()
            .with_context(|| format!("invalid rule options {}", path.display()))?;
        Ok(opts)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match &self.overtime {
            Some(policy) => policy.validate(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    DoubleBooking,
    Overlap,
    Overtime,
    Unavailable,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::DoubleBooking => "double-booking",
            ConflictKind::Overlap => "overlap",
            ConflictKind::Overtime => "overtime",
            ConflictKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constat produit par une évaluation ; jamais persisté.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictFinding {
    pub kind: ConflictKind,
    pub message: String,
    /// Shift existant d'abord, candidat en dernier.
    pub shift_ids: Vec<ShiftId>,
}

/// Issue d'une proposition de placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Committed(ShiftId),
    Rejected(Vec<ConflictFinding>),
}

impl Placement {
    pub fn is_committed(&self) -> bool {
        matches!(self, Placement::Committed(_))
    }

    pub fn findings(&self) -> &[ConflictFinding] {
        match self {
            Placement::Committed(_) => &[],
            Placement::Rejected(findings) => findings.as_slice(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid time format (expected HH:MM): {0:?}")]
    InvalidTimeFormat(String),
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),
    #[error("invalid time range: start and end cannot be equal")]
    DegenerateInterval,
    #[error("unknown shift: {0}")]
    UnknownShift(String),
    #[error("unknown physician: {0}")]
    UnknownPhysician(String),
    #[error("shift already exists: {0}")]
    DuplicateShift(String),
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
