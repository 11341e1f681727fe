use crate::availability::AvailabilityBook;
use crate::interval::{TimeInterval, TimeOfDay};
use crate::scheduler::SchedError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifiant fort pour Physician
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhysicianId(String);

impl PhysicianId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Médecin, tel que fourni par l'annuaire externe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Physician {
    pub id: PhysicianId,
    pub name: String,
    pub specialty: String,
}

impl Physician {
    pub fn new<N: Into<String>, S: Into<String>>(name: N, specialty: S) -> Self {
        Self {
            id: PhysicianId::random(),
            name: name.into(),
            specialty: specialty.into(),
        }
    }

    pub fn with_id<I: AsRef<str>, N: Into<String>, S: Into<String>>(
        id: I,
        name: N,
        specialty: S,
    ) -> Self {
        Self {
            id: PhysicianId::new(id),
            name: name.into(),
            specialty: specialty.into(),
        }
    }
}

/// Identifiant fort pour Shift
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftId(String);

impl ShiftId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShiftKind {
    #[default]
    Regular,
    Emergency,
    Surgery,
    OnCall,
}

impl ShiftKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftKind::Regular => "regular",
            ShiftKind::Emergency => "emergency",
            ShiftKind::Surgery => "surgery",
            ShiftKind::OnCall => "on-call",
        }
    }
}

impl std::str::FromStr for ShiftKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(ShiftKind::Regular),
            "emergency" => Ok(ShiftKind::Emergency),
            "surgery" => Ok(ShiftKind::Surgery),
            "on-call" | "oncall" => Ok(ShiftKind::OnCall),
            other => Err(format!("unknown shift type: {other}")),
        }
    }
}

/// Statut d'un shift : `scheduled → confirmed → completed`,
/// `cancelled` depuis `scheduled` ou `confirmed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShiftStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl ShiftStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftStatus::Scheduled => "scheduled",
            ShiftStatus::Confirmed => "confirmed",
            ShiftStatus::Completed => "completed",
            ShiftStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ShiftStatus::Completed | ShiftStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: ShiftStatus) -> bool {
        use ShiftStatus::*;
        matches!(
            (self, next),
            (Scheduled, Confirmed)
                | (Confirmed, Completed)
                | (Scheduled, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    pub fn transition_to(self, next: ShiftStatus) -> Result<ShiftStatus, SchedError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SchedError::InvalidTransition {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(ShiftStatus::Scheduled),
            "confirmed" => Ok(ShiftStatus::Confirmed),
            "completed" => Ok(ShiftStatus::Completed),
            "cancelled" | "canceled" => Ok(ShiftStatus::Cancelled),
            other => Err(format!("unknown shift status: {other}")),
        }
    }
}

/// Créneau de garde. `physician_name` et `specialty` sont dénormalisés
/// à la création pour que le calendrier s'affiche sans l'annuaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub physician_id: PhysicianId,
    pub physician_name: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(rename = "type", default)]
    pub kind: ShiftKind,
    #[serde(default)]
    pub status: ShiftStatus,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Shift {
    /// Shift `scheduled` de type `regular` pour un médecin connu.
    pub fn new(
        physician: &Physician,
        date: NaiveDate,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: ShiftId::random(),
            physician_id: physician.id.clone(),
            physician_name: physician.name.clone(),
            specialty: physician.specialty.clone(),
            date,
            start_time,
            end_time,
            kind: ShiftKind::Regular,
            status: ShiftStatus::Scheduled,
            location: location.into(),
            notes: None,
        }
    }

    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.date, self.start_time, self.end_time)
    }

    /// Durée en minutes (wraparound compris).
    pub fn duration_minutes(&self) -> u32 {
        self.interval().duration_minutes()
    }

    /// Nom à afficher dans les messages ; retombe sur l'identifiant.
    pub fn display_physician(&self) -> &str {
        if self.physician_name.trim().is_empty() {
            self.physician_id.as_str()
        } else {
            &self.physician_name
        }
    }
}

/// Filtre de listing (recherche texte, statut, plage de dates incluse).
#[derive(Debug, Clone, Default)]
pub struct ShiftFilter {
    pub status: Option<ShiftStatus>,
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ShiftFilter {
    pub fn matches(&self, shift: &Shift) -> bool {
        if self.status.is_some_and(|st| st != shift.status) {
            return false;
        }
        if self.from.is_some_and(|d| shift.date < d) || self.to.is_some_and(|d| shift.date > d) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [&shift.physician_name, &shift.specialty, &shift.location]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
        }
    }
}

/// Contenu complet du fichier de données.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Roster {
    #[serde(default)]
    pub physicians: Vec<Physician>,
    #[serde(default)]
    pub shifts: Vec<Shift>,
    #[serde(default)]
    pub availability: AvailabilityBook,
}

impl Roster {
    pub fn find_physician<'a>(&'a self, id: &PhysicianId) -> Option<&'a Physician> {
        self.physicians.iter().find(|p| &p.id == id)
    }
    pub fn find_physician_by_name<'a>(&'a self, name: &str) -> Option<&'a Physician> {
        self.physicians
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine() {
        use ShiftStatus::*;
        assert!(Scheduled.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Scheduled));
        assert!(Completed.is_terminal() && Cancelled.is_terminal());
        assert!(matches!(
            Completed.transition_to(Confirmed),
            Err(SchedError::InvalidTransition { from: "completed", to: "confirmed" })
        ));
    }

    #[test]
    fn shift_record_shape() {
        let json = r#"{
            "id": "1", "physicianId": "p1", "physicianName": "Dr. Sarah Johnson",
            "specialty": "Cardiology", "date": "2024-01-15",
            "startTime": "22:00", "endTime": "06:00",
            "type": "on-call", "status": "confirmed", "location": "ER"
        }"#;
        let shift: Shift = serde_json::from_str(json).unwrap();
        assert_eq!(shift.kind, ShiftKind::OnCall);
        assert_eq!(shift.status, ShiftStatus::Confirmed);
        assert_eq!(shift.duration_minutes(), 480);
        assert!(shift.notes.is_none());

        let back = serde_json::to_value(&shift).unwrap();
        assert_eq!(back["startTime"], "22:00");
        assert_eq!(back["type"], "on-call");
    }

    #[test]
    fn malformed_time_in_record_is_rejected() {
        let json = r#"{
            "id": "1", "physicianId": "p1", "physicianName": "A", "specialty": "B",
            "date": "2024-01-15", "startTime": "25:00", "endTime": "06:00"
        }"#;
        assert!(serde_json::from_str::<Shift>(json).is_err());
    }

    #[test]
    fn filter_matches_search_status_and_dates() {
        let doc = Physician::with_id("p1", "Dr. Emily Rodriguez", "Surgery");
        let date = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let shift = Shift::new(&doc, date, "14:00".parse().unwrap(), "20:00".parse().unwrap(), "OR 3");

        assert!(ShiftFilter::default().matches(&shift));
        let by_search = ShiftFilter { search: Some("surg".into()), ..Default::default() };
        assert!(by_search.matches(&shift));
        let by_location = ShiftFilter { search: Some("or 3".into()), ..Default::default() };
        assert!(by_location.matches(&shift));
        let wrong_status = ShiftFilter { status: Some(ShiftStatus::Cancelled), ..Default::default() };
        assert!(!wrong_status.matches(&shift));
        let out_of_range = ShiftFilter { from: date.succ_opt(), ..Default::default() };
        assert!(!out_of_range.matches(&shift));
    }
}
