use crate::coordinator::ShiftDraft;
use crate::model::{Physician, PhysicianId, Roster, Shift, ShiftId, ShiftKind};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;

const EXPORT_HEADER: [&str; 8] = [
    "Date",
    "Physician",
    "Specialty",
    "Start Time",
    "End Time",
    "Type",
    "Location",
    "Status",
];

/// Projection CSV des shifts, dans l'ordre fourni.
pub fn write_shifts_csv<W: Write>(writer: W, shifts: &[Shift]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(EXPORT_HEADER)?;
    for s in shifts {
        let date = s.date.format("%Y-%m-%d").to_string();
        let start = s.start_time.to_string();
        let end = s.end_time.to_string();
        w.write_record([
            date.as_str(),
            s.physician_name.as_str(),
            s.specialty.as_str(),
            start.as_str(),
            end.as_str(),
            s.kind.as_str(),
            s.location.as_str(),
            s.status.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_shifts_csv<P: AsRef<Path>>(path: P, shifts: &[Shift]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_shifts_csv(file, shifts)
}

/// Export JSON du roster (jolie mise en forme)
pub fn export_roster_json<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(roster)?;
    fs::write(path, s)?;
    Ok(())
}

/// Import de médecins : header `name,specialty[,id]`
pub fn import_physicians_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Physician>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        let specialty = rec.get(1).context("missing specialty")?.trim();
        if name.is_empty() || specialty.is_empty() {
            bail!("invalid physician row (empty)");
        }
        let mut physician = Physician::new(name, specialty);
        if let Some(id) = optional(&rec, 2) {
            physician.id = PhysicianId::new(id);
        }
        out.push(physician);
    }
    Ok(out)
}

/// Import de shifts : header
/// `physician_id,date,start_time,end_time[,type][,location][,notes][,id]`.
/// Les brouillons passent ensuite par le coordinateur.
pub fn import_shifts_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ShiftDraft>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_path(path)?;
    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let row = line + 2;
        let date = match optional(&rec, 1) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .with_context(|| format!("row {row}: invalid date {raw}"))?,
            ),
            None => None,
        };
        let kind = match optional(&rec, 4) {
            Some(raw) => raw
                .parse::<ShiftKind>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("row {row}"))?,
            None => ShiftKind::default(),
        };
        out.push(ShiftDraft {
            id: optional(&rec, 7).map(ShiftId::new),
            physician_id: optional(&rec, 0).map(PhysicianId::new),
            date,
            start_time: rec.get(2).unwrap_or_default().trim().to_string(),
            end_time: rec.get(3).unwrap_or_default().trim().to_string(),
            kind,
            location: optional(&rec, 5).unwrap_or_default().to_string(),
            notes: optional(&rec, 6).map(str::to_string),
        });
    }
    Ok(out)
}

fn optional(rec: &StringRecord, idx: usize) -> Option<&str> {
    rec.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn imports_physicians_with_optional_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("physicians.csv");
        fs::write(&path, "name,specialty,id\nDr. A,Cardiology,p1\nDr. B,Surgery,\n").unwrap();
        let physicians = import_physicians_csv(&path).unwrap();
        assert_eq!(physicians.len(), 2);
        assert_eq!(physicians[0].id.as_str(), "p1");
        assert_eq!(physicians[1].specialty, "Surgery");
        assert!(!physicians[1].id.as_str().is_empty());
    }

    #[test]
    fn rejects_empty_physician_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("physicians.csv");
        fs::write(&path, "name,specialty\n,Cardiology\n").unwrap();
        assert!(import_physicians_csv(&path).is_err());
    }

    #[test]
    fn imports_shift_drafts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shifts.csv");
        fs::write(
            &path,
            "physician_id,date,start_time,end_time,type,location,notes\n\
             p1,2024-01-15,22:00,06:00,on-call,ER,\n\
             ,2024-01-16,08:00,16:00\n",
        )
        .unwrap();
        let drafts = import_shifts_csv(&path).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].kind, ShiftKind::OnCall);
        assert_eq!(drafts[0].location, "ER");
        assert!(drafts[0].notes.is_none());
        assert!(drafts[1].physician_id.is_none());
    }

    #[test]
    fn bad_date_points_at_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shifts.csv");
        fs::write(&path, "physician_id,date,start_time,end_time\np1,15/01/2024,08:00,16:00\n")
            .unwrap();
        let err = import_shifts_csv(&path).unwrap_err();
        assert!(format!("{err:#}").contains("row 2"));
    }
}
