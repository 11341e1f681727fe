use crate::model::{Physician, PhysicianId, Roster, Shift};
use anyhow::Context;
use chrono::NaiveDate;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Source de données injectée : les échecs remontent à l'appelant.
pub trait Storage {
    /// Charge le roster depuis un support.
    fn load(&self) -> anyhow::Result<Roster>;
    /// Sauvegarde de manière atomique.
    fn save(&self, roster: &Roster) -> anyhow::Result<()>;

    /// Shifts dont la date tombe dans `[from, to]`.
    fn fetch_range(&self, from: NaiveDate, to: NaiveDate) -> anyhow::Result<Vec<Shift>> {
        let roster = self.load()?;
        Ok(roster
            .shifts
            .into_iter()
            .filter(|s| s.date >= from && s.date <= to)
            .collect())
    }
}

/// Annuaire des médecins, en lecture seule pour le cœur.
pub trait PhysicianDirectory {
    fn find(&self, id: &PhysicianId) -> Option<Physician>;
    fn all(&self) -> Vec<Physician>;
}

impl PhysicianDirectory for Roster {
    fn find(&self, id: &PhysicianId) -> Option<Physician> {
        self.find_physician(id).cloned()
    }
    fn all(&self) -> Vec<Physician> {
        self.physicians.clone()
    }
}

impl PhysicianDirectory for Vec<Physician> {
    fn find(&self, id: &PhysicianId) -> Option<Physician> {
        self.iter().find(|p| &p.id == id).cloned()
    }
    fn all(&self) -> Vec<Physician> {
        self.clone()
    }
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self { path: path.as_ref().to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Charge le roster, ou un roster vide si le fichier n'existe pas encore.
    pub fn load_or_default(&self) -> anyhow::Result<Roster> {
        if self.path.exists() {
            self.load()
        } else {
            Ok(Roster::default())
        }
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Roster> {
        let data = fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let roster: Roster = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(roster)
    }

    fn save(&self, roster: &Roster) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(roster)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
