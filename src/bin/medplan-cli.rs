#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use medplan::{
    io,
    storage::{JsonStorage, Storage},
    CalendarView, ConflictFinding, DayAvailability, DropTarget, OvertimePolicy, Physician,
    PhysicianId, Placement, PlacementCoordinator, Roster, RuleOptions, ShiftDraft, ShiftFilter,
    ShiftId, ShiftKind, ShiftRegistry, ShiftStatus, Summary, TimeOfDay, WeeklyAvailability,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification des gardes (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de données
    #[arg(long, global = true, default_value = "schedule.json")]
    data: String,

    /// Options de règles (JSON), surchargées par les drapeaux ci-dessous
    #[arg(long, global = true)]
    rules: Option<String>,

    /// Plafond d'heures sur la fenêtre glissante (active la règle heures sup')
    #[arg(long, global = true)]
    max_hours: Option<u32>,

    #[arg(long, global = true, default_value_t = 7)]
    window_days: u32,

    /// Les shifts annulés ne bloquent plus ni médecin ni lieu
    #[arg(long, global = true)]
    ignore_cancelled: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ajouter un médecin à l'annuaire
    AddPhysician {
        #[arg(long)]
        name: String,
        #[arg(long)]
        specialty: String,
        #[arg(long)]
        id: Option<String>,
    },

    /// Importer des médecins depuis un CSV
    ImportPhysicians {
        #[arg(long)]
        csv: String,
    },

    /// Importer des shifts depuis un CSV (chaque ligne est vérifiée)
    ImportShifts {
        #[arg(long)]
        csv: String,
    },

    /// Régler la disponibilité d'un médecin pour un jour (0 = dimanche)
    Availability {
        #[arg(long)]
        physician: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
        day: Option<u8>,
        #[arg(long, default_value = "08:00")]
        start: String,
        #[arg(long, default_value = "17:00")]
        end: String,
        #[arg(long)]
        off: bool,
        /// Supprime toute contrainte de disponibilité
        #[arg(long)]
        clear: bool,
    },

    /// Créer un shift
    Create {
        #[arg(long)]
        physician: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        start: String,
        /// HH:MM (inférieur au début = passe minuit)
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "regular")]
        kind: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Déplacer un shift (durée conservée)
    Move {
        #[arg(long)]
        shift_id: String,
        #[arg(long)]
        date: String,
        /// HH:MM ; exclusif avec --hour
        #[arg(long, conflicts_with = "hour")]
        start: Option<String>,
        /// Case horaire du calendrier (0-23)
        #[arg(long)]
        hour: Option<u8>,
    },

    /// Changer le statut d'un shift
    Status {
        #[arg(long)]
        shift_id: String,
        #[arg(long)]
        status: String,
    },

    /// Supprimer un shift
    Delete {
        #[arg(long)]
        shift_id: String,
    },

    /// Lister les shifts
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, value_enum)]
        view: Option<CalendarView>,
        /// Date d'ancrage de la vue (défaut : aujourd'hui)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Export CSV des shifts
    Export {
        #[arg(long)]
        out: String,
    },

    /// Vérifier les conflits sur les données existantes
    Check {
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Chiffres du tableau de bord
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let opts = rule_options(&cli)?;
    let storage = JsonStorage::open(&cli.data)?;
    let mut roster = storage.load_or_default()?;

    let code = match cli.cmd {
        Commands::AddPhysician { name, specialty, id } => {
            let physician = match id {
                Some(id) => Physician::with_id(id, name, specialty),
                None => Physician::new(name, specialty),
            };
            if roster.find_physician(&physician.id).is_some() {
                bail!("physician already exists: {}", physician.id.as_str());
            }
            println!("{}", physician.id.as_str());
            roster.physicians.push(physician);
            storage.save(&roster)?;
            0
        }
        Commands::ImportPhysicians { csv } => {
            let physicians = io::import_physicians_csv(csv)?;
            println!("imported {} physician(s)", physicians.len());
            roster.physicians.extend(physicians);
            storage.save(&roster)?;
            0
        }
        Commands::ImportShifts { csv } => {
            let drafts = io::import_shifts_csv(csv)?;
            let mut coordinator = coordinator(&roster, opts)?;
            let mut rejected = 0usize;
            for draft in drafts {
                if let Placement::Rejected(findings) = coordinator.create(draft)? {
                    rejected += 1;
                    print_findings(&findings);
                }
            }
            roster.shifts = coordinator.registry().snapshot();
            storage.save(&roster)?;
            if rejected == 0 {
                0
            } else {
                eprintln!("{rejected} shift(s) rejected");
                2
            }
        }
        Commands::Availability {
            physician,
            day,
            start,
            end,
            off,
            clear,
        } => {
            let pid = resolve_physician(&roster, &physician)?;
            if clear {
                roster.availability.remove(&pid);
            } else {
                let day = day.context("--day is required unless --clear is given")?;
                let start: TimeOfDay = start.parse()?;
                let end: TimeOfDay = end.parse()?;
                let mut week = roster
                    .availability
                    .get(&pid)
                    .cloned()
                    .unwrap_or_else(WeeklyAvailability::office_hours);
                week.days[usize::from(day)] = if off {
                    DayAvailability::off(start, end)
                } else {
                    DayAvailability::available(start, end)
                };
                roster.availability.set(pid, week)?;
            }
            storage.save(&roster)?;
            0
        }
        Commands::Create {
            physician,
            date,
            start,
            end,
            kind,
            location,
            notes,
        } => {
            let draft = ShiftDraft {
                id: None,
                physician_id: Some(resolve_physician(&roster, &physician)?),
                date: Some(parse_date(&date)?),
                start_time: start,
                end_time: end,
                kind: kind.parse::<ShiftKind>().map_err(anyhow::Error::msg)?,
                location,
                notes,
            };
            let mut coordinator = coordinator(&roster, opts)?;
            match coordinator.create(draft)? {
                Placement::Committed(id) => {
                    println!("{id}");
                    roster.shifts = coordinator.registry().snapshot();
                    storage.save(&roster)?;
                    0
                }
                Placement::Rejected(findings) => {
                    print_findings(&findings);
                    2
                }
            }
        }
        Commands::Move {
            shift_id,
            date,
            start,
            hour,
        } => {
            let sid = ShiftId::new(shift_id);
            let date = parse_date(&date)?;
            let mut coordinator = coordinator(&roster, opts)?;
            let outcome = match (start, hour) {
                (Some(start), _) => coordinator.move_shift(&sid, date, start.parse()?)?,
                (None, Some(hour)) => coordinator.drop_shift(&sid, DropTarget::new(date, hour))?,
                (None, None) => bail!("either --start or --hour is required"),
            };
            match outcome {
                Placement::Committed(_) => {
                    roster.shifts = coordinator.registry().snapshot();
                    storage.save(&roster)?;
                    0
                }
                Placement::Rejected(findings) => {
                    print_findings(&findings);
                    2
                }
            }
        }
        Commands::Status { shift_id, status } => {
            let status = status.parse::<ShiftStatus>().map_err(anyhow::Error::msg)?;
            let mut coordinator = coordinator(&roster, opts)?;
            coordinator.change_status(&ShiftId::new(shift_id), status)?;
            roster.shifts = coordinator.registry().snapshot();
            storage.save(&roster)?;
            0
        }
        Commands::Delete { shift_id } => {
            let mut coordinator = coordinator(&roster, opts)?;
            coordinator.delete(&ShiftId::new(shift_id))?;
            roster.shifts = coordinator.registry().snapshot();
            storage.save(&roster)?;
            0
        }
        Commands::List {
            search,
            status,
            view,
            date,
            out_json,
        } => {
            let mut filter = ShiftFilter {
                search,
                status: status
                    .map(|s| s.parse::<ShiftStatus>().map_err(anyhow::Error::msg))
                    .transpose()?,
                ..ShiftFilter::default()
            };
            if let Some(view) = view {
                let anchor = match date {
                    Some(raw) => parse_date(&raw)?,
                    None => Local::now().date_naive(),
                };
                let (from, to) = view.window(anchor);
                filter.from = Some(from);
                filter.to = Some(to);
            }
            if let Some(path) = out_json {
                io::export_roster_json(path, &roster)?;
            }
            // impression compacte
            let registry = ShiftRegistry::with_shifts(opts, roster.shifts.clone())?;
            for s in registry.list_filtered(&filter) {
                println!(
                    "{} | {} {}–{} | {} ({}) | {} | {} | {}",
                    s.id,
                    s.date,
                    s.start_time,
                    s.end_time,
                    s.physician_name,
                    s.specialty,
                    s.kind.as_str(),
                    if s.location.is_empty() { "-" } else { s.location.as_str() },
                    s.status.as_str()
                );
            }
            0
        }
        Commands::Export { out } => {
            io::export_shifts_csv(out, &roster.shifts)?;
            0
        }
        Commands::Check { report } => {
            let registry = registry(&roster, opts)?;
            let findings = registry.audit();
            if findings.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", findings.len());
                print_findings(&findings);
                if let Some(path) = report {
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["kind", "shifts", "message"])?;
                    for f in &findings {
                        let ids: Vec<&str> = f.shift_ids.iter().map(ShiftId::as_str).collect();
                        let ids = ids.join(";");
                        w.write_record([f.kind.as_str(), ids.as_str(), f.message.as_str()])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Summary => {
            let summary = Summary::compute(&registry(&roster, opts)?, roster.physicians.len());
            println!("Total physicians: {}", summary.physicians);
            println!("Scheduled shifts: {}", summary.scheduled_shifts);
            println!("Hours scheduled: {:.1}", summary.scheduled_hours());
            println!("Conflicts: {}", summary.conflicts);
            0
        }
    };

    std::process::exit(code);
}

fn rule_options(cli: &Cli) -> Result<RuleOptions> {
    let mut opts = match &cli.rules {
        Some(path) => RuleOptions::from_path(path)?,
        None => RuleOptions::default(),
    };
    if let Some(max_hours) = cli.max_hours {
        opts.overtime = Some(OvertimePolicy {
            max_hours,
            window_days: cli.window_days,
        });
    }
    if cli.ignore_cancelled {
        opts.ignore_cancelled = true;
    }
    opts.validate()?;
    Ok(opts)
}

fn registry(roster: &Roster, opts: RuleOptions) -> Result<ShiftRegistry> {
    let mut registry = ShiftRegistry::with_shifts(opts, roster.shifts.clone())?;
    registry.set_availability(roster.availability.clone());
    Ok(registry)
}

fn coordinator(roster: &Roster, opts: RuleOptions) -> Result<PlacementCoordinator<Vec<Physician>>> {
    Ok(PlacementCoordinator::new(registry(roster, opts)?, roster.physicians.clone()))
}

/// Accepte un identifiant ou un nom exact (insensible à la casse).
fn resolve_physician(roster: &Roster, raw: &str) -> Result<PhysicianId> {
    let id = PhysicianId::new(raw);
    if roster.find_physician(&id).is_some() {
        return Ok(id);
    }
    roster
        .find_physician_by_name(raw)
        .map(|p| p.id.clone())
        .ok_or_else(|| anyhow::anyhow!("unknown physician: {raw}"))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn print_findings(findings: &[ConflictFinding]) {
    for f in findings {
        let ids: Vec<&str> = f.shift_ids.iter().map(ShiftId::as_str).collect();
        eprintln!("[{}] {} ({})", f.kind, f.message, ids.join(", "));
    }
}
