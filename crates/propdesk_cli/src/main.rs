//! Command-line entry point over a PropDesk store file.
//!
//! # Responsibility
//! - Keep the `ping`/`version` smoke output for core linkage checks.
//! - Seed, export, import and inspect project stores.
//!
//! Logging is enabled when `PROPDESK_LOG_DIR` is set.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use propdesk_core::{
    Contract, Deadline, DeadlineKind, Document, DocumentKind, EstateStore, Expense,
    ExpenseCategory, LogSettings, Maintenance, ProjectMemberRole, ProjectSnapshot, Property,
    PropertyKind, Tenant, UtilityType,
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Parser)]
#[command(name = "propdesk", about = "Project-scoped property records", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the core health-check reply
    Ping,
    /// Print the core crate version
    Version,
    /// Create a demo project with one record of each kind
    InitDemo {
        /// Database file, created when missing
        db: PathBuf,
    },
    /// Print a project snapshot as JSON
    Export { db: PathBuf, project_id: Uuid },
    /// Save a JSON project snapshot into the database as `user_id`
    Import {
        db: PathBuf,
        file: PathBuf,
        user_id: Uuid,
    },
    /// Print the merged history of one property, newest first
    Feed {
        db: PathBuf,
        project_id: Uuid,
        property_id: Uuid,
        user_id: Uuid,
    },
}

fn main() -> Result<()> {
    if let Some(settings) = LogSettings::from_env() {
        if let Err(err) = settings.init() {
            eprintln!("logging disabled: {err}");
        }
    }

    let cli = Cli::parse();
    match cli.command {
        None => {
            println!("propdesk_core ping={}", propdesk_core::ping());
            println!("propdesk_core version={}", propdesk_core::core_version());
        }
        Some(Commands::Ping) => println!("{}", propdesk_core::ping()),
        Some(Commands::Version) => println!("{}", propdesk_core::core_version()),
        Some(Commands::InitDemo { db }) => init_demo(&db)?,
        Some(Commands::Export { db, project_id }) => {
            let store = open_store(&db)?;
            let snapshot = store.load(project_id)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Some(Commands::Import { db, file, user_id }) => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading snapshot {}", file.display()))?;
            let snapshot: ProjectSnapshot =
                serde_json::from_str(&raw).context("parsing snapshot JSON")?;
            let store = open_store(&db)?;
            store.save(&snapshot, user_id)?;
            println!(
                "imported project {} ({} records)",
                snapshot.project.id,
                snapshot.record_count()
            );
        }
        Some(Commands::Feed {
            db,
            project_id,
            property_id,
            user_id,
        }) => {
            let store = open_store(&db)?;
            let feed = store
                .history()?
                .property_feed(project_id, property_id, user_id)?;
            for entry in feed {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.log.timestamp,
                    entry.source.as_str(),
                    entry.label,
                    entry.log.description
                );
            }
        }
    }
    Ok(())
}

fn open_store(db: &Path) -> Result<EstateStore> {
    EstateStore::open(db).with_context(|| format!("opening store {}", db.display()))
}

fn init_demo(db: &Path) -> Result<()> {
    let store = open_store(db)?;
    let projects = store.projects()?;
    let records = store.records()?;

    let suffix = Uuid::new_v4().simple().to_string();
    let owner = projects.register_user(
        "Demo Owner",
        &format!("owner-{}@demo.propdesk", &suffix[..8]),
        None,
    )?;
    let viewer = projects.register_user(
        "Demo Viewer",
        &format!("viewer-{}@demo.propdesk", &suffix[..8]),
        None,
    )?;
    let project = projects.create_project("Demo portfolio", owner.id)?;
    projects.add_member(project.id, viewer.id, ProjectMemberRole::Viewer, owner.id)?;

    let mut draft = Property::new(
        project.id,
        "APT-01",
        "Riverside flat",
        "12 Quay Street",
        PropertyKind::Apartment,
        68.0,
    );
    draft.rooms = Some(3);
    draft.rent_amount = Some(950.0);
    let property = records.create(project.id, draft, owner.id)?;

    let tenant = records.create(
        project.id,
        Tenant::new(project.id, "Ana Costa", "ana@example.com", "+351 900 000 000"),
        owner.id,
    )?;
    let start = property.meta.created_at;
    let contract = records.create(
        project.id,
        Contract::new(
            project.id,
            property.meta.id,
            tenant.meta.id,
            start,
            start + 365 * DAY_MS,
            950.0,
        ),
        owner.id,
    )?;
    let mut tenant = tenant;
    tenant.contract_id = Some(contract.meta.id);
    records.update(tenant, owner.id)?;

    records.create(
        project.id,
        Expense::new(
            project.id,
            property.meta.id,
            "Electricity bill",
            84.5,
            ExpenseCategory::Utilities {
                utility: UtilityType::Electricity,
                provider: Some("GridCo".to_string()),
                details: None,
            },
            start,
        ),
        owner.id,
    )?;
    records.create(
        project.id,
        Maintenance::new(project.id, property.meta.id, "Boiler service", start),
        owner.id,
    )?;
    records.create(
        project.id,
        Deadline::new(
            project.id,
            property.meta.id,
            "Rent due",
            start + 30 * DAY_MS,
            DeadlineKind::RentPayment,
        ),
        owner.id,
    )?;
    records.create(
        project.id,
        Document::new(
            project.id,
            property.meta.id,
            "Signed lease",
            DocumentKind::Contract,
            start,
        ),
        owner.id,
    )?;

    info!(
        "event=demo_seed module=cli status=ok project={} property={}",
        project.id, property.meta.id
    );
    println!("project={}", project.id);
    println!("owner={}", owner.id);
    println!("viewer={}", viewer.id);
    println!("property={}", property.meta.id);
    Ok(())
}
