use propdesk_core::{
    Contract, CustomFieldType, CustomFieldsExt, Deadline, DeadlineKind, Document, DocumentKind,
    EstateStore, Expense, ExpenseCategory, FileRef, HistoryLog, Maintenance, MaintenanceStatus,
    ProjectMemberRole, ProjectSnapshot, Property, PropertyKind, Record, ServiceError,
    SteppingClock, Tenant, UtilityType,
};
use uuid::Uuid;

fn populated_store() -> (EstateStore, Uuid) {
    let store = EstateStore::open_in_memory()
        .unwrap()
        .with_clock(SteppingClock::new(1_700_000_000_000, 1_000));
    let projects = store.projects().unwrap();
    let records = store.records().unwrap();

    let owner = projects
        .register_user("Olivia", "olivia@example.com", None)
        .unwrap();
    let editor = projects
        .register_user("Eli", "eli@example.com", None)
        .unwrap();
    let project = projects.create_project("Snapshot", owner.id).unwrap();
    projects
        .add_member(project.id, editor.id, ProjectMemberRole::Editor, owner.id)
        .unwrap();

    let mut draft = Property::new(
        project.id,
        "APT-7",
        "Corner flat",
        "7 Market Square",
        PropertyKind::Other("Loft conversion".to_string()),
        82.5,
    );
    draft.rooms = Some(2);
    draft.image_url = Some("https://img.example.com/apt-7.png".to_string());
    draft
        .custom_fields
        .add_field("Lift access", CustomFieldType::Boolean);
    let property = records.create(project.id, draft, owner.id).unwrap();

    let tenant = records
        .create(
            project.id,
            Tenant::new(project.id, "Ana", "ana@example.com", "555-0101"),
            editor.id,
        )
        .unwrap();
    let mut contract = Contract::new(
        project.id,
        property.id(),
        tenant.id(),
        1_700_000_000_000,
        1_731_536_000_000,
        1_100.0,
    );
    contract.deposit = Some(2_200.0);
    records.create(project.id, contract, editor.id).unwrap();

    let mut expense = Expense::new(
        project.id,
        property.id(),
        "Water",
        41.3,
        ExpenseCategory::Utilities {
            utility: UtilityType::Water,
            provider: Some("City Water".to_string()),
            details: None,
        },
        1_700_100_000_000,
    );
    expense.invoice = Some(FileRef::Embedded {
        file_name: "water.pdf".to_string(),
        data_url: "data:application/pdf;base64,aGVsbG8=".to_string(),
    });
    records.create(project.id, expense, editor.id).unwrap();

    let maintenance = records
        .create(
            project.id,
            Maintenance::new(project.id, property.id(), "Window seal", 1_700_200_000_000),
            editor.id,
        )
        .unwrap();
    let mut started = maintenance.clone();
    started.status = MaintenanceStatus::InProgress;
    started.cost = Some(150.0);
    records.update(started, owner.id).unwrap();

    records
        .create(
            project.id,
            Deadline::new(
                project.id,
                property.id(),
                "Lease renewal",
                1_731_000_000_000,
                DeadlineKind::Other("Notice period".to_string()),
            ),
            owner.id,
        )
        .unwrap();
    records
        .create(
            project.id,
            Document::new(
                project.id,
                property.id(),
                "Energy certificate",
                DocumentKind::Certificate,
                1_700_300_000_000,
            ),
            owner.id,
        )
        .unwrap();

    drop(records);
    drop(projects);
    (store, project.id)
}

#[test]
fn snapshot_round_trips_through_json_into_a_fresh_store() {
    let (source, project_id) = populated_store();
    let snapshot = source.load(project_id).unwrap();
    assert_eq!(snapshot.record_count(), 7);
    assert_eq!(snapshot.users.len(), 2);
    assert_eq!(snapshot.maintenance[0].history().len(), 2);

    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let parsed: ProjectSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snapshot);

    let target = EstateStore::open_in_memory().unwrap();
    target.save(&parsed, parsed.project.owner_id).unwrap();
    let reloaded = target.load(project_id).unwrap();
    assert_eq!(reloaded, snapshot);
}

#[test]
fn saving_twice_does_not_duplicate_history() {
    let (store, project_id) = populated_store();
    let snapshot = store.load(project_id).unwrap();

    let owner = snapshot.project.owner_id;
    store.save(&snapshot, owner).unwrap();
    store.save(&snapshot, owner).unwrap();

    let rows: i64 = store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM history_logs WHERE project_id = ?1;",
            [project_id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 8);
    assert_eq!(store.load(project_id).unwrap(), snapshot);
}

#[test]
fn save_applies_edits_and_appends_new_history() {
    let (store, project_id) = populated_store();
    let mut snapshot = store.load(project_id).unwrap();
    let editor = snapshot.users[1].id;

    let property = &mut snapshot.properties[0];
    property.rent_amount = Some(1_250.0);
    property.meta.history.push(HistoryLog::updated(
        editor,
        &["rent_amount"],
        1_800_000_000_000,
    ));
    store.save(&snapshot, editor).unwrap();

    let reloaded = store.load(project_id).unwrap();
    let property = &reloaded.properties[0];
    assert_eq!(property.rent_amount, Some(1_250.0));
    assert_eq!(property.history().len(), 2);
    assert_eq!(property.history()[1].description, "updated: rent_amount");
}

#[test]
fn foreign_records_abort_the_whole_save() {
    let (source, project_id) = populated_store();
    let mut snapshot = source.load(project_id).unwrap();
    snapshot.documents[0].meta.project_id = Uuid::new_v4();

    let target = EstateStore::open_in_memory().unwrap();
    let err = target.save(&snapshot, snapshot.project.owner_id).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert!(matches!(
        target.load(project_id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn invalid_records_abort_the_whole_save() {
    let (source, project_id) = populated_store();
    let mut snapshot = source.load(project_id).unwrap();
    snapshot.expenses[0].amount = 0.0;

    let target = EstateStore::open_in_memory().unwrap();
    let err = target.save(&snapshot, snapshot.project.owner_id).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(target.load(project_id).is_err());
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("estate.db");
    let (source, project_id) = populated_store();
    let snapshot = source.load(project_id).unwrap();

    let store = EstateStore::open(&path).unwrap();
    store.save(&snapshot, snapshot.project.owner_id).unwrap();
    drop(store);

    let reopened = EstateStore::open(&path).unwrap();
    assert_eq!(reopened.load(project_id).unwrap(), snapshot);
}

#[test]
fn save_audits_silent_edits_and_stamps_new_records() {
    let (store, project_id) = populated_store();
    let mut snapshot = store.load(project_id).unwrap();
    let editor = snapshot.users[1].id;

    snapshot.properties[0].name = "Corner flat (renovated)".to_string();
    let mut fresh = Property::new(
        project_id,
        "APT-8",
        "Garden flat",
        "8 Market Square",
        PropertyKind::Apartment,
        64.0,
    );
    fresh
        .custom_fields
        .add_field("Garden access", CustomFieldType::Boolean);
    let fresh_id = fresh.id();
    snapshot.properties.push(fresh);
    store.save(&snapshot, editor).unwrap();

    let reloaded = store.load(project_id).unwrap();
    let renamed = &reloaded.properties[0];
    assert_eq!(renamed.name, "Corner flat (renovated)");
    assert_eq!(renamed.history().len(), 2);
    let entry = &renamed.history()[1];
    assert_eq!(entry.description, "updated: name");
    assert_eq!(entry.user_id, editor);

    let stamped = reloaded
        .properties
        .iter()
        .find(|property| property.id() == fresh_id)
        .unwrap();
    assert_eq!(stamped.history().len(), 1);
    assert_eq!(stamped.history()[0].description, "created");
    assert_eq!(stamped.history()[0].user_id, editor);
    assert_eq!(stamped.history()[0].timestamp, stamped.meta.created_at);
    assert_eq!(stamped.custom_fields.len(), 1);

    // Untouched records gained nothing.
    assert_eq!(reloaded.tenants, snapshot.tenants);
}

#[test]
fn save_requires_a_role_that_may_write() {
    let (store, project_id) = populated_store();
    let projects = store.projects().unwrap();
    let owner = projects
        .get_project(project_id)
        .unwrap()
        .unwrap()
        .owner_id;
    let stranger = projects
        .register_user("Sam", "sam@example.com", None)
        .unwrap();
    let viewer = projects
        .register_user("Vera", "vera@example.com", None)
        .unwrap();
    projects
        .add_member(project_id, viewer.id, ProjectMemberRole::Viewer, owner)
        .unwrap();
    drop(projects);

    let mut snapshot = store.load(project_id).unwrap();
    snapshot.deadlines[0].is_completed = true;

    assert!(matches!(
        store.save(&snapshot, stranger.id),
        Err(ServiceError::Forbidden { role: None, .. })
    ));
    assert!(matches!(
        store.save(&snapshot, viewer.id),
        Err(ServiceError::Forbidden {
            role: Some(ProjectMemberRole::Viewer),
            ..
        })
    ));
    assert!(!store.load(project_id).unwrap().deadlines[0].is_completed);

    // Editors may write records but not project settings.
    let editor = snapshot.users[1].id;
    let mut renamed = snapshot.clone();
    renamed.project.name = "Taken over".to_string();
    assert!(matches!(
        store.save(&renamed, editor),
        Err(ServiceError::Forbidden {
            role: Some(ProjectMemberRole::Editor),
            ..
        })
    ));
    store.save(&snapshot, editor).unwrap();
    assert!(store.load(project_id).unwrap().deadlines[0].is_completed);
}

#[test]
fn only_the_project_owner_imports_into_a_fresh_store() {
    let (source, project_id) = populated_store();
    let snapshot = source.load(project_id).unwrap();
    let editor = snapshot.users[1].id;

    let target = EstateStore::open_in_memory().unwrap();
    assert!(matches!(
        target.save(&snapshot, editor),
        Err(ServiceError::Forbidden { .. })
    ));
    assert!(target.load(project_id).is_err());
}

#[test]
fn snapshot_cannot_grant_a_second_owner() {
    let (store, project_id) = populated_store();
    let mut snapshot = store.load(project_id).unwrap();
    let owner = snapshot.project.owner_id;
    let editor = snapshot.users[1].id;
    for member in &mut snapshot.project.members {
        if member.user_id == editor {
            member.role = ProjectMemberRole::Owner;
        }
    }

    let err = store.save(&snapshot, owner).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    let stored = store.load(project_id).unwrap().project;
    assert_eq!(stored.role_of(editor), Some(ProjectMemberRole::Editor));

    let target = EstateStore::open_in_memory().unwrap();
    assert!(matches!(
        target.save(&snapshot, owner),
        Err(ServiceError::Conflict(_))
    ));
}

