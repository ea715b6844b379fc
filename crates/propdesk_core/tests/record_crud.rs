use propdesk_core::{
    Contract, EstateStore, Expense, ExpenseCategory, FileRef, Maintenance, MaintenanceStatus,
    Project, Property, PropertyKind, Record, RecordKind, ServiceError, SteppingClock, TaxType,
    Tenant, User, ValidationError,
};
use uuid::Uuid;

fn seeded_store() -> (EstateStore, User, Project) {
    let store = EstateStore::open_in_memory()
        .unwrap()
        .with_clock(SteppingClock::new(1_000, 10));
    let projects = store.projects().unwrap();
    let owner = projects
        .register_user("Olivia Owner", "olivia@example.com", None)
        .unwrap();
    let project = projects.create_project("Harbor portfolio", owner.id).unwrap();
    drop(projects);
    (store, owner, project)
}

fn apartment(project: &Project, code: &str, surface: f64) -> Property {
    Property::new(
        project.id,
        code,
        "Harbor loft",
        "1 Quay Street",
        PropertyKind::Apartment,
        surface,
    )
}

#[test]
fn create_assigns_identity_and_single_created_entry() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();

    let draft = apartment(&project, "APT-1", 54.0);
    let draft_id = draft.id();
    let created = records.create(project.id, draft, owner.id).unwrap();

    assert_ne!(created.id(), draft_id);
    assert_eq!(created.project_id(), project.id);
    assert_eq!(created.history().len(), 1);
    let entry = &created.history()[0];
    assert_eq!(entry.description, "created");
    assert_eq!(entry.user_id, owner.id);
    assert_eq!(entry.timestamp, created.meta.created_at);

    let loaded: Property = records.require(project.id, created.id()).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn update_appends_exactly_one_entry_and_keeps_prior_entries() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let created = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();
    let created_entry = created.history()[0].clone();

    let mut edited = created.clone();
    edited.name = "Harbor loft (renovated)".to_string();
    edited.surface = 60.0;
    // Caller-side history is ignored; storage is the source of truth.
    edited.meta.history.clear();
    edited.meta.created_at = 0;

    let updated = records.update(edited, owner.id).unwrap();
    assert_eq!(updated.history().len(), 2);
    assert_eq!(updated.history()[0], created_entry);
    assert_eq!(updated.history()[1].description, "updated: name, surface");
    assert!(updated.history()[1].timestamp > created_entry.timestamp);
    assert_eq!(updated.meta.created_at, created.meta.created_at);

    let loaded: Property = records.require(project.id, created.id()).unwrap();
    assert_eq!(loaded.history(), updated.history());
    assert_eq!(loaded.surface, 60.0);
}

#[test]
fn unchanged_update_still_appends_plain_entry() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let created = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();

    let updated = records.update(created, owner.id).unwrap();
    assert_eq!(updated.history().len(), 2);
    assert_eq!(updated.history()[1].description, "updated");
}

#[test]
fn zero_surface_is_rejected_and_nothing_is_written() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();

    let err = records
        .create(project.id, apartment(&project, "APT-0", 0.0), owner.id)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::NotPositive {
            field: "surface",
            ..
        })
    ));
    assert!(records.list::<Property>(project.id).unwrap().is_empty());

    let accepted = records
        .create(project.id, apartment(&project, "APT-1", 1.0), owner.id)
        .unwrap();
    assert_eq!(accepted.surface, 1.0);
}

#[test]
fn invalid_update_leaves_stored_record_untouched() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let created = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();

    let mut edited = created.clone();
    edited.kind = PropertyKind::Other("   ".to_string());
    let err = records.update(edited, owner.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::MissingOtherDetail("kind_other"))
    ));

    let loaded: Property = records.require(project.id, created.id()).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn expense_other_category_keeps_its_label() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let property = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();

    let blank = Expense::new(
        project.id,
        property.id(),
        "Notary",
        120.0,
        ExpenseCategory::Other {
            label: String::new(),
        },
        5_000,
    );
    assert!(matches!(
        records.create(project.id, blank, owner.id),
        Err(ServiceError::Validation(ValidationError::MissingOtherDetail(
            "category_other"
        )))
    ));

    let mut legal = Expense::new(
        project.id,
        property.id(),
        "Notary",
        120.0,
        ExpenseCategory::Other {
            label: "Legal fees".to_string(),
        },
        5_000,
    );
    legal.invoice = Some(FileRef::Link {
        url: "https://files.example.com/invoices/notary.pdf".to_string(),
    });
    let created = records.create(project.id, legal, owner.id).unwrap();

    let loaded: Expense = records.require(project.id, created.id()).unwrap();
    assert_eq!(
        loaded.category,
        ExpenseCategory::Other {
            label: "Legal fees".to_string()
        }
    );
    assert_eq!(loaded.invoice, created.invoice);
}

#[test]
fn tax_expense_round_trips_through_storage() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let property = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();

    let expense = Expense::new(
        project.id,
        property.id(),
        "Municipal tax",
        310.0,
        ExpenseCategory::Taxes {
            tax: TaxType::Other("Tourism levy".to_string()),
            reference_year: 2024,
            details: Some("second installment".to_string()),
        },
        9_000,
    );
    let created = records.create(project.id, expense, owner.id).unwrap();
    let loaded: Expense = records.require(project.id, created.id()).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn missing_references_block_writes() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let ghost = Uuid::new_v4();

    let err = records
        .create(
            project.id,
            Maintenance::new(project.id, ghost, "Fix leak", 2_000),
            owner.id,
        )
        .unwrap_err();
    match err {
        ServiceError::MissingReference { id, .. } => assert_eq!(id, ghost),
        other => panic!("unexpected error: {other}"),
    }
    assert!(records.list::<Maintenance>(project.id).unwrap().is_empty());
}

#[test]
fn orphaned_links_do_not_block_unrelated_edits() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let property = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();
    let tenant = records
        .create(
            project.id,
            Tenant::new(project.id, "Ana", "ana@example.com", "555-0101"),
            owner.id,
        )
        .unwrap();
    let contract = records
        .create(
            project.id,
            Contract::new(project.id, property.id(), tenant.id(), 0, 10_000, 900.0),
            owner.id,
        )
        .unwrap();
    let mut linked = tenant.clone();
    linked.contract_id = Some(contract.id());
    let linked = records.update(linked, owner.id).unwrap();
    let expense = records
        .create(
            project.id,
            Expense::new(
                project.id,
                property.id(),
                "Insurance",
                200.0,
                ExpenseCategory::Insurance,
                100,
            ),
            owner.id,
        )
        .unwrap();

    records
        .delete::<Contract>(project.id, contract.id(), owner.id)
        .unwrap();
    records
        .delete::<Property>(project.id, property.id(), owner.id)
        .unwrap();

    let mut new_phone = linked.clone();
    new_phone.phone = "555-0199".to_string();
    let updated = records.update(new_phone, owner.id).unwrap();
    assert_eq!(updated.contract_id, Some(contract.id()));
    assert_eq!(updated.history().last().unwrap().description, "updated: phone");

    let mut cheaper = expense.clone();
    cheaper.amount = 150.0;
    records.update(cheaper, owner.id).unwrap();

    // Pointing at another missing record is still refused.
    let ghost = Uuid::new_v4();
    let mut relinked = updated.clone();
    relinked.contract_id = Some(ghost);
    let err = records.update(relinked, owner.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::MissingReference {
            kind: RecordKind::Contract,
            id,
        } if id == ghost
    ));
}

#[test]
fn updating_unknown_record_is_not_found() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();

    let never_saved = apartment(&project, "APT-9", 40.0);
    let err = records.update(never_saved, owner.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "property",
            ..
        }
    ));
}

#[test]
fn list_for_property_filters_and_keeps_creation_order() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let first = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();
    let second = records
        .create(project.id, apartment(&project, "APT-2", 71.0), owner.id)
        .unwrap();

    for (property, description) in [
        (&first, "Paint hallway"),
        (&second, "Replace lock"),
        (&first, "Fix boiler"),
    ] {
        records
            .create(
                project.id,
                Maintenance::new(project.id, property.id(), description, 3_000),
                owner.id,
            )
            .unwrap();
    }

    let for_first: Vec<Maintenance> = records.list_for_property(project.id, first.id()).unwrap();
    let descriptions: Vec<&str> = for_first.iter().map(|m| m.description.as_str()).collect();
    assert_eq!(descriptions, vec!["Paint hallway", "Fix boiler"]);
    assert!(for_first
        .iter()
        .all(|item| item.status == MaintenanceStatus::Pending));

    assert_eq!(records.list::<Maintenance>(project.id).unwrap().len(), 3);
    assert_eq!(records.list::<Property>(project.id).unwrap().len(), 2);
}

#[test]
fn delete_removes_record_but_keeps_history_rows() {
    let (store, owner, project) = seeded_store();
    let records = store.records().unwrap();
    let created = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();

    records
        .delete::<Property>(project.id, created.id(), owner.id)
        .unwrap();
    assert!(records
        .get::<Property>(project.id, created.id())
        .unwrap()
        .is_none());

    let history_rows: i64 = store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM history_logs WHERE owner_id = ?1;",
            [created.id().to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(history_rows, 1);

    let err = records
        .delete::<Property>(project.id, created.id(), owner.id)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[test]
fn records_are_invisible_from_other_projects() {
    let (store, owner, project) = seeded_store();
    let other_project = store
        .projects()
        .unwrap()
        .create_project("Second portfolio", owner.id)
        .unwrap();
    let records = store.records().unwrap();
    let created = records
        .create(project.id, apartment(&project, "APT-1", 54.0), owner.id)
        .unwrap();

    assert!(records
        .get::<Property>(other_project.id, created.id())
        .unwrap()
        .is_none());
    assert!(records
        .list::<Property>(other_project.id)
        .unwrap()
        .is_empty());
}
