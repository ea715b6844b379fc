use propdesk_core::{
    Action, Deadline, DeadlineKind, EstateStore, Project, ProjectMemberRole, Property,
    PropertyKind, Record, ServiceError, User,
};

struct Team {
    store: EstateStore,
    project: Project,
    owner: User,
    editor: User,
    viewer: User,
    outsider: User,
}

fn team() -> Team {
    let store = EstateStore::open_in_memory().unwrap();
    let projects = store.projects().unwrap();
    let owner = projects
        .register_user("Olivia Owner", "olivia@example.com", None)
        .unwrap();
    let editor = projects
        .register_user("Eli Editor", "eli@example.com", None)
        .unwrap();
    let viewer = projects
        .register_user("Vera Viewer", "vera@example.com", None)
        .unwrap();
    let outsider = projects
        .register_user("Otto Outsider", "otto@example.com", None)
        .unwrap();
    let project = projects.create_project("Harbor portfolio", owner.id).unwrap();
    projects
        .add_member(project.id, editor.id, ProjectMemberRole::Editor, owner.id)
        .unwrap();
    let project = projects
        .add_member(project.id, viewer.id, ProjectMemberRole::Viewer, owner.id)
        .unwrap();
    drop(projects);

    Team {
        store,
        project,
        owner,
        editor,
        viewer,
        outsider,
    }
}

fn loft(project: &Project) -> Property {
    Property::new(
        project.id,
        "APT-1",
        "Harbor loft",
        "1 Quay Street",
        PropertyKind::Apartment,
        54.0,
    )
}

fn assert_forbidden<T: std::fmt::Debug>(
    result: Result<T, ServiceError>,
    expected_role: Option<ProjectMemberRole>,
    expected_action: Action,
) {
    match result {
        Err(ServiceError::Forbidden { role, action }) => {
            assert_eq!(role, expected_role);
            assert_eq!(action, expected_action);
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn viewer_cannot_create_update_or_delete() {
    let team = team();
    let records = team.store.records().unwrap();
    let property = records
        .create(team.project.id, loft(&team.project), team.owner.id)
        .unwrap();

    assert_forbidden(
        records.create(team.project.id, loft(&team.project), team.viewer.id),
        Some(ProjectMemberRole::Viewer),
        Action::CreateRecord,
    );

    let mut edited = property.clone();
    edited.name = "Viewer edit".to_string();
    assert_forbidden(
        records.update(edited, team.viewer.id),
        Some(ProjectMemberRole::Viewer),
        Action::UpdateRecord,
    );

    assert_forbidden(
        records.delete::<Property>(team.project.id, property.id(), team.viewer.id),
        Some(ProjectMemberRole::Viewer),
        Action::DeleteRecord,
    );

    let stored: Property = records.require(team.project.id, property.id()).unwrap();
    assert_eq!(stored, property);
    assert_eq!(records.list::<Property>(team.project.id).unwrap().len(), 1);
}

#[test]
fn viewer_can_still_read_records() {
    let team = team();
    let records = team.store.records().unwrap();
    let property = records
        .create(team.project.id, loft(&team.project), team.owner.id)
        .unwrap();

    let visible = records.list::<Property>(team.project.id).unwrap();
    assert_eq!(visible, vec![property]);
}

#[test]
fn editor_can_write_but_not_view_history() {
    let team = team();
    let records = team.store.records().unwrap();

    let property = records
        .create(team.project.id, loft(&team.project), team.editor.id)
        .unwrap();
    assert_eq!(property.history()[0].user_id, team.editor.id);

    let deadline = records
        .create(
            team.project.id,
            Deadline::new(
                team.project.id,
                property.id(),
                "Boiler inspection",
                9_000,
                DeadlineKind::Inspection,
            ),
            team.editor.id,
        )
        .unwrap();
    let mut done = deadline.clone();
    done.is_completed = true;
    let done = records.update(done, team.editor.id).unwrap();
    assert_eq!(done.history()[1].description, "updated: is_completed");

    let history = team.store.history().unwrap();
    assert_forbidden(
        history.property_feed(team.project.id, property.id(), team.editor.id),
        Some(ProjectMemberRole::Editor),
        Action::ViewHistory,
    );
    assert_forbidden(
        history.record_history::<Property>(team.project.id, property.id(), team.viewer.id),
        Some(ProjectMemberRole::Viewer),
        Action::ViewHistory,
    );
    assert_eq!(
        history
            .property_feed(team.project.id, property.id(), team.owner.id)
            .unwrap()
            .len(),
        3
    );

    records
        .delete::<Deadline>(team.project.id, done.id(), team.editor.id)
        .unwrap();
    assert_eq!(
        history
            .property_feed(team.project.id, property.id(), team.owner.id)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn non_members_are_rejected() {
    let team = team();
    let records = team.store.records().unwrap();

    assert_forbidden(
        records.create(team.project.id, loft(&team.project), team.outsider.id),
        None,
        Action::CreateRecord,
    );
}

#[test]
fn only_the_owner_manages_members() {
    let team = team();
    let projects = team.store.projects().unwrap();

    assert_forbidden(
        projects.change_member_role(
            team.project.id,
            team.viewer.id,
            ProjectMemberRole::Editor,
            team.editor.id,
        ),
        Some(ProjectMemberRole::Editor),
        Action::ManageMembers,
    );
    assert_forbidden(
        projects.delete_project(team.project.id, team.editor.id),
        Some(ProjectMemberRole::Editor),
        Action::DeleteProject,
    );

    let promoted = projects
        .change_member_role(
            team.project.id,
            team.viewer.id,
            ProjectMemberRole::Editor,
            team.owner.id,
        )
        .unwrap();
    assert_eq!(
        promoted.role_of(team.viewer.id),
        Some(ProjectMemberRole::Editor)
    );

    let reloaded = projects.get_project(team.project.id).unwrap().unwrap();
    assert_eq!(
        reloaded.role_of(team.viewer.id),
        Some(ProjectMemberRole::Editor)
    );
}

#[test]
fn owner_cannot_be_removed_or_demoted() {
    let team = team();
    let projects = team.store.projects().unwrap();

    assert!(matches!(
        projects.remove_member(team.project.id, team.owner.id, team.owner.id),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        projects.change_member_role(
            team.project.id,
            team.owner.id,
            ProjectMemberRole::Viewer,
            team.owner.id
        ),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        projects.add_member(
            team.project.id,
            team.outsider.id,
            ProjectMemberRole::Owner,
            team.owner.id
        ),
        Err(ServiceError::Conflict(_))
    ));

    let removed = projects
        .remove_member(team.project.id, team.viewer.id, team.owner.id)
        .unwrap();
    assert_eq!(removed.role_of(team.viewer.id), None);

    let records = team.store.records().unwrap();
    assert_forbidden(
        records.create(team.project.id, loft(&team.project), team.viewer.id),
        None,
        Action::CreateRecord,
    );
}
