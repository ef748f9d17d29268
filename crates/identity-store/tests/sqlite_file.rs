use hrm_core_types::{EmployeeIdentity, NewEmployee};
use identity_store::{IdentityStore, InMemoryIdentityStore, SqliteIdentityStore};

fn identities() -> Vec<EmployeeIdentity> {
    vec![
        NewEmployee::new("Peter", "Griffin")
            .with_middle_name("Lowenbrau")
            .into_identity("A1b2C3d"),
        NewEmployee::new("Lois", "Griffin").into_identity("0042"),
    ]
}

async fn assert_round_trip(store: &dyn IdentityStore, written: &EmployeeIdentity) {
    let by_id = store
        .find_by_id(&written.employee_id)
        .await
        .expect("lookup by id")
        .expect("employee recorded");
    assert_eq!(&by_id, written);

    let by_name = store
        .find_by_name(
            &written.first_name,
            written.middle_name.as_deref(),
            &written.last_name,
        )
        .await
        .expect("lookup by name")
        .expect("employee recorded");
    assert_eq!(&by_name, written);
    assert!(store.exists(&written.employee_id).await.expect("exists"));
}

#[tokio::test]
async fn records_survive_reopening_the_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("employees.db").display()
    );

    {
        let store = SqliteIdentityStore::open(&url).await.expect("open store");
        for identity in identities() {
            store.add(identity).await.expect("add employee");
        }
        store.pool().close().await;
    }

    let store = SqliteIdentityStore::open(&url).await.expect("reopen store");
    for written in identities() {
        assert_round_trip(&store, &written).await;
    }
    assert_eq!(
        store.find_by_id("A1b2C3d").await.expect("lookup").map(|e| e.display_name()),
        Some("Peter Lowenbrau Griffin".to_string())
    );
}

#[tokio::test]
async fn in_memory_store_returns_what_was_written() {
    let store = InMemoryIdentityStore::new();
    for identity in identities() {
        store.add(identity).await.expect("add employee");
    }
    for written in identities() {
        assert_round_trip(&store, &written).await;
    }
}
