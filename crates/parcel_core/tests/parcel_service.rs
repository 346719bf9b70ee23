use chrono::DateTime;
use parcel_core::db::open_db_in_memory;
use parcel_core::{
    ParcelRepository, ParcelService, ParcelStatus, RepoError, ServiceError,
    SqliteParcelRepository,
};
use std::io::{self, Write};

struct ClosedSink;

impl Write for ClosedSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }
}

fn notices(output: Vec<u8>) -> String {
    String::from_utf8(output).unwrap()
}

#[test]
fn register_assigns_number_and_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, Vec::new());

    let parcel = service.register(1, "A").unwrap();

    assert_ne!(parcel.number, 0);
    assert_eq!(parcel.client, 1);
    assert_eq!(parcel.status, ParcelStatus::Registered);
    assert_eq!(parcel.address, "A");
    assert!(parcel.created_at.ends_with('Z'));
    assert!(DateTime::parse_from_rfc3339(&parcel.created_at).is_ok());
    assert_eq!(repo.get(parcel.number).unwrap(), parcel);

    let output = notices(service.into_output());
    assert_eq!(
        output,
        format!(
            "New parcel #{} to address A from client 1 registered {}\n",
            parcel.number, parcel.created_at
        )
    );
}

#[test]
fn register_propagates_store_failure_without_notice() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    conn.execute_batch("PRAGMA query_only = ON;").unwrap();
    let mut service = ParcelService::with_output(&repo, Vec::new());

    let err = service.register(1, "A").unwrap_err();

    assert!(matches!(err, ServiceError::Repo(RepoError::Db(_))));
    assert!(service.into_output().is_empty());
}

#[test]
fn next_status_walks_chain_and_stops_at_delivered() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, Vec::new());
    let parcel = service.register(1, "A").unwrap();

    service.next_status(parcel.number).unwrap();
    assert_eq!(repo.get(parcel.number).unwrap().status, ParcelStatus::Sent);

    service.next_status(parcel.number).unwrap();
    assert_eq!(
        repo.get(parcel.number).unwrap().status,
        ParcelStatus::Delivered
    );

    service.next_status(parcel.number).unwrap();
    assert_eq!(
        repo.get(parcel.number).unwrap().status,
        ParcelStatus::Delivered
    );

    let output = notices(service.into_output());
    let status_lines: Vec<_> = output
        .lines()
        .filter(|line| line.contains("new status"))
        .collect();
    assert_eq!(
        status_lines,
        vec![
            format!("Parcel #{} new status: sent", parcel.number),
            format!("Parcel #{} new status: delivered", parcel.number),
        ]
    );
}

#[test]
fn next_status_on_missing_parcel_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, Vec::new());

    let err = service.next_status(404).unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err.as_repo(), Some(RepoError::NotFound(404))));
}

#[test]
fn address_change_and_delete_are_noops_after_dispatch() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, Vec::new());

    let parcel = service.register(1, "A").unwrap();

    service.change_address(parcel.number, "B").unwrap();
    assert_eq!(repo.get(parcel.number).unwrap().address, "B");

    service.next_status(parcel.number).unwrap();
    assert_eq!(repo.get(parcel.number).unwrap().status, ParcelStatus::Sent);

    service.change_address(parcel.number, "C").unwrap();
    assert_eq!(repo.get(parcel.number).unwrap().address, "B");

    service.delete(parcel.number).unwrap();
    let kept = repo.get(parcel.number).unwrap();
    assert_eq!(kept.address, "B");
    assert_eq!(kept.status, ParcelStatus::Sent);
}

#[test]
fn delete_removes_registered_parcel() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, Vec::new());
    let parcel = service.register(3, "A").unwrap();

    service.delete(parcel.number).unwrap();

    assert!(matches!(
        repo.get(parcel.number),
        Err(RepoError::NotFound(number)) if number == parcel.number
    ));
}

#[test]
fn registering_twice_lists_two_parcels_for_client() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, Vec::new());

    let first = service.register(8, "A").unwrap();
    let second = service.register(8, "A").unwrap();
    service.register(9, "elsewhere").unwrap();

    let mut listed = repo.get_by_client(8).unwrap();
    listed.sort_by_key(|parcel| parcel.number);
    assert_eq!(listed, vec![first, second]);
}

#[test]
fn print_client_parcels_writes_one_line_per_parcel() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut register = ParcelService::with_output(&repo, Vec::new());
    let first = register.register(2, "North 1").unwrap();
    let second = register.register(2, "South 2").unwrap();
    register.next_status(second.number).unwrap();

    let mut service = ParcelService::with_output(&repo, Vec::new());
    service.print_client_parcels(2).unwrap();
    let output = notices(service.into_output());

    let mut lines = output.lines();
    assert_eq!(lines.next(), Some("Parcels of client 2:"));
    let mut body: Vec<_> = lines.by_ref().take(2).map(str::to_string).collect();
    body.sort();
    assert_eq!(
        body,
        vec![
            format!(
                "Parcel #{} to address North 1 from client 2 registered {}, status registered",
                first.number, first.created_at
            ),
            format!(
                "Parcel #{} to address South 2 from client 2 registered {}, status sent",
                second.number, second.created_at
            ),
        ]
    );
    assert_eq!(lines.next(), Some(""));
    assert_eq!(lines.next(), None);
}

#[test]
fn print_client_parcels_for_unknown_client_prints_header_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, Vec::new());

    service.print_client_parcels(404).unwrap();

    assert_eq!(notices(service.into_output()), "Parcels of client 404:\n\n");
}

#[test]
fn closed_notice_sink_does_not_fail_committed_changes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, ClosedSink);

    let parcel = service.register(6, "A").unwrap();
    assert_eq!(repo.get_by_client(6).unwrap(), vec![parcel.clone()]);

    service.next_status(parcel.number).unwrap();
    assert_eq!(repo.get(parcel.number).unwrap().status, ParcelStatus::Sent);
}

#[test]
fn closed_listing_sink_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let mut service = ParcelService::with_output(&repo, ClosedSink);

    let err = service.print_client_parcels(6).unwrap_err();

    assert!(matches!(err, ServiceError::Output(_)));
}
