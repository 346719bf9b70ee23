//! Parcel tracking use-case service.
//!
//! # Responsibility
//! - Register parcels with a creation timestamp.
//! - Advance parcels along the delivery lifecycle.
//! - Write human-readable notices to a caller-chosen sink.
//!
//! # Invariants
//! - Status only advances through `ParcelStatus::next`; `delivered` is terminal.
//! - Address changes and deletes are delegated without a pre-read; the store
//!   guard decides whether anything changes.
//! - Store errors reach the caller unchanged inside `ServiceError::Repo`.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber};
use crate::repo::parcel_repo::{ParcelRepository, RepoError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Stdout, Write};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by tracking service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Store failure, propagated as-is.
    Repo(RepoError),
    /// Listing sink rejected a write.
    Output(io::Error),
}

impl ServiceError {
    /// Returns the underlying store error, if any.
    pub fn as_repo(&self) -> Option<&RepoError> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Output(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(RepoError::NotFound(_)))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to write parcel listing: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<io::Error> for ServiceError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

/// Tracking service over a parcel repository and a notice sink.
pub struct ParcelService<R: ParcelRepository, W: Write = Stdout> {
    repo: R,
    out: W,
}

impl<R: ParcelRepository> ParcelService<R, Stdout> {
    /// Creates a service that writes notices to stdout.
    pub fn new(repo: R) -> Self {
        Self::with_output(repo, io::stdout())
    }
}

impl<R: ParcelRepository, W: Write> ParcelService<R, W> {
    /// Creates a service that writes notices to `out`.
    pub fn with_output(repo: R, out: W) -> Self {
        Self { repo, out }
    }

    /// Consumes the service and returns the notice sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Registers a new parcel for `client` and returns it with its assigned
    /// number.
    ///
    /// # Contract
    /// - Status is `registered`, `created_at` is the current UTC time.
    /// - No notice is written when the store rejects the insert.
    /// - A failing notice sink does not fail an insert that already committed.
    pub fn register(&mut self, client: ClientId, address: &str) -> ServiceResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.repo.add(&parcel).map_err(|err| {
            error!(
                "event=parcel_register module=service status=error client={} error={}",
                client, err
            );
            err
        })?;

        info!(
            "event=parcel_register module=service status=ok number={} client={}",
            parcel.number, parcel.client
        );
        self.notify(format_args!(
            "New parcel #{} to address {} from client {} registered {}",
            parcel.number, parcel.address, parcel.client, parcel.created_at
        ));

        Ok(parcel)
    }

    /// Moves a parcel to the next lifecycle state.
    ///
    /// # Contract
    /// - Missing parcel → `RepoError::NotFound`.
    /// - Terminal parcel → `Ok(())` with no write and no notice.
    /// - A failing notice sink does not fail a committed status change.
    pub fn next_status(&mut self, number: ParcelNumber) -> ServiceResult<()> {
        let parcel = self.repo.get(number)?;
        let Some(next) = parcel.status.next() else {
            return Ok(());
        };

        self.repo.set_status(number, next)?;
        info!(
            "event=parcel_status module=service status=ok number={} from={} to={}",
            number, parcel.status, next
        );
        self.notify(format_args!("Parcel #{number} new status: {next}"));
        Ok(())
    }

    /// Changes the delivery address. Silently ignored unless `registered`.
    pub fn change_address(&mut self, number: ParcelNumber, address: &str) -> ServiceResult<()> {
        self.repo.set_address(number, address)?;
        info!("event=parcel_address module=service status=ok number={number}");
        Ok(())
    }

    /// Deletes the parcel. Silently ignored unless `registered`.
    pub fn delete(&mut self, number: ParcelNumber) -> ServiceResult<()> {
        self.repo.delete(number)?;
        info!("event=parcel_delete module=service status=ok number={number}");
        Ok(())
    }

    /// Writes every parcel of `client`, in store order, followed by a blank line.
    pub fn print_client_parcels(&mut self, client: ClientId) -> ServiceResult<()> {
        let parcels = self.repo.get_by_client(client)?;
        info!(
            "event=parcel_list module=service status=ok client={} count={}",
            client,
            parcels.len()
        );

        writeln!(self.out, "Parcels of client {client}:")?;
        for parcel in &parcels {
            writeln!(
                self.out,
                "Parcel #{} to address {} from client {} registered {}, status {}",
                parcel.number, parcel.address, parcel.client, parcel.created_at, parcel.status
            )?;
        }
        writeln!(self.out)?;
        self.out.flush()?;

        Ok(())
    }

    // The store write has already committed; a lost notice is only logged.
    fn notify(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!("event=notice_write module=service status=error error={err}");
        }
    }
}
