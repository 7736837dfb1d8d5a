use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::Utc;
use rusqlite::Connection;

use super::lock;
use crate::db::queries;
use crate::models::{Reservation, ReservationData};

/// Append-only log of confirmed reservations. A failed commit is not retried.
pub trait ReservationSink: Send + Sync {
    fn commit(&self, user_id: &str, data: &ReservationData) -> anyhow::Result<Reservation>;

    /// Most recent reservations first. `None` when the sink cannot be read back.
    fn recent(&self, _limit: usize) -> anyhow::Result<Option<Vec<Reservation>>> {
        Ok(None)
    }
}

pub struct SqliteReservationSink {
    db: Arc<Mutex<Connection>>,
}

impl SqliteReservationSink {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

impl ReservationSink for SqliteReservationSink {
    fn commit(&self, user_id: &str, data: &ReservationData) -> anyhow::Result<Reservation> {
        let reservation = Reservation::from_data(user_id, data, Utc::now().naive_utc())?;
        let db = lock(&self.db)?;
        queries::insert_reservation(&db, &reservation).context("failed to insert reservation")?;
        Ok(reservation)
    }

    fn recent(&self, limit: usize) -> anyhow::Result<Option<Vec<Reservation>>> {
        let db = lock(&self.db)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        queries::list_reservations(&db, limit).map(Some)
    }
}

/// One pipe-separated line per reservation:
/// `created_at | nombre | cedula | telefono | cancha | fecha | hora | user_id`.
pub struct FileReservationSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileReservationSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn format_line(reservation: &Reservation) -> String {
        format!(
            "{} | {} | {} | {} | {} | {} | {} | {}\n",
            reservation.created_at.format("%Y-%m-%dT%H:%M:%S"),
            reservation.nombre,
            reservation.cedula,
            reservation.telefono,
            reservation.cancha,
            reservation.fecha,
            reservation.hora,
            reservation.user_id,
        )
    }
}

impl ReservationSink for FileReservationSink {
    fn commit(&self, user_id: &str, data: &ReservationData) -> anyhow::Result<Reservation> {
        let reservation = Reservation::from_data(user_id, data, Utc::now().naive_utc())?;
        let line = Self::format_line(&reservation);

        let _guard = lock(&self.write_lock)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open reservation log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .context("failed to append reservation")?;

        Ok(reservation)
    }
}

#[derive(Default)]
pub struct MemoryReservationSink {
    reservations: Mutex<Vec<Reservation>>,
}

impl MemoryReservationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Reservation> {
        self.reservations
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ReservationSink for MemoryReservationSink {
    fn commit(&self, user_id: &str, data: &ReservationData) -> anyhow::Result<Reservation> {
        let reservation = Reservation::from_data(user_id, data, Utc::now().naive_utc())?;
        lock(&self.reservations)?.push(reservation.clone());
        Ok(reservation)
    }

    fn recent(&self, limit: usize) -> anyhow::Result<Option<Vec<Reservation>>> {
        let reservations = lock(&self.reservations)?;
        Ok(Some(reservations.iter().rev().take(limit).cloned().collect()))
    }
}
