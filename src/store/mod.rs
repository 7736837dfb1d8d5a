pub mod reservations;
pub mod session;

use std::sync::{Mutex, MutexGuard};

pub use reservations::{
    FileReservationSink, MemoryReservationSink, ReservationSink, SqliteReservationSink,
};
pub use session::{MemorySessionStore, SessionStore, SqliteSessionStore};

fn lock<T>(mutex: &Mutex<T>) -> anyhow::Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| anyhow::anyhow!("store lock poisoned"))
}
