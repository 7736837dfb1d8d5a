use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{DialogueState, Reservation, ReservationData, Session};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Sessions ──

pub fn get_session(conn: &Connection, id: &str) -> anyhow::Result<Option<Session>> {
    let row = conn
        .query_row(
            "SELECT id, state, data, updated_at FROM sessions WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((id, state_str, data_json, updated_at_str)) = row else {
        return Ok(None);
    };

    let data = serde_json::from_str::<ReservationData>(&data_json).unwrap_or_else(|e| {
        tracing::warn!(user = %id, error = %e, "corrupt session data, starting empty");
        ReservationData::default()
    });

    Ok(Some(Session {
        id,
        state: DialogueState::parse(&state_str),
        data,
        updated_at: parse_ts(&updated_at_str),
    }))
}

pub fn save_session(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    let data_json = serde_json::to_string(&session.data)?;
    let updated_at = session.updated_at.format(TS_FORMAT).to_string();

    conn.execute(
        "INSERT INTO sessions (id, state, data, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           state = excluded.state,
           data = excluded.data,
           updated_at = excluded.updated_at",
        params![session.id, session.state.as_str(), data_json, updated_at],
    )?;
    Ok(())
}

pub fn delete_session(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Reservations ──

pub fn insert_reservation(conn: &Connection, reservation: &Reservation) -> anyhow::Result<()> {
    let created_at = reservation.created_at.format(TS_FORMAT).to_string();

    conn.execute(
        "INSERT INTO reservations (id, user_id, nombre, cedula, telefono, cancha, fecha, hora, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            reservation.id,
            reservation.user_id,
            reservation.nombre,
            reservation.cedula,
            reservation.telefono,
            reservation.cancha,
            reservation.fecha,
            reservation.hora,
            created_at,
        ],
    )?;
    Ok(())
}

pub fn list_reservations(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Reservation>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, nombre, cedula, telefono, cancha, fecha, hora, created_at
         FROM reservations ORDER BY created_at DESC, rowid DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(Reservation {
            id: row.get(0)?,
            user_id: row.get(1)?,
            nombre: row.get(2)?,
            cedula: row.get(3)?,
            telefono: row.get(4)?,
            cancha: row.get(5)?,
            fecha: row.get(6)?,
            hora: row.get(7)?,
            created_at: parse_ts(&row.get::<_, String>(8)?),
        })
    })?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row?);
    }
    Ok(reservations)
}

pub fn count_reservations_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM reservations WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    #[test]
    fn test_session_upsert_last_write_wins() {
        let conn = init_db(":memory:").unwrap();
        assert!(get_session(&conn, "u1").unwrap().is_none());

        let mut session = Session::new("u1");
        session.state = DialogueState::Cedula;
        session.data.nombre = Some("Maria Lopez".into());
        save_session(&conn, &session).unwrap();

        session.data.nombre = Some("Juan Perez".into());
        save_session(&conn, &session).unwrap();

        let loaded = get_session(&conn, "u1").unwrap().unwrap();
        assert_eq!(loaded.state, DialogueState::Cedula);
        assert_eq!(loaded.data.nombre.as_deref(), Some("Juan Perez"));
    }

    #[test]
    fn test_unknown_stored_state_loads_as_unknown() {
        let conn = init_db(":memory:").unwrap();
        conn.execute(
            "INSERT INTO sessions (id, state, data, updated_at) VALUES ('u1', 'HORA', 'not json', '2025-01-01 00:00:00')",
            [],
        )
        .unwrap();

        let loaded = get_session(&conn, "u1").unwrap().unwrap();
        assert_eq!(loaded.state, DialogueState::Unknown);
        assert!(loaded.data.is_empty());
    }

    #[test]
    fn test_reservations_newest_first() {
        let conn = init_db(":memory:").unwrap();
        let data = ReservationData {
            nombre: Some("Maria Lopez".into()),
            cedula: Some("1102234455".into()),
            telefono: Some("0991234567".into()),
            cancha: Some("Básquet 3x3".into()),
            fecha: Some("25/12/2025".into()),
            hora: Some("16h00-18h00".into()),
        };
        let older = parse_ts("2025-12-01 10:00:00");
        let newer = parse_ts("2025-12-02 10:00:00");
        insert_reservation(&conn, &Reservation::from_data("u1", &data, older).unwrap()).unwrap();
        insert_reservation(&conn, &Reservation::from_data("u2", &data, newer).unwrap()).unwrap();

        let listed = list_reservations(&conn, 10).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].user_id, "u2");
        assert_eq!(listed[1].created_at, older);
        assert_eq!(count_reservations_for_user(&conn, "u1").unwrap(), 1);
        assert_eq!(list_reservations(&conn, 1).unwrap().len(), 1);
    }
}
