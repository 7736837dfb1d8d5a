use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Court {
    Basketball,
    Volleyball,
}

impl Court {
    pub fn label(&self) -> &'static str {
        match self {
            Court::Basketball => "Básquet 3x3",
            Court::Volleyball => "Ecuavóley/Vóley sala",
        }
    }

    /// Matches the menu letter or one of the sport names, ignoring case.
    pub fn from_alias(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "a" | "basquet" | "basket" | "básquet" => Some(Court::Basketball),
            "b" | "ecuavoley" | "ecuavóley" | "voley" | "vóley" => Some(Court::Volleyball),
            _ => None,
        }
    }
}

/// Reservation fields collected so far. Every field stays `None` until it has
/// passed its validator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationData {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub cedula: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub cancha: Option<String>,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub hora: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Nombre,
    Cedula,
    Telefono,
    Cancha,
    Fecha,
    Hora,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Nombre,
        Field::Cedula,
        Field::Telefono,
        Field::Cancha,
        Field::Fecha,
        Field::Hora,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Nombre => "nombre",
            Field::Cedula => "cedula",
            Field::Telefono => "telefono",
            Field::Cancha => "cancha",
            Field::Fecha => "fecha",
            Field::Hora => "hora",
        }
    }
}

impl ReservationData {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Nombre => &self.nombre,
            Field::Cedula => &self.cedula,
            Field::Telefono => &self.telefono,
            Field::Cancha => &self.cancha,
            Field::Fecha => &self.fecha,
            Field::Hora => &self.hora,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Nombre => &mut self.nombre,
            Field::Cedula => &mut self.cedula,
            Field::Telefono => &mut self.telefono,
            Field::Cancha => &mut self.cancha,
            Field::Fecha => &mut self.fecha,
            Field::Hora => &mut self.hora,
        };
        *slot = Some(value);
    }

    pub fn first_missing(&self) -> Option<Field> {
        Field::ALL.into_iter().find(|f| self.get(*f).is_none())
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.into_iter().all(|f| self.get(f).is_none())
    }
}

/// A confirmed reservation as written to the reservation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub nombre: String,
    pub cedula: String,
    pub telefono: String,
    pub cancha: String,
    pub fecha: String,
    pub hora: String,
    pub created_at: NaiveDateTime,
}

impl Reservation {
    /// Builds the persisted record, refusing data with any empty field.
    pub fn from_data(
        user_id: &str,
        data: &ReservationData,
        created_at: NaiveDateTime,
    ) -> anyhow::Result<Self> {
        let field = |f: Field| {
            data.get(f)
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("reservation is missing {}", f.as_str()))
        };

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            nombre: field(Field::Nombre)?,
            cedula: field(Field::Cedula)?,
            telefono: field(Field::Telefono)?,
            cancha: field(Field::Cancha)?,
            fecha: field(Field::Fecha)?,
            hora: field(Field::Hora)?,
            created_at,
        })
    }
}
