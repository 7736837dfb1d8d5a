//! User-facing texts. WhatsApp renders `*...*` as bold.

use crate::models::{Field, ReservationData};

pub const MENU: &str = "🏟️ *Bot Punto AS - Reservas*\n\
\nResponde con una opción:\n\n\
*1)* Hacer una reserva 📆\n\
*2)* Ver información ℹ️ \n\
*3)* Ayuda ❓\n\n\
Escribe 0 para reiniciar.";

pub const INFO: &str = "ℹ️ *Información - Reseva de Canchas - PUNTO AS - Manta*\n\
- *Canchas disponibles:*\n\
\n *A*) Básquet 3x3 🏀\n \
*B*) Ecuavóley/Vóley sala 🏐\n\n\
📍 *Ubicación: Debajo del Puente (Zona Deportiva)*\n\n\
Para reservar, *escribe 1*.\n\
Para volver al menú, *escribe 0*.";

pub const HELP: &str = "❓ *Ayuda:*\n\
*Este bot te ayuda a reservar las canchas del Punto AS*\n\n\
*1)* Elige 1 para hacer una reserva.\n\
*2)* Responde cada pregunta.\n\
*3)* Confirma al final.\n\n\
Puedes escribir *0* en cualquier momento para reiniciar.";

pub const COURT_OPTIONS: &str = "Selecciona la cancha:\n\n\
*A)* Básquet 3x3 🏀\n\
*B)* Ecuavóley/Vóley sala 🏐\n\n\
Responde con *A o B.*";

pub const ASK_NAME: &str = "Perfecto. Escribe tu *nombre completo*:";
pub const CHAT_INTRO: &str = "Perfecto. Cuéntame los datos de tu reserva: \
nombre completo, cédula, teléfono, cancha (A o B), fecha (DD/MM/AAAA) y horario.";

pub const INVALID_CONFIRM: &str = "Opción inválida. Responde 1 (Confirmar) o 2 (Cancelar).";

/// Question asked when `field` is the next one to collect.
pub fn ask(field: Field) -> &'static str {
    match field {
        Field::Nombre => "Escribe tu *nombre completo*:",
        Field::Cedula => "Escribe tu *cédula*:",
        Field::Telefono => "Escribe tu *número de teléfono* (ej: 0999999999):",
        Field::Cancha => COURT_OPTIONS,
        Field::Fecha => "Ingresa la *fecha* (DD/MM/AAAA):",
        Field::Hora => "Ingresa el *horario* (ej: 16h00-18h00):",
    }
}

/// Re-prompt after `field` failed validation.
pub fn invalid(field: Field) -> &'static str {
    match field {
        Field::Nombre => "Tu nombre parece muy corto.\n\nEscribe tu *nombre completo*:",
        Field::Cedula => "Cédula inválida.\n\n Escribe solo números (ej: 1234567890):",
        Field::Telefono => "Teléfono inválido.\n\n Escribe solo números (ej: 0999999999):",
        Field::Cancha => "Opción inválida. Responde con *A o B.*",
        Field::Fecha => "Formato inválido.\n\n Usa *DD/MM/AAAA* (ej: 25/12/2025):",
        Field::Hora => "Horario inválido. Ejemplo: 16h00-18h00",
    }
}

pub fn with_menu(prefix: &str) -> String {
    format!("{prefix}\n\n{MENU}")
}

pub fn reset() -> String {
    with_menu("Listo, reinicié el chat.")
}

pub fn unrecognized_option() -> String {
    with_menu("No entendí, Ingresa de Nuevo la opción")
}

pub fn committed() -> String {
    with_menu("Reserva registrada. ✔️\nGracias. Si quieres hacer otra reserva, escribe 1.")
}

pub fn cancelled() -> String {
    with_menu("Reserva cancelada. ❌")
}

pub fn safety_reset() -> String {
    with_menu("Reinicié el chat por seguridad.")
}

pub fn extraction_failed() -> String {
    with_menu("Tuve un problema entendiendo tu mensaje.")
}

pub fn summary(data: &ReservationData) -> String {
    let v = |f: Field| data.get(f).unwrap_or("");
    format!(
        "*Confirma tu reserva:* 📆\n\n\
         *Nombre:* {}\n\
         *Cédula:* {}\n\
         *Teléfono:* {}\n\
         *Cancha:* {}\n\
         *Fecha:* {}\n\
         *Horario:* {}\n\n\
         Responde:\n\
         *1)* Confirmar\n\
         *2)* Cancelar\n\n\
         Escribe *0* para reiniciar.",
        v(Field::Nombre),
        v(Field::Cedula),
        v(Field::Telefono),
        v(Field::Cancha),
        v(Field::Fecha),
        v(Field::Hora),
    )
}
