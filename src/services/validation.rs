//! Shape checks for each reservation field. Every validator returns the value
//! to store, or `None` when the input must be re-prompted.

use crate::models::{Court, Field};

const MIN_NAME_CHARS: usize = 3;
const MIN_DIGITS: usize = 8;
const MIN_TIME_CHARS: usize = 3;

pub fn validate_name(input: &str) -> Option<String> {
    let name = input.trim();
    (name.chars().count() >= MIN_NAME_CHARS).then(|| name.to_string())
}

pub fn validate_cedula(input: &str) -> Option<String> {
    digits_only(input)
}

pub fn validate_phone(input: &str) -> Option<String> {
    digits_only(input)
}

pub fn validate_court(input: &str) -> Option<String> {
    Court::from_alias(input).map(|c| c.label().to_string())
}

/// `DD/MM/AAAA` by shape only; the calendar is never consulted.
pub fn validate_date(input: &str) -> Option<String> {
    let date = input.trim();
    let parts: Vec<&str> = date.split('/').collect();
    let numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    (parts.len() == 3 && numeric).then(|| date.to_string())
}

pub fn validate_time(input: &str) -> Option<String> {
    let time = input.trim();
    (time.chars().count() >= MIN_TIME_CHARS).then(|| time.to_string())
}

pub fn validate(field: Field, input: &str) -> Option<String> {
    match field {
        Field::Nombre => validate_name(input),
        Field::Cedula => validate_cedula(input),
        Field::Telefono => validate_phone(input),
        Field::Cancha => validate_court(input),
        Field::Fecha => validate_date(input),
        Field::Hora => validate_time(input),
    }
}

fn digits_only(input: &str) -> Option<String> {
    let stripped: String = input
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    let valid = stripped.len() >= MIN_DIGITS && stripped.chars().all(|c| c.is_ascii_digit());
    valid.then_some(stripped)
}
