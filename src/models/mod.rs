pub mod extraction;
pub mod reservation;
pub mod session;

pub use extraction::{ExtractedFields, Extraction, Intent};
pub use reservation::{Court, Field, Reservation, ReservationData};
pub use session::{DialogueState, Session};
