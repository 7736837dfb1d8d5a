pub mod ai;
pub mod assistant;
pub mod conversation;
pub mod dialogue;
pub mod replies;
pub mod validation;
