mod contact;
mod health;

pub use contact::{submit_contact, SUCCESS_BODY};
pub use health::{health_check, root};
