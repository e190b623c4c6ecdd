//! Outbound collaborators behind small traits so tests can swap them out.

pub mod mail;
pub mod recaptcha;
