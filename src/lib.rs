//! Operator tooling for an election server's spool: listing the elections worth
//! monitoring, and mailing voting credentials to a voter list.

#[macro_use]
extern crate log;

pub mod config;
pub mod credentials;
pub mod error;
pub mod liveness;
pub mod logging;
pub mod mailer;
pub mod spool;
pub mod template;
