//! Authentication
//!
//! Static service keys for the portal and the scheduler, and signed tokens
//! for unsubscribe links.

pub mod service_key;
pub mod token;

pub use service_key::{cron_auth_middleware, portal_auth_middleware};
pub use token::UnsubscribeSigner;
