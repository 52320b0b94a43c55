//! Domain models for the CourierHub server.

pub mod account;
pub mod package;
pub mod session;
pub mod token;
pub mod user;
pub mod vendor;

pub use account::{LinkedAccount, Provider};
pub use package::{PAYMENT_DIRECTLY_TO_VENDOR, Package, PackageStatus};
pub use session::{SessionRecord, SessionView, session_keys};
pub use token::{AuthToken, TokenType};
pub use user::{PublicUser, User};
pub use vendor::Vendor;
