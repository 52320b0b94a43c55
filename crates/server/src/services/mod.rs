//! Business logic services.

pub mod auth;
pub mod email;
pub mod oauth;
pub mod rate_limit;
pub mod sessions;
pub mod tokens;
pub mod vendors;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use oauth::{OAuthClient, OAuthError, ProviderUser};
pub use rate_limit::{RateLimitExceeded, RateLimiter};
pub use sessions::{SessionError, SessionService};
pub use tokens::{TokenError, TokenService};
pub use vendors::{VendorError, VendorService};
