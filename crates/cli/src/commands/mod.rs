//! CLI command implementations.

use secrecy::SecretString;

pub mod migrate;
pub mod seed;

/// Database URL from the environment, `COURIERHUB_DATABASE_URL` first with
/// `DATABASE_URL` as the fallback.
pub(crate) fn database_url() -> Option<SecretString> {
    std::env::var("COURIERHUB_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    #[allow(unsafe_code)]
    fn test_database_url_prefers_courierhub_var() {
        // SAFETY: this is the only test touching these variables.
        unsafe {
            std::env::set_var("COURIERHUB_DATABASE_URL", "postgres://primary");
            std::env::set_var("DATABASE_URL", "postgres://fallback");
        }
        let url = database_url().expect("url resolves");
        assert_eq!(url.expose_secret(), "postgres://primary");

        unsafe {
            std::env::remove_var("COURIERHUB_DATABASE_URL");
        }
        let url = database_url().expect("fallback resolves");
        assert_eq!(url.expose_secret(), "postgres://fallback");

        unsafe {
            std::env::remove_var("DATABASE_URL");
        }
        assert!(database_url().is_none());
    }
}
