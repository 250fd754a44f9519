use std::{
    fmt,
    fmt::{Debug, Display},
};

/// Keeps sensitive configuration values out of the logs.
///
/// The server config wraps the token signing key (`CR_AUTH_SECRET`) and the admin shared secret
/// (`CR_ADMIN_SECRET`) in this type, so a stray `{config:?}` in a log line prints `****` instead of
/// the key material. Reading the value requires an explicit [`Secret::reveal`] call.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secrets_never_leak_through_formatting() {
        let signing_key = Secret::new("hmac-signing-key".to_string());
        assert_eq!(format!("{signing_key}"), "****");
        assert_eq!(format!("{signing_key:?}"), "****");
        assert_eq!(format!("{signing_key:#?}"), "****");
    }

    #[test]
    fn reveal_returns_the_wrapped_value() {
        let admin_secret = Secret::new("admin-shared-secret".to_string());
        assert_eq!(admin_secret.reveal(), "admin-shared-secret");
    }
}
