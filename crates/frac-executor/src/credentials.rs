//! Trading credentials.
//!
//! The private key gates whether a signing client may be built; it is checked
//! and wiped, never stored, so it cannot reach logs or `Debug` output.

use zeroize::Zeroizing;

/// Trading account whose private key was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    public_address: String,
}

impl Credentials {
    /// Both parts are required; blank values count as absent.
    pub fn from_parts(private_key: Option<String>, public_address: Option<String>) -> Option<Self> {
        let private_key = Zeroizing::new(private_key?);
        let public_address = public_address?.trim().to_string();
        if private_key.trim().is_empty() || public_address.is_empty() {
            return None;
        }
        Some(Self { public_address })
    }

    pub fn public_address(&self) -> &str {
        &self.public_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_both_parts() {
        assert!(Credentials::from_parts(Some("0xkey".into()), None).is_none());
        assert!(Credentials::from_parts(None, Some("0xaddr".into())).is_none());
        assert!(Credentials::from_parts(Some(" ".into()), Some("0xaddr".into())).is_none());
        assert!(Credentials::from_parts(Some("0xkey".into()), Some("  ".into())).is_none());

        let creds =
            Credentials::from_parts(Some(" 0xkey ".into()), Some(" 0xaddr ".into())).unwrap();
        assert_eq!(creds.public_address(), "0xaddr");
    }

    #[test]
    fn test_debug_never_contains_key() {
        let creds =
            Credentials::from_parts(Some("0xdeadbeef".into()), Some("0xaddr".into())).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("0xaddr"));
    }
}
