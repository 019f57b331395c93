//! Phone number and one-time code input.

/// Minimum number of national digits accepted.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Length of a verification code.
pub const OTP_LEN: usize = 6;

/// An E.164-style phone number, `{country_code}{digits}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalise user input.
    ///
    /// Every non-digit character is dropped (spaces, dashes, brackets), so
    /// `"98765 43210"` becomes `+919876543210` with `country_code = "+91"`.
    /// Returns `None` with fewer than [`MIN_PHONE_DIGITS`] digits.
    pub fn parse(input: &str, country_code: &str) -> Option<Self> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < MIN_PHONE_DIGITS {
            return None;
        }
        Some(Self(format!("{country_code}{digits}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complete 6-digit verification code.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim();
        if code.len() == OTP_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(code.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_strips_formatting() {
        let phone = PhoneNumber::parse("98765 43210", "+91").unwrap();
        assert_eq!(phone.as_str(), "+919876543210");
        assert_eq!(
            PhoneNumber::parse("(987) 654-3210", "+1").unwrap().to_string(),
            "+19876543210"
        );
    }

    #[test]
    fn test_phone_too_short() {
        assert!(PhoneNumber::parse("98765", "+91").is_none());
        assert!(PhoneNumber::parse("abcdefghijkl", "+91").is_none());
        assert!(PhoneNumber::parse("", "+91").is_none());
    }

    #[test]
    fn test_otp_requires_six_digits() {
        assert_eq!(OtpCode::parse(" 123456 ").unwrap().as_str(), "123456");
        assert!(OtpCode::parse("12345").is_none());
        assert!(OtpCode::parse("1234567").is_none());
        assert!(OtpCode::parse("12a456").is_none());
    }

    #[test]
    fn test_otp_debug_is_redacted() {
        let code = OtpCode::parse("123456").unwrap();
        assert!(!format!("{code:?}").contains("123456"));
    }
}
