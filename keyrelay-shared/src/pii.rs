use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for sensitive data (phone numbers, secrets) that masks its value
/// in Debug/Display output while serializing the real value for API responses.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Masking applies to log macros like tracing::info!("{:?}", ..);
        // callers that need the real value go through serialization or into_inner.
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Mask an MSISDN for log correlation: keeps the last two digits visible.
/// `"+15551234567"` -> `"**********67"`.
pub fn mask_msisdn(msisdn: &str) -> String {
    let visible = 2;
    let len = msisdn.chars().count();
    if len <= visible {
        return "*".repeat(len);
    }
    let stars = "*".repeat(len - visible);
    let tail: String = msisdn.chars().skip(len - visible).collect();
    format!("{}{}", stars, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_debug_output() {
        let phone = Masked("+15551234567".to_string());
        assert_eq!(format!("{:?}", phone), "********");
        assert_eq!(format!("{}", phone), "********");
    }

    #[test]
    fn test_mask_msisdn_keeps_tail() {
        assert_eq!(mask_msisdn("+15551234567"), "**********67");
        assert_eq!(mask_msisdn("67"), "**");
        assert_eq!(mask_msisdn(""), "");
    }
}
