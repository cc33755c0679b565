use std::fmt;

/// A phone number known to be exactly ten ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub const LEN: usize = 10;

    /// Accepts user input with surrounding whitespace trimmed; anything else
    /// must already be ten digits.
    pub fn parse(input: &str) -> Option<Self> {
        let candidate = input.trim();
        if candidate.len() == Self::LEN && candidate.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(candidate.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_ten_digits() {
        assert_eq!(
            PhoneNumber::parse("9876543210").map(|n| n.to_string()).as_deref(),
            Some("9876543210")
        );
        assert!(PhoneNumber::parse(" 9876543210\n").is_some());
    }

    #[test]
    fn rejects_everything_else() {
        for input in [
            "12345",
            "12345678901",
            "98765abcde",
            "",
            "98765 43210",
            "+919876543",
            "٩٨٧٦٥٤٣٢١٠",
        ] {
            assert!(PhoneNumber::parse(input).is_none(), "accepted {:?}", input);
        }
    }
}
