use osint_shared::api::{value_text, LookupRecord};

use super::phone::PhoneNumber;

/// Shown for any field upstream left out.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub mobile: String,
    pub name: String,
    pub father_name: String,
    pub address: String,
    /// Raw alternate number as reported, not yet validated.
    pub alternate: Option<String>,
    pub circle: String,
    pub id_number: String,
    pub email: Option<String>,
}

impl LookupResult {
    /// The alternate number, if it is one we could search for.
    pub fn alternate_number(&self) -> Option<PhoneNumber> {
        let raw = self.alternate.as_deref()?;
        if raw.len() != PhoneNumber::LEN {
            return None;
        }
        PhoneNumber::parse(raw)
    }
}

impl From<&LookupRecord> for LookupResult {
    fn from(record: &LookupRecord) -> Self {
        let field = |v: &Option<serde_json::Value>| value_text(v).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Self {
            mobile: field(&record.mobile),
            name: field(&record.name),
            father_name: field(&record.fname),
            address: field(&record.address),
            alternate: value_text(&record.alt),
            circle: field(&record.circle),
            id_number: field(&record.aadhar),
            email: value_text(&record.email),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Success {
        results: Vec<LookupResult>,
        timestamp: String,
    },
    Empty,
    ApiFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> LookupRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_fields_become_placeholders() {
        let result = LookupResult::from(&record(json!({ "mobile": "9876543210" })));

        assert_eq!(result.mobile, "9876543210");
        assert_eq!(result.name, NOT_AVAILABLE);
        assert_eq!(result.father_name, NOT_AVAILABLE);
        assert_eq!(result.id_number, NOT_AVAILABLE);
        assert_eq!(result.alternate, None);
        assert_eq!(result.email, None);
    }

    #[test]
    fn alternate_must_be_ten_plain_digits() {
        let ok = LookupResult::from(&record(json!({ "alt": 1112223334u64 })));
        assert_eq!(ok.alternate_number().map(|n| n.to_string()).as_deref(), Some("1112223334"));

        for alt in ["111222333", "11122233345", "111-222-33", "N/A"] {
            let result = LookupResult::from(&record(json!({ "alt": alt })));
            assert_eq!(result.alternate.as_deref(), Some(alt));
            assert!(result.alternate_number().is_none(), "expanded {:?}", alt);
        }
    }
}
