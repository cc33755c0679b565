use serde::{Deserialize, Serialize};

pub mod api {
    use super::*;
    use serde_json::Value;

    /// Body returned by the upstream `details` endpoint.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LookupResponse {
        #[serde(default)]
        pub status: Option<String>,
        #[serde(default)]
        pub results_count: Option<u64>,
        #[serde(default)]
        pub data: Vec<LookupRecord>,
        #[serde(default)]
        pub timestamp: Option<Value>,
    }

    impl LookupResponse {
        pub fn is_success(&self) -> bool {
            self.status.as_deref() == Some("success")
        }
    }

    /// One subscriber record. Upstream is loose about types, so every field
    /// is kept as raw JSON and read through [`value_text`].
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LookupRecord {
        #[serde(default)]
        pub mobile: Option<Value>,
        #[serde(default)]
        pub name: Option<Value>,
        #[serde(default)]
        pub fname: Option<Value>,
        #[serde(default)]
        pub address: Option<Value>,
        #[serde(default)]
        pub alt: Option<Value>,
        #[serde(default)]
        pub circle: Option<Value>,
        #[serde(default)]
        pub aadhar: Option<Value>,
        #[serde(default)]
        pub email: Option<Value>,
    }

    /// Text of a loosely typed JSON value. Null, blank strings, arrays and
    /// objects read as `None`.
    pub fn value_text(value: &Option<Value>) -> Option<String> {
        match value.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::api::*;

    #[test]
    fn parses_partial_records() {
        let body = r#"{
            "status": "success",
            "results_count": 1,
            "data": [{"mobile": 9876543210, "name": "  ", "alt": "1112223334"}],
            "timestamp": "2024-01-01 10:00:00"
        }"#;
        let resp: LookupResponse = serde_json::from_str(body).unwrap();

        assert!(resp.is_success());
        assert_eq!(resp.results_count, Some(1));
        let record = &resp.data[0];
        assert_eq!(value_text(&record.mobile).as_deref(), Some("9876543210"));
        assert_eq!(value_text(&record.name), None);
        assert_eq!(value_text(&record.email), None);
        assert_eq!(value_text(&record.alt).as_deref(), Some("1112223334"));
    }

    #[test]
    fn missing_status_is_not_success() {
        let resp: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(!resp.is_success());
        assert!(resp.data.is_empty());
    }
}
