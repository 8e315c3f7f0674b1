use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Brand {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

impl Brand {
    /// Best available contact line for display
    pub fn contact_display(&self) -> String {
        match (&self.contact_email, &self.contact_phone) {
            (Some(email), Some(phone)) => format!("{} / {}", email, phone),
            (Some(email), None) => email.clone(),
            (None, Some(phone)) => phone.clone(),
            (None, None) => "No contact information".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_brand_with_nulls() {
        let json = r#"{"id":"5f0c1a2b-0000-4000-8000-000000000001","name":"Acme","description":null,"contactEmail":"ops@acme.test","contactPhone":null}"#;
        let brand: Brand = serde_json::from_str(json).unwrap();
        assert_eq!(brand.name, "Acme");
        assert_eq!(brand.description, None);
        assert_eq!(brand.contact_display(), "ops@acme.test");
    }
}
