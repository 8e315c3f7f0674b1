use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// SKU, GTIN or similar
    #[serde(default)]
    pub identifier: Option<String>,
    pub brand_id: String,
}

/// Payload for creating a product under a brand
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub identifier: Option<String>,
    pub brand_id: String,
}

impl NewProduct {
    pub fn new(brand_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            identifier: None,
            brand_id: brand_id.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into()).filter(|d: &String| !d.trim().is_empty());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into()).filter(|i: &String| !i.trim().is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_drops_blank_optionals() {
        let product = NewProduct::new("b1", "Serum")
            .with_description("   ")
            .with_identifier("SKU-1");
        assert_eq!(product.description, None);
        assert_eq!(product.identifier.as_deref(), Some("SKU-1"));

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["brandId"], "b1");
        assert!(json["description"].is_null());
    }
}
