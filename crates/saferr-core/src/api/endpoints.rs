//! Typed SAFERR endpoints built on the gateway.

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::auth::Session;
use crate::models::{
    Brand, BrandSubscription, GeneratedCodes, LoginRequest, NewProduct, Product,
    ProductDistribution, RegisterRequest, SuspiciousActivity, VerificationTrend,
};

use super::{ApiClient, ApiError, RequestOptions, NO_BODY};

/// Upper bound the backend accepts for one generation request
pub const MAX_CODES_PER_REQUEST: u32 = 10_000;

/// Default number of suspicious codes to list
pub const DEFAULT_SUSPICIOUS_LIMIT: u32 = 10;

/// Length of the default verification trend window
const DEFAULT_TREND_WINDOW_DAYS: i64 = 30;

/// Date format the reporting endpoints expect
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The last 30 days ending at `today`
pub fn default_trend_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(DEFAULT_TREND_WINDOW_DAYS), today)
}

impl ApiClient {
    /// Validate that a string looks like a valid GUID (UUID format).
    /// GUIDs should be 36 characters with dashes: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
    fn is_valid_guid(s: &str) -> bool {
        if s.len() != 36 {
            return false;
        }
        s.chars().enumerate().all(|(i, c)| {
            if i == 8 || i == 13 || i == 18 || i == 23 {
                c == '-'
            } else {
                c.is_ascii_hexdigit()
            }
        })
    }

    fn guid<'a>(value: &'a str, what: &str) -> Result<&'a str, ApiError> {
        if Self::is_valid_guid(value) {
            Ok(value)
        } else {
            Err(ApiError::Validation(format!("invalid {} id: {:?}", what, value)))
        }
    }

    // ===== Authentication =====

    /// Exchange credentials for a session
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let body = LoginRequest { username, password };
        self.post("/auth/login", Some(&body), None).await
    }

    /// Create an owner account and brand; the response is a signed-in session
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<Session, ApiError> {
        self.post("/auth/register", Some(request), None).await
    }

    // ===== Brands =====

    /// Fetch the brand owned by the signed-in user
    pub async fn fetch_my_brand(&self) -> Result<Brand, ApiError> {
        self.get("/brands/my-brand", None).await
    }

    pub async fn fetch_brand(&self, brand_id: &str) -> Result<Brand, ApiError> {
        let id = Self::guid(brand_id, "brand")?;
        self.get(&format!("/brands/{}", id), None).await
    }

    // ===== Products =====

    pub async fn fetch_brand_products(&self, brand_id: &str) -> Result<Vec<Product>, ApiError> {
        let id = Self::guid(brand_id, "brand")?;
        self.get(&format!("/products/by-brand/{}", id), None).await
    }

    pub async fn fetch_product(&self, product_id: &str) -> Result<Product, ApiError> {
        let id = Self::guid(product_id, "product")?;
        self.get(&format!("/products/{}", id), None).await
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        if product.name.trim().is_empty() {
            return Err(ApiError::Validation("product name is required".to_string()));
        }
        Self::guid(&product.brand_id, "brand")?;
        self.post("/products", Some(product), None).await
    }

    // ===== Security Codes =====

    /// Generate `count` one-time verification codes for a product
    pub async fn generate_codes(&self, product_id: &str, count: u32) -> Result<Vec<String>, ApiError> {
        let id = Self::guid(product_id, "product")?;
        if count == 0 {
            return Err(ApiError::Validation(
                "code count must be greater than zero".to_string(),
            ));
        }
        if count > MAX_CODES_PER_REQUEST {
            return Err(ApiError::Validation(format!(
                "maximum code count is {} per request",
                MAX_CODES_PER_REQUEST
            )));
        }

        let options = RequestOptions::new().query("count", count);
        let response: GeneratedCodes = self
            .post(&format!("/securitycodes/generate/{}", id), NO_BODY, Some(&options))
            .await?;
        debug!(product_id = id, requested = count, generated = response.generated_codes.len(), "Codes generated");
        Ok(response.generated_codes)
    }

    // ===== Subscriptions =====

    /// Fetch the brand's current subscription; `None` when it has none
    pub async fn fetch_current_subscription(
        &self,
        brand_id: &str,
    ) -> Result<Option<BrandSubscription>, ApiError> {
        let id = Self::guid(brand_id, "brand")?;
        match self
            .get::<Option<BrandSubscription>>(&format!("/subscriptions/current/{}", id), None)
            .await
        {
            Ok(subscription) => Ok(subscription),
            Err(e) if e.is_not_found() => {
                debug!(brand_id = id, "No active subscription");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // ===== Reporting =====

    pub async fn fetch_product_distribution(&self) -> Result<ProductDistribution, ApiError> {
        self.get("/reporting/product-distribution", None).await
    }

    pub async fn fetch_verification_trends(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<VerificationTrend, ApiError> {
        if start > end {
            return Err(ApiError::Validation(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        let options = RequestOptions::new()
            .query("startDate", start.format(DATE_FORMAT))
            .query("endDate", end.format(DATE_FORMAT));
        self.get("/reporting/trends", Some(&options)).await
    }

    pub async fn fetch_suspicious_activity(
        &self,
        limit: u32,
    ) -> Result<Vec<SuspiciousActivity>, ApiError> {
        let limit = if limit == 0 { DEFAULT_SUSPICIOUS_LIMIT } else { limit };
        let options = RequestOptions::new().query("limit", limit);
        self.get("/reporting/suspicious", Some(&options)).await
    }
}
