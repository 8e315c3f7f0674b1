//! Reporting models: product distribution, verification trends and
//! suspicious activity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ProductVerificationCount {
    pub product_id: String,
    pub product_name: String,
    pub brand_id: String,
    pub brand_name: String,
    pub verification_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ProductDistribution {
    #[serde(default)]
    pub top_products: Vec<ProductVerificationCount>,
    /// Products of the brand that have at least one verification
    #[serde(default)]
    pub total_products: u64,
}

impl ProductDistribution {
    pub fn total_verifications(&self) -> u64 {
        self.top_products.iter().map(|p| p.verification_count).sum()
    }

    /// Each listed product with its percentage of the listed verifications
    pub fn shares(&self) -> Vec<(&ProductVerificationCount, f64)> {
        let total = self.total_verifications();
        self.top_products
            .iter()
            .map(|p| {
                let share = if total == 0 {
                    0.0
                } else {
                    p.verification_count as f64 * 100.0 / total as f64
                };
                (p, share)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct DailyVerificationCount {
    /// ISO timestamp or date as sent by the backend
    pub date: String,
    pub count: u64,
}

impl DailyVerificationCount {
    /// The `YYYY-MM-DD` part of the date
    pub fn day(&self) -> &str {
        self.date.get(..10).unwrap_or(&self.date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct VerificationTrend {
    #[serde(default)]
    pub daily_counts: Vec<DailyVerificationCount>,
    #[serde(default)]
    pub total_verifications: u64,
}

impl VerificationTrend {
    /// Day with the most verifications; the earliest wins ties
    pub fn peak_day(&self) -> Option<&DailyVerificationCount> {
        self.daily_counts
            .iter()
            .fold(None, |best: Option<&DailyVerificationCount>, day| match best {
                Some(b) if b.count >= day.count => Some(b),
                _ => Some(day),
            })
    }

    pub fn max_count(&self) -> u64 {
        self.daily_counts.iter().map(|d| d.count).max().unwrap_or(0)
    }
}

/// A security code verified more often than expected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SuspiciousActivity {
    pub security_code_id: String,
    pub code: String,
    pub verification_count: u64,
    pub first_verification: String,
    pub last_verification: String,
    pub product_id: String,
    pub product_name: String,
    pub brand_id: String,
    pub brand_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, count: u64) -> ProductVerificationCount {
        ProductVerificationCount {
            product_id: format!("p-{}", name),
            product_name: name.to_string(),
            brand_id: "b1".to_string(),
            brand_name: "Acme".to_string(),
            verification_count: count,
        }
    }

    #[test]
    fn test_distribution_shares() {
        let dist = ProductDistribution {
            top_products: vec![product("Serum", 75), product("Cream", 25)],
            total_products: 2,
        };
        assert_eq!(dist.total_verifications(), 100);
        let shares = dist.shares();
        assert_eq!(shares[0].1, 75.0);
        assert_eq!(shares[1].1, 25.0);
    }

    #[test]
    fn test_distribution_shares_empty_counts() {
        let dist = ProductDistribution {
            top_products: vec![product("Serum", 0)],
            total_products: 1,
        };
        assert_eq!(dist.shares()[0].1, 0.0);
    }

    #[test]
    fn test_trend_peak_day_prefers_earliest() {
        let json = r#"{"dailyCounts":[
            {"date":"2024-05-01T00:00:00","count":3},
            {"date":"2024-05-02T00:00:00","count":9},
            {"date":"2024-05-03T00:00:00","count":9}
        ],"totalVerifications":21}"#;
        let trend: VerificationTrend = serde_json::from_str(json).unwrap();
        let peak = trend.peak_day().unwrap();
        assert_eq!(peak.day(), "2024-05-02");
        assert_eq!(trend.max_count(), 9);
    }

    #[test]
    fn test_empty_trend() {
        let trend: VerificationTrend = serde_json::from_str("{}").unwrap();
        assert!(trend.peak_day().is_none());
        assert_eq!(trend.max_count(), 0);
    }

    #[test]
    fn test_parse_suspicious_activity() {
        let json = r#"[{"securityCodeId":"c1","code":"ABCD-1234","verificationCount":14,
            "firstVerification":"2024-05-01T10:00:00Z","lastVerification":"2024-05-03T18:30:00Z",
            "productId":"p1","productName":"Serum","brandId":"b1","brandName":"Acme"}]"#;
        let items: Vec<SuspiciousActivity> = serde_json::from_str(json).unwrap();
        assert_eq!(items[0].code, "ABCD-1234");
        assert_eq!(items[0].verification_count, 14);
    }
}
