use serde::{Deserialize, Serialize};

/// 指數成分股快取資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IndexConstituent {
    pub id: i32,
    pub ticker: String,
    pub short_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub price: Option<f64>,
}

/// 成分股插入模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConstituentInsert {
    pub ticker: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// 成分股查詢條件，None 代表不篩選
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituentFilter {
    pub sector: Option<String>,
    pub industry: Option<String>,
}

impl ConstituentFilter {
    /// 由使用者選項建立條件，空字串與 "All" 視為不篩選
    pub fn from_selection(sector: Option<&str>, industry: Option<&str>) -> Self {
        fn normalize(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
                .map(str::to_string)
        }

        Self {
            sector: normalize(sector),
            industry: normalize(industry),
        }
    }

    pub fn matches(&self, constituent: &IndexConstituent) -> bool {
        let sector_ok = self
            .sector
            .as_deref()
            .map_or(true, |s| constituent.sector.as_deref() == Some(s));
        let industry_ok = self
            .industry
            .as_deref()
            .map_or(true, |i| constituent.industry.as_deref() == Some(i));
        sector_ok && industry_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constituent(sector: &str, industry: &str) -> IndexConstituent {
        IndexConstituent {
            id: 1,
            ticker: "AAPL".to_string(),
            short_name: Some("Apple Inc.".to_string()),
            sector: Some(sector.to_string()),
            industry: Some(industry.to_string()),
            price: Some(150.0),
        }
    }

    #[test]
    fn test_all_means_no_filter() {
        let filter = ConstituentFilter::from_selection(Some("All"), Some(" "));
        assert_eq!(filter, ConstituentFilter::default());
        assert!(filter.matches(&constituent("Information Technology", "Technology Hardware")));
    }

    #[test]
    fn test_filters_are_exact_matches() {
        let filter = ConstituentFilter::from_selection(Some("Information Technology"), None);
        assert!(filter.matches(&constituent("Information Technology", "Semiconductors")));
        assert!(!filter.matches(&constituent("Health Care", "Semiconductors")));

        let filter = ConstituentFilter::from_selection(
            Some("Information Technology"),
            Some("Semiconductors"),
        );
        assert!(!filter.matches(&constituent("Information Technology", "Systems Software")));
    }
}
