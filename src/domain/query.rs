use serde::Deserialize;

/// One search criterion. The first query of a request seeds the store
/// discovery, every following query must be confirmed in-store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub search_text: String,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default = "default_pages")]
    pub pages: u32,
}

fn default_pages() -> u32 {
    1
}

impl Query {
    pub fn from_text(search_text: &str) -> Self {
        Query {
            search_text: search_text.to_string(),
            min_price: None,
            max_price: None,
            pages: default_pages(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Query;

    #[test]
    fn from_text_scans_a_single_page() {
        let query = Query::from_text("query1");

        assert_eq!(query.search_text, "query1");
        assert_eq!(query.min_price, None);
        assert_eq!(query.max_price, None);
        assert_eq!(query.pages, 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let query: Query = serde_json::from_str(r#"{"searchText": "winter gloves"}"#).unwrap();

        assert_eq!(query.search_text, "winter gloves");
        assert_eq!(query.min_price, None);
        assert_eq!(query.max_price, None);
        assert_eq!(query.pages, 1);
    }

    #[test]
    fn deserializes_all_fields() {
        let query: Query = serde_json::from_str(
            r#"{"searchText": "query1", "minPrice": 1.5, "maxPrice": 30, "pages": 5}"#,
        )
        .unwrap();

        assert_eq!(query.search_text, "query1");
        assert_eq!(query.min_price, Some(1.5));
        assert_eq!(query.max_price, Some(30.0));
        assert_eq!(query.pages, 5);
    }
}
