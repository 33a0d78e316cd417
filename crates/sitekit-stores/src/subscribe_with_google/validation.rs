//! Field validators for Subscribe with Google settings

/// Publication IDs are non-empty and limited to `[A-Za-z0-9_.-]`
pub fn is_valid_publication_id(publication_id: &str) -> bool {
    !publication_id.is_empty()
        && publication_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

pub fn is_valid_products(products: &str) -> bool {
    !products.trim().is_empty()
}

pub fn is_valid_revenue_model(revenue_model: &str) -> bool {
    !revenue_model.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publication_id() {
        for valid in ["example.com", "pub-123", "A_b.C-9"] {
            assert!(is_valid_publication_id(valid), "{valid}");
        }
        for invalid in ["", "has space", "slash/ed", "émoji"] {
            assert!(!is_valid_publication_id(invalid), "{invalid}");
        }
    }

    #[test]
    fn test_products_and_revenue_model() {
        assert!(is_valid_products("basic\npremium"));
        assert!(!is_valid_products("  \n"));
        assert!(is_valid_revenue_model("contribution"));
        assert!(!is_valid_revenue_model(""));
    }
}
