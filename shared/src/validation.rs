//! Validation utilities for the Demand Replenishment Platform

/// Validate a SKU identifier: non-empty, at most 64 characters, limited to
/// the charset the catalog collaborator emits.
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.is_empty() {
        return Err("SKU must not be empty");
    }
    if sku.len() > 64 {
        return Err("SKU must be at most 64 characters");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("SKU may only contain alphanumerics, '-' and '_'");
    }
    Ok(())
}

/// Validate an ordered quantity.
pub fn validate_order_qty(qty: i64) -> Result<(), &'static str> {
    if qty <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a batch of SKUs for forecast or PO generation.
pub fn validate_sku_batch(skus: &[String]) -> Result<(), &'static str> {
    if skus.is_empty() {
        return Err("At least one SKU is required");
    }
    for sku in skus {
        validate_sku(sku)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_normal_skus() {
        assert!(validate_sku("SKU-1001").is_ok());
        assert!(validate_sku("tee_shirt_m").is_ok());
    }

    #[test]
    fn rejects_bad_skus() {
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"x".repeat(65)).is_err());
    }

    #[test]
    fn rejects_empty_batches() {
        assert!(validate_sku_batch(&[]).is_err());
        assert!(validate_sku_batch(&["SKU-1".to_string()]).is_ok());
    }

    #[test]
    fn rejects_non_positive_quantities() {
        assert!(validate_order_qty(0).is_err());
        assert!(validate_order_qty(-3).is_err());
        assert!(validate_order_qty(5).is_ok());
    }
}
