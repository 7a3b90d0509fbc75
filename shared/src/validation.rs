//! Validation utilities for restock inputs

use std::collections::HashSet;

use crate::models::{FieldReport, RequiredItem};

/// Validate a SKU (non-empty, no surrounding whitespace, at most 64 chars)
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.is_empty() {
        return Err("SKU cannot be empty");
    }
    if sku.len() > 64 {
        return Err("SKU must be at most 64 characters");
    }
    if sku.trim() != sku {
        return Err("SKU cannot start or end with whitespace");
    }
    Ok(())
}

/// Validate a stock level or count (must not be negative)
pub fn validate_level(level: i64) -> Result<(), &'static str> {
    if level < 0 {
        return Err("Level cannot be negative");
    }
    Ok(())
}

/// Validate a quantity that must be strictly positive
pub fn validate_positive_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a requirement profile: valid SKUs, non-negative levels, unique SKUs
pub fn validate_requirements(requirements: &[RequiredItem]) -> Result<(), &'static str> {
    let mut seen = HashSet::new();
    for req in requirements {
        validate_sku(&req.sku)?;
        validate_level(req.required_level)?;
        if !seen.insert(req.sku.as_str()) {
            return Err("Each SKU may appear only once per property");
        }
    }
    Ok(())
}

/// Validate a field report: non-negative counts, one count per SKU
pub fn validate_field_report(report: &FieldReport) -> Result<(), &'static str> {
    let mut seen = HashSet::new();
    for count in &report.observed_counts {
        validate_sku(&count.sku)?;
        if count.observed_count < 0 {
            return Err("Observed count cannot be negative");
        }
        if !seen.insert(count.sku.as_str()) {
            return Err("Each SKU may be counted only once per report");
        }
    }
    for flagged in &report.flagged_low_items {
        validate_sku(&flagged.sku)?;
    }
    Ok(())
}
