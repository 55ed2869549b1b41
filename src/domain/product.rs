use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProductId, UserId};

/// Availability flag flipped by rental transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Available,
    Rented,
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductStatus::Available => write!(f, "AVAILABLE"),
            ProductStatus::Rented => write!(f, "RENTED"),
        }
    }
}

/// Where a product can be picked up. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub label: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A vendor's listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: UserId,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price_per_day: Decimal,
    pub status: ProductStatus,
    pub location: Location,
    pub vendor_name: Option<String>,
    pub vendor_contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

/// Payload for listing a new product.
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price_per_day: Decimal,
    pub location: Location,
    pub vendor_name: Option<String>,
    pub vendor_contact: Option<String>,
}

/// Partial edit made by the owning vendor. Never carries a status; only
/// rental transitions move it.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price_per_day: Option<Decimal>,
    pub location: Option<Location>,
    pub vendor_name: Option<String>,
    pub vendor_contact: Option<String>,
}

impl Product {
    /// Builds a freshly listed, available product. Version 0 marks it as not
    /// yet stored.
    pub fn list(
        id: ProductId,
        vendor_id: UserId,
        params: ProductCreate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            vendor_id,
            name: params.name,
            category: params.category,
            description: params.description,
            price_per_day: params.price_per_day,
            status: ProductStatus::Available,
            location: params.location,
            vendor_name: params.vendor_name,
            vendor_contact: params.vendor_contact,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(price) = patch.price_per_day {
            self.price_per_day = price;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(vendor_name) = patch.vendor_name {
            self.vendor_name = Some(vendor_name);
        }
        if let Some(vendor_contact) = patch.vendor_contact {
            self.vendor_contact = Some(vendor_contact);
        }
        self.updated_at = now;
    }

    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }
}

/// Predicates for product listings.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductQuery {
    All,
    Available,
    ByVendor(UserId),
    ByCategory(String),
    /// Case-insensitive substring match over name and description.
    Search(String),
}

impl ProductQuery {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            ProductQuery::All => true,
            ProductQuery::Available => product.is_available(),
            ProductQuery::ByVendor(vendor_id) => &product.vendor_id == vendor_id,
            ProductQuery::ByCategory(category) => product.category.eq_ignore_ascii_case(category),
            ProductQuery::Search(term) => {
                let term = term.trim().to_lowercase();
                if term.is_empty() {
                    return true;
                }
                product.name.to_lowercase().contains(&term)
                    || product
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_now, sample_product};

    #[test]
    fn patch_leaves_status_alone() {
        let mut product = sample_product(UserId::random(), "10.00");
        product.status = ProductStatus::Rented;
        product.apply_patch(
            ProductPatch {
                name: Some("Trail bike".to_string()),
                ..ProductPatch::default()
            },
            fixture_now(),
        );
        assert_eq!(product.name, "Trail bike");
        assert_eq!(product.status, ProductStatus::Rented);
    }

    #[test]
    fn search_looks_at_name_and_description() {
        let mut product = sample_product(UserId::random(), "10.00");
        product.name = "Canon EOS".to_string();
        product.description = Some("Mirrorless camera body".to_string());

        assert!(ProductQuery::Search("eos".to_string()).matches(&product));
        assert!(ProductQuery::Search("CAMERA".to_string()).matches(&product));
        assert!(!ProductQuery::Search("tripod".to_string()).matches(&product));
        assert!(ProductQuery::Search("  ".to_string()).matches(&product));
    }
}
