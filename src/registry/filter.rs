//! Catalog listing: price bands and ordering.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::registry::error::RegistryError;
use crate::registry::types::Gift;

/// Price band selected by the guest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    /// price <= 50
    #[serde(rename = "up50")]
    UpTo50,
    /// 50 < price <= 100
    #[serde(rename = "50to100")]
    From50To100,
    /// 100 < price <= 200
    #[serde(rename = "100to200")]
    From100To200,
    /// price > 200
    #[serde(rename = "above200")]
    Above200,
}

impl PriceFilter {
    /// Whether a gift priced `price` falls in this band. Missing prices are 0.
    pub fn matches(&self, price: Option<f64>) -> bool {
        let price = price.unwrap_or(0.0);
        match self {
            Self::All => true,
            Self::UpTo50 => price <= 50.0,
            Self::From50To100 => price > 50.0 && price <= 100.0,
            Self::From100To200 => price > 100.0 && price <= 200.0,
            Self::Above200 => price > 200.0,
        }
    }
}

impl FromStr for PriceFilter {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "up50" => Ok(Self::UpTo50),
            "50to100" => Ok(Self::From50To100),
            "100to200" => Ok(Self::From100To200),
            "above200" => Ok(Self::Above200),
            other => Err(RegistryError::Validation(format!("unknown price filter '{}'", other))),
        }
    }
}

/// Ordering of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Case-insensitive by name, ties by id (guest page).
    Name,
    /// By id (admin table).
    Id,
}

/// Filter and sort a snapshot of the catalog.
pub fn select(mut gifts: Vec<Gift>, filter: PriceFilter, order: SortOrder) -> Vec<Gift> {
    gifts.retain(|g| filter.matches(g.price));
    match order {
        SortOrder::Name => gifts.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        }),
        SortOrder::Id => gifts.sort_by_key(|g| g.id),
    }
    gifts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gift(id: i64, name: &str, price: Option<f64>) -> Gift {
        Gift {
            id,
            name: name.to_string(),
            description: None,
            price,
            image_url: None,
            product_link: None,
            warning_title: None,
            warning_message: None,
            category: None,
            max_quantity: 1,
            current_quantity: 0,
            reserved_by: None,
            delivery_method: None,
        }
    }

    fn catalog() -> Vec<Gift> {
        vec![
            gift(1, "toalhas", Some(50.0)),
            gift(2, "Air fryer", Some(399.9)),
            gift(3, "Panela", Some(100.0)),
            gift(4, "Jogo de cama", Some(150.0)),
            gift(5, "Cabides", None),
            gift(6, "Liquidificador", Some(200.01)),
        ]
    }

    fn ids(gifts: &[Gift]) -> Vec<i64> {
        gifts.iter().map(|g| g.id).collect()
    }

    #[test]
    fn test_band_boundaries() {
        assert!(PriceFilter::UpTo50.matches(Some(50.0)));
        assert!(!PriceFilter::From50To100.matches(Some(50.0)));
        assert!(PriceFilter::From50To100.matches(Some(100.0)));
        assert!(PriceFilter::From100To200.matches(Some(200.0)));
        assert!(PriceFilter::Above200.matches(Some(200.01)));
        assert!(PriceFilter::UpTo50.matches(None));
    }

    #[test]
    fn test_select_sorts_by_name_case_insensitive() {
        let all = select(catalog(), PriceFilter::All, SortOrder::Name);
        assert_eq!(ids(&all), vec![2, 5, 4, 6, 3, 1]);
    }

    #[test]
    fn test_select_filters() {
        assert_eq!(ids(&select(catalog(), PriceFilter::UpTo50, SortOrder::Id)), vec![1, 5]);
        assert_eq!(ids(&select(catalog(), PriceFilter::From50To100, SortOrder::Id)), vec![3]);
        assert_eq!(ids(&select(catalog(), PriceFilter::From100To200, SortOrder::Id)), vec![4]);
        assert_eq!(ids(&select(catalog(), PriceFilter::Above200, SortOrder::Id)), vec![2, 6]);
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!("50to100".parse::<PriceFilter>().unwrap(), PriceFilter::From50To100);
        assert_eq!("".parse::<PriceFilter>().unwrap(), PriceFilter::All);
        assert!("cheap".parse::<PriceFilter>().is_err());
    }
}
