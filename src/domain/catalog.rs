use serde::{Deserialize, Serialize};

use super::{Cents, units};

/// The trade a provider offers and a service belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceCategory {
    Electrician,
    Plumber,
    #[serde(rename = "AC")]
    Ac,
    Carpenter,
    Cleaning,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 5] = [
        ServiceCategory::Electrician,
        ServiceCategory::Plumber,
        ServiceCategory::Ac,
        ServiceCategory::Carpenter,
        ServiceCategory::Cleaning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Electrician => "Electrician",
            ServiceCategory::Plumber => "Plumber",
            ServiceCategory::Ac => "AC",
            ServiceCategory::Carpenter => "Carpenter",
            ServiceCategory::Cleaning => "Cleaning",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "electrician" => Some(ServiceCategory::Electrician),
            "plumber" => Some(ServiceCategory::Plumber),
            "ac" => Some(ServiceCategory::Ac),
            "carpenter" => Some(ServiceCategory::Carpenter),
            "cleaning" => Some(ServiceCategory::Cleaning),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bookable service with its fixed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub price_cents: Cents,
    pub category: ServiceCategory,
}

const fn entry(name: &'static str, price: i64, category: ServiceCategory) -> CatalogEntry {
    CatalogEntry {
        name,
        price_cents: units(price),
        category,
    }
}

/// Every service that can be booked. Prices are read once, at booking time.
pub const SERVICE_CATALOG: [CatalogEntry; 17] = [
    entry("Wiring Work", 500, ServiceCategory::Electrician),
    entry("Fan Installation", 300, ServiceCategory::Electrician),
    entry("Light Repair", 200, ServiceCategory::Electrician),
    entry("Switch Replacement", 150, ServiceCategory::Electrician),
    entry("Socket Repair", 180, ServiceCategory::Electrician),
    entry("Tap Repair", 300, ServiceCategory::Plumber),
    entry("Pipe Leakage Fix", 600, ServiceCategory::Plumber),
    entry("Bathroom Fitting", 1200, ServiceCategory::Plumber),
    entry("Water Motor Repair", 800, ServiceCategory::Plumber),
    entry("AC Installation", 1500, ServiceCategory::Ac),
    entry("AC General Service", 700, ServiceCategory::Ac),
    entry("Furniture Repair", 800, ServiceCategory::Carpenter),
    entry("Custom Furniture", 2000, ServiceCategory::Carpenter),
    entry("Wooden Doors and Windows", 1500, ServiceCategory::Carpenter),
    entry("Home Cleaning", 500, ServiceCategory::Cleaning),
    entry("Office Cleaning", 1000, ServiceCategory::Cleaning),
    entry("Bathroom Cleaning", 700, ServiceCategory::Cleaning),
];

/// Look up a service by its exact name.
pub fn lookup_service(name: &str) -> Option<&'static CatalogEntry> {
    SERVICE_CATALOG.iter().find(|entry| entry.name == name)
}

/// Services offered under a category, in catalog order.
pub fn services_in_category(category: ServiceCategory) -> Vec<&'static CatalogEntry> {
    SERVICE_CATALOG
        .iter()
        .filter(|entry| entry.category == category)
        .collect()
}
