// --- File: crates/detailing_booking/src/catalog.rs ---

//! Turns the raw Square catalog into the structure the booking UI renders.
//!
//! The UI only understands three services (interior, exterior, full) in three
//! vehicle sizes. When the live catalog cannot fill all nine combinations the
//! shaper answers with a built-in price list instead.

use detailing_square::models::{CatalogItemVariation, CatalogObject};
use detailing_square::SquareError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

pub const SERVICES: [&str; 3] = ["interior", "exterior", "full"];
pub const SIZES: [&str; 3] = ["small", "medium", "large"];
pub const FALLBACK_CURRENCY: &str = "USD";
pub const FALLBACK_ID_PREFIX: &str = "fallback-";

static HOURS_MINUTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*h(?:ours?|rs?)?\b(?:\s*(\d+)\s*m(?:ins?|inutes?)?\b)?")
        .expect("valid regex")
});
static MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s*m(?:ins?|inutes?)?\b").expect("valid regex"));

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Square,
    Fallback,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub variation_ids: Vec<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationSummary {
    pub id: String,
    pub item_id: Option<String>,
    pub name: String,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub formatted_price: Option<String>,
    pub duration_minutes: i64,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedService {
    pub variation_id: String,
    pub name: String,
    pub price_cents: i64,
    pub currency: String,
    pub formatted_price: String,
    pub duration_minutes: i64,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogShape {
    pub categories: Vec<CategorySummary>,
    pub services: Vec<ServiceSummary>,
    pub variations: Vec<VariationSummary>,
    pub price_map: BTreeMap<String, i64>,
    /// Keyed `<service>-<size>`, e.g. `interior-small`.
    pub simplified_services: BTreeMap<String, SimplifiedService>,
    pub source: CatalogSource,
}

impl CatalogShape {
    pub fn is_complete(&self) -> bool {
        SERVICES
            .iter()
            .flat_map(|s| SIZES.iter().map(move |z| format!("{}-{}", s, z)))
            .all(|key| self.simplified_services.contains_key(&key))
    }

    pub fn variation(&self, variation_id: &str) -> Option<&VariationSummary> {
        self.variations.iter().find(|v| v.id == variation_id)
    }
}

/// Formats minor units for display.
pub fn format_price(amount: i64, currency: &str) -> String {
    let currency = currency.to_uppercase();
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    match currency.as_str() {
        "TND" => format!("{}{}.{:03} TND", sign, abs / 1000, abs % 1000),
        "USD" => format!("{}${}.{:02}", sign, abs / 100, abs % 100),
        other => format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, other),
    }
}

/// Service kind named in a catalog label.
pub fn classify_service(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    if lower.contains("full") {
        Some("full")
    } else if lower.contains("interior") {
        Some("interior")
    } else if lower.contains("exterior") {
        Some("exterior")
    } else {
        None
    }
}

/// Vehicle size named in a catalog label. SUVs count as medium unless the
/// label also says large.
pub fn classify_size(name: &str) -> Option<&'static str> {
    let words: Vec<String> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let has = |w: &str| words.iter().any(|word| word == w);

    if has("small") {
        Some("small")
    } else if has("large") || has("truck") || has("van") {
        Some("large")
    } else if has("medium") || has("suv") {
        Some("medium")
    } else {
        None
    }
}

/// Minutes written in a label, as in "2h 30m" or "90 min".
pub fn duration_from_text(text: &str) -> Option<i64> {
    if let Some(caps) = HOURS_MINUTES.captures(text) {
        let hours: i64 = caps.get(1)?.as_str().parse().ok()?;
        let minutes: i64 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        return hours.checked_mul(60)?.checked_add(minutes);
    }
    MINUTES
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn default_duration_for(service: Option<&str>) -> i64 {
    match service {
        Some("interior") => 120,
        Some("exterior") => 90,
        _ => 240,
    }
}

/// Duration of a variation: Square's service duration, then a duration written
/// in one of the labels, then the per-service default.
pub fn variation_duration(variation: &CatalogItemVariation, item_name: Option<&str>) -> i64 {
    if let Some(ms) = variation.service_duration.filter(|ms| *ms > 0) {
        return ms / 60_000;
    }
    let labels = [Some(variation.name.as_str()), item_name];
    if let Some(minutes) = labels.iter().flatten().find_map(|l| duration_from_text(l)) {
        return minutes;
    }
    let service = labels.iter().flatten().find_map(|l| classify_service(l));
    default_duration_for(service)
}

/// Duration of a single catalog object, when it is a variation.
pub fn object_duration(object: &CatalogObject) -> Option<i64> {
    object
        .item_variation_data
        .as_ref()
        .map(|v| variation_duration(v, None))
}

pub fn shape_catalog(objects: &[CatalogObject]) -> CatalogShape {
    let live: Vec<&CatalogObject> = objects
        .iter()
        .filter(|o| !o.is_deleted.unwrap_or(false))
        .collect();

    let categories = live
        .iter()
        .filter_map(|o| {
            o.category_data.as_ref().map(|c| CategorySummary {
                id: o.id.clone(),
                name: c.name.clone(),
            })
        })
        .collect();

    let mut item_names: BTreeMap<String, String> = BTreeMap::new();
    let mut services = Vec::new();
    // Variations arrive nested in their item and, with this type filter, again
    // as top-level objects.
    let mut raw_variations: Vec<(Option<String>, &CatalogObject)> = Vec::new();
    for object in &live {
        if let Some(item) = &object.item_data {
            item_names.insert(object.id.clone(), item.name.clone());
            services.push(ServiceSummary {
                id: object.id.clone(),
                name: item.name.clone(),
                description: item.description.clone(),
                category_id: item.primary_category().map(str::to_string),
                variation_ids: item.variations.iter().map(|v| v.id.clone()).collect(),
            });
            for nested in item.variations.iter().filter(|v| !v.is_deleted.unwrap_or(false)) {
                raw_variations.push((Some(object.id.clone()), nested));
            }
        } else if object.item_variation_data.is_some() {
            raw_variations.push((None, object));
        }
    }

    let mut seen = HashSet::new();
    let mut variations = Vec::new();
    let mut price_map = BTreeMap::new();
    let mut simplified_services = BTreeMap::new();
    for (parent_id, object) in raw_variations {
        let data = match &object.item_variation_data {
            Some(data) => data,
            None => continue,
        };
        if !seen.insert(object.id.clone()) {
            continue;
        }
        let item_id = data.item_id.clone().or(parent_id);
        let item_name = item_id.as_ref().and_then(|id| item_names.get(id)).map(String::as_str);
        let duration_minutes = variation_duration(data, item_name);
        let price = data.price_money.as_ref();

        if let Some(money) = price {
            price_map.insert(object.id.clone(), money.amount);
        }

        let service = item_name
            .and_then(classify_service)
            .or_else(|| classify_service(&data.name));
        let size = classify_size(&data.name).or_else(|| item_name.and_then(classify_size));
        if let (Some(service), Some(size), Some(money)) = (service, size, price) {
            let key = format!("{}-{}", service, size);
            simplified_services.entry(key).or_insert_with(|| SimplifiedService {
                variation_id: object.id.clone(),
                name: match item_name {
                    Some(item) => format!("{} - {}", item, data.name),
                    None => data.name.clone(),
                },
                price_cents: money.amount,
                currency: money.currency.clone(),
                formatted_price: format_price(money.amount, &money.currency),
                duration_minutes,
            });
        }

        variations.push(VariationSummary {
            id: object.id.clone(),
            item_id,
            name: data.name.clone(),
            price_cents: price.map(|m| m.amount),
            currency: price.map(|m| m.currency.clone()),
            formatted_price: price.map(|m| format_price(m.amount, &m.currency)),
            duration_minutes,
        });
    }

    CatalogShape {
        categories,
        services,
        variations,
        price_map,
        simplified_services,
        source: CatalogSource::Square,
    }
}

fn fallback_price(service: &str, size: &str) -> i64 {
    match (service, size) {
        ("interior", "small") => 6000,
        ("interior", "medium") => 8000,
        ("interior", _) => 10000,
        ("exterior", "small") => 5000,
        ("exterior", "medium") => 7000,
        ("exterior", _) => 9000,
        (_, "small") => 12000,
        (_, "medium") => 15000,
        _ => 18000,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Built-in price list used when Square cannot supply a complete catalog.
pub fn fallback_catalog() -> CatalogShape {
    let mut services = Vec::new();
    let mut variations = Vec::new();
    let mut price_map = BTreeMap::new();
    let mut simplified_services = BTreeMap::new();

    for service in SERVICES {
        let service_id = format!("{}{}", FALLBACK_ID_PREFIX, service);
        let service_name = match service {
            "full" => "Full Detail".to_string(),
            other => format!("{} Only", title_case(other)),
        };
        let duration_minutes = default_duration_for(Some(service));
        let mut variation_ids = Vec::new();

        for size in SIZES {
            let id = format!("{}{}-{}", FALLBACK_ID_PREFIX, service, size);
            let price_cents = fallback_price(service, size);
            let formatted_price = format_price(price_cents, FALLBACK_CURRENCY);
            let size_name = format!("{} Car", title_case(size));

            price_map.insert(id.clone(), price_cents);
            variation_ids.push(id.clone());
            variations.push(VariationSummary {
                id: id.clone(),
                item_id: Some(service_id.clone()),
                name: size_name.clone(),
                price_cents: Some(price_cents),
                currency: Some(FALLBACK_CURRENCY.to_string()),
                formatted_price: Some(formatted_price.clone()),
                duration_minutes,
            });
            simplified_services.insert(
                format!("{}-{}", service, size),
                SimplifiedService {
                    variation_id: id,
                    name: format!("{} - {}", service_name, size_name),
                    price_cents,
                    currency: FALLBACK_CURRENCY.to_string(),
                    formatted_price,
                    duration_minutes,
                },
            );
        }

        services.push(ServiceSummary {
            id: service_id,
            name: service_name,
            description: None,
            category_id: None,
            variation_ids,
        });
    }

    CatalogShape {
        categories: Vec::new(),
        services,
        variations,
        price_map,
        simplified_services,
        source: CatalogSource::Fallback,
    }
}

/// Shapes a catalog fetch, answering with the fallback when the fetch failed or
/// did not cover every service and size.
pub fn build_catalog(fetched: Result<Vec<CatalogObject>, SquareError>) -> CatalogShape {
    let objects = match fetched {
        Ok(objects) if !objects.is_empty() => objects,
        Ok(_) => {
            warn!("[Catalog] Square catalog is empty, using fallback prices");
            return fallback_catalog();
        }
        Err(e) => {
            warn!("[Catalog] Failed to fetch Square catalog, using fallback prices: {}", e);
            return fallback_catalog();
        }
    };

    let shape = shape_catalog(&objects);
    if !shape.is_complete() {
        warn!(
            "[Catalog] Square catalog covers only {} of 9 services, using fallback prices",
            shape.simplified_services.len()
        );
        return fallback_catalog();
    }
    debug!(
        "[Catalog] Shaped {} variations from Square",
        shape.variations.len()
    );
    shape
}
