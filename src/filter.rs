// Typed vehicle filter.
//
// One optional field per recognized key. Empty lists and `None` impose no
// constraint; every present field is applied as an independent predicate and
// the results are combined with AND. Within a list field, membership is OR.
// Inverted ranges (e.g. `min_year > max_year`) are allowed and simply match
// nothing.

use serde::{Deserialize, Serialize};

use crate::models::Vehicle;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub make: Vec<String>,
    // Case-insensitive substring of the model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mileage: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fuel_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transmission: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<String>,
}

fn in_list(allowed: &[String], value: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|a| a == value)
}

impl VehicleFilter {
    // True when no field constrains the result.
    pub fn is_empty(&self) -> bool {
        self.make.is_empty()
            && self.model_needle().is_none()
            && self.min_year.is_none()
            && self.max_year.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.max_mileage.is_none()
            && self.body_type.is_empty()
            && self.fuel_type.is_empty()
            && self.transmission.is_empty()
            && self.condition.is_empty()
    }

    fn model_needle(&self) -> Option<String> {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if !in_list(&self.make, &vehicle.make) {
            return false;
        }
        if let Some(needle) = self.model_needle() {
            if !vehicle.model.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if self.min_year.is_some_and(|min| vehicle.year < min)
            || self.max_year.is_some_and(|max| vehicle.year > max)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| vehicle.price < min)
            || self.max_price.is_some_and(|max| vehicle.price > max)
        {
            return false;
        }
        if self.max_mileage.is_some_and(|max| vehicle.mileage > max) {
            return false;
        }
        if !in_list(&self.body_type, &vehicle.body_type)
            || !in_list(&self.fuel_type, &vehicle.fuel_type)
            || !in_list(&self.transmission, &vehicle.transmission)
        {
            return false;
        }
        if !self.condition.is_empty() {
            match vehicle.condition.as_deref() {
                Some(c) => return in_list(&self.condition, c),
                None => return false,
            }
        }
        true
    }

    // Short human-readable summary, at most three fragments.
    pub fn describe(&self) -> Vec<String> {
        let mut parts = Vec::new();

        if !self.make.is_empty() {
            parts.push(format!("Make: {}", self.make.join(", ")));
        }
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            parts.push(format!("Model: {model}"));
        }
        if self.min_year.is_some() || self.max_year.is_some() {
            let years: Vec<String> = [self.min_year, self.max_year]
                .iter()
                .flatten()
                .map(|y| y.to_string())
                .collect();
            parts.push(format!("Year: {}", years.join("-")));
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let prices: Vec<String> = [self.min_price, self.max_price]
                .iter()
                .flatten()
                .map(|p| format!("${}", group_thousands(*p)))
                .collect();
            parts.push(format!("Price: {}", prices.join("-")));
        }
        if !self.body_type.is_empty() {
            parts.push(format!("Type: {}", self.body_type.join(", ")));
        }
        if !self.fuel_type.is_empty() {
            parts.push(format!("Fuel: {}", self.fuel_type.join(", ")));
        }

        parts.truncate(3);
        parts
    }
}

// 25000.0 -> "25,000", 9999.5 -> "9,999.5"; at most three decimals
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + whole.len() / 3);
    if value < 0.0 && (whole != "0" || !frac.is_empty()) {
        out.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}
