// Filter <-> query string codec.
//
// List-valued keys are written as repeated `key[]=value` pairs, one per
// element and in list order. Scalars are written once and omitted entirely
// when absent or blank, so they come back as "absent" rather than as an
// empty-string constraint.
//
// Decoding does not guess types from the shape of a value. Each recognized
// key has a fixed kind in `FilterKey::kind`; a model called "350Z" stays
// a string, and a non-numeric `minYear` is rejected instead of silently
// turning into a text constraint. Unrecognized keys are ignored.

use crate::error::MarketError;
use crate::filter::VehicleFilter;

pub const LIST_MARKER: &str = "[]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    List,
    Text,
    Integer,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Make,
    Model,
    MinYear,
    MaxYear,
    MinPrice,
    MaxPrice,
    MaxMileage,
    BodyType,
    FuelType,
    Transmission,
    Condition,
}

impl FilterKey {
    // Encoding order
    pub const ALL: [FilterKey; 11] = [
        FilterKey::Make,
        FilterKey::Model,
        FilterKey::MinYear,
        FilterKey::MaxYear,
        FilterKey::MinPrice,
        FilterKey::MaxPrice,
        FilterKey::MaxMileage,
        FilterKey::BodyType,
        FilterKey::FuelType,
        FilterKey::Transmission,
        FilterKey::Condition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKey::Make => "make",
            FilterKey::Model => "model",
            FilterKey::MinYear => "minYear",
            FilterKey::MaxYear => "maxYear",
            FilterKey::MinPrice => "minPrice",
            FilterKey::MaxPrice => "maxPrice",
            FilterKey::MaxMileage => "maxMileage",
            FilterKey::BodyType => "bodyType",
            FilterKey::FuelType => "fuelType",
            FilterKey::Transmission => "transmission",
            FilterKey::Condition => "condition",
        }
    }

    pub fn kind(self) -> KeyKind {
        match self {
            FilterKey::Make
            | FilterKey::BodyType
            | FilterKey::FuelType
            | FilterKey::Transmission
            | FilterKey::Condition => KeyKind::List,
            FilterKey::Model => KeyKind::Text,
            FilterKey::MinYear | FilterKey::MaxYear | FilterKey::MaxMileage => KeyKind::Integer,
            FilterKey::MinPrice | FilterKey::MaxPrice => KeyKind::Number,
        }
    }

    pub fn from_name(name: &str) -> Option<FilterKey> {
        FilterKey::ALL.into_iter().find(|k| k.name() == name)
    }

    fn list_mut(self, filter: &mut VehicleFilter) -> Option<&mut Vec<String>> {
        match self {
            FilterKey::Make => Some(&mut filter.make),
            FilterKey::BodyType => Some(&mut filter.body_type),
            FilterKey::FuelType => Some(&mut filter.fuel_type),
            FilterKey::Transmission => Some(&mut filter.transmission),
            FilterKey::Condition => Some(&mut filter.condition),
            _ => None,
        }
    }

    fn list(self, filter: &VehicleFilter) -> &[String] {
        match self {
            FilterKey::Make => &filter.make,
            FilterKey::BodyType => &filter.body_type,
            FilterKey::FuelType => &filter.fuel_type,
            FilterKey::Transmission => &filter.transmission,
            FilterKey::Condition => &filter.condition,
            _ => &[],
        }
    }

    fn scalar(self, filter: &VehicleFilter) -> Option<String> {
        match self {
            FilterKey::Model => filter.model.clone(),
            FilterKey::MinYear => filter.min_year.map(|v| v.to_string()),
            FilterKey::MaxYear => filter.max_year.map(|v| v.to_string()),
            FilterKey::MinPrice => filter.min_price.map(|v| v.to_string()),
            FilterKey::MaxPrice => filter.max_price.map(|v| v.to_string()),
            FilterKey::MaxMileage => filter.max_mileage.map(|v| v.to_string()),
            _ => None,
        }
    }
}

// Flatten a filter into ordered query pairs.
pub fn encode(filter: &VehicleFilter) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for key in FilterKey::ALL {
        if key.kind() == KeyKind::List {
            let name = format!("{}{}", key.name(), LIST_MARKER);
            for item in key.list(filter) {
                pairs.push((name.clone(), item.clone()));
            }
        } else if let Some(value) = key.scalar(filter).filter(|v| !v.trim().is_empty()) {
            pairs.push((key.name().to_string(), value));
        }
    }
    pairs
}

fn parse_integer<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, MarketError> {
    value.trim().parse::<T>().map_err(|_| {
        MarketError::validation(format!("{key} must be a whole number, got '{value}'"))
    })
}

fn parse_number(key: &str, value: &str) -> Result<f64, MarketError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| MarketError::validation(format!("{key} must be a number, got '{value}'")))
}

// Rebuild a filter from query pairs. Repeated list keys append in order;
// repeated scalar keys keep the last value.
pub fn decode<I, K, V>(pairs: I) -> Result<VehicleFilter, MarketError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut filter = VehicleFilter::default();

    for (raw_key, value) in pairs {
        let raw_key = raw_key.as_ref();
        let value = value.as_ref();
        let base = raw_key.strip_suffix(LIST_MARKER).unwrap_or(raw_key);

        let Some(key) = FilterKey::from_name(base) else {
            tracing::debug!(key = raw_key, "Ignoring unrecognized query key");
            continue;
        };

        if let Some(list) = key.list_mut(&mut filter) {
            list.push(value.to_string());
            continue;
        }

        // Blank scalars mean "absent"
        if value.trim().is_empty() {
            continue;
        }

        match key {
            FilterKey::Model => filter.model = Some(value.to_string()),
            FilterKey::MinYear => filter.min_year = Some(parse_integer(base, value)?),
            FilterKey::MaxYear => filter.max_year = Some(parse_integer(base, value)?),
            FilterKey::MaxMileage => filter.max_mileage = Some(parse_integer(base, value)?),
            FilterKey::MinPrice => filter.min_price = Some(parse_number(base, value)?),
            FilterKey::MaxPrice => filter.max_price = Some(parse_number(base, value)?),
            _ => {}
        }
    }

    Ok(filter)
}

// Percent-encoded `a=1&b[]=x` form of `encode`.
pub fn to_query_string(filter: &VehicleFilter) -> String {
    encode(filter)
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_component(component: &str) -> Result<String, MarketError> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|_| MarketError::validation("query string is not valid UTF-8"))
}

// Split and percent-decode a raw query string into ordered pairs.
pub fn parse_pairs(query: &str) -> Result<Vec<(String, String)>, MarketError> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (k, v) = segment.split_once('=').unwrap_or((segment, ""));
            Ok((decode_component(k)?, decode_component(v)?))
        })
        .collect()
}

pub fn from_query_string(query: &str) -> Result<VehicleFilter, MarketError> {
    decode(parse_pairs(query)?)
}
