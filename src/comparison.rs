// Side-by-side comparison of 2 to 3 vehicles.
//
// Rows come out in a fixed order. Price, year and mileage rows carry
// best/worst markers; the records themselves are never touched.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::MarketError;
use crate::models::{Vehicle, VehicleId};
use crate::selection::COMPARE_LIMIT;

const MIN_VEHICLES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    Price,
    Year,
    Mileage,
    Make,
    Model,
    BodyType,
    Transmission,
    FuelType,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl Attribute {
    pub const ROWS: [Attribute; 9] = [
        Attribute::Price,
        Attribute::Year,
        Attribute::Mileage,
        Attribute::Make,
        Attribute::Model,
        Attribute::BodyType,
        Attribute::Transmission,
        Attribute::FuelType,
        Attribute::Color,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Attribute::Price => "Price",
            Attribute::Year => "Year",
            Attribute::Mileage => "Mileage",
            Attribute::Make => "Make",
            Attribute::Model => "Model",
            Attribute::BodyType => "Body Type",
            Attribute::Transmission => "Transmission",
            Attribute::FuelType => "Fuel Type",
            Attribute::Color => "Color",
        }
    }

    // `None` for rows that are shown but not ranked.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Attribute::Price | Attribute::Year => Some(Direction::HigherIsBetter),
            Attribute::Mileage => Some(Direction::LowerIsBetter),
            _ => None,
        }
    }

    fn value(self, vehicle: &Vehicle) -> CellValue {
        match self {
            Attribute::Price => CellValue::Number(vehicle.price),
            Attribute::Year => CellValue::Number(f64::from(vehicle.year)),
            Attribute::Mileage => CellValue::Number(f64::from(vehicle.mileage)),
            Attribute::Make => CellValue::Text(vehicle.make.clone()),
            Attribute::Model => CellValue::Text(vehicle.model.clone()),
            Attribute::BodyType => CellValue::Text(vehicle.body_type.clone()),
            Attribute::Transmission => CellValue::Text(vehicle.transmission.clone()),
            Attribute::FuelType => CellValue::Text(vehicle.fuel_type.clone()),
            Attribute::Color => CellValue::Text(vehicle.color.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    Best,
    Worst,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub attribute: Attribute,
    pub label: &'static str,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub feature: String,
    pub present: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonTable {
    pub vehicle_ids: Vec<VehicleId>,
    pub rows: Vec<ComparisonRow>,
    pub features: Vec<FeatureRow>,
}

fn highlight_row(values: &[CellValue], direction: Direction) -> Vec<Option<Highlight>> {
    let numbers: Vec<f64> = values.iter().filter_map(CellValue::as_number).collect();
    if numbers.len() != values.len() {
        return vec![None; values.len()];
    }

    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    if max == min {
        return vec![None; values.len()];
    }

    let (best, worst) = match direction {
        Direction::HigherIsBetter => (max, min),
        Direction::LowerIsBetter => (min, max),
    };

    numbers
        .iter()
        .map(|&n| {
            if n == best {
                Some(Highlight::Best)
            } else if n == worst {
                Some(Highlight::Worst)
            } else {
                None
            }
        })
        .collect()
}

fn feature_matrix(vehicles: &[Vehicle]) -> Vec<FeatureRow> {
    let all: BTreeSet<&str> = vehicles
        .iter()
        .flat_map(|v| v.features.iter().map(String::as_str))
        .collect();

    all.into_iter()
        .map(|feature| FeatureRow {
            feature: feature.to_string(),
            present: vehicles.iter().map(|v| v.has_feature(feature)).collect(),
        })
        .collect()
}

// Build the comparison table for `vehicles`, keeping their order as the
// column order.
pub fn compare(vehicles: &[Vehicle]) -> Result<ComparisonTable, MarketError> {
    if vehicles.len() < MIN_VEHICLES {
        return Err(MarketError::InsufficientVehicles {
            found: vehicles.len(),
        });
    }
    if vehicles.len() > COMPARE_LIMIT {
        return Err(MarketError::CapacityExceeded {
            limit: COMPARE_LIMIT,
        });
    }

    let rows = Attribute::ROWS
        .iter()
        .map(|&attribute| {
            let values: Vec<CellValue> = vehicles.iter().map(|v| attribute.value(v)).collect();
            let marks = match attribute.direction() {
                Some(direction) => highlight_row(&values, direction),
                None => vec![None; values.len()],
            };
            ComparisonRow {
                attribute,
                label: attribute.label(),
                cells: values
                    .into_iter()
                    .zip(marks)
                    .map(|(value, highlight)| Cell { value, highlight })
                    .collect(),
            }
        })
        .collect();

    Ok(ComparisonTable {
        vehicle_ids: vehicles.iter().map(|v| v.id).collect(),
        rows,
        features: feature_matrix(vehicles),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn vehicle(id: VehicleId, price: f64, year: i32, mileage: u32, features: &[&str]) -> Vehicle {
        Vehicle {
            id,
            year,
            make: "Toyota".into(),
            model: "Camry".into(),
            price,
            mileage,
            color: "White".into(),
            body_type: "Sedan".into(),
            fuel_type: "Gasoline".into(),
            transmission: "Automatic".into(),
            condition: None,
            vin: format!("VIN{id}"),
            dealership_id: 1,
            date_added: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            listing_url: format!("https://example.com/{id}"),
            images: vec![format!("https://example.com/{id}.jpg")],
            features: features.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn row(table: &ComparisonTable, attribute: Attribute) -> &ComparisonRow {
        table.rows.iter().find(|r| r.attribute == attribute).unwrap()
    }

    fn marks(row: &ComparisonRow) -> Vec<Option<Highlight>> {
        row.cells.iter().map(|c| c.highlight).collect()
    }

    #[test]
    fn lowest_mileage_is_best() {
        let table = compare(&[
            vehicle(1, 20000.0, 2020, 32000, &[]),
            vehicle(2, 20000.0, 2020, 45000, &[]),
            vehicle(3, 20000.0, 2020, 28000, &[]),
        ])
        .unwrap();

        assert_eq!(
            marks(row(&table, Attribute::Mileage)),
            vec![None, Some(Highlight::Worst), Some(Highlight::Best)]
        );
    }

    #[test]
    fn equal_values_are_not_highlighted() {
        let table = compare(&[
            vehicle(1, 20000.0, 2020, 10, &[]),
            vehicle(2, 20000.0, 2020, 20, &[]),
        ])
        .unwrap();
        assert_eq!(marks(row(&table, Attribute::Price)), vec![None, None]);
        assert_eq!(marks(row(&table, Attribute::Year)), vec![None, None]);
    }

    #[test]
    fn higher_price_and_year_are_best() {
        let table = compare(&[
            vehicle(1, 18000.0, 2019, 10, &[]),
            vehicle(2, 26000.0, 2022, 10, &[]),
        ])
        .unwrap();
        assert_eq!(
            marks(row(&table, Attribute::Price)),
            vec![Some(Highlight::Worst), Some(Highlight::Best)]
        );
        assert_eq!(
            marks(row(&table, Attribute::Year)),
            vec![Some(Highlight::Worst), Some(Highlight::Best)]
        );
    }

    #[test]
    fn ties_share_a_marker() {
        let table = compare(&[
            vehicle(1, 1.0, 2020, 5000, &[]),
            vehicle(2, 1.0, 2020, 5000, &[]),
            vehicle(3, 1.0, 2020, 9000, &[]),
        ])
        .unwrap();
        assert_eq!(
            marks(row(&table, Attribute::Mileage)),
            vec![Some(Highlight::Best), Some(Highlight::Best), Some(Highlight::Worst)]
        );
    }

    #[test]
    fn text_rows_never_highlight_and_order_is_fixed() {
        let table = compare(&[
            vehicle(1, 1.0, 2020, 1, &[]),
            vehicle(2, 2.0, 2021, 2, &[]),
        ])
        .unwrap();
        let order: Vec<Attribute> = table.rows.iter().map(|r| r.attribute).collect();
        assert_eq!(order, Attribute::ROWS.to_vec());
        assert!(row(&table, Attribute::Make).cells.iter().all(|c| c.highlight.is_none()));
    }

    #[test]
    fn feature_matrix_is_sorted_union() {
        let table = compare(&[
            vehicle(1, 1.0, 2020, 1, &["Sunroof", "Bluetooth", "Bluetooth"]),
            vehicle(2, 2.0, 2021, 2, &["Backup Camera", "Bluetooth"]),
        ])
        .unwrap();

        let features: Vec<&str> = table.features.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(features, vec!["Backup Camera", "Bluetooth", "Sunroof"]);
        assert_eq!(table.features[0].present, vec![false, true]);
        assert_eq!(table.features[1].present, vec![true, true]);
        assert_eq!(table.features[2].present, vec![true, false]);
    }

    #[test]
    fn rejects_too_few_or_too_many() {
        assert!(matches!(
            compare(&[]),
            Err(MarketError::InsufficientVehicles { found: 0 })
        ));
        assert!(matches!(
            compare(&[vehicle(1, 1.0, 2020, 1, &[])]),
            Err(MarketError::InsufficientVehicles { found: 1 })
        ));
        let four: Vec<Vehicle> = (1..=4).map(|id| vehicle(id, 1.0, 2020, 1, &[])).collect();
        assert!(matches!(compare(&four), Err(MarketError::CapacityExceeded { limit: 3 })));
    }

    #[test]
    fn input_is_untouched() {
        let vehicles = vec![
            vehicle(1, 1.0, 2020, 1, &["A"]),
            vehicle(2, 2.0, 2021, 2, &["B"]),
        ];
        let snapshot = vehicles.clone();
        compare(&vehicles).unwrap();
        assert_eq!(vehicles, snapshot);
    }
}
