// CSV export of a vehicle result list

use anyhow::{Context, Result};
use std::io::Write;

use crate::models::Vehicle;

const HEADER: [&str; 13] = [
    "id",
    "year",
    "make",
    "model",
    "price",
    "mileage",
    "bodyType",
    "fuelType",
    "transmission",
    "color",
    "vin",
    "dealershipId",
    "listingUrl",
];

pub fn write_vehicles_csv<W: Write>(writer: W, vehicles: &[Vehicle]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).context("Failed to write CSV header")?;

    for v in vehicles {
        wtr.write_record([
            v.id.to_string(),
            v.year.to_string(),
            v.make.clone(),
            v.model.clone(),
            v.price.to_string(),
            v.mileage.to_string(),
            v.body_type.clone(),
            v.fuel_type.clone(),
            v.transmission.clone(),
            v.color.clone(),
            v.vin.clone(),
            v.dealership_id.to_string(),
            v.listing_url.clone(),
        ])
        .with_context(|| format!("Failed to write CSV row for vehicle {}", v.id))?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

pub fn vehicles_to_csv(vehicles: &[Vehicle]) -> Result<String> {
    let mut buffer = Vec::new();
    write_vehicles_csv(&mut buffer, vehicles)?;
    String::from_utf8(buffer).context("CSV output was not valid UTF-8")
}
