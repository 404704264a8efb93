use anyhow::Result;
use serde::Serialize;

use std::io::Write;

use super::Order;

/// One order, flattened for export to JSON or CSV.
///
/// Fees and net amounts are rounded to whole cents.
#[derive(Debug, PartialEq, Serialize)]
pub struct ExportRow {
    pub date: String,
    pub product: String,
    pub subtotal: f64,
    pub tax: f64,
    pub fee: f64,
    pub net: f64,
    pub currency: String,
    pub refunded: bool,
}

impl From<&Order> for ExportRow {
    fn from(order: &Order) -> Self {
        Self {
            date: order.created_at.format("%Y-%m-%d").to_string(),
            product: order.product().to_string(),
            subtotal: order.subtotal().dollars(),
            tax: order.tax().dollars(),
            fee: order.fee().total.rounded(),
            net: order.net().rounded(),
            currency: order.currency().to_string(),
            refunded: order.refunded,
        }
    }
}

#[must_use]
pub fn export_rows(orders: &[Order]) -> Vec<ExportRow> {
    orders.iter().map(ExportRow::from).collect()
}

/// Writes `orders` to `out` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns any errors from serializing or writing.
pub fn write_json(orders: &[Order], mut out: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, &export_rows(orders))?;
    writeln!(out)?;
    Ok(())
}

/// Writes `orders` to `out` as CSV, with a header row.
///
/// # Errors
///
/// Returns any errors from serializing or writing.
pub fn write_csv(orders: &[Order], out: impl Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for row in export_rows(orders) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
