use crate::error::{Error, Result};
use crate::types::{Column, OrderLine, OrderSet, RawRow, Schema};
use crate::util::{parse_f64_safe, parse_i32_safe, parse_i64_safe, parse_timestamp_safe};
use csv::{ReaderBuilder, StringRecord};
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

pub fn load_orders(path: impl AsRef<Path>) -> Result<(OrderSet, LoadReport)> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading orders");
    let file = std::fs::File::open(path)?;
    load_orders_from_reader(file)
}

/// Read order lines from any CSV source. The schema is taken from the
/// header row; rows that fail validation are skipped and counted.
pub fn load_orders_from_reader<R: io::Read>(reader: R) -> Result<(OrderSet, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let schema = Schema::from_headers(headers.iter());
    for column in Column::REQUIRED {
        if !schema.contains(column) {
            return Err(Error::MissingColumn(column));
        }
    }

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut rows: Vec<OrderLine> = Vec::new();

    for result in rdr.records() {
        total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable csv record");
                parse_errors += 1;
                continue;
            }
        };
        match clean(&record, &headers) {
            Ok(line) => rows.push(line),
            Err(e) => {
                tracing::debug!(error = %e, "skipping row");
                parse_errors += 1;
            }
        }
    }

    if parse_errors > 0 {
        tracing::warn!(parse_errors, total_rows, "rows skipped due to parse/validation errors");
    }
    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
    };
    Ok((OrderSet::with_schema(schema, rows), report))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn clean(record: &StringRecord, headers: &StringRecord) -> Result<OrderLine> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let row: RawRow = record.deserialize(Some(headers))?;
    let missing = |column| Error::MissingField { line, column };

    let order_id = non_empty(row.order_id).ok_or_else(|| missing(Column::OrderId))?;
    let customer_id = non_empty(row.customer_id).ok_or_else(|| missing(Column::CustomerId))?;
    let raw_price = non_empty(row.price).ok_or_else(|| missing(Column::Price))?;
    let price = parse_f64_safe(Some(&raw_price))
        .filter(|p| *p >= 0.0)
        .ok_or_else(|| Error::InvalidValue {
            line,
            column: Column::Price,
            value: raw_price.clone(),
        })?;
    let raw_ts = row
        .order_purchase_timestamp
        .ok_or_else(|| missing(Column::OrderPurchaseTimestamp))?;
    let order_purchase_timestamp =
        parse_timestamp_safe(Some(&raw_ts)).ok_or_else(|| Error::InvalidTimestamp {
            line,
            value: raw_ts.clone(),
        })?;

    Ok(OrderLine {
        order_id,
        customer_id,
        seller_city: non_empty(row.seller_city),
        seller_state: non_empty(row.seller_state),
        product_category_name: non_empty(row.product_category_name),
        price,
        order_purchase_timestamp,
        order_delivered_customer_date: parse_timestamp_safe(row.order_delivered_customer_date.as_deref()),
        delivery_delay_days: parse_i64_safe(row.delivery_delay_days.as_deref()),
        year: parse_i32_safe(row.year.as_deref()),
        month: parse_i32_safe(row.month.as_deref()).and_then(|m| u32::try_from(m).ok()),
    })
}
