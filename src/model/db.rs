use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::model::models::Sale;

/**
 * Row of the sales table as returned by the sales queries.
 */
#[derive(Debug, sqlx::FromRow)]
pub struct SaleRow {
    pub invoice_id: String,
    pub branch: String,
    pub city: Option<String>,
    pub customer_type: Option<String>,
    pub gender: Option<String>,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total: Decimal,
    pub sale_date: NaiveDate,
    pub sale_time: Option<NaiveTime>,
    pub payment_method: String,
    pub cogs: Option<Decimal>,
    pub gross_margin_percentage: Option<Decimal>,
    pub gross_income: Option<Decimal>,
    pub rating: Option<Decimal>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            invoice_id: row.invoice_id,
            branch: row.branch,
            city: row.city,
            customer_type: row.customer_type,
            gender: row.gender,
            category: row.category,
            unit_price: row.unit_price,
            quantity: row.quantity,
            total: row.total,
            date: row.sale_date,
            time: row.sale_time,
            payment_method: row.payment_method,
            cogs: row.cogs,
            gross_margin_percentage: row.gross_margin_percentage,
            gross_income: row.gross_income,
            rating: row.rating,
        }
    }
}
