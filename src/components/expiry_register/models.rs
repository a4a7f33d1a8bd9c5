use crate::components::sheet::Table;
use crate::error::{sheet_error, validation_error, AppResult};
use chrono::NaiveDate;
use std::fmt;

/// Worksheet columns, in the order new worksheets are created with
pub const COLUMNS: [&str; 4] = ["ean_13", "marca", "data", "quantidade"];

/// Date format used in the `data` column
pub const DATE_FORMAT: &str = "%d-%m-%Y";

pub const MAX_EAN_DIGITS: usize = 13;
pub const MAX_QUANTITY: u32 = 24;

/// One product batch close to its expiry date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub ean_13: u64,
    pub brand: String,
    pub expiry_date: NaiveDate,
    pub quantity: u32,
}

impl ProductRecord {
    pub fn validate(&self) -> AppResult<()> {
        if self.ean_13 == 0 || self.brand.trim().is_empty() {
            return Err(validation_error(&t!("validation_required_fields")));
        }

        if self.ean_13.to_string().len() > MAX_EAN_DIGITS {
            return Err(validation_error(&t!(
                "validation_ean_length",
                max = MAX_EAN_DIGITS
            )));
        }

        if self.quantity > MAX_QUANTITY {
            return Err(validation_error(&t!(
                "validation_quantity",
                max = MAX_QUANTITY
            )));
        }

        Ok(())
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "ean_13" => self.ean_13.to_string(),
            "marca" => self.brand.clone(),
            "data" => self.expiry_date.format(DATE_FORMAT).to_string(),
            "quantidade" => self.quantity.to_string(),
            _ => String::new(),
        }
    }

    /// Cells for a worksheet laid out with `columns`
    pub fn to_row(&self, columns: &[String]) -> Vec<String> {
        columns.iter().map(|column| self.cell(column)).collect()
    }

    /// Parse the record stored at `row`
    pub fn from_row(table: &Table, row: usize) -> AppResult<Self> {
        let cell = |name: &str| {
            table
                .cell(row, name)
                .map(str::trim)
                .ok_or_else(|| sheet_error(&format!("Row {} has no '{}' cell", row + 1, name)))
        };

        let ean_13 = parse_number::<u64>(cell("ean_13")?)
            .ok_or_else(|| sheet_error(&format!("Row {} has an invalid EAN-13", row + 1)))?;
        let brand = cell("marca")?.to_string();
        let expiry_date = NaiveDate::parse_from_str(cell("data")?, DATE_FORMAT)
            .map_err(|e| sheet_error(&format!("Row {} has an invalid date: {}", row + 1, e)))?;
        let quantity = parse_number::<u32>(cell("quantidade")?)
            .ok_or_else(|| sheet_error(&format!("Row {} has an invalid quantity", row + 1)))?;

        Ok(Self {
            ean_13,
            brand,
            expiry_date,
            quantity,
        })
    }

    /// Title of the calendar reminder
    pub fn reminder_summary(&self) -> String {
        format!("Validade do Produto {}", self.ean_13)
    }

    /// Body of the calendar reminder
    pub fn reminder_description(&self) -> String {
        format!("Produto: {}\nQuantidade: {}", self.brand, self.quantity)
    }
}

impl fmt::Display for ProductRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>13}  {:<20}  {}  {:>2}",
            self.ean_13,
            self.brand,
            self.expiry_date.format(DATE_FORMAT),
            self.quantity
        )
    }
}

/// Spreadsheets that went through a float column store `123` as `123.0`
pub fn normalize_number(cell: &str) -> &str {
    let cell = cell.trim();
    cell.strip_suffix(".0").unwrap_or(cell)
}

fn parse_number<T: std::str::FromStr>(cell: &str) -> Option<T> {
    normalize_number(cell).parse::<T>().ok()
}
