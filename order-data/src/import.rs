//! Bulk entry of articles from CSV.
//!
//! ## CSV Format
//!
//! Headers are matched by name; column order does not matter and whitespace
//! around values is ignored.
//!
//! | Column       | Required | Type    | Notes |
//! |--------------|----------|---------|-------|
//! | `merchant`   | yes      | string  | One task is created per distinct merchant |
//! | `link`       | yes      | string  | Link or article number |
//! | `properties` | no       | string  | Size, colour, … |
//! | `quantity`   | no       | integer | Defaults to `1` when the cell is empty |
//! | `price`      | no       | decimal | Unit price, `.` or `,` as separator; empty means `0` |
//!
//! ### Example
//!
//! ```csv
//! merchant,link,properties,quantity,price
//! https://shop.example,https://shop.example/p/1,size M,2,"5,00"
//! https://shop.example,https://shop.example/p/2,,1,19.99
//! ```
use std::collections::HashMap;
use std::io::Read;

use order_core::money::parse_cents;
use order_core::{Article, Cents, MAX_TASKS, Order, Task};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while importing articles.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid price '{price}' on row {row}")]
    InvalidPrice { price: String, row: usize },

    #[error("missing merchant on row {row}")]
    MissingMerchant { row: usize },

    #[error("too many merchants: {count} (an order holds at most {} tasks)", MAX_TASKS)]
    TooManyTasks { count: usize },
}

/// Row layout of the CSV file.
#[derive(Debug, Deserialize)]
struct CsvRow {
    merchant: String,
    link: String,
    #[serde(default)]
    properties: String,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    price: String,
}

/// One imported article together with the merchant it is ordered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub merchant: String,
    pub link: String,
    pub properties: String,
    pub quantity: i64,
    pub price: Cents,
}

impl ArticleRecord {
    pub fn to_article(&self) -> Article {
        Article::new(
            self.link.clone(),
            self.properties.clone(),
            self.quantity,
            self.price,
        )
    }
}

/// Converts a CSV row. `row` is 1-based and used for error messages.
fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<ArticleRecord, ImportError> {
    if row.merchant.is_empty() {
        return Err(ImportError::MissingMerchant { row: row_number });
    }

    let price = if row.price.is_empty() {
        Cents::ZERO
    } else {
        parse_cents(&row.price).ok_or_else(|| ImportError::InvalidPrice {
            price: row.price.clone(),
            row: row_number,
        })?
    };

    Ok(ArticleRecord {
        merchant: row.merchant,
        link: row.link,
        properties: row.properties,
        quantity: row.quantity.unwrap_or(1),
        price,
    })
}

/// Turns CSV article lists into tasks.
pub struct OrderImporter;

impl OrderImporter {
    /// Parses article records from a CSV reader, in file order.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<ArticleRecord>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, result) in csv_reader.deserialize::<CsvRow>().enumerate() {
            records.push(convert_row(result?, index + 1)?);
        }

        debug!(records = records.len(), "parsed article CSV");
        Ok(records)
    }

    /// Groups records into one task per merchant.
    ///
    /// Tasks appear in the order their merchant first appears; articles keep
    /// their row order within a merchant.
    pub fn into_tasks(records: &[ArticleRecord]) -> Result<Vec<Task>, ImportError> {
        let mut tasks: Vec<Task> = Vec::new();
        let mut by_merchant: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let index = *by_merchant
                .entry(record.merchant.as_str())
                .or_insert_with(|| {
                    tasks.push(Task::new(record.merchant.clone()));
                    tasks.len() - 1
                });
            tasks[index].articles.push(record.to_article());
        }

        if tasks.len() > MAX_TASKS {
            return Err(ImportError::TooManyTasks { count: tasks.len() });
        }
        Ok(tasks)
    }

    /// Builds an order holding only the imported tasks.
    pub fn into_order(records: &[ArticleRecord]) -> Result<Order, ImportError> {
        Ok(Order {
            tasks: Self::into_tasks(records)?,
            ..Default::default()
        })
    }
}
