//! Spreadsheet collaborator: worksheets of string cells behind a
//! read / update contract.

use crate::error::{sheet_error, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Rows of a worksheet under named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Cell at `row` under column `name`
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let index = self.column_index(name)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Every cell of one column, top to bottom
    pub fn column_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let index = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|i| row.get(i)).map(String::as_str))
    }

    pub fn push_row(&mut self, row: Vec<String>) -> AppResult<()> {
        if row.len() != self.columns.len() {
            return Err(sheet_error(&format!(
                "Row has {} cells but the worksheet has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append the `names` missing from the header, padding every row with blanks
    pub fn ensure_columns(&mut self, names: &[&str]) {
        for name in names {
            if self.column_index(name).is_none() {
                self.columns.push(name.to_string());
            }
        }

        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    /// Keep only the first `count` columns
    pub fn take_columns(&self, count: usize) -> Table {
        let count = count.min(self.columns.len());
        Table {
            columns: self.columns[..count].to_vec(),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    let mut row: Vec<String> = row.iter().take(count).cloned().collect();
                    row.resize(count, String::new());
                    row
                })
                .collect(),
        }
    }

    /// Drop rows in which every cell is blank
    pub fn without_blank_rows(mut self) -> Table {
        self.rows
            .retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
        self
    }
}

/// Read / update access to a spreadsheet
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// First `columns` columns of the worksheet, blank rows removed
    async fn read(&self, worksheet: &str, columns: usize) -> AppResult<Table>;

    /// Replace the worksheet contents
    async fn update(&self, worksheet: &str, table: &Table) -> AppResult<()>;
}

/// Spreadsheet kept as a single JSON document of worksheets
#[derive(Debug, Clone)]
pub struct JsonSheetStore {
    path: PathBuf,
}

impl JsonSheetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_all(&self) -> AppResult<BTreeMap<String, Table>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            sheet_error(&format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            sheet_error(&format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl SheetStore for JsonSheetStore {
    async fn read(&self, worksheet: &str, columns: usize) -> AppResult<Table> {
        let sheets = self.load_all()?;
        let table = sheets.get(worksheet).cloned().unwrap_or_default();
        debug!("Read {} rows from worksheet {}", table.len(), worksheet);
        Ok(table.take_columns(columns).without_blank_rows())
    }

    async fn update(&self, worksheet: &str, table: &Table) -> AppResult<()> {
        let mut sheets = self.load_all()?;
        sheets.insert(worksheet.to_string(), table.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&sheets)?;
        fs::write(&self.path, json).map_err(|e| {
            sheet_error(&format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        debug!("Wrote {} rows to worksheet {}", table.len(), worksheet);
        Ok(())
    }
}
