//! Transport seam between the store client and the remote service
//!
//! A [`Transport`] issues exactly one remote call per method. The request and
//! response types mirror the JSON bodies of the Sheets v4 REST API, so the HTTP
//! implementation can (de)serialize them directly and test doubles can work
//! with the same shapes.

use super::error::TransportFailure;
use super::value::Matrix;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Result of a single remote call
pub type TransportResult<T> = std::result::Result<T, TransportFailure>;

/// How written values are interpreted by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    /// Stored verbatim as text
    Raw,
    /// Parsed as if typed into the UI (numbers, dates, formulas)
    #[default]
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

/// How values are rendered on read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueRenderOption {
    FormattedValue,
    /// Typed values without number formatting
    #[default]
    UnformattedValue,
    Formula,
}

impl ValueRenderOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueRenderOption::FormattedValue => "FORMATTED_VALUE",
            ValueRenderOption::UnformattedValue => "UNFORMATTED_VALUE",
            ValueRenderOption::Formula => "FORMULA",
        }
    }
}

/// Where appended rows go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertDataOption {
    /// Write into empty cells after the table, possibly overwriting
    Overwrite,
    /// Insert new rows for the data
    #[default]
    InsertRows,
}

impl InsertDataOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertDataOption::Overwrite => "OVERWRITE",
            InsertDataOption::InsertRows => "INSERT_ROWS",
        }
    }
}

/// Values of one range, as exchanged on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    /// Omitted by the store when the range holds no data
    #[serde(default)]
    pub values: Matrix,
}

impl ValueRange {
    pub fn rows(range: impl Into<String>, values: Matrix) -> Self {
        ValueRange {
            range: Some(range.into()),
            major_dimension: Some("ROWS".into()),
            values,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetValuesRequest {
    pub range: String,
    pub render: ValueRenderOption,
}

#[derive(Debug, Clone)]
pub struct UpdateValuesRequest {
    pub range: String,
    pub input: ValueInputOption,
    pub body: ValueRange,
}

#[derive(Debug, Clone)]
pub struct AppendValuesRequest {
    pub range: String,
    pub input: ValueInputOption,
    pub insert: InsertDataOption,
    pub body: ValueRange,
}

#[derive(Debug, Clone)]
pub struct ClearValuesRequest {
    pub range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_rows: Option<i32>,
    #[serde(default)]
    pub updated_columns: Option<i32>,
    #[serde(default)]
    pub updated_cells: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// Table the store detected before appending
    #[serde(default)]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub cleared_range: Option<String>,
}

/// Row or column axis of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Rows,
    Columns,
}

/// Half-open index interval `[start_index, end_index)` along one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i32,
    pub dimension: Dimension,
    pub start_index: i32,
    pub end_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDimensionRequest {
    pub range: DimensionRange,
}

/// One structural mutation inside a batch update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_dimension: Option<DeleteDimensionRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateRequest {
    pub requests: Vec<Request>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// One reply per request; absent when the batch did not apply
    #[serde(default)]
    pub replies: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub index: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMetadata {
    #[serde(default)]
    pub properties: Option<SheetProperties>,
}

/// Workbook metadata, restricted to sheet properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub sheets: Vec<SheetMetadata>,
}

/// An authenticated connection able to issue the six request kinds against
/// a workbook
pub trait Transport: Send + Sync {
    fn get_values<'a>(
        &'a self,
        workbook_id: &'a str,
        request: GetValuesRequest,
    ) -> BoxFuture<'a, TransportResult<ValueRange>>;

    fn update_values<'a>(
        &'a self,
        workbook_id: &'a str,
        request: UpdateValuesRequest,
    ) -> BoxFuture<'a, TransportResult<UpdateValuesResponse>>;

    fn append_values<'a>(
        &'a self,
        workbook_id: &'a str,
        request: AppendValuesRequest,
    ) -> BoxFuture<'a, TransportResult<AppendValuesResponse>>;

    fn clear_values<'a>(
        &'a self,
        workbook_id: &'a str,
        request: ClearValuesRequest,
    ) -> BoxFuture<'a, TransportResult<ClearValuesResponse>>;

    fn batch_update<'a>(
        &'a self,
        workbook_id: &'a str,
        request: BatchUpdateRequest,
    ) -> BoxFuture<'a, TransportResult<BatchUpdateResponse>>;

    fn get_spreadsheet<'a>(&'a self, workbook_id: &'a str)
        -> BoxFuture<'a, TransportResult<Spreadsheet>>;
}
