//! Range-level operations against one workbook
//!
//! Every method is a single, independent round trip: validate locally, build
//! one request, await the transport, interpret the response. Nothing is
//! cached between calls and no retries are attempted.

use super::error::{Result, SheetsError, TransportFailure};
use super::range::{RangeAddress, Span};
use super::transport::{
    AppendValuesRequest, BatchUpdateRequest, BatchUpdateResponse, ClearValuesRequest,
    DeleteDimensionRequest, Dimension, DimensionRange, GetValuesRequest, InsertDataOption,
    Request, Transport, UpdateValuesRequest, ValueInputOption, ValueRange, ValueRenderOption,
};
use super::value::{matrix_width, CellValue, Matrix, Row};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Client for a single workbook
///
/// Holds only the workbook ID and a shared transport, so it can be cloned or
/// wrapped in an `Arc` and used from several tasks. Concurrent writes to
/// overlapping ranges race on the remote side; the last write wins.
pub struct TabularStoreClient<T: Transport + ?Sized> {
    transport: Arc<T>,
    workbook_id: String,
}

impl<T: Transport + ?Sized> Clone for TabularStoreClient<T> {
    fn clone(&self) -> Self {
        TabularStoreClient {
            transport: Arc::clone(&self.transport),
            workbook_id: self.workbook_id.clone(),
        }
    }
}

impl<T: Transport + ?Sized> TabularStoreClient<T> {
    /// Create a client for `workbook_id` over an authenticated transport
    pub fn new(transport: Arc<T>, workbook_id: impl Into<String>) -> Result<Self> {
        let workbook_id = workbook_id.into();
        if workbook_id.trim().is_empty() {
            return Err(SheetsError::Config("workbook ID must not be empty".into()));
        }
        Ok(TabularStoreClient {
            transport,
            workbook_id,
        })
    }

    pub fn workbook_id(&self) -> &str {
        &self.workbook_id
    }

    /// Fetch the current contents of `range`
    ///
    /// A range without data yields an empty matrix.
    pub async fn read(&self, range: &str) -> Result<Matrix> {
        let range = RangeAddress::parse(range)?;
        tracing::debug!("get-values {} in workbook {}", range, self.workbook_id);

        let response = self
            .transport
            .get_values(
                &self.workbook_id,
                GetValuesRequest {
                    range: range.to_string(),
                    render: ValueRenderOption::UnformattedValue,
                },
            )
            .await?;

        tracing::trace!("get-values {} returned {} rows", range, response.values.len());
        Ok(response.values)
    }

    /// Overwrite the cells of `range` with `matrix`, left to right and top to
    /// bottom. Cells of the range not covered by the matrix keep their
    /// contents. Values use user-entered semantics.
    ///
    /// A single-cell range is the top-left anchor of the write, so a larger
    /// matrix spills right and down from it.
    ///
    /// Returns the number of cells actually written.
    pub async fn update(&self, range: &str, matrix: Matrix) -> Result<u32> {
        let range = RangeAddress::parse(range)?;
        check_fits(&range, &matrix)?;
        check_finite(&range, &matrix)?;
        tracing::debug!(
            "update-values {} ({} rows) in workbook {}",
            range,
            matrix.len(),
            self.workbook_id
        );

        let response = self
            .transport
            .update_values(
                &self.workbook_id,
                UpdateValuesRequest {
                    range: range.to_string(),
                    input: ValueInputOption::UserEntered,
                    body: ValueRange::rows(range.to_string(), matrix),
                },
            )
            .await?;

        let updated = response.updated_cells.unwrap_or(0);
        Ok(u32::try_from(updated).unwrap_or(0))
    }

    /// Insert `matrix` as new rows below the existing data in the column span
    /// of `range`
    ///
    /// Returns the range the rows actually landed in, which generally differs
    /// from `range`.
    pub async fn append(&self, range: &str, matrix: Matrix) -> Result<RangeAddress> {
        let range = RangeAddress::parse(range)?;
        if matrix.is_empty() {
            return Err(SheetsError::Validation(format!(
                "nothing to append to {}: matrix is empty",
                range
            )));
        }
        check_finite(&range, &matrix)?;
        tracing::debug!(
            "append-values {} ({} rows) in workbook {}",
            range,
            matrix.len(),
            self.workbook_id
        );

        let response = self
            .transport
            .append_values(
                &self.workbook_id,
                AppendValuesRequest {
                    range: range.to_string(),
                    input: ValueInputOption::UserEntered,
                    insert: InsertDataOption::InsertRows,
                    body: ValueRange::rows(range.to_string(), matrix),
                },
            )
            .await?;

        let landed = response
            .updates
            .and_then(|u| u.updated_range)
            .ok_or_else(|| TransportFailure::decode("append response has no updated range"))?;
        parse_returned_range(&landed)
    }

    /// Clear the contents (not formatting, not the cells) of `range`
    ///
    /// Clearing an already empty range succeeds and reports the same range.
    pub async fn clear(&self, range: &str) -> Result<RangeAddress> {
        let range = RangeAddress::parse(range)?;
        tracing::debug!("clear-values {} in workbook {}", range, self.workbook_id);

        let response = self
            .transport
            .clear_values(
                &self.workbook_id,
                ClearValuesRequest {
                    range: range.to_string(),
                },
            )
            .await?;

        let cleared = response
            .cleared_range
            .ok_or_else(|| TransportFailure::decode("clear response has no cleared range"))?;
        parse_returned_range(&cleared)
    }

    /// Remove rows `[start_index, end_index)` (zero-based) from the sheet with
    /// numeric ID `sheet_id`. Rows below shift up. Not reversible.
    pub async fn delete_rows(&self, sheet_id: i32, start_index: i32, end_index: i32) -> Result<bool> {
        if start_index < 0 || end_index < 0 {
            return Err(SheetsError::Validation(format!(
                "row indices must not be negative: [{}, {})",
                start_index, end_index
            )));
        }
        if start_index >= end_index {
            return Err(SheetsError::Validation(format!(
                "empty or inverted row interval: [{}, {})",
                start_index, end_index
            )));
        }
        tracing::debug!(
            "delete rows [{}, {}) of sheet {} in workbook {}",
            start_index,
            end_index,
            sheet_id,
            self.workbook_id
        );

        let response = self
            .batch_update(vec![Request {
                delete_dimension: Some(DeleteDimensionRequest {
                    range: DimensionRange {
                        sheet_id,
                        dimension: Dimension::Rows,
                        start_index,
                        end_index,
                    },
                }),
            }])
            .await?;

        Ok(response.replies.is_some())
    }

    /// Map every sheet title in the workbook to its numeric sheet ID
    ///
    /// Sheets reported without a title or with a missing or negative ID are
    /// left out and logged at `warn` level.
    pub async fn list_sheets(&self) -> Result<BTreeMap<String, i32>> {
        let tabs = self.sheet_tabs().await?;
        Ok(tabs.into_iter().map(|tab| (tab.title, tab.sheet_id)).collect())
    }

    /// Valid sheets of the workbook in tab order
    ///
    /// Same filtering as [`list_sheets`](Self::list_sheets). Sheets without a
    /// reported index keep their position in the response.
    pub async fn sheet_tabs(&self) -> Result<Vec<SheetTab>> {
        tracing::debug!("get-spreadsheet {}", self.workbook_id);
        let spreadsheet = self.transport.get_spreadsheet(&self.workbook_id).await?;

        let mut tabs = Vec::new();
        for (position, sheet) in spreadsheet.sheets.into_iter().enumerate() {
            let properties = sheet.properties.unwrap_or_default();
            match (properties.title, properties.sheet_id) {
                (Some(title), Some(id)) if !title.is_empty() && id >= 0 => {
                    let index = properties.index.map_or(position as i64, i64::from);
                    tabs.push((index, SheetTab { title, sheet_id: id }));
                }
                (title, id) => {
                    tracing::warn!(
                        "skipping sheet at position {} of workbook {}: title {:?}, id {:?}",
                        position,
                        self.workbook_id,
                        title,
                        id
                    );
                }
            }
        }
        // Stable, so equal indices keep response order
        tabs.sort_by_key(|(index, _)| *index);
        Ok(tabs.into_iter().map(|(_, tab)| tab).collect())
    }

    async fn batch_update(&self, requests: Vec<Request>) -> Result<BatchUpdateResponse> {
        let response = self
            .transport
            .batch_update(&self.workbook_id, BatchUpdateRequest { requests })
            .await?;
        Ok(response)
    }
}

/// One valid sheet of a workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTab {
    pub title: String,
    pub sheet_id: i32,
}

/// Reject matrices that spill outside a bounded range
///
/// A single cell only anchors the write and bounds nothing.
fn check_fits(range: &RangeAddress, matrix: &[Row]) -> Result<()> {
    if let Span::Cells { start, end } = range.span() {
        if start == end {
            return Ok(());
        }
    }
    if let Some(rows) = range.row_count() {
        if matrix.len() as u64 > u64::from(rows) {
            return Err(SheetsError::Validation(format!(
                "{} rows do not fit in {} ({} rows)",
                matrix.len(),
                range,
                rows
            )));
        }
    }
    if let Some(cols) = range.col_count() {
        let width = matrix_width(matrix);
        if width as u64 > u64::from(cols) {
            return Err(SheetsError::Validation(format!(
                "a row of {} cells does not fit in {} ({} columns)",
                width, range, cols
            )));
        }
    }
    Ok(())
}

/// Reject NaN and infinities, which JSON can only carry as `null`
fn check_finite(range: &RangeAddress, matrix: &[Row]) -> Result<()> {
    for (r, row) in matrix.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if let CellValue::Number(n) = cell {
                if !n.is_finite() {
                    return Err(SheetsError::Validation(format!(
                        "non-finite number {} at row {}, column {} of the data for {}",
                        n,
                        r + 1,
                        c + 1,
                        range
                    )));
                }
            }
        }
    }
    Ok(())
}

fn parse_returned_range(range: &str) -> Result<RangeAddress> {
    RangeAddress::parse(range).map_err(|e| {
        TransportFailure::decode(format!("store returned unusable range '{}'", range))
            .with_source(e)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::error::FailureKind;
    use crate::sheets::transport::{
        AppendValuesResponse, ClearValuesResponse, SheetMetadata, SheetProperties, Spreadsheet,
        TransportResult, UpdateValuesResponse,
    };
    use futures::future::{self, BoxFuture};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers every call with canned responses and records what was sent
    #[derive(Default)]
    struct ScriptedTransport {
        calls: AtomicUsize,
        last_range: Mutex<Option<String>>,
        last_batch: Mutex<Option<BatchUpdateRequest>>,
        sheets: Vec<SheetMetadata>,
        fail_with: Option<FailureKind>,
    }

    impl ScriptedTransport {
        fn record(&self, range: Option<&str>) -> TransportResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(range) = range {
                *self.last_range.lock().unwrap() = Some(range.to_string());
            }
            match self.fail_with {
                Some(kind) => Err(TransportFailure::new(kind, "scripted failure")),
                None => Ok(()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn get_values<'a>(
            &'a self,
            _workbook_id: &'a str,
            request: GetValuesRequest,
        ) -> BoxFuture<'a, TransportResult<ValueRange>> {
            let result = self.record(Some(request.range.as_str())).map(|_| ValueRange::default());
            Box::pin(future::ready(result))
        }

        fn update_values<'a>(
            &'a self,
            _workbook_id: &'a str,
            request: UpdateValuesRequest,
        ) -> BoxFuture<'a, TransportResult<UpdateValuesResponse>> {
            let cells = crate::sheets::value::cell_count(&request.body.values) as i32;
            let result = self.record(Some(request.range.as_str())).map(|_| UpdateValuesResponse {
                updated_cells: Some(cells),
                ..Default::default()
            });
            Box::pin(future::ready(result))
        }

        fn append_values<'a>(
            &'a self,
            _workbook_id: &'a str,
            request: AppendValuesRequest,
        ) -> BoxFuture<'a, TransportResult<AppendValuesResponse>> {
            let result = self.record(Some(request.range.as_str())).map(|_| AppendValuesResponse {
                updates: Some(UpdateValuesResponse {
                    updated_range: Some("'Q1 Sales'!A3:B3".into()),
                    ..Default::default()
                }),
                ..Default::default()
            });
            Box::pin(future::ready(result))
        }

        fn clear_values<'a>(
            &'a self,
            _workbook_id: &'a str,
            request: ClearValuesRequest,
        ) -> BoxFuture<'a, TransportResult<ClearValuesResponse>> {
            let result = self.record(Some(request.range.as_str())).map(|_| ClearValuesResponse {
                cleared_range: Some("not a range!!".into()),
                ..Default::default()
            });
            Box::pin(future::ready(result))
        }

        fn batch_update<'a>(
            &'a self,
            _workbook_id: &'a str,
            request: BatchUpdateRequest,
        ) -> BoxFuture<'a, TransportResult<BatchUpdateResponse>> {
            *self.last_batch.lock().unwrap() = Some(request);
            let result = self.record(None).map(|_| BatchUpdateResponse {
                replies: Some(vec![serde_json::json!({})]),
                ..Default::default()
            });
            Box::pin(future::ready(result))
        }

        fn get_spreadsheet<'a>(
            &'a self,
            _workbook_id: &'a str,
        ) -> BoxFuture<'a, TransportResult<Spreadsheet>> {
            let result = self.record(None).map(|_| Spreadsheet {
                spreadsheet_id: None,
                sheets: self.sheets.clone(),
            });
            Box::pin(future::ready(result))
        }
    }

    fn scripted_client(
        transport: ScriptedTransport,
    ) -> (Arc<ScriptedTransport>, TabularStoreClient<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let client = TabularStoreClient::new(Arc::clone(&transport), "wb-1").unwrap();
        (transport, client)
    }

    fn sheet(title: Option<&str>, id: Option<i32>) -> SheetMetadata {
        tab(title, id, None)
    }

    fn tab(title: Option<&str>, id: Option<i32>, index: Option<i32>) -> SheetMetadata {
        SheetMetadata {
            properties: Some(SheetProperties {
                sheet_id: id,
                title: title.map(str::to_string),
                index,
            }),
        }
    }

    #[test]
    fn test_empty_workbook_id_is_config_error() {
        let transport = Arc::new(ScriptedTransport::default());
        assert!(matches!(
            TabularStoreClient::new(Arc::clone(&transport), ""),
            Err(SheetsError::Config(_))
        ));
        assert!(matches!(
            TabularStoreClient::new(transport, "   "),
            Err(SheetsError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_rows_validation_skips_remote_call() {
        let (transport, client) = scripted_client(ScriptedTransport::default());

        for (start, end) in [(3, 3), (4, 2), (-1, 2), (0, -5)] {
            let err = client.delete_rows(0, start, end).await.unwrap_err();
            assert!(matches!(err, SheetsError::Validation(_)), "[{}, {})", start, end);
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_rows_sends_delete_dimension() {
        let (transport, client) = scripted_client(ScriptedTransport::default());

        assert!(client.delete_rows(42, 1, 4).await.unwrap());

        let batch = transport.last_batch.lock().unwrap().clone().unwrap();
        let range = &batch.requests[0].delete_dimension.as_ref().unwrap().range;
        assert_eq!(range.sheet_id, 42);
        assert_eq!(range.dimension, Dimension::Rows);
        assert_eq!((range.start_index, range.end_index), (1, 4));
    }

    #[tokio::test]
    async fn test_malformed_range_skips_remote_call() {
        let (transport, client) = scripted_client(ScriptedTransport::default());

        assert!(matches!(client.read("A1:B2").await, Err(SheetsError::Validation(_))));
        assert!(matches!(
            client.update("Sheet1!B2:A1", vec![]).await,
            Err(SheetsError::Validation(_))
        ));
        assert!(matches!(
            client.append("Sheet1!", vec![vec!["x".into()]]).await,
            Err(SheetsError::Validation(_))
        ));
        assert!(matches!(client.clear("").await, Err(SheetsError::Validation(_))));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_rejects_matrix_larger_than_range() {
        let (transport, client) = scripted_client(ScriptedTransport::default());

        let too_tall = vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]];
        assert!(matches!(
            client.update("Sheet1!A1:B2", too_tall).await,
            Err(SheetsError::Validation(_))
        ));

        let too_wide = vec![vec!["a".into(), "b".into(), "c".into()]];
        assert!(matches!(
            client.update("Sheet1!A:B", too_wide).await,
            Err(SheetsError::Validation(_))
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

        let fits = vec![vec!["a".into()], vec!["b".into(), "c".into()]];
        assert_eq!(client.update("Sheet1!A1:B2", fits).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_single_cell_update_anchors_larger_matrix() {
        let (transport, client) = scripted_client(ScriptedTransport::default());

        let block = vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]];
        assert_eq!(client.update("Sheet1!A1", block).await.unwrap(), 4);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.last_range.lock().unwrap().as_deref(), Some("Sheet1!A1"));
    }

    #[tokio::test]
    async fn test_non_finite_numbers_are_rejected() {
        let (transport, client) = scripted_client(ScriptedTransport::default());

        let nan = vec![vec!["a".into(), CellValue::Number(f64::NAN)]];
        assert!(matches!(
            client.update("Sheet1!A1:B1", nan).await,
            Err(SheetsError::Validation(_))
        ));
        let infinite = vec![vec![CellValue::Number(1.0)], vec![CellValue::Number(f64::INFINITY)]];
        assert!(matches!(
            client.append("Sheet1!A:B", infinite).await,
            Err(SheetsError::Validation(_))
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_append_empty_matrix_is_invalid() {
        let (transport, client) = scripted_client(ScriptedTransport::default());
        assert!(matches!(
            client.append("Sheet1!A:B", vec![]).await,
            Err(SheetsError::Validation(_))
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_range_is_sent_in_canonical_form() {
        let (transport, client) = scripted_client(ScriptedTransport::default());

        let landed = client.append("Q1 Sales!a:b", vec![vec!["x".into()]]).await.unwrap();
        assert_eq!(
            transport.last_range.lock().unwrap().as_deref(),
            Some("'Q1 Sales'!A:B")
        );
        assert_eq!(landed.sheet_title(), "Q1 Sales");
        assert_eq!(landed.first_row(), Some(2));
    }

    #[tokio::test]
    async fn test_unparsable_returned_range_is_transport_error() {
        let (_transport, client) = scripted_client(ScriptedTransport::default());
        match client.clear("Sheet1!A1:B2").await {
            Err(SheetsError::Transport(failure)) => assert_eq!(failure.kind, FailureKind::Decode),
            other => panic!("expected decode failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failures_propagate_by_kind() {
        let (_t, client) = scripted_client(ScriptedTransport {
            fail_with: Some(FailureKind::NotFound),
            ..Default::default()
        });
        assert!(matches!(client.read("Missing!A1").await, Err(SheetsError::NotFound(_))));

        let (transport, client) = scripted_client(ScriptedTransport {
            fail_with: Some(FailureKind::Network),
            ..Default::default()
        });
        match client.read("Sheet1!A1").await {
            Err(SheetsError::Transport(failure)) => assert_eq!(failure.kind, FailureKind::Network),
            other => panic!("expected transport error, got {:?}", other),
        }
        // No retry
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_list_sheets_skips_invalid_entries() {
        let (_t, client) = scripted_client(ScriptedTransport {
            sheets: vec![
                sheet(Some("Sheet1"), Some(0)),
                sheet(Some(""), Some(3)),
                sheet(Some("NoId"), None),
                sheet(None, Some(9)),
                sheet(Some("Negative"), Some(-1)),
                SheetMetadata { properties: None },
                sheet(Some("Archive"), Some(1_234_567)),
            ],
            ..Default::default()
        });

        let sheets = client.list_sheets().await.unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets.get("Sheet1"), Some(&0));
        assert_eq!(sheets.get("Archive"), Some(&1_234_567));
        assert!(!sheets.contains_key(""));
        assert!(sheets.values().all(|id| *id >= 0));
    }

    #[tokio::test]
    async fn test_sheet_tabs_follow_tab_order() {
        let (_t, client) = scripted_client(ScriptedTransport {
            sheets: vec![
                tab(Some("Zeta"), Some(5), Some(2)),
                tab(Some("Broken"), None, Some(0)),
                tab(Some("Alpha"), Some(7), Some(1)),
                tab(Some("Main"), Some(0), Some(0)),
            ],
            ..Default::default()
        });

        let tabs = client.sheet_tabs().await.unwrap();
        let titles: Vec<&str> = tabs.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Main", "Alpha", "Zeta"]);
        assert_eq!(tabs[0].sheet_id, 0);
    }
}
