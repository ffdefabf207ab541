//! Interactive console over a workbook
//!
//! Lists the sheets, lets the user pick one, then loops over a menu of
//! range operations on it. Input and output are generic so the loop can be
//! driven from tests.

use crate::sheets::{CellValue, Row, SheetTab, SheetsError, TabularStoreClient, Transport};
use std::io::{BufRead, Write};

/// Span read when the user just presses enter
pub const DEFAULT_READ_SPAN: &str = "A1:D5";

/// Columns searched for the end of the table when appending
pub const APPEND_SPAN: &str = "A:Z";

const MENU: &str = "\nChoose an operation:\n\
[1] Read data\n\
[2] Append data\n\
[3] Update data\n\
[4] Clear data\n\
[5] Delete rows\n\
[6] Select a different sheet\n\
[7] Exit";

/// Split a comma-separated line into trimmed text cells
pub fn parse_row(line: &str) -> Row {
    line.split(',')
        .map(|cell| CellValue::Text(cell.trim().to_string()))
        .collect()
}

/// Render a row as `a, b, c`
pub fn format_row(row: &[CellValue]) -> String {
    row.iter()
        .map(CellValue::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convert 1-based inclusive row numbers into the zero-based half-open
/// interval expected by `delete_rows`
pub fn row_numbers_to_interval(first: &str, last: &str) -> Option<(i32, i32)> {
    let first: i32 = first.trim().parse().ok()?;
    let last: i32 = last.trim().parse().ok()?;
    if first < 1 || last < first {
        return None;
    }
    Some((first - 1, last))
}

/// Qualify a span typed by the user with the selected sheet
fn qualified(sheet: &str, span: &str) -> String {
    let sheet = crate::sheets::RangeAddress::sheet(sheet)
        .map(|r| r.to_string())
        .unwrap_or_else(|_| sheet.to_string());
    format!("{}!{}", sheet, span)
}

pub struct Console<'c, T: Transport + ?Sized, R: BufRead, W: Write> {
    client: &'c TabularStoreClient<T>,
    input: R,
    output: W,
}

impl<'c, T: Transport + ?Sized, R: BufRead, W: Write> Console<'c, T, R, W> {
    pub fn new(client: &'c TabularStoreClient<T>, input: R, output: W) -> Self {
        Console {
            client,
            input,
            output,
        }
    }

    /// Run until the user exits or input ends
    pub async fn run(&mut self) -> anyhow::Result<()> {
        writeln!(self.output, "\nGetting all sheets in the spreadsheet...")?;
        let sheets = self.client.sheet_tabs().await?;
        if sheets.is_empty() {
            writeln!(self.output, "No sheets found in the spreadsheet.")?;
            return Ok(());
        }

        let titles: Vec<String> = sheets.iter().map(|tab| tab.title.clone()).collect();
        writeln!(self.output, "\nAvailable sheets:")?;
        for (i, title) in titles.iter().enumerate() {
            writeln!(self.output, "[{}] {}", i + 1, title)?;
        }

        let Some(mut selected) = self.select_sheet(&titles)? else {
            return Ok(());
        };

        loop {
            writeln!(self.output, "{}", MENU)?;
            let Some(choice) = self.prompt("\nEnter your choice (1-7): ")? else {
                break;
            };
            match choice.trim() {
                "1" => self.read(&selected).await?,
                "2" => self.append(&selected).await?,
                "3" => self.update(&selected).await?,
                "4" => self.clear(&selected).await?,
                "5" => self.delete_rows(&selected, &sheets).await?,
                "6" => match self.select_sheet(&titles)? {
                    Some(title) => selected = title,
                    None => break,
                },
                "7" => break,
                _ => writeln!(self.output, "Invalid choice. Please try again.")?,
            }
        }

        writeln!(self.output, "\nProgram completed successfully!")?;
        Ok(())
    }

    /// Print `text` and read one line; None at end of input
    fn prompt(&mut self, text: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Read comma-separated rows until a blank line
    fn read_rows(&mut self) -> std::io::Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                break;
            }
            rows.push(parse_row(&line));
        }
        Ok(rows)
    }

    fn select_sheet(&mut self, titles: &[String]) -> std::io::Result<Option<String>> {
        loop {
            let text = format!("\nEnter sheet number (1-{}): ", titles.len());
            let Some(input) = self.prompt(&text)? else {
                return Ok(None);
            };
            match input.trim().parse::<usize>() {
                Ok(n) if (1..=titles.len()).contains(&n) => {
                    let title = titles[n - 1].clone();
                    writeln!(self.output, "\nYou selected: {}", title)?;
                    return Ok(Some(title));
                }
                _ => writeln!(self.output, "Invalid selection. Please try again.")?,
            }
        }
    }

    fn report(&mut self, action: &str, err: SheetsError) -> std::io::Result<()> {
        writeln!(self.output, "Error {}: {}", action, err)
    }

    async fn read(&mut self, sheet: &str) -> anyhow::Result<()> {
        let span = self
            .prompt(&format!("Enter range to read (e.g., {}): ", DEFAULT_READ_SPAN))?
            .unwrap_or_default();
        let span = if span.trim().is_empty() {
            DEFAULT_READ_SPAN
        } else {
            span.trim()
        };
        let range = qualified(sheet, span);

        writeln!(self.output, "\nReading data from '{}'...", range)?;
        match self.client.read(&range).await {
            Ok(rows) if rows.is_empty() => writeln!(self.output, "No data found.")?,
            Ok(rows) => {
                writeln!(self.output, "\nData:")?;
                for (i, row) in rows.iter().enumerate() {
                    writeln!(self.output, "Row {}: {}", i + 1, format_row(row))?;
                }
            }
            Err(e) => self.report("reading data", e)?,
        }
        Ok(())
    }

    async fn append(&mut self, sheet: &str) -> anyhow::Result<()> {
        writeln!(
            self.output,
            "Enter data to append (comma-separated values, empty line to finish):"
        )?;
        let rows = self.read_rows()?;
        if rows.is_empty() {
            writeln!(self.output, "No data entered.")?;
            return Ok(());
        }

        match self.client.append(&qualified(sheet, APPEND_SPAN), rows).await {
            Ok(landed) => writeln!(self.output, "Data appended to range: {}", landed)?,
            Err(e) => self.report("appending data", e)?,
        }
        Ok(())
    }

    async fn update(&mut self, sheet: &str) -> anyhow::Result<()> {
        let span = self
            .prompt("Enter range to update (e.g., A1:B2): ")?
            .unwrap_or_default();
        if span.trim().is_empty() {
            writeln!(self.output, "Invalid range.")?;
            return Ok(());
        }
        let range = qualified(sheet, span.trim());

        writeln!(
            self.output,
            "Enter data to update (comma-separated values, empty line to finish):"
        )?;
        let rows = self.read_rows()?;
        if rows.is_empty() {
            writeln!(self.output, "No data entered.")?;
            return Ok(());
        }

        match self.client.update(&range, rows).await {
            Ok(cells) => writeln!(self.output, "Updated {} cells", cells)?,
            Err(e) => self.report("updating data", e)?,
        }
        Ok(())
    }

    async fn clear(&mut self, sheet: &str) -> anyhow::Result<()> {
        let span = self
            .prompt("Enter range to clear (e.g., A1:D10): ")?
            .unwrap_or_default();
        if span.trim().is_empty() {
            writeln!(self.output, "Invalid range.")?;
            return Ok(());
        }
        let range = qualified(sheet, span.trim());

        writeln!(self.output, "\nClearing data from '{}'...", range)?;
        match self.client.clear(&range).await {
            Ok(cleared) => writeln!(self.output, "Cleared range: {}", cleared)?,
            Err(e) => self.report("clearing data", e)?,
        }
        Ok(())
    }

    async fn delete_rows(&mut self, sheet: &str, sheets: &[SheetTab]) -> anyhow::Result<()> {
        let Some(sheet_id) = sheets.iter().find(|tab| tab.title == sheet).map(|tab| tab.sheet_id) else {
            writeln!(self.output, "Sheet '{}' has no known ID.", sheet)?;
            return Ok(());
        };
        let first = self.prompt("Enter first row to delete: ")?.unwrap_or_default();
        let last = self.prompt("Enter last row to delete: ")?.unwrap_or_default();
        let Some((start, end)) = row_numbers_to_interval(&first, &last) else {
            writeln!(self.output, "Invalid row numbers.")?;
            return Ok(());
        };

        match self.client.delete_rows(sheet_id, start, end).await {
            Ok(true) => writeln!(self.output, "Deleted {} row(s)", end - start)?,
            Ok(false) => writeln!(self.output, "The store did not confirm the deletion.")?,
            Err(e) => self.report("deleting rows", e)?,
        }
        Ok(())
    }
}
