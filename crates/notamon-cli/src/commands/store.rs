//! Operation history, merged across runs by operation id.
//!
//! An `.xlsx` history is a spreadsheet with alert rows highlighted; any other
//! extension is plain CSV. Both are re-projected onto [`COLUMNS`] on load.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use calamine::{open_workbook, Reader, Xlsx};
use rust_xlsxwriter::{Color, ConditionalFormatFormula, Format, Workbook};
use tracing::{debug, info, warn};

use notamon_core::models::config::ExcelConfig;
use notamon_core::models::dataset::{COLUMNS, OPERATION_ID_COLUMN};

pub type Row = Vec<String>;

/// Fill of highlighted alert rows.
const ALERT_FILL: u32 = 0xFFF59D;

/// Columns written as numbers in the spreadsheet.
const NUMERIC_COLUMNS: [&str; 3] = ["page", "quantity", "alert_int"];

/// Timestamp suffix used in backup file names.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `<stem>_<tag>_<timestamp><ext>` next to `path`.
pub fn backup_path(path: &Path, tag: &str, timestamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    path.with_file_name(format!("{}_{}_{}{}", stem, tag, timestamp, ext))
}

/// History file at a fixed path.
pub struct HistoryStore {
    path: PathBuf,
    backup_before_save: bool,
    excel: ExcelConfig,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, backup_before_save: bool) -> Self {
        Self {
            path: path.into(),
            backup_before_save,
            excel: ExcelConfig::default(),
        }
    }

    /// Sheet name and highlighting used for `.xlsx` histories.
    pub fn with_excel(mut self, excel: ExcelConfig) -> Self {
        self.excel = excel;
        self
    }

    fn is_spreadsheet(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false)
    }

    /// Rows of the existing history, projected onto [`COLUMNS`].
    ///
    /// A history that cannot be read is moved aside and treated as empty.
    pub fn load(&self) -> anyhow::Result<Vec<Row>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let rows = if self.is_spreadsheet() {
            read_xlsx_rows(&self.path, &self.excel.sheet_name)
        } else {
            read_csv_rows(&self.path)
        };

        match rows {
            Ok(rows) => {
                debug!("loaded {} history rows from {}", rows.len(), self.path.display());
                Ok(rows)
            }
            Err(e) => {
                let aside = backup_path(&self.path, "backup_read_failed", &timestamp());
                warn!(
                    "cannot read history {}: {}; moving it to {}",
                    self.path.display(),
                    e,
                    aside.display()
                );
                fs::rename(&self.path, &aside)
                    .with_context(|| format!("failed to move {} aside", self.path.display()))?;
                Ok(Vec::new())
            }
        }
    }

    /// Write the rows, backing up the previous file first when enabled.
    pub fn save(&self, rows: &[Row]) -> anyhow::Result<()> {
        if self.backup_before_save && self.path.exists() {
            let backup = backup_path(&self.path, "backup", &timestamp());
            fs::rename(&self.path, &backup)
                .with_context(|| format!("failed to back up {}", self.path.display()))?;
            info!("previous history saved as {}", backup.display());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let written = if self.is_spreadsheet() {
            write_xlsx(&self.path, rows, &self.excel)
        } else {
            write_csv(&self.path, rows)
        };
        written.with_context(|| format!("cannot write {}", self.path.display()))?;

        info!("wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

fn read_csv_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let header: Row = rdr.headers()?.iter().map(String::from).collect();
    let records = rdr
        .records()
        .map(|r| r.map(|record| record.iter().map(String::from).collect()))
        .collect::<Result<Vec<Row>, _>>()?;

    reproject(&header, records)
}

fn read_xlsx_rows(path: &Path, sheet_name: &str) -> anyhow::Result<Vec<Row>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(sheet_name)?;

    let mut cells = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Row>());
    let header = cells.next().unwrap_or_default();

    reproject(&header, cells.collect())
}

/// Map stored rows onto [`COLUMNS`] by header name. Unknown columns are
/// dropped and missing ones left empty.
fn reproject(header: &[String], records: Vec<Row>) -> anyhow::Result<Vec<Row>> {
    let mapping: Vec<Option<usize>> = COLUMNS
        .iter()
        .map(|col| header.iter().position(|h| h == col))
        .collect();

    if mapping[OPERATION_ID_COLUMN].is_none() {
        anyhow::bail!("missing operation_id column");
    }

    Ok(records
        .into_iter()
        .map(|record| {
            mapping
                .iter()
                .map(|idx| idx.and_then(|i| record.get(i)).cloned().unwrap_or_default())
                .collect()
        })
        .collect())
}

fn write_csv(path: &Path, rows: &[Row]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_xlsx(path: &Path, rows: &[Row], excel: &ExcelConfig) -> anyhow::Result<()> {
    let numeric: Vec<bool> = COLUMNS.iter().map(|c| NUMERIC_COLUMNS.contains(c)).collect();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(excel.sheet_name.as_str())?;

    let bold = Format::new().set_bold();
    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let number = numeric
                .get(c)
                .copied()
                .unwrap_or(false)
                .then(|| value.parse::<u64>().ok())
                .flatten();
            match number {
                Some(n) => worksheet.write_number(r, c as u16, n as f64)?,
                None => worksheet.write_string(r, c as u16, value.as_str())?,
            };
        }
    }

    if excel.highlight_alerts && !rows.is_empty() {
        let fill = Format::new().set_background_color(Color::RGB(ALERT_FILL));
        let rule = ConditionalFormatFormula::new()
            .set_rule(alert_rule().as_str())
            .set_format(&fill);
        worksheet.add_conditional_format(
            1,
            0,
            rows.len() as u32,
            (COLUMNS.len() - 1) as u16,
            &rule,
        )?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    workbook.save(path)?;
    Ok(())
}

/// Conditional-format formula matching rows whose `alert_int` is 1,
/// relative to the first data row.
fn alert_rule() -> String {
    let col = COLUMNS
        .iter()
        .position(|c| *c == "alert_int")
        .unwrap_or(COLUMNS.len() - 1);
    format!("=${}2=1", column_letters(col))
}

/// Spreadsheet column name of a 0-based index (`0` is `A`, `26` is `AA`).
fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// History rows followed by new rows whose id is not already present.
/// Returns the merged table and how many new rows were added.
pub fn merge(history: Vec<Row>, new_rows: Vec<Row>) -> (Vec<Row>, usize) {
    let mut seen: HashSet<String> = history
        .iter()
        .filter_map(|row| row.get(OPERATION_ID_COLUMN).cloned())
        .collect();

    let mut merged = history;
    let mut added = 0;
    for row in new_rows {
        let id = row.get(OPERATION_ID_COLUMN).cloned().unwrap_or_default();
        if seen.insert(id) {
            merged.push(row);
            added += 1;
        }
    }

    (merged, added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, document: &str) -> Row {
        let mut row = vec![String::new(); COLUMNS.len()];
        row[0] = document.to_string();
        row[OPERATION_ID_COLUMN] = id.to_string();
        row
    }

    fn alert_row(id: &str, alert: bool) -> Row {
        let mut row = row(id, "nota.pdf");
        row[1] = "2".to_string();
        row[COLUMNS.len() - 1] = if alert { "1" } else { "0" }.to_string();
        row[COLUMNS.len() - 2] = alert.to_string();
        row
    }

    #[test]
    fn test_alert_rule_targets_alert_int_column() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(42), "AQ");
        assert_eq!(COLUMNS[42], "alert_int");
        assert_eq!(alert_rule(), "=$AQ2=1");
    }

    #[test]
    fn test_xlsx_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/ops.xlsx");
        let excel = ExcelConfig {
            sheet_name: "ops".to_string(),
            highlight_alerts: true,
        };
        let store = HistoryStore::new(&path, true).with_excel(excel.clone());

        store.save(&[alert_row("a", true)]).unwrap();
        store.save(&[alert_row("a", true), alert_row("b", false)]).unwrap();

        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], alert_row("a", true));
        assert_eq!(rows[1][OPERATION_ID_COLUMN], "b");
        assert_eq!(rows[1][COLUMNS.len() - 1], "0");

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["ops".to_string()]);

        let backups = fs::read_dir(dir.path().join("out"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("ops_backup_"))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_xlsx_empty_history_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.xlsx");
        let store = HistoryStore::new(&path, false);

        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("operacoes").unwrap();
        assert_eq!(range.height(), 1);
        assert_eq!(range.width(), COLUMNS.len());
    }

    #[test]
    fn test_xlsx_wrong_sheet_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.xlsx");
        HistoryStore::new(&path, false).save(&[alert_row("a", false)]).unwrap();

        let excel = ExcelConfig {
            sheet_name: "other".to_string(),
            highlight_alerts: true,
        };
        let rows = HistoryStore::new(&path, false).with_excel(excel).load().unwrap();
        assert!(rows.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_backup_path() {
        let path = Path::new("output/operations.csv");
        assert_eq!(
            backup_path(path, "backup", "20240315_101500"),
            PathBuf::from("output/operations_backup_20240315_101500.csv")
        );
    }

    #[test]
    fn test_merge_history_wins() {
        let history = vec![row("a", "old.pdf")];
        let new_rows = vec![row("a", "new.pdf"), row("b", "new.pdf")];

        let (merged, added) = merge(history, new_rows);
        assert_eq!(added, 1);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0][0], "old.pdf");
        assert_eq!(merged[1][OPERATION_ID_COLUMN], "b");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("out/ops.csv"), true);

        store.save(&[row("a", "x.pdf")]).unwrap();
        store.save(&[row("a", "x.pdf"), row("b", "y.pdf")]).unwrap();

        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][OPERATION_ID_COLUMN], "b");

        let backups = fs::read_dir(dir.path().join("out"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("ops_backup_"))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_load_reprojects_old_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.csv");
        fs::write(&path, "operation_id,legacy,document\nabc,zzz,a.pdf\n").unwrap();

        let rows = HistoryStore::new(&path, false).load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), COLUMNS.len());
        assert_eq!(rows[0][0], "a.pdf");
        assert_eq!(rows[0][OPERATION_ID_COLUMN], "abc");
        assert!(rows[0][1].is_empty());
    }

    #[test]
    fn test_unreadable_history_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.csv");
        fs::write(&path, "foo,bar\n1,2\n").unwrap();

        let rows = HistoryStore::new(&path, false).load().unwrap();
        assert!(rows.is_empty());
        assert!(!path.exists());

        let moved = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().starts_with("ops_backup_read_failed_"));
        assert!(moved);
    }
}
