//! Serialization of result records: xlsx workbook and CSV.
//!
//! Columns are URL, Keyword, Blended Rank, Search Volume, CPC followed by
//! L0..Ln, where n+1 is the deepest hierarchy in the result set. Rows with
//! shallower hierarchies leave the trailing level cells empty.

use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::pipeline::RunSummary;
use crate::record::{Cpc, ResultRecord};
use crate::sanitize::CANONICAL_FIELDS;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use std::io::Write;
use std::path::Path;

pub const RESULTS_SHEET: &str = "Keywords";
pub const SUMMARY_SHEET: &str = "Summary";

/// Deepest hierarchy across the rows.
pub fn max_depth(rows: &[ResultRecord]) -> usize {
    rows.iter().map(|r| r.hierarchy.depth()).max().unwrap_or(0)
}

/// Header row for a result set.
pub fn column_headers(rows: &[ResultRecord]) -> Vec<String> {
    CANONICAL_FIELDS
        .iter()
        .map(|f| f.name().to_string())
        .chain((0..max_depth(rows)).map(Hierarchy::column_name))
        .collect()
}

/// Cell text for a row, in column order, padded to `depth` levels.
fn row_cells(row: &ResultRecord, depth: usize) -> Vec<String> {
    let mut cells = vec![
        row.record.url.clone(),
        row.record.keyword.clone(),
        row.record.blended_rank.to_string(),
        row.record.search_volume.to_string(),
        row.record.cpc.to_string(),
    ];
    cells.extend((0..depth).map(|level| row.hierarchy.level(level).unwrap_or("").to_string()));
    cells
}

/// Write the result table as CSV.
pub fn write_csv<W: Write>(writer: W, rows: &[ResultRecord]) -> Result<()> {
    let depth = max_depth(rows);
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(column_headers(rows))?;
    for row in rows {
        writer.write_record(row_cells(row, depth))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_results_sheet(sheet: &mut Worksheet, rows: &[ResultRecord]) -> Result<()> {
    let header_fmt = Format::new().set_bold();
    let depth = max_depth(rows);
    let headers = column_headers(rows);

    sheet.set_name(RESULTS_SHEET)?;
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &header_fmt)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let record = &row.record;
        sheet.write_string(r, 0, &record.url)?;
        sheet.write_string(r, 1, &record.keyword)?;
        sheet.write_number(r, 2, record.blended_rank)?;
        sheet.write_number(r, 3, record.search_volume)?;
        match &record.cpc {
            Cpc::Amount(value) => sheet.write_number(r, 4, *value)?,
            other => sheet.write_string(r, 4, other.to_string())?,
        };
        for level in 0..depth {
            if let Some(label) = row.hierarchy.level(level).filter(|l| !l.is_empty()) {
                sheet.write_string(r, (CANONICAL_FIELDS.len() + level) as u16, label)?;
            }
        }
    }

    let last_col = (headers.len() - 1) as u16;
    sheet.set_column_width(0, 60)?;
    sheet.set_column_width(1, 36)?;
    for col in 2..=last_col {
        sheet.set_column_width(col, 16)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    sheet.autofilter(0, 0, rows.len() as u32, last_col)?;
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, summary: &RunSummary) -> Result<()> {
    let bold = Format::new().set_bold();
    let title_fmt = Format::new().set_bold().set_font_size(16);
    let left_fmt = Format::new().set_align(FormatAlign::Left);

    sheet.set_name(SUMMARY_SHEET)?;
    sheet.write_string_with_format(0, 0, "Keyword Landscape", &title_fmt)?;

    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let entries: [(&str, String); 10] = [
        ("Generated", generated),
        ("Keyword Limit", summary.keyword_limit.to_string()),
        (
            "Include Top Search Volume",
            if summary.include_top_search_volume { "Yes" } else { "No" }.to_string(),
        ),
        ("Input Rows", summary.rows_read.to_string()),
        ("Kept Rows", summary.rows_kept.to_string()),
        ("Dropped Rows", summary.rows_dropped.to_string()),
        ("URLs", summary.urls.to_string()),
        ("Per-URL Rows", summary.per_url_rows.to_string()),
        ("Top Volume Rows", summary.top_volume_rows.to_string()),
        ("Empty Hierarchies", summary.empty_hierarchies.to_string()),
    ];

    let mut row: u32 = 2;
    for (label, value) in &entries {
        sheet.write_string_with_format(row, 0, *label, &bold)?;
        sheet.write_string_with_format(row, 1, value, &left_fmt)?;
        row += 1;
    }
    sheet.set_column_width(0, 28)?;
    sheet.set_column_width(1, 24)?;
    Ok(())
}

/// Build the workbook: the results sheet, then an optional summary sheet.
pub fn build_workbook(rows: &[ResultRecord], summary: Option<&RunSummary>) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    write_results_sheet(workbook.add_worksheet(), rows)?;
    if let Some(summary) = summary {
        write_summary_sheet(workbook.add_worksheet(), summary)?;
    }
    Ok(workbook)
}

/// Spreadsheet byte stream for the result set.
pub fn workbook_bytes(rows: &[ResultRecord], summary: Option<&RunSummary>) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(rows, summary)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write the workbook to `path`, creating parent directories as needed.
pub fn save_workbook(path: &Path, rows: &[ResultRecord], summary: Option<&RunSummary>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = workbook_bytes(rows, summary)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CleanRecord, Origin};

    fn row(url: &str, keyword: &str, levels: &[&str], cpc: Cpc) -> ResultRecord {
        ResultRecord {
            record: CleanRecord {
                url: url.to_string(),
                keyword: keyword.to_string(),
                blended_rank: 1.0,
                search_volume: 100.0,
                cpc,
            },
            hierarchy: Hierarchy::new(levels.iter().map(|s| s.to_string()).collect()),
            origin: Origin::PerUrl,
        }
    }

    fn sample() -> Vec<ResultRecord> {
        vec![
            row(
                "https://example.com/blog/seo-tips/",
                "seo tips",
                &["Example", "Blog", "Seo tips"],
                Cpc::Amount(0.5),
            ),
            row("https://example.com/", "example", &["Example"], Cpc::NotAvailable),
            row("/broken", "broken", &[], Cpc::Text("free".to_string())),
        ]
    }

    #[test]
    fn test_column_headers() {
        assert_eq!(
            column_headers(&sample()),
            vec![
                "URL",
                "Keyword",
                "Blended Rank",
                "Search Volume",
                "CPC",
                "L0",
                "L1",
                "L2"
            ]
        );
        assert_eq!(column_headers(&[]).len(), 5);
    }

    #[test]
    fn test_write_csv_pads_levels() {
        let mut out = Vec::new();
        write_csv(&mut out, &sample()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "URL,Keyword,Blended Rank,Search Volume,CPC,L0,L1,L2");
        assert_eq!(
            lines[1],
            "https://example.com/blog/seo-tips/,seo tips,1,100,0.5,Example,Blog,Seo tips"
        );
        assert_eq!(lines[2], "https://example.com/,example,1,100,N/A,Example,,");
        assert_eq!(lines[3], "/broken,broken,1,100,free,,,");
    }

    /// Read one part of an xlsx container as text.
    fn read_part(bytes: &[u8], name: &str) -> String {
        use std::io::Read;
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut text = String::new();
        part.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_workbook_contents() {
        let mut rows = sample();
        rows.push(row("/path-only", "relative", &["", "Path only"], Cpc::NotAvailable));
        let bytes = workbook_bytes(&rows, None).unwrap();

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Keywords""#));
        assert!(!workbook.contains(r#"name="Summary""#));

        let strings = read_part(&bytes, "xl/sharedStrings.xml");
        for header in ["URL", "Keyword", "Blended Rank", "Search Volume", "CPC", "L0", "L1", "L2"] {
            assert!(strings.contains(&format!("<t>{}</t>", header)), "missing {}", header);
        }
        assert!(strings.contains("<t>N/A</t>"));
        assert!(strings.contains("<t>free</t>"));

        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        // Numeric CPC stays a number, the sentinel and free text are strings
        assert!(sheet.contains(r#"r="E2"><v>0.5</v>"#), "{}", sheet);
        assert!(sheet.contains(r#"r="E3" t="s""#));
        assert!(sheet.contains(r#"r="E4" t="s""#));
        // Empty hierarchies and empty domain labels leave blank cells
        assert!(!sheet.contains(r#"r="F4""#));
        assert!(!sheet.contains(r#"r="F5""#));
        assert!(sheet.contains(r#"r="G5" t="s""#));
    }

    #[test]
    fn test_workbook_bytes_is_xlsx() {
        let bytes = workbook_bytes(&sample(), None).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");

        let empty = workbook_bytes(&[], None).unwrap();
        assert_eq!(&empty[..2], b"PK");
    }

    #[test]
    fn test_save_workbook_with_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("keyword_landscape.xlsx");
        let summary = RunSummary {
            keyword_limit: 5,
            include_top_search_volume: true,
            rows_read: 4,
            rows_kept: 3,
            rows_dropped: 1,
            urls: 3,
            per_url_rows: 3,
            top_volume_rows: 0,
            empty_hierarchies: 1,
        };
        save_workbook(&path, &sample(), Some(&summary)).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Keywords""#));
        assert!(workbook.contains(r#"name="Summary""#));
        let strings = read_part(&bytes, "xl/sharedStrings.xml");
        assert!(strings.contains("<t>Dropped Rows</t>"));
    }
}
