//! CSV parsing for retailer exports
//!
//! Exports differ per retailer in column names, delimiter, date layout and
//! decimal separator. Headers are matched against known aliases and every
//! data row is parsed independently, so one bad row never stops the run.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};

use crate::error::{ImportError, RowError};
use crate::fact::{ImportKind, Measure, ParsedRow};

const STORE_ALIASES: &[&str] = &["store", "store_code", "store_id"];
const PRODUCT_ALIASES: &[&str] = &["product", "ean", "product_code"];
const DATE_ALIASES: &[&str] = &["date", "day"];
const UNITS_ALIASES: &[&str] = &["units", "qty", "quantity"];
const REVENUE_ALIASES: &[&str] = &["revenue", "sales", "amount"];
const STOCK_ALIASES: &[&str] = &["stock", "stock_units", "on_hand"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y%m%d"];

/// Result of parsing one input file
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub rows: Vec<ParsedRow>,
    /// Non-blank data rows seen, parsed or not
    pub rows_read: usize,
    pub errors: Vec<RowError>,
}

/// Column positions resolved from the header row
#[derive(Debug)]
struct Columns {
    store: usize,
    product: usize,
    date: usize,
    /// units for sales, stock for inventory
    quantity: usize,
    revenue: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, kind: ImportKind) -> Result<Self, ImportError> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        let require = |column: &'static str, aliases: &[&str]| {
            find(aliases).ok_or(ImportError::MissingColumn { column, kind })
        };

        let store = require("store", STORE_ALIASES)?;
        let product = require("product", PRODUCT_ALIASES)?;
        let date = require("date", DATE_ALIASES)?;

        let (quantity, revenue) = match kind {
            ImportKind::Sales => (require("units", UNITS_ALIASES)?, find(REVENUE_ALIASES)),
            ImportKind::Inventory => (require("stock", STOCK_ALIASES)?, None),
        };

        Ok(Self {
            store,
            product,
            date,
            quantity,
            revenue,
        })
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Pick `;` when the header line uses it more than `,`
fn detect_delimiter(input: &[u8]) -> u8 {
    let header = input.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = header.iter().filter(|b| **b == b';').count();
    let commas = header.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Parse a whole export into rows for `kind`.
///
/// The input is raw bytes. A data row that is not valid UTF-8 becomes a
/// row error like any other unparseable row.
pub fn parse_csv(input: &[u8], kind: ImportKind) -> Result<ParseOutcome, ImportError> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Err(ImportError::EmptyInput);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(detect_delimiter(input))
        .from_reader(input);

    let columns = Columns::resolve(reader.headers()?, kind)?;
    tracing::debug!(?columns, %kind, "Resolved CSV columns");

    let mut outcome = ParseOutcome::default();

    for (index, result) in reader.byte_records().enumerate() {
        // header is line 1
        let fallback_line = index as u64 + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                outcome.rows_read += 1;
                outcome.errors.push(RowError {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if record
            .iter()
            .all(|field| field.iter().all(u8::is_ascii_whitespace))
        {
            continue;
        }
        outcome.rows_read += 1;

        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);

        let parsed = StringRecord::from_byte_record(record)
            .map_err(|e| format!("invalid UTF-8 in field {}", e.utf8_error().field() + 1))
            .and_then(|record| parse_row(&record, &columns, kind));

        match parsed {
            Ok(mut row) => {
                row.line = line;
                outcome.rows.push(row);
            }
            Err(reason) => {
                tracing::warn!(line, %reason, "Skipping unparseable row");
                outcome.errors.push(RowError { line, reason });
            }
        }
    }

    Ok(outcome)
}

fn parse_row(record: &StringRecord, columns: &Columns, kind: ImportKind) -> Result<ParsedRow, String> {
    let store_code = field(record, columns.store, "store")?.to_string();
    let product_code = field(record, columns.product, "product")?.to_string();

    let raw_date = field(record, columns.date, "date")?;
    let date = parse_date(raw_date).ok_or_else(|| format!("invalid date '{}'", raw_date))?;

    let measure = match kind {
        ImportKind::Sales => {
            let units = parse_whole(field(record, columns.quantity, "units")?, "units")?;
            let revenue = match columns.revenue.and_then(|i| record.get(i)).map(str::trim) {
                Some(raw) if !raw.is_empty() => parse_number(raw)
                    .ok_or_else(|| format!("invalid revenue '{}'", raw))?,
                _ => 0.0,
            };
            Measure::Sales { units, revenue }
        }
        ImportKind::Inventory => Measure::Stock {
            units: parse_whole(field(record, columns.quantity, "stock")?, "stock")?,
        },
    };

    Ok(ParsedRow {
        line: 0,
        store_code,
        product_code,
        date,
        measure,
    })
}

fn field<'a>(record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str, String> {
    match record.get(index).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("missing {}", name)),
    }
}

/// Accepts `YYYY-MM-DD`, `DD.MM.YYYY` and `YYYYMMDD`
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Parse a number written with either decimal separator.
///
/// When both `.` and `,` appear, the later one is the decimal separator and
/// the other groups thousands.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Largest magnitude an `f64` still holds exactly
const MAX_EXACT_WHOLE: f64 = 9_007_199_254_740_992.0;

fn parse_whole(raw: &str, name: &str) -> Result<i64, String> {
    if let Ok(value) = raw.trim().parse::<i64>() {
        return Ok(value);
    }

    let value = parse_number(raw).ok_or_else(|| format!("invalid {} '{}'", name, raw))?;
    if value.fract() != 0.0 {
        return Err(format!("{} must be a whole number, got '{}'", name, raw));
    }
    if value.abs() > MAX_EXACT_WHOLE {
        return Err(format!("{} '{}' is out of range", name, raw));
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_sales_with_aliases() {
        let input = "Store_Code,EAN,Day,Qty,Amount\n\
                     0042,4006381333931,2024-03-01,12,35.88\n\
                     0043,4006381333931,2024-03-01,3,8.97\n";

        let outcome = parse_csv(input.as_bytes(), ImportKind::Sales).unwrap();

        assert_eq!(outcome.rows_read, 2);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.rows[0].store_code, "0042");
        assert_eq!(outcome.rows[0].date, date(2024, 3, 1));
        assert_eq!(
            outcome.rows[0].measure,
            Measure::Sales {
                units: 12,
                revenue: 35.88
            }
        );
        assert_eq!(outcome.rows[1].line, 3);
    }

    #[test]
    fn parses_semicolon_export_with_decimal_comma() {
        let input = "store;product;date;units;revenue\n\
                     S1;P1;01.03.2024;12;2.450,50\n";

        let outcome = parse_csv(input.as_bytes(), ImportKind::Sales).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(
            outcome.rows[0].measure,
            Measure::Sales {
                units: 12,
                revenue: 2450.5
            }
        );
    }

    #[test]
    fn revenue_column_is_optional() {
        let input = "store,product,date,units\nS1,P1,20240301,4\n";

        let outcome = parse_csv(input.as_bytes(), ImportKind::Sales).unwrap();

        assert_eq!(
            outcome.rows[0].measure,
            Measure::Sales {
                units: 4,
                revenue: 0.0
            }
        );
    }

    #[test]
    fn parses_inventory() {
        let input = "store,product,date,on_hand\nS1,P1,2024-03-01,-2\n";

        let outcome = parse_csv(input.as_bytes(), ImportKind::Inventory).unwrap();

        assert_eq!(outcome.rows[0].measure, Measure::Stock { units: -2 });
    }

    #[test]
    fn bad_rows_are_counted_with_line_numbers() {
        let input = "store,product,date,units\n\
                     S1,P1,2024-03-01,5\n\
                     S1,P1,yesterday,5\n\
                     ,P1,2024-03-01,5\n\
                     S1,P1,2024-03-01,2.5\n\
                     \n\
                     S2,P1,2024-03-01,1\n";

        let outcome = parse_csv(input.as_bytes(), ImportKind::Sales).unwrap();

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows_read, 5);
        let lines: Vec<u64> = outcome.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(outcome.errors[0].reason.contains("invalid date"));
        assert!(outcome.errors[1].reason.contains("missing store"));
    }

    #[test]
    fn invalid_utf8_row_is_a_row_error() {
        let mut input = b"store,product,date,units\nS1,P1,2024-03-01,5\nS".to_vec();
        input.push(0xE9);
        input.extend_from_slice(b",P1,2024-03-01,5\nS2,P1,2024-03-01,1\n");

        let outcome = parse_csv(&input, ImportKind::Sales).unwrap();

        assert_eq!(outcome.rows_read, 3);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line, 3);
        assert!(outcome.errors[0].reason.contains("invalid UTF-8 in field 1"));
        assert_eq!(outcome.rows[1].store_code, "S2");
    }

    #[test]
    fn whole_numbers_beyond_exact_range_are_rejected() {
        assert_eq!(parse_whole("9223372036854775807", "units"), Ok(i64::MAX));
        assert_eq!(parse_whole("1,234,567", "units"), Ok(1_234_567));
        assert_eq!(parse_whole("-12", "stock"), Ok(-12));

        for raw in ["1e30", "99999999999999999999", "-1e19"] {
            let err = parse_whole(raw, "units").unwrap_err();
            assert!(err.contains("out of range"), "{}: {}", raw, err);
        }
    }

    #[test]
    fn missing_required_column_fails() {
        let input = "store,product,date\nS1,P1,2024-03-01\n";

        let err = parse_csv(input.as_bytes(), ImportKind::Sales).unwrap_err();

        assert!(matches!(
            err,
            ImportError::MissingColumn {
                column: "units",
                ..
            }
        ));
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(
            parse_csv(b"  \n", ImportKind::Sales),
            Err(ImportError::EmptyInput)
        ));
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("2024-03-11"), Some(date(2024, 3, 11)));
        assert_eq!(parse_date("11.03.2024"), Some(date(2024, 3, 11)));
        assert_eq!(parse_date("20240311"), Some(date(2024, 3, 11)));
        assert_eq!(parse_date("03/11/2024"), None);
    }

    #[test]
    fn number_separators() {
        assert_eq!(parse_number("12,5"), Some(12.5));
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("1.234,5"), Some(1234.5));
        assert_eq!(parse_number("1,234,567"), Some(1234567.0));
        assert_eq!(parse_number(" 7 "), Some(7.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }
}
