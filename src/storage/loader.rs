//! Загрузка заявок из CSV-выгрузки
//!
//! Читает выгрузку ежемесячных продаж eBid: первая строка является
//! заголовком, поля разделены запятыми и могут быть заключены в кавычки.
//! Некорректные строки пропускаются и не попадают в индекс.

use crate::common::{Bid, Error, Result};
use crate::storage::index::Index;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Номера столбцов выгрузки, из которых собирается заявка
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvLayout {
    pub title: usize,
    pub bid_id: usize,
    pub amount: usize,
    pub fund: usize,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            title: 0,
            bid_id: 1,
            amount: 4,
            fund: 8,
        }
    }
}

impl CsvLayout {
    /// Минимальное количество столбцов в строке
    pub fn required_columns(&self) -> usize {
        [self.title, self.bid_id, self.amount, self.fund]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Проверяет, что столбцы не пересекаются
    pub fn validate(&self) -> Result<()> {
        let mut columns = [self.title, self.bid_id, self.amount, self.fund];
        columns.sort_unstable();
        if columns.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(Error::configuration(format!(
                "CSV columns must be distinct: {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// Итог загрузки
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Прочитано строк данных (без заголовка и пустых строк)
    pub rows_read: usize,
    /// Передано в индекс
    pub loaded: usize,
    /// Отброшено как некорректные
    pub skipped: usize,
}

/// Читатель CSV-выгрузки заявок
#[derive(Debug, Clone, Default)]
pub struct BidCsvReader {
    layout: CsvLayout,
}

impl BidCsvReader {
    pub fn new(layout: CsvLayout) -> Self {
        Self { layout }
    }

    /// Загружает файл в индекс
    pub fn load_file(&self, path: &Path, index: &mut dyn Index) -> Result<LoadReport> {
        log::info!("Загрузка CSV файла {}", path.display());
        let file = File::open(path)?;
        self.load_into(BufReader::new(file), index)
    }

    /// Читает файл в вектор заявок
    pub fn read_file(&self, path: &Path) -> Result<(Vec<Bid>, LoadReport)> {
        log::info!("Загрузка CSV файла {}", path.display());
        let file = File::open(path)?;
        self.read_all(BufReader::new(file))
    }

    /// Передает каждую корректную строку в `index.insert` в порядке источника
    pub fn load_into<R: BufRead>(&self, reader: R, index: &mut dyn Index) -> Result<LoadReport> {
        self.for_each_bid(reader, |bid| index.insert(bid))
    }

    /// Читает все корректные строки
    pub fn read_all<R: BufRead>(&self, reader: R) -> Result<(Vec<Bid>, LoadReport)> {
        let mut bids = Vec::new();
        let report = self.for_each_bid(reader, |bid| bids.push(bid))?;
        Ok((bids, report))
    }

    fn for_each_bid<R: BufRead>(
        &self,
        mut reader: R,
        mut sink: impl FnMut(Bid),
    ) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let mut buf = Vec::new();

        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(report);
        }
        log::debug!(
            "CSV заголовок: {}",
            split_fields(&String::from_utf8_lossy(strip_line_ending(&buf))).join(" | ")
        );

        let mut line_number = 1;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_number += 1;

            // Строка в другой кодировке отбрасывается, остальные читаются дальше
            let record = std::str::from_utf8(strip_line_ending(&buf)).map_err(|err| {
                Error::parse(line_number, format!("row is not valid UTF-8: {}", err))
            });
            if matches!(record, Ok(line) if line.trim().is_empty()) {
                continue;
            }
            report.rows_read += 1;
            match record.and_then(|line| self.parse_record(line_number, line)) {
                Ok(bid) => {
                    sink(bid);
                    report.loaded += 1;
                }
                Err(err) => {
                    log::warn!("Строка пропущена: {}", err);
                    report.skipped += 1;
                }
            }
        }

        log::info!(
            "{} bids read ({} rows, {} skipped)",
            report.loaded,
            report.rows_read,
            report.skipped
        );
        Ok(report)
    }

    /// Разбирает одну строку данных; `line_number` считается с 1
    pub fn parse_record(&self, line_number: usize, line: &str) -> Result<Bid> {
        let fields = split_fields(line);
        if fields.len() < self.layout.required_columns() {
            return Err(Error::parse(
                line_number,
                format!(
                    "expected at least {} columns, found {}",
                    self.layout.required_columns(),
                    fields.len()
                ),
            ));
        }

        let bid_id = fields[self.layout.bid_id].trim();
        if bid_id.is_empty() {
            return Err(Error::parse(line_number, "empty bid id"));
        }

        let raw_amount = &fields[self.layout.amount];
        let amount = parse_amount(raw_amount).ok_or_else(|| {
            Error::parse(line_number, format!("invalid amount {:?}", raw_amount))
        })?;

        let bid = Bid::new(
            bid_id,
            fields[self.layout.title].trim(),
            fields[self.layout.fund].trim(),
            amount,
        );
        bid.validate()
            .map_err(|err| Error::parse(line_number, err.to_string()))?;
        Ok(bid)
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Делит строку на поля по запятым с учетом кавычек (`""` внутри кавычек
/// означает одну кавычку). Поля, переносимые на следующую строку, не
/// поддерживаются.
pub fn split_fields(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}

/// Разбирает денежную сумму, отбрасывая `$`, разделители тысяч и пробелы
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',') && !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|amount| amount.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::index::{BinarySearchTree, ChainedHashTable};
    use std::io::Cursor;

    const HEADER: &str = "Title,ArticleID,Department,Close Date,Winning Bid,Inventory ID,Vehicle ID,Receipt Number,Fund";

    fn csv(rows: &[&str]) -> Cursor<String> {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        Cursor::new(text)
    }

    #[test]
    fn test_split_fields() {
        assert_eq!(split_fields("a,b,,c"), vec!["a", "b", "", "c"]);
        assert_eq!(
            split_fields("\"Desk, oak\",98223,\"say \"\"hi\"\"\"\r"),
            vec!["Desk, oak", "98223", "say \"hi\""]
        );
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount(" 12 "), Some(12.0));
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_record_default_layout() {
        let reader = BidCsvReader::default();
        let bid = reader
            .parse_record(2, "\"Hoover, Vacuum\",98223,Enterprise,8/7/2016,$27.00,,,,General Fund")
            .unwrap();
        assert_eq!(bid.bid_id, "98223");
        assert_eq!(bid.title, "Hoover, Vacuum");
        assert_eq!(bid.fund, "General Fund");
        assert_eq!(bid.amount, 27.0);
    }

    #[test]
    fn test_parse_record_rejections() {
        let reader = BidCsvReader::default();
        assert!(matches!(
            reader.parse_record(3, "only,three,columns"),
            Err(Error::Parse { line: 3, .. })
        ));
        assert!(reader.parse_record(4, "t,,d,c,$1.00,,,,f").is_err());
        assert!(reader.parse_record(5, "t,1,d,c,N/A,,,,f").is_err());
        assert!(reader.parse_record(6, "t,1,d,c,-5,,,,f").is_err());
    }

    #[test]
    fn test_load_into_tree_and_hash() {
        let rows = [
            "Chair,300,d,c,$10.00,,,,General Fund",
            "Broken row",
            "Table,100,d,c,$20.00,,,,Enterprise",
            "",
            "Lamp,200,d,c,$5.50,,,,General Fund",
        ];
        let reader = BidCsvReader::default();

        let mut tree = BinarySearchTree::new();
        let report = reader.load_into(csv(&rows), &mut tree).unwrap();
        assert_eq!(
            report,
            LoadReport {
                rows_read: 4,
                loaded: 3,
                skipped: 1
            }
        );
        let ids: Vec<_> = tree.iter().map(|bid| bid.bid_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "200", "300"]);

        let mut table = ChainedHashTable::new();
        reader.load_into(csv(&rows), &mut table).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.search("200").unwrap().amount, 5.5);
    }

    #[test]
    fn test_read_all_keeps_source_order() {
        let rows = ["B,2,d,c,1,,,,f", "A,1,d,c,2,,,,f"];
        let (bids, report) = BidCsvReader::default().read_all(csv(&rows)).unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(bids[0].bid_id, "2");
        assert_eq!(bids[1].bid_id, "1");
    }

    #[test]
    fn test_non_utf8_row_is_skipped() {
        let mut data = format!("{}\nChair,1,d,c,$1.00,,,,f\nLamp,2,d,c,$2.00,,,,f\n", HEADER)
            .into_bytes();
        data.extend_from_slice(b"Caf\xE9,3,d,c,$3.00,,,,f\r\n");
        data.extend_from_slice(b"Desk,4,d,c,$4.00,,,,f\r\n");

        let mut tree = BinarySearchTree::new();
        let report = BidCsvReader::default()
            .load_into(Cursor::new(data), &mut tree)
            .unwrap();

        assert_eq!(
            report,
            LoadReport {
                rows_read: 4,
                loaded: 3,
                skipped: 1
            }
        );
        let ids: Vec<_> = tree.iter().map(|bid| bid.bid_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
        assert_eq!(tree.search("4").unwrap().fund, "f");
    }

    #[test]
    fn test_empty_input() {
        let (bids, report) = BidCsvReader::default()
            .read_all(Cursor::new(String::new()))
            .unwrap();
        assert!(bids.is_empty());
        assert_eq!(report, LoadReport::default());
    }

    #[test]
    fn test_custom_layout() {
        let layout = CsvLayout {
            title: 1,
            bid_id: 0,
            amount: 2,
            fund: 3,
        };
        layout.validate().unwrap();
        assert_eq!(layout.required_columns(), 4);

        let bid = BidCsvReader::new(layout)
            .parse_record(2, "42,Widget,$3,Fund A")
            .unwrap();
        assert_eq!(bid, Bid::new("42", "Widget", "Fund A", 3.0));

        let overlapping = CsvLayout {
            title: 1,
            bid_id: 1,
            amount: 2,
            fund: 3,
        };
        assert!(overlapping.validate().is_err());
    }
}
