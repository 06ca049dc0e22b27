//! Header-keyed CSV tables, the on-disk unit of a GTFS feed.
//!
//! [`TableReader`] yields one [`Row`] per record and looks fields up by
//! column name, so column order in a feed never matters. [`write_table`]
//! renders records through a list of [`Column`] descriptors.

use std::{
  collections::HashMap,
  fmt::Display,
  io::{BufRead as _, BufReader, Read, Write},
  rc::Rc,
  str::FromStr,
};

use csv::StringRecord;

use crate::{Error, Result};

const BOM: &[u8] = b"\xEF\xBB\xBF";

// ─── Reading ─────────────────────────────────────────────────────────────────

/// A lazy, single-pass reader over one table.
pub struct TableReader<R: Read> {
  table:   &'static str,
  columns: Rc<HashMap<String, usize>>,
  records: csv::StringRecordsIntoIter<BufReader<R>>,
}

impl<R: Read> TableReader<R> {
  /// Read the header row of `table` from `reader`.
  ///
  /// A leading UTF-8 byte order mark is skipped. Both LF and CRLF record
  /// terminators are accepted.
  pub fn new(table: &'static str, reader: R) -> Result<Self> {
    let mut reader = BufReader::new(reader);
    if reader.fill_buf()?.starts_with(BOM) {
      reader.consume(BOM.len());
    }

    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = csv
      .headers()?
      .iter()
      .enumerate()
      .map(|(i, name)| (name.trim().to_owned(), i))
      .collect();

    Ok(Self { table, columns: Rc::new(columns), records: csv.into_records() })
  }

  pub fn has_column(&self, column: &str) -> bool { self.columns.contains_key(column) }
}

impl<R: Read> Iterator for TableReader<R> {
  type Item = Result<Row>;

  fn next(&mut self) -> Option<Self::Item> {
    let record = match self.records.next()? {
      Ok(record) => record,
      Err(e) => return Some(Err(e.into())),
    };
    Some(Ok(Row {
      table: self.table,
      line: record.position().map_or(0, |p| p.line()),
      columns: Rc::clone(&self.columns),
      record,
    }))
  }
}

/// One record of a table, addressed by column name.
#[derive(Debug, Clone)]
pub struct Row {
  table:   &'static str,
  line:    u64,
  columns: Rc<HashMap<String, usize>>,
  record:  StringRecord,
}

impl Row {
  pub fn table(&self) -> &'static str { self.table }

  /// 1-based line of the record in its table.
  pub fn line(&self) -> u64 { self.line }

  /// The raw field, `None` when the table has no such column.
  pub fn get(&self, column: &str) -> Option<&str> {
    self.columns.get(column).and_then(|&i| self.record.get(i))
  }

  /// The trimmed field, `None` when absent or blank.
  pub fn optional(&self, column: &str) -> Option<&str> {
    self.get(column).map(str::trim).filter(|v| !v.is_empty())
  }

  /// The trimmed field; absent or blank is a malformed row.
  pub fn required(&self, column: &str) -> Result<&str> {
    self.optional(column).ok_or_else(|| self.malformed(format!("missing value for {column}")))
  }

  /// Parse a required field.
  pub fn parse<T>(&self, column: &str) -> Result<T>
  where
    T: FromStr,
    T::Err: Display,
  {
    let value = self.required(column)?;
    value
      .parse()
      .map_err(|e| self.malformed(format!("invalid {column} {value:?}: {e}")))
  }

  /// Parse an optional field; absent or blank gives `None`.
  pub fn parse_optional<T>(&self, column: &str) -> Result<Option<T>>
  where
    T: FromStr,
    T::Err: Display,
  {
    self.optional(column).map(|_| self.parse(column)).transpose()
  }

  pub fn malformed(&self, message: impl Into<String>) -> Error {
    Error::MalformedRow { table: self.table, line: self.line, message: message.into() }
  }

  pub fn unresolved(&self, kind: &'static str, id: &str) -> Error {
    Error::UnresolvedReference {
      table: self.table,
      line: self.line,
      kind,
      id: id.to_owned(),
    }
  }
}

// ─── Writing ─────────────────────────────────────────────────────────────────

type Accessor<'a, T> = Box<dyn Fn(&T) -> Option<String> + 'a>;

/// How one output column is computed from a record.
pub struct Column<'a, T> {
  name:     &'static str,
  accessor: Accessor<'a, T>,
  fallback: &'static str,
}

impl<'a, T> Column<'a, T> {
  /// A column whose value is always present.
  pub fn new<V: Display>(name: &'static str, accessor: impl Fn(&T) -> V + 'a) -> Self {
    Self::optional(name, move |record| Some(accessor(record)))
  }

  /// A column that may have no value; see [`Column::fallback`].
  pub fn optional<V: Display>(
    name: &'static str,
    accessor: impl Fn(&T) -> Option<V> + 'a,
  ) -> Self {
    Self {
      name,
      accessor: Box::new(move |record| accessor(record).map(|v| v.to_string())),
      fallback: "",
    }
  }

  /// A column whose present values go through `converter` before being
  /// written.
  pub fn converted<V, U: Display>(
    name: &'static str,
    accessor: impl Fn(&T) -> Option<V> + 'a,
    converter: impl Fn(V) -> U + 'a,
  ) -> Self {
    Self::optional(name, move |record| accessor(record).map(&converter))
  }

  /// Text written when the record has no value. Defaults to empty.
  pub fn fallback(mut self, fallback: &'static str) -> Self {
    self.fallback = fallback;
    self
  }

  pub fn name(&self) -> &'static str { self.name }

  fn render(&self, record: &T) -> String {
    (self.accessor)(record).unwrap_or_else(|| self.fallback.to_owned())
  }
}

/// A CSV writer producing GTFS conventions: CRLF terminators, fields quoted
/// only when they contain a separator, quote or newline.
pub fn table_writer<W: Write>(out: W) -> csv::Writer<W> {
  csv::WriterBuilder::new()
    .terminator(csv::Terminator::CRLF)
    .quote_style(csv::QuoteStyle::Necessary)
    .from_writer(out)
}

/// Write a header row and then one row per record. Returns the number of
/// records written.
pub fn write_table<W: Write, T>(
  out: W,
  records: &[T],
  columns: &[Column<'_, T>],
) -> Result<usize> {
  let mut writer = table_writer(out);
  writer.write_record(columns.iter().map(Column::name))?;
  for record in records {
    writer.write_record(columns.iter().map(|c| c.render(record)))?;
  }
  writer.flush()?;
  Ok(records.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rows(table: &'static str, text: &[u8]) -> Vec<Row> {
    TableReader::new(table, text)
      .unwrap()
      .collect::<Result<Vec<_>>>()
      .unwrap()
  }

  #[test]
  fn reads_by_column_name_after_bom() {
    let rows = rows(
      "stops.txt",
      "\u{feff}stop_name,stop_id,stop_code\r\nŁomianki Buraków 03,114-3,\r\n".as_bytes(),
    );
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get("stop_id"), Some("114-3"));
    assert_eq!(row.get("stop_name"), Some("Łomianki Buraków 03"));
    assert_eq!(row.get("stop_code"), Some(""));
    assert_eq!(row.optional("stop_code"), None);
    assert_eq!(row.get("stop_desc"), None);
    assert_eq!(row.line(), 2);
  }

  #[test]
  fn quoted_fields_and_lf_terminators() {
    let rows = rows(
      "routes.txt",
      b"route_id,route_long_name\n1,\"Dziekan\xc3\xb3w, Osiedle\"\n2,\"say \"\"hi\"\"\"\n",
    );
    assert_eq!(rows[0].get("route_long_name"), Some("Dziekanów, Osiedle"));
    assert_eq!(rows[1].get("route_long_name"), Some("say \"hi\""));
    assert_eq!(rows[1].line(), 3);
  }

  #[test]
  fn short_rows_read_missing_columns_as_absent() {
    let rows = rows("trips.txt", b"trip_id,trip_headsign\nT1\n");
    assert_eq!(rows[0].get("trip_headsign"), None);
  }

  #[test]
  fn required_and_parse_report_location() {
    let rows = rows("stop_times.txt", b"trip_id,stop_sequence\nT1,\nT2,x\nT3, 4 \n");

    let err = rows[0].required("stop_sequence").unwrap_err();
    assert!(
      matches!(err, Error::MalformedRow { table: "stop_times.txt", line: 2, .. }),
      "{err:?}"
    );

    let err = rows[1].parse::<u32>("stop_sequence").unwrap_err();
    assert!(matches!(err, Error::MalformedRow { line: 3, .. }), "{err:?}");

    assert_eq!(rows[2].parse::<u32>("stop_sequence").unwrap(), 4);
    assert_eq!(rows[0].parse_optional::<u32>("stop_sequence").unwrap(), None);
  }

  #[test]
  fn invalid_utf8_is_an_error() {
    let mut reader = TableReader::new("agency.txt", &b"agency_name\n\xff\xfe\n"[..]).unwrap();
    assert!(matches!(reader.next(), Some(Err(Error::Csv(_)))));
  }

  struct Agency {
    id:       i64,
    name:     &'static str,
    timezone: Option<&'static str>,
    added:    Option<bool>,
  }

  #[test]
  fn writes_crlf_with_fallbacks_and_converters() {
    let records = [
      Agency { id: 1, name: "WKD", timezone: None, added: Some(true) },
      Agency { id: 2, name: "Komunikacja, \"Łomianki\"", timezone: Some("Europe/Warsaw"), added: None },
    ];
    let columns = [
      Column::new("agency_id", |a: &Agency| a.id),
      Column::new("agency_name", |a: &Agency| a.name),
      Column::optional("agency_timezone", |a: &Agency| a.timezone).fallback("UTC"),
      Column::converted("exception_type", |a: &Agency| a.added, |added| if added { 1 } else { 2 }),
    ];

    let mut out = Vec::new();
    assert_eq!(write_table(&mut out, &records, &columns).unwrap(), 2);
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "agency_id,agency_name,agency_timezone,exception_type\r\n\
       1,WKD,UTC,1\r\n\
       2,\"Komunikacja, \"\"Łomianki\"\"\",Europe/Warsaw,\r\n"
    );
  }
}
