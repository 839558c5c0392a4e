//! Delimited text in and out.
//!
//! Input: one `x,y` record per row, no header. Any malformed row aborts the
//! whole read. Output: one `id,x1,y1,...` row per line record.

use std::fmt;
use std::io::{Read, Write};

use collinear::{LineRecord, Point};

/// Why an input row was rejected. Rows are numbered from 1.
#[derive(Debug)]
pub enum RecordError {
    FieldCount {
        record: u64,
        found: usize,
    },
    NotANumber {
        record: u64,
        field: usize,
        value: String,
    },
    NonFinite {
        record: u64,
        field: usize,
        value: String,
    },
    Csv(csv::Error),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::FieldCount { record, found } => {
                write!(f, "record {record}: expected 2 fields, found {found}")
            }
            RecordError::NotANumber {
                record,
                field,
                value,
            } => write!(f, "record {record}, field {field}: {value:?} is not a number"),
            RecordError::NonFinite {
                record,
                field,
                value,
            } => write!(f, "record {record}, field {field}: {value:?} is not finite"),
            RecordError::Csv(err) => write!(f, "malformed csv: {err}"),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for RecordError {
    fn from(err: csv::Error) -> Self {
        RecordError::Csv(err)
    }
}

/// Parse every row of `reader` into a point.
pub fn read_points<R: Read>(reader: R) -> Result<Vec<Point>, RecordError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut points = Vec::new();
    for (k, row) in rdr.records().enumerate() {
        let row = row?;
        let record = k as u64 + 1;
        if row.len() != 2 {
            return Err(RecordError::FieldCount {
                record,
                found: row.len(),
            });
        }
        let x = parse_coord(&row[0], record, 1)?;
        let y = parse_coord(&row[1], record, 2)?;
        points.push(Point::new(x, y));
    }
    Ok(points)
}

fn parse_coord(raw: &str, record: u64, field: usize) -> Result<f64, RecordError> {
    let v: f64 = raw.parse().map_err(|_| RecordError::NotANumber {
        record,
        field,
        value: raw.to_string(),
    })?;
    if !v.is_finite() {
        return Err(RecordError::NonFinite {
            record,
            field,
            value: raw.to_string(),
        });
    }
    Ok(v)
}

/// Write one row per record and flush.
pub fn write_records<W: Write>(writer: W, records: &[LineRecord]) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    for rec in records {
        wtr.write_record(rec.fields())?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use collinear::LineId;

    #[test]
    fn reads_pairs_with_whitespace() {
        let pts = read_points("0,0\n 1.5 , -2\n3e2,4\n".as_bytes()).unwrap();
        assert_eq!(
            pts,
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.5, -2.0),
                Point::new(300.0, 4.0)
            ]
        );
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(read_points("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn wrong_field_count_is_fatal() {
        let err = read_points("0,0\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RecordError::FieldCount {
                record: 2,
                found: 3
            }
        ));
        let err = read_points("7\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RecordError::FieldCount { record: 1, found: 1 }));
    }

    #[test]
    fn non_numeric_field_is_fatal() {
        let err = read_points("0,0\n1,abc\n".as_bytes()).unwrap_err();
        match err {
            RecordError::NotANumber {
                record,
                field,
                value,
            } => {
                assert_eq!((record, field), (2, 2));
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_finite_field_is_fatal() {
        let err = read_points("inf,0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RecordError::NonFinite { record: 1, field: 1, .. }));
        assert!(err.to_string().contains("not finite"));
    }

    #[test]
    fn writes_ragged_rows() {
        let records = vec![
            LineRecord {
                id: LineId(1),
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(1.0, 1.0),
                    Point::new(2.0, 2.0),
                ],
            },
            LineRecord {
                id: LineId(7),
                points: vec![
                    Point::new(5.0, 0.5),
                    Point::new(5.0, 3.0),
                    Point::new(5.0, -2.0),
                    Point::new(5.0, 9.0),
                ],
            },
        ];
        let mut buf = Vec::new();
        write_records(&mut buf, &records).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "1,0,0,1,1,2,2\n7,5,0.5,5,3,5,-2,5,9\n"
        );
    }
}
