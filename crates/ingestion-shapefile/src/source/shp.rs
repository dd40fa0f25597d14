//! Streaming decoder for the `.shp` geometry and `.dbf` attribute files.
//!
//! Records are decoded one at a time through buffered readers, so memory
//! use is bounded by the largest single record rather than the file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use encoding_rs::{Encoding, UTF_8};
use geo::{
    Contains, Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, Winding,
};
use ingestion_core::result::AppResult;
use ingestion_entity::feature::{Feature, Geometry};
use serde_json::{Map, Number, Value};
use tracing::warn;

use super::{FeatureIter, FeatureSource};
use crate::error::ShapefileError;

const SHP_FILE_CODE: i32 = 9994;
const SHP_HEADER_LEN: usize = 100;
const DBF_HEADER_LEN: usize = 32;
const DBF_DESCRIPTOR_LEN: usize = 32;
const DBF_TERMINATOR: u8 = 0x0D;

/// Reads features from `<path>.shp` and `<path>.dbf`, decoding attribute
/// text with the code page named in `<path>.cpg` (UTF-8 when absent).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapefileSource;

impl FeatureSource for ShapefileSource {
    fn open(&self, path: &Path) -> AppResult<FeatureIter> {
        let records = ShpRecords::open(&path.with_extension("shp"))?;
        let dbf_path = path.with_extension("dbf");
        let attributes = if dbf_path.exists() {
            let encoding = code_page(&path.with_extension("cpg"));
            Some(DbfRecords::open(&dbf_path, encoding)?)
        } else {
            None
        };
        Ok(Box::new(ShapefileFeatures {
            records,
            attributes,
        }))
    }
}

struct ShapefileFeatures {
    records: ShpRecords,
    attributes: Option<DbfRecords>,
}

impl Iterator for ShapefileFeatures {
    type Item = AppResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        let geometry = match self.records.next_record() {
            Ok(Some(geometry)) => geometry,
            Ok(None) => return None,
            Err(e) => return Some(Err(e.into())),
        };
        let properties = match self.attributes.as_mut().map(DbfRecords::next_record) {
            Some(Ok(Some(properties))) => properties,
            Some(Err(e)) => return Some(Err(e.into())),
            Some(Ok(None)) | None => Map::new(),
        };
        Some(Ok(Feature::new(geometry, properties)))
    }
}

struct ShpRecords {
    path: PathBuf,
    reader: BufReader<File>,
    position: u64,
    file_len: u64,
    record: u64,
}

impl ShpRecords {
    fn open(path: &Path) -> Result<Self, ShapefileError> {
        let file = File::open(path).map_err(|e| ShapefileError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let mut header = [0u8; SHP_HEADER_LEN];
        reader
            .read_exact(&mut header)
            .map_err(|e| ShapefileError::io(path, e))?;

        let file_code = i32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        if file_code != SHP_FILE_CODE {
            return Err(ShapefileError::InvalidHeader {
                kind: "shp",
                path: path.display().to_string(),
                reason: format!("unexpected file code {file_code}"),
            });
        }
        let words = i32::from_be_bytes([header[24], header[25], header[26], header[27]]);

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            position: SHP_HEADER_LEN as u64,
            file_len: u64::try_from(words).unwrap_or(0) * 2,
            record: 0,
        })
    }

    fn next_record(&mut self) -> Result<Option<Option<Geometry>>, ShapefileError> {
        if self.position >= self.file_len {
            return Ok(None);
        }
        let mut header = [0u8; 8];
        match self.reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(ShapefileError::io(&self.path, e)),
        }
        let words = i32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        let content_len = usize::try_from(words).unwrap_or(0) * 2;
        let mut content = vec![0u8; content_len];
        self.reader.read_exact(&mut content).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                ShapefileError::Truncated {
                    record: self.record,
                }
            } else {
                ShapefileError::io(&self.path, e)
            }
        })?;

        self.position += 8 + content_len as u64;
        let record = self.record;
        self.record += 1;
        decode_shape(&content, record).map(Some)
    }
}

/// Little-endian cursor over one record's content.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    record: u64,
}

impl<'a> Cursor<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], ShapefileError> {
        let end = self.pos + N;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(ShapefileError::Truncated {
                record: self.record,
            })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn i32(&mut self) -> Result<i32, ShapefileError> {
        Ok(i32::from_le_bytes(self.take::<4>()?))
    }

    fn f64(&mut self) -> Result<f64, ShapefileError> {
        Ok(f64::from_le_bytes(self.take::<8>()?))
    }

    fn count(&mut self) -> Result<usize, ShapefileError> {
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| ShapefileError::Truncated {
            record: self.record,
        })
    }

    fn coord(&mut self) -> Result<Coord, ShapefileError> {
        let x = self.f64()?;
        let y = self.f64()?;
        Ok(Coord { x, y })
    }

    fn skip_bbox(&mut self) -> Result<(), ShapefileError> {
        self.take::<32>().map(|_| ())
    }
}

fn decode_shape(content: &[u8], record: u64) -> Result<Option<Geometry>, ShapefileError> {
    let mut cursor = Cursor {
        buf: content,
        pos: 0,
        record,
    };
    let shape_type = cursor.i32()?;
    match shape_type {
        0 => Ok(None),
        1 | 11 | 21 => Ok(Some(Geometry::Point(Point::from(cursor.coord()?)))),
        8 | 18 | 28 => {
            cursor.skip_bbox()?;
            let count = cursor.count()?;
            let points = (0..count)
                .map(|_| cursor.coord().map(Point::from))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Geometry::MultiPoint(MultiPoint::new(points))))
        }
        3 | 13 | 23 => {
            let mut lines = read_parts(&mut cursor)?;
            if lines.len() == 1 {
                Ok(lines.pop().map(Geometry::LineString))
            } else {
                Ok(Some(Geometry::MultiLineString(MultiLineString::new(lines))))
            }
        }
        5 | 15 | 25 => {
            let rings = read_parts(&mut cursor)?;
            Ok(Some(assemble_polygons(rings)))
        }
        other => Err(ShapefileError::UnsupportedShapeType(other)),
    }
}

/// Read the parts/points layout shared by polylines and polygons.
fn read_parts(cursor: &mut Cursor<'_>) -> Result<Vec<LineString>, ShapefileError> {
    cursor.skip_bbox()?;
    let num_parts = cursor.count()?;
    let num_points = cursor.count()?;
    let starts = (0..num_parts)
        .map(|_| cursor.count())
        .collect::<Result<Vec<_>, _>>()?;
    let points = (0..num_points)
        .map(|_| cursor.coord())
        .collect::<Result<Vec<_>, _>>()?;

    let mut parts = Vec::with_capacity(num_parts);
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(num_points);
        let slice = points.get(*start..end).ok_or(ShapefileError::Truncated {
            record: cursor.record,
        })?;
        parts.push(LineString::new(slice.to_vec()));
    }
    Ok(parts)
}

/// Group rings into polygons. Clockwise rings are shells; each
/// counter-clockwise ring becomes a hole of the first shell enclosing it,
/// or of the last shell when none does.
fn assemble_polygons(rings: Vec<LineString>) -> Geometry {
    let (shells, holes): (Vec<_>, Vec<_>) = rings.into_iter().partition(|ring| !ring.is_ccw());
    let mut polygons: Vec<Polygon> = shells
        .into_iter()
        .map(|shell| Polygon::new(shell, vec![]))
        .collect();
    let outlines = polygons.clone();

    for hole in holes {
        let owner = hole.0.first().and_then(|start| {
            outlines
                .iter()
                .position(|outline| outline.contains(&Point::from(*start)))
        });
        match owner.or_else(|| polygons.len().checked_sub(1)) {
            Some(index) => polygons[index].interiors_push(hole),
            None => polygons.push(Polygon::new(hole, vec![])),
        }
    }

    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}

/// Resolve the attribute encoding from a `.cpg` sidecar.
///
/// Accepts WHATWG labels (`UTF-8`, `windows-1255`) and the bare Windows
/// code page numbers ESRI tools write (`1255`, `ANSI 1252`).
fn code_page(path: &Path) -> &'static Encoding {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return UTF_8;
    };
    let label = raw.trim();
    let label = label.strip_prefix("ANSI ").unwrap_or(label).trim();
    if label.is_empty() {
        return UTF_8;
    }
    let resolved = Encoding::for_label(label.as_bytes()).or_else(|| {
        label
            .chars()
            .all(|c| c.is_ascii_digit())
            .then(|| Encoding::for_label(format!("cp{label}").as_bytes()))
            .flatten()
    });
    resolved.unwrap_or_else(|| {
        warn!(path = %path.display(), label, "Unknown code page, decoding attributes as UTF-8");
        UTF_8
    })
}

#[derive(Debug, Clone)]
struct DbfField {
    name: String,
    kind: u8,
    length: usize,
    decimals: u8,
}

struct DbfRecords {
    path: PathBuf,
    reader: BufReader<File>,
    encoding: &'static Encoding,
    fields: Vec<DbfField>,
    record_len: usize,
    remaining: u32,
}

impl DbfRecords {
    fn open(path: &Path, encoding: &'static Encoding) -> Result<Self, ShapefileError> {
        let file = File::open(path).map_err(|e| ShapefileError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let mut header = [0u8; DBF_HEADER_LEN];
        reader
            .read_exact(&mut header)
            .map_err(|e| ShapefileError::io(path, e))?;

        let record_count = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let header_len = u16::from_le_bytes([header[8], header[9]]) as usize;
        let record_len = u16::from_le_bytes([header[10], header[11]]) as usize;
        if header_len < DBF_HEADER_LEN + 1 {
            return Err(ShapefileError::InvalidHeader {
                kind: "dbf",
                path: path.display().to_string(),
                reason: format!("header length {header_len} is too short"),
            });
        }

        let mut descriptors = vec![0u8; header_len - DBF_HEADER_LEN];
        reader
            .read_exact(&mut descriptors)
            .map_err(|e| ShapefileError::io(path, e))?;

        let fields = descriptors
            .chunks_exact(DBF_DESCRIPTOR_LEN)
            .take_while(|d| d[0] != DBF_TERMINATOR)
            .map(|d| {
                let name_end = d[..11].iter().position(|b| *b == 0).unwrap_or(11);
                DbfField {
                    name: encoding
                        .decode_without_bom_handling(&d[..name_end])
                        .0
                        .trim()
                        .to_string(),
                    kind: d[11],
                    length: d[16] as usize,
                    decimals: d[17],
                }
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            encoding,
            fields,
            record_len,
            remaining: record_count,
        })
    }

    fn next_record(&mut self) -> Result<Option<Map<String, Value>>, ShapefileError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let mut raw = vec![0u8; self.record_len];
        match self.reader.read_exact(&mut raw) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(ShapefileError::io(&self.path, e)),
        }
        self.remaining -= 1;

        // First byte is the deletion flag.
        let mut offset = 1;
        let mut properties = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            let end = (offset + field.length).min(raw.len());
            let (text, _) = self
                .encoding
                .decode_without_bom_handling(&raw[offset.min(end)..end]);
            properties.insert(field.name.clone(), parse_dbf_value(field, text.trim()));
            offset = end;
        }
        Ok(Some(properties))
    }
}

fn parse_dbf_value(field: &DbfField, text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    match field.kind {
        b'N' | b'F' => {
            if field.decimals == 0 {
                if let Ok(n) = text.parse::<i64>() {
                    return Value::Number(n.into());
                }
            }
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number)
        }
        b'L' => match text {
            "T" | "t" | "Y" | "y" => Value::Bool(true),
            "F" | "f" | "N" | "n" => Value::Bool(false),
            _ => Value::Null,
        },
        b'D' => match NaiveDate::parse_from_str(text, "%Y%m%d") {
            Ok(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            Err(_) => Value::String(text.to_string()),
        },
        _ => Value::String(text.to_string()),
    }
}
