//! Uniform read/write of tabular datasets.
//!
//! Two physical formats are supported and chosen by file extension: Parquet
//! (`.parquet`, `.pq`) which round-trips column names and dtypes exactly, and
//! tab-separated text (`.tsv`, `.tab`) whose dtypes are re-inferred on read.
use crate::{AzulejoError, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use indexmap::IndexMap;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::{WriterProperties, WriterVersion};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Columns whose names start with this prefix are working columns and are
/// never persisted.
pub const TRANSIENT_PREFIX: &str = "tmp.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int64,
    Float64,
    Utf8,
    Boolean,
}

impl DType {
    fn arrow_type(self) -> DataType {
        match self {
            DType::Int64 => DataType::Int64,
            DType::Float64 => DataType::Float64,
            DType::Utf8 => DataType::Utf8,
            DType::Boolean => DataType::Boolean,
        }
    }

    fn from_arrow(data_type: &DataType) -> Result<Self> {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32 => Ok(DType::Int64),
            DataType::Float32 | DataType::Float64 => Ok(DType::Float64),
            DataType::Utf8 | DataType::LargeUtf8 => Ok(DType::Utf8),
            DataType::Boolean => Ok(DType::Boolean),
            other => Err(AzulejoError::UnrecognizedFormat(format!(
                "unsupported column type {}",
                other
            ))),
        }
    }
}

/// A single nullable, typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
}

impl Column {
    pub fn ints<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Column::Int64(values.into_iter().map(Some).collect())
    }

    pub fn floats<I: IntoIterator<Item = f64>>(values: I) -> Self {
        Column::Float64(values.into_iter().map(Some).collect())
    }

    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Column::Utf8(values.into_iter().map(|v| Some(v.into())).collect())
    }

    pub fn bools<I: IntoIterator<Item = bool>>(values: I) -> Self {
        Column::Boolean(values.into_iter().map(Some).collect())
    }

    pub fn empty(dtype: DType) -> Self {
        match dtype {
            DType::Int64 => Column::Int64(Vec::new()),
            DType::Float64 => Column::Float64(Vec::new()),
            DType::Utf8 => Column::Utf8(Vec::new()),
            DType::Boolean => Column::Boolean(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Utf8(v) => v.len(),
            Column::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            Column::Int64(_) => DType::Int64,
            Column::Float64(_) => DType::Float64,
            Column::Utf8(_) => DType::Utf8,
            Column::Boolean(_) => DType::Boolean,
        }
    }

    /// Text rendering of one cell; nulls render as the empty string.
    pub fn format_cell(&self, row: usize) -> String {
        let cell = match self {
            Column::Int64(v) => v[row].map(|x| x.to_string()),
            Column::Float64(v) => v[row].map(|x| x.to_string()),
            Column::Utf8(v) => v[row].clone(),
            Column::Boolean(v) => v[row].map(|x| if x { "True" } else { "False" }.to_string()),
        };
        cell.unwrap_or_default()
    }

    fn to_array(&self) -> ArrayRef {
        match self {
            Column::Int64(v) => Arc::new(Int64Array::from(v.clone())),
            Column::Float64(v) => Arc::new(Float64Array::from(v.clone())),
            Column::Utf8(v) => Arc::new(StringArray::from(v.clone())),
            Column::Boolean(v) => Arc::new(BooleanArray::from(v.clone())),
        }
    }

    fn extend_from_array(&mut self, array: &ArrayRef) -> Result<()> {
        let converted = cast(array.as_ref(), &self.dtype().arrow_type())?;
        let any = converted.as_any();
        let mismatch =
            || AzulejoError::Table(format!("unexpected array type {}", array.data_type()));
        match self {
            Column::Int64(values) => {
                let typed = any.downcast_ref::<Int64Array>().ok_or_else(mismatch)?;
                values.extend(typed.iter());
            }
            Column::Float64(values) => {
                let typed = any.downcast_ref::<Float64Array>().ok_or_else(mismatch)?;
                values.extend(typed.iter());
            }
            Column::Utf8(values) => {
                let typed = any.downcast_ref::<StringArray>().ok_or_else(mismatch)?;
                values.extend(typed.iter().map(|v| v.map(str::to_string)));
            }
            Column::Boolean(values) => {
                let typed = any.downcast_ref::<BooleanArray>().ok_or_else(mismatch)?;
                values.extend(typed.iter());
            }
        }
        Ok(())
    }

    /// Infer the narrowest column type for raw text cells: integer, then
    /// float, then boolean, else string. Empty cells are nulls.
    fn infer(raw: Vec<Option<String>>) -> Self {
        let present = || raw.iter().flatten();
        if present().next().is_none() {
            return Column::Utf8(raw);
        }
        if present().all(|v| v.parse::<i64>().is_ok()) {
            return Column::Int64(
                raw.iter()
                    .map(|v| v.as_ref().and_then(|s| s.parse().ok()))
                    .collect(),
            );
        }
        if present().all(|v| v.parse::<f64>().is_ok()) {
            return Column::Float64(
                raw.iter()
                    .map(|v| v.as_ref().and_then(|s| s.parse().ok()))
                    .collect(),
            );
        }
        if present().all(|v| parse_bool(v).is_some()) {
            return Column::Boolean(raw.iter().map(|v| v.as_deref().and_then(parse_bool)).collect());
        }
        Column::Utf8(raw)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// An ordered set of equal-length named columns, optionally keyed by one of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Column>,
    key: Option<String>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as the key column; it is written first on persistence.
    pub fn with_key(mut self, name: &str) -> Self {
        self.key = Some(name.to_string());
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn push_column(&mut self, name: &str, column: Column) -> Result<()> {
        if self.columns.contains_key(name) {
            return Err(AzulejoError::Table(format!("duplicate column '{}'", name)));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(AzulejoError::Table(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.n_rows()
            )));
        }
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.values().next().map(Column::len).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn dtypes(&self) -> Vec<(&str, DType)> {
        self.columns
            .iter()
            .map(|(name, column)| (name.as_str(), column.dtype()))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| AzulejoError::Table(format!("missing column '{}'", name)))
    }

    /// String view of a column. Numeric columns are rendered as text, since a
    /// TSV round trip may have inferred numbers from identifier columns.
    pub fn str_values(&self, name: &str) -> Result<Vec<String>> {
        self.opt_str_values(name)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| value.ok_or_else(|| null_error(name, row)))
            .collect()
    }

    pub fn opt_str_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.column(name)?;
        Ok(match column {
            Column::Utf8(v) => v.clone(),
            _ => (0..column.len())
                .map(|row| Some(column.format_cell(row)).filter(|s| !s.is_empty()))
                .collect(),
        })
    }

    pub fn int_values(&self, name: &str) -> Result<Vec<i64>> {
        self.opt_int_values(name)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| value.ok_or_else(|| null_error(name, row)))
            .collect()
    }

    pub fn opt_int_values(&self, name: &str) -> Result<Vec<Option<i64>>> {
        match self.column(name)? {
            Column::Int64(v) => Ok(v.clone()),
            Column::Float64(v) if v.iter().flatten().all(|x| x.fract() == 0.0) => {
                Ok(v.iter().map(|x| x.map(|f| f as i64)).collect())
            }
            // an all-empty text column carries no type
            Column::Utf8(v) if v.iter().all(Option::is_none) => Ok(vec![None; v.len()]),
            other => Err(type_error(name, DType::Int64, other.dtype())),
        }
    }

    pub fn float_values(&self, name: &str) -> Result<Vec<f64>> {
        match self.column(name)? {
            Column::Float64(v) => v
                .iter()
                .enumerate()
                .map(|(row, value)| value.ok_or_else(|| null_error(name, row)))
                .collect(),
            Column::Int64(_) => Ok(self.int_values(name)?.into_iter().map(|x| x as f64).collect()),
            other => Err(type_error(name, DType::Float64, other.dtype())),
        }
    }

    pub fn bool_values(&self, name: &str) -> Result<Vec<bool>> {
        match self.column(name)? {
            Column::Boolean(v) => v
                .iter()
                .enumerate()
                .map(|(row, value)| value.ok_or_else(|| null_error(name, row)))
                .collect(),
            other => Err(type_error(name, DType::Boolean, other.dtype())),
        }
    }

    /// Copy of this table as it will be persisted: transient columns dropped,
    /// key column first, everything else in insertion order.
    pub fn normalized(&self) -> Table {
        let mut columns = IndexMap::new();
        if let Some(key) = &self.key {
            if let Some(column) = self.columns.get(key) {
                columns.insert(key.clone(), column.clone());
            }
        }
        for (name, column) in &self.columns {
            if name.starts_with(TRANSIENT_PREFIX) || columns.contains_key(name) {
                continue;
            }
            columns.insert(name.clone(), column.clone());
        }
        Table {
            columns,
            key: self.key.clone(),
        }
    }
}

fn null_error(name: &str, row: usize) -> AzulejoError {
    AzulejoError::Table(format!("null value in column '{}' at row {}", name, row))
}

fn type_error(name: &str, wanted: DType, found: DType) -> AzulejoError {
    AzulejoError::Table(format!(
        "column '{}' has type {:?}, expected {:?}",
        name, found, wanted
    ))
}

/// Physical table format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Parquet,
    Tsv,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("parquet") | Some("pq") => Ok(TableFormat::Parquet),
            Some("tsv") | Some("tab") => Ok(TableFormat::Tsv),
            other => Err(AzulejoError::UnrecognizedFormat(format!(
                "{} (extension {:?})",
                path.display(),
                other.unwrap_or("")
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Parquet => "parquet",
            TableFormat::Tsv => "tsv",
        }
    }
}

impl std::str::FromStr for TableFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parquet" | "pq" => Ok(TableFormat::Parquet),
            "tsv" | "tab" => Ok(TableFormat::Tsv),
            _ => Err(format!("Unknown table format: {}", s)),
        }
    }
}

/// Compression codec for the columnar format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Zstd,
    Snappy,
    Gzip,
    Uncompressed,
}

impl Codec {
    fn compression(self) -> Compression {
        match self {
            Codec::Zstd => Compression::ZSTD(Default::default()),
            Codec::Snappy => Compression::SNAPPY,
            Codec::Gzip => Compression::GZIP(Default::default()),
            Codec::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Read a table, choosing the format from the file extension.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path)?;
    if !path.exists() {
        return Err(AzulejoError::InputNotFound(path.to_path_buf()));
    }
    let table = match format {
        TableFormat::Parquet => read_parquet(path)?,
        TableFormat::Tsv => read_tsv(path)?,
    };
    debug!(
        "Read {} rows x {} columns from {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(table)
}

/// Write a table with the default (ZSTD) columnar codec.
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    write_table_with(table, path, Codec::default())
}

pub fn write_table_with<P: AsRef<Path>>(table: &Table, path: P, codec: Codec) -> Result<()> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path)?;
    let table = table.normalized();
    if table.n_cols() == 0 {
        return Err(AzulejoError::Table(format!(
            "refusing to write a table without columns to {}",
            path.display()
        )));
    }
    match format {
        TableFormat::Parquet => write_parquet(&table, path, codec)?,
        TableFormat::Tsv => write_tsv(&table, path)?,
    }
    debug!(
        "Wrote {} rows x {} columns to {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(())
}

fn write_parquet(table: &Table, path: &Path, codec: Codec) -> Result<()> {
    let fields: Vec<Field> = table
        .columns
        .iter()
        .map(|(name, column)| Field::new(name.as_str(), column.dtype().arrow_type(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = table.columns.values().map(Column::to_array).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let props = WriterProperties::builder()
        .set_writer_version(WriterVersion::PARQUET_2_0)
        .set_compression(codec.compression())
        .build();

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn read_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let mut columns = IndexMap::new();
    for field in builder.schema().fields() {
        let dtype = DType::from_arrow(field.data_type())?;
        columns.insert(field.name().clone(), Column::empty(dtype));
    }

    let reader = builder.build()?;
    for batch in reader {
        let batch = batch?;
        for (idx, column) in columns.values_mut().enumerate() {
            column.extend_from_array(batch.column(idx))?;
        }
    }

    Ok(Table { columns, key: None })
}

fn write_tsv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in 0..table.n_rows() {
        writer.write_record(table.columns.values().map(|c| c.format_cell(row)))?;
    }
    writer.flush()?;
    Ok(())
}

fn read_tsv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (idx, field) in record.iter().enumerate() {
            raw[idx].push(if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            });
        }
    }

    let mut table = Table::new();
    for (name, cells) in headers.into_iter().zip(raw) {
        table.push_column(&name, Column::infer(cells))?;
    }
    Ok(table)
}
