//! Format writers: JSONL lines, a JSON envelope, and flattened Parquet.
//!
//! JSONL and Parquet stamp the run metadata into every record; the JSON
//! envelope carries one metadata object next to the untouched records.
//! Parquet flattens nested structs into dotted columns and renders lists
//! as JSON strings, so downstream column stores see a flat table.

use crate::path::numbered_path;
use crate::record::RunMeta;
use anyhow::Context;
use arrow_array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trawl_common::OutputFormat;

/// What landed on disk after a successful write.
#[derive(Debug, Clone)]
pub struct SavedFile {
    pub path: PathBuf,
    pub file_number: u32,
    pub records: usize,
    pub bytes: u64,
}

impl SavedFile {
    pub fn size_mb(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Write `records` under the run's incremental filename.
///
/// `prefix` falls back to `{platform}_scraper` when empty. Returns `None`
/// without touching the disk when there is nothing to write.
pub fn write_records<T: Serialize>(
    records: &[T],
    meta: &RunMeta,
    format: OutputFormat,
    output_dir: &Path,
    prefix: Option<&str>,
) -> anyhow::Result<Option<SavedFile>> {
    if records.is_empty() {
        tracing::warn!("no records to save");
        return Ok(None);
    }

    let default = meta.default_prefix();
    let prefix = match prefix {
        Some(p) if !p.is_empty() => p,
        _ => &default,
    };
    let (path, file_number) = numbered_path(output_dir, prefix, format.extension())?;

    let mut meta = meta.clone();
    meta.file_number = Some(file_number);

    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    match format {
        OutputFormat::Jsonl => write_jsonl(&path, values, &meta)?,
        OutputFormat::Json => write_json(&path, values, &meta)?,
        OutputFormat::Parquet => write_parquet(&path, values, &meta)?,
    }

    let bytes = std::fs::metadata(&path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    let saved = SavedFile {
        path,
        file_number,
        records: records.len(),
        bytes,
    };
    tracing::info!(
        path=%saved.path.display(),
        records = saved.records,
        size_mb = format!("{:.2}", saved.size_mb()),
        %format,
        "sink.saved"
    );
    Ok(Some(saved))
}

fn write_jsonl(path: &Path, values: Vec<Value>, meta: &RunMeta) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for value in values {
        serde_json::to_writer(&mut out, &meta.stamp(value, "jsonl"))?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn write_json(path: &Path, values: Vec<Value>, meta: &RunMeta) -> anyhow::Result<()> {
    let mut metadata = serde_json::to_value(meta)?;
    if let Some(map) = metadata.as_object_mut() {
        map.insert("total_records".into(), values.len().into());
        map.insert("format".into(), "json".into());
    }
    let envelope = serde_json::json!({ "metadata": metadata, "records": values });

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &envelope)?;
    out.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, values: Vec<Value>, meta: &RunMeta) -> anyhow::Result<()> {
    let rows: Vec<serde_json::Map<String, Value>> = values
        .into_iter()
        .map(|value| {
            let mut flat = serde_json::Map::new();
            flatten_into("", &meta.stamp(value, "parquet"), &mut flat);
            flat
        })
        .collect();

    // Union of column names across rows; sparse columns go nullable.
    let mut names = BTreeSet::new();
    for row in &rows {
        for name in row.keys() {
            names.insert(name.clone());
        }
    }

    let mut fields = Vec::with_capacity(names.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(names.len());
    for name in &names {
        let (data_type, array) = build_column(&rows, name);
        fields.push(Field::new(name.as_str(), data_type, true));
        arrays.push(array);
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Page)
        .build();
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    tracing::debug!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "sink.parquet.layout"
    );
    Ok(())
}

/// Recursively flatten `value` into dotted keys; arrays become JSON text.
fn flatten_into(prefix: &str, value: &Value, out: &mut serde_json::Map<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let dotted = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&dotted, inner, out);
            }
        }
        Value::Array(_) => {
            out.insert(prefix.to_string(), Value::String(value.to_string()));
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

/// Infer the column's arrow type from its values and build the array.
///
/// Integers widen to floats when mixed; any other mixture falls back to
/// text. An all-null column lands as nullable text.
fn build_column(rows: &[serde_json::Map<String, Value>], name: &str) -> (DataType, ArrayRef) {
    #[derive(Clone, Copy, PartialEq)]
    enum Kind {
        Bool,
        Int,
        Float,
        Text,
    }

    let mut kind: Option<Kind> = None;
    for row in rows {
        let seen = match row.get(name) {
            None | Some(Value::Null) => continue,
            Some(Value::Bool(_)) => Kind::Bool,
            Some(Value::Number(n)) if n.is_f64() => Kind::Float,
            Some(Value::Number(_)) => Kind::Int,
            Some(_) => Kind::Text,
        };
        kind = Some(match (kind, seen) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(Kind::Int), Kind::Float) | (Some(Kind::Float), Kind::Int) => Kind::Float,
            _ => Kind::Text,
        });
    }

    match kind.unwrap_or(Kind::Text) {
        Kind::Bool => {
            let vals: Vec<Option<bool>> =
                rows.iter().map(|r| r.get(name).and_then(Value::as_bool)).collect();
            (DataType::Boolean, Arc::new(BooleanArray::from(vals)) as ArrayRef)
        }
        Kind::Int => {
            let vals: Vec<Option<i64>> =
                rows.iter().map(|r| r.get(name).and_then(Value::as_i64)).collect();
            (DataType::Int64, Arc::new(Int64Array::from(vals)) as ArrayRef)
        }
        Kind::Float => {
            let vals: Vec<Option<f64>> =
                rows.iter().map(|r| r.get(name).and_then(Value::as_f64)).collect();
            (DataType::Float64, Arc::new(Float64Array::from(vals)) as ArrayRef)
        }
        Kind::Text => {
            let vals: Vec<Option<String>> =
                rows.iter().map(|r| r.get(name).and_then(text_value)).collect();
            (DataType::Utf8, Arc::new(StringArray::from(vals)) as ArrayRef)
        }
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use serde_json::json;
    use trawl_common::{Platform, SearchMode};

    fn meta() -> RunMeta {
        RunMeta::new(Platform::TikTok, SearchMode::Hashtag, "cucina")
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<Value> = vec![];
        let saved = write_records(&records, &meta(), OutputFormat::Jsonl, dir.path(), None).unwrap();
        assert!(saved.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn jsonl_stamps_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![json!({"id": "a"}), json!({"id": "b"})];
        let saved = write_records(&records, &meta(), OutputFormat::Jsonl, dir.path(), None)
            .unwrap()
            .unwrap();

        assert!(saved.path.ends_with("tiktok_scraper_#1.jsonl"));
        assert_eq!(saved.records, 2);

        let body = std::fs::read_to_string(&saved.path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], "a");
        assert_eq!(first["platform"], "tiktok");
        assert_eq!(first["search_term"], "cucina");
        assert_eq!(first["file_number"], 1);
        assert_eq!(first["format"], "jsonl");
    }

    #[test]
    fn file_numbers_increment_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![json!({"id": "a"})];
        let first = write_records(&records, &meta(), OutputFormat::Jsonl, dir.path(), Some("run"))
            .unwrap()
            .unwrap();
        let second = write_records(&records, &meta(), OutputFormat::Jsonl, dir.path(), Some("run"))
            .unwrap()
            .unwrap();
        assert_eq!(first.file_number, 1);
        assert_eq!(second.file_number, 2);
        assert!(second.path.ends_with("run_#2.jsonl"));
    }

    #[test]
    fn json_envelope_keeps_records_unstamped() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![json!({"id": "a"}), json!({"id": "b"})];
        let saved = write_records(&records, &meta(), OutputFormat::Json, dir.path(), None)
            .unwrap()
            .unwrap();

        let body: Value = serde_json::from_str(&std::fs::read_to_string(&saved.path).unwrap()).unwrap();
        assert_eq!(body["metadata"]["total_records"], 2);
        assert_eq!(body["metadata"]["platform"], "tiktok");
        assert_eq!(body["metadata"]["file_number"], 1);
        let first = &body["records"][0];
        assert_eq!(first["id"], "a");
        assert!(first.get("collection_time").is_none());
    }

    #[test]
    fn parquet_flattens_nested_fields() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            json!({"id": "a", "stats": {"views": 10, "likes": 2}, "tags": ["x", "y"], "score": 0.5}),
            json!({"id": "b", "stats": {"views": 20, "likes": 4}, "tags": [], "score": 1.0}),
        ];
        let saved = write_records(&records, &meta(), OutputFormat::Parquet, dir.path(), None)
            .unwrap()
            .unwrap();

        let file = File::open(&saved.path).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        let schema = builder.schema().clone();
        let mut reader = builder.build().unwrap();
        let batch = reader.next().unwrap().unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(
            schema.field_with_name("stats.views").unwrap().data_type(),
            &DataType::Int64
        );
        assert_eq!(
            schema.field_with_name("score").unwrap().data_type(),
            &DataType::Float64
        );
        // Lists ride along as JSON strings.
        assert_eq!(
            schema.field_with_name("tags").unwrap().data_type(),
            &DataType::Utf8
        );
        // Stamp keys become columns too.
        assert!(schema.field_with_name("search_term").is_ok());
    }

    #[test]
    fn mixed_number_columns_widen_to_float() {
        let rows: Vec<serde_json::Map<String, Value>> = vec![
            json!({"x": 1}).as_object().unwrap().clone(),
            json!({"x": 1.5}).as_object().unwrap().clone(),
        ];
        let (dt, _) = build_column(&rows, "x");
        assert_eq!(dt, DataType::Float64);

        let rows: Vec<serde_json::Map<String, Value>> = vec![
            json!({"x": 1}).as_object().unwrap().clone(),
            json!({"x": "uno"}).as_object().unwrap().clone(),
        ];
        let (dt, _) = build_column(&rows, "x");
        assert_eq!(dt, DataType::Utf8);
    }
}
