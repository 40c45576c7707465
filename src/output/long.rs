// src/output/long.rs
use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray, UInt16Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::{fs::File, path::Path, sync::Arc};
use tracing::debug;

use super::{
    COL_AGE, COL_BODY_REGION, COL_CATEGORY, COL_COUNT, COL_REGION, COL_SEX, COL_YEAR,
};
use crate::aggregate::LongTable;
use crate::enrich::{AgeBucket, Sex};

#[derive(Serialize)]
struct LongRecord<'a> {
    #[serde(rename = "UF_ATENDIMENTO")]
    region: &'a str,
    #[serde(rename = "ANO_ATENDIMENTO")]
    year: u16,
    #[serde(rename = "SEXO")]
    sex: Sex,
    #[serde(rename = "FAIXA_ETARIA")]
    age: AgeBucket,
    #[serde(rename = "PROC_GRU_NOME")]
    category: &'a str,
    #[serde(rename = "REGIAO_CORPORAL_DETALHADA")]
    body_region: &'a str,
    #[serde(rename = "TOTAL_PROCEDIMENTOS")]
    count: u64,
}

pub fn write_csv(table: &LongTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for (key, count) in table.iter() {
        writer.serialize(LongRecord {
            region: &key.region,
            year: key.year,
            sex: key.sex,
            age: key.age,
            category: key.category,
            body_region: key.body_region,
            count,
        })?;
    }
    // serde writes no header when there are no rows
    if table.is_empty() {
        writer.write_record([
            COL_REGION,
            COL_YEAR,
            COL_SEX,
            COL_AGE,
            COL_CATEGORY,
            COL_BODY_REGION,
            COL_COUNT,
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    debug!(path = %path.display(), rows = table.len(), "wrote long csv");
    Ok(())
}

pub fn long_schema() -> Schema {
    Schema::new(vec![
        Field::new(COL_REGION, DataType::Utf8, false),
        Field::new(COL_YEAR, DataType::UInt16, false),
        Field::new(COL_SEX, DataType::Utf8, false),
        Field::new(COL_AGE, DataType::Utf8, false),
        Field::new(COL_CATEGORY, DataType::Utf8, false),
        Field::new(COL_BODY_REGION, DataType::Utf8, false),
        Field::new(COL_COUNT, DataType::UInt64, false),
    ])
}

pub fn to_record_batch(table: &LongTable) -> Result<RecordBatch> {
    let n = table.len();
    let mut region = Vec::with_capacity(n);
    let mut year = Vec::with_capacity(n);
    let mut sex = Vec::with_capacity(n);
    let mut age = Vec::with_capacity(n);
    let mut category = Vec::with_capacity(n);
    let mut body_region = Vec::with_capacity(n);
    let mut count = Vec::with_capacity(n);

    for (key, c) in table.iter() {
        region.push(key.region.as_str());
        year.push(key.year);
        sex.push(key.sex.label());
        age.push(key.age.label());
        category.push(key.category);
        body_region.push(key.body_region);
        count.push(c);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(region)),
        Arc::new(UInt16Array::from(year)),
        Arc::new(StringArray::from(sex)),
        Arc::new(StringArray::from(age)),
        Arc::new(StringArray::from(category)),
        Arc::new(StringArray::from(body_region)),
        Arc::new(UInt64Array::from(count)),
    ];
    RecordBatch::try_new(Arc::new(long_schema()), columns).context("building long-table batch")
}

pub fn write_parquet(table: &LongTable, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for long table")?;
    writer.write(&batch).context("writing long-table batch")?;
    writer.close().context("closing long-table writer")?;
    debug!(path = %path.display(), rows = batch.num_rows(), "wrote long parquet");
    Ok(())
}
