// src/enrich.rs

//! Derived labels for a single decoded record.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::classify::{ClassificationTables, ProcedureClass};
use crate::config::FieldNames;
use crate::decode::{RawRecord, RawTable};
use crate::error::ProcessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Male,
    Female,
    Undefined,
}

impl Sex {
    /// `"1"` is male and `"3"` female; everything else is undefined.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("1") => Sex::Male,
            Some("3") => Sex::Female,
            _ => Sex::Undefined,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Undefined => "Undefined",
        }
    }
}

/// Age ranges used in reports. Variant order is ascending age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBucket {
    From0To4,
    From5To9,
    From10To14,
    From15To19,
    From20To29,
    From30To39,
    From40To49,
    From50To59,
    From60To69,
    From70To79,
    From80,
    Unknown,
}

/// Inclusive lower bounds, ascending. Each bucket ends where the next begins.
const AGE_BUCKETS: [(i64, AgeBucket); 11] = [
    (0, AgeBucket::From0To4),
    (5, AgeBucket::From5To9),
    (10, AgeBucket::From10To14),
    (15, AgeBucket::From15To19),
    (20, AgeBucket::From20To29),
    (30, AgeBucket::From30To39),
    (40, AgeBucket::From40To49),
    (50, AgeBucket::From50To59),
    (60, AgeBucket::From60To69),
    (70, AgeBucket::From70To79),
    (80, AgeBucket::From80),
];

impl AgeBucket {
    pub fn from_age(age: i64) -> Self {
        AGE_BUCKETS
            .iter()
            .rev()
            .find(|(lower, _)| age >= *lower)
            .map_or(AgeBucket::Unknown, |(_, bucket)| *bucket)
    }

    /// Bucket for a raw age field; unparsable or absent values are unknown.
    pub fn from_field(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map_or(AgeBucket::Unknown, Self::from_age)
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::From0To4 => "0-4",
            AgeBucket::From5To9 => "5-9",
            AgeBucket::From10To14 => "10-14",
            AgeBucket::From15To19 => "15-19",
            AgeBucket::From20To29 => "20-29",
            AgeBucket::From30To39 => "30-39",
            AgeBucket::From40To49 => "40-49",
            AgeBucket::From50To59 => "50-59",
            AgeBucket::From60To69 => "60-69",
            AgeBucket::From70To79 => "70-79",
            AgeBucket::From80 => "80+",
            AgeBucket::Unknown => "Unknown Age",
        }
    }
}

macro_rules! label_display {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.label())
            }
        }
    )*};
}

label_display!(Sex, AgeBucket);

/// Archive-level facts every record of a file shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub region: String,
    pub year: u16,
    pub month: Option<u8>,
}

/// A raw record plus everything derived from it.
#[derive(Debug, Clone)]
pub struct EnrichedRecord<'a> {
    pub raw: RawRecord<'a>,
    pub procedure_code: &'a str,
    pub region: &'a str,
    pub year: u16,
    pub sex: Sex,
    pub age: AgeBucket,
    pub class: ProcedureClass,
}

/// Column positions resolved once per table.
#[derive(Debug, Clone, Copy)]
pub struct Enricher<'t> {
    tables: &'t ClassificationTables,
    procedure: usize,
    sex: Option<usize>,
    age: Option<usize>,
}

impl<'t> Enricher<'t> {
    /// Fails when the procedure code column is absent; sex and age columns
    /// are optional and fall back to undefined/unknown labels.
    pub fn for_table(
        tables: &'t ClassificationTables,
        fields: &FieldNames,
        table: &RawTable,
    ) -> Result<Self, ProcessError> {
        let procedure = table
            .column_index(&fields.procedure)
            .ok_or_else(|| ProcessError::MissingField(fields.procedure.clone()))?;
        Ok(Self {
            tables,
            procedure,
            sex: table.column_index(&fields.sex),
            age: table.column_index(&fields.age),
        })
    }

    /// Trimmed procedure code of a record; empty when the row is short.
    pub fn procedure_code<'a>(&self, record: &RawRecord<'a>) -> &'a str {
        record.value(self.procedure).unwrap_or("").trim()
    }

    pub fn enrich<'a>(&self, record: RawRecord<'a>, meta: &'a FileMeta) -> EnrichedRecord<'a> {
        let procedure_code = self.procedure_code(&record);
        let sex = Sex::from_code(self.sex.and_then(|i| record.value(i)));
        let age = AgeBucket::from_field(self.age.and_then(|i| record.value(i)));
        EnrichedRecord {
            raw: record,
            procedure_code,
            region: &meta.region,
            year: meta.year,
            sex,
            age,
            class: self.tables.classify(procedure_code),
        }
    }
}
