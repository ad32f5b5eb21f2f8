//! Raw metadata rows and their typed records.
//!
//! Driver calls and SQL resources both produce [`MetadataRow`]s keyed by
//! upper-cased column name. Each category has one parse function, so a
//! resource overriding a driver call only needs to return the same column
//! names (`TABLE_SCHEM`, `TABLE_NAME`, `COLUMN_NAME`, `KEY_SEQ`, ...).
//! Information-schema spellings are accepted as aliases.

use crate::models::{
    ConstraintType, ParameterDirection, ReferentialAction, RoutineType, SortOrder, TriggerEvent,
    TriggerTiming,
};
use crate::registry::MetadataCategory;
use crate::{Result, error::DbCrawlerError};
use std::collections::BTreeMap;

/// One result row, column name to nullable text value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRow {
    values: BTreeMap<String, Option<String>>,
}

impl MetadataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under the upper-cased column name.
    pub fn insert(&mut self, column: &str, value: Option<String>) {
        self.values.insert(column.to_ascii_uppercase(), value);
    }

    /// Builder form of [`MetadataRow::insert`] for non-null values.
    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.insert(column, Some(value.into()));
        self
    }

    /// Non-null value of `column`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(&column.to_ascii_uppercase())
            .and_then(|v| v.as_deref())
    }

    /// First non-null value among `columns`.
    pub fn first(&self, columns: &[&str]) -> Option<&str> {
        columns.iter().find_map(|c| self.get(c))
    }

    /// Every column, including nulls
    pub fn columns(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

// Column aliases shared by several categories
const CATALOG: &[&str] = &["TABLE_CAT", "TABLE_CATALOG"];
const SCHEMA: &[&str] = &["TABLE_SCHEM", "TABLE_SCHEMA"];
const TABLE: &[&str] = &["TABLE_NAME"];
const COLUMN: &[&str] = &["COLUMN_NAME"];

fn required<'a>(row: &'a MetadataRow, columns: &[&str], category: MetadataCategory) -> Result<&'a str> {
    row.first(columns)
        .ok_or_else(|| DbCrawlerError::parse_field(columns[0], category, "missing value"))
}

fn optional(row: &MetadataRow, columns: &[&str]) -> Option<String> {
    row.first(columns).map(str::to_string)
}

fn number<T: std::str::FromStr>(
    row: &MetadataRow,
    columns: &[&str],
    category: MetadataCategory,
) -> Result<Option<T>> {
    match row.first(columns).map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|_| DbCrawlerError::parse_field(columns[0], category, &format!("not a number: {}", text))),
    }
}

/// Parses the many spellings drivers use for booleans.
fn flag(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_ascii_uppercase().as_str() {
        "YES" | "Y" | "TRUE" | "T" | "1" | "ON" => Some(true),
        "NO" | "N" | "FALSE" | "F" | "0" | "OFF" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRecord {
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRecord {
    pub schema: String,
    pub name: String,
    pub table_type: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRecord {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub ordinal_position: u32,
    pub type_name: String,
    pub size: Option<i64>,
    pub decimal_digits: Option<i32>,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub remarks: Option<String>,
    pub is_auto_increment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyRecord {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub key_sequence: u32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRecord {
    pub name: String,
    pub fk_schema: String,
    pub fk_table: String,
    pub fk_column: String,
    pub pk_schema: String,
    pub pk_table: String,
    pub pk_column: String,
    pub key_sequence: u32,
    pub update_rule: Option<ReferentialAction>,
    pub delete_rule: Option<ReferentialAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub is_unique: bool,
    pub column: Option<String>,
    pub ordinal_position: u32,
    pub sort_order: Option<SortOrder>,
    pub index_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConstraintRecord {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub constraint_type: ConstraintType,
    pub is_deferrable: bool,
    pub initially_deferred: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRecord {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub event: Option<TriggerEvent>,
    pub timing: Option<TriggerTiming>,
    pub orientation: Option<String>,
    pub action_order: Option<i32>,
    pub condition: Option<String>,
    pub statement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRecord {
    pub schema: String,
    pub table: String,
    pub definition: Option<String>,
    pub check_option: Option<String>,
    pub is_updatable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtTableRecord {
    pub schema: String,
    pub table: String,
    pub definition: Option<String>,
}

/// Free-form attributes for a table, or a column when `column` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    pub schema: String,
    pub table: String,
    pub column: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub schema: String,
    pub name: String,
    pub increment: Option<i64>,
    pub minimum_value: Option<String>,
    pub maximum_value: Option<String>,
    pub is_cycle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineRecord {
    pub schema: String,
    pub name: String,
    pub specific_name: String,
    pub routine_type: RoutineType,
    pub remarks: Option<String>,
    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineColumnRecord {
    pub schema: String,
    pub specific_name: String,
    pub name: String,
    pub ordinal_position: u32,
    pub direction: ParameterDirection,
    pub type_name: Option<String>,
}

/// Parsed rows of one category.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBatch {
    Schemata(Vec<SchemaRecord>),
    Tables(Vec<TableRecord>),
    TableColumns(Vec<ColumnRecord>),
    PrimaryKeys(Vec<PrimaryKeyRecord>),
    ForeignKeys(Vec<ForeignKeyRecord>),
    Indexes(Vec<IndexRecord>),
    TableConstraints(Vec<TableConstraintRecord>),
    Triggers(Vec<TriggerRecord>),
    Views(Vec<ViewRecord>),
    ExtTables(Vec<ExtTableRecord>),
    TableAttributes(Vec<AttributeRecord>),
    ColumnAttributes(Vec<AttributeRecord>),
    Sequences(Vec<SequenceRecord>),
    Routines(Vec<RoutineRecord>),
    RoutineColumns(Vec<RoutineColumnRecord>),
}

impl RecordBatch {
    /// Parses `rows` as records of `category`.
    ///
    /// # Errors
    /// Returns a query execution error naming the first field that is
    /// missing or malformed.
    pub fn parse(category: MetadataCategory, rows: &[MetadataRow]) -> Result<Self> {
        use MetadataCategory as C;

        fn each<T>(
            rows: &[MetadataRow],
            category: MetadataCategory,
            parse: fn(&MetadataRow, MetadataCategory) -> Result<T>,
        ) -> Result<Vec<T>> {
            rows.iter().map(|row| parse(row, category)).collect()
        }

        Ok(match category {
            C::Schemata => Self::Schemata(each(rows, category, parse_schema)?),
            C::Tables => Self::Tables(each(rows, category, parse_table)?),
            C::TableColumns => Self::TableColumns(each(rows, category, parse_column)?),
            C::PrimaryKeys => Self::PrimaryKeys(each(rows, category, parse_primary_key)?),
            C::ForeignKeys => Self::ForeignKeys(each(rows, category, parse_foreign_key)?),
            C::Indexes => Self::Indexes(each(rows, category, parse_index)?),
            C::TableConstraints => Self::TableConstraints(each(rows, category, parse_constraint)?),
            C::Triggers => Self::Triggers(each(rows, category, parse_trigger)?),
            C::Views => Self::Views(each(rows, category, parse_view)?),
            C::ExtTables => Self::ExtTables(each(rows, category, parse_ext_table)?),
            C::AdditionalTableAttributes => {
                Self::TableAttributes(each(rows, category, parse_attributes)?)
            }
            C::AdditionalColumnAttributes => {
                let records = each(rows, category, parse_attributes)?;
                if let Some(record) = records.iter().find(|r| r.column.is_none()) {
                    return Err(DbCrawlerError::parse_field(
                        "COLUMN_NAME",
                        category,
                        &format!("missing value for {}.{}", record.schema, record.table),
                    ));
                }
                Self::ColumnAttributes(records)
            }
            C::Sequences => Self::Sequences(each(rows, category, parse_sequence)?),
            C::Routines => Self::Routines(each(rows, category, parse_routine)?),
            C::RoutineColumns => Self::RoutineColumns(each(rows, category, parse_routine_column)?),
        })
    }

    /// Category the records belong to
    pub fn category(&self) -> MetadataCategory {
        match self {
            Self::Schemata(_) => MetadataCategory::Schemata,
            Self::Tables(_) => MetadataCategory::Tables,
            Self::TableColumns(_) => MetadataCategory::TableColumns,
            Self::PrimaryKeys(_) => MetadataCategory::PrimaryKeys,
            Self::ForeignKeys(_) => MetadataCategory::ForeignKeys,
            Self::Indexes(_) => MetadataCategory::Indexes,
            Self::TableConstraints(_) => MetadataCategory::TableConstraints,
            Self::Triggers(_) => MetadataCategory::Triggers,
            Self::Views(_) => MetadataCategory::Views,
            Self::ExtTables(_) => MetadataCategory::ExtTables,
            Self::TableAttributes(_) => MetadataCategory::AdditionalTableAttributes,
            Self::ColumnAttributes(_) => MetadataCategory::AdditionalColumnAttributes,
            Self::Sequences(_) => MetadataCategory::Sequences,
            Self::Routines(_) => MetadataCategory::Routines,
            Self::RoutineColumns(_) => MetadataCategory::RoutineColumns,
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        match self {
            Self::Schemata(r) => r.len(),
            Self::Tables(r) => r.len(),
            Self::TableColumns(r) => r.len(),
            Self::PrimaryKeys(r) => r.len(),
            Self::ForeignKeys(r) => r.len(),
            Self::Indexes(r) => r.len(),
            Self::TableConstraints(r) => r.len(),
            Self::Triggers(r) => r.len(),
            Self::Views(r) => r.len(),
            Self::ExtTables(r) => r.len(),
            Self::TableAttributes(r) | Self::ColumnAttributes(r) => r.len(),
            Self::Sequences(r) => r.len(),
            Self::Routines(r) => r.len(),
            Self::RoutineColumns(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_schema(row: &MetadataRow, category: MetadataCategory) -> Result<SchemaRecord> {
    let record = SchemaRecord {
        catalog: optional(row, &["TABLE_CATALOG", "TABLE_CAT", "CATALOG_NAME"]),
        schema: optional(row, &["TABLE_SCHEM", "SCHEMA_NAME"]),
    };
    if record.catalog.is_none() && record.schema.is_none() {
        return Err(DbCrawlerError::parse_field("TABLE_SCHEM", category, "missing value"));
    }
    Ok(record)
}

fn parse_table(row: &MetadataRow, category: MetadataCategory) -> Result<TableRecord> {
    Ok(TableRecord {
        schema: schema_name(row),
        name: required(row, TABLE, category)?.to_string(),
        table_type: optional(row, &["TABLE_TYPE"]).unwrap_or_else(|| "TABLE".to_string()),
        remarks: optional(row, &["REMARKS"]),
    })
}

/// Schema name, falling back to the catalog for schema-less databases.
fn schema_name(row: &MetadataRow) -> String {
    row.first(SCHEMA)
        .or_else(|| row.first(CATALOG))
        .unwrap_or_default()
        .to_string()
}

fn parse_column(row: &MetadataRow, category: MetadataCategory) -> Result<ColumnRecord> {
    let is_nullable = flag(row.get("IS_NULLABLE"))
        .or_else(|| row.get("NULLABLE").map(|code| code.trim() == "1"))
        .unwrap_or(true);
    Ok(ColumnRecord {
        schema: schema_name(row),
        table: required(row, TABLE, category)?.to_string(),
        name: required(row, COLUMN, category)?.to_string(),
        ordinal_position: number(row, &["ORDINAL_POSITION"], category)?.unwrap_or(0),
        type_name: optional(row, &["TYPE_NAME", "DATA_TYPE"]).unwrap_or_default(),
        size: number(row, &["COLUMN_SIZE", "CHARACTER_MAXIMUM_LENGTH"], category)?,
        decimal_digits: number(row, &["DECIMAL_DIGITS", "NUMERIC_SCALE"], category)?,
        is_nullable,
        default_value: optional(row, &["COLUMN_DEF", "COLUMN_DEFAULT"]),
        remarks: optional(row, &["REMARKS"]),
        is_auto_increment: flag(row.get("IS_AUTOINCREMENT")).unwrap_or(false),
    })
}

fn parse_primary_key(row: &MetadataRow, category: MetadataCategory) -> Result<PrimaryKeyRecord> {
    Ok(PrimaryKeyRecord {
        schema: schema_name(row),
        table: required(row, TABLE, category)?.to_string(),
        column: required(row, COLUMN, category)?.to_string(),
        key_sequence: number(row, &["KEY_SEQ", "ORDINAL_POSITION"], category)?.unwrap_or(1),
        name: optional(row, &["PK_NAME", "CONSTRAINT_NAME"]),
    })
}

fn parse_foreign_key(row: &MetadataRow, category: MetadataCategory) -> Result<ForeignKeyRecord> {
    let fk_table = required(row, &["FKTABLE_NAME"], category)?.to_string();
    let key_sequence = number(row, &["KEY_SEQ"], category)?.unwrap_or(1);
    let rule = |columns: &[&str]| row.first(columns).and_then(ReferentialAction::parse);
    Ok(ForeignKeyRecord {
        name: optional(row, &["FK_NAME"]).unwrap_or_else(|| format!("{}_fkey", fk_table)),
        fk_schema: optional(row, &["FKTABLE_SCHEM", "FKTABLE_CAT"]).unwrap_or_default(),
        fk_column: required(row, &["FKCOLUMN_NAME"], category)?.to_string(),
        pk_schema: optional(row, &["PKTABLE_SCHEM", "PKTABLE_CAT"]).unwrap_or_default(),
        pk_table: required(row, &["PKTABLE_NAME"], category)?.to_string(),
        pk_column: required(row, &["PKCOLUMN_NAME"], category)?.to_string(),
        fk_table,
        key_sequence,
        update_rule: rule(&["UPDATE_RULE"]),
        delete_rule: rule(&["DELETE_RULE"]),
    })
}

fn parse_index(row: &MetadataRow, category: MetadataCategory) -> Result<IndexRecord> {
    let is_unique = flag(row.get("NON_UNIQUE"))
        .map(|non_unique| !non_unique)
        .or_else(|| flag(row.get("IS_UNIQUE")))
        .unwrap_or(false);
    let sort_order = match row.get("ASC_OR_DESC").map(str::trim) {
        Some("A") | Some("ASC") => Some(SortOrder::Ascending),
        Some("D") | Some("DESC") => Some(SortOrder::Descending),
        _ => None,
    };
    Ok(IndexRecord {
        schema: schema_name(row),
        table: required(row, TABLE, category)?.to_string(),
        name: required(row, &["INDEX_NAME"], category)?.to_string(),
        is_unique,
        column: optional(row, COLUMN),
        ordinal_position: number(row, &["ORDINAL_POSITION"], category)?.unwrap_or(0),
        sort_order,
        index_type: optional(row, &["INDEX_TYPE", "TYPE"]),
    })
}

fn parse_constraint(row: &MetadataRow, category: MetadataCategory) -> Result<TableConstraintRecord> {
    Ok(TableConstraintRecord {
        schema: schema_name(row),
        table: required(row, TABLE, category)?.to_string(),
        name: required(row, &["CONSTRAINT_NAME"], category)?.to_string(),
        constraint_type: ConstraintType::parse(required(row, &["CONSTRAINT_TYPE"], category)?),
        is_deferrable: flag(row.get("IS_DEFERRABLE")).unwrap_or(false),
        initially_deferred: flag(row.get("INITIALLY_DEFERRED")).unwrap_or(false),
    })
}

fn parse_trigger(row: &MetadataRow, category: MetadataCategory) -> Result<TriggerRecord> {
    Ok(TriggerRecord {
        schema: row
            .first(&["TABLE_SCHEM", "EVENT_OBJECT_SCHEMA", "TRIGGER_SCHEM"])
            .unwrap_or_default()
            .to_string(),
        table: required(row, &["TABLE_NAME", "EVENT_OBJECT_TABLE"], category)?.to_string(),
        name: required(row, &["TRIGGER_NAME"], category)?.to_string(),
        event: row.get("EVENT_MANIPULATION").and_then(TriggerEvent::parse),
        timing: row.get("ACTION_TIMING").and_then(TriggerTiming::parse),
        orientation: optional(row, &["ACTION_ORIENTATION"]),
        action_order: number(row, &["ACTION_ORDER"], category)?,
        condition: optional(row, &["ACTION_CONDITION"]),
        statement: optional(row, &["ACTION_STATEMENT"]),
    })
}

fn parse_view(row: &MetadataRow, category: MetadataCategory) -> Result<ViewRecord> {
    Ok(ViewRecord {
        schema: schema_name(row),
        table: required(row, TABLE, category)?.to_string(),
        definition: optional(row, &["VIEW_DEFINITION"]),
        check_option: optional(row, &["CHECK_OPTION"]),
        is_updatable: flag(row.get("IS_UPDATABLE")),
    })
}

fn parse_ext_table(row: &MetadataRow, category: MetadataCategory) -> Result<ExtTableRecord> {
    Ok(ExtTableRecord {
        schema: schema_name(row),
        table: required(row, TABLE, category)?.to_string(),
        definition: optional(row, &["TABLE_DEFINITION", "DEFINITION"]),
    })
}

fn parse_attributes(row: &MetadataRow, category: MetadataCategory) -> Result<AttributeRecord> {
    const KEY_COLUMNS: &[&str] = &[
        "TABLE_CAT",
        "TABLE_CATALOG",
        "TABLE_SCHEM",
        "TABLE_SCHEMA",
        "TABLE_NAME",
        "COLUMN_NAME",
    ];
    let attributes = row
        .columns()
        .filter(|(name, _)| !KEY_COLUMNS.contains(name))
        .filter_map(|(name, value)| Some((name.to_ascii_lowercase(), value?.to_string())))
        .collect();
    Ok(AttributeRecord {
        schema: schema_name(row),
        table: required(row, TABLE, category)?.to_string(),
        column: optional(row, COLUMN),
        attributes,
    })
}

fn parse_sequence(row: &MetadataRow, category: MetadataCategory) -> Result<SequenceRecord> {
    Ok(SequenceRecord {
        schema: row
            .first(&["SEQUENCE_SCHEM", "SEQUENCE_SCHEMA"])
            .unwrap_or_default()
            .to_string(),
        name: required(row, &["SEQUENCE_NAME"], category)?.to_string(),
        increment: number(row, &["INCREMENT"], category)?,
        minimum_value: optional(row, &["MINIMUM_VALUE"]),
        maximum_value: optional(row, &["MAXIMUM_VALUE"]),
        is_cycle: flag(row.get("CYCLE_OPTION")).unwrap_or(false),
    })
}

const ROUTINE_SCHEMA: &[&str] = &["ROUTINE_SCHEM", "ROUTINE_SCHEMA", "PROCEDURE_SCHEM", "FUNCTION_SCHEM"];
const ROUTINE_NAME: &[&str] = &["ROUTINE_NAME", "PROCEDURE_NAME", "FUNCTION_NAME"];

fn parse_routine(row: &MetadataRow, category: MetadataCategory) -> Result<RoutineRecord> {
    let name = required(row, ROUTINE_NAME, category)?.to_string();
    let routine_type = match row.get("ROUTINE_TYPE").map(|t| t.trim().to_ascii_uppercase()) {
        Some(t) if t == "PROCEDURE" => RoutineType::Procedure,
        Some(t) if t == "FUNCTION" => RoutineType::Function,
        _ => RoutineType::Unknown,
    };
    Ok(RoutineRecord {
        schema: row.first(ROUTINE_SCHEMA).unwrap_or_default().to_string(),
        specific_name: optional(row, &["SPECIFIC_NAME"]).unwrap_or_else(|| name.clone()),
        name,
        routine_type,
        remarks: optional(row, &["REMARKS"]),
        definition: optional(row, &["ROUTINE_DEFINITION"]),
    })
}

fn parse_routine_column(row: &MetadataRow, category: MetadataCategory) -> Result<RoutineColumnRecord> {
    let ordinal_position = number(row, &["ORDINAL_POSITION"], category)?.unwrap_or(0);
    let specific_name = match optional(row, &["SPECIFIC_NAME"]) {
        Some(name) => name,
        None => required(row, ROUTINE_NAME, category)?.to_string(),
    };
    Ok(RoutineColumnRecord {
        schema: row.first(ROUTINE_SCHEMA).unwrap_or_default().to_string(),
        specific_name,
        // Unnamed parameters are addressed positionally
        name: optional(row, &["COLUMN_NAME", "PARAMETER_NAME"])
            .unwrap_or_else(|| format!("${}", ordinal_position)),
        ordinal_position,
        direction: row
            .first(&["COLUMN_TYPE", "PARAMETER_MODE"])
            .map(ParameterDirection::parse)
            .unwrap_or(ParameterDirection::Unknown),
        type_name: optional(row, &["TYPE_NAME", "DATA_TYPE"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_keys_are_case_insensitive() {
        let row = MetadataRow::new().with("table_name", "BOOKS");
        assert_eq!(row.get("TABLE_NAME"), Some("BOOKS"));
        assert_eq!(row.first(&["TABLE_SCHEM", "table_name"]), Some("BOOKS"));
        assert_eq!(row.get("REMARKS"), None);
    }

    #[test]
    fn test_parse_columns_with_aliases() -> Result<()> {
        let rows = vec![
            MetadataRow::new()
                .with("TABLE_SCHEM", "main")
                .with("TABLE_NAME", "BOOKS")
                .with("COLUMN_NAME", "TITLE")
                .with("ORDINAL_POSITION", "2")
                .with("TYPE_NAME", "TEXT")
                .with("NULLABLE", "0"),
            MetadataRow::new()
                .with("table_schema", "public")
                .with("table_name", "authors")
                .with("column_name", "name")
                .with("data_type", "character varying")
                .with("character_maximum_length", "120")
                .with("is_nullable", "YES"),
        ];
        let RecordBatch::TableColumns(columns) = RecordBatch::parse(MetadataCategory::TableColumns, &rows)? else {
            panic!("wrong batch");
        };
        assert_eq!(columns[0].schema, "main");
        assert!(!columns[0].is_nullable);
        assert_eq!(columns[0].ordinal_position, 2);
        assert_eq!(columns[1].schema, "public");
        assert_eq!(columns[1].size, Some(120));
        assert!(columns[1].is_nullable);
        Ok(())
    }

    #[test]
    fn test_missing_required_field() {
        let rows = vec![MetadataRow::new().with("TABLE_SCHEM", "main")];
        let error = RecordBatch::parse(MetadataCategory::Tables, &rows);
        assert!(matches!(error, Err(DbCrawlerError::QueryExecution { .. })));
    }

    #[test]
    fn test_malformed_number() {
        let rows = vec![
            MetadataRow::new()
                .with("TABLE_NAME", "BOOKS")
                .with("COLUMN_NAME", "ID")
                .with("KEY_SEQ", "first"),
        ];
        let error = RecordBatch::parse(MetadataCategory::PrimaryKeys, &rows)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(error.contains("KEY_SEQ"));
    }

    #[test]
    fn test_parse_foreign_key() -> Result<()> {
        let rows = vec![
            MetadataRow::new()
                .with("FKTABLE_SCHEM", "main")
                .with("FKTABLE_NAME", "BOOKS")
                .with("FKCOLUMN_NAME", "AUTHOR_ID")
                .with("PKTABLE_SCHEM", "main")
                .with("PKTABLE_NAME", "AUTHORS")
                .with("PKCOLUMN_NAME", "ID")
                .with("KEY_SEQ", "1")
                .with("DELETE_RULE", "CASCADE"),
        ];
        let RecordBatch::ForeignKeys(keys) = RecordBatch::parse(MetadataCategory::ForeignKeys, &rows)? else {
            panic!("wrong batch");
        };
        assert_eq!(keys[0].name, "BOOKS_fkey");
        assert_eq!(keys[0].delete_rule, Some(ReferentialAction::Cascade));
        assert_eq!(keys[0].update_rule, None);
        Ok(())
    }

    #[test]
    fn test_attribute_rows_keep_extra_columns() -> Result<()> {
        let mut row = MetadataRow::new()
            .with("TABLE_SCHEM", "public")
            .with("TABLE_NAME", "books")
            .with("OWNER", "app");
        row.insert("TABLESPACE", None);
        let batch = RecordBatch::parse(MetadataCategory::AdditionalTableAttributes, &[row])?;
        let RecordBatch::TableAttributes(records) = batch else {
            panic!("wrong batch");
        };
        assert_eq!(
            records[0].attributes,
            BTreeMap::from([("owner".to_string(), "app".to_string())])
        );

        let row = MetadataRow::new().with("TABLE_NAME", "books").with("X", "1");
        assert!(RecordBatch::parse(MetadataCategory::AdditionalColumnAttributes, &[row]).is_err());
        Ok(())
    }

    #[test]
    fn test_batch_category_and_len() -> Result<()> {
        let batch = RecordBatch::parse(MetadataCategory::Triggers, &[])?;
        assert_eq!(batch.category(), MetadataCategory::Triggers);
        assert!(batch.is_empty());
        Ok(())
    }
}
