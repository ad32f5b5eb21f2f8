//! Catalog object graph.
//!
//! The catalog owns schemas, schemas own tables, routines and sequences, and
//! tables own their columns, keys, indexes and triggers. Foreign keys are
//! the one exception: they hold [`ColumnKey`] identifiers for both ends
//! instead of owning or pointing at the participating tables, so the graph
//! stays tree-shaped and serializable.
//!
//! A [`Catalog`] is only produced by a finished crawl and has no mutating
//! API; it can be shared freely once built.

use crate::resources::Vendor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog/schema pair identifying a schema.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaKey {
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

impl SchemaKey {
    /// Creates a key from optional parts.
    pub fn new(catalog: Option<&str>, schema: Option<&str>) -> Self {
        Self {
            catalog: catalog.map(str::to_string),
            schema: schema.map(str::to_string),
        }
    }

    /// Schema name, falling back to the catalog for databases without schemas
    pub fn name(&self) -> &str {
        self.schema
            .as_deref()
            .or(self.catalog.as_deref())
            .unwrap_or_default()
    }

    /// `catalog.schema`, skipping missing parts
    pub fn full_name(&self) -> String {
        [self.catalog.as_deref(), self.schema.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl std::fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Schema plus table name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub schema: SchemaKey,
    pub name: String,
}

impl TableKey {
    /// Creates a table key.
    pub fn new(schema: SchemaKey, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    /// `schema.table`, or just the table name when there is no schema
    pub fn full_name(&self) -> String {
        let schema = self.schema.name();
        if schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", schema, self.name)
        }
    }

    /// Key of a column in this table.
    pub fn column(&self, name: impl Into<String>) -> ColumnKey {
        ColumnKey {
            table: self.clone(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Table plus column name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    pub table: TableKey,
    pub name: String,
}

impl ColumnKey {
    /// `schema.table.column`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table.full_name(), self.name)
    }
}

impl std::fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Schema plus specific (overload-unique) routine name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoutineKey {
    pub schema: SchemaKey,
    pub specific_name: String,
}

/// Database column information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ordinal_position: u32,
    pub type_name: String,
    pub size: Option<i64>,
    pub decimal_digits: Option<i32>,
    pub is_nullable: bool,
    pub is_auto_increment: bool,
    pub is_part_of_primary_key: bool,
    pub is_part_of_foreign_key: bool,
    pub default_value: Option<String>,
    pub remarks: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Primary key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Referential actions for foreign keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    /// Parses rule text (`CASCADE`, `SET NULL`, ...) or a JDBC rule code.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CASCADE" | "0" => Some(Self::Cascade),
            "RESTRICT" | "1" => Some(Self::Restrict),
            "SET NULL" | "2" => Some(Self::SetNull),
            "NO ACTION" | "3" => Some(Self::NoAction),
            "SET DEFAULT" | "4" => Some(Self::SetDefault),
            _ => None,
        }
    }
}

/// One column pair of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReference {
    pub key_sequence: u32,
    pub foreign_key_column: ColumnKey,
    pub primary_key_column: ColumnKey,
}

/// Foreign key edge between two tables.
///
/// Both ends are stored as keys; every key is guaranteed to resolve inside
/// the catalog that holds the foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub column_references: Vec<ColumnReference>,
    pub update_rule: Option<ReferentialAction>,
    pub delete_rule: Option<ReferentialAction>,
}

impl ForeignKey {
    /// Table holding the foreign key columns
    pub fn referencing_table(&self) -> Option<&TableKey> {
        self.column_references
            .first()
            .map(|r| &r.foreign_key_column.table)
    }

    /// Table holding the referenced (primary key) columns
    pub fn referenced_table(&self) -> Option<&TableKey> {
        self.column_references
            .first()
            .map(|r| &r.primary_key_column.table)
    }
}

/// Sort order for index columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Index column with ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    pub ordinal_position: u32,
    pub sort_order: Option<SortOrder>,
}

/// Database index information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub is_unique: bool,
    pub index_type: Option<String>,
    pub columns: Vec<IndexColumn>,
}

/// Types of table constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintType {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Other(String),
}

impl ConstraintType {
    /// Parses an information-schema constraint type.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "PRIMARY KEY" => Self::PrimaryKey,
            "FOREIGN KEY" => Self::ForeignKey,
            "UNIQUE" => Self::Unique,
            "CHECK" => Self::Check,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Table constraint information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConstraint {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub is_deferrable: bool,
    pub initially_deferred: bool,
}

/// Trigger events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
    Truncate,
}

impl TriggerEvent {
    /// Parses an event manipulation keyword.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            "TRUNCATE" => Some(Self::Truncate),
            _ => None,
        }
    }
}

/// Trigger timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    /// Parses an action timing keyword.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BEFORE" => Some(Self::Before),
            "AFTER" => Some(Self::After),
            "INSTEAD OF" => Some(Self::InsteadOf),
            _ => None,
        }
    }
}

/// Database trigger information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    pub events: Vec<TriggerEvent>,
    pub timing: Option<TriggerTiming>,
    pub orientation: Option<String>,
    pub action_order: Option<i32>,
    pub condition: Option<String>,
    pub statement: Option<String>,
}

/// View-specific details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewInfo {
    pub definition: Option<String>,
    pub check_option: Option<String>,
    pub is_updatable: Option<bool>,
}

/// Database table (or view) information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub key: TableKey,
    pub table_type: String,
    pub remarks: Option<String>,
    pub definition: Option<String>,
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<Index>,
    pub constraints: Vec<TableConstraint>,
    pub triggers: Vec<Trigger>,
    pub view: Option<ViewInfo>,
    pub attributes: BTreeMap<String, String>,
}

impl Table {
    /// Table name without schema
    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Finds a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Parameter direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterDirection {
    In,
    Out,
    InOut,
    Return,
    Result,
    Unknown,
}

impl ParameterDirection {
    /// Parses a parameter mode keyword or a JDBC column type code.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "IN" | "1" => Self::In,
            "INOUT" | "2" => Self::InOut,
            "OUT" | "4" => Self::Out,
            "RETURN" | "5" => Self::Return,
            "RESULT" | "3" => Self::Result,
            _ => Self::Unknown,
        }
    }
}

/// Routine parameter or result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineColumn {
    pub name: String,
    pub ordinal_position: u32,
    pub direction: ParameterDirection,
    pub type_name: Option<String>,
}

/// Kind of routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutineType {
    Procedure,
    Function,
    Unknown,
}

/// Database procedure/function information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub key: RoutineKey,
    pub name: String,
    pub routine_type: RoutineType,
    pub remarks: Option<String>,
    pub definition: Option<String>,
    pub columns: Vec<RoutineColumn>,
}

/// Database sequence information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub increment: Option<i64>,
    pub minimum_value: Option<String>,
    pub maximum_value: Option<String>,
    pub is_cycle: bool,
}

/// Schema and everything it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub key: SchemaKey,
    pub tables: Vec<Table>,
    pub routines: Vec<Routine>,
    pub sequences: Vec<Sequence>,
}

/// Product and driver identification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub product_name: String,
    pub product_version: String,
    pub driver_name: String,
    pub driver_version: String,
}

impl DatabaseInfo {
    /// Placeholder used when the product could not be identified
    pub fn unknown(driver_name: &str) -> Self {
        Self {
            product_name: "unknown".to_string(),
            product_version: "unknown".to_string(),
            driver_name: driver_name.to_string(),
            driver_version: "unknown".to_string(),
        }
    }
}

/// Crawl bookkeeping (not part of structural equality)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlInfo {
    pub vendor: Vendor,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    /// Category name to the retrieval actually used
    pub retrievals: BTreeMap<String, String>,
    pub warning_count: usize,
    pub crawler_version: String,
}

/// Complete model of one crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    database_info: DatabaseInfo,
    crawl_info: CrawlInfo,
    schemas: Vec<Schema>,
}

impl Catalog {
    pub(crate) fn new(database_info: DatabaseInfo, crawl_info: CrawlInfo, schemas: Vec<Schema>) -> Self {
        Self {
            database_info,
            crawl_info,
            schemas,
        }
    }

    /// Product and driver identification
    pub fn database_info(&self) -> &DatabaseInfo {
        &self.database_info
    }

    /// Crawl bookkeeping
    pub fn crawl_info(&self) -> &CrawlInfo {
        &self.crawl_info
    }

    /// Schemas sorted by name
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    /// Every table in every schema
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.schemas.iter().flat_map(|s| s.tables.iter())
    }

    /// Every routine in every schema
    pub fn routines(&self) -> impl Iterator<Item = &Routine> {
        self.schemas.iter().flat_map(|s| s.routines.iter())
    }

    /// Finds a schema by key.
    pub fn lookup_schema(&self, key: &SchemaKey) -> Option<&Schema> {
        self.schemas.iter().find(|s| &s.key == key)
    }

    /// Finds a table by key.
    pub fn lookup_table(&self, key: &TableKey) -> Option<&Table> {
        self.lookup_schema(&key.schema)?
            .tables
            .iter()
            .find(|t| &t.key == key)
    }

    /// Finds a column by key.
    pub fn lookup_column(&self, key: &ColumnKey) -> Option<&Column> {
        self.lookup_table(&key.table)?.column(&key.name)
    }

    /// Every foreign key edge, each reported once (on its referencing table).
    pub fn foreign_keys(&self) -> Vec<&ForeignKey> {
        self.tables().flat_map(|t| t.foreign_keys.iter()).collect()
    }

    /// Foreign keys whose referenced (primary key) side is `table`.
    pub fn exported_foreign_keys(&self, table: &TableKey) -> Vec<&ForeignKey> {
        self.tables()
            .flat_map(|t| t.foreign_keys.iter())
            .filter(|fk| fk.referenced_table() == Some(table))
            .collect()
    }

    /// Describes every cross-reference that does not resolve in this catalog.
    ///
    /// Always empty for a catalog produced by a crawl.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut dangling = Vec::new();
        for table in self.tables() {
            for fk in &table.foreign_keys {
                for reference in &fk.column_references {
                    for column in [&reference.foreign_key_column, &reference.primary_key_column] {
                        if self.lookup_column(column).is_none() {
                            dangling.push(format!("{} -> {}", fk.name, column));
                        }
                    }
                }
            }
            if let Some(pk) = &table.primary_key {
                for column in &pk.columns {
                    if table.column(column).is_none() {
                        dangling.push(format!("primary key of {} -> {}", table.key, column));
                    }
                }
            }
        }
        dangling
    }

    /// Equality ignoring crawl bookkeeping such as timestamps.
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self.database_info == other.database_info && self.schemas == other.schemas
    }
}
