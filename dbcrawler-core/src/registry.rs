//! Metadata source registry.
//!
//! A fixed table mapping each [`MetadataCategory`] to its retrieval strategy
//! ([`SourceKind`]), its stable lookup key (`<sourcekind>.<CATEGORY>`) and the
//! name of the SQL resource that can supply or override it
//! (`<CATEGORY>.sql`). The registry is an ordinary value built by the caller
//! and passed into the crawl; there is no process-wide state.

use serde::{Deserialize, Serialize};

/// How a category is normally retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Standard driver metadata call
    NativeDriverCall,
    /// Vendor or information-schema SQL supplementing the driver
    VendorExtensionQuery,
    /// Optional free-form attributes
    AdditionalInfoQuery,
}

impl SourceKind {
    /// Stable string form used in lookup keys
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NativeDriverCall => "native",
            Self::VendorExtensionQuery => "vendor_extension",
            Self::AdditionalInfoQuery => "additional_info",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity the retrieved data attaches to.
///
/// ```rust
/// use dbcrawler_core::registry::{CategoryScope, MetadataCategory};
///
/// assert_eq!(MetadataCategory::Schemata.scope(), CategoryScope::Catalog);
/// assert_eq!(MetadataCategory::Routines.scope(), CategoryScope::Schema);
/// assert_eq!(MetadataCategory::Triggers.scope(), CategoryScope::Table);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryScope {
    /// Whole database, retrieved once
    Catalog,
    /// Retrieved per retained schema
    Schema,
    /// Retrieved per retained table
    Table,
}

/// Metadata categories in dependency order.
///
/// The declaration order is the merge order: schemas before tables, tables
/// before everything attached to them, routines last.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MetadataCategory {
    /// Catalogs and schemas
    Schemata,
    /// Tables and views
    Tables,
    /// Columns of each table
    TableColumns,
    /// Primary key columns
    PrimaryKeys,
    /// Imported foreign keys
    ForeignKeys,
    /// Index columns
    Indexes,
    /// Check and unique constraints
    TableConstraints,
    /// Trigger definitions
    Triggers,
    /// View definitions
    Views,
    /// Table DDL and other extended table details
    ExtTables,
    /// Vendor-specific table attributes
    AdditionalTableAttributes,
    /// Vendor-specific column attributes
    AdditionalColumnAttributes,
    /// Sequences of each schema
    Sequences,
    /// Procedures and functions
    Routines,
    /// Routine parameters and result columns
    RoutineColumns,
}

impl MetadataCategory {
    /// Every category, in dependency order
    pub const ALL: [Self; 15] = [
        Self::Schemata,
        Self::Tables,
        Self::TableColumns,
        Self::PrimaryKeys,
        Self::ForeignKeys,
        Self::Indexes,
        Self::TableConstraints,
        Self::Triggers,
        Self::Views,
        Self::ExtTables,
        Self::AdditionalTableAttributes,
        Self::AdditionalColumnAttributes,
        Self::Sequences,
        Self::Routines,
        Self::RoutineColumns,
    ];

    /// Upper-case name used in lookup keys and resource file names
    pub const fn name(self) -> &'static str {
        match self {
            Self::Schemata => "SCHEMATA",
            Self::Tables => "TABLES",
            Self::TableColumns => "TABLE_COLUMNS",
            Self::PrimaryKeys => "PRIMARY_KEYS",
            Self::ForeignKeys => "FOREIGN_KEYS",
            Self::Indexes => "INDEXES",
            Self::TableConstraints => "TABLE_CONSTRAINTS",
            Self::Triggers => "TRIGGERS",
            Self::Views => "VIEWS",
            Self::ExtTables => "EXT_TABLES",
            Self::AdditionalTableAttributes => "ADDITIONAL_TABLE_ATTRIBUTES",
            Self::AdditionalColumnAttributes => "ADDITIONAL_COLUMN_ATTRIBUTES",
            Self::Sequences => "SEQUENCES",
            Self::Routines => "ROUTINES",
            Self::RoutineColumns => "ROUTINE_COLUMNS",
        }
    }

    /// Inverse of [`MetadataCategory::name`]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name().eq_ignore_ascii_case(name))
    }

    /// Default retrieval strategy
    pub const fn source_kind(self) -> SourceKind {
        match self {
            Self::Schemata
            | Self::Tables
            | Self::TableColumns
            | Self::PrimaryKeys
            | Self::ForeignKeys
            | Self::Indexes
            | Self::Routines
            | Self::RoutineColumns => SourceKind::NativeDriverCall,
            Self::TableConstraints
            | Self::Triggers
            | Self::Views
            | Self::ExtTables
            | Self::Sequences => SourceKind::VendorExtensionQuery,
            Self::AdditionalTableAttributes | Self::AdditionalColumnAttributes => {
                SourceKind::AdditionalInfoQuery
            }
        }
    }

    /// Granularity of the data
    pub const fn scope(self) -> CategoryScope {
        match self {
            Self::Schemata => CategoryScope::Catalog,
            Self::Tables | Self::Sequences | Self::Routines | Self::RoutineColumns => {
                CategoryScope::Schema
            }
            Self::TableColumns
            | Self::PrimaryKeys
            | Self::ForeignKeys
            | Self::Indexes
            | Self::TableConstraints
            | Self::Triggers
            | Self::Views
            | Self::ExtTables
            | Self::AdditionalTableAttributes
            | Self::AdditionalColumnAttributes => CategoryScope::Table,
        }
    }

    /// Failure of a required category aborts the crawl
    pub const fn is_required(self) -> bool {
        matches!(self, Self::Schemata | Self::Tables)
    }

    /// Whether this category belongs to the routine phase
    pub const fn is_routine(self) -> bool {
        matches!(self, Self::Routines | Self::RoutineColumns)
    }

    /// `<sourcekind>.<CATEGORY>`
    pub fn lookup_key(self) -> String {
        format!("{}.{}", self.source_kind().as_str(), self.name())
    }

    /// `<CATEGORY>.sql`
    pub fn resource_name(self) -> String {
        format!("{}.sql", self.name())
    }
}

impl std::fmt::Display for MetadataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Category this row describes
    pub category: MetadataCategory,
    /// Native driver call or SQL resource
    pub source_kind: SourceKind,
    /// Key shown in logs and errors, such as `native.TABLES`
    pub lookup_key: String,
    /// Resource file looked up in the packs, such as `TABLES.sql`
    pub resource_name: String,
}

/// Lookup table from category to its retrieval strategy.
#[derive(Debug, Clone)]
pub struct MetadataSourceRegistry {
    entries: Vec<SourceEntry>,
}

impl Default for MetadataSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSourceRegistry {
    /// Builds the registry for every known category.
    pub fn new() -> Self {
        let entries = MetadataCategory::ALL
            .into_iter()
            .map(|category| SourceEntry {
                category,
                source_kind: category.source_kind(),
                lookup_key: category.lookup_key(),
                resource_name: category.resource_name(),
            })
            .collect();
        Self { entries }
    }

    /// Registry row for `category`.
    ///
    /// Every category has a row; the enum is exhaustive, so there is no
    /// runtime miss to handle.
    pub fn entry(&self, category: MetadataCategory) -> &SourceEntry {
        &self.entries[category as usize]
    }

    /// Finds a category by lookup key (`native.TABLES`).
    pub fn by_lookup_key(&self, lookup_key: &str) -> Option<&SourceEntry> {
        self.entries.iter().find(|e| e.lookup_key == lookup_key)
    }

    /// Finds a category by resource file name (`TABLES.sql`).
    pub fn by_resource_name(&self, resource_name: &str) -> Option<&SourceEntry> {
        self.entries
            .iter()
            .find(|e| e.resource_name.eq_ignore_ascii_case(resource_name))
    }

    /// All rows in dependency order
    pub fn iter(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries.iter()
    }
}
