//! Vendor SQL resource packs and the per-crawl retrieval plan.
//!
//! Resources are layered: the generic pack, then the vendor pack, then a
//! user directory. The first layer that names `<CATEGORY>.sql` wins. A
//! resource that is blank or holds only comments disables the category for
//! that vendor.
//!
//! The plan is resolved once at crawl start into a table indexed by
//! [`MetadataCategory`]; nothing is looked up by name afterwards.

use crate::registry::{MetadataCategory, MetadataSourceRegistry, SourceKind};
use crate::rules::InclusionRule;
use crate::{Result, error::DbCrawlerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Database product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Vendor {
    /// Any product without its own pack; uses `INFORMATION_SCHEMA`
    Generic,
    /// PostgreSQL and compatible servers
    PostgreSql,
    /// SQLite database files
    Sqlite,
}

/// Schemas PostgreSQL keeps for itself
const POSTGRES_SYSTEM_SCHEMAS: &str = r"pg_catalog|information_schema|pg_toast|pg_(toast_)?temp_\d+";

impl Vendor {
    /// Every vendor with an embedded pack
    pub const ALL: [Self; 3] = [Self::Generic, Self::PostgreSql, Self::Sqlite];

    /// Picks the vendor from a reported product name.
    pub fn detect(product_name: &str) -> Self {
        let product = product_name.to_ascii_lowercase();
        if product.contains("postgres") {
            Self::PostgreSql
        } else if product.contains("sqlite") {
            Self::Sqlite
        } else {
            Self::Generic
        }
    }

    /// Guesses the vendor from a connection URL before connecting.
    pub fn from_url(url: &str) -> Self {
        let url = url.trim().to_ascii_lowercase();
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Self::PostgreSql
        } else if url.starts_with("sqlite:")
            || [".db", ".sqlite", ".sqlite3"].iter().any(|ext| url.ends_with(ext))
        {
            Self::Sqlite
        } else {
            Self::Generic
        }
    }

    /// Property defaults shipped with the vendor pack, as TOML.
    pub fn default_properties(self) -> Option<&'static str> {
        match self {
            Self::Generic => None,
            Self::PostgreSql => Some(include_str!("../sql/postgresql/vendor.toml")),
            Self::Sqlite => Some(include_str!("../sql/sqlite/vendor.toml")),
        }
    }

    /// Lowercase name, also the resource pack directory
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::PostgreSql => "postgresql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Schema rule used when the caller leaves the schema rule at its default.
    pub fn default_schema_rule(self) -> Result<InclusionRule> {
        match self {
            Self::PostgreSql => InclusionRule::exclude_only(POSTGRES_SYSTEM_SCHEMAS),
            Self::Generic | Self::Sqlite => Ok(InclusionRule::default()),
        }
    }

    fn embedded_pack(self) -> &'static [(MetadataCategory, &'static str)] {
        use MetadataCategory::*;
        match self {
            Self::Generic => &[
                (TableConstraints, include_str!("../sql/generic/TABLE_CONSTRAINTS.sql")),
                (Triggers, include_str!("../sql/generic/TRIGGERS.sql")),
                (Views, include_str!("../sql/generic/VIEWS.sql")),
                (Sequences, include_str!("../sql/generic/SEQUENCES.sql")),
            ],
            Self::PostgreSql => &[
                (ExtTables, include_str!("../sql/postgresql/EXT_TABLES.sql")),
                (
                    AdditionalTableAttributes,
                    include_str!("../sql/postgresql/ADDITIONAL_TABLE_ATTRIBUTES.sql"),
                ),
                (
                    AdditionalColumnAttributes,
                    include_str!("../sql/postgresql/ADDITIONAL_COLUMN_ATTRIBUTES.sql"),
                ),
            ],
            Self::Sqlite => &[
                (TableConstraints, include_str!("../sql/sqlite/TABLE_CONSTRAINTS.sql")),
                (Triggers, include_str!("../sql/sqlite/TRIGGERS.sql")),
                (Views, include_str!("../sql/sqlite/VIEWS.sql")),
                (ExtTables, include_str!("../sql/sqlite/EXT_TABLES.sql")),
                (
                    AdditionalTableAttributes,
                    include_str!("../sql/sqlite/ADDITIONAL_TABLE_ATTRIBUTES.sql"),
                ),
                (Sequences, include_str!("../sql/sqlite/SEQUENCES.sql")),
            ],
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which layer supplied a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceOrigin {
    /// Embedded generic pack
    Generic,
    /// Embedded pack of the detected vendor
    Vendor,
    /// User resource directory or a resource set in code
    User,
}

impl ResourceOrigin {
    /// Vendor and user resources replace the default retrieval; their
    /// failures are fatal.
    pub fn is_override(self) -> bool {
        matches!(self, Self::Vendor | Self::User)
    }
}

impl std::fmt::Display for ResourceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Vendor => write!(f, "vendor"),
            Self::User => write!(f, "user"),
        }
    }
}

/// True when `sql` holds nothing but whitespace and `--` comments.
pub fn is_blank(sql: &str) -> bool {
    sql.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Layered SQL resources: embedded packs plus user overrides.
#[derive(Debug, Clone, Default)]
pub struct SqlResources {
    user: BTreeMap<MetadataCategory, String>,
}

impl SqlResources {
    /// Embedded packs only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user resource.
    pub fn with_user_resource(mut self, category: MetadataCategory, sql: impl Into<String>) -> Self {
        self.user.insert(category, sql.into());
        self
    }

    /// Loads every `<CATEGORY>.sql` file in `dir` as a user resource.
    ///
    /// Files that do not name a known category are ignored.
    pub fn load_user_dir(mut self, dir: &Path, registry: &MetadataSourceRegistry) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| DbCrawlerError::Io {
            context: format!("Failed to read resource directory {}", dir.display()),
            source: e,
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| DbCrawlerError::Io {
                    context: format!("Failed to read resource directory {}", dir.display()),
                    source: e,
                })?
                .path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(source) = registry.by_resource_name(file_name) else {
                tracing::debug!("Ignoring unrecognized resource file {}", path.display());
                continue;
            };
            let sql = std::fs::read_to_string(&path).map_err(|e| DbCrawlerError::Io {
                context: format!("Failed to read resource {}", path.display()),
                source: e,
            })?;
            tracing::debug!("Loaded user resource {} for {}", file_name, source.category);
            self.user.insert(source.category, sql);
        }

        Ok(self)
    }

    /// Finds the winning resource for `category`: user, then vendor, then generic.
    pub fn lookup(&self, vendor: Vendor, category: MetadataCategory) -> Option<(ResourceOrigin, &str)> {
        if let Some(sql) = self.user.get(&category) {
            return Some((ResourceOrigin::User, sql.as_str()));
        }
        let embedded = |v: Vendor| {
            v.embedded_pack()
                .iter()
                .find(|(c, _)| *c == category)
                .map(|(_, sql)| *sql)
        };
        if vendor != Vendor::Generic
            && let Some(sql) = embedded(vendor)
        {
            return Some((ResourceOrigin::Vendor, sql));
        }
        embedded(Vendor::Generic).map(|sql| (ResourceOrigin::Generic, sql))
    }
}

/// How one category is retrieved in this crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Standard driver metadata call
    DriverCall,
    /// SQL resource executed against the connection
    Query { sql: String, origin: ResourceOrigin },
    /// Nothing to run
    Skip { reason: String },
}

/// Plan entry for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRetrieval {
    /// Category being retrieved
    pub category: MetadataCategory,
    /// Registry lookup key, used in logs and errors
    pub lookup_key: String,
    /// How the category is retrieved in this crawl
    pub retrieval: Retrieval,
}

impl PlannedRetrieval {
    /// Short description recorded in crawl info
    pub fn describe(&self) -> String {
        match &self.retrieval {
            Retrieval::DriverCall => format!("{} (driver)", self.lookup_key),
            Retrieval::Query { origin, .. } => {
                format!("{} ({} {})", self.lookup_key, origin, self.category.resource_name())
            }
            Retrieval::Skip { .. } => format!("{} (skipped)", self.lookup_key),
        }
    }
}

/// Per-category retrieval decisions for one vendor.
#[derive(Debug, Clone)]
pub struct RetrievalPlan {
    vendor: Vendor,
    entries: Vec<PlannedRetrieval>,
}

impl RetrievalPlan {
    /// Resolves every registry entry against the resource layers.
    pub fn resolve(registry: &MetadataSourceRegistry, resources: &SqlResources, vendor: Vendor) -> Self {
        let entries = registry
            .iter()
            .map(|source| {
                let retrieval = match resources.lookup(vendor, source.category) {
                    Some((origin, sql)) if is_blank(sql) => Retrieval::Skip {
                        reason: format!("{} resource {} is disabled", origin, source.resource_name),
                    },
                    Some((origin, sql)) => Retrieval::Query {
                        sql: sql.to_string(),
                        origin,
                    },
                    None if source.source_kind == SourceKind::NativeDriverCall => Retrieval::DriverCall,
                    None => Retrieval::Skip {
                        reason: format!("no resource {} for {}", source.resource_name, vendor),
                    },
                };
                PlannedRetrieval {
                    category: source.category,
                    lookup_key: source.lookup_key.clone(),
                    retrieval,
                }
            })
            .collect();

        let plan = Self { vendor, entries };
        for entry in &plan.entries {
            tracing::debug!("Plan: {}", entry.describe());
        }
        plan
    }

    /// Vendor the plan was resolved for
    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    /// Plan entry for `category`.
    pub fn get(&self, category: MetadataCategory) -> &PlannedRetrieval {
        &self.entries[category as usize]
    }

    /// Category name to retrieval description.
    pub fn describe(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.category.name().to_string(), e.describe()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_detection() {
        assert_eq!(Vendor::detect("PostgreSQL"), Vendor::PostgreSql);
        assert_eq!(Vendor::detect("SQLite"), Vendor::Sqlite);
        assert_eq!(Vendor::detect("Apache Derby"), Vendor::Generic);
        assert_eq!(Vendor::Sqlite.to_string(), "sqlite");
    }

    #[test]
    fn test_postgres_default_schema_rule() -> Result<()> {
        let rule = Vendor::PostgreSql.default_schema_rule()?;
        assert!(rule.matches("public"));
        assert!(!rule.matches("pg_catalog"));
        assert!(!rule.matches("pg_toast"));
        assert!(!rule.matches("pg_temp_3"));
        assert!(!rule.matches("pg_toast_temp_12"));
        assert!(rule.matches("pg_temporary_reports"));
        assert!(!rule.matches("information_schema"));
        assert!(Vendor::Sqlite.default_schema_rule()?.is_default());
        Ok(())
    }

    #[test]
    fn test_vendor_from_url() {
        assert_eq!(Vendor::from_url("postgresql://localhost/app"), Vendor::PostgreSql);
        assert_eq!(Vendor::from_url("POSTGRES://localhost/app"), Vendor::PostgreSql);
        assert_eq!(Vendor::from_url("sqlite::memory:"), Vendor::Sqlite);
        assert_eq!(Vendor::from_url("/var/data/library.sqlite3"), Vendor::Sqlite);
        assert_eq!(Vendor::from_url("oracle://localhost/xe"), Vendor::Generic);
        assert!(Vendor::Generic.default_properties().is_none());
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("  \n-- disabled\n   -- really\n"));
        assert!(!is_blank("-- comment\nSELECT 1"));
    }

    #[test]
    fn test_lookup_layers() {
        let resources = SqlResources::new();
        let (origin, _) = resources
            .lookup(Vendor::PostgreSql, MetadataCategory::Triggers)
            .unwrap_or((ResourceOrigin::User, ""));
        assert_eq!(origin, ResourceOrigin::Generic);

        let (origin, _) = resources
            .lookup(Vendor::Sqlite, MetadataCategory::Triggers)
            .unwrap_or((ResourceOrigin::User, ""));
        assert_eq!(origin, ResourceOrigin::Vendor);

        let resources = resources.with_user_resource(MetadataCategory::Triggers, "SELECT 1");
        assert_eq!(
            resources.lookup(Vendor::Sqlite, MetadataCategory::Triggers),
            Some((ResourceOrigin::User, "SELECT 1"))
        );
        assert!(resources.lookup(Vendor::Generic, MetadataCategory::ExtTables).is_none());
    }

    #[test]
    fn test_plan_resolution() {
        let registry = MetadataSourceRegistry::new();
        let plan = RetrievalPlan::resolve(&registry, &SqlResources::new(), Vendor::Sqlite);

        assert_eq!(plan.vendor(), Vendor::Sqlite);
        assert_eq!(plan.get(MetadataCategory::Tables).retrieval, Retrieval::DriverCall);
        assert!(matches!(
            plan.get(MetadataCategory::Triggers).retrieval,
            Retrieval::Query {
                origin: ResourceOrigin::Vendor,
                ..
            }
        ));
        // Blank vendor resource disables the category
        assert!(matches!(
            plan.get(MetadataCategory::Sequences).retrieval,
            Retrieval::Skip { .. }
        ));
        // No resource anywhere
        assert!(matches!(
            plan.get(MetadataCategory::AdditionalColumnAttributes).retrieval,
            Retrieval::Skip { .. }
        ));
        assert_eq!(
            plan.describe().get("TABLES").map(String::as_str),
            Some("native.TABLES (driver)")
        );
    }

    #[test]
    fn test_user_resource_overrides_native_call() {
        let registry = MetadataSourceRegistry::new();
        let resources =
            SqlResources::new().with_user_resource(MetadataCategory::Indexes, "SELECT 1");
        let plan = RetrievalPlan::resolve(&registry, &resources, Vendor::Generic);
        assert!(matches!(
            plan.get(MetadataCategory::Indexes).retrieval,
            Retrieval::Query {
                origin: ResourceOrigin::User,
                ..
            }
        ));
    }

    #[test]
    fn test_load_user_dir() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| DbCrawlerError::Io {
            context: "tempdir".to_string(),
            source: e,
        })?;
        std::fs::write(dir.path().join("VIEWS.sql"), "SELECT 2").map_err(|e| DbCrawlerError::Io {
            context: "write".to_string(),
            source: e,
        })?;
        std::fs::write(dir.path().join("README.txt"), "ignored").map_err(|e| DbCrawlerError::Io {
            context: "write".to_string(),
            source: e,
        })?;

        let resources = SqlResources::new().load_user_dir(dir.path(), &MetadataSourceRegistry::new())?;
        assert_eq!(
            resources.lookup(Vendor::Generic, MetadataCategory::Views),
            Some((ResourceOrigin::User, "SELECT 2"))
        );
        Ok(())
    }
}
