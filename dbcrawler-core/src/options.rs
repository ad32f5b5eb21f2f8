//! Crawl options: what to retrieve and what to keep.

use crate::rules::{GrepRule, InclusionRule};
use crate::{Result, error::DbCrawlerError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for concurrent metadata statements.
pub const MAX_CONCURRENT_QUERIES: usize = 50;

/// Options for one crawl.
///
/// Built with consuming `with_*` methods and immutable once handed to the
/// crawler.
///
/// # Example
/// ```rust
/// use dbcrawler_core::{CrawlOptions, InclusionRule};
///
/// let options = CrawlOptions::new()
///     .with_table_rule(InclusionRule::exclude_only("AUTHORS")?)
///     .with_sort_columns(true)
///     .with_max_concurrent_queries(8)?;
///
/// assert!(options.validate().is_ok());
/// # Ok::<(), dbcrawler_core::DbCrawlerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Table types to retrieve; empty means every type
    pub table_types: Vec<String>,
    /// Schema rule; `None` uses the vendor default
    pub schema_rule: Option<InclusionRule>,
    pub table_rule: InclusionRule,
    pub column_rule: InclusionRule,
    pub routine_rule: InclusionRule,
    pub routine_column_rule: InclusionRule,
    /// Keep tables having a column whose `schema.table.column` matches
    pub grep_columns: Option<GrepRule>,
    /// Keep routines having a parameter whose `schema.routine.parameter` matches
    pub grep_routine_columns: Option<GrepRule>,
    pub include_tables_without_matching_columns: bool,
    pub sort_columns: bool,
    pub sort_routine_columns: bool,
    pub show_stored_procedures: bool,
    pub max_concurrent_queries: usize,
    /// Directory of `<CATEGORY>.sql` overrides
    pub resource_dir: Option<PathBuf>,
    /// Overall crawl deadline
    pub timeout: Option<Duration>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            table_types: vec!["TABLE".to_string(), "VIEW".to_string()],
            schema_rule: None,
            table_rule: InclusionRule::default(),
            column_rule: InclusionRule::default(),
            routine_rule: InclusionRule::default(),
            routine_column_rule: InclusionRule::default(),
            grep_columns: None,
            grep_routine_columns: None,
            include_tables_without_matching_columns: false,
            sort_columns: false,
            sort_routine_columns: false,
            show_stored_procedures: true,
            max_concurrent_queries: 4,
            resource_dir: None,
            timeout: None,
        }
    }
}

impl CrawlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schema_rule(mut self, rule: InclusionRule) -> Self {
        self.schema_rule = Some(rule);
        self
    }

    pub fn with_table_rule(mut self, rule: InclusionRule) -> Self {
        self.table_rule = rule;
        self
    }

    pub fn with_column_rule(mut self, rule: InclusionRule) -> Self {
        self.column_rule = rule;
        self
    }

    pub fn with_routine_rule(mut self, rule: InclusionRule) -> Self {
        self.routine_rule = rule;
        self
    }

    pub fn with_routine_column_rule(mut self, rule: InclusionRule) -> Self {
        self.routine_column_rule = rule;
        self
    }

    pub fn with_grep_columns(mut self, rule: GrepRule) -> Self {
        self.grep_columns = Some(rule);
        self
    }

    pub fn with_grep_routine_columns(mut self, rule: GrepRule) -> Self {
        self.grep_routine_columns = Some(rule);
        self
    }

    pub fn with_include_tables_without_matching_columns(mut self, include: bool) -> Self {
        self.include_tables_without_matching_columns = include;
        self
    }

    pub fn with_sort_columns(mut self, sort: bool) -> Self {
        self.sort_columns = sort;
        self
    }

    pub fn with_sort_routine_columns(mut self, sort: bool) -> Self {
        self.sort_routine_columns = sort;
        self
    }

    pub fn with_show_stored_procedures(mut self, show: bool) -> Self {
        self.show_stored_procedures = show;
        self
    }

    /// Sets the worker limit.
    ///
    /// # Errors
    /// Returns a configuration error outside `1..=50`.
    pub fn with_max_concurrent_queries(mut self, max: usize) -> Result<Self> {
        self.max_concurrent_queries = max;
        self.validate()?;
        Ok(self)
    }

    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validates option values.
    ///
    /// Patterns are compiled when rules are built, so only the numeric
    /// limits remain to check here.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_queries == 0 {
            return Err(DbCrawlerError::config(
                "max_concurrent_queries must be greater than 0",
            ));
        }

        if self.max_concurrent_queries > MAX_CONCURRENT_QUERIES {
            return Err(DbCrawlerError::config(format!(
                "max_concurrent_queries should not exceed {}",
                MAX_CONCURRENT_QUERIES
            )));
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(DbCrawlerError::config("crawl timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Builds options from resolved `crawl.*` properties with the prefix
    /// stripped (see [`crate::PropertyBag::section`]).
    ///
    /// Recognized keys: `tables`, `exclude_tables`, `schemas`,
    /// `exclude_schemas`, `columns`, `exclude_columns`, `routines`,
    /// `exclude_routines`, `routine_columns`, `exclude_routine_columns`,
    /// `grep_columns`, `grep_routine_columns`, `invert_match`,
    /// `table_types`, `sort_columns`, `sort_routine_columns`,
    /// `show_stored_procedures`, `include_tables_without_matching_columns`,
    /// `max_concurrent_queries`, `resource_dir` and `timeout_secs`.
    pub fn from_properties(properties: &BTreeMap<String, String>) -> Result<Self> {
        let get = |key: &str| properties.get(key).map(String::as_str);
        let rule = |include: &str, exclude: &str| -> Result<Option<InclusionRule>> {
            match (get(include), get(exclude)) {
                (None, None) => Ok(None),
                (inc, exc) => InclusionRule::new(
                    inc.unwrap_or(InclusionRule::ALL),
                    exc.unwrap_or(InclusionRule::NONE),
                )
                .map(Some),
            }
        };
        let boolean = |key: &str| -> Result<Option<bool>> {
            get(key)
                .map(|v| {
                    v.trim().parse::<bool>().map_err(|_| {
                        DbCrawlerError::config(format!("crawl.{} must be true or false, got '{}'", key, v))
                    })
                })
                .transpose()
        };
        let integer = |key: &str| -> Result<Option<u64>> {
            get(key)
                .map(|v| {
                    v.trim().parse::<u64>().map_err(|_| {
                        DbCrawlerError::config(format!("crawl.{} must be a number, got '{}'", key, v))
                    })
                })
                .transpose()
        };

        let mut options = Self::new();

        if let Some(types) = get("table_types") {
            options = options.with_table_types(
                types
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty()),
            );
        }
        if let Some(schema_rule) = rule("schemas", "exclude_schemas")? {
            options = options.with_schema_rule(schema_rule);
        }
        if let Some(table_rule) = rule("tables", "exclude_tables")? {
            options.table_rule = table_rule;
        }
        if let Some(column_rule) = rule("columns", "exclude_columns")? {
            options.column_rule = column_rule;
        }
        if let Some(routine_rule) = rule("routines", "exclude_routines")? {
            options.routine_rule = routine_rule;
        }
        if let Some(routine_column_rule) = rule("routine_columns", "exclude_routine_columns")? {
            options.routine_column_rule = routine_column_rule;
        }

        let invert = boolean("invert_match")?.unwrap_or(false);
        if let Some(pattern) = get("grep_columns") {
            options.grep_columns = Some(GrepRule::new(pattern, invert)?);
        }
        if let Some(pattern) = get("grep_routine_columns") {
            options.grep_routine_columns = Some(GrepRule::new(pattern, invert)?);
        }

        if let Some(v) = boolean("include_tables_without_matching_columns")? {
            options.include_tables_without_matching_columns = v;
        }
        if let Some(v) = boolean("sort_columns")? {
            options.sort_columns = v;
        }
        if let Some(v) = boolean("sort_routine_columns")? {
            options.sort_routine_columns = v;
        }
        if let Some(v) = boolean("show_stored_procedures")? {
            options.show_stored_procedures = v;
        }
        if let Some(v) = integer("max_concurrent_queries")? {
            options.max_concurrent_queries = usize::try_from(v).unwrap_or(usize::MAX);
        }
        if let Some(dir) = get("resource_dir") {
            options.resource_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = integer("timeout_secs")? {
            options.timeout = Some(Duration::from_secs(secs));
        }

        options.validate()?;
        Ok(options)
    }

    /// Whether `table_type` passes the table-type filter.
    pub fn accepts_table_type(&self, table_type: &str) -> bool {
        self.table_types.is_empty()
            || self
                .table_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(table_type))
    }
}
