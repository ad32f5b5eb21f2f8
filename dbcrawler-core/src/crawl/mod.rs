//! Crawl orchestration.
//!
//! A crawl moves through [`CrawlState`] in order:
//!
//! 1. Schemas are retrieved and filtered.
//! 2. Tables of the retained schemas are retrieved and filtered.
//! 3. Every table-level and schema-level detail category is retrieved.
//! 4. Routines are retrieved when `show_stored_procedures` is set.
//! 5. All batches are merged and cross-references resolved.
//!
//! Steps 1 and 2 are merged before anything depending on them starts.
//! Within a phase, retrieval jobs run on a bounded worker pool; each job
//! returns an immutable batch and a single consumer merges them, so the
//! catalog under construction is never shared.
//!
//! # Failure policy
//! - Schemas and tables are required: any failure aborts the crawl.
//! - A vendor or user resource that fails to run or parse aborts the crawl.
//! - A failing generic resource or optional driver call degrades to an
//!   empty category plus a [`CrawlWarning::CategoryUnsupported`].
//! - Disabled and absent resources are skipped silently.

mod builder;

use crate::adapters::MetadataConnection;
use crate::error::CrawlWarning;
use crate::models::{Catalog, CrawlInfo, DatabaseInfo, Schema};
use crate::options::CrawlOptions;
use crate::records::{MetadataRow, RecordBatch};
use crate::registry::{CategoryScope, MetadataCategory, MetadataSourceRegistry};
use crate::resolver::ResolvedConnection;
use crate::resources::{ResourceOrigin, Retrieval, RetrievalPlan, SqlResources, Vendor};
use crate::rules::InclusionRule;
use crate::template::{expand_template, extract_unresolved_variables};
use crate::{Result, error::DbCrawlerError};
use builder::CatalogBuilder;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Crawl progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlState {
    Init,
    ConnectionOpen,
    RetrievingSchemas,
    RetrievingTables,
    RetrievingColumnsAndKeys,
    RetrievingRoutines,
    Merging,
    Done,
    Failed,
}

impl std::fmt::Display for CrawlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Init => "initializing",
            Self::ConnectionOpen => "connection open",
            Self::RetrievingSchemas => "retrieving schemas",
            Self::RetrievingTables => "retrieving tables",
            Self::RetrievingColumnsAndKeys => "retrieving columns and keys",
            Self::RetrievingRoutines => "retrieving routines",
            Self::Merging => "merging",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Cancellation token plus optional deadline.
///
/// Statements already running are allowed to finish; no new retrieval
/// starts once the token fires or the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct CrawlControl {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CrawlControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an existing token, e.g. one shared with a signal handler.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Handle for cancelling from elsewhere
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Result of a successful crawl.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub catalog: Catalog,
    /// Non-fatal conditions, in the order they were recorded
    pub warnings: Vec<CrawlWarning>,
    pub state: CrawlState,
}

impl CrawlOutcome {
    /// True when some category degraded or an edge was dropped
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Runs crawls against open connections.
///
/// # Example
/// ```rust,no_run
/// use dbcrawler_core::{ConnectionConfig, ConnectionSpec, CrawlOptions, Crawler, Credentials, DriverRegistry, resolve};
///
/// # async fn example() -> dbcrawler_core::Result<()> {
/// let crawler = Crawler::new(CrawlOptions::new().with_sort_columns(true))?;
/// let mut credentials = Credentials::new("reader".to_string(), None);
/// let connection = resolve(
///     &ConnectionSpec::new("sqlite:///var/lib/app.db"),
///     &mut credentials,
///     &DriverRegistry::with_default_drivers(),
///     &ConnectionConfig::default(),
/// )
/// .await?;
///
/// let outcome = crawler.crawl(&connection).await?;
/// println!("{} tables", outcome.catalog.tables().count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Crawler {
    registry: MetadataSourceRegistry,
    resources: SqlResources,
    options: CrawlOptions,
    control: CrawlControl,
}

impl Crawler {
    /// Validates `options` and loads the resource directory, if any.
    ///
    /// # Errors
    /// `Config` for invalid options, `Io` if the resource directory cannot
    /// be read. Both are raised before any connection is used.
    pub fn new(options: CrawlOptions) -> Result<Self> {
        options.validate()?;
        let registry = MetadataSourceRegistry::new();
        let resources = match &options.resource_dir {
            Some(dir) => SqlResources::new().load_user_dir(dir, &registry)?,
            None => SqlResources::new(),
        };
        Ok(Self {
            registry,
            resources,
            options,
            control: CrawlControl::new(),
        })
    }

    pub fn with_registry(mut self, registry: MetadataSourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the resource layers.
    pub fn with_resources(mut self, resources: SqlResources) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_control(mut self, control: CrawlControl) -> Self {
        self.control = control;
        self
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    pub fn control(&self) -> &CrawlControl {
        &self.control
    }

    /// Crawls a connection opened by [`crate::resolve`].
    pub async fn crawl(&self, connection: &ResolvedConnection) -> Result<CrawlOutcome> {
        self.crawl_connection(connection.connection.as_ref(), connection.database_info.clone())
            .await
    }

    /// Crawls `connection`, whose product is described by `database_info`.
    ///
    /// # Errors
    /// - `CategoryRetrieval` when a required category or an override
    ///   resource fails; no catalog is produced
    /// - `Cancelled` when the token fires or the deadline passes; partial
    ///   results are discarded
    pub async fn crawl_connection(
        &self,
        connection: &dyn MetadataConnection,
        database_info: DatabaseInfo,
    ) -> Result<CrawlOutcome> {
        let started_at = chrono::Utc::now();
        let vendor = Vendor::detect(&database_info.product_name);
        tracing::info!("Using database plugin for {}", vendor);

        let schema_rule = match &self.options.schema_rule {
            Some(rule) => rule.clone(),
            None => vendor.default_schema_rule()?,
        };
        let control = match self.options.timeout {
            Some(timeout) if self.control.deadline.is_none() => self.control.clone().with_timeout(timeout),
            _ => self.control.clone(),
        };

        let wanted = self.options.max_concurrent_queries;
        let workers = connection.probe_capacity(wanted).await.clamp(1, wanted);
        tracing::debug!("Running up to {} metadata statements at once", workers);

        let mut run = CrawlRun {
            connection,
            plan: RetrievalPlan::resolve(&self.registry, &self.resources, vendor),
            options: &self.options,
            control,
            workers,
            state: CrawlState::Init,
            warnings: Vec::new(),
            degraded: BTreeSet::new(),
        };
        run.enter(CrawlState::ConnectionOpen)?;

        let schemas = match run.execute(schema_rule).await {
            Ok(schemas) => schemas,
            Err(e) => {
                tracing::warn!("Crawl failed while {}: {}", run.state, e);
                run.state = CrawlState::Failed;
                return Err(e);
            }
        };

        let crawl_info = CrawlInfo {
            vendor,
            started_at,
            finished_at: chrono::Utc::now(),
            retrievals: run.plan.describe(),
            warning_count: run.warnings.len(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let catalog = Catalog::new(database_info, crawl_info, schemas);

        tracing::info!(
            "Crawl finished: {} schemas, {} tables, {} routines, {} warnings",
            catalog.schemas().len(),
            catalog.tables().count(),
            catalog.routines().count(),
            run.warnings.len()
        );

        Ok(CrawlOutcome {
            catalog,
            warnings: run.warnings,
            state: run.state,
        })
    }
}

/// Placeholder that makes a resource query run once per retained schema.
const SCHEMA_VARIABLE: &str = "${schema}";

/// What a retrieval job runs against.
#[derive(Debug, Clone)]
enum Target {
    /// Once per crawl; resource queries run this way unless they use `${schema}`
    Database,
    Schema(String),
    Table { schema: String, table: String },
}

#[derive(Debug, Clone)]
struct Job {
    category: MetadataCategory,
    target: Target,
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Target::Database => write!(f, "{}", self.category),
            Target::Schema(schema) => write!(f, "{} of {}", self.category, schema),
            Target::Table { schema, table } => write!(f, "{} of {}.{}", self.category, schema, table),
        }
    }
}

/// State of one crawl in progress.
struct CrawlRun<'c> {
    connection: &'c dyn MetadataConnection,
    plan: RetrievalPlan,
    options: &'c CrawlOptions,
    control: CrawlControl,
    workers: usize,
    state: CrawlState,
    warnings: Vec<CrawlWarning>,
    /// Categories already reported once
    degraded: BTreeSet<MetadataCategory>,
}

impl CrawlRun<'_> {
    fn enter(&mut self, state: CrawlState) -> Result<()> {
        if self.control.is_cancelled() {
            return Err(DbCrawlerError::Cancelled { state: self.state });
        }
        tracing::info!("Crawl {}", state);
        self.state = state;
        Ok(())
    }

    async fn execute(&mut self, schema_rule: InclusionRule) -> Result<Vec<Schema>> {
        use MetadataCategory as C;

        let options = self.options;
        let mut builder = CatalogBuilder::new(options, schema_rule);

        for batch in self
            .run_phase(CrawlState::RetrievingSchemas, &[C::Schemata], &builder)
            .await?
        {
            builder.merge(batch);
        }
        tracing::info!("Retained {} schemas", builder.schema_names().len());

        for batch in self
            .run_phase(CrawlState::RetrievingTables, &[C::Tables], &builder)
            .await?
        {
            builder.merge(batch);
        }
        tracing::info!("Retained {} tables", builder.table_names().len());

        let details: Vec<MetadataCategory> = MetadataCategory::ALL
            .into_iter()
            .filter(|c| !c.is_required() && !c.is_routine())
            .collect();
        let mut pending = self
            .run_phase(CrawlState::RetrievingColumnsAndKeys, &details, &builder)
            .await?;

        if options.show_stored_procedures {
            pending.extend(
                self.run_phase(
                    CrawlState::RetrievingRoutines,
                    &[C::Routines, C::RoutineColumns],
                    &builder,
                )
                .await?,
            );
        } else {
            tracing::debug!("Stored procedures not requested");
        }

        self.enter(CrawlState::Merging)?;
        pending.sort_by_key(RecordBatch::category);
        for batch in pending {
            builder.merge(batch);
        }
        let (schemas, warnings) = builder.finish();
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        self.warnings.extend(warnings);
        self.retain_catalog_warnings(&schemas);

        self.state = CrawlState::Done;
        Ok(schemas)
    }

    /// Runs every job of one phase and returns the batches in job order.
    async fn run_phase(
        &mut self,
        state: CrawlState,
        categories: &[MetadataCategory],
        builder: &CatalogBuilder<'_>,
    ) -> Result<Vec<RecordBatch>> {
        self.enter(state)?;

        let jobs = self.jobs(categories, builder);
        let variables = self.variables(builder);
        let retained_tables = builder.table_full_names();
        tracing::debug!("{} retrieval jobs while {}", jobs.len(), state);

        let run = &*self;
        let variables = &variables;
        let futures = jobs.into_iter().enumerate().map(|(index, job)| async move {
            if run.control.is_cancelled() {
                return (index, job, None);
            }
            tracing::debug!("Retrieving {}", job);
            let result = run.fetch(&job, variables).await;
            (index, job, Some(result))
        });

        let mut stream = stream::iter(futures).buffer_unordered(self.workers);
        let mut results = Vec::new();
        let mut skipped = false;
        while let Some((index, job, result)) = stream.next().await {
            match result {
                Some(result) => results.push((index, job, result)),
                None => skipped = true,
            }
        }
        drop(stream);

        if skipped || self.control.is_cancelled() {
            return Err(DbCrawlerError::Cancelled { state: self.state });
        }

        results.sort_by_key(|(index, ..)| *index);
        let mut batches = Vec::with_capacity(results.len());
        for (_, job, result) in results {
            match result.and_then(|rows| RecordBatch::parse(job.category, &rows)) {
                Ok(batch) => {
                    tracing::debug!("{} returned {} records", job, batch.len());
                    batches.push(batch);
                }
                Err(e) => self.degrade(&job, e, &retained_tables)?,
            }
        }
        Ok(batches)
    }

    fn jobs(&self, categories: &[MetadataCategory], builder: &CatalogBuilder<'_>) -> Vec<Job> {
        let mut jobs = Vec::new();
        for &category in categories {
            let planned = self.plan.get(category);
            match &planned.retrieval {
                Retrieval::Skip { reason } => {
                    tracing::debug!("Skipping {}: {}", planned.lookup_key, reason);
                }
                Retrieval::Query { sql, .. } if sql.contains(SCHEMA_VARIABLE) => {
                    jobs.extend(builder.schema_names().into_iter().map(|schema| Job {
                        category,
                        target: Target::Schema(schema),
                    }));
                }
                Retrieval::Query { .. } => jobs.push(Job {
                    category,
                    target: Target::Database,
                }),
                Retrieval::DriverCall => match category.scope() {
                    CategoryScope::Catalog => jobs.push(Job {
                        category,
                        target: Target::Database,
                    }),
                    CategoryScope::Schema => {
                        jobs.extend(builder.schema_names().into_iter().map(|schema| Job {
                            category,
                            target: Target::Schema(schema),
                        }));
                    }
                    CategoryScope::Table => {
                        jobs.extend(builder.table_names().into_iter().map(|(schema, table)| Job {
                            category,
                            target: Target::Table { schema, table },
                        }));
                    }
                },
            }
        }
        jobs
    }

    /// Variables available to resource queries in the current phase.
    fn variables(&self, builder: &CatalogBuilder<'_>) -> BTreeMap<String, String> {
        let mut variables = BTreeMap::new();
        variables.insert("vendor".to_string(), self.plan.vendor().as_str().to_string());
        if let Some(catalog) = builder.catalog_name() {
            variables.insert("catalog".to_string(), catalog);
        }
        if self.state != CrawlState::RetrievingSchemas {
            let schemas = builder.schema_names();
            let list = if schemas.is_empty() {
                "NULL".to_string()
            } else {
                schemas
                    .iter()
                    .map(|s| format!("'{}'", s.replace('\'', "''")))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            variables.insert("schemas".to_string(), list);
        }
        variables
    }

    async fn fetch(&self, job: &Job, variables: &BTreeMap<String, String>) -> Result<Vec<MetadataRow>> {
        match &self.plan.get(job.category).retrieval {
            Retrieval::DriverCall => self.driver_call(job).await,
            Retrieval::Query { sql, .. } => {
                let sql = match &job.target {
                    Target::Schema(schema) => {
                        let mut variables = variables.clone();
                        variables.insert("schema".to_string(), schema.clone());
                        expand_template(sql, &variables)
                    }
                    _ => expand_template(sql, variables),
                };
                let unresolved = extract_unresolved_variables(&sql);
                if !unresolved.is_empty() {
                    let names: Vec<_> = unresolved.into_iter().collect();
                    return Err(DbCrawlerError::query_failed(format!(
                        "Unresolved variables in {}: {}",
                        job.category.resource_name(),
                        names.join(", ")
                    )));
                }
                self.connection.query(&sql).await
            }
            Retrieval::Skip { .. } => Ok(Vec::new()),
        }
    }

    async fn driver_call(&self, job: &Job) -> Result<Vec<MetadataRow>> {
        use MetadataCategory as C;

        let connection = self.connection;
        match (job.category, &job.target) {
            (C::Schemata, _) => connection.schemas().await,
            (C::Tables, Target::Schema(schema)) => {
                connection.tables(schema, &self.options.table_types).await
            }
            (C::TableColumns, Target::Table { schema, table }) => connection.columns(schema, table).await,
            (C::PrimaryKeys, Target::Table { schema, table }) => {
                connection.primary_keys(schema, table).await
            }
            (C::ForeignKeys, Target::Table { schema, table }) => {
                connection.imported_keys(schema, table).await
            }
            (C::Indexes, Target::Table { schema, table }) => connection.indexes(schema, table).await,
            (C::Routines, Target::Schema(schema)) => connection.routines(schema).await,
            (C::RoutineColumns, Target::Schema(schema)) => connection.routine_columns(schema).await,
            (category, _) => Err(DbCrawlerError::unsupported_feature(
                format!("driver call for {}", category),
                connection.driver_name(),
            )),
        }
    }

    /// Drops per-table warnings for tables that grep or the merge filters
    /// removed from the final catalog.
    fn retain_catalog_warnings(&mut self, schemas: &[Schema]) {
        let tables: BTreeSet<String> = schemas
            .iter()
            .flat_map(|schema| schema.tables.iter().map(|table| table.key.full_name()))
            .collect();
        self.warnings.retain(|warning| match warning {
            CrawlWarning::CategoryUnsupported {
                table: Some(table), ..
            } => tables.contains(table),
            _ => true,
        });
    }

    /// Records a failed job, or turns it into a fatal error.
    fn degrade(&mut self, job: &Job, error: DbCrawlerError, retained_tables: &[String]) -> Result<()> {
        let category = job.category;
        let planned = self.plan.get(category);
        let is_override = matches!(
            planned.retrieval,
            Retrieval::Query { origin, .. } if ResourceOrigin::is_override(origin)
        );
        if category.is_required() || is_override {
            return Err(DbCrawlerError::category_failed(
                category,
                self.plan.vendor(),
                planned.lookup_key.clone(),
                error,
            ));
        }

        tracing::warn!("{} unavailable for {}: {}", planned.lookup_key, job, error);
        let reason = error.to_string();
        match (&job.target, category.scope()) {
            (Target::Table { schema, table }, _) => {
                self.warnings.push(CrawlWarning::CategoryUnsupported {
                    category,
                    table: Some(if schema.is_empty() {
                        table.clone()
                    } else {
                        format!("{}.{}", schema, table)
                    }),
                    reason,
                });
            }
            (Target::Database, CategoryScope::Table) => {
                self.warnings
                    .extend(retained_tables.iter().map(|table| CrawlWarning::CategoryUnsupported {
                        category,
                        table: Some(table.clone()),
                        reason: reason.clone(),
                    }));
            }
            (Target::Schema(schema), CategoryScope::Table) => {
                let prefix = format!("{}.", schema);
                self.warnings.extend(
                    retained_tables
                        .iter()
                        .filter(|table| table.starts_with(&prefix))
                        .map(|table| CrawlWarning::CategoryUnsupported {
                            category,
                            table: Some(table.clone()),
                            reason: reason.clone(),
                        }),
                );
            }
            _ => {
                if self.degraded.insert(category) {
                    self.warnings.push(CrawlWarning::CategoryUnsupported {
                        category,
                        table: None,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }
}
