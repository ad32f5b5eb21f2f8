//! Single-writer merge of record batches into a catalog.
//!
//! Objects live in maps keyed by [`SchemaKey`], [`TableKey`] and
//! [`RoutineKey`]. Primary and foreign keys are held back as records and
//! resolved in [`CatalogBuilder::finish`], after every table and column is
//! known, so an edge whose endpoint was filtered out is dropped in one place.

use crate::error::CrawlWarning;
use crate::models::{
    Column, ColumnKey, ColumnReference, ForeignKey, Index, IndexColumn, PrimaryKey, Routine,
    RoutineColumn, RoutineKey, Schema, SchemaKey, Sequence, Table, TableConstraint, TableKey,
    Trigger, ViewInfo,
};
use crate::options::CrawlOptions;
use crate::records::{
    ColumnRecord, ForeignKeyRecord, IndexRecord, PrimaryKeyRecord, RecordBatch, RoutineColumnRecord,
    RoutineRecord, SchemaRecord, TableRecord, TriggerRecord,
};
use crate::registry::MetadataCategory;
use crate::rules::InclusionRule;
use std::collections::BTreeMap;

pub(crate) struct CatalogBuilder<'a> {
    options: &'a CrawlOptions,
    schema_rule: InclusionRule,
    /// Retained schemas by name
    schemas: BTreeMap<String, SchemaKey>,
    tables: BTreeMap<TableKey, Table>,
    routines: BTreeMap<RoutineKey, Routine>,
    sequences: BTreeMap<SchemaKey, Vec<Sequence>>,
    primary_keys: Vec<PrimaryKeyRecord>,
    foreign_keys: Vec<ForeignKeyRecord>,
    warnings: Vec<CrawlWarning>,
}

impl<'a> CatalogBuilder<'a> {
    pub(crate) fn new(options: &'a CrawlOptions, schema_rule: InclusionRule) -> Self {
        Self {
            options,
            schema_rule,
            schemas: BTreeMap::new(),
            tables: BTreeMap::new(),
            routines: BTreeMap::new(),
            sequences: BTreeMap::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Names of the retained schemas, sorted
    pub(crate) fn schema_names(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }

    /// First catalog name among the retained schemas
    pub(crate) fn catalog_name(&self) -> Option<String> {
        self.schemas.values().find_map(|k| k.catalog.clone())
    }

    /// `(schema, table)` pairs of the retained tables, sorted
    pub(crate) fn table_names(&self) -> Vec<(String, String)> {
        self.tables
            .keys()
            .map(|k| (k.schema.name().to_string(), k.name.clone()))
            .collect()
    }

    /// Full names of the retained tables
    pub(crate) fn table_full_names(&self) -> Vec<String> {
        self.tables.keys().map(TableKey::full_name).collect()
    }

    fn table_key(&self, schema: &str, table: &str) -> Option<TableKey> {
        self.schemas
            .get(schema)
            .map(|key| TableKey::new(key.clone(), table))
    }

    fn table_mut(&mut self, schema: &str, table: &str) -> Option<&mut Table> {
        let key = self.table_key(schema, table)?;
        self.tables.get_mut(&key)
    }

    /// Merges one batch.
    pub(crate) fn merge(&mut self, batch: RecordBatch) {
        tracing::trace!("Merging {} {} records", batch.len(), batch.category());
        match batch {
            RecordBatch::Schemata(records) => self.add_schemas(records),
            RecordBatch::Tables(records) => self.add_tables(records),
            RecordBatch::TableColumns(records) => self.add_columns(records),
            RecordBatch::PrimaryKeys(records) => self.primary_keys.extend(records),
            RecordBatch::ForeignKeys(records) => self.foreign_keys.extend(records),
            RecordBatch::Indexes(records) => self.add_indexes(records),
            RecordBatch::TableConstraints(records) => {
                for record in records {
                    if let Some(table) = self.table_mut(&record.schema, &record.table)
                        && !table.constraints.iter().any(|c| c.name == record.name)
                    {
                        table.constraints.push(TableConstraint {
                            name: record.name,
                            constraint_type: record.constraint_type,
                            is_deferrable: record.is_deferrable,
                            initially_deferred: record.initially_deferred,
                        });
                    }
                }
            }
            RecordBatch::Triggers(records) => self.add_triggers(records),
            RecordBatch::Views(records) => {
                for record in records {
                    if let Some(table) = self.table_mut(&record.schema, &record.table) {
                        if table.definition.is_none() {
                            table.definition.clone_from(&record.definition);
                        }
                        table.view = Some(ViewInfo {
                            definition: record.definition,
                            check_option: record.check_option,
                            is_updatable: record.is_updatable,
                        });
                    }
                }
            }
            RecordBatch::ExtTables(records) => {
                for record in records {
                    if let Some(table) = self.table_mut(&record.schema, &record.table)
                        && record.definition.is_some()
                    {
                        table.definition = record.definition;
                    }
                }
            }
            RecordBatch::TableAttributes(records) => {
                for record in records {
                    if let Some(table) = self.table_mut(&record.schema, &record.table) {
                        table.attributes.extend(record.attributes);
                    }
                }
            }
            RecordBatch::ColumnAttributes(records) => {
                for record in records {
                    let Some(column_name) = record.column else {
                        continue;
                    };
                    if let Some(column) = self
                        .table_mut(&record.schema, &record.table)
                        .and_then(|t| t.columns.iter_mut().find(|c| c.name == column_name))
                    {
                        column.attributes.extend(record.attributes);
                    }
                }
            }
            RecordBatch::Sequences(records) => {
                for record in records {
                    if let Some(key) = self.schemas.get(&record.schema) {
                        self.sequences.entry(key.clone()).or_default().push(Sequence {
                            name: record.name,
                            increment: record.increment,
                            minimum_value: record.minimum_value,
                            maximum_value: record.maximum_value,
                            is_cycle: record.is_cycle,
                        });
                    }
                }
            }
            RecordBatch::Routines(records) => self.add_routines(records),
            RecordBatch::RoutineColumns(records) => self.add_routine_columns(records),
        }
    }

    fn add_schemas(&mut self, records: Vec<SchemaRecord>) {
        for record in records {
            let key = SchemaKey::new(record.catalog.as_deref(), record.schema.as_deref());
            let name = key.name().to_string();
            if !self.schema_rule.matches(&name) {
                tracing::debug!("Excluding schema '{}'", name);
                continue;
            }
            self.schemas.entry(name).or_insert(key);
        }
    }

    fn add_tables(&mut self, records: Vec<TableRecord>) {
        for record in records {
            let Some(key) = self.table_key(&record.schema, &record.name) else {
                continue;
            };
            if !self.options.accepts_table_type(&record.table_type) {
                tracing::trace!("Excluding {} of type {}", key, record.table_type);
                continue;
            }
            if !self.options.table_rule.matches_qualified(&key.full_name(), &key.name) {
                tracing::debug!("Excluding table '{}'", key);
                continue;
            }
            self.tables.entry(key.clone()).or_insert_with(|| Table {
                key,
                table_type: record.table_type,
                remarks: record.remarks,
                definition: None,
                columns: Vec::new(),
                primary_key: None,
                foreign_keys: Vec::new(),
                indexes: Vec::new(),
                constraints: Vec::new(),
                triggers: Vec::new(),
                view: None,
                attributes: BTreeMap::new(),
            });
        }
    }

    fn add_columns(&mut self, records: Vec<ColumnRecord>) {
        let options = self.options;
        let rule = &options.column_rule;
        for record in records {
            let Some(key) = self.table_key(&record.schema, &record.table) else {
                continue;
            };
            let Some(table) = self.tables.get_mut(&key) else {
                continue;
            };
            let column_key = key.column(record.name.as_str());
            if !rule.matches_qualified(&column_key.full_name(), &record.name) {
                continue;
            }
            if table.columns.iter().any(|c| c.name == record.name) {
                continue;
            }
            table.columns.push(Column {
                name: record.name,
                ordinal_position: record.ordinal_position,
                type_name: record.type_name,
                size: record.size,
                decimal_digits: record.decimal_digits,
                is_nullable: record.is_nullable,
                is_auto_increment: record.is_auto_increment,
                is_part_of_primary_key: false,
                is_part_of_foreign_key: false,
                default_value: record.default_value,
                remarks: record.remarks,
                attributes: BTreeMap::new(),
            });
        }
    }

    fn add_indexes(&mut self, records: Vec<IndexRecord>) {
        for record in records {
            let Some(table) = self.table_mut(&record.schema, &record.table) else {
                continue;
            };
            let position = match table.indexes.iter().position(|i| i.name == record.name) {
                Some(position) => position,
                None => {
                    table.indexes.push(Index {
                        name: record.name.clone(),
                        is_unique: record.is_unique,
                        index_type: record.index_type.clone(),
                        columns: Vec::new(),
                    });
                    table.indexes.len() - 1
                }
            };
            if let Some(column) = record.column {
                table.indexes[position].columns.push(IndexColumn {
                    name: column,
                    ordinal_position: record.ordinal_position,
                    sort_order: record.sort_order,
                });
            }
        }
    }

    fn add_triggers(&mut self, records: Vec<TriggerRecord>) {
        for record in records {
            let Some(table) = self.table_mut(&record.schema, &record.table) else {
                continue;
            };
            let position = match table.triggers.iter().position(|t| t.name == record.name) {
                Some(position) => position,
                None => {
                    table.triggers.push(Trigger {
                        name: record.name.clone(),
                        events: Vec::new(),
                        timing: record.timing,
                        orientation: record.orientation.clone(),
                        action_order: record.action_order,
                        condition: record.condition.clone(),
                        statement: record.statement.clone(),
                    });
                    table.triggers.len() - 1
                }
            };
            let trigger = &mut table.triggers[position];
            if let Some(event) = record.event
                && !trigger.events.contains(&event)
            {
                trigger.events.push(event);
            }
        }
    }

    fn add_routines(&mut self, records: Vec<RoutineRecord>) {
        for record in records {
            let Some(schema) = self.schemas.get(&record.schema) else {
                continue;
            };
            let full_name = format!("{}.{}", schema.name(), record.name);
            if !self.options.routine_rule.matches_qualified(&full_name, &record.name) {
                tracing::debug!("Excluding routine '{}'", full_name);
                continue;
            }
            let key = RoutineKey {
                schema: schema.clone(),
                specific_name: record.specific_name,
            };
            self.routines.entry(key.clone()).or_insert_with(|| Routine {
                key,
                name: record.name,
                routine_type: record.routine_type,
                remarks: record.remarks,
                definition: record.definition,
                columns: Vec::new(),
            });
        }
    }

    fn add_routine_columns(&mut self, records: Vec<RoutineColumnRecord>) {
        let options = self.options;
        let rule = &options.routine_column_rule;
        for record in records {
            let Some(schema) = self.schemas.get(&record.schema) else {
                continue;
            };
            let key = RoutineKey {
                schema: schema.clone(),
                specific_name: record.specific_name,
            };
            let Some(routine) = self.routines.get_mut(&key) else {
                continue;
            };
            let full_name = format!("{}.{}.{}", schema.name(), routine.name, record.name);
            if !rule.matches_qualified(&full_name, &record.name) {
                continue;
            }
            routine.columns.push(RoutineColumn {
                name: record.name,
                ordinal_position: record.ordinal_position,
                direction: record.direction,
                type_name: record.type_name,
            });
        }
    }

    /// Applies grep rules, resolves keys, sorts, and hands back the schemas
    /// plus every warning raised while merging.
    pub(crate) fn finish(mut self) -> (Vec<Schema>, Vec<CrawlWarning>) {
        self.apply_grep();
        self.resolve_primary_keys();
        self.resolve_foreign_keys();

        let mut schemas: BTreeMap<SchemaKey, Schema> = self
            .schemas
            .values()
            .map(|key| {
                (
                    key.clone(),
                    Schema {
                        key: key.clone(),
                        tables: Vec::new(),
                        routines: Vec::new(),
                        sequences: Vec::new(),
                    },
                )
            })
            .collect();

        for (key, mut table) in std::mem::take(&mut self.tables) {
            sort_table(&mut table, self.options.sort_columns);
            if let Some(schema) = schemas.get_mut(&key.schema) {
                schema.tables.push(table);
            }
        }
        for (key, mut routine) in std::mem::take(&mut self.routines) {
            if self.options.sort_routine_columns {
                routine.columns.sort_by_key(|c| c.name.to_lowercase());
            } else {
                routine.columns.sort_by_key(|c| c.ordinal_position);
            }
            if let Some(schema) = schemas.get_mut(&key.schema) {
                schema.routines.push(routine);
            }
        }
        for (key, sequences) in std::mem::take(&mut self.sequences) {
            if let Some(schema) = schemas.get_mut(&key) {
                schema.sequences = sequences;
            }
        }

        let mut schemas: Vec<Schema> = schemas.into_values().collect();
        schemas.sort_by(|a, b| a.key.name().cmp(b.key.name()));
        for schema in &mut schemas {
            schema.tables.sort_by(|a, b| a.key.name.cmp(&b.key.name));
            schema
                .routines
                .sort_by(|a, b| (&a.name, &a.key.specific_name).cmp(&(&b.name, &b.key.specific_name)));
            schema.sequences.sort_by(|a, b| a.name.cmp(&b.name));
            schema.sequences.dedup_by(|a, b| a.name == b.name);
        }

        (schemas, self.warnings)
    }

    fn apply_grep(&mut self) {
        let options = self.options;
        if let Some(grep) = &options.grep_columns {
            let keep_unmatched = options.include_tables_without_matching_columns;
            self.tables.retain(|key, table| {
                let matched = table
                    .columns
                    .iter()
                    .any(|c| grep.matches(&key.column(c.name.as_str()).full_name()));
                if !matched && !keep_unmatched {
                    tracing::debug!("Excluding table '{}': no column matches grep", key);
                }
                matched || keep_unmatched
            });
        }

        if let Some(grep) = &options.grep_routine_columns {
            self.routines.retain(|key, routine| {
                routine.columns.iter().any(|c| {
                    grep.matches(&format!("{}.{}.{}", key.schema.name(), routine.name, c.name))
                })
            });
        }
    }

    fn resolve_primary_keys(&mut self) {
        let mut records = std::mem::take(&mut self.primary_keys);
        records.sort_by_key(|r| r.key_sequence);

        let mut keys: BTreeMap<TableKey, PrimaryKey> = BTreeMap::new();
        for record in records {
            let Some(key) = self.table_key(&record.schema, &record.table) else {
                continue;
            };
            let Some(table) = self.tables.get_mut(&key) else {
                continue;
            };
            let Some(column) = table.columns.iter_mut().find(|c| c.name == record.column) else {
                self.warnings.push(CrawlWarning::MergeInconsistency {
                    category: MetadataCategory::PrimaryKeys,
                    object: format!("primary key of {}", key),
                    reason: format!("column {} is not in the catalog", record.column),
                });
                continue;
            };
            column.is_part_of_primary_key = true;

            let primary_key = keys.entry(key).or_insert_with(|| PrimaryKey {
                name: None,
                columns: Vec::new(),
            });
            if primary_key.name.is_none() {
                primary_key.name = record.name;
            }
            if !primary_key.columns.contains(&record.column) {
                primary_key.columns.push(record.column);
            }
        }

        for (key, primary_key) in keys {
            if let Some(table) = self.tables.get_mut(&key) {
                table.primary_key = Some(primary_key);
            }
        }
    }

    fn resolve_foreign_keys(&mut self) {
        let mut grouped: BTreeMap<(TableKey, String), Vec<ForeignKeyRecord>> = BTreeMap::new();
        for record in std::mem::take(&mut self.foreign_keys) {
            let Some(key) = self.table_key(&record.fk_schema, &record.fk_table) else {
                continue;
            };
            if !self.tables.contains_key(&key) {
                continue;
            }
            let references = grouped.entry((key, record.name.clone())).or_default();
            if !references.iter().any(|r| r.key_sequence == record.key_sequence) {
                references.push(record);
            }
        }

        for ((table_key, name), mut records) in grouped {
            records.sort_by_key(|r| r.key_sequence);
            match self.build_foreign_key(&table_key, &name, &records) {
                Ok(foreign_key) => {
                    if let Some(table) = self.tables.get_mut(&table_key) {
                        for reference in &foreign_key.column_references {
                            if let Some(column) = table
                                .columns
                                .iter_mut()
                                .find(|c| c.name == reference.foreign_key_column.name)
                            {
                                column.is_part_of_foreign_key = true;
                            }
                        }
                        table.foreign_keys.push(foreign_key);
                    }
                }
                Err(reason) => {
                    tracing::warn!("Dropping foreign key {} on {}: {}", name, table_key, reason);
                    self.warnings.push(CrawlWarning::MergeInconsistency {
                        category: MetadataCategory::ForeignKeys,
                        object: format!("{} on {}", name, table_key),
                        reason,
                    });
                }
            }
        }
    }

    fn build_foreign_key(
        &self,
        table_key: &TableKey,
        name: &str,
        records: &[ForeignKeyRecord],
    ) -> Result<ForeignKey, String> {
        let first = records
            .first()
            .ok_or_else(|| "no column references".to_string())?;

        let mut column_references = Vec::with_capacity(records.len());
        for record in records {
            let referenced = self
                .table_key(&record.pk_schema, &record.pk_table)
                .filter(|k| self.tables.contains_key(k))
                .ok_or_else(|| {
                    format!(
                        "referenced table {}.{} is not in the catalog",
                        record.pk_schema, record.pk_table
                    )
                })?;
            let foreign_key_column = self.resolve_column(table_key, &record.fk_column)?;
            let primary_key_column = self.resolve_column(&referenced, &record.pk_column)?;
            column_references.push(ColumnReference {
                key_sequence: record.key_sequence,
                foreign_key_column,
                primary_key_column,
            });
        }

        Ok(ForeignKey {
            name: name.to_string(),
            column_references,
            update_rule: first.update_rule,
            delete_rule: first.delete_rule,
        })
    }

    fn resolve_column(&self, table: &TableKey, column: &str) -> Result<ColumnKey, String> {
        self.tables
            .get(table)
            .and_then(|t| t.column(column))
            .map(|c| table.column(c.name.as_str()))
            .ok_or_else(|| format!("column {}.{} is not in the catalog", table, column))
    }
}

fn sort_table(table: &mut Table, sort_columns: bool) {
    if sort_columns {
        table.columns.sort_by_key(|c| c.name.to_lowercase());
    } else {
        table.columns.sort_by_key(|c| c.ordinal_position);
    }
    table.foreign_keys.sort_by(|a, b| a.name.cmp(&b.name));
    table.indexes.sort_by(|a, b| a.name.cmp(&b.name));
    for index in &mut table.indexes {
        index.columns.sort_by_key(|c| c.ordinal_position);
    }
    table.triggers.sort_by(|a, b| a.name.cmp(&b.name));
    table.constraints.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::MetadataRow;
    use crate::rules::GrepRule;

    fn batch(category: MetadataCategory, rows: Vec<MetadataRow>) -> RecordBatch {
        RecordBatch::parse(category, &rows).unwrap()
    }

    fn row(values: &[(&str, &str)]) -> MetadataRow {
        values
            .iter()
            .fold(MetadataRow::new(), |row, (k, v)| row.with(k, *v))
    }

    fn library(builder: &mut CatalogBuilder<'_>) {
        builder.merge(batch(
            MetadataCategory::Schemata,
            vec![row(&[("TABLE_SCHEM", "main")])],
        ));
        builder.merge(batch(
            MetadataCategory::Tables,
            vec![
                row(&[("TABLE_SCHEM", "main"), ("TABLE_NAME", "AUTHORS"), ("TABLE_TYPE", "TABLE")]),
                row(&[("TABLE_SCHEM", "main"), ("TABLE_NAME", "BOOKS"), ("TABLE_TYPE", "TABLE")]),
            ],
        ));
        let column = |table: &str, name: &str, ordinal: &str| {
            row(&[
                ("TABLE_SCHEM", "main"),
                ("TABLE_NAME", table),
                ("COLUMN_NAME", name),
                ("ORDINAL_POSITION", ordinal),
                ("TYPE_NAME", "INTEGER"),
            ])
        };
        builder.merge(batch(
            MetadataCategory::TableColumns,
            vec![
                column("AUTHORS", "ID", "1"),
                column("AUTHORS", "NAME", "2"),
                column("BOOKS", "ID", "1"),
                column("BOOKS", "TITLE", "2"),
                column("BOOKS", "AUTHOR_ID", "3"),
            ],
        ));
        builder.merge(batch(
            MetadataCategory::PrimaryKeys,
            vec![
                row(&[("TABLE_SCHEM", "main"), ("TABLE_NAME", "AUTHORS"), ("COLUMN_NAME", "ID"), ("KEY_SEQ", "1")]),
                row(&[("TABLE_SCHEM", "main"), ("TABLE_NAME", "BOOKS"), ("COLUMN_NAME", "ID"), ("KEY_SEQ", "1")]),
            ],
        ));
        builder.merge(batch(
            MetadataCategory::ForeignKeys,
            vec![row(&[
                ("FK_NAME", "BOOKS_AUTHOR_FK"),
                ("FKTABLE_SCHEM", "main"),
                ("FKTABLE_NAME", "BOOKS"),
                ("FKCOLUMN_NAME", "AUTHOR_ID"),
                ("PKTABLE_SCHEM", "main"),
                ("PKTABLE_NAME", "AUTHORS"),
                ("PKCOLUMN_NAME", "ID"),
                ("KEY_SEQ", "1"),
            ])],
        ));
    }

    #[test]
    fn test_foreign_key_resolves_both_ends() {
        let options = CrawlOptions::default();
        let mut builder = CatalogBuilder::new(&options, InclusionRule::default());
        library(&mut builder);
        let (schemas, warnings) = builder.finish();

        assert!(warnings.is_empty());
        assert_eq!(schemas.len(), 1);
        let books = &schemas[0].tables[1];
        assert_eq!(books.key.name, "BOOKS");
        assert_eq!(books.foreign_keys.len(), 1);
        let reference = &books.foreign_keys[0].column_references[0];
        assert_eq!(reference.primary_key_column.table.name, "AUTHORS");
        assert!(books.column("AUTHOR_ID").unwrap().is_part_of_foreign_key);
        assert!(books.column("ID").unwrap().is_part_of_primary_key);
    }

    #[test]
    fn test_excluded_target_drops_edge_with_warning() {
        let options = CrawlOptions::default().with_table_rule(InclusionRule::exclude_only("AUTHORS").unwrap());
        let mut builder = CatalogBuilder::new(&options, InclusionRule::default());
        library(&mut builder);
        let (schemas, warnings) = builder.finish();

        assert_eq!(schemas[0].tables.len(), 1);
        assert!(schemas[0].tables[0].foreign_keys.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            CrawlWarning::MergeInconsistency { category: MetadataCategory::ForeignKeys, .. }
        ));
    }

    #[test]
    fn test_excluded_primary_key_column_is_reported() {
        let options = CrawlOptions::default().with_column_rule(InclusionRule::exclude_only("ID").unwrap());
        let mut builder = CatalogBuilder::new(&options, InclusionRule::default());
        library(&mut builder);
        let (schemas, warnings) = builder.finish();

        assert!(schemas[0].tables.iter().all(|t| t.primary_key.is_none()));
        assert!(warnings.iter().any(|w| w.category() == MetadataCategory::PrimaryKeys));
        assert!(warnings.iter().any(|w| w.category() == MetadataCategory::ForeignKeys));
    }

    #[test]
    fn test_grep_keeps_tables_with_matching_column() {
        let options = CrawlOptions::default().with_grep_columns(GrepRule::new(".*\\.TITLE", false).unwrap());
        let mut builder = CatalogBuilder::new(&options, InclusionRule::default());
        library(&mut builder);
        let (schemas, warnings) = builder.finish();

        let names: Vec<_> = schemas[0].tables.iter().map(|t| t.key.name.as_str()).collect();
        assert_eq!(names, vec!["BOOKS"]);
        assert_eq!(schemas[0].tables[0].columns.len(), 3);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_sort_columns_case_insensitive() {
        let options = CrawlOptions::default().with_sort_columns(true);
        let mut builder = CatalogBuilder::new(&options, InclusionRule::default());
        library(&mut builder);
        let (schemas, _) = builder.finish();

        let books: Vec<_> = schemas[0].tables[1].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(books, vec!["AUTHOR_ID", "ID", "TITLE"]);
    }

    #[test]
    fn test_schema_rule_and_unknown_schema_rows() {
        let options = CrawlOptions::default();
        let mut builder = CatalogBuilder::new(&options, InclusionRule::exclude_only("temp").unwrap());
        builder.merge(batch(
            MetadataCategory::Schemata,
            vec![row(&[("TABLE_SCHEM", "main")]), row(&[("TABLE_SCHEM", "temp")])],
        ));
        builder.merge(batch(
            MetadataCategory::Tables,
            vec![row(&[("TABLE_SCHEM", "temp"), ("TABLE_NAME", "SCRATCH"), ("TABLE_TYPE", "TABLE")])],
        ));

        assert_eq!(builder.schema_names(), vec!["main".to_string()]);
        assert!(builder.table_names().is_empty());
    }
}
