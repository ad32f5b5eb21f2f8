//! Pragma queries behind the standard metadata calls.
//!
//! `?1` is the schema name (`main` for the primary database) and `?2` the
//! table name.

pub(super) const SCHEMAS: &str = r#"
    SELECT name AS table_schem
    FROM pragma_database_list
    WHERE name <> 'temp'
    ORDER BY seq
"#;

pub(super) const TABLES: &str = r#"
    SELECT schema AS table_schem,
           name AS table_name,
           CASE type
               WHEN 'table' THEN 'TABLE'
               WHEN 'view' THEN 'VIEW'
               WHEN 'virtual' THEN 'VIRTUAL TABLE'
               WHEN 'shadow' THEN 'SYSTEM TABLE'
               ELSE upper(type)
           END AS table_type
    FROM pragma_table_list
    WHERE schema = ?1
      AND name NOT LIKE 'sqlite_%'
    ORDER BY name
"#;

pub(super) const COLUMNS: &str = r#"
    SELECT ?1 AS table_schem,
           ?2 AS table_name,
           name AS column_name,
           cid + 1 AS ordinal_position,
           type AS type_name,
           CASE WHEN "notnull" = 1 THEN 'NO' ELSE 'YES' END AS is_nullable,
           dflt_value AS column_def,
           CASE WHEN pk = 1 AND upper(type) = 'INTEGER' THEN 'YES' ELSE 'NO' END AS is_autoincrement
    FROM pragma_table_info(?2, ?1)
    ORDER BY cid
"#;

pub(super) const PRIMARY_KEYS: &str = r#"
    SELECT ?1 AS table_schem,
           ?2 AS table_name,
           name AS column_name,
           pk AS key_seq
    FROM pragma_table_info(?2, ?1)
    WHERE pk > 0
    ORDER BY pk
"#;

// An omitted parent column list references the parent's primary key.
pub(super) const IMPORTED_KEYS: &str = r#"
    SELECT ?2 || '_' || fk.id || '_fkey' AS fk_name,
           ?1 AS fktable_schem,
           ?2 AS fktable_name,
           fk."from" AS fkcolumn_name,
           ?1 AS pktable_schem,
           fk."table" AS pktable_name,
           COALESCE(
               fk."to",
               (SELECT p.name FROM pragma_table_info(fk."table", ?1) p WHERE p.pk = fk.seq + 1)
           ) AS pkcolumn_name,
           fk.seq + 1 AS key_seq,
           fk.on_update AS update_rule,
           fk.on_delete AS delete_rule
    FROM pragma_foreign_key_list(?2, ?1) fk
    ORDER BY fk.id, fk.seq
"#;

pub(super) const INDEXES: &str = r#"
    SELECT ?1 AS table_schem,
           ?2 AS table_name,
           il.name AS index_name,
           CASE WHEN il."unique" = 1 THEN 'NO' ELSE 'YES' END AS non_unique,
           ix.name AS column_name,
           ix.seqno + 1 AS ordinal_position,
           CASE WHEN ix."desc" = 1 THEN 'D' ELSE 'A' END AS asc_or_desc,
           il.origin AS index_type
    FROM pragma_index_list(?2, ?1) il
    JOIN pragma_index_xinfo(il.name, ?1) ix ON ix."key" = 1
    ORDER BY il.name, ix.seqno
"#;
