//! System catalog queries behind the standard metadata calls.
//!
//! Every value is cast to a type the row helpers decode directly; `$1` is
//! the schema name and `$2` the table name.

pub(super) const SCHEMAS: &str = r#"
    SELECT current_database()::text AS table_catalog,
           n.nspname::text AS table_schem
    FROM pg_catalog.pg_namespace n
    ORDER BY n.nspname
"#;

pub(super) const TABLES: &str = r#"
    SELECT current_database()::text AS table_cat,
           n.nspname::text AS table_schem,
           c.relname::text AS table_name,
           CASE c.relkind
               WHEN 'r' THEN 'TABLE'
               WHEN 'p' THEN 'PARTITIONED TABLE'
               WHEN 'v' THEN 'VIEW'
               WHEN 'm' THEN 'MATERIALIZED VIEW'
               WHEN 'f' THEN 'FOREIGN TABLE'
           END AS table_type,
           pg_catalog.obj_description(c.oid, 'pg_class')::text AS remarks
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1
      AND c.relkind IN ('r', 'p', 'v', 'm', 'f')
    ORDER BY c.relname
"#;

pub(super) const COLUMNS: &str = r#"
    SELECT n.nspname::text AS table_schem,
           c.relname::text AS table_name,
           a.attname::text AS column_name,
           a.attnum::int AS ordinal_position,
           pg_catalog.format_type(a.atttypid, a.atttypmod)::text AS type_name,
           CASE WHEN t.typcategory = 'S' AND a.atttypmod > 4 THEN a.atttypmod - 4 END AS column_size,
           CASE WHEN t.typname = 'numeric' AND a.atttypmod > 4 THEN (a.atttypmod - 4) & 65535 END AS decimal_digits,
           CASE WHEN a.attnotnull THEN 'NO' ELSE 'YES' END AS is_nullable,
           pg_catalog.pg_get_expr(d.adbin, d.adrelid)::text AS column_def,
           pg_catalog.col_description(c.oid, a.attnum)::text AS remarks,
           CASE
               WHEN a.attidentity <> '' THEN 'YES'
               WHEN pg_catalog.pg_get_expr(d.adbin, d.adrelid) LIKE 'nextval(%' THEN 'YES'
               ELSE 'NO'
           END AS is_autoincrement
    FROM pg_catalog.pg_attribute a
    JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
    LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
    WHERE n.nspname = $1
      AND c.relname = $2
      AND a.attnum > 0
      AND NOT a.attisdropped
    ORDER BY a.attnum
"#;

pub(super) const PRIMARY_KEYS: &str = r#"
    SELECT n.nspname::text AS table_schem,
           c.relname::text AS table_name,
           a.attname::text AS column_name,
           k.ord::int AS key_seq,
           con.conname::text AS pk_name
    FROM pg_catalog.pg_constraint con
    JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
    WHERE con.contype = 'p'
      AND n.nspname = $1
      AND c.relname = $2
    ORDER BY k.ord
"#;

pub(super) const IMPORTED_KEYS: &str = r#"
    SELECT con.conname::text AS fk_name,
           fn.nspname::text AS fktable_schem,
           fc.relname::text AS fktable_name,
           fa.attname::text AS fkcolumn_name,
           pn.nspname::text AS pktable_schem,
           pc.relname::text AS pktable_name,
           pa.attname::text AS pkcolumn_name,
           k.ord::int AS key_seq,
           CASE con.confupdtype
               WHEN 'c' THEN 'CASCADE'
               WHEN 'n' THEN 'SET NULL'
               WHEN 'd' THEN 'SET DEFAULT'
               WHEN 'r' THEN 'RESTRICT'
               ELSE 'NO ACTION'
           END AS update_rule,
           CASE con.confdeltype
               WHEN 'c' THEN 'CASCADE'
               WHEN 'n' THEN 'SET NULL'
               WHEN 'd' THEN 'SET DEFAULT'
               WHEN 'r' THEN 'RESTRICT'
               ELSE 'NO ACTION'
           END AS delete_rule
    FROM pg_catalog.pg_constraint con
    JOIN pg_catalog.pg_class fc ON fc.oid = con.conrelid
    JOIN pg_catalog.pg_namespace fn ON fn.oid = fc.relnamespace
    JOIN pg_catalog.pg_class pc ON pc.oid = con.confrelid
    JOIN pg_catalog.pg_namespace pn ON pn.oid = pc.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(fk_attnum, pk_attnum, ord)
    JOIN pg_catalog.pg_attribute fa ON fa.attrelid = con.conrelid AND fa.attnum = k.fk_attnum
    JOIN pg_catalog.pg_attribute pa ON pa.attrelid = con.confrelid AND pa.attnum = k.pk_attnum
    WHERE con.contype = 'f'
      AND fn.nspname = $1
      AND fc.relname = $2
    ORDER BY con.conname, k.ord
"#;

pub(super) const INDEXES: &str = r#"
    SELECT n.nspname::text AS table_schem,
           t.relname::text AS table_name,
           i.relname::text AS index_name,
           CASE WHEN ix.indisunique THEN 'NO' ELSE 'YES' END AS non_unique,
           pg_catalog.pg_get_indexdef(ix.indexrelid, k.ord, true)::text AS column_name,
           k.ord AS ordinal_position,
           CASE WHEN (ix.indoption[k.ord - 1]::int & 1) = 1 THEN 'D' ELSE 'A' END AS asc_or_desc,
           am.amname::text AS index_type
    FROM pg_catalog.pg_index ix
    JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
    JOIN pg_catalog.pg_am am ON am.oid = i.relam
    CROSS JOIN LATERAL generate_series(1, ix.indnkeyatts::int) AS k(ord)
    WHERE n.nspname = $1
      AND t.relname = $2
    ORDER BY i.relname, k.ord
"#;

pub(super) const ROUTINES: &str = r#"
    SELECT n.nspname::text AS routine_schem,
           p.proname::text AS routine_name,
           (p.proname || '_' || p.oid)::text AS specific_name,
           CASE p.prokind WHEN 'p' THEN 'PROCEDURE' ELSE 'FUNCTION' END AS routine_type,
           pg_catalog.obj_description(p.oid, 'pg_proc')::text AS remarks,
           p.prosrc::text AS routine_definition
    FROM pg_catalog.pg_proc p
    JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
    WHERE n.nspname = $1
      AND p.prokind IN ('f', 'p')
    ORDER BY p.proname, p.oid
"#;

pub(super) const ROUTINE_COLUMNS: &str = r#"
    SELECT specific_schema::text AS routine_schem,
           specific_name::text AS specific_name,
           parameter_name::text AS column_name,
           ordinal_position::int AS ordinal_position,
           parameter_mode::text AS column_type,
           data_type::text AS type_name
    FROM information_schema.parameters
    WHERE specific_schema = $1
    ORDER BY specific_name, ordinal_position
"#;
