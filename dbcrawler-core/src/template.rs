//! `${name}` variable substitution.
//!
//! Used for connection URL templates, layered configuration and SQL
//! resources. Substitution is a single left-to-right pass over the template;
//! a variable whose value itself contains placeholders is expanded
//! recursively. Placeholders that cannot be resolved, including those that
//! would recurse into themselves, are left verbatim so that
//! [`extract_unresolved_variables`] can report them.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Pre-compiled placeholder pattern.
#[allow(clippy::expect_used)]
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]*)\}").expect("Invalid placeholder pattern"))
}

/// Expands every `${name}` in `template` from `pool`.
///
/// ```rust
/// use std::collections::BTreeMap;
/// use dbcrawler_core::template::expand_template;
///
/// let mut pool = BTreeMap::new();
/// pool.insert("host".to_string(), "localhost".to_string());
/// assert_eq!(
///     expand_template("postgres://${host}/${db}", &pool),
///     "postgres://localhost/${db}"
/// );
/// ```
pub fn expand_template(template: &str, pool: &BTreeMap<String, String>) -> String {
    let mut in_progress = Vec::new();
    expand_with_guard(template, pool, &mut in_progress)
}

fn expand_with_guard(
    template: &str,
    pool: &BTreeMap<String, String>,
    in_progress: &mut Vec<String>,
) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut last = 0;

    for captures in placeholder_pattern().captures_iter(template) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        expanded.push_str(&template[last..whole.start()]);
        last = whole.end();

        let name = name.as_str();
        match pool.get(name) {
            Some(value) if !in_progress.iter().any(|n| n == name) => {
                in_progress.push(name.to_string());
                expanded.push_str(&expand_with_guard(value, pool, in_progress));
                in_progress.pop();
            }
            _ => expanded.push_str(whole.as_str()),
        }
    }

    expanded.push_str(&template[last..]);
    expanded
}

/// Substitutes variables in every value of `map`, using the map itself as
/// the variable pool.
pub fn substitute_variables(map: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(key, value)| (key.clone(), expand_template(value, map)))
        .collect()
}

/// Substitutes variables in every value of `map`, resolving from `pool`
/// overlaid with `map` (entries of `map` win).
pub fn substitute_with_pool(
    map: &BTreeMap<String, String>,
    pool: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut combined = pool.clone();
    combined.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
    map.iter()
        .map(|(key, value)| (key.clone(), expand_template(value, &combined)))
        .collect()
}

/// Returns the names of all `${...}` placeholders still present in `s`.
pub fn extract_unresolved_variables(s: &str) -> BTreeSet<String> {
    placeholder_pattern()
        .captures_iter(s)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pool(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_expand_simple() {
        let vars = pool(&[("host", "db.local"), ("port", "5432")]);
        assert_eq!(
            expand_template("postgresql://${host}:${port}/app", &vars),
            "postgresql://db.local:5432/app"
        );
    }

    #[test]
    fn test_expand_nested_reference() {
        let vars = pool(&[("url", "sqlite://${dir}/app.db"), ("dir", "/var/lib")]);
        assert_eq!(expand_template("${url}", &vars), "sqlite:///var/lib/app.db");
    }

    #[test]
    fn test_unresolved_left_verbatim() {
        let vars = pool(&[("host", "localhost")]);
        let expanded = expand_template("${host}/${database}", &vars);
        assert_eq!(expanded, "localhost/${database}");
        assert_eq!(
            extract_unresolved_variables(&expanded),
            BTreeSet::from(["database".to_string()])
        );
    }

    #[test]
    fn test_cycle_is_left_verbatim() {
        let vars = pool(&[("a", "${b}"), ("b", "${a}")]);
        let expanded = expand_template("${a}", &vars);
        assert_eq!(expanded, "${a}");
    }

    #[test]
    fn test_substitute_variables_uses_own_map() {
        let map = pool(&[
            ("host", "localhost"),
            ("url", "postgresql://${host}/${database}"),
        ]);
        let substituted = substitute_variables(&map);
        assert_eq!(
            substituted.get("url").map(String::as_str),
            Some("postgresql://localhost/${database}")
        );
    }

    #[test]
    fn test_substitute_with_pool_map_wins() {
        let map = pool(&[("host", "primary"), ("url", "${host}:${port}")]);
        let env = pool(&[("host", "ignored"), ("port", "6543")]);
        let substituted = substitute_with_pool(&map, &env);
        assert_eq!(
            substituted.get("url").map(String::as_str),
            Some("primary:6543")
        );
    }

    #[test]
    fn test_extract_finds_every_occurrence() {
        let names = extract_unresolved_variables("${a}-${b}-${a}-${}");
        assert_eq!(
            names,
            BTreeSet::from(["a".to_string(), "b".to_string(), String::new()])
        );
        assert!(extract_unresolved_variables("no placeholders $ {x}").is_empty());
    }

    proptest! {
        #[test]
        fn prop_resolved_templates_have_no_placeholders(
            vars in prop::collection::btree_map("[a-z]{1,6}", "[a-zA-Z0-9/:.]{0,8}", 1..6),
            literal in "[a-zA-Z0-9 /:.]{0,12}",
        ) {
            let mut template = literal.clone();
            for name in vars.keys() {
                template.push_str(&format!("${{{}}}{}", name, literal));
            }
            let expanded = expand_template(&template, &vars);
            prop_assert!(extract_unresolved_variables(&expanded).is_empty());
        }

        #[test]
        fn prop_missing_variable_is_reported(
            vars in prop::collection::btree_map("[a-z]{1,6}", "[a-zA-Z0-9]{0,8}", 0..6),
            missing in "[A-Z]{1,6}",
        ) {
            let mut template = String::new();
            for name in vars.keys() {
                template.push_str(&format!("${{{}}}/", name));
            }
            template.push_str(&format!("${{{}}}", missing));
            let expanded = expand_template(&template, &vars);
            prop_assert_eq!(
                extract_unresolved_variables(&expanded),
                BTreeSet::from([missing])
            );
        }
    }
}
