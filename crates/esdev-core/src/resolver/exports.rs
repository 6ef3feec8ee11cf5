//! package.json `exports` / `imports` evaluation.
//!
//! Follows the Node.js algorithm closely enough for browser builds:
//! - string, array and conditions-object targets
//! - exact subpath keys (`"./feature"`)
//! - single-`*` pattern keys, most specific first
//! - legacy folder keys ending in `/`
//!
//! Conditions are matched in the order the package lists them, so the
//! `serde_json` map must preserve insertion order.

use serde_json::{Map, Value};

/// Resolve `subpath` (`"."` or `"./..."`) against an `exports` value.
///
/// Returns the package-relative target (starting with `./`).
#[must_use]
pub fn resolve_package_exports(
    exports: &Value,
    subpath: &str,
    conditions: &[String],
) -> Option<String> {
    // Sugar: a string, array or bare conditions object maps the root only.
    let Some(obj) = exports.as_object().filter(|o| has_subpath_keys(o)) else {
        return if subpath == "." {
            resolve_target(exports, conditions, None, false)
        } else {
            None
        };
    };

    resolve_in_map(obj, subpath, conditions, false)
}

/// Resolve a `#`-prefixed specifier against the package.json `imports` field.
///
/// Unlike `exports`, targets may name another package (`"#dep": "lodash"`).
#[must_use]
pub fn resolve_package_imports(
    imports: &Value,
    specifier: &str,
    conditions: &[String],
) -> Option<String> {
    if !specifier.starts_with('#') || specifier == "#" || specifier.starts_with("#/") {
        return None;
    }
    resolve_in_map(imports.as_object()?, specifier, conditions, true)
}

fn resolve_in_map(
    obj: &Map<String, Value>,
    key: &str,
    conditions: &[String],
    allow_bare: bool,
) -> Option<String> {
    if let Some(target) = obj.get(key) {
        if !key.contains('*') {
            return resolve_target(target, conditions, None, allow_bare);
        }
    }

    if let Some((target, star)) = best_pattern_match(obj, key) {
        return resolve_target(target, conditions, Some(&star), allow_bare);
    }

    // Legacy folder mappings: { "./dir/": "./lib/dir/" }
    let folder = obj
        .iter()
        .filter(|(k, _)| k.ends_with('/') && key.starts_with(k.as_str()))
        .max_by_key(|(k, _)| k.len());
    if let Some((k, target)) = folder {
        let rest = &key[k.len()..];
        let base = resolve_target(target, conditions, None, false)?;
        if !base.ends_with('/') {
            return None;
        }
        return validate_target(&format!("{base}{rest}"), false);
    }

    None
}

/// Whether an exports object is keyed by subpaths rather than conditions.
fn has_subpath_keys(obj: &Map<String, Value>) -> bool {
    obj.keys().any(|k| k.starts_with('.'))
}

/// Pick the pattern key that matches `key` with the longest prefix.
fn best_pattern_match<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<(&'a Value, String)> {
    let mut best: Option<(&str, &Value, String)> = None;

    for (pattern, value) in obj {
        if pattern.matches('*').count() != 1 {
            continue;
        }
        let Some(star) = match_pattern(pattern, key) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((current, _, _)) => pattern_key_order(pattern, current).is_lt(),
        };
        if better {
            best = Some((pattern.as_str(), value, star));
        }
    }

    best.map(|(_, value, star)| (value, star))
}

/// Node's PATTERN_KEY_COMPARE: longer prefix first, then longer key.
fn pattern_key_order(a: &str, b: &str) -> std::cmp::Ordering {
    let prefix_len = |k: &str| k.find('*').unwrap_or(k.len());
    prefix_len(b)
        .cmp(&prefix_len(a))
        .then_with(|| b.len().cmp(&a.len()))
}

/// Match `key` against a single-`*` pattern and return the star value.
fn match_pattern(pattern: &str, key: &str) -> Option<String> {
    let (prefix, suffix) = pattern.split_once('*')?;

    if key.len() < prefix.len() + suffix.len() + 1 {
        return None;
    }
    if !key.starts_with(prefix) || !key.ends_with(suffix) {
        return None;
    }

    Some(key[prefix.len()..key.len() - suffix.len()].to_string())
}

/// Resolve a target value: string, fallback array, or conditions object.
fn resolve_target(
    target: &Value,
    conditions: &[String],
    star: Option<&str>,
    allow_bare: bool,
) -> Option<String> {
    match target {
        Value::String(s) => {
            let path = match star {
                Some(v) => s.replace('*', v),
                None => s.clone(),
            };
            validate_target(&path, allow_bare)
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| resolve_target(item, conditions, star, allow_bare)),
        Value::Object(obj) => obj.iter().find_map(|(cond, value)| {
            if cond == "default" || conditions.iter().any(|c| c == cond) {
                resolve_target(value, conditions, star, allow_bare)
            } else {
                None
            }
        }),
        _ => None,
    }
}

/// Targets must stay inside the package, or name a package when `allow_bare`.
fn validate_target(path: &str, allow_bare: bool) -> Option<String> {
    if !path.starts_with("./") {
        let bare = !path.is_empty() && !path.starts_with(['.', '/']) && !path.contains(':');
        return (allow_bare && bare).then(|| path.to_string());
    }
    if path
        .split('/')
        .skip(1)
        .any(|seg| seg == ".." || seg == "node_modules")
    {
        return None;
    }
    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_string_exports_root_only() {
        let exports = json!("./dist/index.js");
        let c = conds(&["import"]);
        assert_eq!(
            resolve_package_exports(&exports, ".", &c),
            Some("./dist/index.js".to_string())
        );
        assert_eq!(resolve_package_exports(&exports, "./feature", &c), None);
    }

    #[test]
    fn test_conditions_follow_package_order() {
        let exports = json!({
            ".": {
                "node": "./node.js",
                "browser": "./browser.js",
                "import": "./esm.js",
                "default": "./cjs.js"
            }
        });

        assert_eq!(
            resolve_package_exports(&exports, ".", &conds(&["import", "browser"])),
            Some("./browser.js".to_string())
        );
        assert_eq!(
            resolve_package_exports(&exports, ".", &conds(&["import"])),
            Some("./esm.js".to_string())
        );
        assert_eq!(
            resolve_package_exports(&exports, ".", &conds(&[])),
            Some("./cjs.js".to_string())
        );
    }

    #[test]
    fn test_root_conditions_sugar() {
        let exports = json!({ "import": "./esm.js", "require": "./cjs.js" });
        assert_eq!(
            resolve_package_exports(&exports, ".", &conds(&["import"])),
            Some("./esm.js".to_string())
        );
    }

    #[test]
    fn test_nested_conditions_and_arrays() {
        let exports = json!({
            "./feature": [
                { "worker": "./worker.js" },
                { "browser": { "import": "./feature.browser.mjs" } },
                "./feature.js"
            ]
        });
        assert_eq!(
            resolve_package_exports(&exports, "./feature", &conds(&["browser", "import"])),
            Some("./feature.browser.mjs".to_string())
        );
        assert_eq!(
            resolve_package_exports(&exports, "./feature", &conds(&["import"])),
            Some("./feature.js".to_string())
        );
    }

    #[test]
    fn test_pattern_most_specific_wins() {
        let exports = json!({
            "./*": "./dist/*.js",
            "./internal/*": "./dist/private/*.js"
        });
        let c = conds(&["import"]);
        assert_eq!(
            resolve_package_exports(&exports, "./internal/x", &c),
            Some("./dist/private/x.js".to_string())
        );
        assert_eq!(
            resolve_package_exports(&exports, "./button", &c),
            Some("./dist/button.js".to_string())
        );
    }

    #[test]
    fn test_exact_key_beats_pattern() {
        let exports = json!({
            "./*": "./dist/*.js",
            "./special": "./special/index.js"
        });
        assert_eq!(
            resolve_package_exports(&exports, "./special", &conds(&[])),
            Some("./special/index.js".to_string())
        );
    }

    #[test]
    fn test_folder_mapping() {
        let exports = json!({ "./icons/": "./assets/icons/" });
        assert_eq!(
            resolve_package_exports(&exports, "./icons/close.js", &conds(&[])),
            Some("./assets/icons/close.js".to_string())
        );
    }

    #[test]
    fn test_rejects_escaping_targets() {
        let exports = json!({ "./*": "./dist/*" });
        assert_eq!(
            resolve_package_exports(&exports, "./../secret", &conds(&[])),
            None
        );
        let exports = json!({ ".": "../outside.js" });
        assert_eq!(resolve_package_exports(&exports, ".", &conds(&[])), None);
    }

    #[test]
    fn test_null_target_blocks_subpath() {
        let exports = json!({ "./*": "./dist/*.js", "./private/*": null });
        assert_eq!(
            resolve_package_exports(&exports, "./private/x", &conds(&[])),
            None
        );
    }

    #[test]
    fn test_imports_map() {
        let imports = json!({
            "#dep": { "browser": "./shims/dep.js", "default": "./src/dep.js" },
            "#utils/*": "./src/utils/*.js"
        });
        assert_eq!(
            resolve_package_imports(&imports, "#dep", &conds(&["browser"])),
            Some("./shims/dep.js".to_string())
        );
        assert_eq!(
            resolve_package_imports(&imports, "#utils/date", &conds(&[])),
            Some("./src/utils/date.js".to_string())
        );
        assert_eq!(resolve_package_imports(&imports, "#missing", &conds(&[])), None);
        assert_eq!(resolve_package_imports(&imports, "dep", &conds(&[])), None);
    }

    #[test]
    fn test_imports_bare_target() {
        let imports = json!({ "#lodash": "lodash-es", "#bad": "/abs.js" });
        assert_eq!(
            resolve_package_imports(&imports, "#lodash", &conds(&[])),
            Some("lodash-es".to_string())
        );
        assert_eq!(resolve_package_imports(&imports, "#bad", &conds(&[])), None);

        let exports = json!({ ".": "lodash-es" });
        assert_eq!(resolve_package_exports(&exports, ".", &conds(&[])), None);
    }
}
