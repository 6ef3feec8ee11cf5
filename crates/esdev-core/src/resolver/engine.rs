//! Node-style module resolution for browser builds.
//!
//! Supports:
//! - Relative (`./`, `../`) and absolute specifiers, with `/`-prefixed
//!   specifiers falling back to the project root
//! - Extension probing in configured order
//! - Directory resolution (`package.json` main fields, then `index.*`)
//! - Bare specifiers through the configured module directories
//! - package.json `exports` (conditions, subpaths, patterns) and `imports`
//! - The `browser` field, as an entry point and as a file remapping table
//! - Node builtins, either external or looked up as polyfills

use super::builtins::is_builtin;
use super::exports::{resolve_package_exports, resolve_package_imports};
use super::pkg_json_cache::PkgJsonCache;
use super::{ResolveEngine, ResolveIdResult};
use crate::config::NodeResolveOptions;
use esdev_util::path::{normalize, relative_path, to_browser_path};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Conditions always active for `exports`/`imports`, besides `default`.
const BASE_CONDITIONS: &[&str] = &["module", "import"];

/// Resolver configuration, fixed at server start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Project root; target of `/`-prefixed specifiers.
    pub root_dir: PathBuf,
    /// Extensions to probe, in order, each with a leading dot.
    pub extensions: Vec<String>,
    /// Builtins resolve to external ids without looking for polyfills.
    pub prefer_builtins: bool,
    /// Honor the `browser` field.
    pub browser: bool,
    /// package.json fields consulted for entry points, in order.
    pub main_fields: Vec<String>,
    /// Directory names searched for bare specifiers.
    pub module_directories: Vec<String>,
    /// Active `exports` conditions (besides `default`), in priority order.
    pub conditions: Vec<String>,
    /// Keep symlinked paths instead of canonicalizing.
    pub preserve_symlinks: bool,
}

impl ResolverConfig {
    /// Merge dev server settings with user-supplied resolver options.
    #[must_use]
    pub fn from_options(
        root_dir: &Path,
        file_extensions: &[String],
        opts: &NodeResolveOptions,
    ) -> Self {
        let mut main_fields = opts.main_fields.clone();
        if opts.browser && !main_fields.iter().any(|f| f == "browser") {
            main_fields.insert(0, "browser".to_string());
        }

        let mut conditions = opts.export_conditions.clone();
        if opts.browser {
            conditions.push("browser".to_string());
        }
        conditions.extend(BASE_CONDITIONS.iter().map(|c| (*c).to_string()));
        conditions.dedup();

        Self {
            root_dir: opts
                .root_dir
                .clone()
                .unwrap_or_else(|| root_dir.to_path_buf()),
            extensions: opts
                .extensions
                .clone()
                .unwrap_or_else(|| file_extensions.to_vec()),
            prefer_builtins: opts.prefer_builtins.unwrap_or(false),
            browser: opts.browser,
            main_fields,
            module_directories: opts.module_directories.clone(),
            conditions,
            preserve_symlinks: opts.custom_resolve_options.preserve_symlinks,
        }
    }
}

/// Outcome of consulting a package's `browser` remapping table.
enum BrowserRemap {
    Unchanged,
    Replaced(PathBuf),
    Disabled,
}

/// The package-resolution engine used by the dev server.
#[derive(Debug)]
pub struct NodeResolver {
    config: ResolverConfig,
    pkg_json: PkgJsonCache,
}

impl NodeResolver {
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            pkg_json: PkgJsonCache::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `source` as imported from the file `importer`.
    #[must_use]
    pub fn resolve(&self, source: &str, importer: &Path) -> Option<ResolveIdResult> {
        if source.is_empty() || source.starts_with('\0') {
            return None;
        }

        let base_dir = importer.parent().unwrap_or(&self.config.root_dir);
        trace!(source, base = %base_dir.display(), "resolving");

        let resolved = if source.starts_with('#') {
            self.resolve_hash_import(source, base_dir)
        } else if is_relative(source) {
            self.resolve_local(&base_dir.join(source))
        } else if let Some(rooted) = source.strip_prefix('/') {
            self.resolve_local(Path::new(source))
                .or_else(|| self.resolve_local(&self.config.root_dir.join(rooted)))
        } else if Path::new(source).is_absolute() {
            self.resolve_local(Path::new(source))
        } else {
            return self.resolve_bare(source, base_dir);
        };

        resolved.map(|path| self.finish(&path))
    }

    /// Resolve a bare specifier, handling builtins.
    fn resolve_bare(&self, source: &str, base_dir: &Path) -> Option<ResolveIdResult> {
        let builtin = is_builtin(source);
        if builtin && self.config.prefer_builtins {
            debug!(source, "builtin kept external");
            return Some(ResolveIdResult::external(source));
        }

        match self.resolve_node_modules(source, base_dir) {
            Some(path) => Some(self.finish(&path)),
            None if builtin => {
                warn!(
                    source,
                    "builtin module has no browser polyfill in node_modules; treating as external"
                );
                Some(ResolveIdResult::external(source))
            }
            None => None,
        }
    }

    /// Relative or absolute path, followed by the owning package's browser map.
    fn resolve_local(&self, base: &Path) -> Option<PathBuf> {
        let path = self.resolve_path(&normalize(base))?;
        if !self.config.browser {
            return Some(path);
        }

        let Some((pkg_dir, pkg)) = path.parent().and_then(|d| self.nearest_package(d)) else {
            return Some(path);
        };
        match self.browser_remap(&pkg_dir, &pkg, &path) {
            BrowserRemap::Unchanged => Some(path),
            BrowserRemap::Replaced(p) => Some(p),
            BrowserRemap::Disabled => None,
        }
    }

    /// `#name` through the nearest package.json `imports` field.
    fn resolve_hash_import(&self, source: &str, base_dir: &Path) -> Option<PathBuf> {
        let (pkg_dir, pkg) = self.nearest_package(base_dir)?;
        let imports = pkg.get("imports")?;
        let target = resolve_package_imports(imports, source, &self.config.conditions)?;
        trace!(source, target = %target, "imports field match");

        if target.starts_with("./") {
            self.resolve_file(&pkg_dir.join(&target[2..]))
        } else {
            self.resolve_node_modules(&target, &pkg_dir)
        }
    }

    /// Walk up from `base_dir` looking for the package in module directories.
    fn resolve_node_modules(&self, source: &str, base_dir: &Path) -> Option<PathBuf> {
        let (pkg_name, subpath) = parse_bare_specifier(source);
        let mut current = Some(base_dir);

        while let Some(dir) = current {
            current = dir.parent();

            for modules in &self.config.module_directories {
                if dir.file_name().is_some_and(|n| n == modules.as_str()) {
                    continue;
                }
                let pkg_dir = dir.join(modules).join(pkg_name);
                if !pkg_dir.is_dir() {
                    continue;
                }
                trace!(pkg = %pkg_dir.display(), "package directory found");
                return self.resolve_in_package(&pkg_dir, subpath);
            }
        }

        debug!(source, "package not found in any module directory");
        None
    }

    /// Resolve the root or a subpath of a located package.
    fn resolve_in_package(&self, pkg_dir: &Path, subpath: Option<&str>) -> Option<PathBuf> {
        let pkg = self.pkg_json.read(&pkg_dir.join("package.json"));

        let resolved = match (subpath, pkg.as_deref()) {
            (None, Some(pkg)) => self.resolve_package_entry(pkg_dir, pkg),
            (None, None) => self.resolve_index(pkg_dir),
            (Some(sub), Some(pkg)) if pkg.get("exports").is_some() => {
                let exports = &pkg["exports"];
                let target =
                    resolve_package_exports(exports, &format!("./{sub}"), &self.config.conditions);
                let Some(target) = target else {
                    debug!(pkg = %pkg_dir.display(), subpath = sub, "subpath not exported");
                    return None;
                };
                self.resolve_file(&pkg_dir.join(&target[2..]))
            }
            (Some(sub), _) => self.resolve_path(&pkg_dir.join(sub)),
        }?;

        match pkg {
            Some(pkg) if self.config.browser => match self.browser_remap(pkg_dir, &pkg, &resolved) {
                BrowserRemap::Unchanged => Some(resolved),
                BrowserRemap::Replaced(p) => Some(p),
                BrowserRemap::Disabled => None,
            },
            _ => Some(resolved),
        }
    }

    /// Package entry: `exports` root, then main fields, then `index.*`.
    fn resolve_package_entry(&self, pkg_dir: &Path, pkg: &Value) -> Option<PathBuf> {
        if let Some(exports) = pkg.get("exports") {
            let target = resolve_package_exports(exports, ".", &self.config.conditions)?;
            return self.resolve_file(&pkg_dir.join(&target[2..]));
        }
        self.resolve_main_fields(pkg_dir, pkg)
            .or_else(|| self.resolve_index(pkg_dir))
    }

    fn resolve_main_fields(&self, pkg_dir: &Path, pkg: &Value) -> Option<PathBuf> {
        for field in &self.config.main_fields {
            let Some(entry) = pkg.get(field).and_then(Value::as_str) else {
                continue;
            };
            let candidate = normalize(&pkg_dir.join(entry));
            if candidate == pkg_dir {
                continue;
            }
            let found = self
                .resolve_file(&candidate)
                .or_else(|| candidate.is_dir().then(|| self.resolve_index(&candidate)).flatten());
            if found.is_some() {
                trace!(field = %field, entry, "main field used");
                return found;
            }
        }
        None
    }

    /// A file, or a directory's package entry / index.
    fn resolve_path(&self, base: &Path) -> Option<PathBuf> {
        if let Some(file) = self.resolve_file(base) {
            return Some(file);
        }
        if !base.is_dir() {
            return None;
        }

        match self.pkg_json.read(&base.join("package.json")) {
            Some(pkg) => self
                .resolve_main_fields(base, &pkg)
                .or_else(|| self.resolve_index(base)),
            None => self.resolve_index(base),
        }
    }

    /// Exact file, then the path with each extension appended.
    fn resolve_file(&self, base: &Path) -> Option<PathBuf> {
        if base.is_file() {
            return Some(base.to_path_buf());
        }
        self.config.extensions.iter().find_map(|ext| {
            let candidate = with_appended_extension(base, ext);
            trace!(candidate = %candidate.display(), "probing");
            candidate.is_file().then_some(candidate)
        })
    }

    fn resolve_index(&self, dir: &Path) -> Option<PathBuf> {
        self.resolve_file(&dir.join("index"))
    }

    /// Closest directory at or above `dir` holding a readable package.json.
    fn nearest_package(&self, dir: &Path) -> Option<(PathBuf, Arc<Value>)> {
        let mut current = Some(dir);
        while let Some(d) = current {
            if let Some(pkg) = self.pkg_json.read(&d.join("package.json")) {
                return Some((d.to_path_buf(), pkg));
            }
            current = d.parent();
        }
        None
    }

    /// Apply the object form of the `browser` field to a resolved file.
    fn browser_remap(&self, pkg_dir: &Path, pkg: &Value, file: &Path) -> BrowserRemap {
        let Some(map) = pkg.get("browser").and_then(Value::as_object) else {
            return BrowserRemap::Unchanged;
        };

        let rel = format!("./{}", to_browser_path(&relative_path(pkg_dir, file)));
        let without_ext = Path::new(&rel)
            .extension()
            .map(|ext| rel[..rel.len() - ext.len() - 1].to_string());

        let entry = map
            .get(&rel)
            .or_else(|| without_ext.as_ref().and_then(|k| map.get(k)));
        match entry {
            Some(Value::Bool(false)) => {
                debug!(file = %rel, "disabled by browser field");
                BrowserRemap::Disabled
            }
            Some(Value::String(target)) => match self.resolve_path(&normalize(&pkg_dir.join(target))) {
                Some(p) => {
                    trace!(from = %rel, to = %p.display(), "browser field remap");
                    BrowserRemap::Replaced(p)
                }
                None => BrowserRemap::Unchanged,
            },
            _ => BrowserRemap::Unchanged,
        }
    }

    fn finish(&self, path: &Path) -> ResolveIdResult {
        let path = if self.config.preserve_symlinks {
            path.to_path_buf()
        } else {
            dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
        };
        ResolveIdResult::resolved(path.to_string_lossy())
    }
}

impl ResolveEngine for NodeResolver {
    fn build_start(&mut self, preserve_symlinks: bool) {
        self.config.preserve_symlinks = preserve_symlinks;
    }

    fn resolve_id(&self, source: &str, importer: &Path) -> Option<ResolveIdResult> {
        self.resolve(source, importer)
    }
}

fn is_relative(source: &str) -> bool {
    source == "." || source == ".." || source.starts_with("./") || source.starts_with("../")
}

fn with_appended_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_owned();
    s.push(ext);
    PathBuf::from(s)
}

/// Split a bare specifier into package name and optional subpath.
/// `lodash/fp` → (`lodash`, `fp`), `@scope/pkg/sub` → (`@scope/pkg`, `sub`).
fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    let name_end = if spec.starts_with('@') {
        spec.match_indices('/').nth(1).map(|(i, _)| i)
    } else {
        spec.find('/')
    };

    match name_end {
        Some(i) => (&spec[..i], Some(&spec[i + 1..]).filter(|s| !s.is_empty())),
        None => (spec, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn resolver_with(dir: &TempDir, opts: &NodeResolveOptions) -> NodeResolver {
        let exts = vec![".mjs".to_string(), ".js".to_string()];
        NodeResolver::new(ResolverConfig::from_options(dir.path(), &exts, opts))
    }

    fn resolver(dir: &TempDir) -> NodeResolver {
        resolver_with(dir, &NodeResolveOptions::default())
    }

    fn resolved_path(result: Option<ResolveIdResult>) -> String {
        let result = result.expect("should resolve");
        assert!(!result.external);
        result.id.replace('\\', "/")
    }

    fn importer(dir: &TempDir) -> PathBuf {
        dir.path().join("src").join("app.js")
    }

    #[test]
    fn test_parse_bare_specifier() {
        assert_eq!(parse_bare_specifier("lodash"), ("lodash", None));
        assert_eq!(parse_bare_specifier("lodash/fp"), ("lodash", Some("fp")));
        assert_eq!(parse_bare_specifier("@scope/pkg"), ("@scope/pkg", None));
        assert_eq!(
            parse_bare_specifier("@scope/pkg/a/b"),
            ("@scope/pkg", Some("a/b"))
        );
        assert_eq!(parse_bare_specifier("pkg/"), ("pkg", None));
    }

    #[test]
    fn test_config_from_options() {
        let opts = NodeResolveOptions {
            browser: true,
            export_conditions: vec!["development".to_string()],
            ..Default::default()
        };
        let exts = vec![".js".to_string()];
        let config = ResolverConfig::from_options(Path::new("/srv"), &exts, &opts);

        assert_eq!(config.main_fields, vec!["browser", "module", "main"]);
        assert_eq!(
            config.conditions,
            vec!["development", "browser", "module", "import"]
        );
        assert_eq!(config.extensions, vec![".js"]);
        assert!(!config.prefer_builtins);
    }

    #[test]
    fn test_relative_extension_probing() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/util.mjs", "export {}");
        write(dir.path(), "src/util.js", "export {}");

        let r = resolver(&dir);
        let id = resolved_path(r.resolve("./util", &importer(&dir)));
        assert!(id.ends_with("src/util.mjs"));
    }

    #[test]
    fn test_extension_is_appended_not_replaced() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/styles.css.js", "export default ''");

        let r = resolver(&dir);
        let id = resolved_path(r.resolve("./styles.css", &importer(&dir)));
        assert!(id.ends_with("src/styles.css.js"));
    }

    #[test]
    fn test_directory_index() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/components/index.js", "export {}");

        let r = resolver(&dir);
        let id = resolved_path(r.resolve("./components", &importer(&dir)));
        assert!(id.ends_with("src/components/index.js"));
    }

    #[test]
    fn test_root_relative_specifier() {
        let dir = tempdir().unwrap();
        write(dir.path(), "styles/theme.css.js", "export default ''");

        let r = resolver(&dir);
        let id = resolved_path(r.resolve("/styles/theme.css", &importer(&dir)));
        assert!(id.ends_with("styles/theme.css.js"));
    }

    #[test]
    fn test_bare_prefers_module_field() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "node_modules/pkg/package.json",
            r#"{ "name": "pkg", "main": "index.cjs", "module": "index.mjs" }"#,
        );
        write(dir.path(), "node_modules/pkg/index.cjs", "");
        write(dir.path(), "node_modules/pkg/index.mjs", "");

        let r = resolver(&dir);
        let id = resolved_path(r.resolve("pkg", &importer(&dir)));
        assert!(id.ends_with("node_modules/pkg/index.mjs"));
    }

    #[test]
    fn test_bare_falls_back_to_index() {
        let dir = tempdir().unwrap();
        write(dir.path(), "node_modules/plain/index.js", "");

        let r = resolver(&dir);
        let id = resolved_path(r.resolve("plain", &importer(&dir)));
        assert!(id.ends_with("node_modules/plain/index.js"));
    }

    #[test]
    fn test_bare_walks_up_directories() {
        let dir = tempdir().unwrap();
        write(dir.path(), "node_modules/up/index.js", "");

        let r = resolver(&dir);
        let deep = dir.path().join("src/a/b/c/deep.js");
        let id = resolved_path(r.resolve("up", &deep));
        assert!(id.ends_with("node_modules/up/index.js"));
    }

    #[test]
    fn test_scoped_subpath_without_exports() {
        let dir = tempdir().unwrap();
        write(dir.path(), "node_modules/@scope/ui/package.json", r#"{ "name": "@scope/ui" }"#);
        write(dir.path(), "node_modules/@scope/ui/button.js", "");

        let r = resolver(&dir);
        let id = resolved_path(r.resolve("@scope/ui/button", &importer(&dir)));
        assert!(id.ends_with("node_modules/@scope/ui/button.js"));
    }

    #[test]
    fn test_exports_conditions_and_encapsulation() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "node_modules/lib/package.json",
            r#"{
                "name": "lib",
                "main": "cjs/index.js",
                "exports": {
                    ".": { "require": "./cjs/index.js", "import": "./esm/index.js" },
                    "./feature": "./esm/feature.js"
                }
            }"#,
        );
        write(dir.path(), "node_modules/lib/cjs/index.js", "");
        write(dir.path(), "node_modules/lib/esm/index.js", "");
        write(dir.path(), "node_modules/lib/esm/feature.js", "");
        write(dir.path(), "node_modules/lib/esm/hidden.js", "");

        let r = resolver(&dir);
        let from = importer(&dir);
        assert!(resolved_path(r.resolve("lib", &from)).ends_with("lib/esm/index.js"));
        assert!(resolved_path(r.resolve("lib/feature", &from)).ends_with("lib/esm/feature.js"));
        assert!(r.resolve("lib/esm/hidden.js", &from).is_none());
    }

    #[test]
    fn test_browser_field_string_and_map() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "node_modules/iso/package.json",
            r#"{
                "name": "iso",
                "main": "node.js",
                "browser": "browser.js"
            }"#,
        );
        write(dir.path(), "node_modules/iso/node.js", "");
        write(dir.path(), "node_modules/iso/browser.js", "");

        write(
            dir.path(),
            "node_modules/mapped/package.json",
            r#"{
                "name": "mapped",
                "main": "lib/index.js",
                "browser": { "./lib/index.js": "./lib/index.browser.js", "./lib/fs.js": false }
            }"#,
        );
        write(dir.path(), "node_modules/mapped/lib/index.js", "");
        write(dir.path(), "node_modules/mapped/lib/index.browser.js", "");
        write(dir.path(), "node_modules/mapped/lib/fs.js", "");

        let from = importer(&dir);

        let plain = resolver(&dir);
        assert!(resolved_path(plain.resolve("iso", &from)).ends_with("iso/node.js"));
        assert!(resolved_path(plain.resolve("mapped", &from)).ends_with("mapped/lib/index.js"));

        let browser = resolver_with(
            &dir,
            &NodeResolveOptions {
                browser: true,
                ..Default::default()
            },
        );
        assert!(resolved_path(browser.resolve("iso", &from)).ends_with("iso/browser.js"));
        assert!(resolved_path(browser.resolve("mapped", &from))
            .ends_with("mapped/lib/index.browser.js"));
        assert!(browser.resolve("mapped/lib/fs", &from).is_none());
    }

    #[test]
    fn test_hash_imports() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "package.json",
            r##"{ "name": "app", "imports": { "#config": "./src/config.js" } }"##,
        );
        write(dir.path(), "src/config.js", "");

        let r = resolver(&dir);
        let id = resolved_path(r.resolve("#config", &importer(&dir)));
        assert!(id.ends_with("src/config.js"));
        assert!(r.resolve("#missing", &importer(&dir)).is_none());
    }

    #[test]
    fn test_builtins() {
        let dir = tempdir().unwrap();

        let prefer = resolver_with(
            &dir,
            &NodeResolveOptions {
                prefer_builtins: Some(true),
                ..Default::default()
            },
        );
        let result = prefer.resolve("fs", &importer(&dir)).unwrap();
        assert!(result.external);
        assert_eq!(result.id, "fs");

        // A polyfill in node_modules wins when builtins are not preferred.
        write(dir.path(), "node_modules/path/index.js", "");
        let r = resolver(&dir);
        assert!(resolved_path(r.resolve("path", &importer(&dir))).ends_with("path/index.js"));
        assert!(r.resolve("crypto", &importer(&dir)).unwrap().external);
    }

    #[test]
    fn test_unresolvable() {
        let dir = tempdir().unwrap();
        let r = resolver(&dir);
        assert!(r.resolve("does-not-exist", &importer(&dir)).is_none());
        assert!(r.resolve("./missing", &importer(&dir)).is_none());
        assert!(r.resolve("", &importer(&dir)).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_preserve_symlinks() {
        let dir = tempdir().unwrap();
        write(dir.path(), "packages/real/index.js", "");
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("packages/real"),
            dir.path().join("node_modules/linked"),
        )
        .unwrap();

        let mut r = resolver(&dir);
        let real = resolved_path(r.resolve("linked", &importer(&dir)));
        assert!(real.ends_with("packages/real/index.js"));

        r.build_start(true);
        let kept = resolved_path(r.resolve_id("linked", &importer(&dir)));
        assert!(kept.ends_with("node_modules/linked/index.js"));
    }
}
