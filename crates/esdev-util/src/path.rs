//! Lexical path arithmetic.
//!
//! Nothing here touches the filesystem: paths are compared component by
//! component after collapsing `.` and `..`.

use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// A `..` that would climb above the root is dropped; a leading `..` in a
/// relative path is kept.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    out.iter().collect()
}

/// Compute the path that leads from directory `from` to `to`.
///
/// Mirrors Node's `path.relative`: identical paths give an empty path, and
/// paths on different roots (Windows drives) return `to` unchanged.
#[must_use]
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize(from);
    let to = normalize(to);

    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    let different_root = match (from_parts.first(), to_parts.first()) {
        (Some(Component::Prefix(a)), Some(Component::Prefix(b))) => a != b,
        _ => false,
    };
    if different_root {
        return to;
    }

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// Convert a filesystem path into the forward-slash form browsers expect.
#[must_use]
pub fn to_browser_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(MAIN_SEPARATOR, "/")
    }
}
