use super::super::hast::{text_content, visit_elements_mut};
use super::super::pipeline::{Stage, Tree, VFile};
use crate::error::MdjsError;
use rustc_hash::FxHashMap as HashMap;

/// GitHub-style heading slugs with `-1`, `-2`, ... for repeats.
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for `value`, unique among the slugs this slugger handed out.
    pub fn slug(&mut self, value: &str) -> String {
        let original = slugify(value);
        let mut slug = original.clone();

        while self.occurrences.contains_key(&slug) {
            let count = self.occurrences.entry(original.clone()).or_insert(0);
            *count += 1;
            slug = format!("{original}-{count}");
        }
        self.occurrences.insert(slug.clone(), 0);
        slug
    }
}

/// Lowercase, drop punctuation, spaces to hyphens.
fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

/// Adds an `id` to every heading that has none.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugStage;

impl Stage for SlugStage {
    fn run(&self, tree: Tree, _file: &mut VFile) -> Result<Tree, MdjsError> {
        let mut nodes = tree.into_html()?;
        let mut slugger = Slugger::new();

        visit_elements_mut(&mut nodes, &mut |el| {
            if el.heading_rank().is_some() && el.attr("id").is_none() {
                let id = slugger.slug(&text_content(&el.children));
                el.set_attr("id", Some(id));
            }
        });

        Ok(Tree::Html(nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's `new`?"), "whats-new");
        assert_eq!(slugify("Über  Café"), "über--café");
        assert_eq!(slugify("snake_case-ok"), "snake_case-ok");
    }

    #[test]
    fn test_repeats_get_counters() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Intro"), "intro");
        assert_eq!(slugger.slug("Intro"), "intro-1");
        assert_eq!(slugger.slug("Intro"), "intro-2");
        assert_eq!(slugger.slug("Intro 1"), "intro-1-1");
    }
}
