//! Browsing helpers over a served collection: search, filter, sort, and
//! the URL/text helpers used when rendering a prompt.

use crate::likes::LikedPrompts;
use crate::models::Prompt;
use std::cmp::Ordering;
use std::str::FromStr;

pub const SITE_BASE_URL: &str = "https://viralprompts.in";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    MostCopied,
    /// Highest id first; ids grow as prompts are added upstream.
    Newest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "most-copied" => Ok(SortOrder::MostCopied),
            "newest" => Ok(SortOrder::Newest),
            other => Err(format!(
                "unknown sort order '{}' (expected most-copied or newest)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogueQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub liked_only: bool,
    pub sort: SortOrder,
}

impl CatalogueQuery {
    /// Filters and sorts `prompts`. `likes` is consulted only for `liked_only`.
    pub fn apply<'a>(
        &self,
        prompts: &'a [Prompt],
        likes: Option<&LikedPrompts>,
    ) -> Vec<&'a Prompt> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let category = self.category.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let mut matches: Vec<&Prompt> = prompts
            .iter()
            .filter(|p| needle.as_deref().map_or(true, |n| matches_search(p, n)))
            .filter(|p| category.map_or(true, |c| in_category(p, c)))
            .filter(|p| !self.liked_only || likes.map_or(false, |l| l.is_liked(&p.url_title)))
            .collect();

        sort_prompts(&mut matches, self.sort);
        matches
    }
}

pub fn sort_prompts(prompts: &mut [&Prompt], order: SortOrder) {
    match order {
        SortOrder::MostCopied => prompts.sort_by(|a, b| {
            let a = a.copied_count.unwrap_or(0.0);
            let b = b.copied_count.unwrap_or(0.0);
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        }),
        SortOrder::Newest => {
            prompts.sort_by(|a, b| b.id.partial_cmp(&a.id).unwrap_or(Ordering::Equal))
        }
    }
}

fn matches_search(prompt: &Prompt, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);
    contains(&prompt.title)
        || prompt.description.as_deref().map_or(false, |d| contains(d))
        || contains(&prompt.prompt)
        || prompt.categories().iter().any(|c| contains(c.as_str()))
}

fn in_category(prompt: &Prompt, category: &str) -> bool {
    prompt.categories().iter().any(|c| c.eq_ignore_ascii_case(category))
}

/// Every distinct category in feed order.
pub fn categories(prompts: &[Prompt]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for category in prompts.iter().flat_map(|p| p.categories()) {
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(category)) {
            seen.push(category);
        }
    }
    seen
}

/// Absolute URL for a prompt image, or `None` when there is no image.
pub fn image_url(image_path: Option<&str>) -> Option<String> {
    let path = image_path.filter(|p| !p.trim().is_empty())?;
    let path = path.strip_prefix('/').unwrap_or(path);
    Some(format!("{}/{}", SITE_BASE_URL, path))
}

/// Public page of a prompt; the site root when the slug is empty.
pub fn canonical_url(url_title: &str) -> String {
    if url_title.trim().is_empty() {
        return SITE_BASE_URL.to_string();
    }
    let slug = url_title.strip_prefix('/').unwrap_or(url_title);
    format!("{}/{}", SITE_BASE_URL, slug)
}

/// Splits `howToUse` text into trimmed, non-empty steps.
pub fn how_to_use_steps(how_to_use: Option<&str>) -> Vec<&str> {
    how_to_use
        .map(|text| text.lines().map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}
