use regex::Regex;
use std::sync::OnceLock;

static STRIP_REGEX: OnceLock<Regex> = OnceLock::new();
static DASH_REGEX: OnceLock<Regex> = OnceLock::new();

fn strip_regex() -> &'static Regex {
    STRIP_REGEX.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"))
}

fn dash_regex() -> &'static Regex {
    DASH_REGEX.get_or_init(|| Regex::new(r"[-\s]+").expect("valid slug regex"))
}

/// Derive a URL slug from a title: lower-cased, punctuation dropped, runs of
/// whitespace and dashes collapsed to a single dash.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = strip_regex().replace_all(&lowered, "");
    let dashed = dash_regex().replace_all(stripped.trim(), "-");
    dashed.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Slug for `title`, falling back to `fallback` when nothing usable remains
pub fn slugify_or(title: &str, fallback: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Candidate slugs in order: `base`, `base-2`, `base-3`, ...
pub fn slug_candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((2..).map(move |n| format!("{}-{}", base, n)))
}
