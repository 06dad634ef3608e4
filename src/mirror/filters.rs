//! Version and profile filtering
//!
//! Pure helpers used to narrow the mirror indexes down for display.

use crate::utils::normalize_slug;

use super::models::{Overview, ProfileSummary};

const SNAPSHOT: &str = "snapshot";

/// Leading major number of a release version ("23.05.3" -> 23)
fn major_version(version: &str) -> Option<u32> {
    version.split('.').next()?.parse().ok()
}

/// Keep snapshot plus releases whose major number is at least `threshold`,
/// preserving the mirror's order
pub fn recent_versions(versions: &[String], threshold: u32) -> Vec<String> {
    versions
        .iter()
        .filter(|v| {
            v.as_str() == SNAPSHOT || major_version(v).is_some_and(|major| major >= threshold)
        })
        .cloned()
        .collect()
}

/// A selectable entry: one display title pointing at its profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChoice<'a> {
    pub title: String,
    pub profile: &'a ProfileSummary,
}

/// Flatten profiles into one entry per title, filtered by `query` and sorted
/// case-insensitively by title.
///
/// Matching ignores case and punctuation and also accepts the profile id.
pub fn search_profiles<'a>(overview: &'a Overview, query: &str) -> Vec<ProfileChoice<'a>> {
    let needle = normalize_slug(query);

    let mut choices: Vec<ProfileChoice<'a>> = overview
        .profiles
        .iter()
        .flat_map(|profile| {
            let titles: Vec<String> = if profile.titles.is_empty() {
                vec![profile.id.clone()]
            } else {
                profile.titles.iter().map(|t| t.display()).collect()
            };
            titles
                .into_iter()
                .map(move |title| ProfileChoice { title, profile })
        })
        .filter(|choice| {
            needle.is_empty()
                || normalize_slug(&choice.title).contains(&needle)
                || normalize_slug(&choice.profile.id).contains(&needle)
        })
        .collect();

    choices.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.profile.id.cmp(&b.profile.id))
    });
    choices
}

/// Look a profile up by its id
pub fn find_profile<'a>(overview: &'a Overview, id: &str) -> Option<&'a ProfileSummary> {
    overview.profiles.iter().find(|p| p.id == id)
}
