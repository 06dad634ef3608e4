//! Package selection
//!
//! Keeps the user-editable package list. The display order is derived, never
//! stored: default packages first, then profile packages, then everything
//! else sorted.

use std::collections::BTreeSet;

/// Split free-form input on whitespace runs and commas, dropping empty pieces
pub fn split_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Order `current` for display.
///
/// Defaults present in `current` keep their source order, followed by profile
/// packages that are present and not defaults, followed by the remaining
/// members sorted lexicographically. Each package appears exactly once.
pub fn order_packages<S: AsRef<str>>(
    current: &BTreeSet<String>,
    defaults: &[S],
    profile: &[S],
) -> Vec<String> {
    let mut emitted: BTreeSet<&str> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(current.len());

    for pkg in defaults.iter().chain(profile.iter()) {
        let pkg = pkg.as_ref();
        if current.contains(pkg) && emitted.insert(pkg) {
            ordered.push(pkg.to_string());
        }
    }

    // BTreeSet iteration is already lexicographic
    for pkg in current {
        if !emitted.contains(pkg.as_str()) {
            ordered.push(pkg.clone());
        }
    }

    ordered
}

/// Editable package list driven by typed and pasted input
#[derive(Debug, Clone, Default)]
pub struct PackageEditor {
    current: BTreeSet<String>,
    default_packages: Vec<String>,
    profile_packages: Vec<String>,
    pending_input: String,
}

impl PackageEditor {
    pub fn new(default_packages: Vec<String>, profile_packages: Vec<String>) -> Self {
        Self {
            default_packages,
            profile_packages,
            ..Default::default()
        }
    }

    /// Editor pre-filled with defaults, profile packages and `extra`
    pub fn seeded(
        default_packages: Vec<String>,
        profile_packages: Vec<String>,
        extra: &[String],
    ) -> Self {
        let mut editor = Self::new(default_packages, profile_packages);
        let seed: Vec<String> = editor
            .default_packages
            .iter()
            .chain(editor.profile_packages.iter())
            .chain(extra.iter())
            .cloned()
            .collect();
        for pkg in seed {
            editor.add_token(&pkg);
        }
        editor
    }

    /// Editor over an existing selection
    pub fn with_packages<I, S>(
        packages: I,
        default_packages: Vec<String>,
        profile_packages: Vec<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut editor = Self::new(default_packages, profile_packages);
        for pkg in packages {
            editor.add_token(pkg.as_ref());
        }
        editor
    }

    /// Insert a single package; returns true when the list changed
    pub fn add_token(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() || self.current.contains(token) {
            return false;
        }
        self.current.insert(token.to_string())
    }

    /// Tokenize pasted text and add every piece in order
    pub fn add_tokens(&mut self, text: &str) -> usize {
        split_tokens(text)
            .iter()
            .filter(|token| self.add_token(token))
            .count()
    }

    pub fn remove_token(&mut self, token: &str) -> bool {
        self.current.remove(token)
    }

    pub fn set_pending_input(&mut self, input: &str) {
        self.pending_input = input.to_string();
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Commit the pending input as one package
    pub fn handle_enter_key(&mut self) {
        if self.pending_input.is_empty() {
            return;
        }
        let input = std::mem::take(&mut self.pending_input);
        self.add_token(input.trim());
    }

    /// Remove the last displayed package, only while nothing is typed.
    ///
    /// Returns the removed package.
    pub fn handle_backspace_key(&mut self) -> Option<String> {
        if !self.pending_input.is_empty() {
            return None;
        }
        let last = self.render().pop()?;
        self.current.remove(&last);
        Some(last)
    }

    pub fn render(&self) -> Vec<String> {
        order_packages(&self.current, &self.default_packages, &self.profile_packages)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.current.contains(token)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn default_packages(&self) -> &[String] {
        &self.default_packages
    }

    pub fn profile_packages(&self) -> &[String] {
        &self.profile_packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_tokens() {
        assert_eq!(
            split_tokens("one two,three\nfour"),
            strings(&["one", "two", "three", "four"])
        );
        assert_eq!(split_tokens(" ,, \t luci ,"), strings(&["luci"]));
        assert!(split_tokens("").is_empty());
    }

    #[test]
    fn test_render_partitions() {
        let editor = PackageEditor::with_packages(
            ["pkg-profile", "pkg-default", "pkg-other2", "pkg-other1"],
            strings(&["pkg-default"]),
            strings(&["pkg-profile"]),
        );
        assert_eq!(
            editor.render(),
            strings(&["pkg-default", "pkg-profile", "pkg-other1", "pkg-other2"])
        );
    }

    #[test]
    fn test_render_default_and_profile_overlap() {
        let editor = PackageEditor::with_packages(
            ["b", "a", "shared", "z", "m"],
            strings(&["shared", "b", "missing"]),
            strings(&["z", "shared", "a"]),
        );
        assert_eq!(editor.render(), strings(&["shared", "b", "z", "a", "m"]));
    }

    #[test]
    fn test_render_is_permutation_of_current() {
        let editor = PackageEditor::with_packages(
            ["kmod-usb", "luci", "htop", "base-files", "dnsmasq"],
            strings(&["base-files", "dnsmasq"]),
            strings(&["kmod-usb", "dnsmasq"]),
        );
        let rendered = editor.render();
        assert_eq!(rendered.len(), editor.len());
        let unique: BTreeSet<_> = rendered.iter().collect();
        assert_eq!(unique.len(), rendered.len());
        assert!(rendered.iter().all(|p| editor.contains(p)));
    }

    #[test]
    fn test_add_tokens_paste() {
        let mut editor = PackageEditor::default();
        assert_eq!(editor.add_tokens("one two,three\nfour"), 4);
        assert_eq!(editor.render(), strings(&["four", "one", "three", "two"]));
    }

    #[test]
    fn test_add_token_is_idempotent() {
        let mut editor = PackageEditor::with_packages(["existing_pkg"], vec![], vec![]);
        assert!(!editor.add_token("existing_pkg"));
        assert!(!editor.add_token("  existing_pkg "));
        assert!(!editor.add_token("   "));
        assert_eq!(editor.len(), 1);
        assert!(editor.add_token("Existing_pkg"));
        assert_eq!(editor.len(), 2);
    }

    #[test]
    fn test_enter_adds_trimmed_input() {
        let mut editor = PackageEditor::with_packages(["existing_pkg"], vec![], vec![]);
        editor.set_pending_input("existing_pkg");
        editor.handle_enter_key();
        assert_eq!(editor.render(), strings(&["existing_pkg"]));
        assert_eq!(editor.pending_input(), "");

        editor.set_pending_input("  tcpdump ");
        editor.handle_enter_key();
        assert_eq!(editor.render(), strings(&["existing_pkg", "tcpdump"]));
    }

    #[test]
    fn test_remove_token() {
        let mut editor = PackageEditor::with_packages(["remove-me"], vec![], vec![]);
        assert!(!editor.remove_token("not-there"));
        assert_eq!(editor.len(), 1);
        assert!(editor.remove_token("remove-me"));
        assert!(editor.render().is_empty());
    }

    #[test]
    fn test_backspace_pops_last_displayed() {
        let mut editor = PackageEditor::with_packages(["first", "last"], vec![], vec![]);
        assert_eq!(editor.handle_backspace_key().as_deref(), Some("last"));
        assert_eq!(editor.render(), strings(&["first"]));
    }

    #[test]
    fn test_backspace_falls_back_to_pinned_packages() {
        let mut editor = PackageEditor::with_packages(
            ["base", "wifi"],
            strings(&["base"]),
            strings(&["wifi"]),
        );
        assert_eq!(editor.handle_backspace_key().as_deref(), Some("wifi"));
        assert_eq!(editor.handle_backspace_key().as_deref(), Some("base"));
        assert_eq!(editor.handle_backspace_key(), None);
    }

    #[test]
    fn test_backspace_ignored_with_pending_input() {
        let mut editor = PackageEditor::with_packages(["first", "last"], vec![], vec![]);
        editor.set_pending_input("lu");
        assert_eq!(editor.handle_backspace_key(), None);
        assert_eq!(editor.len(), 2);
    }

    #[test]
    fn test_seeded() {
        let editor = PackageEditor::seeded(
            strings(&["dnsmasq", "base-files"]),
            strings(&["kmod-ath9k", "dnsmasq"]),
            &strings(&["luci"]),
        );
        assert_eq!(
            editor.render(),
            strings(&["dnsmasq", "base-files", "kmod-ath9k", "luci"])
        );
    }
}
