/// Splits a trailing `.<digits>` duplication suffix off `name`.
fn split_numeric_suffix(name: &str) -> Option<(&str, &str)> {
    let (stem, suffix) = name.rsplit_once('.')?;
    if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
        Some((stem, suffix))
    } else {
        None
    }
}

/// Strips one trailing `.<digits>` suffix, e.g. `shack.001` -> `shack`.
///
/// Only the final suffix is removed, so `shack.001.002` becomes `shack.001`.
/// A name consisting only of a suffix (`.001`) yields the empty string.
pub fn base_name(name: &str) -> &str {
    match split_numeric_suffix(name) {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// Picks the first free `<base>.NNN` name when `name` is already taken.
pub fn unique_name(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(name) {
        return name.to_string();
    }

    let base = base_name(name);
    (1u32..)
        .map(|n| format!("{}.{:03}", base, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_only_final_suffix() {
        assert_eq!(base_name("shack.001"), "shack");
        assert_eq!(base_name("shack"), "shack");
        assert_eq!(base_name("shack.001.002"), "shack.001");
        assert_eq!(base_name("tree.12345"), "tree");
    }

    #[test]
    fn base_name_edge_cases() {
        assert_eq!(base_name(".001"), "");
        assert_eq!(base_name("shack."), "shack.");
        assert_eq!(base_name("shack.0a1"), "shack.0a1");
        assert_eq!(base_name("v1.2b"), "v1.2b");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn unique_name_follows_duplication_numbering() {
        let taken = ["crate", "crate.001"];
        let is_taken = |name: &str| taken.contains(&name);

        assert_eq!(unique_name("barrel", is_taken), "barrel");
        assert_eq!(unique_name("crate", is_taken), "crate.002");
        assert_eq!(unique_name("crate.001", is_taken), "crate.002");
    }
}
