/// Check if a sender may talk to the bot.
///
/// The allowlist is closed: an empty list admits nobody. Entries match the
/// sender identity exactly (identities are case-sensitive) or as a glob with
/// `*` standing for any run of characters, e.g. `@*:example.org`.
pub fn is_allowed(sender: &str, allowlist: &[String]) -> bool {
    allowlist.iter().any(|pattern| {
        if pattern.contains('*') {
            glob_match(pattern, sender)
        } else {
            pattern == sender
        }
    })
}

/// Simple glob matching supporting `*` as a wildcard for any sequence of chars.
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(idx) => {
                // First segment must match at start
                if i == 0 && idx != 0 {
                    return false;
                }
                pos += idx + part.len();
            },
            None => return false,
        }
    }

    // Last segment must match at end (unless pattern ends with *)
    match parts.last() {
        Some(last) if !last.is_empty() => text.ends_with(last),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_allowlist_admits_nobody() {
        assert!(!is_allowed("@anyone:example.org", &[]));
    }

    #[test]
    fn exact_match_is_case_sensitive() {
        let allow = list(&["@locmai:dendrite.maibaloc.com"]);
        assert!(is_allowed("@locmai:dendrite.maibaloc.com", &allow));
        assert!(!is_allowed("@LocMai:dendrite.maibaloc.com", &allow));
        assert!(!is_allowed("@other:dendrite.maibaloc.com", &allow));
    }

    #[rstest]
    #[case("@*:example.org", "@alice:example.org", true)]
    #[case("@*:example.org", "@alice:example.com", false)]
    #[case("@admin_*", "@admin_bob:x.org", true)]
    #[case("@admin_*", "@user_bob:x.org", false)]
    #[case("@*_ops:*", "@team_ops:x.org", true)]
    #[case("@*_ops:*", "@team_dev:x.org", false)]
    #[case("*", "@whoever:x.org", true)]
    fn glob_patterns(#[case] pattern: &str, #[case] sender: &str, #[case] expected: bool) {
        assert_eq!(is_allowed(sender, &list(&[pattern])), expected);
    }

    #[test]
    fn suffix_must_anchor_at_end() {
        assert!(is_allowed("aba", &list(&["a*a"])));
        assert!(!is_allowed("ab", &list(&["a*a"])));
    }
}
