//! `${ENV_VAR}` substitution for raw config text.
//!
//! Credentials such as the chat password or the NLU bearer token are normally
//! kept out of the file and pulled from the environment at load time.

/// Replace `${VAR}` and `${VAR:-fallback}` placeholders with environment values.
///
/// Unresolvable variables without a fallback are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injectable lookup, so tests don't have
/// to touch the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder, emit the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let inner = &after[..end];
        let (name, fallback) = match inner.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (inner, None),
        };

        if name.is_empty() {
            out.push_str(&rest[start..start + 2 + end + 1]);
        } else {
            match lookup(name).or_else(|| fallback.map(str::to_string)) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..start + 2 + end + 1]),
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "YUTA_TEST_PASSWORD" => Some("hunter2".to_string()),
            "YUTA_TEST_EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("password: ${YUTA_TEST_PASSWORD}", lookup),
            "password: hunter2"
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("token: ${YUTA_NOT_SET}", lookup),
            "token: ${YUTA_NOT_SET}"
        );
    }

    #[test]
    fn uses_fallback_when_unset() {
        assert_eq!(
            substitute_env_with("port: ${YUTA_NOT_SET:-8000}", lookup),
            "port: 8000"
        );
    }

    #[test]
    fn set_var_beats_fallback() {
        assert_eq!(
            substitute_env_with("${YUTA_TEST_EMPTY:-x}|${YUTA_TEST_PASSWORD:-x}", lookup),
            "|hunter2"
        );
    }

    #[test]
    fn multiple_placeholders_on_one_line() {
        assert_eq!(
            substitute_env_with("${YUTA_TEST_PASSWORD}-${YUTA_TEST_PASSWORD}", lookup),
            "hunter2-hunter2"
        );
    }

    #[test]
    fn malformed_placeholders_are_literal() {
        assert_eq!(substitute_env_with("a ${} b", lookup), "a ${} b");
        assert_eq!(substitute_env_with("tail ${OPEN", lookup), "tail ${OPEN");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain: text"), "plain: text");
    }
}
