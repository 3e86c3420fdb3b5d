//! Deterministic branch name generation for sessions.

const PREFIX: &str = "claude/";
const MAX_SLUG_LEN: usize = 40;

/// Build a branch name like `claude/eng-123-fix-login-timeout` from an
/// issue identifier and title. Deterministic: same inputs always produce
/// the same name.
pub fn create_descriptive_branch_name(identifier: &str, title: &str) -> String {
    let identifier = identifier.trim().to_lowercase();
    let slug = slugify(title, MAX_SLUG_LEN);

    if slug.is_empty() {
        format!("{PREFIX}{identifier}")
    } else {
        format!("{PREFIX}{identifier}-{slug}")
    }
}

fn slugify(title: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppresses a leading hyphen

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            out.push('-');
            last_was_hyphen = true;
        }
    }

    while out.ends_with('-') {
        out.pop();
    }

    if out.len() <= max_len {
        return out;
    }

    let mut truncated = out[..max_len].to_string();
    if let Some(last_hyphen) = truncated.rfind('-') {
        if last_hyphen > 0 {
            truncated.truncate(last_hyphen);
        }
    }
    while truncated.ends_with('-') {
        truncated.pop();
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_title() {
        let name = create_descriptive_branch_name("ENG-123", "Fix login timeout");
        assert_eq!(name, "claude/eng-123-fix-login-timeout");
    }

    #[test]
    fn test_collapses_punctuation() {
        let name = create_descriptive_branch_name("ENG-1", "Fix: login/timeout -- retry!!");
        assert_eq!(name, "claude/eng-1-fix-login-timeout-retry");
    }

    #[test]
    fn test_truncates_at_word_boundary() {
        let long_title = "This is an extremely long issue title describing many things";
        let name = create_descriptive_branch_name("ENG-9", long_title);
        let slug_part = name.strip_prefix("claude/eng-9-").unwrap();
        assert!(slug_part.len() <= MAX_SLUG_LEN);
        assert!(!slug_part.ends_with('-'));
    }

    #[test]
    fn test_empty_title_falls_back_to_identifier_only() {
        let name = create_descriptive_branch_name("ENG-2", "???");
        assert_eq!(name, "claude/eng-2");
    }

    #[test]
    fn test_deterministic() {
        let a = create_descriptive_branch_name("ENG-5", "Add caching layer");
        let b = create_descriptive_branch_name("ENG-5", "Add caching layer");
        assert_eq!(a, b);
    }
}
