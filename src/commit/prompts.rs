//! Prompt assembly for commit message generation.

/// Lead-in placed before the diff in the user message.
pub const USER_PROMPT_PREFIX: &str = "Generate commit message(s) for this git diff:\n\n";

/// Builds the user message embedding the raw diff.
///
/// The diff is passed through untouched; callers own its size.
pub fn generate_user_prompt(diff: &str) -> String {
    format!("{USER_PROMPT_PREFIX}{diff}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_follows_blank_line() {
        assert_eq!(
            generate_user_prompt("+fn main() {}"),
            "Generate commit message(s) for this git diff:\n\n+fn main() {}"
        );
    }

    #[test]
    fn diff_is_not_trimmed() {
        let prompt = generate_user_prompt("\n  diff --git a/x b/x\n");
        assert!(prompt.ends_with("\n  diff --git a/x b/x\n"));
    }
}
