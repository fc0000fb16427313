use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

/// Largest row count the console service will serve; bigger limits are
/// rewritten, not rejected.
pub const MAX_LIMIT: u64 = 1000;

static SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*select\b").expect("valid select regex"));

static FORBIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\b(insert|update|delete|drop|alter|create|truncate|grant|revoke)\b")
        .expect("valid forbidden keyword regex")
});

static LIMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\blimit\s+(\d+)\b").expect("valid limit regex"));

/// Admit a statement the console service would accept, returning it in
/// normalized form (single trailing `;`, limit capped at [`MAX_LIMIT`]).
///
/// The checks are lexical on purpose. The service applies the same rules
/// server-side; running them here turns a doomed request into an instant
/// status-line message.
pub fn validate(sql: &str) -> AppResult<String> {
    if sql.trim().is_empty() {
        return Err(AppError::InvalidQuery("Missing 'sql' in JSON body.".into()));
    }

    let s = sql.trim().trim_end_matches(';').trim_end();

    if !SELECT_RE.is_match(s) {
        return Err(AppError::InvalidQuery(
            "Only SELECT statements are allowed.".into(),
        ));
    }
    if FORBIDDEN_RE.is_match(s) {
        return Err(AppError::InvalidQuery(
            "Only read-only SELECT is allowed.".into(),
        ));
    }

    let Some(caps) = LIMIT_RE.captures(s) else {
        return Err(AppError::InvalidQuery(
            "Please include a LIMIT (e.g. LIMIT 100).".into(),
        ));
    };

    // Digit runs too long for u64 are certainly over the cap.
    let limit: u64 = caps[1].parse().unwrap_or(u64::MAX);
    let s = if limit > MAX_LIMIT {
        LIMIT_RE.replace_all(s, "LIMIT 1000").into_owned()
    } else {
        s.to_string()
    };

    Ok(format!("{s};"))
}

/// Row limit named in the statement, if any.
pub fn limit_of(sql: &str) -> Option<u64> {
    LIMIT_RE
        .captures(sql)
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sql: &str) -> String {
        validate(sql).unwrap_err().to_string()
    }

    #[test]
    fn accepts_basic_select() {
        let cleaned = validate("SELECT * FROM stats LIMIT 10").unwrap();
        assert_eq!(cleaned, "SELECT * FROM stats LIMIT 10;");
    }

    #[test]
    fn trailing_semicolons_collapse_to_one() {
        let cleaned = validate("  select 1 limit 5;;  ").unwrap();
        assert_eq!(cleaned, "select 1 limit 5;");
    }

    #[test]
    fn empty_input_matches_service_message() {
        assert_eq!(message("   "), "Missing 'sql' in JSON body.");
    }

    #[test]
    fn non_select_rejected() {
        assert_eq!(message("SHOW TABLES LIMIT 5"), "Only SELECT statements are allowed.");
    }

    #[test]
    fn write_keywords_rejected_case_insensitively() {
        assert_eq!(
            message("select 1 limit 5; DROP TABLE stats"),
            "Only read-only SELECT is allowed."
        );
        assert_eq!(
            message("select * from t where x in (select y from u) Update"),
            "Only read-only SELECT is allowed."
        );
    }

    #[test]
    fn keyword_inside_identifier_is_fine() {
        // "created_at" must not trip the "create" check.
        let cleaned = validate("SELECT created_at FROM stats LIMIT 3").unwrap();
        assert_eq!(cleaned, "SELECT created_at FROM stats LIMIT 3;");
    }

    #[test]
    fn missing_limit_rejected() {
        assert_eq!(
            message("SELECT * FROM stats"),
            "Please include a LIMIT (e.g. LIMIT 100)."
        );
    }

    #[test]
    fn oversized_limit_is_capped() {
        let cleaned = validate("SELECT * FROM stats LIMIT 5000").unwrap();
        assert_eq!(cleaned, "SELECT * FROM stats LIMIT 1000;");
    }

    #[test]
    fn limit_at_cap_kept_verbatim() {
        let cleaned = validate("SELECT * FROM stats LIMIT 1000").unwrap();
        assert_eq!(cleaned, "SELECT * FROM stats LIMIT 1000;");
    }

    #[test]
    fn limit_of_reads_the_named_limit() {
        assert_eq!(limit_of("SELECT 1 LIMIT 250;"), Some(250));
        assert_eq!(limit_of("SELECT 1"), None);
    }
}
