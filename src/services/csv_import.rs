//! Bulk user import from CSV.
//!
//! Expected format: `username,email,password,role` with a header row.
//! Line numbers in error messages are 1-based file lines, so the first data
//! row is line 2.

use serde::Serialize;

use crate::domain::Role;

#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub line: usize,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
}

/// Splits the file into candidate rows and per-line syntactic errors.
/// Duplicate checking happens later against the database.
#[must_use]
pub fn parse_rows(content: &str) -> (Vec<ParsedRow>, Vec<String>) {
    let mut rows = Vec::new();
    let mut errors = Vec::new();

    // enumerate from 2: line 1 is the header
    for (line, raw) in content.lines().skip(1).enumerate().map(|(i, l)| (i + 2, l)) {
        if raw.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() < 4 {
            errors.push(format!("Line {line}: expected 4 columns, got {}", fields.len()));
            continue;
        }

        let (username, email, password, role_raw) = (fields[0], fields[1], fields[2], fields[3]);

        if username.is_empty() || email.is_empty() || password.is_empty() {
            errors.push(format!("Line {line}: username, email and password are required"));
            continue;
        }

        let Some(role) = Role::parse_loose(role_raw) else {
            errors.push(format!("Line {line}: unknown role '{role_raw}'"));
            continue;
        };

        rows.push(ParsedRow {
            line,
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        });
    }

    (rows, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "username,email,password,role\n";

    #[test]
    fn test_parses_valid_rows() {
        let content = format!("{HEADER}alice,alice@example.com,pw1,User\nbob,bob@example.com,pw2,ADMIN\n");
        let (rows, errors) = parse_rows(&content);

        assert!(errors.is_empty());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].username, "alice");
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].role, Role::Admin);
    }

    #[test]
    fn test_trims_fields() {
        let content = format!("{HEADER} alice , alice@example.com , pw1 , user \n");
        let (rows, errors) = parse_rows(&content);

        assert!(errors.is_empty());
        assert_eq!(rows[0].username, "alice");
        assert_eq!(rows[0].role, Role::User);
    }

    #[test]
    fn test_short_row_reports_line_number() {
        let content = format!("{HEADER}alice,alice@example.com,pw1,User\nbob,bob@example.com\n");
        let (rows, errors) = parse_rows(&content);

        assert_eq!(rows.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Line 3:"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let content = format!("{HEADER}mallory,m@example.com,pw,root\n");
        let (rows, errors) = parse_rows(&content);

        assert!(rows.is_empty());
        assert!(errors[0].contains("unknown role"));
    }

    #[test]
    fn test_blank_lines_skipped_but_counted() {
        let content = format!("{HEADER}\nalice,alice@example.com,pw1,User\n");
        let (rows, errors) = parse_rows(&content);

        assert!(errors.is_empty());
        assert_eq!(rows[0].line, 3);
    }

    #[test]
    fn test_missing_required_field() {
        let content = format!("{HEADER},alice@example.com,pw1,User\n");
        let (rows, errors) = parse_rows(&content);

        assert!(rows.is_empty());
        assert!(errors[0].contains("required"));
    }
}
