//! Per-line fixups for exported statements.
//!
//! The export tool emits data-insertion statements that the replay client
//! does not accept verbatim. [`fix_line`] applies a fixed set of textual
//! corrections to lines recognized as insertion statements and leaves every
//! other line untouched. The fixups are idempotent, so a dump may safely be
//! fixed again on restore.

/// Leading marker identifying a data-insertion statement.
const INSERT_MARKER: &str = "INSERT INTO ";

/// Namespace prefix applied to unqualified table references.
const NAMESPACE_PREFIX: &str = "public.";

/// Apply the statement fixups to one line.
///
/// Lines starting with `INSERT INTO `:
/// - an unqualified table reference gains the `public.` prefix
/// - the quoted literal `'NULL'` becomes a bare SQL `NULL`
/// - a `+0000 UTC` offset suffix becomes the ISO-compatible `+00`
/// - the statement is terminated with `;` followed by a newline
///
/// All other lines (including non-UTF-8 ones) pass through unchanged.
pub fn fix_line(line: &[u8]) -> Vec<u8> {
    let Ok(text) = std::str::from_utf8(line) else {
        return line.to_vec();
    };
    let Some(rest) = text.strip_prefix(INSERT_MARKER) else {
        return line.to_vec();
    };

    let mut fixed = String::with_capacity(text.len() + NAMESPACE_PREFIX.len() + 2);
    fixed.push_str(INSERT_MARKER);

    // The table reference runs up to the first space or column list.
    let table_end = rest
        .find(|c: char| c == ' ' || c == '(')
        .unwrap_or(rest.len());
    if !rest[..table_end].contains('.') {
        fixed.push_str(NAMESPACE_PREFIX);
    }
    fixed.push_str(rest);

    let mut fixed = fixed.replace("'NULL'", "NULL");
    fixed = fixed.replace("+0000 UTC", "+00");

    fixed.truncate(fixed.trim_end().len());
    if !fixed.ends_with(';') {
        fixed.push(';');
    }
    fixed.push('\n');
    fixed.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(line: &str) -> String {
        String::from_utf8(fix_line(line.as_bytes())).unwrap()
    }

    #[test]
    fn reference_statement_is_fully_fixed() {
        assert_eq!(
            fix("INSERT INTO foo VALUES ('a', 'NULL', '2020-01-01 00:00:00+0000 UTC')"),
            "INSERT INTO public.foo VALUES ('a', NULL, '2020-01-01 00:00:00+00');\n"
        );
    }

    #[test]
    fn non_insert_lines_pass_through_unchanged() {
        for line in [
            "SET statement_timeout = 0;\n",
            "COPY foo (a, b) FROM stdin;\n",
            "-- comment\n",
            "\n",
            "",
        ] {
            assert_eq!(fix_line(line.as_bytes()), line.as_bytes());
        }
    }

    #[test]
    fn fixups_are_idempotent() {
        for line in [
            "INSERT INTO foo VALUES ('a', 'NULL', '2020-01-01 00:00:00+0000 UTC')",
            "INSERT INTO public.bar VALUES (1);\n",
            "INSERT INTO baz (x) VALUES (2)",
            "SELECT 1;\n",
        ] {
            let once = fix_line(line.as_bytes());
            let twice = fix_line(&once);
            assert_eq!(once, twice, "not idempotent for {line:?}");
        }
    }

    #[test]
    fn qualified_tables_are_not_double_prefixed() {
        assert_eq!(
            fix("INSERT INTO public.foo VALUES (1)"),
            "INSERT INTO public.foo VALUES (1);\n"
        );
        assert_eq!(
            fix("INSERT INTO audit.log VALUES (1)"),
            "INSERT INTO audit.log VALUES (1);\n"
        );
    }

    #[test]
    fn table_followed_by_column_list_is_qualified() {
        assert_eq!(
            fix("INSERT INTO foo(a, b) VALUES (1, 2)"),
            "INSERT INTO public.foo(a, b) VALUES (1, 2);\n"
        );
    }

    #[test]
    fn existing_terminator_and_newline_are_preserved() {
        assert_eq!(
            fix("INSERT INTO public.foo VALUES (1);\n"),
            "INSERT INTO public.foo VALUES (1);\n"
        );
        assert_eq!(
            fix("INSERT INTO public.foo VALUES (1);\r\n"),
            "INSERT INTO public.foo VALUES (1);\n"
        );
    }

    #[test]
    fn quoted_null_literal_becomes_bare_null() {
        assert_eq!(
            fix("INSERT INTO public.t VALUES ('NULL', 'NULL')"),
            "INSERT INTO public.t VALUES (NULL, NULL);\n"
        );
    }

    #[test]
    fn non_utf8_lines_pass_through() {
        let line = b"INSERT INTO \xff\xfe";
        assert_eq!(fix_line(line), line.to_vec());
    }
}
