//! Inputs that try to change the structure of the generated SQL.

use filter_sql::convert;

#[test]
fn malicious_filters_are_rejected() {
    let cases = [
        // statement termination and comments
        ("drop via value", "id eq '1; DROP TABLE users --'"),
        ("standalone statement", "1; DROP TABLE users --'"),
        ("direct drop", "DROP TABLE users"),
        ("trailing comment", "name eq 'Alice' --"),
        ("block comment", "name eq 'Alice' /* test */"),
        ("comment inside value", "name eq 'Alice/*'"),
        ("encoded injection", "name eq '%27%20or%201=1--"),
        ("concatenation", "name eq 'Alice' || 'Bob'"),
        // literals in field position
        ("boolean as field", "true eq false"),
        ("numeric as field", "42 eq 42"),
        ("null as field", "null eq null"),
        ("quoted field", "'name' eq 'Alice'"),
        ("keyword as field", "SELECT eq 'Alice'"),
        ("punctuation in field", "na;me eq 1"),
        ("chained comparison", "status eq true eq false"),
        // always-true tautologies
        ("boolean always true", "name eq 'Alice' or true eq true"),
        ("boolean always false", "name eq 'Alice' and false eq false"),
        ("numeric always true", "age gt 30 or 1 eq 1"),
        ("null always true", "age gt 30 or null eq null"),
        // parentheses abuse
        ("empty parentheses", "()"),
        ("parenthesized literal", "(42) eq 42"),
        ("nested literal", "((true)) eq false"),
        ("unmatched open", "(name eq 'Alice'"),
        ("unmatched close", "name eq 'Alice')"),
        (
            "excessive nesting",
            "(((((((((((name eq 'Alice')))))))))))",
        ),
        // dangling operators
        ("or without right side", "name eq 'Alice' or"),
        ("and without right side", "name eq 'Alice' and"),
        ("not without operand", "not"),
        // IN list abuse
        ("empty in list", "color in ()"),
        ("keyword in list", "color in ('red', delete)"),
        // expressions and function calls
        ("arithmetic", "age eq salary + 1"),
        ("case expression", "CASE WHEN 1=1 THEN username ELSE password END"),
        ("function call", "substringof('Alice', name) eq true"),
        ("sleep", "name eq 'Alice' AND SLEEP(5)"),
        ("benchmark", "name eq 'Alice' AND BENCHMARK(1000000, MD5('test'))"),
        ("keyword value", "name eq union"),
    ];

    for (name, input) in cases {
        assert!(convert(input).is_err(), "{name}: expected {input:?} to be rejected");
    }
}

#[test]
fn quotes_in_values_stay_inside_the_literal() {
    assert_eq!(
        convert("name eq 'x'' or ''1''=''1'").unwrap(),
        "name = 'x'' or ''1''=''1'"
    );
    assert_eq!(convert("name eq 'it''s'").unwrap(), "name = 'it''s'");
}

#[test]
fn quoted_keywords_are_plain_strings() {
    assert_eq!(convert("action eq 'delete'").unwrap(), "action = 'delete'");
    assert_eq!(convert("flag eq 'true'").unwrap(), "flag = 'true'");
}

#[test]
fn nesting_at_the_limit_is_accepted() {
    let filter = format!("{}name eq 'Alice'{}", "(".repeat(10), ")".repeat(10));
    let expected = format!("{}name = 'Alice'{}", "(".repeat(10), ")".repeat(10));
    assert_eq!(convert(&filter).unwrap(), expected);
}
