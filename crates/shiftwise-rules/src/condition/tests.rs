//! Tests for the condition language.

use super::*;
use crate::facts::FactContext;
use shiftwise_core::{FactValue, ScheduleError};

fn ctx() -> FactContext {
    FactContext::new()
        .with("employee.id", "E7")
        .with("employee.weeklyHours", 50)
        .with("shift.durationMinutes", 480)
        .with("shift.area", "FRONT")
        .with("date.isHoliday", false)
        .with("date.isWeekend", true)
        .with("ratio", 0.75)
}

fn eval(input: &str) -> Evaluation {
    evaluate(&parse(input).unwrap(), &ctx()).unwrap()
}

#[test]
fn test_parse_precedence() {
    let expr = parse("a = 1 or b = 2 and not c").unwrap();
    let expected = Expr::or(
        Expr::compare(CompareOp::Eq, Expr::fact("a"), Expr::literal(1)),
        Expr::and(
            Expr::compare(CompareOp::Eq, Expr::fact("b"), Expr::literal(2)),
            Expr::not(Expr::fact("c")),
        ),
    );
    assert_eq!(expr, expected);
}

#[test]
fn test_keywords_case_insensitive() {
    let lower = parse("x > 1 and y < 2").unwrap();
    let upper = parse("x > 1 AND y < 2").unwrap();
    assert_eq!(lower, upper);
    assert_eq!(parse("a == 1").unwrap(), parse("a = 1").unwrap());
}

#[test]
fn test_syntax_error_names_token() {
    match parse("employee.weeklyHours > > 48") {
        Err(ScheduleError::Syntax {
            token, position, ..
        }) => {
            assert_eq!(token, ">");
            assert_eq!(position, 23);
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_syntax_errors() {
    for input in [
        "",
        "(a = 1",
        "a = ",
        "a in 3",
        "a in [1, b]",
        "'open",
        "a = 1 b",
        "a # 1",
        "employee.",
    ] {
        assert!(
            matches!(parse(input), Err(ScheduleError::Syntax { .. })),
            "expected syntax error for {:?}",
            input
        );
    }
}

#[test]
fn test_unexpected_end_is_reported() {
    match parse("a >") {
        Err(ScheduleError::Syntax { token, position, .. }) => {
            assert_eq!(token, "<end>");
            assert_eq!(position, 3);
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_comparisons() {
    assert!(eval("employee.weeklyHours > 48").value);
    assert!(!eval("employee.weeklyHours <= 48").value);
    assert!(eval("shift.area = 'FRONT'").value);
    assert!(eval("shift.area != \"BACK\"").value);
    assert!(eval("shift.area < 'GATE'").value);
    assert!(eval("ratio >= 0.5 and ratio < 1").value);
    assert!(eval("employee.weeklyHours = 50.0").value);
}

#[test]
fn test_in_list() {
    assert!(eval("employee.id in ['E1', 'E7']").value);
    assert!(!eval("employee.id in []").value);
    assert!(eval("shift.durationMinutes in [240, 480]").value);
}

#[test]
fn test_bare_boolean_fact() {
    assert!(eval("date.isWeekend").value);
    assert!(eval("not date.isHoliday").value);
    assert!(eval("true").value);
}

#[test]
fn test_consulted_facts_in_read_order() {
    let result = eval("shift.area = 'FRONT' and employee.weeklyHours > 48 and shift.area != ''");
    assert!(result.value);
    assert_eq!(result.consulted, vec!["shift.area", "employee.weeklyHours"]);
}

#[test]
fn test_and_short_circuits() {
    // The right side names a missing fact; it must never be read.
    let result = eval("date.isHoliday and employee.mood = 'calm'");
    assert!(!result.value);
    assert_eq!(result.consulted, vec!["date.isHoliday"]);

    let result = eval("date.isWeekend or employee.mood = 'calm'");
    assert!(result.value);
}

#[test]
fn test_unknown_fact() {
    let expr = parse("employee.mood = 'calm'").unwrap();
    assert!(matches!(
        evaluate(&expr, &ctx()),
        Err(ScheduleError::UnknownFact(name)) if name == "employee.mood"
    ));
}

#[test]
fn test_mixed_numeric_equality_is_exact() {
    assert!(values_equal(&FactValue::Int(40), &FactValue::Float(40.0)).unwrap());
    assert!(!values_equal(&FactValue::Int(0), &FactValue::Float(1e-17)).unwrap());
    assert!(!values_equal(&FactValue::Float(1e9 + 0.5), &FactValue::Int(1_000_000_000)).unwrap());
    assert!(eval("ratio = 0.75").value);
}

#[test]
fn test_type_mismatch() {
    for input in [
        "shift.area > 3",
        "employee.weeklyHours = 'fifty'",
        "employee.weeklyHours",
        "date.isHoliday < true",
        "employee.id in ['E1', 7]",
    ] {
        let expr = parse(input).unwrap();
        assert!(
            matches!(evaluate(&expr, &ctx()), Err(ScheduleError::TypeMismatch(_))),
            "expected type mismatch for {:?}",
            input
        );
    }
}

#[test]
fn test_referenced_facts() {
    let expr = parse("b > 1 and (a = 2 or b < 5)").unwrap();
    assert_eq!(expr.referenced_facts(), vec!["a", "b"]);
}

#[test]
fn test_display_reparses() {
    let expr = parse("not (x in [1, 2] or y = 'q') and z >= -3.5").unwrap();
    let printed = expr.to_string();
    assert_eq!(parse(&printed).unwrap(), expr);
}

#[test]
fn test_literal_tokens() {
    let tokens = tokenize("x >= -12 and y = 1.5").unwrap();
    let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Ident("x".into()),
            TokenKind::Op(CompareOp::Ge),
            TokenKind::Int(-12),
            TokenKind::And,
            TokenKind::Ident("y".into()),
            TokenKind::Op(CompareOp::Eq),
            TokenKind::Float(1.5),
            TokenKind::End,
        ]
    );
    assert_eq!(FactValue::from(-12), FactValue::Int(-12));
}
