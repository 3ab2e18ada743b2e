use std::sync::OnceLock;

use dlg_core::{boolean_text, parse_boolean, parse_integer, DialogueError};
use regex::Regex;
use tracing::debug;

use super::variables::VariableStore;

fn toggle_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^!\s*(\w+)$").expect("toggle regex must compile"))
}

fn assign_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(\w+)\s*=\s*(.*)$").expect("assign regex must compile"))
}

fn arithmetic_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(\w+)\s*([-+*/])\s*(\w+)$").expect("arithmetic regex must compile")
    })
}

/// Runs every newline-separated statement of an action line, in order. The store is only
/// updated when all of them succeed.
pub(crate) fn run_action(variables: &mut VariableStore, text: &str) -> Result<(), DialogueError> {
    let mut staged = variables.clone();
    for statement in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        run_statement(&mut staged, statement)?;
    }
    *variables = staged;
    Ok(())
}

pub(crate) fn run_statement(
    variables: &mut VariableStore,
    statement: &str,
) -> Result<(), DialogueError> {
    if let Some(captures) = toggle_regex().captures(statement) {
        let name = &captures[1];
        if let Some(current) = variables.get(name).and_then(parse_boolean) {
            variables.set(name, boolean_text(!current));
        }
        return Ok(());
    }

    let Some(captures) = assign_regex().captures(statement) else {
        debug!(statement, "ignoring unrecognized action statement");
        return Ok(());
    };
    let name = &captures[1];
    let expr = captures[2].trim();

    let value = match parse_boolean(expr) {
        Some(literal) => boolean_text(literal).to_string(),
        None => evaluate_value(variables, expr)?,
    };
    variables.set(name, value);
    Ok(())
}

fn evaluate_value(variables: &VariableStore, expr: &str) -> Result<String, DialogueError> {
    if let Some(existing) = variables.get(expr) {
        return Ok(existing.to_string());
    }

    if let Some(result) = integer_operation(variables, expr)? {
        return Ok(result.to_string());
    }

    Ok(expr.to_string())
}

fn integer_operation(variables: &VariableStore, expr: &str) -> Result<Option<i64>, DialogueError> {
    let Some(captures) = arithmetic_regex().captures(expr) else {
        return Ok(None);
    };
    let resolve = |operand: &str| {
        variables
            .get(operand)
            .map(str::to_string)
            .unwrap_or_else(|| operand.to_string())
    };
    let Some(left) = parse_integer(&resolve(&captures[1])) else {
        return Ok(None);
    };
    let Some(right) = parse_integer(&resolve(&captures[3])) else {
        return Ok(None);
    };

    let result = match &captures[2] {
        "+" => left.checked_add(right),
        "-" => left.checked_sub(right),
        "*" => left.checked_mul(right),
        "/" => {
            if right == 0 {
                return Err(DialogueError::expression(
                    "EXPR_DIVIDE_BY_ZERO",
                    format!("Division by zero in \"{}\".", expr),
                ));
            }
            left.checked_div(right)
        }
        other => {
            return Err(DialogueError::expression(
                "EXPR_OPERATOR",
                format!("Operation sign not valid: {}", other),
            ))
        }
    };

    result.map(Some).ok_or_else(|| {
        DialogueError::expression(
            "EXPR_OVERFLOW",
            format!("Integer overflow in \"{}\".", expr),
        )
    })
}
