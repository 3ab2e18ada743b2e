use dlg_core::{classify, parse_boolean, parse_integer, DialogueError, Scalar};

use super::path_tracker::PathTracker;
use super::variables::VariableStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparison {
    pub(crate) fn parse(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    fn integers(self, left: i64, right: i64) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt => left < right,
            Self::Gt => left > right,
            Self::Le => left <= right,
            Self::Ge => left >= right,
        }
    }

    /// Equality-only operators; anything else is meaningless on booleans and text.
    fn equality(self, equal: bool) -> Option<bool> {
        match self {
            Self::Eq => Some(equal),
            Self::Ne => Some(!equal),
            _ => None,
        }
    }
}

/// Condition evaluator over a borrowed variable store and path tracker.
pub(crate) struct Evaluator<'a> {
    variables: &'a VariableStore,
    paths: &'a PathTracker,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(variables: &'a VariableStore, paths: &'a PathTracker) -> Self {
        Self { variables, paths }
    }

    /// `clause OR clause ...` where each clause is `atom AND atom ...`. Blank means true.
    pub(crate) fn condition(&self, expr: &str) -> Result<bool, DialogueError> {
        let clauses = expr
            .split(" OR ")
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .collect::<Vec<_>>();
        if clauses.is_empty() {
            return Ok(true);
        }

        for clause in clauses {
            let mut holds = true;
            for atom in clause
                .split(" AND ")
                .map(str::trim)
                .filter(|atom| !atom.is_empty())
            {
                if !self.atom(atom)? {
                    holds = false;
                }
            }
            if holds {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn atom(&self, atom: &str) -> Result<bool, DialogueError> {
        let tokens = atom.split_whitespace().collect::<Vec<_>>();
        match tokens.as_slice() {
            [] => Ok(true),
            [single] => match single.strip_prefix('!') {
                Some("") => Err(shape_error(atom)),
                Some(name) => self.boolean_test(name, Comparison::Eq, false),
                None => self.boolean_test(single, Comparison::Eq, true),
            },
            ["!", name] => self.boolean_test(name, Comparison::Eq, false),
            [left, op, right] => {
                let op = Comparison::parse(op).ok_or_else(|| {
                    DialogueError::expression(
                        "EXPR_OPERATOR",
                        format!("Non valid operator in \"{}\".", atom),
                    )
                })?;
                self.comparison(atom, left, op, right)
            }
            _ => Err(shape_error(atom)),
        }
    }

    fn comparison(
        &self,
        atom: &str,
        left: &str,
        op: Comparison,
        right: &str,
    ) -> Result<bool, DialogueError> {
        if let Some(value) = self.variables.get(left) {
            let Some(number) = parse_integer(value) else {
                return text_equality(atom, value, op, right);
            };
            if let Some(literal) = parse_integer(right) {
                return Ok(op.integers(number, literal));
            }
            if let Some(other) = self.variables.get(right).and_then(parse_integer) {
                return Ok(op.integers(number, other));
            }
            return text_equality(atom, value, op, right);
        }

        if let Some(expected) = parse_boolean(right) {
            return self.boolean_test(left, op, expected);
        }

        Ok(parse_integer(right)
            .map(|literal| op.integers(i64::from(self.paths.count(left)), literal))
            .unwrap_or(false))
    }

    /// A variable holding a boolean, or a path-existence predicate when `name` is no variable.
    fn boolean_test(
        &self,
        name: &str,
        op: Comparison,
        expected: bool,
    ) -> Result<bool, DialogueError> {
        let actual = match self.variables.get(name) {
            None => self.paths.exists(name),
            Some(value) => match classify(value) {
                Scalar::Boolean(actual) => actual,
                _ => {
                    return Err(DialogueError::expression(
                        "EXPR_NOT_BOOLEAN",
                        format!(
                            "{} is not a boolean. Incorrect comparison: {} {} {}",
                            name,
                            name,
                            op.as_str(),
                            expected
                        ),
                    ))
                }
            },
        };

        op.equality(actual == expected).ok_or_else(|| {
            DialogueError::expression(
                "EXPR_NOT_BOOLEAN_OPERATOR",
                format!(
                    "{} is not a boolean operator. Incorrect comparison: {} {} {}",
                    op.as_str(),
                    name,
                    op.as_str(),
                    expected
                ),
            )
        })
    }
}

fn text_equality(
    atom: &str,
    value: &str,
    op: Comparison,
    right: &str,
) -> Result<bool, DialogueError> {
    let equal = value.to_lowercase() == right.to_lowercase();
    op.equality(equal).ok_or_else(|| {
        DialogueError::expression(
            "EXPR_NOT_COMPARABLE",
            format!(
                "Operator {} needs integer operands in \"{}\".",
                op.as_str(),
                atom
            ),
        )
    })
}

fn shape_error(atom: &str) -> DialogueError {
    DialogueError::expression("EXPR_SHAPE", format!("Non valid expression: {}", atom))
}
