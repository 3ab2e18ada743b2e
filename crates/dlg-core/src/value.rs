/// How a raw stored string reads at a use site. Integer wins over boolean, boolean over text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar<'a> {
    Integer(i64),
    Boolean(bool),
    Text(&'a str),
}

pub fn classify(raw: &str) -> Scalar<'_> {
    if let Some(value) = parse_integer(raw) {
        return Scalar::Integer(value);
    }
    if let Some(value) = parse_boolean(raw) {
        return Scalar::Boolean(value);
    }
    Scalar::Text(raw)
}

pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

pub fn parse_boolean(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn boolean_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
