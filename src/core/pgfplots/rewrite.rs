//! Function-name rewriting between the editor's expression convention and
//! PGFPlots math.
//!
//! Editor expressions follow the usual calculator convention: `log` is the
//! natural logarithm and trigonometric functions take radians. PGFPlots
//! spells the natural logarithm `ln` and evaluates trigonometry in degrees,
//! so `sin(x)` is emitted as `sin(deg(x))`. [`from_pgfplots`] undoes exactly
//! what [`to_pgfplots`] does, which keeps chart round trips stable.

const TRIG: &[&str] = &["sin", "cos", "tan", "sec", "csc", "cot"];

/// Calls nested deeper than this are copied through unchanged.
const MAX_NESTING: usize = 256;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    ToPgf,
    FromPgf,
}

/// Editor convention to PGFPlots.
pub fn to_pgfplots(expr: &str) -> String {
    rewrite(expr, Direction::ToPgf)
}

/// PGFPlots to editor convention.
pub fn from_pgfplots(expr: &str) -> String {
    rewrite(expr, Direction::FromPgf)
}

/// Index of the `)` matching the `(` at `open`, if any.
fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// If `arg` is exactly `deg(...)`, return the inner text.
fn strip_deg(arg: &str) -> Option<&str> {
    let trimmed = arg.trim();
    let inner = trimmed.strip_prefix("deg(")?;
    let close = matching_paren(trimmed.as_bytes(), 3)?;
    if close == trimmed.len() - 1 {
        Some(&inner[..inner.len() - 1])
    } else {
        None
    }
}

fn rewrite(expr: &str, direction: Direction) -> String {
    rewrite_at(expr, direction, 0)
}

fn rewrite_at(expr: &str, direction: Direction, depth: usize) -> String {
    let bytes = expr.as_bytes();
    let mut out = String::with_capacity(expr.len() + 8);
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii_alphabetic() {
            let ch = expr[i..].chars().next().unwrap_or(' ');
            out.push(ch);
            i += ch.len_utf8();
            continue;
        }
        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        let name = &expr[start..i];
        let call = bytes.get(i) == Some(&b'(');
        let close = if call { matching_paren(bytes, i) } else { None };
        let Some(close) = close else {
            out.push_str(name);
            continue;
        };
        if depth >= MAX_NESTING {
            out.push_str(&expr[start..=close]);
            i = close + 1;
            continue;
        }
        let arg = &expr[i + 1..close];
        let inner = |text: &str| rewrite_at(text, direction, depth + 1);
        match (direction, name) {
            (Direction::ToPgf, "log") => {
                out.push_str("ln(");
                out.push_str(&inner(arg));
                out.push(')');
            }
            (Direction::FromPgf, "ln") => {
                out.push_str("log(");
                out.push_str(&inner(arg));
                out.push(')');
            }
            (Direction::ToPgf, n) if TRIG.contains(&n) => {
                out.push_str(n);
                out.push_str("(deg(");
                out.push_str(&inner(arg));
                out.push_str("))");
            }
            (Direction::FromPgf, n) if TRIG.contains(&n) => {
                out.push_str(n);
                out.push('(');
                out.push_str(&inner(strip_deg(arg).unwrap_or(arg)));
                out.push(')');
            }
            (_, n) => {
                out.push_str(n);
                out.push('(');
                out.push_str(&inner(arg));
                out.push(')');
            }
        }
        i = close + 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_natural_log_naming() {
        assert_eq!(to_pgfplots("log(x)+1"), "ln(x)+1");
        assert_eq!(from_pgfplots("ln(x)+1"), "log(x)+1");
        assert_eq!(to_pgfplots("log10(x)"), "log10(x)");
    }

    #[test]
    fn test_trig_degrees() {
        assert_eq!(to_pgfplots("sin(x)*cos(2*x)"), "sin(deg(x))*cos(deg(2*x))");
        assert_eq!(from_pgfplots("sin(deg(x))*cos(deg(2*x))"), "sin(x)*cos(2*x)");
        // Names containing a trig name are left alone.
        assert_eq!(to_pgfplots("asin(x)"), "asin(x)");
    }

    #[test]
    fn test_nested_calls() {
        assert_eq!(to_pgfplots("exp(sin(log(x)))"), "exp(sin(deg(ln(x))))");
        assert_eq!(from_pgfplots("exp(sin(deg(ln(x))))"), "exp(sin(log(x)))");
    }

    #[test]
    fn test_rewrite_is_stable_on_pgf_input() {
        // A PGFPlots-native `sin(x)` (degrees) reads back unchanged and then
        // round-trips through the editor convention.
        let editor = from_pgfplots("sin(x)");
        assert_eq!(editor, "sin(x)");
        let once = to_pgfplots(&from_pgfplots(&to_pgfplots("sin(deg(x))")));
        assert_eq!(once, to_pgfplots("sin(deg(x))"));
    }

    #[test]
    fn test_unbalanced_parens_pass_through() {
        assert_eq!(to_pgfplots("sin(x"), "sin(x");
        assert_eq!(from_pgfplots("x^2 + 1"), "x^2 + 1");
    }

    #[test]
    fn test_deeply_nested_calls_do_not_recurse_unbounded() {
        let depth = 20_000;
        let expr = format!("{}x{}", "exp(".repeat(depth), ")".repeat(depth));
        let pgf = to_pgfplots(&expr);
        assert_eq!(pgf, expr);
        assert_eq!(from_pgfplots(&pgf), expr);
    }
}
