//! Per-construct parse/build pairs.
//!
//! Each `parse_*` locates its command by search and reads brace groups
//! anchored right after it. `build_*` is the canonical inverse on the
//! recognized subset.

use lazy_static::lazy_static;
use regex::Regex;
use texform_model::{MathComponent, MatrixDelimiter, SumKind};

use crate::core::scan::{
    extract_group, extract_optional_arg, find_command, is_fully_braced, skip_whitespace,
    split_top_level_str, strip_braces_once,
};

lazy_static! {
    // `<integrand> \, dx`; the differential must close the fragment.
    static ref DIFFERENTIAL: Regex = Regex::new(
        r"(?s)^(.*?)(?:\s*\\[,;:!]\s*|\s*)d(\\[a-zA-Z]+|[a-zA-Z]+)\s*$"
    )
    .unwrap();
    // `<integrand> \, dA`; the area element is a single token.
    static ref AREA_ELEMENT: Regex =
        Regex::new(r"(?s)^(.*?)(?:\s*\\[,;:!]\s*|\s+|^)d(\S+)\s*$").unwrap();
    static ref PARTIAL_FRAC: Regex = Regex::new(
        r"(?s)^\\frac\{\s*\\partial\s*([^{}]*?)\s*\}\{\s*\\partial\s*([^{}]*?)\s*\}\s*(.*)$"
    )
    .unwrap();
    static ref DERIVATIVE_FRAC: Regex =
        Regex::new(r"(?s)^\\frac\{\s*d\s*([^{}]*?)\s*\}\{\s*d\s*([^{}]*?)\s*\}\s*(.*)$").unwrap();
    static ref MATRIX_BEGIN: Regex = Regex::new(r"\\begin\{([pbBvV]?matrix)\}").unwrap();
    static ref LIMIT_ARROW: Regex = Regex::new(r"\\(?:to|rightarrow|longrightarrow)\b").unwrap();
}

// ============================================================================
// Argument readers
// ============================================================================

/// Read one macro argument at `pos`: a brace group, a control sequence, or a
/// single character.
fn read_arg(text: &str, pos: usize) -> Option<(String, usize)> {
    let start = skip_whitespace(text, pos);
    let rest = text.get(start..)?;
    let first = rest.chars().next()?;
    match first {
        '{' => extract_group(text, start),
        '\\' => {
            let name_len = rest[1..]
                .chars()
                .take_while(|c| c.is_ascii_alphabetic())
                .count();
            let len = if name_len == 0 {
                1 + rest[1..].chars().next().map_or(0, char::len_utf8)
            } else {
                1 + name_len
            };
            Some((rest[..len].to_string(), start + len))
        }
        c => Some((c.to_string(), start + c.len_utf8())),
    }
}

/// Read `_lower` and `^upper` scripts in either order, skipping `\limits`.
fn read_limits(text: &str, mut pos: usize) -> (String, String, usize) {
    let mut lower = String::new();
    let mut upper = String::new();
    for _ in 0..4 {
        let at = skip_whitespace(text, pos);
        let rest = &text[at..];
        if let Some(stripped) = rest.strip_prefix(r"\limits") {
            pos = text.len() - stripped.len();
            continue;
        }
        let slot = match rest.as_bytes().first() {
            Some(b'_') => &mut lower,
            Some(b'^') => &mut upper,
            _ => break,
        };
        match read_arg(text, at + 1) {
            Some((arg, next)) => {
                *slot = arg;
                pos = next;
            }
            None => {
                pos = text.len();
                break;
            }
        }
    }
    (lower, upper, pos)
}

/// Bases that would change meaning without grouping get braced.
fn group_base(base: &str) -> String {
    let needs_group = is_fully_braced(base)
        || base.chars().any(|c| {
            c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '=' | ',' | '^' | '_')
        });
    if needs_group {
        format!("{{{}}}", base)
    } else {
        base.to_string()
    }
}

// ============================================================================
// Fractions and roots
// ============================================================================

pub fn parse_fraction(text: &str) -> Option<MathComponent> {
    let at = find_command(text, r"\frac", 0)?;
    let (numerator, next) = read_arg(text, at + r"\frac".len())?;
    let (denominator, _) = read_arg(text, next)?;
    Some(MathComponent::Fraction {
        numerator,
        denominator,
    })
}

pub fn build_fraction(c: &MathComponent) -> Option<String> {
    let MathComponent::Fraction {
        numerator,
        denominator,
    } = c
    else {
        return None;
    };
    Some(format!("\\frac{{{}}}{{{}}}", numerator, denominator))
}

/// Handles both `\sqrt{x}` and `\sqrt[n]{x}`.
pub fn parse_root(text: &str) -> Option<MathComponent> {
    let at = find_command(text, r"\sqrt", 0)?;
    let after = at + r"\sqrt".len();
    let (index, next) = match extract_optional_arg(text, after) {
        Some((index, next)) => (index.trim().to_string(), next),
        None => (String::new(), after),
    };
    let (radicand, _) = read_arg(text, next)?;
    Some(MathComponent::Root { index, radicand })
}

pub fn build_root(c: &MathComponent) -> Option<String> {
    let MathComponent::Root { index, radicand } = c else {
        return None;
    };
    if index.is_empty() {
        Some(format!("\\sqrt{{{}}}", radicand))
    } else {
        Some(format!("\\sqrt[{}]{{{}}}", index, radicand))
    }
}

// ============================================================================
// Scripts
// ============================================================================

/// Byte offset of `marker` outside any brace group.
fn find_top_level(text: &str, marker: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            _ if depth == 0 && bytes[i..].starts_with(marker.as_bytes()) => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_script(text: &str, marker: &str) -> Option<(String, String)> {
    let at = find_top_level(text, marker)?;
    let base = strip_braces_once(text[..at].trim()).to_string();
    let (script, _) = extract_group(text, at + 1)?;
    Some((base, script))
}

pub fn parse_superscript(text: &str) -> Option<MathComponent> {
    let (base, exponent) = parse_script(text, "^{")?;
    Some(MathComponent::Superscript { base, exponent })
}

pub fn build_superscript(c: &MathComponent) -> Option<String> {
    let MathComponent::Superscript { base, exponent } = c else {
        return None;
    };
    Some(format!("{}^{{{}}}", group_base(base), exponent))
}

pub fn parse_subscript(text: &str) -> Option<MathComponent> {
    let (base, subscript) = parse_script(text, "_{")?;
    Some(MathComponent::Subscript { base, subscript })
}

pub fn build_subscript(c: &MathComponent) -> Option<String> {
    let MathComponent::Subscript { base, subscript } = c else {
        return None;
    };
    Some(format!("{}_{{{}}}", group_base(base), subscript))
}

// ============================================================================
// Integrals
// ============================================================================

pub fn parse_integral(text: &str) -> Option<MathComponent> {
    let at = find_command(text, r"\int", 0)?;
    let (lower, upper, end) = read_limits(text, at + r"\int".len());
    let rest = text[end..].trim();
    let (integrand, variable) = match DIFFERENTIAL.captures(rest) {
        Some(caps) => (caps[1].trim().to_string(), caps[2].to_string()),
        None => (rest.to_string(), "x".to_string()),
    };
    Some(MathComponent::Integral {
        lower,
        upper,
        integrand,
        variable,
    })
}

pub fn build_integral(c: &MathComponent) -> Option<String> {
    let MathComponent::Integral {
        lower,
        upper,
        integrand,
        variable,
    } = c
    else {
        return None;
    };
    Some(format!(
        "\\int_{{{}}}^{{{}}} {} \\, d{}",
        lower, upper, integrand, variable
    ))
}

pub fn parse_double_integral(text: &str) -> Option<MathComponent> {
    let at = find_command(text, r"\iint", 0)?;
    let (domain, _, end) = read_limits(text, at + r"\iint".len());
    let rest = text[end..].trim();
    let (integrand, area) = match AREA_ELEMENT.captures(rest) {
        Some(caps) => (caps[1].trim().to_string(), caps[2].to_string()),
        None => (rest.to_string(), "A".to_string()),
    };
    Some(MathComponent::DoubleIntegral {
        domain,
        integrand,
        area,
    })
}

pub fn build_double_integral(c: &MathComponent) -> Option<String> {
    let MathComponent::DoubleIntegral {
        domain,
        integrand,
        area,
    } = c
    else {
        return None;
    };
    Some(format!("\\iint_{{{}}} {} \\, d{}", domain, integrand, area))
}

// ============================================================================
// Sums, products, limits
// ============================================================================

fn parse_big_operator(text: &str, command: &str, kind: SumKind) -> Option<MathComponent> {
    let at = find_command(text, command, 0)?;
    let (lower, upper, end) = read_limits(text, at + command.len());
    let (variable, lower) = match lower.split_once('=') {
        Some((var, low)) => (var.trim().to_string(), low.trim().to_string()),
        None => (String::new(), lower.trim().to_string()),
    };
    Some(MathComponent::SumProduct {
        kind,
        variable,
        lower,
        upper,
        expression: text[end..].trim().to_string(),
    })
}

pub fn parse_sum(text: &str) -> Option<MathComponent> {
    parse_big_operator(text, r"\sum", SumKind::Sum)
}

pub fn parse_product(text: &str) -> Option<MathComponent> {
    parse_big_operator(text, r"\prod", SumKind::Product)
}

pub fn build_sum_product(c: &MathComponent) -> Option<String> {
    let MathComponent::SumProduct {
        kind,
        variable,
        lower,
        upper,
        expression,
    } = c
    else {
        return None;
    };
    let command = match kind {
        SumKind::Sum => r"\sum",
        SumKind::Product => r"\prod",
    };
    let lower = if variable.is_empty() {
        lower.clone()
    } else {
        format!("{}={}", variable, lower)
    };
    let out = format!("{}_{{{}}}^{{{}}} {}", command, lower, upper, expression);
    Some(out.trim_end().to_string())
}

pub fn parse_limit(text: &str) -> Option<MathComponent> {
    let at = find_command(text, r"\lim", 0)?;
    let (under, _, end) = read_limits(text, at + r"\lim".len());
    let (variable, approaches) = match LIMIT_ARROW.find(&under) {
        Some(m) => (
            under[..m.start()].trim().to_string(),
            under[m.end()..].trim().to_string(),
        ),
        None => (under.trim().to_string(), String::new()),
    };
    Some(MathComponent::Limit {
        variable,
        approaches,
        expression: text[end..].trim().to_string(),
    })
}

pub fn build_limit(c: &MathComponent) -> Option<String> {
    let MathComponent::Limit {
        variable,
        approaches,
        expression,
    } = c
    else {
        return None;
    };
    let out = format!("\\lim_{{{} \\to {}}} {}", variable, approaches, expression);
    Some(out.trim_end().to_string())
}

// ============================================================================
// Derivatives
// ============================================================================

/// `\frac{d}{dx} f` or `\frac{df}{dx}`.
pub fn parse_derivative(text: &str) -> Option<MathComponent> {
    parse_derivative_with(text, &DERIVATIVE_FRAC, false)
}

pub fn parse_partial_derivative(text: &str) -> Option<MathComponent> {
    parse_derivative_with(text, &PARTIAL_FRAC, true)
}

fn parse_derivative_with(text: &str, pattern: &Regex, is_partial: bool) -> Option<MathComponent> {
    let at = text.find(r"\frac")?;
    let caps = pattern.captures(&text[at..])?;
    let numerator = caps[1].trim();
    let trailing = caps[3].trim();
    let func = if numerator.is_empty() {
        trailing.to_string()
    } else {
        numerator.to_string()
    };
    Some(MathComponent::Derivative {
        func,
        variable: caps[2].trim().to_string(),
        is_partial,
    })
}

pub fn build_derivative(c: &MathComponent) -> Option<String> {
    let MathComponent::Derivative {
        func,
        variable,
        is_partial,
    } = c
    else {
        return None;
    };
    let out = if *is_partial {
        format!("\\frac{{\\partial}}{{\\partial {}}} {}", variable, func)
    } else {
        format!("\\frac{{d}}{{d{}}} {}", variable, func)
    };
    Some(out.trim_end().to_string())
}

// ============================================================================
// Matrices
// ============================================================================

pub fn parse_matrix(text: &str) -> Option<MathComponent> {
    let caps = MATRIX_BEGIN.captures(text)?;
    let env = caps.get(1)?.as_str();
    let delimiter = MatrixDelimiter::from_environment(env).unwrap_or_default();
    let body_start = caps.get(0)?.end();
    let end_marker = format!("\\end{{{}}}", env);
    let body_end = text[body_start..]
        .find(&end_marker)
        .map_or(text.len(), |i| body_start + i);
    let body = &text[body_start..body_end];

    if body.trim().is_empty() {
        return Some(MathComponent::Matrix {
            rows: 0,
            cols: 0,
            cells: Vec::new(),
            delimiter,
        });
    }

    let mut rows: Vec<&str> = split_top_level_str(body, r"\\");
    // A trailing `\\` leaves an empty final row.
    if rows.len() > 1 && rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    let mut cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            split_top_level_str(row, "&")
                .into_iter()
                .map(|cell| match cell.trim() {
                    "{}" => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect();
    let cols = cells.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut cells {
        row.resize(cols, String::new());
    }
    Some(MathComponent::Matrix {
        rows: cells.len(),
        cols,
        cells,
        delimiter,
    })
}

pub fn build_matrix(c: &MathComponent) -> Option<String> {
    let MathComponent::Matrix {
        rows,
        cols,
        cells,
        delimiter,
    } = c
    else {
        return None;
    };
    let env = delimiter.environment();
    if *rows == 0 || *cols == 0 {
        return Some(format!("\\begin{{{env}}} \\end{{{env}}}"));
    }
    let body = (0..*rows)
        .map(|r| {
            (0..*cols)
                .map(|col| {
                    let cell = cells
                        .get(r)
                        .and_then(|row| row.get(col))
                        .map_or("", String::as_str);
                    if cell.is_empty() {
                        "{}"
                    } else {
                        cell
                    }
                })
                .collect::<Vec<_>>()
                .join(" & ")
        })
        .collect::<Vec<_>>()
        .join(r" \\ ");
    Some(format!("\\begin{{{env}}} {body} \\end{{{env}}}"))
}

// ============================================================================
// Generic
// ============================================================================

pub fn parse_generic(text: &str) -> Option<MathComponent> {
    Some(MathComponent::Generic {
        raw: text.to_string(),
    })
}

pub fn build_generic(c: &MathComponent) -> Option<String> {
    let MathComponent::Generic { raw } = c else {
        return None;
    };
    Some(raw.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_arg_forms() {
        assert_eq!(read_arg("{ab}c", 0), Some(("ab".to_string(), 4)));
        assert_eq!(read_arg(r" \alpha+", 0), Some((r"\alpha".to_string(), 7)));
        assert_eq!(read_arg("12", 0), Some(("1".to_string(), 1)));
        assert_eq!(read_arg("   ", 0), None);
    }

    #[test]
    fn test_read_limits_any_order() {
        let text = r"\int^{b}_{a} f";
        let (lower, upper, end) = read_limits(text, 4);
        assert_eq!((lower.as_str(), upper.as_str()), ("a", "b"));
        assert_eq!(text[end..].trim(), "f");

        let text = r"\sum\limits_{k=0}^\infty x";
        let (lower, upper, _) = read_limits(text, 4);
        assert_eq!((lower.as_str(), upper.as_str()), ("k=0", r"\infty"));
    }

    #[test]
    fn test_integral_without_braces() {
        let c = parse_integral(r"\int_0^1 e^{x}dx").unwrap();
        assert_eq!(
            c,
            MathComponent::Integral {
                lower: "0".into(),
                upper: "1".into(),
                integrand: "e^{x}".into(),
                variable: "x".into(),
            }
        );
    }

    #[test]
    fn test_integral_theta_differential() {
        let c = parse_integral(r"\int_{0}^{\pi} \sin\theta \, d\theta").unwrap();
        let MathComponent::Integral {
            integrand,
            variable,
            ..
        } = c
        else {
            panic!("not an integral");
        };
        assert_eq!(integrand, r"\sin\theta");
        assert_eq!(variable, r"\theta");
    }

    #[test]
    fn test_double_integral_ignores_inner_d() {
        let c = parse_double_integral(r"\iint_{S} \nabla \cdot F \, dA").unwrap();
        assert_eq!(
            c,
            MathComponent::DoubleIntegral {
                domain: "S".into(),
                integrand: r"\nabla \cdot F".into(),
                area: "A".into(),
            }
        );
    }

    #[test]
    fn test_limit_rightarrow() {
        let c = parse_limit(r"\lim_{n \rightarrow \infty} (1+1/n)^n").unwrap();
        assert_eq!(
            c,
            MathComponent::Limit {
                variable: "n".into(),
                approaches: r"\infty".into(),
                expression: "(1+1/n)^n".into(),
            }
        );
    }

    #[test]
    fn test_derivative_numerator_form() {
        let c = parse_derivative(r"\frac{dy}{dx}").unwrap();
        assert_eq!(
            c,
            MathComponent::Derivative {
                func: "y".into(),
                variable: "x".into(),
                is_partial: false,
            }
        );
    }

    #[test]
    fn test_matrix_trailing_row_separator() {
        let c = parse_matrix(r"\begin{bmatrix} 1 & 2 \\ 3 \\ \end{bmatrix}").unwrap();
        assert_eq!(
            c,
            MathComponent::Matrix {
                rows: 2,
                cols: 2,
                cells: vec![
                    vec!["1".into(), "2".into()],
                    vec!["3".into(), String::new()]
                ],
                delimiter: MatrixDelimiter::Bracket,
            }
        );
    }

    #[test]
    fn test_matrix_empty_cells_use_placeholder() {
        let c = MathComponent::empty_matrix(2, 1, MatrixDelimiter::Paren);
        let text = build_matrix(&c).unwrap();
        assert_eq!(text, r"\begin{pmatrix} {} \\ {} \end{pmatrix}");
        assert_eq!(parse_matrix(&text), Some(c));
    }

    #[test]
    fn test_group_base() {
        assert_eq!(group_base("x"), "x");
        assert_eq!(group_base("a+b"), "{a+b}");
        assert_eq!(group_base("{x}"), "{{x}}");
        assert_eq!(group_base("e^{x}"), "{e^{x}}");
        assert_eq!(group_base("x_{1}"), "{x_{1}}");
    }

    #[test]
    fn test_scripted_base_round_trips() {
        let c = MathComponent::Superscript {
            base: "e^{x}".into(),
            exponent: "2".into(),
        };
        let text = build_superscript(&c).unwrap();
        assert_eq!(text, "{e^{x}}^{2}");
        assert_eq!(parse_superscript(&text), Some(c));

        let c = MathComponent::Subscript {
            base: "a_{i}".into(),
            subscript: "j".into(),
        };
        let text = build_subscript(&c).unwrap();
        assert_eq!(text, "{a_{i}}_{j}");
        assert_eq!(parse_subscript(&text), Some(c));
    }

    #[test]
    fn test_script_marker_skips_escaped_braces() {
        assert_eq!(find_top_level(r"\{a\}^{2}", "^{"), Some(5));
        assert_eq!(find_top_level("{x^{2}}", "^{"), None);
    }
}
