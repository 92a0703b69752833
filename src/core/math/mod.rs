//! Math component transcoder
//!
//! Classifies a LaTeX math fragment into one [`MathTag`], parses it into a
//! [`MathComponent`] for a structured editor, and rebuilds canonical text.
//!
//! Two tables drive everything:
//!
//! - [`CLASSIFIERS`] is the ordered predicate battery. The first predicate
//!   that matches decides the tag; order matters (a partial derivative is
//!   also a fraction).
//! - `HANDLERS` maps each tag to its parse/build pair, so a new construct is
//!   one entry in each table.
//!
//! Parsing is total: text that does not fit the tag's grammar yields the
//! tag's template values.

mod components;

use lazy_static::lazy_static;
use regex::Regex;
use texform_model::{MathComponent, MathTag};

use super::scan::find_command;

lazy_static! {
    static ref MATRIX_ENV: Regex = Regex::new(r"\\begin\{[pbBvV]?matrix\}").unwrap();
    static ref DERIVATIVE_FRAC: Regex =
        Regex::new(r"\\frac\{\s*d[^{}]*\}\{\s*d\s*(?:[a-zA-Z]|\\[a-zA-Z])").unwrap();
}

/// Structural predicate over raw fragment text.
pub type Predicate = fn(&str) -> bool;

/// The classification battery, in priority order.
pub static CLASSIFIERS: &[(MathTag, Predicate)] = &[
    (MathTag::Matrix, |t: &str| MATRIX_ENV.is_match(t)),
    (MathTag::PartialDerivative, |t: &str| t.contains(r"\frac{\partial")),
    (MathTag::Derivative, |t: &str| DERIVATIVE_FRAC.is_match(t)),
    (MathTag::Fraction, |t: &str| find_command(t, r"\frac", 0).is_some()),
    (MathTag::DoubleIntegral, |t: &str| find_command(t, r"\iint", 0).is_some()),
    (MathTag::Integral, |t: &str| find_command(t, r"\int", 0).is_some()),
    (MathTag::Sum, |t: &str| find_command(t, r"\sum", 0).is_some()),
    (MathTag::Product, |t: &str| find_command(t, r"\prod", 0).is_some()),
    (MathTag::Limit, |t: &str| find_command(t, r"\lim", 0).is_some()),
    (MathTag::NthRoot, |t: &str| t.contains(r"\sqrt[")),
    (MathTag::SquareRoot, |t: &str| find_command(t, r"\sqrt", 0).is_some()),
    (MathTag::Superscript, |t: &str| t.contains("^{") && !t.contains("_{")),
    (MathTag::Subscript, |t: &str| t.contains("_{") && !t.contains("^{")),
];

/// Classify a fragment. Falls back to [`MathTag::Generic`].
///
/// A base carrying both `^{..}` and `_{..}` is Generic: each script
/// predicate requires the other to be absent.
pub fn classify(text: &str) -> MathTag {
    let tag = CLASSIFIERS
        .iter()
        .find(|(_, matches)| matches(text))
        .map(|(tag, _)| *tag)
        .unwrap_or(MathTag::Generic);
    tracing::trace!(%tag, "classified math fragment");
    tag
}

/// Parse/build pair for one tag.
pub struct MathHandler {
    pub tag: MathTag,
    /// `None` means the text does not fit; the caller substitutes the template.
    pub parse: fn(&str) -> Option<MathComponent>,
    pub build: fn(&MathComponent) -> Option<String>,
}

static HANDLERS: &[MathHandler] = &[
    MathHandler {
        tag: MathTag::Matrix,
        parse: components::parse_matrix,
        build: components::build_matrix,
    },
    MathHandler {
        tag: MathTag::PartialDerivative,
        parse: components::parse_partial_derivative,
        build: components::build_derivative,
    },
    MathHandler {
        tag: MathTag::Derivative,
        parse: components::parse_derivative,
        build: components::build_derivative,
    },
    MathHandler {
        tag: MathTag::Fraction,
        parse: components::parse_fraction,
        build: components::build_fraction,
    },
    MathHandler {
        tag: MathTag::DoubleIntegral,
        parse: components::parse_double_integral,
        build: components::build_double_integral,
    },
    MathHandler {
        tag: MathTag::Integral,
        parse: components::parse_integral,
        build: components::build_integral,
    },
    MathHandler {
        tag: MathTag::Sum,
        parse: components::parse_sum,
        build: components::build_sum_product,
    },
    MathHandler {
        tag: MathTag::Product,
        parse: components::parse_product,
        build: components::build_sum_product,
    },
    MathHandler {
        tag: MathTag::Limit,
        parse: components::parse_limit,
        build: components::build_limit,
    },
    MathHandler {
        tag: MathTag::NthRoot,
        parse: components::parse_root,
        build: components::build_root,
    },
    MathHandler {
        tag: MathTag::SquareRoot,
        parse: components::parse_root,
        build: components::build_root,
    },
    MathHandler {
        tag: MathTag::Superscript,
        parse: components::parse_superscript,
        build: components::build_superscript,
    },
    MathHandler {
        tag: MathTag::Subscript,
        parse: components::parse_subscript,
        build: components::build_subscript,
    },
    MathHandler {
        tag: MathTag::Generic,
        parse: components::parse_generic,
        build: components::build_generic,
    },
];

pub fn handler(tag: MathTag) -> &'static MathHandler {
    HANDLERS
        .iter()
        .find(|h| h.tag == tag)
        .unwrap_or(&HANDLERS[HANDLERS.len() - 1])
}

/// Parse `text` as `tag`. Never fails.
pub fn parse(text: &str, tag: MathTag) -> MathComponent {
    (handler(tag).parse)(text).unwrap_or_else(|| MathComponent::template(tag))
}

/// Classify, then parse.
pub fn parse_auto(text: &str) -> MathComponent {
    parse(text, classify(text))
}

/// Canonical LaTeX for a component.
pub fn build(component: &MathComponent) -> String {
    (handler(component.tag()).build)(component).unwrap_or_default()
}
