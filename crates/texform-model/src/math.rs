use serde::{Deserialize, Serialize};

/// Classification result for a math fragment.
///
/// Several tags share one [`MathComponent`] variant: `NthRoot`/`SquareRoot`
/// are both `Root`, `Derivative`/`PartialDerivative` are both `Derivative`,
/// `Sum`/`Product` are both `SumProduct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MathTag {
    Matrix,
    PartialDerivative,
    Derivative,
    Fraction,
    DoubleIntegral,
    Integral,
    Sum,
    Product,
    Limit,
    NthRoot,
    SquareRoot,
    Superscript,
    Subscript,
    Generic,
}

impl MathTag {
    pub const ALL: [MathTag; 14] = [
        MathTag::Matrix,
        MathTag::PartialDerivative,
        MathTag::Derivative,
        MathTag::Fraction,
        MathTag::DoubleIntegral,
        MathTag::Integral,
        MathTag::Sum,
        MathTag::Product,
        MathTag::Limit,
        MathTag::NthRoot,
        MathTag::SquareRoot,
        MathTag::Superscript,
        MathTag::Subscript,
        MathTag::Generic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MathTag::Matrix => "matrix",
            MathTag::PartialDerivative => "partial-derivative",
            MathTag::Derivative => "derivative",
            MathTag::Fraction => "fraction",
            MathTag::DoubleIntegral => "double-integral",
            MathTag::Integral => "integral",
            MathTag::Sum => "sum",
            MathTag::Product => "product",
            MathTag::Limit => "limit",
            MathTag::NthRoot => "nth-root",
            MathTag::SquareRoot => "square-root",
            MathTag::Superscript => "superscript",
            MathTag::Subscript => "subscript",
            MathTag::Generic => "generic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        MathTag::ALL.into_iter().find(|tag| tag.name() == name)
    }
}

impl std::fmt::Display for MathTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SumKind {
    Sum,
    Product,
}

/// Which `*matrix` environment wraps a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixDelimiter {
    /// `matrix`
    Plain,
    /// `pmatrix`
    #[default]
    Paren,
    /// `bmatrix`
    Bracket,
    /// `Bmatrix`
    Brace,
    /// `vmatrix`
    Bar,
    /// `Vmatrix`
    DoubleBar,
}

impl MatrixDelimiter {
    pub fn environment(self) -> &'static str {
        match self {
            MatrixDelimiter::Plain => "matrix",
            MatrixDelimiter::Paren => "pmatrix",
            MatrixDelimiter::Bracket => "bmatrix",
            MatrixDelimiter::Brace => "Bmatrix",
            MatrixDelimiter::Bar => "vmatrix",
            MatrixDelimiter::DoubleBar => "Vmatrix",
        }
    }

    pub fn from_environment(env: &str) -> Option<Self> {
        match env {
            "matrix" => Some(MatrixDelimiter::Plain),
            "pmatrix" => Some(MatrixDelimiter::Paren),
            "bmatrix" => Some(MatrixDelimiter::Bracket),
            "Bmatrix" => Some(MatrixDelimiter::Brace),
            "vmatrix" => Some(MatrixDelimiter::Bar),
            "Vmatrix" => Some(MatrixDelimiter::DoubleBar),
            _ => None,
        }
    }
}

/// A single structurally recognized math construct.
///
/// Values have no identity: every edit produces a new value, and two equal
/// values are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MathComponent {
    Fraction {
        numerator: String,
        denominator: String,
    },
    /// An empty `index` is a square root.
    Root { index: String, radicand: String },
    Superscript { base: String, exponent: String },
    Subscript { base: String, subscript: String },
    Integral {
        lower: String,
        upper: String,
        integrand: String,
        variable: String,
    },
    DoubleIntegral {
        domain: String,
        integrand: String,
        area: String,
    },
    SumProduct {
        kind: SumKind,
        variable: String,
        lower: String,
        upper: String,
        expression: String,
    },
    Limit {
        variable: String,
        approaches: String,
        expression: String,
    },
    Derivative {
        func: String,
        variable: String,
        is_partial: bool,
    },
    Matrix {
        rows: usize,
        cols: usize,
        cells: Vec<Vec<String>>,
        #[serde(default)]
        delimiter: MatrixDelimiter,
    },
    Generic { raw: String },
}

impl MathComponent {
    /// The classifier tag this value builds into.
    pub fn tag(&self) -> MathTag {
        match self {
            MathComponent::Fraction { .. } => MathTag::Fraction,
            MathComponent::Root { index, .. } if index.is_empty() => MathTag::SquareRoot,
            MathComponent::Root { .. } => MathTag::NthRoot,
            MathComponent::Superscript { .. } => MathTag::Superscript,
            MathComponent::Subscript { .. } => MathTag::Subscript,
            MathComponent::Integral { .. } => MathTag::Integral,
            MathComponent::DoubleIntegral { .. } => MathTag::DoubleIntegral,
            MathComponent::SumProduct {
                kind: SumKind::Sum, ..
            } => MathTag::Sum,
            MathComponent::SumProduct { .. } => MathTag::Product,
            MathComponent::Limit { .. } => MathTag::Limit,
            MathComponent::Derivative {
                is_partial: true, ..
            } => MathTag::PartialDerivative,
            MathComponent::Derivative { .. } => MathTag::Derivative,
            MathComponent::Matrix { .. } => MathTag::Matrix,
            MathComponent::Generic { .. } => MathTag::Generic,
        }
    }

    /// Default field set inserted by a template, and returned by parsers
    /// when the text does not match the tag's grammar.
    pub fn template(tag: MathTag) -> Self {
        match tag {
            MathTag::Fraction => MathComponent::Fraction {
                numerator: "a".into(),
                denominator: "b".into(),
            },
            MathTag::NthRoot => MathComponent::Root {
                index: "n".into(),
                radicand: "x".into(),
            },
            MathTag::SquareRoot => MathComponent::Root {
                index: String::new(),
                radicand: "x".into(),
            },
            MathTag::Superscript => MathComponent::Superscript {
                base: "x".into(),
                exponent: "2".into(),
            },
            MathTag::Subscript => MathComponent::Subscript {
                base: "x".into(),
                subscript: "i".into(),
            },
            MathTag::Integral => MathComponent::Integral {
                lower: "a".into(),
                upper: "b".into(),
                integrand: "f(x)".into(),
                variable: "x".into(),
            },
            MathTag::DoubleIntegral => MathComponent::DoubleIntegral {
                domain: "D".into(),
                integrand: "f(x,y)".into(),
                area: "A".into(),
            },
            MathTag::Sum => Self::sum_product(SumKind::Sum),
            MathTag::Product => Self::sum_product(SumKind::Product),
            MathTag::Limit => MathComponent::Limit {
                variable: "x".into(),
                approaches: "\\infty".into(),
                expression: "f(x)".into(),
            },
            MathTag::Derivative => MathComponent::Derivative {
                func: "f(x)".into(),
                variable: "x".into(),
                is_partial: false,
            },
            MathTag::PartialDerivative => MathComponent::Derivative {
                func: "f(x,y)".into(),
                variable: "x".into(),
                is_partial: true,
            },
            MathTag::Matrix => MathComponent::Matrix {
                rows: 2,
                cols: 2,
                cells: vec![
                    vec!["a".into(), "b".into()],
                    vec!["c".into(), "d".into()],
                ],
                delimiter: MatrixDelimiter::Paren,
            },
            MathTag::Generic => MathComponent::Generic { raw: String::new() },
        }
    }

    fn sum_product(kind: SumKind) -> Self {
        MathComponent::SumProduct {
            kind,
            variable: "i".into(),
            lower: "1".into(),
            upper: "n".into(),
            expression: "a_i".into(),
        }
    }

    /// An empty `rows` x `cols` matrix.
    pub fn empty_matrix(rows: usize, cols: usize, delimiter: MatrixDelimiter) -> Self {
        MathComponent::Matrix {
            rows,
            cols,
            cells: vec![vec![String::new(); cols]; rows],
            delimiter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_report_their_tag() {
        for tag in MathTag::ALL {
            assert_eq!(MathComponent::template(tag).tag(), tag, "{}", tag);
        }
    }

    #[test]
    fn tag_names_round_trip() {
        for tag in MathTag::ALL {
            assert_eq!(MathTag::from_name(tag.name()), Some(tag));
        }
        assert_eq!(MathTag::from_name("sqrt"), None);
    }

    #[test]
    fn root_tag_follows_index() {
        let root = MathComponent::Root {
            index: "3".into(),
            radicand: "8".into(),
        };
        assert_eq!(root.tag(), MathTag::NthRoot);
    }

    #[test]
    fn component_serializes_with_type_tag() {
        let json = serde_json::to_string(&MathComponent::template(MathTag::Fraction)).unwrap();
        assert!(json.contains("\"type\":\"fraction\""));
    }
}
