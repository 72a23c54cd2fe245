//! Static registry of filter definitions.
//!
//! Each [`FilterDefinition`] lists the filter's parameters with their
//! documentation and a declarative rule table. The validator evaluates
//! the rules in table order; nothing else in the crate knows which
//! constraints a filter has.

use crate::preset;
use crate::types::{
    CatalogError, D, DX, DY, FilterKind, FilterParams, KSIZE, MAXVAL, PresetLevel, SIGMA_COLOR,
    SIGMA_SPACE, SIGMA_X, STRENGTH, THRESH, THRESHOLD1, THRESHOLD2,
};
use crate::validate::{self, ValidationError};

/// A constraint on a single numeric parameter.
///
/// Boundaries are exactly as named: `PositiveReal` excludes zero,
/// `BoundedReal` includes both ends, `LeftOpenReal` excludes `min` and
/// includes `max`. `NaN` and infinities never satisfy a constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamConstraint {
    /// Integer, odd, at least 1.
    OddPositiveInteger,
    /// Strictly greater than zero.
    PositiveReal,
    /// Zero or greater.
    NonNegativeReal,
    /// Integer, zero or greater.
    NonNegativeInteger,
    /// Integer in `[min, max]`.
    BoundedInteger { min: i32, max: i32 },
    /// Real in `[min, max]`.
    BoundedReal { min: f64, max: f64 },
    /// Real in `(min, max]`.
    LeftOpenReal { min: f64, max: f64 },
    /// One of the listed integers.
    EnumeratedInteger(&'static [i32]),
}

fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

impl ParamConstraint {
    /// Returns `true` if `value` satisfies this constraint.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn admits(self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            Self::OddPositiveInteger => {
                is_integer(value) && value >= 1.0 && value.rem_euclid(2.0) == 1.0
            }
            Self::PositiveReal => value > 0.0,
            Self::NonNegativeReal => value >= 0.0,
            Self::NonNegativeInteger => is_integer(value) && value >= 0.0,
            Self::BoundedInteger { min, max } => {
                is_integer(value) && value >= f64::from(min) && value <= f64::from(max)
            }
            Self::BoundedReal { min, max } => value >= min && value <= max,
            Self::LeftOpenReal { min, max } => value > min && value <= max,
            Self::EnumeratedInteger(allowed) => allowed.iter().any(|&a| f64::from(a) == value),
        }
    }

    /// Description of the constraint, phrased to follow a parameter name.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::OddPositiveInteger => "must be odd and >= 1".to_owned(),
            Self::PositiveReal => "must be > 0".to_owned(),
            Self::NonNegativeReal => "must be >= 0".to_owned(),
            Self::NonNegativeInteger => "must be an integer >= 0".to_owned(),
            Self::BoundedInteger { min, max } => format!("must be an integer in [{min}, {max}]"),
            Self::BoundedReal { min, max } => format!("must be in [{min}, {max}]"),
            Self::LeftOpenReal { min, max } => format!("must be in ({min}, {max}]"),
            Self::EnumeratedInteger(allowed) => {
                let list: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                format!("must be one of {}", list.join(", "))
            }
        }
    }
}

/// One entry of a filter's rule table.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// A constraint on a single named parameter.
    Param {
        name: &'static str,
        constraint: ParamConstraint,
    },
    /// A relation between several parameters of the same filter.
    Relation {
        check: fn(&FilterParams) -> bool,
        message: &'static str,
    },
}

impl Rule {
    /// Returns `true` if `params` satisfies this rule.
    ///
    /// A parameter rule naming a value the record does not have fails.
    #[must_use]
    pub fn holds(&self, params: &FilterParams) -> bool {
        match *self {
            Self::Param { name, constraint } => {
                params.get(name).is_some_and(|v| constraint.admits(v))
            }
            Self::Relation { check, .. } => check(params),
        }
    }

    /// The violation message reported when this rule does not hold.
    #[must_use]
    pub fn message(&self) -> String {
        match *self {
            Self::Param { name, constraint } => format!("{name} {}", constraint.describe()),
            Self::Relation { message, .. } => message.to_owned(),
        }
    }
}

/// Documentation for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub doc: &'static str,
}

/// Everything the catalog knows about one filter.
#[derive(Debug)]
pub struct FilterDefinition {
    pub kind: FilterKind,
    /// One-line summary of what the filter does.
    pub description: &'static str,
    /// Parameter schema in display order.
    pub params: &'static [ParamSpec],
    /// Rule table, evaluated in order.
    pub rules: &'static [Rule],
}

impl FilterDefinition {
    /// Parameter values a fresh session starts with.
    #[must_use]
    pub const fn defaults(&self) -> FilterParams {
        preset::defaults(self.kind)
    }

    /// The preset record at `level`.
    #[must_use]
    pub const fn preset(&self, level: PresetLevel) -> FilterParams {
        preset::preset(self.kind, level)
    }

    /// Documentation for the named parameter.
    #[must_use]
    pub fn doc(&self, name: &str) -> Option<&'static str> {
        self.params.iter().find(|p| p.name == name).map(|p| p.doc)
    }

    /// Returns `true` if `name` is in this filter's schema.
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

const fn odd_ksize() -> Rule {
    Rule::Param {
        name: KSIZE,
        constraint: ParamConstraint::OddPositiveInteger,
    }
}

const fn positive(name: &'static str) -> Rule {
    Rule::Param {
        name,
        constraint: ParamConstraint::PositiveReal,
    }
}

fn canny_thresholds_ordered(params: &FilterParams) -> bool {
    match (params.get(THRESHOLD1), params.get(THRESHOLD2)) {
        (Some(low), Some(high)) => low < high,
        _ => false,
    }
}

#[allow(clippy::float_cmp)]
fn sobel_has_derivative(params: &FilterParams) -> bool {
    match (params.get(DX), params.get(DY)) {
        (Some(dx), Some(dy)) => !(dx == 0.0 && dy == 0.0),
        _ => false,
    }
}

static CATALOG: [FilterDefinition; FilterKind::COUNT] = [
    FilterDefinition {
        kind: FilterKind::Gaussian,
        description: "Gaussian smoothing: reduces noise while preserving global structure.",
        params: &[
            ParamSpec {
                name: KSIZE,
                doc: "Size of the Gaussian kernel (odd). Controls the amount of smoothing.",
            },
            ParamSpec {
                name: SIGMA_X,
                doc: "Standard deviation of the kernel. Larger values blur more.",
            },
        ],
        rules: &[odd_ksize(), positive(SIGMA_X)],
    },
    FilterDefinition {
        kind: FilterKind::Median,
        description: "Median filter: removes impulsive (salt-and-pepper) noise.",
        params: &[ParamSpec {
            name: KSIZE,
            doc: "Size of the median window. Reduces impulsive noise.",
        }],
        rules: &[odd_ksize()],
    },
    FilterDefinition {
        kind: FilterKind::EqualizeHist,
        description: "Histogram equalization: improves global contrast.",
        params: &[],
        rules: &[],
    },
    FilterDefinition {
        kind: FilterKind::Canny,
        description: "Canny edge detector: identifies strong and weak edges.",
        params: &[
            ParamSpec {
                name: THRESHOLD1,
                doc: "Lower hysteresis threshold for edge detection.",
            },
            ParamSpec {
                name: THRESHOLD2,
                doc: "Upper hysteresis threshold for edge detection.",
            },
        ],
        rules: &[
            Rule::Param {
                name: THRESHOLD1,
                constraint: ParamConstraint::NonNegativeReal,
            },
            Rule::Param {
                name: THRESHOLD2,
                constraint: ParamConstraint::NonNegativeReal,
            },
            Rule::Relation {
                check: canny_thresholds_ordered,
                message: "threshold1 must be less than threshold2",
            },
        ],
    },
    FilterDefinition {
        kind: FilterKind::Blur,
        description: "Box filter: uniform smoothing of the image.",
        params: &[ParamSpec {
            name: KSIZE,
            doc: "Size of the averaging kernel. Produces uniform blur.",
        }],
        rules: &[odd_ksize()],
    },
    FilterDefinition {
        kind: FilterKind::Bilateral,
        description: "Bilateral filter: smooths while preserving edges.",
        params: &[
            ParamSpec {
                name: D,
                doc: "Diameter of the pixel neighbourhood.",
            },
            ParamSpec {
                name: SIGMA_COLOR,
                doc: "How strongly similar intensities are mixed.",
            },
            ParamSpec {
                name: SIGMA_SPACE,
                doc: "How strongly distant pixels influence each other.",
            },
        ],
        rules: &[positive(D), positive(SIGMA_COLOR), positive(SIGMA_SPACE)],
    },
    FilterDefinition {
        kind: FilterKind::Laplacian,
        description: "Laplacian: highlights rapid intensity changes (edges).",
        params: &[ParamSpec {
            name: KSIZE,
            doc: "Kernel size for the second-order derivative. Affects edge sensitivity.",
        }],
        rules: &[Rule::Param {
            name: KSIZE,
            constraint: ParamConstraint::EnumeratedInteger(&[1, 3, 5, 7]),
        }],
    },
    FilterDefinition {
        kind: FilterKind::Sobel,
        description: "Sobel: computes horizontal and/or vertical gradients.",
        params: &[
            ParamSpec {
                name: DX,
                doc: "Derivative order in X.",
            },
            ParamSpec {
                name: DY,
                doc: "Derivative order in Y.",
            },
            ParamSpec {
                name: KSIZE,
                doc: "Size of the Sobel kernel (odd).",
            },
        ],
        rules: &[
            Rule::Param {
                name: DX,
                constraint: ParamConstraint::NonNegativeInteger,
            },
            Rule::Param {
                name: DY,
                constraint: ParamConstraint::NonNegativeInteger,
            },
            Rule::Relation {
                check: sobel_has_derivative,
                message: "dx and dy must not both be 0",
            },
            odd_ksize(),
        ],
    },
    FilterDefinition {
        kind: FilterKind::Threshold,
        description: "Thresholding: segments the image by intensity.",
        params: &[
            ParamSpec {
                name: THRESH,
                doc: "Threshold value for binarization.",
            },
            ParamSpec {
                name: MAXVAL,
                doc: "Value assigned to pixels above the threshold.",
            },
        ],
        rules: &[
            Rule::Param {
                name: THRESH,
                constraint: ParamConstraint::BoundedReal {
                    min: 0.0,
                    max: 255.0,
                },
            },
            Rule::Param {
                name: MAXVAL,
                constraint: ParamConstraint::LeftOpenReal {
                    min: 0.0,
                    max: 255.0,
                },
            },
        ],
    },
    FilterDefinition {
        kind: FilterKind::Invert,
        description: "Intensity inversion: useful for contrast analysis.",
        params: &[],
        rules: &[],
    },
    FilterDefinition {
        kind: FilterKind::Sharpen,
        description: "Sharpen: edge enhancement through high frequencies.",
        params: &[ParamSpec {
            name: STRENGTH,
            doc: "Strength of the edge enhancement.",
        }],
        rules: &[Rule::Param {
            name: STRENGTH,
            constraint: ParamConstraint::LeftOpenReal { min: 0.0, max: 5.0 },
        }],
    },
];

/// All definitions in catalog declaration order.
#[must_use]
pub fn definitions() -> &'static [FilterDefinition] {
    &CATALOG
}

/// The definition of `kind`.
#[must_use]
pub fn definition_of(kind: FilterKind) -> &'static FilterDefinition {
    &CATALOG[kind.index()]
}

/// Look up a definition by wire name.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownFilterKind`] if `name` is not registered.
pub fn lookup(name: &str) -> Result<&'static FilterDefinition, CatalogError> {
    name.parse().map(definition_of)
}

/// Verify the catalog is internally consistent.
///
/// Checks that every definition sits at its kind's index, that the schema
/// and the parameter record agree on names, that every rule refers to a
/// schema parameter, and that the defaults and every preset satisfy the
/// filter's own rules.
///
/// # Errors
///
/// Returns every inconsistency found, each attributed to its filter.
pub fn self_check() -> Result<(), Vec<ValidationError>> {
    let mut problems = Vec::new();

    for kind in FilterKind::ALL {
        let def = definition_of(kind);
        if def.kind != kind {
            problems.push(ValidationError::new(
                kind,
                format!("catalog slot holds definition for {}", def.kind),
            ));
        }

        let schema: Vec<&str> = def.params.iter().map(|p| p.name).collect();
        let record: Vec<&str> = def.defaults().entries().iter().map(|(n, _)| *n).collect();
        if schema != record {
            problems.push(ValidationError::new(
                kind,
                format!("schema {schema:?} does not match parameter record {record:?}"),
            ));
        }

        for rule in def.rules {
            if let Rule::Param { name, .. } = rule
                && !def.has_param(name)
            {
                problems.push(ValidationError::new(
                    kind,
                    format!("rule refers to unknown parameter {name:?}"),
                ));
            }
        }

        for error in validate::check_filter(&def.defaults()) {
            problems.push(ValidationError::new(
                kind,
                format!("default values: {}", error.message),
            ));
        }

        for level in PresetLevel::ALL {
            for error in validate::check_filter(&def.preset(level)) {
                problems.push(ValidationError::new(
                    kind,
                    format!("preset {level}: {}", error.message),
                ));
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn catalog_passes_self_check() {
        assert_eq!(self_check(), Ok(()));
    }

    #[test]
    fn every_kind_has_a_definition() {
        assert_eq!(definitions().len(), FilterKind::COUNT);
        for kind in FilterKind::ALL {
            assert_eq!(definition_of(kind).kind, kind);
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(lookup("canny").unwrap().kind, FilterKind::Canny);
        assert!(matches!(
            lookup("unsharp"),
            Err(CatalogError::UnknownFilterKind(_))
        ));
    }

    #[test]
    fn parameterless_filters_have_no_rules() {
        for kind in [FilterKind::EqualizeHist, FilterKind::Invert] {
            let def = definition_of(kind);
            assert!(def.params.is_empty());
            assert!(def.rules.is_empty());
        }
    }

    #[test]
    fn every_parameter_is_documented() {
        for def in definitions() {
            for spec in def.params {
                assert!(!spec.doc.is_empty(), "{} {} lacks docs", def.kind, spec.name);
            }
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn odd_positive_integer_boundaries() {
        let c = ParamConstraint::OddPositiveInteger;
        assert!(c.admits(1.0));
        assert!(c.admits(7.0));
        assert!(!c.admits(0.0));
        assert!(!c.admits(-1.0));
        assert!(!c.admits(2.0));
        assert!(!c.admits(3.5));
        assert!(!c.admits(f64::NAN));
    }

    #[test]
    fn real_boundaries_are_exact() {
        assert!(!ParamConstraint::PositiveReal.admits(0.0));
        assert!(ParamConstraint::NonNegativeReal.admits(0.0));

        let closed = ParamConstraint::BoundedReal {
            min: 0.0,
            max: 255.0,
        };
        assert!(closed.admits(0.0));
        assert!(closed.admits(255.0));
        assert!(!closed.admits(255.5));

        let left_open = ParamConstraint::LeftOpenReal {
            min: 0.0,
            max: 255.0,
        };
        assert!(!left_open.admits(0.0));
        assert!(left_open.admits(255.0));
        assert!(!left_open.admits(f64::INFINITY));
    }

    #[test]
    fn integer_constraints_reject_fractions() {
        assert!(!ParamConstraint::NonNegativeInteger.admits(0.5));
        assert!(ParamConstraint::NonNegativeInteger.admits(0.0));

        let bounded = ParamConstraint::BoundedInteger { min: 1, max: 3 };
        assert!(bounded.admits(3.0));
        assert!(!bounded.admits(2.5));
        assert!(!bounded.admits(4.0));

        let listed = ParamConstraint::EnumeratedInteger(&[1, 3, 5, 7]);
        assert!(listed.admits(5.0));
        assert!(!listed.admits(9.0));
    }

    #[test]
    fn describe_matches_boundary_notation() {
        assert_eq!(
            ParamConstraint::LeftOpenReal { min: 0.0, max: 5.0 }.describe(),
            "must be in (0, 5]"
        );
        assert_eq!(
            ParamConstraint::EnumeratedInteger(&[1, 3, 5, 7]).describe(),
            "must be one of 1, 3, 5, 7"
        );
    }

    #[test]
    fn docs_are_reachable_by_name() {
        let def = definition_of(FilterKind::Bilateral);
        assert!(def.doc(SIGMA_SPACE).is_some());
        assert_eq!(def.doc(KSIZE), None);
    }
}
