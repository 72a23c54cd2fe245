//! Shared types for the speckle filter pipeline.
//!
//! [`FilterKind`] is the closed set of operations the processing service
//! understands. Each kind owns a parameter record, wrapped in
//! [`FilterParams`], so a parameter map can never belong to the wrong
//! filter.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

/// Identifier of a filter operation.
///
/// Variant order is the catalog declaration order. Derived `Ord` follows
/// it, so ordered collections of kinds iterate in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Gaussian smoothing.
    Gaussian,
    /// Median filter.
    Median,
    /// Histogram equalization.
    EqualizeHist,
    /// Canny edge detector.
    Canny,
    /// Box (mean) filter.
    Blur,
    /// Edge-preserving bilateral filter.
    Bilateral,
    /// Laplacian second-derivative operator.
    Laplacian,
    /// Sobel gradient operator.
    Sobel,
    /// Binary thresholding.
    Threshold,
    /// Intensity inversion.
    Invert,
    /// Sharpening kernel.
    Sharpen,
}

impl FilterKind {
    /// Number of filter kinds in the catalog.
    pub const COUNT: usize = 11;

    /// All kinds in catalog declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Gaussian,
        Self::Median,
        Self::EqualizeHist,
        Self::Canny,
        Self::Blur,
        Self::Bilateral,
        Self::Laplacian,
        Self::Sobel,
        Self::Threshold,
        Self::Invert,
        Self::Sharpen,
    ];

    /// Position of this kind in [`ALL`](Self::ALL).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Wire name understood by the processing service.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Median => "median",
            Self::EqualizeHist => "equalize_hist",
            Self::Canny => "canny",
            Self::Blur => "blur",
            Self::Bilateral => "bilateral",
            Self::Laplacian => "laplacian",
            Self::Sobel => "sobel",
            Self::Threshold => "threshold",
            Self::Invert => "invert",
            Self::Sharpen => "sharpen",
        }
    }

    /// Human-readable label used as the prefix of validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gaussian => "Gaussian",
            Self::Median => "Median",
            Self::EqualizeHist => "Equalize Hist",
            Self::Canny => "Canny",
            Self::Blur => "Blur",
            Self::Bilateral => "Bilateral",
            Self::Laplacian => "Laplacian",
            Self::Sobel => "Sobel",
            Self::Threshold => "Threshold",
            Self::Invert => "Invert",
            Self::Sharpen => "Sharpen",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CatalogError::UnknownFilterKind(s.to_owned()))
    }
}

/// Strength level of a curated preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresetLevel {
    Low,
    Medium,
    High,
}

impl PresetLevel {
    /// All levels, weakest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for PresetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresetLevel {
    type Err = CatalogError;

    /// Level names are matched case-insensitively (`high` and `HIGH`
    /// are the same level).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CatalogError::UnknownPreset(s.to_owned()))
    }
}

// Parameter names as they appear on the wire.
pub const KSIZE: &str = "ksize";
pub const SIGMA_X: &str = "sigmaX";
pub const THRESHOLD1: &str = "threshold1";
pub const THRESHOLD2: &str = "threshold2";
pub const D: &str = "d";
pub const SIGMA_COLOR: &str = "sigmaColor";
pub const SIGMA_SPACE: &str = "sigmaSpace";
pub const DX: &str = "dx";
pub const DY: &str = "dy";
pub const THRESH: &str = "thresh";
pub const MAXVAL: &str = "maxval";
pub const STRENGTH: &str = "strength";

/// Gaussian blur parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianParams {
    /// Kernel size (odd).
    pub ksize: f64,
    /// Standard deviation along X.
    pub sigma_x: f64,
}

/// Parameters for filters configured by a single square kernel size
/// (median, blur, laplacian).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    pub ksize: f64,
}

/// Canny hysteresis thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyParams {
    pub threshold1: f64,
    pub threshold2: f64,
}

/// Bilateral filter parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilateralParams {
    /// Neighbourhood diameter.
    pub d: f64,
    pub sigma_color: f64,
    pub sigma_space: f64,
}

/// Sobel derivative orders and kernel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SobelParams {
    pub dx: f64,
    pub dy: f64,
    pub ksize: f64,
}

/// Binary threshold parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    pub thresh: f64,
    pub maxval: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharpenParams {
    pub strength: f64,
}

/// The parameter record of one filter, tagged by its kind.
///
/// Values are stored exactly as entered: nothing is rounded or clamped
/// on write. Whether a value is acceptable is decided by
/// [`crate::validate`].
///
/// Serializes as a flat map of wire parameter names to numbers, in
/// schema order (`{"ksize": 5.0, "sigmaX": 1.2}`). Kinds without
/// parameters serialize as an empty map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterParams {
    Gaussian(GaussianParams),
    Median(KernelParams),
    EqualizeHist,
    Canny(CannyParams),
    Blur(KernelParams),
    Bilateral(BilateralParams),
    Laplacian(KernelParams),
    Sobel(SobelParams),
    Threshold(ThresholdParams),
    Invert,
    Sharpen(SharpenParams),
}

impl FilterParams {
    /// The filter this record belongs to.
    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        match self {
            Self::Gaussian(_) => FilterKind::Gaussian,
            Self::Median(_) => FilterKind::Median,
            Self::EqualizeHist => FilterKind::EqualizeHist,
            Self::Canny(_) => FilterKind::Canny,
            Self::Blur(_) => FilterKind::Blur,
            Self::Bilateral(_) => FilterKind::Bilateral,
            Self::Laplacian(_) => FilterKind::Laplacian,
            Self::Sobel(_) => FilterKind::Sobel,
            Self::Threshold(_) => FilterKind::Threshold,
            Self::Invert => FilterKind::Invert,
            Self::Sharpen(_) => FilterKind::Sharpen,
        }
    }

    /// All `(name, value)` pairs in schema order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Self::Gaussian(p) => vec![(KSIZE, p.ksize), (SIGMA_X, p.sigma_x)],
            Self::Median(p) | Self::Blur(p) | Self::Laplacian(p) => vec![(KSIZE, p.ksize)],
            Self::EqualizeHist | Self::Invert => Vec::new(),
            Self::Canny(p) => vec![(THRESHOLD1, p.threshold1), (THRESHOLD2, p.threshold2)],
            Self::Bilateral(p) => vec![
                (D, p.d),
                (SIGMA_COLOR, p.sigma_color),
                (SIGMA_SPACE, p.sigma_space),
            ],
            Self::Sobel(p) => vec![(DX, p.dx), (DY, p.dy), (KSIZE, p.ksize)],
            Self::Threshold(p) => vec![(THRESH, p.thresh), (MAXVAL, p.maxval)],
            Self::Sharpen(p) => vec![(STRENGTH, p.strength)],
        }
    }

    /// Returns `true` for kinds that take no parameters.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::EqualizeHist | Self::Invert)
    }

    /// Current value of the named parameter, or `None` if this filter has
    /// no such parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    /// Overwrite a single parameter value.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownParam`] if `name` is not part of this
    /// filter's schema. The record is left untouched in that case.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), CatalogError> {
        let kind = self.kind();
        let slot = match self {
            Self::Gaussian(p) => match name {
                KSIZE => Some(&mut p.ksize),
                SIGMA_X => Some(&mut p.sigma_x),
                _ => None,
            },
            Self::Median(p) | Self::Blur(p) | Self::Laplacian(p) => {
                (name == KSIZE).then_some(&mut p.ksize)
            }
            Self::EqualizeHist | Self::Invert => None,
            Self::Canny(p) => match name {
                THRESHOLD1 => Some(&mut p.threshold1),
                THRESHOLD2 => Some(&mut p.threshold2),
                _ => None,
            },
            Self::Bilateral(p) => match name {
                D => Some(&mut p.d),
                SIGMA_COLOR => Some(&mut p.sigma_color),
                SIGMA_SPACE => Some(&mut p.sigma_space),
                _ => None,
            },
            Self::Sobel(p) => match name {
                DX => Some(&mut p.dx),
                DY => Some(&mut p.dy),
                KSIZE => Some(&mut p.ksize),
                _ => None,
            },
            Self::Threshold(p) => match name {
                THRESH => Some(&mut p.thresh),
                MAXVAL => Some(&mut p.maxval),
                _ => None,
            },
            Self::Sharpen(p) => (name == STRENGTH).then_some(&mut p.strength),
        };

        let slot = slot.ok_or_else(|| CatalogError::UnknownParam {
            filter: kind,
            name: name.to_owned(),
        })?;
        *slot = value;
        Ok(())
    }
}

impl Serialize for FilterParams {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in entries {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Identifier of a reference image held by the processing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(pub i64);

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The reference image currently active on the processing service.
///
/// Submission requires one; its absence is reported, never skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveReference {
    pub id: ReferenceId,
    pub filename: String,
    /// Intensity metric of the unprocessed reference, once computed.
    #[serde(default)]
    pub iv: Option<f64>,
    /// Locator of the original image, if the service exposes one.
    #[serde(default, rename = "original_url_png")]
    pub original_image: Option<String>,
}

/// Catalog/store consistency errors.
///
/// These indicate a mismatch between a caller and the catalog (a name
/// that does not exist), not a bad user-entered value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The filter name is not registered in the catalog.
    #[error("unknown filter kind: {0:?}")]
    UnknownFilterKind(String),

    /// The parameter name is not part of the filter's schema.
    #[error("filter {filter} has no parameter named {name:?}")]
    UnknownParam { filter: FilterKind, name: String },

    /// The preset level name is not one of LOW, MEDIUM, HIGH.
    #[error("unknown preset level: {0:?}")]
    UnknownPreset(String),
}
