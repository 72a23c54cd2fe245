//! Catalog defaults and curated presets.
//!
//! Every kind has a default record (the values a session starts with
//! and returns to on reset) and three presets. A preset is a complete
//! record: applying it replaces every parameter the filter has.

use crate::types::{
    BilateralParams, CannyParams, CatalogError, FilterKind, FilterParams, GaussianParams,
    KernelParams, PresetLevel, SharpenParams, SobelParams, ThresholdParams,
};

/// Starting parameters for `kind`.
#[must_use]
pub const fn defaults(kind: FilterKind) -> FilterParams {
    match kind {
        FilterKind::Gaussian => FilterParams::Gaussian(GaussianParams {
            ksize: 3.0,
            sigma_x: 1.0,
        }),
        FilterKind::Median => FilterParams::Median(KernelParams { ksize: 3.0 }),
        FilterKind::EqualizeHist => FilterParams::EqualizeHist,
        FilterKind::Canny => FilterParams::Canny(CannyParams {
            threshold1: 100.0,
            threshold2: 200.0,
        }),
        FilterKind::Blur => FilterParams::Blur(KernelParams { ksize: 3.0 }),
        FilterKind::Bilateral => FilterParams::Bilateral(BilateralParams {
            d: 5.0,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }),
        FilterKind::Laplacian => FilterParams::Laplacian(KernelParams { ksize: 1.0 }),
        FilterKind::Sobel => FilterParams::Sobel(SobelParams {
            dx: 1.0,
            dy: 0.0,
            ksize: 3.0,
        }),
        FilterKind::Threshold => FilterParams::Threshold(ThresholdParams {
            thresh: 127.0,
            maxval: 255.0,
        }),
        FilterKind::Invert => FilterParams::Invert,
        FilterKind::Sharpen => FilterParams::Sharpen(SharpenParams { strength: 1.0 }),
    }
}

/// The preset record for `kind` at `level`.
#[must_use]
#[allow(clippy::too_many_lines)]
pub const fn preset(kind: FilterKind, level: PresetLevel) -> FilterParams {
    use PresetLevel::{High, Low, Medium};

    match kind {
        FilterKind::Gaussian => {
            let (ksize, sigma_x) = match level {
                Low => (3.0, 0.8),
                Medium => (5.0, 1.2),
                High => (7.0, 2.0),
            };
            FilterParams::Gaussian(GaussianParams { ksize, sigma_x })
        }
        FilterKind::Median => FilterParams::Median(KernelParams {
            ksize: match level {
                Low => 3.0,
                Medium => 5.0,
                High => 7.0,
            },
        }),
        FilterKind::EqualizeHist => FilterParams::EqualizeHist,
        FilterKind::Canny => {
            let (threshold1, threshold2) = match level {
                Low => (50.0, 120.0),
                Medium => (100.0, 200.0),
                High => (180.0, 300.0),
            };
            FilterParams::Canny(CannyParams {
                threshold1,
                threshold2,
            })
        }
        FilterKind::Blur => FilterParams::Blur(KernelParams {
            ksize: match level {
                Low => 3.0,
                Medium => 5.0,
                High => 9.0,
            },
        }),
        FilterKind::Bilateral => {
            let (d, sigma) = match level {
                Low => (5.0, 50.0),
                Medium => (7.0, 75.0),
                High => (9.0, 120.0),
            };
            FilterParams::Bilateral(BilateralParams {
                d,
                sigma_color: sigma,
                sigma_space: sigma,
            })
        }
        FilterKind::Laplacian => FilterParams::Laplacian(KernelParams {
            ksize: match level {
                Low => 1.0,
                Medium => 3.0,
                High => 5.0,
            },
        }),
        FilterKind::Sobel => {
            let (dx, dy, ksize) = match level {
                Low => (1.0, 0.0, 3.0),
                Medium => (1.0, 1.0, 3.0),
                High => (1.0, 1.0, 5.0),
            };
            FilterParams::Sobel(SobelParams { dx, dy, ksize })
        }
        FilterKind::Threshold => FilterParams::Threshold(ThresholdParams {
            thresh: match level {
                Low => 80.0,
                Medium => 127.0,
                High => 180.0,
            },
            maxval: 255.0,
        }),
        FilterKind::Invert => FilterParams::Invert,
        FilterKind::Sharpen => FilterParams::Sharpen(SharpenParams {
            strength: match level {
                Low => 0.5,
                Medium => 1.0,
                High => 2.0,
            },
        }),
    }
}

/// Resolve a preset from wire names (`"gaussian"`, `"HIGH"`).
///
/// # Errors
///
/// Returns [`CatalogError::UnknownFilterKind`] or
/// [`CatalogError::UnknownPreset`] if either name is not recognized.
pub fn resolve(filter: &str, level: &str) -> Result<FilterParams, CatalogError> {
    let kind: FilterKind = filter.parse()?;
    let level: PresetLevel = level.parse()?;
    Ok(preset(kind, level))
}
