//! Detection configuration (spec.md §6): the exhaustive set of options
//! the core recognises, validated eagerly so that configuration errors
//! are fatal before any per-cell computation starts (spec.md §7).

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Polynomial basis family used by the [`crate::poly`] engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PolyBasis {
    Chebyshev,
    Legendre,
    #[default]
    Polynomial,
}

impl PolyBasis {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "chebyshev" => Ok(Self::Chebyshev),
            "legendre" => Ok(Self::Legendre),
            "polynomial" => Ok(Self::Polynomial),
            other => Err(ConfigError::UnknownBasis(other.to_string())),
        }
    }
}

// `Config` derives `Deserialize`, which would otherwise match this
// enum's variants by their Rust (PascalCase) spelling. spec.md §6's
// documented `poly` values are lowercase (`"chebyshev"`, ...), so this
// routes deserialization through `PolyBasis::parse` instead of letting
// the derive pick a casing convention independently of it.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for PolyBasis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        PolyBasis::parse(&name).map_err(serde::de::Error::custom)
    }
}

/// Reduction applied across longitude once a per-(time, lon) jet has
/// been found for every cell (spec.md §6 `zonal_opt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ZonalOption {
    Mean,
    Median,
    #[default]
    None,
}

/// Detection configuration. Every field here corresponds to a key in
/// spec.md §6's configuration table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Magnitude of the PV isosurface to track, PVU (default 2.0).
    pub pv_value: f64,
    /// Polynomial fit degree (default 12).
    pub fit_deg: usize,
    /// Fit basis.
    pub poly: PolyBasis,
    /// Equatorward latitude bound for STJ candidates, degrees.
    pub min_lat: f64,
    /// Poleward latitude bound for STJ candidates, degrees.
    pub max_lat: f64,
    /// Lower bound of the theta domain the dynamic tropopause is
    /// searched over, Kelvin (default 310).
    pub theta_s: f64,
    /// Upper bound of the theta domain (default 400).
    pub theta_e: f64,
    /// Longitude reduction to apply after per-cell detection.
    pub zonal_opt: ZonalOption,
    /// Base output path, interpreted by the I/O collaborator.
    pub output_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pv_value: 2.0,
            fit_deg: 12,
            poly: PolyBasis::default(),
            min_lat: 10.0,
            max_lat: 60.0,
            theta_s: 310.0,
            theta_e: 400.0,
            zonal_opt: ZonalOption::default(),
            output_file: None,
        }
    }
}

impl Config {
    /// Validates the exhaustive set of fatal configuration invariants
    /// from spec.md §7. Called once, before any per-timestep work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.theta_s >= self.theta_e {
            return Err(ConfigError::ThetaDomainInverted {
                theta_s: self.theta_s,
                theta_e: self.theta_e,
            });
        }
        if self.min_lat >= self.max_lat {
            return Err(ConfigError::LatitudeBandInverted {
                min_lat: self.min_lat,
                max_lat: self.max_lat,
            });
        }
        if self.fit_deg < 1 {
            return Err(ConfigError::DegreeTooLow(self.fit_deg));
        }
        if self.pv_value <= 0.0 {
            return Err(ConfigError::NonPositivePvValue(self.pv_value));
        }
        Ok(())
    }

    /// Number of 1 K steps spanning `[theta_s, theta_e]`, inclusive.
    pub fn theta_domain_len(&self) -> usize {
        ((self.theta_e - self.theta_s).round() as usize) + 1
    }
}

#[cfg(feature = "config")]
impl Config {
    /// Loads a `Config` from a TOML document, then validates it.
    ///
    /// This is the only supported way to build a `Config` from an
    /// external file; the core never reads the CLI or environment
    /// (spec.md §6).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s).map_err(|e| ConfigError::Toml(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
