//! # Tidal Constituent Catalog
//!
//! The closed set of harmonic constituents this crate knows how to evaluate,
//! each tied to its fixed astronomical angular speed.
//!
//! ## Angular Speeds
//!
//! Speeds are in degrees per mean solar hour, as tabulated by NOAA CO-OPS for
//! the 37 standard constituents, plus the four extra constituents (SIG1, EPS2,
//! MKS2, ETA2) that global ocean tide atlases commonly publish.
//!
//! ## Catalog Order
//!
//! The declaration order of [`TidalConstituent`] is the catalog order. It is
//! what `Ord` follows, so a [`crate::calculator::ConstituentSet`] always
//! iterates (and therefore sums) in the same sequence.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when mapping external constituent names onto the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The name has no entry in the catalog, so no angular speed is known for it.
    #[error("unknown tidal constituent: {0}")]
    UnknownConstituent(String),
}

/// A named tidal constituent.
///
/// Variant names follow the conventional Darwin symbols; those that start with
/// a digit are spelled out (`N2_2` is `2N2`, `Q1_2` is `2Q1`).
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TidalConstituent {
    /// Principal lunar semidiurnal
    M2,
    /// Principal solar semidiurnal
    S2,
    /// Larger lunar elliptic semidiurnal
    N2,
    /// Lunar diurnal
    K1,
    /// Shallow water overtide of principal lunar
    M4,
    /// Lunar diurnal
    O1,
    /// Shallow water overtide of principal lunar
    M6,
    /// Shallow water terdiurnal
    MK3,
    /// Shallow water overtide of principal solar
    S4,
    /// Shallow water quarter diurnal
    MN4,
    /// Larger lunar evectional
    NU2,
    /// Shallow water overtide of principal solar
    S6,
    /// Variational
    MU2,
    /// Lunar elliptical semidiurnal second-order
    N2_2,
    /// Lunar diurnal
    OO1,
    /// Smaller lunar evectional
    LAM2,
    /// Solar diurnal
    S1,
    /// Smaller lunar elliptic diurnal
    M1,
    /// Smaller lunar elliptic diurnal
    J1,
    /// Lunar monthly
    MM,
    /// Solar semiannual
    SSA,
    /// Solar annual
    SA,
    /// Lunisolar synodic fortnightly
    MSF,
    /// Lunisolar fortnightly
    MF,
    /// Larger lunar evectional diurnal
    RHO1,
    /// Larger lunar elliptic diurnal
    Q1,
    /// Larger solar elliptic
    T2,
    /// Smaller solar elliptic
    R2,
    /// Larger elliptic diurnal
    Q1_2,
    /// Principal solar diurnal
    P1,
    /// Shallow water semidiurnal
    SM2_2,
    /// Lunar terdiurnal
    M3,
    /// Smaller lunar elliptic semidiurnal
    L2,
    /// Shallow water terdiurnal
    MK3_2,
    /// Lunisolar semidiurnal
    K2,
    /// Shallow water eighth diurnal
    M8,
    /// Shallow water quarter diurnal
    MS4,
    /// Lunar variational diurnal
    SIG1,
    /// Lunar elliptical semidiurnal
    EPS2,
    /// Shallow water semidiurnal
    MKS2,
    /// Lunar ecliptic semidiurnal
    ETA2,
}

impl TidalConstituent {
    /// Every cataloged constituent, in catalog order.
    pub const ALL: [TidalConstituent; 41] = [
        Self::M2,
        Self::S2,
        Self::N2,
        Self::K1,
        Self::M4,
        Self::O1,
        Self::M6,
        Self::MK3,
        Self::S4,
        Self::MN4,
        Self::NU2,
        Self::S6,
        Self::MU2,
        Self::N2_2,
        Self::OO1,
        Self::LAM2,
        Self::S1,
        Self::M1,
        Self::J1,
        Self::MM,
        Self::SSA,
        Self::SA,
        Self::MSF,
        Self::MF,
        Self::RHO1,
        Self::Q1,
        Self::T2,
        Self::R2,
        Self::Q1_2,
        Self::P1,
        Self::SM2_2,
        Self::M3,
        Self::L2,
        Self::MK3_2,
        Self::K2,
        Self::M8,
        Self::MS4,
        Self::SIG1,
        Self::EPS2,
        Self::MKS2,
        Self::ETA2,
    ];

    /// Angular speed in degrees per mean solar hour.
    pub const fn speed(self) -> f64 {
        match self {
            Self::M2 => 28.984_104_2,
            Self::S2 => 30.0,
            Self::N2 => 28.439_729_5,
            Self::K1 => 15.041_068_6,
            Self::M4 => 57.968_208_4,
            Self::O1 => 13.943_035_6,
            Self::M6 => 86.952_312_7,
            Self::MK3 => 44.025_172_9,
            Self::S4 => 60.0,
            Self::MN4 => 57.423_833_7,
            Self::NU2 => 28.512_583_1,
            Self::S6 => 90.0,
            Self::MU2 => 27.968_208_4,
            Self::N2_2 => 27.895_354_8,
            Self::OO1 => 16.139_101_7,
            Self::LAM2 => 29.455_625_3,
            Self::S1 => 15.0,
            Self::M1 => 14.496_693_9,
            Self::J1 => 15.585_443_3,
            Self::MM => 0.544_374_7,
            Self::SSA => 0.082_137_3,
            Self::SA => 0.041_068_6,
            Self::MSF => 1.015_895_8,
            Self::MF => 1.098_033_1,
            Self::RHO1 => 13.471_514_5,
            Self::Q1 => 13.398_660_9,
            Self::T2 => 29.958_933_3,
            Self::R2 => 30.041_066_7,
            Self::Q1_2 => 12.854_286_2,
            Self::P1 => 14.958_931_4,
            Self::SM2_2 => 31.015_895_8,
            Self::M3 => 43.476_156_3,
            Self::L2 => 29.528_478_9,
            Self::MK3_2 => 42.927_139_8,
            Self::K2 => 30.082_137_3,
            Self::M8 => 115.936_416_6,
            Self::MS4 => 58.984_104_2,
            Self::SIG1 => 12.927_139_8,
            Self::EPS2 => 27.423_833_7,
            Self::MKS2 => 29.066_241_5,
            Self::ETA2 => 30.626_512_0,
        }
    }

    /// Canonical name as published in harmonic constant tables.
    pub const fn name(self) -> &'static str {
        match self {
            Self::M2 => "M2",
            Self::S2 => "S2",
            Self::N2 => "N2",
            Self::K1 => "K1",
            Self::M4 => "M4",
            Self::O1 => "O1",
            Self::M6 => "M6",
            Self::MK3 => "MK3",
            Self::S4 => "S4",
            Self::MN4 => "MN4",
            Self::NU2 => "NU2",
            Self::S6 => "S6",
            Self::MU2 => "MU2",
            Self::N2_2 => "2N2",
            Self::OO1 => "OO1",
            Self::LAM2 => "LAM2",
            Self::S1 => "S1",
            Self::M1 => "M1",
            Self::J1 => "J1",
            Self::MM => "MM",
            Self::SSA => "SSA",
            Self::SA => "SA",
            Self::MSF => "MSF",
            Self::MF => "MF",
            Self::RHO1 => "RHO1",
            Self::Q1 => "Q1",
            Self::T2 => "T2",
            Self::R2 => "R2",
            Self::Q1_2 => "2Q1",
            Self::P1 => "P1",
            Self::SM2_2 => "2SM2",
            Self::M3 => "M3",
            Self::L2 => "L2",
            Self::MK3_2 => "2MK3",
            Self::K2 => "K2",
            Self::M8 => "M8",
            Self::MS4 => "MS4",
            Self::SIG1 => "SIG1",
            Self::EPS2 => "EPS2",
            Self::MKS2 => "MKS2",
            Self::ETA2 => "ETA2",
        }
    }

    /// Period of one full cycle in hours.
    pub fn period_hours(self) -> f64 {
        360.0 / self.speed()
    }

    /// Angular speed converted to radians per second, the unit of [`crate::Epoch`].
    pub fn radians_per_second(self) -> f64 {
        self.speed().to_radians() / 3600.0
    }

    /// Resolve an external constituent name against the catalog.
    ///
    /// Matching ignores ASCII case and surrounding whitespace. Names outside the
    /// catalog fail with [`CatalogError::UnknownConstituent`]; no speed is ever
    /// invented for them.
    ///
    /// # Example
    /// ```
    /// use tide_predictor::constituents::{CatalogError, TidalConstituent};
    ///
    /// assert_eq!(TidalConstituent::lookup("m2"), Ok(TidalConstituent::M2));
    /// assert_eq!(TidalConstituent::lookup("2N2"), Ok(TidalConstituent::N2_2));
    /// assert!(matches!(
    ///     TidalConstituent::lookup("MSQM"),
    ///     Err(CatalogError::UnknownConstituent(_))
    /// ));
    /// ```
    pub fn lookup(name: &str) -> Result<Self, CatalogError> {
        let wanted = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CatalogError::UnknownConstituent(wanted.to_string()))
    }
}

impl FromStr for TidalConstituent {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
    }
}

impl fmt::Display for TidalConstituent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
