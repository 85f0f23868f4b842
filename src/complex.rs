//! Complex amplitude of a single constituent's response at one location.

use serde::{Deserialize, Serialize};

/// A constituent's measured phasor stored in Cartesian form.
///
/// The magnitude is the constituent's amplitude (in the height unit of the
/// data set) and the angle is its phase in radians. Any real inputs are
/// accepted; NaN components propagate to every derived quantity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexAmplitude {
    pub real: f64,
    pub imaginary: f64,
}

impl ComplexAmplitude {
    /// The response of an absent constituent.
    pub const ZERO: ComplexAmplitude = ComplexAmplitude {
        real: 0.0,
        imaginary: 0.0,
    };

    pub const fn new(real: f64, imaginary: f64) -> Self {
        Self { real, imaginary }
    }

    /// Build from amplitude and phase (radians).
    pub fn from_polar(amplitude: f64, phase_radians: f64) -> Self {
        let (sin, cos) = phase_radians.sin_cos();
        Self {
            real: amplitude * cos,
            imaginary: amplitude * sin,
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.real.hypot(self.imaginary)
    }

    pub fn phase_radians(&self) -> f64 {
        self.imaginary.atan2(self.real)
    }

    pub fn phase_degrees(&self) -> f64 {
        self.phase_radians().to_degrees()
    }
}
