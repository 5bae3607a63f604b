use std::f64::consts::PI;

use super::{ModelError, ParametricModel};

static GAUSSIAN2D_PARAMS: [&str; 6] = [
    "amplitude",
    "x_mean",
    "y_mean",
    "x_stddev",
    "y_stddev",
    "theta",
];

/// Elliptical two-dimensional Gaussian.
///
/// ```text
/// f(x, y) = A exp(-(a dx² + b dx dy + c dy²))
///
/// a = cos²θ / 2σx² + sin²θ / 2σy²
/// b = sin2θ / 2σx² - sin2θ / 2σy²
/// c = sin²θ / 2σx² + cos²θ / 2σy²
/// ```
///
/// `theta` is the rotation angle of the x axis of the ellipse in radians,
/// counter-clockwise. The integral over the plane is `2π A σx σy`.
///
/// # Examples
/// ```
/// use datasets::model::{Gaussian2D, ParametricModel};
///
/// let g = Gaussian2D::new(10.0, 5.0, 5.0, 2.0, 2.0, 0.0);
/// assert_eq!(g.evaluate(5.0, 5.0).unwrap(), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian2D {
    pub amplitude: f64,
    pub x_mean: f64,
    pub y_mean: f64,
    pub x_stddev: f64,
    pub y_stddev: f64,
    pub theta: f64,
}

impl Gaussian2D {
    pub fn new(
        amplitude: f64,
        x_mean: f64,
        y_mean: f64,
        x_stddev: f64,
        y_stddev: f64,
        theta: f64,
    ) -> Self {
        Self {
            amplitude,
            x_mean,
            y_mean,
            x_stddev,
            y_stddev,
            theta,
        }
    }

    /// Peak amplitude of a Gaussian with the given total flux and widths.
    pub fn amplitude_for_flux(flux: f64, x_stddev: f64, y_stddev: f64) -> f64 {
        flux / (2.0 * PI * x_stddev * y_stddev)
    }

    /// Total flux integrated over the plane.
    pub fn total_flux(&self) -> f64 {
        2.0 * PI * self.amplitude * self.x_stddev * self.y_stddev
    }

    fn slot(&mut self, name: &str) -> Option<&mut f64> {
        match name {
            "amplitude" => Some(&mut self.amplitude),
            "x_mean" => Some(&mut self.x_mean),
            "y_mean" => Some(&mut self.y_mean),
            "x_stddev" => Some(&mut self.x_stddev),
            "y_stddev" => Some(&mut self.y_stddev),
            "theta" => Some(&mut self.theta),
            _ => None,
        }
    }
}

impl Default for Gaussian2D {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 1.0, 0.0)
    }
}

impl ParametricModel for Gaussian2D {
    fn name(&self) -> &str {
        "Gaussian2D"
    }

    fn param_names(&self) -> &[&str] {
        &GAUSSIAN2D_PARAMS
    }

    fn param(&self, name: &str) -> Option<f64> {
        match name {
            "amplitude" => Some(self.amplitude),
            "x_mean" => Some(self.x_mean),
            "y_mean" => Some(self.y_mean),
            "x_stddev" => Some(self.x_stddev),
            "y_stddev" => Some(self.y_stddev),
            "theta" => Some(self.theta),
            _ => None,
        }
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), ModelError> {
        match self.slot(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ModelError::UnknownParameter {
                model: "Gaussian2D".to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn evaluate(&self, x: f64, y: f64) -> Result<f64, ModelError> {
        for (name, value) in [("x_stddev", self.x_stddev), ("y_stddev", self.y_stddev)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ModelError::InvalidParameter {
                    name: name.to_string(),
                    value,
                });
            }
        }

        let (sin_t, cos_t) = self.theta.sin_cos();
        let cos2 = cos_t * cos_t;
        let sin2 = sin_t * sin_t;
        let sin_2t = (2.0 * self.theta).sin();
        let xstd2 = self.x_stddev * self.x_stddev;
        let ystd2 = self.y_stddev * self.y_stddev;

        let a = 0.5 * (cos2 / xstd2 + sin2 / ystd2);
        let b = 0.5 * (sin_2t / xstd2 - sin_2t / ystd2);
        let c = 0.5 * (sin2 / xstd2 + cos2 / ystd2);

        let dx = x - self.x_mean;
        let dy = y - self.y_mean;
        Ok(self.amplitude * (-(a * dx * dx + b * dx * dy + c * dy * dy)).exp())
    }
}
