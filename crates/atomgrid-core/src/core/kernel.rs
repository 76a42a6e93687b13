use std::f64::consts::E;

/// Multiple of the atom radius at which the Gaussian core hands over to the taper.
pub const CORE_RADIUS_MULTIPLE: f64 = 1.0;
/// Multiple of the atom radius beyond which the kernel is identically zero.
pub const CUTOFF_RADIUS_MULTIPLE: f64 = 1.5;

const E2: f64 = E * E;

/// The three pieces of the radial density kernel.
///
/// Both [`density`] and [`density_derivative`] dispatch on the same classification,
/// so the branch boundaries can never drift apart between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelRegion {
    /// `0 <= dist <= r`: Gaussian `exp(-2 d^2 / r^2)`.
    Core,
    /// `r < dist < 1.5r`: quadratic taper matching the Gaussian's value and slope at `r`.
    Taper,
    /// `dist >= 1.5r`: no contribution.
    Zero,
}

impl KernelRegion {
    /// Classifies a distance against an atom radius.
    ///
    /// Boundary points fall into the closed interval containing them: `dist == r` is
    /// [`KernelRegion::Core`] and `dist == 1.5r` is [`KernelRegion::Zero`].
    #[inline]
    pub fn classify(dist: f64, radius: f64) -> Self {
        if dist <= CORE_RADIUS_MULTIPLE * radius {
            KernelRegion::Core
        } else if dist < CUTOFF_RADIUS_MULTIPLE * radius {
            KernelRegion::Taper
        } else {
            KernelRegion::Zero
        }
    }
}

/// Distance beyond which an atom of the given radius contributes nothing.
#[inline]
pub fn cutoff(radius: f64) -> f64 {
    CUTOFF_RADIUS_MULTIPLE * radius
}

/// Kernel value and its distance derivative evaluated together.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KernelSample {
    pub value: f64,
    pub derivative: f64,
}

#[inline]
pub fn density(dist: f64, radius: f64) -> f64 {
    match KernelRegion::classify(dist, radius) {
        KernelRegion::Core => gaussian(dist, radius),
        // (4/(e^2 r^2)) d^2 - (12/(e^2 r)) d + 9/e^2, factored so it cannot go negative.
        KernelRegion::Taper => {
            let t = 2.0 * dist / radius - 3.0;
            t * t / E2
        }
        KernelRegion::Zero => 0.0,
    }
}

#[inline]
pub fn density_derivative(dist: f64, radius: f64) -> f64 {
    match KernelRegion::classify(dist, radius) {
        KernelRegion::Core => -(4.0 * (dist / radius) / radius) * gaussian(dist, radius),
        KernelRegion::Taper => 4.0 * (2.0 * dist / radius - 3.0) / (E2 * radius),
        KernelRegion::Zero => 0.0,
    }
}

#[inline]
pub fn sample(dist: f64, radius: f64) -> KernelSample {
    KernelSample {
        value: density(dist, radius),
        derivative: density_derivative(dist, radius),
    }
}

#[inline]
fn gaussian(dist: f64, radius: f64) -> f64 {
    // Ratio first: `radius * radius` underflows to zero for tiny radii.
    let q = dist / radius;
    (-2.0 * q * q).exp()
}
