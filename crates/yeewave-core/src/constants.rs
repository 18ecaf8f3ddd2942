//! Physical constants of the model (SI units).

/// Speed of light in vacuum (m/s).
pub const C0: f64 = 299_792_458.0;

/// Vacuum permittivity (F/m).
pub const EPS0: f64 = 8.854_187_817e-12;

/// Vacuum permeability (H/m), fixed at 4π×10⁻⁷.
pub const MU0: f64 = 4.0 * std::f64::consts::PI * 1e-7;

/// Wave impedance of free space, μ0·c0 (Ω).
pub const ETA0: f64 = MU0 * C0;
