#![forbid(unsafe_code)]

//! Damped harmonic oscillator: parameters, packed state, closed-form advance.
//!
//! Discontinuities in a motion output are absorbed by a spring that animates
//! the displacement back to zero equilibrium. The solver is analytical, not
//! iterative: advancing by `dt` is a single evaluation of the closed-form
//! solution for the active damping regime, so one large step and many small
//! steps agree to floating-point accuracy and the engine never has to tick
//! at a fixed rate.
//!
//! # Parameters
//!
//! - **stiffness** (k): restoring force strength, `> 0`. With unit mass the
//!   undamped angular frequency is `ω₀ = √k`.
//! - **damping_ratio** (ζ): `0` = undamped oscillation, `< 1` underdamped,
//!   `1` critically damped, `> 1` overdamped. Must be `≥ 0`.
//! - [`SpringParameters::SNAP`]: infinite stiffness. Advancing any state
//!   under `SNAP` lands on [`SpringState::AT_REST`] immediately.
//!
//! # Invariants
//!
//! 1. `advance(dt₁ + dt₂)` equals `advance(dt₁)` then `advance(dt₂)` within
//!    1e-4 relative error, for any split and any regime.
//! 2. Advancing [`SpringState::AT_REST`] is the identity for any `dt`.
//! 3. `advance` with a non-positive `dt` is the identity.
//! 4. `lerp(a, b, 1.0) == b` exactly; `lerp(a, b, 0.0) == a` exactly.
//! 5. Construction rejects `stiffness ≤ 0` and `damping_ratio < 0`; the only
//!    non-finite parameter value in circulation is `SNAP`.
//!
//! # Failure Modes
//!
//! - Zero damping never settles: `is_stable` reduces to the raw energy
//!   envelope and stays false until the threshold covers the amplitude.
//! - Extremely large `dt` drives the decay envelope to zero; the result is
//!   a clean `(0, 0)`, not a NaN.

use crate::error::SpecError;

/// Nanoseconds per second, as used by every time conversion in the crate.
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Half-width of the damping-ratio band treated as critically damped.
///
/// Inside the band the repeated-root solution is used; the underdamped and
/// overdamped branches are numerically unstable there (ω_d → 0).
const CRITICAL_BAND: f64 = 1e-3;

// ---------------------------------------------------------------------------
// SpringParameters
// ---------------------------------------------------------------------------

/// Stiffness and damping ratio of a unit-mass spring.
///
/// Values are validated on construction; [`SpringParameters::SNAP`] is the
/// one distinguished non-finite instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParameters {
    stiffness: f32,
    damping_ratio: f32,
}

impl SpringParameters {
    /// Infinitely stiff spring: collapses any displacement instantly.
    pub const SNAP: Self = Self {
        stiffness: f32::INFINITY,
        damping_ratio: 1.0,
    };

    /// Create parameters, rejecting degenerate values.
    ///
    /// `stiffness` must be finite and `> 0`; `damping_ratio` must be finite
    /// and `≥ 0`. Use [`SpringParameters::SNAP`] for the instant spring.
    pub fn new(stiffness: f32, damping_ratio: f32) -> Result<Self, SpecError> {
        if !(stiffness.is_finite() && stiffness > 0.0) {
            return Err(SpecError::InvalidStiffness { stiffness });
        }
        if !(damping_ratio.is_finite() && damping_ratio >= 0.0) {
            return Err(SpecError::InvalidDampingRatio { damping_ratio });
        }
        Ok(Self {
            stiffness,
            damping_ratio,
        })
    }

    /// Stiffness constant.
    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    /// Damping ratio.
    #[inline]
    #[must_use]
    pub fn damping_ratio(&self) -> f32 {
        self.damping_ratio
    }

    /// Whether these parameters are the instant spring.
    #[inline]
    #[must_use]
    pub fn is_snap(&self) -> bool {
        self.stiffness.is_infinite()
    }

    /// Interpolate between two parameter sets.
    ///
    /// Stiffness is interpolated on its reciprocal (so a target of
    /// [`SpringParameters::SNAP`] is approached smoothly: `1/k → 0`), the
    /// damping ratio linearly. The endpoints saturate: `fraction ≤ 0`
    /// returns `a` exactly and `fraction ≥ 1` returns `b` exactly, which is
    /// what makes `SNAP` reachable at all — no finite interpolation step
    /// produces an infinite stiffness.
    #[must_use]
    pub fn lerp(a: Self, b: Self, fraction: f32) -> Self {
        if fraction <= 0.0 {
            return a;
        }
        if fraction >= 1.0 {
            return b;
        }
        let t = f64::from(fraction);
        let inv_k = (1.0 - t) / f64::from(a.stiffness) + t / f64::from(b.stiffness);
        Self {
            stiffness: (1.0 / inv_k) as f32,
            damping_ratio: a.damping_ratio + (b.damping_ratio - a.damping_ratio) * fraction,
        }
    }
}

/// Common parameter sets for gesture-driven motion.
pub mod presets {
    use super::SpringParameters;

    /// General-purpose spring: settles in a few hundred milliseconds with
    /// no visible overshoot.
    #[must_use]
    pub fn standard() -> SpringParameters {
        SpringParameters::new(380.0, 0.9).expect("const preset")
    }

    /// Critically damped spring for discreet, utilitarian transitions.
    #[must_use]
    pub fn smooth() -> SpringParameters {
        SpringParameters::new(170.0, 1.0).expect("const preset")
    }

    /// Tight spring for small, fast hand-offs.
    #[must_use]
    pub fn snappy() -> SpringParameters {
        SpringParameters::new(700.0, 1.0).expect("const preset")
    }

    /// Lightly underdamped spring with a hint of bounce.
    #[must_use]
    pub fn expressive() -> SpringParameters {
        SpringParameters::new(380.0, 0.7).expect("const preset")
    }
}

// ---------------------------------------------------------------------------
// SpringState
// ---------------------------------------------------------------------------

/// Displacement from equilibrium and velocity, both in output units.
///
/// Two `f32`s; the state is deliberately small enough to copy freely and to
/// pack into a single 64-bit word if a host ever needs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringState {
    /// Offset from the zero equilibrium.
    pub displacement: f32,
    /// Rate of change of the displacement, per second.
    pub velocity: f32,
}

impl SpringState {
    /// The canonical settled state.
    pub const AT_REST: Self = Self {
        displacement: 0.0,
        velocity: 0.0,
    };

    /// Create a state with the given displacement and zero velocity.
    #[must_use]
    pub fn with_displacement(displacement: f32) -> Self {
        Self {
            displacement,
            velocity: 0.0,
        }
    }

    /// Whether this state is exactly the settled state.
    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        *self == Self::AT_REST
    }

    /// Advance the oscillator by `elapsed_ns` under `params`.
    ///
    /// Evaluates the analytical solution of `x'' + 2ζω₀x' + ω₀²x = 0` for
    /// the active regime. Non-positive `elapsed_ns` and an at-rest state are
    /// both identity cases; [`SpringParameters::SNAP`] maps everything to
    /// [`SpringState::AT_REST`].
    #[must_use]
    pub fn advance(self, elapsed_ns: i64, params: SpringParameters) -> Self {
        if params.is_snap() {
            return Self::AT_REST;
        }
        if self.is_at_rest() || elapsed_ns <= 0 {
            return self;
        }

        let t = elapsed_ns as f64 / NANOS_PER_SEC;
        let x0 = f64::from(self.displacement);
        let v0 = f64::from(self.velocity);
        let omega = f64::from(params.stiffness).sqrt();
        let zeta = f64::from(params.damping_ratio);

        let (x, v) = if zeta < 1.0 - CRITICAL_BAND {
            // Underdamped: decaying sinusoid at the damped frequency.
            let omega_d = omega * (1.0 - zeta * zeta).sqrt();
            let decay = (-zeta * omega * t).exp();
            let (sin, cos) = (omega_d * t).sin_cos();
            let a = x0;
            let b = (v0 + zeta * omega * x0) / omega_d;
            let x = decay * (a * cos + b * sin);
            let v = decay
                * ((b * omega_d - a * zeta * omega) * cos - (a * omega_d + b * zeta * omega) * sin);
            (x, v)
        } else if zeta > 1.0 + CRITICAL_BAND {
            // Overdamped: sum of two decaying exponentials.
            let s = omega * (zeta * zeta - 1.0).sqrt();
            let r1 = -zeta * omega + s;
            let r2 = -zeta * omega - s;
            let c1 = (v0 - r2 * x0) / (r1 - r2);
            let c2 = x0 - c1;
            let e1 = (r1 * t).exp();
            let e2 = (r2 * t).exp();
            (c1 * e1 + c2 * e2, c1 * r1 * e1 + c2 * r2 * e2)
        } else {
            // Critically damped: repeated root at -ω₀.
            let decay = (-omega * t).exp();
            let a = x0;
            let b = v0 + omega * x0;
            let x = decay * (a + b * t);
            let v = decay * (b - omega * (a + b * t));
            (x, v)
        };

        Self {
            displacement: x as f32,
            velocity: v as f32,
        }
    }

    /// Whether the remaining motion stays below `threshold`.
    ///
    /// Uses the energy envelope `√(x² + (v/ω₀)²)` discounted by
    /// `e^(-ζ)`: the envelope bounds the amplitude the motion can still
    /// reach, and the discount makes the predicate strictly more permissive
    /// as damping grows (a heavily damped spring cannot convert much of its
    /// velocity back into displacement).
    #[must_use]
    pub fn is_stable(&self, params: SpringParameters, threshold: f32) -> bool {
        if params.is_snap() || self.is_at_rest() {
            return true;
        }
        let omega = f64::from(params.stiffness).sqrt();
        let x = f64::from(self.displacement);
        let v = f64::from(self.velocity);
        let envelope = (x * x + (v / omega) * (v / omega)).sqrt();
        envelope * (-f64::from(params.damping_ratio)).exp() < f64::from(threshold)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MS_16: i64 = 16_000_000;
    const SEC_1: i64 = 1_000_000_000;

    fn params(stiffness: f32, damping_ratio: f32) -> SpringParameters {
        SpringParameters::new(stiffness, damping_ratio).expect("valid test parameters")
    }

    fn relative_error(a: f32, b: f32) -> f32 {
        let scale = a.abs().max(b.abs()).max(1e-3);
        (a - b).abs() / scale
    }

    #[test]
    fn rejects_non_positive_stiffness() {
        assert!(matches!(
            SpringParameters::new(0.0, 1.0),
            Err(SpecError::InvalidStiffness { .. })
        ));
        assert!(matches!(
            SpringParameters::new(-5.0, 1.0),
            Err(SpecError::InvalidStiffness { .. })
        ));
        assert!(matches!(
            SpringParameters::new(f32::NAN, 1.0),
            Err(SpecError::InvalidStiffness { .. })
        ));
        assert!(matches!(
            SpringParameters::new(f32::INFINITY, 1.0),
            Err(SpecError::InvalidStiffness { .. })
        ));
    }

    #[test]
    fn rejects_negative_damping() {
        assert!(matches!(
            SpringParameters::new(100.0, -0.1),
            Err(SpecError::InvalidDampingRatio { .. })
        ));
        assert!(matches!(
            SpringParameters::new(100.0, f32::NAN),
            Err(SpecError::InvalidDampingRatio { .. })
        ));
    }

    #[test]
    fn zero_damping_is_allowed() {
        let p = params(100.0, 0.0);
        assert!((p.damping_ratio() - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn snap_collapses_any_state() {
        let state = SpringState {
            displacement: 42.0,
            velocity: -17.0,
        };
        assert_eq!(state.advance(1, SpringParameters::SNAP), SpringState::AT_REST);
        assert_eq!(
            state.advance(10 * SEC_1, SpringParameters::SNAP),
            SpringState::AT_REST
        );
    }

    #[test]
    fn at_rest_is_a_fixed_point() {
        let p = params(100.0, 1.0);
        assert_eq!(SpringState::AT_REST.advance(SEC_1, p), SpringState::AT_REST);
    }

    #[test]
    fn non_positive_elapsed_is_identity() {
        let p = params(100.0, 1.0);
        let state = SpringState::with_displacement(1.0);
        assert_eq!(state.advance(0, p), state);
        assert_eq!(state.advance(-MS_16, p), state);
    }

    #[test]
    fn critically_damped_decays_without_sign_change() {
        let p = params(100.0, 1.0);
        let mut state = SpringState::with_displacement(1.0);
        let mut prev = state.displacement;
        for _ in 0..120 {
            state = state.advance(MS_16, p);
            assert!(
                state.displacement >= -1e-6,
                "critical damping must not overshoot, got {}",
                state.displacement
            );
            assert!(state.displacement <= prev + 1e-6);
            prev = state.displacement;
        }
        assert!(state.displacement < 1e-3);
    }

    #[test]
    fn underdamped_oscillates() {
        let p = params(300.0, 0.1);
        let mut state = SpringState::with_displacement(1.0);
        let mut crossed = false;
        for _ in 0..200 {
            state = state.advance(MS_16, p);
            if state.displacement < 0.0 {
                crossed = true;
            }
        }
        assert!(crossed, "lightly damped spring should cross equilibrium");
    }

    #[test]
    fn overdamped_converges_without_crossing() {
        let p = params(100.0, 3.0);
        let mut state = SpringState::with_displacement(1.0);
        for _ in 0..600 {
            state = state.advance(MS_16, p);
            assert!(state.displacement >= -1e-6);
        }
        assert!(
            state.displacement < 0.01,
            "overdamped spring should still converge, got {}",
            state.displacement
        );
    }

    #[test]
    fn split_advance_matches_whole_advance() {
        let cases = [
            (100.0, 1.0),
            (380.0, 0.5),
            (50.0, 2.5),
            (700.0, 0.999),
            (120.0, 0.0),
        ];
        for (k, zeta) in cases {
            let p = params(k, zeta);
            let start = SpringState {
                displacement: -3.0,
                velocity: 7.5,
            };
            let whole = start.advance(10 * MS_16, p);
            let mut split = start;
            for _ in 0..10 {
                split = split.advance(MS_16, p);
            }
            assert!(
                relative_error(whole.displacement, split.displacement) < 1e-4,
                "displacement mismatch for k={k} zeta={zeta}: {} vs {}",
                whole.displacement,
                split.displacement
            );
            assert!(
                relative_error(whole.velocity, split.velocity) < 1e-4,
                "velocity mismatch for k={k} zeta={zeta}: {} vs {}",
                whole.velocity,
                split.velocity
            );
        }
    }

    #[test]
    fn huge_elapsed_lands_on_equilibrium() {
        let p = params(100.0, 1.0);
        let state = SpringState {
            displacement: 5.0,
            velocity: -40.0,
        };
        let settled = state.advance(3600 * SEC_1, p);
        assert!(settled.displacement.abs() < 1e-6);
        assert!(settled.velocity.abs() < 1e-6);
        assert!(settled.displacement.is_finite() && settled.velocity.is_finite());
    }

    #[test]
    fn lerp_saturates_at_both_ends() {
        let a = params(100.0, 0.5);
        let b = params(400.0, 1.5);
        assert_eq!(SpringParameters::lerp(a, b, 0.0), a);
        assert_eq!(SpringParameters::lerp(a, b, -1.0), a);
        assert_eq!(SpringParameters::lerp(a, b, 1.0), b);
        assert_eq!(SpringParameters::lerp(a, b, 2.0), b);
    }

    #[test]
    fn lerp_to_snap_is_snap_only_at_one() {
        let a = params(100.0, 1.0);
        let nearly = SpringParameters::lerp(a, SpringParameters::SNAP, 0.999);
        assert!(!nearly.is_snap(), "stiffness must stay finite below 1.0");
        assert!(nearly.stiffness() > a.stiffness());
        assert_eq!(
            SpringParameters::lerp(a, SpringParameters::SNAP, 1.0),
            SpringParameters::SNAP
        );
    }

    #[test]
    fn lerp_toward_snap_is_monotone_in_stiffness() {
        let a = params(200.0, 1.0);
        let mut prev = a.stiffness();
        for i in 1..10 {
            let f = i as f32 / 10.0;
            let k = SpringParameters::lerp(a, SpringParameters::SNAP, f).stiffness();
            assert!(k > prev, "stiffness should grow with the fraction");
            prev = k;
        }
    }

    #[test]
    fn stability_threshold_respects_envelope() {
        let p = params(100.0, 1.0);
        let wide = SpringState::with_displacement(0.5);
        assert!(!wide.is_stable(p, 0.01));
        let narrow = SpringState::with_displacement(0.001);
        assert!(narrow.is_stable(p, 0.01));
    }

    #[test]
    fn stability_counts_velocity() {
        let p = params(100.0, 1.0);
        // No displacement but enough velocity to swing well past the
        // threshold: ω₀ = 10, so v/ω₀ = 0.5.
        let state = SpringState {
            displacement: 0.0,
            velocity: 5.0,
        };
        assert!(!state.is_stable(p, 0.01));
    }

    #[test]
    fn stability_more_permissive_with_damping() {
        let state = SpringState::with_displacement(0.02);
        let loose = params(100.0, 0.0);
        let tight = params(100.0, 4.0);
        let threshold = 0.01;
        assert!(!state.is_stable(loose, threshold));
        assert!(state.is_stable(tight, threshold));
    }

    #[test]
    fn snap_and_rest_are_always_stable() {
        let p = params(100.0, 1.0);
        assert!(SpringState::AT_REST.is_stable(p, 1e-9));
        let state = SpringState::with_displacement(100.0);
        assert!(state.is_stable(SpringParameters::SNAP, 1e-9));
    }

    #[test]
    fn presets_are_valid() {
        for p in [
            presets::standard(),
            presets::smooth(),
            presets::snappy(),
            presets::expressive(),
        ] {
            assert!(p.stiffness() > 0.0);
            assert!(p.damping_ratio() >= 0.0);
            assert!(!p.is_snap());
        }
    }

    #[test]
    fn deterministic_across_runs() {
        let run = || {
            let p = params(380.0, 0.8);
            let mut state = SpringState {
                displacement: 1.0,
                velocity: -2.0,
            };
            let mut trace = Vec::new();
            for _ in 0..50 {
                state = state.advance(MS_16, p);
                trace.push((state.displacement.to_bits(), state.velocity.to_bits()));
            }
            trace
        };
        assert_eq!(run(), run(), "advance must be bit-reproducible");
    }
}
