use super::domain::RoundingMode;

/// Outcome of the rounding and capping pass for one contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CappedValue {
    /// Value after rounding, before caps.
    pub rounded: f64,
    /// Value after caps; what the executor actually applies.
    pub value: f64,
    pub was_capped: bool,
}

/// Round a contribution to currency scale, then clamp it into the step's cap
/// range. Caps clamp after rounding, and a clamp is never silent: the caller
/// records both the pre-clamp and post-clamp value in the trace.
pub fn apply(
    raw: f64,
    mode: RoundingMode,
    min_cap: Option<f64>,
    max_cap: Option<f64>,
) -> CappedValue {
    let rounded = round_currency(raw, mode);

    let mut value = rounded;
    if let Some(min) = min_cap {
        if value < min {
            value = min;
        }
    }
    if let Some(max) = max_cap {
        if value > max {
            value = max;
        }
    }

    CappedValue {
        rounded,
        value,
        was_capped: value != rounded,
    }
}

/// Round to two decimal places under the given mode.
///
/// `Up` moves away from zero, `Down` moves toward zero, `Nearest` breaks ties
/// away from zero, `Bankers` breaks ties to even. The sign conventions hold
/// for negative contributions (credits) as well.
pub fn round_currency(value: f64, mode: RoundingMode) -> f64 {
    if matches!(mode, RoundingMode::None) {
        return value;
    }

    // Snap accumulated float noise before deciding which cent we are on, so
    // 549.999999999 rounds as 550.00 rather than 549.99.
    let cents = (value * 100.0 * 1e8).round() / 1e8;

    let rounded_cents = match mode {
        RoundingMode::None => unreachable!("handled above"),
        RoundingMode::Up => {
            if cents >= 0.0 {
                cents.ceil()
            } else {
                cents.floor()
            }
        }
        RoundingMode::Down => cents.trunc(),
        RoundingMode::Nearest => cents.round(),
        RoundingMode::Bankers => {
            let floor = cents.floor();
            let fraction = cents - floor;
            if fraction > 0.5 {
                floor + 1.0
            } else if fraction < 0.5 {
                floor
            } else if (floor as i64) % 2 == 0 {
                floor
            } else {
                floor + 1.0
            }
        }
    };

    rounded_cents / 100.0
}
