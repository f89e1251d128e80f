use std::fmt;

/// Unit of an epoch-relative long or double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    pub fn nanos_per_unit(self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
        })
    }
}

/// How a fractional nanosecond count is rounded to an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// Away from zero.
    Up,
    /// Towards zero.
    Down,
    Ceiling,
    Floor,
    HalfUp,
    HalfDown,
    HalfEven,
    /// The value must already be integral.
    Unnecessary,
}

impl RoundingMode {
    /// Rounds `value` to an integral f64, or `None` for `Unnecessary` with a
    /// fractional part.
    pub fn round(self, value: f64) -> Option<f64> {
        let rounded = match self {
            RoundingMode::Up => {
                if value >= 0.0 {
                    value.ceil()
                } else {
                    value.floor()
                }
            }
            RoundingMode::Down => value.trunc(),
            RoundingMode::Ceiling => value.ceil(),
            RoundingMode::Floor => value.floor(),
            RoundingMode::HalfUp => value.round(),
            RoundingMode::HalfDown => {
                let truncated = value.trunc();
                if (value - truncated).abs() > 0.5 {
                    truncated + value.signum()
                } else {
                    truncated
                }
            }
            RoundingMode::HalfEven => value.round_ties_even(),
            RoundingMode::Unnecessary => {
                if value.fract() != 0.0 {
                    return None;
                }
                value
            }
        };
        Some(rounded)
    }
}

/// Converts an epoch value in `unit` to epoch nanoseconds, `None` on overflow.
pub fn epoch_nanos_from_long(value: i64, unit: TimeUnit) -> Option<i64> {
    value.checked_mul(unit.nanos_per_unit())
}

/// Converts a fractional epoch value in `unit` to epoch nanoseconds.
///
/// Returns `None` when the value is not finite, does not fit in an i64, or
/// needs rounding under [`RoundingMode::Unnecessary`].
pub fn epoch_nanos_from_double(value: f64, unit: TimeUnit, rounding: RoundingMode) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let scaled = rounding.round(value * unit.nanos_per_unit() as f64)?;
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
        return None;
    }
    Some(scaled as i64)
}
