//! Fixed-point sensor values and the three-channel reading.
//!
//! A [`SensorValue`] is a whole part plus a fractional part in micro-units
//! (true value = whole + micro × 10⁻⁶).  Both parts always carry the same
//! sign, so `-0.5` is `(0, -500000)` and renders as `-0.500000`.
//!
//! A pair whose parts disagree in sign is taken at its numeric value and
//! stored in sign-consistent form: `(-3, 250000)` is -2.75, stored as
//! `(-2, -750000)` and rendered `-2.750000`.  Sign-consistent pairs,
//! including every `(whole >= 0, 0..=999999)` pair, come back unchanged
//! from their rendered text.
//!
//! The log representation of a [`SensorReading`] is
//!
//! ```text
//! temp: 23.450000; press: 1013.250000; humidity: 45.000000
//! ```
//!
//! and parses back to the identical reading.

use core::fmt;
use core::str::FromStr;

const MICRO: i64 = 1_000_000;
const MAX_MICROS: i64 = i32::MAX as i64 * MICRO + (MICRO - 1);
const MIN_MICROS: i64 = i32::MIN as i64 * MICRO - (MICRO - 1);

// ───────────────────────────────────────────────────────────────
// SensorValue
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorValue {
    whole: i32,
    micro: i32,
}

impl SensorValue {
    /// Build the value `whole + micro × 10⁻⁶`, folding any fractional
    /// overflow into the whole part and aligning the signs of both parts.
    pub const fn new(whole: i32, micro: i32) -> Self {
        Self::from_micros(whole as i64 * MICRO + micro as i64)
    }

    /// Build from a total count of micro-units, saturating at the `i32`
    /// range of the whole part.
    pub const fn from_micros(total: i64) -> Self {
        let total = if total > MAX_MICROS {
            MAX_MICROS
        } else if total < MIN_MICROS {
            MIN_MICROS
        } else {
            total
        };
        Self {
            whole: (total / MICRO) as i32,
            micro: (total % MICRO) as i32,
        }
    }

    /// Convert a driver float, rounding to the nearest micro-unit.
    /// NaN maps to zero.
    pub fn from_f64(value: f64) -> Self {
        Self::from_micros((value * MICRO as f64).round() as i64)
    }

    pub const fn whole(self) -> i32 {
        self.whole
    }

    pub const fn micro(self) -> i32 {
        self.micro
    }

    pub const fn as_micros(self) -> i64 {
        self.whole as i64 * MICRO + self.micro as i64
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.whole == 0 && self.micro < 0 {
            write!(f, "-0.{:06}", self.micro.unsigned_abs())
        } else {
            write!(f, "{}.{:06}", self.whole, self.micro.unsigned_abs())
        }
    }
}

/// Why a value or reading line failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No `.` separating whole and fractional parts.
    MissingPoint,
    InvalidWhole,
    /// Fractional part empty, non-numeric, or longer than six digits.
    InvalidFraction,
    OutOfRange,
    /// A reading line lacked the named `label: value` field.
    MissingField(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPoint => write!(f, "missing decimal point"),
            Self::InvalidWhole => write!(f, "invalid whole part"),
            Self::InvalidFraction => write!(f, "invalid fractional part"),
            Self::OutOfRange => write!(f, "value out of range"),
            Self::MissingField(name) => write!(f, "missing field '{name}'"),
        }
    }
}

impl FromStr for SensorValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').ok_or(ParseError::MissingPoint)?;

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidWhole);
        }
        if frac.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidFraction);
        }

        let whole: i64 = whole.parse().map_err(|_| ParseError::OutOfRange)?;
        // Right-pad so "45.5" reads as 500000 micro-units.
        let mut micro: i64 = frac.parse().map_err(|_| ParseError::InvalidFraction)?;
        for _ in frac.len()..6 {
            micro *= 10;
        }

        let magnitude = whole
            .checked_mul(MICRO)
            .and_then(|w| w.checked_add(micro))
            .ok_or(ParseError::OutOfRange)?;
        let total = if negative { -magnitude } else { magnitude };
        if !(MIN_MICROS..=MAX_MICROS).contains(&total) {
            return Err(ParseError::OutOfRange);
        }
        Ok(Self::from_micros(total))
    }
}

// ───────────────────────────────────────────────────────────────
// SensorReading
// ───────────────────────────────────────────────────────────────

/// One coherent temperature / pressure / humidity sample.
///
/// Units: °C, hPa, %RH.  Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    temperature: SensorValue,
    pressure: SensorValue,
    humidity: SensorValue,
}

impl SensorReading {
    pub const fn new(temperature: SensorValue, pressure: SensorValue, humidity: SensorValue) -> Self {
        Self {
            temperature,
            pressure,
            humidity,
        }
    }

    pub const fn temperature(&self) -> SensorValue {
        self.temperature
    }

    pub const fn pressure(&self) -> SensorValue {
        self.pressure
    }

    pub const fn humidity(&self) -> SensorValue {
        self.humidity
    }

    /// Whole degrees of temperature clamped to the 0–100 range of the
    /// battery-level characteristic that carries it.
    pub fn presence_level(&self) -> u8 {
        self.temperature.whole().clamp(0, 100) as u8
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temp: {}; press: {}; humidity: {}",
            self.temperature, self.pressure, self.humidity
        )
    }
}

fn field<'a>(part: Option<&'a str>, label: &'static str) -> Result<&'a str, ParseError> {
    part.and_then(|p| p.trim().strip_prefix(label))
        .and_then(|p| p.strip_prefix(':'))
        .map(str::trim)
        .ok_or(ParseError::MissingField(label))
}

impl FromStr for SensorReading {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim_end().split(';');
        let temperature = field(parts.next(), "temp")?.parse()?;
        let pressure = field(parts.next(), "press")?.parse()?;
        let humidity = field(parts.next(), "humidity")?.parse()?;
        Ok(Self::new(temperature, pressure, humidity))
    }
}
