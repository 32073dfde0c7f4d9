//! Fixed-point conversion between UI decimal units and wire integers.

use crate::error::ProtocolError;

pub const MAX_DECIMALS: u32 = 6;

/// `10^decimals`. Outbound values are multiplied by it, inbound values divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor {
    decimals: u32,
    factor: i64,
}

impl ScaleFactor {
    pub fn new(decimals: u32) -> Result<Self, ProtocolError> {
        if decimals > MAX_DECIMALS {
            return Err(ProtocolError::DecimalsOutOfRange {
                requested: decimals,
                max: MAX_DECIMALS,
            });
        }
        Ok(Self {
            decimals,
            factor: 10_i64.pow(decimals),
        })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn factor(&self) -> i64 {
        self.factor
    }

    /// Scales a UI value onto the wire. The product is rounded to the nearest
    /// integer with halves away from zero.
    pub fn to_wire(&self, raw: f64) -> Result<i64, ProtocolError> {
        if !raw.is_finite() {
            return Err(ProtocolError::NonFiniteValue(raw));
        }
        let scaled = (raw * self.factor as f64).round();
        if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return Err(ProtocolError::ValueOutOfRange(scaled));
        }
        Ok(scaled as i64)
    }

    pub fn from_wire(&self, wire: i64) -> f64 {
        wire as f64 / self.factor as f64
    }

    /// Display text for a wire value, without trailing zeros (`220` at one
    /// decimal reads `22`).
    pub fn readout(&self, wire: i64) -> String {
        let value = self.from_wire(wire);
        if value == 0.0 {
            // avoid "-0"
            return "0".to_string();
        }
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_decimal_round_trips_through_the_wire() {
        let scale = ScaleFactor::new(1).expect("scale");
        let wire = scale.to_wire(22.5).expect("to wire");
        assert_eq!(wire, 225);
        assert_eq!(scale.from_wire(wire), 22.5);
        assert_eq!(scale.readout(wire), "22.5");
    }

    #[test]
    fn values_with_at_most_d_decimals_survive_exactly() {
        for decimals in 0..=3 {
            let scale = ScaleFactor::new(decimals).expect("scale");
            for wire in [-1234_i64, -7, 0, 1, 73, 225, 999, 40_000] {
                let raw = scale.from_wire(wire);
                assert_eq!(scale.to_wire(raw).expect("to wire"), wire);
                assert_eq!(scale.from_wire(scale.to_wire(raw).expect("to wire")), raw);
            }
        }
    }

    #[test]
    fn fractional_products_round_half_away_from_zero() {
        let scale = ScaleFactor::new(1).expect("scale");
        assert_eq!(scale.to_wire(7.34).expect("round down"), 73);
        assert_eq!(scale.to_wire(7.36).expect("round up"), 74);
        assert_eq!(scale.to_wire(0.25).expect("half"), 3);
        assert_eq!(scale.to_wire(-0.25).expect("negative half"), -3);
    }

    #[test]
    fn readout_drops_trailing_zeros() {
        let scale = ScaleFactor::new(2).expect("scale");
        assert_eq!(scale.readout(2200), "22");
        assert_eq!(scale.readout(2250), "22.5");
        assert_eq!(scale.readout(0), "0");
    }

    #[test]
    fn rejects_unusable_inputs() {
        assert!(matches!(
            ScaleFactor::new(MAX_DECIMALS + 1),
            Err(ProtocolError::DecimalsOutOfRange { .. })
        ));
        let scale = ScaleFactor::new(1).expect("scale");
        assert!(matches!(
            scale.to_wire(f64::NAN),
            Err(ProtocolError::NonFiniteValue(_))
        ));
        assert!(matches!(
            scale.to_wire(1e30),
            Err(ProtocolError::ValueOutOfRange(_))
        ));
    }
}
