//! Quality weights for accept offers.

use std::fmt;

use super::MediaTypeError;

/// A quality weight in `(0, 1]`, held in thousandths.
///
/// Canonical form rounds UP to three fractional digits: rounding down could
/// silently drop a representation from consideration, rounding up never
/// does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u16);

impl Quality {
    /// The full weight, `q=1`.
    pub const MAX: Quality = Quality(1000);

    /// Validates the range and canonicalizes to thousandths.
    ///
    /// # Example
    ///
    /// ```
    /// # use waypoint::media::Quality;
    /// assert_eq!(Quality::new(0.5012).unwrap().to_string(), "0.502");
    /// assert_eq!(Quality::new(1.0).unwrap().to_string(), "1");
    /// assert!(Quality::new(0.0).is_err());
    /// assert!(Quality::new(1.5).is_err());
    /// ```
    pub fn new(value: f64) -> Result<Self, MediaTypeError> {
        if !(value > 0.0 && value <= 1.0) {
            return Err(MediaTypeError::QualityOutOfRange(value));
        }
        let thousandths = (value * 1000.0).ceil() as u16;
        Ok(Quality(thousandths.min(1000)))
    }

    pub fn thousandths(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 1000 {
            return f.write_str("1");
        }
        let digits = format!("{:03}", self.0);
        let trimmed = digits.trim_end_matches('0');
        write!(f, "0.{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_thousandths() {
        assert_eq!(Quality::new(0.5012).unwrap().to_string(), "0.502");
        assert_eq!(Quality::new(0.5).unwrap().to_string(), "0.5");
        assert_eq!(Quality::new(0.05).unwrap().to_string(), "0.05");
        assert_eq!(Quality::new(0.001).unwrap().to_string(), "0.001");
        assert_eq!(Quality::new(0.0001).unwrap().to_string(), "0.001");
        assert_eq!(Quality::new(1.0).unwrap().to_string(), "1");
    }

    #[test]
    fn rejects_out_of_range_weights() {
        assert!(Quality::new(0.0).is_err());
        assert!(Quality::new(-0.5).is_err());
        assert!(Quality::new(1.0001).is_err());
        assert!(Quality::new(f64::NAN).is_err());
        assert!(Quality::new(f64::INFINITY).is_err());
    }

    #[test]
    fn near_one_stays_in_range() {
        assert_eq!(Quality::new(0.9995).unwrap().thousandths(), 1000);
        assert_eq!(Quality::new(0.9995).unwrap().to_string(), "1");
    }
}
