use std::{collections::BTreeMap, fmt};

use crate::{axis::AxisId, dispatcher::DispatchError};

/// Last commanded absolute position of every joint.
///
/// Positions are what was asked for, not what the backend confirmed: a delta
/// stays applied even when sending the matching command failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    positions: BTreeMap<AxisId, f64>,
}

impl Default for PositionLedger {
    fn default() -> Self {
        Self {
            positions: AxisId::ALL.into_iter().map(|axis| (axis, 0.0)).collect(),
        }
    }
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(seed: &BTreeMap<AxisId, f64>) -> Self {
        let mut ledger = Self::new();
        ledger.seed(seed);
        ledger
    }

    pub fn get(&self, axis: AxisId) -> Result<f64, DispatchError> {
        self.positions
            .get(&axis)
            .copied()
            .ok_or_else(|| DispatchError::UnknownAxis(axis.to_string()))
    }

    /// Replaces every position; axes missing from `seed` go back to zero.
    pub fn seed(&mut self, seed: &BTreeMap<AxisId, f64>) {
        for axis in AxisId::ALL {
            self.positions
                .insert(axis, seed.get(&axis).copied().unwrap_or(0.0));
        }
    }

    pub fn apply_delta(&mut self, axis: AxisId, delta: f64) -> f64 {
        let position = self.positions.entry(axis).or_insert(0.0);
        *position += delta;
        *position
    }

    pub fn snapshot(&self) -> Vec<(AxisId, f64)> {
        self.positions
            .iter()
            .map(|(axis, position)| (*axis, *position))
            .collect()
    }
}

impl fmt::Display for PositionLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self
            .positions
            .iter()
            .map(|(axis, position)| format!("{}: {:.2}", axis, position))
            .collect::<Vec<_>>()
            .join(" | ");

        f.write_str(&summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let ledger = PositionLedger::new();

        for axis in AxisId::ALL {
            assert_eq!(ledger.get(axis).unwrap(), 0.0);
        }
    }

    #[test]
    fn seed_overwrites_and_defaults_missing_axes() {
        let mut ledger = PositionLedger::new();
        ledger.apply_delta(AxisId::J4, 7.0);

        let seed = BTreeMap::from([(AxisId::J1, 12.5), (AxisId::J3, -4.0)]);
        ledger.seed(&seed);

        assert_eq!(ledger.get(AxisId::J1).unwrap(), 12.5);
        assert_eq!(ledger.get(AxisId::J2).unwrap(), 0.0);
        assert_eq!(ledger.get(AxisId::J3).unwrap(), -4.0);
        assert_eq!(ledger.get(AxisId::J4).unwrap(), 0.0);
        assert_eq!(ledger.snapshot().len(), 6);
    }

    #[test]
    fn deltas_accumulate() {
        let mut ledger = PositionLedger::seeded(&BTreeMap::from([(AxisId::J2, 1.5)]));

        assert_eq!(ledger.apply_delta(AxisId::J2, 10.0), 11.5);
        assert_eq!(ledger.apply_delta(AxisId::J2, -2.5), 9.0);
        assert_eq!(ledger.get(AxisId::J2).unwrap(), 9.0);
        assert_eq!(ledger.get(AxisId::J1).unwrap(), 0.0);
    }

    #[test]
    fn summary_lists_every_axis() {
        let mut ledger = PositionLedger::new();
        ledger.apply_delta(AxisId::J1, 10.0);
        ledger.apply_delta(AxisId::J6, -2.346);

        assert_eq!(
            ledger.to_string(),
            "J1: 10.00 | J2: 0.00 | J3: 0.00 | J4: 0.00 | J5: 0.00 | J6: -2.35"
        );
    }
}
