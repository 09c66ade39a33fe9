use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dispatcher::DispatchError;

/// One of the six joints of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AxisId {
    J1,
    J2,
    J3,
    J4,
    J5,
    J6,
}

impl AxisId {
    pub const ALL: [AxisId; 6] = [
        AxisId::J1,
        AxisId::J2,
        AxisId::J3,
        AxisId::J4,
        AxisId::J5,
        AxisId::J6,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisId::J1 => "J1",
            AxisId::J2 => "J2",
            AxisId::J3 => "J3",
            AxisId::J4 => "J4",
            AxisId::J5 => "J5",
            AxisId::J6 => "J6",
        }
    }

    /// Name of the `[manual_stepper ...]` section Klipper uses for this joint by default.
    pub fn default_actuator(&self) -> String {
        format!("stepper_{}", self.as_str().to_lowercase())
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisId {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();

        AxisId::ALL
            .into_iter()
            .find(|axis| axis.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| DispatchError::UnknownAxis(name.to_string()))
    }
}

impl Serialize for AxisId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AxisId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// Maps every joint to the actuator name used in backend commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisBindings {
    actuators: BTreeMap<AxisId, String>,
}

impl Default for AxisBindings {
    fn default() -> Self {
        Self {
            actuators: AxisId::ALL
                .into_iter()
                .map(|axis| (axis, axis.default_actuator()))
                .collect(),
        }
    }
}

impl AxisBindings {
    pub fn new(actuators: BTreeMap<AxisId, String>) -> Self {
        Self { actuators }
    }

    pub fn actuator(&self, axis: AxisId) -> Result<&str, DispatchError> {
        self.actuators
            .get(&axis)
            .map(String::as_str)
            .ok_or_else(|| DispatchError::UnknownAxis(axis.to_string()))
    }

    /// Axes without a usable actuator name.
    pub fn unbound(&self) -> Vec<AxisId> {
        AxisId::ALL
            .into_iter()
            .filter(|axis| {
                self.actuators
                    .get(axis)
                    .is_none_or(|name| name.trim().is_empty())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_names_parse_case_insensitively() {
        assert_eq!("J1".parse::<AxisId>().unwrap(), AxisId::J1);
        assert_eq!(" j6 ".parse::<AxisId>().unwrap(), AxisId::J6);
    }

    #[test]
    fn unknown_axis_is_rejected() {
        let err = "J7".parse::<AxisId>().unwrap_err();
        assert!(matches!(err, DispatchError::UnknownAxis(name) if name == "J7"));
    }

    #[test]
    fn default_bindings_follow_stepper_naming() {
        let bindings = AxisBindings::default();

        assert_eq!(bindings.actuator(AxisId::J1).unwrap(), "stepper_j1");
        assert_eq!(bindings.actuator(AxisId::J6).unwrap(), "stepper_j6");
        assert!(bindings.unbound().is_empty());
    }

    #[test]
    fn missing_binding_is_unknown_axis() {
        let mut actuators = BTreeMap::new();
        actuators.insert(AxisId::J1, "stepper_j1".to_string());
        actuators.insert(AxisId::J2, "  ".to_string());
        let bindings = AxisBindings::new(actuators);

        assert!(matches!(
            bindings.actuator(AxisId::J3),
            Err(DispatchError::UnknownAxis(_))
        ));
        assert_eq!(
            bindings.unbound(),
            vec![AxisId::J2, AxisId::J3, AxisId::J4, AxisId::J5, AxisId::J6]
        );
    }
}
