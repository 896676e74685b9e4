//! Core types exchanged with the simulation engine
//!
//! These are plain data types that don't depend on any particular backend.

use ordered_float::OrderedFloat;
use std::fmt;

/// A variable code understood by the engine (TraCI numbering)
pub type VariableId = u8;

/// Simulation variable holding the ids of vehicles that arrived in the last step
pub const VAR_ARRIVED_VEHICLES_IDS: VariableId = 0x7a;

/// Start of the telemetry subscription window, in simulated seconds
pub const SUBSCRIPTION_BEGIN: f64 = 0.0;

/// End of the telemetry subscription window (2^31 - 1 seconds)
pub const SUBSCRIPTION_END: f64 = 2_147_483_647.0;

/// Parameters of a standing subscription request
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRequest {
    pub variables: Vec<VariableId>,
    pub begin: f64,
    pub end: f64,
}

impl SubscriptionRequest {
    pub fn new(variables: Vec<VariableId>, begin: f64, end: f64) -> Self {
        Self {
            variables,
            begin,
            end,
        }
    }

    /// The telemetry subscription the driver registers: arrived vehicles,
    /// for the whole run
    pub fn arrived_vehicles() -> Self {
        Self::new(
            vec![VAR_ARRIVED_VEHICLES_IDS],
            SUBSCRIPTION_BEGIN,
            SUBSCRIPTION_END,
        )
    }
}

/// A typed value as returned by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum TraciValue {
    UByte(u8),
    Byte(i8),
    Int(i32),
    Double(f64),
    String(String),
    StringList(Vec<String>),
    Position2D { x: f64, y: f64 },
    Compound(Vec<TraciValue>),
}

impl TraciValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TraciValue::Double(v) => Some(*v),
            TraciValue::Int(v) => Some(f64::from(*v)),
            TraciValue::UByte(v) => Some(f64::from(*v)),
            TraciValue::Byte(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn into_string_list(self) -> Option<Vec<String>> {
        match self {
            TraciValue::StringList(list) => Some(list),
            _ => None,
        }
    }
}

impl fmt::Display for TraciValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraciValue::UByte(v) => write!(f, "{}", v),
            TraciValue::Byte(v) => write!(f, "{}", v),
            TraciValue::Int(v) => write!(f, "{}", v),
            TraciValue::Double(v) => write!(f, "{}", v),
            TraciValue::String(s) => f.write_str(s),
            TraciValue::StringList(list) => write!(f, "[{}]", list.join(",")),
            TraciValue::Position2D { x, y } => write!(f, "{},{}", x, y),
            TraciValue::Compound(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Subscribed variables and their values after a step, in engine order
pub type SubscriptionResults = Vec<(VariableId, TraciValue)>;

/// One vehicle's speed reading for the current step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VehicleSpeed {
    pub id: String,
    /// Speed in m/s
    pub speed: OrderedFloat<f64>,
}

impl VehicleSpeed {
    pub fn new(id: impl Into<String>, speed: f64) -> Self {
        Self {
            id: id.into(),
            speed: OrderedFloat(speed),
        }
    }
}
