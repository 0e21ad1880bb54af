//! The rule-table instruction model: the wire contract shared by the
//! code generator, the decompiler, and the device CLI.
//!
//! Both integer enumerations here are frozen — their discriminants travel
//! on the serial link as-is and must match the firmware exactly. The
//! textual form of a record is one `logic` command per slot:
//!
//! ```text
//! logic <slot> <enabled> <activator> <op> <a_type> <a_value> <b_type> <b_value> <flags>
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard cap on rule-table slots enforced by the engine.
pub const MAX_SLOTS: usize = 64;

/// Number of persistent registers (`gvar[0..7]`).
pub const GVAR_COUNT: usize = 8;

/// Persistent register value range.
pub const GVAR_MIN: i32 = -1_000_000;
pub const GVAR_MAX: i32 = 1_000_000;

/// Activator value meaning "gated by nothing / always evaluated".
pub const NO_ACTIVATOR: i32 = -1;

// ─────────────────────────────────────────────────────────────────────
// OperandType
// ─────────────────────────────────────────────────────────────────────

/// The 8 operand kinds. Discriminants are the on-wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum OperandType {
    /// Literal integer.
    Value = 0,
    /// RC channel index (1-based on the wire).
    RcChannel = 1,
    /// Flight telemetry index.
    Flight = 2,
    /// Flight mode index.
    FlightMode = 3,
    /// Boolean result of another slot, referenced by slot index.
    LcResult = 4,
    /// Persistent register index.
    Gvar = 5,
    /// PID controller output index.
    Pid = 6,
    /// Waypoint data index.
    Waypoints = 7,
}

impl OperandType {
    /// Decode a wire value.
    pub fn from_wire(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Value,
            1 => Self::RcChannel,
            2 => Self::Flight,
            3 => Self::FlightMode,
            4 => Self::LcResult,
            5 => Self::Gvar,
            6 => Self::Pid,
            7 => Self::Waypoints,
            _ => return None,
        })
    }

    /// The wire value.
    pub fn to_wire(self) -> i32 {
        self as i32
    }
}

// ─────────────────────────────────────────────────────────────────────
// Operand
// ─────────────────────────────────────────────────────────────────────

/// One of the two operand positions in a record: a `(type, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operand {
    #[serde(rename = "type")]
    pub kind: OperandType,
    pub value: i32,
}

impl Operand {
    pub fn new(kind: OperandType, value: i32) -> Self {
        Self { kind, value }
    }

    /// Literal integer operand.
    pub fn value(n: i32) -> Self {
        Self::new(OperandType::Value, n)
    }

    /// Literal zero, the conventional filler for unused operand slots.
    pub fn zero() -> Self {
        Self::value(0)
    }

    /// Persistent register operand.
    pub fn gvar(index: i32) -> Self {
        Self::new(OperandType::Gvar, index)
    }

    /// Reference to a previously emitted slot's boolean result.
    pub fn lc(slot: i32) -> Self {
        Self::new(OperandType::LcResult, slot)
    }

    /// Flight telemetry operand.
    pub fn flight(index: i32) -> Self {
        Self::new(OperandType::Flight, index)
    }

    /// Flight mode operand.
    pub fn flight_mode(index: i32) -> Self {
        Self::new(OperandType::FlightMode, index)
    }

    /// RC channel operand. Takes the 0-based source-level index; the wire
    /// carries 1-based channel numbers, translated exactly here.
    pub fn rc_channel(index: i32) -> Self {
        Self::new(OperandType::RcChannel, index + 1)
    }

    /// Waypoint data operand.
    pub fn waypoints(index: i32) -> Self {
        Self::new(OperandType::Waypoints, index)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Operation
// ─────────────────────────────────────────────────────────────────────

/// All 57 rule-table operations. Discriminants are the on-wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Operation {
    True = 0,
    Equal = 1,
    GreaterThan = 2,
    LowerThan = 3,
    Low = 4,
    Mid = 5,
    High = 6,
    And = 7,
    Or = 8,
    Xor = 9,
    Nand = 10,
    Nor = 11,
    Not = 12,
    Sticky = 13,
    Add = 14,
    Sub = 15,
    Mul = 16,
    Div = 17,
    GvarSet = 18,
    GvarInc = 19,
    GvarDec = 20,
    PortSet = 21,
    OverrideArmingSafety = 22,
    OverrideThrottleScale = 23,
    SwapRollYaw = 24,
    SetVtxPowerLevel = 25,
    InvertRoll = 26,
    InvertPitch = 27,
    InvertYaw = 28,
    OverrideThrottle = 29,
    SetOsdLayout = 30,
    SetVtxBand = 31,
    SetVtxChannel = 32,
    RcChannelOverride = 33,
    SetHeadingTarget = 34,
    Modulus = 35,
    LoiterOverride = 36,
    SetProfile = 37,
    Min = 38,
    Max = 39,
    FlightAxisAngleOverride = 40,
    FlightAxisRateOverride = 41,
    Edge = 42,
    Delay = 43,
    Timer = 44,
    Delta = 45,
    ApproxEqual = 46,
    LedPinPwm = 47,
    DisableGpsFix = 48,
    ResetMagCalibration = 49,
    SetGimbalSensitivity = 50,
    Sin = 51,
    Cos = 52,
    Tan = 53,
    MapInput = 54,
    MapOutput = 55,
    OverrideMinGroundSpeed = 56,
}

impl Operation {
    /// Decode a wire value.
    pub fn from_wire(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::True,
            1 => Self::Equal,
            2 => Self::GreaterThan,
            3 => Self::LowerThan,
            4 => Self::Low,
            5 => Self::Mid,
            6 => Self::High,
            7 => Self::And,
            8 => Self::Or,
            9 => Self::Xor,
            10 => Self::Nand,
            11 => Self::Nor,
            12 => Self::Not,
            13 => Self::Sticky,
            14 => Self::Add,
            15 => Self::Sub,
            16 => Self::Mul,
            17 => Self::Div,
            18 => Self::GvarSet,
            19 => Self::GvarInc,
            20 => Self::GvarDec,
            21 => Self::PortSet,
            22 => Self::OverrideArmingSafety,
            23 => Self::OverrideThrottleScale,
            24 => Self::SwapRollYaw,
            25 => Self::SetVtxPowerLevel,
            26 => Self::InvertRoll,
            27 => Self::InvertPitch,
            28 => Self::InvertYaw,
            29 => Self::OverrideThrottle,
            30 => Self::SetOsdLayout,
            31 => Self::SetVtxBand,
            32 => Self::SetVtxChannel,
            33 => Self::RcChannelOverride,
            34 => Self::SetHeadingTarget,
            35 => Self::Modulus,
            36 => Self::LoiterOverride,
            37 => Self::SetProfile,
            38 => Self::Min,
            39 => Self::Max,
            40 => Self::FlightAxisAngleOverride,
            41 => Self::FlightAxisRateOverride,
            42 => Self::Edge,
            43 => Self::Delay,
            44 => Self::Timer,
            45 => Self::Delta,
            46 => Self::ApproxEqual,
            47 => Self::LedPinPwm,
            48 => Self::DisableGpsFix,
            49 => Self::ResetMagCalibration,
            50 => Self::SetGimbalSensitivity,
            51 => Self::Sin,
            52 => Self::Cos,
            53 => Self::Tan,
            54 => Self::MapInput,
            55 => Self::MapOutput,
            56 => Self::OverrideMinGroundSpeed,
            _ => return None,
        })
    }

    /// The wire value.
    pub fn to_wire(self) -> i32 {
        self as i32
    }

    /// Returns `true` if this operation yields a boolean (1/0) result
    /// usable as an activator or logical operand.
    pub fn produces_boolean(self) -> bool {
        matches!(
            self,
            Self::True
                | Self::Equal
                | Self::GreaterThan
                | Self::LowerThan
                | Self::Low
                | Self::Mid
                | Self::High
                | Self::And
                | Self::Or
                | Self::Xor
                | Self::Nand
                | Self::Nor
                | Self::Not
                | Self::Sticky
                | Self::Edge
                | Self::Delay
                | Self::Timer
                | Self::Delta
                | Self::ApproxEqual
        )
    }

    /// Returns `true` if this operation yields a numeric result that
    /// other slots may consume through an `LcResult` operand.
    pub fn produces_value(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Sub
                | Self::Mul
                | Self::Div
                | Self::Modulus
                | Self::Min
                | Self::Max
                | Self::Sin
                | Self::Cos
                | Self::Tan
                | Self::MapInput
                | Self::MapOutput
        )
    }

    /// Returns `true` if this operation performs a write (register set,
    /// override, or other firmware side effect) rather than computing a
    /// value.
    pub fn is_action(self) -> bool {
        !self.produces_boolean() && !self.produces_value()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Instruction
// ─────────────────────────────────────────────────────────────────────

/// One rule-table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Slot index, dense from 0.
    pub slot: i32,
    pub enabled: bool,
    /// Producing slot whose boolean gates this record, or [`NO_ACTIVATOR`].
    pub activator: i32,
    pub op: Operation,
    pub a: Operand,
    pub b: Operand,
    pub flags: i32,
}

/// Failure to parse a `logic` CLI line back into an [`Instruction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineParseError {
    /// The line does not start with the `logic` keyword.
    NotALogicCommand,
    /// Wrong number of fields or a field is not an integer.
    MalformedFields,
    /// An enumeration value is outside the wire contract.
    UnknownCode { field: &'static str, value: i32 },
}

impl fmt::Display for LineParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotALogicCommand => write!(f, "line is not a 'logic' command"),
            Self::MalformedFields => write!(f, "expected 9 integer fields after 'logic'"),
            Self::UnknownCode { field, value } => {
                write!(f, "unknown {field} code {value}")
            }
        }
    }
}

impl std::error::Error for LineParseError {}

impl Instruction {
    /// Construct an enabled record.
    pub fn new(slot: i32, activator: i32, op: Operation, a: Operand, b: Operand) -> Self {
        Self {
            slot,
            enabled: true,
            activator,
            op,
            a,
            b,
            flags: 0,
        }
    }

    /// Render the exact CLI command for this record.
    ///
    /// Byte-equivalence of this output is a correctness criterion of the
    /// device upload path.
    pub fn to_cli_line(&self) -> String {
        format!(
            "logic {} {} {} {} {} {} {} {} {}",
            self.slot,
            self.enabled as i32,
            self.activator,
            self.op.to_wire(),
            self.a.kind.to_wire(),
            self.a.value,
            self.b.kind.to_wire(),
            self.b.value,
            self.flags
        )
    }

    /// Parse a CLI command line as produced by [`Instruction::to_cli_line`]
    /// or dumped by the device CLI.
    pub fn from_cli_line(line: &str) -> Result<Self, LineParseError> {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("logic") {
            return Err(LineParseError::NotALogicCommand);
        }
        let nums: Vec<i32> = fields
            .map(|f| f.parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|_| LineParseError::MalformedFields)?;
        let [slot, enabled, activator, op, a_type, a_value, b_type, b_value, flags] = nums[..]
        else {
            return Err(LineParseError::MalformedFields);
        };
        let op = Operation::from_wire(op).ok_or(LineParseError::UnknownCode {
            field: "operation",
            value: op,
        })?;
        let a_kind = OperandType::from_wire(a_type).ok_or(LineParseError::UnknownCode {
            field: "operand type",
            value: a_type,
        })?;
        let b_kind = OperandType::from_wire(b_type).ok_or(LineParseError::UnknownCode {
            field: "operand type",
            value: b_type,
        })?;
        Ok(Self {
            slot,
            enabled: enabled != 0,
            activator,
            op,
            a: Operand::new(a_kind, a_value),
            b: Operand::new(b_kind, b_value),
            flags,
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cli_line())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
