//! The static API catalog.
//!
//! Declarative data describing every readable/writable identifier the
//! scripting language exposes: its dotted path, kind, operand encoding for
//! reads, operation code for writes, and an optional numeric range. Built
//! once at startup and only ever read afterwards.

use std::collections::HashMap;

use crate::instruction::{Operand, OperandType, Operation};
use crate::{GVAR_MAX, GVAR_MIN};

/// What a catalog leaf is, from the script's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Number,
    Bool,
    Object,
    Function,
    Readonly,
}

/// Inclusive numeric range constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub min: i32,
    pub max: i32,
}

impl Range {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// A scalar catalog leaf: one dotted path like `flight.homeDistance` or
/// `override.vtx.power`.
#[derive(Debug, Clone, Copy)]
pub struct Leaf {
    pub kind: LeafKind,
    /// Operand encoding for reads, when the leaf is readable.
    pub read: Option<(OperandType, i32)>,
    /// Operation code for writes, when the leaf is writable.
    pub write_op: Option<Operation>,
    pub range: Option<Range>,
}

impl Leaf {
    pub fn writable(&self) -> bool {
        self.write_op.is_some()
    }
}

/// An indexed family like `rc[i]`, `gvar[i]`, or `override.rc[i]`.
#[derive(Debug, Clone, Copy)]
pub struct IndexedFamily {
    /// Operand type for reads (the index becomes the operand value).
    pub read: Option<OperandType>,
    pub write_op: Option<Operation>,
    /// Valid source-level index range (inclusive).
    pub index_max: i32,
    /// Valid value range for writes.
    pub range: Option<Range>,
}

/// The read-only API catalog.
#[derive(Debug)]
pub struct ApiCatalog {
    leaves: HashMap<&'static str, Leaf>,
    indexed: HashMap<&'static str, IndexedFamily>,
    /// Reverse map for the decompiler: operand encoding → dotted path.
    by_operand: HashMap<(OperandType, i32), &'static str>,
    /// Reverse map for the decompiler: write operation → dotted path.
    by_write_op: HashMap<Operation, &'static str>,
    modes: Vec<&'static str>,
}

/// Root namespaces bound by `const { ... } = inav;`. The handler and
/// function names are purely syntactic but still need to be importable.
pub const IMPORT_ROOTS: &[&str] = &[
    "flight",
    "rc",
    "override",
    "waypoint",
    "time",
    "gvar",
    "on",
    "edge",
    "sticky",
    "delay",
    "timer",
    "whenChanged",
    "Math",
];

/// Flight-mode names in wire index order (`flight.mode.<name>`).
const FLIGHT_MODES: &[&str] = &[
    "failsafe",
    "manual",
    "rth",
    "positionHold",
    "cruise",
    "altitudeHold",
    "angle",
    "horizon",
    "air",
    "user1",
    "user2",
    "courseHold",
    "user3",
    "user4",
    "acro",
    "waypointMission",
];

impl ApiCatalog {
    /// Build the full catalog.
    pub fn new() -> Self {
        let mut cat = Self {
            leaves: HashMap::new(),
            indexed: HashMap::new(),
            by_operand: HashMap::new(),
            by_write_op: HashMap::new(),
            modes: FLIGHT_MODES.to_vec(),
        };
        cat.register_flight();
        cat.register_flight_modes();
        cat.register_overrides();
        cat.register_waypoint();
        cat.register_time();
        cat.register_indexed();
        cat
    }

    // ──────────────────────────────────────────────────────────────────────
    // Lookup API
    // ──────────────────────────────────────────────────────────────────────

    /// Look up a scalar leaf by dotted path.
    pub fn leaf(&self, path: &str) -> Option<&Leaf> {
        self.leaves.get(path)
    }

    /// Look up an indexed family by dotted path (`rc`, `gvar`, `override.rc`).
    pub fn indexed(&self, path: &str) -> Option<&IndexedFamily> {
        self.indexed.get(path)
    }

    /// Reverse-map a read operand back to a dotted path.
    pub fn path_for_operand(&self, operand: Operand) -> Option<&'static str> {
        self.by_operand.get(&(operand.kind, operand.value)).copied()
    }

    /// Reverse-map a write operation back to the leaf it targets.
    pub fn path_for_write_op(&self, op: Operation) -> Option<&'static str> {
        self.by_write_op.get(&op).copied()
    }

    /// Flight-mode name for a wire index.
    pub fn mode_name(&self, index: i32) -> Option<&'static str> {
        usize::try_from(index).ok().and_then(|i| self.modes.get(i)).copied()
    }

    /// Wire index for a flight-mode name.
    pub fn mode_index(&self, name: &str) -> Option<i32> {
        self.modes.iter().position(|m| *m == name).map(|i| i as i32)
    }

    /// Returns `true` if `name` can appear in the destructuring import.
    pub fn is_import_root(&self, name: &str) -> bool {
        IMPORT_ROOTS.contains(&name)
    }

    // ──────────────────────────────────────────────────────────────────────
    // Registration helpers
    // ──────────────────────────────────────────────────────────────────────

    fn read_leaf(&mut self, path: &'static str, kind: LeafKind, ot: OperandType, value: i32) {
        self.leaves.insert(
            path,
            Leaf {
                kind,
                read: Some((ot, value)),
                write_op: None,
                range: None,
            },
        );
        self.by_operand.insert((ot, value), path);
    }

    fn write_leaf(
        &mut self,
        path: &'static str,
        kind: LeafKind,
        op: Operation,
        range: Option<Range>,
    ) {
        self.leaves.insert(
            path,
            Leaf {
                kind,
                read: None,
                write_op: Some(op),
                range,
            },
        );
        self.by_write_op.insert(op, path);
    }

    // ──────────────────────────────────────────────────────────────────────
    // Namespace registration
    // ──────────────────────────────────────────────────────────────────────

    /// `flight.*` telemetry reads.
    fn register_flight(&mut self) {
        use LeafKind::*;
        use OperandType::Flight;
        let number_leaves: &[(&'static str, i32)] = &[
            ("flight.armTimer", 0),
            ("flight.homeDistance", 1),
            ("flight.tripDistance", 2),
            ("flight.rssi", 3),
            ("flight.vbat", 4),
            ("flight.cellVoltage", 5),
            ("flight.current", 6),
            ("flight.mahDrawn", 7),
            ("flight.gpsSats", 8),
            ("flight.groundSpeed", 9),
            ("flight.speed3d", 10),
            ("flight.airSpeed", 11),
            ("flight.altitude", 12),
            ("flight.verticalSpeed", 13),
            ("flight.throttlePosition", 14),
            ("flight.roll", 15),
            ("flight.pitch", 16),
            ("flight.stabilizedRoll", 25),
            ("flight.stabilizedPitch", 26),
            ("flight.stabilizedYaw", 27),
            ("flight.batteryCells", 34),
            ("flight.agl", 36),
            ("flight.rangefinderRaw", 37),
            ("flight.yaw", 40),
        ];
        for &(path, code) in number_leaves {
            self.read_leaf(path, Number, Flight, code);
        }
        let bool_leaves: &[(&'static str, i32)] = &[
            ("flight.isArmed", 17),
            ("flight.isAutolaunch", 18),
            ("flight.isAltitudeControl", 19),
            ("flight.isPositionControl", 20),
            ("flight.isEmergencyLanding", 21),
            ("flight.isRth", 22),
            ("flight.isLanding", 23),
            ("flight.isFailsafe", 24),
        ];
        for &(path, code) in bool_leaves {
            self.read_leaf(path, Bool, Flight, code);
        }
    }

    /// `flight.mode.*` boolean reads.
    fn register_flight_modes(&mut self) {
        const MODE_PATHS: &[&str] = &[
            "flight.mode.failsafe",
            "flight.mode.manual",
            "flight.mode.rth",
            "flight.mode.positionHold",
            "flight.mode.cruise",
            "flight.mode.altitudeHold",
            "flight.mode.angle",
            "flight.mode.horizon",
            "flight.mode.air",
            "flight.mode.user1",
            "flight.mode.user2",
            "flight.mode.courseHold",
            "flight.mode.user3",
            "flight.mode.user4",
            "flight.mode.acro",
            "flight.mode.waypointMission",
        ];
        for (index, path) in MODE_PATHS.iter().enumerate() {
            self.read_leaf(path, LeafKind::Bool, OperandType::FlightMode, index as i32);
        }
    }

    /// `override.*` writable leaves.
    fn register_overrides(&mut self) {
        use LeafKind::*;
        use Operation::*;
        self.write_leaf("override.armingSafety", Bool, OverrideArmingSafety, None);
        self.write_leaf(
            "override.throttleScale",
            Number,
            OverrideThrottleScale,
            Some(Range::new(0, 100)),
        );
        self.write_leaf(
            "override.throttle",
            Number,
            OverrideThrottle,
            Some(Range::new(1000, 2000)),
        );
        self.write_leaf(
            "override.vtx.power",
            Number,
            SetVtxPowerLevel,
            Some(Range::new(0, 4)),
        );
        self.write_leaf(
            "override.vtx.band",
            Number,
            SetVtxBand,
            Some(Range::new(1, 5)),
        );
        self.write_leaf(
            "override.vtx.channel",
            Number,
            SetVtxChannel,
            Some(Range::new(1, 8)),
        );
        self.write_leaf(
            "override.osdLayout",
            Number,
            SetOsdLayout,
            Some(Range::new(0, 3)),
        );
        self.write_leaf("override.invertRoll", Bool, InvertRoll, None);
        self.write_leaf("override.invertPitch", Bool, InvertPitch, None);
        self.write_leaf("override.invertYaw", Bool, InvertYaw, None);
        self.write_leaf("override.swapRollYaw", Bool, SwapRollYaw, None);
        self.write_leaf(
            "override.headingTarget",
            Number,
            SetHeadingTarget,
            Some(Range::new(-360, 360)),
        );
        self.write_leaf(
            "override.loiterRadius",
            Number,
            LoiterOverride,
            Some(Range::new(0, 100_000)),
        );
        self.write_leaf(
            "override.profile",
            Number,
            SetProfile,
            Some(Range::new(1, 3)),
        );
        self.write_leaf(
            "override.minGroundSpeed",
            Number,
            OverrideMinGroundSpeed,
            Some(Range::new(0, 10_000)),
        );
        self.write_leaf(
            "override.gimbalSensitivity",
            Number,
            SetGimbalSensitivity,
            Some(Range::new(-16, 16)),
        );
        self.write_leaf(
            "override.ledPinPwm",
            Number,
            LedPinPwm,
            Some(Range::new(0, 100)),
        );
        self.write_leaf("override.disableGpsFix", Bool, DisableGpsFix, None);
    }

    /// `waypoint.*` reads.
    fn register_waypoint(&mut self) {
        use LeafKind::*;
        use OperandType::Waypoints;
        self.read_leaf("waypoint.isWaypointMode", Bool, Waypoints, 0);
        self.read_leaf("waypoint.currentIndex", Number, Waypoints, 1);
        self.read_leaf("waypoint.currentAction", Number, Waypoints, 2);
        self.read_leaf("waypoint.nextAction", Number, Waypoints, 3);
        self.read_leaf("waypoint.distanceToWaypoint", Number, Waypoints, 4);
        self.read_leaf("waypoint.distanceFromWaypoint", Number, Waypoints, 5);
    }

    /// `time.*` reads. `armedSeconds` aliases the arm-timer telemetry
    /// value; the reverse map keeps `flight.armTimer` as the canonical
    /// name because it was registered first.
    fn register_time(&mut self) {
        self.leaves.insert(
            "time.armedSeconds",
            Leaf {
                kind: LeafKind::Number,
                read: Some((OperandType::Flight, 0)),
                write_op: None,
                range: None,
            },
        );
    }

    /// Indexed families: `rc[i]`, `gvar[i]`, `override.rc[i]`.
    fn register_indexed(&mut self) {
        self.indexed.insert(
            "rc",
            IndexedFamily {
                read: Some(OperandType::RcChannel),
                write_op: None,
                index_max: 17,
                range: None,
            },
        );
        self.indexed.insert(
            "gvar",
            IndexedFamily {
                read: Some(OperandType::Gvar),
                write_op: Some(Operation::GvarSet),
                index_max: 7,
                range: Some(Range::new(GVAR_MIN, GVAR_MAX)),
            },
        );
        self.indexed.insert(
            "override.rc",
            IndexedFamily {
                read: None,
                write_op: Some(Operation::RcChannelOverride),
                index_max: 17,
                range: Some(Range::new(1000, 2000)),
            },
        );
    }
}

impl Default for ApiCatalog {
    fn default() -> Self {
        Self::new()
    }
}
