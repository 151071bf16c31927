use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

/// Upper bound on the number of simultaneous actions one side can resolve in
/// a tick (the size of the larger action enumeration).
pub const MAX_ACTIONS_PER_SIDE: usize = 10;

/// A resolved, contradiction-free set of actions for one side and one tick.
pub type ActionSet<A> = ArrayVec<A, MAX_ACTIONS_PER_SIDE>;

/// Activation values above this threshold select the corresponding action.
pub const ACTION_THRESHOLD: f32 = 0.5;

/// Timed-attack parameters: damage dealt and maximum reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackProfile {
    pub damage: i32,
    pub range: f32,
}

/// Behaviour shared by both sides' action enumerations.
pub trait CombatAction: Copy + Eq {
    /// The action this one cancels against when both are selected, if any.
    fn opposite(self) -> Option<Self>;

    /// Stable numeric identifier used in observations and state snapshots.
    fn id(self) -> u8;

    /// Tick duration for timed actions; zero for instantaneous movement.
    fn duration(self) -> u32;

    /// Attack parameters, if this action deals damage.
    fn attack(self) -> Option<AttackProfile>;
}

/// Actions available to the Raider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaiderAction {
    StrafeLeft,
    StrafeRight,
    Forward,
    Back,
    TurnLeft,
    TurnRight,
    Dodge,
    Strike,
}

impl RaiderAction {
    /// Positional mapping from policy output index to action.
    ///
    /// Frozen contract: reordering this table invalidates every trained
    /// Raider policy. Do not touch it without retraining from scratch.
    pub const OUTPUT_ORDER: [RaiderAction; 8] = [
        RaiderAction::StrafeLeft,
        RaiderAction::StrafeRight,
        RaiderAction::Forward,
        RaiderAction::Back,
        RaiderAction::TurnLeft,
        RaiderAction::TurnRight,
        RaiderAction::Dodge,
        RaiderAction::Strike,
    ];
}

impl CombatAction for RaiderAction {
    fn opposite(self) -> Option<Self> {
        match self {
            RaiderAction::StrafeLeft => Some(RaiderAction::StrafeRight),
            RaiderAction::StrafeRight => Some(RaiderAction::StrafeLeft),
            RaiderAction::Forward => Some(RaiderAction::Back),
            RaiderAction::Back => Some(RaiderAction::Forward),
            RaiderAction::TurnLeft => Some(RaiderAction::TurnRight),
            RaiderAction::TurnRight => Some(RaiderAction::TurnLeft),
            RaiderAction::Dodge | RaiderAction::Strike => None,
        }
    }

    fn id(self) -> u8 {
        self as u8
    }

    fn duration(self) -> u32 {
        match self {
            RaiderAction::Dodge => 10,
            RaiderAction::Strike => 14,
            _ => 0,
        }
    }

    fn attack(self) -> Option<AttackProfile> {
        match self {
            RaiderAction::Strike => Some(AttackProfile {
                damage: 12,
                range: 70.0,
            }),
            _ => None,
        }
    }
}

/// Actions available to the Warden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WardenAction {
    StrafeLeft,
    StrafeRight,
    Forward,
    Back,
    TurnLeft,
    TurnRight,
    Fallback,
    Slash,
    Backslash,
    KnifeVolley,
}

impl WardenAction {
    /// Positional mapping from policy output index to action.
    ///
    /// Frozen contract: reordering this table invalidates every trained
    /// Warden policy. Do not touch it without retraining from scratch.
    pub const OUTPUT_ORDER: [WardenAction; 10] = [
        WardenAction::StrafeLeft,
        WardenAction::StrafeRight,
        WardenAction::Forward,
        WardenAction::Back,
        WardenAction::TurnLeft,
        WardenAction::TurnRight,
        WardenAction::Fallback,
        WardenAction::Slash,
        WardenAction::Backslash,
        WardenAction::KnifeVolley,
    ];
}

impl CombatAction for WardenAction {
    fn opposite(self) -> Option<Self> {
        match self {
            WardenAction::StrafeLeft => Some(WardenAction::StrafeRight),
            WardenAction::StrafeRight => Some(WardenAction::StrafeLeft),
            WardenAction::Forward => Some(WardenAction::Back),
            WardenAction::Back => Some(WardenAction::Forward),
            WardenAction::TurnLeft => Some(WardenAction::TurnRight),
            WardenAction::TurnRight => Some(WardenAction::TurnLeft),
            WardenAction::Fallback
            | WardenAction::Slash
            | WardenAction::Backslash
            | WardenAction::KnifeVolley => None,
        }
    }

    fn id(self) -> u8 {
        self as u8
    }

    fn duration(self) -> u32 {
        match self {
            WardenAction::Fallback => 8,
            WardenAction::Slash => 18,
            WardenAction::Backslash => 24,
            WardenAction::KnifeVolley => 30,
            _ => 0,
        }
    }

    fn attack(self) -> Option<AttackProfile> {
        match self {
            WardenAction::Slash => Some(AttackProfile {
                damage: 10,
                range: 90.0,
            }),
            WardenAction::Backslash => Some(AttackProfile {
                damage: 14,
                range: 90.0,
            }),
            WardenAction::KnifeVolley => Some(AttackProfile {
                damage: 6,
                range: 220.0,
            }),
            _ => None,
        }
    }
}

/// Maps an activation vector to candidate actions through a frozen output
/// table. Slot `i` selects `order[i]` when its activation clears
/// [`ACTION_THRESHOLD`]; excess activations beyond the table are ignored.
#[must_use]
pub fn candidates_from_activations<A: Copy>(activations: &[f32], order: &[A]) -> ActionSet<A> {
    order
        .iter()
        .zip(activations)
        .filter(|(_, v)| **v > ACTION_THRESHOLD)
        .map(|(a, _)| *a)
        .collect()
}

/// Removes contradictory action pairs from a candidate set.
///
/// When both members of an opposing pair (turn left/right, forward/back,
/// strafe left/right) are present, both are dropped. Membership is checked
/// against the whole set, so the result does not depend on candidate order.
/// Never fails; the result may be empty.
#[must_use]
pub fn arbitrate<A: CombatAction>(candidates: &ActionSet<A>) -> ActionSet<A> {
    candidates
        .iter()
        .filter(|a| match a.opposite() {
            Some(opposite) => !candidates.contains(&opposite),
            None => true,
        })
        .copied()
        .collect()
}
