use skirmish_arena::{ActionSet, RaiderAction, WardenAction, arbitrate};

/// Identifier of a pressed control, as reported by whatever input backend
/// is plugged in. Input capture itself lives outside this system; only the
/// key-to-action tables and the cancellation rule are fixed here.
pub type ControlId = char;

/// Raider controls: WASD movement, Q/E turning, C dodge, space strike.
pub const RAIDER_KEY_BINDINGS: [(ControlId, RaiderAction); 8] = [
    ('w', RaiderAction::Forward),
    ('s', RaiderAction::Back),
    ('a', RaiderAction::StrafeLeft),
    ('d', RaiderAction::StrafeRight),
    ('q', RaiderAction::TurnLeft),
    ('e', RaiderAction::TurnRight),
    ('c', RaiderAction::Dodge),
    (' ', RaiderAction::Strike),
];

/// Warden controls on the numeric row, mirroring the Raider layout.
pub const WARDEN_KEY_BINDINGS: [(ControlId, WardenAction); 10] = [
    ('8', WardenAction::Forward),
    ('5', WardenAction::Back),
    ('4', WardenAction::StrafeLeft),
    ('6', WardenAction::StrafeRight),
    ('7', WardenAction::TurnLeft),
    ('9', WardenAction::TurnRight),
    ('0', WardenAction::Fallback),
    ('1', WardenAction::Slash),
    ('2', WardenAction::Backslash),
    ('3', WardenAction::KnifeVolley),
];

/// Maps currently-pressed controls to the Raider's action set.
///
/// Contradictory simultaneous presses cancel under the same arbitration
/// rule that governs policy outputs, so human play and policy play resolve
/// identically.
#[must_use]
pub fn raider_actions_for_keys(pressed: &[ControlId]) -> ActionSet<RaiderAction> {
    let candidates = RAIDER_KEY_BINDINGS
        .iter()
        .filter(|(key, _)| pressed.contains(key))
        .map(|(_, action)| *action)
        .collect();
    arbitrate(&candidates)
}

/// Maps currently-pressed controls to the Warden's action set.
#[must_use]
pub fn warden_actions_for_keys(pressed: &[ControlId]) -> ActionSet<WardenAction> {
    let candidates = WARDEN_KEY_BINDINGS
        .iter()
        .filter(|(key, _)| pressed.contains(key))
        .map(|(_, action)| *action)
        .collect();
    arbitrate(&candidates)
}
