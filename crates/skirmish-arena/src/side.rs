use serde::{Deserialize, Serialize};

/// One of the two adversarial roles in a match.
///
/// The Raider is side A: fast, fragile, close-range. The Warden is side B:
/// slow, durable, with longer-reaching attacks. The side also doubles as the
/// trainer identity: archived episodes and checkpoints are labelled with the
/// side whose population was being optimized when they were produced.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum Side {
    Raider,
    Warden,
}

impl Side {
    /// Human-readable trainer label, also used in archive file names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Side::Raider => "Raider",
            Side::Warden => "Warden",
        }
    }

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Raider => Side::Warden,
            Side::Warden => Side::Raider,
        }
    }
}
