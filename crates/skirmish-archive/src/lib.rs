//! On-disk archive of completed episodes.
//!
//! Episodes are stored one JSON file per match under
//! `{root}/gen_{generation}/{population}_{trainer}.json`, human-readable and
//! versioned through embedded `game_version`/`fitness_version` tags. The
//! [`EpisodeStore`] owns the layout; [`select`] ranks a generation's
//! episodes by fitness for playback.

pub use self::{record::*, select::*, store::*};

mod record;
mod select;
mod store;
