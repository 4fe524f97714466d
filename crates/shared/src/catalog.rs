//! Display names for the dances, songs and sayings the robot knows about.
//!
//! Ids outside these tables are still forwarded to the robot untouched.

use crate::domain::{DanceId, SayingId, SongId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry<Id> {
    pub id: Id,
    pub label: &'static str,
}

pub const DANCES: [CatalogEntry<DanceId>; 4] = [
    CatalogEntry { id: DanceId(1), label: "Wiggle Dance" },
    CatalogEntry { id: DanceId(2), label: "Spin Move" },
    CatalogEntry { id: DanceId(3), label: "Happy Bounce" },
    CatalogEntry { id: DanceId(4), label: "Robot Shuffle" },
];

pub const SONGS: [CatalogEntry<SongId>; 4] = [
    CatalogEntry { id: SongId(1), label: "Happy Song" },
    CatalogEntry { id: SongId(2), label: "Robot Beeps" },
    CatalogEntry { id: SongId(3), label: "Fun Tune" },
    CatalogEntry { id: SongId(4), label: "Dance Beat" },
];

pub const SAYINGS: [CatalogEntry<SayingId>; 6] = [
    CatalogEntry { id: SayingId(1), label: "Hello Friend!" },
    CatalogEntry { id: SayingId(2), label: "I am mBuff!" },
    CatalogEntry { id: SayingId(3), label: "Let's play!" },
    CatalogEntry { id: SayingId(4), label: "You are awesome!" },
    CatalogEntry { id: SayingId(5), label: "Time to dance!" },
    CatalogEntry { id: SayingId(6), label: "Beep boop!" },
];

pub fn label_for<Id: PartialEq + Copy>(entries: &[CatalogEntry<Id>], id: Id) -> Option<&'static str> {
    entries.iter().find(|entry| entry.id == id).map(|entry| entry.label)
}
