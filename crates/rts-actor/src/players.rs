//! Players and the relationships between them.

use rts_core::PlayerId;

/// How one player regards another.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relationship {
    Ally,
    Neutral,
    Enemy,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub name: String,
    /// Players on the same team are allies.  `None` = no team.
    pub team: Option<u8>,
    /// Civilians and map-owned actors: neutral to everyone else.
    pub non_combatant: bool,
}

/// All players of a world, indexed by `PlayerId`.
#[derive(Clone, Debug, Default)]
pub struct PlayerTable {
    players: Vec<Player>,
}

impl PlayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, team: Option<u8>) -> PlayerId {
        self.push(Player { name: name.to_owned(), team, non_combatant: false })
    }

    pub fn add_neutral(&mut self, name: &str) -> PlayerId {
        self.push(Player { name: name.to_owned(), team: None, non_combatant: true })
    }

    fn push(&mut self, player: Player) -> PlayerId {
        let id = PlayerId(self.players.len() as u16);
        self.players.push(player);
        id
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        id.index() < self.players.len()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Relationship of `a` towards `b`.  Symmetric.
    ///
    /// A player is its own ally; a shared team means allies; a non-combatant
    /// on either side means neutral; everything else is hostile.  Unknown
    /// ids are treated as neutral.
    pub fn relationship(&self, a: PlayerId, b: PlayerId) -> Relationship {
        if a == b {
            return Relationship::Ally;
        }
        let (Some(pa), Some(pb)) = (self.get(a), self.get(b)) else {
            return Relationship::Neutral;
        };
        match (pa.team, pb.team) {
            (Some(ta), Some(tb)) if ta == tb => Relationship::Ally,
            _ if pa.non_combatant || pb.non_combatant => Relationship::Neutral,
            _ => Relationship::Enemy,
        }
    }

    #[inline]
    pub fn are_allies(&self, a: PlayerId, b: PlayerId) -> bool {
        self.relationship(a, b) == Relationship::Ally
    }
}
