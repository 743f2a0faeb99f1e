use serde::Deserialize;

/// The current-war document returned by the Clash of Clans API.
///
/// Every field is defaulted so that partial documents (for example the
/// league-group response, which has no `clan`/`opponent` sides) still decode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarReport {
    /// Lifecycle state reported by the API (`preparation`, `inWar`, `warEnded`...).
    pub state: Option<String>,
    /// Number of members on each side.
    pub team_size: Option<u32>,
    /// Start of the battle day, in the API's compact timestamp format.
    pub start_time: Option<String>,
    /// End of the battle day, in the API's compact timestamp format.
    pub end_time: Option<String>,
    /// The home clan.
    pub clan: Side,
    /// The opposing clan.
    pub opponent: Side,
    /// Flat list of attacks across both sides, in the order returned.
    pub attacks: Vec<Attack>,
}

/// One clan's roster for the war.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Side {
    pub tag: Option<String>,
    pub name: Option<String>,
    pub stars: Option<u32>,
    pub destruction_percentage: Option<f64>,
    pub members: Vec<Member>,
}

/// A war participant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    /// The member's unique tag, including the leading '#'.
    pub tag: String,
    pub name: String,
    pub townhall_level: Option<u32>,
    /// 1-based ranking within the side.
    pub map_position: Option<u32>,
    /// Attacks nested under the member, as the live API returns them.
    pub attacks: Vec<Attack>,
}

/// A single attack.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attack {
    pub attacker_tag: String,
    pub defender_tag: String,
    pub stars: u32,
    pub destruction_percentage: f64,
}

/// Selects one of the two sides of a war.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideSelector {
    Clan,
    Opponent,
}

impl WarReport {
    pub fn side(&self, selector: SideSelector) -> &Side {
        match selector {
            SideSelector::Clan => &self.clan,
            SideSelector::Opponent => &self.opponent,
        }
    }

    /// Returns the attacks made by `member`, in source order.
    ///
    /// The flat `attacks` list is authoritative whenever it is non-empty.
    /// Otherwise the member's own nested list is used.
    pub fn attacks_by<'a>(&'a self, member: &'a Member) -> Vec<&'a Attack> {
        if self.attacks.is_empty() {
            return member.attacks.iter().collect();
        }
        self.attacks
            .iter()
            .filter(|attack| attack.attacker_tag == member.tag)
            .collect()
    }
}
