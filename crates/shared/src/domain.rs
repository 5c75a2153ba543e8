use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownScreen;

/// A display mode of the audience-facing presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Blank,
    AllianceSelection,
    Bracket,
    Intro,
    Logo,
    LogoLuma,
    Match,
    Score,
    Sponsor,
    Timeout,
}

impl Screen {
    pub const ALL: [Screen; 10] = [
        Screen::Blank,
        Screen::AllianceSelection,
        Screen::Bracket,
        Screen::Intro,
        Screen::Logo,
        Screen::LogoLuma,
        Screen::Match,
        Screen::Score,
        Screen::Sponsor,
        Screen::Timeout,
    ];

    /// The screen every other screen can reach, and be reached from, directly.
    pub const HUB: Screen = Screen::Blank;

    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Blank => "blank",
            Screen::AllianceSelection => "allianceSelection",
            Screen::Bracket => "bracket",
            Screen::Intro => "intro",
            Screen::Logo => "logo",
            Screen::LogoLuma => "logoLuma",
            Screen::Match => "match",
            Screen::Score => "score",
            Screen::Sponsor => "sponsor",
            Screen::Timeout => "timeout",
        }
    }

    /// Screens whose content has to be fetched before their entrance animation starts.
    pub fn requires_content_load(self) -> bool {
        matches!(self, Screen::Sponsor)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = UnknownScreen;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .into_iter()
            .find(|screen| screen.as_str() == name)
            .ok_or_else(|| UnknownScreen(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for screen in Screen::ALL {
            assert_eq!(screen.as_str().parse::<Screen>().expect("known"), screen);
        }
    }

    #[test]
    fn serde_uses_the_same_names_as_as_str() {
        let json = serde_json::to_string(&Screen::LogoLuma).expect("serialize");
        assert_eq!(json, "\"logoLuma\"");
        let parsed: Screen = serde_json::from_str("\"allianceSelection\"").expect("deserialize");
        assert_eq!(parsed, Screen::AllianceSelection);
    }

    #[test]
    fn rejects_unknown_and_differently_cased_names() {
        assert_eq!(
            "halftime".parse::<Screen>(),
            Err(UnknownScreen("halftime".into()))
        );
        assert!("Blank".parse::<Screen>().is_err());
        assert!("logo_luma".parse::<Screen>().is_err());
    }

    #[test]
    fn only_sponsor_needs_content_loaded() {
        let loaders: Vec<_> = Screen::ALL
            .into_iter()
            .filter(|screen| screen.requires_content_load())
            .collect();
        assert_eq!(loaders, vec![Screen::Sponsor]);
    }
}
