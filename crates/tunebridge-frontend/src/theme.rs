//! Visual skins for the player card.
//!
//! A theme only changes wording and colours. Every skin renders the same
//! [`crate::binding::PlayerBinding`] and therefore the same bridge session
//! type.

/// Presentation parameters of one skin. Colours are `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub playing_label: &'static str,
    pub paused_label: &'static str,
    pub ready_label: &'static str,
    pub loading_label: &'static str,
    pub time_separator: &'static str,
    pub error_prefix: &'static str,
    pub background: u32,
    pub surface: u32,
    pub accent: u32,
    pub text: u32,
    pub error: u32,
}

impl Theme {
    pub const RETRO_SEVENTIES: Theme = Theme {
        name: "Retro 70s",
        playing_label: "GROOVIN'",
        paused_label: "PAUSED",
        ready_label: "READY",
        loading_label: "WARMING UP",
        time_separator: " / ",
        error_prefix: "Player Error: ",
        background: 0x3b2314,
        surface: 0x5a3a22,
        accent: 0xe07a1f,
        text: 0xf4e1c1,
        error: 0xff6b4a,
    };

    pub const RETRO_EIGHTIES: Theme = Theme {
        name: "Retro 80s",
        playing_label: "NOW PLAYING",
        paused_label: "PAUSED",
        ready_label: "READY",
        loading_label: "LOADING",
        time_separator: " / ",
        error_prefix: "Player Error: ",
        background: 0x120024,
        surface: 0x2a0a4a,
        accent: 0xff2fd0,
        text: 0x00f0ff,
        error: 0xff3860,
    };

    pub const RETRO_NINETIES: Theme = Theme {
        name: "Retro 90s",
        playing_label: "PLAYIN'",
        paused_label: "PAUSED",
        ready_label: "READY",
        loading_label: "DIALING UP",
        time_separator: " / ",
        error_prefix: "Player Error: ",
        background: 0x1d1f4e,
        surface: 0x2f3275,
        accent: 0x39ff14,
        text: 0xfdfd96,
        error: 0xff4f79,
    };

    pub const SYNTHWAVE: Theme = Theme {
        name: "Synthwave",
        playing_label: "PLAYING ▶",
        paused_label: "PAUSED ⏸",
        ready_label: "READY",
        loading_label: "LOADING",
        time_separator: " / ",
        error_prefix: "Player Error: ",
        background: 0x0d0221,
        surface: 0x261447,
        accent: 0xff6c11,
        text: 0xf9f871,
        error: 0xfd1d53,
    };

    pub const NEUMORPHIC: Theme = Theme {
        name: "Neumorphic",
        playing_label: "PLAYING",
        paused_label: "PAUSED",
        ready_label: "READY",
        loading_label: "LOADING",
        time_separator: " | ",
        error_prefix: "Player Error: ",
        background: 0x2c2f36,
        surface: 0x363a42,
        accent: 0x1db954,
        text: 0xe0e0e0,
        error: 0xff5555,
    };

    /// Every built-in skin.
    pub const ALL: [Theme; 5] = [
        Self::RETRO_SEVENTIES,
        Self::RETRO_EIGHTIES,
        Self::RETRO_NINETIES,
        Self::SYNTHWAVE,
        Self::NEUMORPHIC,
    ];

    /// Looks up a skin by name, ignoring case.
    pub fn by_name(name: &str) -> Option<Theme> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.name.eq_ignore_ascii_case(name.trim()))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::RETRO_EIGHTIES
    }
}
