//! Stable diagnostic codes surfaced in error messages and machine output.

pub mod store {
    pub const NOT_FOUND: &str = "ST500";
    pub const BROKEN_PATH: &str = "ST501";
    pub const INDEX_CORRUPT: &str = "ST511";
    pub const FORMAT_INCOMPATIBLE: &str = "ST512";
    pub const LANGUAGE: &str = "ST520";
    pub const INVALID_PATH: &str = "ST530";
    pub const INVALID_ALIAS_PATH: &str = "ST532";
    pub const INVALID_MOVE: &str = "ST540";
    pub const REMOTE_ID_CONFLICT: &str = "ST541";
}

pub mod commands {
    pub const INIT: &str = "ST101";
    pub const LOOKUP: &str = "ST110";
    pub const PATH: &str = "ST111";
    pub const ALIASES: &str = "ST112";
    pub const DOCTOR: &str = "ST120";
    pub const INFO: &str = "ST130";
    pub const GENERIC: &str = "ST000";
}
