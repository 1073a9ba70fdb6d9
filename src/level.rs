//! Record severity.

use serde::{Serialize, Serializer};
use std::fmt;

/// The importance or severity of a log record.
///
/// Higher levels are more severe. The named levels are spaced four apart so
/// intermediate levels can be expressed as offsets, rendered relative to the
/// nearest lower named level.
///
/// # Examples
///
/// ```rust
/// use jsonslog::Level;
///
/// assert_eq!(Level::WARN.to_string(), "WARN");
/// assert_eq!(Level(Level::INFO.0 + 2).to_string(), "INFO+2");
/// assert_eq!(Level(-6).to_string(), "DEBUG-2");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(pub i32);

impl Level {
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (base, named) = if *self < Level::INFO {
            ("DEBUG", Level::DEBUG)
        } else if *self < Level::WARN {
            ("INFO", Level::INFO)
        } else if *self < Level::ERROR {
            ("WARN", Level::WARN)
        } else {
            ("ERROR", Level::ERROR)
        };
        let offset = self.0 - named.0;
        if offset == 0 {
            f.write_str(base)
        } else {
            write!(f, "{}{:+}", base, offset)
        }
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
