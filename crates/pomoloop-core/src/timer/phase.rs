use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One leg of the focus cycle.
///
/// Phases only move forward: Hypothesize -> Focus -> Reflect -> Hypothesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Short priming: decide what the next focus block is for.
    Hypothesize,
    /// Deep work.
    Focus,
    /// Quick review of what happened.
    Reflect,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Hypothesize, Phase::Focus, Phase::Reflect];

    /// The phase that follows this one in the cycle.
    pub fn next(self) -> Phase {
        match self {
            Phase::Hypothesize => Phase::Focus,
            Phase::Focus => Phase::Reflect,
            Phase::Reflect => Phase::Hypothesize,
        }
    }

    /// True when leaving this phase closes a full cycle.
    pub fn wraps(self) -> bool {
        self == Phase::Reflect
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Hypothesize => "Hypothesize",
            Phase::Focus => "Focus",
            Phase::Reflect => "Reflect",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a phase name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPhase(pub String);

impl fmt::Display for UnknownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown phase: {}", self.0)
    }
}

impl std::error::Error for UnknownPhase {}

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_steps_return_to_start() {
        let mut p = Phase::Hypothesize;
        for _ in 0..3 {
            p = p.next();
        }
        assert_eq!(p, Phase::Hypothesize);
    }

    #[test]
    fn only_reflect_wraps() {
        assert!(!Phase::Hypothesize.wraps());
        assert!(!Phase::Focus.wraps());
        assert!(Phase::Reflect.wraps());
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("focus".parse::<Phase>().unwrap(), Phase::Focus);
        assert_eq!(" REFLECT ".parse::<Phase>().unwrap(), Phase::Reflect);
        assert!("break".parse::<Phase>().is_err());
    }

    #[test]
    fn serializes_as_capitalized_name() {
        let json = serde_json::to_string(&Phase::Hypothesize).unwrap();
        assert_eq!(json, "\"Hypothesize\"");
    }
}
