/// Agent lifecycle state definitions
///
/// This module defines the states an agent instance passes through from the
/// moment it is constructed until it controls pages (or is replaced).
use std::fmt;

/// Represents the lifecycle state of an agent instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentState {
    /// Constructed, no lifecycle event handled yet
    Parsed,

    /// Install in progress: seeding the shell set
    Installing,

    /// Install finished; waiting to activate
    Installed,

    /// Activation in progress: purging stale stores, claiming clients
    Activating,

    /// Active and intercepting requests
    Activated,

    /// Replaced by a newer instance or failed to install
    Redundant,
}

impl AgentState {
    /// Returns true if the agent may intercept requests in this state
    ///
    /// Requests arriving before activation are still answered; the host simply
    /// does not route them here until the agent is active.
    pub fn can_intercept(&self) -> bool {
        matches!(self, Self::Activated)
    }

    /// Returns true if the agent can never leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redundant)
    }

    /// Returns true if moving from `self` to `next` is a valid lifecycle step
    ///
    /// Install and activate may each be re-entered from their finished state,
    /// which happens when a host re-delivers the event. Any non-terminal state
    /// may become redundant.
    pub fn can_transition_to(&self, next: AgentState) -> bool {
        use AgentState::*;

        match (*self, next) {
            (Redundant, _) => false,
            (_, Redundant) => true,
            (Parsed, Installing) | (Installed, Installing) => true,
            (Installing, Installed) => true,
            (Installed, Activating) | (Activated, Activating) => true,
            (Activating, Activated) => true,
            _ => false,
        }
    }

    /// Converts the state to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        }
    }

    /// Returns all possible agent states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Parsed,
            Self::Installing,
            Self::Installed,
            Self::Activating,
            Self::Activated,
            Self::Redundant,
        ]
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
