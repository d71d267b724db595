//! State module for tracking the agent lifecycle
//!
//! - `AgentState`: parsed → installing → installed → activating → activated,
//!   with redundant as the terminal state

mod agent_state;

pub use agent_state::AgentState;
