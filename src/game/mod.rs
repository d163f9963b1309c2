pub mod agent;
pub mod angle_math;
pub mod collaborators;
pub mod constants;
pub mod events;
pub mod humanoid_movement;
pub mod input;
pub mod jump;
pub mod orientation;
pub mod physics;
pub mod platform;
pub mod watchdog;

pub use agent::{AgentError, AgentState, LocomotionAgent, LocomotionAgentBuilder};
pub use collaborators::{
    GroundContact, GroundProbe, InputSource, Intent, MovableSurface, MoveOutcome, MovePrimitive, TargetAnchor,
    TargetHandle,
};
pub use events::{EventLog, EventObserver, LocomotionEvent, Subscription};
pub use orientation::{LookOptions, LookOutcome, LookRequestError, LookStatus, LookTaskId};
