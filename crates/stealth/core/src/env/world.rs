//! Read-only views of the world the engine runs in.

use crate::handle::{ActorHandle, TeamId};
use crate::math::Vec3;

/// First blocking hit of a line trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceHit {
    /// Actor whose body was hit, or `None` for static geometry.
    pub actor: Option<ActorHandle>,
    pub point: Vec3,
    /// Distance from the trace start.
    pub distance: f32,
}

/// Visibility provider. The engine never performs collision itself.
pub trait TraceOracle: Send + Sync {
    /// Traces the segment `start → end`, skipping the bodies in `ignore`.
    /// Returns the nearest blocking hit, or `None` when the segment is clear.
    fn line_trace(&self, start: Vec3, end: Vec3, ignore: &[ActorHandle]) -> Option<TraceHit>;
}

/// Actor lifetime and placement.
pub trait ActorOracle: Send + Sync {
    /// Whether the handle still refers to the actor it was issued for.
    fn is_live(&self, actor: ActorHandle) -> bool;

    fn location(&self, actor: ActorHandle) -> Option<Vec3>;

    /// Facing direction. Not required to be normalized.
    fn forward(&self, actor: ActorHandle) -> Option<Vec3>;

    /// Live actors of a kind, in a stable enumeration order.
    fn actors_of_kind(&self, kind: &str) -> Vec<ActorHandle>;

    /// World location of a named socket on the actor's body, if it has one.
    fn socket_location(&self, actor: ActorHandle, socket: &str) -> Option<Vec3> {
        let _ = (actor, socket);
        None
    }

    fn team(&self, actor: ActorHandle) -> Option<TeamId> {
        let _ = actor;
        None
    }
}
