use crate::broker::message::UpdatePayload;
use crate::broker::topic::TopicKey;

/// Identifier of a connected viewer.
pub type ViewerId = String;

/// Topic membership and delivery, as seen from the broker.
///
/// Implemented by the transport. Every method is fire-and-forget: delivery
/// is best-effort and join/leave are idempotent. Implementations must not
/// call back into the broker.
pub trait Audience: Send + Sync + 'static {
    fn join(&self, viewer: &ViewerId, topic: &TopicKey);

    fn leave(&self, viewer: &ViewerId, topic: &TopicKey);

    /// Delivers `payload` to every current member of `topic`.
    fn broadcast(&self, topic: &TopicKey, payload: &UpdatePayload);

    /// Delivers `payload` to a single viewer.
    fn send_to(&self, viewer: &ViewerId, topic: &TopicKey, payload: &UpdatePayload);

    fn member_count(&self, topic: &TopicKey) -> usize;
}
