//! Wire decoding for inbound WebSocket frames.
//!
//! A frame is decoded in two passes. The first reads only the `action`
//! discriminator; the second decodes the action-specific body. Failure
//! in either pass yields a [`DecodeError`] and the frame is discarded by
//! the caller. No error frame is ever sent back to the client.

use todosync_types::{
    Action, AddMessage, Command, CompleteMessage, DeleteMessage, EditMessage, Envelope,
};

/// Why an inbound frame was discarded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame is not a JSON object with a string `action` field.
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The `action` value is not one of the known actions.
    #[error("unknown action {0:?}")]
    UnknownAction(String),

    /// The action is known but its fields are missing or mistyped.
    #[error("malformed {action} message: {source}")]
    Body {
        /// The discriminator that was recognized.
        action: Action,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a raw inbound frame into a [`Command`].
///
/// # Errors
///
/// Returns [`DecodeError`] if the discriminator cannot be read, is not
/// recognized, or the body does not match the action's shape.
pub fn decode(raw: &[u8]) -> Result<Command, DecodeError> {
    let envelope: Envelope = serde_json::from_slice(raw).map_err(DecodeError::Envelope)?;
    let action = Action::from_wire(&envelope.action)
        .ok_or(DecodeError::UnknownAction(envelope.action))?;

    let body = |source: serde_json::Error| DecodeError::Body { action, source };
    let command = match action {
        Action::Add => serde_json::from_slice::<AddMessage>(raw).map_err(body)?.into(),
        Action::Edit => serde_json::from_slice::<EditMessage>(raw).map_err(body)?.into(),
        Action::Delete => serde_json::from_slice::<DeleteMessage>(raw).map_err(body)?.into(),
        Action::Complete => serde_json::from_slice::<CompleteMessage>(raw)
            .map_err(body)?
            .into(),
    };

    Ok(command)
}
