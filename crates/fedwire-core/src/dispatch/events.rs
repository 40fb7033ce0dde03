//! Structured dispatch events.
//!
//! All events are emitted at `debug` level under the `fedwire::dispatch`
//! target; the library never installs a subscriber.

use tracing::debug;

use crate::{ProtocolId, SenderHandle};

const TARGET: &str = "fedwire::dispatch";

pub(crate) fn started(payload_len: usize, registered: usize) {
    debug!(target: TARGET, payload_len, registered, "dispatch started");
}

pub(crate) fn matched(protocol: ProtocolId) {
    debug!(target: TARGET, protocol = protocol.as_str(), "protocol matched");
}

pub(crate) fn no_match(payload_len: usize) {
    debug!(target: TARGET, payload_len, "no suitable protocol found");
}

pub(crate) fn received(protocol: ProtocolId, sender: &SenderHandle) {
    debug!(
        target: TARGET,
        protocol = protocol.as_str(),
        sender = sender.as_str(),
        "payload received"
    );
}

pub(crate) fn completed(protocol: ProtocolId, sender: &SenderHandle, entities: usize) {
    debug!(
        target: TARGET,
        protocol = protocol.as_str(),
        sender = sender.as_str(),
        entities,
        "dispatch completed"
    );
}
