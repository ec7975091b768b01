//! Outbound request encoders.
//!
//! Every function here produces a complete fieldset for one request, with
//! all capability checks done up front: if the negotiated server version
//! cannot carry the request as specified, encoding fails before anything is
//! queued. A partially-encoded frame is never produced.
//!
//! Field order and the version guards mirror the decoders in `handlers`
//! field for field.

pub mod contract;
pub mod market_data;
pub mod order;

use crate::error::{Result, TwsError};

/// Guard helper: the caller asked for `feature` but the connection was
/// negotiated below `required`.
pub(crate) fn require(
    server_version: i32,
    required: i32,
    feature: &'static str,
) -> Result<()> {
    if server_version < required {
        return Err(TwsError::Capability { feature, required });
    }
    Ok(())
}
