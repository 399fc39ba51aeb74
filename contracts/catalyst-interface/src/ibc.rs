use cosmwasm_std::{Binary, IbcChannel};

use crate::error::InterfaceError;


// IBC Interface constants 
pub const CATALYST_V1_CHANNEL_VERSION: &str = "catalyst-v1";

pub const ACK_SUCCESS: u8 = 0x00;
pub const ACK_FAIL: u8 = 0x01;



/// Validate an IBC channel configuration.
/// 
/// # Arguments:
/// * `channel` - The local channel configuration.
/// * `counterparty_version` - The counterparty's channel version.
/// 
pub fn validate_ibc_channel_config(
    channel: &IbcChannel,
    counterparty_version: Option<&str>,
) -> Result<(), InterfaceError> {

    // Check the channel version on the local side
    if channel.version != CATALYST_V1_CHANNEL_VERSION {
        return Err(
            InterfaceError::InvalidIbcChannelVersion {
                version: channel.version.clone()
            }
        );
    }

    // Check the channel version of the remote side (only known once the handshake has progressed).
    if let Some(version) = counterparty_version {
        if version != CATALYST_V1_CHANNEL_VERSION {
            return Err(
                InterfaceError::InvalidIbcChannelVersion {
                    version: version.to_string()
                }
            );
        }
    }

    // NOTE: The channel order type is not checked, as the Catalyst protocol makes no requirement on
    // ordered/unordered channels.

    Ok(())
}


/// Generate a 'success' ack data response.
pub fn ack_success() -> Binary {
    Into::<Binary>::into(vec![ACK_SUCCESS])
}

/// Generate a 'fail' ack data response.
pub fn ack_fail() -> Binary {
    Into::<Binary>::into(vec![ACK_FAIL])
}

/// Only the first byte of an ack is read. Anything but `ACK_SUCCESS` (an empty ack included) is
/// a failure.
pub fn is_ack_success(ack: &[u8]) -> bool {
    ack.first() == Some(&ACK_SUCCESS)
}
