//! Contract ABI for the message log.

use alloy_primitives::{hex, U256};
use alloy_sol_types::sol;

use crate::error::LedgerError;
use crate::LedgerMessage;

sol! {
    struct ChatMessage {
        uint256 messageId;
        address sender;
        string content;
        uint256 timestamp;
    }

    function getTotalMessageCount() external view returns (uint256);
    function getMessages(uint256 start, uint256 count) external view returns (ChatMessage[] memory);
}

pub(crate) fn to_u64(value: U256, field: &str) -> Result<u64, LedgerError> {
    let v = u64::try_from(value)
        .map_err(|_| LedgerError::OutOfRange(format!("{} = {}", field, value)))?;
    // Stored values must fit a signed 64-bit column.
    if v > i64::MAX as u64 {
        return Err(LedgerError::OutOfRange(format!("{} = {}", field, value)));
    }
    Ok(v)
}

impl TryFrom<ChatMessage> for LedgerMessage {
    type Error = LedgerError;

    fn try_from(msg: ChatMessage) -> Result<Self, Self::Error> {
        Ok(Self {
            message_id: to_u64(msg.messageId, "messageId")?,
            sender: hex::encode_prefixed(msg.sender.as_slice()),
            content: msg.content,
            timestamp: to_u64(msg.timestamp, "timestamp")?,
        })
    }
}
