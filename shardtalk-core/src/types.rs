//! Core types: account address, pagination, and the message submission shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound for `limit` on list queries.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Account address: `0x` followed by 40 hex characters, always stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Validates `^0x[a-fA-F0-9]{40}$` and normalizes to lowercase. Never coerces malformed input.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let hex = raw
            .strip_prefix("0x")
            .ok_or_else(|| ValidationError::InvalidAddress(raw.to_string()))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Validated page request: `page >= 1`, `limit` in `[1, MAX_PAGE_LIMIT]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Result<Self, ValidationError> {
        if page < 1 {
            return Err(ValidationError::InvalidPage(page.to_string()));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(ValidationError::InvalidLimit(limit.to_string()));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Number of records skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination block returned with every list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// `total_pages = ceil(total / limit)`, 0 when there are no records.
    pub fn new(request: &PageRequest, total: i64) -> Self {
        let total = total.max(0);
        Self {
            page: request.page(),
            limit: request.limit(),
            total,
            total_pages: (total + request.limit() - 1) / request.limit(),
        }
    }
}

/// Message submitted by a caller after a ledger write was confirmed.
///
/// All fields are optional on the wire so that missing fields surface as
/// [`ValidationError::MissingField`] instead of a deserializer error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

impl NewMessage {
    pub fn new(message_id: i64, sender: &str, content: &str, timestamp: i64) -> Self {
        Self {
            message_id: Some(message_id),
            sender: Some(sender.to_string()),
            content: Some(content.to_string()),
            timestamp: Some(timestamp),
            transaction_hash: None,
        }
    }

    pub fn with_transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    /// Checks presence and shape of every field; lowercases the sender and trims the content.
    pub fn validate(&self) -> Result<ValidatedMessage, ValidationError> {
        let message_id = self
            .message_id
            .ok_or(ValidationError::MissingField("messageId"))?;
        if message_id < 0 {
            return Err(ValidationError::InvalidField {
                field: "messageId",
                reason: format!("must be non-negative, got {}", message_id),
            });
        }

        let sender = self
            .sender
            .as_deref()
            .ok_or(ValidationError::MissingField("sender"))?;
        let sender = Address::parse(sender)?;

        let content = self
            .content
            .as_deref()
            .ok_or(ValidationError::MissingField("content"))?
            .trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }

        let timestamp = self
            .timestamp
            .ok_or(ValidationError::MissingField("timestamp"))?;
        if timestamp <= 0 {
            return Err(ValidationError::InvalidField {
                field: "timestamp",
                reason: format!("must be a positive integer, got {}", timestamp),
            });
        }

        let transaction_hash = self
            .transaction_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);

        Ok(ValidatedMessage {
            message_id,
            sender,
            content: content.to_string(),
            timestamp,
            transaction_hash,
        })
    }
}

/// A submission that passed [`NewMessage::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMessage {
    pub message_id: i64,
    pub sender: Address,
    pub content: String,
    pub timestamp: i64,
    pub transaction_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xAbCdEf0123456789abcdef0123456789ABCDEF01";

    #[test]
    fn test_address_parse_lowercases() {
        let addr = Address::parse(ADDR).unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_address_parse_rejects_malformed() {
        assert!(Address::parse("not-an-address").is_err());
        assert!(Address::parse("0x123").is_err());
        assert!(Address::parse("abcdef0123456789abcdef0123456789abcdef0101").is_err());
        assert!(Address::parse("0xZZcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(Address::parse("0X abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(1, 1).is_ok());
        assert!(PageRequest::new(3, 100).is_ok());
        assert_eq!(
            PageRequest::new(0, 10),
            Err(ValidationError::InvalidPage("0".to_string()))
        );
        assert_eq!(
            PageRequest::new(1, 0),
            Err(ValidationError::InvalidLimit("0".to_string()))
        );
        assert_eq!(
            PageRequest::new(1, 101),
            Err(ValidationError::InvalidLimit("101".to_string()))
        );
        assert_eq!(PageRequest::new(3, 20).unwrap().offset(), 40);
    }

    #[test]
    fn test_pagination_total_pages() {
        let req = PageRequest::new(1, 2).unwrap();
        assert_eq!(Pagination::new(&req, 0).total_pages, 0);
        assert_eq!(Pagination::new(&req, 1).total_pages, 1);
        assert_eq!(Pagination::new(&req, 3).total_pages, 2);
        assert_eq!(Pagination::new(&req, 4).total_pages, 2);
    }

    #[test]
    fn test_validate_normalizes_sender_and_content() {
        let msg = NewMessage::new(7, ADDR, "  hello  ", 1_700_000_000).with_transaction_hash("0xdead");
        let valid = msg.validate().unwrap();
        assert_eq!(valid.message_id, 7);
        assert_eq!(valid.sender.as_str(), ADDR.to_ascii_lowercase());
        assert_eq!(valid.content, "hello");
        assert_eq!(valid.transaction_hash.as_deref(), Some("0xdead"));
    }

    #[test]
    fn test_validate_rejects_missing_and_bad_fields() {
        let base = NewMessage::new(1, ADDR, "hi", 100);

        let mut m = base.clone();
        m.message_id = None;
        assert_eq!(m.validate(), Err(ValidationError::MissingField("messageId")));

        let mut m = base.clone();
        m.sender = Some("not-an-address".to_string());
        assert!(matches!(m.validate(), Err(ValidationError::InvalidAddress(_))));

        let mut m = base.clone();
        m.content = Some("   ".to_string());
        assert_eq!(m.validate(), Err(ValidationError::EmptyContent));

        let mut m = base.clone();
        m.timestamp = Some(0);
        assert!(matches!(
            m.validate(),
            Err(ValidationError::InvalidField { field: "timestamp", .. })
        ));
    }

    #[test]
    fn test_new_message_wire_format() {
        let json = serde_json::json!({
            "messageId": 3,
            "sender": ADDR,
            "content": "gm",
            "timestamp": 300,
            "transactionHash": "0xabc"
        });
        let msg: NewMessage = serde_json::from_value(json).unwrap();
        assert_eq!(msg.message_id, Some(3));
        assert_eq!(msg.transaction_hash.as_deref(), Some("0xabc"));
    }
}
