//! Integration tests for [`ledger_client::RpcChainReader`] against a mocked JSON-RPC node.

use alloy_primitives::{hex, Address, U256};
use alloy_sol_types::{sol, SolCall};
use ledger_client::{ChainReader, LedgerError, RpcChainReader};
use mockito::Matcher;
use serde_json::json;

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

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn rpc_result(data: Vec<u8>) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": hex::encode_prefixed(data) }).to_string()
}

fn selector_matcher(selector: [u8; 4]) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::PartialJson(json!({ "method": "eth_call" })),
        Matcher::Regex(hex::encode(selector)),
    ])
}

#[tokio::test]
async fn test_total_message_count() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(selector_matcher(getTotalMessageCountCall::SELECTOR))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(getTotalMessageCountCall::abi_encode_returns(&(
            U256::from(3u64),
        ))))
        .create_async()
        .await;

    let reader = RpcChainReader::new(server.url(), CONTRACT).unwrap();
    assert_eq!(reader.total_message_count().await.unwrap(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_messages_decodes_records() {
    let sender: Address = "0xABC0000000000000000000000000000000000ABC".parse().unwrap();
    let records = vec![
        ChatMessage {
            messageId: U256::from(1u64),
            sender,
            content: "first".to_string(),
            timestamp: U256::from(100u64),
        },
        ChatMessage {
            messageId: U256::from(2u64),
            sender,
            content: "second".to_string(),
            timestamp: U256::from(200u64),
        },
    ];

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .match_body(selector_matcher(getMessagesCall::SELECTOR))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(getMessagesCall::abi_encode_returns(&(records,))))
        .create_async()
        .await;

    let reader = RpcChainReader::new(server.url(), CONTRACT).unwrap();
    let messages = reader.get_messages(0, 50).await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message_id, 1);
    assert_eq!(messages[0].sender, "0xabc0000000000000000000000000000000000abc");
    assert_eq!(messages[1].content, "second");
    assert_eq!(messages[1].timestamp, 200);
}

#[tokio::test]
async fn test_rpc_error_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "execution reverted" }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let reader = RpcChainReader::new(server.url(), CONTRACT).unwrap();
    let err = reader.total_message_count().await.unwrap_err();
    assert!(matches!(err, LedgerError::Rpc { code: -32000, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_http_failure_is_transport_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(502)
        .create_async()
        .await;

    let reader = RpcChainReader::new(server.url(), CONTRACT).unwrap();
    let err = reader.get_messages(0, 10).await.unwrap_err();
    assert!(matches!(err, LedgerError::Transport(_)), "got {err:?}");
}

#[test]
fn test_invalid_contract_address() {
    let err = RpcChainReader::new("http://127.0.0.1:8545", "not-a-contract").err();
    assert!(matches!(err, Some(LedgerError::InvalidContract(_))));
}
