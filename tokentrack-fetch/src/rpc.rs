//! Minimal JSON-RPC client over an alloy [`Provider`].
//!
//! Requests go out as raw `method` + `params` pairs and come back as untyped
//! JSON, so every result passes through the typed decoding in
//! [`tokentrack::decode`] or the checks below. Calls are never retried.

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::Filter;
use alloy::transports::RpcError;
use alloy::transports::http::reqwest::Url;
use serde_json::{Value, json};
use tokentrack::TRANSFER_TOPIC;

use crate::error::FetchError;

/// Per-request timeout when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Open an HTTP provider for `endpoint`.
///
/// # Errors
///
/// Returns [`FetchError::Transport`] if `endpoint` is not a valid URL.
pub fn connect(endpoint: &str) -> Result<RootProvider, FetchError> {
    let url = endpoint
        .parse::<Url>()
        .map_err(|e| FetchError::Transport(format!("invalid RPC URL {endpoint}: {e}")))?;
    Ok(RootProvider::new_http(url))
}

/// Issue one JSON-RPC request and return its `result`.
///
/// # Errors
///
/// - [`FetchError::Rpc`] with the upstream error object if the response
///   carries an `error` member.
/// - [`FetchError::Transport`] on connection failure, HTTP failure, an
///   unparseable body, or when `timeout` elapses first.
pub async fn call<P: Provider>(
    provider: &P,
    method: &'static str,
    params: Value,
    timeout: Duration,
) -> Result<Value, FetchError> {
    let request = provider.raw_request(method.into(), params);
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(RpcError::ErrorResp(payload))) => Err(FetchError::Rpc(payload)),
        Ok(Err(e)) => Err(FetchError::Transport(format!("{method}: {e}"))),
        Err(_) => Err(FetchError::Transport(format!(
            "{method}: timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// `eth_blockNumber`, parsed into an integer.
///
/// # Errors
///
/// Any [`call`] error, or [`FetchError::Malformed`] if the result is not a
/// `0x`-prefixed hex quantity.
pub async fn block_number<P: Provider>(provider: &P, timeout: Duration) -> Result<u64, FetchError> {
    const METHOD: &str = "eth_blockNumber";
    let result = call(provider, METHOD, json!([]), timeout).await?;
    result
        .as_str()
        .and_then(|s| s.strip_prefix("0x"))
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| u64::from_str_radix(digits, 16).ok())
        .ok_or_else(|| FetchError::Malformed {
            method: METHOD,
            result: result.to_string(),
        })
}

/// The `eth_getLogs` filter for `Transfer` events of `token` in `[from, to]`.
#[must_use]
pub fn transfer_filter(token: Address, from: u64, to: u64) -> Filter {
    Filter::new()
        .address(token)
        .event_signature(TRANSFER_TOPIC)
        .from_block(from)
        .to_block(to)
}

/// `eth_getLogs` for `filter`, returning the raw log objects.
///
/// # Errors
///
/// Any [`call`] error, or [`FetchError::Malformed`] if the result is not a
/// JSON array.
pub async fn get_logs<P: Provider>(
    provider: &P,
    filter: &Filter,
    timeout: Duration,
) -> Result<Vec<Value>, FetchError> {
    const METHOD: &str = "eth_getLogs";
    match call(provider, METHOD, json!([filter]), timeout).await? {
        Value::Array(logs) => Ok(logs),
        other => Err(FetchError::Malformed {
            method: METHOD,
            result: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use alloy::providers::ProviderBuilder;
    use alloy::transports::mock::Asserter;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn filter_uses_hex_wire_format() {
        let token = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
        let filter = transfer_filter(token, 900, 1000);
        let wire = serde_json::to_value(&filter).unwrap_or_default();

        assert_eq!(wire["fromBlock"], "0x384", "from block");
        assert_eq!(wire["toBlock"], "0x3e8", "to block");
        assert_eq!(
            wire["address"],
            "0xdac17f958d2ee523a2206206994597c13d831ec7",
            "token address"
        );
        assert_eq!(
            wire["topics"][0],
            format!("{TRANSFER_TOPIC:#x}"),
            "signature topic"
        );
    }

    #[test]
    fn connect_rejects_bad_urls() {
        assert!(
            matches!(connect("not a url"), Err(FetchError::Transport(_))),
            "invalid URL"
        );
        assert!(connect("https://bsc.publicnode.com").is_ok(), "valid URL");
    }

    #[tokio::test]
    async fn block_number_parses_hex() {
        let asserter = Asserter::new();
        asserter.push_success(&"0x3e8");
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);

        let latest = block_number(&provider, TIMEOUT).await;
        assert!(matches!(latest, Ok(1000)), "{latest:?}");
    }

    #[tokio::test]
    async fn block_number_rejects_non_hex() {
        let asserter = Asserter::new();
        asserter.push_success(&1000);
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);

        let latest = block_number(&provider, TIMEOUT).await;
        assert!(
            matches!(latest, Err(FetchError::Malformed { method: "eth_blockNumber", .. })),
            "{latest:?}"
        );
    }

    #[tokio::test]
    async fn error_object_becomes_rpc_fault() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("query returned more than 10000 results");
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);

        let result = call(&provider, "eth_getLogs", json!([]), TIMEOUT).await;
        let Err(FetchError::Rpc(payload)) = &result else {
            panic!("expected rpc fault, got {result:?}");
        };
        assert_eq!(
            payload.message, "query returned more than 10000 results",
            "upstream message kept verbatim"
        );
    }

    #[tokio::test]
    async fn missing_response_is_transport_fault() {
        let provider = ProviderBuilder::new().connect_mocked_client(Asserter::new());
        let result = call(&provider, "eth_blockNumber", json!([]), TIMEOUT).await;
        assert!(matches!(result, Err(FetchError::Transport(_))), "{result:?}");
    }

    #[tokio::test]
    async fn silent_endpoint_times_out_as_transport_fault() {
        // The kernel completes the handshake from the backlog; nothing ever answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap_or_else(|e| panic!("bind: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("local addr: {e}"));
        let provider = connect(&format!("http://{addr}")).unwrap_or_else(|e| panic!("{e}"));

        let started = std::time::Instant::now();
        let result = block_number(&provider, Duration::from_millis(300)).await;
        let elapsed = started.elapsed();

        let Err(FetchError::Transport(message)) = &result else {
            panic!("expected transport fault, got {result:?}");
        };
        assert!(message.contains("timed out"), "{message}");
        assert!(elapsed < Duration::from_secs(5), "bounded by the timeout: {elapsed:?}");
        drop(listener);
    }

    #[tokio::test]
    async fn get_logs_requires_an_array() {
        let asserter = Asserter::new();
        asserter.push_success(&serde_json::json!({ "logs": [] }));
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);

        let filter = transfer_filter(Address::ZERO, 0, 1);
        let result = get_logs(&provider, &filter, TIMEOUT).await;
        assert!(
            matches!(result, Err(FetchError::Malformed { method: "eth_getLogs", .. })),
            "{result:?}"
        );
    }
}
