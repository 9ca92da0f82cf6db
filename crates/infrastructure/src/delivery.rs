use std::time::Duration;

use alloy::hex;
use alloy::signers::Signer;
use async_trait::async_trait;
use notifier_config::DeliveryConfig;
use notifier_core::{
    Address, DeliveryGateway, DeliveryReceipt, Notification, NotifierError, NotifierResult,
    SigningCredential,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// 请求体签名所在的请求头
pub const SIGNATURE_HEADER: &str = "x-channel-signature";

#[derive(Debug, Deserialize)]
struct SubscribersResponse {
    subscribers: Vec<Address>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationEnvelope<'a> {
    channel: Address,
    #[serde(flatten)]
    notification: &'a Notification,
}

#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// 通知投递网关客户端
///
/// 发送前用频道私钥对请求体做EIP-191签名；模拟模式下照常构造并签名，但不发出请求。
pub struct HttpDeliveryGateway {
    gateway_url: String,
    http_client: reqwest::Client,
}

impl HttpDeliveryGateway {
    pub fn new(config: &DeliveryConfig) -> NotifierResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifierError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn channel_url(&self, credential: &SigningCredential, resource: &str) -> String {
        format!(
            "{}/channels/{}/{}",
            self.gateway_url,
            credential.channel_id(),
            resource
        )
    }

    async fn sign_body(credential: &SigningCredential, body: &[u8]) -> NotifierResult<String> {
        let signature = credential
            .signer()
            .sign_message(body)
            .await
            .map_err(|e| NotifierError::Wallet(format!("签名失败: {e}")))?;

        Ok(hex::encode_prefixed(signature.as_bytes()))
    }
}

#[async_trait]
impl DeliveryGateway for HttpDeliveryGateway {
    async fn list_subscribers(&self, credential: &SigningCredential) -> NotifierResult<Vec<Address>> {
        let url = self.channel_url(credential, "subscribers");
        debug!("获取订阅者列表: {}", url);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            error!("订阅者列表请求失败: {}", e);
            NotifierError::SubscriberFetch(format!("网关连接失败: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::SubscriberFetch(format!(
                "HTTP {status} - {body}"
            )));
        }

        let parsed: SubscribersResponse = response
            .json()
            .await
            .map_err(|e| NotifierError::SubscriberFetch(format!("订阅者列表解析失败: {e}")))?;

        Ok(parsed.subscribers)
    }

    async fn send_notification(
        &self,
        credential: &SigningCredential,
        notification: &Notification,
    ) -> NotifierResult<DeliveryReceipt> {
        let envelope = NotificationEnvelope {
            channel: credential.channel_address(),
            notification,
        };
        let body = serde_json::to_vec(&envelope)?;
        let signature = Self::sign_body(credential, &body).await?;

        if notification.simulate {
            info!(
                recipient = %notification.recipient,
                "模拟模式，通知已构造并签名，未发送"
            );
            return Ok(DeliveryReceipt::simulated(notification.recipient));
        }

        let url = self.channel_url(credential, "notifications");
        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| NotifierError::Delivery(format!("网关连接失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Delivery(format!("HTTP {status} - {body}")));
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = parse_send_response(&body);
        Ok(DeliveryReceipt {
            recipient: notification.recipient,
            simulated: false,
            reference: parsed.id,
        })
    }
}

/// 网关返回 2xx 但回复无法解析时记录告警，回执不带引用
fn parse_send_response(body: &str) -> SendResponse {
    serde_json::from_str(body).unwrap_or_else(|e| {
        warn!(error = %e, body = %body, "通知网关回复无法解析，忽略回执引用");
        SendResponse::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Signature;
    use axum::{
        body::Bytes,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[derive(Clone, Default)]
    struct Received {
        requests: Arc<Mutex<Vec<(String, HeaderMap, Bytes)>>>,
    }

    async fn serve(received: Received) -> String {
        let router = Router::new()
            .route(
                "/channels/{channel}/subscribers",
                get(|Path(channel): Path<String>| async move {
                    if channel != "element_tracker" {
                        return Err(StatusCode::NOT_FOUND);
                    }
                    Ok(Json(serde_json::json!({
                        "subscribers": [
                            "0x1111111111111111111111111111111111111111",
                            "0x2222222222222222222222222222222222222222"
                        ]
                    })))
                }),
            )
            .route(
                "/channels/{channel}/notifications",
                post(
                    |State(received): State<Received>,
                     Path(channel): Path<String>,
                     headers: HeaderMap,
                     body: Bytes| async move {
                        received.requests.lock().unwrap().push((channel, headers, body));
                        Json(serde_json::json!({ "id": "n-1" }))
                    },
                ),
            )
            .with_state(received);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gateway(url: String) -> HttpDeliveryGateway {
        HttpDeliveryGateway::new(&DeliveryConfig {
            gateway_url: url,
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn notification(simulate: bool) -> Notification {
        Notification {
            recipient: Address::repeat_byte(0x11),
            title: "Element.fi Alert!".to_string(),
            message: "Expired Element Finance token balance in your wallet!".to_string(),
            payload_title: "Element Token ready for redemption!".to_string(),
            payload_body: "body".to_string(),
            category: 3,
            simulate,
        }
    }

    #[tokio::test]
    async fn test_list_subscribers() {
        let base = serve(Received::default()).await;
        let credential = SigningCredential::from_hex_key("element_tracker", KEY).unwrap();

        let subscribers = gateway(base).list_subscribers(&credential).await.unwrap();

        assert_eq!(
            subscribers,
            vec![Address::repeat_byte(0x11), Address::repeat_byte(0x22)]
        );
    }

    #[tokio::test]
    async fn test_unknown_channel_is_subscriber_fetch_failure() {
        let base = serve(Received::default()).await;
        let credential = SigningCredential::from_hex_key("other", KEY).unwrap();

        let err = gateway(base).list_subscribers(&credential).await.unwrap_err();
        assert!(matches!(err, NotifierError::SubscriberFetch(_)));
    }

    #[tokio::test]
    async fn test_send_notification_is_signed_by_channel_key() {
        let received = Received::default();
        let base = serve(received.clone()).await;
        let credential = SigningCredential::from_hex_key("element_tracker", KEY).unwrap();

        let receipt = gateway(base)
            .send_notification(&credential, &notification(false))
            .await
            .unwrap();

        assert!(!receipt.simulated);
        assert_eq!(receipt.reference.as_deref(), Some("n-1"));

        let requests = received.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (channel, headers, body) = &requests[0];
        assert_eq!(channel, "element_tracker");

        let raw = headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
        let signature = Signature::from_raw(&hex::decode(raw).unwrap()).unwrap();
        let signer = signature.recover_address_from_msg(body.as_ref()).unwrap();
        assert_eq!(signer, credential.channel_address());

        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json["category"], 3);
        assert_eq!(json["payloadTitle"], "Element Token ready for redemption!");
    }

    #[tokio::test]
    async fn test_simulated_notification_is_not_sent() {
        let received = Received::default();
        let base = serve(received.clone()).await;
        let credential = SigningCredential::from_hex_key("element_tracker", KEY).unwrap();

        let receipt = gateway(base)
            .send_notification(&credential, &notification(true))
            .await
            .unwrap();

        assert!(receipt.simulated);
        assert!(received.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_reply_falls_back_to_empty_receipt() {
        assert_eq!(parse_send_response(r#"{"id":"n-9"}"#).id.as_deref(), Some("n-9"));
        assert!(parse_send_response("accepted").id.is_none());
        assert!(parse_send_response("").id.is_none());
    }

    #[tokio::test]
    async fn test_non_json_success_reply_still_delivers() {
        let router = Router::new().route(
            "/channels/{channel}/notifications",
            post(|| async { "accepted" }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let credential = SigningCredential::from_hex_key("element_tracker", KEY).unwrap();

        let receipt = gateway(format!("http://{addr}"))
            .send_notification(&credential, &notification(false))
            .await
            .unwrap();

        assert!(!receipt.simulated);
        assert_eq!(receipt.recipient, Address::repeat_byte(0x11));
        assert!(receipt.reference.is_none());
    }
}
