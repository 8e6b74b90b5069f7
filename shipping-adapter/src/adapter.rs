//! Shipping estimate adapter (orchestrates translation, connector and retry policy)

use crate::connector::{GrpcShippingConnector, ShippingConnector};
use crate::context::CallContext;
use crate::metrics::{outcome_label, SHIPPING_REQUESTS_TOTAL, SHIPPING_REQUEST_DURATION};
use crate::proto::{ShippingItem, ShippingRequest};
use crate::retry::RetryPolicy;
use crate::types::Order;
use crate::{AdapterConfig, Error, Result};
use tonic::transport::Endpoint;
use tracing::{debug, info};

/// Translate a domain order into the wire request.
///
/// Items keep their order. The first product code that is not a base-10 `i64`
/// aborts the translation; every `i64` (zero and negatives included) is
/// accepted. Quantities above `i32::MAX` are rejected rather than truncated.
pub fn build_request(order: &Order) -> Result<ShippingRequest> {
    let items = order
        .items
        .iter()
        .map(|item| {
            let product_code = item.product_code.parse::<i64>().map_err(|source| {
                Error::InvalidProductCode {
                    product_code: item.product_code.clone(),
                    source,
                }
            })?;
            let quantity =
                i32::try_from(item.quantity).map_err(|_| Error::QuantityOutOfRange {
                    product_code: item.product_code.clone(),
                    quantity: item.quantity,
                })?;
            Ok(ShippingItem {
                product_code,
                quantity,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ShippingRequest {
        order_id: order.id,
        items,
    })
}

/// Normalise a service address into an endpoint URI.
///
/// Bare `host:port` addresses get a plaintext `http://` scheme.
fn endpoint_uri(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

fn endpoint(address: &str) -> Result<Endpoint> {
    Endpoint::from_shared(endpoint_uri(address)).map_err(|e| {
        Error::Connection(format!(
            "Invalid shipping service address {}: {}",
            address, e
        ))
    })
}

/// Client-side adapter to the shipping service.
///
/// Not `Clone`: the adapter is the sole owner of its channel, so `shutdown`
/// closes the connection. Share it across tasks behind an `Arc`.
#[derive(Debug)]
pub struct ShippingEstimateAdapter<C = GrpcShippingConnector> {
    connector: C,
    policy: RetryPolicy,
}

impl ShippingEstimateAdapter<GrpcShippingConnector> {
    /// Create an adapter for `address` with the default retry policy.
    ///
    /// The channel is plaintext and dials lazily, so only a malformed address
    /// fails here. Must be called inside a tokio runtime.
    pub fn new(address: &str) -> Result<Self> {
        let channel = endpoint(address)?.connect_lazy();
        info!("Shipping adapter created for {} (lazy dial)", address);

        Ok(Self::with_connector(
            GrpcShippingConnector::new(channel, address),
            RetryPolicy::default(),
        ))
    }

    /// Create an adapter from config, dialing eagerly when configured to
    pub async fn from_config(config: &AdapterConfig) -> Result<Self> {
        config.validate()?;

        let address = config.shipping_service_url.as_str();
        let endpoint = endpoint(address)?.connect_timeout(config.connect_timeout());

        let channel = if config.connect_eagerly {
            let channel = endpoint.connect().await.map_err(|e| {
                Error::Connection(format!("Failed to connect to {}: {}", address, e))
            })?;
            info!("Shipping adapter connected to {}", address);
            channel
        } else {
            info!("Shipping adapter created for {} (lazy dial)", address);
            endpoint.connect_lazy()
        };

        Ok(Self::with_connector(
            GrpcShippingConnector::new(channel, address),
            config.retry_policy(),
        ))
    }
}

impl<C: ShippingConnector> ShippingEstimateAdapter<C> {
    /// Build an adapter over any connector
    pub fn with_connector(connector: C, policy: RetryPolicy) -> Self {
        Self { connector, policy }
    }

    /// Retry policy in effect
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Underlying connector
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Estimated delivery time for `order`, in whole days.
    ///
    /// Translation errors are returned before any network activity. Transport
    /// failures come back as `Error::Transport` with the remote status
    /// untouched; a done context yields `Error::Cancelled` or
    /// `Error::DeadlineExceeded`.
    pub async fn create(&self, ctx: &CallContext, order: &Order) -> Result<i32> {
        let timer = SHIPPING_REQUEST_DURATION.start_timer();
        let result = self.estimate(ctx, order).await;
        timer.observe_duration();

        SHIPPING_REQUESTS_TOTAL
            .with_label_values(&[outcome_label(&result)])
            .inc();
        result
    }

    async fn estimate(&self, ctx: &CallContext, order: &Order) -> Result<i32> {
        let request = build_request(order)?;
        debug!(
            "Requesting delivery estimate for order {} ({} items, {} units) via {}",
            order.id,
            request.items.len(),
            order.total_quantity(),
            self.connector.name()
        );

        let response = self
            .policy
            .execute(ctx, "GetDeliveryEstimate", |_| {
                self.connector
                    .estimate_delivery(request.clone(), ctx.remaining())
            })
            .await?;

        Ok(response.delivery_days)
    }

    /// Close the connection held by this adapter.
    ///
    /// Consumes the adapter; dropping the only channel handle closes the
    /// underlying HTTP/2 connection.
    pub fn shutdown(self) {
        let Self { connector, .. } = self;
        info!("Shipping adapter for {} shut down", connector.name());
        drop(connector);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ShippingResponse;
    use crate::retry::Backoff;
    use crate::types::OrderItem;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tonic::{Code, Status};

    /// Connector that replays scripted outcomes and records requests
    #[derive(Default)]
    struct ScriptedConnector {
        outcomes: Mutex<VecDeque<std::result::Result<i32, Status>>>,
        requests: Mutex<Vec<ShippingRequest>>,
    }

    impl ScriptedConnector {
        fn new(outcomes: Vec<std::result::Result<i32, Status>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ShippingConnector for ScriptedConnector {
        async fn estimate_delivery(
            &self,
            request: ShippingRequest,
            _timeout: Option<Duration>,
        ) -> std::result::Result<ShippingResponse, Status> {
            self.requests.lock().unwrap().push(request);
            let next = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Status::internal("script exhausted")));
            next.map(|delivery_days| ShippingResponse { delivery_days })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn sample_order() -> Order {
        Order::new(1, vec![OrderItem::new("100", 2), OrderItem::new("200", 1)])
    }

    fn adapter(
        outcomes: Vec<std::result::Result<i32, Status>>,
    ) -> ShippingEstimateAdapter<ScriptedConnector> {
        ShippingEstimateAdapter::with_connector(
            ScriptedConnector::new(outcomes),
            RetryPolicy::default(),
        )
    }

    #[test]
    fn test_build_request_keeps_order() {
        let request = build_request(&sample_order()).unwrap();

        assert_eq!(request.order_id, 1);
        assert_eq!(
            request.items,
            vec![
                ShippingItem {
                    product_code: 100,
                    quantity: 2,
                },
                ShippingItem {
                    product_code: 200,
                    quantity: 1,
                },
            ]
        );
    }

    #[test]
    fn test_build_request_empty_order() {
        let request = build_request(&Order::new(9, vec![])).unwrap();
        assert_eq!(request.order_id, 9);
        assert!(request.items.is_empty());
    }

    #[test]
    fn test_build_request_rejects_bad_codes() {
        for code in ["abc", "", "12a", "9223372036854775808", " 1", "1.5"] {
            let order = Order::new(1, vec![OrderItem::new("1", 1), OrderItem::new(code, 1)]);
            match build_request(&order) {
                Err(Error::InvalidProductCode { product_code, .. }) => {
                    assert_eq!(product_code, code)
                }
                other => panic!("expected InvalidProductCode for {:?}, got {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_build_request_accepts_full_i64_range() {
        let order = Order::new(
            1,
            vec![
                OrderItem::new("0", 1),
                OrderItem::new("-42", 1),
                OrderItem::new("+7", 1),
                OrderItem::new(i64::MAX.to_string(), 1),
            ],
        );
        let codes: Vec<i64> = build_request(&order)
            .unwrap()
            .items
            .iter()
            .map(|i| i.product_code)
            .collect();
        assert_eq!(codes, vec![0, -42, 7, i64::MAX]);
    }

    #[test]
    fn test_build_request_rejects_oversized_quantity() {
        let order = Order::new(1, vec![OrderItem::new("5", i32::MAX as u32 + 1)]);
        assert!(matches!(
            build_request(&order),
            Err(Error::QuantityOutOfRange { quantity, .. }) if quantity == i32::MAX as u32 + 1
        ));

        let order = Order::new(1, vec![OrderItem::new("5", i32::MAX as u32)]);
        assert_eq!(build_request(&order).unwrap().items[0].quantity, i32::MAX);
    }

    #[test]
    fn test_endpoint_uri() {
        assert_eq!(endpoint_uri("localhost:8082"), "http://localhost:8082");
        assert_eq!(endpoint_uri("http://shipping:9000"), "http://shipping:9000");
        assert_eq!(endpoint_uri(" 10.0.0.5:50051 "), "http://10.0.0.5:50051");
    }

    #[tokio::test]
    async fn test_new_rejects_malformed_address() {
        let err = ShippingEstimateAdapter::new("http://bad host:80").unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn test_new_with_valid_address_is_lazy() {
        let adapter = ShippingEstimateAdapter::new("localhost:1").unwrap();
        assert_eq!(adapter.connector().target(), "localhost:1");
        assert_eq!(adapter.policy().max_attempts(), 6);
        adapter.shutdown();
    }

    #[tokio::test]
    async fn test_create_returns_days() {
        let adapter = adapter(vec![Ok(5)]);

        let days = adapter
            .create(&CallContext::background(), &sample_order())
            .await
            .unwrap();

        assert_eq!(days, 5);
        assert_eq!(adapter.connector().calls(), 1);
    }

    #[tokio::test]
    async fn test_create_passes_zero_through() {
        let adapter = adapter(vec![Ok(0)]);
        let days = adapter
            .create(&CallContext::background(), &sample_order())
            .await
            .unwrap();
        assert_eq!(days, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_retries_unavailable() {
        let adapter = adapter(vec![
            Err(Status::unavailable("down")),
            Err(Status::unavailable("down")),
            Ok(3),
        ]);

        let days = adapter
            .create(&CallContext::background(), &sample_order())
            .await
            .unwrap();

        assert_eq!(days, 3);
        assert_eq!(adapter.connector().calls(), 3);

        // every attempt carries the same request
        let requests = adapter.connector().requests.lock().unwrap();
        assert!(requests.iter().all(|r| *r == requests[0]));
    }

    #[tokio::test]
    async fn test_invalid_code_makes_no_call() {
        let adapter = adapter(vec![Ok(5)]);
        let order = Order::new(1, vec![OrderItem::new("100", 1), OrderItem::new("abc", 1)]);

        let err = adapter
            .create(&CallContext::background(), &order)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("abc"));
        assert!(err.is_translation());
        assert_eq!(adapter.connector().calls(), 0);
    }

    #[tokio::test]
    async fn test_non_retryable_status_returned_unmodified() {
        let adapter = adapter(vec![Err(Status::not_found("no route")), Ok(1)]);

        let err = adapter
            .create(&CallContext::background(), &sample_order())
            .await
            .unwrap_err();

        let status = err.status().expect("transport error");
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "no route");
        assert_eq!(adapter.connector().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_surface_last_status() {
        let adapter = ShippingEstimateAdapter::with_connector(
            ScriptedConnector::new(vec![
                Err(Status::resource_exhausted("busy")),
                Err(Status::unavailable("down")),
                Err(Status::deadline_exceeded("slow")),
            ]),
            RetryPolicy::new(
                2,
                Backoff::Linear {
                    step: Duration::from_millis(10),
                },
            ),
        );

        let err = adapter
            .create(&CallContext::background(), &sample_order())
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::DeadlineExceeded);
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(adapter.connector().calls(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_context_makes_no_call() {
        let adapter = adapter(vec![Ok(5)]);
        let ctx = CallContext::background();
        ctx.cancel();

        let err = adapter.create(&ctx, &sample_order()).await.unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(adapter.connector().calls(), 0);
    }
}
