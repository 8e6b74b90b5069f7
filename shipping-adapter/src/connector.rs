//! Shipping service connector interface

use crate::proto::shipping_service_client::ShippingServiceClient;
use crate::proto::{ShippingRequest, ShippingResponse};
use async_trait::async_trait;
use std::time::Duration;
use tonic::transport::Channel;
use tonic::Status;

/// Port to the remote delivery-estimate operation.
///
/// One call is one attempt; retries are layered on top by the adapter.
#[async_trait]
pub trait ShippingConnector: Send + Sync {
    /// Ask the shipping service for a delivery estimate.
    ///
    /// `timeout` is the time left on the caller's context, if it has a deadline.
    async fn estimate_delivery(
        &self,
        request: ShippingRequest,
        timeout: Option<Duration>,
    ) -> Result<ShippingResponse, Status>;

    /// Connector name, for logs
    fn name(&self) -> &str;
}

/// gRPC connector over a shared tonic channel
#[derive(Debug)]
pub struct GrpcShippingConnector {
    client: ShippingServiceClient<Channel>,
    target: String,
}

impl GrpcShippingConnector {
    /// Wrap an established (or lazily connecting) channel
    pub fn new(channel: Channel, target: impl Into<String>) -> Self {
        Self {
            client: ShippingServiceClient::new(channel),
            target: target.into(),
        }
    }

    /// Address this connector talks to
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl ShippingConnector for GrpcShippingConnector {
    async fn estimate_delivery(
        &self,
        request: ShippingRequest,
        timeout: Option<Duration>,
    ) -> Result<ShippingResponse, Status> {
        let mut request = tonic::Request::new(request);
        if let Some(timeout) = timeout {
            request.set_timeout(timeout);
        }

        // Channel clones share one multiplexed connection
        let mut client = self.client.clone();
        let response = client.get_delivery_estimate(request).await?;
        Ok(response.into_inner())
    }

    fn name(&self) -> &str {
        &self.target
    }
}
