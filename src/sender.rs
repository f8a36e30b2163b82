// Render -> send -> wrap, shared by every domain service

use crate::error::Result;
use crate::render::{render, Parameters};
use crate::response::ResponseWrapper;
use crate::template::Template;
use crate::transport::Transport;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct QflowSender {
    transport: Arc<dyn Transport>,
}

impl QflowSender {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn send_request(
        &self,
        template: &Template,
        parameters: &Parameters,
        address: &str,
    ) -> Result<ResponseWrapper> {
        let body = render(template, parameters)?;
        debug!(
            template = template.key(),
            address,
            bytes = body.len(),
            "Sending request"
        );

        let raw = self.transport.send(body, address).await?;
        ResponseWrapper::parse(&raw)
    }
}
