// Transport: posts a rendered SOAP body to a service address and returns the raw reply

use crate::config::TransportConfig;
use crate::error::{QflowError, Result};
use crate::response::ResponseWrapper;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

const FAULT: &str = "//Envelope/Body/Fault";
const FAULT_CODE_11: &str = "//Envelope/Body/Fault/faultcode";
const FAULT_STRING_11: &str = "//Envelope/Body/Fault/faultstring";
const FAULT_CODE_12: &str = "//Envelope/Body/Fault/Code/Value";
const FAULT_REASON_12: &str = "//Envelope/Body/Fault/Reason/Text";

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `body` to `address`. No retries happen at this layer.
    async fn send(&self, body: String, address: &str) -> Result<String>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    content_type: String,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| QflowError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            content_type: config.content_type.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: String, address: &str) -> Result<String> {
        let transport_error = |reason: String| QflowError::Transport {
            address: address.to_string(),
            reason,
        };

        let response = self
            .client
            .post(address)
            .header(reqwest::header::CONTENT_TYPE, self.content_type.as_str())
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e.to_string()))?;
        debug!(address, status = status.as_u16(), bytes = text.len(), "Received reply");

        // a fault still carries a parseable envelope, whatever the status
        if let Some((code, message)) = detect_fault(&text) {
            warn!(address, code = %code, message = %message, "Remote fault");
            return Err(QflowError::RemoteFault {
                address: address.to_string(),
                code,
                message,
                body: text,
            });
        }

        if !status.is_success() {
            return Err(transport_error(format!("HTTP status {}", status)));
        }

        Ok(text)
    }
}

/// Returns the fault code and message when `body` is a SOAP 1.1 or 1.2
/// fault envelope.
pub fn detect_fault(body: &str) -> Option<(String, String)> {
    // both SOAP versions name the element Fault
    if !body.contains("Fault") {
        return None;
    }

    let response = ResponseWrapper::parse(body).ok()?;
    if response.get_node_list(FAULT).ok()?.is_empty() {
        return None;
    }

    let first_of = |paths: [&str; 2]| {
        paths
            .iter()
            .filter_map(|path| response.get_string(path).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    };

    Some((
        first_of([FAULT_CODE_11, FAULT_CODE_12]),
        first_of([FAULT_STRING_11, FAULT_REASON_12]),
    ))
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    enum Reply {
        Body(String),
        Fault { code: String, message: String },
        Unreachable(String),
    }

    // Replays queued replies in order and records every request it sees
    #[derive(Default)]
    pub struct MockTransport {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond_with(&self, body: &str) {
            self.replies.lock().push_back(Reply::Body(body.to_string()));
        }

        pub fn fault_with(&self, code: &str, message: &str) {
            self.replies.lock().push_back(Reply::Fault {
                code: code.to_string(),
                message: message.to_string(),
            });
        }

        pub fn fail_with(&self, reason: &str) {
            self.replies
                .lock()
                .push_back(Reply::Unreachable(reason.to_string()));
        }

        /// (address, body) pairs in the order they were sent.
        pub fn requests(&self) -> Vec<(String, String)> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, body: String, address: &str) -> Result<String> {
            self.requests.lock().push((address.to_string(), body));

            match self.replies.lock().pop_front() {
                Some(Reply::Body(body)) => Ok(body),
                Some(Reply::Fault { code, message }) => Err(QflowError::RemoteFault {
                    address: address.to_string(),
                    code,
                    message,
                    body: String::new(),
                }),
                Some(Reply::Unreachable(reason)) => Err(QflowError::Transport {
                    address: address.to_string(),
                    reason,
                }),
                None => Err(QflowError::Transport {
                    address: address.to_string(),
                    reason: "no reply queued".to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_soap11_fault() {
        let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <s:Fault>
      <faultcode>s:Client</faultcode>
      <faultstring xml:lang="en-AU">Calendar 42 does not exist</faultstring>
    </s:Fault>
  </s:Body>
</s:Envelope>"#;

        let (code, message) = detect_fault(body).unwrap();
        assert_eq!(code, "s:Client");
        assert_eq!(message, "Calendar 42 does not exist");
    }

    #[test]
    fn test_detect_soap12_fault() {
        let body = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
  <env:Body>
    <env:Fault>
      <env:Code><env:Value>env:Receiver</env:Value></env:Code>
      <env:Reason><env:Text xml:lang="en">Session expired</env:Text></env:Reason>
    </env:Fault>
  </env:Body>
</env:Envelope>"#;

        let (code, message) = detect_fault(body).unwrap();
        assert_eq!(code, "env:Receiver");
        assert_eq!(message, "Session expired");
    }

    #[test]
    fn test_regular_reply_is_not_a_fault() {
        let body = r#"<s:Envelope xmlns:s="x"><s:Body><GetResponse/></s:Body></s:Envelope>"#;
        assert!(detect_fault(body).is_none());
        assert!(detect_fault("<html>Bad gateway").is_none());
    }

    #[test]
    fn test_fault_text_without_fault_element() {
        let body = r#"<s:Envelope xmlns:s="x"><s:Body><GetResponse>
  <GetResult><Address>12 Fault Line Rd</Address></GetResult>
</GetResponse></s:Body></s:Envelope>"#;
        assert!(detect_fault(body).is_none());

        let fault = r#"<Envelope><Body><Fault><faultcode>Server</faultcode></Fault></Body></Envelope>"#;
        assert_eq!(
            detect_fault(fault),
            Some(("Server".to_string(), String::new()))
        );
    }
}
