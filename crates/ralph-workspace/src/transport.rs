//! Backend transport seam
//!
//! The workspace never talks to the backend directly. Resource producers call
//! `invoke(command, args)` on whatever transport the host provides.

use anyhow::Context;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub trait Transport: Send + Sync {
    /// Run one backend command. No ordering is guaranteed across calls.
    fn invoke(&self, command: &str, args: Value) -> BoxFuture<'static, anyhow::Result<Value>>;
}

/// Invoke `command` and decode its response
pub async fn invoke_as<T: DeserializeOwned>(
    transport: &dyn Transport,
    command: &str,
    args: Value,
) -> anyhow::Result<T> {
    let response = transport.invoke(command, args).await?;
    serde_json::from_value(response)
        .with_context(|| format!("Unexpected response to {}", command))
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use futures_util::FutureExt;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Canned responses per command, recording every call
    #[derive(Default)]
    pub(crate) struct MockTransport {
        responses: Mutex<HashMap<String, Value>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl MockTransport {
        pub(crate) fn respond(&self, command: &str, response: Value) {
            self.responses
                .lock()
                .insert(command.to_string(), response);
        }

        pub(crate) fn calls(&self, command: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|(name, _)| name == command)
                .count()
        }

        pub(crate) fn last_args(&self, command: &str) -> Option<Value> {
            self.calls
                .lock()
                .iter()
                .rev()
                .find(|(name, _)| name == command)
                .map(|(_, args)| args.clone())
        }
    }

    impl Transport for MockTransport {
        fn invoke(&self, command: &str, args: Value) -> BoxFuture<'static, anyhow::Result<Value>> {
            self.calls.lock().push((command.to_string(), args));
            let response = self.responses.lock().get(command).cloned();
            let command = command.to_string();

            async move {
                tokio::task::yield_now().await;
                response.ok_or_else(|| anyhow::anyhow!("Unknown command: {}", command))
            }
            .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_invoke_as_decodes_response() {
        let transport = MockTransport::default();
        transport.respond("count_tasks", json!(3));

        let count: u32 = invoke_as(&transport, "count_tasks", json!({})).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(transport.calls("count_tasks"), 1);
    }

    #[tokio::test]
    async fn test_invoke_as_reports_bad_shape() {
        let transport = MockTransport::default();
        transport.respond("count_tasks", json!("three"));

        let err = invoke_as::<u32>(&transport, "count_tasks", json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("count_tasks"));
    }

    #[tokio::test]
    async fn test_unknown_command_fails() {
        let transport = MockTransport::default();
        assert!(invoke_as::<Value>(&transport, "missing", Value::Null)
            .await
            .is_err());
    }
}
