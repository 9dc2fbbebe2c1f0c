use std::sync::Arc;

use anyhow::Context;
use function_client::{FunctionClient, HttpInvocationService};

use crate::cmd::{block_on, deadline};
use crate::config::ActorctlConfig;
use crate::output::print_blobs;

/// Invoke a function through the gateway at `endpoint` (or the configured
/// `invoke_endpoint`). With a timeout, the invocation is interrupted once it
/// expires.
pub fn run(
    config: &ActorctlConfig,
    endpoint: Option<String>,
    function_id: i64,
    args: &[String],
    timeout_secs: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let endpoint = endpoint
        .or_else(|| config.invoke_endpoint.clone())
        .context("no invocation endpoint: pass --endpoint or set invoke_endpoint in the config")?;

    block_on(async {
        let service = HttpInvocationService::new(endpoint, config.client.rpc_timeout())?;
        let client = FunctionClient::new(Arc::new(service), config.limits);
        let function = client.get(function_id);

        let info = function.invoke(args);
        let invocation_id = info.invocation_id;
        let waiting = info.wait();
        tokio::pin!(waiting);

        let finished = tokio::select! {
            result = &mut waiting => Some(result),
            _ = deadline(timeout_secs) => None,
        };
        let result = match finished {
            Some(result) => result,
            None => {
                if let Err(e) = function.interrupt(invocation_id) {
                    tracing::debug!(invocation_id, error = %e, "invocation finished before interrupt");
                }
                waiting.await
            }
        };

        let blobs = result
            .outcome
            .with_context(|| format!("function {function_id} invocation {invocation_id} failed"))?;
        print_blobs(&blobs, json)
    })
}
