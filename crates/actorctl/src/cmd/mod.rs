pub mod actor;
pub mod call;
pub mod frame;

use std::future::Future;
use std::time::Duration;

/// Run one command to completion on a fresh runtime.
pub fn block_on<F, T>(fut: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fut)
}

/// Resolves after `secs`, or never when no limit was given.
pub(crate) async fn deadline(secs: Option<u64>) {
    match secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => std::future::pending().await,
    }
}
