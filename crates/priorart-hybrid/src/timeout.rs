use std::future::Future;
use std::time::Duration;

use priorart_core::error::Error;

/// Await `fut` for at most `after`; elapsing becomes `Error::Timeout` tagged with `capability`.
pub(crate) async fn bounded<T, F>(capability: &'static str, after: Duration, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout { capability, after }.into()),
    }
}
