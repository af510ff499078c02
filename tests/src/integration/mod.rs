//! # Integration Flows

pub mod failover_flow;
pub mod loader_flow;
pub mod pipeline;
pub mod queue_flow;
pub mod reorg_flow;

#[cfg(test)]
pub(crate) mod support {
    use std::future::Future;
    use std::time::Duration;

    /// Poll `cond` until it holds or a generous deadline passes.
    pub async fn wait_until<F: Fn() -> bool>(cond: F) {
        for _ in 0..2400 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    /// Await `fut` with a test deadline.
    pub async fn within<T>(fut: impl Future<Output = T>) -> T {
        tokio::time::timeout(Duration::from_secs(15), fut)
            .await
            .expect("test deadline exceeded")
    }
}
