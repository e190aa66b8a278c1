//! Connectivity probe port interface

use async_trait::async_trait;

/// Port for low-level connectivity checks.
///
/// The result is a hint, not ground truth: a positive check justifies
/// one drain attempt, never an assumption that transmission will
/// succeed.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Check whether the remote endpoint looks reachable right now.
    async fn check(&self) -> bool;
}
