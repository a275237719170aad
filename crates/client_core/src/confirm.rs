//! Injected yes/no prompt used before destructive operations.

use async_trait::async_trait;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this average?";

#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

pub struct AlwaysConfirm;

#[async_trait]
impl Confirm for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub struct NeverConfirm;

#[async_trait]
impl Confirm for NeverConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
