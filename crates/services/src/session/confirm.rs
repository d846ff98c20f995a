use async_trait::async_trait;

/// Decides whether a submission with unanswered questions should proceed.
///
/// The interactive caller typically prompts the student here; headless
/// callers inject a fixed policy. Auto-submit on timer expiry never consults
/// the policy.
#[async_trait]
pub trait SubmitConfirmation: Send + Sync {
    /// Called with the number of unanswered questions (always > 0).
    /// Returning false aborts the submission with no state change.
    async fn confirm_unanswered(&self, unanswered: usize) -> bool;
}

/// Policy that always proceeds.
pub struct ConfirmAll;

#[async_trait]
impl SubmitConfirmation for ConfirmAll {
    async fn confirm_unanswered(&self, _unanswered: usize) -> bool {
        true
    }
}

/// Policy that always declines.
pub struct DeclineAll;

#[async_trait]
impl SubmitConfirmation for DeclineAll {
    async fn confirm_unanswered(&self, _unanswered: usize) -> bool {
        false
    }
}
