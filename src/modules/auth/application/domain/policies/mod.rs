mod deletion_policy;
mod resend_policy;
mod token_policy;

pub use deletion_policy::DeletionPolicy;
pub use resend_policy::{ResendDecision, ResendDenial, ResendPolicy};
pub use token_policy::TokenPolicy;
