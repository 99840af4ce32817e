mod delete_account;
mod recover_account;
mod register_account;
mod resend_verification;
mod verify_email;

pub use delete_account::*;
pub use recover_account::*;
pub use register_account::*;
pub use resend_verification::*;
pub use verify_email::*;
