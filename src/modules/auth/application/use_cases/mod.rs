pub mod issue_verification_token;
pub mod recover_account;
pub mod resend_verification;
pub mod soft_delete_user;
mod verification_mail;
pub mod verify_user_email;
