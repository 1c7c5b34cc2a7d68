pub mod history;
pub mod init;
pub mod show;
pub mod take;
pub mod validate;
