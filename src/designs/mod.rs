pub mod common;
pub mod contact;
pub mod detail;
pub mod home;
