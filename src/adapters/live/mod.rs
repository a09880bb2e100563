//! Live adapters that talk to real services.

pub mod ftp;
pub mod krea;
