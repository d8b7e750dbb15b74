pub mod check;
pub mod config;
pub mod ec2;
pub mod error;
pub mod logging;
pub mod nagios;
pub mod xml;
