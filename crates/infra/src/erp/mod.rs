//! ERP REST adapter

pub mod client;

pub use client::ErpClient;
