//! Email adapter
//!
//! Implementation of the email sender port for the delivery provider.

pub mod client;

pub use client::{NoopEmailSender, ResendEmailClient};
