//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business rules and remote-store access so route
//! handlers can stay focused on protocol translation and auth plumbing.
//! Every service takes `&dyn RemoteStore` plus the caller's access token;
//! row-level security on the remote side decides what that token may see.

pub mod accounts;
pub mod entity;
pub mod filter;
pub mod production;
pub mod quality;
pub mod recipe;
pub mod reports;
pub mod roles;
pub mod stock;
pub mod storefront;
pub mod uploads;
