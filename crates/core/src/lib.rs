//! # EHR Core
//!
//! Core logic for the EHR gateway.
//!
//! This crate talks to the third-party FHIR API and shapes its data for clients:
//! - the REST client for FHIR search/read/patch/create and the platform user endpoint
//! - client-credentials token acquisition and the [`CredentialCache`]
//! - reassembly of search-with-includes results into records
//! - page services and the view models they return
//!
//! **No API concerns**: HTTP servers, header parsing, and routing belong in `api-rest`,
//! `api-shared` or `functions`.

pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod records;
pub mod services;
pub mod validation;
pub mod views;

pub use auth::{AccessToken, ClientCredentials, CredentialCache};
pub use client::{FhirClient, PlatformClient, User};
pub use config::CoreConfig;
pub use error::{EhrError, EhrResult};
pub use services::{AppointmentQuery, EhrService};
pub use views::RowFilter;
