//! # amtwsman - WS-Management protocol layer for Intel AMT
//!
//! Everything between a controller and the device:
//!
//! - [`codes`] : wire code tables (power states, return values, roles, ...)
//! - [`resource`] : schema namespaces, resource classes and selectors
//! - [`request`] : `invoke` input documents
//! - [`response`] : response parsing, SOAP fault detection
//! - [`gateway`] : the transport trait and request description
//! - [`cli`] : a gateway running the openwsman `wsman` client
//!
//! ## Example
//!
//! ```ignore
//! use amtwsman::{WsmanCli, WsmanCommand, WsmanGateway, WsmanResponse};
//! use amtwsman::resource::CIM_KVM_REDIRECTION_SAP;
//!
//! let gateway = WsmanCli::new("192.168.1.20", 16992, "admin", "P@ssw0rd");
//! let raw = gateway.retrieve(&WsmanCommand::get(CIM_KVM_REDIRECTION_SAP.uri()))?;
//! let response = WsmanResponse::parse(&raw)?;
//! let state = response.require_text(&CIM_KVM_REDIRECTION_SAP.uri(), "EnabledState")?;
//! ```

pub mod cli;
pub mod codes;
pub mod error;
pub mod gateway;
pub mod request;
pub mod resource;
pub mod response;

pub use cli::WsmanCli;
pub use codes::CodeTable;
pub use error::{Result, WsmanError};
pub use gateway::{Verb, WsmanCommand, WsmanGateway};
pub use resource::{ResourceClass, Schema, Selector};
pub use response::{ManagementResult, WsmanResponse};
