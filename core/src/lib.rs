//! Synchronous client library for the Booked scheduling REST API.
//!
//! # Overview
//! Entities are key-value records of a named class, stored remotely and
//! addressed by a server-assigned id. [`RemoteObject`] holds the local
//! view and pending array operations, [`Query`] builds constraint-based
//! lookups, and [`Client`] runs every HTTP round-trip through one retry
//! loop.
//!
//! # Design
//! - The wire format is a JSON dialect with tagged special types
//!   (`__type`) and field operations (`__op`); [`codec`] converts between
//!   it and the closed [`Value`] enum.
//! - Requests and responses are plain data (`HttpRequest` /
//!   `HttpResponse`). A [`Transport`] executes them, so the pipeline can be
//!   driven by an in-memory transport in tests.
//! - Every entity and query carries a cheap [`Client`] handle; there is
//!   also an optional process-wide handle in [`client::global`].

pub mod client;
pub mod codec;
pub mod config;
pub mod datatypes;
pub mod entities;
pub mod error;
pub mod http;
pub mod object;
pub mod protocol;
pub mod query;
pub mod retry;
pub mod transport;
pub mod value;

pub use client::{Client, Session};
pub use config::ClientConfig;
pub use datatypes::{ArrayOp, ArrayOperation, Bytes, Date, File, GeoPoint, Increment, Pointer};
pub use entities::{Accessory, Reservation, Resource, User};
pub use error::{ClientError, ProtocolError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use object::RemoteObject;
pub use query::{Order, Query, QueryResults};
pub use retry::{FailureKind, RetryPolicy};
pub use transport::UreqTransport;
pub use value::Value;
