//! # tws-client
//!
//! Async client engine for the TWS / IB Gateway socket API.
//!
//! The wire protocol is a TCP stream of length-prefixed frames whose
//! payloads are NUL-delimited ASCII tokens with no type tags: field
//! position, the negotiated server version and (for legacy message
//! families) a per-message version number are the only structure there is.
//!
//! ## Architecture
//!
//! - **`protocol`** — framing and fieldset tokens: the frame buffer that
//!   reassembles partial reads, and the typed builder/cursor pair that
//!   keeps encode and decode in lockstep.
//! - **`queue`** — sliding-window rate limiter in front of the writer, with
//!   durable and deadline-expirable submissions.
//! - **`bus`** — correlation of inbound frames to one-shot broadcast
//!   futures, live subscriptions and record accumulators.
//! - **`requests` / `handlers`** — the versioned field codec: mirror-exact
//!   encoders and decoders per message family.
//! - **`client`** — session lifecycle: handshake, version negotiation,
//!   StartAPI, request-id allocation and the public request surface.
//!
//! ## Example
//!
//! ```ignore
//! use tws_client::{Client, Config, Contract, Order};
//!
//! #[tokio::main]
//! async fn main() -> tws_client::Result<()> {
//!     let client = Client::new(Config {
//!         port: 7497,
//!         client_id: 7,
//!         ..Default::default()
//!     });
//!
//!     let time = client.current_time().await?;
//!     println!("server time: {}", time);
//!
//!     let order_id = client
//!         .place_order(&Contract::stock("AAPL"), &Order::limit("BUY", 100.0, 180.0))
//!         .await?;
//!     println!("placed order {}", order_id);
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod contract;
pub mod error;
pub mod market_data;
pub mod messages;
pub mod order;
pub mod protocol;
pub mod queue;
pub mod requests;
pub mod transport;

mod client;
mod handlers;

pub use client::{Client, Config, Subscription};
pub use contract::Contract;
pub use error::{Result, TwsError};
pub use order::Order;
