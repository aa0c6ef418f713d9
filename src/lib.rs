// Tripstream - Checkpointed trip sampling and stream ingestion
// Copyright (c) 2025 Tripstream Contributors
// Licensed under the MIT License

//! # Tripstream - checkpointed trip sampling and stream ingestion
//!
//! Tripstream moves taxi trip records from a bulk dataset into per-category
//! key-value tables in three stages:
//!
//! - **Sample** never-seen rows from the bulk source, recording them in a checkpoint table
//! - **Publish** the sampled snapshot to a stream, one message per row
//! - **Consume** delivered batches: transform, assign sequential IDs, write durably
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Sampler, publisher, transformer, ID allocation and writer
//! - [`adapters`] - Key-value store, snapshot store and stream transport
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tripstream::adapters::store::create_store;
//! use tripstream::adapters::stream::DeliveryBatch;
//! use tripstream::config::load_config;
//! use tripstream::core::ingest::StreamConsumer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("tripstream.toml")?;
//!     let handles = create_store(&config).await?;
//!
//!     let consumer = StreamConsumer::from_config(&config, &handles)?;
//!     let batch = DeliveryBatch::read_from("delivery.json").await?;
//!
//!     let response = consumer.handle(&batch).await;
//!     println!("{} {}", response.status_code, response.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Sequential IDs
//!
//! Every record written to a target table gets an `ID` above every `ID`
//! already there, gap-free within one invocation. The default scan allocator
//! assumes one consumer per table at a time; the counter allocator lifts
//! that with a compare-and-swap counter.
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`] with [`domain::TripstreamError`].
//! The CLI maps errors to exit codes at the command boundary.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
