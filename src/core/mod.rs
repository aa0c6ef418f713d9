//! Core pipeline logic for tripstream.
//!
//! # Modules
//!
//! - [`sampler`] - Deduplicating sampler over the bulk source and checkpoint
//! - [`checkpoint`] - Checkpoint table reads and appends
//! - [`publish`] - Snapshot publication to the stream
//! - [`transform`] - Per-category record transformation
//! - [`state`] - Sequential ID allocation
//! - [`ingest`] - Stream consumer and batched durable writer
//!
//! # Pipeline
//!
//! 1. **Sample**: select never-seen rows, write the snapshot, append to the checkpoint
//! 2. **Publish**: put each snapshot row on the stream
//! 3. **Consume**: transform each delivered event, allocate IDs, write to the target table
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tripstream::adapters::snapshot::LocalSnapshotStore;
//! use tripstream::adapters::store::create_store;
//! use tripstream::config::load_config;
//! use tripstream::core::sampler::DeduplicatingSampler;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("tripstream.toml")?;
//! let handles = create_store(&config).await?;
//! let snapshots = Arc::new(LocalSnapshotStore::new(&config.pipeline.object_dir));
//!
//! let sampler = DeduplicatingSampler::from_config(&config, &handles, snapshots);
//! let batch = sampler.run().await?;
//! println!("Sampled {} rows", batch.len());
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod ingest;
pub mod publish;
pub mod sampler;
pub mod state;
pub mod transform;
