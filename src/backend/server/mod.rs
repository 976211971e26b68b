//! Server Module
//!
//! This module wires the collaboration core into a running process.
//!
//! # Architecture
//!
//! - **`state`** - `AppState`, the owner of all process-wide structures
//! - **`config`** - Configuration loading and logging setup
//! - **`init`** - Building the state and starting background tasks
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and shutdown
//! ├── config.rs - Configuration loading, tracing setup
//! └── init.rs   - create_app
//! ```
//!
//! # Lifecycle
//!
//! 1. **Configuration Loading**: `.env`, TOML file, environment overrides
//! 2. **State Creation**: store connection, collab state, channels
//! 3. **Background Tasks**: persistence worker, channel cleanup
//! 4. **Shutdown**: drain the persistence queue, close the store

/// Application state management
pub mod state;

/// Configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use init::create_app;
pub use state::AppState;
