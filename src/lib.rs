//! Kanban Client
//!
//! Client-side state synchronization for kanban boards: a reactive store of
//! boards, lists and cards kept consistent with a remote REST backend.

pub mod client;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod remote;
pub mod reorder;
pub mod status;
pub mod store;
pub mod versions;

pub use client::{KanbanClient, Reconciled};
pub use config::{ClientConfig, ConfigError};
pub use error::{RemoteError, Result, StoreError};
pub use remote::{HttpRemote, MemoryRemote, RemoteApi, ReqwestTransport};
pub use reorder::{DragKind, DragResult, DropContainer, DropLocation};
pub use status::{OperationKey, OperationKind, OperationStatus};
pub use store::{provide_kanban_store, use_kanban_store, KanbanState, KanbanStore};
