//! Write operations for modifying data in tables.
//!
//! This module provides operations for writing data to the store:
//! - Putting new items or replacing existing ones
//! - Updating items with expression or legacy attribute updates
//! - Deleting items by primary key

/// Delete item operation for removing items from tables.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Update item operation for modifying existing items.
pub mod update_item;
