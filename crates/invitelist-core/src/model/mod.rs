pub mod ids;
pub mod list;
pub mod page;
pub mod worklist;
