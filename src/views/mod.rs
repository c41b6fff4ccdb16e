pub mod chat;
pub mod query;
pub mod shared;

pub use chat::ChatView;
pub use query::QueryView;
