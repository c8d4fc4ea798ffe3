/// Command context, reply visibility and delivery
pub mod context;
/// Greetings commands (`/say`)
pub mod greetings;
