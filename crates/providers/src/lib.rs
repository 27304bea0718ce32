pub mod events;
pub mod scripted;
pub mod turn;

pub use events::RawEvent;
pub use scripted::{ScriptedLoop, ScriptedTurn};
pub use turn::{AgentLoop, CancelToken, ModelConfig, RawEventStream, ToolExecutor, TurnRequest};
