mod game;
mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use game::{EngineContext, Game, GameError};
pub use input::Key;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::Renderer;
