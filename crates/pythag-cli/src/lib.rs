// Library root for the `pythag` binary: config, game-log loading, the
// analysis pipeline, and export. Kept separate from main.rs so integration
// tests can drive the pipeline directly.

pub mod config;
pub mod export;
pub mod game_logs;
pub mod pipeline;
