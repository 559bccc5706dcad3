// LunatiX audio mixer library
// Channel groups, post-mix effects and volume buses over SDL_mixer

pub mod cli;
pub mod config;
pub mod logging;
pub mod propfile;
pub mod sound;

pub use cli::Cli;
pub use config::AudioOptions;
pub use logging::LogLevel;
pub use sound::mixer::MixerState;
