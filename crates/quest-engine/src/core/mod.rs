pub mod progress;
pub mod screen;
pub mod sequencer;
pub mod storage;
pub mod timers;
