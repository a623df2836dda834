mod ticker;

pub use ticker::TickTask;
