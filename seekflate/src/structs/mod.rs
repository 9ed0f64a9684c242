pub mod checkpoint;
pub mod priming;
