pub mod interval;
pub mod region;

// re-export for cleaner imports
pub use self::interval::GenomicInterval;
pub use self::region::Region;
