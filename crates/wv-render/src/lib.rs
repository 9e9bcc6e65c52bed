pub mod chrome;
pub mod hit;

pub use chrome::{ChromeButton, ChromeHit, ChromeLayout, ChromeMetrics};
pub use hit::{hit_test, window_rect};
