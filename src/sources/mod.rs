mod pyth;

pub use pyth::{fetch_initial_price, PythWs};
