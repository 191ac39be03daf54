// Synthetic market data: candle windows, random walk and the feed itself
pub mod candle_buffer;
pub mod feed;
pub mod synthetic;

pub use candle_buffer::CandleBuffer;
pub use feed::{InstrumentSpec, MarketDataFeed};
pub use synthetic::PriceWalk;
