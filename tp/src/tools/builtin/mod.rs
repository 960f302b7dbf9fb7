//! Built-in travel tools

mod currency;
mod image;
pub mod weather;

pub use currency::{Conversion, ConversionRequest, CurrencyTool};
pub use image::{ImageTool, image_prompt};
pub use weather::{ForecastEntry, NO_FORECAST_MESSAGE, WeatherClient, WeatherReport, WeatherTool, select_forecast};
