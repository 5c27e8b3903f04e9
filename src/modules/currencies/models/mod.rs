pub mod currency_aggregate;

pub use currency_aggregate::CurrencyAggregate;
