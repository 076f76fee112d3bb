pub mod category;
pub mod digiflazz;
pub mod flash_sale;
pub mod game;
pub mod game_configuration;
pub mod payment_method;
pub mod product;
pub mod product_category;
pub mod role;
pub mod transaction;
pub mod user;
pub mod viewer;
pub mod voucher;
