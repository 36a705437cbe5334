pub mod health;
pub mod street_address_lines;
