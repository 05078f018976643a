pub mod addresses;
pub mod authors;
pub mod books;
pub mod cart_items;
pub mod carts;
pub mod customers;
pub mod genres;
pub mod orders;
pub mod reviews;
