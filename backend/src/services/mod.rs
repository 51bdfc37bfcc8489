pub mod health;
pub mod karaoke;
pub mod locales;
