pub mod karaoke;
