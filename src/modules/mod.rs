pub mod admin;
pub mod books;
pub mod session;
