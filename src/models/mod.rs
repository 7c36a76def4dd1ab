pub mod company;
pub mod component;
pub mod numbering;
pub mod pir;
pub mod question;
pub mod response;
pub mod review;
pub mod section;
pub mod tag;
pub mod user;
