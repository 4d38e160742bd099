pub mod add;
pub mod attach;
pub mod category;
pub mod comment;
pub mod delete;
pub mod done;
pub mod edit;
pub mod list;
pub mod person;
pub mod show;
