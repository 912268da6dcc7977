pub mod classroom;
pub mod school;
pub mod student;
pub mod user;

pub use classroom::Classroom;
pub use school::School;
pub use student::Student;
pub use user::{User, UserProfile};
