pub mod analytics;
pub mod assignment;
pub mod certificate;
pub mod course;
pub mod enrollment;
pub mod notification;
pub mod quiz;
pub mod student;
