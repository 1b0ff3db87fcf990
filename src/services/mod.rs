pub mod doling_service;
pub mod household_service;
pub mod kaleidoskop_service;
pub mod profile_service;
